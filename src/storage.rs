//! Filesystem collaborator used by both batch engines.
//!
//! The engines never touch paths directly: they list a single directory,
//! look entries up by name, create and delete entries, and open byte
//! streams through [`Storage`]. [`LocalStorage`] is the on-disk
//! implementation; tests substitute their own.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One immediate child of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Location handed back to the storage for every operation.
    pub location: PathBuf,
    /// Display name, if the storage could resolve one.
    pub name: Option<String>,
    pub is_file: bool,
}

impl Entry {
    pub fn file(location: impl Into<PathBuf>) -> Self {
        let location = location.into();
        let name = location
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string);
        Self {
            location,
            name,
            is_file: true,
        }
    }

    /// Last component of the location, used when no display name exists.
    pub fn location_name(&self) -> Option<String> {
        self.location
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
    }
}

pub trait Storage: Send + Sync {
    /// Whether `dir` exists and is a readable directory.
    fn is_directory(&self, dir: &Path) -> bool;

    /// Immediate children of `dir`. Never recurses.
    fn list(&self, dir: &Path) -> io::Result<Vec<Entry>>;

    /// Resolve a single location into an entry.
    fn entry(&self, location: &Path) -> io::Result<Entry>;

    /// Create a new, empty entry named `name` inside `dir`.
    fn create(&self, dir: &Path, name: &str, media_type: &str) -> io::Result<Entry>;

    fn delete(&self, entry: &Entry) -> io::Result<()>;

    fn open_read(&self, entry: &Entry) -> io::Result<Box<dyn Read + Send>>;

    /// Open for writing, truncating existing content.
    fn open_write(&self, entry: &Entry) -> io::Result<Box<dyn Write + Send>>;

    fn find(&self, dir: &Path, name: &str) -> io::Result<Option<Entry>> {
        Ok(self
            .list(dir)?
            .into_iter()
            .find(|e| e.name.as_deref() == Some(name)))
    }

    /// Create `name` in `dir`, deleting any existing file of that name first
    /// so the new entry keeps exactly that name. A directory in the way is
    /// never deleted; the call fails instead.
    fn create_or_replace(&self, dir: &Path, name: &str, media_type: &str) -> io::Result<Entry> {
        if let Some(existing) = self.find(dir, name)? {
            if !existing.is_file {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{name} exists and is not a file"),
                ));
            }
            if let Err(e) = self.delete(&existing) {
                warn!("Could not delete existing {}: {}", name, e);
            }
        }
        self.create(dir, name, media_type)
    }

    /// Directory containing `entry`, if it can be determined. A bare file
    /// name lives in the current directory.
    fn parent(&self, entry: &Entry) -> Option<PathBuf> {
        entry.location.parent().map(|p| {
            if p.as_os_str().is_empty() {
                PathBuf::from(".")
            } else {
                p.to_path_buf()
            }
        })
    }
}

/// [`Storage`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl LocalStorage {
    pub fn new() -> Self {
        Self
    }
}

impl Storage for LocalStorage {
    fn is_directory(&self, dir: &Path) -> bool {
        fs::read_dir(dir).is_ok()
    }

    fn list(&self, dir: &Path) -> io::Result<Vec<Entry>> {
        let mut entries = Vec::new();
        for item in fs::read_dir(dir)? {
            let item = item?;
            let file_type = item.file_type()?;
            entries.push(Entry {
                location: item.path(),
                name: item.file_name().to_str().map(str::to_string),
                is_file: file_type.is_file(),
            });
        }
        entries.sort_by(|a, b| a.location.cmp(&b.location));
        Ok(entries)
    }

    fn entry(&self, location: &Path) -> io::Result<Entry> {
        let metadata = fs::metadata(location)?;
        let mut entry = Entry::file(location);
        entry.is_file = metadata.is_file();
        Ok(entry)
    }

    fn create(&self, dir: &Path, name: &str, media_type: &str) -> io::Result<Entry> {
        let location = dir.join(name);
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&location)?;
        debug!("Created {} ({})", location.display(), media_type);
        Ok(Entry::file(location))
    }

    fn delete(&self, entry: &Entry) -> io::Result<()> {
        if entry.is_file {
            fs::remove_file(&entry.location)
        } else {
            fs::remove_dir_all(&entry.location)
        }
    }

    fn open_read(&self, entry: &Entry) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(File::open(&entry.location)?))
    }

    fn open_write(&self, entry: &Entry) -> io::Result<Box<dyn Write + Send>> {
        let file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&entry.location)?;
        Ok(Box::new(file))
    }
}
