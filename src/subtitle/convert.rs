use super::lrc::convert_to_lrc;
use super::naming::{get_output_file_name, SUBTITLE_EXTENSION};
use crate::events::{BatchEvent, BatchOutcome, BatchStatus, EventSender};
use crate::storage::{Entry, Storage};
use serde::Serialize;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

const LRC_EXTENSION: &str = "lrc";
const LRC_MEDIA_TYPE: &str = "text/x-lrc";

/// Outcome of converting one subtitle file.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertResult {
    pub input_name: String,
    pub output_name: String,
    pub success: bool,
    pub message: String,
}

fn is_subtitle(entry: &Entry) -> bool {
    entry.is_file
        && entry
            .name
            .as_deref()
            .is_some_and(|n| n.to_lowercase().ends_with(SUBTITLE_EXTENSION))
}

/// Convert every `.vtt` file directly inside `root` to a `.lrc` next to it.
///
/// Failures are recorded per file and never stop the batch.
pub fn convert_folder(
    storage: &dyn Storage,
    root: &Path,
    strip_nested: bool,
    cancelled: &AtomicBool,
    events: &EventSender,
) -> BatchOutcome<ConvertResult> {
    if !storage.is_directory(root) {
        let message = format!("Error: cannot access folder {}", root.display());
        events.log(message.clone());
        return BatchOutcome::early(BatchStatus::Aborted(message));
    }

    let entries = match storage.list(root) {
        Ok(entries) => entries,
        Err(e) => {
            let message = format!("Fatal error: {e}");
            events.log(message.clone());
            return BatchOutcome::early(BatchStatus::Fatal(message));
        }
    };

    let subtitles: Vec<Entry> = entries.into_iter().filter(is_subtitle).collect();
    let total = subtitles.len();
    if total == 0 {
        let message = "No .vtt files found.".to_string();
        events.log(message.clone());
        return BatchOutcome::early(BatchStatus::Empty(message));
    }

    events.log(format!("Found {total} VTT files, converting..."));

    let mut results = Vec::with_capacity(total);
    for (processed, entry) in subtitles.iter().enumerate() {
        if cancelled.load(Ordering::Relaxed) {
            warn!("Conversion cancelled after {} of {} files", processed, total);
            events.log("Cancelled.");
            return BatchOutcome::new(BatchStatus::Cancelled, results);
        }

        let result = convert_one(storage, root, entry, strip_nested);
        events.log(result.message.clone());
        events.send(BatchEvent::Converted(result.clone()));
        results.push(result);
        events.progress(processed + 1, total);
    }

    BatchOutcome::new(BatchStatus::Completed, results)
}

/// Convert a single `.vtt` file, writing the `.lrc` into its own directory.
pub fn convert_file(
    storage: &dyn Storage,
    path: &Path,
    strip_nested: bool,
    events: &EventSender,
) -> BatchOutcome<ConvertResult> {
    let entry = match storage.entry(path) {
        Ok(entry) => entry,
        Err(e) => {
            let message = format!("Error: cannot access {}: {e}", path.display());
            events.log(message.clone());
            return BatchOutcome::early(BatchStatus::Aborted(message));
        }
    };

    if !is_subtitle(&entry) {
        let message = format!("Not a .vtt file: {}", path.display());
        events.log(message.clone());
        return BatchOutcome::early(BatchStatus::Empty(message));
    }

    let Some(dir) = storage.parent(&entry) else {
        let message = format!("Cannot locate the folder of {}", path.display());
        events.log(message.clone());
        return BatchOutcome::early(BatchStatus::Aborted(message));
    };

    let result = convert_one(storage, &dir, &entry, strip_nested);
    events.log(result.message.clone());
    events.send(BatchEvent::Converted(result.clone()));
    events.progress(1, 1);

    BatchOutcome::new(BatchStatus::Completed, vec![result])
}

fn convert_one(storage: &dyn Storage, dir: &Path, entry: &Entry, strip_nested: bool) -> ConvertResult {
    let input_name = entry
        .name
        .clone()
        .unwrap_or_else(|| "unknown.vtt".to_string());
    let base = get_output_file_name(&input_name, strip_nested);
    let output_name = format!("{base}.{LRC_EXTENSION}");

    let outcome = read_text(storage, entry).and_then(|content| {
        let lrc = convert_to_lrc(&content, &base);
        write_lrc(storage, dir, &output_name, &lrc)
    });

    match outcome {
        Ok(()) => {
            debug!("Wrote {} into {}", output_name, dir.display());
            ConvertResult {
                message: format!("✅ {input_name} -> {output_name}"),
                input_name,
                output_name,
                success: true,
            }
        }
        Err(e) => ConvertResult {
            message: format!("❌ Conversion failed ({input_name}): {e}"),
            input_name,
            output_name,
            success: false,
        },
    }
}

/// Invalid UTF-8 sequences decode to U+FFFD instead of failing the file.
fn read_text(storage: &dyn Storage, entry: &Entry) -> io::Result<String> {
    let mut bytes = Vec::new();
    storage.open_read(entry)?.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn write_lrc(storage: &dyn Storage, dir: &Path, name: &str, lrc: &str) -> io::Result<()> {
    let target = storage
        .create_or_replace(dir, name, LRC_MEDIA_TYPE)
        .map_err(|e| io::Error::new(e.kind(), format!("failed to create {name}: {e}")))?;
    let mut writer = storage.open_write(&target)?;
    writer.write_all(lrc.as_bytes())?;
    writer.flush()
}
