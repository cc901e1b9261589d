use crate::error::{Result, Vtt2LrcError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

pub const DEFAULT_VBR_QUALITY: u8 = 2;
pub const DEFAULT_CBR_BITRATE: &str = "192k";

/// Video extensions offered for MP3 extraction.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov", "avi", "flv", "webm", "m4v"];

/// MP3 encoding mode, chosen once per batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Mp3Mode {
    /// Variable bitrate with a LAME quality level (0 = best, 9 = smallest).
    Vbr { quality: u8 },
    /// Constant bitrate, e.g. `192k`.
    Cbr { bitrate: String },
}

impl Mp3Mode {
    pub fn vbr() -> Self {
        Mp3Mode::Vbr {
            quality: DEFAULT_VBR_QUALITY,
        }
    }

    pub fn cbr() -> Self {
        Mp3Mode::Cbr {
            bitrate: DEFAULT_CBR_BITRATE.to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Mp3Mode::Vbr { quality } => {
                if *quality > 9 {
                    return Err(Vtt2LrcError::Config(format!(
                        "VBR quality must be between 0 and 9, got {quality}"
                    )));
                }
            }
            Mp3Mode::Cbr { bitrate } => {
                let digits = bitrate.strip_suffix('k').unwrap_or("");
                if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                    return Err(Vtt2LrcError::Config(format!(
                        "CBR bitrate must look like '192k', got '{bitrate}'"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for Mp3Mode {
    fn default() -> Self {
        Mp3Mode::vbr()
    }
}

impl std::fmt::Display for Mp3Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mp3Mode::Vbr { quality } => write!(f, "vbr:{quality}"),
            Mp3Mode::Cbr { bitrate } => write!(f, "cbr:{bitrate}"),
        }
    }
}

impl std::str::FromStr for Mp3Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        let (kind, arg) = match lower.split_once(':') {
            Some((kind, arg)) => (kind, Some(arg)),
            None => (lower.as_str(), None),
        };

        match (kind, arg) {
            ("vbr", None) => Ok(Mp3Mode::vbr()),
            ("vbr", Some(q)) => q
                .parse()
                .map(|quality| Mp3Mode::Vbr { quality })
                .map_err(|_| format!("Invalid VBR quality: {q}")),
            ("cbr", None) => Ok(Mp3Mode::cbr()),
            ("cbr", Some(rate)) => Ok(Mp3Mode::Cbr {
                bitrate: rate.to_string(),
            }),
            _ => Err(format!(
                "Unknown mode: {s}. Use 'vbr', 'vbr:<0-9>', 'cbr' or 'cbr:<bitrate>'"
            )),
        }
    }
}

impl TryFrom<String> for Mp3Mode {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Mp3Mode> for String {
    fn from(mode: Mp3Mode) -> Self {
        mode.to_string()
    }
}

/// Lowercase extensions and drop any leading dot; empty entries are removed.
pub fn normalize_extensions<I, S>(extensions: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for ext in extensions {
        let ext = ext.as_ref().trim().trim_start_matches('.').to_lowercase();
        if !ext.is_empty() && !out.contains(&ext) {
            out.push(ext);
        }
    }
    out
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ffmpeg_path: String,
    pub extensions: Vec<String>,
    pub mode: Mp3Mode,
    pub strip_nested: bool,
    pub show_encoder_logs: bool,
    pub scratch_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            extensions: vec!["mp4".to_string()],
            mode: Mp3Mode::default(),
            strip_nested: true,
            show_encoder_logs: false,
            scratch_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Load from config file if it exists
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                match toml::from_str::<Config>(&contents) {
                    Ok(file_config) => config = file_config,
                    Err(e) => warn!("Ignoring invalid config {}: {}", config_path.display(), e),
                }
            }
        }

        // Override with environment variables
        if let Ok(path) = std::env::var("VTT2LRC_FFMPEG") {
            config.ffmpeg_path = path;
        }
        if let Ok(exts) = std::env::var("VTT2LRC_EXTENSIONS") {
            config.extensions = normalize_extensions(exts.split(','));
        }
        if let Ok(mode) = std::env::var("VTT2LRC_MODE") {
            if let Ok(m) = mode.parse() {
                config.mode = m;
            }
        }
        if let Ok(strip) = std::env::var("VTT2LRC_STRIP_NESTED") {
            if let Ok(s) = strip.parse() {
                config.strip_nested = s;
            }
        }
        if let Ok(dir) = std::env::var("VTT2LRC_SCRATCH_DIR") {
            config.scratch_dir = Some(PathBuf::from(dir));
        }

        config.extensions = normalize_extensions(&config.extensions);

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ffmpeg_path.trim().is_empty() {
            return Err(Vtt2LrcError::Config(
                "ffmpeg_path must not be empty".to_string(),
            ));
        }

        self.mode.validate()
    }

    /// Directory under which per-item scratch areas are created.
    pub fn scratch_root(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("vtt2lrc").join("config.toml"))
    }
}
