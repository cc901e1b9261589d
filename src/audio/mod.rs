pub mod batch;
pub mod encoder;
pub mod transcode;

pub use batch::ExtractionOrchestrator;
pub use encoder::{Encoder, EncoderCommand, EncoderStatus, FfmpegEncoder, MP3_ENCODER};
pub use transcode::Transcoder;

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Why a single extraction failed.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Encoder exited with code {code}")]
    Encoder { code: i32, detail: Option<String> },

    #[error("Output directory missing: {0}")]
    OutputDirMissing(String),
}

/// Outcome of extracting audio from one input.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractResult {
    pub input_name: String,
    pub output_name: String,
    /// Set only on success.
    pub output_location: Option<PathBuf>,
    pub success: bool,
    pub message: String,
    /// Set only on failure.
    pub error: Option<ExtractError>,
}

impl ExtractResult {
    pub fn succeeded(input_name: String, output_name: String, location: PathBuf) -> Self {
        Self {
            message: format!("✅ {input_name} -> {output_name}"),
            input_name,
            output_name,
            output_location: Some(location),
            success: true,
            error: None,
        }
    }

    pub fn failed(
        input_name: String,
        output_name: String,
        message: String,
        error: ExtractError,
    ) -> Self {
        Self {
            input_name,
            output_name,
            output_location: None,
            success: false,
            message,
            error: Some(error),
        }
    }
}
