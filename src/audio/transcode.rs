use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use tracing::{debug, warn};

use super::encoder::{Encoder, EncoderCommand};
use super::{ExtractError, ExtractResult};
use crate::config::Mp3Mode;
use crate::events::EventSender;
use crate::storage::{Entry, Storage};
use crate::subtitle::naming::{base_name, sanitize_file_name};

const OUTPUT_EXTENSION: &str = "mp3";
const OUTPUT_MEDIA_TYPE: &str = "audio/mpeg";
const FALLBACK_NAME: &str = "video";
const FALLBACK_INPUT_EXTENSION: &str = "mp4";

/// Scratch copies of one item's encoder input and output.
///
/// Both files live in a private temporary directory that is removed when
/// the area is dropped, on every exit path.
struct ScratchArea {
    dir: TempDir,
    input: PathBuf,
    output: PathBuf,
}

impl ScratchArea {
    fn new(root: &Path, input_extension: &str) -> io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("vtt2lrc-")
            .tempdir_in(root)?;
        let input = dir.path().join(format!("ffmpeg_in.{input_extension}"));
        let output = dir.path().join(format!("ffmpeg_out.{OUTPUT_EXTENSION}"));
        Ok(Self { dir, input, output })
    }
}

impl Drop for ScratchArea {
    fn drop(&mut self) {
        debug!("Cleaning up scratch directory: {:?}", self.dir.path());
        // TempDir deletes itself on drop
    }
}

/// A failed step: user-facing message plus the classified error.
type StepResult<T> = std::result::Result<T, (String, ExtractError)>;

/// Extracts MP3 audio from one input through an external [`Encoder`].
#[derive(Clone)]
pub struct Transcoder {
    encoder: Arc<dyn Encoder>,
    scratch_root: PathBuf,
    show_encoder_logs: bool,
}

impl Transcoder {
    pub fn new(encoder: Arc<dyn Encoder>, scratch_root: impl Into<PathBuf>) -> Self {
        Self {
            encoder,
            scratch_root: scratch_root.into(),
            show_encoder_logs: false,
        }
    }

    /// Forward the encoder's diagnostic output as log events.
    pub fn with_encoder_logs(mut self, show: bool) -> Self {
        self.show_encoder_logs = show;
        self
    }

    /// Names used for `input`: the sanitized input name and `<base>.mp3`.
    pub fn output_names(input: &Entry) -> (String, String) {
        let display_name = input
            .name
            .clone()
            .or_else(|| input.location_name())
            .unwrap_or_else(|| FALLBACK_NAME.to_string());
        let safe_name = sanitize_file_name(&display_name);
        let output_name = format!("{}.{}", base_name(&safe_name), OUTPUT_EXTENSION);
        (safe_name, output_name)
    }

    /// Extract the audio of `input` into `output_dir`, replacing any file
    /// of the same name there. Never panics or returns early without a result.
    pub fn extract_one(
        &self,
        storage: &dyn Storage,
        input: &Entry,
        output_dir: &Path,
        mode: &Mp3Mode,
        events: &EventSender,
    ) -> ExtractResult {
        let (input_name, output_name) = Self::output_names(input);

        match self.run_steps(storage, input, &input_name, output_dir, &output_name, mode, events) {
            Ok(location) => ExtractResult::succeeded(input_name, output_name, location),
            Err((message, error)) => {
                warn!("{}: {}", input_name, error);
                ExtractResult::failed(input_name, output_name, message, error)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn run_steps(
        &self,
        storage: &dyn Storage,
        input: &Entry,
        input_name: &str,
        output_dir: &Path,
        output_name: &str,
        mode: &Mp3Mode,
        events: &EventSender,
    ) -> StepResult<PathBuf> {
        if !storage.is_directory(output_dir) {
            return Err((
                "Cannot access output directory".to_string(),
                ExtractError::OutputDirMissing(output_dir.display().to_string()),
            ));
        }

        if !input.is_file {
            return Err((
                "Input is not a file".to_string(),
                ExtractError::InvalidInput(input_name.to_string()),
            ));
        }

        let input_extension = input_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
            .unwrap_or(FALLBACK_INPUT_EXTENSION);

        let scratch = ScratchArea::new(&self.scratch_root, input_extension).map_err(|e| {
            (
                format!("Failed to create scratch directory: {e}"),
                ExtractError::Io(e.to_string()),
            )
        })?;

        copy_to_scratch(storage, input, &scratch.input).map_err(|e| {
            (
                format!("Failed to copy input: {e}"),
                ExtractError::Io(e.to_string()),
            )
        })?;

        let command = EncoderCommand::mp3(&scratch.input, &scratch.output, mode);
        let status = self.encoder.run(&command);

        if self.show_encoder_logs {
            if let Some(diagnostics) = &status.diagnostics {
                for line in diagnostics.lines() {
                    events.log(format!("[{}] {}", self.encoder.name(), line));
                }
            }
        }

        if !status.is_success() {
            return Err((
                format!("Transcoding failed: {}", status.code),
                ExtractError::Encoder {
                    code: status.code,
                    detail: status.diagnostics,
                },
            ));
        }

        let target = storage
            .create_or_replace(output_dir, output_name, OUTPUT_MEDIA_TYPE)
            .map_err(|e| {
                (
                    format!("Failed to create output file: {e}"),
                    ExtractError::Io(format!("create output failed: {e}")),
                )
            })?;

        copy_from_scratch(storage, &scratch.output, &target).map_err(|e| {
            (
                format!("Failed to write output: {e}"),
                ExtractError::Io(e.to_string()),
            )
        })?;

        Ok(target.location)
    }
}

fn copy_to_scratch(storage: &dyn Storage, input: &Entry, scratch: &Path) -> io::Result<u64> {
    let mut reader = storage.open_read(input)?;
    let mut file = File::create(scratch)?;
    let copied = io::copy(&mut reader, &mut file)?;
    file.flush()?;
    Ok(copied)
}

fn copy_from_scratch(storage: &dyn Storage, scratch: &Path, target: &Entry) -> io::Result<u64> {
    let mut file = File::open(scratch)?;
    let mut writer = storage.open_write(target)?;
    let copied = io::copy(&mut file, &mut writer)?;
    writer.flush()?;
    Ok(copied)
}
