use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::config::Mp3Mode;
use crate::error::{Result, Vtt2LrcError};

pub const MP3_ENCODER: &str = "libmp3lame";

/// Diagnostic lines kept from a failed run.
const DIAGNOSTIC_TAIL_LINES: usize = 20;

/// Arguments for one audio-only transcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderCommand {
    pub input: PathBuf,
    pub output: PathBuf,
    pub codec_args: Vec<String>,
}

impl EncoderCommand {
    /// Drop video, encode audio to MP3 and overwrite `output`.
    pub fn mp3(input: &Path, output: &Path, mode: &Mp3Mode) -> Self {
        let mut codec_args = vec!["-c:a".to_string(), MP3_ENCODER.to_string()];
        match mode {
            Mp3Mode::Vbr { quality } => {
                codec_args.push("-q:a".to_string());
                codec_args.push(quality.to_string());
            }
            Mp3Mode::Cbr { bitrate } => {
                codec_args.push("-b:a".to_string());
                codec_args.push(bitrate.clone());
            }
        }

        Self {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            codec_args,
        }
    }

    /// Argument vector for the encoder executable.
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-y".into(), "-i".into(), self.input.clone().into()];
        args.push("-vn".into());
        args.extend(self.codec_args.iter().map(OsString::from));
        args.push(self.output.clone().into());
        args
    }
}

impl fmt::Display for EncoderCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "-y -i \"{}\" -vn {} \"{}\"",
            self.input.display(),
            self.codec_args.join(" "),
            self.output.display()
        )
    }
}

/// Exit status of an encoder run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderStatus {
    pub code: i32,
    pub diagnostics: Option<String>,
}

impl EncoderStatus {
    pub fn success() -> Self {
        Self {
            code: 0,
            diagnostics: None,
        }
    }

    pub fn failure(code: i32, diagnostics: impl Into<String>) -> Self {
        Self {
            code,
            diagnostics: Some(diagnostics.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// External audio encoder. Runs block until the encoder exits.
pub trait Encoder: Send + Sync {
    fn run(&self, command: &EncoderCommand) -> EncoderStatus;
    fn name(&self) -> &str;
}

/// Runs the `ffmpeg` executable.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    program: PathBuf,
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegEncoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Check that the executable is installed and runs.
    pub fn check(&self) -> Result<()> {
        let output = Command::new(&self.program)
            .arg("-version")
            .output()
            .map_err(|e| {
                Vtt2LrcError::Encoder(format!(
                    "{} not found. Please install FFmpeg and ensure it's in your PATH. Error: {e}",
                    self.program.display()
                ))
            })?;

        if !output.status.success() {
            return Err(Vtt2LrcError::Encoder(format!(
                "{} -version failed",
                self.program.display()
            )));
        }

        debug!("FFmpeg is available at {}", self.program.display());
        Ok(())
    }
}

impl FfmpegEncoder {
    /// The encoder runs in its own process group so a terminal Ctrl+C only
    /// reaches this process, which stops between items.
    fn process(&self) -> Command {
        let mut process = Command::new(&self.program);
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            process.process_group(0);
        }
        process
    }
}

impl Encoder for FfmpegEncoder {
    fn run(&self, command: &EncoderCommand) -> EncoderStatus {
        debug!("Running {} {}", self.program.display(), command);

        let output = match self
            .process()
            .args(command.to_args())
            .stdin(Stdio::null())
            .output()
        {
            Ok(output) => output,
            Err(e) => {
                return EncoderStatus::failure(
                    -1,
                    format!("Failed to run {}: {e}", self.program.display()),
                )
            }
        };

        let stderr = String::from_utf8_lossy(&output.stderr);
        let diagnostics = tail_lines(&stderr, DIAGNOSTIC_TAIL_LINES);

        EncoderStatus {
            // Killed by a signal
            code: output.status.code().unwrap_or(-1),
            diagnostics: (!diagnostics.is_empty()).then_some(diagnostics),
        }
    }

    fn name(&self) -> &str {
        "FFmpeg"
    }
}

fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.trim().lines().collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}
