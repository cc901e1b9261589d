use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::unbounded_channel;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use vtt2lrc::audio::{ExtractionOrchestrator, FfmpegEncoder, Transcoder};
use vtt2lrc::config::{normalize_extensions, Config, Mp3Mode};
use vtt2lrc::interactive::{run_interactive_wizard, Task};
use vtt2lrc::storage::LocalStorage;
use vtt2lrc::subtitle::{convert_file, convert_folder};
use vtt2lrc::{BatchEvent, BatchOutcome, BatchStatus, ConvertResult, EventSender, ExtractResult};

#[derive(Parser)]
#[command(name = "vtt2lrc")]
#[command(version, about = "Convert WebVTT subtitles to LRC lyrics and extract MP3 audio")]
#[command(long_about = "Batch-convert WebVTT subtitles into LRC lyrics files, or extract MP3 audio \
tracks from video files with FFmpeg. Run without a subcommand for an interactive wizard.")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Convert .vtt files to .lrc next to the originals
    Lrc {
        /// Folder containing .vtt files, or a single .vtt file
        path: PathBuf,

        /// Keep inner extensions (song.mp3.vtt -> song.mp3.lrc)
        #[arg(long)]
        keep_nested: bool,
    },

    /// Extract MP3 audio from video files next to the originals
    Mp3 {
        /// Folder containing videos, or a single video file
        path: PathBuf,

        /// Video extensions to process, e.g. mp4,mkv
        #[arg(short, long, value_delimiter = ',')]
        ext: Vec<String>,

        /// Encoding mode: vbr, vbr:<0-9>, cbr, cbr:<bitrate>
        #[arg(short, long)]
        mode: Option<Mp3Mode>,

        /// Show FFmpeg diagnostics for every file
        #[arg(long)]
        encoder_logs: bool,

        /// Write a JSON report of all results to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

/// Fold CLI flags into the loaded configuration.
fn apply_command(command: Command, config: &mut Config) -> Task {
    match command {
        Command::Lrc { path, keep_nested } => {
            if keep_nested {
                config.strip_nested = false;
            }
            Task::Lrc { path }
        }
        Command::Mp3 {
            path,
            ext,
            mode,
            encoder_logs,
            report,
        } => {
            if !ext.is_empty() {
                config.extensions = normalize_extensions(&ext);
            }
            if let Some(mode) = mode {
                config.mode = mode;
            }
            if encoder_logs {
                config.show_encoder_logs = true;
            }
            Task::Mp3 { path, report }
        }
    }
}

/// Run `job` on a blocking worker while rendering its events.
async fn run_batch<T, F>(job: F) -> Result<BatchOutcome<T>>
where
    F: FnOnce(EventSender) -> BatchOutcome<T> + Send + 'static,
    T: Send + 'static,
{
    let (tx, mut rx) = unbounded_channel();
    let worker = tokio::task::spawn_blocking(move || job(EventSender::new(tx)));

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    while let Some(event) = rx.recv().await {
        match event {
            BatchEvent::Log(message) => pb.println(message),
            BatchEvent::Progress(fraction) => pb.set_position((fraction * 100.0).round() as u64),
            BatchEvent::Extracted(_) | BatchEvent::Converted(_) => {}
        }
    }

    pb.finish_and_clear();
    worker.await.context("Batch worker failed")
}

fn check_status(status: &BatchStatus) -> Result<()> {
    match status {
        BatchStatus::Completed | BatchStatus::Empty(_) => Ok(()),
        BatchStatus::Cancelled => {
            warn!("Batch cancelled, remaining files were skipped");
            Ok(())
        }
        BatchStatus::Aborted(message) | BatchStatus::Fatal(message) => {
            anyhow::bail!("{}", message)
        }
    }
}

async fn run_lrc(path: PathBuf, config: &Config, cancelled: Arc<AtomicBool>) -> Result<()> {
    let strip_nested = config.strip_nested;
    info!("Converting subtitles in {}", path.display());

    let outcome = run_batch(move |events| {
        if path.is_dir() {
            convert_folder(&LocalStorage, &path, strip_nested, &cancelled, &events)
        } else {
            convert_file(&LocalStorage, &path, strip_nested, &events)
        }
    })
    .await?;

    print_lrc_summary(&outcome.results);
    check_status(&outcome.status)
}

async fn run_mp3(
    path: PathBuf,
    report: Option<PathBuf>,
    config: &Config,
    cancelled: Arc<AtomicBool>,
) -> Result<()> {
    let encoder = FfmpegEncoder::new(&config.ffmpeg_path);
    encoder.check().context(
        "FFmpeg not found. Install it with: brew install ffmpeg (macOS) or apt install ffmpeg (Linux)",
    )?;

    let transcoder = Transcoder::new(Arc::new(encoder), config.scratch_root())
        .with_encoder_logs(config.show_encoder_logs);
    let orchestrator =
        ExtractionOrchestrator::new(Arc::new(LocalStorage), transcoder).with_cancel(cancelled);

    let extensions = config.extensions.clone();
    let mode = config.mode.clone();
    info!("Extracting audio from {} ({})", path.display(), mode);

    let outcome = run_batch(move |events| {
        if path.is_dir() {
            orchestrator.extract_folder(&path, &extensions, &mode, &events)
        } else {
            orchestrator.extract_file(&path, &extensions, &mode, &events)
        }
    })
    .await?;

    print_mp3_summary(&outcome.results);

    if let Some(report) = report {
        write_report(&report, &outcome.results)?;
        info!("Report written to {}", report.display());
    }

    check_status(&outcome.status)
}

fn write_report(path: &Path, results: &[ExtractResult]) -> Result<()> {
    let json = serde_json::to_string_pretty(results).context("Failed to serialize report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

fn print_lrc_summary(results: &[ConvertResult]) {
    let ok = results.iter().filter(|r| r.success).count();
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("  Converted:  {}", ok);
    println!("  Failed:     {}", results.len() - ok);
    println!("═══════════════════════════════════════════════════════════════");
}

fn print_mp3_summary(results: &[ExtractResult]) {
    let ok = results.iter().filter(|r| r.success).count();
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("  Extracted:  {}", ok);
    println!("  Failed:     {}", results.len() - ok);
    for failed in results.iter().filter(|r| !r.success) {
        if let Some(ref error) = failed.error {
            println!("    {}: {}", failed.input_name, error);
        }
    }
    println!("═══════════════════════════════════════════════════════════════");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = Config::load().context("Failed to load configuration")?;

    let (task, config) = match cli.command {
        Some(command) => {
            let mut config = config;
            let task = apply_command(command, &mut config);
            (task, config)
        }
        None => {
            let result = run_interactive_wizard(config)?;
            (result.task, result.config)
        }
    };

    config
        .validate()
        .context("Configuration validation failed")?;

    let cancelled = Arc::new(AtomicBool::new(false));
    {
        let cancelled = cancelled.clone();
        ctrlc::set_handler(move || {
            eprintln!("\nStopping after the current file...");
            cancelled.store(true, Ordering::Relaxed);
        })
        .context("Failed to install Ctrl+C handler")?;
    }

    match task {
        Task::Lrc { path } => run_lrc(path, &config, cancelled).await,
        Task::Mp3 { path, report } => run_mp3(path, report, &config, cancelled).await,
    }
}
