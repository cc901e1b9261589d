use crate::config::{normalize_extensions, Config, Mp3Mode, VIDEO_EXTENSIONS};
use console::style;
use dialoguer::{Confirm, Input, MultiSelect, Select};
use std::fs;
use std::path::PathBuf;

/// What the user asked to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Convert `.vtt` files in a folder, or a single file, to `.lrc`.
    Lrc { path: PathBuf },
    /// Extract MP3 audio from a folder of videos, or a single video.
    Mp3 {
        path: PathBuf,
        report: Option<PathBuf>,
    },
}

pub struct InteractiveResult {
    pub task: Task,
    pub config: Config,
}

pub fn run_interactive_wizard(mut config: Config) -> anyhow::Result<InteractiveResult> {
    print_header();

    let tasks = [
        "VTT → LRC   convert subtitles to lyrics",
        "Video → MP3 extract the audio track",
    ];
    let selection = Select::new()
        .with_prompt("What do you want to do?")
        .items(&tasks[..])
        .default(0)
        .interact()?;

    let task = if selection == 0 {
        let path = select_path("Folder with .vtt files (or a single .vtt file)")?;
        config.strip_nested = Confirm::new()
            .with_prompt("Remove nested extensions? (song.mp3.vtt -> song.lrc)")
            .default(config.strip_nested)
            .interact()?;
        Task::Lrc { path }
    } else {
        let path = select_path("Folder with videos (or a single video file)")?;
        config.extensions = select_extensions(&config.extensions)?;
        config.mode = select_mode(&config.mode)?;
        config.show_encoder_logs = Confirm::new()
            .with_prompt("Show FFmpeg logs?")
            .default(config.show_encoder_logs)
            .interact()?;
        Task::Mp3 { path, report: None }
    };

    print_summary(&task, &config);

    if !Confirm::new()
        .with_prompt("Proceed with these settings?")
        .default(true)
        .interact()?
    {
        anyhow::bail!("Cancelled by user");
    }

    println!();

    Ok(InteractiveResult { task, config })
}

fn print_header() {
    println!();
    println!(
        "{}",
        style("╔═══════════════════════════════════════════════════╗").cyan()
    );
    println!(
        "{}",
        style("║        vtt2lrc - Lyrics & Audio Batch Tool        ║").cyan()
    );
    println!(
        "{}",
        style("╚═══════════════════════════════════════════════════╝").cyan()
    );
    println!();
}

fn select_path(prompt: &str) -> anyhow::Result<PathBuf> {
    let path: String = Input::new()
        .with_prompt(prompt)
        .default(".".to_string())
        .interact_text()?;
    let path = PathBuf::from(path.trim());
    if fs::metadata(&path).is_err() {
        anyhow::bail!("Path not found: {}", path.display());
    }
    Ok(path)
}

fn select_extensions(current: &[String]) -> anyhow::Result<Vec<String>> {
    let defaults: Vec<bool> = VIDEO_EXTENSIONS
        .iter()
        .map(|ext| current.iter().any(|c| c == ext))
        .collect();

    let chosen = MultiSelect::new()
        .with_prompt("Video extensions (space to toggle)")
        .items(VIDEO_EXTENSIONS)
        .defaults(&defaults)
        .interact()?;

    Ok(normalize_extensions(chosen.into_iter().map(|i| VIDEO_EXTENSIONS[i])))
}

fn select_mode(current: &Mp3Mode) -> anyhow::Result<Mp3Mode> {
    let modes = [
        ("VBR", "variable bitrate, quality 2 (recommended)", Mp3Mode::vbr()),
        ("CBR", "constant bitrate, 192k", Mp3Mode::cbr()),
    ];

    let items: Vec<String> = modes
        .iter()
        .map(|(name, desc, _)| format!("{} - {}", name, desc))
        .collect();

    let default = match current {
        Mp3Mode::Vbr { .. } => 0,
        Mp3Mode::Cbr { .. } => 1,
    };

    let selection = Select::new()
        .with_prompt("Encoding mode")
        .items(&items)
        .default(default)
        .interact()?;

    // Keep a configured quality/bitrate when the same kind is picked again
    if selection == default {
        return Ok(current.clone());
    }
    Ok(modes[selection].2.clone())
}

fn describe_task(task: &Task) -> (&'static str, &PathBuf) {
    match task {
        Task::Lrc { path } => ("VTT → LRC", path),
        Task::Mp3 { path, .. } => ("Video → MP3", path),
    }
}

fn print_summary(task: &Task, config: &Config) {
    let (name, path) = describe_task(task);
    println!("\n{}", style("═══ Summary ═══").bold());
    println!("  Task:       {}", style(name).cyan());
    println!("  Path:       {}", style(path.display()).cyan());
    match task {
        Task::Lrc { .. } => {
            println!("  Nested:     {}", if config.strip_nested { "strip" } else { "keep" });
        }
        Task::Mp3 { .. } => {
            println!("  Extensions: {}", config.extensions.join(", "));
            println!("  Mode:       {}", config.mode);
        }
    }
    println!();
}
