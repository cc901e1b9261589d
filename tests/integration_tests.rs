//! Integration tests for vtt2lrc
//!
//! These tests drive both batch engines through the public API without a
//! real FFmpeg: encoding goes through a fake encoder and storage through
//! either the local filesystem or an in-memory store.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use tokio::sync::mpsc::unbounded_channel;

use vtt2lrc::audio::{Encoder, EncoderCommand, EncoderStatus};
use vtt2lrc::storage::{Entry, LocalStorage, Storage};
use vtt2lrc::subtitle::{convert_to_lrc, extract_cues, get_output_file_name};
use vtt2lrc::{
    convert_folder, BatchEvent, BatchStatus, EventSender, ExtractError, ExtractionOrchestrator,
    Mp3Mode, Transcoder,
};

// ============================================================================
// Test doubles
// ============================================================================

/// Prefixes the input bytes with `MP3:`; inputs containing `broken` fail.
struct FakeEncoder {
    calls: AtomicUsize,
}

impl FakeEncoder {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

impl Encoder for FakeEncoder {
    fn run(&self, command: &EncoderCommand) -> EncoderStatus {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let input = match fs::read(&command.input) {
            Ok(input) => input,
            Err(e) => return EncoderStatus::failure(1, e.to_string()),
        };
        if input.windows(6).any(|w| w == b"broken") {
            return EncoderStatus::failure(187, "Invalid data found when processing input");
        }
        let mut output = b"MP3:".to_vec();
        output.extend(input);
        match fs::write(&command.output, output) {
            Ok(()) => EncoderStatus::success(),
            Err(e) => EncoderStatus::failure(1, e.to_string()),
        }
    }

    fn name(&self) -> &str {
        "fake"
    }
}

type Files = Arc<Mutex<BTreeMap<PathBuf, Vec<u8>>>>;

/// Single-directory store that, like many document providers, renames a
/// new entry instead of replacing an existing one.
struct MemoryStorage {
    dir: PathBuf,
    files: Files,
}

impl MemoryStorage {
    fn new(dir: &str) -> Self {
        Self {
            dir: PathBuf::from(dir),
            files: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    fn put(&self, name: &str, content: &[u8]) {
        self.files
            .lock()
            .unwrap()
            .insert(self.dir.join(name), content.to_vec());
    }

    fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(&self.dir.join(name)).cloned()
    }

    fn names(&self) -> Vec<String> {
        self.files
            .lock()
            .unwrap()
            .keys()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect()
    }
}

struct MemoryWriter {
    key: PathBuf,
    files: Files,
    buf: Vec<u8>,
}

impl Write for MemoryWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(self.key.clone(), self.buf.clone());
        Ok(())
    }
}

impl Storage for MemoryStorage {
    fn is_directory(&self, dir: &Path) -> bool {
        dir == self.dir
    }

    fn list(&self, dir: &Path) -> io::Result<Vec<Entry>> {
        if dir != self.dir {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such directory"));
        }
        Ok(self
            .files
            .lock()
            .unwrap()
            .keys()
            .map(|p| Entry::file(p.clone()))
            .collect())
    }

    fn entry(&self, location: &Path) -> io::Result<Entry> {
        if self.files.lock().unwrap().contains_key(location) {
            Ok(Entry::file(location))
        } else {
            Err(io::Error::new(io::ErrorKind::NotFound, "no such file"))
        }
    }

    fn create(&self, dir: &Path, name: &str, _media_type: &str) -> io::Result<Entry> {
        let mut files = self.files.lock().unwrap();
        let mut location = dir.join(name);
        let mut n = 1;
        while files.contains_key(&location) {
            let (stem, ext) = name.rsplit_once('.').unwrap_or((name, ""));
            location = dir.join(format!("{stem} ({n}).{ext}"));
            n += 1;
        }
        files.insert(location.clone(), Vec::new());
        Ok(Entry::file(location))
    }

    fn delete(&self, entry: &Entry) -> io::Result<()> {
        self.files.lock().unwrap().remove(&entry.location);
        Ok(())
    }

    fn open_read(&self, entry: &Entry) -> io::Result<Box<dyn Read + Send>> {
        let content = self
            .files
            .lock()
            .unwrap()
            .get(&entry.location)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))?;
        Ok(Box::new(Cursor::new(content)))
    }

    fn open_write(&self, entry: &Entry) -> io::Result<Box<dyn Write + Send>> {
        Ok(Box::new(MemoryWriter {
            key: entry.location.clone(),
            files: self.files.clone(),
            buf: Vec::new(),
        }))
    }
}

fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<BatchEvent>) -> Vec<BatchEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn progress_of(events: &[BatchEvent]) -> Vec<f32> {
    events
        .iter()
        .filter_map(|e| match e {
            BatchEvent::Progress(p) => Some(*p),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Configuration
// ============================================================================

mod config_tests {
    use vtt2lrc::config::normalize_extensions;
    use vtt2lrc::{Config, Mp3Mode};

    #[test]
    fn test_config_file_layering() {
        let config: Config = toml::from_str(
            r#"
            ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"
            mode = "vbr:0"
            "#,
        )
        .unwrap();
        assert_eq!(config.ffmpeg_path, "/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(config.mode, Mp3Mode::Vbr { quality: 0 });
        assert_eq!(config.extensions, vec!["mp4".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_mode_fails_validation() {
        let config: Config = toml::from_str(r#"mode = "vbr:12""#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_extension_normalization() {
        assert_eq!(
            normalize_extensions(".MP4,mkv,,.Webm".split(',')),
            vec!["mp4".to_string(), "mkv".to_string(), "webm".to_string()]
        );
    }
}

// ============================================================================
// Lyrics conversion
// ============================================================================

mod lyrics_tests {
    use super::*;

    #[test]
    fn test_centiseconds_are_truncated() {
        let lrc = convert_to_lrc("00:07.129 --> 00:08.000\nhi\n", "t");
        assert_eq!(lrc, "[ti:t]\n[00:07.12]hi\n");
    }

    #[test]
    fn test_hours_fold_into_minutes() {
        let lrc = convert_to_lrc("2:05:00.000 --> 2:05:01.000\nlate\n", "t");
        assert_eq!(lrc, "[ti:t]\n[125:00.00]late\n");
    }

    #[test]
    fn test_back_to_back_timing_lines() {
        let cues = extract_cues("00:01.000 --> 00:02.000\n00:02.000 --> 00:03.000\nonly\n");
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].start_timestamp, "[00:02.00]");
    }

    #[test]
    fn test_markup_removed() {
        let cues = extract_cues("00:01.000 --> 00:02.000\n<b>hello</b> world\n");
        assert_eq!(cues[0].text, "hello world");
    }

    #[test]
    fn test_output_names() {
        assert_eq!(get_output_file_name("song.mp3.vtt", true), "song");
        assert_eq!(get_output_file_name("song.mp3.vtt", false), "song.mp3");
        assert_eq!(get_output_file_name("plain.vtt", true), "plain");
    }

    #[test]
    fn test_realistic_document() {
        let vtt = "\
WEBVTT
Kind: captions
Language: en

NOTE
Generated for testing

1
00:00:01.000 --> 00:00:03.500 align:start position:0%
<c.colorE5E5E5>Never gonna</c> <00:00:02.000><c>give you up</c>

2
00:00:03.500 --> 00:00:05.250
Never gonna
let you down
";
        assert_eq!(
            convert_to_lrc(vtt, "Rick"),
            "[ti:Rick]\n[00:01.00]Never gonna give you up\n[00:03.50]Never gonna let you down\n"
        );
    }

    #[test]
    fn test_folder_conversion_in_place() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.mp4.vtt"), "00:01.000 --> 00:02.000\nA\n").unwrap();
        fs::write(dir.path().join("b.VTT"), "00:03.000 --> 00:04.000\nB\n").unwrap();
        fs::write(dir.path().join("b.lrc"), "old").unwrap();

        let (tx, mut rx) = unbounded_channel();
        let outcome = convert_folder(
            &LocalStorage,
            dir.path(),
            true,
            &AtomicBool::new(false),
            &EventSender::new(tx),
        );

        assert_eq!(outcome.status, BatchStatus::Completed);
        assert!(outcome.results.iter().all(|r| r.success));
        assert_eq!(
            fs::read_to_string(dir.path().join("a.lrc")).unwrap(),
            "[ti:a]\n[00:01.00]A\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("b.lrc")).unwrap(),
            "[ti:b]\n[00:03.00]B\n"
        );
        assert_eq!(progress_of(&drain(&mut rx)), vec![0.5, 1.0]);
    }

    #[test]
    fn test_folder_conversion_replaces_on_renaming_storage() {
        let storage = MemoryStorage::new("/subs");
        storage.put("x.vtt", b"00:01.000 --> 00:02.000\nnew\n");
        storage.put("x.lrc", b"old");

        let outcome = convert_folder(
            &storage,
            Path::new("/subs"),
            true,
            &AtomicBool::new(false),
            &EventSender::discard(),
        );

        assert!(outcome.results[0].success);
        assert_eq!(storage.names(), vec!["x.lrc", "x.vtt"]);
        assert_eq!(storage.get("x.lrc").unwrap(), b"[ti:x]\n[00:01.00]new\n");
    }
}

// ============================================================================
// MP3 extraction
// ============================================================================

mod extraction_tests {
    use super::*;

    fn orchestrator(
        storage: Arc<dyn Storage>,
        encoder: Arc<FakeEncoder>,
        scratch: &Path,
    ) -> ExtractionOrchestrator {
        ExtractionOrchestrator::new(storage, Transcoder::new(encoder, scratch))
    }

    #[test]
    fn test_batch_continues_after_encoder_failure() {
        let media = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        fs::write(media.path().join("1.mp4"), b"one").unwrap();
        fs::write(media.path().join("2.mp4"), b"broken").unwrap();
        fs::write(media.path().join("3.mp4"), b"three").unwrap();

        let encoder = FakeEncoder::new();
        let (tx, mut rx) = unbounded_channel();
        let outcome = orchestrator(Arc::new(LocalStorage), encoder.clone(), scratch.path())
            .extract_folder(
                media.path(),
                &["mp4".to_string()],
                &Mp3Mode::vbr(),
                &EventSender::new(tx),
            );

        assert_eq!(outcome.status, BatchStatus::Completed);
        assert_eq!(outcome.results.len(), 3);
        assert_eq!(outcome.results.iter().filter(|r| r.success).count(), 2);
        match &outcome.results[1].error {
            Some(ExtractError::Encoder { code, detail }) => {
                assert_eq!(*code, 187);
                assert!(detail.as_deref().unwrap().contains("Invalid data"));
            }
            other => panic!("expected encoder error, got {other:?}"),
        }

        assert_eq!(fs::read(media.path().join("1.mp3")).unwrap(), b"MP3:one");
        assert!(!media.path().join("2.mp3").exists());
        assert_eq!(fs::read(media.path().join("3.mp3")).unwrap(), b"MP3:three");
        assert!(fs::read_dir(scratch.path()).unwrap().next().is_none());

        let events = drain(&mut rx);
        let progress = progress_of(&events);
        assert_eq!(progress.last(), Some(&1.0));
        assert!(progress.windows(2).all(|w| w[0] <= w[1]));
        let extracted = events
            .iter()
            .filter(|e| matches!(e, BatchEvent::Extracted(_)))
            .count();
        assert_eq!(extracted, 3);
    }

    #[test]
    fn test_existing_output_is_replaced_not_renamed() {
        let storage = Arc::new(MemoryStorage::new("/videos"));
        storage.put("clip.mp4", b"fresh");
        storage.put("clip.mp3", b"stale");
        let scratch = TempDir::new().unwrap();

        let outcome = orchestrator(storage.clone(), FakeEncoder::new(), scratch.path())
            .extract_folder(
                Path::new("/videos"),
                &["mp4".to_string()],
                &Mp3Mode::cbr(),
                &EventSender::discard(),
            );

        assert!(outcome.results[0].success);
        assert_eq!(
            outcome.results[0].output_location,
            Some(PathBuf::from("/videos/clip.mp3"))
        );
        assert_eq!(storage.names(), vec!["clip.mp3", "clip.mp4"]);
        assert_eq!(storage.get("clip.mp3").unwrap(), b"MP3:fresh");
    }

    #[test]
    fn test_empty_extension_set_runs_nothing() {
        let media = TempDir::new().unwrap();
        fs::write(media.path().join("1.mp4"), b"one").unwrap();

        let encoder = FakeEncoder::new();
        let (tx, mut rx) = unbounded_channel();
        let outcome = orchestrator(Arc::new(LocalStorage), encoder.clone(), media.path())
            .extract_folder(media.path(), &[], &Mp3Mode::vbr(), &EventSender::new(tx));

        assert!(matches!(outcome.status, BatchStatus::Empty(_)));
        assert!(outcome.results.is_empty());
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 0);

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        match &events[0] {
            BatchEvent::Log(message) => assert!(message.contains("extension")),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_single_file_writes_next_to_input() {
        let media = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let input = media.path().join("Talk: Part 1.webm");
        fs::write(&input, b"talk").unwrap();

        let outcome = orchestrator(Arc::new(LocalStorage), FakeEncoder::new(), scratch.path())
            .extract_file(
                &input,
                &["webm".to_string()],
                &Mp3Mode::vbr(),
                &EventSender::discard(),
            );

        assert!(outcome.results[0].success, "{}", outcome.results[0].message);
        assert_eq!(outcome.results[0].input_name, "Talk_ Part 1.webm");
        assert_eq!(
            fs::read(media.path().join("Talk_ Part 1.mp3")).unwrap(),
            b"MP3:talk"
        );
    }

    #[tokio::test]
    async fn test_runs_on_blocking_worker() {
        let media = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        fs::write(media.path().join("a.mkv"), b"a").unwrap();
        fs::write(media.path().join("b.mkv"), b"b").unwrap();

        let orchestrator =
            orchestrator(Arc::new(LocalStorage), FakeEncoder::new(), scratch.path());
        let root = media.path().to_path_buf();
        let (tx, mut rx) = unbounded_channel();

        let worker = tokio::task::spawn_blocking(move || {
            orchestrator.extract_folder(
                &root,
                &["mkv".to_string()],
                &Mp3Mode::vbr(),
                &EventSender::new(tx),
            )
        });

        let mut progress = Vec::new();
        while let Some(event) = rx.recv().await {
            if let BatchEvent::Progress(p) = event {
                progress.push(p);
            }
        }

        let outcome = worker.await.unwrap();
        assert_eq!(outcome.results.len(), 2);
        assert_eq!(progress, vec![0.5, 1.0]);
    }
}
