use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::transcode::Transcoder;
use super::ExtractResult;
use crate::config::Mp3Mode;
use crate::events::{BatchEvent, BatchOutcome, BatchStatus, EventSender};
use crate::storage::{Entry, Storage};
use crate::subtitle::naming::matches_extension;

/// Runs one extraction per matching entry, strictly one at a time.
///
/// A failed item is recorded in its [`ExtractResult`] and the batch moves
/// on. Cancellation is checked between items; an item already handed to
/// the encoder always runs to completion.
pub struct ExtractionOrchestrator {
    storage: Arc<dyn Storage>,
    transcoder: Transcoder,
    cancelled: Arc<AtomicBool>,
}

impl ExtractionOrchestrator {
    pub fn new(storage: Arc<dyn Storage>, transcoder: Transcoder) -> Self {
        Self {
            storage,
            transcoder,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share a cancellation flag with the caller.
    pub fn with_cancel(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    /// Extract every file directly inside `root` whose extension is in
    /// `extensions` (lowercase, no dot), writing the MP3s into `root`.
    pub fn extract_folder(
        &self,
        root: &Path,
        extensions: &[String],
        mode: &Mp3Mode,
        events: &EventSender,
    ) -> BatchOutcome<ExtractResult> {
        if extensions.is_empty() {
            let message = "Select at least one extension.".to_string();
            events.log(message.clone());
            return BatchOutcome::early(BatchStatus::Empty(message));
        }

        if !self.storage.is_directory(root) {
            let message = format!("Error: cannot access folder {}", root.display());
            events.log(message.clone());
            return BatchOutcome::early(BatchStatus::Aborted(message));
        }

        let entries = match self.storage.list(root) {
            Ok(entries) => entries,
            Err(e) => {
                let message = format!("Fatal error: {e}");
                events.log(message.clone());
                return BatchOutcome::early(BatchStatus::Fatal(message));
            }
        };

        let candidates: Vec<Entry> = entries
            .into_iter()
            .filter(|e| {
                e.is_file
                    && e
                        .name
                        .as_deref()
                        .is_some_and(|n| matches_extension(n, extensions))
            })
            .collect();

        let total = candidates.len();
        if total == 0 {
            let message = "No video files matching the selected extensions.".to_string();
            events.log(message.clone());
            return BatchOutcome::early(BatchStatus::Empty(message));
        }

        events.log(format!("Found {total} video files, extracting..."));
        info!("Extracting {} files with mode {}", total, mode);

        let start = Instant::now();
        let mut results = Vec::with_capacity(total);

        for (processed, entry) in candidates.iter().enumerate() {
            if self.cancelled.load(Ordering::Relaxed) {
                warn!("Extraction cancelled after {} of {} files", processed, total);
                events.log("Cancelled.");
                return BatchOutcome::new(BatchStatus::Cancelled, results);
            }

            debug!("Extracting {:?} ({}/{})", entry.location, processed + 1, total);
            let result =
                self.transcoder
                    .extract_one(self.storage.as_ref(), entry, root, mode, events);
            self.record(result, &mut results, events);
            events.progress(processed + 1, total);
        }

        let failed = results.iter().filter(|r| !r.success).count();
        info!(
            "Extraction complete: {} succeeded, {} failed in {:.2}s",
            total - failed,
            failed,
            start.elapsed().as_secs_f64()
        );

        BatchOutcome::new(BatchStatus::Completed, results)
    }

    /// Extract a single file, writing the MP3 next to it.
    pub fn extract_file(
        &self,
        path: &Path,
        extensions: &[String],
        mode: &Mp3Mode,
        events: &EventSender,
    ) -> BatchOutcome<ExtractResult> {
        if extensions.is_empty() {
            let message = "Select at least one extension.".to_string();
            events.log(message.clone());
            return BatchOutcome::early(BatchStatus::Empty(message));
        }

        let entry = match self.storage.entry(path) {
            Ok(entry) => entry,
            Err(e) => {
                let message = format!("Error: cannot access {}: {e}", path.display());
                events.log(message.clone());
                return BatchOutcome::early(BatchStatus::Aborted(message));
            }
        };

        let (input_name, _) = Transcoder::output_names(&entry);
        if !matches_extension(&input_name, extensions) {
            let message = format!("File extension does not match: {input_name}");
            events.log(message.clone());
            return BatchOutcome::early(BatchStatus::Empty(message));
        }

        let Some(output_dir) = self.storage.parent(&entry) else {
            let message = "Cannot locate the output folder, select a folder instead.".to_string();
            events.log(message.clone());
            return BatchOutcome::early(BatchStatus::Aborted(message));
        };

        let mut results = Vec::with_capacity(1);
        let result =
            self.transcoder
                .extract_one(self.storage.as_ref(), &entry, &output_dir, mode, events);
        self.record(result, &mut results, events);
        events.progress(1, 1);

        BatchOutcome::new(BatchStatus::Completed, results)
    }

    fn record(&self, result: ExtractResult, results: &mut Vec<ExtractResult>, events: &EventSender) {
        events.log(result.message.clone());
        events.send(BatchEvent::Extracted(result.clone()));
        results.push(result);
    }
}
