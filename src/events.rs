use crate::audio::ExtractResult;
use crate::subtitle::ConvertResult;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Notifications produced by a batch run, delivered in order.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// A human-readable log line.
    Log(String),
    /// Fraction of matched items processed so far, in `0.0..=1.0`.
    Progress(f32),
    /// One extraction item finished (successfully or not).
    Extracted(ExtractResult),
    /// One subtitle file finished (successfully or not).
    Converted(ConvertResult),
}

/// How a batch run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchStatus {
    /// Every matched item was attempted.
    Completed,
    /// Nothing matched, so no item was attempted. Not an error.
    Empty(String),
    /// A directory-level precondition failed before any item was attempted.
    Aborted(String),
    /// Stopped between items at the caller's request.
    Cancelled,
    /// Unexpected failure while enumerating; earlier results remain valid.
    Fatal(String),
}

/// Results of one batch run, in processing order.
#[derive(Debug, Clone)]
pub struct BatchOutcome<T> {
    pub status: BatchStatus,
    pub results: Vec<T>,
}

impl<T> BatchOutcome<T> {
    pub fn new(status: BatchStatus, results: Vec<T>) -> Self {
        Self { status, results }
    }

    pub fn early(status: BatchStatus) -> Self {
        Self::new(status, Vec::new())
    }
}

/// Sending half of a batch event stream.
///
/// A dropped receiver is not an error: the batch keeps running and the
/// events are discarded.
#[derive(Debug, Clone, Default)]
pub struct EventSender {
    tx: Option<UnboundedSender<BatchEvent>>,
}

impl EventSender {
    pub fn new(tx: UnboundedSender<BatchEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A sender that discards everything.
    pub fn discard() -> Self {
        Self { tx: None }
    }

    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        debug!("{}", message);
        self.send(BatchEvent::Log(message));
    }

    pub fn progress(&self, processed: usize, total: usize) {
        let fraction = if total == 0 {
            1.0
        } else {
            processed as f32 / total as f32
        };
        self.send(BatchEvent::Progress(fraction));
    }

    pub fn send(&self, event: BatchEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn test_progress_fraction() {
        let (tx, mut rx) = unbounded_channel();
        let events = EventSender::new(tx);
        events.progress(1, 4);
        events.progress(4, 4);

        match rx.try_recv().unwrap() {
            BatchEvent::Progress(p) => assert_eq!(p, 0.25),
            other => panic!("unexpected event: {other:?}"),
        }
        match rx.try_recv().unwrap() {
            BatchEvent::Progress(p) => assert_eq!(p, 1.0),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_dropped_receiver_is_ignored() {
        let (tx, rx) = unbounded_channel();
        drop(rx);
        let events = EventSender::new(tx);
        events.log("still fine");
        EventSender::discard().log("also fine");
    }
}
