use super::timestamp::parse_start;
use super::Cue;
use regex::Regex;
use std::sync::OnceLock;

const HEADER: &str = "WEBVTT";
const COMMENT_MARKER: &str = "NOTE";

fn markup_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("Invalid regex"))
}

/// Remove inline tags such as `<b>`, `<c.yellow>` or `<00:00:01.000>`.
pub fn strip_markup(line: &str) -> String {
    markup_regex().replace_all(line, "").trim().to_string()
}

#[derive(Debug)]
enum State {
    Scanning,
    InCue(Cue),
}

/// Groups subtitle lines into cues anchored at their start time.
///
/// Feed lines in document order with [`push_line`](Self::push_line) and
/// collect the cues with [`finish`](Self::finish). Cues whose text ends up
/// empty are dropped.
#[derive(Debug)]
pub struct CueExtractor {
    state: State,
    cues: Vec<Cue>,
}

impl Default for CueExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl CueExtractor {
    pub fn new() -> Self {
        Self {
            state: State::Scanning,
            cues: Vec::new(),
        }
    }

    pub fn push_line(&mut self, line: &str) {
        let line = line.trim();

        if line.is_empty() || line == HEADER || line.starts_with(COMMENT_MARKER) {
            return;
        }

        // Sequence numbers used by some dialects
        if line.chars().all(|c| c.is_ascii_digit()) {
            return;
        }

        if let Some(start) = parse_start(line) {
            self.flush();
            self.state = State::InCue(Cue {
                start_timestamp: start.to_lrc_timestamp(),
                text: String::new(),
            });
            return;
        }

        if let State::InCue(cue) = &mut self.state {
            let clean = strip_markup(line);
            if !clean.is_empty() {
                if !cue.text.is_empty() {
                    cue.text.push(' ');
                }
                cue.text.push_str(&clean);
            }
        }
    }

    pub fn finish(mut self) -> Vec<Cue> {
        self.flush();
        self.cues
    }

    fn flush(&mut self) {
        if let State::InCue(cue) = std::mem::replace(&mut self.state, State::Scanning) {
            if !cue.text.is_empty() {
                self.cues.push(cue);
            }
        }
    }
}

/// Lines split on `\n`, `\r\n` or a bare `\r`.
fn split_lines(content: &str) -> impl Iterator<Item = &str> {
    content.lines().flat_map(|line| line.split('\r'))
}

/// Extract all cues from a subtitle document.
pub fn extract_cues(content: &str) -> Vec<Cue> {
    let mut extractor = CueExtractor::new();
    for line in split_lines(content) {
        extractor.push_line(line);
    }
    extractor.finish()
}
