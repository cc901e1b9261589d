// LRC lyrics format
use super::cue::extract_cues;
use super::Cue;

pub struct LrcFormatter {
    pub title: String,
}

impl LrcFormatter {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    pub fn format(&self, cues: &[Cue]) -> String {
        let mut output = format!("[ti:{}]\n", self.title);

        for cue in cues {
            output.push_str(&cue.start_timestamp);
            output.push_str(&cue.text);
            output.push('\n');
        }

        output
    }
}

/// Convert a WebVTT document to LRC text titled `title`.
pub fn convert_to_lrc(vtt_content: &str, title: &str) -> String {
    LrcFormatter::new(title).format(&extract_cues(vtt_content))
}
