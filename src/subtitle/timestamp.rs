// WebVTT timing lines
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// `[H:]MM:SS.mmm --> [H:]MM:SS.mmm`, hours optional on either side.
fn timing_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?:(\d{1,2}):)?(\d{2}):(\d{2})\.(\d{3})\s+-->\s+(?:(\d{1,2}):)?(\d{2}):(\d{2})\.(\d{3})",
        )
        .expect("Invalid regex")
    })
}

/// One side of a timing line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeComponents {
    pub hours: Option<u32>,
    pub minutes: u32,
    pub seconds: u32,
    pub milliseconds: u32,
}

impl TimeComponents {
    /// Minutes including the hour field; never wrapped.
    pub fn total_minutes(&self) -> u32 {
        self.hours.unwrap_or(0) * 60 + self.minutes
    }

    /// Milliseconds truncated to hundredths.
    pub fn centiseconds(&self) -> u32 {
        self.milliseconds / 10
    }

    /// `[MM:SS.CC]`. Minutes above 99 keep all their digits.
    pub fn to_lrc_timestamp(&self) -> String {
        format!(
            "[{:02}:{:02}.{:02}]",
            self.total_minutes(),
            self.seconds,
            self.centiseconds()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingLine {
    pub start: TimeComponents,
    pub end: TimeComponents,
}

/// Parse a timing line. `None` means the line is not a timing line.
pub fn parse_timing_line(line: &str) -> Option<TimingLine> {
    let caps = timing_line_regex().captures(line)?;
    Some(TimingLine {
        start: components(&caps, 1)?,
        end: components(&caps, 5)?,
    })
}

/// Start time of a timing line, if `line` is one.
pub fn parse_start(line: &str) -> Option<TimeComponents> {
    parse_timing_line(line).map(|t| t.start)
}

fn components(caps: &Captures<'_>, first: usize) -> Option<TimeComponents> {
    let field = |i: usize| caps.get(first + i).map(|m| m.as_str().parse::<u32>());
    Some(TimeComponents {
        hours: field(0).transpose().ok()?,
        minutes: field(1)?.ok()?,
        seconds: field(2)?.ok()?,
        milliseconds: field(3)?.ok()?,
    })
}
