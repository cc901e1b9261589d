pub mod convert;
pub mod cue;
pub mod lrc;
pub mod naming;
pub mod timestamp;

pub use convert::{convert_file, convert_folder, ConvertResult};
pub use cue::{extract_cues, strip_markup, CueExtractor};
pub use lrc::{convert_to_lrc, LrcFormatter};
pub use naming::{get_output_file_name, sanitize_file_name, KNOWN_EXTENSIONS};
pub use timestamp::{parse_start, parse_timing_line, TimeComponents, TimingLine};

/// One timed lyric line: an LRC start stamp and its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    /// Already formatted, e.g. `[01:02.03]`.
    pub start_timestamp: String,
    pub text: String,
}
