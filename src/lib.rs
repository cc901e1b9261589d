pub mod audio;
pub mod config;
pub mod error;
pub mod events;
pub mod interactive;
pub mod storage;
pub mod subtitle;

pub use audio::{ExtractError, ExtractResult, ExtractionOrchestrator, Transcoder};
pub use config::{Config, Mp3Mode};
pub use error::{Result, Vtt2LrcError};
pub use events::{BatchEvent, BatchOutcome, BatchStatus, EventSender};
pub use storage::{Entry, LocalStorage, Storage};
pub use subtitle::{
    convert_file, convert_folder, convert_to_lrc, get_output_file_name, ConvertResult, Cue,
};
