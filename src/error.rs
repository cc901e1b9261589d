use thiserror::Error;

#[derive(Error, Debug)]
pub enum Vtt2LrcError {
    #[error("Encoder unavailable: {0}")]
    Encoder(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Vtt2LrcError>;
