use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReelshelfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Entry not found: {0}")]
    NotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Not a file: {0}")]
    NotAFile(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    InvalidFolder(String),

    #[error("No valid videos found. Please ensure your videos are in MP4 or WebM format.")]
    NoValidVideos,

    #[error("Media error: {0}")]
    Media(String),
}

pub type Result<T> = std::result::Result<T, ReelshelfError>;
