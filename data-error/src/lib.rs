use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArkIoError>;

#[derive(Error, Debug)]
pub enum ArkIoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Rejected options, reported before any I/O happens.
    #[error("Configuration error: {0}")]
    Config(String),
    /// Bytes that could not be decoded even after trimming
    /// a partial character off the front of the chunk.
    #[error("Failed to decode {encoding} text at byte {position}")]
    Decode {
        encoding: &'static str,
        position: u64,
    },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ArkIoError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl From<Box<dyn std::error::Error>> for ArkIoError {
    fn from(e: Box<dyn std::error::Error>) -> Self {
        Self::Other(anyhow::anyhow!(e.to_string()))
    }
}
