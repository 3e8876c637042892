use data_error::ArkIoError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("Couldn't mute output: {0}")]
    SilenceError(io::Error),

    #[error(transparent)]
    IoError(#[from] io::Error),

    #[error(transparent)]
    ArkIoError(#[from] ArkIoError),
}
