use std::path::PathBuf;

use percorsi_client::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("static root {0:?} is not a directory")]
    NotADirectory(PathBuf),
    #[error("failed to bind or serve: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum HeadlessError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] TransportError),
}
