use std::path::PathBuf;
use thiserror::Error;

/// Violations of the framing layer. The connection must be closed.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("declared frame length {declared} exceeds the limit of {max} bytes")]
    FrameTooLarge { declared: u64, max: usize },
    #[error("stream ended in the middle of a frame ({buffered} bytes buffered)")]
    TruncatedFrame { buffered: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures turning a typed message into a frame body or back
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("unknown message type tag {0}")]
    UnknownType(u16),
    #[error("message body codec failure: {0}")]
    Body(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl From<bincode::Error> for CodecError {
    fn from(error: bincode::Error) -> Self {
        CodecError::Body(error)
    }
}

/// Failures of the save/load collaborator
#[derive(Error, Debug)]
pub enum SaveError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("no saved game at {0}")]
    Missing(PathBuf),
}
