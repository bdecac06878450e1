use shared::{CodecError, ProtocolError, SaveError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Save(#[from] SaveError),
    #[error("login rejected: {0}")]
    LoginRejected(String),
    #[error("server closed the connection")]
    Disconnected,
    #[error("not logged in")]
    NotLoggedIn,
}
