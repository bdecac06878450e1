use shared::model::{ObjectId, UserId};
use shared::{CodecError, ProtocolError};
use thiserror::Error;

/// Errors raised while serving clients. None of them escape the tick loop.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("connection {connection} is not bound to user {claimed}")]
    Unauthorized { connection: u32, claimed: UserId },
    #[error("unknown user {0}")]
    UnknownUser(UserId),
    #[error("tank {0} not found")]
    TankNotFound(ObjectId),
    #[error("object {0} is not a tank")]
    NotATank(ObjectId),
    #[error("login rejected for {username}: {reason}")]
    LoginRejected { username: String, reason: String },
    #[error("server full ({max} clients)")]
    ServerFull { max: usize },
}
