//! The top-level error type applications match on.

use crate::codec::{RecvError, SendError, UserError};
use crate::frame::Reason;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid usage: {0}")]
    User(#[from] UserError),
    #[error("failed to send: {0}")]
    Send(#[from] SendError),
    #[error("failed to receive: {0}")]
    Recv(#[from] RecvError),
    #[error("stream reset by peer: {0}")]
    Reset(Reason),
    #[error("connection closed")]
    ConnectionClosed,
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Send(SendError::Io(err))
    }
}
