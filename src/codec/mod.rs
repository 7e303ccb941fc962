//! Errors surfaced at the boundary between the application and the stream
//! layer, split three ways: mistakes the caller made (`UserError`), failures
//! while writing to the peer (`SendError`), and failures while interpreting
//! what the peer sent (`RecvError`).

use crate::frame::Reason;

/// The caller asked for something the protocol does not allow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserError {
    #[error("stream is not open for sending")]
    InactiveStreamId,
}

/// A frame could not be written to the peer.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error(transparent)]
    User(#[from] UserError),
    #[error("request body does not fit the stream's send window")]
    FlowControlViolation,
    #[error("i/o error writing frame: {0}")]
    Io(#[from] std::io::Error),
}

/// A frame received from the peer could not be applied to the stream state.
#[derive(Debug, thiserror::Error)]
pub enum RecvError {
    #[error("stream {0} does not exist")]
    UnknownStream(u32),
    #[error("invalid state transition: {0}")]
    InvalidTransition(&'static str),
    #[error("remote exceeded the advertised flow control window")]
    FlowControlViolation,
    #[error("frame parse error: {0}")]
    Frame(#[from] crate::frame::Error),
    #[error("hpack error: {0}")]
    Hpack(#[from] crate::hpack::Error),
    #[error("peer reset the stream: {0}")]
    Reset(Reason),
    #[error("i/o error reading frame: {0}")]
    Io(#[from] std::io::Error),
}
