//! HTTP/2 frame types produced and consumed by the stream layer.
//!
//! Only the frame kinds the stream state machine actually touches are
//! modeled here (HEADERS, DATA, RST_STREAM, PUSH_PROMISE, WINDOW_UPDATE).
//! SETTINGS/PING/GOAWAY/PRIORITY are connection-level concerns and are out
//! of scope; `Reason` still carries their error codes since RST_STREAM and
//! GOAWAY share the error-code space.

mod data;
mod head;
mod headers;
mod reset;
mod util;
mod window_update;

pub use self::data::Data;
pub use self::head::{Head, Kind, StreamId};
pub use self::headers::{Headers, Pseudo, PushPromise};
pub use self::reset::Reset;
pub use self::window_update::WindowUpdate;

pub const HEADER_LEN: usize = 9;

/// Default initial `SETTINGS_MAX_FRAME_SIZE`, per RFC 7540 §6.5.2.
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 16_384;

/// Errors produced while parsing a frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("frame header truncated")]
    Short,
    #[error("invalid length for frame kind")]
    InvalidPayloadLength,
    #[error("stream identifier must be non-zero")]
    InvalidStreamId,
    #[error("stream identifier must be zero")]
    ZeroStreamId,
}

/// HTTP/2 error codes (RFC 7540 §7). Only the subset this client can
/// originate or needs to recognize from the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reason(u32);

impl Reason {
    pub const NO_ERROR: Reason = Reason(0x0);
    pub const PROTOCOL_ERROR: Reason = Reason(0x1);
    pub const INTERNAL_ERROR: Reason = Reason(0x2);
    pub const FLOW_CONTROL_ERROR: Reason = Reason(0x3);
    pub const STREAM_CLOSED: Reason = Reason(0x5);
    pub const FRAME_SIZE_ERROR: Reason = Reason(0x6);
    pub const REFUSED_STREAM: Reason = Reason(0x7);
    pub const CANCEL: Reason = Reason(0x8);

    pub fn new(code: u32) -> Reason {
        Reason(code)
    }

    pub fn code(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match *self {
            Reason::NO_ERROR => "NO_ERROR",
            Reason::PROTOCOL_ERROR => "PROTOCOL_ERROR",
            Reason::INTERNAL_ERROR => "INTERNAL_ERROR",
            Reason::FLOW_CONTROL_ERROR => "FLOW_CONTROL_ERROR",
            Reason::STREAM_CLOSED => "STREAM_CLOSED",
            Reason::FRAME_SIZE_ERROR => "FRAME_SIZE_ERROR",
            Reason::REFUSED_STREAM => "REFUSED_STREAM",
            Reason::CANCEL => "CANCEL",
            _ => return write!(f, "UNKNOWN({})", self.0),
        };
        write!(f, "{}", name)
    }
}

/// A frame emitted onto, or observed coming off, the wire.
#[derive(Debug)]
pub enum Frame {
    Headers(Headers),
    PushPromise(PushPromise),
    Data(Data),
    Reset(Reset),
    WindowUpdate(WindowUpdate),
}

impl From<Headers> for Frame {
    fn from(src: Headers) -> Self {
        Frame::Headers(src)
    }
}

impl From<PushPromise> for Frame {
    fn from(src: PushPromise) -> Self {
        Frame::PushPromise(src)
    }
}

impl From<Data> for Frame {
    fn from(src: Data) -> Self {
        Frame::Data(src)
    }
}

impl From<Reset> for Frame {
    fn from(src: Reset) -> Self {
        Frame::Reset(src)
    }
}

impl From<WindowUpdate> for Frame {
    fn from(src: WindowUpdate) -> Self {
        Frame::WindowUpdate(src)
    }
}
