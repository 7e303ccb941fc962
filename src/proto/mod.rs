//! Connection-level scaffolding around the stream layer: a minimal
//! single-threaded reader/writer loop, just enough to drive the streams in
//! `streams/` against a real `AsyncRead + AsyncWrite` transport. SETTINGS,
//! PING, GOAWAY and connection-level flow control are out of scope; the
//! peer's defaults are assumed.

mod connection;
pub(crate) mod streams;

pub(crate) use self::connection::Connection;
pub(crate) use self::streams::Streams;

/// Flow-control credit. Signed because a send window may go negative after
/// a SETTINGS change shrinks it out from under data already in flight.
pub type WindowSize = i32;

pub const DEFAULT_INITIAL_WINDOW_SIZE: u32 = 65_535;
pub const MAX_WINDOW_SIZE: WindowSize = (1 << 31) - 1;

/// Connection-wide tuning knobs. Only the handful of settings the stream
/// layer actually consults are exposed; the rest of SETTINGS negotiation is
/// a connection-level concern this crate does not implement.
#[derive(Debug, Clone)]
pub struct Config {
    pub initial_window_size: u32,
    pub max_frame_size: u32,
    pub scheme: String,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            initial_window_size: DEFAULT_INITIAL_WINDOW_SIZE,
            max_frame_size: crate::frame::DEFAULT_MAX_FRAME_SIZE,
            scheme: "https".to_owned(),
        }
    }
}
