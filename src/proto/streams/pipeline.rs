//! The response byte pipeline: an append-only aggregator of decoded DATA
//! payload that the application's body reader drains independently of the
//! rate frames arrive at.
//!
//! Decoded header fields are not funneled through here -- they become the
//! `http::Response` handed back through the request's oneshot channel as
//! soon as the HEADERS block finishes decoding, which is the natural split
//! once the callback-driven aggregator this was ported from (see the design
//! notes on the "EOF baton" pattern) is replaced by a pull-based reader. The
//! pipeline still owns trailers, since those arrive after the body and the
//! reader needs to ask for them only once body EOF is observed.

use std::collections::VecDeque;
use std::task::Waker;

use bytes::Bytes;
use http::HeaderMap;

/// `true` once the producer (the frame-receiving side) will never append
/// again, either because END_STREAM arrived or because the stream reset.
#[derive(Debug)]
pub(crate) struct Pipeline {
    chunks: VecDeque<Bytes>,
    trailers: Option<HeaderMap>,
    producer_done: bool,
    error: Option<crate::error::Error>,
    waker: Option<Waker>,
}

impl Pipeline {
    pub fn new() -> Pipeline {
        Pipeline {
            chunks: VecDeque::new(),
            trailers: None,
            producer_done: false,
            error: None,
            waker: None,
        }
    }

    pub fn push_data(&mut self, bytes: Bytes) {
        if !bytes.is_empty() {
            self.chunks.push_back(bytes);
        }
        self.wake();
    }

    pub fn set_trailers(&mut self, trailers: HeaderMap) {
        self.trailers = Some(trailers);
    }

    /// Marks the producer finished. `status` reflects the stream status
    /// *after* the transition that triggered this call; EOF is only visible
    /// to the consumer once that status is itself terminal (HALFCLOSED_REMOTE
    /// or CLOSED), per the pipeline's EOF-gating rule.
    pub fn finish(&mut self) {
        self.producer_done = true;
        self.wake();
    }

    pub fn fail(&mut self, err: crate::error::Error) {
        self.error = Some(err);
        self.producer_done = true;
        self.wake();
    }

    /// Pops the next chunk if one is buffered. Returns `None` either because
    /// nothing is buffered yet (caller should register a waker and suspend)
    /// or because the pipeline is drained and done (caller should treat
    /// that as EOF by separately checking `is_eof`).
    pub fn pop_data(&mut self) -> Option<Bytes> {
        self.chunks.pop_front()
    }

    pub fn has_buffered(&self) -> bool {
        !self.chunks.is_empty()
    }

    pub fn take_error(&mut self) -> Option<crate::error::Error> {
        self.error.take()
    }

    /// `finish` is only ever called once the stream has reached a
    /// recv-closed status (HALFCLOSED_REMOTE or CLOSED), so `producer_done`
    /// alone already captures EOF correctly.
    pub fn is_eof(&self) -> bool {
        self.chunks.is_empty() && self.producer_done
    }

    pub fn take_trailers(&mut self) -> Option<HeaderMap> {
        self.trailers.take()
    }

    pub fn register_waker(&mut self, waker: &Waker) {
        self.waker = Some(waker.clone());
    }

    fn wake(&mut self) {
        if let Some(waker) = self.waker.take() {
            waker.wake();
        }
    }
}
