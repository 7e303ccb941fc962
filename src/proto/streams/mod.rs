//! Stream collection: owns every live stream for one connection, the
//! deferred id allocator, and the unwritten-request queue. This is the
//! connection-facing surface; `connection.rs` drives it from the I/O loop.

mod flow_control;
mod pipeline;
mod push;
mod recv;
mod send;
mod state;
mod store;
mod stream;

pub(crate) use pipeline::Pipeline;
pub(crate) use state::Status;
pub(crate) use stream::PendingRequest;

use std::collections::VecDeque;

use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::codec::{RecvError, SendError};
use crate::frame::{self, Frame, Reason, StreamId};

use self::send::IdAllocator;
use self::store::{Key, Store};
use self::stream::Stream;

/// An opaque reference to a submitted request, held by `ResponseFuture` so
/// it can cancel the stream on drop without the client layer needing to
/// know anything about `Store`'s internals.
pub(crate) struct RequestHandle(Key);

pub(crate) struct Streams {
    store: Store,
    allocator: IdAllocator,
    unwritten: VecDeque<Key>,
    outbound: VecDeque<Frame>,
    scheme: String,
    initial_window_size: crate::proto::WindowSize,
}

impl Streams {
    pub fn new(scheme: impl Into<String>, initial_window_size: u32) -> Streams {
        Streams {
            store: Store::new(),
            allocator: IdAllocator::new(),
            unwritten: VecDeque::new(),
            outbound: VecDeque::new(),
            scheme: scheme.into(),
            initial_window_size: initial_window_size as crate::proto::WindowSize,
        }
    }

    /// Creates a stream in `Init`, binds the request to it, and queues it to
    /// be written. Returns the receiving half of the response channel.
    pub fn submit_request(
        &mut self,
        head: http::request::Parts,
        body: Option<bytes::Bytes>,
    ) -> (RequestHandle, oneshot::Receiver<crate::client::ResponseResult>) {
        let (tx, rx) = oneshot::channel();

        let key = self.store.insert_unassigned(Stream::new_init(self.initial_window_size));
        self.store[key].bind_request(PendingRequest {
            head,
            body,
            response_tx: tx,
        });
        self.unwritten.push_back(key);

        (RequestHandle(key), rx)
    }

    /// Pulls every currently-unwritten request off the queue and turns each
    /// into the frame(s) it should be written as. Popped in FIFO order, so
    /// two requests submitted back to back are sent, and therefore
    /// id-assigned, in that same order.
    pub fn poll_send(&mut self) -> Result<Vec<Frame>, SendError> {
        let mut frames: Vec<Frame> = self.outbound.drain(..).collect();

        while let Some(key) = self.unwritten.pop_front() {
            let stream = &mut self.store[key];

            // A body that doesn't fit the current send window fails that
            // one request rather than holding up the rest of the queue or
            // the whole flush -- this crate sends a whole body in one shot,
            // it doesn't pause and resume a partial one across flushes.
            if let Some(len) = stream.pending_body_len() {
                if len as crate::proto::WindowSize > stream.send_flow().available() {
                    debug!(len, available = %stream.send_flow().available(), "request body exceeds send window, failing request");
                    stream.fail_response(crate::error::Error::Send(SendError::FlowControlViolation));
                    continue;
                }
            }

            let (headers, body) = send::setup_next_request(stream, &mut self.allocator, &self.scheme)?;
            frames.push(Frame::Headers(headers));

            if let Some(body) = body {
                let stream = &mut self.store[key];
                stream
                    .send_flow()
                    .consume(body.len() as crate::proto::WindowSize)
                    .expect("checked against the available window above");
                let new_status = stream
                    .apply(state::Event::SendEndStream)
                    .map_err(|_| SendError::User(crate::codec::UserError::InactiveStreamId))?;
                let stream_id = stream.stream_id();
                trace!(%stream_id, status = %new_status, "stream transition");
                for chunk in fragment(body, frame::DEFAULT_MAX_FRAME_SIZE as usize) {
                    frames.push(Frame::Data(chunk.into_frame(stream_id)));
                }
            }
        }

        Ok(frames)
    }

    pub fn recv_headers(&mut self, headers: frame::Headers) -> Result<Vec<Frame>, RecvError> {
        let key = self.key_for(headers.stream_id())?;
        match recv::handle_headers(&mut self.store, key, headers)? {
            recv::Outcome::None => Ok(Vec::new()),
            recv::Outcome::WindowUpdate(n) => Ok(vec![window_update_frame(&self.store, key, n)]),
            recv::Outcome::RejectPush { child } => Ok(vec![Frame::Reset(recv::reject_push(&mut self.store, child))]),
        }
    }

    pub fn recv_data(&mut self, data: frame::Data) -> Result<Vec<Frame>, RecvError> {
        let key = self.key_for(data.stream_id())?;
        match recv::handle_data(&mut self.store, key, data)? {
            recv::Outcome::None => Ok(Vec::new()),
            recv::Outcome::WindowUpdate(n) => Ok(vec![window_update_frame(&self.store, key, n)]),
            recv::Outcome::RejectPush { child } => Ok(vec![Frame::Reset(recv::reject_push(&mut self.store, child))]),
        }
    }

    pub fn recv_reset(&mut self, reset: frame::Reset) -> Result<(), RecvError> {
        let key = self.key_for(reset.stream_id())?;
        recv::handle_rst_stream(&mut self.store, key, reset);
        Ok(())
    }

    /// Grows this stream's send window by the peer's advertised increment
    /// (RFC 7540 §6.9). The corresponding consume happens when a request
    /// body is fragmented into DATA frames in `poll_send`. The
    /// connection-level window (stream id 0) is a connection-level concern
    /// this crate leaves to the caller, so it's accepted and ignored here
    /// rather than looked up as a stream.
    pub fn recv_window_update(&mut self, update: frame::WindowUpdate) -> Result<(), RecvError> {
        if update.stream_id().is_zero() {
            return Ok(());
        }

        let key = self.key_for(update.stream_id())?;
        self.store[key]
            .send_flow()
            .grow(update.size_increment() as crate::proto::WindowSize)
            .map_err(|_| RecvError::FlowControlViolation)
    }

    /// A PUSH_PROMISE frame arrives whole (this crate does not model
    /// CONTINUATION as a separate inbound event -- frame parsing already
    /// reassembled it), so reservation and the policy decision happen back
    /// to back.
    pub fn recv_push_promise(&mut self, promise: frame::PushPromise) -> Result<Vec<Frame>, RecvError> {
        let parent = self.key_for(promise.stream_id())?;
        let child = recv::reserve_promised_child(&mut self.store, &promise, self.initial_window_size);
        self.store[parent].pending_promised_child = Some(child);

        let (_child, outcome) = recv::finish_push_promise(&mut self.store, parent, promise);
        match outcome {
            recv::Outcome::RejectPush { child } => Ok(vec![Frame::Reset(recv::reject_push(&mut self.store, child))]),
            recv::Outcome::None => Ok(Vec::new()),
            recv::Outcome::WindowUpdate(n) => Ok(vec![window_update_frame(&self.store, child, n)]),
        }
    }

    /// Local reset, e.g. from `ResponseFuture` dropping before the response
    /// arrived. A no-op if the stream never got as far as being assigned an
    /// id -- and idempotent on an already-closed stream. The RST_STREAM, if
    /// any, is queued and goes out on the next `poll_send`.
    pub fn cancel(&mut self, handle: RequestHandle, reason: Reason) {
        let key = handle.0;
        let stream = &mut self.store[key];
        if stream.status().is_closed() {
            return;
        }

        let had_id = !stream.stream_id().is_unassigned();
        let _ = stream.apply(state::Event::Reset);
        stream.fail_response(crate::error::Error::Reset(reason));
        self.unwritten.retain(|&k| k != key);

        if had_id {
            let stream_id = self.store[key].stream_id();
            debug!(%stream_id, %reason, "local cancel, queuing RST_STREAM");
            self.outbound.push_back(Frame::Reset(frame::Reset::new(stream_id, reason)));
        } else {
            trace!("local cancel of a stream with no assigned id, nothing to send");
        }
    }

    fn key_for(&mut self, id: StreamId) -> Result<Key, RecvError> {
        self.store
            .find_by_id(id)
            .map(|ptr| ptr.key())
            .ok_or(RecvError::UnknownStream(id.into()))
    }
}

fn window_update_frame(store: &Store, key: Key, increment: crate::proto::WindowSize) -> Frame {
    Frame::WindowUpdate(frame::WindowUpdate::new(store[key].stream_id(), increment as u32))
}

struct Chunk(bytes::Bytes, bool);

impl Chunk {
    fn into_frame(self, stream_id: StreamId) -> frame::Data {
        let mut data = frame::Data::new(stream_id, self.0);
        data.set_end_stream(self.1);
        data
    }
}

/// Splits a request body into DATA-sized chunks. The send window has
/// already been consumed for the whole body by the time this runs (see
/// `poll_send`); this only decides frame boundaries.
fn fragment(body: bytes::Bytes, max_frame_size: usize) -> Vec<Chunk> {
    if body.is_empty() {
        return vec![Chunk(body, true)];
    }

    let mut chunks = Vec::new();
    let mut rest = body;
    while !rest.is_empty() {
        let take = rest.len().min(max_frame_size);
        let piece = rest.split_to(take);
        let last = rest.is_empty();
        chunks.push(Chunk(piece, last));
    }
    chunks
}
