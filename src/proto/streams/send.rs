//! Outgoing request binder: turns a bound, unwritten request into a
//! HEADERS frame, assigning the stream its wire id at the moment of
//! serialization so that id order matches send order rather than creation
//! order (RFC 7540 §5.1.1).

use tracing::{debug, trace};

use crate::codec::{SendError, UserError};
use crate::frame::{self, Headers, Pseudo, StreamId};
use crate::proto::streams::state::Event;
use crate::proto::streams::stream::Stream;

/// Hands out the next client-initiated (odd) stream id. Lives on the
/// connection, not the stream, so that two streams racing to be serialized
/// can never be assigned the same id.
#[derive(Debug)]
pub(crate) struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn new() -> IdAllocator {
        IdAllocator { next: 1 }
    }

    pub fn allocate(&mut self) -> StreamId {
        let id = StreamId::from(self.next);
        self.next += 2;
        id
    }
}

/// Produces the HEADERS frame for a stream's bound request, assigning it a
/// stream id if it does not have one yet, and applies the resulting send
/// transition. The HPACK block itself is encoded later, when the connection
/// actually serializes the frame -- this only builds the decoded shape.
/// Returns the frame plus any request body to fragment into DATA frames
/// afterward.
pub(crate) fn setup_next_request(
    stream: &mut Stream,
    allocator: &mut IdAllocator,
    scheme: &str,
) -> Result<(Headers, Option<bytes::Bytes>), SendError> {
    if !stream.is_request_bound() {
        return Err(SendError::User(UserError::InactiveStreamId));
    }

    let head = stream
        .take_pending_head()
        .ok_or(SendError::User(UserError::InactiveStreamId))?;
    let body = stream.take_pending_body();

    if stream.stream_id().is_unassigned() {
        let id = allocator.allocate();
        stream.assign_id(id);
        debug!(stream_id = %id, "assigned stream id at flush time");
    }

    let authority = head
        .uri
        .authority()
        .map(|a| a.as_str().to_owned())
        .unwrap_or_default();
    let path = head
        .uri
        .path_and_query()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "/".to_owned());

    let pseudo = Pseudo::request(head.method.clone(), scheme, &authority, &path);
    let end_stream = body.is_none();

    let frame = frame::Headers::from_decoded(stream.stream_id(), end_stream, pseudo, head.headers);

    let new_status = stream
        .apply(Event::SendHeaders { end_stream })
        .map_err(|_| SendError::User(UserError::InactiveStreamId))?;
    trace!(stream_id = %stream.stream_id(), status = %new_status, "stream transition");

    Ok((frame, body))
}
