//! Incoming frame handlers: apply HEADERS, DATA, PUSH_PROMISE and
//! RST_STREAM payloads from the framer to a stream, feeding the response
//! pipeline and driving the state machine.

use http::{HeaderMap, StatusCode};
use tracing::{debug, trace};

use crate::codec::RecvError;
use crate::error::Error as TopError;
use crate::frame::{Data, Headers, PushPromise, Reason, Reset};
use crate::proto::WindowSize;

use super::push::{self, PromisedRequest};
use super::state::{Event, Status};
use super::store::{Key, Store};
use super::stream::Stream;

/// Refill threshold for recv-window WINDOW_UPDATEs: once the available
/// window drops below half the initial value, the connection schedules a
/// refill back up to the initial value.
pub(crate) const WINDOW_UPDATE_THRESHOLD_RATIO: f64 = 0.5;

pub(crate) enum Outcome {
    /// Nothing further to emit.
    None,
    /// Emit a WINDOW_UPDATE for this stream, refilling by this amount.
    WindowUpdate(WindowSize),
    /// Reject a push-promise child: emit RST_STREAM(REFUSED_STREAM) on the
    /// child's id.
    RejectPush { child: Key },
}

/// HEADERS on a stream already past `ReservedRemote` is either the response
/// to a request this client sent, or -- if it carries no method/status --
/// trailers following a response body.
pub(crate) fn handle_headers(store: &mut Store, key: Key, headers: Headers) -> Result<Outcome, RecvError> {
    let end_stream = headers.is_end_stream();
    let (pseudo, fields) = headers.into_parts();

    let stream = &mut store[key];
    trace!(stream_id = %stream.stream_id(), status = %stream.status(), end_stream, "recv HEADERS");
    stream.pipeline();

    if pseudo.is_trailers() {
        return apply_trailers(stream, fields, end_stream);
    }

    let event = if stream.status() == Status::ReservedRemote {
        Event::RecvHeaders { end_stream }
    } else if end_stream {
        Event::RecvEndStream
    } else {
        let status_code = pseudo.status.unwrap_or(StatusCode::OK);
        let response = build_response(status_code, fields, stream);
        stream.fulfill_response(response);
        return Ok(Outcome::None);
    };

    let new_status = stream
        .apply(event)
        .map_err(|_| RecvError::InvalidTransition("headers"))?;
    trace!(stream_id = %stream.stream_id(), status = %new_status, "stream transition");

    let status_code = pseudo.status.unwrap_or(StatusCode::OK);
    let response = build_response(status_code, fields, stream);
    stream.fulfill_response(response);

    if new_status.is_recv_closed() {
        if let Some(pipeline) = stream.pipeline_handle() {
            pipeline.borrow_mut().finish();
        }
    }

    Ok(Outcome::None)
}

fn apply_trailers(stream: &mut Stream, fields: HeaderMap, end_stream: bool) -> Result<Outcome, RecvError> {
    if !end_stream {
        return Err(RecvError::InvalidTransition("trailers without END_STREAM"));
    }

    let new_status = stream
        .apply(Event::RecvEndStream)
        .map_err(|_| RecvError::InvalidTransition("trailers"))?;
    trace!(stream_id = %stream.stream_id(), status = %new_status, "recv trailers");

    if let Some(pipeline) = stream.pipeline_handle() {
        let mut pipeline = pipeline.borrow_mut();
        pipeline.set_trailers(fields);
        if new_status.is_recv_closed() {
            pipeline.finish();
        }
    }

    Ok(Outcome::None)
}

fn build_response(
    status: StatusCode,
    fields: HeaderMap,
    stream: &mut Stream,
) -> http::Response<crate::client::RecvStream> {
    let pipeline = stream.pipeline();
    let body = crate::client::RecvStream::new(pipeline);

    let mut builder = http::Response::builder().status(status);
    if let Some(headers) = builder.headers_mut() {
        *headers = fields;
    }
    builder
        .body(body)
        .expect("status line already validated during hpack decode")
}

pub(crate) fn handle_data(store: &mut Store, key: Key, data: Data) -> Result<Outcome, RecvError> {
    let stream = &mut store[key];

    if stream.status().is_recv_closed() {
        return Err(RecvError::InvalidTransition("DATA after END_STREAM"));
    }

    let len = data.flow_controlled_len() as WindowSize;
    trace!(stream_id = %stream.stream_id(), len, "recv DATA");
    stream
        .recv_flow()
        .consume(len)
        .map_err(|_| RecvError::FlowControlViolation)?;

    let end_stream = data.is_end_stream();
    let payload = data.into_payload();

    if let Some(pipeline) = stream.pipeline_handle() {
        pipeline.borrow_mut().push_data(payload);
    }

    if end_stream {
        stream
            .apply(Event::RecvEndStream)
            .map_err(|_| RecvError::InvalidTransition("DATA end_stream"))?;
        if let Some(pipeline) = stream.pipeline_handle() {
            pipeline.borrow_mut().finish();
        }
    }

    let available = stream.recv_flow().available();
    let initial = stream.recv_flow().initial_size();
    if (available as f64) < (initial as f64) * WINDOW_UPDATE_THRESHOLD_RATIO {
        let refill = initial - available;
        stream
            .recv_flow()
            .grow(refill)
            .map_err(|_| RecvError::FlowControlViolation)?;
        debug!(stream_id = %stream.stream_id(), refill, "scheduling WINDOW_UPDATE");
        return Ok(Outcome::WindowUpdate(refill));
    }

    Ok(Outcome::None)
}

pub(crate) fn handle_rst_stream(store: &mut Store, key: Key, reset: Reset) -> Outcome {
    let stream = &mut store[key];
    debug!(stream_id = %stream.stream_id(), reason = %reset.reason(), "recv RST_STREAM");
    let _ = stream.apply(Event::Reset);
    stream.fail_response(TopError::Reset(reset.reason()));
    Outcome::None
}

/// Pre-creates the promised child stream for a PUSH_PROMISE and records the
/// pending link on the parent.
pub(crate) fn reserve_promised_child(store: &mut Store, promise: &PushPromise, initial_window_size: WindowSize) -> Key {
    trace!(promised_id = %promise.promised_id(), "recv PUSH_PROMISE, reserving child stream");
    let child = Stream::reserved_remote(promise.promised_id(), initial_window_size);
    store.insert(promise.promised_id(), child)
}

/// The promised header block finished decoding. Default policy always
/// rejects.
pub(crate) fn finish_push_promise(store: &mut Store, parent: Key, promise: PushPromise) -> (Key, Outcome) {
    let child = store.find_by_id(promise.promised_id()).expect("reserved before decode").key();
    let (pseudo, _fields) = promise.into_parts();
    let promised = PromisedRequest { pseudo };

    store[parent].pending_promised_child = None;

    let outcome = match push::decide(&promised) {
        push::Decision::Reject => Outcome::RejectPush { child },
    };

    (child, outcome)
}

pub(crate) fn reject_push(store: &mut Store, child: Key) -> Reset {
    let stream = &mut store[child];
    debug!(stream_id = %stream.stream_id(), "rejecting push promise by default policy");
    let _ = stream.apply(Event::Reset);
    Reset::new(stream.stream_id(), Reason::REFUSED_STREAM)
}
