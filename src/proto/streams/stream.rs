//! The per-exchange stream record: status, flow-control windows, the
//! binding to the application's request/response pair, and the response
//! byte pipeline.

use std::cell::RefCell;
use std::rc::Rc;

use http::request::Parts as RequestParts;
use tokio::sync::oneshot;

use crate::client::{RecvStream, ResponseResult};
use crate::frame::StreamId;
use crate::proto::{WindowSize, DEFAULT_INITIAL_WINDOW_SIZE};

use super::flow_control::FlowControl;
use super::pipeline::Pipeline;
use super::state::{self, Event, Status, StreamError};
use super::store::Key;

/// An outbound request still waiting for `setup_next_request` to bind it to
/// a stream and put it on the wire.
pub(crate) struct PendingRequest {
    pub head: RequestParts,
    pub body: Option<bytes::Bytes>,
    pub response_tx: oneshot::Sender<ResponseResult>,
}

pub(crate) struct Stream {
    id: StreamId,
    status: Status,
    send_flow: FlowControl,
    recv_flow: FlowControl,
    response_tx: Option<oneshot::Sender<ResponseResult>>,
    pending_head: Option<RequestParts>,
    pending_body: Option<bytes::Bytes>,
    pipeline: Option<Rc<RefCell<Pipeline>>>,
    pub pending_promised_child: Option<Key>,
}

impl Stream {
    pub fn new_init(initial_window_size: WindowSize) -> Stream {
        Stream::new(StreamId::UNASSIGNED, Status::Init, initial_window_size)
    }

    pub fn new_idle(id: StreamId) -> Stream {
        Stream::new(id, Status::Idle, DEFAULT_INITIAL_WINDOW_SIZE as WindowSize)
    }

    pub fn reserved_remote(id: StreamId, initial_window_size: WindowSize) -> Stream {
        Stream::new(id, Status::ReservedRemote, initial_window_size)
    }

    fn new(id: StreamId, status: Status, initial_window_size: WindowSize) -> Stream {
        Stream {
            id,
            status,
            send_flow: FlowControl::new(initial_window_size),
            recv_flow: FlowControl::new(initial_window_size),
            response_tx: None,
            pending_head: None,
            pending_body: None,
            pipeline: None,
            pending_promised_child: None,
        }
    }

    pub fn stream_id(&self) -> StreamId {
        self.id
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn send_flow(&mut self) -> &mut FlowControl {
        &mut self.send_flow
    }

    pub fn recv_flow(&mut self) -> &mut FlowControl {
        &mut self.recv_flow
    }

    pub fn is_request_bound(&self) -> bool {
        self.response_tx.is_some()
    }

    pub fn take_pending_body(&mut self) -> Option<bytes::Bytes> {
        self.pending_body.take()
    }

    pub fn pending_body_len(&self) -> Option<usize> {
        self.pending_body.as_ref().map(|b| b.len())
    }

    pub fn take_pending_head(&mut self) -> Option<RequestParts> {
        self.pending_head.take()
    }

    /// Applies a validated event. The id is assigned exactly when the
    /// stream leaves `Init`, never before or after.
    pub fn apply(&mut self, event: Event) -> Result<Status, StreamError> {
        let to = state::transition(self.status, event)?;
        self.status = to;
        Ok(to)
    }

    pub fn assign_id(&mut self, id: StreamId) {
        debug_assert!(self.status == Status::Init);
        self.id = id;
        self.status = Status::Idle;
    }

    pub fn bind_request(&mut self, pending: PendingRequest) {
        self.response_tx = Some(pending.response_tx);
        self.pending_head = Some(pending.head);
        self.pending_body = pending.body;
    }

    /// Lazily creates the response pipeline on first HEADERS or DATA frame.
    pub fn pipeline(&mut self) -> Rc<RefCell<Pipeline>> {
        self.pipeline
            .get_or_insert_with(|| Rc::new(RefCell::new(Pipeline::new())))
            .clone()
    }

    pub fn pipeline_handle(&self) -> Option<Rc<RefCell<Pipeline>>> {
        self.pipeline.clone()
    }

    /// Resolves the response future with a materialized response, handing
    /// over a reader for the body pipeline. Consumes the binding: once the
    /// application has the response object, the stream's job is done with
    /// respect to that half of the exchange.
    pub fn fulfill_response(&mut self, response: http::Response<RecvStream>) {
        if let Some(tx) = self.response_tx.take() {
            let _ = tx.send(Ok(response));
        }
    }

    pub fn fail_response(&mut self, err: crate::error::Error) {
        if let Some(tx) = self.response_tx.take() {
            let _ = tx.send(Err(err));
        } else if let Some(pipeline) = &self.pipeline {
            pipeline.borrow_mut().fail(err);
        }
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// A locally initiated stream has no id until it's assigned one, and
        /// assigning one always moves it out of `Init` in the same step --
        /// the two never drift apart.
        #[test]
        fn id_and_init_status_move_together(window in 0..crate::proto::MAX_WINDOW_SIZE, id in 1u32..u32::MAX - 1) {
            let mut stream = Stream::new_init(window);
            prop_assert!(stream.stream_id().is_unassigned());
            prop_assert_eq!(stream.status(), Status::Init);

            stream.assign_id(StreamId::from(id));
            prop_assert!(!stream.stream_id().is_unassigned());
            prop_assert_ne!(stream.status(), Status::Init);
        }

        /// A stream constructed already bound to an id (the remote-reserved
        /// push-promise case) never reports `Init`.
        #[test]
        fn remotely_reserved_stream_is_never_init(window in 0..crate::proto::MAX_WINDOW_SIZE, id in 1u32..u32::MAX - 1) {
            let stream = Stream::reserved_remote(StreamId::from(id), window);
            prop_assert!(!stream.stream_id().is_unassigned());
            prop_assert_ne!(stream.status(), Status::Init);
        }
    }
}
