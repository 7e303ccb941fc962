//! The stream state machine itself (RFC 7540 §5.1). Pure: no I/O, no
//! knowledge of frames beyond the event that drives a transition.

use std::fmt;

/// One of the eight states a stream can be in. `Init` precedes stream-id
/// assignment for locally initiated streams; `Idle` is the analogous
/// pre-send state once an id is known (either because the peer created the
/// stream, or because a local stream has been assigned one).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Init,
    Idle,
    ReservedLocal,
    ReservedRemote,
    Open,
    HalfClosedLocal,
    HalfClosedRemote,
    Closed,
}

impl Status {
    pub fn is_closed(&self) -> bool {
        matches!(self, Status::Closed)
    }

    pub fn is_send_closed(&self) -> bool {
        matches!(self, Status::HalfClosedLocal | Status::Closed)
    }

    pub fn is_recv_closed(&self) -> bool {
        matches!(self, Status::HalfClosedRemote | Status::Closed)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Init => "INIT",
            Status::Idle => "IDLE",
            Status::ReservedLocal => "RESERVED_LOCAL",
            Status::ReservedRemote => "RESERVED_REMOTE",
            Status::Open => "OPEN",
            Status::HalfClosedLocal => "HALFCLOSED_LOCAL",
            Status::HalfClosedRemote => "HALFCLOSED_REMOTE",
            Status::Closed => "CLOSED",
        };
        f.write_str(s)
    }
}

/// An event that may drive a transition. Carries just enough information to
/// pick the correct arm of the RFC 7540 §5.1 table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The local side sends a HEADERS frame (request headers).
    SendHeaders { end_stream: bool },
    /// The stream is reserved as the promised child of a PUSH_PROMISE.
    RecvAsPromisedChild,
    /// The local side receives HEADERS on a reserved or open stream.
    RecvHeaders { end_stream: bool },
    /// END_STREAM observed on an inbound HEADERS or DATA frame, beyond the
    /// one carried by `RecvHeaders` (i.e. DATA's own END_STREAM).
    RecvEndStream,
    /// END_STREAM sent on an outbound frame after the initial HEADERS.
    SendEndStream,
    /// RST_STREAM, sent or received; terminal from any non-closed state.
    Reset,
}

/// An event was not legal in the state it was applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal transition: {event:?} while in {from}")]
pub struct StreamError {
    pub from: Status,
    pub event: Event,
}

/// Validates and applies one transition, per the table in RFC 7540 §5.1.
/// Never performs I/O; callers enqueue frames and run side effects
/// separately once the transition itself has been accepted.
pub fn transition(from: Status, event: Event) -> Result<Status, StreamError> {
    use Event::*;
    use Status::*;

    let to = match (from, event) {
        (Init, SendHeaders { end_stream: true }) => HalfClosedLocal,
        (Init, SendHeaders { end_stream: false }) => Open,
        (Idle, SendHeaders { end_stream: true }) => HalfClosedLocal,
        (Idle, SendHeaders { end_stream: false }) => Open,
        (Idle, RecvAsPromisedChild) => ReservedRemote,

        (ReservedRemote, RecvHeaders { end_stream: true }) => Closed,
        (ReservedRemote, RecvHeaders { end_stream: false }) => HalfClosedLocal,

        (Open, RecvEndStream) => HalfClosedRemote,
        (Open, RecvHeaders { end_stream: true }) => HalfClosedRemote,
        (Open, SendEndStream) => HalfClosedLocal,

        (HalfClosedLocal, RecvEndStream) => Closed,
        (HalfClosedLocal, RecvHeaders { end_stream: true }) => Closed,
        (HalfClosedRemote, SendEndStream) => Closed,

        (state, Reset) if state != Closed => Closed,

        _ => return Err(StreamError { from, event }),
    };

    Ok(to)
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn any_status() -> impl Strategy<Value = Status> {
        prop_oneof![
            Just(Status::Init),
            Just(Status::Idle),
            Just(Status::ReservedLocal),
            Just(Status::ReservedRemote),
            Just(Status::Open),
            Just(Status::HalfClosedLocal),
            Just(Status::HalfClosedRemote),
            Just(Status::Closed),
        ]
    }

    fn any_event() -> impl Strategy<Value = Event> {
        prop_oneof![
            any::<bool>().prop_map(|end_stream| Event::SendHeaders { end_stream }),
            Just(Event::RecvAsPromisedChild),
            any::<bool>().prop_map(|end_stream| Event::RecvHeaders { end_stream }),
            Just(Event::RecvEndStream),
            Just(Event::SendEndStream),
            Just(Event::Reset),
        ]
    }

    proptest! {
        /// CLOSED is terminal -- no event ever transitions out of it.
        #[test]
        fn closed_is_terminal(event in any_event()) {
            prop_assert!(transition(Status::Closed, event).is_err());
        }

        /// A transition either reports the illegal pair back unchanged, or
        /// actually moves the state; it never silently no-ops on success.
        #[test]
        fn accepted_transition_reports_its_own_inputs_on_rejection(from in any_status(), event in any_event()) {
            if let Err(err) = transition(from, event) {
                prop_assert_eq!(err.from, from);
                prop_assert_eq!(err.event, event);
            }
        }
    }
}
