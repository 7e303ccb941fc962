//! Per-stream flow-control windows (RFC 7540 §6.9). The send window is
//! allowed to go negative after a SETTINGS change lowers it out from under
//! in-flight data; the receive window never goes negative -- a peer that
//! sends more than it was granted is a connection-level FLOW_CONTROL_ERROR.

use crate::proto::WindowSize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("flow control window exceeded")]
pub struct FlowControlError;

#[derive(Debug, Clone, Copy)]
pub struct FlowControl {
    window: WindowSize,
    initial: WindowSize,
}

impl FlowControl {
    pub fn new(initial: WindowSize) -> FlowControl {
        FlowControl { window: initial, initial }
    }

    pub fn window_size(&self) -> WindowSize {
        self.window
    }

    /// The configured initial window this stream was created with --
    /// the refill target for WINDOW_UPDATE scheduling, not a live value.
    pub fn initial_size(&self) -> WindowSize {
        self.initial
    }

    pub fn available(&self) -> WindowSize {
        if self.window < 0 {
            0
        } else {
            self.window
        }
    }

    /// Applies a WINDOW_UPDATE increment, or a SETTINGS_INITIAL_WINDOW_SIZE
    /// delta, to this window.
    pub fn grow(&mut self, increment: WindowSize) -> Result<(), FlowControlError> {
        self.window = self
            .window
            .checked_add(increment)
            .ok_or(FlowControlError)?;

        if self.window > crate::proto::MAX_WINDOW_SIZE {
            return Err(FlowControlError);
        }

        Ok(())
    }

    /// Accounts for `len` bytes of DATA payload having moved in this
    /// window's direction. Fails if fewer than `len` bytes are available,
    /// which for the receive window indicates the peer violated the
    /// advertised limit.
    pub fn consume(&mut self, len: WindowSize) -> Result<(), FlowControlError> {
        if len > self.window {
            return Err(FlowControlError);
        }

        self.window -= len;
        Ok(())
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Grow(WindowSize),
        Consume(WindowSize),
    }

    fn any_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..crate::proto::MAX_WINDOW_SIZE).prop_map(Op::Grow),
            (0..crate::proto::MAX_WINDOW_SIZE).prop_map(Op::Consume),
        ]
    }

    proptest! {
        /// The window stays within `[0, MAX_WINDOW_SIZE]` no matter what
        /// sequence of grows and consumes is applied to it -- `consume` only
        /// ever succeeds for what's actually available, and `grow` is
        /// rejected once it would overflow the ceiling.
        #[test]
        fn window_stays_in_bounds(initial in 0..crate::proto::MAX_WINDOW_SIZE, ops in prop::collection::vec(any_op(), 0..32)) {
            let mut fc = FlowControl::new(initial);
            for op in ops {
                match op {
                    Op::Grow(inc) => { let _ = fc.grow(inc); }
                    Op::Consume(len) => { let _ = fc.consume(len); }
                }
                prop_assert!(fc.window_size() >= 0);
                prop_assert!(fc.window_size() <= crate::proto::MAX_WINDOW_SIZE);
            }
        }

        /// A successful consume always reduces the window by exactly the
        /// amount consumed, and only ever succeeds when that amount was
        /// actually available beforehand.
        #[test]
        fn consume_is_exact_and_bounded(initial in 0..crate::proto::MAX_WINDOW_SIZE, len in 0..crate::proto::MAX_WINDOW_SIZE) {
            let mut fc = FlowControl::new(initial);
            let before = fc.window_size();
            match fc.consume(len) {
                Ok(()) => {
                    prop_assert!(len <= before);
                    prop_assert_eq!(fc.window_size(), before - len);
                }
                Err(_) => prop_assert!(len > before),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_decrements_window() {
        let mut fc = FlowControl::new(100);
        fc.consume(40).unwrap();
        assert_eq!(fc.window_size(), 60);
    }

    #[test]
    fn consume_beyond_window_fails() {
        let mut fc = FlowControl::new(10);
        assert!(fc.consume(11).is_err());
    }

    #[test]
    fn grow_replenishes_after_consume() {
        let mut fc = FlowControl::new(10);
        fc.consume(10).unwrap();
        assert_eq!(fc.window_size(), 0);
        fc.grow(5).unwrap();
        assert_eq!(fc.window_size(), 5);
    }

    #[test]
    fn initial_size_is_fixed_at_construction_regardless_of_window_changes() {
        let mut fc = FlowControl::new(1_000);
        assert_eq!(fc.initial_size(), 1_000);
        fc.consume(400).unwrap();
        fc.grow(100).unwrap();
        assert_eq!(fc.initial_size(), 1_000, "initial_size tracks construction, not the live window");
    }
}
