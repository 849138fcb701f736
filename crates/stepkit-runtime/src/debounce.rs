#![forbid(unsafe_code)]

//! Debounce coalescing state.
//!
//! One `DebounceState` exists while taps are still landing faster than
//! the quiescence window. Every accepted change re-arms the deadline and
//! replaces the target; the baseline (the last value the outside world
//! confirmed) is captured when the burst starts and survives re-arms, so
//! a failed coalesced commit can revert to confirmed state.

use stepkit_core::Quantity;
use web_time::Instant;

#[derive(Debug, Clone, Copy)]
pub(crate) struct DebounceState {
    target: Quantity,
    baseline: Quantity,
    deadline: Instant,
}

impl DebounceState {
    pub(crate) fn new(target: Quantity, baseline: Quantity, deadline: Instant) -> Self {
        Self {
            target,
            baseline,
            deadline,
        }
    }

    /// Replace the target and push the deadline out. The baseline is
    /// sticky for the lifetime of the burst.
    pub(crate) fn rearm(&mut self, target: Quantity, deadline: Instant) {
        self.target = target;
        self.deadline = deadline;
    }

    pub(crate) fn target(&self) -> Quantity {
        self.target
    }

    pub(crate) fn baseline(&self) -> Quantity {
        self.baseline
    }

    pub(crate) fn deadline(&self) -> Instant {
        self.deadline
    }

    pub(crate) fn due(&self, now: Instant) -> bool {
        now >= self.deadline
    }
}
