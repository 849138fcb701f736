#![forbid(unsafe_code)]

//! Pending-removal bookkeeping.
//!
//! A removal does not destroy anything immediately: the value is held in
//! an `UndoEntry` until `expires_at`, during which the control renders as
//! absent and an `Undo` intent restores it. Only one entry may exist per
//! control; a removal issued while one is pending is rejected so two
//! expiry deadlines can never race, and at most one finalization fires
//! per removal cycle.

use stepkit_core::Quantity;
use web_time::Instant;

#[derive(Debug, Clone, Copy)]
pub(crate) struct UndoEntry {
    removed_value: Quantity,
    expires_at: Instant,
}

impl UndoEntry {
    pub(crate) fn new(removed_value: Quantity, expires_at: Instant) -> Self {
        Self {
            removed_value,
            expires_at,
        }
    }

    pub(crate) fn removed_value(&self) -> Quantity {
        self.removed_value
    }

    pub(crate) fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub(crate) fn expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}
