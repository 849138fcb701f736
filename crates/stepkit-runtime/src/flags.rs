#![forbid(unsafe_code)]

//! Rendering-facing state flags.

use bitflags::bitflags;

bitflags! {
    /// Compact state word handed to the rendering layer via
    /// [`StepperView`](crate::controller::StepperView).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StateFlags: u8 {
        /// Quantity sits at the configured minimum.
        const AT_MIN = 1 << 0;
        /// Quantity sits at the configured maximum.
        const AT_MAX = 1 << 1;
        /// A commit is in flight (or awaiting an automatic retry).
        const LOADING = 1 << 2;
        /// A removal is inside its undo window.
        const PENDING_REMOVAL = 1 << 3;
        /// The control is disabled.
        const DISABLED = 1 << 4;
        /// A press-and-hold session is active.
        const HELD = 1 << 5;
        /// The removal finalized; the control is terminally removed.
        const REMOVED = 1 << 6;
    }
}
