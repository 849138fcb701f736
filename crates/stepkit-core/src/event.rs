#![forbid(unsafe_code)]

//! Intent and effect vocabulary.
//!
//! The rendering layer talks to a controller exclusively through
//! [`Intent`] values, and the controller answers exclusively with
//! [`Effect`] values. Effects are data describing side effects the host
//! should perform (run a commit, surface a rejection, drop a row) — the
//! core never calls out.

use web_time::Instant;

use crate::error::{CommitError, RejectReason};
use crate::quantity::Quantity;

/// Which way a press-and-hold session steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Direction {
    /// Repeated increments.
    Up,
    /// Repeated decrements.
    Down,
}

/// Origin of an applied change, carried on [`Effect::QuantityChanged`]
/// so audit/analytics consumers can distinguish how a value moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum ChangeKind {
    /// A single tap on increment/decrement.
    Tap,
    /// A synthetic tick from a press-and-hold session.
    RepeatTick,
    /// A value typed or picked directly.
    ManualEntry,
    /// A change requested by code rather than a user gesture.
    Programmatic,
}

/// A user (or host) intention, fed to `StepperController::apply`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Step up by one step size.
    Increment,
    /// Step down by one step size.
    Decrement,
    /// Propose an explicit value (manual entry).
    SetValue(Quantity),
    /// Request removal; enters the undo window.
    Remove,
    /// Reverse a pending removal before it finalizes.
    Undo,
    /// A press-and-hold gesture began on the given control.
    PressStart(Direction),
    /// The press-and-hold gesture ended.
    PressEnd,
    /// Enable or disable the control. Disabling cancels any hold session.
    SetEnabled(bool),
}

/// Pairs a [`Effect::Commit`] request with its later resolution.
///
/// Tokens from superseded or disposed commits are stale; resolving a
/// stale token is a no-op rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct CommitToken(u64);

impl CommitToken {
    /// Build a token from its raw id.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id.
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Side effects emitted by a controller for the host to act on.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// A change was applied. Fires once per applied change.
    QuantityChanged {
        /// Value after the change.
        new: Quantity,
        /// Value before the change.
        old: Quantity,
        /// How the change originated.
        kind: ChangeKind,
    },
    /// The value arrived at the minimum. Fires once per arrival.
    MinReached,
    /// The value arrived at the maximum. Fires once per arrival.
    MaxReached,
    /// A proposal was turned down.
    ValidationRejected {
        /// Value at the time of the attempt.
        current: Quantity,
        /// The declined proposal.
        attempted: Quantity,
        /// Why it was declined.
        reason: RejectReason,
    },
    /// Run the external commit operation for `target` and answer with
    /// `commit_resolved(token, ..)`.
    Commit {
        /// Value to persist.
        target: Quantity,
        /// Token to echo back on resolution.
        token: CommitToken,
    },
    /// A commit attempt failed. Never swallowed: every failure surfaces.
    CommitFailed {
        /// The value that failed to persist.
        target: Quantity,
        /// The host-supplied failure.
        error: CommitError,
        /// True when an automatic retry is scheduled.
        will_retry: bool,
    },
    /// The displayed value was rolled back after exhausted commit failure.
    Reverted {
        /// Value that was rolled back.
        from: Quantity,
        /// Restored (last confirmed) value.
        to: Quantity,
    },
    /// A removal entered its undo window; the row should render as absent.
    RemovalPending {
        /// The value that will be restored on undo.
        value: Quantity,
        /// When the removal finalizes unless undone.
        expires_at: Instant,
    },
    /// The undo window elapsed. Fires exactly once per removal cycle.
    RemovalFinalized {
        /// The removed value.
        value: Quantity,
    },
    /// A pending removal was reversed.
    RemovalUndone {
        /// The restored value.
        value: Quantity,
    },
    /// A commit became in-flight (`true`) or settled (`false`).
    LoadingChanged(bool),
}

impl Effect {
    /// Short name for logging and assertions.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::QuantityChanged { .. } => "quantity_changed",
            Self::MinReached => "min_reached",
            Self::MaxReached => "max_reached",
            Self::ValidationRejected { .. } => "validation_rejected",
            Self::Commit { .. } => "commit",
            Self::CommitFailed { .. } => "commit_failed",
            Self::Reverted { .. } => "reverted",
            Self::RemovalPending { .. } => "removal_pending",
            Self::RemovalFinalized { .. } => "removal_finalized",
            Self::RemovalUndone { .. } => "removal_undone",
            Self::LoadingChanged(_) => "loading_changed",
        }
    }
}
