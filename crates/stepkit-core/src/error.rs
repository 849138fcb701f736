#![forbid(unsafe_code)]

//! Error taxonomy for quantity controls.
//!
//! Bound violations and guard refusals are recoverable and reported as
//! [`RejectReason`] on rejection effects; they never escape as `Err`.
//! [`CommitError`] is the typed failure a host's commit operation hands
//! back, and [`ConfigError`] rejects unusable configurations up front.

use std::fmt;

/// Errors from fixed-point value construction and arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    /// Requested scale exceeds [`Quantity::MAX_SCALE`](crate::Quantity::MAX_SCALE).
    ScaleOutOfRange {
        /// The offending scale.
        scale: u8,
    },
    /// Two operands carry different scales.
    ScaleMismatch {
        /// Scale of the left operand.
        left: u8,
        /// Scale of the right operand.
        right: u8,
    },
    /// A step must be strictly positive.
    NonPositiveStep {
        /// The offending unit count.
        units: i64,
    },
    /// Arithmetic left the representable `i64` range.
    Overflow,
}

impl fmt::Display for QuantityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScaleOutOfRange { scale } => {
                write!(f, "scale {scale} exceeds the supported maximum")
            }
            Self::ScaleMismatch { left, right } => {
                write!(f, "mixed fixed-point scales: {left} vs {right}")
            }
            Self::NonPositiveStep { units } => {
                write!(f, "step size must be positive, got {units} units")
            }
            Self::Overflow => write!(f, "quantity arithmetic overflowed"),
        }
    }
}

impl std::error::Error for QuantityError {}

/// Why a proposed change was turned down.
///
/// Bound violations (`BelowMin`/`AboveMax`) are distinguishable from a
/// guard refusal (`GuardDeclined`) so callers can tell "out of range"
/// apart from "business rule said no".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum RejectReason {
    /// Proposed value is below the configured minimum.
    BelowMin,
    /// Proposed value is above the configured maximum.
    AboveMax,
    /// The transition guard declined the change.
    GuardDeclined,
    /// Proposed value carries a different fixed-point scale than the bounds.
    ScaleMismatch,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::BelowMin => "below minimum",
            Self::AboveMax => "above maximum",
            Self::GuardDeclined => "guard declined",
            Self::ScaleMismatch => "scale mismatch",
        };
        f.write_str(s)
    }
}

/// A typed failure produced by the host's commit operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitError {
    message: String,
}

impl CommitError {
    /// Wrap a failure description.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The failure description.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CommitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "commit failed: {}", self.message)
    }
}

impl std::error::Error for CommitError {}

/// A configuration that can never behave correctly is rejected at
/// construction time rather than surfacing as runtime misbehavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Min, max, and step must share one fixed-point scale.
    ScaleMismatch,
    /// `min` exceeds `max`.
    EmptyRange,
    /// The initial quantity lies outside the bounds.
    InitialOutOfBounds,
    /// The initial quantity is not reachable from `min` in whole steps.
    InitialMisaligned,
    /// Debounced dispatch requires a non-zero delay.
    ZeroDebounceDelay,
    /// The undo window must be a non-zero duration.
    ZeroUndoWindow,
    /// The repeat interval must be a non-zero duration.
    ZeroRepeatInterval,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ScaleMismatch => "bounds and initial value must share one scale",
            Self::EmptyRange => "minimum exceeds maximum",
            Self::InitialOutOfBounds => "initial quantity outside bounds",
            Self::InitialMisaligned => "initial quantity not aligned to the step",
            Self::ZeroDebounceDelay => "debounce delay must be non-zero",
            Self::ZeroUndoWindow => "undo window must be non-zero",
            Self::ZeroRepeatInterval => "repeat interval must be non-zero",
        };
        f.write_str(s)
    }
}

impl std::error::Error for ConfigError {}
