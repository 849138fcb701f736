#![forbid(unsafe_code)]

//! Bounds and step-alignment validation.
//!
//! [`validate`] is the single gate every change request passes through:
//! a pure function of the current value, the proposal, the bounds, the
//! below-minimum policy, and an optional [`TransitionGuard`]. It holds no
//! state between calls; boundary-arrival events (min/max reached) are the
//! caller's edge detection, not this layer's.
//!
//! # Example
//! ```
//! use stepkit_core::{Bounds, BelowMinPolicy, Outcome, Quantity, StepSize, validate};
//!
//! let bounds = Bounds::new(
//!     Quantity::from_int(1),
//!     Quantity::from_int(10),
//!     StepSize::of_int(1).unwrap(),
//! )
//! .unwrap();
//!
//! let out = validate(
//!     Quantity::from_int(5),
//!     Quantity::from_int(6),
//!     &bounds,
//!     BelowMinPolicy::Reject,
//!     None,
//! );
//! assert_eq!(out, Outcome::Accepted(Quantity::from_int(6)));
//! ```

use crate::config::BelowMinPolicy;
use crate::error::{ConfigError, RejectReason};
use crate::quantity::{Quantity, StepSize};

/// An inclusive `[min, max]` range with a step granularity.
///
/// Valid quantities are `min + k * step` for whole `k`; proposals off the
/// grid are snapped before bound checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Bounds {
    min: Quantity,
    max: Quantity,
    step: StepSize,
}

impl Bounds {
    /// Create bounds. All three parts must share one scale and `min`
    /// must not exceed `max`.
    pub fn new(min: Quantity, max: Quantity, step: StepSize) -> Result<Self, ConfigError> {
        if min.scale() != max.scale() || min.scale() != step.scale() {
            return Err(ConfigError::ScaleMismatch);
        }
        if min.units() > max.units() {
            return Err(ConfigError::EmptyRange);
        }
        Ok(Self { min, max, step })
    }

    /// Lower bound (inclusive).
    #[inline]
    pub fn min(&self) -> Quantity {
        self.min
    }

    /// Upper bound (inclusive).
    #[inline]
    pub fn max(&self) -> Quantity {
        self.max
    }

    /// Step granularity.
    #[inline]
    pub fn step(&self) -> StepSize {
        self.step
    }

    /// Shared fixed-point scale of the bounds.
    #[inline]
    pub fn scale(&self) -> u8 {
        self.min.scale()
    }

    /// True when `q` lies inside `[min, max]` at the same scale.
    pub fn contains(&self, q: Quantity) -> bool {
        self.min <= q && q <= self.max
    }

    /// Force `q` into `[min, max]`. Scale mismatches return `q` unchanged.
    pub fn clamp(&self, q: Quantity) -> Quantity {
        if q.scale() != self.scale() {
            return q;
        }
        if q.units() < self.min.units() {
            self.min
        } else if q.units() > self.max.units() {
            self.max
        } else {
            q
        }
    }

    /// True when `q` sits on the step grid anchored at `min`.
    pub fn is_aligned(&self, q: Quantity) -> bool {
        q.scale() == self.scale() && (q.units() - self.min.units()) % self.step.units() == 0
    }

    /// Snap `q` onto the step grid, rounding toward `current` so a
    /// snapped proposal never overshoots the direction of travel.
    pub fn snap_toward(&self, q: Quantity, current: Quantity) -> Quantity {
        if q.scale() != self.scale() {
            return q;
        }
        let delta = q.units().wrapping_sub(self.min.units());
        let rem = delta.rem_euclid(self.step.units());
        if rem == 0 {
            return q;
        }
        let lower = q.units() - rem;
        let units = if q.units() >= current.units() {
            lower
        } else {
            lower + self.step.units()
        };
        q.with_units(units)
    }
}

/// The verdict on one proposed change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The (possibly snapped) value to apply.
    Accepted(Quantity),
    /// The proposal was turned down.
    Rejected(RejectReason),
    /// The proposal dropped below `min` under a removal-translating
    /// policy; the caller should begin a removal instead.
    Removal,
}

/// A caller-supplied transition predicate, consulted after bound checks.
///
/// Implemented for any `Fn(current, proposed) -> bool`, so closures work
/// directly; implement the trait by hand when the guard needs state.
pub trait TransitionGuard {
    /// Return `false` to decline the transition.
    fn allow(&self, current: Quantity, proposed: Quantity) -> bool;
}

impl<F> TransitionGuard for F
where
    F: Fn(Quantity, Quantity) -> bool,
{
    fn allow(&self, current: Quantity, proposed: Quantity) -> bool {
        self(current, proposed)
    }
}

/// Validate one proposed change. Pure function of its inputs.
///
/// Order of checks: scale, grid snap, upper bound, lower bound (where the
/// below-min policy may translate to [`Outcome::Removal`]), then guard.
/// A value is accepted only when bounds pass **and** the guard allows it.
pub fn validate(
    current: Quantity,
    proposed: Quantity,
    bounds: &Bounds,
    below_min: BelowMinPolicy,
    guard: Option<&dyn TransitionGuard>,
) -> Outcome {
    if proposed.scale() != bounds.scale() {
        return Outcome::Rejected(RejectReason::ScaleMismatch);
    }
    let snapped = bounds.snap_toward(proposed, current);
    if snapped.units() > bounds.max().units() {
        return Outcome::Rejected(RejectReason::AboveMax);
    }
    if snapped.units() < bounds.min().units() {
        return match below_min {
            BelowMinPolicy::Reject => Outcome::Rejected(RejectReason::BelowMin),
            BelowMinPolicy::RequestRemoval => Outcome::Removal,
        };
    }
    if let Some(guard) = guard {
        if !guard.allow(current, snapped) {
            return Outcome::Rejected(RejectReason::GuardDeclined);
        }
    }
    Outcome::Accepted(snapped)
}
