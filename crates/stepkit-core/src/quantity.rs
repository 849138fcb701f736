#![forbid(unsafe_code)]

//! Fixed-point quantity values.
//!
//! Quantities are stored as integer `units` at a fixed decimal `scale`
//! (number of fractional digits). A quantity of `2.5` at scale 1 is
//! `units = 25`. All stepping arithmetic happens on the integer units, so
//! repeated increments never accumulate floating-point drift.
//!
//! # Example
//! ```
//! use stepkit_core::{Quantity, StepSize};
//!
//! let half = StepSize::new(5, 1).unwrap(); // 0.5 at scale 1
//! let q = Quantity::from_units(25, 1).unwrap(); // 2.5
//! let next = q.checked_add(half).unwrap();
//! assert_eq!(next.to_string(), "3.0");
//! ```

use std::cmp::Ordering;
use std::fmt;

use crate::error::QuantityError;

/// A count expressed in integer units at a fixed decimal scale.
///
/// Two quantities only compare as ordered when their scales match;
/// mixed-scale comparisons yield `None` from `partial_cmp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Quantity {
    units: i64,
    scale: u8,
}

impl Quantity {
    /// Largest supported number of fractional digits.
    pub const MAX_SCALE: u8 = 6;

    /// Create a quantity from raw units at the given scale.
    pub fn from_units(units: i64, scale: u8) -> Result<Self, QuantityError> {
        if scale > Self::MAX_SCALE {
            return Err(QuantityError::ScaleOutOfRange { scale });
        }
        Ok(Self { units, scale })
    }

    /// Create a whole-number quantity (scale 0).
    pub fn from_int(value: i64) -> Self {
        Self {
            units: value,
            scale: 0,
        }
    }

    /// The zero quantity at the given scale.
    pub fn zero(scale: u8) -> Result<Self, QuantityError> {
        Self::from_units(0, scale)
    }

    /// Raw integer units.
    #[inline]
    pub fn units(&self) -> i64 {
        self.units
    }

    /// Number of fractional digits.
    #[inline]
    pub fn scale(&self) -> u8 {
        self.scale
    }

    /// True when the quantity is strictly greater than zero.
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.units > 0
    }

    /// Replace the units, keeping the scale.
    #[inline]
    pub fn with_units(self, units: i64) -> Self {
        Self {
            units,
            scale: self.scale,
        }
    }

    /// Add one step, failing on scale mismatch or `i64` overflow.
    pub fn checked_add(self, step: StepSize) -> Result<Self, QuantityError> {
        self.require_scale(step.scale())?;
        let units = self
            .units
            .checked_add(step.units())
            .ok_or(QuantityError::Overflow)?;
        Ok(self.with_units(units))
    }

    /// Subtract one step, failing on scale mismatch or `i64` overflow.
    pub fn checked_sub(self, step: StepSize) -> Result<Self, QuantityError> {
        self.require_scale(step.scale())?;
        let units = self
            .units
            .checked_sub(step.units())
            .ok_or(QuantityError::Overflow)?;
        Ok(self.with_units(units))
    }

    fn require_scale(&self, other: u8) -> Result<(), QuantityError> {
        if self.scale == other {
            Ok(())
        } else {
            Err(QuantityError::ScaleMismatch {
                left: self.scale,
                right: other,
            })
        }
    }

    fn granularity(scale: u8) -> u64 {
        10u64.pow(u32::from(scale))
    }
}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        (self.scale == other.scale).then(|| self.units.cmp(&other.units))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.units);
        }
        let g = Self::granularity(self.scale);
        let sign = if self.units < 0 { "-" } else { "" };
        let mag = self.units.unsigned_abs();
        write!(
            f,
            "{sign}{}.{:0width$}",
            mag / g,
            mag % g,
            width = self.scale as usize
        )
    }
}

/// A positive step increment in the same fixed-point representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct StepSize {
    units: i64,
    scale: u8,
}

impl StepSize {
    /// Create a step of `units` at `scale`. Steps must be strictly positive.
    pub fn new(units: i64, scale: u8) -> Result<Self, QuantityError> {
        if scale > Quantity::MAX_SCALE {
            return Err(QuantityError::ScaleOutOfRange { scale });
        }
        if units <= 0 {
            return Err(QuantityError::NonPositiveStep { units });
        }
        Ok(Self { units, scale })
    }

    /// Create a whole-number step (scale 0).
    pub fn of_int(units: i64) -> Result<Self, QuantityError> {
        Self::new(units, 0)
    }

    /// Raw integer units.
    #[inline]
    pub fn units(&self) -> i64 {
        self.units
    }

    /// Number of fractional digits.
    #[inline]
    pub fn scale(&self) -> u8 {
        self.scale
    }
}
