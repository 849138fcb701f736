#![forbid(unsafe_code)]

//! Value types, validation, and vocabulary for stepper quantity controls.
//!
//! This crate holds everything a quantity control needs that is *not*
//! time-dependent: fixed-point [`Quantity`] arithmetic, [`Bounds`] with
//! step alignment, the pure [`validate`] gate, the configuration surface,
//! and the [`Intent`]/[`Effect`] vocabulary the controller in
//! `stepkit-runtime` speaks.
//!
//! Quantities are integer units at a fixed decimal scale, so fractional
//! steps (half-kilogram produce, 0.25-liter pours) step exactly with no
//! floating-point drift.

pub mod bounds;
pub mod config;
pub mod error;
pub mod event;
pub mod quantity;

pub use bounds::{Bounds, Outcome, TransitionGuard, validate};
pub use config::{
    BackoffStrategy, BelowMinPolicy, CommitConfig, DispatchMode, RepeatConfig, RetryPolicy,
    StepperConfig, UndoConfig,
};
pub use error::{CommitError, ConfigError, QuantityError, RejectReason};
pub use event::{ChangeKind, CommitToken, Direction, Effect, Intent};
pub use quantity::{Quantity, StepSize};
