#![forbid(unsafe_code)]

//! Controller state machine for stepper quantity controls.
//!
//! The heart of this crate is [`StepperController`]: a single-threaded,
//! clock-explicit state machine that turns user intents into applied
//! quantity changes and typed side effects. It covers the behaviors a
//! stepper needs once a network sits behind it:
//!
//! - **Sync / optimistic / debounced dispatch** — apply immediately,
//!   apply-then-commit with revert on failure, or coalesce a burst of
//!   taps into exactly one commit per quiescence period.
//! - **Press-and-hold repeat** — an initial delay, then a fixed cadence
//!   of synthetic ticks, each passing full validation; releasing the
//!   press (or disabling the control) cancels outstanding ticks.
//! - **Undo window** — removals stay reversible for a grace period and
//!   finalize exactly once.
//! - **Commit retry** — deterministic backoff before a failure is
//!   surfaced, plus a manual retry for the exhausted case.
//! - **Group coordination** — a shared-total cap and single-selection
//!   exclusivity across sibling controls.
//!
//! Timers are plain deadlines: the host asks
//! [`next_deadline`](StepperController::next_deadline) and calls
//! [`poll`](StepperController::poll) when the time comes, which makes
//! every behavior in this crate drivable by a virtual clock in tests.

pub mod controller;
pub mod flags;
pub mod group;

mod commit;
mod debounce;
mod repeat;
mod undo;

pub use controller::{StepperController, StepperView};
pub use flags::StateFlags;
pub use group::{GroupConfig, GroupCoordinator, GroupDirective, GroupRejection, MemberId};
