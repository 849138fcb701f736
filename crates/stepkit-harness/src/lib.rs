#![forbid(unsafe_code)]

//! Deterministic test fixtures for stepkit controllers.
//!
//! Everything a timer-heavy state machine test needs without a single
//! sleep: a [`VirtualClock`] the test advances by hand, a [`Driver`]
//! that fires crossed deadlines in arrival order, a [`ScriptedCommits`]
//! stub standing in for the external commit operation, and an
//! [`EffectLog`] for assertions over the emitted effect stream.

pub mod clock;
pub mod commits;
pub mod driver;
pub mod log;

pub use clock::VirtualClock;
pub use commits::ScriptedCommits;
pub use driver::Driver;
pub use log::EffectLog;
