#![forbid(unsafe_code)]

//! Scripted controller driving.
//!
//! `Driver` glues a controller to a [`VirtualClock`], an [`EffectLog`],
//! and a [`ScriptedCommits`] stub, and keeps the arrival-order contract
//! honest: whenever the clock moves forward, every controller deadline
//! inside the crossed span fires at its own instant, in order, before
//! the next intent lands.
//!
//! # Example
//! ```
//! use stepkit_core::{Bounds, Intent, Quantity, StepSize, StepperConfig};
//! use stepkit_harness::Driver;
//! use web_time::Duration;
//!
//! let bounds = Bounds::new(
//!     Quantity::from_int(1),
//!     Quantity::from_int(10),
//!     StepSize::of_int(1).unwrap(),
//! )
//! .unwrap();
//! let mut driver =
//!     Driver::new(StepperConfig::new(bounds, Quantity::from_int(5))).unwrap();
//!
//! driver.apply(Intent::Increment);
//! driver.advance(Duration::from_secs(1));
//! assert_eq!(driver.log.changes(), vec![(5, 6)]);
//! ```

use stepkit_core::{ConfigError, Effect, Intent, StepperConfig};
use stepkit_runtime::{StepperController, StepperView};
use web_time::{Duration, Instant};

use crate::clock::VirtualClock;
use crate::commits::ScriptedCommits;
use crate::log::EffectLog;

/// Drives one controller through virtual time.
#[derive(Debug)]
pub struct Driver {
    /// The controller under test.
    pub controller: StepperController,
    /// Everything the controller emitted, in order.
    pub log: EffectLog,
    /// Commit stub fed by every emitted batch.
    pub commits: ScriptedCommits,
    clock: VirtualClock,
}

impl Driver {
    /// Build a controller from `config` and wrap it.
    pub fn new(config: StepperConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            controller: StepperController::new(config)?,
            log: EffectLog::new(),
            commits: ScriptedCommits::new(),
            clock: VirtualClock::new(),
        })
    }

    /// Wrap an already-built controller (e.g. one with a guard attached).
    pub fn with_controller(controller: StepperController) -> Self {
        Self {
            controller,
            log: EffectLog::new(),
            commits: ScriptedCommits::new(),
            clock: VirtualClock::new(),
        }
    }

    /// The current virtual instant.
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Elapsed virtual time.
    pub fn offset(&self) -> Duration {
        self.clock.offset()
    }

    /// The instant at an absolute offset from the start.
    pub fn at(&self, offset: Duration) -> Instant {
        self.clock.at(offset)
    }

    /// Feed one intent at the current instant.
    pub fn apply(&mut self, intent: Intent) -> Vec<Effect> {
        let effects = self.controller.apply(intent, self.clock.now());
        self.commits.observe(&effects);
        self.log.record(effects.clone());
        effects
    }

    /// Advance to an absolute offset, firing every deadline crossed on
    /// the way at its own instant.
    pub fn advance_to(&mut self, offset: Duration) {
        let target = self.clock.at(offset);
        loop {
            match self.controller.next_deadline() {
                Some(at) if at <= target => {
                    let effects = self.controller.poll(at);
                    self.commits.observe(&effects);
                    self.log.record(effects);
                }
                _ => break,
            }
        }
        self.clock.advance_to(offset);
    }

    /// Advance by `delta`, firing crossed deadlines in order.
    pub fn advance(&mut self, delta: Duration) {
        let offset = self.clock.offset() + delta;
        self.advance_to(offset);
    }

    /// Feed one intent at an absolute offset (advancing there first).
    pub fn apply_at(&mut self, offset: Duration, intent: Intent) -> Vec<Effect> {
        self.advance_to(offset);
        self.apply(intent)
    }

    /// Resolve the oldest outstanding commit with the next scripted
    /// outcome at the current instant.
    pub fn resolve_next_commit(&mut self) -> Vec<Effect> {
        let now = self.clock.now();
        let Some(effects) = self.commits.resolve_next(&mut self.controller, now) else {
            return Vec::new();
        };
        self.commits.observe(&effects);
        self.log.record(effects.clone());
        effects
    }

    /// Current rendering snapshot.
    pub fn view(&self) -> StepperView {
        self.controller.view()
    }
}
