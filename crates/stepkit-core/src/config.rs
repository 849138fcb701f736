#![forbid(unsafe_code)]

//! Configuration surface for a stepper control.
//!
//! Everything here is plain data with `Default` impls and chained builder
//! setters. Behavior hooks are not stored callbacks: outcomes come back
//! from the controller as typed effects, so an absent "handler" is simply
//! an effect the host ignores.
//!
//! # Example
//! ```
//! use stepkit_core::{
//!     Bounds, DispatchMode, Quantity, StepSize, StepperConfig,
//! };
//! use web_time::Duration;
//!
//! let bounds = Bounds::new(
//!     Quantity::from_int(1),
//!     Quantity::from_int(10),
//!     StepSize::of_int(1).unwrap(),
//! )
//! .unwrap();
//!
//! let config = StepperConfig::new(bounds, Quantity::from_int(5))
//!     .mode(DispatchMode::Debounced {
//!         delay: Duration::from_millis(500),
//!     });
//! assert!(config.validate().is_ok());
//! ```

use web_time::Duration;

use crate::bounds::Bounds;
use crate::error::ConfigError;
use crate::quantity::Quantity;

/// How accepted changes reach the outside world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum DispatchMode {
    /// Apply immediately; no external commit.
    #[default]
    Sync,
    /// Apply immediately and commit asynchronously; failed commits revert.
    Optimistic,
    /// Apply to the display immediately but coalesce commits: one commit
    /// per quiescence period of `delay`, carrying the latest target.
    Debounced {
        /// Quiescence window re-armed by every accepted change.
        delay: Duration,
    },
}

/// What a proposal below `min` means.
///
/// The source behavior this models was ambiguous about whether dropping
/// below the minimum always maps to removal; here it is an explicit
/// policy switch with the conservative variant as default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum BelowMinPolicy {
    /// Reject the change and keep the current value.
    #[default]
    Reject,
    /// Translate the change into a removal request (enters the undo window).
    RequestRemoval,
}

/// Press-and-hold repeat timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct RepeatConfig {
    /// Hold time before the first synthetic tick.
    pub initial_delay: Duration,
    /// Cadence between subsequent ticks.
    pub interval: Duration,
}

impl Default for RepeatConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(400),
            interval: Duration::from_millis(80),
        }
    }
}

impl RepeatConfig {
    /// Set the hold time before the first tick.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the cadence between ticks.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Undo grace window for removals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct UndoConfig {
    /// How long a removal stays reversible before finalizing.
    pub window: Duration,
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(5),
        }
    }
}

impl UndoConfig {
    /// Set the grace window.
    pub fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }
}

/// Backoff between automatic commit retries.
///
/// Delays use fixed formulas with no jitter so replay-based tests can
/// reproduce exact timing sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum BackoffStrategy {
    /// Constant delay between attempts.
    Fixed {
        /// Delay in milliseconds.
        delay_ms: u64,
    },
    /// `base_ms * (attempt + 1)`, capped at `max_ms`.
    Linear {
        /// Base delay in milliseconds.
        base_ms: u64,
        /// Cap in milliseconds.
        max_ms: u64,
    },
    /// `base_ms * 2^attempt`, capped at `max_ms`.
    Exponential {
        /// Base delay in milliseconds.
        base_ms: u64,
        /// Cap in milliseconds.
        max_ms: u64,
    },
}

/// Automatic retry policy for failed commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct RetryPolicy {
    /// Retries after the initial attempt. Zero means fail straight away.
    pub max_retries: u32,
    /// Delay schedule between attempts.
    pub backoff: BackoffStrategy,
}

impl RetryPolicy {
    /// Create a policy.
    pub fn new(max_retries: u32, backoff: BackoffStrategy) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// No automatic retries; the first failure is surfaced immediately.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: BackoffStrategy::Fixed { delay_ms: 0 },
        }
    }

    /// Delay before retry `attempt` (0-indexed).
    pub fn delay(&self, attempt: u32) -> Duration {
        match self.backoff {
            BackoffStrategy::Fixed { delay_ms } => Duration::from_millis(delay_ms),
            BackoffStrategy::Linear { base_ms, max_ms } => {
                let ms = base_ms.saturating_mul(u64::from(attempt) + 1);
                Duration::from_millis(ms.min(max_ms))
            }
            BackoffStrategy::Exponential { base_ms, max_ms } => {
                let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
                let ms = base_ms.saturating_mul(factor);
                Duration::from_millis(ms.min(max_ms))
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Commit failure handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct CommitConfig {
    /// Restore the last confirmed value once retries are exhausted.
    pub revert_on_error: bool,
    /// Automatic retry schedule.
    pub retry: RetryPolicy,
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            revert_on_error: true,
            retry: RetryPolicy::none(),
        }
    }
}

impl CommitConfig {
    /// Set whether exhausted failures revert the displayed value.
    pub fn revert_on_error(mut self, revert: bool) -> Self {
        self.revert_on_error = revert;
        self
    }

    /// Set the automatic retry policy.
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Complete configuration for one stepper control instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct StepperConfig {
    /// Value range and step granularity.
    pub bounds: Bounds,
    /// Starting quantity.
    pub initial: Quantity,
    /// Whether the control starts enabled.
    pub enabled: bool,
    /// Dispatch mode for accepted changes.
    pub mode: DispatchMode,
    /// Meaning of a below-minimum proposal.
    pub below_min: BelowMinPolicy,
    /// Press-and-hold timing.
    pub repeat: RepeatConfig,
    /// Removal grace window.
    pub undo: UndoConfig,
    /// Commit failure handling.
    pub commit: CommitConfig,
}

impl StepperConfig {
    /// Create a configuration with defaults for everything but the range
    /// and starting value.
    pub fn new(bounds: Bounds, initial: Quantity) -> Self {
        Self {
            bounds,
            initial,
            enabled: true,
            mode: DispatchMode::default(),
            below_min: BelowMinPolicy::default(),
            repeat: RepeatConfig::default(),
            undo: UndoConfig::default(),
            commit: CommitConfig::default(),
        }
    }

    /// Set the dispatch mode.
    pub fn mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the below-minimum policy.
    pub fn below_min(mut self, policy: BelowMinPolicy) -> Self {
        self.below_min = policy;
        self
    }

    /// Set press-and-hold timing.
    pub fn repeat(mut self, repeat: RepeatConfig) -> Self {
        self.repeat = repeat;
        self
    }

    /// Set the removal grace window.
    pub fn undo(mut self, undo: UndoConfig) -> Self {
        self.undo = undo;
        self
    }

    /// Set commit failure handling.
    pub fn commit(mut self, commit: CommitConfig) -> Self {
        self.commit = commit;
        self
    }

    /// Start the control disabled.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Check the configuration for combinations that can never behave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial.scale() != self.bounds.scale() {
            return Err(ConfigError::ScaleMismatch);
        }
        if !self.bounds.contains(self.initial) {
            return Err(ConfigError::InitialOutOfBounds);
        }
        if !self.bounds.is_aligned(self.initial) {
            return Err(ConfigError::InitialMisaligned);
        }
        if let DispatchMode::Debounced { delay } = self.mode {
            if delay.is_zero() {
                return Err(ConfigError::ZeroDebounceDelay);
            }
        }
        if self.undo.window.is_zero() {
            return Err(ConfigError::ZeroUndoWindow);
        }
        if self.repeat.interval.is_zero() {
            return Err(ConfigError::ZeroRepeatInterval);
        }
        Ok(())
    }
}
