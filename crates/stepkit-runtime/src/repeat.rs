#![forbid(unsafe_code)]

//! Press-and-hold repeat sessions.
//!
//! A session walks `Armed -> Repeating` and is dropped on release,
//! disable, or disposal. The first tick fires after `initial_delay`, the
//! rest on a fixed `interval` cadence anchored at the scheduled time (not
//! the observed poll time), so a host that polls late catches up without
//! drifting the cadence.
//!
//! Ticks are synthesized requests: each one passes through the full
//! validation pipeline, so bounds and guards apply on every tick. After
//! two consecutive rejected ticks the session stops scheduling — holding
//! a button at a bound must not spin timers forever.

use stepkit_core::Direction;
use web_time::{Duration, Instant};

/// How many consecutive rejected ticks end a session.
const REJECTED_TICK_LIMIT: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RepeatPhase {
    Armed,
    Repeating,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct RepeatSession {
    direction: Direction,
    phase: RepeatPhase,
    next_at: Instant,
    rejected_streak: u8,
}

impl RepeatSession {
    pub(crate) fn new(direction: Direction, now: Instant, initial_delay: Duration) -> Self {
        Self {
            direction,
            phase: RepeatPhase::Armed,
            next_at: now + initial_delay,
            rejected_streak: 0,
        }
    }

    pub(crate) fn direction(&self) -> Direction {
        self.direction
    }

    pub(crate) fn phase(&self) -> RepeatPhase {
        self.phase
    }

    pub(crate) fn next_at(&self) -> Instant {
        self.next_at
    }

    pub(crate) fn due(&self, now: Instant) -> bool {
        now >= self.next_at
    }

    /// Advance to the next tick slot, anchored at the scheduled time.
    pub(crate) fn advance(&mut self, interval: Duration) {
        self.phase = RepeatPhase::Repeating;
        self.next_at += interval;
    }

    /// Record a rejected tick. Returns `true` when the session should end.
    pub(crate) fn note_rejected(&mut self) -> bool {
        self.rejected_streak = self.rejected_streak.saturating_add(1);
        self.rejected_streak >= REJECTED_TICK_LIMIT
    }

    /// Record an accepted tick, resetting the rejection streak.
    pub(crate) fn note_accepted(&mut self) {
        self.rejected_streak = 0;
    }
}
