#![forbid(unsafe_code)]

//! In-flight commit bookkeeping.
//!
//! At most one `PendingCommit` exists per controller. While a commit is
//! in flight, newer accepted values *supersede* the pending target rather
//! than spawning concurrent commits; when the in-flight attempt resolves
//! successfully and the target has moved on, a follow-up commit is issued
//! for the latest target. The revert `baseline` is the value confirmed
//! before the first uncommitted change and survives supersession, so an
//! exhausted failure restores the last acknowledged state.
//!
//! Resolution is matched by token; a resolution carrying a stale token
//! (superseded attempt, disposed controller) is ignored.

use stepkit_core::{CommitToken, Quantity, RetryPolicy};
use web_time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CommitPhase {
    /// The host is running the commit operation.
    InFlight,
    /// A failed attempt is waiting for its scheduled retry.
    AwaitingRetry { at: Instant },
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct PendingCommit {
    token: CommitToken,
    /// Value carried by the attempt currently in flight.
    sent: Quantity,
    /// Latest accepted value; may outrun `sent` under supersession.
    target: Quantity,
    /// Last confirmed value, the revert destination.
    baseline: Quantity,
    /// Failed attempts so far.
    attempt: u32,
    phase: CommitPhase,
}

impl PendingCommit {
    pub(crate) fn new(token: CommitToken, value: Quantity, baseline: Quantity) -> Self {
        Self {
            token,
            sent: value,
            target: value,
            baseline,
            attempt: 0,
            phase: CommitPhase::InFlight,
        }
    }

    pub(crate) fn sent(&self) -> Quantity {
        self.sent
    }

    pub(crate) fn target(&self) -> Quantity {
        self.target
    }

    pub(crate) fn baseline(&self) -> Quantity {
        self.baseline
    }

    pub(crate) fn matches(&self, token: CommitToken) -> bool {
        self.token == token
    }

    /// Replace the target while an attempt is outstanding.
    pub(crate) fn supersede(&mut self, target: Quantity) {
        self.target = target;
    }

    /// True when success left the target ahead of what was sent.
    pub(crate) fn target_outran_sent(&self) -> bool {
        self.target != self.sent
    }

    /// Begin a fresh attempt for the current target under a new token.
    pub(crate) fn resend(&mut self, token: CommitToken) {
        self.token = token;
        self.sent = self.target;
        self.phase = CommitPhase::InFlight;
    }

    /// Record a failure. Returns the retry deadline when the policy
    /// grants another attempt, `None` when retries are exhausted.
    pub(crate) fn note_failure(&mut self, policy: &RetryPolicy, now: Instant) -> Option<Instant> {
        if self.attempt < policy.max_retries {
            let at = now + policy.delay(self.attempt);
            self.attempt += 1;
            self.phase = CommitPhase::AwaitingRetry { at };
            Some(at)
        } else {
            None
        }
    }

    pub(crate) fn retry_due(&self, now: Instant) -> Option<Instant> {
        match self.phase {
            CommitPhase::AwaitingRetry { at } => Some(at).filter(|_| now >= at),
            CommitPhase::InFlight => None,
        }
    }

    pub(crate) fn retry_at(&self) -> Option<Instant> {
        match self.phase {
            CommitPhase::AwaitingRetry { at } => Some(at),
            CommitPhase::InFlight => None,
        }
    }
}
