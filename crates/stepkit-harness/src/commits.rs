#![forbid(unsafe_code)]

//! Programmable commit outcomes.
//!
//! `ScriptedCommits` plays the role of the external commit operation: it
//! records every [`Effect::Commit`] a controller emits and answers them,
//! in order, with pre-queued outcomes. Unqueued commits resolve `Ok`.

use std::collections::VecDeque;

use stepkit_core::{CommitError, CommitToken, Effect, Quantity};
use stepkit_runtime::StepperController;
use web_time::Instant;

/// A scripted stand-in for the host's commit operation.
#[derive(Debug, Default)]
pub struct ScriptedCommits {
    outcomes: VecDeque<Result<(), CommitError>>,
    unresolved: VecDeque<(CommitToken, Quantity)>,
    seen: Vec<Quantity>,
}

impl ScriptedCommits {
    /// No queued outcomes; every commit will resolve `Ok`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a success outcome.
    pub fn queue_ok(&mut self) {
        self.outcomes.push_back(Ok(()));
    }

    /// Queue a failure outcome.
    pub fn queue_err(&mut self, message: impl Into<String>) {
        self.outcomes.push_back(Err(CommitError::new(message)));
    }

    /// Record any commit requests found in `effects`.
    pub fn observe(&mut self, effects: &[Effect]) {
        for effect in effects {
            if let Effect::Commit { target, token } = effect {
                self.unresolved.push_back((*token, *target));
                self.seen.push(*target);
            }
        }
    }

    /// Resolve the oldest outstanding commit with the next queued
    /// outcome (or `Ok` when the queue is empty). Returns `None` when
    /// nothing is outstanding.
    pub fn resolve_next(
        &mut self,
        controller: &mut StepperController,
        now: Instant,
    ) -> Option<Vec<Effect>> {
        let (token, _) = self.unresolved.pop_front()?;
        let outcome = self.outcomes.pop_front().unwrap_or(Ok(()));
        Some(controller.commit_resolved(token, outcome, now))
    }

    /// Every commit target seen so far, in emission order.
    pub fn seen_targets(&self) -> &[Quantity] {
        &self.seen
    }

    /// Total commits observed.
    pub fn commit_count(&self) -> usize {
        self.seen.len()
    }

    /// Commits observed but not yet resolved.
    pub fn outstanding(&self) -> usize {
        self.unresolved.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepkit_core::CommitToken;

    #[test]
    fn observe_collects_commit_effects_only() {
        let mut commits = ScriptedCommits::new();
        commits.observe(&[
            Effect::LoadingChanged(true),
            Effect::Commit {
                target: Quantity::from_int(6),
                token: CommitToken::from_raw(1),
            },
            Effect::MinReached,
        ]);
        assert_eq!(commits.commit_count(), 1);
        assert_eq!(commits.outstanding(), 1);
        assert_eq!(commits.seen_targets(), &[Quantity::from_int(6)]);
    }

    #[test]
    fn resolve_next_with_nothing_outstanding() {
        use stepkit_core::{Bounds, Quantity, StepSize, StepperConfig};

        let bounds = Bounds::new(
            Quantity::from_int(1),
            Quantity::from_int(10),
            StepSize::of_int(1).unwrap(),
        )
        .unwrap();
        let mut controller =
            StepperController::new(StepperConfig::new(bounds, Quantity::from_int(5))).unwrap();

        let mut commits = ScriptedCommits::new();
        assert!(
            commits
                .resolve_next(&mut controller, Instant::now())
                .is_none()
        );
    }
}
