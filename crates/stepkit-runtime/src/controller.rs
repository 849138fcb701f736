#![forbid(unsafe_code)]

//! The stepper controller state machine.
//!
//! A [`StepperController`] owns one quantity plus at most one of each:
//! an in-flight commit, a pending removal, and a press-and-hold session.
//! It is single-threaded and clock-explicit: every mutating entry point
//! takes `now`, timers are plain deadlines the host drives through
//! [`poll`](StepperController::poll), and every side effect comes back as
//! an [`Effect`] value. The controller never renders, blocks, or calls
//! out.
//!
//! # Driving the controller
//!
//! 1. Feed user intents through [`apply`](StepperController::apply).
//! 2. Ask [`next_deadline`](StepperController::next_deadline) when to
//!    wake, and call [`poll`](StepperController::poll) at (or after)
//!    that instant.
//! 3. When an [`Effect::Commit`] is emitted, run the external commit
//!    operation and answer with
//!    [`commit_resolved`](StepperController::commit_resolved).
//! 4. Render from [`view`](StepperController::view).
//!
//! # Example
//!
//! ```
//! use stepkit_core::{Bounds, Intent, Quantity, StepSize, StepperConfig};
//! use stepkit_runtime::StepperController;
//! use web_time::Instant;
//!
//! let bounds = Bounds::new(
//!     Quantity::from_int(1),
//!     Quantity::from_int(10),
//!     StepSize::of_int(1).unwrap(),
//! )
//! .unwrap();
//! let mut ctl =
//!     StepperController::new(StepperConfig::new(bounds, Quantity::from_int(5))).unwrap();
//!
//! let effects = ctl.apply(Intent::Increment, Instant::now());
//! assert_eq!(ctl.view().quantity, Some(Quantity::from_int(6)));
//! assert_eq!(effects.len(), 1);
//! ```

use std::fmt;

use stepkit_core::{
    ChangeKind, CommitError, CommitToken, ConfigError, Direction, DispatchMode, Effect, Intent,
    Outcome, Quantity, RejectReason, StepperConfig, TransitionGuard, validate,
};
use web_time::Instant;

use crate::commit::PendingCommit;
use crate::debounce::DebounceState;
use crate::flags::StateFlags;
use crate::repeat::{RepeatPhase, RepeatSession};
use crate::undo::UndoEntry;

/// What the rendering layer needs to draw one control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepperView {
    /// Present quantity, or `None` while removed / pending removal.
    pub quantity: Option<Quantity>,
    /// Compact state word (at-min, at-max, loading, held, ...).
    pub flags: StateFlags,
}

/// Verdict of one internal change submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Submit {
    Applied,
    NoOp,
    Rejected,
    Removal,
}

/// One quantity control instance.
pub struct StepperController {
    config: StepperConfig,
    guard: Option<Box<dyn TransitionGuard>>,
    /// Displayed value while present.
    quantity: Quantity,
    /// Last value the outside world confirmed; revert destination.
    committed: Quantity,
    pending: Option<PendingCommit>,
    debounce: Option<DebounceState>,
    undo: Option<UndoEntry>,
    repeat: Option<RepeatSession>,
    enabled: bool,
    removed: bool,
    disposed: bool,
    /// Target of the last exhausted commit failure, for manual retry.
    last_failed: Option<Quantity>,
    next_token: u64,
}

impl StepperController {
    /// Create a controller, rejecting configurations that can never
    /// behave correctly.
    pub fn new(config: StepperConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            quantity: config.initial,
            committed: config.initial,
            enabled: config.enabled,
            guard: None,
            pending: None,
            debounce: None,
            undo: None,
            repeat: None,
            removed: false,
            disposed: false,
            last_failed: None,
            next_token: 0,
            config,
        })
    }

    /// Attach a transition guard consulted after bound checks on every
    /// proposal, including repeat ticks.
    pub fn with_guard(mut self, guard: impl TransitionGuard + 'static) -> Self {
        self.guard = Some(Box::new(guard));
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &StepperConfig {
        &self.config
    }

    /// The underlying quantity, present or not. Prefer
    /// [`view`](Self::view) for rendering.
    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// True once [`dispose`](Self::dispose) ran.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// True once a removal finalized.
    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Snapshot for the rendering layer.
    pub fn view(&self) -> StepperView {
        let mut flags = StateFlags::empty();
        if !self.enabled {
            flags |= StateFlags::DISABLED;
        }
        if self.removed {
            flags |= StateFlags::REMOVED;
            return StepperView {
                quantity: None,
                flags,
            };
        }
        if self.pending.is_some() {
            flags |= StateFlags::LOADING;
        }
        if self.repeat.is_some() {
            flags |= StateFlags::HELD;
        }
        if self.undo.is_some() {
            flags |= StateFlags::PENDING_REMOVAL;
            return StepperView {
                quantity: None,
                flags,
            };
        }
        if self.quantity == self.config.bounds.min() {
            flags |= StateFlags::AT_MIN;
        }
        if self.quantity == self.config.bounds.max() {
            flags |= StateFlags::AT_MAX;
        }
        StepperView {
            quantity: Some(self.quantity),
            flags,
        }
    }

    /// Process one intent. Single entry point for taps, manual entry,
    /// removal, undo, and press lifecycle; repeat ticks are synthesized
    /// internally through the same validation path.
    pub fn apply(&mut self, intent: Intent, now: Instant) -> Vec<Effect> {
        if self.disposed || self.removed {
            tracing::trace!(
                target: "stepkit.controller",
                intent = ?intent,
                "intent ignored on dead controller"
            );
            return Vec::new();
        }
        match intent {
            Intent::Increment => self.step(Direction::Up, ChangeKind::Tap, now),
            Intent::Decrement => self.step(Direction::Down, ChangeKind::Tap, now),
            Intent::SetValue(value) => self.request_change(value, ChangeKind::ManualEntry, now),
            Intent::Remove => self.begin_removal(now),
            Intent::Undo => self.undo_removal(now),
            Intent::PressStart(direction) => self.press_start(direction, now),
            Intent::PressEnd => self.press_end(),
            Intent::SetEnabled(enabled) => self.set_enabled(enabled),
        }
    }

    /// Propose a value from code rather than a gesture.
    pub fn set_quantity(&mut self, value: Quantity, now: Instant) -> Vec<Effect> {
        if self.disposed || self.removed {
            return Vec::new();
        }
        self.request_change(value, ChangeKind::Programmatic, now)
    }

    /// Earliest pending timer (debounce, repeat, undo expiry, commit
    /// retry), for host scheduling. `None` when nothing is armed.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.disposed {
            return None;
        }
        let mut earliest: Option<Instant> = None;
        for t in [
            self.debounce.as_ref().map(DebounceState::deadline),
            self.repeat.as_ref().map(RepeatSession::next_at),
            self.undo.as_ref().map(UndoEntry::expires_at),
            self.pending.as_ref().and_then(PendingCommit::retry_at),
        ]
        .into_iter()
        .flatten()
        {
            earliest = Some(earliest.map_or(t, |e| e.min(t)));
        }
        earliest
    }

    /// Fire every timer due at `now`, earliest first. Idempotent when
    /// nothing is due; a no-op after disposal.
    pub fn poll(&mut self, now: Instant) -> Vec<Effect> {
        if self.disposed {
            return Vec::new();
        }
        let mut effects = Vec::new();
        while let Some(at) = self.next_deadline() {
            if at > now {
                break;
            }
            effects.extend(self.fire_deadline(at));
        }
        effects
    }

    /// Answer an [`Effect::Commit`]. Stale tokens (superseded attempts,
    /// already-failed attempts, disposed controllers) are dropped.
    pub fn commit_resolved(
        &mut self,
        token: CommitToken,
        result: Result<(), CommitError>,
        now: Instant,
    ) -> Vec<Effect> {
        if self.disposed {
            return Vec::new();
        }
        let Some(pending) = self.pending.as_ref() else {
            tracing::trace!(
                target: "stepkit.controller",
                token = token.raw(),
                "resolution with no pending commit dropped"
            );
            return Vec::new();
        };
        if !pending.matches(token) {
            tracing::trace!(
                target: "stepkit.controller",
                token = token.raw(),
                "stale commit token dropped"
            );
            return Vec::new();
        }
        if pending.retry_at().is_some() {
            // The attempt already settled as a failure; a duplicate
            // resolution for the same token changes nothing.
            return Vec::new();
        }
        match result {
            Ok(()) => self.commit_succeeded(),
            Err(error) => self.commit_failed(error, now),
        }
    }

    /// Re-submit the target of the last exhausted commit failure.
    ///
    /// The reverted value is re-applied optimistically before the commit
    /// goes out, so a successful retry leaves the display on the value it
    /// just confirmed; another exhausted failure reverts it again.
    pub fn retry_failed_commit(&mut self, _now: Instant) -> Vec<Effect> {
        if self.disposed || self.removed || self.pending.is_some() {
            return Vec::new();
        }
        let Some(target) = self.last_failed.take() else {
            return Vec::new();
        };
        let mut effects = Vec::new();
        let old = self.quantity;
        if target != old {
            self.quantity = target;
            effects.push(Effect::QuantityChanged {
                new: target,
                old,
                kind: ChangeKind::Programmatic,
            });
            self.push_boundary_effects(&mut effects, old, target);
        }
        let token = self.fresh_token();
        self.pending = Some(PendingCommit::new(token, target, self.committed));
        tracing::debug!(
            target: "stepkit.controller",
            target_units = target.units(),
            "manual commit retry"
        );
        effects.push(Effect::LoadingChanged(true));
        effects.push(Effect::Commit { target, token });
        effects
    }

    /// Tear the controller down: cancel every outstanding deadline and
    /// drop the pending commit so nothing can ever fire against a dead
    /// instance. All later calls are no-ops.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.repeat = None;
        self.debounce = None;
        self.undo = None;
        self.pending = None;
        self.last_failed = None;
        tracing::debug!(target: "stepkit.controller", "controller disposed");
    }

    // --- intent handlers ---

    fn step(&mut self, direction: Direction, kind: ChangeKind, now: Instant) -> Vec<Effect> {
        if !self.enabled || self.undo.is_some() {
            return Vec::new();
        }
        self.step_internal(direction, kind, now).0
    }

    fn step_internal(
        &mut self,
        direction: Direction,
        kind: ChangeKind,
        now: Instant,
    ) -> (Vec<Effect>, Submit) {
        let step = self.config.bounds.step();
        let result = match direction {
            Direction::Up => self.quantity.checked_add(step),
            Direction::Down => self.quantity.checked_sub(step),
        };
        match result {
            Ok(proposed) => self.submit(proposed, kind, now),
            Err(_) => {
                // The proposal left the representable range entirely;
                // report it against the current value as a plain bound
                // rejection rather than panicking or removing.
                let reason = match direction {
                    Direction::Up => RejectReason::AboveMax,
                    Direction::Down => RejectReason::BelowMin,
                };
                let current = self.quantity;
                (
                    vec![Effect::ValidationRejected {
                        current,
                        attempted: current,
                        reason,
                    }],
                    Submit::Rejected,
                )
            }
        }
    }

    fn request_change(&mut self, proposed: Quantity, kind: ChangeKind, now: Instant) -> Vec<Effect> {
        if !self.enabled || self.undo.is_some() {
            return Vec::new();
        }
        self.submit(proposed, kind, now).0
    }

    fn submit(
        &mut self,
        proposed: Quantity,
        kind: ChangeKind,
        now: Instant,
    ) -> (Vec<Effect>, Submit) {
        let current = self.quantity;
        let outcome = validate(
            current,
            proposed,
            &self.config.bounds,
            self.config.below_min,
            self.guard.as_deref(),
        );
        match outcome {
            Outcome::Rejected(reason) => {
                tracing::debug!(
                    target: "stepkit.controller",
                    attempted = proposed.units(),
                    current = current.units(),
                    reason = %reason,
                    "change rejected"
                );
                (
                    vec![Effect::ValidationRejected {
                        current,
                        attempted: proposed,
                        reason,
                    }],
                    Submit::Rejected,
                )
            }
            Outcome::Removal => (self.begin_removal(now), Submit::Removal),
            Outcome::Accepted(value) if value == current => (Vec::new(), Submit::NoOp),
            Outcome::Accepted(value) => (self.apply_change(value, kind, now), Submit::Applied),
        }
    }

    fn apply_change(&mut self, value: Quantity, kind: ChangeKind, now: Instant) -> Vec<Effect> {
        let old = self.quantity;
        self.quantity = value;
        let mut effects = vec![Effect::QuantityChanged {
            new: value,
            old,
            kind,
        }];
        self.push_boundary_effects(&mut effects, old, value);
        tracing::debug!(
            target: "stepkit.controller",
            old = old.units(),
            new = value.units(),
            kind = ?kind,
            "change applied"
        );
        match self.config.mode {
            DispatchMode::Sync => {
                self.committed = value;
            }
            DispatchMode::Optimistic => self.dispatch_commit(value, &mut effects),
            DispatchMode::Debounced { delay } => {
                let deadline = now + delay;
                match self.debounce.as_mut() {
                    Some(state) => state.rearm(value, deadline),
                    None => {
                        self.debounce = Some(DebounceState::new(value, self.committed, deadline));
                    }
                }
            }
        }
        effects
    }

    fn dispatch_commit(&mut self, value: Quantity, effects: &mut Vec<Effect>) {
        if let Some(pending) = self.pending.as_mut() {
            pending.supersede(value);
            tracing::debug!(
                target: "stepkit.controller",
                target_units = value.units(),
                "pending commit superseded"
            );
            return;
        }
        let token = self.fresh_token();
        self.pending = Some(PendingCommit::new(token, value, self.committed));
        effects.push(Effect::LoadingChanged(true));
        effects.push(Effect::Commit {
            target: value,
            token,
        });
    }

    fn begin_removal(&mut self, now: Instant) -> Vec<Effect> {
        if !self.enabled {
            return Vec::new();
        }
        if self.undo.is_some() {
            // One undo window per control: the first deadline stands so
            // two expiry timers can never race.
            tracing::debug!(target: "stepkit.undo", "removal already pending, request dropped");
            return Vec::new();
        }
        self.repeat = None;
        // No commit (coalesced, in-flight, or awaiting retry) for a value
        // that is being removed may fire after the fact. A late resolution
        // for the dropped commit hits the stale-token path.
        self.debounce = None;
        self.last_failed = None;
        let mut effects = Vec::new();
        if self.pending.take().is_some() {
            effects.push(Effect::LoadingChanged(false));
        }
        let value = self.quantity;
        let expires_at = now + self.config.undo.window;
        self.undo = Some(UndoEntry::new(value, expires_at));
        tracing::debug!(
            target: "stepkit.undo",
            value = value.units(),
            "removal pending"
        );
        effects.push(Effect::RemovalPending { value, expires_at });
        effects
    }

    fn undo_removal(&mut self, now: Instant) -> Vec<Effect> {
        let Some(entry) = self.undo.take() else {
            tracing::trace!(target: "stepkit.undo", "undo with no pending removal");
            return Vec::new();
        };
        if entry.expired(now) {
            // The window already lapsed; finalize instead of resurrecting.
            self.removed = true;
            tracing::debug!(target: "stepkit.undo", "undo arrived after expiry");
            return vec![Effect::RemovalFinalized {
                value: entry.removed_value(),
            }];
        }
        let value = entry.removed_value();
        self.quantity = value;
        tracing::debug!(
            target: "stepkit.undo",
            value = value.units(),
            "removal undone"
        );
        let mut effects = vec![Effect::RemovalUndone { value }];
        // The removal dropped any uncommitted persistence for this value;
        // restoring a value the outside world never confirmed re-opens the
        // commit path so display and confirmed state converge again.
        if value != self.committed {
            match self.config.mode {
                DispatchMode::Sync => self.committed = value,
                DispatchMode::Optimistic => self.dispatch_commit(value, &mut effects),
                DispatchMode::Debounced { delay } => {
                    let deadline = now + delay;
                    self.debounce = Some(DebounceState::new(value, self.committed, deadline));
                }
            }
        }
        effects
    }

    fn press_start(&mut self, direction: Direction, now: Instant) -> Vec<Effect> {
        if !self.enabled || self.undo.is_some() {
            return Vec::new();
        }
        self.repeat = Some(RepeatSession::new(
            direction,
            now,
            self.config.repeat.initial_delay,
        ));
        tracing::debug!(target: "stepkit.repeat", direction = ?direction, "hold armed");
        Vec::new()
    }

    fn press_end(&mut self) -> Vec<Effect> {
        if self.repeat.take().is_some() {
            tracing::debug!(target: "stepkit.repeat", "hold released");
        }
        Vec::new()
    }

    fn set_enabled(&mut self, enabled: bool) -> Vec<Effect> {
        self.enabled = enabled;
        if !enabled && self.repeat.take().is_some() {
            tracing::debug!(target: "stepkit.repeat", "hold cancelled by disable");
        }
        Vec::new()
    }

    // --- deadline firing ---

    fn fire_deadline(&mut self, at: Instant) -> Vec<Effect> {
        // Exactly one timer owns `at`; ties resolve in lifecycle order
        // (expiry before new work).
        if self.undo.as_ref().is_some_and(|u| u.expired(at)) {
            return self.fire_undo_expiry();
        }
        if self.debounce.as_ref().is_some_and(|d| d.due(at)) {
            return self.fire_debounce();
        }
        if self.pending.as_ref().and_then(|p| p.retry_due(at)).is_some() {
            return self.fire_retry();
        }
        if self.repeat.as_ref().is_some_and(|r| r.due(at)) {
            return self.fire_repeat_tick(at);
        }
        Vec::new()
    }

    fn fire_undo_expiry(&mut self) -> Vec<Effect> {
        let Some(entry) = self.undo.take() else {
            return Vec::new();
        };
        self.removed = true;
        tracing::debug!(
            target: "stepkit.undo",
            value = entry.removed_value().units(),
            "removal finalized"
        );
        vec![Effect::RemovalFinalized {
            value: entry.removed_value(),
        }]
    }

    fn fire_debounce(&mut self) -> Vec<Effect> {
        let Some(state) = self.debounce.take() else {
            return Vec::new();
        };
        let mut effects = Vec::new();
        if let Some(pending) = self.pending.as_mut() {
            // A previous burst's commit is still out; fold this burst's
            // target into it instead of racing a second commit.
            pending.supersede(state.target());
            return effects;
        }
        let token = self.fresh_token();
        self.pending = Some(PendingCommit::new(token, state.target(), state.baseline()));
        tracing::debug!(
            target: "stepkit.controller",
            target_units = state.target().units(),
            "debounce quiesced, committing"
        );
        effects.push(Effect::LoadingChanged(true));
        effects.push(Effect::Commit {
            target: state.target(),
            token,
        });
        effects
    }

    fn fire_retry(&mut self) -> Vec<Effect> {
        let Some(mut pending) = self.pending else {
            return Vec::new();
        };
        let token = self.fresh_token();
        pending.resend(token);
        let target = pending.sent();
        self.pending = Some(pending);
        tracing::debug!(
            target: "stepkit.controller",
            target_units = target.units(),
            "automatic commit retry"
        );
        vec![Effect::Commit { target, token }]
    }

    fn fire_repeat_tick(&mut self, at: Instant) -> Vec<Effect> {
        let Some((direction, first_tick)) = self
            .repeat
            .as_ref()
            .map(|s| (s.direction(), s.phase() == RepeatPhase::Armed))
        else {
            return Vec::new();
        };
        if first_tick {
            tracing::debug!(target: "stepkit.repeat", direction = ?direction, "hold entered repeating phase");
        }
        let (effects, outcome) = self.step_internal(direction, ChangeKind::RepeatTick, at);
        let interval = self.config.repeat.interval;
        let mut end_session = false;
        if let Some(session) = self.repeat.as_mut() {
            match outcome {
                Submit::Applied | Submit::NoOp => {
                    session.note_accepted();
                    session.advance(interval);
                }
                Submit::Rejected => {
                    if session.note_rejected() {
                        end_session = true;
                    } else {
                        session.advance(interval);
                    }
                }
                // Removal already tore the session down.
                Submit::Removal => {}
            }
        }
        if end_session {
            self.repeat = None;
            tracing::debug!(target: "stepkit.repeat", "session stopped at bound");
        }
        effects
    }

    // --- commit resolution ---

    fn commit_succeeded(&mut self) -> Vec<Effect> {
        let Some(mut pending) = self.pending else {
            return Vec::new();
        };
        self.committed = pending.sent();
        let mut effects = Vec::new();
        if pending.target_outran_sent() {
            // The value moved on while this attempt was in flight; chase
            // it with a follow-up commit, still one at a time.
            let token = self.fresh_token();
            pending.resend(token);
            let target = pending.sent();
            self.pending = Some(pending);
            tracing::debug!(
                target: "stepkit.controller",
                target_units = target.units(),
                "commit confirmed, following up for superseded target"
            );
            effects.push(Effect::Commit { target, token });
        } else {
            self.pending = None;
            self.last_failed = None;
            tracing::debug!(target: "stepkit.controller", "commit confirmed");
            effects.push(Effect::LoadingChanged(false));
        }
        effects
    }

    fn commit_failed(&mut self, error: CommitError, now: Instant) -> Vec<Effect> {
        let Some(mut pending) = self.pending else {
            return Vec::new();
        };
        let mut effects = Vec::new();
        if let Some(at) = pending.note_failure(&self.config.commit.retry, now) {
            self.pending = Some(pending);
            tracing::warn!(
                target: "stepkit.controller",
                error = %error,
                retry_in_ms = at.saturating_duration_since(now).as_millis() as u64,
                "commit failed, retry scheduled"
            );
            effects.push(Effect::CommitFailed {
                target: pending.target(),
                error,
                will_retry: true,
            });
            return effects;
        }
        let target = pending.target();
        let baseline = pending.baseline();
        self.pending = None;
        self.last_failed = Some(target);
        tracing::warn!(
            target: "stepkit.controller",
            error = %error,
            target_units = target.units(),
            "commit failed, retries exhausted"
        );
        effects.push(Effect::CommitFailed {
            target,
            error,
            will_retry: false,
        });
        if self.config.commit.revert_on_error {
            let from = self.quantity;
            if from != baseline {
                self.quantity = baseline;
                effects.push(Effect::Reverted { from, to: baseline });
            }
        }
        effects.push(Effect::LoadingChanged(false));
        effects
    }

    // --- helpers ---

    fn push_boundary_effects(&self, effects: &mut Vec<Effect>, old: Quantity, new: Quantity) {
        let bounds = &self.config.bounds;
        if new == bounds.max() && old != bounds.max() {
            effects.push(Effect::MaxReached);
        }
        if new == bounds.min() && old != bounds.min() {
            effects.push(Effect::MinReached);
        }
    }

    fn fresh_token(&mut self) -> CommitToken {
        self.next_token += 1;
        CommitToken::from_raw(self.next_token)
    }
}

impl fmt::Debug for StepperController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepperController")
            .field("quantity", &self.quantity)
            .field("committed", &self.committed)
            .field("pending", &self.pending)
            .field("debounce", &self.debounce)
            .field("undo", &self.undo)
            .field("repeat", &self.repeat)
            .field("enabled", &self.enabled)
            .field("removed", &self.removed)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}
