#![forbid(unsafe_code)]

//! End-to-end tests for the three dispatch modes.
//!
//! Covers:
//! - Sync mode: immediate application, no commits, once-per-arrival bound
//!   notifications.
//! - Optimistic mode: apply-then-commit, revert on failure, supersession
//!   while a commit is in flight, automatic and manual retries.
//! - Debounced mode: display updates immediately, exactly one commit per
//!   quiescence period carrying the latest target.
//!
//! Run:
//!   cargo test -p stepkit-runtime --test e2e_dispatch_modes

use stepkit_core::{
    BackoffStrategy, Bounds, CommitConfig, DispatchMode, Effect, Intent, Quantity, RetryPolicy,
    StepSize, StepperConfig,
};
use stepkit_harness::Driver;
use stepkit_runtime::StateFlags;
use web_time::Duration;

fn config(min: i64, max: i64, initial: i64) -> StepperConfig {
    let bounds = Bounds::new(
        Quantity::from_int(min),
        Quantity::from_int(max),
        StepSize::of_int(1).unwrap(),
    )
    .unwrap();
    StepperConfig::new(bounds, Quantity::from_int(initial))
}

// ── Sync mode ─────────────────────────────────────────────────────────────

#[test]
fn sync_tap_sequence_hits_max_once_then_rejects() {
    // min=1, max=10, step=1, start 5. One increment lands on 6 with no
    // bound notification; five more land on 10 with MaxReached exactly
    // once; an eleventh attempt is rejected and the value stays 10.
    let mut driver = Driver::new(config(1, 10, 5)).unwrap();

    driver.apply(Intent::Increment);
    assert_eq!(driver.view().quantity, Some(Quantity::from_int(6)));
    assert_eq!(driver.log.count("max_reached"), 0);
    assert_eq!(driver.log.count("min_reached"), 0);

    for _ in 0..5 {
        driver.apply(Intent::Increment);
    }
    assert_eq!(driver.view().quantity, Some(Quantity::from_int(10)));
    assert_eq!(driver.log.count("max_reached"), 1);

    driver.apply(Intent::Increment);
    assert_eq!(driver.view().quantity, Some(Quantity::from_int(10)));
    assert_eq!(driver.log.count("max_reached"), 1);
    assert_eq!(driver.log.count("validation_rejected"), 1);

    // Sync mode never delegates to the commit operation.
    assert_eq!(driver.commits.commit_count(), 0);
}

#[test]
fn sync_manual_entry_applies_and_snaps() {
    let mut driver = Driver::new(config(1, 10, 5)).unwrap();
    driver.apply(Intent::SetValue(Quantity::from_int(9)));
    assert_eq!(driver.view().quantity, Some(Quantity::from_int(9)));
    assert_eq!(driver.log.changes(), vec![(5, 9)]);
}

// ── Optimistic mode ───────────────────────────────────────────────────────

#[test]
fn optimistic_applies_before_confirmation() {
    let mut driver = Driver::new(config(1, 10, 5).mode(DispatchMode::Optimistic)).unwrap();

    driver.apply(Intent::Increment);
    // Displayed value moves before the commit resolves.
    assert_eq!(driver.view().quantity, Some(Quantity::from_int(6)));
    assert!(driver.view().flags.contains(StateFlags::LOADING));
    assert_eq!(driver.commits.outstanding(), 1);

    driver.resolve_next_commit();
    assert_eq!(driver.view().quantity, Some(Quantity::from_int(6)));
    assert!(!driver.view().flags.contains(StateFlags::LOADING));
}

#[test]
fn optimistic_failure_reverts_to_pre_change_value() {
    let mut driver = Driver::new(config(1, 10, 5).mode(DispatchMode::Optimistic)).unwrap();
    driver.commits.queue_err("cart service unavailable");

    driver.apply(Intent::Increment);
    driver.resolve_next_commit();

    assert_eq!(driver.view().quantity, Some(Quantity::from_int(5)));
    assert_eq!(driver.log.count("commit_failed"), 1);
    assert_eq!(driver.log.count("reverted"), 1);
    assert!(!driver.view().flags.contains(StateFlags::LOADING));
}

#[test]
fn optimistic_supersession_coalesces_inflight_commits() {
    let mut driver = Driver::new(config(1, 10, 5).mode(DispatchMode::Optimistic)).unwrap();

    // Three taps while the first commit is still out: one commit in
    // flight, the target keeps moving.
    driver.apply(Intent::Increment);
    driver.apply(Intent::Increment);
    driver.apply(Intent::Increment);
    assert_eq!(driver.commits.commit_count(), 1);
    assert_eq!(driver.view().quantity, Some(Quantity::from_int(8)));

    // First resolution confirms 6 and issues one follow-up for 8.
    driver.resolve_next_commit();
    assert_eq!(driver.commits.commit_count(), 2);
    assert_eq!(
        driver.commits.seen_targets(),
        &[Quantity::from_int(6), Quantity::from_int(8)]
    );

    driver.resolve_next_commit();
    assert_eq!(driver.commits.outstanding(), 0);
    assert!(!driver.view().flags.contains(StateFlags::LOADING));
}

#[test]
fn optimistic_superseded_failure_reverts_past_whole_batch() {
    let mut driver = Driver::new(config(1, 10, 5).mode(DispatchMode::Optimistic)).unwrap();
    driver.commits.queue_err("offline");

    driver.apply(Intent::Increment);
    driver.apply(Intent::Increment);
    driver.resolve_next_commit();

    // The revert destination is the last confirmed value, not the
    // intermediate optimistic one.
    assert_eq!(driver.view().quantity, Some(Quantity::from_int(5)));
}

#[test]
fn optimistic_automatic_retry_then_success() {
    let mut driver = Driver::new(
        config(1, 10, 5)
            .mode(DispatchMode::Optimistic)
            .commit(CommitConfig::default().retry(RetryPolicy::new(
                1,
                BackoffStrategy::Fixed { delay_ms: 100 },
            ))),
    )
    .unwrap();
    driver.commits.queue_err("flaky");
    driver.commits.queue_ok();

    driver.apply(Intent::Increment);
    driver.resolve_next_commit();
    // Failure with a retry in hand: value stays optimistic, no revert.
    assert_eq!(driver.view().quantity, Some(Quantity::from_int(6)));
    assert_eq!(driver.log.count("reverted"), 0);

    // The retry fires at its deadline and succeeds.
    driver.advance(Duration::from_millis(100));
    assert_eq!(driver.commits.commit_count(), 2);
    driver.resolve_next_commit();
    assert_eq!(driver.view().quantity, Some(Quantity::from_int(6)));
    assert!(!driver.view().flags.contains(StateFlags::LOADING));
}

#[test]
fn optimistic_manual_retry_after_exhaustion() {
    let mut driver = Driver::new(config(1, 10, 5).mode(DispatchMode::Optimistic)).unwrap();
    driver.commits.queue_err("offline");
    driver.commits.queue_ok();

    driver.apply(Intent::Increment);
    driver.resolve_next_commit();
    assert_eq!(driver.view().quantity, Some(Quantity::from_int(5)));

    // The surfaced failure carries a retry capability; exercising it
    // re-applies the reverted value and re-submits the failed target.
    let effects = driver.controller.retry_failed_commit(driver.now());
    driver.commits.observe(&effects);
    driver.log.record(effects);
    assert_eq!(
        driver.commits.seen_targets().last(),
        Some(&Quantity::from_int(6))
    );
    assert_eq!(driver.view().quantity, Some(Quantity::from_int(6)));

    // A successful retry leaves the display on the value it confirmed.
    driver.resolve_next_commit();
    assert_eq!(driver.view().quantity, Some(Quantity::from_int(6)));
    assert!(!driver.view().flags.contains(StateFlags::LOADING));
}

// ── Debounced mode ────────────────────────────────────────────────────────

#[test]
fn debounce_coalesces_burst_into_one_commit() {
    // Delay 500ms; increments at t=0, 100, 200 targeting 6, 7, 8. The
    // commit operation runs once, at t=700, with 8.
    let mut driver = Driver::new(config(1, 10, 5).mode(DispatchMode::Debounced {
        delay: Duration::from_millis(500),
    }))
    .unwrap();

    driver.apply_at(Duration::ZERO, Intent::Increment);
    driver.apply_at(Duration::from_millis(100), Intent::Increment);
    driver.apply_at(Duration::from_millis(200), Intent::Increment);

    // Display tracks every tap; no commit yet.
    assert_eq!(driver.view().quantity, Some(Quantity::from_int(8)));
    assert_eq!(driver.commits.commit_count(), 0);

    // Quiescence: nothing at 699ms, the single coalesced commit at 700.
    driver.advance_to(Duration::from_millis(699));
    assert_eq!(driver.commits.commit_count(), 0);
    driver.advance_to(Duration::from_millis(700));
    assert_eq!(driver.commits.commit_count(), 1);
    assert_eq!(driver.commits.seen_targets(), &[Quantity::from_int(8)]);

    driver.resolve_next_commit();
    assert_eq!(driver.view().quantity, Some(Quantity::from_int(8)));
}

#[test]
fn debounce_failure_reverts_whole_burst() {
    let mut driver = Driver::new(config(1, 10, 5).mode(DispatchMode::Debounced {
        delay: Duration::from_millis(500),
    }))
    .unwrap();
    driver.commits.queue_err("offline");

    driver.apply(Intent::Increment);
    driver.apply(Intent::Increment);
    driver.advance(Duration::from_millis(500));
    driver.resolve_next_commit();

    // The coalesced batch failed: back to the last confirmed value.
    assert_eq!(driver.view().quantity, Some(Quantity::from_int(5)));
    assert_eq!(driver.log.count("reverted"), 1);
}

#[test]
fn debounce_new_burst_during_inflight_commit_supersedes() {
    let mut driver = Driver::new(config(1, 10, 5).mode(DispatchMode::Debounced {
        delay: Duration::from_millis(500),
    }))
    .unwrap();

    driver.apply(Intent::Increment);
    driver.advance(Duration::from_millis(500));
    assert_eq!(driver.commits.commit_count(), 1);

    // A second burst quiesces while the first commit is still out; it
    // folds into the pending commit instead of racing a second one.
    driver.apply(Intent::Increment);
    driver.advance(Duration::from_millis(500));
    assert_eq!(driver.commits.commit_count(), 1);

    // Confirming 6 triggers the follow-up for 7.
    driver.resolve_next_commit();
    assert_eq!(
        driver.commits.seen_targets(),
        &[Quantity::from_int(6), Quantity::from_int(7)]
    );
    driver.resolve_next_commit();
    assert!(!driver.view().flags.contains(StateFlags::LOADING));
}

#[test]
fn debounce_separate_quiescence_periods_commit_separately() {
    let mut driver = Driver::new(config(1, 10, 5).mode(DispatchMode::Debounced {
        delay: Duration::from_millis(500),
    }))
    .unwrap();

    driver.apply(Intent::Increment);
    driver.advance(Duration::from_millis(500));
    driver.resolve_next_commit();

    driver.apply(Intent::Increment);
    driver.advance(Duration::from_millis(500));
    driver.resolve_next_commit();

    assert_eq!(
        driver.commits.seen_targets(),
        &[Quantity::from_int(6), Quantity::from_int(7)]
    );
    assert_eq!(driver.view().quantity, Some(Quantity::from_int(7)));
}

// ── Cross-mode behavior ───────────────────────────────────────────────────

#[test]
fn detailed_change_event_fires_once_per_applied_change() {
    let mut driver = Driver::new(config(1, 10, 5).mode(DispatchMode::Debounced {
        delay: Duration::from_millis(500),
    }))
    .unwrap();

    driver.apply(Intent::Increment);
    driver.apply(Intent::Increment);
    driver.apply(Intent::SetValue(Quantity::from_int(9)));
    // Rejected proposal produces no change event.
    driver.apply(Intent::SetValue(Quantity::from_int(99)));

    assert_eq!(driver.log.changes(), vec![(5, 6), (6, 7), (7, 9)]);
    assert_eq!(driver.log.count("validation_rejected"), 1);
}

#[test]
fn dispose_mid_flight_drops_late_resolution() {
    let mut driver = Driver::new(config(1, 10, 5).mode(DispatchMode::Optimistic)).unwrap();

    driver.apply(Intent::Increment);
    driver.controller.dispose();

    // A resolution arriving after teardown mutates nothing.
    let effects = driver.resolve_next_commit();
    assert!(effects.is_empty());
    assert!(driver.controller.is_disposed());
}

#[test]
fn every_commit_failure_is_surfaced() {
    // Silent failure is prohibited: even with revert disabled the
    // failure effect always reaches the host.
    let mut driver = Driver::new(
        config(1, 10, 5)
            .mode(DispatchMode::Optimistic)
            .commit(CommitConfig::default().revert_on_error(false)),
    )
    .unwrap();
    driver.commits.queue_err("offline");

    driver.apply(Intent::Increment);
    driver.resolve_next_commit();

    assert_eq!(driver.log.count("commit_failed"), 1);
    assert_eq!(driver.log.count("reverted"), 0);
    assert_eq!(driver.view().quantity, Some(Quantity::from_int(6)));
    assert!(driver.log.all().iter().any(|e| matches!(
        e,
        Effect::CommitFailed { error, .. } if error.message() == "offline"
    )));
}
