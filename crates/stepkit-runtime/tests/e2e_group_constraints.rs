#![forbid(unsafe_code)]

//! End-to-end tests for group coordination across sibling controls.
//!
//! Each member keeps its own controller; the coordinator is an extra
//! validation layer the host consults before submitting a change and
//! informs after one applies. Covers the shared-total cap and
//! single-selection exclusivity.
//!
//! Run:
//!   cargo test -p stepkit-runtime --test e2e_group_constraints

use stepkit_core::{Bounds, Intent, Quantity, StepSize, StepperConfig};
use stepkit_runtime::{
    GroupConfig, GroupCoordinator, GroupDirective, GroupRejection, MemberId, StepperController,
};
use web_time::Instant;

fn member_config(initial: i64) -> StepperConfig {
    let bounds = Bounds::new(
        Quantity::from_int(0),
        Quantity::from_int(10),
        StepSize::of_int(1).unwrap(),
    )
    .unwrap();
    StepperConfig::new(bounds, Quantity::from_int(initial))
}

/// A pair of sibling controls sharing one coordinator, driven the way a
/// host would: check the group, apply to the member, record the result.
struct Pair {
    group: GroupCoordinator,
    a: (MemberId, StepperController),
    b: (MemberId, StepperController),
}

impl Pair {
    fn new(config: GroupConfig, initial_a: i64, initial_b: i64) -> Self {
        let mut group = GroupCoordinator::new(config);
        let a = MemberId::new(1);
        let b = MemberId::new(2);
        let ctl_a = StepperController::new(member_config(initial_a)).unwrap();
        let ctl_b = StepperController::new(member_config(initial_b)).unwrap();
        group.register(a, ctl_a.quantity()).unwrap();
        group.register(b, ctl_b.quantity()).unwrap();
        Self {
            group,
            a: (a, ctl_a),
            b: (b, ctl_b),
        }
    }

    fn increment_a(&mut self, now: Instant) -> Result<Vec<GroupDirective>, GroupRejection> {
        let (id, ctl) = &mut self.a;
        let proposed = ctl
            .quantity()
            .checked_add(ctl.config().bounds.step())
            .expect("step overflow");
        self.group.check(*id, proposed)?;
        ctl.apply(Intent::Increment, now);
        Ok(self.group.record(*id, ctl.quantity()))
    }
}

#[test]
fn shared_cap_rejects_overflowing_member_increment() {
    let mut pair = Pair::new(
        GroupConfig::default().max_total(Quantity::from_int(9)),
        4,
        5,
    );
    let now = Instant::now();

    // 4 + 5 = 9: the cap is already met, so a's increment must not pass.
    let err = pair.increment_a(now).unwrap_err();
    assert_eq!(
        err,
        GroupRejection::TotalExceeded {
            proposed_total: Quantity::from_int(10),
            max_total: Quantity::from_int(9),
        }
    );
    // The member's own quantity never moved.
    assert_eq!(pair.a.1.quantity(), Quantity::from_int(4));
    assert_eq!(pair.group.total_units(), 9);
}

#[test]
fn increments_under_the_cap_pass_through() {
    let mut pair = Pair::new(
        GroupConfig::default().max_total(Quantity::from_int(10)),
        4,
        5,
    );
    let now = Instant::now();

    assert!(pair.increment_a(now).unwrap().is_empty());
    assert_eq!(pair.a.1.quantity(), Quantity::from_int(5));
    assert_eq!(pair.group.total_units(), 10);

    // The next one would hit 11 and is rejected.
    assert!(pair.increment_a(now).is_err());
    assert_eq!(pair.group.total_units(), 10);
}

#[test]
fn exclusivity_zeroes_the_positive_sibling() {
    let mut pair = Pair::new(GroupConfig::default().exclusive(), 0, 3);
    let now = Instant::now();

    // a takes a positive quantity: the coordinator orders b zeroed.
    let directives = pair.increment_a(now).unwrap();
    assert_eq!(directives, vec![GroupDirective::ZeroMember(pair.b.0)]);

    // The host applies the directive to the sibling controller.
    for GroupDirective::ZeroMember(id) in directives {
        assert_eq!(id, pair.b.0);
        pair.b.1.set_quantity(Quantity::from_int(0), now);
        pair.group.record(id, pair.b.1.quantity());
    }

    assert_eq!(pair.a.1.quantity(), Quantity::from_int(1));
    assert_eq!(pair.b.1.quantity(), Quantity::from_int(0));
    assert_eq!(pair.group.total_units(), 1);
}

#[test]
fn exclusivity_without_competitors_yields_no_directives() {
    let mut pair = Pair::new(GroupConfig::default().exclusive(), 0, 0);
    let now = Instant::now();

    let directives = pair.increment_a(now).unwrap();
    assert!(directives.is_empty());
}

#[test]
fn unregistered_member_is_rejected() {
    let group = GroupCoordinator::new(GroupConfig::default().max_total(Quantity::from_int(5)));
    let err = group
        .check(MemberId::new(99), Quantity::from_int(1))
        .unwrap_err();
    assert_eq!(
        err,
        GroupRejection::UnknownMember {
            member: MemberId::new(99)
        }
    );
}

#[test]
fn unregistering_a_member_frees_cap_room() {
    let mut pair = Pair::new(
        GroupConfig::default().max_total(Quantity::from_int(9)),
        4,
        5,
    );
    let now = Instant::now();

    assert!(pair.increment_a(now).is_err());
    let b_id = pair.b.0;
    pair.group.unregister(b_id);

    // With b gone the same increment fits.
    assert!(pair.increment_a(now).is_ok());
    assert_eq!(pair.a.1.quantity(), Quantity::from_int(5));
    assert_eq!(pair.group.total_units(), 5);
}
