#![forbid(unsafe_code)]

//! Coordination across a set of sibling controls.
//!
//! A [`GroupCoordinator`] never owns a member's quantity; each control
//! instance keeps its own. The coordinator is an additional validation
//! layer the host consults before submitting a change (`check`) and
//! informs after one applies (`record`). Two constraints are supported:
//!
//! - **Shared maximum total**: an increment that would push the summed
//!   quantity of all members past `max_total` is rejected.
//! - **Exclusivity**: when one member takes a positive quantity, `record`
//!   returns zeroing directives for every other positive sibling.
//!
//! # Example
//! ```
//! use stepkit_core::Quantity;
//! use stepkit_runtime::group::{GroupConfig, GroupCoordinator, MemberId};
//!
//! let mut group = GroupCoordinator::new(
//!     GroupConfig::default().max_total(Quantity::from_int(10)),
//! );
//! let a = MemberId::new(1);
//! let b = MemberId::new(2);
//! group.register(a, Quantity::from_int(4)).unwrap();
//! group.register(b, Quantity::from_int(5)).unwrap();
//!
//! assert!(group.check(a, Quantity::from_int(5)).is_ok());
//! assert!(group.check(a, Quantity::from_int(6)).is_err());
//! ```

use std::fmt;

use ahash::AHashMap;
use stepkit_core::Quantity;

/// Identifies one control inside a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId(u64);

impl MemberId {
    /// Build an id from its raw value.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw value.
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Group-level constraints.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupConfig {
    /// Optional cap on the summed quantity of all members.
    pub max_total: Option<Quantity>,
    /// When set, a member taking a positive quantity zeroes its siblings.
    pub exclusive: bool,
}

impl GroupConfig {
    /// Cap the summed quantity of all members.
    pub fn max_total(mut self, cap: Quantity) -> Self {
        self.max_total = Some(cap);
        self
    }

    /// Enforce single-selection exclusivity.
    pub fn exclusive(mut self) -> Self {
        self.exclusive = true;
        self
    }
}

/// Why the group declined a member's proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupRejection {
    /// The change would push the shared total past the cap.
    TotalExceeded {
        /// Total the group would reach.
        proposed_total: Quantity,
        /// The configured cap.
        max_total: Quantity,
    },
    /// The member was never registered.
    UnknownMember {
        /// The offending id.
        member: MemberId,
    },
    /// The proposal's scale differs from the group's.
    ScaleMismatch,
}

impl fmt::Display for GroupRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TotalExceeded {
                proposed_total,
                max_total,
            } => write!(
                f,
                "group total {proposed_total} would exceed cap {max_total}"
            ),
            Self::UnknownMember { member } => {
                write!(f, "member {} not registered", member.raw())
            }
            Self::ScaleMismatch => f.write_str("proposal scale differs from the group scale"),
        }
    }
}

impl std::error::Error for GroupRejection {}

/// An instruction the host must apply to a sibling control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupDirective {
    /// Force the member's quantity to zero (exclusivity).
    ZeroMember(MemberId),
}

/// Tracks sibling quantities and enforces group constraints.
#[derive(Debug)]
pub struct GroupCoordinator {
    config: GroupConfig,
    members: AHashMap<MemberId, Quantity>,
    scale: Option<u8>,
}

impl GroupCoordinator {
    /// Create a coordinator. The group's scale is fixed by `max_total`
    /// when present, otherwise by the first registered member.
    pub fn new(config: GroupConfig) -> Self {
        let scale = config.max_total.map(|q| q.scale());
        Self {
            config,
            members: AHashMap::new(),
            scale,
        }
    }

    /// Register a member with its current quantity.
    pub fn register(&mut self, member: MemberId, quantity: Quantity) -> Result<(), GroupRejection> {
        self.require_scale(quantity)?;
        self.members.insert(member, quantity);
        tracing::debug!(
            target: "stepkit.group",
            member = member.raw(),
            quantity = quantity.units(),
            "member registered"
        );
        Ok(())
    }

    /// Drop a member from the group.
    pub fn unregister(&mut self, member: MemberId) {
        self.members.remove(&member);
    }

    /// Number of registered members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True when no members are registered.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Summed units across all members.
    pub fn total_units(&self) -> i64 {
        self.members.values().map(Quantity::units).sum()
    }

    /// Would `member` moving to `proposed` keep the group legal?
    pub fn check(&self, member: MemberId, proposed: Quantity) -> Result<(), GroupRejection> {
        if self.scale.is_some_and(|s| s != proposed.scale()) {
            return Err(GroupRejection::ScaleMismatch);
        }
        let current = self
            .members
            .get(&member)
            .copied()
            .ok_or(GroupRejection::UnknownMember { member })?;
        if let Some(cap) = self.config.max_total {
            let proposed_total = self.total_units() - current.units() + proposed.units();
            if proposed_total > cap.units() {
                return Err(GroupRejection::TotalExceeded {
                    proposed_total: cap.with_units(proposed_total),
                    max_total: cap,
                });
            }
        }
        Ok(())
    }

    /// Record an applied quantity. Under exclusivity, returns zeroing
    /// directives for every other positive member (already applied to
    /// the coordinator's own bookkeeping).
    pub fn record(&mut self, member: MemberId, quantity: Quantity) -> Vec<GroupDirective> {
        if self.require_scale(quantity).is_err() {
            return Vec::new();
        }
        self.members.insert(member, quantity);
        if !self.config.exclusive || !quantity.is_positive() {
            return Vec::new();
        }
        let mut directives = Vec::new();
        for (&other, value) in &mut self.members {
            if other != member && value.is_positive() {
                *value = value.with_units(0);
                directives.push(GroupDirective::ZeroMember(other));
            }
        }
        directives.sort_by_key(|GroupDirective::ZeroMember(id)| *id);
        if !directives.is_empty() {
            tracing::debug!(
                target: "stepkit.group",
                member = member.raw(),
                zeroed = directives.len(),
                "exclusivity zeroed siblings"
            );
        }
        directives
    }

    fn require_scale(&mut self, quantity: Quantity) -> Result<(), GroupRejection> {
        match self.scale {
            Some(scale) if scale != quantity.scale() => Err(GroupRejection::ScaleMismatch),
            Some(_) => Ok(()),
            None => {
                self.scale = Some(quantity.scale());
                Ok(())
            }
        }
    }
}
