//! Valuation schedules.
//!
//! A schedule is the ordered list of per-unit values a trader consumes front
//! to back as it trades: redemption values for buyers, costs for sellers.
//! Schedules are immutable once built and cheap to clone, so every period
//! (and every trader handed the same explicit schedule) shares one
//! allocation.

use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::{Price, Role};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValuationSchedule(Arc<[Price]>);

impl ValuationSchedule {
    /// Build a schedule for `role`, sorting the values into marginal order:
    /// descending for buyers (decreasing marginal value), ascending for
    /// sellers (increasing marginal cost).
    pub fn for_role(role: Role, values: impl IntoIterator<Item = Price>) -> Self {
        let mut values: Vec<Price> = values.into_iter().collect();
        match role {
            Role::Buyer => values.sort_unstable_by(|a, b| b.cmp(a)),
            Role::Seller => values.sort_unstable(),
        }
        Self(values.into())
    }

    /// Number of units this schedule lets a trader trade.
    pub fn units(&self) -> usize {
        self.0.len()
    }

    /// Value of the `index`-th unit, `None` once the schedule is used up.
    pub fn unit_value(&self, index: usize) -> Option<Price> {
        self.0.get(index).copied()
    }

    pub fn values(&self) -> &[Price] {
        &self.0
    }

    /// True if both handles point at the same allocation.
    pub fn shares_storage_with(&self, other: &ValuationSchedule) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for ValuationSchedule {
    type Target = [Price];

    fn deref(&self) -> &[Price] {
        &self.0
    }
}
