//! Theoretical market-clearing point.
//!
//! Sorting all costs ascending gives the market supply step function;
//! sorting all redemption values descending gives demand. The equilibrium is
//! where the two cross. This is independent of any simulated run and fully
//! deterministic.

use serde::{Deserialize, Serialize};

use crate::types::Price;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Equilibrium {
    Cleared { quantity: usize, price: Price },
    /// Supply and demand never cross within the given schedules.
    NoCrossing,
}

impl Equilibrium {
    pub fn price(&self) -> Option<Price> {
        match self {
            Equilibrium::Cleared { price, .. } => Some(*price),
            Equilibrium::NoCrossing => None,
        }
    }

    pub fn quantity(&self) -> Option<usize> {
        match self {
            Equilibrium::Cleared { quantity, .. } => Some(*quantity),
            Equilibrium::NoCrossing => None,
        }
    }
}

fn sorted_steps(costs: &[Price], redemptions: &[Price]) -> (Vec<Price>, Vec<Price>) {
    let mut supply = costs.to_vec();
    supply.sort_unstable();
    let mut demand = redemptions.to_vec();
    demand.sort_unstable_by(|a, b| b.cmp(a));
    (supply, demand)
}

/// Equilibrium of the aggregate (unsorted) cost and redemption lists.
///
/// Scanning unit index `i` upward:
/// - `demand[i] == supply[i]`: exact crossing, `(i, demand[i])`.
/// - `demand[i] < supply[i]`: the curves crossed between steps; the price is
///   the higher of `demand[i]` and the previous supply step `supply[i - 1]`.
///   At `i == 0` there is no previous supply step and the price is
///   `demand[0]`. Taking "the previous step" as the last element instead
///   would price the market at the highest cost, which lies above every
///   buyer's valuation, so the lookup does not wrap around.
///
/// Only indices present in both lists are scanned.
pub fn equilibrium(costs: &[Price], redemptions: &[Price]) -> Equilibrium {
    let (supply, demand) = sorted_steps(costs, redemptions);

    for (i, (&d, &s)) in demand.iter().zip(&supply).enumerate() {
        if d == s {
            return Equilibrium::Cleared {
                quantity: i,
                price: d,
            };
        }
        if d < s {
            let price = match i.checked_sub(1) {
                Some(prev) => d.max(supply[prev]),
                None => d,
            };
            return Equilibrium::Cleared { quantity: i, price };
        }
    }
    Equilibrium::NoCrossing
}

/// Largest total surplus the market can realise: the sum of
/// `redemption - cost` over every sorted unit pair that is profitable.
pub fn max_surplus(costs: &[Price], redemptions: &[Price]) -> Price {
    let (supply, demand) = sorted_steps(costs, redemptions);
    demand
        .iter()
        .zip(&supply)
        .map(|(d, s)| d - s)
        .take_while(|gain| *gain > 0)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_crossing() {
        let eq = equilibrium(&[75, 80, 85, 90], &[115, 105, 95, 90]);
        assert_eq!(
            eq,
            Equilibrium::Cleared {
                quantity: 3,
                price: 90
            }
        );
    }

    #[test]
    fn input_order_does_not_matter() {
        let eq = equilibrium(&[90, 75, 85, 80], &[90, 115, 95, 105]);
        assert_eq!(eq.quantity(), Some(3));
        assert_eq!(eq.price(), Some(90));
    }

    #[test]
    fn two_by_two_population_from_aggregate_lists() {
        // b1 [110,100,90], b2 [115,105,95], s1 [80,85,90], s2 [75,80,85]
        let costs = [80, 85, 90, 75, 80, 85];
        let redemptions = [110, 100, 90, 115, 105, 95];
        assert_eq!(
            equilibrium(&costs, &redemptions),
            Equilibrium::Cleared {
                quantity: 5,
                price: 90
            }
        );
    }

    #[test]
    fn crossing_between_steps_takes_tightest_bound() {
        // demand 40, 25, 15 / supply 10, 20, 30: crosses at i=2
        let eq = equilibrium(&[10, 20, 30], &[40, 25, 15]);
        assert_eq!(
            eq,
            Equilibrium::Cleared {
                quantity: 2,
                price: 20
            }
        );

        let eq = equilibrium(&[10, 20, 30], &[40, 28, 25]);
        assert_eq!(eq.price(), Some(25));
    }

    #[test]
    fn crossing_at_first_unit_does_not_wrap_around() {
        // Highest redemption is below the cheapest cost: nothing trades.
        let eq = equilibrium(&[50, 300], &[40, 10]);
        assert_eq!(
            eq,
            Equilibrium::Cleared {
                quantity: 0,
                price: 40
            }
        );
        assert_ne!(eq.price(), Some(300), "must not wrap to the highest cost");
    }

    #[test]
    fn demand_above_supply_everywhere_has_no_crossing() {
        // Every buyer values every unit above every cost; the scan runs out
        // before the curves meet.
        let eq = equilibrium(&[80, 85], &[115, 105]);
        assert_eq!(eq, Equilibrium::NoCrossing);
        assert_ne!(eq.price(), Some(0));
        assert_eq!(equilibrium(&[], &[]), Equilibrium::NoCrossing);
    }

    #[test]
    fn max_surplus_sums_profitable_pairs() {
        assert_eq!(max_surplus(&[75, 80, 85, 90], &[115, 105, 95, 90]), 40 + 25 + 10);
        assert_eq!(max_surplus(&[50], &[40]), 0);
    }

    #[test]
    fn equilibrium_serializes_with_kind_tag() {
        let json = serde_json::to_string(&Equilibrium::NoCrossing).unwrap();
        assert_eq!(json, r#"{"kind":"no_crossing"}"#);
        let json = serde_json::to_string(&Equilibrium::Cleared {
            quantity: 2,
            price: 20,
        })
        .unwrap();
        assert_eq!(json, r#"{"kind":"cleared","quantity":2,"price":20}"#);
    }
}
