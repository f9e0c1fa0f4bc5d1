//! Trader factory and population-wide views.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::MarketParams;
use crate::error::MarketError;
use crate::market::check_population;
use crate::schedule::ValuationSchedule;
use crate::trader::Trader;
use crate::types::{Price, PriceBounds, Role, TraderId};

/// Every seller's costs and every buyer's redemption values, concatenated
/// in population order. Unsorted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateValues {
    pub costs: Vec<Price>,
    pub redemptions: Vec<Price>,
}

/// A fixed set of traders. Schedules never change after construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Population {
    traders: Vec<Trader>,
}

impl Population {
    pub fn from_traders(traders: Vec<Trader>) -> Result<Self, MarketError> {
        check_population(&traders)?;
        Ok(Self { traders })
    }

    /// Build `num_traders / 2` buyers followed by as many sellers.
    ///
    /// With explicit values every trader of a role shares one schedule;
    /// otherwise each trader draws `num_commodities` values uniformly from
    /// the price bounds, buyers first.
    pub fn generate<R: Rng>(params: &MarketParams, constrained: bool, rng: &mut R) -> Self {
        let (buyer_schedule, seller_schedule) = match &params.explicit {
            Some(explicit) => (
                Some(ValuationSchedule::for_role(
                    Role::Buyer,
                    explicit.redemptions.iter().copied(),
                )),
                Some(ValuationSchedule::for_role(
                    Role::Seller,
                    explicit.costs.iter().copied(),
                )),
            ),
            None => (None, None),
        };

        let mut traders = Vec::with_capacity(params.num_traders);
        for (role, count, shared) in [
            (Role::Buyer, params.buyers(), buyer_schedule),
            (Role::Seller, params.sellers(), seller_schedule),
        ] {
            for n in 0..count {
                let schedule = match &shared {
                    Some(schedule) => schedule.clone(),
                    None => random_schedule(role, params.num_commodities, params.bounds, rng),
                };
                let id = TraderId::new(traders.len() as u32);
                traders.push(Trader::new(
                    id,
                    format!("{}{}", role.prefix(), n),
                    role,
                    constrained,
                    schedule,
                ));
            }
        }

        tracing::debug!(
            traders = traders.len(),
            constrained,
            explicit = params.explicit.is_some(),
            "generated trader population"
        );
        Self { traders }
    }

    pub fn traders(&self) -> &[Trader] {
        &self.traders
    }

    pub fn buyers(&self) -> impl Iterator<Item = &Trader> {
        self.traders.iter().filter(|t| t.is_buyer())
    }

    pub fn sellers(&self) -> impl Iterator<Item = &Trader> {
        self.traders.iter().filter(|t| !t.is_buyer())
    }

    /// Same traders and schedules under a different constraint mode.
    pub fn with_constrained(&self, constrained: bool) -> Self {
        Self {
            traders: self
                .traders
                .iter()
                .map(|t| t.with_constrained(constrained))
                .collect(),
        }
    }

    pub fn aggregate_values(&self) -> AggregateValues {
        AggregateValues {
            costs: self
                .sellers()
                .flat_map(|t| t.schedule.iter().copied())
                .collect(),
            redemptions: self
                .buyers()
                .flat_map(|t| t.schedule.iter().copied())
                .collect(),
        }
    }
}

fn random_schedule<R: Rng>(
    role: Role,
    units: usize,
    bounds: PriceBounds,
    rng: &mut R,
) -> ValuationSchedule {
    let values: Vec<Price> = (0..units)
        .map(|_| rng.random_range(bounds.min()..=bounds.max()))
        .collect();
    ValuationSchedule::for_role(role, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExplicitValues, SimulationConfig};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn params() -> MarketParams {
        let mut cfg = SimulationConfig::default();
        cfg.num_traders = 6;
        cfg.misc.num_commodities = 4;
        cfg.validate().unwrap()
    }

    #[test]
    fn half_buyers_half_sellers_in_order() {
        let mut rng = StdRng::seed_from_u64(1);
        let pop = Population::generate(&params(), true, &mut rng);
        let names: Vec<&str> = pop.traders().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["b0", "b1", "b2", "s0", "s1", "s2"]);
        assert_eq!(pop.buyers().count(), 3);
        assert!(pop.traders().iter().all(|t| t.constrained));
        let ids: Vec<u32> = pop.traders().iter().map(|t| t.id.0).collect();
        assert_eq!(ids, [0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn random_schedules_within_bounds_and_sorted() {
        let mut rng = StdRng::seed_from_u64(2);
        let pop = Population::generate(&params(), false, &mut rng);
        for t in pop.traders() {
            assert_eq!(t.schedule.units(), 4);
            assert!(t.schedule.iter().all(|v| (0..=200).contains(v)));
            let sorted = t.schedule.windows(2).all(|w| match t.role {
                Role::Buyer => w[0] >= w[1],
                Role::Seller => w[0] <= w[1],
            });
            assert!(sorted, "{} schedule not in marginal order", t.name);
        }
    }

    #[test]
    fn same_seed_same_population() {
        let a = Population::generate(&params(), true, &mut StdRng::seed_from_u64(8));
        let b = Population::generate(&params(), true, &mut StdRng::seed_from_u64(8));
        assert_eq!(a, b);
    }

    #[test]
    fn explicit_schedules_shared_across_traders() {
        let mut p = params();
        p.explicit = Some(ExplicitValues {
            costs: vec![85, 75, 80],
            redemptions: vec![100, 110, 90],
        });
        let mut rng = StdRng::seed_from_u64(3);
        let pop = Population::generate(&p, true, &mut rng);

        let buyers: Vec<&Trader> = pop.buyers().collect();
        assert_eq!(buyers[0].schedule.values(), &[110, 100, 90]);
        assert!(buyers[0].schedule.shares_storage_with(&buyers[1].schedule));

        let sellers: Vec<&Trader> = pop.sellers().collect();
        assert_eq!(sellers[2].schedule.values(), &[75, 80, 85]);

        let agg = pop.aggregate_values();
        assert_eq!(agg.costs.len(), 9);
        assert_eq!(agg.redemptions, [110, 100, 90, 110, 100, 90, 110, 100, 90]);
    }

    #[test]
    fn with_constrained_keeps_schedules() {
        let mut rng = StdRng::seed_from_u64(4);
        let pop = Population::generate(&params(), true, &mut rng);
        let free = pop.with_constrained(false);
        assert!(free.traders().iter().all(|t| !t.constrained));
        assert_eq!(free.aggregate_values(), pop.aggregate_values());
    }

    #[test]
    fn from_traders_checks_both_sides() {
        assert_eq!(
            Population::from_traders(vec![]).unwrap_err(),
            MarketError::EmptyPopulation
        );
        let pop = Population::from_traders(vec![
            Trader::buyer(0, [100], true),
            Trader::seller(1, [50], true),
        ])
        .unwrap();
        assert_eq!(
            pop.aggregate_values(),
            AggregateValues {
                costs: vec![50],
                redemptions: vec![100],
            }
        );
    }
}
