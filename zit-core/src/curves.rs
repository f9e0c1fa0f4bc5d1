//! Plot-ready data: supply/demand step curves and the flattened price
//! series. No rendering happens here.

use serde::{Deserialize, Serialize};

use crate::equilibrium::{Equilibrium, equilibrium, max_surplus};
use crate::market::MarketRun;
use crate::population::AggregateValues;
use crate::types::Price;

/// Market supply and demand as step functions.
///
/// `supply[x]` / `demand[x]` is the price level of the step ending at unit
/// `x`. The first value is repeated at `x = 0` so a step plot starts flat
/// at the first unit's price.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyDemandCurves {
    pub supply: Vec<Price>,
    pub demand: Vec<Price>,
    pub equilibrium: Equilibrium,
    pub max_surplus: Price,
}

impl SupplyDemandCurves {
    pub fn from_values(values: &AggregateValues) -> Self {
        let mut supply = values.costs.clone();
        supply.sort_unstable();
        let mut demand = values.redemptions.clone();
        demand.sort_unstable_by(|a, b| b.cmp(a));

        Self {
            supply: with_leading_step(supply),
            demand: with_leading_step(demand),
            equilibrium: equilibrium(&values.costs, &values.redemptions),
            max_surplus: max_surplus(&values.costs, &values.redemptions),
        }
    }

    /// Number of unit steps on the longer curve.
    pub fn units(&self) -> usize {
        self.supply.len().max(self.demand.len()).saturating_sub(1)
    }
}

fn with_leading_step(mut steps: Vec<Price>) -> Vec<Price> {
    if let Some(&first) = steps.first() {
        steps.insert(0, first);
    }
    steps
}

/// All periods' trade prices as one series, plus where periods change.
///
/// Trade `k` (1-based across the whole run) sits at `x = k`; a boundary
/// after a period whose last trade is the `c`-th overall sits at `c + 0.5`.
/// No boundary is emitted after the final period.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionSeries {
    pub prices: Vec<Price>,
    pub period_boundaries: Vec<f64>,
}

impl TransactionSeries {
    pub fn from_run(run: &MarketRun) -> Self {
        Self::from_ledgers(&run.prices())
    }

    pub fn from_ledgers(ledgers: &[Vec<Price>]) -> Self {
        let prices: Vec<Price> = ledgers.iter().flatten().copied().collect();
        let mut period_boundaries = Vec::with_capacity(ledgers.len().saturating_sub(1));
        let mut cumulative = 0usize;
        for ledger in ledgers.iter().take(ledgers.len().saturating_sub(1)) {
            cumulative += ledger.len();
            period_boundaries.push(cumulative as f64 + 0.5);
        }
        Self {
            prices,
            period_boundaries,
        }
    }
}
