use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::MarketError;
use crate::trader::Trader;
use crate::types::{Price, PriceBounds, TraderId};

use super::clearing::{PeriodLedger, check_population, run_period_with_clock};
use super::clock::{Clock, MonotonicClock};

// === PERIOD RESULTS ===

/// Profit history of one trader over one period, in trade order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraderProfits {
    pub trader: TraderId,
    pub name: String,
    pub profits: Vec<Price>,
}

impl TraderProfits {
    pub fn total(&self) -> Price {
        self.profits.iter().sum()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecord {
    /// 0-based period index.
    pub period: usize,
    pub ledger: PeriodLedger,
    pub profits: Vec<TraderProfits>,
}

impl PeriodRecord {
    /// Total surplus (buyer plus seller profit) realised this period.
    pub fn surplus(&self) -> Price {
        self.profits.iter().map(TraderProfits::total).sum()
    }
}

/// Ledgers of every period of one market run, in period order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketRun {
    pub periods: Vec<PeriodRecord>,
}

impl MarketRun {
    /// Trade prices per period.
    pub fn prices(&self) -> Vec<Vec<Price>> {
        self.periods.iter().map(|p| p.ledger.prices()).collect()
    }

    pub fn total_trades(&self) -> usize {
        self.periods.iter().map(|p| p.ledger.len()).sum()
    }
}

// === ORCHESTRATOR ===

/// Run `periods` independent periods over `traders` with the system clock.
pub fn market<R: Rng>(
    traders: &[Trader],
    bounds: PriceBounds,
    timeout: Duration,
    periods: usize,
    rng: &mut R,
) -> Result<MarketRun, MarketError> {
    market_with_clock(traders, bounds, timeout, periods, rng, &MonotonicClock)
}

/// Run `periods` independent periods over `traders`.
///
/// Every period starts from fresh trader state derived from the same
/// schedules; nothing mutable crosses a period boundary. The random stream
/// is not re-seeded between periods.
pub fn market_with_clock<R: Rng, C: Clock>(
    traders: &[Trader],
    bounds: PriceBounds,
    timeout: Duration,
    periods: usize,
    rng: &mut R,
    clock: &C,
) -> Result<MarketRun, MarketError> {
    check_population(traders)?;

    let mut run = MarketRun {
        periods: Vec::with_capacity(periods),
    };
    for period in 0..periods {
        let mut states: Vec<_> = traders.iter().map(Trader::fresh_state).collect();
        let ledger = run_period_with_clock(&mut states, bounds, timeout, rng, clock, period)?;

        tracing::info!(
            target: "period",
            period = period,
            trades = ledger.len(),
            outcome = ledger.outcome.describe(),
            elapsed_ms = ledger.elapsed.as_secs_f64() * 1000.0,
        );

        let profits = states
            .into_iter()
            .map(|s| {
                let trader = s.trader();
                TraderProfits {
                    trader: trader.id,
                    name: trader.name.clone(),
                    profits: s.into_profits(),
                }
            })
            .collect();

        run.periods.push(PeriodRecord {
            period,
            ledger,
            profits,
        });
    }
    Ok(run)
}
