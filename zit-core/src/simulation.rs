//! Whole-run driver: seed → population → periods → report.
//!
//! Seeding: one `StdRng` per population, seeded once before the traders are
//! generated. The same stream then drives every period; it is never
//! re-seeded between periods. A comparison run seeds each population's
//! stream from the same seed, so both populations get identical schedules.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::MarketParams;
use crate::curves::{SupplyDemandCurves, TransactionSeries};
use crate::error::MarketError;
use crate::market::{MarketRun, PeriodOutcome, market};
use crate::population::{AggregateValues, Population};
use crate::types::{Price, PriceBounds};

/// Per-period digest for quick comparison against the equilibrium.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub period: usize,
    pub trades: usize,
    pub outcome: PeriodOutcome,
    pub mean_price: Option<f64>,
    pub surplus: Price,
    /// Realised surplus over the theoretical maximum.
    pub efficiency: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub seed: u64,
    pub constrained: bool,
    pub bounds: PriceBounds,
    pub population: Population,
    pub values: AggregateValues,
    pub curves: SupplyDemandCurves,
    pub run: MarketRun,
    pub series: TransactionSeries,
    pub summaries: Vec<PeriodSummary>,
}

impl RunReport {
    fn build(
        seed: u64,
        constrained: bool,
        bounds: PriceBounds,
        population: Population,
        run: MarketRun,
    ) -> Self {
        let values = population.aggregate_values();
        let curves = SupplyDemandCurves::from_values(&values);
        let series = TransactionSeries::from_run(&run);
        let summaries = run
            .periods
            .iter()
            .map(|record| {
                let prices = record.ledger.prices();
                let mean_price = (!prices.is_empty())
                    .then(|| prices.iter().sum::<Price>() as f64 / prices.len() as f64);
                let surplus = record.surplus();
                let efficiency =
                    (curves.max_surplus > 0).then(|| surplus as f64 / curves.max_surplus as f64);
                PeriodSummary {
                    period: record.period,
                    trades: prices.len(),
                    outcome: record.ledger.outcome,
                    mean_price,
                    surplus,
                    efficiency,
                }
            })
            .collect();

        Self {
            seed,
            constrained,
            bounds,
            population,
            values,
            curves,
            run,
            series,
            summaries,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Same seed and schedules, run once with constrained and once with
/// unconstrained traders.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub constrained: RunReport,
    pub unconstrained: RunReport,
}

pub struct Simulation {
    params: MarketParams,
    seed: u64,
}

impl Simulation {
    /// Fix the run's seed: the configured one, or a fresh draw from OS
    /// entropy, logged so the run can be replayed.
    pub fn new(params: MarketParams) -> Self {
        let seed = match params.seed {
            Some(seed) => seed,
            None => {
                let seed = rand::rng().random();
                tracing::info!(seed, "no random_seed configured, drew one from entropy");
                seed
            }
        };
        Self { params, seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// A population plus the stream that generated it, ready to drive periods.
    pub fn population(&self, constrained: bool) -> (Population, StdRng) {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let population = Population::generate(&self.params, constrained, &mut rng);
        (population, rng)
    }

    /// Run the configured population for the configured number of periods.
    pub fn run(&self) -> Result<RunReport, MarketError> {
        self.run_with(self.params.constrained)
    }

    pub fn run_comparison(&self) -> Result<Comparison, MarketError> {
        Ok(Comparison {
            constrained: self.run_with(true)?,
            unconstrained: self.run_with(false)?,
        })
    }

    fn run_with(&self, constrained: bool) -> Result<RunReport, MarketError> {
        let (population, mut rng) = self.population(constrained);
        let run = market(
            population.traders(),
            self.params.bounds,
            self.params.timeout,
            self.params.periods,
            &mut rng,
        )?;
        tracing::info!(
            seed = self.seed,
            constrained,
            periods = run.periods.len(),
            trades = run.total_trades(),
            "market run finished"
        );
        Ok(RunReport::build(
            self.seed,
            constrained,
            self.params.bounds,
            population,
            run,
        ))
    }
}
