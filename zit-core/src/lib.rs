// Zero-intelligence trader simulation of a continuous double auction
//
// Module structure:
// - types        Prices, trader ids, roles, price bounds
// - schedule     Immutable per-trader valuation schedules
// - trader       Trader identity and per-period mutable state
// - offer        Random quote generation
// - market/      Quote book, clearing loop, period orchestrator
// - equilibrium  Theoretical clearing point from aggregate schedules
// - config       File config and validated parameter bundle
// - population   Trader factory and aggregate value lists
// - curves       Plot-ready step curves and price series
// - simulation   Seeded end-to-end runs and reports

pub mod config;
pub mod curves;
pub mod equilibrium;
pub mod error;
pub mod market;
pub mod offer;
pub mod population;
pub mod schedule;
pub mod simulation;
pub mod trader;
pub mod types;

#[cfg(feature = "instrument")]
pub use instrument;

pub use config::{MarketParams, SimulationConfig};
pub use curves::{SupplyDemandCurves, TransactionSeries};
pub use equilibrium::{Equilibrium, equilibrium, max_surplus};
pub use error::{ConfigError, MarketError};
pub use market::{
    MarketRun, PeriodLedger, PeriodOutcome, PeriodRecord, Trade, TraderProfits, market,
    run_period,
};
pub use offer::generate_offer;
pub use population::{AggregateValues, Population};
pub use schedule::ValuationSchedule;
pub use simulation::{Comparison, PeriodSummary, RunReport, Simulation};
pub use trader::{Trader, TraderState};
pub use types::{Price, PriceBounds, Role, TraderId};
