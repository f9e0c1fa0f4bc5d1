//! Error taxonomy.
//!
//! Configuration problems are caught before any trader exists; invocation
//! problems are caught at the engine boundary. Timeouts and a missing
//! equilibrium are ordinary results, not errors.

use thiserror::Error;

use crate::types::Price;

/// The engine was handed something it cannot produce a ledger for.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    #[error("trader population is empty")]
    EmptyPopulation,

    #[error("trader population has no buyers")]
    NoBuyers,

    #[error("trader population has no sellers")]
    NoSellers,

    #[error("invalid price bounds [{min}, {max}]: need min <= max strictly inside the i64 range")]
    InvalidPriceBounds { min: Price, max: Price },
}

/// A parameter bundle failed validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("price range [{min}, {max}] is invalid: need min_price <= max_price < {}", Price::MAX)]
    InvalidPriceBounds { min: Price, max: Price },

    #[error("{field} must not be negative (got {value})")]
    NegativePrice { field: &'static str, value: Price },

    #[error("num_traders must be greater than 0")]
    NoTraders,

    #[error("num_traders must be even so buyers and sellers pair up (got {0})")]
    OddTraderCount(usize),

    #[error("periods must be greater than 0")]
    ZeroPeriods,

    #[error("timeout must be a positive number of seconds (got {0})")]
    NonPositiveTimeout(f64),

    #[error("num_commodities must be greater than 0")]
    ZeroCommodities,

    #[error("costs has {costs} entries but redemption_values has {redemptions}")]
    ScheduleLengthMismatch { costs: usize, redemptions: usize },

    #[error("{field} value {value} is outside [{min}, {max}]")]
    ValueOutOfRange {
        field: &'static str,
        value: Price,
        min: Price,
        max: Price,
    },

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}
