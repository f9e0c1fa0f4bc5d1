//! Simulation configuration.
//!
//! `SimulationConfig` is the raw, serde-loaded file shape; `validate()`
//! checks it and produces the `MarketParams` bundle the engine consumes.
//!
//! ```json
//! {
//!   "min_price": 0, "max_price": 200, "num_traders": 4, "periods": 3,
//!   "constrained": true,
//!   "explicit": { "costs": [], "redemption_values": [] },
//!   "misc": { "num_commodities": 3, "timeout": 1.0, "quiet": true, "random_seed": 42 }
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{Price, PriceBounds};

// === RAW CONFIG ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub min_price: Price,
    pub max_price: Price,
    #[serde(default = "default_num_traders")]
    pub num_traders: usize,
    #[serde(default = "default_periods")]
    pub periods: usize,
    #[serde(default = "default_constrained")]
    pub constrained: bool,
    #[serde(default)]
    pub explicit: ExplicitSchedules,
    #[serde(default)]
    pub misc: MiscConfig,
}

/// Schedules handed to every trader of a role. Both empty means "draw
/// random schedules".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplicitSchedules {
    #[serde(default)]
    pub costs: Vec<Price>,
    #[serde(default)]
    pub redemption_values: Vec<Price>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiscConfig {
    /// Units per trader when schedules are drawn randomly.
    #[serde(default = "default_num_commodities")]
    pub num_commodities: usize,
    /// Seconds per period.
    #[serde(default = "default_timeout")]
    pub timeout: f64,
    #[serde(default = "default_quiet")]
    pub quiet: bool,
    /// `None` or `0` draws a seed from OS entropy.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

fn default_num_traders() -> usize {
    4
}

fn default_periods() -> usize {
    1
}

fn default_constrained() -> bool {
    true
}

fn default_num_commodities() -> usize {
    5
}

fn default_timeout() -> f64 {
    30.0
}

fn default_quiet() -> bool {
    true
}

impl Default for MiscConfig {
    fn default() -> Self {
        Self {
            num_commodities: default_num_commodities(),
            timeout: default_timeout(),
            quiet: default_quiet(),
            random_seed: None,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            min_price: 0,
            max_price: 200,
            num_traders: default_num_traders(),
            periods: default_periods(),
            constrained: default_constrained(),
            explicit: ExplicitSchedules::default(),
            misc: MiscConfig::default(),
        }
    }
}

// === VALIDATED PARAMS ===

/// Explicit schedule values, already checked to be equal length and in range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplicitValues {
    pub costs: Vec<Price>,
    pub redemptions: Vec<Price>,
}

/// Validated, immutable parameters for one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketParams {
    pub bounds: PriceBounds,
    /// Even, at least 2; half buyers, half sellers.
    pub num_traders: usize,
    pub num_commodities: usize,
    pub periods: usize,
    pub timeout: Duration,
    pub constrained: bool,
    pub explicit: Option<ExplicitValues>,
    pub seed: Option<u64>,
    pub quiet: bool,
}

impl MarketParams {
    pub fn buyers(&self) -> usize {
        self.num_traders / 2
    }

    pub fn sellers(&self) -> usize {
        self.num_traders / 2
    }
}

impl SimulationConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Check every field and build the engine's parameter bundle.
    pub fn validate(&self) -> Result<MarketParams, ConfigError> {
        let (min, max) = (self.min_price, self.max_price);
        if min > max {
            return Err(ConfigError::InvalidPriceBounds { min, max });
        }
        if min < 0 {
            return Err(ConfigError::NegativePrice {
                field: "min_price",
                value: min,
            });
        }
        let bounds = PriceBounds::new(min, max)
            .map_err(|_| ConfigError::InvalidPriceBounds { min, max })?;

        if self.num_traders == 0 {
            return Err(ConfigError::NoTraders);
        }
        if self.num_traders % 2 != 0 {
            return Err(ConfigError::OddTraderCount(self.num_traders));
        }
        if self.periods == 0 {
            return Err(ConfigError::ZeroPeriods);
        }
        if self.misc.num_commodities == 0 {
            return Err(ConfigError::ZeroCommodities);
        }

        let timeout = parse_timeout(self.misc.timeout)?;
        let explicit = self.explicit.validate(bounds)?;

        Ok(MarketParams {
            bounds,
            num_traders: self.num_traders,
            num_commodities: self.misc.num_commodities,
            periods: self.periods,
            timeout,
            constrained: self.constrained,
            explicit,
            seed: self.misc.random_seed.filter(|&seed| seed != 0),
            quiet: self.misc.quiet,
        })
    }
}

fn parse_timeout(secs: f64) -> Result<Duration, ConfigError> {
    if secs.is_nan() || secs <= 0.0 {
        return Err(ConfigError::NonPositiveTimeout(secs));
    }
    Ok(Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX))
}

impl ExplicitSchedules {
    fn validate(&self, bounds: PriceBounds) -> Result<Option<ExplicitValues>, ConfigError> {
        let (costs, redemptions) = (&self.costs, &self.redemption_values);
        if costs.len() != redemptions.len() {
            return Err(ConfigError::ScheduleLengthMismatch {
                costs: costs.len(),
                redemptions: redemptions.len(),
            });
        }
        if costs.is_empty() {
            return Ok(None);
        }

        let labelled = costs
            .iter()
            .map(|v| ("costs", *v))
            .chain(redemptions.iter().map(|v| ("redemption_values", *v)));
        for (field, value) in labelled {
            if !bounds.contains(value) {
                return Err(ConfigError::ValueOutOfRange {
                    field,
                    value,
                    min: bounds.min(),
                    max: bounds.max(),
                });
            }
        }

        Ok(Some(ExplicitValues {
            costs: costs.clone(),
            redemptions: redemptions.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> SimulationConfig {
        SimulationConfig::default()
    }

    #[test]
    fn defaults_validate() {
        let params = base().validate().unwrap();
        assert_eq!(params.bounds, PriceBounds::new(0, 200).unwrap());
        assert_eq!(params.buyers(), 2);
        assert_eq!(params.sellers(), 2);
        assert_eq!(params.timeout, Duration::from_secs(30));
        assert!(params.explicit.is_none());
    }

    #[test]
    fn parses_nested_file_shape() {
        let cfg = SimulationConfig::from_json(
            r#"{
                "min_price": 10, "max_price": 150, "num_traders": 6, "periods": 3,
                "constrained": false,
                "explicit": { "costs": [80, 85], "redemption_values": [115, 105] },
                "misc": { "num_commodities": 2, "timeout": 0.5, "quiet": false, "random_seed": 7 }
            }"#,
        )
        .unwrap();
        let params = cfg.validate().unwrap();
        assert_eq!(params.num_traders, 6);
        assert!(!params.constrained);
        assert!(!params.quiet);
        assert_eq!(params.seed, Some(7));
        assert_eq!(params.timeout, Duration::from_millis(500));
        let explicit = params.explicit.unwrap();
        assert_eq!(explicit.costs, vec![80, 85]);
        assert_eq!(explicit.redemptions, vec![115, 105]);
    }

    #[test]
    fn minimal_file_fills_defaults() {
        let cfg = SimulationConfig::from_json(r#"{ "min_price": 0, "max_price": 50 }"#).unwrap();
        assert_eq!(cfg.num_traders, 4);
        assert_eq!(cfg.misc, MiscConfig::default());
    }

    #[test]
    fn zero_seed_means_entropy() {
        let mut cfg = base();
        cfg.misc.random_seed = Some(0);
        assert_eq!(cfg.validate().unwrap().seed, None);
    }

    #[test]
    fn rejects_bad_bounds() {
        let mut cfg = base();
        cfg.min_price = 300;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidPriceBounds { min: 300, max: 200 })
        ));

        let mut cfg = base();
        cfg.min_price = -5;
        assert!(matches!(cfg.validate(), Err(ConfigError::NegativePrice { .. })));

        let mut cfg = base();
        cfg.max_price = Price::MAX;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidPriceBounds { min: 0, max: Price::MAX })
        ));
    }

    #[test]
    fn rejects_trader_and_period_counts() {
        let mut cfg = base();
        cfg.num_traders = 3;
        assert!(matches!(cfg.validate(), Err(ConfigError::OddTraderCount(3))));

        cfg.num_traders = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::NoTraders)));

        let mut cfg = base();
        cfg.periods = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::ZeroPeriods)));

        let mut cfg = base();
        cfg.misc.num_commodities = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::ZeroCommodities)));
    }

    #[test]
    fn rejects_non_positive_timeout() {
        for bad in [0.0, -1.0, f64::NAN] {
            let mut cfg = base();
            cfg.misc.timeout = bad;
            assert!(matches!(
                cfg.validate(),
                Err(ConfigError::NonPositiveTimeout(_))
            ));
        }
        let mut cfg = base();
        cfg.misc.timeout = f64::INFINITY;
        assert_eq!(cfg.validate().unwrap().timeout, Duration::MAX);
    }

    #[test]
    fn rejects_bad_explicit_schedules() {
        let mut cfg = base();
        cfg.explicit.costs = vec![10, 20];
        cfg.explicit.redemption_values = vec![30];
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ScheduleLengthMismatch {
                costs: 2,
                redemptions: 1
            })
        ));

        cfg.explicit.redemption_values = vec![30, 250];
        match cfg.validate() {
            Err(ConfigError::ValueOutOfRange { field, value, .. }) => {
                assert_eq!(field, "redemption_values");
                assert_eq!(value, 250);
            }
            other => panic!("expected ValueOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            SimulationConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
