//! Game configuration with defaults matching the standard ruleset.

use crate::{EngineError, Prices, ResourcePool, CAPITAL_CAP, USAGE_CAP_RATIO};
use serde::{Deserialize, Serialize};

/// Probabilities, ranges and floors used by the event generator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventTuning {
    /// Chance a price shock fires in a round.
    pub price_shock_prob: f64,
    /// Inclusive bounds of the relative price change.
    pub price_change_range: (f64, f64),
    pub labor_price_floor: f64,
    pub land_price_floor: f64,
    /// Chance a single-sector efficiency shock fires.
    pub efficiency_shock_prob: f64,
    pub efficiency_multiplier_range: (f64, f64),
    /// Chance of the economy-wide subsidy.
    pub subsidy_prob: f64,
    pub subsidy_factor: f64,
}

impl Default for EventTuning {
    fn default() -> Self {
        Self {
            price_shock_prob: 0.6,
            price_change_range: (-0.25, 0.35),
            labor_price_floor: 30.0,
            land_price_floor: 60.0,
            efficiency_shock_prob: 0.4,
            efficiency_multiplier_range: (0.85, 1.25),
            subsidy_prob: 0.25,
            subsidy_factor: 1.15,
        }
    }
}

/// Top-level configuration for a game session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub initial_pool: ResourcePool,
    pub initial_prices: Prices,
    /// Share of each stock usable per round, in (0, 1].
    pub usage_cap_ratio: f64,
    pub capital_cap: f64,
    /// Seed for the deterministic event RNG.
    pub rng_seed: u64,
    pub events: EventTuning,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            initial_pool: ResourcePool::default(),
            initial_prices: Prices::default(),
            usage_cap_ratio: USAGE_CAP_RATIO,
            capital_cap: CAPITAL_CAP,
            rng_seed: 42,
            events: EventTuning::default(),
        }
    }
}

fn probability(name: &str, p: f64) -> Result<(), EngineError> {
    if !(0.0..=1.0).contains(&p) {
        return Err(EngineError::InvalidConfig(format!(
            "{name} must be within [0,1], got {p}"
        )));
    }
    Ok(())
}

fn range(name: &str, (lo, hi): (f64, f64)) -> Result<(), EngineError> {
    if !(lo.is_finite() && hi.is_finite()) || lo > hi {
        return Err(EngineError::InvalidConfig(format!(
            "{name} must be a finite ascending range, got ({lo}, {hi})"
        )));
    }
    Ok(())
}

fn positive(name: &str, v: f64) -> Result<(), EngineError> {
    if !v.is_finite() || v <= 0.0 {
        return Err(EngineError::InvalidConfig(format!("{name} must be > 0, got {v}")));
    }
    Ok(())
}

/// Validate a configuration before a session is built from it.
pub fn validate_config(cfg: &GameConfig) -> Result<(), EngineError> {
    let pool = &cfg.initial_pool;
    for (name, v) in [
        ("initial labor", pool.labor),
        ("initial capital", pool.capital),
        ("initial land", pool.land),
    ] {
        if !v.is_finite() || v < 0.0 {
            return Err(EngineError::InvalidConfig(format!("{name} must be >= 0, got {v}")));
        }
    }
    positive("capital cap", cfg.capital_cap)?;
    if pool.capital > cfg.capital_cap {
        return Err(EngineError::InvalidConfig(format!(
            "initial capital {} exceeds cap {}",
            pool.capital, cfg.capital_cap
        )));
    }
    if !(cfg.usage_cap_ratio > 0.0 && cfg.usage_cap_ratio <= 1.0) {
        return Err(EngineError::InvalidConfig(format!(
            "usage cap ratio must be within (0,1], got {}",
            cfg.usage_cap_ratio
        )));
    }

    let ev = &cfg.events;
    probability("price shock probability", ev.price_shock_prob)?;
    probability("efficiency shock probability", ev.efficiency_shock_prob)?;
    probability("subsidy probability", ev.subsidy_prob)?;
    range("price change range", ev.price_change_range)?;
    range("efficiency multiplier range", ev.efficiency_multiplier_range)?;
    if ev.price_change_range.0 <= -1.0 {
        return Err(EngineError::InvalidConfig(
            "price change range must stay above -100%".into(),
        ));
    }
    positive("efficiency multiplier lower bound", ev.efficiency_multiplier_range.0)?;
    positive("subsidy factor", ev.subsidy_factor)?;
    positive("labor price floor", ev.labor_price_floor)?;
    positive("land price floor", ev.land_price_floor)?;
    if cfg.initial_prices.labor < ev.labor_price_floor || cfg.initial_prices.land < ev.land_price_floor {
        return Err(EngineError::InvalidConfig(
            "initial prices must not start below their floors".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&GameConfig::default()), Ok(()));
    }

    #[test]
    fn rejects_bad_probability() {
        let mut cfg = GameConfig::default();
        cfg.events.subsidy_prob = 1.5;
        assert!(matches!(
            validate_config(&cfg),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_capital_above_cap() {
        let cfg = GameConfig {
            initial_pool: ResourcePool::new(10.0, 6000.0, 10.0),
            ..GameConfig::default()
        };
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: GameConfig = serde_json::from_str(r#"{"rng_seed": 7}"#).unwrap();
        assert_eq!(cfg.rng_seed, 7);
        assert_eq!(cfg.capital_cap, CAPITAL_CAP);
        assert_eq!(cfg.events, EventTuning::default());
    }
}
