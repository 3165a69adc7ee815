//! Engine configuration with documented constants
//!
//! Every tuning value used by the expansion engine is collected here.
//! The numbers are illustrative pacing values, not balance targets.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::{ExpansionError, Result};
use crate::core::types::{Millis, ResourceKind, Resources, ScaleTier};

/// Configuration for the expansion engine
///
/// Per-tier tables are indexed by `ScaleTier::index()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed for target generation and the default outcome roller
    pub seed: u64,

    // === TARGET POOL ===
    /// How often part of the target pool is regenerated
    pub refresh_interval_ms: Millis,

    /// Independent chance that each idle target is evicted on refresh
    pub refresh_eviction_chance: f64,

    /// Inclusive jitter applied to a tier's base target count
    pub count_jitter: (i32, i32),

    /// The pool is never topped up to fewer than this many targets
    pub min_target_count: usize,

    /// Base pool size per tier before jitter
    pub tier_base_counts: [usize; 6],

    /// Cost to attempt a difficulty-50 target, per tier. Scaled by `difficulty / 50`.
    pub tier_base_costs: [Resources; 6],

    // === SUCCESS MODEL ===
    /// Lower clamp on success chance; an attempt is never hopeless
    pub min_success_chance: f64,

    /// Upper clamp on success chance; an attempt is never certain
    pub max_success_chance: f64,

    /// No attempt is ever shorter than this
    pub min_duration_ms: Millis,

    /// Duration per difficulty point before processing-power compression
    pub duration_per_difficulty_ms: Millis,

    /// Weight of `log2(power + 1)` in the duration divisor
    pub power_duration_factor: f64,

    // === INFILTRATION ===
    /// Heat charged at start: `difficulty * factor * tier multiplier`
    pub start_heat_factor: f64,

    /// Heat charged on success: `difficulty * factor`
    pub success_heat_factor: f64,

    /// Heat charged on failure: `difficulty * factor`
    pub failure_heat_factor: f64,

    /// Heat multiplier for attempts at each tier
    pub tier_heat_multipliers: [f64; 6],

    /// Refund on cancel is `1 - progress * slope`
    pub cancel_refund_slope: f64,

    /// Delay before a failed target reappears as a retry
    pub failure_cooldown_ms: Millis,

    /// Difficulty added to a retry target (capped at 100)
    pub retry_difficulty_delta: u8,

    // === PROGRESSION ===
    /// Completions required to leave each tier
    pub tier_required: [u32; 6],

    // === CAMPAIGNS ===
    /// Campaign duration before the per-type multiplier
    pub campaign_base_duration_ms: Millis,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,

            refresh_interval_ms: 60_000,
            refresh_eviction_chance: 0.3,
            count_jitter: (-2, 3),
            min_target_count: 2,
            tier_base_counts: [6, 6, 5, 5, 4, 4],
            tier_base_costs: default_tier_costs(),

            min_success_chance: 0.05,
            max_success_chance: 0.95,
            min_duration_ms: 5_000,
            duration_per_difficulty_ms: 30_000,
            power_duration_factor: 0.1,

            start_heat_factor: 0.1,
            success_heat_factor: 0.2,
            failure_heat_factor: 0.5,
            tier_heat_multipliers: [1.0, 1.5, 2.0, 3.0, 4.0, 5.0],
            cancel_refund_slope: 0.5,
            failure_cooldown_ms: 5 * 60 * 1000,
            retry_difficulty_delta: 5,

            tier_required: [5, 10, 15, 20, 25, 50],

            campaign_base_duration_ms: 120_000,
        }
    }
}

fn default_tier_costs() -> [Resources; 6] {
    use ResourceKind::*;
    [
        Resources::new().with(Data, 50.0),
        Resources::new().with(Data, 250.0).with(Bandwidth, 20.0),
        Resources::new().with(Data, 1_000.0).with(Bandwidth, 100.0).with(Crypto, 10.0),
        Resources::new().with(Data, 5_000.0).with(Bandwidth, 500.0).with(Crypto, 50.0),
        Resources::new().with(Data, 25_000.0).with(Crypto, 250.0).with(Energy, 100.0),
        Resources::new().with(Data, 100_000.0).with(Energy, 1_000.0).with(Matter, 10.0),
    ]
}

impl EngineConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document; missing fields keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| ExpansionError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn base_count(&self, tier: ScaleTier) -> usize {
        self.tier_base_counts[tier.index()]
    }

    pub fn base_cost(&self, tier: ScaleTier) -> &Resources {
        &self.tier_base_costs[tier.index()]
    }

    pub fn heat_multiplier(&self, tier: ScaleTier) -> f64 {
        self.tier_heat_multipliers[tier.index()]
    }

    pub fn required(&self, tier: ScaleTier) -> u32 {
        self.tier_required[tier.index()]
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if !(0.0 < self.min_success_chance
            && self.min_success_chance <= self.max_success_chance
            && self.max_success_chance < 1.0)
        {
            return Err(ExpansionError::Config(format!(
                "success chance bounds must satisfy 0 < min ({}) <= max ({}) < 1",
                self.min_success_chance, self.max_success_chance
            )));
        }

        if !(0.0..=1.0).contains(&self.refresh_eviction_chance) {
            return Err(ExpansionError::Config(format!(
                "refresh_eviction_chance ({}) must be within [0, 1]",
                self.refresh_eviction_chance
            )));
        }

        if self.count_jitter.0 > self.count_jitter.1 {
            return Err(ExpansionError::Config(format!(
                "count_jitter lower bound ({}) exceeds upper bound ({})",
                self.count_jitter.0, self.count_jitter.1
            )));
        }

        if self.refresh_interval_ms == 0 || self.campaign_base_duration_ms == 0 {
            return Err(ExpansionError::Config(
                "refresh and campaign intervals must be non-zero".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.cancel_refund_slope) {
            return Err(ExpansionError::Config(format!(
                "cancel_refund_slope ({}) must be within [0, 1]",
                self.cancel_refund_slope
            )));
        }

        if self.tier_required.iter().any(|r| *r == 0) {
            return Err(ExpansionError::Config(
                "every tier must require at least one completion".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            seed = 42
            failure_cooldown_ms = 1000
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.failure_cooldown_ms, 1000);
        assert_eq!(config.refresh_interval_ms, 60_000);
        assert_eq!(config.required(ScaleTier::Local), 5);
    }

    #[test]
    fn test_invalid_chance_bounds_rejected() {
        let result = EngineConfig::from_toml_str(
            r#"
            min_success_chance = 0.9
            max_success_chance = 0.5
            "#,
        );
        assert!(matches!(result, Err(ExpansionError::Config(_))));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let result = EngineConfig::from_toml_str("seed = \"not a number\"");
        assert!(matches!(result, Err(ExpansionError::Config(_))));
    }

    #[test]
    fn test_tier_tables() {
        let config = EngineConfig::default();
        assert!((config.heat_multiplier(ScaleTier::Local) - 1.0).abs() < 0.001);
        assert!(
            config.heat_multiplier(ScaleTier::Cosmic) > config.heat_multiplier(ScaleTier::Space)
        );
        assert!(config.base_cost(ScaleTier::Corporate).get(ResourceKind::Data) > 0.0);
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let mut config =
            EngineConfig::from_toml_str(include_str!("../../data/engine.toml")).unwrap();
        assert_eq!(config.seed, 24301);
        config.seed = EngineConfig::default().seed;
        assert_eq!(config, EngineConfig::default());
    }
}
