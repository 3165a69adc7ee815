//! Success model - chance and duration of an infiltration attempt
//!
//! Pure functions. The result is frozen into the infiltration when it starts.

use crate::core::config::EngineConfig;
use crate::core::types::Millis;
use crate::expansion::target::Target;

/// Player-side inputs to an attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttemptInputs {
    pub processing_power: f64,
    pub heat: f64,
    /// Combined multiplier from the modifier registry
    pub modifier_multiplier: f64,
}

/// Frozen parameters of one attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttemptParams {
    pub success_chance: f64,
    pub duration_ms: Millis,
}

/// Base chance before per-target adjustments and clamping
///
/// Formula: (0.8 + 0.1 * log10(power + 1) - 0.6 * d/100 - 0.3 * heat/100) * modifier
/// - Decreasing in difficulty and heat, increasing in power
/// - Difficulty 10, no power, no heat => 0.74
/// - Difficulty 100, no power, no heat => 0.2
pub fn calculate_success_chance(
    power: f64,
    difficulty: u8,
    heat: f64,
    modifier_multiplier: f64,
) -> f64 {
    let power_bonus = (power.max(0.0) + 1.0).log10() * 0.1;
    let difficulty_penalty = difficulty as f64 / 100.0 * 0.6;
    let heat_penalty = heat.clamp(0.0, 100.0) / 100.0 * 0.3;
    (0.8 + power_bonus - difficulty_penalty - heat_penalty) * modifier_multiplier.max(0.0)
}

/// Attempt duration: processing power compresses it logarithmically
///
/// Formula: max(floor, difficulty * per_point / (1 + log2(power + 1) * factor))
pub fn attempt_duration(difficulty: u8, power: f64, config: &EngineConfig) -> Millis {
    let compression = 1.0 + (power.max(0.0) + 1.0).log2() * config.power_duration_factor;
    let raw = difficulty as f64 * config.duration_per_difficulty_ms as f64 / compression;
    (raw.round() as Millis).max(config.min_duration_ms)
}

/// Compute the frozen chance and duration for an attempt against `target`
pub fn compute_attempt(
    target: &Target,
    inputs: AttemptInputs,
    config: &EngineConfig,
) -> AttemptParams {
    let mut chance = calculate_success_chance(
        inputs.processing_power,
        target.difficulty,
        inputs.heat,
        inputs.modifier_multiplier,
    );
    if target.success_bonus != 0.0 {
        chance *= 1.0 + target.success_bonus;
    }
    if target.success_penalty != 0.0 {
        chance *= 1.0 - target.success_penalty;
    }

    AttemptParams {
        success_chance: chance.clamp(config.min_success_chance, config.max_success_chance),
        duration_ms: attempt_duration(target.difficulty, inputs.processing_power, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Resources, ScaleTier, TargetId};
    use crate::expansion::target::Requirements;

    fn target(difficulty: u8) -> Target {
        Target {
            id: TargetId::from("local-000001"),
            name: "Test".into(),
            category: "router".into(),
            template: "test".into(),
            difficulty,
            scale: ScaleTier::Local,
            cost: Resources::new(),
            rewards: Resources::new(),
            systems_gained: 1,
            unlocks: vec![],
            requirements: Requirements::default(),
            success_bonus: 0.0,
            success_penalty: 0.0,
            progress_value: 1,
            failure_penalty: None,
            retry_of: None,
        }
    }

    fn neutral() -> AttemptInputs {
        AttemptInputs {
            processing_power: 0.0,
            heat: 0.0,
            modifier_multiplier: 1.0,
        }
    }

    #[test]
    fn test_base_chance_monotonicity() {
        let easy = calculate_success_chance(0.0, 10, 0.0, 1.0);
        let hard = calculate_success_chance(0.0, 80, 0.0, 1.0);
        let hot = calculate_success_chance(0.0, 10, 90.0, 1.0);
        let powered = calculate_success_chance(1000.0, 10, 0.0, 1.0);

        assert!((easy - 0.74).abs() < 1e-9);
        assert!(hard < easy);
        assert!(hot < easy);
        assert!(powered > easy);
    }

    #[test]
    fn test_chance_is_clamped() {
        let config = EngineConfig::default();

        let mut boosted = neutral();
        boosted.modifier_multiplier = 10.0;
        let p = compute_attempt(&target(1), boosted, &config);
        assert!((p.success_chance - 0.95).abs() < 1e-9);

        let mut crushed = neutral();
        crushed.modifier_multiplier = 0.0;
        let p = compute_attempt(&target(100), crushed, &config);
        assert!((p.success_chance - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_bonus_and_penalty_apply() {
        let config = EngineConfig::default();
        let base = compute_attempt(&target(50), neutral(), &config).success_chance;

        let mut bonus = target(50);
        bonus.success_bonus = 0.1;
        let with_bonus = compute_attempt(&bonus, neutral(), &config).success_chance;
        assert!((with_bonus - base * 1.1).abs() < 1e-9);

        let mut penalty = target(50);
        penalty.success_penalty = 0.2;
        let with_penalty = compute_attempt(&penalty, neutral(), &config).success_chance;
        assert!((with_penalty - base * 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_duration_formula() {
        let config = EngineConfig::default();
        // No power: difficulty * 30s
        assert_eq!(attempt_duration(10, 0.0, &config), 300_000);
        // power 1023 => log2(1024) = 10 => divisor 2
        assert_eq!(attempt_duration(10, 1023.0, &config), 150_000);
    }

    #[test]
    fn test_duration_floor() {
        let config = EngineConfig {
            duration_per_difficulty_ms: 100,
            ..EngineConfig::default()
        };
        assert_eq!(attempt_duration(1, 1e12, &config), 5_000);
    }
}
