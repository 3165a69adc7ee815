//! Property-based tests using proptest
//!
//! Invariants that must hold for all inputs:
//! - Generation: any seed, any tier -> difficulties within [1, 100]
//! - Success model: chance always inside the clamp, duration never below the floor
//! - Retries: difficulty raised by the delta and capped at 100
//! - Refunds: cancel refund rate within [0.5, 1]

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use net_reach::core::types::{IdAllocator, ScaleTier, TargetId};
use net_reach::expansion::generator::TargetCatalog;
use net_reach::expansion::infiltration::refund_rate;
use net_reach::expansion::success::{attempt_duration, compute_attempt, AttemptInputs};
use net_reach::expansion::target::clamp_difficulty;
use net_reach::expansion::{Target, TemplateCatalog};
use net_reach::{EngineConfig, ExpansionEngine, SandboxHost};

fn tier_strategy() -> impl Strategy<Value = ScaleTier> {
    prop::sample::select(ScaleTier::ALL.to_vec())
}

/// Any concrete target, re-tuned by the test
fn sample_target(seed: u64) -> Target {
    let config = EngineConfig::default();
    let mut catalog =
        TargetCatalog::new(TemplateCatalog::with_defaults(), ChaCha8Rng::seed_from_u64(seed));
    let mut ids = IdAllocator::new();
    catalog
        .generate_for_scale(ScaleTier::Local, &config, &mut ids)
        .into_iter()
        .next()
        .unwrap()
}

// ============================================================
// Generation Properties
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_generated_targets_are_in_bounds(seed in any::<u64>(), tier in tier_strategy()) {
        let config = EngineConfig::default();
        let rng = ChaCha8Rng::seed_from_u64(seed);
        let mut catalog = TargetCatalog::new(TemplateCatalog::with_defaults(), rng);
        let mut ids = IdAllocator::new();

        let targets = catalog.generate_for_scale(tier, &config, &mut ids);
        prop_assert!(targets.len() >= config.min_target_count);
        for target in &targets {
            prop_assert!(
                (1..=100).contains(&target.difficulty),
                "difficulty {}",
                target.difficulty
            );
            prop_assert_eq!(target.scale, tier);
            prop_assert!(target.systems_gained >= 1);
            prop_assert!(target.cost.iter().all(|(_, amount)| amount >= 0.0));
        }
    }

    #[test]
    fn prop_generation_is_deterministic(seed in any::<u64>()) {
        let config = EngineConfig { seed, ..EngineConfig::default() };
        let host = SandboxHost::new();
        let a = ExpansionEngine::new(config.clone()).available_targets(&host);
        let b = ExpansionEngine::new(config).available_targets(&host);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_clamp_difficulty(value in any::<i64>()) {
        let d = clamp_difficulty(value);
        prop_assert!((1..=100).contains(&d));
    }
}

// ============================================================
// Success Model Properties
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn prop_chance_always_clamped(
        seed in 0u64..32,
        difficulty in 1u8..=100,
        processing_power in 0.0f64..1e9,
        heat in -50.0f64..200.0,
        modifier_multiplier in 0.0f64..20.0,
        success_bonus in -1.0f64..2.0,
        success_penalty in 0.0f64..1.0,
    ) {
        let config = EngineConfig::default();
        let target = Target {
            difficulty,
            success_bonus,
            success_penalty,
            ..sample_target(seed)
        };
        let params = compute_attempt(
            &target,
            AttemptInputs { processing_power, heat, modifier_multiplier },
            &config,
        );
        prop_assert!(params.success_chance >= config.min_success_chance);
        prop_assert!(params.success_chance <= config.max_success_chance);
    }

    #[test]
    fn prop_duration_floor_and_power_compression(
        difficulty in 1u8..=100,
        power in 0.0f64..1e6,
        extra in 0.0f64..1e6,
    ) {
        let config = EngineConfig::default();
        let slow = attempt_duration(difficulty, power, &config);
        let fast = attempt_duration(difficulty, power + extra, &config);
        prop_assert!(slow >= config.min_duration_ms);
        prop_assert!(fast >= config.min_duration_ms);
        prop_assert!(fast <= slow);
    }

    #[test]
    fn prop_refund_rate_bounds(progress in 0.0f64..=1.0) {
        let rate = refund_rate(progress, EngineConfig::default().cancel_refund_slope);
        prop_assert!((0.5..=1.0).contains(&rate));
    }

    #[test]
    fn prop_retry_raises_difficulty(seed in 0u64..32, difficulty in 1u8..=100) {
        let original = Target { difficulty, ..sample_target(seed) };
        let retry = original.retry(TargetId::from("local-999999"), 5);
        prop_assert_eq!(retry.difficulty, (difficulty + 5).min(100));
        prop_assert_eq!(retry.retry_of, Some(original.id.clone()));
        prop_assert_ne!(retry.id, original.id);
    }
}
