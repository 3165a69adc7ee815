//! Target generation and the pool of currently available targets
//!
//! Targets are rolled from weighted per-tier templates. The pool is topped up
//! on refresh and rebuilt whenever the scale tier changes.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::collections::{BTreeMap, BTreeSet};

use crate::core::config::EngineConfig;
use crate::core::types::{IdAllocator, Resources, ScaleTier, TargetId};
use crate::expansion::target::{clamp_difficulty, Target};
use crate::expansion::templates::{TargetTemplate, TemplateCatalog};
use crate::host::PlayerState;

/// Security adjectives, weakest first. Indexed by bucketed difficulty.
pub const SECURITY_LEVELS: [&str; 6] = [
    "Unsecured",
    "Basic",
    "Protected",
    "Hardened",
    "Fortified",
    "Impenetrable",
];

/// Security adjective for a difficulty in `[1, 100]`
pub fn security_level(difficulty: u8) -> &'static str {
    let buckets = SECURITY_LEVELS.len();
    let idx = (difficulty.saturating_sub(1) as usize * buckets) / 100;
    SECURITY_LEVELS[idx.min(buckets - 1)]
}

/// Attempt cost: the tier's base cost scaled by `difficulty / 50`
pub fn scaled_cost(base: &Resources, difficulty: u8) -> Resources {
    base.scaled_rounded(difficulty as f64 / 50.0)
}

/// Formula: max(1, base_systems + floor(difficulty / 20))
pub fn systems_gained(base_systems: u32, difficulty: u8) -> u32 {
    (base_systems + difficulty as u32 / 20).max(1)
}

/// Targets added and evicted by one refresh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshOutcome {
    pub added: Vec<TargetId>,
    pub removed: Vec<TargetId>,
}

/// Owner of the available-target pool
#[derive(Debug, Clone)]
pub struct TargetCatalog {
    templates: TemplateCatalog,
    pool: BTreeMap<TargetId, Target>,
    /// Special templates already unlocked (non-repeatable ones unlock once)
    unlocked_specials: BTreeSet<String>,
    rng: ChaCha8Rng,
}

impl TargetCatalog {
    pub fn new(templates: TemplateCatalog, rng: ChaCha8Rng) -> Self {
        Self {
            templates,
            pool: BTreeMap::new(),
            unlocked_specials: BTreeSet::new(),
            rng,
        }
    }

    pub fn templates(&self) -> &TemplateCatalog {
        &self.templates
    }

    /// Roll one concrete target from a template
    pub fn roll_target(
        &mut self,
        template: &TargetTemplate,
        config: &EngineConfig,
        ids: &mut IdAllocator,
    ) -> Target {
        let (lo, hi) = template.difficulty;
        let difficulty = clamp_difficulty(self.rng.gen_range(lo.min(hi)..=hi.max(lo)) as i64);
        let rewards = template.roll_rewards(&mut self.rng);

        let prefix = pick_word(&template.prefixes, &mut self.rng);
        let suffix = pick_word(&template.suffixes, &mut self.rng);
        let name = format!("{} {} {}", security_level(difficulty), prefix, suffix);

        Target {
            id: ids.target_id(template.scale),
            name,
            category: template.category.clone(),
            template: template.id.clone(),
            difficulty,
            scale: template.scale,
            cost: scaled_cost(config.base_cost(template.scale), difficulty),
            rewards,
            systems_gained: systems_gained(template.base_systems, difficulty),
            unlocks: template.unlocks.clone(),
            requirements: template.requirements.clone(),
            success_bonus: template.success_bonus,
            success_penalty: template.success_penalty,
            progress_value: template.progress_value.max(1),
            failure_penalty: template.failure_penalty.clone(),
            retry_of: None,
        }
    }

    /// Pool size for a tier: base count plus jitter, never below the floor
    pub fn target_count(&mut self, tier: ScaleTier, config: &EngineConfig) -> usize {
        let (lo, hi) = config.count_jitter;
        let jitter = self.rng.gen_range(lo.min(hi)..=hi.max(lo));
        let count = config.base_count(tier) as i64 + jitter as i64;
        count.max(config.min_target_count as i64) as usize
    }

    /// Roll a fresh batch of targets for a tier without touching the pool
    pub fn generate_for_scale(
        &mut self,
        tier: ScaleTier,
        config: &EngineConfig,
        ids: &mut IdAllocator,
    ) -> Vec<Target> {
        let count = self.target_count(tier, config);
        (0..count)
            .filter_map(|_| self.roll_for_tier(tier, config, ids))
            .collect()
    }

    fn roll_for_tier(
        &mut self,
        tier: ScaleTier,
        config: &EngineConfig,
        ids: &mut IdAllocator,
    ) -> Option<Target> {
        let template = self.templates.pick(tier, &mut self.rng)?.clone();
        Some(self.roll_target(&template, config, ids))
    }

    /// Clear the pool and fill it for `tier`; returns the new ids
    pub fn populate(
        &mut self,
        tier: ScaleTier,
        config: &EngineConfig,
        ids: &mut IdAllocator,
    ) -> Vec<TargetId> {
        self.rebuild(tier, config, ids, &BTreeSet::new()).0
    }

    /// Replace every target not in `keep` with a fresh batch for `tier`
    ///
    /// Returns (added, removed).
    pub fn rebuild(
        &mut self,
        tier: ScaleTier,
        config: &EngineConfig,
        ids: &mut IdAllocator,
        keep: &BTreeSet<TargetId>,
    ) -> (Vec<TargetId>, Vec<TargetId>) {
        let removed: Vec<TargetId> = self
            .pool
            .keys()
            .filter(|id| !keep.contains(*id))
            .cloned()
            .collect();
        for id in &removed {
            self.pool.remove(id);
        }

        let targets = self.generate_for_scale(tier, config, ids);
        let added: Vec<TargetId> = targets.iter().map(|t| t.id.clone()).collect();
        for target in targets {
            self.insert(target);
        }
        (added, removed)
    }

    /// Evict idle targets at random, then top the pool back up
    ///
    /// Targets in `protected` (under infiltration or enrolled in a campaign)
    /// are never evicted.
    pub fn refresh(
        &mut self,
        tier: ScaleTier,
        config: &EngineConfig,
        ids: &mut IdAllocator,
        protected: &BTreeSet<TargetId>,
    ) -> RefreshOutcome {
        let mut outcome = RefreshOutcome::default();

        let candidates: Vec<TargetId> = self
            .pool
            .keys()
            .filter(|id| !protected.contains(*id))
            .cloned()
            .collect();
        // Out-of-range chances saturate instead of panicking in `gen_bool`
        let chance = config.refresh_eviction_chance;
        for id in candidates {
            if chance > 0.0 && (chance >= 1.0 || self.rng.gen_bool(chance)) {
                self.pool.remove(&id);
                outcome.removed.push(id);
            }
        }

        let wanted = self.target_count(tier, config);
        while self.pool.len() < wanted {
            match self.roll_for_tier(tier, config, ids) {
                Some(target) => {
                    outcome.added.push(target.id.clone());
                    self.insert(target);
                }
                None => break,
            }
        }

        outcome
    }

    /// Generate a target from a special template and add it to the pool
    ///
    /// Returns `None` for unknown templates and for one-shot specials that
    /// were already unlocked.
    pub fn unlock_special(
        &mut self,
        template_id: &str,
        config: &EngineConfig,
        ids: &mut IdAllocator,
    ) -> Option<Target> {
        let template = self.templates.special(template_id)?.clone();
        if !template.repeatable && self.unlocked_specials.contains(template_id) {
            return None;
        }
        self.unlocked_specials.insert(template_id.to_string());
        let target = self.roll_target(&template, config, ids);
        self.insert(target.clone());
        Some(target)
    }

    pub fn unlocked_specials(&self) -> &BTreeSet<String> {
        &self.unlocked_specials
    }

    pub fn restore_unlocked_specials(&mut self, specials: BTreeSet<String>) {
        self.unlocked_specials = specials;
    }

    /// Targets whose prerequisites are currently met, easiest first
    pub fn available(
        &self,
        player: &dyn PlayerState,
        controlled_systems: u64,
        tier: ScaleTier,
    ) -> Vec<Target> {
        let mut targets: Vec<Target> = self
            .pool
            .values()
            .filter(|t| t.unmet_requirement(player, controlled_systems, tier).is_none())
            .cloned()
            .collect();
        targets.sort_by(|a, b| a.difficulty.cmp(&b.difficulty).then_with(|| a.id.cmp(&b.id)));
        targets
    }

    pub fn insert(&mut self, target: Target) {
        debug_assert!(
            !self.pool.contains_key(&target.id),
            "target id {} issued twice",
            target.id
        );
        self.pool.insert(target.id.clone(), target);
    }

    pub fn remove(&mut self, id: &TargetId) -> Option<Target> {
        self.pool.remove(id)
    }

    pub fn get(&self, id: &TargetId) -> Option<&Target> {
        self.pool.get(id)
    }

    pub fn contains(&self, id: &TargetId) -> bool {
        self.pool.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn pool(&self) -> &BTreeMap<TargetId, Target> {
        &self.pool
    }

    pub fn clear(&mut self) {
        self.pool.clear();
    }
}

fn pick_word<'a>(words: &'a [String], rng: &mut ChaCha8Rng) -> &'a str {
    if words.is_empty() {
        return "";
    }
    &words[rng.gen_range(0..words.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ResourceKind;
    use crate::host::SandboxHost;
    use rand::SeedableRng;

    fn catalog() -> TargetCatalog {
        TargetCatalog::new(TemplateCatalog::with_defaults(), ChaCha8Rng::seed_from_u64(99))
    }

    #[test]
    fn test_security_level_buckets() {
        assert_eq!(security_level(1), "Unsecured");
        assert_eq!(security_level(16), "Unsecured");
        assert_eq!(security_level(18), "Basic");
        assert_eq!(security_level(50), "Protected");
        assert_eq!(security_level(100), "Impenetrable");
    }

    #[test]
    fn test_cost_and_systems_formulas() {
        let base = Resources::new().with(ResourceKind::Data, 50.0);
        assert!((scaled_cost(&base, 50).get(ResourceKind::Data) - 50.0).abs() < 0.001);
        assert!((scaled_cost(&base, 10).get(ResourceKind::Data) - 10.0).abs() < 0.001);

        assert_eq!(systems_gained(0, 10), 1);
        assert_eq!(systems_gained(0, 45), 2);
        assert_eq!(systems_gained(2, 100), 7);
    }

    #[test]
    fn test_generate_for_scale_respects_templates() {
        let mut catalog = catalog();
        let config = EngineConfig::default();
        let mut ids = IdAllocator::new();

        let targets = catalog.generate_for_scale(ScaleTier::Corporate, &config, &mut ids);
        assert!(targets.len() >= config.min_target_count);
        for t in &targets {
            assert_eq!(t.scale, ScaleTier::Corporate);
            let template = catalog.templates().get(&t.template).unwrap();
            assert!(t.difficulty >= template.difficulty.0 && t.difficulty <= template.difficulty.1);
            assert!(t.id.as_str().starts_with("corporate-"));
            assert!(t.name.starts_with(security_level(t.difficulty)));
        }
    }

    #[test]
    fn test_populate_replaces_pool() {
        let mut catalog = catalog();
        let config = EngineConfig::default();
        let mut ids = IdAllocator::new();

        catalog.populate(ScaleTier::Local, &config, &mut ids);
        let before: Vec<TargetId> = catalog.pool().keys().cloned().collect();
        catalog.populate(ScaleTier::Government, &config, &mut ids);

        assert!(catalog.pool().values().all(|t| t.scale == ScaleTier::Government));
        assert!(before.iter().all(|id| !catalog.contains(id)));
    }

    #[test]
    fn test_refresh_keeps_protected_targets() {
        let mut catalog = catalog();
        let config = EngineConfig {
            refresh_eviction_chance: 1.0,
            ..EngineConfig::default()
        };
        let mut ids = IdAllocator::new();
        catalog.populate(ScaleTier::Local, &config, &mut ids);

        let keep = catalog.pool().keys().next().cloned().unwrap();
        let protected: BTreeSet<TargetId> = [keep.clone()].into_iter().collect();
        let outcome = catalog.refresh(ScaleTier::Local, &config, &mut ids, &protected);

        assert!(catalog.contains(&keep));
        assert!(!outcome.removed.contains(&keep));
        assert!(catalog.len() >= config.min_target_count);
        for id in &outcome.removed {
            assert!(!catalog.contains(id));
        }
    }

    #[test]
    fn test_unlock_special_once() {
        let mut catalog = catalog();
        let config = EngineConfig::default();
        let mut ids = IdAllocator::new();

        let lab = catalog.unlock_special("quantum_lab", &config, &mut ids).unwrap();
        assert!(catalog.contains(&lab.id));
        assert_eq!(lab.progress_value, 3);
        assert!(catalog.unlock_special("quantum_lab", &config, &mut ids).is_none());
        assert!(catalog.unlock_special("no_such_template", &config, &mut ids).is_none());

        // Repeatable specials can be unlocked again
        assert!(catalog.unlock_special("darknet_market", &config, &mut ids).is_some());
        assert!(catalog.unlock_special("darknet_market", &config, &mut ids).is_some());
    }

    #[test]
    fn test_available_sorted_and_filtered() {
        let mut catalog = catalog();
        let config = EngineConfig::default();
        let mut ids = IdAllocator::new();
        catalog.populate(ScaleTier::Local, &config, &mut ids);

        let template = catalog.templates().get("home_router").unwrap().clone();
        let mut gated = catalog.roll_target(&template, &config, &mut ids);
        gated.requirements.upgrade = Some("exploit_kit".into());
        let gated_id = gated.id.clone();
        catalog.insert(gated);

        let mut host = SandboxHost::new();
        let available = catalog.available(&host, 0, ScaleTier::Local);
        assert!(available.windows(2).all(|w| w[0].difficulty <= w[1].difficulty));
        assert!(available.iter().all(|t| t.id != gated_id));

        // Never permanently hidden - shows up once the upgrade exists
        host.grant_upgrade("exploit_kit");
        let available = catalog.available(&host, 0, ScaleTier::Local);
        assert!(available.iter().any(|t| t.id == gated_id));
    }
}
