//! Target templates - the per-tier blueprints targets are rolled from
//!
//! Templates declare difficulty and reward ranges plus naming vocabulary.
//! Built-in templates cover every tier; packs can be loaded from TOML.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::error::{ExpansionError, Result};
use crate::core::types::{ResourceKind, Resources, ScaleTier};
use crate::expansion::target::{Debuff, Effect, FailurePenalty, Requirements};

/// A reward amount: fixed, or an inclusive range resolved at generation time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RewardSpec {
    Fixed(f64),
    Range { min: f64, max: f64 },
}

impl RewardSpec {
    pub fn roll<R: Rng>(&self, rng: &mut R) -> f64 {
        match *self {
            RewardSpec::Fixed(v) => v,
            RewardSpec::Range { min, max } if max > min => rng.gen_range(min..=max).round(),
            RewardSpec::Range { min, .. } => min,
        }
    }
}

/// Blueprint for generating targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetTemplate {
    pub id: String,
    pub scale: ScaleTier,
    pub category: String,
    /// Relative selection weight within the tier
    #[serde(default = "default_weight")]
    pub weight: u32,
    /// Inclusive difficulty range
    pub difficulty: (u8, u8),
    #[serde(default)]
    pub rewards: BTreeMap<ResourceKind, RewardSpec>,
    /// Systems granted before the difficulty bonus
    #[serde(default)]
    pub base_systems: u32,
    pub prefixes: Vec<String>,
    pub suffixes: Vec<String>,
    #[serde(default)]
    pub unlocks: Vec<Effect>,
    #[serde(default)]
    pub requirements: Requirements,
    #[serde(default)]
    pub success_bonus: f64,
    #[serde(default)]
    pub success_penalty: f64,
    #[serde(default = "default_progress_value")]
    pub progress_value: u32,
    #[serde(default)]
    pub failure_penalty: Option<FailurePenalty>,
    /// Special templates only: may be unlocked more than once
    #[serde(default)]
    pub repeatable: bool,
}

fn default_weight() -> u32 {
    1
}

fn default_progress_value() -> u32 {
    1
}

impl TargetTemplate {
    /// Bare template: weight 1, difficulty 1, no rewards or names yet
    fn new(scale: ScaleTier, id: &str, category: &str) -> Self {
        Self {
            id: id.into(),
            scale,
            category: category.into(),
            weight: 1,
            difficulty: (1, 1),
            rewards: BTreeMap::new(),
            base_systems: 0,
            prefixes: Vec::new(),
            suffixes: Vec::new(),
            unlocks: Vec::new(),
            requirements: Requirements::default(),
            success_bonus: 0.0,
            success_penalty: 0.0,
            progress_value: 1,
            failure_penalty: None,
            repeatable: false,
        }
    }

    fn weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    fn difficulty(mut self, lo: u8, hi: u8) -> Self {
        self.difficulty = (lo, hi);
        self
    }

    fn systems(mut self, base_systems: u32) -> Self {
        self.base_systems = base_systems;
        self
    }

    fn names(mut self, prefixes: &[&str], suffixes: &[&str]) -> Self {
        self.prefixes = prefixes.iter().map(|s| s.to_string()).collect();
        self.suffixes = suffixes.iter().map(|s| s.to_string()).collect();
        self
    }

    fn progress(mut self, value: u32) -> Self {
        self.progress_value = value;
        self
    }

    fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    fn reward(mut self, kind: ResourceKind, spec: RewardSpec) -> Self {
        self.rewards.insert(kind, spec);
        self
    }

    fn unlock(mut self, effect: Effect) -> Self {
        self.unlocks.push(effect);
        self
    }

    fn bonus(mut self, bonus: f64) -> Self {
        self.success_bonus = bonus;
        self
    }

    fn penalty(mut self, penalty: f64) -> Self {
        self.success_penalty = penalty;
        self
    }

    fn on_failure(mut self, penalty: FailurePenalty) -> Self {
        self.failure_penalty = Some(penalty);
        self
    }

    fn requires(mut self, requirements: Requirements) -> Self {
        self.requirements = requirements;
        self
    }

    /// Resolve every reward range
    pub fn roll_rewards<R: Rng>(&self, rng: &mut R) -> Resources {
        self.rewards
            .iter()
            .map(|(kind, spec)| (*kind, spec.roll(rng)))
            .collect()
    }

    fn validate(&self) -> std::result::Result<(), String> {
        let (lo, hi) = self.difficulty;
        if lo == 0 || hi > 100 || lo > hi {
            return Err(format!(
                "template '{}': difficulty range ({}, {}) must lie within [1, 100]",
                self.id, lo, hi
            ));
        }
        if self.prefixes.is_empty() || self.suffixes.is_empty() {
            return Err(format!("template '{}': needs name prefixes and suffixes", self.id));
        }
        if let Some((kind, _)) = self.rewards.iter().find(|(_, spec)| {
            matches!(spec, RewardSpec::Range { min, max } if min > max)
        }) {
            return Err(format!("template '{}': inverted reward range for {:?}", self.id, kind));
        }
        Ok(())
    }
}

/// Catalog of regular and special templates
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateCatalog {
    #[serde(default)]
    templates: Vec<TargetTemplate>,
    #[serde(default)]
    specials: Vec<TargetTemplate>,
}

impl TemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, template: TargetTemplate) {
        self.templates.push(template);
    }

    pub fn add_special(&mut self, template: TargetTemplate) {
        self.specials.push(template);
    }

    /// Regular templates for a tier
    pub fn for_tier(&self, tier: ScaleTier) -> impl Iterator<Item = &TargetTemplate> {
        self.templates.iter().filter(move |t| t.scale == tier)
    }

    pub fn special(&self, id: &str) -> Option<&TargetTemplate> {
        self.specials.iter().find(|t| t.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&TargetTemplate> {
        self.templates.iter().find(|t| t.id == id).or_else(|| self.special(id))
    }

    /// Weighted pick among a tier's templates
    pub fn pick<R: Rng>(&self, tier: ScaleTier, rng: &mut R) -> Option<&TargetTemplate> {
        let total: u32 = self.for_tier(tier).map(|t| t.weight).sum();
        if total == 0 {
            return None;
        }
        let mut roll = rng.gen_range(0..total);
        for template in self.for_tier(tier) {
            if roll < template.weight {
                return Some(template);
            }
            roll -= template.weight;
        }
        None
    }

    /// Parse a template pack from TOML (`[[templates]]` and `[[specials]]` tables)
    pub fn parse_toml(content: &str) -> Result<Self> {
        let catalog: TemplateCatalog =
            toml::from_str(content).map_err(|e| ExpansionError::Config(e.to_string()))?;
        for template in catalog.templates.iter().chain(catalog.specials.iter()) {
            template.validate().map_err(ExpansionError::Config)?;
        }
        Ok(catalog)
    }

    /// Built-in templates for every tier
    pub fn with_defaults() -> Self {
        use ResourceKind::*;
        use RewardSpec::{Fixed, Range};
        use ScaleTier::*;

        let range = |min: f64, max: f64| Range { min, max };
        let mut catalog = Self::new();

        // Local
        catalog.add(
            TargetTemplate::new(Local, "home_router", "router")
                .weight(5)
                .difficulty(1, 25)
                .names(&["Home", "Residential", "Family"], &["Router", "Gateway", "Modem"])
                .reward(Data, range(10.0, 30.0))
                .reward(Bandwidth, Fixed(2.0)),
        );
        catalog.add(
            TargetTemplate::new(Local, "smart_device", "iot")
                .weight(4)
                .difficulty(5, 35)
                .names(
                    &["Smart", "Connected", "Wireless"],
                    &["Thermostat", "Camera", "Fridge", "Speaker"],
                )
                .reward(Data, range(15.0, 40.0))
                .reward(ProcessingPower, Fixed(1.0))
                .bonus(0.1),
        );
        catalog.add(
            TargetTemplate::new(Local, "cafe_network", "network")
                .weight(2)
                .difficulty(20, 45)
                .systems(1)
                .names(&["Coffee Shop", "Library", "Hotel"], &["Wi-Fi", "Hotspot", "LAN"])
                .reward(Data, range(40.0, 80.0))
                .reward(Bandwidth, range(5.0, 10.0)),
        );

        // Corporate
        catalog.add(
            TargetTemplate::new(Corporate, "office_server", "server")
                .weight(5)
                .difficulty(25, 55)
                .systems(1)
                .names(
                    &["Regional", "Branch", "Back-Office"],
                    &["File Server", "Mail Server", "Intranet"],
                )
                .reward(Data, range(150.0, 300.0))
                .reward(ProcessingPower, range(2.0, 5.0)),
        );
        catalog.add(
            TargetTemplate::new(Corporate, "data_center", "datacenter")
                .weight(3)
                .difficulty(40, 70)
                .systems(2)
                .names(&["Colocation", "Enterprise", "Cloud"], &["Data Center", "Server Farm"])
                .reward(Data, range(300.0, 600.0))
                .reward(ProcessingPower, range(5.0, 10.0))
                .penalty(0.1)
                .on_failure(FailurePenalty {
                    resource_loss: Resources::new().with(Data, 100.0),
                    heat: 2.0,
                    debuff: None,
                }),
        );
        catalog.add(
            TargetTemplate::new(Corporate, "trading_desk", "finance")
                .weight(2)
                .difficulty(45, 75)
                .systems(1)
                .names(
                    &["Hedge Fund", "Brokerage", "Exchange"],
                    &["Trading Desk", "Ledger", "Clearing System"],
                )
                .reward(Data, range(200.0, 400.0))
                .reward(Crypto, range(1.0, 5.0))
                .unlock(Effect::UnlockTargets {
                    template: "darknet_market".into(),
                    count: 1,
                }),
        );

        // Government
        catalog.add(
            TargetTemplate::new(Government, "municipal_grid", "infrastructure")
                .weight(4)
                .difficulty(40, 70)
                .systems(2)
                .names(
                    &["Municipal", "County", "Civic"],
                    &["Power Grid", "Water Control", "Traffic System"],
                )
                .reward(Data, range(800.0, 1500.0))
                .reward(Bandwidth, range(50.0, 120.0)),
        );
        catalog.add(
            TargetTemplate::new(Government, "intelligence_archive", "intelligence")
                .weight(2)
                .difficulty(60, 90)
                .systems(3)
                .names(
                    &["Federal", "Classified", "Black-Site"],
                    &["Archive", "Registry", "Signals Vault"],
                )
                .reward(Data, range(2000.0, 4000.0))
                .reward(Crypto, range(20.0, 40.0))
                .penalty(0.15)
                .on_failure(FailurePenalty {
                    resource_loss: Resources::new(),
                    heat: 10.0,
                    debuff: Some(Debuff {
                        multiplier: 0.8,
                        duration_ms: 120_000,
                    }),
                }),
        );
        catalog.add(
            TargetTemplate::new(Government, "election_board", "civic")
                .difficulty(55, 80)
                .systems(2)
                .names(&["State", "National", "Provincial"], &["Election Board", "Census Bureau"])
                .reward(Data, range(1500.0, 2500.0))
                .requires(Requirements {
                    morality: Some((-100.0, 20.0)),
                    ..Requirements::default()
                }),
        );

        // Global
        catalog.add(
            TargetTemplate::new(Global, "undersea_cable", "backbone")
                .weight(4)
                .difficulty(55, 80)
                .systems(3)
                .names(
                    &["Transatlantic", "Pacific", "Arctic"],
                    &["Cable Landing", "Backbone Trunk"],
                )
                .reward(Bandwidth, range(400.0, 800.0))
                .reward(Data, range(4000.0, 8000.0)),
        );
        catalog.add(
            TargetTemplate::new(Global, "central_bank", "finance")
                .weight(2)
                .difficulty(70, 95)
                .systems(3)
                .names(&["Reserve", "Sovereign", "Settlement"], &["Central Bank", "Clearing House"])
                .reward(Crypto, range(100.0, 250.0))
                .unlock(Effect::UnlockTargets {
                    template: "quantum_lab".into(),
                    count: 1,
                }),
        );

        // Space
        catalog.add(
            TargetTemplate::new(Space, "satellite_array", "satellite")
                .weight(4)
                .difficulty(60, 85)
                .systems(4)
                .names(
                    &["Geostationary", "Low-Orbit", "Polar"],
                    &["Satellite Array", "Relay Constellation"],
                )
                .reward(Energy, range(50.0, 150.0))
                .reward(Bandwidth, range(800.0, 1500.0)),
        );
        catalog.add(
            TargetTemplate::new(Space, "lunar_station", "station")
                .weight(2)
                .difficulty(75, 100)
                .systems(5)
                .names(&["Lunar", "Lagrange", "Martian"], &["Research Station", "Mining Outpost"])
                .reward(Energy, range(150.0, 300.0))
                .reward(Matter, range(1.0, 3.0))
                .unlock(Effect::UnlockTargets {
                    template: "ai_core".into(),
                    count: 1,
                }),
        );

        // Cosmic
        catalog.add(
            TargetTemplate::new(Cosmic, "stellar_beacon", "stellar")
                .weight(3)
                .difficulty(75, 100)
                .systems(6)
                .names(&["Pulsar", "Quasar", "Nebular"], &["Beacon", "Lattice", "Array"])
                .reward(Energy, range(1000.0, 3000.0))
                .reward(Matter, range(5.0, 20.0)),
        );
        catalog.add(
            TargetTemplate::new(Cosmic, "dyson_swarm", "megastructure")
                .difficulty(90, 100)
                .systems(8)
                .names(&["Partial", "Ancient", "Derelict"], &["Dyson Swarm", "Ringworld Node"])
                .reward(Matter, range(20.0, 50.0)),
        );

        // Specials
        catalog.add_special(
            TargetTemplate::new(Corporate, "darknet_market", "market")
                .difficulty(30, 50)
                .systems(1)
                .names(&["Hidden", "Onion"], &["Marketplace", "Bazaar"])
                .reward(Crypto, range(5.0, 15.0))
                .bonus(0.05)
                .repeatable(),
        );
        catalog.add_special(
            TargetTemplate::new(Global, "quantum_lab", "research")
                .difficulty(70, 90)
                .systems(4)
                .names(&["Quantum"], &["Computing Lab"])
                .reward(ProcessingPower, Fixed(500.0))
                .unlock(Effect::UnlockAbility {
                    ability: "quantum_decryption".into(),
                })
                .unlock(Effect::Modifier {
                    id: "quantum_decryption".into(),
                    multiplier: 1.15,
                    target_types: None,
                    duration_ms: None,
                })
                .progress(3),
        );
        catalog.add_special(
            TargetTemplate::new(Space, "ai_core", "research")
                .difficulty(85, 100)
                .systems(6)
                .names(&["Sentient"], &["AI Core"])
                .reward(ProcessingPower, Fixed(5000.0))
                .unlock(Effect::UnlockScale { tier: Cosmic })
                .progress(5),
        );

        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_defaults_cover_every_tier() {
        let catalog = TemplateCatalog::with_defaults();
        for tier in ScaleTier::ALL {
            assert!(catalog.for_tier(tier).count() > 0, "no templates for {}", tier);
        }
        for template in catalog.templates.iter().chain(catalog.specials.iter()) {
            assert!(template.validate().is_ok(), "{:?}", template.validate());
        }
    }

    #[test]
    fn test_builder_matches_pack_defaults() {
        let parsed = TemplateCatalog::parse_toml(
            r#"
            [[templates]]
            id = "kiosk"
            scale = "local"
            category = "iot"
            difficulty = [1, 1]
            prefixes = ["Mall"]
            suffixes = ["Kiosk"]
            "#,
        )
        .unwrap();
        let built = TargetTemplate::new(ScaleTier::Local, "kiosk", "iot");
        let from_pack = parsed.get("kiosk").unwrap();
        assert_eq!(built.weight, from_pack.weight);
        assert_eq!(built.progress_value, from_pack.progress_value);
        assert_eq!(built.base_systems, from_pack.base_systems);
        assert!(!built.repeatable && built.failure_penalty.is_none());

        let special = TargetTemplate::new(ScaleTier::Space, "relay", "station")
            .weight(3)
            .difficulty(10, 20)
            .systems(4)
            .names(&["Orbital"], &["Relay"])
            .progress(5)
            .repeatable();
        assert_eq!((special.weight, special.difficulty), (3, (10, 20)));
        assert_eq!((special.base_systems, special.progress_value), (4, 5));
        assert_eq!(special.prefixes, vec!["Orbital".to_string()]);
        assert!(special.repeatable);
        assert!(special.validate().is_ok());
    }

    #[test]
    fn test_weighted_pick_stays_in_tier() {
        let catalog = TemplateCatalog::with_defaults();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..50 {
            let t = catalog.pick(ScaleTier::Corporate, &mut rng).unwrap();
            assert_eq!(t.scale, ScaleTier::Corporate);
        }
    }

    #[test]
    fn test_pick_on_empty_tier() {
        let catalog = TemplateCatalog::new();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert!(catalog.pick(ScaleTier::Local, &mut rng).is_none());
    }

    #[test]
    fn test_reward_range_rolls_inclusive() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let spec = RewardSpec::Range { min: 10.0, max: 12.0 };
        for _ in 0..100 {
            let v = spec.roll(&mut rng);
            assert!((10.0..=12.0).contains(&v));
        }
        assert_eq!(RewardSpec::Fixed(4.0).roll(&mut rng), 4.0);
    }

    #[test]
    fn test_parse_toml_pack() {
        let catalog = TemplateCatalog::parse_toml(
            r#"
            [[templates]]
            id = "printer"
            scale = "local"
            category = "iot"
            difficulty = [1, 10]
            prefixes = ["Office"]
            suffixes = ["Printer"]
            [templates.rewards]
            data = 5.0
            bandwidth = { min = 1.0, max = 3.0 }

            [[specials]]
            id = "honeypot"
            scale = "local"
            category = "trap"
            difficulty = [40, 40]
            prefixes = ["Suspicious"]
            suffixes = ["Server"]
            "#,
        )
        .unwrap();

        let printer = catalog.get("printer").unwrap();
        assert_eq!(printer.weight, 1);
        assert_eq!(printer.rewards[&ResourceKind::Data], RewardSpec::Fixed(5.0));
        assert!(catalog.special("honeypot").is_some());
    }

    #[test]
    fn test_parse_toml_rejects_bad_range() {
        let result = TemplateCatalog::parse_toml(
            r#"
            [[templates]]
            id = "broken"
            scale = "local"
            category = "iot"
            difficulty = [60, 10]
            prefixes = ["A"]
            suffixes = ["B"]
            "#,
        );
        assert!(matches!(result, Err(ExpansionError::Config(_))));
    }
}
