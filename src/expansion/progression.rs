//! Scale progression - completed-target counters and tier transitions
//!
//! The current tier only ever moves forward. At the terminal tier
//! `check_advance` returns `None` forever.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::config::EngineConfig;
use crate::core::types::{ResourceKind, ScaleTier};
use crate::expansion::target::{Effect, Target};

/// Completed/required counter for one tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierProgress {
    pub completed: u32,
    pub required: u32,
}

/// Read-only view for the UI
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleProgressInfo {
    pub current_tier: ScaleTier,
    pub next_tier: Option<ScaleTier>,
    pub completed: u32,
    pub required: u32,
    /// 0-100
    pub percentage: f64,
}

/// One-time unlocks fired on entering a tier
pub fn tier_unlocks(tier: ScaleTier) -> Vec<Effect> {
    let ability = |name: &str| Effect::UnlockAbility {
        ability: name.to_string(),
    };
    match tier {
        ScaleTier::Local => vec![],
        ScaleTier::Corporate => vec![ability("corporate_espionage")],
        ScaleTier::Government => vec![Effect::UnlockResource {
            resource: ResourceKind::Crypto,
        }],
        ScaleTier::Global => vec![ability("botnet_swarm")],
        ScaleTier::Space => vec![
            Effect::UnlockResource {
                resource: ResourceKind::Energy,
            },
            ability("orbital_relay"),
        ],
        ScaleTier::Cosmic => vec![ability("heat_immunity")],
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScaleProgression {
    current: ScaleTier,
    tiers: BTreeMap<ScaleTier, TierProgress>,
}

impl ScaleProgression {
    pub fn new(config: &EngineConfig) -> Self {
        let tiers = ScaleTier::ALL
            .iter()
            .map(|tier| {
                (
                    *tier,
                    TierProgress {
                        completed: 0,
                        required: config.required(*tier),
                    },
                )
            })
            .collect();
        Self {
            current: ScaleTier::Local,
            tiers,
        }
    }

    /// Rebuild from persisted counters; tiers missing from `tiers` get config defaults
    pub fn restore(
        current: ScaleTier,
        tiers: BTreeMap<ScaleTier, TierProgress>,
        config: &EngineConfig,
    ) -> Self {
        let mut progression = Self::new(config);
        progression.current = current;
        progression.tiers.extend(tiers);
        progression
    }

    pub fn current(&self) -> ScaleTier {
        self.current
    }

    pub fn tier(&self, tier: ScaleTier) -> TierProgress {
        self.tiers.get(&tier).copied().unwrap_or(TierProgress {
            completed: 0,
            required: 1,
        })
    }

    /// Credit a completed target to the current tier
    ///
    /// Counts 1, or the target's `progress_value` if larger.
    pub fn record_completion(&mut self, target: &Target) -> u32 {
        let credit = target.progress_value.max(1);
        let entry = self.tiers.entry(self.current).or_insert(TierProgress {
            completed: 0,
            required: 1,
        });
        entry.completed = entry.completed.saturating_add(credit);
        entry.completed
    }

    /// Next tier if the current one's requirement is met
    pub fn check_advance(&self) -> Option<ScaleTier> {
        let next = self.current.next()?;
        let progress = self.tier(self.current);
        (progress.completed >= progress.required).then_some(next)
    }

    /// Move to `next`; refused (returns false) unless it is ahead of the current tier
    pub fn advance(&mut self, next: ScaleTier) -> bool {
        if next <= self.current {
            return false;
        }
        self.current = next;
        true
    }

    pub fn info(&self) -> ScaleProgressInfo {
        let progress = self.tier(self.current);
        let percentage = if progress.required == 0 {
            100.0
        } else {
            (progress.completed as f64 / progress.required as f64 * 100.0).min(100.0)
        };
        ScaleProgressInfo {
            current_tier: self.current,
            next_tier: self.current.next(),
            completed: progress.completed,
            required: progress.required,
            percentage,
        }
    }

    pub fn snapshot(&self) -> BTreeMap<ScaleTier, TierProgress> {
        self.tiers.clone()
    }
}
