//! Targets - infiltration objectives and their effects

use serde::{Deserialize, Serialize};

use crate::core::types::{Millis, ResourceKind, Resources, ScaleTier, TargetId};
use crate::host::PlayerState;

pub const MIN_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 100;

/// Clamp any computed difficulty into `[1, 100]`
pub fn clamp_difficulty(value: i64) -> u8 {
    value.clamp(MIN_DIFFICULTY as i64, MAX_DIFFICULTY as i64) as u8
}

/// A candidate infiltration objective
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub id: TargetId,
    pub name: String,
    /// Type tag used by modifier filters and debuffs
    pub category: String,
    /// Template this target was rolled from
    pub template: String,
    pub difficulty: u8,
    pub scale: ScaleTier,
    pub cost: Resources,
    pub rewards: Resources,
    pub systems_gained: u32,
    #[serde(default)]
    pub unlocks: Vec<Effect>,
    #[serde(default)]
    pub requirements: Requirements,
    #[serde(default)]
    pub success_bonus: f64,
    #[serde(default)]
    pub success_penalty: f64,
    /// Scale-progress credit on success (at least 1)
    #[serde(default = "default_progress_value")]
    pub progress_value: u32,
    #[serde(default)]
    pub failure_penalty: Option<FailurePenalty>,
    /// Failed target this one is a retry of
    #[serde(default)]
    pub retry_of: Option<TargetId>,
}

fn default_progress_value() -> u32 {
    1
}

impl Target {
    /// Build the entity that reappears after a failed attempt
    ///
    /// Difficulty goes up by `delta` (capped at 100) and cost scales with it.
    pub fn retry(&self, id: TargetId, delta: u8) -> Target {
        let difficulty = clamp_difficulty(self.difficulty as i64 + delta as i64);
        let ratio = difficulty as f64 / self.difficulty.max(1) as f64;
        Target {
            id,
            difficulty,
            cost: self.cost.scaled_rounded(ratio),
            retry_of: Some(self.id.clone()),
            ..self.clone()
        }
    }

    /// Reason this target cannot currently be attempted, if any
    pub fn unmet_requirement(
        &self,
        player: &dyn PlayerState,
        controlled_systems: u64,
        current_tier: ScaleTier,
    ) -> Option<String> {
        if self.scale > current_tier {
            return Some(format!("requires {} scale", self.scale));
        }
        self.requirements.unmet(player, controlled_systems)
    }
}

/// Prerequisites for attempting a target
///
/// Saves use camelCase keys; template packs may use snake_case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Requirements {
    pub upgrade: Option<String>,
    #[serde(alias = "min_controlled_systems")]
    pub min_controlled_systems: Option<u64>,
    /// Inclusive `(min, max)` morality window
    pub morality: Option<(f64, f64)>,
}

impl Requirements {
    pub fn is_empty(&self) -> bool {
        self.upgrade.is_none() && self.min_controlled_systems.is_none() && self.morality.is_none()
    }

    /// Re-evaluated on every query; player state may have changed since last tick
    pub fn unmet(&self, player: &dyn PlayerState, controlled_systems: u64) -> Option<String> {
        if let Some(upgrade) = &self.upgrade {
            if !player.has_upgrade(upgrade) {
                return Some(format!("requires upgrade '{}'", upgrade));
            }
        }

        if let Some(min) = self.min_controlled_systems {
            if controlled_systems < min {
                return Some(format!(
                    "requires {} controlled systems (have {})",
                    min, controlled_systems
                ));
            }
        }

        if let Some((lo, hi)) = self.morality {
            let morality = player.morality();
            if morality < lo || morality > hi {
                return Some(format!(
                    "morality {:.0} outside [{:.0}, {:.0}]",
                    morality, lo, hi
                ));
            }
        }

        None
    }
}

/// Penalties applied when an attempt fails
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FailurePenalty {
    #[serde(alias = "resource_loss")]
    pub resource_loss: Resources,
    pub heat: f64,
    pub debuff: Option<Debuff>,
}

/// Temporary success multiplier against the failed target's category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Debuff {
    pub multiplier: f64,
    #[serde(alias = "duration_ms")]
    pub duration_ms: Millis,
}

/// Effect of completing a target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    Resources {
        amounts: Resources,
    },
    Heat {
        amount: f64,
    },
    /// Generate targets from a special template
    UnlockTargets {
        template: String,
        #[serde(default = "default_unlock_count")]
        count: u32,
    },
    /// Jump forward to a scale tier (ignored if not ahead of the current one)
    UnlockScale {
        tier: ScaleTier,
    },
    UnlockAbility {
        ability: String,
    },
    UnlockResource {
        resource: ResourceKind,
    },
    Modifier {
        id: String,
        multiplier: f64,
        #[serde(default, rename = "targetTypes", alias = "target_types")]
        target_types: Option<Vec<String>>,
        #[serde(default, rename = "durationMs", alias = "duration_ms")]
        duration_ms: Option<Millis>,
    },
}

fn default_unlock_count() -> u32 {
    1
}
