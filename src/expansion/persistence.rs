//! Save/load of the engine's own state
//!
//! Storage is the caller's business; this module only defines the persisted
//! shape and the conversions. Loading from JSON never fails: unreadable input
//! is logged and the engine starts fresh.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::core::config::EngineConfig;
use crate::core::error::Result;
use crate::core::types::{
    CampaignId, IdAllocator, Millis, ModifierId, ResourceKind, Resources, ScaleTier, TargetId,
};
use crate::expansion::campaign::{Campaign, CampaignOrchestrator};
use crate::expansion::engine::ExpansionEngine;
use crate::expansion::infiltration::{FailureRecord, Infiltration, InfiltrationScheduler};
use crate::expansion::modifiers::{Modifier, ModifierRegistry};
use crate::expansion::progression::{ScaleProgression, TierProgress};
use crate::expansion::schedule::{Deferred, DeferredAction, DeferredQueue};
use crate::expansion::target::Target;
use crate::expansion::templates::TemplateCatalog;

/// Persisted engine state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveState {
    pub current_scale: ScaleTier,
    #[serde(default)]
    pub controlled_systems: u64,
    #[serde(default)]
    pub network_reach: String,
    #[serde(default)]
    pub available_targets: BTreeMap<TargetId, Target>,
    #[serde(default)]
    pub completed_targets: Vec<TargetId>,
    #[serde(default)]
    pub failed_targets: BTreeMap<TargetId, FailureRecord>,
    #[serde(default)]
    pub active_infiltrations: BTreeMap<TargetId, SavedInfiltration>,
    #[serde(default)]
    pub active_campaigns: BTreeMap<CampaignId, Campaign>,
    #[serde(default)]
    pub modifiers: BTreeMap<ModifierId, Modifier>,
    #[serde(default)]
    pub scale_progress: BTreeMap<ScaleTier, TierProgress>,
    #[serde(default)]
    pub target_refresh_timer: Millis,
    #[serde(default)]
    pub target_refresh_interval: Millis,
    #[serde(default)]
    pub now: Millis,
    /// Older saves have no counter; it is inferred from the ids present.
    /// A counter behind those ids is raised to match.
    #[serde(default)]
    pub next_id: Option<u64>,
    #[serde(default)]
    pub unlocked_abilities: BTreeSet<String>,
    #[serde(default)]
    pub unlocked_resources: BTreeSet<ResourceKind>,
    #[serde(default)]
    pub unlocked_specials: BTreeSet<String>,
    #[serde(default)]
    pub deferred: Vec<Deferred>,
}

/// Persisted form of an in-flight infiltration
///
/// `start_time` is lenient: a missing or garbled timestamp loads as `None`
/// and is replaced by the saved clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedInfiltration {
    pub target_id: TargetId,
    #[serde(default, deserialize_with = "lenient_millis")]
    pub start_time: Option<Millis>,
    pub duration_ms: Millis,
    pub success_chance: f64,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub cost_paid: Resources,
}

impl SavedInfiltration {
    fn into_infiltration(self, now: Millis) -> Infiltration {
        Infiltration {
            target_id: self.target_id,
            start_time: self.start_time.unwrap_or(now),
            duration_ms: self.duration_ms.max(1),
            success_chance: self.success_chance,
            progress: self.progress.clamp(0.0, 1.0),
            cost_paid: self.cost_paid,
        }
    }
}

impl From<&Infiltration> for SavedInfiltration {
    fn from(infiltration: &Infiltration) -> Self {
        Self {
            target_id: infiltration.target_id.clone(),
            start_time: Some(infiltration.start_time),
            duration_ms: infiltration.duration_ms,
            success_chance: infiltration.success_chance,
            progress: infiltration.progress,
            cost_paid: infiltration.cost_paid.clone(),
        }
    }
}

fn lenient_millis<'de, D>(deserializer: D) -> std::result::Result<Option<Millis>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| {
        v.as_u64().or_else(|| {
            v.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as Millis)
        })
    }))
}

/// Numeric tail of an id like `local-000017`
fn id_seq(id: &str) -> Option<u64> {
    id.rsplit('-').next()?.parse().ok()
}

impl SaveState {
    /// Parse a save without falling back
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// One past the highest id sequence referenced anywhere in the save
    fn inferred_next_id(&self) -> u64 {
        let targets = self
            .available_targets
            .keys()
            .chain(self.active_infiltrations.keys())
            .chain(self.completed_targets.iter())
            .chain(self.failed_targets.keys())
            .map(|id| id.as_str());
        let campaigns = self.active_campaigns.keys().map(|id| id.0.as_str());
        let retries = self.deferred.iter().map(|d| match &d.action {
            DeferredAction::RetryTarget { failed } => failed.id.as_str(),
        });

        targets
            .chain(campaigns)
            .chain(retries)
            .filter_map(id_seq)
            .max()
            .map_or(1, |max| max + 1)
    }
}

impl ExpansionEngine {
    pub fn save_state(&self) -> SaveState {
        SaveState {
            current_scale: self.current_scale(),
            controlled_systems: self.controlled_systems,
            network_reach: self.network_reach().to_string(),
            available_targets: self.catalog.pool().clone(),
            completed_targets: self.completed_targets.clone(),
            failed_targets: self.scheduler.failures_snapshot(),
            active_infiltrations: self
                .scheduler
                .active()
                .map(|i| (i.target_id.clone(), SavedInfiltration::from(i)))
                .collect(),
            active_campaigns: self.campaigns.snapshot(),
            modifiers: self.modifiers.snapshot(),
            scale_progress: self.progression.snapshot(),
            target_refresh_timer: self.refresh_timer,
            target_refresh_interval: self.config.refresh_interval_ms,
            now: self.now,
            next_id: Some(self.ids.peek()),
            unlocked_abilities: self.unlocked_abilities.clone(),
            unlocked_resources: self.unlocked_resources.clone(),
            unlocked_specials: self.catalog.unlocked_specials().clone(),
            deferred: self.deferred.snapshot(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        self.save_state().to_json()
    }

    /// Rebuild an engine from a parsed save
    ///
    /// In-flight infiltrations whose target is missing from the pool are
    /// dropped with a warning.
    pub fn from_save_state(
        mut config: EngineConfig,
        templates: TemplateCatalog,
        state: SaveState,
    ) -> Self {
        if state.target_refresh_interval > 0 {
            config.refresh_interval_ms = state.target_refresh_interval;
        }
        // A stale counter must never reissue an id already present in the save
        let inferred = state.inferred_next_id();
        let next_id = match state.next_id {
            Some(saved) if saved < inferred => {
                tracing::warn!(
                    "Saved id counter {} is behind ids in the save; resuming at {}",
                    saved,
                    inferred
                );
                inferred
            }
            Some(saved) => saved,
            None => inferred,
        };
        let mut engine = Self::empty(config, templates, IdAllocator::starting_at(next_id));

        engine.now = state.now;
        engine.controlled_systems = state.controlled_systems;
        engine.refresh_timer = state.target_refresh_timer;
        engine.completed_targets = state.completed_targets;
        engine.unlocked_abilities = state.unlocked_abilities;
        engine.unlocked_resources = state.unlocked_resources;

        for (_, target) in state.available_targets {
            engine.catalog.insert(target);
        }
        engine
            .catalog
            .restore_unlocked_specials(state.unlocked_specials);

        let mut active = BTreeMap::new();
        for (_, saved) in state.active_infiltrations {
            if !engine.catalog.contains(&saved.target_id) {
                tracing::warn!(
                    "Dropping saved infiltration on {}: target not in pool",
                    saved.target_id
                );
                continue;
            }
            if saved.start_time.is_none() {
                tracing::warn!(
                    "Saved infiltration on {} has no start time; using {}",
                    saved.target_id,
                    state.now
                );
            }
            let infiltration = saved.into_infiltration(state.now);
            active.insert(infiltration.target_id.clone(), infiltration);
        }
        engine.scheduler = InfiltrationScheduler::restore(active, state.failed_targets);

        engine.campaigns = CampaignOrchestrator::restore(state.active_campaigns);
        engine.modifiers = ModifierRegistry::restore(state.modifiers);
        engine.progression =
            ScaleProgression::restore(state.current_scale, state.scale_progress, &engine.config);
        engine.deferred = DeferredQueue::restore(state.deferred);

        tracing::debug!(
            "Restored expansion state: {} at {} ms, {} targets, {} active infiltrations",
            engine.current_scale(),
            engine.now,
            engine.pool_size(),
            engine.scheduler.len()
        );
        engine
    }

    /// Load from JSON, starting fresh when the input can't be used
    pub fn from_json(config: EngineConfig, templates: TemplateCatalog, json: &str) -> Self {
        match SaveState::from_json(json) {
            Ok(state) => Self::from_save_state(config, templates, state),
            Err(err) => {
                tracing::warn!("No usable expansion save ({}); starting fresh", err);
                Self::with_templates(config, templates)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_seq() {
        assert_eq!(id_seq("local-000017"), Some(17));
        assert_eq!(id_seq("campaign-000003"), Some(3));
        assert_eq!(id_seq("garbage"), None);
    }

    #[test]
    fn test_lenient_start_time() {
        let parse = |json: &str| serde_json::from_str::<SavedInfiltration>(json).unwrap();

        let missing = parse(r#"{"targetId":"local-000001","durationMs":1000,"successChance":0.5}"#);
        assert_eq!(missing.start_time, None);

        let garbled = parse(
            r#"{"targetId":"local-000001","startTime":"yesterday","durationMs":1000,"successChance":0.5}"#,
        );
        assert_eq!(garbled.start_time, None);

        let float = parse(
            r#"{"targetId":"local-000001","startTime":1500.0,"durationMs":1000,"successChance":0.5}"#,
        );
        assert_eq!(float.start_time, Some(1500));

        let infiltration = missing.into_infiltration(42_000);
        assert_eq!(infiltration.start_time, 42_000);
    }

    #[test]
    fn test_inferred_next_id() {
        let state: SaveState = serde_json::from_str(
            r#"{"currentScale":"local","completedTargets":["local-000004","local-000011"]}"#,
        )
        .unwrap();
        assert_eq!(state.inferred_next_id(), 12);
    }
}
