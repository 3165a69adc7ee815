//! Modifier registry - named multipliers on success chance
//!
//! Modifiers compose multiplicatively. Time-limited ones are purged lazily the
//! next time the registry is queried after their expiry.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::types::{Millis, ModifierId, TargetId};
use crate::expansion::target::Target;

/// Which targets a modifier applies to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "value", rename_all = "snake_case")]
pub enum ModifierScope {
    All,
    /// Only targets whose category is listed
    Types(Vec<String>),
    /// Exactly one target (campaign participation)
    Target(TargetId),
}

impl ModifierScope {
    pub fn applies_to(&self, target: &Target) -> bool {
        match self {
            ModifierScope::All => true,
            ModifierScope::Types(types) => types.iter().any(|t| *t == target.category),
            ModifierScope::Target(id) => *id == target.id,
        }
    }
}

/// A named multiplicative adjustment to success chance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Modifier {
    pub id: ModifierId,
    pub multiplier: f64,
    pub scope: ModifierScope,
    /// Absent means permanent
    pub expires_at: Option<Millis>,
    /// Who registered it; used for bulk removal and debugging
    pub source: String,
}

impl Modifier {
    pub fn is_expired(&self, now: Millis) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Store of active modifiers
#[derive(Debug, Clone, Default)]
pub struct ModifierRegistry {
    modifiers: AHashMap<ModifierId, Modifier>,
}

impl ModifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a modifier; `duration_ms` of `None` makes it permanent
    pub fn add(
        &mut self,
        id: ModifierId,
        multiplier: f64,
        scope: ModifierScope,
        source: &str,
        duration_ms: Option<Millis>,
        now: Millis,
    ) {
        let modifier = Modifier {
            id: id.clone(),
            multiplier,
            scope,
            expires_at: duration_ms.map(|d| now.saturating_add(d)),
            source: source.to_string(),
        };
        self.modifiers.insert(id, modifier);
    }

    pub fn remove(&mut self, id: &ModifierId) -> Option<Modifier> {
        self.modifiers.remove(id)
    }

    /// Remove every modifier registered by `source`; returns how many went
    pub fn remove_by_source(&mut self, source: &str) -> usize {
        let before = self.modifiers.len();
        self.modifiers.retain(|_, m| m.source != source);
        before - self.modifiers.len()
    }

    /// Product of every live modifier applying to `target` (1.0 if none)
    ///
    /// Expired entries are dropped as a side effect and never contribute.
    pub fn combined_multiplier(&mut self, target: &Target, now: Millis) -> f64 {
        self.purge_expired(now);
        self.modifiers
            .values()
            .filter(|m| m.scope.applies_to(target))
            .map(|m| m.multiplier)
            .product()
    }

    pub fn purge_expired(&mut self, now: Millis) -> usize {
        let before = self.modifiers.len();
        self.modifiers.retain(|_, m| !m.is_expired(now));
        before - self.modifiers.len()
    }

    pub fn get(&self, id: &ModifierId) -> Option<&Modifier> {
        self.modifiers.get(id)
    }

    pub fn contains(&self, id: &ModifierId) -> bool {
        self.modifiers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Modifier> {
        self.modifiers.values()
    }

    /// Ordered copy for persistence
    pub fn snapshot(&self) -> BTreeMap<ModifierId, Modifier> {
        self.modifiers
            .iter()
            .map(|(id, m)| (id.clone(), m.clone()))
            .collect()
    }

    pub fn restore(modifiers: BTreeMap<ModifierId, Modifier>) -> Self {
        Self {
            modifiers: modifiers.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Resources, ScaleTier};
    use crate::expansion::target::Requirements;

    fn target(id: &str, category: &str) -> Target {
        Target {
            id: TargetId::from(id),
            name: "Test".into(),
            category: category.into(),
            template: "test".into(),
            difficulty: 20,
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

    #[test]
    fn test_empty_registry_is_neutral() {
        let mut registry = ModifierRegistry::new();
        let t = target("local-000001", "router");
        assert!((registry.combined_multiplier(&t, 0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_modifiers_compose_multiplicatively() {
        let mut registry = ModifierRegistry::new();
        registry.add(ModifierId::new("a"), 1.2, ModifierScope::All, "upgrade", None, 0);
        registry.add(ModifierId::new("b"), 1.5, ModifierScope::All, "upgrade", None, 0);

        let t = target("local-000001", "router");
        assert!((registry.combined_multiplier(&t, 0) - 1.8).abs() < 1e-9);
    }

    #[test]
    fn test_type_filter_excludes_other_categories() {
        let mut registry = ModifierRegistry::new();
        registry.add(
            ModifierId::new("iot_exploit"),
            2.0,
            ModifierScope::Types(vec!["iot".into()]),
            "upgrade",
            None,
            0,
        );

        let router = target("local-000001", "router");
        let camera = target("local-000002", "iot");
        assert!((registry.combined_multiplier(&router, 0) - 1.0).abs() < 1e-9);
        assert!((registry.combined_multiplier(&camera, 0) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_target_scope() {
        let mut registry = ModifierRegistry::new();
        let a = target("local-000001", "router");
        let b = target("local-000002", "router");
        registry.add(
            ModifierId::new("campaign"),
            1.3,
            ModifierScope::Target(a.id.clone()),
            "campaign",
            None,
            0,
        );
        assert!((registry.combined_multiplier(&a, 0) - 1.3).abs() < 1e-9);
        assert!((registry.combined_multiplier(&b, 0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_expired_modifier_never_applies() {
        let mut registry = ModifierRegistry::new();
        registry.add(ModifierId::new("boost"), 1.5, ModifierScope::All, "event", Some(1_000), 500);
        let t = target("local-000001", "router");

        assert!((registry.combined_multiplier(&t, 1_499) - 1.5).abs() < 1e-9);
        assert_eq!(registry.len(), 1);

        // Expiry at 1_500
        assert!((registry.combined_multiplier(&t, 1_500) - 1.0).abs() < 1e-9);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_by_source() {
        let mut registry = ModifierRegistry::new();
        registry.add(ModifierId::new("a"), 1.1, ModifierScope::All, "campaign-1", None, 0);
        registry.add(ModifierId::new("b"), 1.1, ModifierScope::All, "campaign-1", None, 0);
        registry.add(ModifierId::new("c"), 1.1, ModifierScope::All, "upgrade", None, 0);

        assert_eq!(registry.remove_by_source("campaign-1"), 2);
        assert!(registry.contains(&ModifierId::new("c")));
        assert!(registry.remove(&ModifierId::new("c")).is_some());
        assert!(registry.is_empty());
    }
}
