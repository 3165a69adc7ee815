//! In-memory host - resource ledger, heat meter and recording bus

use ahash::{AHashMap, AHashSet};
use serde_json::Value;

use super::{EventSink, HeatGateway, PlayerState, ResourceGateway, StateStore};
use crate::core::types::{ResourceKind, Resources};
use crate::expansion::events::EngineEvent;

/// Heat ceiling; reaching it is the external "purge" trigger
pub const MAX_HEAT: f64 = 100.0;

/// A heat charge as received from the engine
#[derive(Debug, Clone, PartialEq)]
pub struct HeatEntry {
    pub amount: f64,
    pub reason: String,
}

/// Self-contained host used by the demo binary and tests
#[derive(Debug, Clone, Default)]
pub struct SandboxHost {
    resources: AHashMap<ResourceKind, f64>,
    heat: f64,
    pub morality: f64,
    upgrades: AHashSet<String>,
    store: AHashMap<String, Value>,
    /// Every event published, in order
    pub events: Vec<EngineEvent>,
    /// Every heat charge received, in order
    pub heat_log: Vec<HeatEntry>,
}

impl SandboxHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style starting balance
    pub fn with_resource(mut self, kind: ResourceKind, amount: f64) -> Self {
        self.resources.insert(kind, amount);
        self
    }

    pub fn with_upgrade(mut self, upgrade: &str) -> Self {
        self.upgrades.insert(upgrade.to_string());
        self
    }

    pub fn resource(&self, kind: ResourceKind) -> f64 {
        self.resources.get(&kind).copied().unwrap_or(0.0)
    }

    pub fn set_resource(&mut self, kind: ResourceKind, amount: f64) {
        self.resources.insert(kind, amount);
    }

    pub fn set_heat(&mut self, heat: f64) {
        self.heat = heat.clamp(0.0, MAX_HEAT);
    }

    pub fn grant_upgrade(&mut self, upgrade: &str) {
        self.upgrades.insert(upgrade.to_string());
    }

    /// Names of published events, in order
    pub fn event_names(&self) -> Vec<&'static str> {
        self.events.iter().map(|e| e.name()).collect()
    }
}

impl ResourceGateway for SandboxHost {
    fn can_afford(&self, cost: &Resources) -> bool {
        cost.iter().all(|(kind, amount)| self.resource(kind) >= amount)
    }

    fn spend(&mut self, cost: &Resources) {
        for (kind, amount) in cost.iter() {
            let entry = self.resources.entry(kind).or_insert(0.0);
            *entry = (*entry - amount).max(0.0);
        }
    }

    fn add(&mut self, rewards: &Resources) {
        for (kind, amount) in rewards.iter() {
            *self.resources.entry(kind).or_insert(0.0) += amount;
        }
    }
}

impl HeatGateway for SandboxHost {
    fn heat(&self) -> f64 {
        self.heat
    }

    fn add_heat(&mut self, amount: f64, reason: &str, _message: Option<&str>) {
        self.heat = (self.heat + amount).clamp(0.0, MAX_HEAT);
        self.heat_log.push(HeatEntry {
            amount,
            reason: reason.to_string(),
        });
    }
}

impl PlayerState for SandboxHost {
    fn processing_power(&self) -> f64 {
        self.resource(ResourceKind::ProcessingPower)
    }

    fn morality(&self) -> f64 {
        self.morality
    }

    fn has_upgrade(&self, upgrade: &str) -> bool {
        self.upgrades.contains(upgrade)
    }
}

impl StateStore for SandboxHost {
    fn get(&self, path: &str) -> Option<Value> {
        self.store.get(path).cloned()
    }

    fn set(&mut self, path: &str, value: Value) {
        self.store.insert(path.to_string(), value);
    }
}

impl EventSink for SandboxHost {
    fn publish(&mut self, event: &EngineEvent) {
        self.events.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spend_and_add() {
        let mut host = SandboxHost::new().with_resource(ResourceKind::Data, 100.0);
        let cost = Resources::new().with(ResourceKind::Data, 40.0);

        assert!(host.can_afford(&cost));
        host.spend(&cost);
        assert!((host.resource(ResourceKind::Data) - 60.0).abs() < 0.001);

        host.add(&cost);
        assert!((host.resource(ResourceKind::Data) - 100.0).abs() < 0.001);
    }

    #[test]
    fn test_cannot_afford_missing_resource() {
        let host = SandboxHost::new().with_resource(ResourceKind::Data, 100.0);
        let cost = Resources::new().with(ResourceKind::Crypto, 1.0);
        assert!(!host.can_afford(&cost));
    }

    #[test]
    fn test_heat_is_clamped() {
        let mut host = SandboxHost::new();
        host.add_heat(150.0, "test", None);
        assert!((host.heat() - MAX_HEAT).abs() < 0.001);
        host.add_heat(-500.0, "test", None);
        assert_eq!(host.heat(), 0.0);
        assert_eq!(host.heat_log.len(), 2);
    }

    #[test]
    fn test_batch_update_writes_every_path() {
        let mut host = SandboxHost::new();
        host.batch_update(vec![
            ("a".into(), Value::from(1)),
            ("b".into(), Value::from("two")),
        ]);
        assert_eq!(host.get("a"), Some(Value::from(1)));
        assert_eq!(host.get("b"), Some(Value::from("two")));
        assert_eq!(host.get("c"), None);
    }
}
