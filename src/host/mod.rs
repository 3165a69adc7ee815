//! Collaborator seams - everything the engine reads or writes outside itself
//!
//! The engine never touches resources, heat or player flags directly. It goes
//! through these traits so there is a single writer per shared counter.

pub mod sandbox;

use serde_json::Value;

use crate::core::types::Resources;
use crate::expansion::events::EngineEvent;

pub use sandbox::SandboxHost;

/// Owner of the player's resource pool
pub trait ResourceGateway {
    fn can_afford(&self, cost: &Resources) -> bool;
    fn spend(&mut self, cost: &Resources);
    fn add(&mut self, rewards: &Resources);
}

/// Owner of the detection-risk counter
pub trait HeatGateway {
    fn heat(&self) -> f64;
    fn add_heat(&mut self, amount: f64, reason: &str, message: Option<&str>);
}

/// Read-only player facts used by the success model and prerequisite checks
pub trait PlayerState {
    fn processing_power(&self) -> f64;
    fn morality(&self) -> f64;
    fn has_upgrade(&self, upgrade: &str) -> bool;
}

/// External projection sink for UI consumption
pub trait StateStore {
    fn get(&self, path: &str) -> Option<Value>;
    fn set(&mut self, path: &str, value: Value);

    fn batch_update(&mut self, updates: Vec<(String, Value)>) {
        for (path, value) in updates {
            self.set(&path, value);
        }
    }
}

/// Publish side of the notification bus
pub trait EventSink {
    fn publish(&mut self, event: &EngineEvent);
}

/// Everything the engine needs from its surroundings
pub trait Host: ResourceGateway + HeatGateway + PlayerState + StateStore + EventSink {}

impl<T> Host for T where T: ResourceGateway + HeatGateway + PlayerState + StateStore + EventSink {}
