//! Deferred actions keyed by a deadline on the engine clock

use serde::{Deserialize, Serialize};

use crate::core::types::Millis;
use crate::expansion::target::Target;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DeferredAction {
    /// Put a harder copy of a failed target back into the pool
    RetryTarget { failed: Target },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deferred {
    pub due_at: Millis,
    pub action: DeferredAction,
}

/// Pending actions, fired in deadline order (insertion order on ties)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeferredQueue {
    entries: Vec<Deferred>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due_at: Millis, action: DeferredAction) {
        let idx = self.entries.partition_point(|e| e.due_at <= due_at);
        self.entries.insert(idx, Deferred { due_at, action });
    }

    /// Remove and return every action due at or before `now`
    pub fn drain_due(&mut self, now: Millis) -> Vec<DeferredAction> {
        let split = self.entries.partition_point(|e| e.due_at <= now);
        self.entries.drain(..split).map(|e| e.action).collect()
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.entries.first().map(|e| e.due_at)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self) -> Vec<Deferred> {
        self.entries.clone()
    }

    pub fn restore(mut entries: Vec<Deferred>) -> Self {
        entries.sort_by_key(|e| e.due_at);
        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Resources, ScaleTier, TargetId};
    use crate::expansion::target::Requirements;

    fn retry(id: &str) -> DeferredAction {
        DeferredAction::RetryTarget {
            failed: Target {
                id: TargetId::from(id),
                name: "Test".into(),
                category: "router".into(),
                template: "test".into(),
                difficulty: 50,
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
            },
        }
    }

    fn id_of(action: &DeferredAction) -> &str {
        match action {
            DeferredAction::RetryTarget { failed } => failed.id.as_str(),
        }
    }

    #[test]
    fn test_drain_in_deadline_order() {
        let mut queue = DeferredQueue::new();
        queue.schedule(300, retry("c"));
        queue.schedule(100, retry("a"));
        queue.schedule(200, retry("b"));
        queue.schedule(100, retry("a2"));

        assert_eq!(queue.next_due(), Some(100));
        assert!(queue.drain_due(99).is_empty());

        let due = queue.drain_due(200);
        let ids: Vec<&str> = due.iter().map(id_of).collect();
        assert_eq!(ids, vec!["a", "a2", "b"]);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_restore_sorts() {
        let queue = DeferredQueue::restore(vec![
            Deferred { due_at: 50, action: retry("late") },
            Deferred { due_at: 10, action: retry("early") },
        ]);
        assert_eq!(queue.next_due(), Some(10));
    }
}
