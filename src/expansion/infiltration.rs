//! Infiltration scheduler - in-progress attempts and their resolution
//!
//! Per target: NONE -> ACTIVE -> {SUCCEEDED, FAILED} -> NONE. Chance and
//! duration are frozen at start; a single roll decides the outcome when
//! progress reaches 1.0.

use ahash::AHashMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

use crate::core::error::{ExpansionError, Result};
use crate::core::types::{Millis, Resources, TargetId};

/// An in-progress attempt against one target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Infiltration {
    pub target_id: TargetId,
    pub start_time: Millis,
    pub duration_ms: Millis,
    /// Frozen at start; never recomputed
    pub success_chance: f64,
    /// Monotonic in [0, 1]
    pub progress: f64,
    /// What was actually spent, for refunds
    pub cost_paid: Resources,
}

impl Infiltration {
    pub fn new(
        target_id: TargetId,
        start_time: Millis,
        duration_ms: Millis,
        success_chance: f64,
        cost_paid: Resources,
    ) -> Self {
        Self {
            target_id,
            start_time,
            duration_ms: duration_ms.max(1),
            success_chance,
            progress: 0.0,
            cost_paid,
        }
    }

    /// Recompute progress from the clock; never moves backwards
    pub fn advance(&mut self, now: Millis) -> f64 {
        let elapsed = now.saturating_sub(self.start_time) as f64;
        let progress = (elapsed / self.duration_ms as f64).min(1.0);
        self.progress = self.progress.max(progress);
        self.progress
    }

    pub fn is_finished(&self) -> bool {
        self.progress >= 1.0
    }

    pub fn remaining_ms(&self, now: Millis) -> Millis {
        (self.start_time + self.duration_ms).saturating_sub(now)
    }
}

/// Failure history for a target id
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureRecord {
    pub attempts: u32,
    pub last_fail_time: Millis,
}

/// Formula: 1 - progress * slope (sunk cost grows with progress)
pub fn refund_rate(progress: f64, slope: f64) -> f64 {
    1.0 - progress.clamp(0.0, 1.0) * slope
}

/// A draw at or below the frozen chance succeeds
pub fn roll_succeeds(roll: f64, success_chance: f64) -> bool {
    roll <= success_chance
}

/// Source of the uniform [0, 1) draws that decide attempt outcomes
pub trait RollSource: Send {
    fn roll(&mut self) -> f64;
}

/// Default roller backed by a seeded ChaCha stream
#[derive(Debug, Clone)]
pub struct SeededRolls {
    rng: ChaCha8Rng,
}

impl SeededRolls {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RollSource for SeededRolls {
    fn roll(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed queue of draws, then repeats `fallback`
#[derive(Debug, Clone)]
pub struct ScriptedRolls {
    queue: VecDeque<f64>,
    fallback: f64,
}

impl ScriptedRolls {
    pub fn new(rolls: impl IntoIterator<Item = f64>) -> Self {
        Self {
            queue: rolls.into_iter().collect(),
            fallback: 0.5,
        }
    }

    /// Same draw forever
    pub fn always(roll: f64) -> Self {
        Self {
            queue: VecDeque::new(),
            fallback: roll,
        }
    }

    pub fn push(&mut self, roll: f64) {
        self.queue.push_back(roll);
    }
}

impl RollSource for ScriptedRolls {
    fn roll(&mut self) -> f64 {
        self.queue.pop_front().unwrap_or(self.fallback)
    }
}

/// Owner of the active set and failure history
#[derive(Debug, Clone, Default)]
pub struct InfiltrationScheduler {
    active: BTreeMap<TargetId, Infiltration>,
    failures: AHashMap<TargetId, FailureRecord>,
}

impl InfiltrationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self, target_id: &TargetId) -> bool {
        self.active.contains_key(target_id)
    }

    pub fn get(&self, target_id: &TargetId) -> Option<&Infiltration> {
        self.active.get(target_id)
    }

    /// Add to the active set; at most one attempt per target
    pub fn begin(&mut self, infiltration: Infiltration) -> Result<()> {
        if self.active.contains_key(&infiltration.target_id) {
            return Err(ExpansionError::AlreadyInProgress(infiltration.target_id));
        }
        self.active.insert(infiltration.target_id.clone(), infiltration);
        Ok(())
    }

    pub fn cancel(&mut self, target_id: &TargetId) -> Option<Infiltration> {
        self.active.remove(target_id)
    }

    /// Advance every attempt and pull out the finished ones, in id order
    pub fn tick(&mut self, now: Millis) -> Vec<Infiltration> {
        let mut finished_ids = Vec::new();
        for (id, infiltration) in self.active.iter_mut() {
            infiltration.advance(now);
            if infiltration.is_finished() {
                finished_ids.push(id.clone());
            }
        }
        finished_ids
            .iter()
            .filter_map(|id| self.active.remove(id))
            .collect()
    }

    /// Record a failed attempt; returns the attempt count for that id
    ///
    /// A retry inherits the count of the target it was retried from, so the
    /// count covers every failure along the retry chain.
    pub fn record_failure(
        &mut self,
        target_id: &TargetId,
        retry_of: Option<&TargetId>,
        now: Millis,
    ) -> u32 {
        let inherited = retry_of
            .and_then(|parent| self.failures.get(parent))
            .map_or(0, |r| r.attempts);
        let record = self
            .failures
            .entry(target_id.clone())
            .or_insert(FailureRecord {
                attempts: inherited,
                last_fail_time: now,
            });
        record.attempts += 1;
        record.last_fail_time = now;
        record.attempts
    }

    pub fn failure(&self, target_id: &TargetId) -> Option<FailureRecord> {
        self.failures.get(target_id).copied()
    }

    pub fn active(&self) -> impl Iterator<Item = &Infiltration> {
        self.active.values()
    }

    pub fn active_ids(&self) -> impl Iterator<Item = &TargetId> {
        self.active.keys()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn failures_snapshot(&self) -> BTreeMap<TargetId, FailureRecord> {
        self.failures
            .iter()
            .map(|(id, r)| (id.clone(), *r))
            .collect()
    }

    pub fn restore(
        active: BTreeMap<TargetId, Infiltration>,
        failures: BTreeMap<TargetId, FailureRecord>,
    ) -> Self {
        Self {
            active,
            failures: failures.into_iter().collect(),
        }
    }
}
