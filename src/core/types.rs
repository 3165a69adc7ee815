//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Engine clock value in milliseconds
pub type Millis = u64;

/// Unique identifier for targets, namespaced by the tier that issued it
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(pub String);

impl TargetId {
    pub fn new(tier: ScaleTier, seq: u64) -> Self {
        Self(format!("{}-{:06}", tier.key(), seq))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier for campaigns
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignId(pub String);

impl CampaignId {
    pub fn new(seq: u64) -> Self {
        Self(format!("campaign-{:06}", seq))
    }
}

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a registered success modifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModifierId(pub String);

impl ModifierId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ModifierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Monotonic id source. Persisted with the engine so ids are never reissued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn starting_at(next: u64) -> Self {
        Self { next: next.max(1) }
    }

    pub fn peek(&self) -> u64 {
        self.next
    }

    pub fn next_seq(&mut self) -> u64 {
        let seq = self.next;
        self.next += 1;
        seq
    }

    pub fn target_id(&mut self, tier: ScaleTier) -> TargetId {
        TargetId::new(tier, self.next_seq())
    }

    pub fn campaign_id(&mut self) -> CampaignId {
        CampaignId::new(self.next_seq())
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Scale tiers in progression order. Terminal at `Cosmic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ScaleTier {
    Local = 0,
    Corporate = 1,
    Government = 2,
    Global = 3,
    Space = 4,
    Cosmic = 5,
}

impl ScaleTier {
    pub const ALL: [ScaleTier; 6] = [
        ScaleTier::Local,
        ScaleTier::Corporate,
        ScaleTier::Government,
        ScaleTier::Global,
        ScaleTier::Space,
        ScaleTier::Cosmic,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// The tier after this one, `None` at the terminal tier
    pub fn next(self) -> Option<ScaleTier> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    pub fn key(self) -> &'static str {
        match self {
            ScaleTier::Local => "local",
            ScaleTier::Corporate => "corporate",
            ScaleTier::Government => "government",
            ScaleTier::Global => "global",
            ScaleTier::Space => "space",
            ScaleTier::Cosmic => "cosmic",
        }
    }

    /// Player-facing "network reach" label for this tier
    pub fn reach_label(self) -> &'static str {
        match self {
            ScaleTier::Local => "Local Network",
            ScaleTier::Corporate => "Corporate Networks",
            ScaleTier::Government => "Government Systems",
            ScaleTier::Global => "Global Infrastructure",
            ScaleTier::Space => "Orbital Networks",
            ScaleTier::Cosmic => "Cosmic Consciousness",
        }
    }
}

impl fmt::Display for ScaleTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Resource types held by the external resource gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Data,
    ProcessingPower,
    Bandwidth,
    Crypto,
    Energy,
    Matter,
}

/// Amounts keyed by resource type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resources(BTreeMap<ResourceKind, f64>);

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, kind: ResourceKind, amount: f64) -> Self {
        self.0.insert(kind, amount);
        self
    }

    pub fn set(&mut self, kind: ResourceKind, amount: f64) {
        self.0.insert(kind, amount);
    }

    pub fn get(&self, kind: ResourceKind) -> f64 {
        self.0.get(&kind).copied().unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|v| *v == 0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, f64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    /// Every amount multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        Self(self.0.iter().map(|(k, v)| (*k, v * factor)).collect())
    }

    /// Every amount multiplied by `factor` and rounded to whole units
    pub fn scaled_rounded(&self, factor: f64) -> Self {
        Self(self.0.iter().map(|(k, v)| (*k, (v * factor).round())).collect())
    }

    pub fn merge(&mut self, other: &Resources) {
        for (kind, amount) in other.iter() {
            *self.0.entry(kind).or_insert(0.0) += amount;
        }
    }
}

impl FromIterator<(ResourceKind, f64)> for Resources {
    fn from_iter<I: IntoIterator<Item = (ResourceKind, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering() {
        assert!(ScaleTier::Cosmic > ScaleTier::Space);
        assert!(ScaleTier::Corporate > ScaleTier::Local);
        assert_eq!(ScaleTier::Local.next(), Some(ScaleTier::Corporate));
        assert_eq!(ScaleTier::Cosmic.next(), None);
        assert!(ScaleTier::Cosmic.is_terminal());
        assert!(!ScaleTier::Space.is_terminal());
    }

    #[test]
    fn test_id_allocator_is_monotonic() {
        let mut ids = IdAllocator::new();
        let a = ids.target_id(ScaleTier::Local);
        let b = ids.target_id(ScaleTier::Local);
        let c = ids.campaign_id();
        assert_eq!(a.as_str(), "local-000001");
        assert_eq!(b.as_str(), "local-000002");
        assert_eq!(c.0, "campaign-000003");
        assert_ne!(a, b);
    }

    #[test]
    fn test_resources_scaling_and_merge() {
        let cost = Resources::new()
            .with(ResourceKind::Data, 100.0)
            .with(ResourceKind::Bandwidth, 10.0);

        let half = cost.scaled(0.5);
        assert!((half.get(ResourceKind::Data) - 50.0).abs() < 0.001);
        assert!((half.get(ResourceKind::Bandwidth) - 5.0).abs() < 0.001);
        assert_eq!(half.get(ResourceKind::Energy), 0.0);

        let mut total = cost.clone();
        total.merge(&half);
        assert!((total.get(ResourceKind::Data) - 150.0).abs() < 0.001);
    }

    #[test]
    fn test_resources_serialize_as_map() {
        let r = Resources::new().with(ResourceKind::ProcessingPower, 3.0);
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, r#"{"processing_power":3.0}"#);
    }
}
