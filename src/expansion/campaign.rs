//! Campaigns - coordinated operations across several targets
//!
//! A campaign enrolls available targets, gives each a success modifier for
//! its duration, and pays a coordination reward when the timer runs out,
//! whatever happened to the individual attempts.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::core::error::{ExpansionError, Result};
use crate::core::types::{CampaignId, Millis, ModifierId, ResourceKind, Resources, TargetId};

/// Heat reduction never fully hides an operation
pub const MAX_HEAT_REDUCTION: f64 = 0.9;

/// Campaign flavours; each scales the derived bonuses differently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignType {
    /// Balanced, no adjustment
    Coordinated,
    /// Quieter and slower: double heat reduction, half the success boost
    Stealth,
    /// Short and loud: stronger success boost, half heat reduction
    Blitz,
    /// Long haul: richer payout
    Siege,
}

impl CampaignType {
    /// (success, heat reduction, resource bonus, duration) scales
    fn scales(self) -> (f64, f64, f64, f64) {
        match self {
            CampaignType::Coordinated => (1.0, 1.0, 1.0, 1.0),
            CampaignType::Stealth => (0.5, 2.0, 0.5, 1.5),
            CampaignType::Blitz => (1.5, 0.5, 1.0, 0.5),
            CampaignType::Siege => (1.0, 1.0, 1.5, 2.0),
        }
    }

    pub fn duration_ms(self, base_ms: Millis) -> Millis {
        let (_, _, _, duration) = self.scales();
        ((base_ms as f64 * duration).round() as Millis).max(1)
    }
}

/// Bonuses derived from participant count and campaign type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignBonuses {
    pub success_multiplier: f64,
    pub heat_reduction: f64,
    pub resource_bonus: f64,
}

/// Formula before type scaling:
/// - success_multiplier = 1 + count * 0.1
/// - heat_reduction = count * 0.05
/// - resource_bonus = count * 0.2
pub fn derive_bonuses(kind: CampaignType, count: usize) -> CampaignBonuses {
    let (success, heat, resource, _) = kind.scales();
    let n = count as f64;
    CampaignBonuses {
        success_multiplier: 1.0 + n * 0.1 * success,
        heat_reduction: (n * 0.05 * heat).min(MAX_HEAT_REDUCTION),
        resource_bonus: n * 0.2 * resource,
    }
}

/// A coordinated multi-target operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: CampaignId,
    pub kind: CampaignType,
    pub participants: Vec<TargetId>,
    pub started_at: Millis,
    pub duration_ms: Millis,
    pub elapsed_ms: Millis,
    pub bonuses: CampaignBonuses,
}

impl Campaign {
    pub fn is_finished(&self) -> bool {
        self.elapsed_ms >= self.duration_ms
    }

    /// Modifier id registered for one participant
    pub fn modifier_id(&self, target: &TargetId) -> ModifierId {
        ModifierId::new(format!("{}:{}", self.id, target))
    }

    /// Flat coordination reward, proportional to participant count
    ///
    /// Formula: data = 50 * count * (1 + resource_bonus), bandwidth = 10 * count
    pub fn completion_reward(&self) -> Resources {
        let n = self.participants.len() as f64;
        Resources::new()
            .with(ResourceKind::Data, (50.0 * n * (1.0 + self.bonuses.resource_bonus)).round())
            .with(ResourceKind::Bandwidth, 10.0 * n)
    }

    pub fn progress(&self) -> f64 {
        (self.elapsed_ms as f64 / self.duration_ms.max(1) as f64).min(1.0)
    }
}

/// Owner of the active campaigns
#[derive(Debug, Clone, Default)]
pub struct CampaignOrchestrator {
    active: BTreeMap<CampaignId, Campaign>,
}

impl CampaignOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Campaign currently enrolling `target`, if any
    pub fn campaign_for(&self, target: &TargetId) -> Option<&Campaign> {
        self.active.values().find(|c| c.participants.contains(target))
    }

    /// Every target enrolled in some active campaign
    pub fn enrolled(&self) -> BTreeSet<TargetId> {
        self.active
            .values()
            .flat_map(|c| c.participants.iter().cloned())
            .collect()
    }

    /// Heat reduction for charges against `target` (0 when not enrolled)
    pub fn heat_reduction_for(&self, target: &TargetId) -> f64 {
        self.campaign_for(target)
            .map(|c| c.bonuses.heat_reduction)
            .unwrap_or(0.0)
    }

    /// All-or-nothing membership check
    ///
    /// `is_available` answers whether a target is in the pool with its
    /// prerequisites met, `is_infiltrating` whether an attempt is running.
    pub fn validate_membership(
        &self,
        targets: &[TargetId],
        is_available: impl Fn(&TargetId) -> bool,
        is_infiltrating: impl Fn(&TargetId) -> bool,
    ) -> Result<()> {
        if targets.is_empty() {
            return Err(ExpansionError::InvalidCampaignMembership(
                "a campaign needs at least one target".into(),
            ));
        }

        let mut seen = BTreeSet::new();
        for id in targets {
            if !seen.insert(id) {
                return Err(ExpansionError::InvalidCampaignMembership(format!(
                    "target {} listed twice",
                    id
                )));
            }
            if !is_available(id) {
                return Err(ExpansionError::InvalidCampaignMembership(format!(
                    "target {} is not available",
                    id
                )));
            }
            if is_infiltrating(id) {
                return Err(ExpansionError::InvalidCampaignMembership(format!(
                    "target {} is already under infiltration",
                    id
                )));
            }
            if let Some(existing) = self.campaign_for(id) {
                return Err(ExpansionError::InvalidCampaignMembership(format!(
                    "target {} already belongs to {}",
                    id, existing.id
                )));
            }
        }
        Ok(())
    }

    pub fn begin(&mut self, campaign: Campaign) {
        debug_assert!(
            campaign
                .participants
                .iter()
                .all(|id| self.campaign_for(id).is_none()),
            "target enrolled in two campaigns"
        );
        self.active.insert(campaign.id.clone(), campaign);
    }

    /// Advance every campaign by `delta_ms` and pull out the finished ones
    pub fn tick(&mut self, delta_ms: Millis) -> Vec<Campaign> {
        let mut finished_ids = Vec::new();
        for (id, campaign) in self.active.iter_mut() {
            campaign.elapsed_ms = campaign.elapsed_ms.saturating_add(delta_ms);
            if campaign.is_finished() {
                finished_ids.push(id.clone());
            }
        }
        finished_ids
            .iter()
            .filter_map(|id| self.active.remove(id))
            .collect()
    }

    pub fn get(&self, id: &CampaignId) -> Option<&Campaign> {
        self.active.get(id)
    }

    pub fn active(&self) -> impl Iterator<Item = &Campaign> {
        self.active.values()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn snapshot(&self) -> BTreeMap<CampaignId, Campaign> {
        self.active.clone()
    }

    pub fn restore(active: BTreeMap<CampaignId, Campaign>) -> Self {
        Self { active }
    }
}
