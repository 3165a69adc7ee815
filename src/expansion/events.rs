//! Notifications emitted by the expansion engine

use serde::{Deserialize, Serialize};

use crate::core::types::{CampaignId, ScaleTier, TargetId};
use crate::expansion::campaign::CampaignType;

/// Events generated during engine commands and `update`
///
/// Each event is published to the host's `EventSink` and also returned from
/// `ExpansionEngine::update` so the caller can react without subscribing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    InfiltrationStarted {
        target: TargetId,
        success_chance: f64,
        duration_ms: u64,
    },
    InfiltrationCompleted {
        target: TargetId,
        success: bool,
        systems_gained: u32,
    },
    InfiltrationCancelled {
        target: TargetId,
        /// Fraction of the cost returned
        refund_rate: f64,
    },
    ScaleChanged {
        from: ScaleTier,
        to: ScaleTier,
        network_reach: String,
    },
    CampaignStarted {
        campaign: CampaignId,
        kind: CampaignType,
        participants: Vec<TargetId>,
    },
    CampaignCompleted {
        campaign: CampaignId,
        kind: CampaignType,
        participants: usize,
    },
    TargetsRefreshed {
        added: Vec<TargetId>,
        removed: Vec<TargetId>,
    },
    /// A command was refused; no state changed
    ActionRejected {
        action: String,
        reason: String,
    },
}

impl EngineEvent {
    /// Bus topic name for this notification
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::InfiltrationStarted { .. } => "infiltration.started",
            EngineEvent::InfiltrationCompleted { .. } => "infiltration.completed",
            EngineEvent::InfiltrationCancelled { .. } => "infiltration.cancelled",
            EngineEvent::ScaleChanged { .. } => "scale.changed",
            EngineEvent::CampaignStarted { .. } => "campaign.started",
            EngineEvent::CampaignCompleted { .. } => "campaign.completed",
            EngineEvent::TargetsRefreshed { .. } => "targets.refreshed",
            EngineEvent::ActionRejected { .. } => "action.rejected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        let e = EngineEvent::InfiltrationCompleted {
            target: TargetId::from("local-000001"),
            success: true,
            systems_gained: 1,
        };
        assert_eq!(e.name(), "infiltration.completed");

        let e = EngineEvent::TargetsRefreshed { added: vec![], removed: vec![] };
        assert_eq!(e.name(), "targets.refreshed");
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let e = EngineEvent::ScaleChanged {
            from: ScaleTier::Local,
            to: ScaleTier::Corporate,
            network_reach: "Corporate Networks".into(),
        };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["event"], "scale_changed");
        assert_eq!(json["to"], "corporate");
    }
}
