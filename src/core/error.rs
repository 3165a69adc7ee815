use thiserror::Error;

use crate::core::types::TargetId;

/// Reasons a command against the engine can be refused, plus the boundary
/// failures of config and save-state handling.
#[derive(Error, Debug)]
pub enum ExpansionError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Infiltration already in progress for target {0}")]
    AlreadyInProgress(TargetId),

    #[error("Requirements not met for target {target}: {reason}")]
    RequirementsNotMet { target: TargetId, reason: String },

    #[error("Insufficient resources to infiltrate {0}")]
    InsufficientResources(TargetId),

    #[error("Invalid campaign membership: {0}")]
    InvalidCampaignMembership(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ExpansionError {
    pub fn target_not_found(id: &TargetId) -> Self {
        Self::NotFound(format!("target {}", id))
    }

    /// Short machine-readable tag used in rejection notifications
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::AlreadyInProgress(_) => "already_in_progress",
            Self::RequirementsNotMet { .. } => "requirements_not_met",
            Self::InsufficientResources(_) => "insufficient_resources",
            Self::InvalidCampaignMembership(_) => "invalid_campaign_membership",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
        }
    }
}

pub type Result<T> = std::result::Result<T, ExpansionError>;
