pub mod config;
pub mod error;
pub mod types;

pub use config::EngineConfig;
pub use error::{ExpansionError, Result};
pub use types::{
    CampaignId, IdAllocator, Millis, ModifierId, ResourceKind, Resources, ScaleTier, TargetId,
};
