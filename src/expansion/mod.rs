//! Expansion & infiltration - targets, attempts, campaigns and scale tiers
//!
//! `ExpansionEngine` owns everything here; the other modules are its parts.

pub mod campaign;
pub mod engine;
pub mod events;
pub mod generator;
pub mod infiltration;
pub mod modifiers;
pub mod persistence;
pub mod progression;
pub mod schedule;
pub mod success;
pub mod target;
pub mod templates;

pub use campaign::{Campaign, CampaignBonuses, CampaignType};
pub use engine::ExpansionEngine;
pub use events::EngineEvent;
pub use infiltration::{FailureRecord, Infiltration, RollSource, ScriptedRolls, SeededRolls};
pub use modifiers::{Modifier, ModifierScope};
pub use persistence::{SaveState, SavedInfiltration};
pub use progression::ScaleProgressInfo;
pub use success::AttemptParams;
pub use target::{Effect, Requirements, Target};
pub use templates::{TargetTemplate, TemplateCatalog};
