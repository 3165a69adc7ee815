//! Expansion engine - the single controller owning all expansion state
//!
//! External code drives it through `update` once per frame plus a handful of
//! commands, and reads it through cloned projections. Nothing outside the
//! engine holds a live reference into its collections.
//!
//! `update` order is fixed:
//! infiltrations -> campaigns -> pool maintenance -> scale progression -> publish

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

use crate::core::config::EngineConfig;
use crate::core::error::{ExpansionError, Result};
use crate::core::types::{
    CampaignId, IdAllocator, Millis, ModifierId, ResourceKind, ScaleTier, TargetId,
};
use crate::expansion::campaign::{derive_bonuses, Campaign, CampaignOrchestrator, CampaignType};
use crate::expansion::events::EngineEvent;
use crate::expansion::generator::TargetCatalog;
use crate::expansion::infiltration::{
    refund_rate, roll_succeeds, FailureRecord, Infiltration, InfiltrationScheduler, RollSource,
    SeededRolls,
};
use crate::expansion::modifiers::{Modifier, ModifierRegistry, ModifierScope};
use crate::expansion::progression::{tier_unlocks, ScaleProgressInfo, ScaleProgression};
use crate::expansion::schedule::{DeferredAction, DeferredQueue};
use crate::expansion::success::{compute_attempt, AttemptInputs, AttemptParams};
use crate::expansion::target::{Effect, FailurePenalty, Target};
use crate::expansion::templates::TemplateCatalog;
use crate::host::{EventSink, HeatGateway, Host, PlayerState};

/// Ability that suppresses every heat increase
pub const HEAT_IMMUNITY: &str = "heat_immunity";

pub struct ExpansionEngine {
    pub(crate) config: EngineConfig,
    pub(crate) now: Millis,
    pub(crate) ids: IdAllocator,
    pub(crate) catalog: TargetCatalog,
    pub(crate) modifiers: ModifierRegistry,
    pub(crate) scheduler: InfiltrationScheduler,
    pub(crate) campaigns: CampaignOrchestrator,
    pub(crate) progression: ScaleProgression,
    pub(crate) deferred: DeferredQueue,
    pub(crate) controlled_systems: u64,
    pub(crate) completed_targets: Vec<TargetId>,
    pub(crate) unlocked_abilities: BTreeSet<String>,
    pub(crate) unlocked_resources: BTreeSet<ResourceKind>,
    pub(crate) refresh_timer: Millis,
    /// Forward jump requested by an `UnlockScale` effect, applied in the progression phase
    pending_jump: Option<ScaleTier>,
    rolls: Box<dyn RollSource>,
}

impl ExpansionEngine {
    /// Fresh engine with the built-in templates and a populated local pool
    pub fn new(config: EngineConfig) -> Self {
        Self::with_templates(config, TemplateCatalog::with_defaults())
    }

    /// Like `new`, but rejects an inconsistent config
    pub fn try_new(config: EngineConfig) -> Result<Self> {
        Self::try_with_templates(config, TemplateCatalog::with_defaults())
    }

    pub fn try_with_templates(config: EngineConfig, templates: TemplateCatalog) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_templates(config, templates))
    }

    /// Unchecked construction; configs from `EngineConfig::load` are already
    /// validated. Out-of-range pool settings are saturated rather than rejected.
    pub fn with_templates(config: EngineConfig, templates: TemplateCatalog) -> Self {
        let mut engine = Self::empty(config, templates, IdAllocator::new());
        engine
            .catalog
            .populate(ScaleTier::Local, &engine.config, &mut engine.ids);
        engine
    }

    /// Engine with no targets at all; the base for both construction and loading
    pub(
        crate) fn empty(config: EngineConfig,
        templates: TemplateCatalog,
        ids: IdAllocator,
    ) -> Self {
        // Mix in the id counter so a reloaded game doesn't replay the same rolls
        let stream = config.seed ^ ids.peek().rotate_left(32);
        Self {
            catalog: TargetCatalog::new(templates, ChaCha8Rng::seed_from_u64(stream)),
            rolls: Box::new(SeededRolls::new(stream.wrapping_add(1))),
            progression: ScaleProgression::new(&config),
            config,
            now: 0,
            ids,
            modifiers: ModifierRegistry::new(),
            scheduler: InfiltrationScheduler::new(),
            campaigns: CampaignOrchestrator::new(),
            deferred: DeferredQueue::new(),
            controlled_systems: 0,
            completed_targets: Vec::new(),
            unlocked_abilities: BTreeSet::new(),
            unlocked_resources: BTreeSet::new(),
            refresh_timer: 0,
            pending_jump: None,
        }
    }

    /// Replace the source of outcome rolls (replays, tests)
    pub fn with_roll_source(mut self, rolls: impl RollSource + 'static) -> Self {
        self.rolls = Box::new(rolls);
        self
    }

    pub fn set_roll_source(&mut self, rolls: impl RollSource + 'static) {
        self.rolls = Box::new(rolls);
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Advance the engine clock by `delta_ms` and run one full update
    ///
    /// Returns every event emitted during the update; each has also been
    /// published to the host.
    pub fn update<H: Host>(&mut self, host: &mut H, delta_ms: Millis) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        self.now = self.now.saturating_add(delta_ms);

        // 1. Infiltrations
        for infiltration in self.scheduler.tick(self.now) {
            let roll = self.rolls.roll();
            self.resolve(host, infiltration, roll, &mut events);
        }

        // 2. Campaigns
        for campaign in self.campaigns.tick(delta_ms) {
            self.complete_campaign(host, campaign, &mut events);
        }

        // 3. Pool maintenance
        self.run_deferred(host, &mut events);
        self.refresh_timer = self.refresh_timer.saturating_add(delta_ms);
        if self.refresh_timer >= self.config.refresh_interval_ms {
            self.refresh_timer = 0;
            self.refresh_pool(host, &mut events);
        }

        // 4. Scale progression
        self.check_progression(host, &mut events);

        // 5. Publish
        self.publish_state(host);

        events
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Begin an infiltration; resources are deducted immediately
    ///
    /// Every check runs before any side effect, so a rejected start changes
    /// nothing except publishing an `action.rejected` notification.
    pub fn start_infiltration<H: Host>(
        &mut self,
        host: &mut H,
        target_id: &TargetId,
    ) -> Result<Infiltration> {
        let target = match self.validate_start(host, target_id) {
            Ok(target) => target,
            Err(err) => {
                self.reject(host, "start_infiltration", &err);
                return Err(err);
            }
        };

        host.spend(&target.cost);
        let params = self.attempt_params(host.processing_power(), host.heat(), &target);
        let infiltration = Infiltration::new(
            target.id.clone(),
            self.now,
            params.duration_ms,
            params.success_chance,
            target.cost.clone(),
        );
        let began = self.scheduler.begin(infiltration.clone());
        debug_assert!(began.is_ok(), "validated start collided with an active attempt");

        let heat = target.difficulty as f64
            * self.config.start_heat_factor
            * self.config.heat_multiplier(target.scale);
        self.charge_heat(host, Some(&target.id), heat, "infiltration_start", Some(&target.name));

        tracing::debug!(
            "Infiltration started on {} (chance {:.2}, {} ms)",
            target.id,
            params.success_chance,
            params.duration_ms
        );
        host.publish(&EngineEvent::InfiltrationStarted {
            target: target.id.clone(),
            success_chance: params.success_chance,
            duration_ms: params.duration_ms,
        });
        Ok(infiltration)
    }

    fn validate_start<H: Host>(&self, host: &H, target_id: &TargetId) -> Result<Target> {
        let target = self
            .catalog
            .get(target_id)
            .ok_or_else(|| ExpansionError::target_not_found(target_id))?;

        if self.scheduler.is_active(target_id) {
            return Err(ExpansionError::AlreadyInProgress(target_id.clone()));
        }

        if let Some(reason) =
            target.unmet_requirement(host, self.controlled_systems, self.current_scale())
        {
            return Err(ExpansionError::RequirementsNotMet {
                target: target_id.clone(),
                reason,
            });
        }

        if !host.can_afford(&target.cost) {
            return Err(ExpansionError::InsufficientResources(target_id.clone()));
        }

        Ok(target.clone())
    }

    /// Abort an attempt and refund `1 - progress * slope` of what it cost
    ///
    /// Returns the refund rate used.
    pub fn cancel_infiltration<H: Host>(
        &mut self,
        host: &mut H,
        target_id: &TargetId,
    ) -> Result<f64> {
        let Some(mut infiltration) = self.scheduler.cancel(target_id) else {
            let err = ExpansionError::NotFound(format!("infiltration on {}", target_id));
            self.reject(host, "cancel_infiltration", &err);
            return Err(err);
        };

        infiltration.advance(self.now);
        let rate = refund_rate(infiltration.progress, self.config.cancel_refund_slope);
        host.add(&infiltration.cost_paid.scaled(rate));

        tracing::debug!("Infiltration on {} cancelled, refund rate {:.2}", target_id, rate);
        host.publish(&EngineEvent::InfiltrationCancelled {
            target: target_id.clone(),
            refund_rate: rate,
        });
        Ok(rate)
    }

    /// Enroll targets in a campaign; all-or-nothing
    pub fn start_campaign<H: Host>(
        &mut self,
        host: &mut H,
        kind: CampaignType,
        targets: &[TargetId],
    ) -> Result<CampaignId> {
        let validation = {
            let player: &dyn PlayerState = &*host;
            let tier = self.current_scale();
            self.campaigns.validate_membership(
                targets,
                |id| {
                    self.catalog.get(id).is_some_and(|t| {
                        t.unmet_requirement(player, self.controlled_systems, tier)
                            .is_none()
                    })
                },
                |id| self.scheduler.is_active(id),
            )
        };
        if let Err(err) = validation {
            self.reject(host, "start_campaign", &err);
            return Err(err);
        }

        let bonuses = derive_bonuses(kind, targets.len());
        let campaign = Campaign {
            id: self.ids.campaign_id(),
            kind,
            participants: targets.to_vec(),
            started_at: self.now,
            duration_ms: kind.duration_ms(self.config.campaign_base_duration_ms),
            elapsed_ms: 0,
            bonuses,
        };

        for target in &campaign.participants {
            self.modifiers.add(
                campaign.modifier_id(target),
                bonuses.success_multiplier,
                ModifierScope::Target(target.clone()),
                &campaign.id.0,
                Some(campaign.duration_ms),
                self.now,
            );
        }

        tracing::info!(
            "Campaign {} ({:?}) started with {} targets",
            campaign.id,
            kind,
            campaign.participants.len()
        );
        host.publish(&EngineEvent::CampaignStarted {
            campaign: campaign.id.clone(),
            kind,
            participants: campaign.participants.clone(),
        });

        let id = campaign.id.clone();
        self.campaigns.begin(campaign);
        Ok(id)
    }

    /// Generate a target from a special template (one-shot unless repeatable)
    pub fn unlock_special<H: Host>(&mut self, host: &mut H, template_id: &str) -> Option<Target> {
        let target = self
            .catalog
            .unlock_special(template_id, &self.config, &mut self.ids)?;
        host.publish(&EngineEvent::TargetsRefreshed {
            added: vec![target.id.clone()],
            removed: vec![],
        });
        Some(target)
    }

    /// Register a modifier on behalf of upgrades, construction or events
    pub fn add_modifier(
        &mut self,
        id: ModifierId,
        multiplier: f64,
        scope: ModifierScope,
        source: &str,
        duration_ms: Option<Millis>,
    ) {
        self.modifiers
            .add(id, multiplier, scope, source, duration_ms, self.now);
    }

    pub fn remove_modifier(&mut self, id: &ModifierId) -> Option<Modifier> {
        self.modifiers.remove(id)
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    fn resolve<H: Host>(
        &mut self,
        host: &mut H,
        infiltration: Infiltration,
        roll: f64,
        events: &mut Vec<EngineEvent>,
    ) {
        let Some(target) = self.catalog.remove(&infiltration.target_id) else {
            tracing::warn!(
                "Finished infiltration on {} has no target in the pool; dropping",
                infiltration.target_id
            );
            return;
        };

        let success = roll_succeeds(roll, infiltration.success_chance);
        let difficulty = target.difficulty as f64;
        tracing::debug!(
            "Resolving {}: roll {:.3} vs {:.3} -> {}",
            target.id,
            roll,
            infiltration.success_chance,
            if success { "success" } else { "failure" }
        );

        if success {
            host.add(&target.rewards);
            self.controlled_systems += target.systems_gained as u64;
            for effect in &target.unlocks {
                self.apply_effect(host, effect, events);
            }
            self.progression.record_completion(&target);
            self.charge_heat(
                host,
                Some(&target.id),
                difficulty * self.config.success_heat_factor,
                "infiltration_success",
                None,
            );
            self.completed_targets.push(target.id.clone());
        } else {
            let attempts =
                self.scheduler.record_failure(&target.id, target.retry_of.as_ref(), self.now);
            tracing::debug!("{} failed ({} attempts so far)", target.id, attempts);
            self.charge_heat(
                host,
                Some(&target.id),
                difficulty * self.config.failure_heat_factor,
                "infiltration_failure",
                Some(&target.name),
            );
            if let Some(penalty) = &target.failure_penalty {
                self.apply_failure_penalty(host, &target, penalty);
            }
            self.deferred.schedule(
                self.now.saturating_add(self.config.failure_cooldown_ms),
                DeferredAction::RetryTarget {
                    failed: target.clone(),
                },
            );
        }

        emit(
            host,
            events,
            EngineEvent::InfiltrationCompleted {
                target: target.id.clone(),
                success,
                systems_gained: if success { target.systems_gained } else { 0 },
            },
        );
    }

    fn apply_failure_penalty<H: Host>(
        &mut self,
        host: &mut H,
        target: &Target,
        penalty: &FailurePenalty,
    ) {
        if !penalty.resource_loss.is_empty() {
            host.spend(&penalty.resource_loss);
        }
        self.charge_heat(host, Some(&target.id), penalty.heat, "failure_penalty", None);
        if let Some(debuff) = &penalty.debuff {
            self.modifiers.add(
                ModifierId::new(format!("debuff:{}", target.id)),
                debuff.multiplier,
                ModifierScope::Types(vec![target.category.clone()]),
                "failure_penalty",
                Some(debuff.duration_ms),
                self.now,
            );
        }
    }

    fn apply_effect<H: Host>(
        &mut self,
        host: &mut H,
        effect: &Effect,
        events: &mut Vec<EngineEvent>,
    ) {
        match effect {
            Effect::Resources { amounts } => host.add(amounts),
            Effect::Heat { amount } => self.charge_heat(host, None, *amount, "target_effect", None),
            Effect::UnlockTargets { template, count } => {
                let mut added = Vec::new();
                for _ in 0..*count {
                    match self
                        .catalog
                        .unlock_special(template, &self.config, &mut self.ids)
                    {
                        Some(target) => added.push(target.id),
                        None => break,
                    }
                }
                if !added.is_empty() {
                    emit(host, events, EngineEvent::TargetsRefreshed { added, removed: vec![] });
                }
            }
            Effect::UnlockScale { tier } => {
                if *tier > self.current_scale() {
                    self.pending_jump = Some(self.pending_jump.map_or(*tier, |p| p.max(*tier)));
                }
            }
            Effect::UnlockAbility { ability } => {
                self.unlocked_abilities.insert(ability.clone());
            }
            Effect::UnlockResource { resource } => {
                self.unlocked_resources.insert(*resource);
            }
            Effect::Modifier {
                id,
                multiplier,
                target_types,
                duration_ms,
            } => {
                let scope = match target_types {
                    Some(types) => ModifierScope::Types(types.clone()),
                    None => ModifierScope::All,
                };
                self.modifiers.add(
                    ModifierId::new(id.clone()),
                    *multiplier,
                    scope,
                    "target_unlock",
                    *duration_ms,
                    self.now,
                );
            }
        }
    }

    /// Send a heat charge through the gateway
    ///
    /// Positive charges are scaled down by the campaign the target belongs to
    /// and suppressed entirely once heat immunity is unlocked.
    fn charge_heat<H: HeatGateway>(
        &self,
        host: &mut H,
        target: Option<&TargetId>,
        amount: f64,
        reason: &str,
        message: Option<&str>,
    ) {
        if amount == 0.0 || (amount > 0.0 && self.has_ability(HEAT_IMMUNITY)) {
            return;
        }
        let reduction = match target {
            Some(id) if amount > 0.0 => self.campaigns.heat_reduction_for(id),
            _ => 0.0,
        };
        host.add_heat(amount * (1.0 - reduction), reason, message);
    }

    fn complete_campaign<H: Host>(
        &mut self,
        host: &mut H,
        campaign: Campaign,
        events: &mut Vec<EngineEvent>,
    ) {
        self.modifiers.remove_by_source(&campaign.id.0);
        host.add(&campaign.completion_reward());
        tracing::info!(
            "Campaign {} complete, {} participants rewarded",
            campaign.id,
            campaign.participants.len()
        );
        emit(
            host,
            events,
            EngineEvent::CampaignCompleted {
                campaign: campaign.id,
                kind: campaign.kind,
                participants: campaign.participants.len(),
            },
        );
    }

    // ------------------------------------------------------------------
    // Pool maintenance and progression
    // ------------------------------------------------------------------

    fn run_deferred<H: EventSink>(&mut self, host: &mut H, events: &mut Vec<EngineEvent>) {
        let mut added = Vec::new();
        for action in self.deferred.drain_due(self.now) {
            match action {
                DeferredAction::RetryTarget { failed } => {
                    if failed.scale != self.current_scale() {
                        tracing::debug!(
                            "Dropping retry of {}; {} is no longer the current scale",
                            failed.id,
                            failed.scale
                        );
                        continue;
                    }
                    let id = self.ids.target_id(failed.scale);
                    let retry = failed.retry(id, self.config.retry_difficulty_delta);
                    tracing::debug!(
                        "Retry {} of {} available at difficulty {}",
                        retry.id,
                        failed.id,
                        retry.difficulty
                    );
                    added.push(retry.id.clone());
                    self.catalog.insert(retry);
                }
            }
        }
        if !added.is_empty() {
            emit(host, events, EngineEvent::TargetsRefreshed { added, removed: vec![] });
        }
    }

    fn refresh_pool<H: EventSink>(&mut self, host: &mut H, events: &mut Vec<EngineEvent>) {
        let protected = self.protected_targets();
        let tier = self.current_scale();
        let outcome = self
            .catalog
            .refresh(tier, &self.config, &mut self.ids, &protected);
        tracing::debug!(
            "Target refresh: {} added, {} removed",
            outcome.added.len(),
            outcome.removed.len()
        );
        emit(
            host,
            events,
            EngineEvent::TargetsRefreshed {
                added: outcome.added,
                removed: outcome.removed,
            },
        );
    }

    fn check_progression<H: Host>(&mut self, host: &mut H, events: &mut Vec<EngineEvent>) {
        let next = match (self.pending_jump.take(), self.progression.check_advance()) {
            (Some(jump), Some(step)) => Some(jump.max(step)),
            (jump, step) => jump.or(step),
        };
        if let Some(next) = next {
            self.advance_to(host, next, events);
        }
    }

    fn advance_to<H: Host>(
        &mut self,
        host: &mut H,
        next: ScaleTier,
        events: &mut Vec<EngineEvent>,
    ) {
        let from = self.current_scale();
        if !self.progression.advance(next) {
            return;
        }

        // Attempts and campaigns already underway keep their targets
        let keep = self.protected_targets();
        let (added, removed) = self
            .catalog
            .rebuild(next, &self.config, &mut self.ids, &keep);

        for tier in ScaleTier::ALL.into_iter().filter(|t| *t > from && *t <= next) {
            for effect in tier_unlocks(tier) {
                self.apply_effect(host, &effect, events);
            }
        }

        tracing::info!("Scale advanced {} -> {} ({})", from, next, next.reach_label());
        emit(
            host,
            events,
            EngineEvent::ScaleChanged {
                from,
                to: next,
                network_reach: next.reach_label().to_string(),
            },
        );
        emit(host, events, EngineEvent::TargetsRefreshed { added, removed });
    }

    fn protected_targets(&self) -> BTreeSet<TargetId> {
        let mut protected = self.campaigns.enrolled();
        protected.extend(self.scheduler.active_ids().cloned());
        protected
    }

    fn publish_state<H: Host>(&self, host: &mut H) {
        let available = self.available_targets(&*host);
        let updates = vec![
            ("expansion.currentScale".to_string(), to_json(&self.current_scale())),
            ("expansion.networkReach".to_string(), to_json(&self.network_reach())),
            ("expansion.controlledSystems".to_string(), to_json(&self.controlled_systems)),
            ("expansion.availableTargets".to_string(), to_json(&available)),
            ("expansion.activeInfiltrations".to_string(), to_json(&self.active_infiltrations())),
            ("expansion.activeCampaigns".to_string(), to_json(&self.active_campaigns())),
            ("expansion.scaleProgress".to_string(), to_json(&self.scale_progression_info())),
        ];
        host.batch_update(updates);
    }

    fn reject<H: EventSink>(&self, host: &mut H, action: &str, err: &ExpansionError) {
        tracing::debug!("Rejected {} ({}): {}", action, err.kind(), err);
        host.publish(&EngineEvent::ActionRejected {
            action: action.to_string(),
            reason: err.to_string(),
        });
    }

    fn attempt_params(
        &mut self,
        processing_power: f64,
        heat: f64,
        target: &Target,
    ) -> AttemptParams {
        let multiplier = self.modifiers.combined_multiplier(target, self.now);
        compute_attempt(
            target,
            AttemptInputs {
                processing_power,
                heat,
                modifier_multiplier: multiplier,
            },
            &self.config,
        )
    }

    // ------------------------------------------------------------------
    // Projections
    // ------------------------------------------------------------------

    /// Targets whose prerequisites are currently met, easiest first
    pub fn available_targets(&self, player: &dyn PlayerState) -> Vec<Target> {
        self.catalog
            .available(player, self.controlled_systems, self.current_scale())
    }

    pub fn active_infiltrations(&self) -> Vec<Infiltration> {
        self.scheduler.active().cloned().collect()
    }

    pub fn active_campaigns(&self) -> Vec<Campaign> {
        self.campaigns.active().cloned().collect()
    }

    pub fn scale_progression_info(&self) -> ScaleProgressInfo {
        self.progression.info()
    }

    /// Chance and duration an attempt would get right now, without starting it
    pub fn preview_attempt<H: Host>(
        &mut self,
        host: &H,
        target_id: &TargetId,
    ) -> Option<AttemptParams> {
        let target = self.catalog.get(target_id)?.clone();
        Some(self.attempt_params(host.processing_power(), host.heat(), &target))
    }

    pub fn target(&self, id: &TargetId) -> Option<Target> {
        self.catalog.get(id).cloned()
    }

    pub fn infiltration(&self, id: &TargetId) -> Option<Infiltration> {
        self.scheduler.get(id).cloned()
    }

    pub fn campaign(&self, id: &CampaignId) -> Option<Campaign> {
        self.campaigns.get(id).cloned()
    }

    pub fn modifier(&self, id: &ModifierId) -> Option<Modifier> {
        self.modifiers.get(id).cloned()
    }

    pub fn failure_record(&self, id: &TargetId) -> Option<FailureRecord> {
        self.scheduler.failure(id)
    }

    pub fn current_scale(&self) -> ScaleTier {
        self.progression.current()
    }

    pub fn network_reach(&self) -> &'static str {
        self.current_scale().reach_label()
    }

    pub fn controlled_systems(&self) -> u64 {
        self.controlled_systems
    }

    pub fn completed_targets(&self) -> &[TargetId] {
        &self.completed_targets
    }

    pub fn unlocked_abilities(&self) -> &BTreeSet<String> {
        &self.unlocked_abilities
    }

    pub fn has_ability(&self, ability: &str) -> bool {
        self.unlocked_abilities.contains(ability)
    }

    pub fn unlocked_resources(&self) -> &BTreeSet<ResourceKind> {
        &self.unlocked_resources
    }

    pub fn pool_size(&self) -> usize {
        self.catalog.len()
    }

    pub fn pending_retries(&self) -> usize {
        self.deferred.len()
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

fn emit<H: EventSink>(host: &mut H, events: &mut Vec<EngineEvent>, event: EngineEvent) {
    host.publish(&event);
    events.push(event);
}

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_default()
}
