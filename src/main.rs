//! Net Reach - headless expansion run
//!
//! Drives the engine against an in-memory host with a greedy autopilot and
//! prints a progression summary. Useful for balancing the tier tables.

use clap::Parser;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use net_reach::core::types::{Millis, ResourceKind, Resources, TargetId};
use net_reach::expansion::{CampaignType, TemplateCatalog};
use net_reach::host::{HeatGateway, ResourceGateway};
use net_reach::{EngineConfig, ExpansionEngine, Result, SandboxHost};

/// Headless expansion run with a greedy autopilot
#[derive(Parser, Debug)]
#[command(name = "net-reach")]
#[command(about = "Run the expansion engine headless and print a progression summary")]
struct Args {
    /// Random seed for generation and outcome rolls
    #[arg(long)]
    seed: Option<u64>,

    /// Number of update ticks to run
    #[arg(long, default_value_t = 5_000)]
    ticks: u64,

    /// Simulated milliseconds per tick
    #[arg(long, default_value_t = 1_000)]
    tick_ms: Millis,

    /// Engine tuning file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the final state here (JSON)
    #[arg(long)]
    save: Option<PathBuf>,

    /// Resume from a saved state (JSON)
    #[arg(long)]
    load: Option<PathBuf>,

    /// Infiltrations the autopilot keeps running at once
    #[arg(long, default_value_t = 3)]
    parallel: usize,
}

/// Autopilot stops starting attempts above this heat
const HEAT_CEILING: f64 = 75.0;
/// Heat shed per simulated second
const HEAT_DECAY_PER_SEC: f64 = 0.5;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("net_reach=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let templates = TemplateCatalog::with_defaults();
    let mut engine = match &args.load {
        Some(path) => {
            let json = std::fs::read_to_string(path)?;
            ExpansionEngine::from_json(config, templates, &json)
        }
        None => ExpansionEngine::try_with_templates(config, templates)?,
    };
    tracing::info!(
        "Net Reach starting at {} with {} targets",
        engine.current_scale(),
        engine.pool_size()
    );

    let mut host = SandboxHost::new()
        .with_resource(ResourceKind::Data, 500.0)
        .with_resource(ResourceKind::ProcessingPower, 10.0)
        .with_resource(ResourceKind::Bandwidth, 100.0);

    for _ in 0..args.ticks {
        collect_income(&engine, &mut host, args.tick_ms);
        autopilot(&mut engine, &mut host, args.parallel);
        engine.update(&mut host, args.tick_ms);
    }

    print_summary(&engine, &host);

    if let Some(path) = &args.save {
        std::fs::write(path, engine.to_json()?)?;
        tracing::info!("Saved state to {}", path.display());
    }

    Ok(())
}

/// Passive income and heat decay, scaled by controlled systems
fn collect_income(engine: &ExpansionEngine, host: &mut SandboxHost, tick_ms: Millis) {
    let secs = tick_ms as f64 / 1000.0;
    let systems = engine.controlled_systems() as f64;

    host.add(
        &Resources::new()
            .with(ResourceKind::Data, (5.0 + systems) * secs)
            .with(ResourceKind::Bandwidth, (1.0 + systems * 0.1) * secs),
    );
    host.set_resource(ResourceKind::ProcessingPower, 10.0 + systems * 2.0);
    for kind in engine.unlocked_resources() {
        host.add(&Resources::new().with(*kind, systems * 0.05 * secs));
    }

    let heat = host.heat();
    host.set_heat(heat - HEAT_DECAY_PER_SEC * secs);
}

/// Greedy policy: keep a campaign running and fill free slots with the
/// cheapest affordable targets
fn autopilot(engine: &mut ExpansionEngine, host: &mut SandboxHost, parallel: usize) {
    let running: BTreeSet<TargetId> = engine
        .active_infiltrations()
        .into_iter()
        .map(|i| i.target_id)
        .collect();
    let idle: Vec<TargetId> = engine
        .available_targets(&*host)
        .into_iter()
        .map(|t| t.id)
        .filter(|id| !running.contains(id))
        .collect();

    if engine.active_campaigns().is_empty() && idle.len() >= 3 {
        let kind = if host.heat() > HEAT_CEILING / 2.0 {
            CampaignType::Stealth
        } else {
            CampaignType::Coordinated
        };
        // Rejections are published as events; nothing to do here
        let _ = engine.start_campaign(host, kind, &idle[..3]);
    }

    let mut slots = parallel.saturating_sub(running.len());
    for id in idle {
        if slots == 0 || host.heat() > HEAT_CEILING {
            break;
        }
        let affordable = engine
            .target(&id)
            .is_some_and(|t| host.can_afford(&t.cost));
        if affordable && engine.start_infiltration(host, &id).is_ok() {
            slots -= 1;
        }
    }
}

fn print_summary(engine: &ExpansionEngine, host: &SandboxHost) {
    let progress = engine.scale_progression_info();

    println!();
    println!("=== NET REACH ===");
    println!("Simulated time:     {:.1} min", engine.now() as f64 / 60_000.0);
    println!("Scale:              {} ({})", engine.current_scale(), engine.network_reach());
    println!(
        "Tier progress:      {}/{} ({:.0}%)",
        progress.completed, progress.required, progress.percentage
    );
    println!("Controlled systems: {}", engine.controlled_systems());
    println!("Targets taken:      {}", engine.completed_targets().len());
    println!("Pool size:          {}", engine.pool_size());
    println!("Pending retries:    {}", engine.pending_retries());
    println!("Heat:               {:.1}", host.heat());
    println!("Events published:   {}", host.events.len());
    if !engine.unlocked_abilities().is_empty() {
        let abilities: Vec<&str> = engine.unlocked_abilities().iter().map(|a| a.as_str()).collect();
        println!("Abilities:          {}", abilities.join(", "));
    }
    println!();
    println!("Resources:");
    for kind in [
        ResourceKind::Data,
        ResourceKind::ProcessingPower,
        ResourceKind::Bandwidth,
        ResourceKind::Crypto,
        ResourceKind::Energy,
        ResourceKind::Matter,
    ] {
        let amount = host.resource(kind);
        if amount > 0.0 {
            println!("  {:<18} {:.0}", format!("{:?}", kind), amount);
        }
    }
}
