#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Waypoint Defence scenarios headlessly.

mod scenario;
mod session;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::{
    scenario::{parse_scenario, Scenario},
    session::Summary,
};

const DEFAULT_SCENARIO: &str = include_str!("../scenarios/gauntlet.toml");

#[derive(Debug, Parser)]
#[command(name = "waypoint-defence")]
#[command(about = "Run a Waypoint Defence scenario without a renderer")]
struct Args {
    /// Scenario file to play; the bundled gauntlet is used when omitted
    #[arg(long)]
    scenario: Option<PathBuf>,
    /// Overrides the scenario seed
    #[arg(long)]
    seed: Option<u64>,
    /// Overrides the number of waves required for victory
    #[arg(long)]
    waves: Option<u32>,
    /// Upper bound on simulated frames at 60 Hz
    #[arg(long, default_value_t = 60 * 60 * 60)]
    max_ticks: u64,
    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

/// Entry point for the Waypoint Defence command-line interface.
fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut scenario = match &args.scenario {
        Some(path) => Scenario::from_path(path)?,
        None => parse_scenario(DEFAULT_SCENARIO).context("bundled scenario is invalid")?,
    };
    if let Some(seed) = args.seed {
        scenario.simulation.seed = seed;
    }
    if let Some(waves) = args.waves {
        scenario.simulation.max_waves = waves;
    }

    let summary = session::run(&scenario, args.max_ticks)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &Summary) {
    let economy = &summary.economy;
    let tally = &summary.tally;
    println!("=== WAYPOINT DEFENCE ===");
    println!("  Seed:      0x{:x}", summary.seed);
    println!("  Outcome:   {:?}", summary.outcome);
    println!(
        "  Frames:    {} ({:.1}s simulated)",
        summary.ticks, summary.simulated_secs
    );
    println!("  Wave:      {}", summary.wave.current_wave_index);
    println!("  Gold:      {}", economy.gold());
    println!("  Lives:     {}", economy.lives());
    println!("  Score:     {}", economy.score());
    println!(
        "  Towers:    {} built, {} rejected, {} upgrades ({} rejected)",
        tally.towers_placed, tally.towers_rejected, tally.upgrades, tally.upgrades_rejected
    );
    println!(
        "  Enemies:   {} spawned, {} defeated, {} leaked",
        tally.enemies_spawned, tally.enemies_defeated, tally.enemies_leaked
    );
    println!("  Shots:     {}", tally.projectiles_fired);
}
