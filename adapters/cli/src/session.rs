//! Headless driver that plays a scenario at a fixed frame rate.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};
use waypoint_defence_core::{Event, GameState, GameStatus, WaveStats};
use waypoint_defence_simulation::Simulation;

use crate::scenario::Scenario;

/// Length of one simulated frame at 60 Hz.
pub(crate) const FRAME: Duration = Duration::from_nanos(16_666_667);

/// Running totals of the events a session produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub(crate) struct Tally {
    pub(crate) towers_placed: u32,
    pub(crate) towers_rejected: u32,
    pub(crate) upgrades: u32,
    pub(crate) upgrades_rejected: u32,
    pub(crate) projectiles_fired: u32,
    pub(crate) enemies_spawned: u32,
    pub(crate) enemies_defeated: u32,
    pub(crate) enemies_leaked: u32,
}

impl Tally {
    fn record(&mut self, event: &Event) {
        let counter = match event {
            Event::TowerPlaced { .. } => &mut self.towers_placed,
            Event::TowerPlacementRejected { .. } => &mut self.towers_rejected,
            Event::TowerUpgraded { .. } => &mut self.upgrades,
            Event::TowerUpgradeRejected { .. } => &mut self.upgrades_rejected,
            Event::ProjectileFired { .. } => &mut self.projectiles_fired,
            Event::EnemySpawned { .. } => &mut self.enemies_spawned,
            Event::EnemyDefeated { .. } => &mut self.enemies_defeated,
            Event::EnemyLeaked { .. } => &mut self.enemies_leaked,
            _ => return,
        };
        *counter = counter.saturating_add(1);
    }
}

/// Final report of a headless session.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct Summary {
    pub(crate) seed: u64,
    pub(crate) outcome: GameStatus,
    pub(crate) ticks: u64,
    pub(crate) simulated_secs: f64,
    pub(crate) economy: GameState,
    pub(crate) wave: WaveStats,
    pub(crate) tally: Tally,
}

/// Plays `scenario` until the session finishes or `max_ticks` frames elapse.
///
/// Before each wave is requested, the towers scheduled for it are built and
/// upgraded in file order.
pub(crate) fn run(scenario: &Scenario, max_ticks: u64) -> Result<Summary> {
    let mut simulation = Simulation::new(scenario.simulation.clone())
        .context("scenario describes an invalid session")?;
    let mut tally = Tally::default();
    let mut prepared_for = 0;
    let mut ticks = 0;

    while ticks < max_ticks && !simulation.status().is_finished() {
        let next = simulation.economy().wave().saturating_add(1);
        if simulation.status() == GameStatus::Preparing
            && simulation.preparation_remaining().is_none()
            && next > prepared_for
        {
            build_towers(&mut simulation, scenario, next);
            prepared_for = next;
            if simulation.request_start_wave() {
                info!(wave = next, "wave requested");
            }
        }

        for event in simulation.tick(FRAME) {
            tally.record(event);
        }
        ticks += 1;
    }

    if !simulation.status().is_finished() {
        warn!(max_ticks, "session still running when the tick limit was reached");
    }

    let economy = simulation.economy();
    Ok(Summary {
        seed: scenario.simulation.seed,
        outcome: economy.status(),
        ticks,
        simulated_secs: FRAME.as_secs_f64() * ticks as f64,
        economy,
        wave: simulation.wave_stats(),
        tally,
    })
}

fn build_towers(simulation: &mut Simulation, scenario: &Scenario, wave: u32) {
    for plan in scenario.towers.iter().filter(|plan| plan.before_wave == wave) {
        let Some(tower) = simulation.place_tower(plan.position(), plan.kind) else {
            warn!(kind = ?plan.kind, x = plan.x, y = plan.y, wave, "tower placement failed");
            continue;
        };
        debug!(?tower, kind = ?plan.kind, wave, "tower built");

        for path in &plan.upgrades {
            if !simulation.request_upgrade(tower, *path) {
                warn!(?tower, ?path, "tower upgrade failed");
            }
        }
    }
}
