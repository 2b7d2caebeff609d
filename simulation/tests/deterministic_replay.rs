use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};

use waypoint_defence_core::{EntitySnapshot, Event, TowerKind, UpgradePath, Vec2, WaveStats};
use waypoint_defence_simulation::{Simulation, SimulationConfig};

const FRAME: Duration = Duration::from_millis(16);

#[test]
fn deterministic_replay_produces_identical_sessions() {
    let first = replay(config());
    let second = replay(config());

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.fingerprint(), second.fingerprint());

    let fired = first
        .events
        .iter()
        .filter(|event| matches!(event, Event::ProjectileFired { .. }))
        .count();
    assert!(fired > 0, "scripted towers must engage the first wave");
    assert!(first.events.contains(&Event::WaveStarted { wave: 2 }));
}

#[test]
fn different_seeds_diverge() {
    let first = replay(config());
    let second = replay(SimulationConfig {
        seed: 0xdead_beef,
        ..config()
    });

    assert_ne!(first.fingerprint(), second.fingerprint());
}

fn config() -> SimulationConfig {
    SimulationConfig {
        starting_gold: 600,
        ..SimulationConfig::default()
    }
}

fn replay(config: SimulationConfig) -> ReplayOutcome {
    let mut simulation = Simulation::new(config).expect("valid config");
    let mut events = Vec::new();

    for (x, y, kind) in [
        (100.0, 260.0, TowerKind::Archer),
        (180.0, 340.0, TowerKind::Cannon),
        (260.0, 220.0, TowerKind::Sniper),
    ] {
        assert!(simulation.request_place_tower(Vec2::new(x, y), kind));
    }

    for wave in 1..=2 {
        assert!(simulation.request_start_wave(), "wave {wave} should start");
        for frame in 0..3_000 {
            events.extend_from_slice(simulation.tick(FRAME));
            if frame == 600 && wave == 1 {
                let towers: Vec<_> = events
                    .iter()
                    .filter_map(|event| match event {
                        Event::TowerPlaced { tower, .. } => Some(*tower),
                        _ => None,
                    })
                    .collect();
                for tower in towers {
                    let _ = simulation.request_upgrade(tower, UpgradePath::First);
                }
            }
            if simulation.wave_stats().enemies_remaining == 0
                && simulation.preparation_remaining().is_none()
            {
                break;
            }
        }
    }

    let snapshot = simulation.snapshot();
    ReplayOutcome {
        events,
        entities: snapshot.entities,
        wave: snapshot.wave,
        gold: snapshot.economy.gold(),
        lives: snapshot.economy.lives(),
        score: snapshot.economy.score(),
    }
}

#[derive(Debug, PartialEq)]
struct ReplayOutcome {
    events: Vec<Event>,
    entities: Vec<EntitySnapshot>,
    wave: WaveStats,
    gold: u32,
    lives: u32,
    score: u64,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        format!("{:?}", self.events).hash(&mut hasher);
        self.wave.hash(&mut hasher);
        self.gold.hash(&mut hasher);
        self.lives.hash(&mut hasher);
        self.score.hash(&mut hasher);
        hasher.finish()
    }
}
