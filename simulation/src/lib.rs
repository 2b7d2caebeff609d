#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tick orchestration for Waypoint Defence sessions.
//!
//! A [`Simulation`] owns the authoritative world together with every pure
//! system. Each call to [`Simulation::tick`] advances the world, feeds the
//! resulting events and snapshots to the systems, applies the commands they
//! emit and then runs the wave lifecycle. Host requests made between ticks
//! are applied immediately; their events are reported with the next tick.

mod config;

use std::time::Duration;

use tracing::{debug, info};
use waypoint_defence_core::{
    Command, EntityId, EntitySnapshot, Event, GameState, GameStatus, TileSnapshot, TowerKind,
    TowerTarget, UpgradePath, Vec2, Wave, WaveStats,
};
use waypoint_defence_system_builder::{Builder, BuilderInput, PlacementPreview, TileProbe};
use waypoint_defence_system_spawning::{self as spawning, Spawning};
use waypoint_defence_system_tower_combat::TowerCombat;
use waypoint_defence_system_tower_targeting::TowerTargeting;
use waypoint_defence_system_wave_generation::WaveGeneration;
use waypoint_defence_world::{self as world, query, World};

pub use config::{ConfigError, SimulationConfig, MAX_TILES};

/// Read-only capture of a session after a tick.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationSnapshot {
    /// Every active entity in identifier order.
    pub entities: Vec<EntitySnapshot>,
    /// Every tile in row-major order.
    pub tiles: Vec<TileSnapshot>,
    /// Gold, lives, score, wave index and status.
    pub economy: GameState,
    /// Progress of the wave in flight.
    pub wave: WaveStats,
    /// Simulation time since the last restart.
    pub clock: Duration,
}

#[derive(Clone, Debug)]
struct Countdown {
    remaining: Duration,
    wave: Wave,
}

/// Single-threaded driver of a Waypoint Defence session.
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    world: World,
    targeting: TowerTargeting,
    combat: TowerCombat,
    waves: WaveGeneration,
    spawning: Spawning,
    builder: Builder,
    targets: Vec<TowerTarget>,
    commands: Vec<Command>,
    outbox: Vec<Event>,
    events: Vec<Event>,
    countdown: Option<Countdown>,
    wave_in_flight: bool,
    paused_from: Option<GameStatus>,
}

impl Simulation {
    /// Validates `config` and builds a session in the preparing status.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut simulation = Self {
            world: World::new(),
            targeting: TowerTargeting::new(),
            combat: TowerCombat::new(config.seed),
            waves: WaveGeneration::new(config.seed),
            spawning: Spawning::new(spawning::Config::new(config.spawn_interval())),
            builder: Builder::new(),
            targets: Vec::new(),
            commands: Vec::new(),
            outbox: Vec::new(),
            events: Vec::new(),
            countdown: None,
            wave_in_flight: false,
            paused_from: None,
            config,
        };

        let _ = simulation.execute(Command::ConfigureTileGrid {
            viewport: simulation.config.viewport(),
            columns: simulation.config.columns,
            tile_length: simulation.config.tile_length,
        });
        let _ = simulation.execute(Command::ConfigurePath {
            waypoints: simulation.config.waypoints.clone(),
        });
        let _ = simulation.execute(Command::Reset {
            gold: simulation.config.starting_gold,
            lives: simulation.config.starting_lives,
        });

        info!(
            seed = simulation.config.seed,
            max_waves = simulation.config.max_waves,
            "simulation ready"
        );
        Ok(simulation)
    }

    /// Advances the session by `dt` and returns every event emitted since the
    /// previous tick, including those caused by host requests.
    ///
    /// Paused and finished sessions only flush pending request events.
    pub fn tick(&mut self, dt: Duration) -> &[Event] {
        self.events.clear();

        if matches!(self.status(), GameStatus::Preparing | GameStatus::Playing) {
            let _ = self.execute(Command::Tick { dt });
            self.run_systems();
            self.advance_countdown(dt);
            self.finish_cleared_wave();
        }

        self.events.append(&mut self.outbox);
        &self.events
    }

    /// Events returned by the most recent [`Simulation::tick`].
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Attempts to construct a tower at `position`.
    ///
    /// Rejections leave the session untouched and are reported as
    /// [`Event::TowerPlacementRejected`].
    pub fn request_place_tower(&mut self, position: Vec2, kind: TowerKind) -> bool {
        self.place_tower(position, kind).is_some()
    }

    /// Same as [`Simulation::request_place_tower`] but reports the new tower's identifier.
    pub fn place_tower(&mut self, position: Vec2, kind: TowerKind) -> Option<EntityId> {
        self.execute(Command::PlaceTower { kind, position })
            .iter()
            .find_map(|event| match event {
                Event::TowerPlaced { tower, .. } => Some(*tower),
                _ => None,
            })
    }

    /// Attempts to raise `tower` one level along `path`.
    pub fn request_upgrade(&mut self, tower: EntityId, path: UpgradePath) -> bool {
        self.execute(Command::UpgradeTower { tower, path })
            .iter()
            .any(|event| matches!(event, Event::TowerUpgraded { .. }))
    }

    /// Generates the next wave and starts its preparation countdown.
    ///
    /// Only succeeds while preparing with no wave in flight or counting down.
    pub fn request_start_wave(&mut self) -> bool {
        if self.status() != GameStatus::Preparing
            || self.wave_in_flight
            || self.countdown.is_some()
        {
            debug!(status = ?self.status(), "wave start rejected");
            return false;
        }

        let index = self.economy().wave().saturating_add(1);
        let wave = self.waves.generate(index);
        let preparation = self.config.preparation_time();
        if preparation.is_zero() {
            self.launch(wave);
            return true;
        }

        let _ = self.execute(Command::SetPreparationBlock { active: true });
        info!(
            wave = index,
            enemies = wave.enemies.len(),
            countdown_ms = self.config.preparation_ms,
            "wave countdown started"
        );
        self.countdown = Some(Countdown {
            remaining: preparation,
            wave,
        });
        true
    }

    /// Suspends or resumes ticking.
    ///
    /// Pausing is only possible while preparing or playing; resuming restores
    /// the status held before the pause without catching up on lost time.
    pub fn set_paused(&mut self, paused: bool) {
        if paused {
            let status = self.status();
            if !matches!(status, GameStatus::Preparing | GameStatus::Playing) {
                return;
            }
            self.paused_from = Some(status);
            let _ = self.execute(Command::SetStatus {
                status: GameStatus::Paused,
            });
        } else if let Some(status) = self.paused_from.take() {
            let _ = self.execute(Command::SetStatus { status });
        }
    }

    /// Updates the drag preview for `kind` under the cursor at `position`.
    pub fn hover(&mut self, position: Vec2, kind: TowerKind) -> Option<PlacementPreview> {
        self.drive_builder(BuilderInput {
            confirm_action: false,
            cursor: Some(position),
            kind: Some(kind),
        });
        self.builder.preview()
    }

    /// Drops a dragged `kind` at `position`.
    ///
    /// Placement only goes ahead when the preview at `position` is
    /// placeable; otherwise nothing changes and no rejection is reported.
    pub fn confirm_placement(&mut self, position: Vec2, kind: TowerKind) -> bool {
        let start = self.outbox.len();
        self.drive_builder(BuilderInput {
            confirm_action: true,
            cursor: Some(position),
            kind: Some(kind),
        });
        self.outbox[start..]
            .iter()
            .any(|event| matches!(event, Event::TowerPlaced { .. }))
    }

    /// Ends the drag preview and clears its highlight.
    pub fn cancel_hover(&mut self) {
        self.drive_builder(BuilderInput::default());
    }

    /// Tears the session down and starts over with the configured economy.
    pub fn restart(&mut self) {
        self.countdown = None;
        self.wave_in_flight = false;
        self.paused_from = None;
        self.targets.clear();
        self.spawning.clear();
        self.builder.reset();
        self.combat = TowerCombat::new(self.config.seed);

        let _ = self.execute(Command::Reset {
            gold: self.config.starting_gold,
            lives: self.config.starting_lives,
        });
        info!("simulation restarted");
    }

    /// Spends `amount` gold if the balance allows it.
    pub fn spend_gold(&mut self, amount: u32) -> bool {
        !self
            .execute(Command::SpendGold { amount })
            .iter()
            .any(|event| matches!(event, Event::GoldSpendRejected { .. }))
    }

    /// Reports whether the balance covers `amount`.
    #[must_use]
    pub fn can_afford(&self, amount: u32) -> bool {
        self.economy().can_afford(amount)
    }

    /// Current economy snapshot.
    #[must_use]
    pub fn economy(&self) -> GameState {
        query::economy(&self.world)
    }

    /// Current lifecycle status.
    #[must_use]
    pub fn status(&self) -> GameStatus {
        self.economy().status()
    }

    /// Index of the current wave and enemies still queued or alive.
    #[must_use]
    pub fn wave_stats(&self) -> WaveStats {
        WaveStats {
            current_wave_index: self.economy().wave(),
            enemies_remaining: self.spawning.pending().len() + query::enemy_count(&self.world),
        }
    }

    /// Time left before the pending wave starts, if one is counting down.
    #[must_use]
    pub fn preparation_remaining(&self) -> Option<Duration> {
        self.countdown.as_ref().map(|countdown| countdown.remaining)
    }

    /// Captures entities, tiles, economy and wave progress.
    #[must_use]
    pub fn snapshot(&self) -> SimulationSnapshot {
        SimulationSnapshot {
            entities: query::entity_snapshots(&self.world),
            tiles: query::tile_grid(&self.world).snapshots(),
            economy: self.economy(),
            wave: self.wave_stats(),
            clock: query::clock(&self.world),
        }
    }

    /// Read-only access to the underlying world for queries.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Configuration the session was built from.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    fn execute(&mut self, command: Command) -> &[Event] {
        let start = self.outbox.len();
        world::apply(&mut self.world, command, &mut self.outbox);
        &self.outbox[start..]
    }

    fn run_systems(&mut self) {
        let status = self.status();
        self.spawning
            .handle(&self.outbox, status, &mut self.commands);

        let towers = query::tower_view(&self.world);
        let enemies = query::enemy_view(&self.world);
        self.targeting
            .handle(status, &towers, &enemies, &mut self.targets);
        self.combat.handle(
            status,
            query::clock(&self.world),
            &towers,
            &self.targets,
            &mut self.commands,
        );

        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.outbox);
        }
    }

    fn drive_builder(&mut self, input: BuilderInput) {
        let economy = query::economy(&self.world);
        let grid = query::tile_grid(&self.world);
        self.builder.handle(
            economy,
            input,
            |point| {
                let tile = grid.world_to_tile(point)?;
                Some(TileProbe {
                    tile,
                    placeable: grid.can_place(tile),
                })
            },
            &mut self.commands,
        );

        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.outbox);
        }
    }

    fn advance_countdown(&mut self, dt: Duration) {
        if self.status() != GameStatus::Preparing {
            return;
        }
        let Some(countdown) = self.countdown.as_mut() else {
            return;
        };
        countdown.remaining = countdown.remaining.saturating_sub(dt);
        if !countdown.remaining.is_zero() {
            return;
        }
        if let Some(countdown) = self.countdown.take() {
            self.launch(countdown.wave);
        }
    }

    fn launch(&mut self, wave: Wave) {
        let index = wave.index;
        let _ = self.execute(Command::SetPreparationBlock { active: false });
        let _ = self.execute(Command::SetStatus {
            status: GameStatus::Playing,
        });
        let _ = self.execute(Command::BeginWave { wave: index });
        info!(wave = index, enemies = wave.enemies.len(), "wave launched");
        self.spawning.begin_wave(wave);
        self.wave_in_flight = true;
    }

    fn finish_cleared_wave(&mut self) {
        if !self.wave_in_flight || self.status() != GameStatus::Playing {
            return;
        }
        if self.wave_stats().enemies_remaining > 0 {
            return;
        }

        self.wave_in_flight = false;
        let wave = self.economy().wave();
        let bonus = wave.saturating_mul(5).saturating_add(10);
        let _ = self.execute(Command::AwardGold { amount: bonus });

        let status = if wave >= self.config.max_waves {
            GameStatus::Victory
        } else {
            GameStatus::Preparing
        };
        let _ = self.execute(Command::SetStatus { status });
        info!(wave, bonus, ?status, "wave cleared");
    }
}
