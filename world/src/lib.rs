#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Waypoint Defence.
//!
//! The world owns the tile grid, the entity registry and the economy
//! snapshot. It mutates only through [`apply`] and reports every observable
//! change as an [`Event`].

mod enemies;
mod entity;
mod projectiles;
mod registry;
mod tiles;
mod towers;

use std::time::Duration;

use tracing::{debug, info, trace};
use waypoint_defence_core::{
    mitigate, Command, EnemyKind, EntityId, Event, GameState, GameStatus, PlacementError,
    TileCoord, TowerKind, UpgradeError, UpgradeLevel, UpgradePath, Vec2,
};

pub use tiles::TileGrid;

use enemies::EnemyState;
use entity::{EntityState, Signal, TickContext};
use projectiles::{Payload, ProjectileState};
use registry::EntityRegistry;
use towers::TowerState;

/// Fraction of a tile kept clear on each side of the enemy path.
const PATH_CLEARANCE: f32 = 0.75;

/// Radius, in tiles, blocked around the path entry before a wave starts.
const PREPARATION_RADIUS_TILES: f32 = 2.0;

/// Represents the authoritative Waypoint Defence world state.
#[derive(Debug)]
pub struct World {
    tiles: TileGrid,
    path: Vec<Vec2>,
    entities: EntityRegistry<EntityState>,
    economy: GameState,
    clock: Duration,
}

impl World {
    /// Creates an empty world waiting for configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tiles: TileGrid::empty(),
            path: Vec::new(),
            entities: EntityRegistry::new(),
            economy: GameState::new(0, 0).with_status(GameStatus::Menu),
            clock: Duration::ZERO,
        }
    }

    fn block_path(&mut self) {
        let clearance = self.tiles.tile_length() * PATH_CLEARANCE;
        let blocked = self.tiles.mark_path(&self.path, clearance);
        debug!(blocked, waypoints = self.path.len(), "path tiles blocked");
    }

    fn publish_economy(&self, out_events: &mut Vec<Event>) {
        out_events.push(Event::EconomyChanged {
            state: self.economy,
        });
    }

    fn reset(&mut self, gold: u32, lives: u32, out_events: &mut Vec<Event>) {
        let mut signals = Vec::new();
        self.entities.clear(&mut signals);
        self.resolve_signals(signals, out_events);
        self.tiles.clear_highlights();
        self.tiles.clear_preparation_blocks();
        self.economy = GameState::new(gold, lives);
        self.clock = Duration::ZERO;

        info!(gold, lives, "world reset");
        out_events.push(Event::WorldReset);
        self.publish_economy(out_events);
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if !matches!(
            self.economy.status(),
            GameStatus::Preparing | GameStatus::Playing
        ) {
            return;
        }

        self.entities.flush();
        self.clock = self.clock.saturating_add(dt);
        out_events.push(Event::TimeAdvanced { dt });

        let context = TickContext {
            now: self.clock,
            dt,
            path: &self.path,
        };
        let mut signals = Vec::new();
        for entity in self.entities.iter_mut() {
            entity.update(&context, &mut signals);
        }

        let contacts = self.entities.collision_pass(&mut signals);
        if contacts > 0 {
            trace!(contacts, "collision pass");
        }

        self.resolve_signals(signals, out_events);
    }

    fn resolve_signals(&mut self, mut signals: Vec<Signal>, out_events: &mut Vec<Event>) {
        let mut cursor = 0;
        while let Some(signal) = signals.get(cursor).copied() {
            cursor += 1;
            match signal {
                Signal::Impact { projectile } => {
                    self.resolve_impact(projectile, &mut signals, out_events);
                }
                Signal::Defeated { enemy, kind } => self.defeat(enemy, kind, out_events),
                Signal::Leaked { enemy, kind } => self.leak(enemy, kind, out_events),
                Signal::TileReleased { tile } => {
                    let _ = self.tiles.release(tile);
                }
            }
        }
    }

    fn defeat(&mut self, enemy: EntityId, kind: EnemyKind, out_events: &mut Vec<Event>) {
        let _ = self.entities.remove(enemy);
        let stats = kind.stats();
        self.economy = self.economy.add_gold(stats.gold).add_score(stats.score);

        debug!(enemy = enemy.get(), kind = kind.name(), gold = stats.gold, "enemy defeated");
        out_events.push(Event::EnemyDefeated {
            enemy,
            kind,
            gold: stats.gold,
            score: stats.score,
        });
        self.publish_economy(out_events);
    }

    fn leak(&mut self, enemy: EntityId, kind: EnemyKind, out_events: &mut Vec<Event>) {
        let _ = self.entities.remove(enemy);
        let lives = kind.stats().lives;
        let previous = self.economy.status();
        self.economy = self.economy.lose_lives(lives);

        debug!(enemy = enemy.get(), kind = kind.name(), lives, "enemy leaked");
        out_events.push(Event::EnemyLeaked { enemy, kind, lives });
        self.publish_economy(out_events);

        if previous != GameStatus::GameOver && self.economy.status() == GameStatus::GameOver {
            info!(score = self.economy.score(), "game over");
            out_events.push(Event::StatusChanged {
                status: GameStatus::GameOver,
            });
        }
    }

    fn resolve_impact(
        &mut self,
        projectile: EntityId,
        signals: &mut Vec<Signal>,
        out_events: &mut Vec<Event>,
    ) {
        let Some((target, impact, payload)) = self
            .entities
            .get(projectile)
            .and_then(EntityState::as_projectile)
            .map(|shot| (shot.target, shot.position(), shot.payload))
        else {
            return;
        };
        let _ = self.entities.remove(projectile);

        let Some(target_center) = self
            .entities
            .get(target)
            .and_then(EntityState::as_enemy)
            .filter(|enemy| enemy.is_alive())
            .map(EnemyState::center)
        else {
            debug!(projectile = projectile.get(), "target gone, projectile discarded");
            out_events.push(Event::ProjectileDiscarded { projectile });
            return;
        };

        let mut struck = vec![target];
        self.strike(target, payload.damage, &payload, true, signals);

        if let Some(splash) = payload.splash {
            let splashed: Vec<(EntityId, f32)> = self
                .entities
                .query_in_radius(impact, splash.radius)
                .filter_map(EntityState::as_enemy)
                .filter(|enemy| enemy.id != target && enemy.is_alive())
                .map(|enemy| (enemy.id, enemy.center().distance(impact)))
                .collect();
            for (enemy, distance) in splashed {
                let raw = splash.damage_at(payload.damage, distance);
                if raw > 0.0 {
                    struck.push(enemy);
                    self.strike(enemy, raw, &payload, false, signals);
                }
            }
        }

        if let Some(chain) = payload.chain {
            let mut from = target_center;
            let mut damage = payload.damage;
            let mut jumped = vec![target];
            for _ in 0..chain.jumps {
                damage *= chain.falloff;
                let next = self
                    .entities
                    .query_in_radius(from, chain.radius)
                    .filter_map(EntityState::as_enemy)
                    .filter(|enemy| enemy.is_alive() && !jumped.contains(&enemy.id))
                    .min_by(|left, right| {
                        left.center()
                            .distance_squared(from)
                            .total_cmp(&right.center().distance_squared(from))
                            .then(left.id.cmp(&right.id))
                    })
                    .map(|enemy| (enemy.id, enemy.center()));
                let Some((enemy, center)) = next else {
                    break;
                };
                jumped.push(enemy);
                struck.push(enemy);
                self.strike(enemy, damage, &payload, false, signals);
                from = center;
            }
        }

        let hits = u32::try_from(struck.len()).unwrap_or(u32::MAX);
        debug!(
            projectile = projectile.get(),
            hits,
            critical = payload.critical,
            "projectile resolved"
        );
        out_events.push(Event::ProjectileResolved { projectile, hits });
    }

    fn strike(
        &mut self,
        enemy: EntityId,
        raw: f32,
        payload: &Payload,
        direct: bool,
        signals: &mut Vec<Signal>,
    ) {
        let now = self.clock;
        let Some(state) = self
            .entities
            .get_mut(enemy)
            .and_then(EntityState::as_enemy_mut)
        else {
            return;
        };

        let dealt = mitigate(raw, state.armor, payload.armor_penetration);
        if state.apply_damage(dealt) {
            signals.push(Signal::Defeated {
                enemy,
                kind: state.kind,
            });
            return;
        }
        if let Some(slow) = payload.slow {
            state.apply_slow(slow, now);
        }
        if let Some(stun) = payload.stun {
            state.apply_stun(stun, now);
        }
        // Poison only sticks to the direct target.
        if let Some(poison) = payload.poison.filter(|_| direct) {
            state.apply_poison(poison, now);
        }
    }

    fn place_tower(&mut self, kind: TowerKind, position: Vec2, out_events: &mut Vec<Event>) {
        match self.try_place(kind, position) {
            Ok((tower, tile, center)) => {
                debug!(tower = tower.get(), kind = kind.name(), ?tile, "tower placed");
                out_events.push(Event::TowerPlaced {
                    tower,
                    kind,
                    tile,
                    center,
                });
                self.publish_economy(out_events);
            }
            Err(reason) => {
                debug!(kind = kind.name(), %reason, "tower placement rejected");
                out_events.push(Event::TowerPlacementRejected {
                    kind,
                    position,
                    reason,
                });
            }
        }
    }

    fn try_place(
        &mut self,
        kind: TowerKind,
        position: Vec2,
    ) -> Result<(EntityId, TileCoord, Vec2), PlacementError> {
        if !self.economy.status().accepts_construction() {
            return Err(PlacementError::InvalidStatus);
        }
        let tile = self
            .tiles
            .world_to_tile(position)
            .ok_or(PlacementError::NoTile)?;
        let center = self.tiles.center(tile).ok_or(PlacementError::NoTile)?;
        if !self.tiles.can_place(tile) {
            return Err(PlacementError::TileUnavailable);
        }
        let economy = self
            .economy
            .spend_gold(kind.cost())
            .ok_or(PlacementError::InsufficientGold)?;

        self.tiles.place(tile)?;
        self.economy = economy;
        let tower = self
            .entities
            .add(|id| EntityState::Tower(TowerState::new(id, kind, tile, center)));
        Ok((tower, tile, center))
    }

    fn upgrade_tower(&mut self, tower: EntityId, path: UpgradePath, out_events: &mut Vec<Event>) {
        match self.try_upgrade(tower, path) {
            Ok(level) => {
                debug!(tower = tower.get(), ?path, level = level.get(), "tower upgraded");
                out_events.push(Event::TowerUpgraded { tower, path, level });
                self.publish_economy(out_events);
            }
            Err(reason) => {
                debug!(tower = tower.get(), ?path, %reason, "tower upgrade rejected");
                out_events.push(Event::TowerUpgradeRejected {
                    tower,
                    path,
                    reason,
                });
            }
        }
    }

    fn try_upgrade(
        &mut self,
        tower: EntityId,
        path: UpgradePath,
    ) -> Result<UpgradeLevel, UpgradeError> {
        if !self.economy.status().accepts_construction() {
            return Err(UpgradeError::InvalidStatus);
        }
        let state = self
            .entities
            .get_mut(tower)
            .and_then(EntityState::as_tower_mut)
            .filter(|state| state.active)
            .ok_or(UpgradeError::MissingTower)?;
        let cost = state.upgrade_cost(path)?;
        let economy = self
            .economy
            .spend_gold(cost)
            .ok_or(UpgradeError::InsufficientGold)?;

        let level = state.upgrade(path)?;
        self.economy = economy;
        Ok(level)
    }

    fn spawn_enemy(&mut self, kind: EnemyKind, out_events: &mut Vec<Event>) {
        let entry = match self.path.as_slice() {
            [entry, _, ..] => *entry,
            _ => {
                debug!(kind = kind.name(), "spawn ignored without a path");
                return;
            }
        };
        let enemy = self
            .entities
            .add(|id| EntityState::Enemy(EnemyState::new(id, kind, entry)));
        trace!(enemy = enemy.get(), kind = kind.name(), "enemy spawned");
        out_events.push(Event::EnemySpawned { enemy, kind });
    }

    fn fire(
        &mut self,
        tower: EntityId,
        targets: &[EntityId],
        critical: bool,
        out_events: &mut Vec<Event>,
    ) {
        let now = self.clock;
        let aims: Vec<(EntityId, Vec2)> = targets
            .iter()
            .filter_map(|target| {
                self.entities
                    .get(*target)
                    .and_then(EntityState::as_enemy)
                    .filter(|enemy| enemy.is_alive())
                    .map(|enemy| (*target, enemy.center()))
            })
            .collect();

        let Some(state) = self
            .entities
            .get_mut(tower)
            .and_then(EntityState::as_tower_mut)
            .filter(|state| state.active)
        else {
            return;
        };
        if aims.is_empty() || !state.ready_at(now) {
            trace!(tower = tower.get(), "fire request ignored");
            return;
        }
        state.record_attack(now);
        let origin = state.bounds().center();
        let profile = *state.profile();
        let payload = Payload::from_profile(&profile, critical);

        for (target, impact) in aims.into_iter().take(profile.volley.max(1) as usize) {
            let projectile = self.entities.add(|id| {
                EntityState::Projectile(ProjectileState::new(
                    id,
                    tower,
                    target,
                    origin,
                    impact,
                    profile.motion,
                    payload,
                ))
            });
            out_events.push(Event::ProjectileFired {
                projectile,
                tower,
                target,
            });
        }
    }

    fn set_status(&mut self, status: GameStatus, out_events: &mut Vec<Event>) {
        if self.economy.status() == status {
            return;
        }
        info!(?status, "status changed");
        self.economy = self.economy.with_status(status);
        out_events.push(Event::StatusChanged { status });
    }

    fn set_preparation_block(&mut self, active: bool) {
        if !active {
            self.tiles.clear_preparation_blocks();
            return;
        }
        if let Some(entry) = self.path.first().copied() {
            let radius = self.tiles.tile_length() * PREPARATION_RADIUS_TILES;
            let blocked = self.tiles.set_preparation_blocked(entry, radius);
            debug!(blocked, "entry tiles blocked for preparation");
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureTileGrid {
            viewport,
            columns,
            tile_length,
        } => {
            world.tiles = TileGrid::new(viewport, columns, tile_length);
            world.block_path();
        }
        Command::ConfigurePath { waypoints } => {
            world.path = waypoints;
            world.block_path();
        }
        Command::Reset { gold, lives } => world.reset(gold, lives, out_events),
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::SetStatus { status } => world.set_status(status, out_events),
        Command::BeginWave { wave } => {
            info!(wave, "wave started");
            world.economy = world.economy.advance_wave(wave);
            out_events.push(Event::WaveStarted { wave });
            world.publish_economy(out_events);
        }
        Command::PlaceTower { kind, position } => world.place_tower(kind, position, out_events),
        Command::UpgradeTower { tower, path } => world.upgrade_tower(tower, path, out_events),
        Command::SpawnEnemy { kind } => world.spawn_enemy(kind, out_events),
        Command::FireProjectile {
            tower,
            targets,
            critical,
        } => world.fire(tower, &targets, critical, out_events),
        Command::SpendGold { amount } => match world.economy.spend_gold(amount) {
            Some(economy) => {
                world.economy = economy;
                world.publish_economy(out_events);
            }
            None => out_events.push(Event::GoldSpendRejected { amount }),
        },
        Command::AwardGold { amount } => {
            world.economy = world.economy.add_gold(amount);
            world.publish_economy(out_events);
        }
        Command::HighlightTile { tile } => {
            let _ = world.tiles.highlight(tile);
        }
        Command::ClearHighlights => world.tiles.clear_highlights(),
        Command::SetPreparationBlock { active } => world.set_preparation_block(active),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use waypoint_defence_core::{
        EnemyView, EntityId, EntitySnapshot, GameState, TowerSnapshot, TowerView, Vec2,
    };

    use super::{entity::EntityKind, registry::Entity, EntityState, TileGrid, World};

    /// Provides read-only access to the world's tile grid.
    #[must_use]
    pub fn tile_grid(world: &World) -> &TileGrid {
        &world.tiles
    }

    /// Waypoints enemies follow, entry first.
    #[must_use]
    pub fn path(world: &World) -> &[Vec2] {
        &world.path
    }

    /// Current economy snapshot.
    #[must_use]
    pub fn economy(world: &World) -> GameState {
        world.economy
    }

    /// Simulation time accumulated since the last reset.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// Captures a read-only view of every active tower.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(
            world
                .entities
                .query_by_kind(EntityKind::Tower)
                .filter_map(EntityState::as_tower)
                .map(|tower| tower.snapshot())
                .collect(),
        )
    }

    /// Looks up a single tower, including one placed during the current frame.
    #[must_use]
    pub fn tower(world: &World, id: EntityId) -> Option<TowerSnapshot> {
        world
            .entities
            .get(id)
            .and_then(EntityState::as_tower)
            .filter(|tower| tower.active)
            .map(|tower| tower.snapshot())
    }

    /// Captures a read-only view of every active enemy.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(
            world
                .entities
                .query_by_kind(EntityKind::Enemy)
                .filter_map(EntityState::as_enemy)
                .map(|enemy| enemy.snapshot(world.clock))
                .collect(),
        )
    }

    /// Number of enemies alive or queued to enter on the next tick.
    #[must_use]
    pub fn enemy_count(world: &World) -> usize {
        world.entities.count_by_kind(EntityKind::Enemy)
    }

    /// Snapshots of every active entity in identifier order.
    #[must_use]
    pub fn entity_snapshots(world: &World) -> Vec<EntitySnapshot> {
        world
            .entities
            .iter()
            .filter(|entity| entity.is_active())
            .map(|entity| entity.snapshot(world.clock))
            .collect()
    }
}
