#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Waypoint Defence engine.
//!
//! This crate defines the message surface that connects hosts, the
//! authoritative world, and pure systems. Hosts submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

mod economy;
mod enemies;
mod geometry;
mod towers;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use economy::{GameState, GameStatus};
pub use enemies::{mitigate, EnemyKind, EnemyStats, MIN_DAMAGE};
pub use geometry::{distance_to_segment, Bounds, Size, Vec2};
pub use towers::{
    AttackProfile, ChainLightning, CriticalHit, PoisonEffect, ProjectileMotion, SlowEffect,
    Splash, TargetingPolicy, TowerKind, TowerStats, UpgradeLevel, UpgradePath,
};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Rebuilds the tile grid for the provided viewport.
    ConfigureTileGrid {
        /// Size of the playable viewport in world units.
        viewport: Size,
        /// Fixed number of tile columns.
        columns: u32,
        /// Edge length of a square tile in world units.
        tile_length: f32,
    },
    /// Replaces the waypoint path enemies follow and blocks the tiles along it.
    ConfigurePath {
        /// Ordered waypoints from entry to exit.
        waypoints: Vec<Vec2>,
    },
    /// Destroys every entity and starts a fresh economy.
    Reset {
        /// Starting gold.
        gold: u32,
        /// Starting lives.
        lives: u32,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that the session switch to the provided status.
    SetStatus {
        /// Status to activate.
        status: GameStatus,
    },
    /// Records that a new wave started.
    BeginWave {
        /// One-based index of the wave.
        wave: u32,
    },
    /// Requests placement of a tower on the tile under `position`.
    PlaceTower {
        /// Type of tower to construct.
        kind: TowerKind,
        /// World position selected by the player.
        position: Vec2,
    },
    /// Requests one upgrade level along `path`.
    UpgradeTower {
        /// Tower to upgrade.
        tower: EntityId,
        /// Path the upgrade follows.
        path: UpgradePath,
    },
    /// Requests that an enemy enter the path at its first waypoint.
    SpawnEnemy {
        /// Type of enemy to spawn.
        kind: EnemyKind,
    },
    /// Requests that a tower attack the listed targets, one projectile each.
    FireProjectile {
        /// Tower performing the attack.
        tower: EntityId,
        /// Targets in volley order.
        targets: Vec<EntityId>,
        /// Whether the attack rolled a critical hit.
        critical: bool,
    },
    /// Deducts gold on behalf of an external collaborator.
    SpendGold {
        /// Amount to deduct.
        amount: u32,
    },
    /// Adds gold, such as a wave completion bonus.
    AwardGold {
        /// Amount to add.
        amount: u32,
    },
    /// Marks a tile as highlighted for drag previews.
    HighlightTile {
        /// Tile to highlight.
        tile: TileCoord,
    },
    /// Clears every tile highlight.
    ClearHighlights,
    /// Toggles the pre-wave block around the path entry.
    SetPreparationBlock {
        /// Whether the entry tiles are blocked.
        active: bool,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces a status transition.
    StatusChanged {
        /// Status that became active.
        status: GameStatus,
    },
    /// Publishes the economy snapshot after gold, lives or score changed.
    EconomyChanged {
        /// Snapshot after the change.
        state: GameState,
    },
    /// Confirms that a wave started.
    WaveStarted {
        /// One-based index of the wave.
        wave: u32,
    },
    /// Confirms that every entity was destroyed and the economy reset.
    WorldReset,
    /// Confirms that a tower was placed into the world.
    TowerPlaced {
        /// Identifier assigned to the tower by the world.
        tower: EntityId,
        /// Type of tower that was placed.
        kind: TowerKind,
        /// Tile occupied by the tower.
        tile: TileCoord,
        /// World center of the tower, equal to the tile center.
        center: Vec2,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Type of tower requested for placement.
        kind: TowerKind,
        /// Position provided in the request.
        position: Vec2,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a tower gained a level.
    TowerUpgraded {
        /// Upgraded tower.
        tower: EntityId,
        /// Path the tower follows.
        path: UpgradePath,
        /// Level reached.
        level: UpgradeLevel,
    },
    /// Reports that an upgrade request was rejected.
    TowerUpgradeRejected {
        /// Tower named in the request.
        tower: EntityId,
        /// Path named in the request.
        path: UpgradePath,
        /// Specific reason the upgrade failed.
        reason: UpgradeError,
    },
    /// Confirms that an enemy was queued for entry.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EntityId,
        /// Type of enemy.
        kind: EnemyKind,
    },
    /// Reports that an enemy's health reached zero.
    EnemyDefeated {
        /// Defeated enemy.
        enemy: EntityId,
        /// Type of enemy.
        kind: EnemyKind,
        /// Gold paid out.
        gold: u32,
        /// Score awarded.
        score: u32,
    },
    /// Reports that an enemy reached the end of the path.
    EnemyLeaked {
        /// Enemy that escaped.
        enemy: EntityId,
        /// Type of enemy.
        kind: EnemyKind,
        /// Lives lost.
        lives: u32,
    },
    /// Confirms that a tower launched a projectile.
    ProjectileFired {
        /// Identifier assigned to the projectile.
        projectile: EntityId,
        /// Tower that fired.
        tower: EntityId,
        /// Intended victim.
        target: EntityId,
    },
    /// Reports that a projectile applied its damage.
    ProjectileResolved {
        /// Resolved projectile.
        projectile: EntityId,
        /// Number of enemies damaged, including splash and chain victims.
        hits: u32,
    },
    /// Reports that a projectile was dropped because its target vanished.
    ProjectileDiscarded {
        /// Discarded projectile.
        projectile: EntityId,
    },
    /// Reports that an external spend request was refused.
    GoldSpendRejected {
        /// Amount requested.
        amount: u32,
    },
}

/// Reasons a tower placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum PlacementError {
    /// The session status does not accept construction.
    #[error("construction is disabled in the current status")]
    InvalidStatus,
    /// The position does not map onto a placeable tile.
    #[error("no tile under the requested position")]
    NoTile,
    /// The tile is occupied, blocked or otherwise not empty.
    #[error("tile is not empty")]
    TileUnavailable,
    /// The player cannot pay for the tower.
    #[error("not enough gold")]
    InsufficientGold,
}

/// Reasons a tower upgrade request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum UpgradeError {
    /// The session status does not accept construction.
    #[error("upgrades are disabled in the current status")]
    InvalidStatus,
    /// No tower with the provided identifier exists.
    #[error("tower does not exist")]
    MissingTower,
    /// The tower already reached the highest level.
    #[error("tower is fully upgraded")]
    MaxLevel,
    /// The tower committed to the other path.
    #[error("tower follows the other upgrade path")]
    PathLocked,
    /// The player cannot pay for the upgrade.
    #[error("not enough gold")]
    InsufficientGold,
}

/// Opaque identifier assigned to every entity by the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single tile expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    column: u32,
    row: u32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

/// Placement classification of a tile as seen by presentation layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileState {
    /// Free for construction.
    Empty,
    /// Holds a tower.
    Occupied,
    /// Adjacent to the enemy path.
    Blocked,
    /// Empty tile under the drag preview.
    Highlighted,
    /// Part of the outer margin; never placeable.
    Invalid,
    /// Temporarily unavailable during the pre-wave countdown.
    PreparationBlocked,
}

/// Immutable representation of a tile used for rendering.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileSnapshot {
    /// Grid coordinate of the tile.
    pub tile: TileCoord,
    /// World-space center of the tile.
    pub center: Vec2,
    /// Presentation state of the tile.
    pub state: TileState,
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: EntityId,
    /// Kind of tower that was constructed.
    pub kind: TowerKind,
    /// Tile the tower stands on.
    pub tile: TileCoord,
    /// Collision box of the tower.
    pub bounds: Bounds,
    /// Current upgrade level.
    pub level: UpgradeLevel,
    /// Committed upgrade path, if any.
    pub path: Option<UpgradePath>,
    /// Effective attack profile for the current upgrade state.
    pub profile: AttackProfile,
    /// Simulation time of the most recent attack.
    pub last_attack: Option<Duration>,
}

impl TowerSnapshot {
    /// Reports whether the tower may attack at simulation time `now`.
    #[must_use]
    pub fn ready_at(&self, now: Duration) -> bool {
        match self.last_attack {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.profile.stats.attack_interval(),
        }
    }
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Identifier allocated to the enemy by the world.
    pub id: EntityId,
    /// Kind of enemy.
    pub kind: EnemyKind,
    /// Collision box of the enemy.
    pub bounds: Bounds,
    /// Remaining health.
    pub health: f32,
    /// Health on spawn.
    pub max_health: f32,
    /// Distance travelled along the path.
    pub progress: f32,
    /// Index of the waypoint the enemy walks towards.
    pub waypoint: usize,
    /// Active slow fraction, zero when unaffected.
    pub slow: f32,
    /// Whether poison is active.
    pub poisoned: bool,
    /// Whether the enemy is stunned.
    pub stunned: bool,
}

/// Immutable representation of a projectile in flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Identifier allocated to the projectile.
    pub id: EntityId,
    /// Tower that fired the projectile.
    pub tower: EntityId,
    /// Intended victim.
    pub target: EntityId,
    /// Collision box of the projectile.
    pub bounds: Bounds,
    /// Point the projectile travels to.
    pub impact: Vec2,
}

/// Snapshot of any live entity, handed to rendering collaborators.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EntitySnapshot {
    /// A tower.
    Tower(TowerSnapshot),
    /// An enemy.
    Enemy(EnemySnapshot),
    /// A projectile.
    Projectile(ProjectileSnapshot),
}

impl EntitySnapshot {
    /// Identifier of the captured entity.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        match self {
            Self::Tower(tower) => tower.id,
            Self::Enemy(enemy) => enemy.id,
            Self::Projectile(projectile) => projectile.id,
        }
    }

    /// Collision box of the captured entity.
    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        match self {
            Self::Tower(tower) => tower.bounds,
            Self::Enemy(enemy) => enemy.bounds,
            Self::Projectile(projectile) => projectile.bounds,
        }
    }
}

/// Read-only snapshot describing all towers placed within the world.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a tower by identifier.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&TowerSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of captured towers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Read-only snapshot describing all active enemies.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of captured enemies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Targets selected for a tower during the current tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TowerTarget {
    /// Tower that owns the assignment.
    pub tower: EntityId,
    /// Enemies ranked by the tower's policy, one per volley slot.
    pub targets: Vec<EntityId>,
}

/// Generated composition of a single wave.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Wave {
    /// One-based wave index.
    pub index: u32,
    /// Enemy kinds in spawn order.
    pub enemies: Vec<EnemyKind>,
}

/// Progress counters of the wave in flight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WaveStats {
    /// One-based index of the current wave, zero before the first.
    pub current_wave_index: u32,
    /// Enemies still queued or alive.
    pub enemies_remaining: usize,
}
