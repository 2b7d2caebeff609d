//! Closed set of entity variants stored in the registry.

use std::time::Duration;

use waypoint_defence_core::{Bounds, EnemyKind, EntityId, EntitySnapshot, TileCoord, Vec2};

use crate::{
    enemies::{EnemyState, Outcome},
    projectiles::ProjectileState,
    registry::{Contact, Entity},
    towers::TowerState,
};

/// Discriminant used by kind queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EntityKind {
    Tower,
    Enemy,
    Projectile,
}

/// Deferred combat outcomes resolved by the world after the collision pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Signal {
    /// A projectile reached its impact point or touched its target.
    Impact { projectile: EntityId },
    /// An enemy's health reached zero.
    Defeated { enemy: EntityId, kind: EnemyKind },
    /// An enemy walked past the final waypoint.
    Leaked { enemy: EntityId, kind: EnemyKind },
    /// A tower was torn down and its tile must be freed.
    TileReleased { tile: TileCoord },
}

/// Per-tick inputs shared by every entity update.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TickContext<'a> {
    pub(crate) now: Duration,
    pub(crate) dt: Duration,
    pub(crate) path: &'a [Vec2],
}

#[derive(Clone, Debug)]
pub(crate) enum EntityState {
    Tower(TowerState),
    Enemy(EnemyState),
    Projectile(ProjectileState),
}

impl EntityState {
    /// Advances the entity by one tick, queueing any resulting signals.
    pub(crate) fn update(&mut self, context: &TickContext<'_>, signals: &mut Vec<Signal>) {
        match self {
            Self::Tower(_) => {}
            Self::Enemy(enemy) => match enemy.update(context.now, context.dt, context.path) {
                Outcome::Walking => {}
                Outcome::Killed => signals.push(Signal::Defeated {
                    enemy: enemy.id,
                    kind: enemy.kind,
                }),
                Outcome::Leaked => signals.push(Signal::Leaked {
                    enemy: enemy.id,
                    kind: enemy.kind,
                }),
            },
            Self::Projectile(projectile) => {
                if projectile.update(context.dt) {
                    signals.push(Signal::Impact {
                        projectile: projectile.id,
                    });
                }
            }
        }
    }

    pub(crate) fn as_tower(&self) -> Option<&TowerState> {
        match self {
            Self::Tower(tower) => Some(tower),
            _ => None,
        }
    }

    pub(crate) fn as_tower_mut(&mut self) -> Option<&mut TowerState> {
        match self {
            Self::Tower(tower) => Some(tower),
            _ => None,
        }
    }

    pub(crate) fn as_enemy(&self) -> Option<&EnemyState> {
        match self {
            Self::Enemy(enemy) => Some(enemy),
            _ => None,
        }
    }

    pub(crate) fn as_enemy_mut(&mut self) -> Option<&mut EnemyState> {
        match self {
            Self::Enemy(enemy) => Some(enemy),
            _ => None,
        }
    }

    pub(crate) fn as_projectile(&self) -> Option<&ProjectileState> {
        match self {
            Self::Projectile(projectile) => Some(projectile),
            _ => None,
        }
    }

    pub(crate) fn snapshot(&self, now: Duration) -> EntitySnapshot {
        match self {
            Self::Tower(tower) => EntitySnapshot::Tower(tower.snapshot()),
            Self::Enemy(enemy) => EntitySnapshot::Enemy(enemy.snapshot(now)),
            Self::Projectile(projectile) => EntitySnapshot::Projectile(projectile.snapshot()),
        }
    }
}

impl Entity for EntityState {
    type Kind = EntityKind;
    type Signal = Signal;

    fn id(&self) -> EntityId {
        match self {
            Self::Tower(tower) => tower.id,
            Self::Enemy(enemy) => enemy.id,
            Self::Projectile(projectile) => projectile.id,
        }
    }

    fn kind(&self) -> EntityKind {
        match self {
            Self::Tower(_) => EntityKind::Tower,
            Self::Enemy(_) => EntityKind::Enemy,
            Self::Projectile(_) => EntityKind::Projectile,
        }
    }

    fn bounds(&self) -> Bounds {
        match self {
            Self::Tower(tower) => tower.bounds(),
            Self::Enemy(enemy) => enemy.bounds(),
            Self::Projectile(projectile) => projectile.bounds(),
        }
    }

    fn is_active(&self) -> bool {
        match self {
            Self::Tower(tower) => tower.active,
            Self::Enemy(enemy) => enemy.active,
            Self::Projectile(projectile) => projectile.active,
        }
    }

    fn deactivate(&mut self) {
        match self {
            Self::Tower(tower) => tower.active = false,
            Self::Enemy(enemy) => enemy.active = false,
            Self::Projectile(projectile) => projectile.active = false,
        }
    }

    fn on_collision(&mut self, contact: Contact<EntityKind>, signals: &mut Vec<Signal>) {
        if let Self::Projectile(projectile) = self {
            if contact.kind == EntityKind::Enemy && projectile.touch(contact.other) {
                signals.push(Signal::Impact {
                    projectile: projectile.id,
                });
            }
        }
    }

    fn teardown(&mut self, signals: &mut Vec<Signal>) {
        if let Self::Tower(tower) = self {
            signals.push(Signal::TileReleased { tile: tower.tile });
        }
        self.deactivate();
    }
}
