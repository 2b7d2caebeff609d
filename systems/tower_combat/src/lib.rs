#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits projectile firing commands from targeting data.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use waypoint_defence_core::{Command, GameStatus, TowerTarget, TowerView};

/// Tower combat system that queues firing commands for ready towers.
///
/// Critical hits are rolled from a seeded stream owned by the system, so two
/// systems created with the same seed and fed the same inputs emit identical
/// commands.
#[derive(Debug)]
pub struct TowerCombat {
    rng: ChaCha8Rng,
    scratch: Vec<Command>,
}

impl TowerCombat {
    /// Creates a new tower combat system rolling critical hits from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            scratch: Vec::new(),
        }
    }

    /// Emits `Command::FireProjectile` entries for towers ready to fire at `now`.
    ///
    /// Towers whose profile carries a critical-hit chance consume one roll
    /// per emitted command; other towers never touch the random stream.
    pub fn handle(
        &mut self,
        status: GameStatus,
        now: Duration,
        towers: &TowerView,
        tower_targets: &[TowerTarget],
        out: &mut Vec<Command>,
    ) {
        if status != GameStatus::Playing {
            return;
        }

        if tower_targets.is_empty() || towers.is_empty() {
            return;
        }

        self.scratch.clear();

        for target in tower_targets {
            if target.targets.is_empty() {
                continue;
            }
            let Some(snapshot) = towers.get(target.tower) else {
                continue;
            };
            if !snapshot.ready_at(now) {
                continue;
            }

            let critical = match snapshot.profile.critical {
                Some(critical) => self.rng.gen::<f32>() < critical.chance,
                None => false,
            };
            self.scratch.push(Command::FireProjectile {
                tower: target.tower,
                targets: target.targets.clone(),
                critical,
            });
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_defence_core::{
        Bounds, EntityId, TileCoord, TowerKind, TowerSnapshot, UpgradeLevel, UpgradePath, Vec2,
    };

    #[test]
    fn preparing_status_is_silent() {
        let mut system = TowerCombat::new(7);
        let towers = TowerView::from_snapshots(vec![snapshot(1, TowerKind::Archer, None)]);
        let targets = vec![target(1, &[7])];
        let mut out = Vec::new();

        system.handle(GameStatus::Preparing, Duration::ZERO, &towers, &targets, &mut out);

        assert!(out.is_empty());
    }

    #[test]
    fn firing_respects_cooldown_readiness() {
        let mut system = TowerCombat::new(7);
        let towers = TowerView::from_snapshots(vec![
            snapshot(2, TowerKind::Archer, None),
            snapshot(5, TowerKind::Cannon, Some(Duration::from_millis(500))),
            snapshot(8, TowerKind::Cannon, Some(Duration::ZERO)),
        ]);
        let targets = vec![target(2, &[4]), target(5, &[1]), target(8, &[3]), target(42, &[3])];
        let mut out = Vec::new();

        system.handle(
            GameStatus::Playing,
            Duration::from_secs(2),
            &towers,
            &targets,
            &mut out,
        );

        assert_eq!(
            out,
            vec![
                Command::FireProjectile {
                    tower: EntityId::new(2),
                    targets: vec![EntityId::new(4)],
                    critical: false,
                },
                Command::FireProjectile {
                    tower: EntityId::new(8),
                    targets: vec![EntityId::new(3)],
                    critical: false,
                },
            ],
        );
    }

    #[test]
    fn critical_rolls_replay_for_equal_seeds() {
        let rolls = |seed: u64| {
            let mut system = TowerCombat::new(seed);
            let towers = TowerView::from_snapshots(vec![snapshot(1, TowerKind::Sniper, None)]);
            let targets = vec![target(1, &[9])];
            (0..256)
                .map(|_| {
                    let mut out = Vec::new();
                    system.handle(GameStatus::Playing, Duration::ZERO, &towers, &targets, &mut out);
                    matches!(out.as_slice(), [Command::FireProjectile { critical: true, .. }])
                })
                .collect::<Vec<_>>()
        };

        let first = rolls(11);
        assert_eq!(first, rolls(11));
        assert!(first.iter().any(|critical| *critical), "10% over 256 rolls");
        assert!(first.iter().any(|critical| !*critical));
    }

    #[test]
    fn towers_without_critical_chance_never_crit() {
        let mut system = TowerCombat::new(3);
        let level = UpgradeLevel::MAX;
        let mut archer = snapshot(1, TowerKind::Archer, None);
        archer.profile = TowerKind::Archer.profile(level, Some(UpgradePath::First));
        let towers = TowerView::from_snapshots(vec![archer]);
        let targets = vec![target(1, &[2, 3, 2, 3])];

        for _ in 0..32 {
            let mut out = Vec::new();
            system.handle(GameStatus::Playing, Duration::ZERO, &towers, &targets, &mut out);
            assert!(matches!(
                out.as_slice(),
                [Command::FireProjectile { critical: false, targets, .. }] if targets.len() == 4
            ));
        }
    }

    fn snapshot(tower: u32, kind: TowerKind, last_attack: Option<Duration>) -> TowerSnapshot {
        TowerSnapshot {
            id: EntityId::new(tower),
            kind,
            tile: TileCoord::new(1, 1),
            bounds: Bounds::centered_at(Vec2::new(60.0, 60.0), kind.footprint()),
            level: UpgradeLevel::ZERO,
            path: None,
            profile: kind.profile(UpgradeLevel::ZERO, None),
            last_attack,
        }
    }

    fn target(tower: u32, enemies: &[u32]) -> TowerTarget {
        TowerTarget {
            tower: EntityId::new(tower),
            targets: enemies.iter().copied().map(EntityId::new).collect(),
        }
    }
}
