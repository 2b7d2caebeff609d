#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that computes deterministic tower targets from world snapshots.

use std::cmp::Ordering;

use waypoint_defence_core::{
    EnemySnapshot, EntityId, EnemyView, GameStatus, TargetingPolicy, TowerSnapshot, TowerTarget,
    TowerView,
};

/// Tower targeting system that reuses scratch buffers to avoid repeated allocations.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    candidates: Vec<Candidate>,
}

impl TowerTargeting {
    /// Creates a new tower targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes tower targets for the provided world snapshot.
    ///
    /// The output buffer is cleared before populating it with the latest
    /// assignments. Each assignment lists one enemy per volley slot, ranked by
    /// the tower's policy and cycling back to the primary target when fewer
    /// enemies are in range than the volley holds.
    pub fn handle(
        &mut self,
        status: GameStatus,
        towers: &TowerView,
        enemies: &EnemyView,
        out: &mut Vec<TowerTarget>,
    ) {
        out.clear();

        if status != GameStatus::Playing {
            return;
        }

        if towers.is_empty() || enemies.is_empty() {
            return;
        }

        for tower in towers.iter() {
            self.rank_candidates(tower, enemies);
            if self.candidates.is_empty() {
                continue;
            }

            let slots = tower.profile.volley.max(1) as usize;
            let targets = self
                .candidates
                .iter()
                .cycle()
                .take(slots)
                .map(|candidate| candidate.enemy)
                .collect();

            out.push(TowerTarget {
                tower: tower.id,
                targets,
            });
        }
    }

    fn rank_candidates(&mut self, tower: &TowerSnapshot, enemies: &EnemyView) {
        self.candidates.clear();

        let center = tower.bounds.center();
        let range = tower.profile.stats.range;
        let range_squared = range * range;
        let policy = tower.kind.targeting();

        for enemy in enemies.iter() {
            let distance_squared = enemy.bounds.center().distance_squared(center);
            if distance_squared > range_squared || enemy.health <= 0.0 {
                continue;
            }
            self.candidates.push(Candidate {
                score: score(policy, enemy, distance_squared),
                enemy: enemy.id,
            });
        }

        self.candidates.sort_by(Candidate::ordering);
    }
}

/// Higher scores rank first.
fn score(policy: TargetingPolicy, enemy: &EnemySnapshot, distance_squared: f32) -> f32 {
    match policy {
        TargetingPolicy::First => enemy.progress,
        TargetingPolicy::Closest => -distance_squared,
        TargetingPolicy::Strongest => enemy.health,
        TargetingPolicy::Furthest => distance_squared,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Candidate {
    score: f32,
    enemy: EntityId,
}

impl Candidate {
    fn ordering(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then(self.enemy.cmp(&other.enemy))
    }
}
