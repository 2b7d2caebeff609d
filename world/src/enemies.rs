//! Enemy movement along the waypoint path and timed status effects.

use std::time::Duration;

use waypoint_defence_core::{
    Bounds, EnemyKind, EnemySnapshot, EntityId, PoisonEffect, SlowEffect, Size, Vec2,
};

/// Distance at which an enemy counts as having reached a waypoint.
const WAYPOINT_TOLERANCE: f32 = 2.0;

const POISON_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug, PartialEq)]
struct Slow {
    fraction: f32,
    expires_at: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Poison {
    damage_per_tick: f32,
    next_tick: Duration,
    expires_at: Duration,
}

/// What happened to an enemy during its update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    Walking,
    Killed,
    Leaked,
}

/// Enemy stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct EnemyState {
    pub(crate) id: EntityId,
    pub(crate) kind: EnemyKind,
    center: Vec2,
    size: Size,
    health: f32,
    max_health: f32,
    pub(crate) armor: f32,
    speed: f32,
    waypoint: usize,
    progress: f32,
    slow: Option<Slow>,
    poison: Option<Poison>,
    stunned_until: Option<Duration>,
    pub(crate) active: bool,
}

impl EnemyState {
    /// Creates an enemy standing on `entry` and heading for the next waypoint.
    pub(crate) fn new(id: EntityId, kind: EnemyKind, entry: Vec2) -> Self {
        let stats = kind.stats();
        Self {
            id,
            kind,
            center: entry,
            size: kind.size(),
            health: stats.health,
            max_health: stats.health,
            armor: stats.armor,
            speed: stats.speed,
            waypoint: 1,
            progress: 0.0,
            slow: None,
            poison: None,
            stunned_until: None,
            active: true,
        }
    }

    pub(crate) const fn center(&self) -> Vec2 {
        self.center
    }

    pub(crate) fn bounds(&self) -> Bounds {
        Bounds::centered_at(self.center, self.size)
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.active && self.health > 0.0
    }

    /// Current movement speed after slow and stun.
    pub(crate) fn effective_speed(&self, now: Duration) -> f32 {
        if self.stunned_until.is_some_and(|until| until > now) {
            return 0.0;
        }
        let slow = self
            .slow
            .filter(|slow| slow.expires_at > now)
            .map_or(0.0, |slow| slow.fraction);
        self.speed * (1.0 - slow.clamp(0.0, 1.0))
    }

    /// Subtracts `amount` from the health pool.
    ///
    /// Returns `true` only for the hit that brings health to zero, so rewards
    /// are paid exactly once.
    pub(crate) fn apply_damage(&mut self, amount: f32) -> bool {
        if self.health <= 0.0 || amount <= 0.0 {
            return false;
        }
        self.health -= amount;
        if self.health <= 0.0 {
            self.health = 0.0;
            self.active = false;
            return true;
        }
        false
    }

    pub(crate) fn apply_slow(&mut self, effect: SlowEffect, now: Duration) {
        let previous = self
            .slow
            .filter(|slow| slow.expires_at > now)
            .map_or(0.0, |slow| slow.fraction);
        self.slow = Some(Slow {
            fraction: previous.max(effect.fraction),
            expires_at: now + effect.duration,
        });
    }

    pub(crate) fn apply_poison(&mut self, effect: PoisonEffect, now: Duration) {
        let expires_at = now + effect.duration;
        self.poison = Some(match self.poison.filter(|poison| poison.expires_at > now) {
            Some(current) => Poison {
                damage_per_tick: current.damage_per_tick.max(effect.damage_per_tick),
                next_tick: current.next_tick,
                expires_at,
            },
            None => Poison {
                damage_per_tick: effect.damage_per_tick,
                next_tick: now + POISON_INTERVAL,
                expires_at,
            },
        });
    }

    pub(crate) fn apply_stun(&mut self, duration: Duration, now: Duration) {
        self.stunned_until = Some(now + duration);
    }

    /// Applies poison ticks that fell due, then walks along `path`.
    pub(crate) fn update(&mut self, now: Duration, dt: Duration, path: &[Vec2]) -> Outcome {
        if !self.is_alive() {
            return Outcome::Walking;
        }
        if self.tick_poison(now) {
            return Outcome::Killed;
        }
        self.walk(now, dt, path)
    }

    fn tick_poison(&mut self, now: Duration) -> bool {
        let Some(mut poison) = self.poison else {
            return false;
        };
        let mut killed = false;
        while !killed && poison.next_tick <= now && poison.next_tick <= poison.expires_at {
            killed = self.apply_damage(poison.damage_per_tick);
            poison.next_tick += POISON_INTERVAL;
        }
        self.poison = (poison.expires_at > now && !killed).then_some(poison);
        killed
    }

    fn walk(&mut self, now: Duration, dt: Duration, path: &[Vec2]) -> Outcome {
        let mut budget = self.effective_speed(now) * dt.as_secs_f32();
        while let Some(target) = path.get(self.waypoint).copied() {
            let distance = self.center.distance(target);
            if distance <= WAYPOINT_TOLERANCE || distance <= budget {
                let step = distance.min(budget);
                self.center = target;
                self.progress += step;
                budget -= step;
                self.waypoint += 1;
                continue;
            }
            if budget <= 0.0 {
                break;
            }
            self.center = self.center.step_towards(target, budget);
            self.progress += budget;
            if self.center.distance(target) <= WAYPOINT_TOLERANCE {
                self.waypoint += 1;
            }
            break;
        }

        if self.waypoint >= path.len() {
            self.active = false;
            return Outcome::Leaked;
        }
        Outcome::Walking
    }

    pub(crate) fn snapshot(&self, now: Duration) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            kind: self.kind,
            bounds: self.bounds(),
            health: self.health,
            max_health: self.max_health,
            progress: self.progress,
            waypoint: self.waypoint,
            slow: self
                .slow
                .filter(|slow| slow.expires_at > now)
                .map_or(0.0, |slow| slow.fraction),
            poisoned: self.poison.is_some_and(|poison| poison.expires_at > now),
            stunned: self.stunned_until.is_some_and(|until| until > now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    fn path() -> Vec<Vec2> {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(100.0, 0.0),
            Vec2::new(100.0, 100.0),
        ]
    }

    fn assert_near(actual: Vec2, expected: Vec2) {
        assert!(actual.distance(expected) < 1e-3, "{actual:?} != {expected:?}");
    }

    fn goblin() -> EnemyState {
        EnemyState::new(EntityId::new(1), EnemyKind::Goblin, Vec2::new(0.0, 0.0))
    }

    #[test]
    fn walks_at_base_speed_and_turns_corners() {
        let mut enemy = goblin();
        let path = path();

        assert_eq!(enemy.update(SECOND, SECOND, &path), Outcome::Walking);
        assert_near(enemy.center(), Vec2::new(80.0, 0.0));

        assert_eq!(enemy.update(SECOND * 2, SECOND, &path), Outcome::Walking);
        assert_near(enemy.center(), Vec2::new(100.0, 60.0));
        assert_eq!(enemy.snapshot(SECOND * 2).waypoint, 2);
        assert!((enemy.snapshot(SECOND * 2).progress - 160.0).abs() < 1e-3);
    }

    #[test]
    fn reaching_the_last_waypoint_leaks_once() {
        let mut enemy = goblin();
        let path = path();

        assert_eq!(enemy.update(SECOND * 3, SECOND * 3, &path), Outcome::Leaked);
        assert!(!enemy.is_alive());
        assert_eq!(enemy.update(SECOND * 4, SECOND, &path), Outcome::Walking);
    }

    #[test]
    fn slow_scales_speed_and_stun_stops_movement() {
        let mut enemy = goblin();
        enemy.apply_slow(SlowEffect::new(0.5, SECOND * 2), Duration::ZERO);
        enemy.apply_slow(SlowEffect::new(0.2, SECOND * 2), Duration::ZERO);
        assert_eq!(enemy.effective_speed(Duration::ZERO), 40.0);
        assert_eq!(enemy.effective_speed(SECOND * 2), 80.0);

        enemy.apply_stun(Duration::from_millis(500), Duration::ZERO);
        let path = path();
        assert_eq!(
            enemy.update(Duration::from_millis(100), Duration::from_millis(100), &path),
            Outcome::Walking
        );
        assert_eq!(enemy.center(), Vec2::new(0.0, 0.0));
        assert!(enemy.snapshot(Duration::from_millis(100)).stunned);
    }

    #[test]
    fn poison_ticks_every_half_second_and_bypasses_movement() {
        let mut enemy = goblin();
        enemy.apply_poison(PoisonEffect::new(5.0, SECOND * 3), Duration::ZERO);
        enemy.apply_stun(SECOND * 10, Duration::ZERO);
        let path = path();

        let _ = enemy.update(SECOND, SECOND, &path);
        assert_eq!(enemy.snapshot(SECOND).health, 40.0);

        let _ = enemy.update(SECOND * 4, SECOND * 3, &path);
        assert_eq!(enemy.snapshot(SECOND * 4).health, 20.0);
        assert!(!enemy.snapshot(SECOND * 4).poisoned);
    }

    #[test]
    fn refreshing_poison_keeps_the_stronger_dose() {
        let mut enemy = goblin();
        enemy.apply_poison(PoisonEffect::new(8.0, SECOND), Duration::ZERO);
        enemy.apply_poison(PoisonEffect::new(3.0, SECOND), Duration::from_millis(900));
        enemy.apply_stun(SECOND * 10, Duration::ZERO);

        let _ = enemy.update(Duration::from_millis(1_900), Duration::from_millis(1_900), &path());
        assert_eq!(enemy.snapshot(Duration::from_millis(1_900)).health, 50.0 - 8.0 * 3.0);
    }

    #[test]
    fn lethal_damage_reports_the_kill_once() {
        let mut enemy = goblin();
        assert!(!enemy.apply_damage(30.0));
        assert!(enemy.apply_damage(30.0));
        assert!(!enemy.apply_damage(30.0));
        assert!(!enemy.is_alive());
    }
}
