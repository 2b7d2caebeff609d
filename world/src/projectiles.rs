//! Projectiles in flight between a tower and its target.

use std::time::Duration;

use waypoint_defence_core::{
    AttackProfile, Bounds, ChainLightning, EntityId, PoisonEffect, ProjectileMotion,
    ProjectileSnapshot, Size, SlowEffect, Splash, Vec2,
};

const PROJECTILE_EDGE: f32 = 6.0;

/// Damage and effects delivered when a projectile resolves.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Payload {
    /// Direct damage before armor, critical multiplier included.
    pub(crate) damage: f32,
    pub(crate) armor_penetration: f32,
    pub(crate) splash: Option<Splash>,
    pub(crate) slow: Option<SlowEffect>,
    pub(crate) poison: Option<PoisonEffect>,
    pub(crate) stun: Option<Duration>,
    pub(crate) chain: Option<ChainLightning>,
    pub(crate) critical: bool,
}

impl Payload {
    /// Captures the tower's current profile, doubling damage on a critical roll.
    pub(crate) fn from_profile(profile: &AttackProfile, critical: bool) -> Self {
        let multiplier = match profile.critical {
            Some(roll) if critical => roll.multiplier,
            _ => 1.0,
        };
        Self {
            damage: profile.stats.damage * multiplier,
            armor_penetration: profile.armor_penetration,
            splash: profile.splash,
            slow: profile.slow,
            poison: profile.poison,
            stun: profile.stun,
            chain: profile.chain,
            critical: critical && profile.critical.is_some(),
        }
    }
}

/// Projectile stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct ProjectileState {
    pub(crate) id: EntityId,
    pub(crate) tower: EntityId,
    pub(crate) target: EntityId,
    position: Vec2,
    impact: Vec2,
    motion: ProjectileMotion,
    pub(crate) payload: Payload,
    resolved: bool,
    pub(crate) active: bool,
}

impl ProjectileState {
    pub(crate) fn new(
        id: EntityId,
        tower: EntityId,
        target: EntityId,
        origin: Vec2,
        impact: Vec2,
        motion: ProjectileMotion,
        payload: Payload,
    ) -> Self {
        Self {
            id,
            tower,
            target,
            position: origin,
            impact,
            motion,
            payload,
            resolved: false,
            active: true,
        }
    }

    pub(crate) const fn position(&self) -> Vec2 {
        self.position
    }

    pub(crate) fn bounds(&self) -> Bounds {
        Bounds::centered_at(self.position, Size::square(PROJECTILE_EDGE))
    }

    /// Moves the projectile and reports whether it resolved during this update.
    ///
    /// Instant projectiles resolve on their first update; travelling ones on
    /// reaching the impact point.
    pub(crate) fn update(&mut self, dt: Duration) -> bool {
        if self.resolved {
            return false;
        }
        match self.motion {
            ProjectileMotion::Instant => {
                self.position = self.impact;
            }
            ProjectileMotion::Travel { speed } => {
                self.position = self
                    .position
                    .step_towards(self.impact, speed * dt.as_secs_f32());
                if self.position != self.impact {
                    return false;
                }
            }
        }
        self.resolve()
    }

    /// Resolves the projectile when it touches its own target.
    pub(crate) fn touch(&mut self, other: EntityId) -> bool {
        other == self.target && self.resolve()
    }

    fn resolve(&mut self) -> bool {
        if self.resolved {
            return false;
        }
        self.resolved = true;
        true
    }

    pub(crate) fn snapshot(&self) -> ProjectileSnapshot {
        ProjectileSnapshot {
            id: self.id,
            tower: self.tower,
            target: self.target,
            bounds: self.bounds(),
            impact: self.impact,
        }
    }
}
