//! Tower catalogue: base stats, targeting policies and upgrade curves.
//!
//! Effective stats are always recomputed from `(kind, level, path)` so that a
//! tower's numbers never depend on the order in which upgrades were applied.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geometry::Size;

const DAMAGE_MULTIPLIERS: [f32; 4] = [1.0, 1.25, 1.5, 2.0];
const RANGE_MULTIPLIERS: [f32; 4] = [1.0, 1.1, 1.2, 1.3];
const ATTACK_SPEED_MULTIPLIERS: [f32; 4] = [1.0, 1.1, 1.25, 1.4];

/// Percentage of the base cost charged to reach levels one, two and three.
const UPGRADE_COST_PERCENT: [u32; 3] = [60, 100, 160];

const TOWER_EDGE: f32 = 30.0;

const ARCHER_VOLLEY: [u32; 4] = [1, 2, 3, 4];
const ARCHER_POISON_PER_TICK: [f32; 4] = [0.0, 3.0, 5.0, 8.0];
const ARCHER_POISON_DURATION: Duration = Duration::from_secs(3);

const CANNON_ARMOR_PENETRATION: f32 = 0.25;
const CANNON_SPLASH_FRACTION: [f32; 4] = [0.5, 0.6, 0.7, 0.8];
const CANNON_SPLASH_RADIUS: [f32; 4] = [50.0, 60.0, 70.0, 80.0];
const CANNON_STUN_MS: [u64; 4] = [0, 250, 500, 750];

const MAGIC_CHAIN_JUMPS: [u32; 4] = [1, 2, 3, 4];
const MAGIC_CHAIN_RADIUS: f32 = 80.0;
const MAGIC_CHAIN_FALLOFF: f32 = 0.7;
const MAGIC_SLOW_FRACTION: [f32; 4] = [0.2, 0.3, 0.4, 0.5];
const MAGIC_SLOW_DURATION: Duration = Duration::from_secs(2);

const SNIPER_CRITICAL_CHANCE: [f32; 4] = [0.1, 0.2, 0.3, 0.4];
const SNIPER_CRITICAL_MULTIPLIER: f32 = 2.0;
const SNIPER_ARMOR_PENETRATION: [f32; 4] = [0.0, 0.25, 0.5, 0.75];

/// Types of towers that can be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TowerKind {
    /// Fast, cheap tower that favours the enemy furthest along the path.
    Archer,
    /// Slow splash tower that favours the closest enemy.
    Cannon,
    /// Hit-scan chain lightning that favours the healthiest enemy.
    Magic,
    /// Long-range hit-scan tower that favours the furthest enemy.
    Sniper,
}

impl TowerKind {
    /// Every tower kind in catalogue order.
    pub const ALL: [TowerKind; 4] = [Self::Archer, Self::Cannon, Self::Magic, Self::Sniper];

    /// Lower-case name used in logs and scenario files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Archer => "archer",
            Self::Cannon => "cannon",
            Self::Magic => "magic",
            Self::Sniper => "sniper",
        }
    }

    /// Gold required to construct the tower.
    #[must_use]
    pub const fn cost(self) -> u32 {
        match self {
            Self::Archer => 50,
            Self::Cannon => 100,
            Self::Magic => 120,
            Self::Sniper => 150,
        }
    }

    /// Unupgraded damage, range and attack speed.
    #[must_use]
    pub const fn base_stats(self) -> TowerStats {
        match self {
            Self::Archer => TowerStats::new(10.0, 120.0, 1.5),
            Self::Cannon => TowerStats::new(40.0, 100.0, 0.5),
            Self::Magic => TowerStats::new(25.0, 110.0, 1.0),
            Self::Sniper => TowerStats::new(80.0, 250.0, 0.4),
        }
    }

    /// Policy used to pick a target among enemies in range.
    #[must_use]
    pub const fn targeting(self) -> TargetingPolicy {
        match self {
            Self::Archer => TargetingPolicy::First,
            Self::Cannon => TargetingPolicy::Closest,
            Self::Magic => TargetingPolicy::Strongest,
            Self::Sniper => TargetingPolicy::Furthest,
        }
    }

    /// How projectiles fired by this tower reach their target.
    #[must_use]
    pub const fn motion(self) -> ProjectileMotion {
        match self {
            Self::Archer => ProjectileMotion::Travel { speed: 420.0 },
            Self::Cannon => ProjectileMotion::Travel { speed: 260.0 },
            Self::Magic | Self::Sniper => ProjectileMotion::Instant,
        }
    }

    /// Size of the tower's collision box.
    #[must_use]
    pub const fn footprint(self) -> Size {
        Size::square(TOWER_EDGE)
    }

    /// Gold required to raise a tower currently at `level` by one level.
    ///
    /// Returns `None` once the tower reached [`UpgradeLevel::MAX`].
    #[must_use]
    pub fn upgrade_cost(self, level: UpgradeLevel) -> Option<u32> {
        let next = level.next()?;
        let percent = UPGRADE_COST_PERCENT[next.index() - 1];
        Some(self.cost().saturating_mul(percent) / 100)
    }

    /// Computes the full attack profile for the provided upgrade state.
    ///
    /// The result is a pure function of its inputs: calling it repeatedly
    /// with the same arguments yields identical profiles.
    #[must_use]
    pub fn profile(self, level: UpgradeLevel, path: Option<UpgradePath>) -> AttackProfile {
        let index = level.index();
        let base = self.base_stats();
        let stats = TowerStats::new(
            base.damage * DAMAGE_MULTIPLIERS[index],
            base.range * RANGE_MULTIPLIERS[index],
            base.attack_speed * ATTACK_SPEED_MULTIPLIERS[index],
        );
        let mut profile = AttackProfile::plain(stats, self.motion());

        match self {
            Self::Archer => match path {
                Some(UpgradePath::First) => profile.volley = ARCHER_VOLLEY[index],
                Some(UpgradePath::Second) if ARCHER_POISON_PER_TICK[index] > 0.0 => {
                    profile.poison = Some(PoisonEffect::new(
                        ARCHER_POISON_PER_TICK[index],
                        ARCHER_POISON_DURATION,
                    ));
                }
                _ => {}
            },
            Self::Cannon => {
                profile.armor_penetration = CANNON_ARMOR_PENETRATION;
                let (fraction, radius, stun_ms) = match path {
                    Some(UpgradePath::First) => {
                        (CANNON_SPLASH_FRACTION[index], CANNON_SPLASH_RADIUS[0], 0)
                    }
                    Some(UpgradePath::Second) => (
                        CANNON_SPLASH_FRACTION[0],
                        CANNON_SPLASH_RADIUS[index],
                        CANNON_STUN_MS[index],
                    ),
                    None => (CANNON_SPLASH_FRACTION[0], CANNON_SPLASH_RADIUS[0], 0),
                };
                profile.splash = Some(Splash::new(radius, fraction));
                if stun_ms > 0 {
                    profile.stun = Some(Duration::from_millis(stun_ms));
                }
            }
            Self::Magic => {
                let jumps = match path {
                    Some(UpgradePath::First) => MAGIC_CHAIN_JUMPS[index],
                    _ => MAGIC_CHAIN_JUMPS[0],
                };
                let slow = match path {
                    Some(UpgradePath::Second) => MAGIC_SLOW_FRACTION[index],
                    _ => MAGIC_SLOW_FRACTION[0],
                };
                profile.chain = Some(ChainLightning::new(
                    jumps,
                    MAGIC_CHAIN_RADIUS,
                    MAGIC_CHAIN_FALLOFF,
                ));
                profile.slow = Some(SlowEffect::new(slow, MAGIC_SLOW_DURATION));
            }
            Self::Sniper => {
                let chance = match path {
                    Some(UpgradePath::First) => SNIPER_CRITICAL_CHANCE[index],
                    _ => SNIPER_CRITICAL_CHANCE[0],
                };
                profile.critical = Some(CriticalHit::new(chance, SNIPER_CRITICAL_MULTIPLIER));
                if path == Some(UpgradePath::Second) {
                    profile.armor_penetration = SNIPER_ARMOR_PENETRATION[index];
                }
            }
        }

        profile
    }
}

/// Rule used by a tower to rank enemies inside its range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetingPolicy {
    /// Enemy that travelled furthest along the path.
    First,
    /// Enemy nearest to the tower.
    Closest,
    /// Enemy with the most remaining health.
    Strongest,
    /// Enemy furthest from the tower.
    Furthest,
}

/// One of the two mutually exclusive upgrade branches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpgradePath {
    /// Path one: volley, splash fraction, chain jumps or critical chance.
    First,
    /// Path two: poison, splash radius and stun, slow or armor penetration.
    Second,
}

/// Upgrade level of a tower, bounded to `0..=3`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UpgradeLevel(u8);

impl UpgradeLevel {
    /// Level of a freshly constructed tower.
    pub const ZERO: Self = Self(0);
    /// Highest attainable level.
    pub const MAX: Self = Self(3);

    /// Creates a level, rejecting values above [`UpgradeLevel::MAX`].
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value <= Self::MAX.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Numeric value of the level.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Level that follows this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        Self::new(self.0 + 1)
    }

    /// Reports whether the level is the maximum.
    #[must_use]
    pub const fn is_max(self) -> bool {
        self.0 == Self::MAX.0
    }

    const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Damage, range and attack rate of a tower.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerStats {
    /// Direct-hit damage per projectile.
    pub damage: f32,
    /// Targeting radius in world units measured from the tower center.
    pub range: f32,
    /// Attacks per second.
    pub attack_speed: f32,
}

impl TowerStats {
    /// Creates a stat block.
    #[must_use]
    pub const fn new(damage: f32, range: f32, attack_speed: f32) -> Self {
        Self {
            damage,
            range,
            attack_speed,
        }
    }

    /// Minimum time between two attacks, `1 / attack_speed`.
    ///
    /// A non-positive attack speed never becomes ready.
    #[must_use]
    pub fn attack_interval(&self) -> Duration {
        if self.attack_speed <= 0.0 || !self.attack_speed.is_finite() {
            return Duration::MAX;
        }
        Duration::from_secs_f32(1.0 / self.attack_speed)
    }
}

/// Travel model of a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ProjectileMotion {
    /// Hit-scan: resolved on the first update after it becomes live.
    Instant,
    /// Travels towards a fixed impact point at `speed` units per second.
    Travel {
        /// Travel speed in world units per second.
        speed: f32,
    },
}

/// Area damage applied around an impact point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Splash {
    /// Radius of the affected area.
    pub radius: f32,
    /// Fraction of the direct damage dealt at the impact point.
    pub fraction: f32,
}

impl Splash {
    /// Creates a splash descriptor.
    #[must_use]
    pub const fn new(radius: f32, fraction: f32) -> Self {
        Self { radius, fraction }
    }

    /// Damage dealt to an enemy `distance` units away from the impact point.
    ///
    /// Scales linearly from the full fraction at the center to half of it at
    /// the edge; enemies beyond the radius take nothing.
    #[must_use]
    pub fn damage_at(&self, base_damage: f32, distance: f32) -> f32 {
        if self.radius <= 0.0 || distance > self.radius {
            return 0.0;
        }
        base_damage * self.fraction * (1.0 - 0.5 * distance / self.radius)
    }
}

/// Movement slow applied on hit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlowEffect {
    /// Fraction of the base speed removed, in `0.0..=1.0`.
    pub fraction: f32,
    /// How long the slow lasts after the most recent hit.
    pub duration: Duration,
}

impl SlowEffect {
    /// Creates a slow payload.
    #[must_use]
    pub const fn new(fraction: f32, duration: Duration) -> Self {
        Self { fraction, duration }
    }
}

/// Damage over time applied on hit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoisonEffect {
    /// Damage dealt on every poison tick, ignoring armor.
    pub damage_per_tick: f32,
    /// How long the poison lasts after the most recent hit.
    pub duration: Duration,
}

impl PoisonEffect {
    /// Creates a poison payload.
    #[must_use]
    pub const fn new(damage_per_tick: f32, duration: Duration) -> Self {
        Self {
            damage_per_tick,
            duration,
        }
    }
}

/// Lightning that jumps from the primary victim to nearby enemies.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainLightning {
    /// Number of additional enemies hit after the primary target.
    pub jumps: u32,
    /// Maximum distance of a single jump.
    pub radius: f32,
    /// Damage multiplier applied on every jump.
    pub falloff: f32,
}

impl ChainLightning {
    /// Creates a chain descriptor.
    #[must_use]
    pub const fn new(jumps: u32, radius: f32, falloff: f32) -> Self {
        Self {
            jumps,
            radius,
            falloff,
        }
    }
}

/// Chance to multiply direct damage.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CriticalHit {
    /// Probability of a critical hit, in `0.0..=1.0`.
    pub chance: f32,
    /// Damage multiplier applied on a critical hit.
    pub multiplier: f32,
}

impl CriticalHit {
    /// Creates a critical-hit descriptor.
    #[must_use]
    pub const fn new(chance: f32, multiplier: f32) -> Self {
        Self { chance, multiplier }
    }
}

/// Everything a tower's shot carries, derived from its upgrade state.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttackProfile {
    /// Effective damage, range and attack speed.
    pub stats: TowerStats,
    /// Projectiles created per attack.
    pub volley: u32,
    /// Travel model of the projectiles.
    pub motion: ProjectileMotion,
    /// Fraction of the target's armor ignored, in `0.0..=1.0`.
    pub armor_penetration: f32,
    /// Area damage around the impact point.
    pub splash: Option<Splash>,
    /// Slow applied to every enemy damaged by the shot.
    pub slow: Option<SlowEffect>,
    /// Poison applied to the direct target.
    pub poison: Option<PoisonEffect>,
    /// Stun applied to every enemy damaged by the shot.
    pub stun: Option<Duration>,
    /// Lightning jumps after the direct hit.
    pub chain: Option<ChainLightning>,
    /// Critical-hit roll performed when firing.
    pub critical: Option<CriticalHit>,
}

impl AttackProfile {
    const fn plain(stats: TowerStats, motion: ProjectileMotion) -> Self {
        Self {
            stats,
            volley: 1,
            motion,
            armor_penetration: 0.0,
            splash: None,
            slow: None,
            poison: None,
            stun: None,
            chain: None,
            critical: None,
        }
    }
}
