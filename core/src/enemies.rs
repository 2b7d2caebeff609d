//! Enemy catalogue and the armor mitigation rule.

use serde::{Deserialize, Serialize};

use crate::geometry::Size;

/// Smallest amount of damage a non-trivial hit deals after armor.
pub const MIN_DAMAGE: f32 = 1.0;

/// Types of enemies that walk the waypoint path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyKind {
    /// Fast and fragile.
    Goblin,
    /// Balanced, lightly armored.
    Orc,
    /// Slow and heavily armored.
    Troll,
    /// Appended to every fifth wave.
    Boss,
}

impl EnemyKind {
    /// Every enemy kind in catalogue order.
    pub const ALL: [EnemyKind; 4] = [Self::Goblin, Self::Orc, Self::Troll, Self::Boss];

    /// Lower-case name used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Goblin => "goblin",
            Self::Orc => "orc",
            Self::Troll => "troll",
            Self::Boss => "boss",
        }
    }

    /// Fixed stat table for the kind.
    #[must_use]
    pub const fn stats(self) -> EnemyStats {
        match self {
            Self::Goblin => EnemyStats {
                health: 50.0,
                speed: 80.0,
                armor: 0.0,
                gold: 5,
                score: 10,
                lives: 1,
                edge: 20.0,
            },
            Self::Orc => EnemyStats {
                health: 150.0,
                speed: 55.0,
                armor: 10.0,
                gold: 10,
                score: 25,
                lives: 1,
                edge: 24.0,
            },
            Self::Troll => EnemyStats {
                health: 400.0,
                speed: 40.0,
                armor: 20.0,
                gold: 25,
                score: 60,
                lives: 2,
                edge: 30.0,
            },
            Self::Boss => EnemyStats {
                health: 2_000.0,
                speed: 30.0,
                armor: 30.0,
                gold: 150,
                score: 500,
                lives: 5,
                edge: 40.0,
            },
        }
    }

    /// Collision box of the kind.
    #[must_use]
    pub const fn size(self) -> Size {
        Size::square(self.stats().edge)
    }
}

/// Fixed per-kind enemy statistics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyStats {
    /// Health on spawn.
    pub health: f32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Flat damage reduction applied to every hit.
    pub armor: f32,
    /// Gold paid when the enemy is defeated.
    pub gold: u32,
    /// Score awarded when the enemy is defeated.
    pub score: u32,
    /// Lives lost when the enemy reaches the end of the path.
    pub lives: u32,
    /// Edge length of the square collision box.
    pub edge: f32,
}

/// Applies armor to a raw hit.
///
/// Penetration removes a fraction of the armor first; the remaining armor is
/// subtracted flat. Hits never drop below [`MIN_DAMAGE`] unless the raw
/// damage itself is smaller.
#[must_use]
pub fn mitigate(raw: f32, armor: f32, penetration: f32) -> f32 {
    if raw <= 0.0 {
        return 0.0;
    }
    let effective_armor = armor.max(0.0) * (1.0 - penetration.clamp(0.0, 1.0));
    (raw - effective_armor).max(MIN_DAMAGE.min(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cannon_hit_on_orc_ignores_a_quarter_of_the_armor() {
        let orc = EnemyKind::Orc.stats();
        let dealt = mitigate(40.0, orc.armor, 0.25);
        assert_eq!(dealt, 32.5);
        assert_eq!(orc.health - dealt, 117.5);
    }

    #[test]
    fn armor_never_reduces_below_the_floor() {
        assert_eq!(mitigate(10.0, 30.0, 0.0), MIN_DAMAGE);
        assert_eq!(mitigate(0.4, 30.0, 0.0), 0.4);
        assert_eq!(mitigate(0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn full_penetration_ignores_armor() {
        assert_eq!(mitigate(80.0, 30.0, 1.0), 80.0);
        assert_eq!(mitigate(80.0, 30.0, 3.0), 80.0);
    }
}
