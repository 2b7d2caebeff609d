//! Authoritative tower state and its upgrade state machine.

use std::time::Duration;

use waypoint_defence_core::{
    AttackProfile, Bounds, EntityId, TileCoord, TowerKind, TowerSnapshot, UpgradeError,
    UpgradeLevel, UpgradePath, Vec2,
};

/// Tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TowerState {
    /// Identifier allocated by the world for the tower.
    pub(crate) id: EntityId,
    /// Kind of tower that was constructed.
    pub(crate) kind: TowerKind,
    /// Tile occupied by the tower.
    pub(crate) tile: TileCoord,
    bounds: Bounds,
    level: UpgradeLevel,
    path: Option<UpgradePath>,
    profile: AttackProfile,
    last_attack: Option<Duration>,
    pub(crate) active: bool,
}

impl TowerState {
    /// Creates an unupgraded tower centered on `center`.
    pub(crate) fn new(id: EntityId, kind: TowerKind, tile: TileCoord, center: Vec2) -> Self {
        Self {
            id,
            kind,
            tile,
            bounds: Bounds::centered_at(center, kind.footprint()),
            level: UpgradeLevel::ZERO,
            path: None,
            profile: kind.profile(UpgradeLevel::ZERO, None),
            last_attack: None,
            active: true,
        }
    }

    pub(crate) const fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub(crate) const fn profile(&self) -> &AttackProfile {
        &self.profile
    }

    /// Validates an upgrade along `path` and returns its gold cost.
    pub(crate) fn upgrade_cost(&self, path: UpgradePath) -> Result<u32, UpgradeError> {
        if self.path.is_some_and(|committed| committed != path) {
            return Err(UpgradeError::PathLocked);
        }
        self.kind
            .upgrade_cost(self.level)
            .ok_or(UpgradeError::MaxLevel)
    }

    /// Raises the level along `path` and recomputes the attack profile.
    ///
    /// Callers validate with [`TowerState::upgrade_cost`] and charge gold
    /// before committing.
    pub(crate) fn upgrade(&mut self, path: UpgradePath) -> Result<UpgradeLevel, UpgradeError> {
        let _ = self.upgrade_cost(path)?;
        let level = self.level.next().ok_or(UpgradeError::MaxLevel)?;
        self.level = level;
        self.path = Some(path);
        self.profile = self.kind.profile(level, self.path);
        Ok(level)
    }

    pub(crate) fn ready_at(&self, now: Duration) -> bool {
        self.snapshot().ready_at(now)
    }

    pub(crate) fn record_attack(&mut self, now: Duration) {
        self.last_attack = Some(now);
    }

    pub(crate) fn snapshot(&self) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            kind: self.kind,
            tile: self.tile,
            bounds: self.bounds,
            level: self.level,
            path: self.path,
            profile: self.profile,
            last_attack: self.last_attack,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn archer() -> TowerState {
        TowerState::new(
            EntityId::new(7),
            TowerKind::Archer,
            TileCoord::new(3, 4),
            Vec2::new(100.0, 100.0),
        )
    }

    #[test]
    fn tower_is_centered_on_its_tile() {
        let tower = archer();
        assert_eq!(tower.bounds().center(), Vec2::new(100.0, 100.0));
        assert_eq!(tower.bounds().origin(), Vec2::new(85.0, 85.0));
    }

    #[test]
    fn first_upgrade_commits_the_path() {
        let mut tower = archer();
        assert_eq!(tower.upgrade_cost(UpgradePath::First), Ok(30));
        let level = tower.upgrade(UpgradePath::First).expect("first upgrade succeeds");
        assert_eq!(level.get(), 1);

        assert_eq!(
            tower.upgrade(UpgradePath::Second),
            Err(UpgradeError::PathLocked)
        );
        assert_eq!(tower.snapshot().path, Some(UpgradePath::First));
        assert_eq!(tower.profile().volley, 2);
    }

    #[test]
    fn level_three_is_final() {
        let mut tower = archer();
        for _ in 0..3 {
            assert!(tower.upgrade(UpgradePath::Second).is_ok());
        }
        assert_eq!(tower.snapshot().level, UpgradeLevel::MAX);
        assert_eq!(
            tower.upgrade_cost(UpgradePath::Second),
            Err(UpgradeError::MaxLevel)
        );
        assert_eq!(tower.upgrade(UpgradePath::Second), Err(UpgradeError::MaxLevel));
        assert_eq!(
            tower.profile(),
            &TowerKind::Archer.profile(UpgradeLevel::MAX, Some(UpgradePath::Second))
        );
    }

    #[test]
    fn attacks_are_gated_by_the_attack_interval() {
        let mut tower = archer();
        assert!(tower.ready_at(Duration::ZERO));
        tower.record_attack(Duration::from_secs(1));
        assert!(!tower.ready_at(Duration::from_millis(1_500)));
        assert!(tower.ready_at(Duration::from_millis(1_667)));
    }
}
