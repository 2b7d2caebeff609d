use std::time::Duration;

use waypoint_defence_core::{
    Command, EnemyKind, EnemySnapshot, EntityId, Event, GameStatus, PlacementError, Size,
    TileCoord, TileState, TowerKind, UpgradeError, UpgradePath, Vec2,
};
use waypoint_defence_world::{apply, query, World};

struct Harness {
    world: World,
}

impl Harness {
    fn new(gold: u32, lives: u32) -> Self {
        let mut harness = Self {
            world: World::new(),
        };
        let _ = harness.run(Command::ConfigureTileGrid {
            viewport: Size::new(800.0, 600.0),
            columns: 20,
            tile_length: 40.0,
        });
        let _ = harness.run(Command::ConfigurePath {
            waypoints: vec![Vec2::new(0.0, 300.0), Vec2::new(800.0, 300.0)],
        });
        let _ = harness.run(Command::Reset { gold, lives });
        harness
    }

    fn run(&mut self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        apply(&mut self.world, command, &mut events);
        events
    }

    fn tick(&mut self, millis: u64) -> Vec<Event> {
        self.run(Command::Tick {
            dt: Duration::from_millis(millis),
        })
    }

    fn place(&mut self, kind: TowerKind, x: f32, y: f32) -> EntityId {
        let events = self.run(Command::PlaceTower {
            kind,
            position: Vec2::new(x, y),
        });
        events
            .iter()
            .find_map(|event| match event {
                Event::TowerPlaced { tower, .. } => Some(*tower),
                _ => None,
            })
            .expect("tower placed")
    }

    fn spawn(&mut self, kind: EnemyKind) -> EntityId {
        let events = self.run(Command::SpawnEnemy { kind });
        match events.as_slice() {
            [Event::EnemySpawned { enemy, .. }] => *enemy,
            other => panic!("unexpected spawn events: {other:?}"),
        }
    }

    fn fire(&mut self, tower: EntityId, targets: Vec<EntityId>) -> Vec<Event> {
        self.run(Command::FireProjectile {
            tower,
            targets,
            critical: false,
        })
    }

    fn upgrade(&mut self, tower: EntityId, path: UpgradePath) {
        let events = self.run(Command::UpgradeTower { tower, path });
        assert!(matches!(events.first(), Some(Event::TowerUpgraded { .. })));
    }

    /// Ticks in 16 ms frames until the projectile in flight lands.
    fn tick_until_resolved(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        for _ in 0..120 {
            events.extend(self.tick(16));
            if events
                .iter()
                .any(|event| matches!(event, Event::ProjectileResolved { .. }))
            {
                return events;
            }
        }
        panic!("projectile never resolved: {events:?}");
    }

    fn enemy(&self, enemy: EntityId) -> Option<EnemySnapshot> {
        query::enemy_view(&self.world)
            .iter()
            .find(|snapshot| snapshot.id == enemy)
            .copied()
    }

    fn health(&self, enemy: EntityId) -> Option<f32> {
        self.enemy(enemy).map(|snapshot| snapshot.health)
    }
}

fn rejection(events: &[Event]) -> Option<PlacementError> {
    events.iter().find_map(|event| match event {
        Event::TowerPlacementRejected { reason, .. } => Some(*reason),
        _ => None,
    })
}

fn upgrade_rejection(events: &[Event]) -> Option<UpgradeError> {
    events.iter().find_map(|event| match event {
        Event::TowerUpgradeRejected { reason, .. } => Some(*reason),
        _ => None,
    })
}

#[test]
fn placement_snaps_to_the_tile_center() {
    let mut harness = Harness::new(500, 10);
    let events = harness.run(Command::PlaceTower {
        kind: TowerKind::Archer,
        position: Vec2::new(226.0, 131.0),
    });

    match events.first() {
        Some(Event::TowerPlaced { tile, center, .. }) => {
            assert_eq!(*tile, TileCoord::new(5, 3));
            assert_eq!(*center, Vec2::new(220.0, 140.0));
        }
        other => panic!("expected placement, got {other:?}"),
    }
    assert_eq!(query::economy(&harness.world).gold(), 450);
    assert_eq!(
        query::tile_grid(&harness.world).state(TileCoord::new(5, 3)),
        Some(TileState::Occupied)
    );

    let second = harness.run(Command::PlaceTower {
        kind: TowerKind::Cannon,
        position: Vec2::new(215.0, 145.0),
    });
    assert_eq!(rejection(&second), Some(PlacementError::TileUnavailable));
    assert_eq!(query::economy(&harness.world).gold(), 450);
}

#[test]
fn placement_rejections_leave_no_trace() {
    let mut harness = Harness::new(120, 10);

    let on_path = harness.run(Command::PlaceTower {
        kind: TowerKind::Archer,
        position: Vec2::new(300.0, 300.0),
    });
    assert_eq!(rejection(&on_path), Some(PlacementError::TileUnavailable));

    let outside = harness.run(Command::PlaceTower {
        kind: TowerKind::Archer,
        position: Vec2::new(-20.0, 300.0),
    });
    assert_eq!(rejection(&outside), Some(PlacementError::NoTile));

    let too_expensive = harness.run(Command::PlaceTower {
        kind: TowerKind::Sniper,
        position: Vec2::new(220.0, 140.0),
    });
    assert_eq!(rejection(&too_expensive), Some(PlacementError::InsufficientGold));
    assert!(query::tile_grid(&harness.world).can_place(TileCoord::new(5, 3)));

    let _ = harness.run(Command::SetStatus {
        status: GameStatus::Paused,
    });
    let paused = harness.run(Command::PlaceTower {
        kind: TowerKind::Archer,
        position: Vec2::new(220.0, 140.0),
    });
    assert_eq!(rejection(&paused), Some(PlacementError::InvalidStatus));

    assert_eq!(query::economy(&harness.world).gold(), 120);
    assert!(query::tower_view(&harness.world).is_empty());
}

#[test]
fn towers_placed_this_frame_can_be_upgraded() {
    let mut harness = Harness::new(500, 10);
    let tower = harness.place(TowerKind::Archer, 220.0, 140.0);

    let events = harness.run(Command::UpgradeTower {
        tower,
        path: UpgradePath::First,
    });
    assert!(matches!(events.first(), Some(Event::TowerUpgraded { .. })));
    assert_eq!(query::economy(&harness.world).gold(), 500 - 50 - 30);

    let locked = harness.run(Command::UpgradeTower {
        tower,
        path: UpgradePath::Second,
    });
    assert_eq!(upgrade_rejection(&locked), Some(UpgradeError::PathLocked));

    let missing = harness.run(Command::UpgradeTower {
        tower: EntityId::new(999),
        path: UpgradePath::First,
    });
    assert_eq!(upgrade_rejection(&missing), Some(UpgradeError::MissingTower));

    let snapshot = query::tower(&harness.world, tower).expect("tower exists");
    assert_eq!(snapshot.level.get(), 1);
    assert_eq!(snapshot.path, Some(UpgradePath::First));
}

#[test]
fn upgrades_stop_at_level_three_and_require_gold() {
    let mut harness = Harness::new(50 + 30 + 50 + 80, 10);
    let tower = harness.place(TowerKind::Archer, 220.0, 140.0);

    for _ in 0..3 {
        let events = harness.run(Command::UpgradeTower {
            tower,
            path: UpgradePath::Second,
        });
        assert!(matches!(events.first(), Some(Event::TowerUpgraded { .. })));
    }
    assert_eq!(query::economy(&harness.world).gold(), 0);

    let capped = harness.run(Command::UpgradeTower {
        tower,
        path: UpgradePath::Second,
    });
    assert_eq!(upgrade_rejection(&capped), Some(UpgradeError::MaxLevel));

    let mut poor = Harness::new(60, 10);
    let archer = poor.place(TowerKind::Archer, 220.0, 140.0);
    let _ = poor.run(Command::SpendGold { amount: 5 });
    let broke = poor.run(Command::UpgradeTower {
        tower: archer,
        path: UpgradePath::First,
    });
    assert_eq!(upgrade_rejection(&broke), Some(UpgradeError::InsufficientGold));
    assert_eq!(query::economy(&poor.world).gold(), 5);
    assert_eq!(
        query::tower(&poor.world, archer).map(|tower| tower.level.get()),
        Some(0)
    );
}

#[test]
fn cannon_hit_on_an_orc_respects_armor_penetration() {
    let mut harness = Harness::new(500, 10);
    let cannon = harness.place(TowerKind::Cannon, 140.0, 260.0);
    let orc = harness.spawn(EnemyKind::Orc);
    let _ = harness.tick(100);

    let fired = harness.fire(cannon, vec![orc]);
    assert!(matches!(fired.as_slice(), [Event::ProjectileFired { .. }]));

    let events = harness.tick(1_000);
    let resolved: Vec<_> = events
        .iter()
        .filter(|event| matches!(event, Event::ProjectileResolved { hits: 1, .. }))
        .collect();
    assert_eq!(resolved.len(), 1);
    assert_eq!(harness.health(orc), Some(117.5));
}

#[test]
fn cannon_splash_damages_neighbours_and_spares_the_target() {
    let mut harness = Harness::new(500, 10);
    let cannon = harness.place(TowerKind::Cannon, 60.0, 260.0);
    let orc = harness.spawn(EnemyKind::Orc);
    let goblin = harness.spawn(EnemyKind::Goblin);
    let _ = harness.tick(16);

    let _ = harness.fire(cannon, vec![orc]);
    let events = harness.tick_until_resolved();

    assert!(events
        .iter()
        .any(|event| matches!(event, Event::ProjectileResolved { hits: 2, .. })));
    assert_eq!(harness.health(orc), Some(117.5), "direct target is hit once");

    // Splash deals 40 * 0.5 * (1 - 0.5 * d / 50) for d within the radius.
    let goblin = harness.health(goblin).expect("goblin survives the splash");
    assert!((30.0..40.0).contains(&goblin), "goblin health {goblin}");
}

#[test]
fn poison_sticks_to_the_direct_target_and_ticks_every_half_second() {
    let mut harness = Harness::new(500, 10);
    let archer = harness.place(TowerKind::Archer, 60.0, 260.0);
    harness.upgrade(archer, UpgradePath::Second);
    let troll = harness.spawn(EnemyKind::Troll);
    let goblin = harness.spawn(EnemyKind::Goblin);
    let _ = harness.tick(16);

    let _ = harness.fire(archer, vec![troll]);
    let _ = harness.tick_until_resolved();

    let poisoned = harness.enemy(troll).expect("troll alive");
    assert_eq!(poisoned.health, 399.0, "armor leaves the minimum hit");
    assert!(poisoned.poisoned);
    assert!(!harness.enemy(goblin).expect("goblin alive").poisoned);

    let _ = harness.tick(250);
    assert_eq!(harness.health(troll), Some(399.0));
    let _ = harness.tick(300);
    assert_eq!(harness.health(troll), Some(396.0));
    let _ = harness.tick(500);
    assert_eq!(harness.health(troll), Some(393.0));

    let _ = harness.tick(5_000);
    let expired = harness.enemy(troll).expect("troll alive");
    assert_eq!(expired.health, 399.0 - 6.0 * 3.0);
    assert!(!expired.poisoned);
}

#[test]
fn cannon_stun_applies_to_direct_and_splash_victims() {
    let mut harness = Harness::new(500, 10);
    let cannon = harness.place(TowerKind::Cannon, 60.0, 260.0);
    harness.upgrade(cannon, UpgradePath::Second);
    let orc = harness.spawn(EnemyKind::Orc);
    let goblin = harness.spawn(EnemyKind::Goblin);
    let _ = harness.tick(16);

    let _ = harness.fire(cannon, vec![orc]);
    let events = harness.tick_until_resolved();
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::ProjectileResolved { hits: 2, .. })));

    let stunned_orc = harness.enemy(orc).expect("orc alive");
    let stunned_goblin = harness.enemy(goblin).expect("goblin alive");
    assert!(stunned_orc.stunned);
    assert!(stunned_goblin.stunned);

    let _ = harness.tick(100);
    assert_eq!(
        harness.enemy(goblin).map(|enemy| enemy.progress),
        Some(stunned_goblin.progress),
        "stunned enemies stand still"
    );

    let _ = harness.tick(300);
    assert!(!harness.enemy(orc).expect("orc alive").stunned);
    assert!(!harness.enemy(goblin).expect("goblin alive").stunned);
}

#[test]
fn towers_respect_their_cooldown() {
    let mut harness = Harness::new(500, 10);
    let cannon = harness.place(TowerKind::Cannon, 140.0, 260.0);
    let orc = harness.spawn(EnemyKind::Orc);
    let _ = harness.tick(100);

    assert_eq!(harness.fire(cannon, vec![orc]).len(), 1);
    assert!(harness.fire(cannon, vec![orc]).is_empty());

    let _ = harness.tick(1_999);
    assert!(harness.fire(cannon, vec![orc]).is_empty());
    let _ = harness.tick(1);
    assert_eq!(harness.fire(cannon, vec![orc]).len(), 1);
}

#[test]
fn second_shot_at_a_dead_target_is_discarded() {
    let mut harness = Harness::new(500, 10);
    let first = harness.place(TowerKind::Sniper, 140.0, 260.0);
    let second = harness.place(TowerKind::Sniper, 180.0, 260.0);
    let goblin = harness.spawn(EnemyKind::Goblin);
    let _ = harness.tick(100);

    let _ = harness.fire(first, vec![goblin]);
    let _ = harness.fire(second, vec![goblin]);
    let gold_before = query::economy(&harness.world).gold();
    let events = harness.tick(16);

    let resolved = events
        .iter()
        .filter(|event| matches!(event, Event::ProjectileResolved { .. }))
        .count();
    let discarded = events
        .iter()
        .filter(|event| matches!(event, Event::ProjectileDiscarded { .. }))
        .count();
    let defeated = events
        .iter()
        .filter(|event| matches!(event, Event::EnemyDefeated { .. }))
        .count();
    assert_eq!((resolved, discarded, defeated), (1, 1, 1));
    assert_eq!(query::economy(&harness.world).gold(), gold_before + 5);
    assert_eq!(query::economy(&harness.world).score(), 10);
    assert!(harness.health(goblin).is_none());
}

#[test]
fn chain_lightning_jumps_to_the_nearest_other_enemy() {
    let mut harness = Harness::new(500, 10);
    let magic = harness.place(TowerKind::Magic, 140.0, 220.0);
    let lead = harness.spawn(EnemyKind::Goblin);
    let _ = harness.tick(500);
    let trailing = harness.spawn(EnemyKind::Goblin);
    let _ = harness.tick(500);

    let _ = harness.fire(magic, vec![lead]);
    let events = harness.tick(1);

    assert!(events
        .iter()
        .any(|event| matches!(event, Event::ProjectileResolved { hits: 2, .. })));
    assert_eq!(harness.health(lead), Some(25.0));
    assert_eq!(harness.health(trailing), Some(32.5));

    let slowed = query::enemy_view(&harness.world)
        .iter()
        .all(|enemy| (enemy.slow - 0.2).abs() < f32::EPSILON);
    assert!(slowed);
}

#[test]
fn archer_volley_fires_one_projectile_per_slot() {
    let mut harness = Harness::new(500, 10);
    let archer = harness.place(TowerKind::Archer, 140.0, 260.0);
    let _ = harness.run(Command::UpgradeTower {
        tower: archer,
        path: UpgradePath::First,
    });
    let first = harness.spawn(EnemyKind::Goblin);
    let second = harness.spawn(EnemyKind::Goblin);
    let third = harness.spawn(EnemyKind::Goblin);
    let _ = harness.tick(16);

    let fired = harness.fire(archer, vec![first, second, third]);
    let targets: Vec<EntityId> = fired
        .iter()
        .filter_map(|event| match event {
            Event::ProjectileFired { target, .. } => Some(*target),
            _ => None,
        })
        .collect();
    assert_eq!(targets, vec![first, second]);
}

#[test]
fn leaks_cost_lives_until_the_game_is_over() {
    let mut harness = Harness::new(0, 6);
    let _ = harness.spawn(EnemyKind::Goblin);
    let events = harness.tick(11_000);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::EnemyLeaked { lives: 1, .. })));
    assert_eq!(query::economy(&harness.world).lives(), 5);
    assert_eq!(query::enemy_count(&harness.world), 0);

    let _ = harness.spawn(EnemyKind::Boss);
    let events = harness.tick(30_000);
    assert!(events.contains(&Event::StatusChanged {
        status: GameStatus::GameOver
    }));
    assert_eq!(query::economy(&harness.world).lives(), 0);

    assert!(harness.tick(16).is_empty());
}

#[test]
fn preparation_blocks_cover_the_path_entry() {
    let mut harness = Harness::new(500, 10);
    let _ = harness.run(Command::SetPreparationBlock { active: true });
    let grid = query::tile_grid(&harness.world);
    assert_eq!(
        grid.state(TileCoord::new(1, 6)),
        Some(TileState::PreparationBlocked)
    );

    let blocked = harness.run(Command::PlaceTower {
        kind: TowerKind::Archer,
        position: Vec2::new(60.0, 260.0),
    });
    assert_eq!(rejection(&blocked), Some(PlacementError::TileUnavailable));

    let _ = harness.run(Command::SetPreparationBlock { active: false });
    let _ = harness.place(TowerKind::Archer, 60.0, 260.0);
}

#[test]
fn spend_gold_never_overdraws() {
    let mut harness = Harness::new(40, 10);
    let events = harness.run(Command::SpendGold { amount: 50 });
    assert_eq!(events, vec![Event::GoldSpendRejected { amount: 50 }]);
    assert_eq!(query::economy(&harness.world).gold(), 40);

    let _ = harness.run(Command::SpendGold { amount: 40 });
    assert_eq!(query::economy(&harness.world).gold(), 0);
}
