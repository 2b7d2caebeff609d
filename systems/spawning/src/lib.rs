#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system responsible for emitting enemy spawn commands.

use std::{collections::VecDeque, time::Duration};

use waypoint_defence_core::{Command, EnemyKind, Event, GameStatus, Wave};

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    spawn_interval: Duration,
}

impl Config {
    /// Creates a new configuration using the provided spawn cadence.
    #[must_use]
    pub const fn new(spawn_interval: Duration) -> Self {
        Self { spawn_interval }
    }
}

/// Pure system that releases the queued enemies of a wave at a fixed cadence.
#[derive(Debug)]
pub struct Spawning {
    spawn_interval: Duration,
    accumulator: Duration,
    queue: VecDeque<EnemyKind>,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            spawn_interval: config.spawn_interval,
            accumulator: Duration::ZERO,
            queue: VecDeque::new(),
        }
    }

    /// Queues every enemy of `wave`, replacing anything still pending.
    pub fn begin_wave(&mut self, wave: Wave) {
        self.queue = wave.enemies.into();
        self.accumulator = Duration::ZERO;
    }

    /// Drops every queued enemy.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.accumulator = Duration::ZERO;
    }

    /// Enemy kinds still waiting to enter, in spawn order.
    pub fn pending(&self) -> impl ExactSizeIterator<Item = EnemyKind> + '_ {
        self.queue.iter().copied()
    }

    /// Consumes events to emit one spawn command per elapsed interval.
    pub fn handle(&mut self, events: &[Event], status: GameStatus, out: &mut Vec<Command>) {
        if status != GameStatus::Playing {
            self.accumulator = Duration::ZERO;
            return;
        }

        if self.spawn_interval.is_zero() || self.queue.is_empty() {
            self.accumulator = Duration::ZERO;
            return;
        }

        let mut accumulated = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                accumulated = accumulated.saturating_add(*dt);
            }
        }

        if accumulated.is_zero() {
            return;
        }

        self.accumulator = self.accumulator.saturating_add(accumulated);
        let spawn_attempts = self.resolve_spawn_attempts();

        for _ in 0..spawn_attempts {
            let Some(kind) = self.queue.pop_front() else {
                self.accumulator = Duration::ZERO;
                break;
            };
            out.push(Command::SpawnEnemy { kind });
        }
    }

    fn resolve_spawn_attempts(&mut self) -> usize {
        if self.spawn_interval.is_zero() {
            return 0;
        }

        let mut attempts = 0;
        while self.accumulator >= self.spawn_interval {
            self.accumulator -= self.spawn_interval;
            attempts += 1;
        }
        attempts
    }
}
