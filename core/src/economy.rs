//! Immutable economy snapshot and the reducers that replace it.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a game session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Nothing is running yet.
    Menu,
    /// Between waves; towers may be placed.
    Preparing,
    /// A wave is in flight.
    Playing,
    /// Ticks are suspended.
    Paused,
    /// Lives ran out.
    GameOver,
    /// The final wave was cleared.
    Victory,
}

impl GameStatus {
    /// Reports whether the session ended.
    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::GameOver | Self::Victory)
    }

    /// Reports whether towers may be placed or upgraded.
    #[must_use]
    pub const fn accepts_construction(self) -> bool {
        matches!(self, Self::Preparing | Self::Playing)
    }
}

/// Gold, lives, score, wave index and status of a session.
///
/// The value is never mutated in place; every reducer returns a new snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameState {
    gold: u32,
    lives: u32,
    score: u64,
    wave: u32,
    status: GameStatus,
}

impl GameState {
    /// Creates a fresh session in the preparing status at wave zero.
    #[must_use]
    pub const fn new(gold: u32, lives: u32) -> Self {
        Self {
            gold,
            lives,
            score: 0,
            wave: 0,
            status: GameStatus::Preparing,
        }
    }

    /// Gold available for spending.
    #[must_use]
    pub const fn gold(&self) -> u32 {
        self.gold
    }

    /// Lives remaining.
    #[must_use]
    pub const fn lives(&self) -> u32 {
        self.lives
    }

    /// Accumulated score.
    #[must_use]
    pub const fn score(&self) -> u64 {
        self.score
    }

    /// Index of the most recently started wave, zero before the first one.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.wave
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> GameStatus {
        self.status
    }

    /// Reports whether `amount` can be spent.
    #[must_use]
    pub const fn can_afford(&self, amount: u32) -> bool {
        self.gold >= amount
    }

    /// Deducts `amount`, or returns `None` leaving the caller's snapshot intact.
    #[must_use]
    pub const fn spend_gold(self, amount: u32) -> Option<Self> {
        match self.gold.checked_sub(amount) {
            Some(gold) => Some(Self { gold, ..self }),
            None => None,
        }
    }

    /// Adds gold, saturating at `u32::MAX`.
    #[must_use]
    pub const fn add_gold(self, amount: u32) -> Self {
        Self {
            gold: self.gold.saturating_add(amount),
            ..self
        }
    }

    /// Adds score.
    #[must_use]
    pub const fn add_score(self, amount: u32) -> Self {
        Self {
            score: self.score.saturating_add(amount as u64),
            ..self
        }
    }

    /// Removes lives; reaching zero switches the status to game over.
    #[must_use]
    pub const fn lose_lives(self, amount: u32) -> Self {
        let lives = self.lives.saturating_sub(amount);
        let status = if lives == 0 {
            GameStatus::GameOver
        } else {
            self.status
        };
        Self {
            lives,
            status,
            ..self
        }
    }

    /// Replaces the status.
    #[must_use]
    pub const fn with_status(self, status: GameStatus) -> Self {
        Self { status, ..self }
    }

    /// Records that wave `wave` started.
    #[must_use]
    pub const fn advance_wave(self, wave: u32) -> Self {
        Self { wave, ..self }
    }
}
