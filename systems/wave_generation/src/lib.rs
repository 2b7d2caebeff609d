#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic weighted wave generation system.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};
use waypoint_defence_core::{EnemyKind, Wave};

const BASE_SLOTS: u32 = 5;
const SLOTS_PER_WAVE: u32 = 2;
const BOSS_INTERVAL: u32 = 5;

/// Pure system that generates deterministic [`Wave`] compositions.
///
/// Every wave draws from its own random stream derived from the global seed
/// and the wave index, so generating wave 7 yields the same composition
/// whether or not waves 1 through 6 were generated first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WaveGeneration {
    seed: u64,
}

impl WaveGeneration {
    /// Creates a generator for the provided global seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Generates the composition of the one-based wave `index`.
    ///
    /// Wave zero does not exist and yields an empty composition.
    #[must_use]
    pub fn generate(&self, index: u32) -> Wave {
        if index == 0 {
            return Wave {
                index,
                enemies: Vec::new(),
            };
        }

        let mut rng = ChaCha8Rng::from_seed(derive_wave_seed(self.seed, index));
        let weights = SlotWeights::for_wave(index);
        let slots = BASE_SLOTS.saturating_add(SLOTS_PER_WAVE.saturating_mul(index));

        let mut enemies = Vec::with_capacity(slots as usize + 1);
        for _ in 0..slots {
            enemies.push(weights.pick(rng.gen::<f64>()));
        }
        if index % BOSS_INTERVAL == 0 {
            enemies.push(EnemyKind::Boss);
        }

        Wave { index, enemies }
    }
}

/// Probabilities of drawing each regular kind for a single slot.
#[derive(Clone, Copy, Debug, PartialEq)]
struct SlotWeights {
    goblin: f64,
    orc: f64,
    troll: f64,
}

impl SlotWeights {
    fn for_wave(index: u32) -> Self {
        let n = f64::from(index);
        Self {
            goblin: (0.8 - 0.05 * n).max(0.1),
            orc: (0.2 + 0.03 * n).min(0.6),
            troll: ((n - 5.0) * 0.02).max(0.0).min(0.3),
        }
    }

    /// Maps a uniform draw in `[0, 1)` onto a kind; the remainder falls back to goblins.
    fn pick(&self, draw: f64) -> EnemyKind {
        if draw < self.goblin {
            EnemyKind::Goblin
        } else if draw < self.goblin + self.orc {
            EnemyKind::Orc
        } else if draw < self.goblin + self.orc + self.troll {
            EnemyKind::Troll
        } else {
            EnemyKind::Goblin
        }
    }
}

fn derive_wave_seed(global_seed: u64, wave: u32) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(global_seed.to_le_bytes());
    hasher.update(wave.to_le_bytes());
    let digest = hasher.finalize();
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&digest);
    seed
}
