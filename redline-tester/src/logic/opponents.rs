use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use redline_game::{EngineConfig, FuelConfig, Opponent, OpponentSource, PlayerProfile};

const RIVAL_NAMES: [&str; 8] = [
    "Kade", "Rook", "Vesper", "Juno", "Marlowe", "Ash", "Nyx", "Sol",
];
const LINEUP_SIZE: usize = 3;
const BASE_DIFFICULTY: f64 = 0.7;
const DIFFICULTY_PER_LEVEL: f64 = 0.08;
const DIFFICULTY_SPREAD: f64 = 0.3;
const MIN_DIFFICULTY: f64 = 0.5;
const MAX_DIFFICULTY: f64 = 3.0;

/// Seeded opponent lineups that scale with the player's level.
#[derive(Debug, Clone)]
pub struct LineupGenerator {
    rng: ChaCha20Rng,
    fuel: FuelConfig,
    size: usize,
}

impl LineupGenerator {
    #[must_use]
    pub fn new(seed: u64, cfg: &EngineConfig) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            fuel: cfg.fuel.clone(),
            size: LINEUP_SIZE,
        }
    }

    /// Difficulty the lineup centres on for a player level.
    #[must_use]
    pub fn centre_difficulty(level: u32) -> f64 {
        let steps = f64::from(level.saturating_sub(1));
        (BASE_DIFFICULTY + steps * DIFFICULTY_PER_LEVEL).min(MAX_DIFFICULTY)
    }

    /// Purse offered for beating an opponent, rounded to 50.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn reward_for(difficulty: f64) -> i64 {
        let raw = 900.0f64.mul_add(difficulty * difficulty, 200.0);
        ((raw / 50.0).round() as i64) * 50
    }
}

impl OpponentSource for LineupGenerator {
    fn opponents(&mut self, profile: &PlayerProfile) -> Vec<Opponent> {
        let centre = Self::centre_difficulty(profile.level);
        (0..self.size)
            .map(|_| {
                let offset = self.rng.gen_range(-DIFFICULTY_SPREAD..=DIFFICULTY_SPREAD);
                let difficulty = ((centre + offset) * 100.0).round() / 100.0;
                let difficulty = difficulty.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY);
                let name = RIVAL_NAMES[self.rng.gen_range(0..RIVAL_NAMES.len())];
                Opponent::new(name, difficulty, Self::reward_for(difficulty), &self.fuel)
            })
            .collect()
    }
}
