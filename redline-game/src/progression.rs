//! Experience curve and level-up resolution.
use serde::{Deserialize, Serialize};

use crate::config::ProgressionConfig;
use crate::numbers::floor_f64_to_u64;
use crate::profile::PlayerProfile;

/// Cumulative experience needed to stand at `level`.
#[must_use]
pub fn required_xp(level: u32, cfg: &ProgressionConfig) -> u64 {
    let exponent = i32::try_from(level.saturating_sub(1)).unwrap_or(i32::MAX);
    floor_f64_to_u64(cfg.xp_base * cfg.xp_growth.powi(exponent))
}

/// Money granted on reaching `level`.
#[must_use]
pub fn level_reward(level: u32, cfg: &ProgressionConfig) -> i64 {
    cfg.reward_per_level.saturating_mul(i64::from(level))
}

/// Experience earned by a single race.
#[must_use]
pub fn xp_gain(won: bool, difficulty: f64, bet: i64, cfg: &ProgressionConfig) -> u64 {
    let base = if won { cfg.win_xp } else { cfg.loss_xp };
    let from_difficulty = floor_f64_to_u64(difficulty * cfg.xp_per_difficulty);
    let from_bet = u64::try_from(bet / cfg.bet_xp_divisor.max(1)).unwrap_or(0);
    base.saturating_add(from_difficulty).saturating_add(from_bet)
}

/// Levels crossed by one experience grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LevelUp {
    pub levels_gained: u32,
    /// Sum of the rewards for every level crossed.
    pub reward: i64,
    pub new_level: u32,
}

impl LevelUp {
    #[must_use]
    pub const fn leveled_up(&self) -> bool {
        self.levels_gained > 0
    }
}

/// Add experience and resolve every level threshold it crosses.
///
/// A single large grant may cross several levels; each one pays its own reward.
pub fn grant_experience(profile: &mut PlayerProfile, xp: u64, cfg: &ProgressionConfig) -> LevelUp {
    profile.experience = profile.experience.saturating_add(xp);
    let mut outcome = LevelUp {
        new_level: profile.level,
        ..LevelUp::default()
    };
    while profile.level < u32::MAX {
        let threshold = required_xp(profile.level + 1, cfg);
        // A saturated curve has no further reachable level.
        if threshold == u64::MAX || profile.experience < threshold {
            break;
        }
        profile.level += 1;
        let reward = level_reward(profile.level, cfg);
        profile.money = profile.money.saturating_add(reward);
        outcome.levels_gained += 1;
        outcome.reward = outcome.reward.saturating_add(reward);
        log::info!(
            "profile {} reached level {} (+{reward})",
            profile.id,
            profile.level
        );
    }
    outcome.new_level = profile.level;
    outcome
}

/// Experience still missing before the next level.
#[must_use]
pub fn xp_to_next_level(profile: &PlayerProfile, cfg: &ProgressionConfig) -> u64 {
    required_xp(profile.level.saturating_add(1), cfg).saturating_sub(profile.experience)
}
