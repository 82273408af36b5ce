//! Race resolution: validation, fuel, stats, randomness and reward propagation.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, FuelConfig, RaceConfig, SkillWeights};
use crate::constants::{LOG_RACE_LOST, LOG_RACE_WON};
use crate::error::Rejection;
use crate::fuel::{DifficultyBand, race_fuel_cost};
use crate::numbers::round_to_hundredths;
use crate::profile::PlayerProfile;
use crate::progression::{grant_experience, xp_gain};
use crate::rng::RngBundle;
use crate::skills::{SkillKind, SkillRoll, Skills, roll_skill_growth};
use crate::stats::effective_stats;

/// A rival offered by the opponent source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opponent {
    pub name: String,
    pub difficulty: f64,
    pub reward: i64,
    pub fuel_cost: u32,
}

impl Opponent {
    /// Build an opponent whose fuel cost is derived from its difficulty band.
    #[must_use]
    pub fn new(name: impl Into<String>, difficulty: f64, reward: i64, cfg: &FuelConfig) -> Self {
        Self {
            name: name.into(),
            difficulty,
            reward,
            fuel_cost: race_fuel_cost(difficulty, cfg),
        }
    }

    #[must_use]
    pub fn band(&self, cfg: &FuelConfig) -> DifficultyBand {
        DifficultyBand::classify(self.difficulty, &cfg.bands)
    }
}

/// Everything a single race produced. Not retained by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceOutcome {
    pub won: bool,
    /// Seconds, two decimals.
    pub player_time: f64,
    /// Seconds, two decimals.
    pub opponent_time: f64,
    pub xp_gained: u64,
    /// Reward on a win, the lost bet (negative) on a loss.
    pub money_delta: i64,
    pub fuel_spent: u32,
    pub nitro_activated: bool,
    pub skill_roll: SkillRoll,
    pub leveled_up: bool,
    pub levels_gained: u32,
    /// Total level rewards paid out, when a level was gained.
    pub level_reward: Option<i64>,
    pub new_level: u32,
    pub log_key: String,
}

impl RaceOutcome {
    /// Skill raised by this race, with its new level.
    #[must_use]
    pub fn skill_gain(&self) -> Option<(SkillKind, u32)> {
        self.skill_roll
            .new_level
            .map(|level| (self.skill_roll.skill, level))
    }
}

/// Profile after the race together with the outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceResolution {
    pub profile: PlayerProfile,
    pub outcome: RaceOutcome,
}

/// Multiplier the driver's skills apply to car efficiency.
#[must_use]
pub fn skill_multiplier(skills: &Skills, weights: &SkillWeights) -> f64 {
    1.0 + weights.driving * f64::from(skills.driving)
        + weights.speed * f64::from(skills.speed)
        + weights.reaction * f64::from(skills.reaction)
        + weights.technique * f64::from(skills.technique)
}

/// Lap time for an efficiency, scaled by jitter and rounded to hundredths.
#[must_use]
pub fn race_time(efficiency: f64, jitter: f64, cfg: &RaceConfig) -> f64 {
    let efficiency = efficiency.max(cfg.min_efficiency);
    round_to_hundredths(cfg.base_seconds * (cfg.reference_efficiency / efficiency) * jitter)
}

/// Compare rounded race times. Ties go to the opponent.
#[must_use]
pub fn player_wins(player_time: f64, opponent_time: f64) -> bool {
    player_time < opponent_time
}

/// Run one race for the car in `car_index` against `opponent`, staking `bet`.
///
/// The input profile is never modified; the returned resolution carries the
/// next profile. Rejections leave no trace.
///
/// # Errors
///
/// [`Rejection::UnknownCar`], [`Rejection::InvalidBet`] for a negative bet,
/// [`Rejection::InsufficientFunds`] when the bet exceeds money, and
/// [`Rejection::InsufficientFuel`] when the tank cannot cover the race.
pub fn resolve_race(
    profile: &PlayerProfile,
    car_index: usize,
    opponent: &Opponent,
    bet: i64,
    now: i64,
    cfg: &EngineConfig,
    rng: &RngBundle,
) -> Result<RaceResolution, Rejection> {
    let car = profile.car(car_index)?;
    if bet < 0 {
        return Err(Rejection::InvalidBet { amount: bet });
    }
    profile.ensure_funds(bet)?;
    let available = car.current_fuel(now, &cfg.fuel);
    if available < opponent.fuel_cost {
        return Err(Rejection::InsufficientFuel {
            have: available,
            need: opponent.fuel_cost,
        });
    }

    let mut next = profile.clone();
    let car = next.car_mut(car_index)?;
    car.spend_fuel(opponent.fuel_cost, now, &cfg.fuel)?;
    let stats = effective_stats(car, cfg);
    let has_nitro = car.special_parts.nitro;

    let mut player_efficiency =
        stats.average() * skill_multiplier(&next.skills, &cfg.race.skill_weights);
    let nitro_activated = has_nitro && rng.nitro().gen_range(0.0..1.0) < cfg.parts.nitro_chance;
    if nitro_activated {
        player_efficiency *= cfg.parts.nitro_boost;
    }
    let opponent_efficiency = cfg.race.opponent_efficiency_per_difficulty * opponent.difficulty;

    let jitter_range = cfg.race.jitter_min..=cfg.race.jitter_max;
    let player_jitter = rng.jitter().gen_range(jitter_range.clone());
    let opponent_jitter = rng.jitter().gen_range(jitter_range);
    let player_time = race_time(player_efficiency, player_jitter, &cfg.race);
    let opponent_time = race_time(opponent_efficiency, opponent_jitter, &cfg.race);
    // Ties go to the opponent.
    let won = player_wins(player_time, opponent_time);

    next.stats.total_races += 1;
    next.stats.fuel_spent += u64::from(opponent.fuel_cost);
    // Rewards come from an external source; a negative purse pays nothing.
    let reward = opponent.reward.max(0);
    let money_delta = if won {
        next.money += reward;
        next.stats.money_earned += reward;
        next.stats.wins += 1;
        reward
    } else {
        next.money -= bet;
        next.stats.money_spent += bet;
        next.stats.losses += 1;
        -bet
    };

    let xp_gained = xp_gain(won, opponent.difficulty, bet, &cfg.progression);
    let level_up = grant_experience(&mut next, xp_gained, &cfg.progression);
    let skill_roll = roll_skill_growth(&mut next.skills, won, &cfg.skills, &mut *rng.skill());

    let log_key = if won { LOG_RACE_WON } else { LOG_RACE_LOST };
    log::debug!(
        "{} vs {} (d{:.2}): {player_time:.2}s / {opponent_time:.2}s, nitro={nitro_activated}, xp+{xp_gained}",
        next.id,
        opponent.name,
        opponent.difficulty
    );

    let outcome = RaceOutcome {
        won,
        player_time,
        opponent_time,
        xp_gained,
        money_delta,
        fuel_spent: opponent.fuel_cost,
        nitro_activated,
        skill_roll,
        leveled_up: level_up.leveled_up(),
        levels_gained: level_up.levels_gained,
        level_reward: level_up.leveled_up().then_some(level_up.reward),
        new_level: level_up.new_level,
        log_key: log_key.to_string(),
    };
    Ok(RaceResolution {
        profile: next,
        outcome,
    })
}
