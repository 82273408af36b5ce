//! Centralized balance and tuning constants for Redline game logic.
//!
//! These values are the canonical defaults behind [`crate::config::EngineConfig`].
//! Keeping them together means the economy can only drift through a reviewed
//! code change or an explicit config override.

// Fuel ---------------------------------------------------------------------
pub(crate) const FUEL_REGEN_MINUTES: u32 = 10;
pub(crate) const FUEL_BASE_CAPACITY: u32 = 30;
pub(crate) const FUEL_TANK_CAPACITY: u32 = 40;
pub(crate) const FUEL_BASE_CONSUMPTION: f64 = 5.0;
pub(crate) const FUEL_UNIT_PRICE: i64 = 20;
pub(crate) const MS_PER_MINUTE: i64 = 60_000;

// Difficulty bands: upper bound (exclusive) and fuel multiplier.
pub(crate) const BAND_EASY_MAX: f64 = 1.0;
pub(crate) const BAND_MEDIUM_MAX: f64 = 1.4;
pub(crate) const BAND_HARD_MAX: f64 = 1.8;
pub(crate) const BAND_EASY_FUEL: f64 = 1.0;
pub(crate) const BAND_MEDIUM_FUEL: f64 = 1.5;
pub(crate) const BAND_HARD_FUEL: f64 = 2.0;
pub(crate) const BAND_EXTREME_FUEL: f64 = 2.5;

// Upgrade tiers ------------------------------------------------------------
pub(crate) const TIER_BUDGET_MAX_PRICE: i64 = 8_000;
pub(crate) const TIER_BUDGET_CAP: u8 = 5;
pub(crate) const TIER_MID_MAX_PRICE: i64 = 35_000;
pub(crate) const TIER_MID_CAP: u8 = 7;
pub(crate) const TIER_TOP_CAP: u8 = 10;
pub(crate) const DISCOUNT_FACTOR: f64 = 0.5;

// Special parts ------------------------------------------------------------
pub(crate) const BODY_KIT_BONUS: i32 = 10;
pub(crate) const ECU_TUNE_MULTIPLIER: f64 = 1.15;
pub(crate) const NITRO_CHANCE: f64 = 0.3;
pub(crate) const NITRO_BOOST: f64 = 1.2;
pub(crate) const NITRO_PRICE: i64 = 15_000;
pub(crate) const BODY_KIT_PRICE: i64 = 8_000;
pub(crate) const ECU_TUNE_PRICE: i64 = 12_000;
pub(crate) const FUEL_TANK_PRICE: i64 = 5_000;

// Progression --------------------------------------------------------------
pub(crate) const XP_BASE: f64 = 100.0;
pub(crate) const XP_GROWTH: f64 = 1.5;
pub(crate) const LEVEL_REWARD_PER_LEVEL: i64 = 500;
pub(crate) const XP_WIN: u64 = 50;
pub(crate) const XP_LOSS: u64 = 20;
pub(crate) const XP_PER_DIFFICULTY: f64 = 30.0;
pub(crate) const XP_BET_DIVISOR: i64 = 100;

// Skills -------------------------------------------------------------------
pub(crate) const SKILL_WIN_CHANCE: f64 = 50.0;
pub(crate) const SKILL_LOSS_CHANCE: f64 = 20.0;
pub(crate) const SKILL_DECAY_PER_POINT: f64 = 0.1;
pub(crate) const SKILL_CHANCE_FLOOR: f64 = 1.0;

// Race ---------------------------------------------------------------------
pub(crate) const RACE_BASE_SECONDS: f64 = 60.0;
pub(crate) const RACE_REFERENCE_EFFICIENCY: f64 = 100.0;
pub(crate) const OPPONENT_EFFICIENCY_PER_DIFFICULTY: f64 = 60.0;
pub(crate) const RACE_JITTER_MIN: f64 = 0.95;
pub(crate) const RACE_JITTER_MAX: f64 = 1.05;
pub(crate) const RACE_MIN_EFFICIENCY: f64 = 1.0;
pub(crate) const SKILL_WEIGHT_DRIVING: f64 = 0.002;
pub(crate) const SKILL_WEIGHT_SPEED: f64 = 0.002;
pub(crate) const SKILL_WEIGHT_REACTION: f64 = 0.0015;
pub(crate) const SKILL_WEIGHT_TECHNIQUE: f64 = 0.0015;

// Garage -------------------------------------------------------------------
pub(crate) const RESALE_RATIO: f64 = 0.5;
pub(crate) const STARTING_MONEY: i64 = 5_000;

// Logging keys -------------------------------------------------------------
pub(crate) const LOG_RACE_WON: &str = "log.race.won";
pub(crate) const LOG_RACE_LOST: &str = "log.race.lost";
pub(crate) const LOG_LEVEL_UP: &str = "log.level.up";
pub(crate) const LOG_SKILL_UP: &str = "log.skill.up";
pub(crate) const LOG_TASK_COMPLETE: &str = "log.task.complete";
pub(crate) const LOG_ACHIEVEMENT_UNLOCKED: &str = "log.achievement.unlocked";
