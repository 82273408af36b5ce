//! Engine tuning configuration.
//!
//! Every field falls back to the canonical value from [`crate::constants`], so a
//! partial JSON document only needs to name what it overrides.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::car::{CarStats, SpecialPart, UpgradeKind};
use crate::constants;
use crate::error::ConfigError;

/// Complete tuning surface for the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub fuel: FuelConfig,
    #[serde(default)]
    pub upgrades: UpgradeTable,
    #[serde(default)]
    pub tiers: TierConfig,
    #[serde(default)]
    pub parts: PartsConfig,
    #[serde(default)]
    pub progression: ProgressionConfig,
    #[serde(default)]
    pub skills: SkillConfig,
    #[serde(default)]
    pub race: RaceConfig,
    #[serde(default)]
    pub economy: EconomyConfig,
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON document on top of the defaults and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check every section for out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fuel.validate()?;
        self.upgrades.validate()?;
        self.tiers.validate()?;
        self.parts.validate()?;
        self.progression.validate()?;
        self.skills.validate()?;
        self.race.validate()?;
        self.economy.validate()?;
        Ok(())
    }
}

fn ensure_min(field: &'static str, min: f64, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= min {
        Ok(())
    } else {
        Err(ConfigError::MinViolation { field, min, value })
    }
}

fn ensure_range(field: &'static str, min: f64, max: f64, value: f64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::RangeViolation {
            field,
            min,
            max,
            value,
        })
    }
}

/// Fuel regeneration, capacity and race consumption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelConfig {
    #[serde(default = "FuelConfig::default_regen_minutes")]
    pub regen_minutes: u32,
    #[serde(default = "FuelConfig::default_base_capacity")]
    pub base_capacity: u32,
    #[serde(default = "FuelConfig::default_tank_capacity")]
    pub tank_capacity: u32,
    #[serde(default = "FuelConfig::default_base_consumption")]
    pub base_consumption: f64,
    #[serde(default = "FuelConfig::default_unit_price")]
    pub unit_price: i64,
    #[serde(default)]
    pub bands: DifficultyBands,
}

impl FuelConfig {
    const fn default_regen_minutes() -> u32 {
        constants::FUEL_REGEN_MINUTES
    }

    const fn default_base_capacity() -> u32 {
        constants::FUEL_BASE_CAPACITY
    }

    const fn default_tank_capacity() -> u32 {
        constants::FUEL_TANK_CAPACITY
    }

    const fn default_base_consumption() -> f64 {
        constants::FUEL_BASE_CONSUMPTION
    }

    const fn default_unit_price() -> i64 {
        constants::FUEL_UNIT_PRICE
    }

    /// Capacity for a car with or without the extended tank.
    #[must_use]
    pub const fn capacity(&self, has_tank: bool) -> u32 {
        if has_tank {
            self.tank_capacity
        } else {
            self.base_capacity
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        ensure_min("fuel.regen_minutes", 1.0, f64::from(self.regen_minutes))?;
        ensure_min("fuel.base_capacity", 1.0, f64::from(self.base_capacity))?;
        ensure_min(
            "fuel.tank_capacity",
            f64::from(self.base_capacity),
            f64::from(self.tank_capacity),
        )?;
        ensure_min("fuel.base_consumption", 0.0, self.base_consumption)?;
        ensure_min(
            "fuel.unit_price",
            0.0,
            crate::numbers::i64_to_f64(self.unit_price),
        )?;
        self.bands.validate()
    }
}

impl Default for FuelConfig {
    fn default() -> Self {
        Self {
            regen_minutes: Self::default_regen_minutes(),
            base_capacity: Self::default_base_capacity(),
            tank_capacity: Self::default_tank_capacity(),
            base_consumption: Self::default_base_consumption(),
            unit_price: Self::default_unit_price(),
            bands: DifficultyBands::default(),
        }
    }
}

/// Difficulty thresholds and the fuel multiplier charged inside each band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyBands {
    pub easy_max: f64,
    pub medium_max: f64,
    pub hard_max: f64,
    pub easy_fuel: f64,
    pub medium_fuel: f64,
    pub hard_fuel: f64,
    pub extreme_fuel: f64,
}

impl Default for DifficultyBands {
    fn default() -> Self {
        Self {
            easy_max: constants::BAND_EASY_MAX,
            medium_max: constants::BAND_MEDIUM_MAX,
            hard_max: constants::BAND_HARD_MAX,
            easy_fuel: constants::BAND_EASY_FUEL,
            medium_fuel: constants::BAND_MEDIUM_FUEL,
            hard_fuel: constants::BAND_HARD_FUEL,
            extreme_fuel: constants::BAND_EXTREME_FUEL,
        }
    }
}

impl DifficultyBands {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.easy_max < self.medium_max && self.medium_max < self.hard_max) {
            return Err(ConfigError::BandOrder {
                easy: self.easy_max,
                medium: self.medium_max,
                hard: self.hard_max,
            });
        }
        ensure_min("fuel.bands.easy_fuel", 0.0, self.easy_fuel)?;
        ensure_min("fuel.bands.medium_fuel", 0.0, self.medium_fuel)?;
        ensure_min("fuel.bands.hard_fuel", 0.0, self.hard_fuel)?;
        ensure_min("fuel.bands.extreme_fuel", 0.0, self.extreme_fuel)
    }
}

/// Cost curve and stat effect for one upgrade kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UpgradeSpec {
    pub base_cost: i64,
    pub cost_multiplier: f64,
    /// Stat bonus granted per level.
    pub affects: CarStats,
}

impl UpgradeSpec {
    /// Canonical tuning for each upgrade kind.
    #[must_use]
    pub const fn canonical(kind: UpgradeKind) -> Self {
        match kind {
            UpgradeKind::Engine => Self {
                base_cost: 500,
                cost_multiplier: 2.5,
                affects: CarStats::new(5, 3, 0, 0),
            },
            UpgradeKind::Turbo => Self {
                base_cost: 300,
                cost_multiplier: 2.3,
                affects: CarStats::new(2, 0, 0, 4),
            },
            UpgradeKind::Tires => Self {
                base_cost: 200,
                cost_multiplier: 2.2,
                affects: CarStats::new(0, 0, 3, 2),
            },
            UpgradeKind::Suspension => Self {
                base_cost: 400,
                cost_multiplier: 2.4,
                affects: CarStats::new(0, 0, 5, 0),
            },
            UpgradeKind::Transmission => Self {
                base_cost: 600,
                cost_multiplier: 2.5,
                affects: CarStats::new(0, 3, 0, 3),
            },
        }
    }
}

/// Per-kind upgrade overrides. Kinds missing from the map use [`UpgradeSpec::canonical`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct UpgradeTable(pub BTreeMap<UpgradeKind, UpgradeSpec>);

impl UpgradeTable {
    #[must_use]
    pub fn spec(&self, kind: UpgradeKind) -> UpgradeSpec {
        self.0
            .get(&kind)
            .copied()
            .unwrap_or_else(|| UpgradeSpec::canonical(kind))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for spec in self.0.values() {
            ensure_min(
                "upgrades.base_cost",
                1.0,
                crate::numbers::i64_to_f64(spec.base_cost),
            )?;
            // Strict cost growth requires a multiplier above one.
            ensure_min("upgrades.cost_multiplier", 1.01, spec.cost_multiplier)?;
        }
        Ok(())
    }
}

/// Price bracket mapped to the highest upgrade level allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierBracket {
    /// Inclusive upper price bound.
    pub max_price: i64,
    pub cap: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierConfig {
    #[serde(default = "TierConfig::default_brackets")]
    pub brackets: Vec<TierBracket>,
    #[serde(default = "TierConfig::default_top_cap")]
    pub top_cap: u8,
}

impl TierConfig {
    fn default_brackets() -> Vec<TierBracket> {
        vec![
            TierBracket {
                max_price: constants::TIER_BUDGET_MAX_PRICE,
                cap: constants::TIER_BUDGET_CAP,
            },
            TierBracket {
                max_price: constants::TIER_MID_MAX_PRICE,
                cap: constants::TIER_MID_CAP,
            },
        ]
    }

    const fn default_top_cap() -> u8 {
        constants::TIER_TOP_CAP
    }

    /// Upgrade level cap for a car bought at `price`.
    #[must_use]
    pub fn cap_for_price(&self, price: i64) -> u8 {
        self.brackets
            .iter()
            .find(|bracket| price <= bracket.max_price)
            .map_or(self.top_cap, |bracket| bracket.cap)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (index, pair) in self.brackets.windows(2).enumerate() {
            if pair[0].max_price >= pair[1].max_price {
                return Err(ConfigError::TierOrder { index: index + 1 });
            }
        }
        Ok(())
    }
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            brackets: Self::default_brackets(),
            top_cap: Self::default_top_cap(),
        }
    }
}

/// Special part effects and catalogue prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartsConfig {
    pub body_kit_bonus: i32,
    pub ecu_multiplier: f64,
    pub nitro_chance: f64,
    pub nitro_boost: f64,
    pub prices: PartPrices,
}

impl Default for PartsConfig {
    fn default() -> Self {
        Self {
            body_kit_bonus: constants::BODY_KIT_BONUS,
            ecu_multiplier: constants::ECU_TUNE_MULTIPLIER,
            nitro_chance: constants::NITRO_CHANCE,
            nitro_boost: constants::NITRO_BOOST,
            prices: PartPrices::default(),
        }
    }
}

impl PartsConfig {
    /// Catalogue price for a special part.
    #[must_use]
    pub const fn price(&self, part: SpecialPart) -> i64 {
        match part {
            SpecialPart::Nitro => self.prices.nitro,
            SpecialPart::BodyKit => self.prices.body_kit,
            SpecialPart::EcuTune => self.prices.ecu_tune,
            SpecialPart::FuelTank => self.prices.fuel_tank,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        ensure_min("parts.ecu_multiplier", 1.0, self.ecu_multiplier)?;
        ensure_range("parts.nitro_chance", 0.0, 1.0, self.nitro_chance)?;
        ensure_min("parts.nitro_boost", 1.0, self.nitro_boost)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartPrices {
    pub nitro: i64,
    pub body_kit: i64,
    pub ecu_tune: i64,
    pub fuel_tank: i64,
}

impl Default for PartPrices {
    fn default() -> Self {
        Self {
            nitro: constants::NITRO_PRICE,
            body_kit: constants::BODY_KIT_PRICE,
            ecu_tune: constants::ECU_TUNE_PRICE,
            fuel_tank: constants::FUEL_TANK_PRICE,
        }
    }
}

/// Experience curve and level rewards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    pub xp_base: f64,
    pub xp_growth: f64,
    pub reward_per_level: i64,
    pub win_xp: u64,
    pub loss_xp: u64,
    pub xp_per_difficulty: f64,
    pub bet_xp_divisor: i64,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            xp_base: constants::XP_BASE,
            xp_growth: constants::XP_GROWTH,
            reward_per_level: constants::LEVEL_REWARD_PER_LEVEL,
            win_xp: constants::XP_WIN,
            loss_xp: constants::XP_LOSS,
            xp_per_difficulty: constants::XP_PER_DIFFICULTY,
            bet_xp_divisor: constants::XP_BET_DIVISOR,
        }
    }
}

impl ProgressionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        ensure_min("progression.xp_base", 1.0, self.xp_base)?;
        // Thresholds must strictly grow or the level-up loop never terminates.
        ensure_min("progression.xp_growth", 1.01, self.xp_growth)?;
        ensure_min(
            "progression.bet_xp_divisor",
            1.0,
            crate::numbers::i64_to_f64(self.bet_xp_divisor),
        )
    }
}

/// Per-race skill growth odds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillConfig {
    /// Base chance in percent after a win.
    pub win_chance: f64,
    /// Base chance in percent after a loss.
    pub loss_chance: f64,
    pub decay_per_point: f64,
    pub chance_floor: f64,
    /// Optional hard ceiling on any single skill. `None` leaves skills uncapped.
    pub cap: Option<u32>,
}

impl Default for SkillConfig {
    fn default() -> Self {
        Self {
            win_chance: constants::SKILL_WIN_CHANCE,
            loss_chance: constants::SKILL_LOSS_CHANCE,
            decay_per_point: constants::SKILL_DECAY_PER_POINT,
            chance_floor: constants::SKILL_CHANCE_FLOOR,
            cap: None,
        }
    }
}

impl SkillConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        ensure_range("skills.win_chance", 0.0, 100.0, self.win_chance)?;
        ensure_range("skills.loss_chance", 0.0, 100.0, self.loss_chance)?;
        ensure_min("skills.decay_per_point", 0.0, self.decay_per_point)?;
        ensure_range("skills.chance_floor", 0.0, 100.0, self.chance_floor)?;
        if let Some(cap) = self.cap {
            ensure_min("skills.cap", 1.0, f64::from(cap))?;
        }
        Ok(())
    }
}

/// Weight of each skill point in the race skill multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillWeights {
    pub driving: f64,
    pub speed: f64,
    pub reaction: f64,
    pub technique: f64,
}

impl Default for SkillWeights {
    fn default() -> Self {
        Self {
            driving: constants::SKILL_WEIGHT_DRIVING,
            speed: constants::SKILL_WEIGHT_SPEED,
            reaction: constants::SKILL_WEIGHT_REACTION,
            technique: constants::SKILL_WEIGHT_TECHNIQUE,
        }
    }
}

/// Race time model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    pub base_seconds: f64,
    pub reference_efficiency: f64,
    pub opponent_efficiency_per_difficulty: f64,
    pub jitter_min: f64,
    pub jitter_max: f64,
    /// Efficiency floor so a zero-stat car still posts a finite time.
    pub min_efficiency: f64,
    pub skill_weights: SkillWeights,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            base_seconds: constants::RACE_BASE_SECONDS,
            reference_efficiency: constants::RACE_REFERENCE_EFFICIENCY,
            opponent_efficiency_per_difficulty: constants::OPPONENT_EFFICIENCY_PER_DIFFICULTY,
            jitter_min: constants::RACE_JITTER_MIN,
            jitter_max: constants::RACE_JITTER_MAX,
            min_efficiency: constants::RACE_MIN_EFFICIENCY,
            skill_weights: SkillWeights::default(),
        }
    }
}

impl RaceConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        ensure_min("race.base_seconds", 1.0, self.base_seconds)?;
        ensure_min("race.reference_efficiency", 1.0, self.reference_efficiency)?;
        ensure_min(
            "race.opponent_efficiency_per_difficulty",
            1.0,
            self.opponent_efficiency_per_difficulty,
        )?;
        ensure_min("race.min_efficiency", 0.01, self.min_efficiency)?;
        ensure_min("race.jitter_min", 0.01, self.jitter_min)?;
        if self.jitter_min > self.jitter_max {
            return Err(ConfigError::JitterBounds {
                min: self.jitter_min,
                max: self.jitter_max,
            });
        }
        Ok(())
    }
}

/// Shop-wide pricing knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Multiplier applied to upgrade prices during a discount event.
    pub discount_factor: f64,
    /// Share of the purchase price refunded when a car is sold.
    pub resale_ratio: f64,
    pub starting_money: i64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            discount_factor: constants::DISCOUNT_FACTOR,
            resale_ratio: constants::RESALE_RATIO,
            starting_money: constants::STARTING_MONEY,
        }
    }
}

impl EconomyConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        ensure_range("economy.discount_factor", 0.0, 1.0, self.discount_factor)?;
        ensure_range("economy.resale_ratio", 0.0, 1.0, self.resale_ratio)?;
        ensure_min(
            "economy.starting_money",
            0.0,
            crate::numbers::i64_to_f64(self.starting_money),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let cfg = EngineConfig::from_json(r#"{ "fuel": { "regen_minutes": 5 } }"#).unwrap();
        assert_eq!(cfg.fuel.regen_minutes, 5);
        assert_eq!(cfg.fuel.base_capacity, 30);
        assert_eq!(cfg.fuel.tank_capacity, 40);
        assert_eq!(cfg.progression, ProgressionConfig::default());
    }

    #[test]
    fn upgrade_overrides_fall_back_per_kind() {
        let cfg = EngineConfig::from_json(
            r#"{ "upgrades": { "engine": { "base_cost": 800, "cost_multiplier": 2.0,
                 "affects": { "power": 6, "speed": 2, "handling": 0, "acceleration": 0 } } } }"#,
        )
        .unwrap();
        assert_eq!(cfg.upgrades.spec(UpgradeKind::Engine).base_cost, 800);
        assert_eq!(
            cfg.upgrades.spec(UpgradeKind::Turbo),
            UpgradeSpec::canonical(UpgradeKind::Turbo)
        );
    }

    #[test]
    fn tier_caps_follow_price_brackets() {
        let tiers = TierConfig::default();
        assert_eq!(tiers.cap_for_price(0), 5);
        assert_eq!(tiers.cap_for_price(8_000), 5);
        assert_eq!(tiers.cap_for_price(8_001), 7);
        assert_eq!(tiers.cap_for_price(35_000), 7);
        assert_eq!(tiers.cap_for_price(35_001), 10);
    }

    #[test]
    fn validation_rejects_inverted_jitter() {
        let mut cfg = EngineConfig::default();
        cfg.race.jitter_min = 1.1;
        cfg.race.jitter_max = 1.0;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::JitterBounds { min: 1.1, max: 1.0 })
        );
    }

    #[test]
    fn validation_rejects_flat_xp_curve() {
        let err = EngineConfig::from_json(r#"{ "progression": { "xp_growth": 1.0 } }"#)
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MinViolation {
                field: "progression.xp_growth",
                ..
            }
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            EngineConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
