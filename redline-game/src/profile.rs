//! Player profile: money, progression, skills and the garage.
use serde::{Deserialize, Serialize};

use crate::achievements::AchievementUnlock;
use crate::car::Car;
use crate::config::EngineConfig;
use crate::error::Rejection;
use crate::skills::Skills;
use crate::tasks::DailyTask;

/// Cumulative career counters. Every field only grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CareerStats {
    pub total_races: u64,
    pub wins: u64,
    pub losses: u64,
    pub money_earned: i64,
    pub money_spent: i64,
    pub fuel_spent: u64,
    pub upgrades_bought: u64,
}

/// Persistent player state. Every engine operation takes a profile snapshot
/// and, on success, returns the next one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub id: String,
    pub money: i64,
    #[serde(default = "PlayerProfile::default_level")]
    pub level: u32,
    #[serde(default)]
    pub experience: u64,
    #[serde(default)]
    pub skills: Skills,
    #[serde(default)]
    pub stats: CareerStats,
    pub cars: Vec<Car>,
    #[serde(default)]
    pub current_car: usize,
    /// Serial used for ids of cars bought at the dealer.
    #[serde(default)]
    pub next_car_serial: u32,
    #[serde(default)]
    pub daily_tasks: Vec<DailyTask>,
    #[serde(default)]
    pub achievements: Vec<AchievementUnlock>,
}

impl PlayerProfile {
    const fn default_level() -> u32 {
        1
    }

    /// Start a fresh level-one career around a starter car.
    #[must_use]
    pub fn new_career(id: impl Into<String>, starter: Car, cfg: &EngineConfig) -> Self {
        let mut profile = Self {
            id: id.into(),
            money: cfg.economy.starting_money,
            level: Self::default_level(),
            experience: 0,
            skills: Skills::default(),
            stats: CareerStats::default(),
            cars: vec![starter],
            current_car: 0,
            next_car_serial: 1,
            daily_tasks: Vec::new(),
            achievements: Vec::new(),
        };
        profile.normalize(cfg);
        profile
    }

    /// Establish profile invariants once, e.g. right after loading a save.
    ///
    /// Returns true when anything had to be repaired.
    pub fn normalize(&mut self, cfg: &EngineConfig) -> bool {
        let mut repaired = false;
        if self.money < 0 {
            log::warn!("profile {} had negative money {}; zeroing", self.id, self.money);
            self.money = 0;
            repaired = true;
        }
        if self.level < 1 {
            self.level = 1;
            repaired = true;
        }
        repaired |= self.skills.normalize();
        for car in &mut self.cars {
            repaired |= car.normalize(cfg);
        }
        if !self.cars.is_empty() && self.current_car >= self.cars.len() {
            log::warn!(
                "profile {} selected missing car {}; resetting to slot 0",
                self.id,
                self.current_car
            );
            self.current_car = 0;
            repaired = true;
        }
        repaired
    }

    /// Borrow a car by garage slot.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::UnknownCar`] for an empty slot.
    pub fn car(&self, index: usize) -> Result<&Car, Rejection> {
        self.cars.get(index).ok_or(Rejection::UnknownCar { index })
    }

    /// Mutably borrow a car by garage slot.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::UnknownCar`] for an empty slot.
    pub fn car_mut(&mut self, index: usize) -> Result<&mut Car, Rejection> {
        self.cars.get_mut(index).ok_or(Rejection::UnknownCar { index })
    }

    /// The currently selected car, if the garage is not empty.
    #[must_use]
    pub fn active_car(&self) -> Option<&Car> {
        self.cars.get(self.current_car)
    }

    /// Check that `amount` can be paid out of current money.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::InsufficientFunds`] when money falls short.
    pub const fn ensure_funds(&self, amount: i64) -> Result<(), Rejection> {
        if self.money < amount {
            return Err(Rejection::InsufficientFunds {
                have: self.money,
                need: amount,
            });
        }
        Ok(())
    }

    /// Deduct a purchase and record it as spending.
    pub(crate) const fn charge(&mut self, amount: i64) {
        self.money -= amount;
        self.stats.money_spent += amount;
    }

    #[must_use]
    pub fn has_achievement(&self, id: &str) -> bool {
        self.achievements.iter().any(|unlock| unlock.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::car::CarStats;

    fn starter(cfg: &EngineConfig) -> Car {
        Car::new("car-0", "Hatch", 5_000, CarStats::new(40, 40, 40, 40), cfg)
    }

    #[test]
    fn new_career_starts_at_level_one() {
        let cfg = EngineConfig::default();
        let profile = PlayerProfile::new_career("p1", starter(&cfg), &cfg);
        assert_eq!(profile.level, 1);
        assert_eq!(profile.money, 5_000);
        assert_eq!(profile.skills, Skills::default());
        assert_eq!(profile.active_car().map(|car| car.id.as_str()), Some("car-0"));
    }

    #[test]
    fn normalize_repairs_loaded_state() {
        let cfg = EngineConfig::default();
        let mut profile = PlayerProfile::new_career("p1", starter(&cfg), &cfg);
        profile.level = 0;
        profile.money = -40;
        profile.current_car = 7;
        assert!(profile.normalize(&cfg));
        assert_eq!(profile.level, 1);
        assert_eq!(profile.money, 0);
        assert_eq!(profile.current_car, 0);
        assert!(!profile.normalize(&cfg));
    }

    #[test]
    fn sparse_save_fills_defaults() {
        let cfg = EngineConfig::default();
        let mut profile: PlayerProfile = serde_json::from_str(
            r#"{ "id": "p", "money": 100,
                 "cars": [{ "id": "c", "model": "M", "price": 1000, "base": {} }] }"#,
        )
        .unwrap();
        profile.normalize(&cfg);
        assert_eq!(profile.level, 1);
        assert_eq!(profile.skills.technique, 1);
        assert_eq!(profile.cars[0].max_fuel, 30);
        assert!(profile.daily_tasks.is_empty());
    }

    #[test]
    fn missing_car_is_rejected() {
        let cfg = EngineConfig::default();
        let profile = PlayerProfile::new_career("p1", starter(&cfg), &cfg);
        assert_eq!(profile.car(3), Err(Rejection::UnknownCar { index: 3 }));
        assert_eq!(
            profile.ensure_funds(9_000),
            Err(Rejection::InsufficientFunds {
                have: 5_000,
                need: 9_000
            })
        );
    }
}
