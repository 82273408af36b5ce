//! Lazy, time-based fuel regeneration and race fuel costs.
//!
//! Regeneration is a pure function of `(stored fuel, stored timestamp, now)`.
//! Writing the collapsed value back onto the car is a separate, explicit step
//! so repeated reads never double count elapsed time.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::car::Car;
use crate::config::{DifficultyBands, EngineConfig, FuelConfig};
use crate::constants::MS_PER_MINUTE;
use crate::error::Rejection;
use crate::numbers::ceil_f64_to_u32;
use crate::profile::PlayerProfile;

/// Stored fuel state, as persisted on a car.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuelSnapshot {
    pub fuel: u32,
    pub last_update: Option<i64>,
    pub max_fuel: u32,
}

/// What the tank holds at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuelReading {
    pub current: u32,
    /// Whole units regenerated since the stored timestamp.
    pub regenerated: u64,
    /// Timestamp to store when persisting, present only if regeneration happened.
    pub collapse_at: Option<i64>,
}

/// Compute current fuel without touching any state.
#[must_use]
pub fn regenerate(snapshot: FuelSnapshot, now: i64, regen_minutes: u32) -> FuelReading {
    let Some(last_update) = snapshot.last_update else {
        return FuelReading {
            current: snapshot.fuel,
            regenerated: 0,
            collapse_at: None,
        };
    };
    let elapsed_minutes = u64::try_from(now.saturating_sub(last_update) / MS_PER_MINUTE)
        .unwrap_or(0);
    let regenerated = elapsed_minutes / u64::from(regen_minutes.max(1));
    let refilled = u64::from(snapshot.fuel).saturating_add(regenerated);
    let current = u32::try_from(refilled.min(u64::from(snapshot.max_fuel))).unwrap_or(u32::MAX);
    FuelReading {
        current,
        regenerated,
        collapse_at: (regenerated > 0).then_some(now),
    }
}

impl Car {
    #[must_use]
    pub const fn fuel_snapshot(&self) -> FuelSnapshot {
        FuelSnapshot {
            fuel: self.fuel,
            last_update: self.last_fuel_update,
            max_fuel: self.max_fuel,
        }
    }

    /// Read-only view of the fuel available at `now`.
    #[must_use]
    pub fn current_fuel(&self, now: i64, cfg: &FuelConfig) -> u32 {
        regenerate(self.fuel_snapshot(), now, cfg.regen_minutes).current
    }

    /// Fold elapsed regeneration into the stored value and return current fuel.
    ///
    /// Calling this again inside the same regeneration window changes nothing.
    pub fn refresh_fuel(&mut self, now: i64, cfg: &FuelConfig) -> u32 {
        let reading = regenerate(self.fuel_snapshot(), now, cfg.regen_minutes);
        if let Some(at) = reading.collapse_at {
            self.fuel = reading.current;
            self.last_fuel_update = Some(at);
        }
        reading.current
    }

    /// Burn `amount` units of fuel, returning what is left.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::InsufficientFuel`] without modifying the car when
    /// the tank holds less than `amount`.
    pub fn spend_fuel(&mut self, amount: u32, now: i64, cfg: &FuelConfig) -> Result<u32, Rejection> {
        let current = self.current_fuel(now, cfg);
        if current < amount {
            return Err(Rejection::InsufficientFuel {
                have: current,
                need: amount,
            });
        }
        self.fuel = current - amount;
        self.last_fuel_update = Some(now);
        Ok(self.fuel)
    }
}

/// Opponent difficulty bracket, which sets the race fuel multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyBand {
    Easy,
    Medium,
    Hard,
    Extreme,
}

impl DifficultyBand {
    #[must_use]
    pub fn classify(difficulty: f64, bands: &DifficultyBands) -> Self {
        if difficulty < bands.easy_max {
            Self::Easy
        } else if difficulty < bands.medium_max {
            Self::Medium
        } else if difficulty < bands.hard_max {
            Self::Hard
        } else {
            Self::Extreme
        }
    }

    #[must_use]
    pub const fn fuel_multiplier(self, bands: &DifficultyBands) -> f64 {
        match self {
            Self::Easy => bands.easy_fuel,
            Self::Medium => bands.medium_fuel,
            Self::Hard => bands.hard_fuel,
            Self::Extreme => bands.extreme_fuel,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
            Self::Extreme => "extreme",
        }
    }
}

impl fmt::Display for DifficultyBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fuel a race against an opponent of `difficulty` consumes.
#[must_use]
pub fn race_fuel_cost(difficulty: f64, cfg: &FuelConfig) -> u32 {
    let band = DifficultyBand::classify(difficulty, &cfg.bands);
    ceil_f64_to_u32(cfg.base_consumption * band.fuel_multiplier(&cfg.bands))
}

/// Result of buying fuel.
#[derive(Debug, Clone, PartialEq)]
pub struct Refuel {
    pub profile: PlayerProfile,
    pub units: u32,
    pub cost: i64,
}

/// Buy up to `units` of fuel for a car at the configured unit price.
///
/// Requests beyond the free tank space are trimmed to fit.
///
/// # Errors
///
/// [`Rejection::UnknownCar`], [`Rejection::FuelTankFull`] when there is no
/// room, or [`Rejection::InsufficientFunds`].
pub fn refuel(
    profile: &PlayerProfile,
    car_index: usize,
    units: u32,
    now: i64,
    cfg: &EngineConfig,
) -> Result<Refuel, Rejection> {
    let car = profile.car(car_index)?;
    let current = car.current_fuel(now, &cfg.fuel);
    let headroom = car.max_fuel.saturating_sub(current);
    let units = units.min(headroom);
    if units == 0 {
        return Err(Rejection::FuelTankFull);
    }
    let cost = i64::from(units) * cfg.fuel.unit_price;
    profile.ensure_funds(cost)?;

    let mut next = profile.clone();
    next.charge(cost);
    let car = next.car_mut(car_index)?;
    car.fuel = current + units;
    car.last_fuel_update = Some(now);
    Ok(Refuel {
        profile: next,
        units,
        cost,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::car::CarStats;

    const MINUTE: i64 = MS_PER_MINUTE;

    fn snapshot(fuel: u32, last_update: Option<i64>) -> FuelSnapshot {
        FuelSnapshot {
            fuel,
            last_update,
            max_fuel: 30,
        }
    }

    fn car(cfg: &EngineConfig) -> Car {
        Car::new("c", "Hatch", 5_000, CarStats::new(40, 40, 40, 40), cfg)
    }

    #[test]
    fn missing_timestamp_returns_stored_fuel() {
        let reading = regenerate(snapshot(12, None), 99 * MINUTE, 10);
        assert_eq!(reading.current, 12);
        assert_eq!(reading.collapse_at, None);
    }

    #[test]
    fn one_unit_per_full_window() {
        assert_eq!(regenerate(snapshot(5, Some(0)), 9 * MINUTE, 10).current, 5);
        assert_eq!(regenerate(snapshot(5, Some(0)), 10 * MINUTE, 10).current, 6);
        assert_eq!(regenerate(snapshot(5, Some(0)), 35 * MINUTE, 10).current, 8);
    }

    #[test]
    fn regeneration_caps_at_capacity() {
        let reading = regenerate(snapshot(28, Some(0)), 600 * MINUTE, 10);
        assert_eq!(reading.current, 30);
        assert_eq!(reading.regenerated, 60);
        assert_eq!(reading.collapse_at, Some(600 * MINUTE));
    }

    #[test]
    fn clock_skew_does_not_drain() {
        let reading = regenerate(snapshot(7, Some(50 * MINUTE)), 0, 10);
        assert_eq!(reading.current, 7);
        assert_eq!(reading.collapse_at, None);
    }

    #[test]
    fn fuel_is_monotonic_in_time() {
        let state = snapshot(0, Some(0));
        let mut previous = 0;
        for minute in 0..400 {
            let current = regenerate(state, minute * MINUTE, 10).current;
            assert!(current >= previous);
            assert!(current <= 30);
            previous = current;
        }
    }

    #[test]
    fn refresh_is_idempotent_within_window() {
        let cfg = EngineConfig::default();
        let mut car = car(&cfg);
        car.fuel = 10;
        car.last_fuel_update = Some(0);

        assert_eq!(car.refresh_fuel(25 * MINUTE, &cfg.fuel), 12);
        assert_eq!(car.last_fuel_update, Some(25 * MINUTE));
        assert_eq!(car.refresh_fuel(25 * MINUTE, &cfg.fuel), 12);
        assert_eq!(car.refresh_fuel(34 * MINUTE, &cfg.fuel), 12);
        assert_eq!(car.fuel, 12);
        assert_eq!(car.refresh_fuel(35 * MINUTE, &cfg.fuel), 13);
    }

    #[test]
    fn spend_requires_enough_fuel() {
        let cfg = EngineConfig::default();
        let mut car = car(&cfg);
        car.fuel = 3;
        car.last_fuel_update = Some(0);
        let before = car.clone();
        assert_eq!(
            car.spend_fuel(10, MINUTE, &cfg.fuel),
            Err(Rejection::InsufficientFuel { have: 3, need: 10 })
        );
        assert_eq!(car, before);

        assert_eq!(car.spend_fuel(2, 20 * MINUTE, &cfg.fuel), Ok(3));
        assert_eq!(car.last_fuel_update, Some(20 * MINUTE));
    }

    #[test]
    fn fuel_cost_follows_bands() {
        let cfg = FuelConfig::default();
        assert_eq!(race_fuel_cost(0.7, &cfg), 5);
        assert_eq!(race_fuel_cost(1.0, &cfg), 8);
        assert_eq!(race_fuel_cost(1.39, &cfg), 8);
        assert_eq!(race_fuel_cost(1.5, &cfg), 10);
        assert_eq!(race_fuel_cost(1.8, &cfg), 13);
        assert_eq!(race_fuel_cost(2.6, &cfg), 13);
        assert_eq!(
            DifficultyBand::classify(1.5, &cfg.bands),
            DifficultyBand::Hard
        );
    }

    #[test]
    fn refuel_trims_to_headroom() {
        let cfg = EngineConfig::default();
        let mut profile = PlayerProfile::new_career("p", car(&cfg), &cfg);
        profile.cars[0].fuel = 25;
        let bought = refuel(&profile, 0, 50, 0, &cfg).unwrap();
        assert_eq!(bought.units, 5);
        assert_eq!(bought.cost, 100);
        assert_eq!(bought.profile.cars[0].fuel, 30);
        assert_eq!(bought.profile.money, profile.money - 100);
        assert_eq!(bought.profile.stats.money_spent, 100);

        assert_eq!(
            refuel(&bought.profile, 0, 1, 0, &cfg),
            Err(Rejection::FuelTankFull)
        );
    }

    #[test]
    fn refuel_checks_funds() {
        let cfg = EngineConfig::default();
        let mut profile = PlayerProfile::new_career("p", car(&cfg), &cfg);
        profile.cars[0].fuel = 0;
        profile.money = 30;
        assert_eq!(
            refuel(&profile, 0, 10, 0, &cfg),
            Err(Rejection::InsufficientFunds {
                have: 30,
                need: 200
            })
        );
    }
}
