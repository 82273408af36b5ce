//! Cars, upgrade kinds and special parts.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::config::EngineConfig;
use crate::error::Rejection;

/// The four performance stats every car carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CarStats {
    #[serde(default)]
    pub power: i32,
    #[serde(default)]
    pub speed: i32,
    #[serde(default)]
    pub handling: i32,
    #[serde(default)]
    pub acceleration: i32,
}

impl CarStats {
    #[must_use]
    pub const fn new(power: i32, speed: i32, handling: i32, acceleration: i32) -> Self {
        Self {
            power,
            speed,
            handling,
            acceleration,
        }
    }

    /// Add `delta * times` to every stat.
    #[must_use]
    pub const fn add_scaled(self, delta: Self, times: i32) -> Self {
        Self {
            power: self.power + delta.power * times,
            speed: self.speed + delta.speed * times,
            handling: self.handling + delta.handling * times,
            acceleration: self.acceleration + delta.acceleration * times,
        }
    }

    /// Add the same flat bonus to every stat.
    #[must_use]
    pub const fn add_flat(self, bonus: i32) -> Self {
        Self {
            power: self.power + bonus,
            speed: self.speed + bonus,
            handling: self.handling + bonus,
            acceleration: self.acceleration + bonus,
        }
    }

    /// Apply `f` to every stat.
    #[must_use]
    pub fn map(self, f: impl Fn(i32) -> i32) -> Self {
        Self {
            power: f(self.power),
            speed: f(self.speed),
            handling: f(self.handling),
            acceleration: f(self.acceleration),
        }
    }

    /// Mean of the four stats, used as the car's overall power rating.
    #[must_use]
    pub fn average(self) -> f64 {
        let sum = f64::from(self.power)
            + f64::from(self.speed)
            + f64::from(self.handling)
            + f64::from(self.acceleration);
        sum / 4.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeKind {
    Engine,
    Turbo,
    Tires,
    Suspension,
    Transmission,
}

impl UpgradeKind {
    pub const ALL: [Self; 5] = [
        Self::Engine,
        Self::Turbo,
        Self::Tires,
        Self::Suspension,
        Self::Transmission,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Engine => "engine",
            Self::Turbo => "turbo",
            Self::Tires => "tires",
            Self::Suspension => "suspension",
            Self::Transmission => "transmission",
        }
    }
}

impl fmt::Display for UpgradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpgradeKind {
    type Err = Rejection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Rejection::UnknownUpgradeType { key: s.to_string() })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialPart {
    Nitro,
    BodyKit,
    EcuTune,
    FuelTank,
}

impl SpecialPart {
    pub const ALL: [Self; 4] = [Self::Nitro, Self::BodyKit, Self::EcuTune, Self::FuelTank];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nitro => "nitro",
            Self::BodyKit => "body_kit",
            Self::EcuTune => "ecu_tune",
            Self::FuelTank => "fuel_tank",
        }
    }
}

impl fmt::Display for SpecialPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpecialPart {
    type Err = Rejection;

    /// Accepts `body_kit`, `body-kit` and `bodyKit` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-'))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::ALL
            .into_iter()
            .find(|part| part.as_str().replace('_', "") == folded)
            .ok_or_else(|| Rejection::UnknownPartType { key: s.to_string() })
    }
}

/// Installed special parts. Each is a one-time purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpecialParts {
    #[serde(default)]
    pub nitro: bool,
    #[serde(default)]
    pub body_kit: bool,
    #[serde(default)]
    pub ecu_tune: bool,
    #[serde(default)]
    pub fuel_tank: bool,
}

impl SpecialParts {
    #[must_use]
    pub const fn has(&self, part: SpecialPart) -> bool {
        match part {
            SpecialPart::Nitro => self.nitro,
            SpecialPart::BodyKit => self.body_kit,
            SpecialPart::EcuTune => self.ecu_tune,
            SpecialPart::FuelTank => self.fuel_tank,
        }
    }

    pub const fn install(&mut self, part: SpecialPart) {
        match part {
            SpecialPart::Nitro => self.nitro = true,
            SpecialPart::BodyKit => self.body_kit = true,
            SpecialPart::EcuTune => self.ecu_tune = true,
            SpecialPart::FuelTank => self.fuel_tank = true,
        }
    }

    #[must_use]
    pub fn count(&self) -> usize {
        SpecialPart::ALL
            .into_iter()
            .filter(|part| self.has(*part))
            .count()
    }
}

/// A car owned by a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Car {
    pub id: String,
    pub model: String,
    /// Purchase price; decides the upgrade tier cap.
    pub price: i64,
    pub base: CarStats,
    #[serde(default)]
    pub upgrades: BTreeMap<UpgradeKind, u8>,
    #[serde(default)]
    pub special_parts: SpecialParts,
    #[serde(default)]
    pub fuel: u32,
    #[serde(default)]
    pub max_fuel: u32,
    /// Epoch milliseconds of the last fuel collapse or spend.
    #[serde(default)]
    pub last_fuel_update: Option<i64>,
}

impl Car {
    /// Build a normalized car with a full tank.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        model: impl Into<String>,
        price: i64,
        base: CarStats,
        cfg: &EngineConfig,
    ) -> Self {
        let max_fuel = cfg.fuel.capacity(false);
        let mut car = Self {
            id: id.into(),
            model: model.into(),
            price,
            base,
            upgrades: BTreeMap::new(),
            special_parts: SpecialParts::default(),
            fuel: max_fuel,
            max_fuel,
            last_fuel_update: None,
        };
        car.normalize(cfg);
        car
    }

    /// Current level of an upgrade; absent entries are level zero.
    #[must_use]
    pub fn upgrade_level(&self, kind: UpgradeKind) -> u8 {
        self.upgrades.get(&kind).copied().unwrap_or(0)
    }

    /// Highest level any upgrade on this car may reach.
    #[must_use]
    pub fn tier_cap(&self, cfg: &EngineConfig) -> u8 {
        cfg.tiers.cap_for_price(self.price)
    }

    /// Highest upgrade level currently installed.
    #[must_use]
    pub fn max_upgrade_level(&self) -> u8 {
        self.upgrades.values().copied().max().unwrap_or(0)
    }

    /// Establish the car invariants once, when it enters the system.
    ///
    /// Derives `max_fuel` from the fuel tank flag, clamps fuel into range and
    /// pulls upgrade levels down to the tier cap. Returns true when anything
    /// had to be repaired.
    pub fn normalize(&mut self, cfg: &EngineConfig) -> bool {
        let mut repaired = false;
        self.max_fuel = cfg.fuel.capacity(self.special_parts.fuel_tank);
        if self.fuel > self.max_fuel {
            log::warn!(
                "car {} fuel {} above capacity {}; clamping",
                self.id,
                self.fuel,
                self.max_fuel
            );
            self.fuel = self.max_fuel;
            repaired = true;
        }
        let cap = self.tier_cap(cfg);
        for (kind, level) in &mut self.upgrades {
            if *level > cap {
                log::warn!(
                    "car {} {kind} level {level} above tier cap {cap}; clamping",
                    self.id
                );
                *level = cap;
                repaired = true;
            }
        }
        self.upgrades.retain(|_, level| *level > 0);
        repaired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_car(cfg: &EngineConfig) -> Car {
        Car::new("car-1", "Civic", 6_000, CarStats::new(50, 60, 70, 55), cfg)
    }

    #[test]
    fn new_car_starts_full_with_base_capacity() {
        let cfg = EngineConfig::default();
        let car = sample_car(&cfg);
        assert_eq!(car.fuel, 30);
        assert_eq!(car.max_fuel, 30);
        assert_eq!(car.tier_cap(&cfg), 5);
        assert_eq!(car.upgrade_level(UpgradeKind::Engine), 0);
    }

    #[test]
    fn normalize_derives_capacity_and_clamps() {
        let cfg = EngineConfig::default();
        let mut car = sample_car(&cfg);
        car.special_parts.fuel_tank = true;
        car.fuel = 55;
        car.upgrades.insert(UpgradeKind::Turbo, 9);
        car.upgrades.insert(UpgradeKind::Tires, 0);
        assert!(car.normalize(&cfg));
        assert_eq!(car.max_fuel, 40);
        assert_eq!(car.fuel, 40);
        assert_eq!(car.upgrade_level(UpgradeKind::Turbo), 5);
        assert!(!car.upgrades.contains_key(&UpgradeKind::Tires));
        assert!(!car.normalize(&cfg));
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let cfg = EngineConfig::default();
        let mut car: Car = serde_json::from_str(
            r#"{ "id": "x", "model": "Old", "price": 40000,
                 "base": { "power": 40, "speed": 40 } }"#,
        )
        .unwrap();
        car.normalize(&cfg);
        assert_eq!(car.max_fuel, 30);
        assert_eq!(car.base.handling, 0);
        assert_eq!(car.tier_cap(&cfg), 10);
        assert!(car.last_fuel_update.is_none());
    }

    #[test]
    fn kinds_parse_case_insensitively() {
        assert_eq!("Engine".parse::<UpgradeKind>(), Ok(UpgradeKind::Engine));
        assert_eq!(
            "spoiler".parse::<UpgradeKind>(),
            Err(Rejection::UnknownUpgradeType {
                key: "spoiler".to_string()
            })
        );
        assert_eq!("bodyKit".parse::<SpecialPart>(), Ok(SpecialPart::BodyKit));
        assert_eq!("fuel-tank".parse::<SpecialPart>(), Ok(SpecialPart::FuelTank));
        assert!(matches!(
            "wings".parse::<SpecialPart>(),
            Err(Rejection::UnknownPartType { .. })
        ));
    }

    #[test]
    fn special_parts_count_installed_flags() {
        let mut parts = SpecialParts::default();
        assert_eq!(parts.count(), 0);
        parts.install(SpecialPart::Nitro);
        parts.install(SpecialPart::EcuTune);
        assert!(parts.has(SpecialPart::Nitro));
        assert!(!parts.has(SpecialPart::BodyKit));
        assert_eq!(parts.count(), 2);
    }
}
