//! Effective stat aggregation: base stats, upgrades, then special parts.
use crate::car::{Car, CarStats};
use crate::config::EngineConfig;
use crate::numbers::floor_f64_to_i32;

/// Resolve the stats a car actually races with.
///
/// Upgrade bonuses and the body kit are additive and land first; the ECU tune
/// multiplier is applied last and floored.
#[must_use]
pub fn effective_stats(car: &Car, cfg: &EngineConfig) -> CarStats {
    let mut stats = car
        .upgrades
        .iter()
        .fold(car.base, |acc, (kind, level)| {
            acc.add_scaled(cfg.upgrades.spec(*kind).affects, i32::from(*level))
        });

    if car.special_parts.body_kit {
        stats = stats.add_flat(cfg.parts.body_kit_bonus);
    }
    if car.special_parts.ecu_tune {
        let multiplier = cfg.parts.ecu_multiplier;
        stats = stats.map(|value| floor_f64_to_i32(f64::from(value) * multiplier));
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::car::{SpecialPart, UpgradeKind};

    fn car_with(cfg: &EngineConfig) -> Car {
        Car::new("c", "Coupe", 20_000, CarStats::new(50, 60, 70, 55), cfg)
    }

    #[test]
    fn engine_upgrade_adds_power_and_speed() {
        let cfg = EngineConfig::default();
        let mut car = car_with(&cfg);
        car.upgrades.insert(UpgradeKind::Engine, 2);
        assert_eq!(effective_stats(&car, &cfg), CarStats::new(60, 66, 70, 55));
    }

    #[test]
    fn stock_car_keeps_base_stats() {
        let cfg = EngineConfig::default();
        let car = car_with(&cfg);
        assert_eq!(effective_stats(&car, &cfg), car.base);
    }

    #[test]
    fn every_kind_contributes_its_vector() {
        let cfg = EngineConfig::default();
        let mut car = Car::new("c", "Kart", 1_000, CarStats::default(), &cfg);
        for kind in UpgradeKind::ALL {
            car.upgrades.insert(kind, 1);
        }
        // engine 5/3/0/0, turbo 2/0/0/4, tires 0/0/3/2, suspension 0/0/5/0, transmission 0/3/0/3
        assert_eq!(effective_stats(&car, &cfg), CarStats::new(7, 6, 8, 9));
    }

    #[test]
    fn body_kit_applies_before_ecu_multiplier() {
        let cfg = EngineConfig::default();
        let mut car = car_with(&cfg);
        car.special_parts.install(SpecialPart::BodyKit);
        car.special_parts.install(SpecialPart::EcuTune);
        // (50+10)*1.15 = 69, (60+10)*1.15 = 80.5, (70+10)*1.15 = 92, (55+10)*1.15 = 74.75
        assert_eq!(effective_stats(&car, &cfg), CarStats::new(69, 80, 92, 74));
    }

    #[test]
    fn body_kit_alone_is_flat() {
        let cfg = EngineConfig::default();
        let mut car = car_with(&cfg);
        car.special_parts.install(SpecialPart::BodyKit);
        car.upgrades.insert(UpgradeKind::Suspension, 3);
        assert_eq!(effective_stats(&car, &cfg), CarStats::new(60, 70, 95, 65));
    }
}
