//! Upgrade pricing and the upgrade / special part purchase flow.
use serde::{Deserialize, Serialize};

use crate::car::{Car, SpecialPart, UpgradeKind};
use crate::config::EngineConfig;
use crate::error::Rejection;
use crate::numbers::{floor_f64_to_i64, i64_to_f64};
use crate::profile::PlayerProfile;

/// Undiscounted price of raising `kind` from `level` to `level + 1`.
#[must_use]
pub fn upgrade_cost(kind: UpgradeKind, level: u8, cfg: &EngineConfig) -> i64 {
    let spec = cfg.upgrades.spec(kind);
    floor_f64_to_i64(i64_to_f64(spec.base_cost) * spec.cost_multiplier.powi(i32::from(level)))
}

/// Shop pricing mode for a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pricing {
    /// A discount event halves displayed and charged upgrade prices.
    #[serde(default)]
    pub discount: bool,
}

impl Pricing {
    #[must_use]
    pub const fn regular() -> Self {
        Self { discount: false }
    }

    #[must_use]
    pub const fn discounted() -> Self {
        Self { discount: true }
    }

    /// Price actually charged for a list price.
    #[must_use]
    pub fn apply(self, list_price: i64, cfg: &EngineConfig) -> i64 {
        if self.discount {
            floor_f64_to_i64(i64_to_f64(list_price) * cfg.economy.discount_factor)
        } else {
            list_price
        }
    }
}

/// Price of the next level of `kind` on `car`, or `None` at the tier cap.
#[must_use]
pub fn quote_upgrade(car: &Car, kind: UpgradeKind, pricing: Pricing, cfg: &EngineConfig) -> Option<i64> {
    let level = car.upgrade_level(kind);
    (level < car.tier_cap(cfg)).then(|| pricing.apply(upgrade_cost(kind, level, cfg), cfg))
}

/// Successful upgrade purchase.
#[derive(Debug, Clone, PartialEq)]
pub struct UpgradePurchase {
    pub profile: PlayerProfile,
    pub kind: UpgradeKind,
    pub cost: i64,
    pub new_level: u8,
}

/// Buy one level of `kind` for the car in `car_index`.
///
/// # Errors
///
/// [`Rejection::UnknownCar`], [`Rejection::MaxLevelReached`] at the tier cap,
/// or [`Rejection::InsufficientFunds`] after any discount is applied.
pub fn purchase_upgrade(
    profile: &PlayerProfile,
    car_index: usize,
    kind: UpgradeKind,
    pricing: Pricing,
    cfg: &EngineConfig,
) -> Result<UpgradePurchase, Rejection> {
    let car = profile.car(car_index)?;
    let cap = car.tier_cap(cfg);
    let cost = quote_upgrade(car, kind, pricing, cfg).ok_or(Rejection::MaxLevelReached { kind, cap })?;
    profile.ensure_funds(cost)?;

    let mut next = profile.clone();
    next.charge(cost);
    next.stats.upgrades_bought += 1;
    let car = next.car_mut(car_index)?;
    let new_level = car.upgrade_level(kind) + 1;
    car.upgrades.insert(kind, new_level);
    log::debug!("{} {kind} -> level {new_level} for {cost}", car.id);
    Ok(UpgradePurchase {
        profile: next,
        kind,
        cost,
        new_level,
    })
}

/// Install a special part on the car in `car_index` for `cost`.
///
/// # Errors
///
/// [`Rejection::UnknownCar`], [`Rejection::AlreadyOwned`] or
/// [`Rejection::InsufficientFunds`].
pub fn purchase_special_part(
    profile: &PlayerProfile,
    car_index: usize,
    part: SpecialPart,
    cost: i64,
    cfg: &EngineConfig,
) -> Result<PlayerProfile, Rejection> {
    let car = profile.car(car_index)?;
    if car.special_parts.has(part) {
        return Err(Rejection::AlreadyOwned { part });
    }
    let cost = cost.max(0);
    profile.ensure_funds(cost)?;

    let mut next = profile.clone();
    next.charge(cost);
    let car = next.car_mut(car_index)?;
    car.special_parts.install(part);
    // Fuel tank raises capacity; stored fuel is kept as is.
    car.normalize(cfg);
    log::debug!("{} installed {part} for {cost}", car.id);
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::car::CarStats;

    fn profile(price: i64, money: i64) -> (PlayerProfile, EngineConfig) {
        let cfg = EngineConfig::default();
        let car = Car::new("c", "Test", price, CarStats::new(50, 60, 70, 55), &cfg);
        let mut profile = PlayerProfile::new_career("p", car, &cfg);
        profile.money = money;
        (profile, cfg)
    }

    #[test]
    fn cost_curve_matches_catalogue() {
        let cfg = EngineConfig::default();
        assert_eq!(upgrade_cost(UpgradeKind::Engine, 0, &cfg), 500);
        assert_eq!(upgrade_cost(UpgradeKind::Engine, 1, &cfg), 1_250);
        assert_eq!(upgrade_cost(UpgradeKind::Engine, 2, &cfg), 3_125);
        assert_eq!(upgrade_cost(UpgradeKind::Turbo, 1, &cfg), 690);
        assert_eq!(upgrade_cost(UpgradeKind::Tires, 2, &cfg), 968);
        assert_eq!(upgrade_cost(UpgradeKind::Suspension, 1, &cfg), 960);
        assert_eq!(upgrade_cost(UpgradeKind::Transmission, 0, &cfg), 600);
    }

    #[test]
    fn cost_strictly_increases_up_to_top_cap() {
        let cfg = EngineConfig::default();
        for kind in UpgradeKind::ALL {
            for level in 0..cfg.tiers.top_cap {
                assert!(
                    upgrade_cost(kind, level + 1, &cfg) > upgrade_cost(kind, level, &cfg),
                    "{kind} cost did not grow at level {level}"
                );
            }
        }
    }

    #[test]
    fn purchase_charges_and_levels() {
        let (profile, cfg) = profile(6_000, 2_000);
        let bought = purchase_upgrade(&profile, 0, UpgradeKind::Engine, Pricing::regular(), &cfg)
            .unwrap();
        assert_eq!(bought.cost, 500);
        assert_eq!(bought.new_level, 1);
        assert_eq!(bought.profile.money, 1_500);
        assert_eq!(bought.profile.stats.money_spent, 500);
        assert_eq!(bought.profile.stats.upgrades_bought, 1);
        assert_eq!(bought.profile.cars[0].upgrade_level(UpgradeKind::Engine), 1);
        assert_eq!(profile.cars[0].upgrade_level(UpgradeKind::Engine), 0);
    }

    #[test]
    fn discount_applies_before_affordability() {
        let (profile, cfg) = profile(6_000, 300);
        assert_eq!(
            purchase_upgrade(&profile, 0, UpgradeKind::Engine, Pricing::regular(), &cfg),
            Err(Rejection::InsufficientFunds {
                have: 300,
                need: 500
            })
        );
        let bought = purchase_upgrade(&profile, 0, UpgradeKind::Engine, Pricing::discounted(), &cfg)
            .unwrap();
        assert_eq!(bought.cost, 250);
        assert_eq!(bought.profile.money, 50);
    }

    #[test]
    fn tier_cap_blocks_further_levels() {
        let (mut profile, cfg) = profile(6_000, 1_000_000);
        profile.cars[0].upgrades.insert(UpgradeKind::Tires, 5);
        let before = profile.clone();
        assert_eq!(
            purchase_upgrade(&profile, 0, UpgradeKind::Tires, Pricing::regular(), &cfg),
            Err(Rejection::MaxLevelReached {
                kind: UpgradeKind::Tires,
                cap: 5
            })
        );
        assert_eq!(profile, before);
        assert_eq!(
            quote_upgrade(&profile.cars[0], UpgradeKind::Tires, Pricing::regular(), &cfg),
            None
        );
    }

    #[test]
    fn pricier_cars_reach_higher_levels() {
        let (mut profile, cfg) = profile(50_000, 10_000_000);
        profile.cars[0].upgrades.insert(UpgradeKind::Suspension, 9);
        let bought =
            purchase_upgrade(&profile, 0, UpgradeKind::Suspension, Pricing::regular(), &cfg)
                .unwrap();
        assert_eq!(bought.new_level, 10);
    }

    #[test]
    fn special_part_is_one_time() {
        let (profile, cfg) = profile(6_000, 20_000);
        let price = cfg.parts.price(SpecialPart::FuelTank);
        let next = purchase_special_part(&profile, 0, SpecialPart::FuelTank, price, &cfg).unwrap();
        assert!(next.cars[0].special_parts.fuel_tank);
        assert_eq!(next.cars[0].max_fuel, 40);
        assert_eq!(next.cars[0].fuel, 30);
        assert_eq!(next.money, 15_000);
        assert_eq!(next.stats.money_spent, 5_000);
        assert_eq!(
            purchase_special_part(&next, 0, SpecialPart::FuelTank, price, &cfg),
            Err(Rejection::AlreadyOwned {
                part: SpecialPart::FuelTank
            })
        );
    }

    #[test]
    fn special_part_requires_funds_and_car() {
        let (profile, cfg) = profile(6_000, 100);
        assert!(matches!(
            purchase_special_part(&profile, 0, SpecialPart::Nitro, 15_000, &cfg),
            Err(Rejection::InsufficientFunds { .. })
        ));
        assert_eq!(
            purchase_special_part(&profile, 2, SpecialPart::Nitro, 0, &cfg),
            Err(Rejection::UnknownCar { index: 2 })
        );
    }
}
