//! Dealer catalogue and garage management: buying, selling and selecting cars.
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::car::{Car, CarStats};
use crate::config::EngineConfig;
use crate::error::Rejection;
use crate::numbers::{floor_f64_to_i64, i64_to_f64};
use crate::profile::PlayerProfile;

const DEFAULT_DEALER_DATA: &str = include_str!("../assets/dealer.json");

/// A model offered at the dealer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarListing {
    pub model: String,
    pub price: i64,
    #[serde(default)]
    pub base: CarStats,
}

impl CarListing {
    /// Build a fresh, normalized car from this listing.
    #[must_use]
    pub fn build(&self, id: impl Into<String>, cfg: &EngineConfig) -> Car {
        Car::new(id, self.model.clone(), self.price, self.base, cfg)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DealerCatalog {
    #[serde(default)]
    pub cars: Vec<CarListing>,
}

impl DealerCatalog {
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::parse_bundled(DEFAULT_DEALER_DATA)
    }

    /// Parse bundled data, logging and falling back to an empty catalogue on failure.
    fn parse_bundled(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_else(|err| {
            log::error!("bundled dealer catalogue failed to parse: {err}");
            Self::default()
        })
    }

    #[must_use]
    pub fn default_catalog() -> &'static Self {
        static CATALOG: OnceLock<DealerCatalog> = OnceLock::new();
        CATALOG.get_or_init(Self::load_from_static)
    }

    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a dealer catalogue.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn find(&self, model: &str) -> Option<&CarListing> {
        self.cars.iter().find(|listing| listing.model == model)
    }

    /// Cheapest listing, used as the starter car.
    #[must_use]
    pub fn cheapest(&self) -> Option<&CarListing> {
        self.cars.iter().min_by_key(|listing| listing.price)
    }

    /// Listings the profile can pay for right now.
    pub fn affordable<'a>(&'a self, profile: &'a PlayerProfile) -> impl Iterator<Item = &'a CarListing> {
        self.cars.iter().filter(|listing| listing.price <= profile.money)
    }
}

/// Successful dealer purchase.
#[derive(Debug, Clone, PartialEq)]
pub struct CarPurchase {
    pub profile: PlayerProfile,
    /// Garage slot of the new car.
    pub index: usize,
}

/// Buy a car from the dealer. It arrives with a full tank.
///
/// # Errors
///
/// Returns [`Rejection::InsufficientFunds`] when the price exceeds money.
pub fn buy_car(
    profile: &PlayerProfile,
    listing: &CarListing,
    now: i64,
    cfg: &EngineConfig,
) -> Result<CarPurchase, Rejection> {
    let price = listing.price.max(0);
    profile.ensure_funds(price)?;

    let mut next = profile.clone();
    next.charge(price);
    let mut car = listing.build(format!("car-{}", next.next_car_serial), cfg);
    car.last_fuel_update = Some(now);
    next.next_car_serial = next.next_car_serial.saturating_add(1);
    next.cars.push(car);
    let index = next.cars.len() - 1;
    log::debug!("profile {} bought {} for {price}", next.id, listing.model);
    Ok(CarPurchase {
        profile: next,
        index,
    })
}

/// Amount the dealer pays back for a car.
#[must_use]
pub fn resale_value(car: &Car, cfg: &EngineConfig) -> i64 {
    floor_f64_to_i64(i64_to_f64(car.price.max(0)) * cfg.economy.resale_ratio)
}

/// Successful sale back to the dealer.
#[derive(Debug, Clone, PartialEq)]
pub struct CarSale {
    pub profile: PlayerProfile,
    pub refund: i64,
}

/// Sell the car in `index`, keeping the selection on a valid slot.
///
/// # Errors
///
/// [`Rejection::UnknownCar`] or [`Rejection::CannotSellLastCar`].
pub fn sell_car(profile: &PlayerProfile, index: usize, cfg: &EngineConfig) -> Result<CarSale, Rejection> {
    let car = profile.car(index)?;
    if profile.cars.len() <= 1 {
        return Err(Rejection::CannotSellLastCar);
    }
    let refund = resale_value(car, cfg);

    let mut next = profile.clone();
    let sold = next.cars.remove(index);
    next.money += refund;
    next.current_car = match next.current_car {
        current if current == index => 0,
        current if current > index => current - 1,
        current => current,
    };
    log::debug!("profile {} sold {} for {refund}", next.id, sold.id);
    Ok(CarSale {
        profile: next,
        refund,
    })
}

/// Make the car in `index` the active one.
///
/// # Errors
///
/// Returns [`Rejection::UnknownCar`] for an empty slot.
pub fn select_car(profile: &PlayerProfile, index: usize) -> Result<PlayerProfile, Rejection> {
    profile.car(index)?;
    let mut next = profile.clone();
    next.current_car = index;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    fn starter_profile(money: i64) -> (PlayerProfile, EngineConfig) {
        let cfg = EngineConfig::default();
        let catalog = DealerCatalog::default_catalog();
        let starter = catalog.cheapest().unwrap().build("car-0", &cfg);
        let mut profile = PlayerProfile::new_career("p", starter, &cfg);
        profile.money = money;
        (profile, cfg)
    }

    #[test]
    fn bundled_dealer_lists_every_tier() {
        let cfg = EngineConfig::default();
        let catalog = DealerCatalog::default_catalog();
        let caps: Vec<u8> = catalog
            .cars
            .iter()
            .map(|listing| cfg.tiers.cap_for_price(listing.price))
            .collect();
        for cap in [5, 7, 10] {
            assert!(caps.contains(&cap), "no listing with tier cap {cap}");
        }
        assert_eq!(catalog.cheapest().map(|l| l.price), Some(5_000));
    }

    #[test]
    fn broken_bundled_dealer_falls_back_to_empty() {
        assert!(DealerCatalog::parse_bundled(r#"{ "cars": [ { "model": 3 } ] }"#).cars.is_empty());
        assert_eq!(DealerCatalog::parse_bundled(DEFAULT_DEALER_DATA).cars.len(), 6);
    }

    #[test]
    fn buying_appends_a_full_tank_car() {
        let (profile, cfg) = starter_profile(20_000);
        let listing = DealerCatalog::default_catalog().find("Vireo GT").unwrap();
        let bought = buy_car(&profile, listing, NOW, &cfg).unwrap();
        assert_eq!(bought.index, 1);
        let car = &bought.profile.cars[1];
        assert_eq!(car.id, "car-1");
        assert_eq!(car.fuel, car.max_fuel);
        assert_eq!(car.last_fuel_update, Some(NOW));
        assert_eq!(bought.profile.money, 5_000);
        assert_eq!(bought.profile.stats.money_spent, 15_000);
        assert_eq!(bought.profile.next_car_serial, 2);
    }

    #[test]
    fn buying_requires_funds() {
        let (profile, cfg) = starter_profile(1_000);
        let listing = DealerCatalog::default_catalog().find("Apex Phantom").unwrap();
        assert_eq!(
            buy_car(&profile, listing, NOW, &cfg),
            Err(Rejection::InsufficientFunds {
                have: 1_000,
                need: 95_000
            })
        );
        assert_eq!(DealerCatalog::default_catalog().affordable(&profile).count(), 0);
    }

    #[test]
    fn selling_refunds_half_and_fixes_selection() {
        let (profile, cfg) = starter_profile(50_000);
        let catalog = DealerCatalog::default_catalog();
        let profile = buy_car(&profile, catalog.find("Vireo GT").unwrap(), NOW, &cfg)
            .unwrap()
            .profile;
        let profile = select_car(&profile, 1).unwrap();
        let sale = sell_car(&profile, 0, &cfg).unwrap();
        assert_eq!(sale.refund, 2_500);
        assert_eq!(sale.profile.cars.len(), 1);
        assert_eq!(sale.profile.current_car, 0);
        assert_eq!(sale.profile.cars[0].model, "Vireo GT");
        assert_eq!(
            sell_car(&sale.profile, 0, &cfg),
            Err(Rejection::CannotSellLastCar)
        );
    }

    #[test]
    fn selecting_checks_the_slot() {
        let (profile, _) = starter_profile(0);
        assert_eq!(select_car(&profile, 1), Err(Rejection::UnknownCar { index: 1 }));
        assert_eq!(select_car(&profile, 0).unwrap().current_car, 0);
    }
}
