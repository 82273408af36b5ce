use std::fmt;

use clap::ValueEnum;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use redline_game::race::skill_multiplier;
use redline_game::{
    CarListing, DealerCatalog, EngineConfig, Opponent, PlayerProfile, Pricing, SpecialPart,
    UpgradeKind, effective_stats, quote_upgrade,
};

/// Purchase chosen by a [`DriverPolicy`] between races.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShopAction {
    Upgrade(UpgradeKind),
    Part(SpecialPart),
    Refuel(u32),
    BuyCar(CarListing),
}

/// Policy interface for automated careers.
pub trait DriverPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Pick an opponent from the lineup, or sit this slot out.
    fn pick_opponent(
        &mut self,
        profile: &PlayerProfile,
        lineup: &[Opponent],
        cfg: &EngineConfig,
    ) -> Option<usize>;

    /// Stake for the chosen race.
    fn bet(&mut self, profile: &PlayerProfile, opponent: &Opponent, cfg: &EngineConfig) -> i64;

    /// Next purchase, if any.
    fn shop(
        &mut self,
        profile: &PlayerProfile,
        cfg: &EngineConfig,
        pricing: Pricing,
        now: i64,
    ) -> Option<ShopAction>;
}

/// Built-in driving strategies for automated careers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DriverStrategy {
    Cautious,
    Balanced,
    Aggressive,
}

impl DriverStrategy {
    pub const ALL: [Self; 3] = [Self::Cautious, Self::Balanced, Self::Aggressive];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cautious => "Cautious",
            Self::Balanced => "Balanced",
            Self::Aggressive => "Aggressive",
        }
    }

    const fn tuning(self) -> Tuning {
        match self {
            Self::Cautious => Tuning {
                min_edge: 1.15,
                bet_share: 0.0,
                bet_cap: 0,
                reserve: 3_000,
                refuel_below: 0,
                part_order: &[SpecialPart::BodyKit],
                upgrade_car_multiple: 4,
            },
            Self::Balanced => Tuning {
                min_edge: 1.0,
                bet_share: 0.05,
                bet_cap: 500,
                reserve: 1_500,
                refuel_below: 8,
                part_order: &[SpecialPart::BodyKit, SpecialPart::EcuTune, SpecialPart::FuelTank],
                upgrade_car_multiple: 3,
            },
            Self::Aggressive => Tuning {
                min_edge: 0.9,
                bet_share: 0.15,
                bet_cap: 5_000,
                reserve: 500,
                refuel_below: 13,
                part_order: &[
                    SpecialPart::Nitro,
                    SpecialPart::EcuTune,
                    SpecialPart::BodyKit,
                    SpecialPart::FuelTank,
                ],
                upgrade_car_multiple: 2,
            },
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn DriverPolicy> {
        Box::new(StrategyPolicy {
            strategy: self,
            tuning: self.tuning(),
            rng: ChaCha20Rng::seed_from_u64(seed),
        })
    }
}

impl fmt::Display for DriverStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy)]
struct Tuning {
    /// Smallest player/opponent efficiency ratio worth racing.
    min_edge: f64,
    bet_share: f64,
    bet_cap: i64,
    /// Money kept back from every purchase.
    reserve: i64,
    refuel_below: u32,
    part_order: &'static [SpecialPart],
    /// Buy the next car once money covers this many times its price.
    upgrade_car_multiple: i64,
}

/// Estimated efficiency ratio of the active car against an opponent, before jitter.
#[must_use]
pub fn estimated_edge(profile: &PlayerProfile, opponent: &Opponent, cfg: &EngineConfig) -> f64 {
    let Some(car) = profile.active_car() else {
        return 0.0;
    };
    let player = effective_stats(car, cfg).average() * skill_multiplier(&profile.skills, &cfg.race.skill_weights);
    let rival = (cfg.race.opponent_efficiency_per_difficulty * opponent.difficulty).max(cfg.race.min_efficiency);
    player / rival
}

struct StrategyPolicy {
    strategy: DriverStrategy,
    tuning: Tuning,
    rng: ChaCha20Rng,
}

impl StrategyPolicy {
    fn cheapest_upgrade(profile: &PlayerProfile, cfg: &EngineConfig, pricing: Pricing) -> Option<(UpgradeKind, i64)> {
        let car = profile.active_car()?;
        UpgradeKind::ALL
            .into_iter()
            .filter_map(|kind| quote_upgrade(car, kind, pricing, cfg).map(|cost| (kind, cost)))
            .min_by_key(|(_, cost)| *cost)
    }

    fn next_car(&self, profile: &PlayerProfile) -> Option<CarListing> {
        let current_price = profile.active_car().map_or(0, |car| car.price);
        DealerCatalog::default_catalog()
            .cars
            .iter()
            .filter(|listing| listing.price > current_price)
            .min_by_key(|listing| listing.price)
            .filter(|listing| profile.money >= listing.price * self.tuning.upgrade_car_multiple)
            .cloned()
    }
}

impl DriverPolicy for StrategyPolicy {
    fn name(&self) -> &'static str {
        self.strategy.label()
    }

    fn pick_opponent(
        &mut self,
        profile: &PlayerProfile,
        lineup: &[Opponent],
        cfg: &EngineConfig,
    ) -> Option<usize> {
        let candidates: Vec<usize> = lineup
            .iter()
            .enumerate()
            .filter(|(_, opponent)| estimated_edge(profile, opponent, cfg) >= self.tuning.min_edge)
            .map(|(index, _)| index)
            .collect();
        match self.strategy {
            // Aggressive drivers gamble on any race they might win.
            DriverStrategy::Aggressive if !candidates.is_empty() => {
                Some(candidates[self.rng.gen_range(0..candidates.len())])
            }
            _ => candidates.into_iter().max_by_key(|&index| lineup[index].reward),
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn bet(&mut self, profile: &PlayerProfile, opponent: &Opponent, cfg: &EngineConfig) -> i64 {
        if self.tuning.bet_share <= 0.0 || estimated_edge(profile, opponent, cfg) < 1.05 {
            return 0;
        }
        let stake = (profile.money as f64 * self.tuning.bet_share).floor() as i64;
        stake.clamp(0, self.tuning.bet_cap.min(profile.money))
    }

    fn shop(
        &mut self,
        profile: &PlayerProfile,
        cfg: &EngineConfig,
        pricing: Pricing,
        now: i64,
    ) -> Option<ShopAction> {
        let spendable = profile.money - self.tuning.reserve;
        let car = profile.active_car()?;

        let fuel = car.current_fuel(now, &cfg.fuel);
        if fuel < self.tuning.refuel_below {
            let units = car.max_fuel - fuel;
            if i64::from(units) * cfg.fuel.unit_price <= spendable {
                return Some(ShopAction::Refuel(units));
            }
        }
        if let Some(listing) = self.next_car(profile) {
            return Some(ShopAction::BuyCar(listing));
        }
        for &part in self.tuning.part_order {
            if !car.special_parts.has(part) && cfg.parts.price(part) <= spendable {
                return Some(ShopAction::Part(part));
            }
        }
        Self::cheapest_upgrade(profile, cfg, pricing)
            .filter(|(_, cost)| *cost <= spendable)
            .map(|(kind, _)| ShopAction::Upgrade(kind))
    }
}
