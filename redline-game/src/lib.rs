//! Redline Game Engine
//!
//! Platform-agnostic progression and economy core for the Redline street racing
//! game. Every operation takes a [`PlayerProfile`] snapshot and, on success,
//! returns the next one; a [`Rejection`] never leaves a partial change behind.

pub mod achievements;
pub mod car;
pub mod config;
pub mod constants;
pub mod error;
pub mod fuel;
pub mod garage;
pub mod numbers;
pub mod profile;
pub mod progression;
pub mod race;
pub mod rng;
pub mod skills;
pub mod stats;
pub mod tasks;
pub mod upgrades;

use smallvec::SmallVec;

// Re-export commonly used types
pub use achievements::{
    Achievement, AchievementCatalog, AchievementCondition, AchievementSweep, AchievementUnlock,
    evaluate_achievements, unlock_achievements,
};
pub use car::{Car, CarStats, SpecialPart, SpecialParts, UpgradeKind};
pub use config::{
    DifficultyBands, EconomyConfig, EngineConfig, FuelConfig, PartsConfig, ProgressionConfig,
    RaceConfig, SkillConfig, SkillWeights, TierBracket, TierConfig, UpgradeSpec, UpgradeTable,
};
pub use error::{ConfigError, Rejection};
pub use fuel::{DifficultyBand, FuelReading, FuelSnapshot, Refuel, race_fuel_cost, refuel, regenerate};
pub use garage::{
    CarListing, CarPurchase, CarSale, DealerCatalog, buy_car, resale_value, select_car, sell_car,
};
pub use profile::{CareerStats, PlayerProfile};
pub use progression::{LevelUp, grant_experience, level_reward, required_xp, xp_gain, xp_to_next_level};
pub use race::{Opponent, RaceOutcome, RaceResolution, resolve_race};
pub use rng::RngBundle;
pub use skills::{SkillKind, SkillRoll, Skills, roll_skill_growth, skill_chance};
pub use stats::effective_stats;
pub use tasks::{
    DailyTask, TaskClaim, TaskEvent, TaskProgress, TrackStat, apply_task_event, claim_task,
    prune_expired_tasks, track_tasks,
};
pub use upgrades::{
    Pricing, UpgradePurchase, purchase_special_part, purchase_upgrade, quote_upgrade, upgrade_cost,
};

/// Source of wall-clock time in epoch milliseconds.
pub trait Clock {
    fn now_ms(&self) -> i64;
}

/// Supplies the opponents a player may race. Generation policy lives with
/// the implementor.
pub trait OpponentSource {
    /// Current lineup for a profile.
    fn opponents(&mut self, profile: &PlayerProfile) -> Vec<Opponent>;
}

/// Trait for abstracting profile persistence
/// Platform-specific implementations should provide this
pub trait ProfileStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save a profile under its id
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be saved.
    fn save_profile(&self, profile_id: &str, profile: &PlayerProfile) -> Result<(), Self::Error>;

    /// Load a profile
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be loaded.
    fn load_profile(&self, profile_id: &str) -> Result<Option<PlayerProfile>, Self::Error>;

    /// Delete a saved profile
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be deleted.
    fn delete_profile(&self, profile_id: &str) -> Result<(), Self::Error>;
}

/// Log keys a UI can render for one engine action.
pub type LogKeys = SmallVec<[&'static str; 4]>;

/// Everything one race did to a profile, downstream effects included.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceReport {
    pub profile: PlayerProfile,
    pub outcome: RaceOutcome,
    pub tasks_completed: SmallVec<[String; 2]>,
    pub achievements_unlocked: SmallVec<[String; 2]>,
    pub log_keys: LogKeys,
}

/// Result of a shop or garage action.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionReport {
    pub profile: PlayerProfile,
    /// Money paid (negative for money received).
    pub cost: i64,
    pub tasks_completed: SmallVec<[String; 2]>,
    pub achievements_unlocked: SmallVec<[String; 2]>,
}

impl ActionReport {
    #[must_use]
    pub fn log_keys(&self) -> LogKeys {
        let mut keys = LogKeys::new();
        if !self.tasks_completed.is_empty() {
            keys.push(constants::LOG_TASK_COMPLETE);
        }
        if !self.achievements_unlocked.is_empty() {
            keys.push(constants::LOG_ACHIEVEMENT_UNLOCKED);
        }
        keys
    }
}

/// Main engine binding tuning, catalogues, randomness, storage and time.
pub struct RaceEngine<S, C>
where
    S: ProfileStorage,
    C: Clock,
{
    config: EngineConfig,
    achievements: AchievementCatalog,
    rng: RngBundle,
    pricing: Pricing,
    storage: S,
    clock: C,
}

impl<S, C> RaceEngine<S, C>
where
    S: ProfileStorage,
    C: Clock,
{
    /// Create an engine with the bundled achievement catalogue.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn new(config: EngineConfig, seed: u64, storage: S, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            achievements: AchievementCatalog::default_catalog().clone(),
            rng: RngBundle::from_user_seed(seed),
            pricing: Pricing::regular(),
            storage,
            clock,
        })
    }

    #[must_use]
    pub fn with_achievements(mut self, catalog: AchievementCatalog) -> Self {
        self.achievements = catalog;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn achievements(&self) -> &AchievementCatalog {
        &self.achievements
    }

    #[must_use]
    pub const fn rng(&self) -> &RngBundle {
        &self.rng
    }

    #[must_use]
    pub const fn pricing(&self) -> Pricing {
        self.pricing
    }

    /// Toggle the shop-wide discount event.
    pub const fn set_discount(&mut self, active: bool) {
        self.pricing.discount = active;
    }

    #[must_use]
    pub fn now(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Race the car in `car_index` and fold the result into tasks and achievements.
    ///
    /// # Errors
    ///
    /// Returns the race's [`Rejection`]; nothing is tracked in that case.
    pub fn race(
        &self,
        profile: &PlayerProfile,
        car_index: usize,
        opponent: &Opponent,
        bet: i64,
    ) -> Result<RaceReport, Rejection> {
        let now = self.now();
        let RaceResolution {
            profile: mut next,
            outcome,
        } = resolve_race(profile, car_index, opponent, bet, now, &self.config, &self.rng)?;

        let mut tasks_completed = SmallVec::new();
        for event in TaskEvent::from_race(&outcome) {
            tasks_completed.extend(apply_task_event(&mut next, event, now));
        }
        let achievements_unlocked = unlock_achievements(&mut next, &self.achievements, now, &self.config);

        let mut log_keys = LogKeys::new();
        log_keys.push(if outcome.won {
            constants::LOG_RACE_WON
        } else {
            constants::LOG_RACE_LOST
        });
        if outcome.leveled_up {
            log_keys.push(constants::LOG_LEVEL_UP);
        }
        if outcome.skill_gain().is_some() {
            log_keys.push(constants::LOG_SKILL_UP);
        }
        if !tasks_completed.is_empty() {
            log_keys.push(constants::LOG_TASK_COMPLETE);
        }
        if !achievements_unlocked.is_empty() {
            log_keys.push(constants::LOG_ACHIEVEMENT_UNLOCKED);
        }

        Ok(RaceReport {
            profile: next,
            outcome,
            tasks_completed,
            achievements_unlocked,
            log_keys,
        })
    }

    fn settle(&self, mut profile: PlayerProfile, cost: i64, event: Option<TaskEvent>) -> ActionReport {
        let now = self.now();
        let tasks_completed = event
            .map(|event| apply_task_event(&mut profile, event, now))
            .unwrap_or_default();
        let achievements_unlocked = unlock_achievements(&mut profile, &self.achievements, now, &self.config);
        ActionReport {
            profile,
            cost,
            tasks_completed,
            achievements_unlocked,
        }
    }

    /// Buy one upgrade level at the current shop pricing.
    ///
    /// # Errors
    ///
    /// Propagates the purchase [`Rejection`].
    pub fn buy_upgrade(
        &self,
        profile: &PlayerProfile,
        car_index: usize,
        kind: UpgradeKind,
    ) -> Result<ActionReport, Rejection> {
        let purchase = purchase_upgrade(profile, car_index, kind, self.pricing, &self.config)?;
        Ok(self.settle(purchase.profile, purchase.cost, Some(TaskEvent::UpgradeBought)))
    }

    /// Buy an upgrade named by its wire key, e.g. `"engine"`.
    ///
    /// # Errors
    ///
    /// [`Rejection::UnknownUpgradeType`] for an unrecognised key, otherwise as
    /// [`RaceEngine::buy_upgrade`].
    pub fn buy_upgrade_by_key(
        &self,
        profile: &PlayerProfile,
        car_index: usize,
        key: &str,
    ) -> Result<ActionReport, Rejection> {
        let kind: UpgradeKind = key.parse()?;
        self.buy_upgrade(profile, car_index, kind)
    }

    /// Install a special part at its catalogue price.
    ///
    /// # Errors
    ///
    /// Propagates the purchase [`Rejection`].
    pub fn buy_special_part(
        &self,
        profile: &PlayerProfile,
        car_index: usize,
        part: SpecialPart,
    ) -> Result<ActionReport, Rejection> {
        let cost = self.config.parts.price(part).max(0);
        let next = purchase_special_part(profile, car_index, part, cost, &self.config)?;
        Ok(self.settle(next, cost, None))
    }

    /// Install a special part named by its wire key, e.g. `"body_kit"`.
    ///
    /// # Errors
    ///
    /// [`Rejection::UnknownPartType`] for an unrecognised key, otherwise as
    /// [`RaceEngine::buy_special_part`].
    pub fn buy_special_part_by_key(
        &self,
        profile: &PlayerProfile,
        car_index: usize,
        key: &str,
    ) -> Result<ActionReport, Rejection> {
        let part: SpecialPart = key.parse()?;
        self.buy_special_part(profile, car_index, part)
    }

    /// Buy fuel for a car.
    ///
    /// # Errors
    ///
    /// Propagates the refuel [`Rejection`].
    pub fn refuel(&self, profile: &PlayerProfile, car_index: usize, units: u32) -> Result<ActionReport, Rejection> {
        let refill = refuel(profile, car_index, units, self.now(), &self.config)?;
        Ok(self.settle(refill.profile, refill.cost, None))
    }

    /// Buy a car from the dealer.
    ///
    /// # Errors
    ///
    /// Propagates the purchase [`Rejection`].
    pub fn buy_car(&self, profile: &PlayerProfile, listing: &CarListing) -> Result<ActionReport, Rejection> {
        let purchase = buy_car(profile, listing, self.now(), &self.config)?;
        Ok(self.settle(purchase.profile, listing.price.max(0), None))
    }

    /// Sell a car back to the dealer.
    ///
    /// # Errors
    ///
    /// Propagates the sale [`Rejection`].
    pub fn sell_car(&self, profile: &PlayerProfile, index: usize) -> Result<ActionReport, Rejection> {
        let sale = sell_car(profile, index, &self.config)?;
        Ok(self.settle(sale.profile, -sale.refund, None))
    }

    /// Claim a completed daily task.
    ///
    /// # Errors
    ///
    /// Propagates the claim [`Rejection`].
    pub fn claim_task(&self, profile: &PlayerProfile, task_id: &str) -> Result<ActionReport, Rejection> {
        let claim = claim_task(profile, task_id)?;
        Ok(self.settle(claim.profile, -claim.reward, None))
    }

    /// Run an achievement sweep outside of any action.
    #[must_use]
    pub fn evaluate_achievements(&self, profile: &PlayerProfile) -> AchievementSweep {
        evaluate_achievements(profile, &self.achievements, self.now(), &self.config)
    }

    /// Durably store an accepted profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be saved.
    pub fn commit(&self, profile: &PlayerProfile) -> Result<(), S::Error> {
        self.storage.save_profile(&profile.id, profile)
    }

    /// Load a profile and establish its invariants.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be loaded.
    pub fn load_profile(&self, profile_id: &str) -> Result<Option<PlayerProfile>, anyhow::Error>
    where
        S::Error: Into<anyhow::Error>,
    {
        let Some(mut profile) = self.storage.load_profile(profile_id).map_err(Into::into)? else {
            return Ok(None);
        };
        if profile.normalize(&self.config) {
            log::warn!("profile {profile_id} needed repairs on load");
        }
        Ok(Some(profile))
    }

    /// Delete a saved profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    pub fn delete_profile(&self, profile_id: &str) -> Result<(), S::Error> {
        self.storage.delete_profile(profile_id)
    }
}
