use anyhow::{Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use redline_game::{
    ActionReport, Clock, DailyTask, DealerCatalog, EngineConfig, Opponent, OpponentSource, PlayerProfile,
    RaceEngine, RaceOutcome, Rejection, SkillKind, TrackStat, prune_expired_tasks, select_car,
};

use super::clock::SimClock;
use super::opponents::LineupGenerator;
use super::policy::{DriverPolicy, DriverStrategy, ShopAction};
use super::storage::SaveTarget;

/// Simulated careers start at 2026-01-01T00:00:00Z.
pub const SIM_EPOCH_MS: i64 = 1_767_225_600_000;
const DAY_MS: i64 = 86_400_000;
const MIN_PAUSE_MINUTES: i64 = 20;
const MAX_PAUSE_MINUTES: i64 = 30;
const SHOP_ACTIONS_PER_BREAK: usize = 3;
const GARAGE_LIMIT: usize = 2;
const LINEUP_SEED_SALT: u64 = 0x6c69_6e65_7570;
const PACE_SEED_SALT: u64 = 0x7061_6365;

/// Daily task board: (track, required, reward).
const DAILY_BOARD: [(TrackStat, u64, i64); 3] = [
    (TrackStat::Races, 5, 500),
    (TrackStat::Wins, 3, 750),
    (TrackStat::FuelSpent, 40, 400),
];

/// One automated career to run.
#[derive(Debug, Clone)]
pub struct CareerPlan {
    pub seed: u64,
    pub races: u32,
    pub strategy: DriverStrategy,
    pub config: EngineConfig,
}

impl CareerPlan {
    #[must_use]
    pub fn new(seed: u64, strategy: DriverStrategy) -> Self {
        Self {
            seed,
            races: 60,
            strategy,
            config: EngineConfig::default(),
        }
    }

    #[must_use]
    pub const fn with_races(mut self, races: u32) -> Self {
        self.races = races;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn profile_id(&self) -> String {
        format!("seed-{}-{}", self.seed, self.strategy.label().to_lowercase())
    }
}

/// Aggregated result of one career.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CareerSummary {
    pub profile_id: String,
    pub seed: u64,
    pub strategy: String,
    pub race_slots: u32,
    pub races_run: u32,
    pub wins: u64,
    pub losses: u64,
    /// Slots where the policy found no opponent worth racing.
    pub skipped: u32,
    pub rejections: BTreeMap<String, u32>,
    pub final_level: u32,
    pub final_money: i64,
    pub money_earned: i64,
    pub money_spent: i64,
    pub cars_owned: usize,
    pub upgrades_bought: u64,
    pub parts_bought: u32,
    pub cars_bought: u32,
    pub cars_sold: u32,
    pub tasks_completed: u32,
    pub tasks_claimed: u32,
    pub achievements: Vec<String>,
    pub failures: Vec<String>,
    pub duration_ms: u64,
    pub passed: bool,
}

impl CareerSummary {
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn win_rate(&self) -> f64 {
        if self.races_run == 0 {
            0.0
        } else {
            self.wins as f64 / f64::from(self.races_run) * 100.0
        }
    }

    fn reject(&mut self, rejection: &Rejection) {
        *self.rejections.entry(rejection.key().to_string()).or_insert(0) += 1;
    }
}

/// Invariants every accepted race must preserve.
#[must_use]
pub fn check_race_invariants(
    before: &PlayerProfile,
    after: &PlayerProfile,
    outcome: &RaceOutcome,
) -> Vec<String> {
    let mut failures = Vec::new();
    if after.stats.total_races != before.stats.total_races + 1 {
        failures.push(format!(
            "race count moved from {} to {}",
            before.stats.total_races, after.stats.total_races
        ));
    }
    if after.stats.wins + after.stats.losses != after.stats.total_races {
        failures.push(format!(
            "wins {} + losses {} != races {}",
            after.stats.wins, after.stats.losses, after.stats.total_races
        ));
    }
    let expected_money = before.money + outcome.money_delta + outcome.level_reward.unwrap_or(0);
    if after.money != expected_money {
        failures.push(format!("money {} != expected {expected_money}", after.money));
    }
    if after.money < 0 {
        failures.push(format!("money went negative: {}", after.money));
    }
    if after.experience != before.experience + outcome.xp_gained {
        failures.push(format!(
            "experience {} != {} + {}",
            after.experience, before.experience, outcome.xp_gained
        ));
    }
    if after.level < before.level || after.level != outcome.new_level {
        failures.push(format!(
            "level {} -> {} (outcome reports {})",
            before.level, after.level, outcome.new_level
        ));
    }
    if outcome.won != (outcome.player_time < outcome.opponent_time) {
        failures.push(format!(
            "won={} with {:.2}s vs {:.2}s",
            outcome.won, outcome.player_time, outcome.opponent_time
        ));
    }
    for kind in SkillKind::ALL {
        if after.skills.get(kind) < before.skills.get(kind) {
            failures.push(format!("{kind} skill decreased"));
        }
    }
    for car in &after.cars {
        if car.fuel > car.max_fuel {
            failures.push(format!("{} holds {} of {} fuel", car.id, car.fuel, car.max_fuel));
        }
    }
    if !after.achievements.starts_with(&before.achievements) {
        failures.push("achievement history was rewritten".to_string());
    }
    failures
}

struct CareerRun<'a> {
    engine: &'a RaceEngine<SaveTarget, SimClock>,
    clock: SimClock,
    policy: Box<dyn DriverPolicy>,
    lineup: LineupGenerator,
    pace: ChaCha20Rng,
    profile: PlayerProfile,
    summary: CareerSummary,
    next_rollover: i64,
    day: u32,
}

impl CareerRun<'_> {
    fn roll_daily_board(&mut self) {
        let now = self.clock.now_ms();
        if now < self.next_rollover {
            return;
        }
        self.profile = prune_expired_tasks(&self.profile, now);
        self.next_rollover = now + DAY_MS;
        self.day += 1;
        for (track, required, reward) in DAILY_BOARD {
            let id = format!("day{}-{}", self.day, track.as_str());
            let task = DailyTask::issue(id, track, required, reward, &self.profile.stats, self.next_rollover);
            self.profile.daily_tasks.push(task);
        }
        log::debug!("{} day {} board issued", self.profile.id, self.day);
    }

    fn pause(&mut self) {
        let minutes = self.pace.gen_range(MIN_PAUSE_MINUTES..=MAX_PAUSE_MINUTES);
        self.clock.advance_minutes(minutes);
    }

    fn accept(&mut self, before_money: i64, report: ActionReport, label: &str) {
        if report.profile.money != before_money - report.cost {
            self.summary.failures.push(format!(
                "{label}: money {} != {before_money} - {}",
                report.profile.money, report.cost
            ));
        }
        self.summary.tasks_completed += u32::try_from(report.tasks_completed.len()).unwrap_or(0);
        self.profile = report.profile;
    }

    fn shop(&mut self) {
        let engine = self.engine;
        let cfg = engine.config();
        for _ in 0..SHOP_ACTIONS_PER_BREAK {
            let now = self.clock.now_ms();
            let Some(action) = self.policy.shop(&self.profile, cfg, engine.pricing(), now) else {
                return;
            };
            let slot = self.profile.current_car;
            let money = self.profile.money;
            let result = match &action {
                ShopAction::Upgrade(kind) => engine.buy_upgrade(&self.profile, slot, *kind),
                ShopAction::Part(part) => engine.buy_special_part(&self.profile, slot, *part),
                ShopAction::Refuel(units) => engine.refuel(&self.profile, slot, *units),
                ShopAction::BuyCar(listing) => engine.buy_car(&self.profile, listing),
            };
            match result {
                Ok(report) => {
                    log::debug!("{} shop {action:?} for {}", self.profile.id, report.cost);
                    self.accept(money, report, "shop");
                    match action {
                        ShopAction::Part(_) => self.summary.parts_bought += 1,
                        ShopAction::BuyCar(_) => self.move_into_new_car(),
                        ShopAction::Upgrade(_) | ShopAction::Refuel(_) => {}
                    }
                }
                Err(rejection) => {
                    log::debug!("{} shop {action:?} rejected: {rejection}", self.profile.id);
                    self.summary.reject(&rejection);
                    return;
                }
            }
        }
    }

    fn move_into_new_car(&mut self) {
        self.summary.cars_bought += 1;
        let newest = self.profile.cars.len().saturating_sub(1);
        match select_car(&self.profile, newest) {
            Ok(next) => self.profile = next,
            Err(rejection) => self.summary.reject(&rejection),
        }
        if self.profile.cars.len() <= GARAGE_LIMIT {
            return;
        }
        let money = self.profile.money;
        match self.engine.sell_car(&self.profile, 0) {
            Ok(report) => {
                self.summary.cars_sold += 1;
                self.accept(money, report, "sell");
            }
            Err(rejection) => self.summary.reject(&rejection),
        }
    }

    fn claim_tasks(&mut self) {
        let claimable: Vec<String> = self
            .profile
            .daily_tasks
            .iter()
            .filter(|task| task.is_claimable())
            .map(|task| task.id.clone())
            .collect();
        for id in claimable {
            let money = self.profile.money;
            match self.engine.claim_task(&self.profile, &id) {
                Ok(report) => {
                    self.summary.tasks_claimed += 1;
                    self.accept(money, report, "claim");
                }
                Err(rejection) => self.summary.reject(&rejection),
            }
        }
    }

    fn race(&mut self, opponent: &Opponent, bet: i64) {
        let before = self.profile.clone();
        match self.engine.race(&before, before.current_car, opponent, bet) {
            Ok(report) => {
                self.summary.races_run += 1;
                self.summary.tasks_completed += u32::try_from(report.tasks_completed.len()).unwrap_or(0);
                for failure in check_race_invariants(&before, &report.profile, &report.outcome) {
                    self.summary
                        .failures
                        .push(format!("race {}: {failure}", self.summary.races_run));
                }
                self.profile = report.profile;
                self.pause();
            }
            Err(rejection) => {
                self.summary.reject(&rejection);
                let windows = match rejection {
                    Rejection::InsufficientFuel { have, need } => i64::from(need.saturating_sub(have)),
                    _ => 1,
                };
                let regen = i64::from(self.engine.config().fuel.regen_minutes);
                self.clock.advance_minutes(windows.max(1) * regen);
            }
        }
    }

    fn run_slot(&mut self) {
        self.roll_daily_board();
        self.shop();

        let engine = self.engine;
        let cfg = engine.config();
        let opponents = self.lineup.opponents(&self.profile);
        let Some(pick) = self.policy.pick_opponent(&self.profile, &opponents, cfg) else {
            self.summary.skipped += 1;
            self.clock.advance_minutes(i64::from(cfg.fuel.regen_minutes));
            return;
        };
        let Some(opponent) = opponents.get(pick) else {
            self.summary.failures.push(format!("policy picked missing opponent {pick}"));
            return;
        };
        let bet = self.policy.bet(&self.profile, opponent, cfg);
        self.race(opponent, bet);
        self.claim_tasks();
    }
}

/// Run one automated career end to end and verify it survives a save/load.
///
/// # Errors
///
/// Returns an error if the engine config is invalid, the dealer catalogue is
/// empty, or the final profile cannot be committed and reloaded.
pub fn run_career(plan: &CareerPlan, storage: SaveTarget) -> Result<CareerSummary> {
    let started = Instant::now();
    let clock = SimClock::starting_at(SIM_EPOCH_MS);
    let engine = RaceEngine::new(plan.config.clone(), plan.seed, storage, clock.clone())
        .context("engine config failed validation")?;
    let starter = DealerCatalog::default_catalog()
        .cheapest()
        .context("dealer catalogue is empty")?
        .build("car-0", engine.config());
    let profile = PlayerProfile::new_career(plan.profile_id(), starter, engine.config());

    let mut run = CareerRun {
        engine: &engine,
        clock,
        policy: plan.strategy.create_policy(plan.seed.wrapping_add(1)),
        lineup: LineupGenerator::new(plan.seed ^ LINEUP_SEED_SALT, engine.config()),
        pace: ChaCha20Rng::seed_from_u64(plan.seed ^ PACE_SEED_SALT),
        summary: CareerSummary {
            profile_id: profile.id.clone(),
            seed: plan.seed,
            strategy: plan.strategy.label().to_string(),
            race_slots: plan.races,
            ..CareerSummary::default()
        },
        profile,
        next_rollover: SIM_EPOCH_MS,
        day: 0,
    };
    log::info!(
        "running {} for {} slots with {} driver",
        run.profile.id,
        plan.races,
        run.policy.name()
    );
    for _ in 0..plan.races {
        run.run_slot();
    }

    let CareerRun {
        profile,
        mut summary,
        ..
    } = run;

    let sweep = engine.evaluate_achievements(&profile);
    if !sweep.newly_unlocked.is_empty() {
        summary.failures.push(format!(
            "achievements left locked after their actions: {}",
            sweep.newly_unlocked.join(", ")
        ));
    }

    engine.commit(&profile).context("failed to commit final profile")?;
    let reloaded = engine
        .load_profile(&profile.id)
        .context("failed to reload final profile")?;
    if reloaded.as_ref() != Some(&profile) {
        summary.failures.push("reloaded profile differs from committed profile".to_string());
    }

    summary.wins = profile.stats.wins;
    summary.losses = profile.stats.losses;
    summary.final_level = profile.level;
    summary.final_money = profile.money;
    summary.money_earned = profile.stats.money_earned;
    summary.money_spent = profile.stats.money_spent;
    summary.cars_owned = profile.cars.len();
    summary.upgrades_bought = profile.stats.upgrades_bought;
    summary.achievements = profile.achievements.iter().map(|unlock| unlock.id.clone()).collect();
    summary.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    summary.passed = summary.failures.is_empty();
    if !summary.passed {
        log::warn!("{} finished with {} failures", summary.profile_id, summary.failures.len());
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use redline_game::{AchievementUnlock, Car, CarStats, SkillRoll};

    fn outcome(won: bool, player_time: f64, opponent_time: f64, xp_gained: u64, money_delta: i64) -> RaceOutcome {
        RaceOutcome {
            won,
            player_time,
            opponent_time,
            xp_gained,
            money_delta,
            fuel_spent: 5,
            nitro_activated: false,
            skill_roll: SkillRoll {
                skill: SkillKind::Driving,
                new_level: None,
                chance: 50.0,
            },
            leveled_up: false,
            levels_gained: 0,
            level_reward: None,
            new_level: 1,
            log_key: String::new(),
        }
    }

    fn profile() -> PlayerProfile {
        let cfg = EngineConfig::default();
        let car = Car::new("c", "Hatch", 5_000, CarStats::new(40, 40, 40, 40), &cfg);
        PlayerProfile::new_career("p", car, &cfg)
    }

    #[test]
    fn careers_are_reproducible_per_seed() {
        let plan = CareerPlan::new(42, DriverStrategy::Balanced).with_races(30);
        let first = run_career(&plan, SaveTarget::memory()).unwrap();
        let second = run_career(&plan, SaveTarget::memory()).unwrap();
        assert_eq!(first.final_money, second.final_money);
        assert_eq!(first.wins, second.wins);
        assert_eq!(first.achievements, second.achievements);
        assert_eq!(first.rejections, second.rejections);
    }

    #[test]
    fn every_strategy_finishes_clean() {
        for strategy in DriverStrategy::ALL {
            let plan = CareerPlan::new(7, strategy).with_races(40);
            let summary = run_career(&plan, SaveTarget::memory()).unwrap();
            assert!(summary.passed, "{strategy}: {:?}", summary.failures);
            assert!(summary.races_run > 0, "{strategy} never raced");
            assert_eq!(summary.wins + summary.losses, u64::from(summary.races_run));
            assert!(summary.achievements.contains(&"first_race".to_string()));
        }
    }

    #[test]
    fn invalid_config_is_reported() {
        let mut config = EngineConfig::default();
        config.race.jitter_min = 2.0;
        let plan = CareerPlan::new(1, DriverStrategy::Cautious).with_config(config);
        assert!(run_career(&plan, SaveTarget::memory()).is_err());
    }

    #[test]
    fn invariant_check_flags_money_drift() {
        let before = profile();
        let mut after = before.clone();
        after.stats.total_races = 1;
        after.stats.wins = 1;
        after.experience = 65;
        after.money = before.money + 999;
        let outcome = outcome(true, 50.0, 55.0, 65, 500);
        let failures = check_race_invariants(&before, &after, &outcome);
        assert_eq!(failures.len(), 1, "{failures:?}");
        assert!(failures[0].starts_with("money"));

        after.money = before.money + 500;
        assert!(check_race_invariants(&before, &after, &outcome).is_empty());
    }

    #[test]
    fn invariant_check_flags_rewritten_history() {
        let mut before = profile();
        before.achievements.push(AchievementUnlock {
            id: "first_race".into(),
            unlocked_at: SIM_EPOCH_MS,
        });
        let mut after = before.clone();
        after.achievements.clear();
        after.stats.total_races = 1;
        after.stats.losses = 1;
        let outcome = outcome(false, 60.0, 55.0, 0, 0);
        let failures = check_race_invariants(&before, &after, &outcome);
        assert_eq!(failures, vec!["achievement history was rewritten".to_string()]);
    }
}
