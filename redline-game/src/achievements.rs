//! Declarative achievements and the one-way unlock sweep.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::OnceLock;

use crate::config::EngineConfig;
use crate::profile::PlayerProfile;
use crate::skills::SkillKind;

const DEFAULT_ACHIEVEMENT_DATA: &str = include_str!("../assets/achievements.json");

/// Unlock rule, expressed as a condition kind plus its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AchievementCondition {
    TotalRaces { count: u64 },
    Wins { count: u64 },
    MoneyEarned { amount: i64 },
    MoneyBalance { amount: i64 },
    Level { level: u32 },
    SkillLevel { skill: SkillKind, level: u32 },
    /// Any upgrade on any owned car at or above `level`.
    MaxUpgradeLevel { level: u8 },
    CarsOwned { count: u64 },
    /// Special parts installed on a single car.
    SpecialParts { count: u64 },
    /// Any upgrade sitting at its car's tier cap.
    MaxedUpgrade,
}

fn non_negative(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn count_u64(value: usize) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

impl AchievementCondition {
    /// Threshold the tracked figure must reach.
    #[must_use]
    pub fn target(&self) -> u64 {
        match *self {
            Self::TotalRaces { count }
            | Self::Wins { count }
            | Self::CarsOwned { count }
            | Self::SpecialParts { count } => count,
            Self::MoneyEarned { amount } | Self::MoneyBalance { amount } => non_negative(amount),
            Self::Level { level } | Self::SkillLevel { level, .. } => u64::from(level),
            Self::MaxUpgradeLevel { level } => u64::from(level),
            Self::MaxedUpgrade => 1,
        }
    }

    /// Current value of the tracked figure, unclamped.
    #[must_use]
    pub fn current(&self, profile: &PlayerProfile, cfg: &EngineConfig) -> u64 {
        match *self {
            Self::TotalRaces { .. } => profile.stats.total_races,
            Self::Wins { .. } => profile.stats.wins,
            Self::MoneyEarned { .. } => non_negative(profile.stats.money_earned),
            Self::MoneyBalance { .. } => non_negative(profile.money),
            Self::Level { .. } => u64::from(profile.level),
            Self::SkillLevel { skill, .. } => u64::from(profile.skills.get(skill)),
            Self::MaxUpgradeLevel { .. } => profile
                .cars
                .iter()
                .map(|car| u64::from(car.max_upgrade_level()))
                .max()
                .unwrap_or(0),
            Self::CarsOwned { .. } => count_u64(profile.cars.len()),
            Self::SpecialParts { .. } => profile
                .cars
                .iter()
                .map(|car| count_u64(car.special_parts.count()))
                .max()
                .unwrap_or(0),
            Self::MaxedUpgrade => u64::from(profile.cars.iter().any(|car| {
                let cap = car.tier_cap(cfg);
                car.upgrades.values().any(|&level| level >= cap)
            })),
        }
    }

    #[must_use]
    pub fn is_met(&self, profile: &PlayerProfile, cfg: &EngineConfig) -> bool {
        self.current(profile, cfg) >= self.target()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub condition: AchievementCondition,
}

impl Achievement {
    #[must_use]
    pub fn max_progress(&self) -> u64 {
        self.condition.target()
    }

    /// Display progress, clamped to [`Achievement::max_progress`].
    #[must_use]
    pub fn progress(&self, profile: &PlayerProfile, cfg: &EngineConfig) -> u64 {
        self.condition.current(profile, cfg).min(self.max_progress())
    }
}

/// Append-only unlock record kept on the profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementUnlock {
    pub id: String,
    /// Epoch milliseconds.
    pub unlocked_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AchievementCatalog {
    #[serde(default)]
    pub achievements: Vec<Achievement>,
}

impl AchievementCatalog {
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::parse_bundled(DEFAULT_ACHIEVEMENT_DATA)
    }

    /// Parse bundled data, logging and falling back to an empty catalogue on failure.
    fn parse_bundled(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_else(|err| {
            log::error!("bundled achievement catalogue failed to parse: {err}");
            Self::default()
        })
    }

    /// Bundled catalogue, parsed once.
    #[must_use]
    pub fn default_catalog() -> &'static Self {
        static CATALOG: OnceLock<AchievementCatalog> = OnceLock::new();
        CATALOG.get_or_init(Self::load_from_static)
    }

    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a catalogue.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Achievement> {
        self.achievements.iter().find(|achievement| achievement.id == id)
    }
}

/// Profile after a sweep, with the ids unlocked by it.
#[derive(Debug, Clone, PartialEq)]
pub struct AchievementSweep {
    pub profile: PlayerProfile,
    pub newly_unlocked: SmallVec<[String; 2]>,
}

/// Unlock every achievement whose condition now holds, in place.
pub fn unlock_achievements(
    profile: &mut PlayerProfile,
    catalog: &AchievementCatalog,
    now: i64,
    cfg: &EngineConfig,
) -> SmallVec<[String; 2]> {
    let mut unlocked = SmallVec::new();
    for achievement in &catalog.achievements {
        if profile.has_achievement(&achievement.id) || !achievement.condition.is_met(profile, cfg) {
            continue;
        }
        log::info!("profile {} unlocked {}", profile.id, achievement.id);
        profile.achievements.push(AchievementUnlock {
            id: achievement.id.clone(),
            unlocked_at: now,
        });
        unlocked.push(achievement.id.clone());
    }
    unlocked
}

/// Evaluate the catalogue against a profile snapshot.
#[must_use]
pub fn evaluate_achievements(
    profile: &PlayerProfile,
    catalog: &AchievementCatalog,
    now: i64,
    cfg: &EngineConfig,
) -> AchievementSweep {
    let mut next = profile.clone();
    let newly_unlocked = unlock_achievements(&mut next, catalog, now, cfg);
    AchievementSweep {
        profile: next,
        newly_unlocked,
    }
}
