//! Daily task progress, completion and reward claims.
//!
//! Tasks are issued by an outside scheduler with a fixed expiry. The tracker
//! only ever moves progress forward: race-derived tracks are recomputed from the
//! career counters against the baseline captured at issue time, while fuel and
//! upgrade tracks accumulate the amounts carried by each event.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::Rejection;
use crate::profile::{CareerStats, PlayerProfile};
use crate::race::RaceOutcome;

/// Career figure a daily task follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackStat {
    Races,
    Wins,
    MoneyEarned,
    FuelSpent,
    UpgradesBought,
}

impl TrackStat {
    pub const ALL: [Self; 5] = [
        Self::Races,
        Self::Wins,
        Self::MoneyEarned,
        Self::FuelSpent,
        Self::UpgradesBought,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Races => "races",
            Self::Wins => "wins",
            Self::MoneyEarned => "money_earned",
            Self::FuelSpent => "fuel_spent",
            Self::UpgradesBought => "upgrades_bought",
        }
    }

    /// Whether progress is measured as cumulative stat minus baseline.
    #[must_use]
    pub const fn is_snapshot(self) -> bool {
        matches!(self, Self::Races | Self::Wins | Self::MoneyEarned)
    }

    /// Current cumulative value for snapshot tracks.
    #[must_use]
    pub fn snapshot(self, stats: &CareerStats) -> u64 {
        match self {
            Self::Races => stats.total_races,
            Self::Wins => stats.wins,
            Self::MoneyEarned => u64::try_from(stats.money_earned).unwrap_or(0),
            Self::FuelSpent => stats.fuel_spent,
            Self::UpgradesBought => stats.upgrades_bought,
        }
    }
}

/// Something that happened to the profile that tasks may care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "amount", rename_all = "snake_case")]
pub enum TaskEvent {
    /// A race was resolved; races, wins and money earned are recomputed.
    RaceFinished,
    FuelSpent(u32),
    UpgradeBought,
}

impl TaskEvent {
    /// Events a resolved race feeds into the tracker.
    #[must_use]
    pub fn from_race(outcome: &RaceOutcome) -> SmallVec<[Self; 2]> {
        let mut events = SmallVec::new();
        events.push(Self::RaceFinished);
        if outcome.fuel_spent > 0 {
            events.push(Self::FuelSpent(outcome.fuel_spent));
        }
        events
    }

    fn matches(self, track: TrackStat) -> bool {
        match self {
            Self::RaceFinished => track.is_snapshot(),
            Self::FuelSpent(_) => track == TrackStat::FuelSpent,
            Self::UpgradeBought => track == TrackStat::UpgradesBought,
        }
    }

    fn increment(self) -> u64 {
        match self {
            Self::RaceFinished => 0,
            Self::FuelSpent(amount) => u64::from(amount),
            Self::UpgradeBought => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTask {
    pub id: String,
    pub track: TrackStat,
    #[serde(default)]
    pub progress: u64,
    pub required: u64,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub claimed: bool,
    pub reward: i64,
    /// Cumulative stat value when the task was issued.
    #[serde(default)]
    pub baseline: u64,
    /// Epoch milliseconds after which the task no longer tracks.
    pub expires_at: i64,
}

impl DailyTask {
    /// Issue a task, capturing the current career figure as its baseline.
    #[must_use]
    pub fn issue(
        id: impl Into<String>,
        track: TrackStat,
        required: u64,
        reward: i64,
        stats: &CareerStats,
        expires_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            track,
            progress: 0,
            required,
            completed: false,
            claimed: false,
            reward,
            baseline: if track.is_snapshot() {
                track.snapshot(stats)
            } else {
                0
            },
            expires_at,
        }
    }

    #[must_use]
    pub const fn is_active(&self, now: i64) -> bool {
        now < self.expires_at
    }

    #[must_use]
    pub const fn is_claimable(&self) -> bool {
        self.completed && !self.claimed
    }

    /// Fold one event into progress. Returns true when this call completed the task.
    fn advance(&mut self, event: TaskEvent, stats: &CareerStats) -> bool {
        let candidate = if self.track.is_snapshot() {
            self.track.snapshot(stats).saturating_sub(self.baseline)
        } else {
            self.progress.saturating_add(event.increment())
        };
        self.progress = self.progress.max(candidate.min(self.required));
        if self.progress >= self.required {
            self.completed = true;
            return true;
        }
        false
    }
}

/// Profile after an event, with the tasks it completed.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskProgress {
    pub profile: PlayerProfile,
    pub completed: SmallVec<[String; 2]>,
}

/// Apply `event` to every active, unfinished task in place.
///
/// Returns ids of the tasks completed by this event.
pub fn apply_task_event(
    profile: &mut PlayerProfile,
    event: TaskEvent,
    now: i64,
) -> SmallVec<[String; 2]> {
    let stats = profile.stats;
    let mut completed = SmallVec::new();
    for task in &mut profile.daily_tasks {
        if task.completed || !task.is_active(now) || !event.matches(task.track) {
            continue;
        }
        if task.advance(event, &stats) {
            log::info!("profile {} completed task {}", profile.id, task.id);
            completed.push(task.id.clone());
        }
    }
    completed
}

/// Track `event` against the profile's daily tasks.
#[must_use]
pub fn track_tasks(profile: &PlayerProfile, event: TaskEvent, now: i64) -> TaskProgress {
    let mut next = profile.clone();
    let completed = apply_task_event(&mut next, event, now);
    TaskProgress {
        profile: next,
        completed,
    }
}

/// Successful task claim.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskClaim {
    pub profile: PlayerProfile,
    pub reward: i64,
}

/// Pay out a completed task's reward, once.
///
/// # Errors
///
/// [`Rejection::UnknownTask`], [`Rejection::TaskNotCompleted`] or
/// [`Rejection::AlreadyClaimed`].
pub fn claim_task(profile: &PlayerProfile, task_id: &str) -> Result<TaskClaim, Rejection> {
    let task = profile
        .daily_tasks
        .iter()
        .find(|task| task.id == task_id)
        .ok_or_else(|| Rejection::UnknownTask {
            id: task_id.to_string(),
        })?;
    if !task.completed {
        return Err(Rejection::TaskNotCompleted {
            id: task_id.to_string(),
        });
    }
    if task.claimed {
        return Err(Rejection::AlreadyClaimed {
            id: task_id.to_string(),
        });
    }
    let reward = task.reward.max(0);

    let mut next = profile.clone();
    if let Some(task) = next.daily_tasks.iter_mut().find(|task| task.id == task_id) {
        task.claimed = true;
    }
    next.money += reward;
    log::debug!("profile {} claimed task {task_id} for {reward}", next.id);
    Ok(TaskClaim {
        profile: next,
        reward,
    })
}

/// Drop every task whose expiry has passed.
#[must_use]
pub fn prune_expired_tasks(profile: &PlayerProfile, now: i64) -> PlayerProfile {
    let mut next = profile.clone();
    next.daily_tasks.retain(|task| task.is_active(now));
    next
}
