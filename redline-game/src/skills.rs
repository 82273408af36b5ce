//! Driver skills and per-race skill growth.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::SkillConfig;
use crate::numbers::u64_to_f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillKind {
    Driving,
    Speed,
    Reaction,
    Technique,
}

impl SkillKind {
    pub const ALL: [Self; 4] = [Self::Driving, Self::Speed, Self::Reaction, Self::Technique];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Driving => "driving",
            Self::Speed => "speed",
            Self::Reaction => "reaction",
            Self::Technique => "technique",
        }
    }
}

impl fmt::Display for SkillKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Driver skill levels. Each starts at 1 and only ever grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skills {
    #[serde(default = "Skills::default_level")]
    pub driving: u32,
    #[serde(default = "Skills::default_level")]
    pub speed: u32,
    #[serde(default = "Skills::default_level")]
    pub reaction: u32,
    #[serde(default = "Skills::default_level")]
    pub technique: u32,
}

impl Default for Skills {
    fn default() -> Self {
        Self {
            driving: Self::default_level(),
            speed: Self::default_level(),
            reaction: Self::default_level(),
            technique: Self::default_level(),
        }
    }
}

impl Skills {
    const fn default_level() -> u32 {
        1
    }

    #[must_use]
    pub const fn get(&self, kind: SkillKind) -> u32 {
        match kind {
            SkillKind::Driving => self.driving,
            SkillKind::Speed => self.speed,
            SkillKind::Reaction => self.reaction,
            SkillKind::Technique => self.technique,
        }
    }

    const fn slot(&mut self, kind: SkillKind) -> &mut u32 {
        match kind {
            SkillKind::Driving => &mut self.driving,
            SkillKind::Speed => &mut self.speed,
            SkillKind::Reaction => &mut self.reaction,
            SkillKind::Technique => &mut self.technique,
        }
    }

    /// Raise one skill by a level and return the new level.
    pub fn improve(&mut self, kind: SkillKind) -> u32 {
        let slot = self.slot(kind);
        *slot = slot.saturating_add(1);
        *slot
    }

    /// Points earned above the starting level, summed across all skills.
    #[must_use]
    pub fn total_points(&self) -> u64 {
        SkillKind::ALL
            .into_iter()
            .map(|kind| u64::from(self.get(kind).saturating_sub(1)))
            .sum()
    }

    /// Lift any skill below the starting level back to 1.
    pub fn normalize(&mut self) -> bool {
        let mut repaired = false;
        for kind in SkillKind::ALL {
            let slot = self.slot(kind);
            if *slot < 1 {
                *slot = 1;
                repaired = true;
            }
        }
        repaired
    }
}

/// Percent chance that a race improves the chosen skill.
///
/// Diminishes with every point already earned, never dropping below the floor.
#[must_use]
pub fn skill_chance(total_points: u64, won: bool, cfg: &SkillConfig) -> f64 {
    let base = if won { cfg.win_chance } else { cfg.loss_chance };
    let decayed = base / (1.0 + u64_to_f64(total_points) * cfg.decay_per_point);
    decayed.max(cfg.chance_floor)
}

/// Result of the post-race skill roll.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkillRoll {
    pub skill: SkillKind,
    /// New level when the roll succeeded.
    pub new_level: Option<u32>,
    /// Chance in percent the roll was made against.
    pub chance: f64,
}

impl SkillRoll {
    #[must_use]
    pub const fn improved(&self) -> bool {
        self.new_level.is_some()
    }
}

/// Pick a skill uniformly and roll for a one-level gain.
pub fn roll_skill_growth<R: Rng + ?Sized>(
    skills: &mut Skills,
    won: bool,
    cfg: &SkillConfig,
    rng: &mut R,
) -> SkillRoll {
    let skill = SkillKind::ALL[rng.gen_range(0..SkillKind::ALL.len())];
    let chance = skill_chance(skills.total_points(), won, cfg);
    let roll: f64 = rng.gen_range(0.0..100.0);
    let capped = cfg.cap.is_some_and(|cap| skills.get(skill) >= cap);

    let new_level = (roll < chance && !capped).then(|| skills.improve(skill));
    if let Some(level) = new_level {
        log::debug!(
            "{skill} improved to {level} (roll {roll:.2} < {chance:.2})"
        );
    }
    SkillRoll {
        skill,
        new_level,
        chance,
    }
}
