//! Rejection and configuration error types.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::car::{SpecialPart, UpgradeKind};

/// Local, recoverable refusal of an operation. A rejected operation never
/// hands back a modified profile, so callers treat it as a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    #[error("insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: i64, need: i64 },
    #[error("insufficient fuel: have {have}, need {need}")]
    InsufficientFuel { have: u32, need: u32 },
    #[error("{kind} is already at the tier cap of {cap}")]
    MaxLevelReached { kind: UpgradeKind, cap: u8 },
    #[error("{part} is already installed")]
    AlreadyOwned { part: SpecialPart },
    #[error("task {id} is not completed yet")]
    TaskNotCompleted { id: String },
    #[error("task {id} reward was already claimed")]
    AlreadyClaimed { id: String },
    #[error("no active task with id {id}")]
    UnknownTask { id: String },
    #[error("unknown upgrade type `{key}`")]
    UnknownUpgradeType { key: String },
    #[error("unknown special part `{key}`")]
    UnknownPartType { key: String },
    #[error("no car in garage slot {index}")]
    UnknownCar { index: usize },
    #[error("bet must not be negative (got {amount})")]
    InvalidBet { amount: i64 },
    #[error("the last car in the garage cannot be sold")]
    CannotSellLastCar,
    #[error("fuel tank is already full")]
    FuelTankFull,
}

impl Rejection {
    /// Stable machine-readable key for UI lookup tables.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::InsufficientFunds { .. } => "reject.insufficient_funds",
            Self::InsufficientFuel { .. } => "reject.insufficient_fuel",
            Self::MaxLevelReached { .. } => "reject.max_level",
            Self::AlreadyOwned { .. } => "reject.already_owned",
            Self::TaskNotCompleted { .. } => "reject.task_not_completed",
            Self::AlreadyClaimed { .. } => "reject.already_claimed",
            Self::UnknownTask { .. } => "reject.unknown_task",
            Self::UnknownUpgradeType { .. } => "reject.unknown_upgrade",
            Self::UnknownPartType { .. } => "reject.unknown_part",
            Self::UnknownCar { .. } => "reject.unknown_car",
            Self::InvalidBet { .. } => "reject.invalid_bet",
            Self::CannotSellLastCar => "reject.last_car",
            Self::FuelTankFull => "reject.tank_full",
        }
    }
}

/// Errors raised when engine configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be at least {min:.2} (got {value:.2})")]
    MinViolation {
        field: &'static str,
        min: f64,
        value: f64,
    },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("jitter minimum {min:.2} exceeds maximum {max:.2}")]
    JitterBounds { min: f64, max: f64 },
    #[error("tier brackets must be sorted by price (bracket {index} is out of order)")]
    TierOrder { index: usize },
    #[error("difficulty bands must ascend (got {easy:.2}, {medium:.2}, {hard:.2})")]
    BandOrder { easy: f64, medium: f64, hard: f64 },
    #[error("config parse error: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
