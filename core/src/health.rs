//! Health state of the medaka, set by an external sensor and read when composing replies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::info;

use crate::MedakaError;

/// Mood/activity indicator of the simulated fish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HealthState {
    Active,
    #[default]
    Normal,
    Lethargic,
}

impl HealthState {
    pub const ALL: [HealthState; 3] = [Self::Active, Self::Normal, Self::Lethargic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Normal => "Normal",
            Self::Lethargic => "Lethargic",
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            Self::Active => 0,
            Self::Normal => 1,
            Self::Lethargic => 2,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Active,
            2 => Self::Lethargic,
            _ => Self::Normal,
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthState {
    type Err = MedakaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(Self::Active),
            "Normal" => Ok(Self::Normal),
            "Lethargic" => Ok(Self::Lethargic),
            other => Err(MedakaError::InvalidHealth(other.to_string())),
        }
    }
}

/// Process-wide health value. Writes are whole-value atomic replacements (last write wins).
#[derive(Debug)]
pub struct HealthStateStore {
    value: AtomicU8,
}

impl Default for HealthStateStore {
    fn default() -> Self {
        Self::new(HealthState::default())
    }
}

impl HealthStateStore {
    pub fn new(initial: HealthState) -> Self {
        Self {
            value: AtomicU8::new(initial.to_u8()),
        }
    }

    pub fn get(&self) -> HealthState {
        HealthState::from_u8(self.value.load(Ordering::Acquire))
    }

    /// Validate and store a raw status string. Unknown values leave the store untouched.
    pub fn set(&self, raw: &str) -> crate::Result<HealthState> {
        let next = raw.parse::<HealthState>()?;
        self.replace(next);
        Ok(next)
    }

    pub fn replace(&self, next: HealthState) {
        self.value.store(next.to_u8(), Ordering::Release);
        info!(target: "health", health = %next, "Health status updated");
    }
}
