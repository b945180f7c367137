//! Per-session progression state.

use super::levels::{Level, Rank};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Paper-trading balance every session starts with
pub const STARTING_CASH: i64 = 100_000;

/// Snapshot of a user's progression.
///
/// The engine owns the live copy; callers only ever see clones, so `level`
/// and `rank` can't drift from what the engine last reconciled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionState {
    /// Total lifetime XP
    pub xp: u64,
    /// Current level (derived or service-provided)
    pub level: Level,
    /// Current rank (derived or service-provided)
    pub rank: Rank,
    /// Set by a level-increasing award until acknowledged
    pub just_leveled_up: bool,
    /// Local paper-trading balance
    pub virtual_cash: i64,
    /// When the remote service last confirmed this state
    pub last_synced: Option<DateTime<Utc>>,
}

impl ProgressionState {
    pub fn new() -> Self {
        Self {
            xp: 0,
            level: Level::default(),
            rank: Rank::from_level(Level::default()),
            just_leveled_up: false,
            virtual_cash: STARTING_CASH,
            last_synced: None,
        }
    }

    /// Create from existing XP, deriving level and rank locally
    pub fn from_xp(xp: u64) -> Self {
        let mut state = Self::new();
        state.set_xp_derived(xp);
        state
    }

    /// Replace XP and re-derive level and rank. Returns true if the level went up.
    pub(crate) fn set_xp_derived(&mut self, xp: u64) -> bool {
        let old_level = self.level;
        self.xp = xp;
        self.level = Level::from_xp(xp);
        self.rank = self.level.rank();
        self.level > old_level
    }

    /// Total XP at which the next level starts
    pub fn xp_for_next_level(&self) -> u64 {
        self.level.xp_for_next()
    }

    /// XP still missing for the next level
    pub fn xp_to_next_level(&self) -> u64 {
        self.xp_for_next_level().saturating_sub(self.xp)
    }

    /// Progress through the current level (0.0 - 100.0)
    pub fn progress_percent(&self) -> f64 {
        self.level.progress_percent(self.xp)
    }
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self::new()
    }
}
