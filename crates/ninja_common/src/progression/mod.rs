//! Progression Module
//!
//! XP, levels and ranks for a signed-in trader, reconciled against the
//! remote progression service.
//!
//! ## Level System
//!
//! - `level = floor(sqrt(xp / 100))`
//! - Ranks by level band: Genin, Chunin, Jonin, Kage
//!
//! ## Engine
//!
//! - `load` pulls authoritative stats, falling back to the local cache
//! - `award` submits XP, falling back to optimistic local math
//! - Results are tagged so callers can tell which path was taken

pub mod engine;
pub mod levels;
pub mod state;

pub use engine::{IgnoreReason, ProgressionEngine, SyncOutcome};
pub use levels::{clamp_xp, xp_for_level, Level, Rank, UnknownRank, BASE_XP, RANK_BANDS};
pub use state::{ProgressionState, STARTING_CASH};
