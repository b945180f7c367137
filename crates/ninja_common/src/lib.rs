//! Shared progression library for Trader Ninja components.
//!
//! XP, levels and ranks for a signed-in trader, kept in sync with the remote
//! progression service and degraded gracefully when it is unreachable.

pub mod cache;
pub mod config;
pub mod error;
pub mod progression;
pub mod remote;
pub mod wire;

pub use cache::{cache_key, FileXpCache, MemoryXpCache, XpCache};
pub use config::NinjaConfig;
pub use error::{NinjaError, Result};
pub use progression::{
    IgnoreReason, Level, ProgressionEngine, ProgressionState, Rank, SyncOutcome,
};
pub use remote::{
    AwardReceipt, FakeProgressionService, HttpProgressionService, OfflineService,
    ProgressionService, RemoteStats, XpEvent,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
