//! Progression engine.
//!
//! Owns the live [`ProgressionState`] for the signed-in user and is the only
//! thing that mutates it. Share it as an `Arc<ProgressionEngine>` handle.
//!
//! ## Sessions
//!
//! The engine is bound to at most one user at a time. Binding a different
//! user (or signing out) resets the state and bumps a generation counter.
//! `load` and `award` capture the generation before going to the network
//! and drop their result if it changed while they were waiting, so a late
//! response can never land in somebody else's (or a reset) session.
//!
//! ## Reconciliation
//!
//! | Operation | Remote ok                         | Remote failed                     |
//! |-----------|-----------------------------------|-----------------------------------|
//! | `load`    | take service xp/level/rank        | cached xp, derive level/rank      |
//! | `award`   | take service total (+ level-up)   | optimistic `xp + amount`, derive  |
//!
//! Neither operation returns an error; the outcome says which path ran.

use super::levels::{Level, Rank};
use super::state::ProgressionState;
use crate::cache::XpCache;
use crate::remote::{AwardReceipt, ProgressionService, RemoteStats, XpEvent};
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Why an operation left the state alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// No user identifier was supplied
    MissingUser,
    /// Award amount was zero
    NonPositiveAmount,
    /// Award for a user other than the bound session
    SessionMismatch,
    /// The session changed while the request was in flight
    Superseded,
}

impl IgnoreReason {
    pub fn label(&self) -> &'static str {
        match self {
            IgnoreReason::MissingUser => "no user identifier",
            IgnoreReason::NonPositiveAmount => "amount must be positive",
            IgnoreReason::SessionMismatch => "user is not the signed-in user",
            IgnoreReason::Superseded => "session changed before the response arrived",
        }
    }
}

/// Which path a `load` or `award` took
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// The remote service answered; state reflects its values
    Authoritative(ProgressionState),
    /// The remote service failed; state came from the cache or local math
    Fallback(ProgressionState),
    /// Nothing was applied
    Ignored(IgnoreReason),
}

impl SyncOutcome {
    pub fn is_authoritative(&self) -> bool {
        matches!(self, SyncOutcome::Authoritative(_))
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, SyncOutcome::Fallback(_))
    }

    /// State after the operation, unless it was ignored
    pub fn state(&self) -> Option<&ProgressionState> {
        match self {
            SyncOutcome::Authoritative(state) | SyncOutcome::Fallback(state) => Some(state),
            SyncOutcome::Ignored(_) => None,
        }
    }

    pub fn ignored(&self) -> Option<IgnoreReason> {
        match self {
            SyncOutcome::Ignored(reason) => Some(*reason),
            _ => None,
        }
    }
}

struct Session {
    user_id: Option<String>,
    generation: u64,
    state: ProgressionState,
}

impl Session {
    fn reset(&mut self, user_id: Option<String>) {
        self.user_id = user_id;
        self.generation += 1;
        self.state = ProgressionState::new();
    }

    fn is_current(&self, user_id: &str, generation: u64) -> bool {
        self.generation == generation && self.user_id.as_deref() == Some(user_id)
    }
}

/// Tracks XP, level and rank for the signed-in user
pub struct ProgressionEngine {
    service: Arc<dyn ProgressionService>,
    cache: Arc<dyn XpCache>,
    session: Mutex<Session>,
}

impl ProgressionEngine {
    pub fn new(service: Arc<dyn ProgressionService>, cache: Arc<dyn XpCache>) -> Self {
        Self {
            service,
            cache,
            session: Mutex::new(Session {
                user_id: None,
                generation: 0,
                state: ProgressionState::new(),
            }),
        }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current state
    pub fn state(&self) -> ProgressionState {
        self.session().state.clone()
    }

    /// User the engine is bound to
    pub fn current_user(&self) -> Option<String> {
        self.session().user_id.clone()
    }

    /// Bind the engine to a user. Switching users resets the state.
    pub fn sign_in(&self, user_id: &str) {
        if user_id.trim().is_empty() {
            warn!("sign-in attempted with no user identifier");
            return;
        }
        self.bind(user_id);
    }

    /// Drop the session and reset to defaults
    pub fn sign_out(&self) {
        let mut session = self.session();
        if let Some(user) = session.user_id.as_deref() {
            info!(user = %user, "signing out, progression reset");
        }
        session.reset(None);
    }

    /// Bind to `user_id` if not already bound to it; returns the generation
    fn bind(&self, user_id: &str) -> u64 {
        let mut session = self.session();
        if session.user_id.as_deref() != Some(user_id) {
            debug!(user = %user_id, "binding progression session");
            session.reset(Some(user_id.to_string()));
        }
        session.generation
    }

    /// Pull the user's stats from the service, falling back to the cache.
    ///
    /// Binds the session to `user_id` first, so a first `load` doubles as
    /// sign-in. An empty identifier leaves everything untouched.
    pub async fn load(&self, user_id: &str) -> SyncOutcome {
        if user_id.trim().is_empty() {
            return SyncOutcome::Ignored(IgnoreReason::MissingUser);
        }
        let generation = self.bind(user_id);

        let result = self.service.fetch_stats(user_id).await;

        let mut session = self.session();
        if !session.is_current(user_id, generation) {
            debug!(user = %user_id, "discarding stale progression load");
            return SyncOutcome::Ignored(IgnoreReason::Superseded);
        }

        match result {
            Ok(stats) => {
                apply_stats(&mut session.state, stats);
                debug!(user = %user_id, xp = session.state.xp, level = %session.state.level, "progression loaded");
                SyncOutcome::Authoritative(session.state.clone())
            }
            Err(e) => {
                warn!(
                    user = %user_id,
                    service = self.service.name(),
                    code = e.code(),
                    error = %e,
                    "failed to load progression, using local cache"
                );
                // No usable entry keeps the session's xp
                let xp = match self.cache.get(user_id) {
                    Ok(Some(xp)) => xp,
                    Ok(None) => session.state.xp,
                    Err(e) => {
                        warn!(user = %user_id, error = %e, "xp cache unavailable");
                        session.state.xp
                    }
                };
                session.state.set_xp_derived(xp);
                SyncOutcome::Fallback(session.state.clone())
            }
        }
    }

    /// Award XP to the signed-in user.
    ///
    /// On success the service's total replaces the local one. On failure the
    /// engine adds `amount` locally and derives level and rank itself.
    pub async fn award(&self, user_id: &str, amount: u64, reason: &str) -> SyncOutcome {
        if user_id.trim().is_empty() {
            warn!(amount, reason, "award attempted with no user identifier, XP not added");
            return SyncOutcome::Ignored(IgnoreReason::MissingUser);
        }
        if amount == 0 {
            warn!(user = %user_id, reason, "award attempted with zero XP");
            return SyncOutcome::Ignored(IgnoreReason::NonPositiveAmount);
        }

        let generation = {
            let mut session = self.session();
            match session.user_id.as_deref() {
                Some(current) if current != user_id => {
                    warn!(user = %user_id, signed_in = %current, "award for a user who is not signed in");
                    return SyncOutcome::Ignored(IgnoreReason::SessionMismatch);
                }
                Some(_) => {}
                None => session.reset(Some(user_id.to_string())),
            }
            session.generation
        };

        let event = XpEvent::new(user_id, amount, reason);
        let result = self.service.submit_award(&event).await;

        let mut session = self.session();
        if !session.is_current(user_id, generation) {
            debug!(user = %user_id, "discarding stale award result");
            return SyncOutcome::Ignored(IgnoreReason::Superseded);
        }

        match result {
            Ok(receipt) => {
                apply_receipt(&mut session.state, receipt);
                info!(
                    user = %user_id,
                    amount,
                    reason,
                    total_xp = session.state.xp,
                    "+{} XP: {}",
                    amount,
                    reason
                );
                SyncOutcome::Authoritative(session.state.clone())
            }
            Err(e) => {
                warn!(
                    user = %user_id,
                    service = self.service.name(),
                    code = e.code(),
                    error = %e,
                    "failed to submit award, applying it locally"
                );
                let state = &mut session.state;
                let xp = state.xp.saturating_add(amount);
                if state.set_xp_derived(xp) {
                    state.just_leveled_up = true;
                }
                SyncOutcome::Fallback(state.clone())
            }
        }
    }

    /// Clear the level-up flag. Idempotent.
    pub fn acknowledge_level_up(&self) {
        self.session().state.just_leveled_up = false;
    }

    /// Adjust the local paper-trading balance; never sent to the service
    pub fn add_cash(&self, amount: i64, reason: &str) -> i64 {
        let mut session = self.session();
        session.state.virtual_cash = session.state.virtual_cash.saturating_add(amount);
        info!(amount, reason, balance = session.state.virtual_cash, "virtual cash adjusted");
        session.state.virtual_cash
    }
}

/// Overwrite with service stats, deriving whatever the service left out
fn apply_stats(state: &mut ProgressionState, stats: RemoteStats) {
    let level = stats.level.unwrap_or_else(|| Level::from_xp(stats.xp));
    state.xp = stats.xp;
    state.level = level;
    state.rank = stats.rank.unwrap_or_else(|| Rank::from_level(level));
    state.last_synced = Some(Utc::now());
}

fn apply_receipt(state: &mut ProgressionState, receipt: AwardReceipt) {
    state.xp = receipt.total_xp;
    if receipt.leveled_up {
        let level = receipt
            .new_level
            .unwrap_or_else(|| Level::from_xp(receipt.total_xp));
        state.level = level;
        state.rank = receipt.rank.unwrap_or_else(|| Rank::from_level(level));
        state.just_leveled_up = true;
    }
    state.last_synced = Some(Utc::now());
}
