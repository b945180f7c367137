//! Remote Progression Service abstraction.
//!
//! The engine only needs two calls from the service: fetch a user's stats
//! and submit an XP award. This module puts a trait at that seam so the
//! engine can run against:
//! - `HttpProgressionService` in production (REST API over reqwest)
//! - `OfflineService` when the user asked to stay offline
//! - `FakeProgressionService` in tests, with scripted responses

use crate::config::ApiConfig;
use crate::error::{NinjaError, Result};
use crate::progression::{Level, Rank};
use crate::wire::{AwardRequest, AwardResponse, StatsResponse};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

// ============================================================================
// Domain types
// ============================================================================

/// An XP-earning event submitted to the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XpEvent {
    pub user_id: String,
    pub amount: u64,
    /// Free-text label, e.g. "daily login"
    pub reason: String,
}

impl XpEvent {
    pub fn new(user_id: &str, amount: u64, reason: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            amount,
            reason: reason.to_string(),
        }
    }
}

/// Stats as reported by the service. Derived fields are optional; the
/// engine derives them locally when the service leaves them out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStats {
    pub xp: u64,
    pub level: Option<Level>,
    pub rank: Option<Rank>,
}

impl RemoteStats {
    /// Stats with every derived field filled in from `xp`
    pub fn from_xp(xp: u64) -> Self {
        let level = Level::from_xp(xp);
        Self {
            xp,
            level: Some(level),
            rank: Some(level.rank()),
        }
    }
}

/// Result of a successful award
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwardReceipt {
    /// New authoritative total
    pub total_xp: u64,
    pub leveled_up: bool,
    pub new_level: Option<Level>,
    pub rank: Option<Rank>,
}

impl AwardReceipt {
    /// Receipt for an award that moved the user from `old_xp` to `total_xp`
    pub fn for_total(old_xp: u64, total_xp: u64) -> Self {
        let old_level = Level::from_xp(old_xp);
        let new_level = Level::from_xp(total_xp);
        Self {
            total_xp,
            leveled_up: new_level > old_level,
            new_level: Some(new_level),
            rank: Some(new_level.rank()),
        }
    }
}

// ============================================================================
// Service trait
// ============================================================================

/// The authoritative store for XP
#[async_trait]
pub trait ProgressionService: Send + Sync {
    /// Fetch current stats for a user
    async fn fetch_stats(&self, user_id: &str) -> Result<RemoteStats>;

    /// Submit an XP award and return the service's new totals
    async fn submit_award(&self, event: &XpEvent) -> Result<AwardReceipt>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

// ============================================================================
// HTTP service (production)
// ============================================================================

/// REST client for the progression API
pub struct HttpProgressionService {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpProgressionService {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| NinjaError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(NinjaError::InvalidUrl(config.base_url.clone()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }

    /// Build an endpoint URL; segments are percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| NinjaError::InvalidUrl(self.base_url.to_string()))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Turn non-2xx responses into errors
    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status == StatusCode::UNAUTHORIZED {
            warn!("Unauthorized access to progression service");
        }
        let body = resp.text().await.unwrap_or_default();
        Err(NinjaError::Status {
            code: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ProgressionService for HttpProgressionService {
    async fn fetch_stats(&self, user_id: &str) -> Result<RemoteStats> {
        let url = self.endpoint(&["api", "meta", "stats", user_id])?;
        debug!(%url, "fetching progression stats");

        let resp = self.authorize(self.client.get(url)).send().await?;
        let resp = Self::check_status(resp).await?;
        let body: StatsResponse = resp
            .json()
            .await
            .map_err(|e| NinjaError::MalformedResponse(e.to_string()))?;

        Ok(body.into())
    }

    async fn submit_award(&self, event: &XpEvent) -> Result<AwardReceipt> {
        let url = self.endpoint(&["api", "meta", "xp"])?;
        debug!(%url, amount = event.amount, "submitting xp award");

        let resp = self
            .authorize(self.client.post(url))
            .json(&AwardRequest::from(event))
            .send()
            .await?;
        let resp = Self::check_status(resp).await?;
        let body: AwardResponse = resp
            .json()
            .await
            .map_err(|e| NinjaError::MalformedResponse(e.to_string()))?;

        AwardReceipt::try_from(body)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

// ============================================================================
// Offline service
// ============================================================================

/// Service that is never reachable; every call takes the fallback path
#[derive(Debug, Default)]
pub struct OfflineService;

#[async_trait]
impl ProgressionService for OfflineService {
    async fn fetch_stats(&self, _user_id: &str) -> Result<RemoteStats> {
        Err(NinjaError::Unavailable("offline mode".to_string()))
    }

    async fn submit_award(&self, _event: &XpEvent) -> Result<AwardReceipt> {
        Err(NinjaError::Unavailable("offline mode".to_string()))
    }

    fn name(&self) -> &'static str {
        "offline"
    }
}

// ============================================================================
// Fake service (tests)
// ============================================================================

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scripted service for deterministic tests.
///
/// Responses are queued per call type; a queued `None` or an empty queue
/// makes the call fail. With a gate attached, every call parks until the
/// test releases a permit, which lets tests interleave session changes with
/// in-flight requests.
#[derive(Default)]
pub struct FakeProgressionService {
    stats: Mutex<VecDeque<Option<RemoteStats>>>,
    awards: Mutex<VecDeque<Option<AwardReceipt>>>,
    events: Mutex<Vec<XpEvent>>,
    calls: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl FakeProgressionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park every call until a permit is added to `gate`
    pub fn with_gate(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn queue_stats(&self, stats: RemoteStats) {
        lock(&self.stats).push_back(Some(stats));
    }

    pub fn queue_stats_failure(&self) {
        lock(&self.stats).push_back(None);
    }

    pub fn queue_award(&self, receipt: AwardReceipt) {
        lock(&self.awards).push_back(Some(receipt));
    }

    pub fn queue_award_failure(&self) {
        lock(&self.awards).push_back(None);
    }

    /// Awards submitted so far
    pub fn submitted(&self) -> Vec<XpEvent> {
        lock(&self.events).clone()
    }

    /// Calls started so far (including parked ones)
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn pass_gate(&self) -> Result<()> {
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|_| NinjaError::Unavailable("gate closed".to_string()))?
                .forget();
        }
        Ok(())
    }
}

#[async_trait]
impl ProgressionService for FakeProgressionService {
    async fn fetch_stats(&self, _user_id: &str) -> Result<RemoteStats> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pass_gate().await?;
        lock(&self.stats)
            .pop_front()
            .flatten()
            .ok_or_else(|| NinjaError::Unavailable("scripted failure".to_string()))
    }

    async fn submit_award(&self, event: &XpEvent) -> Result<AwardReceipt> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.events).push(event.clone());
        self.pass_gate().await?;
        lock(&self.awards)
            .pop_front()
            .flatten()
            .ok_or_else(|| NinjaError::Unavailable("scripted failure".to_string()))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}
