//! JSON bodies exchanged with the progression service.
//!
//! Field names follow the service's camelCase contract. Everything the
//! service may omit is optional here; conversion into the domain types in
//! [`crate::remote`] decides what a missing field means.

use crate::error::{NinjaError, Result};
use crate::progression::{clamp_xp, Level, Rank};
use crate::remote::{AwardReceipt, RemoteStats, XpEvent};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Status value the service uses for a successful award
pub const STATUS_OK: &str = "ok";

/// `GET /api/meta/stats/{userId}` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    #[serde(default)]
    pub xp: Option<i64>,
    #[serde(default)]
    pub level: Option<i64>,
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_level_xp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
}

/// `POST /api/meta/xp` request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardRequest {
    pub user_id: String,
    pub amount: u64,
    /// The service calls the award reason `action`
    pub action: String,
}

impl From<&XpEvent> for AwardRequest {
    fn from(event: &XpEvent) -> Self {
        Self {
            user_id: event.user_id.clone(),
            amount: event.amount,
            action: event.reason.clone(),
        }
    }
}

/// `POST /api/meta/xp` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub total_xp: Option<i64>,
    #[serde(default)]
    pub leveled_up: bool,
    #[serde(default)]
    pub new_level: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_level: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp_added: Option<i64>,
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Parse a service rank label, treating labels we don't know as absent
fn parse_rank(raw: Option<String>) -> Option<Rank> {
    let raw = raw?;
    match raw.parse::<Rank>() {
        Ok(rank) => Some(rank),
        Err(e) => {
            debug!(error = %e, "ignoring rank label from service");
            None
        }
    }
}

impl From<StatsResponse> for RemoteStats {
    fn from(resp: StatsResponse) -> Self {
        Self {
            xp: clamp_xp(resp.xp.unwrap_or(0)),
            level: resp.level.map(Level::from_signed),
            rank: parse_rank(resp.rank),
        }
    }
}

impl TryFrom<AwardResponse> for AwardReceipt {
    type Error = NinjaError;

    fn try_from(resp: AwardResponse) -> Result<Self> {
        if let Some(err) = resp.error {
            return Err(NinjaError::Rejected(err));
        }
        match resp.status.as_deref() {
            Some(STATUS_OK) => {}
            Some(other) => return Err(NinjaError::Rejected(format!("status '{}'", other))),
            None => return Err(NinjaError::MalformedResponse("missing status".to_string())),
        }
        let total_xp = resp
            .total_xp
            .ok_or_else(|| NinjaError::MalformedResponse("missing totalXp".to_string()))?;

        Ok(Self {
            total_xp: clamp_xp(total_xp),
            leveled_up: resp.leveled_up,
            new_level: resp.new_level.map(Level::from_signed),
            rank: parse_rank(resp.rank),
        })
    }
}
