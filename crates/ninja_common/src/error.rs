//! Error types for the progression client.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, NinjaError>;

#[derive(Error, Debug)]
pub enum NinjaError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Progression service returned HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Progression service rejected the request: {0}")]
    Rejected(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),

    #[error("Progression service unavailable: {0}")]
    Unavailable(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NinjaError {
    /// Short stable tag used in log fields.
    pub fn code(&self) -> &'static str {
        match self {
            NinjaError::Transport(_) => "transport",
            NinjaError::Status { .. } => "status",
            NinjaError::Rejected(_) => "rejected",
            NinjaError::MalformedResponse(_) => "malformed",
            NinjaError::InvalidUrl(_) => "invalid_url",
            NinjaError::Unavailable(_) => "unavailable",
            NinjaError::Cache(_) => "cache",
            NinjaError::Io(_) => "io",
            NinjaError::Json(_) => "json",
        }
    }

    /// Whether the remote service could not be reached at all (as opposed to
    /// answering with an error).
    pub fn is_unreachable(&self) -> bool {
        match self {
            NinjaError::Transport(e) => e.is_connect() || e.is_timeout(),
            NinjaError::Unavailable(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(NinjaError::Rejected("x".into()).code(), "rejected");
        assert_eq!(
            NinjaError::Status {
                code: 500,
                body: String::new()
            }
            .code(),
            "status"
        );
        assert_eq!(NinjaError::Unavailable("offline".into()).code(), "unavailable");
    }

    #[test]
    fn test_unreachable_classification() {
        assert!(NinjaError::Unavailable("offline".into()).is_unreachable());
        assert!(!NinjaError::Rejected("bad".into()).is_unreachable());
        assert!(!NinjaError::Status {
            code: 503,
            body: "down".into()
        }
        .is_unreachable());
    }

    #[test]
    fn test_display_includes_status() {
        let err = NinjaError::Status {
            code: 401,
            body: "nope".into(),
        };
        assert_eq!(err.to_string(), "Progression service returned HTTP 401: nope");
    }
}
