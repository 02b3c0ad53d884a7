mod http;

pub use http::HttpProber;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Target, TargetStatus};

/// Why a probe classified a target as down. The `Display` text is what gets
/// recorded as the check's error message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("HTTP {code}: {reason}")]
    Http { code: u16, reason: String },
    #[error("Connection timeout")]
    Timeout,
    #[error("Domain not found")]
    DnsFailure,
    #[error("{0}")]
    Transport(String),
}

impl ProbeError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { code, .. } => Some(*code),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub status: TargetStatus,
    pub latency_ms: Option<u64>,
    pub error: Option<ProbeError>,
}

impl ProbeOutcome {
    pub fn up(latency_ms: u64) -> Self {
        Self {
            status: TargetStatus::Up,
            latency_ms: Some(latency_ms),
            error: None,
        }
    }

    pub fn down(error: ProbeError, latency_ms: Option<u64>) -> Self {
        Self {
            status: TargetStatus::Down,
            latency_ms,
            error: Some(error),
        }
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}

/// Performs one bounded reachability check against a target.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, target: &Target) -> ProbeOutcome;
}
