//! Connection watchdog.
//!
//! Folds the shared socket's lifecycle and error streams into one
//! user-facing status. It is attached to the connector when the connector is
//! built, so it sees every event exactly once no matter how many contexts
//! are visible.

use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;
use ytmd_proto::protocol::{CompanionError, SocketState};

use crate::inspector::{StatusLine, Tone};

/// Assumed wait when a rate-limit message carries no usable hint.
pub const DEFAULT_RETRY_SECS: u64 = 5;

fn retry_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)retry in (\d+) seconds?").expect("retry pattern is valid"))
}

/// Seconds to wait according to a rate-limit message.
pub fn retry_seconds(message: Option<&str>) -> u64 {
    message
        .and_then(|m| retry_pattern().captures(m))
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(DEFAULT_RETRY_SECS)
}

pub fn rate_limit_text(seconds: u64) -> String {
    format!("Rate limited by YouTube Music Desktop, retry in {} seconds", seconds)
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    NotChecked,
    Checking,
    Connected,
    Disconnected,
    AuthRequired,
    RateLimited(u64),
}

impl ConnectionStatus {
    pub fn line(&self) -> StatusLine {
        match self {
            ConnectionStatus::NotChecked => StatusLine::new("Not checked", Tone::Neutral),
            ConnectionStatus::Checking => StatusLine::new("Checking connection...", Tone::Neutral),
            ConnectionStatus::Connected => StatusLine::new("Connected", Tone::Positive),
            ConnectionStatus::Disconnected => StatusLine::new("Disconnected", Tone::Negative),
            ConnectionStatus::AuthRequired => {
                StatusLine::new("Authorization required", Tone::Negative)
            }
            ConnectionStatus::RateLimited(secs) => StatusLine::new(rate_limit_text(*secs), Tone::Warning),
        }
    }
}

#[derive(Debug, Default)]
pub struct Watchdog {
    status: ConnectionStatus,
}

impl Watchdog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    /// Record a socket lifecycle change and return the resulting status.
    pub fn on_connection_state(&mut self, state: SocketState) -> &ConnectionStatus {
        self.status = match state {
            SocketState::Connecting => ConnectionStatus::Checking,
            SocketState::Connected => ConnectionStatus::Connected,
            SocketState::Disconnected | SocketState::Error => ConnectionStatus::Disconnected,
        };
        &self.status
    }

    pub fn on_error(&mut self, error: &CompanionError) -> &ConnectionStatus {
        warn!("Connection status check failed: {:?}", error);
        self.status = if error.is_rate_limited() {
            ConnectionStatus::RateLimited(retry_seconds(Some(&error.message)))
        } else {
            ConnectionStatus::Disconnected
        };
        &self.status
    }

    pub fn require_auth(&mut self) -> &ConnectionStatus {
        self.status = ConnectionStatus::AuthRequired;
        &self.status
    }
}
