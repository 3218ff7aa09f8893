//! Authorization handshake with the companion server.
//!
//! The backend requests a code, the user confirms it inside YouTube Music
//! Desktop, and the backend then exchanges the code for a token. This module
//! only tracks where that exchange stands; the network half lives in
//! `remote.rs`.

use tracing::{info, warn};
use ytmd_proto::protocol::CompanionError;
use ytmd_proto::settings::{normalize_host, GlobalSettings, DEFAULT_PORT};

use crate::inspector::{StatusLine, Tone};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthStatus {
    #[default]
    NotConnected,
    Connecting,
    Authorizing,
    CodeShown(String),
    Connected,
    Error(String),
}

impl AuthStatus {
    pub fn line(&self) -> StatusLine {
        match self {
            AuthStatus::NotConnected => StatusLine::new("Not connected", Tone::Neutral),
            AuthStatus::Connecting => StatusLine::new("Connecting...", Tone::Pending),
            AuthStatus::Authorizing => StatusLine::new("Requesting authorization code...", Tone::Pending),
            AuthStatus::CodeShown(code) => StatusLine::new(
                format!("Confirm code {} in YouTube Music Desktop", code),
                Tone::Pending,
            ),
            AuthStatus::Connected => StatusLine::new("Authorized", Tone::Positive),
            AuthStatus::Error(message) => StatusLine::new(format!("Error: {}", message), Tone::Negative),
        }
    }
}

/// Steps reported by the backend while the handshake runs.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthProgress {
    Requested,
    CodeIssued(String),
    Token(String),
    Failed(CompanionError),
}

#[derive(Debug, Default)]
pub struct AuthFlow {
    status: AuthStatus,
    pending: Option<GlobalSettings>,
}

impl AuthFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &AuthStatus {
        &self.status
    }

    pub fn in_progress(&self) -> bool {
        self.pending.is_some()
    }

    /// Begin a handshake against `host:port`. Returns the tokenless settings
    /// the backend should talk to, or `None` when one is already running.
    pub fn start(&mut self, host: &str, port: &str) -> Option<GlobalSettings> {
        if self.in_progress() {
            warn!("Authorization already in progress");
            return None;
        }
        let port = port.trim();
        let settings = GlobalSettings {
            host: normalize_host(host),
            port: if port.is_empty() { DEFAULT_PORT.to_string() } else { port.to_string() },
            token: String::new(),
        };
        info!("Starting authorization against {}:{}", settings.host, settings.port);
        self.status = AuthStatus::Connecting;
        self.pending = Some(settings.clone());
        Some(settings)
    }

    /// Fold one backend step in. Returns the settings to persist once a token
    /// has been issued.
    pub fn on_progress(&mut self, progress: AuthProgress) -> Option<GlobalSettings> {
        match progress {
            AuthProgress::Requested => {
                if self.in_progress() {
                    self.status = AuthStatus::Authorizing;
                }
                None
            }
            AuthProgress::CodeIssued(code) => {
                if self.in_progress() {
                    self.status = AuthStatus::CodeShown(code);
                }
                None
            }
            AuthProgress::Token(token) => {
                let mut settings = self.pending.take()?;
                settings.token = token;
                self.status = AuthStatus::Connected;
                info!("Authorization complete");
                Some(settings)
            }
            AuthProgress::Failed(error) => {
                warn!("Authorization failed: {}", error);
                self.pending = None;
                self.status = AuthStatus::Error(error.message);
                None
            }
        }
    }

    /// Mirror freshly received global settings unless a handshake is running.
    pub fn reflect(&mut self, settings: &GlobalSettings) {
        if self.in_progress() {
            return;
        }
        self.status = if settings.has_token() {
            AuthStatus::Connected
        } else {
            AuthStatus::NotConnected
        };
    }
}
