//! Playlist catalog loading and playlist-key input validation.
//!
//! Automatic loads are coalesced: after a successful load, further automatic
//! triggers are dropped for the coalesce window, and a trigger that arrives
//! while another one is still waiting replaces it. Manual refreshes skip
//! both rules.

use reqwest::Url;
use std::time::{Duration, Instant};
use thiserror::Error;
use ytmd_proto::protocol::{ChangeVideo, CompanionError, PlaylistOutput};
use ytmd_proto::settings::PlaylistSettings;

use crate::inspector::{StatusLine, Tone};
use crate::watchdog::{rate_limit_text, retry_seconds};

pub const ERROR_TITLE: &str = "Could not load playlists";
pub const AUTH_HINT: &str = "Authorize the plugin in the global settings first.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlStatus {
    Empty,
    Valid,
    MissingList,
    Invalid,
}

impl UrlStatus {
    pub fn line(&self) -> StatusLine {
        match self {
            UrlStatus::Empty => StatusLine::new("", Tone::Neutral),
            UrlStatus::Valid => StatusLine::new("Valid playlist URL", Tone::Positive),
            UrlStatus::MissingList => {
                StatusLine::new("URL has no playlist (list=...) parameter", Tone::Warning)
            }
            UrlStatus::Invalid => StatusLine::new("Not a valid URL", Tone::Negative),
        }
    }
}

pub fn url_status(raw: &str) -> UrlStatus {
    let raw = raw.trim();
    if raw.is_empty() {
        return UrlStatus::Empty;
    }
    match Url::parse(raw) {
        Ok(url) if list_param(&url).is_some() => UrlStatus::Valid,
        Ok(_) => UrlStatus::MissingList,
        Err(_) => UrlStatus::Invalid,
    }
}

fn list_param(url: &Url) -> Option<String> {
    query_param(url, "list")
}

fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, value)| key == name && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaylistInputError {
    #[error("No playlist configured")]
    NotConfigured,
    #[error("Invalid playlist URL: {0}")]
    InvalidUrl(String),
}

/// Turn a playlist key's settings into a change-video request. A configured
/// URL wins over a stored id.
pub fn playback_request(settings: &PlaylistSettings) -> Result<ChangeVideo, PlaylistInputError> {
    if let Some(raw) = settings.url() {
        let url = Url::parse(raw).map_err(|_| PlaylistInputError::InvalidUrl(raw.to_string()))?;
        let playlist_id =
            list_param(&url).ok_or_else(|| PlaylistInputError::InvalidUrl(raw.to_string()))?;
        return Ok(ChangeVideo {
            video_id: query_param(&url, "v"),
            playlist_id: Some(playlist_id),
        });
    }

    match settings.id() {
        Some(id) => Ok(ChangeVideo {
            video_id: None,
            playlist_id: Some(id.to_string()),
        }),
        None => Err(PlaylistInputError::NotConfigured),
    }
}

/// Banner text for a failed catalog fetch.
pub fn failure_message(error: &CompanionError) -> String {
    if error.is_rate_limited() {
        rate_limit_text(retry_seconds(Some(&error.message)))
    } else {
        error.message.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleDecision {
    /// A load succeeded recently; nothing to do.
    Suppressed,
    /// Arm a timer that reports back with this generation.
    Schedule { generation: u64 },
}

#[derive(Debug)]
pub struct PlaylistLoader {
    coalesce_window: Duration,
    last_load_at: Option<Instant>,
    pending: Option<u64>,
    generation: u64,
    in_flight: bool,
    cache: Vec<PlaylistOutput>,
    selected: Option<String>,
}

impl PlaylistLoader {
    pub fn new(coalesce_window: Duration) -> Self {
        Self {
            coalesce_window,
            last_load_at: None,
            pending: None,
            generation: 0,
            in_flight: false,
            cache: Vec::new(),
            selected: None,
        }
    }

    /// An automatic trigger.
    pub fn schedule(&mut self, now: Instant) -> ScheduleDecision {
        if let Some(last) = self.last_load_at {
            if now.saturating_duration_since(last) < self.coalesce_window {
                return ScheduleDecision::Suppressed;
            }
        }
        self.generation += 1;
        self.pending = Some(self.generation);
        ScheduleDecision::Schedule {
            generation: self.generation,
        }
    }

    /// A timer fired. True when it is still the current one.
    pub fn take_due(&mut self, generation: u64) -> bool {
        if self.pending == Some(generation) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn begin(&mut self) {
        self.in_flight = true;
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    pub fn on_loaded(&mut self, now: Instant, items: Vec<PlaylistOutput>) {
        self.in_flight = false;
        self.last_load_at = Some(now);
        self.cache = items;
    }

    pub fn on_failed(&mut self) {
        self.in_flight = false;
        self.cache.clear();
    }

    pub fn items(&self) -> &[PlaylistOutput] {
        &self.cache
    }

    pub fn select(&mut self, playlist_id: Option<&str>) {
        self.selected = playlist_id.map(str::to_string);
    }

    /// The selected id, if the loaded catalog still contains it.
    pub fn selection(&self) -> Option<String> {
        self.selected
            .as_ref()
            .filter(|id| self.cache.iter().any(|p| &p.id == *id))
            .cloned()
    }
}
