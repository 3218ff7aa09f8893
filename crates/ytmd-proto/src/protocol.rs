use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Version prefix of every companion REST and realtime route.
pub const API_PREFIX: &str = "/api/v1";

/// Namespace of the realtime socket.
pub const REALTIME_NAMESPACE: &str = "/api/v1/realtime";

/// Status code the companion server answers with when a client is throttled.
pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Transport state of the remote player.
///
/// The companion server sends this as a bare number; anything it adds later
/// decodes as `Unknown` instead of failing the whole snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    #[default]
    Unknown,
    Paused,
    Playing,
    Buffering,
}

impl TrackState {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => TrackState::Paused,
            1 => TrackState::Playing,
            2 => TrackState::Buffering,
            _ => TrackState::Unknown,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            TrackState::Unknown => -1,
            TrackState::Paused => 0,
            TrackState::Playing => 1,
            TrackState::Buffering => 2,
        }
    }
}

impl Serialize for TrackState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.code())
    }
}

impl<'de> Deserialize<'de> for TrackState {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<i64>::deserialize(deserializer)?;
        Ok(raw.map(TrackState::from_code).unwrap_or_default())
    }
}

/// Lifecycle of the shared realtime socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SocketState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    #[serde(default)]
    pub track_state: TrackState,
    #[serde(default)]
    pub video_progress: f64,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub ad_playing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Thumbnail {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    /// Ordered from lowest to highest resolution.
    #[serde(default)]
    pub thumbnails: Vec<Thumbnail>,
}

/// One realtime `state-update` push.
///
/// Every field is optional on the wire: an empty object is a legal payload
/// and means the player has nothing to report.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StateOutput {
    #[serde(default)]
    pub player: Option<PlayerInfo>,
    #[serde(default)]
    pub video: Option<VideoInfo>,
    #[serde(default)]
    pub playlist_id: Option<String>,
}

impl StateOutput {
    /// True when the push carries no player data at all.
    pub fn is_empty(&self) -> bool {
        self.player.is_none()
    }

    /// URL of the largest artwork, if any.
    pub fn artwork_url(&self) -> Option<&str> {
        self.video
            .as_ref()
            .and_then(|v| v.thumbnails.last())
            .map(|t| t.url.as_str())
            .filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaylistOutput {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthCodeOutput {
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthTokenOutput {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthCodeRequest<'a> {
    pub app_id: &'a str,
    pub app_name: &'a str,
    pub app_version: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokenRequest<'a> {
    pub app_id: &'a str,
    pub code: &'a str,
}

/// Body of `POST /api/v1/command`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "command", content = "data", rename_all = "camelCase")]
pub enum Command {
    Play,
    Pause,
    PlayPause,
    Next,
    Previous,
    ChangeVideo(ChangeVideo),
}

impl Command {
    /// Short label used in log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Command::Play => "play",
            Command::Pause => "pause",
            Command::PlayPause => "playPause toggle",
            Command::Next => "next",
            Command::Previous => "previous",
            Command::ChangeVideo(_) => "change video",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChangeVideo {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub playlist_id: Option<String>,
}

/// Failure reported by the companion server or by the transport talking to it.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct CompanionError {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status_code: Option<u16>,
}

impl CompanionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: None,
        }
    }

    pub fn with_status(message: impl Into<String>, status_code: u16) -> Self {
        Self {
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status_code == Some(STATUS_TOO_MANY_REQUESTS)
    }
}
