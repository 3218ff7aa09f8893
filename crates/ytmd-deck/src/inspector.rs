//! Messages exchanged with the settings editor (property inspector).
//!
//! The editor is plain HTML owned by the host; the plugin only sees the
//! JSON payloads below, tagged by `event`.

use serde::{Deserialize, Serialize};
use ytmd_proto::protocol::PlaylistOutput;

/// Colour family of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Neutral,
    Pending,
    Positive,
    Warning,
    Negative,
}

impl Tone {
    pub fn color(self) -> &'static str {
        match self {
            Tone::Neutral => "gray",
            Tone::Pending => "yellow",
            Tone::Positive => "green",
            Tone::Warning => "orange",
            Tone::Negative => "red",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub text: String,
    pub color: &'static str,
}

impl StatusLine {
    pub fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            color: tone.color(),
        }
    }
}

/// Editor → plugin.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum FromInspector {
    StartAuthorization {
        #[serde(default)]
        host: String,
        #[serde(default)]
        port: String,
    },
    SaveGlobalSettings {
        #[serde(default)]
        host: String,
        #[serde(default)]
        port: String,
    },
    RefreshPlaylists,
    #[serde(rename_all = "camelCase")]
    SavePlaylist {
        #[serde(default)]
        playlist_id: Option<String>,
        #[serde(default)]
        playlist_url: Option<String>,
    },
    CheckPlaylistUrl {
        #[serde(default)]
        url: String,
    },
}

/// Plugin → editor.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ToInspector {
    ConnectionStatus(StatusLine),
    AuthStatus(StatusLine),
    Playlists {
        items: Vec<PlaylistOutput>,
        selected: Option<String>,
        loading: bool,
    },
    PlaylistError {
        title: String,
        message: String,
    },
    ClearPlaylistError,
    PlaylistUrlStatus(StatusLine),
}
