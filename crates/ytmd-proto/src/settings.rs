//! Settings persisted by the host on the plugin's behalf.
//!
//! The host stores these as opaque JSON; field names here are the wire names
//! the settings editor reads and writes.

use serde::{Deserialize, Serialize};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: &str = "9863";
pub const DEFAULT_PORT_NUMBER: u16 = 9863;
pub const DEFAULT_LAYOUT: &str = "$B1";

/// Process-wide connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GlobalSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default)]
    pub token: String,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            token: String::new(),
        }
    }
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> String {
    DEFAULT_PORT.to_string()
}

impl GlobalSettings {
    /// Decode whatever the host handed back, falling back to defaults for a
    /// missing or malformed payload.
    pub fn from_value(value: &serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    /// Copy with `localhost` rewritten to the loopback literal.
    pub fn normalized(&self) -> Self {
        Self {
            host: normalize_host(&self.host),
            port: self.port.trim().to_string(),
            token: self.token.clone(),
        }
    }

    /// Identity of a socket-client configuration. Two settings with the same
    /// key never require a reconnect.
    pub fn settings_key(&self) -> String {
        let n = self.normalized();
        format!("{}:{}:{}", n.host, n.port, n.token)
    }

    pub fn has_token(&self) -> bool {
        !self.token.trim().is_empty()
    }

    /// Numeric port, or the default when the stored string is not a port.
    pub fn port_number(&self) -> u16 {
        self.port.trim().parse().unwrap_or(DEFAULT_PORT_NUMBER)
    }
}

pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    if host.is_empty() || host.eq_ignore_ascii_case("localhost") {
        DEFAULT_HOST.to_string()
    } else {
        host.to_string()
    }
}

/// What a play/pause key does when pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayPauseMode {
    Play,
    Pause,
    #[default]
    Toggle,
}

impl PlayPauseMode {
    /// Case-insensitive; anything unrecognised toggles.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_uppercase()).as_deref() {
            Some("PLAY") => PlayPauseMode::Play,
            Some("PAUSE") => PlayPauseMode::Pause,
            _ => PlayPauseMode::Toggle,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayPauseSettings {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub display_format: Option<String>,
    #[serde(default)]
    pub display_title_format: Option<String>,
    #[serde(default)]
    pub custom_layout: Option<String>,
}

impl PlayPauseSettings {
    pub fn from_value(value: &serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    pub fn mode(&self) -> PlayPauseMode {
        PlayPauseMode::parse(self.action.as_deref())
    }

    /// Layout token for the dial display.
    pub fn layout(&self) -> &str {
        match self.custom_layout.as_deref().map(str::trim) {
            Some(layout) if !layout.is_empty() => layout,
            _ => DEFAULT_LAYOUT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playlist_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playlist_url: Option<String>,
}

impl PlaylistSettings {
    pub fn from_value(value: &serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    /// Trimmed id, `None` when blank.
    pub fn id(&self) -> Option<&str> {
        non_blank(self.playlist_id.as_deref())
    }

    /// Trimmed url, `None` when blank.
    pub fn url(&self) -> Option<&str> {
        non_blank(self.playlist_url.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_localhost_is_normalized() {
        let settings = GlobalSettings {
            host: "localhost".into(),
            port: "9863".into(),
            token: "abc".into(),
        };
        assert_eq!(settings.normalized().host, "127.0.0.1");
        assert_eq!(settings.settings_key(), "127.0.0.1:9863:abc");
    }

    #[test]
    fn test_partial_global_settings_fill_defaults() {
        let settings = GlobalSettings::from_value(&json!({"token": "t"}));
        assert_eq!(settings.host, DEFAULT_HOST);
        assert_eq!(settings.port, DEFAULT_PORT);
        assert!(settings.has_token());

        let settings = GlobalSettings::from_value(&json!(null));
        assert_eq!(settings, GlobalSettings::default());
        assert!(!settings.has_token());
    }

    #[test]
    fn test_port_number_falls_back() {
        let mut settings = GlobalSettings::default();
        settings.port = "not a port".into();
        assert_eq!(settings.port_number(), 9863);
        settings.port = " 1234 ".into();
        assert_eq!(settings.port_number(), 1234);
    }

    #[test]
    fn test_play_pause_mode() {
        assert_eq!(PlayPauseMode::parse(Some("play")), PlayPauseMode::Play);
        assert_eq!(PlayPauseMode::parse(Some("PAUSE")), PlayPauseMode::Pause);
        assert_eq!(PlayPauseMode::parse(Some("TOGGLE")), PlayPauseMode::Toggle);
        assert_eq!(PlayPauseMode::parse(Some("bogus")), PlayPauseMode::Toggle);
        assert_eq!(PlayPauseMode::parse(None), PlayPauseMode::Toggle);
    }

    #[test]
    fn test_layout_fallback() {
        let settings = PlayPauseSettings::from_value(&json!({"customLayout": ""}));
        assert_eq!(settings.layout(), DEFAULT_LAYOUT);
        let settings = PlayPauseSettings::from_value(&json!({"customLayout": "layouts/big.json"}));
        assert_eq!(settings.layout(), "layouts/big.json");
    }

    #[test]
    fn test_playlist_blank_fields() {
        let settings = PlaylistSettings::from_value(&json!({"playlistId": "  ", "playlistUrl": " https://x "}));
        assert_eq!(settings.id(), None);
        assert_eq!(settings.url(), Some("https://x"));
    }
}
