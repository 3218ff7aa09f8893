//! The control-surface host as seen by the plugin.
//!
//! Inbound frames decode into [`HostEvent`]; everything the plugin wants to
//! change on the device goes through [`HostSurface`]. The websocket session
//! that carries both lives in `streamdeck.rs`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use ytmd_proto::protocol::TrackState;
use ytmd_proto::settings::GlobalSettings;

use crate::inspector::ToInspector;

/// Opaque id of one visible key or dial.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ContextId(pub String);

impl ContextId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct SettingsPayload {
    #[serde(default)]
    pub settings: Value,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct RotatePayload {
    #[serde(default)]
    pub settings: Value,
    #[serde(default)]
    pub ticks: i64,
    #[serde(default)]
    pub pressed: bool,
}

/// Events the host pushes to the plugin. Anything else decodes as `Unknown`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum HostEvent {
    WillAppear {
        action: String,
        context: ContextId,
        #[serde(default)]
        payload: SettingsPayload,
    },
    WillDisappear {
        action: String,
        context: ContextId,
    },
    DidReceiveSettings {
        action: String,
        context: ContextId,
        #[serde(default)]
        payload: SettingsPayload,
    },
    DidReceiveGlobalSettings {
        #[serde(default)]
        payload: SettingsPayload,
    },
    KeyUp {
        action: String,
        context: ContextId,
        #[serde(default)]
        payload: SettingsPayload,
    },
    DialRotate {
        action: String,
        context: ContextId,
        #[serde(default)]
        payload: RotatePayload,
    },
    DialUp {
        action: String,
        context: ContextId,
        #[serde(default)]
        payload: SettingsPayload,
    },
    SendToPlugin {
        action: String,
        context: ContextId,
        #[serde(default)]
        payload: Value,
    },
    PropertyInspectorDidAppear {
        action: String,
        context: ContextId,
    },
    PropertyInspectorDidDisappear {
        action: String,
        context: ContextId,
    },
    #[serde(other)]
    Unknown,
}

impl HostEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            HostEvent::WillAppear { .. } => "willAppear",
            HostEvent::WillDisappear { .. } => "willDisappear",
            HostEvent::DidReceiveSettings { .. } => "didReceiveSettings",
            HostEvent::DidReceiveGlobalSettings { .. } => "didReceiveGlobalSettings",
            HostEvent::KeyUp { .. } => "keyUp",
            HostEvent::DialRotate { .. } => "dialRotate",
            HostEvent::DialUp { .. } => "dialUp",
            HostEvent::SendToPlugin { .. } => "sendToPlugin",
            HostEvent::PropertyInspectorDidAppear { .. } => "propertyInspectorDidAppear",
            HostEvent::PropertyInspectorDidDisappear { .. } => "propertyInspectorDidDisappear",
            HostEvent::Unknown => "unknown",
        }
    }
}

/// Two-state key image. The host numbers states from 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    On = 0,
    Off = 1,
}

impl ButtonState {
    pub fn for_track(state: TrackState) -> Self {
        if state == TrackState::Playing {
            ButtonState::On
        } else {
            ButtonState::Off
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Indicator {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    pub enabled: bool,
}

/// Partial update of a dial layout. Absent fields keep their current value
/// on the device.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Feedback {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indicator: Option<Indicator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
}

/// UI mutations the plugin can ask of the host.
pub trait HostSurface {
    fn set_title(&self, context: &ContextId, title: &str);
    fn set_state(&self, context: &ContextId, state: ButtonState);
    fn set_feedback(&self, context: &ContextId, feedback: &Feedback);
    fn set_feedback_layout(&self, context: &ContextId, layout: &str);
    fn show_ok(&self, context: &ContextId);
    fn show_alert(&self, context: &ContextId);
    fn set_settings(&self, context: &ContextId, settings: Value);
    fn set_global_settings(&self, settings: &GlobalSettings);
    fn get_global_settings(&self);
    fn log_message(&self, message: &str);
    fn send_to_inspector(&self, action: &str, context: &ContextId, message: &ToInspector);
}

#[derive(Debug, Clone, Serialize)]
pub struct TitlePayload<'a> {
    pub title: &'a str,
    pub target: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatePayload {
    pub state: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayoutPayload<'a> {
    pub layout: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogPayload<'a> {
    pub message: &'a str,
}

/// Frames the plugin sends to the host.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum Outbound<'a> {
    SetTitle {
        context: &'a ContextId,
        payload: TitlePayload<'a>,
    },
    SetState {
        context: &'a ContextId,
        payload: StatePayload,
    },
    SetFeedback {
        context: &'a ContextId,
        payload: &'a Feedback,
    },
    SetFeedbackLayout {
        context: &'a ContextId,
        payload: LayoutPayload<'a>,
    },
    ShowOk {
        context: &'a ContextId,
    },
    ShowAlert {
        context: &'a ContextId,
    },
    SetSettings {
        context: &'a ContextId,
        payload: Value,
    },
    SetGlobalSettings {
        context: &'a str,
        payload: &'a GlobalSettings,
    },
    GetGlobalSettings {
        context: &'a str,
    },
    LogMessage {
        payload: LogPayload<'a>,
    },
    SendToPropertyInspector {
        action: &'a str,
        context: &'a ContextId,
        payload: &'a ToInspector,
    },
}

/// Registration frame; the event name is chosen by the host at launch.
pub fn registration(register_event: &str, plugin_uuid: &str) -> Value {
    serde_json::json!({ "event": register_event, "uuid": plugin_uuid })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_will_appear_decodes() {
        let raw = json!({
            "action": "com.ytmd.deck.play-pause",
            "event": "willAppear",
            "context": "ctx-1",
            "device": "dev",
            "payload": {
                "settings": {"displayFormat": "{current}"},
                "coordinates": {"column": 0, "row": 0},
                "controller": "Encoder",
                "isInMultiAction": false
            }
        });
        let event: HostEvent = serde_json::from_value(raw).unwrap();
        match event {
            HostEvent::WillAppear { action, context, payload } => {
                assert_eq!(action, "com.ytmd.deck.play-pause");
                assert_eq!(context, ContextId::new("ctx-1"));
                assert_eq!(payload.settings["displayFormat"], "{current}");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_dial_rotate_and_unknown() {
        let event: HostEvent = serde_json::from_value(json!({
            "action": "a", "event": "dialRotate", "context": "c",
            "payload": {"settings": {}, "ticks": -2, "pressed": false}
        }))
        .unwrap();
        assert!(matches!(event, HostEvent::DialRotate { ref payload, .. } if payload.ticks == -2));

        let event: HostEvent =
            serde_json::from_value(json!({"event": "deviceDidConnect", "device": "d"})).unwrap();
        assert_eq!(event, HostEvent::Unknown);
    }

    #[test]
    fn test_outbound_wire_format() {
        let ctx = ContextId::new("c1");
        let frame = serde_json::to_value(Outbound::SetTitle {
            context: &ctx,
            payload: TitlePayload { title: "00:45", target: 0 },
        })
        .unwrap();
        assert_eq!(
            frame,
            json!({"event": "setTitle", "context": "c1", "payload": {"title": "00:45", "target": 0}})
        );

        let feedback = Feedback {
            value: Some("00:45".into()),
            indicator: Some(Indicator { value: Some(22.5), enabled: true }),
            ..Feedback::default()
        };
        let frame = serde_json::to_value(Outbound::SetFeedback { context: &ctx, payload: &feedback }).unwrap();
        assert_eq!(
            frame["payload"],
            json!({"value": "00:45", "indicator": {"value": 22.5, "enabled": true}})
        );
    }

    #[test]
    fn test_button_state_for_track() {
        assert_eq!(ButtonState::for_track(TrackState::Playing), ButtonState::On);
        assert_eq!(ButtonState::for_track(TrackState::Paused), ButtonState::Off);
        assert_eq!(ButtonState::for_track(TrackState::Buffering), ButtonState::Off);
    }
}
