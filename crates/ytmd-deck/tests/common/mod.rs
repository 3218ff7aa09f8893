#![allow(dead_code)]

use serde_json::{json, Value};
use std::cell::RefCell;
use std::rc::Rc;
use tokio::sync::mpsc;
use ytmd_deck::connector::SocketEvent;
use ytmd_deck::core::{CoreEvent, PluginCore};
use ytmd_deck::host::{ButtonState, ContextId, Feedback, HostSurface};
use ytmd_deck::inspector::ToInspector;
use ytmd_deck::remote::{RemoteHandle, Request};
use ytmd_proto::config::Config;
use ytmd_proto::protocol::StateOutput;
use ytmd_proto::settings::GlobalSettings;

pub const PLAY_PAUSE: &str = "com.ytmd.deck.play-pause";
pub const PLAY_PLAYLIST: &str = "com.ytmd.deck.play-playlist";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Title(String, String),
    State(String, ButtonState),
    Feedback(String, Feedback),
    Layout(String, String),
    Ok(String),
    Alert(String),
    Settings(String, Value),
    GlobalSettings(GlobalSettings),
    GetGlobalSettings,
    Log(String),
    Inspector(String, ToInspector),
}

/// Host surface that records every call. Clones share one log.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    calls: Rc<RefCell<Vec<Call>>>,
}

impl RecordingHost {
    pub fn take(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }

    fn push(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl HostSurface for RecordingHost {
    fn set_title(&self, context: &ContextId, title: &str) {
        self.push(Call::Title(context.to_string(), title.to_string()));
    }
    fn set_state(&self, context: &ContextId, state: ButtonState) {
        self.push(Call::State(context.to_string(), state));
    }
    fn set_feedback(&self, context: &ContextId, feedback: &Feedback) {
        self.push(Call::Feedback(context.to_string(), feedback.clone()));
    }
    fn set_feedback_layout(&self, context: &ContextId, layout: &str) {
        self.push(Call::Layout(context.to_string(), layout.to_string()));
    }
    fn show_ok(&self, context: &ContextId) {
        self.push(Call::Ok(context.to_string()));
    }
    fn show_alert(&self, context: &ContextId) {
        self.push(Call::Alert(context.to_string()));
    }
    fn set_settings(&self, context: &ContextId, settings: Value) {
        self.push(Call::Settings(context.to_string(), settings));
    }
    fn set_global_settings(&self, settings: &GlobalSettings) {
        self.push(Call::GlobalSettings(settings.clone()));
    }
    fn get_global_settings(&self) {
        self.push(Call::GetGlobalSettings);
    }
    fn log_message(&self, message: &str) {
        self.push(Call::Log(message.to_string()));
    }
    fn send_to_inspector(&self, _action: &str, context: &ContextId, message: &ToInspector) {
        self.push(Call::Inspector(context.to_string(), message.clone()));
    }
}

pub struct Harness {
    pub core: PluginCore<RecordingHost>,
    pub host: RecordingHost,
    pub requests: mpsc::UnboundedReceiver<Request>,
}

impl Harness {
    pub fn new() -> Self {
        let host = RecordingHost::default();
        let (remote, requests) = RemoteHandle::channel();
        let core = PluginCore::new(host.clone(), remote, &Config::default());
        Self { core, host, requests }
    }

    pub fn send(&mut self, event: CoreEvent) {
        self.core.handle_event(event);
    }

    pub fn host_event(&mut self, raw: Value) {
        let event = serde_json::from_value(raw).expect("host event");
        self.send(CoreEvent::Host(event));
    }

    pub fn appear(&mut self, action: &str, context: &str, settings: Value) {
        self.host_event(json!({
            "event": "willAppear",
            "action": action,
            "context": context,
            "device": "dev",
            "payload": {"settings": settings, "controller": "Encoder"}
        }));
    }

    pub fn disappear(&mut self, action: &str, context: &str) {
        self.host_event(json!({
            "event": "willDisappear",
            "action": action,
            "context": context,
            "device": "dev",
            "payload": {"settings": {}}
        }));
    }

    pub fn global_settings(&mut self, settings: Value) {
        self.host_event(json!({
            "event": "didReceiveGlobalSettings",
            "payload": {"settings": settings}
        }));
    }

    pub fn open_editor(&mut self, action: &str, context: &str) {
        self.host_event(json!({
            "event": "propertyInspectorDidAppear",
            "action": action,
            "context": context,
            "device": "dev"
        }));
    }

    pub fn editor_message(&mut self, action: &str, context: &str, payload: Value) {
        self.host_event(json!({
            "event": "sendToPlugin",
            "action": action,
            "context": context,
            "payload": payload
        }));
    }

    pub fn tick(&mut self, state: Value) {
        let state: StateOutput = serde_json::from_value(state).expect("state");
        self.send(CoreEvent::Socket(SocketEvent::State(state)));
    }

    pub fn drain_requests(&mut self) -> Vec<Request> {
        let mut out = Vec::new();
        while let Ok(request) = self.requests.try_recv() {
            out.push(request);
        }
        out
    }
}

/// A playing state-update payload.
pub fn playing(progress: f64, duration: f64, title: &str) -> Value {
    json!({
        "player": {"trackState": 1, "videoProgress": progress, "volume": 50},
        "video": {
            "title": title,
            "author": "Artist",
            "album": "Album",
            "durationSeconds": duration,
            "thumbnails": []
        }
    })
}

pub fn titles(calls: &[Call], context: &str) -> Vec<String> {
    calls
        .iter()
        .filter_map(|c| match c {
            Call::Title(ctx, title) if ctx == context => Some(title.clone()),
            _ => None,
        })
        .collect()
}

pub fn feedbacks(calls: &[Call], context: &str) -> Vec<Feedback> {
    calls
        .iter()
        .filter_map(|c| match c {
            Call::Feedback(ctx, fb) if ctx == context => Some(fb.clone()),
            _ => None,
        })
        .collect()
}

pub fn inspector_messages(calls: &[Call]) -> Vec<ToInspector> {
    calls
        .iter()
        .filter_map(|c| match c {
            Call::Inspector(_, msg) => Some(msg.clone()),
            _ => None,
        })
        .collect()
}
