//! The process-wide connection to the companion server.
//!
//! There is exactly one `Connector`. It owns the active settings, the
//! realtime socket state and the table of contexts listening to each socket
//! channel. Listeners are plain context ids; the core routes events to the
//! matching context when they arrive.

use tracing::{debug, info};
use ytmd_proto::protocol::{CompanionError, SocketState, StateOutput};
use ytmd_proto::settings::GlobalSettings;

use crate::host::ContextId;
use crate::remote::{RemoteHandle, Request};
use crate::watchdog::{ConnectionStatus, Watchdog};

/// What the realtime transport reports.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketEvent {
    State(StateOutput),
    Connection(SocketState),
    Error(CompanionError),
}

impl SocketEvent {
    pub fn channel(&self) -> Channel {
        match self {
            SocketEvent::State(_) => Channel::State,
            SocketEvent::Connection(_) => Channel::Connection,
            SocketEvent::Error(_) => Channel::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    State,
    Connection,
    Error,
}

#[derive(Debug, Default)]
struct Subscriptions {
    state: Vec<ContextId>,
    connection: Vec<ContextId>,
    error: Vec<ContextId>,
}

impl Subscriptions {
    fn list(&self, channel: Channel) -> &Vec<ContextId> {
        match channel {
            Channel::State => &self.state,
            Channel::Connection => &self.connection,
            Channel::Error => &self.error,
        }
    }

    fn lists_mut(&mut self) -> [&mut Vec<ContextId>; 3] {
        [&mut self.state, &mut self.connection, &mut self.error]
    }
}

pub struct Connector {
    settings: GlobalSettings,
    settings_key: Option<String>,
    socket_state: SocketState,
    subscriptions: Subscriptions,
    watchdog: Watchdog,
    remote: RemoteHandle,
}

impl Connector {
    pub fn new(remote: RemoteHandle) -> Self {
        Self {
            settings: GlobalSettings::default(),
            settings_key: None,
            socket_state: SocketState::Disconnected,
            subscriptions: Subscriptions::default(),
            watchdog: Watchdog::new(),
            remote,
        }
    }

    pub fn settings(&self) -> &GlobalSettings {
        &self.settings
    }

    pub fn socket_state(&self) -> SocketState {
        self.socket_state
    }

    pub fn status(&self) -> &ConnectionStatus {
        self.watchdog.status()
    }

    /// True when adopting `settings` would tear down a live or connecting
    /// session.
    pub fn stops_session(&self, settings: &GlobalSettings) -> bool {
        let key = settings.normalized().settings_key();
        let live = matches!(self.socket_state, SocketState::Connected | SocketState::Connecting);
        live && self.settings_key.as_deref() != Some(key.as_str())
    }

    /// Adopt `settings` and make sure a socket client is running for them.
    ///
    /// The client is rebuilt only when the settings key changes. Without a
    /// token nothing connects and the status turns to auth-required.
    pub fn ensure_client(&mut self, settings: &GlobalSettings) -> ConnectionStatus {
        let settings = settings.normalized();
        let key = settings.settings_key();
        let changed = self.settings_key.as_deref() != Some(key.as_str());

        if changed {
            info!("Connector: settings changed, targeting {}:{}", settings.host, settings.port);
            self.settings = settings;
            self.settings_key = Some(key);
            self.remote.send(Request::Configure {
                settings: self.settings.clone(),
            });
        }

        if !self.settings.has_token() {
            debug!("Connector: no token, not connecting");
            return self.watchdog.require_auth().clone();
        }

        let idle = matches!(self.socket_state, SocketState::Disconnected | SocketState::Error);
        if changed || idle {
            self.remote.send(Request::Connect);
        }
        self.watchdog.status().clone()
    }

    /// Subscribe `context` to all three channels. False when it already was.
    pub fn subscribe(&mut self, context: &ContextId) -> bool {
        if self.subscriptions.state.contains(context) {
            return false;
        }
        for list in self.subscriptions.lists_mut() {
            list.push(context.clone());
        }
        true
    }

    /// Drop `context` from every channel. False when it was not subscribed.
    pub fn unsubscribe(&mut self, context: &ContextId) -> bool {
        let mut removed = false;
        for list in self.subscriptions.lists_mut() {
            let before = list.len();
            list.retain(|c| c != context);
            removed |= list.len() != before;
        }
        removed
    }

    pub fn listeners(&self, channel: Channel) -> &[ContextId] {
        self.subscriptions.list(channel)
    }

    pub fn listener_count(&self, channel: Channel) -> usize {
        self.subscriptions.list(channel).len()
    }

    /// Feed a transport event through the watchdog. Returns the new status
    /// when the event touched it.
    pub fn on_socket_event(&mut self, event: &SocketEvent) -> Option<ConnectionStatus> {
        match event {
            SocketEvent::State(_) => None,
            SocketEvent::Connection(state) => {
                self.socket_state = *state;
                Some(self.watchdog.on_connection_state(*state).clone())
            }
            SocketEvent::Error(error) => Some(self.watchdog.on_error(error).clone()),
        }
    }
}
