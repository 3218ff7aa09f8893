//! Single owner of plugin state.
//!
//! Every input (host frames, realtime pushes, finished network work) arrives
//! as a [`CoreEvent`] on one channel and is handled to completion before the
//! next one. Handlers never await; slow work goes to the remote backend.

use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use ytmd_proto::config::{Config, PlaylistConfig};
use ytmd_proto::protocol::{CompanionError, PlaylistOutput, SocketState};
use ytmd_proto::settings::{
    normalize_host, GlobalSettings, PlayPauseSettings, PlaylistSettings, DEFAULT_PORT,
};

use crate::actions::ActionKind;
use crate::auth::{AuthFlow, AuthProgress};
use crate::connector::{Connector, SocketEvent};
use crate::host::{ContextId, HostEvent, HostSurface};
use crate::inspector::{FromInspector, ToInspector};
use crate::playlist::{failure_message, url_status, PlaylistLoader, ScheduleDecision, AUTH_HINT, ERROR_TITLE};
use crate::registry::ContextRegistry;
use crate::remote::{CommandRequest, RemoteHandle, Request};

#[derive(Debug)]
pub enum CoreEvent {
    /// A frame from the control-surface host.
    Host(HostEvent),
    /// A realtime transport event.
    Socket(SocketEvent),
    CommandFinished {
        request: CommandRequest,
        result: Result<(), CompanionError>,
    },
    ThumbnailReady {
        context: ContextId,
        url: String,
        payload: String,
    },
    ThumbnailFailed {
        context: ContextId,
        url: String,
        error: String,
    },
    /// A scheduled playlist load timer fired.
    PlaylistLoadDue { generation: u64 },
    PlaylistsLoaded {
        silent: bool,
        result: Result<Vec<PlaylistOutput>, CompanionError>,
    },
    Auth(AuthProgress),
    /// The host connection is gone.
    Shutdown,
}

/// The settings editor currently open, if any.
#[derive(Debug, Clone)]
struct InspectorTarget {
    action: String,
    context: ContextId,
    kind: Option<ActionKind>,
}

// ── PluginCore ────────────────────────────────────────────────────────────────

pub struct PluginCore<H: HostSurface> {
    host: H,
    remote: RemoteHandle,
    connector: Connector,
    registry: ContextRegistry,
    playlists: PlaylistLoader,
    auth: AuthFlow,
    inspector: Option<InspectorTarget>,
    playlist_config: PlaylistConfig,
}

impl<H: HostSurface> PluginCore<H> {
    pub fn new(host: H, remote: RemoteHandle, config: &Config) -> Self {
        Self {
            host,
            connector: Connector::new(remote.clone()),
            remote,
            registry: ContextRegistry::new(),
            playlists: PlaylistLoader::new(config.playlist.coalesce_window()),
            auth: AuthFlow::new(),
            inspector: None,
            playlist_config: config.playlist.clone(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn connector(&self) -> &Connector {
        &self.connector
    }

    pub fn registry(&self) -> &ContextRegistry {
        &self.registry
    }

    pub fn playlists(&self) -> &PlaylistLoader {
        &self.playlists
    }

    pub async fn run(mut self, mut event_rx: mpsc::Receiver<CoreEvent>) -> anyhow::Result<()> {
        info!("PluginCore: starting event loop");
        self.host.get_global_settings();

        loop {
            match event_rx.recv().await {
                None => {
                    info!("PluginCore: event channel closed, shutting down");
                    break;
                }
                Some(CoreEvent::Shutdown) => {
                    info!("PluginCore: shutdown requested");
                    break;
                }
                Some(event) => self.handle_event(event),
            }
        }
        Ok(())
    }

    pub fn handle_event(&mut self, event: CoreEvent) {
        match event {
            CoreEvent::Host(event) => self.dispatch_host(event),
            CoreEvent::Socket(event) => self.on_socket_event(event),
            CoreEvent::CommandFinished { request, result } => self.on_command_finished(request, result),
            CoreEvent::ThumbnailReady { context, url, payload } => {
                if let Some(ctx) = self.registry.play_pause_mut(&context) {
                    ctx.on_thumbnail(&url, payload, &self.host);
                }
            }
            CoreEvent::ThumbnailFailed { context, url, error } => {
                warn!("{}: thumbnail fetch for {} failed: {}", context, url, error);
            }
            CoreEvent::PlaylistLoadDue { generation } => {
                if self.playlists.take_due(generation) {
                    self.load_playlists(true);
                }
            }
            CoreEvent::PlaylistsLoaded { silent, result } => self.on_playlists_loaded(silent, result),
            CoreEvent::Auth(progress) => self.on_auth_progress(progress),
            CoreEvent::Shutdown => {}
        }
    }

    // ── Host events ───────────────────────────────────────────────────────────

    fn dispatch_host(&mut self, event: HostEvent) {
        debug!("PluginCore: host event {}", event.kind());
        match event {
            HostEvent::WillAppear { action, context, payload } => {
                let Some(kind) = ActionKind::from_uuid(&action) else {
                    debug!("PluginCore: ignoring unknown action {}", action);
                    return;
                };
                self.registry
                    .on_appear(kind, &context, &payload.settings, &mut self.connector, &self.host);
            }
            HostEvent::WillDisappear { context, .. } => {
                self.registry.on_disappear(&context, &mut self.connector);
                if self.inspector.as_ref().is_some_and(|t| t.context == context) {
                    self.inspector = None;
                }
            }
            HostEvent::DidReceiveSettings { action, context, payload } => {
                self.on_settings(&action, &context, &payload.settings);
            }
            HostEvent::DidReceiveGlobalSettings { payload } => {
                self.apply_global_settings(GlobalSettings::from_value(&payload.settings));
            }
            HostEvent::KeyUp { context, payload, .. } => {
                if let Some(ctx) = self.registry.play_pause_mut(&context) {
                    let settings = PlayPauseSettings::from_value(&payload.settings);
                    ctx.on_key_up(&settings, &self.host, &self.remote);
                } else if let Some(ctx) = self.registry.playlist_mut(&context) {
                    let settings = PlaylistSettings::from_value(&payload.settings);
                    ctx.on_key_up(settings, &self.host, &self.remote, self.playlist_config.start_timeout());
                } else {
                    debug!("PluginCore: key up on unknown context {}", context);
                }
            }
            HostEvent::DialRotate { context, payload, .. } => {
                if let Some(ctx) = self.registry.play_pause_mut(&context) {
                    ctx.on_dial_rotate(payload.ticks);
                }
            }
            HostEvent::DialUp { context, .. } => {
                if let Some(ctx) = self.registry.play_pause_mut(&context) {
                    ctx.on_dial_up(&self.host, &self.remote);
                }
            }
            HostEvent::SendToPlugin { action, context, payload } => {
                match serde_json::from_value::<FromInspector>(payload) {
                    Ok(message) => self.on_inspector_message(&action, &context, message),
                    Err(e) => warn!("PluginCore: unreadable editor message: {}", e),
                }
            }
            HostEvent::PropertyInspectorDidAppear { action, context } => {
                self.on_inspector_appear(action, context);
            }
            HostEvent::PropertyInspectorDidDisappear { context, .. } => {
                if self.inspector.as_ref().is_some_and(|t| t.context == context) {
                    self.inspector = None;
                }
            }
            HostEvent::Unknown => {}
        }
    }

    fn on_settings(&mut self, action: &str, context: &ContextId, settings: &serde_json::Value) {
        match ActionKind::from_uuid(action) {
            Some(ActionKind::PlayPause) => {
                if let Some(ctx) = self.registry.play_pause_mut(context) {
                    ctx.on_settings(PlayPauseSettings::from_value(settings), &self.host);
                }
            }
            Some(ActionKind::PlayPlaylist) => {
                let settings = PlaylistSettings::from_value(settings);
                if let Some(ctx) = self.registry.playlist_mut(context) {
                    ctx.on_settings(settings.clone());
                }
                if self.inspector_is(context) {
                    self.show_playlist_settings(&settings);
                }
            }
            None => {}
        }
    }

    fn apply_global_settings(&mut self, settings: GlobalSettings) {
        // The backend aborts the old session without reporting it.
        if self.connector.stops_session(&settings) {
            info!("PluginCore: settings changed, dropping the current session");
            self.on_socket_event(SocketEvent::Connection(SocketState::Disconnected));
        }
        let status = self.connector.ensure_client(&settings);
        self.auth.reflect(self.connector.settings());
        self.push(ToInspector::ConnectionStatus(status.line()));
        self.push(ToInspector::AuthStatus(self.auth.status().line()));

        let playlist_editor_open = self
            .inspector
            .as_ref()
            .is_some_and(|t| t.kind == Some(ActionKind::PlayPlaylist));
        if playlist_editor_open {
            self.schedule_playlists();
        }
    }

    // ── Realtime ──────────────────────────────────────────────────────────────

    fn on_socket_event(&mut self, event: SocketEvent) {
        if let Some(status) = self.connector.on_socket_event(&event) {
            self.push(ToInspector::ConnectionStatus(status.line()));
        }

        let listeners = self.connector.listeners(event.channel()).to_vec();
        for context in &listeners {
            let Some(ctx) = self.registry.play_pause_mut(context) else {
                continue;
            };
            match &event {
                SocketEvent::State(state) => ctx.on_tick(state, &self.host, &self.remote),
                SocketEvent::Connection(state) => ctx.on_connection(*state, &self.host),
                SocketEvent::Error(error) => ctx.on_error(error, &self.host),
            }
        }
    }

    fn on_command_finished(&mut self, request: CommandRequest, result: Result<(), CompanionError>) {
        let origin = request.origin.as_ref();
        match result {
            Ok(()) => {
                if let (true, Some(origin)) = (request.confirm, origin) {
                    self.host.show_ok(origin);
                }
            }
            Err(e) => {
                error!(
                    "Error while {}. context: {}, error: {}",
                    request.command.label(),
                    origin.map(ContextId::as_str).unwrap_or("-"),
                    e
                );
                if let Some(origin) = origin {
                    self.host.show_alert(origin);
                }
            }
        }
    }

    // ── Settings editor ───────────────────────────────────────────────────────

    fn push(&self, message: ToInspector) {
        if let Some(target) = &self.inspector {
            self.host.send_to_inspector(&target.action, &target.context, &message);
        }
    }

    fn inspector_is(&self, context: &ContextId) -> bool {
        self.inspector.as_ref().is_some_and(|t| &t.context == context)
    }

    fn on_inspector_appear(&mut self, action: String, context: ContextId) {
        let kind = ActionKind::from_uuid(&action);
        self.inspector = Some(InspectorTarget {
            action,
            context: context.clone(),
            kind,
        });

        self.push(ToInspector::ConnectionStatus(self.connector.status().line()));
        self.push(ToInspector::AuthStatus(self.auth.status().line()));

        if kind == Some(ActionKind::PlayPlaylist) {
            let settings = self
                .registry
                .playlist(&context)
                .map(|ctx| ctx.settings().clone())
                .unwrap_or_default();
            self.show_playlist_settings(&settings);
            self.schedule_playlists();
        }
    }

    fn show_playlist_settings(&mut self, settings: &PlaylistSettings) {
        self.playlists.select(settings.id());
        self.push(ToInspector::PlaylistUrlStatus(
            url_status(settings.url().unwrap_or_default()).line(),
        ));
        if !self.playlists.items().is_empty() {
            self.push_catalog();
        }
    }

    fn on_inspector_message(&mut self, action: &str, context: &ContextId, message: FromInspector) {
        debug!("PluginCore: editor message {:?} from {} ({})", message, context, action);
        match message {
            FromInspector::StartAuthorization { host, port } => {
                if let Some(settings) = self.auth.start(&host, &port) {
                    self.remote.send(Request::Authorize { settings });
                }
                self.push(ToInspector::AuthStatus(self.auth.status().line()));
            }
            FromInspector::SaveGlobalSettings { host, port } => {
                let port = port.trim();
                let settings = GlobalSettings {
                    host: normalize_host(&host),
                    port: if port.is_empty() { DEFAULT_PORT.to_string() } else { port.to_string() },
                    token: self.connector.settings().token.clone(),
                };
                self.host.set_global_settings(&settings);
                self.apply_global_settings(settings);
            }
            FromInspector::RefreshPlaylists => self.load_playlists(false),
            FromInspector::SavePlaylist { playlist_id, playlist_url } => {
                let settings = PlaylistSettings {
                    playlist_id: playlist_id.filter(|s| !s.trim().is_empty()),
                    playlist_url: playlist_url.filter(|s| !s.trim().is_empty()),
                };
                match serde_json::to_value(&settings) {
                    Ok(value) => self.host.set_settings(context, value),
                    Err(e) => warn!("PluginCore: cannot encode playlist settings: {}", e),
                }
                if let Some(ctx) = self.registry.playlist_mut(context) {
                    ctx.on_settings(settings.clone());
                }
                self.show_playlist_settings(&settings);
            }
            FromInspector::CheckPlaylistUrl { url } => {
                self.push(ToInspector::PlaylistUrlStatus(url_status(&url).line()));
            }
        }
    }

    fn on_auth_progress(&mut self, progress: AuthProgress) {
        if let Some(settings) = self.auth.on_progress(progress) {
            self.host.set_global_settings(&settings);
            self.apply_global_settings(settings);
        }
        self.push(ToInspector::AuthStatus(self.auth.status().line()));
    }

    // ── Playlists ─────────────────────────────────────────────────────────────

    fn schedule_playlists(&mut self) {
        if !self.connector.settings().has_token() {
            return;
        }
        match self.playlists.schedule(Instant::now()) {
            ScheduleDecision::Suppressed => debug!("PluginCore: playlist load suppressed, catalog is fresh"),
            ScheduleDecision::Schedule { generation } => self.remote.send(Request::PlaylistTimer {
                delay: self.playlist_config.initial_delay(),
                generation,
            }),
        }
    }

    fn load_playlists(&mut self, silent: bool) {
        if !silent {
            self.push(ToInspector::ClearPlaylistError);
        }
        if !self.connector.settings().has_token() {
            if !silent {
                self.push(ToInspector::PlaylistError {
                    title: ERROR_TITLE.to_string(),
                    message: AUTH_HINT.to_string(),
                });
            }
            return;
        }

        self.playlists.begin();
        self.push(ToInspector::Playlists {
            items: Vec::new(),
            selected: None,
            loading: true,
        });
        self.remote.send(Request::Playlists { silent });
    }

    fn on_playlists_loaded(&mut self, silent: bool, result: Result<Vec<PlaylistOutput>, CompanionError>) {
        match result {
            Ok(items) => {
                info!("PluginCore: loaded {} playlists", items.len());
                self.playlists.on_loaded(Instant::now(), items);
                self.push_catalog();
            }
            Err(e) => {
                warn!("PluginCore: playlist load failed: {}", e);
                self.playlists.on_failed();
                self.push(ToInspector::Playlists {
                    items: Vec::new(),
                    selected: None,
                    loading: false,
                });
                if !silent {
                    self.push(ToInspector::PlaylistError {
                        title: ERROR_TITLE.to_string(),
                        message: failure_message(&e),
                    });
                }
            }
        }
    }

    fn push_catalog(&self) {
        self.push(ToInspector::Playlists {
            items: self.playlists.items().to_vec(),
            selected: self.playlists.selection(),
            loading: self.playlists.is_loading(),
        });
    }
}
