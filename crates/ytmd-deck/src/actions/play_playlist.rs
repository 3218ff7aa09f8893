//! Playlist key: starts a configured playlist.

use std::time::Duration;
use tracing::warn;
use ytmd_proto::protocol::Command;
use ytmd_proto::settings::PlaylistSettings;

use crate::host::{ContextId, HostSurface};
use crate::playlist::playback_request;
use crate::remote::{CommandRequest, RemoteHandle, Request};

pub struct PlaylistContext {
    context: ContextId,
    settings: PlaylistSettings,
}

impl PlaylistContext {
    pub fn new(context: ContextId, settings: PlaylistSettings) -> Self {
        Self { context, settings }
    }

    pub fn settings(&self) -> &PlaylistSettings {
        &self.settings
    }

    pub fn on_settings(&mut self, settings: PlaylistSettings) {
        self.settings = settings;
    }

    /// Validate the configured target and ask the backend to start it. Bad
    /// input alerts without touching the network.
    pub fn on_key_up(
        &mut self,
        settings: PlaylistSettings,
        host: &dyn HostSurface,
        remote: &RemoteHandle,
        start_timeout: Duration,
    ) {
        self.settings = settings;
        match playback_request(&self.settings) {
            Ok(change) => {
                let mut request = CommandRequest::from_context(&self.context, Command::ChangeVideo(change));
                request.timeout = Some(start_timeout);
                request.confirm = true;
                remote.send(Request::Command(request));
            }
            Err(e) => {
                warn!("{}: cannot start playlist: {}", self.context, e);
                host.show_alert(&self.context);
            }
        }
    }
}
