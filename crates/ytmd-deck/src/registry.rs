//! Visible contexts, keyed by context id.
//!
//! Play/pause contexts subscribe to the shared socket on appear and
//! unsubscribe on disappear. Playlist contexts only carry settings.

use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;
use ytmd_proto::settings::{PlayPauseSettings, PlaylistSettings};

use crate::actions::{ActionKind, PlayPauseContext, PlaylistContext};
use crate::connector::Connector;
use crate::host::{ContextId, HostSurface};

pub enum ContextEntry {
    PlayPause(PlayPauseContext),
    Playlist(PlaylistContext),
}

#[derive(Default)]
pub struct ContextRegistry {
    entries: HashMap<ContextId, ContextEntry>,
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `context`. A second appear for a known context does nothing
    /// and returns false.
    pub fn on_appear(
        &mut self,
        kind: ActionKind,
        context: &ContextId,
        settings: &Value,
        connector: &mut Connector,
        host: &dyn HostSurface,
    ) -> bool {
        if self.entries.contains_key(context) {
            debug!("Registry: {} already registered", context);
            return false;
        }

        let entry = match kind {
            ActionKind::PlayPause => {
                let ctx = PlayPauseContext::new(context.clone(), PlayPauseSettings::from_value(settings));
                ctx.apply_layout(host);
                connector.subscribe(context);
                ContextEntry::PlayPause(ctx)
            }
            ActionKind::PlayPlaylist => ContextEntry::Playlist(PlaylistContext::new(
                context.clone(),
                PlaylistSettings::from_value(settings),
            )),
        };
        debug!("Registry: registered {} ({:?})", context, kind);
        self.entries.insert(context.clone(), entry);
        true
    }

    /// Forget `context` and drop its socket subscriptions.
    pub fn on_disappear(&mut self, context: &ContextId, connector: &mut Connector) -> bool {
        connector.unsubscribe(context);
        let removed = self.entries.remove(context).is_some();
        if removed {
            debug!("Registry: removed {}", context);
        }
        removed
    }

    pub fn contains(&self, context: &ContextId) -> bool {
        self.entries.contains_key(context)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn play_pause_mut(&mut self, context: &ContextId) -> Option<&mut PlayPauseContext> {
        match self.entries.get_mut(context) {
            Some(ContextEntry::PlayPause(ctx)) => Some(ctx),
            _ => None,
        }
    }

    pub fn playlist(&self, context: &ContextId) -> Option<&PlaylistContext> {
        match self.entries.get(context) {
            Some(ContextEntry::Playlist(ctx)) => Some(ctx),
            _ => None,
        }
    }

    pub fn playlist_mut(&mut self, context: &ContextId) -> Option<&mut PlaylistContext> {
        match self.entries.get_mut(context) {
            Some(ContextEntry::Playlist(ctx)) => Some(ctx),
            _ => None,
        }
    }
}
