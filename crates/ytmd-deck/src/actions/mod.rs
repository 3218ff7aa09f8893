pub mod play_pause;
pub mod play_playlist;

pub use play_pause::PlayPauseContext;
pub use play_playlist::PlaylistContext;

/// Actions this plugin registers with the host, keyed by the last segment of
/// the action UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    PlayPause,
    PlayPlaylist,
}

impl ActionKind {
    pub fn from_uuid(uuid: &str) -> Option<Self> {
        match uuid.rsplit('.').next()? {
            "play-pause" => Some(ActionKind::PlayPause),
            "play-playlist" => Some(ActionKind::PlayPlaylist),
            _ => None,
        }
    }
}
