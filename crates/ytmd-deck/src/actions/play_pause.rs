//! Play/pause key and dial.
//!
//! Each visible instance keeps its own render cache, warm-up counter,
//! thumbnail cache and rotation accumulator. The core routes realtime
//! events here for every subscribed context.

use tracing::debug;
use ytmd_proto::protocol::{Command, CompanionError, SocketState, StateOutput, TrackState};
use ytmd_proto::settings::{PlayPauseMode, PlayPauseSettings};

use crate::formatter::{
    format_time_template, format_title_template, resolve_template, TimeValues, TrackText,
    DEFAULT_TIME_FORMAT, DEFAULT_TITLE_FORMAT,
};
use crate::host::{ButtonState, ContextId, Feedback, HostSurface, Indicator};
use crate::navigation::{NavigationAccumulator, Skip};
use crate::remote::{CommandRequest, RemoteHandle, Request};
use crate::thumbnail::ThumbnailCache;

/// Ticks after appearing during which every tick repaints.
pub const WARMUP_TICKS: u8 = 10;
/// Error message of a momentary socket hiccup; never shown as an alert.
pub const TRANSIENT_SOCKET_ERROR: &str = "websocket error";
pub const OFFLINE_MARK: &str = "⚠";
const ZERO_TIME: &str = "00:00";

pub struct PlayPauseContext {
    context: ContextId,
    defaults: PlayPauseSettings,
    time_override: Option<String>,
    title_override: Option<String>,
    warmup: u8,
    last_time: Option<String>,
    track_state: TrackState,
    thumbnail: ThumbnailCache,
    navigation: NavigationAccumulator,
}

impl PlayPauseContext {
    pub fn new(context: ContextId, settings: PlayPauseSettings) -> Self {
        Self {
            context,
            time_override: settings.display_format.clone(),
            title_override: settings.display_title_format.clone(),
            defaults: settings,
            warmup: WARMUP_TICKS,
            last_time: None,
            track_state: TrackState::Unknown,
            thumbnail: ThumbnailCache::default(),
            navigation: NavigationAccumulator::new(),
        }
    }

    pub fn context(&self) -> &ContextId {
        &self.context
    }

    pub fn warmup(&self) -> u8 {
        self.warmup
    }

    pub fn track_state(&self) -> TrackState {
        self.track_state
    }

    pub fn apply_layout(&self, host: &dyn HostSurface) {
        host.set_feedback_layout(&self.context, self.defaults.layout());
    }

    /// Per-context settings changed. Formats left unset keep their previous
    /// override. A present format replaces the appear-time default as well.
    pub fn on_settings(&mut self, settings: PlayPauseSettings, host: &dyn HostSurface) {
        if settings.display_format.is_some() {
            self.time_override = settings.display_format.clone();
            self.defaults.display_format = settings.display_format;
        }
        if settings.display_title_format.is_some() {
            self.title_override = settings.display_title_format.clone();
            self.defaults.display_title_format = settings.display_title_format;
        }
        self.defaults.custom_layout = settings.custom_layout;
        self.apply_layout(host);
    }

    fn time_template(&self) -> &str {
        resolve_template(
            self.time_override.as_deref(),
            self.defaults.display_format.as_deref(),
            DEFAULT_TIME_FORMAT,
        )
    }

    fn title_template(&self) -> &str {
        resolve_template(
            self.title_override.as_deref(),
            self.defaults.display_title_format.as_deref(),
            DEFAULT_TITLE_FORMAT,
        )
    }

    pub fn on_tick(&mut self, state: &StateOutput, host: &dyn HostSurface, remote: &RemoteHandle) {
        self.render(state, host, remote);

        if let Some(skip) = self.navigation.tick() {
            let command = match skip {
                Skip::Forward => Command::Next,
                Skip::Backward => Command::Previous,
            };
            debug!("{}: dial skip {:?}", self.context, skip);
            remote.send(Request::Command(CommandRequest::from_context(&self.context, command)));
        }
    }

    fn render(&mut self, state: &StateOutput, host: &dyn HostSurface, remote: &RemoteHandle) {
        let Some(player) = state.player.as_ref() else {
            host.show_alert(&self.context);
            return;
        };
        let video = state.video.as_ref();

        let values = TimeValues::from_progress(
            player.video_progress,
            video.and_then(|v| v.duration_seconds),
        );
        let track = TrackText {
            title: video.and_then(|v| v.title.clone()).unwrap_or_default(),
            album: video.and_then(|v| v.album.clone()).unwrap_or_default(),
            author: video.and_then(|v| v.author.clone()).unwrap_or_default(),
        };
        let time = format_time_template(self.time_template(), &values);
        let title = format_title_template(self.title_template(), &track);

        if let Some(url) = state.artwork_url() {
            if self.thumbnail.observe(url) {
                remote.send(Request::Thumbnail {
                    context: self.context.clone(),
                    url: url.to_string(),
                });
            }
        }

        let forced = self.warmup > 0;
        self.warmup = self.warmup.saturating_sub(1);

        if forced || self.last_time.as_deref() != Some(time.as_str()) {
            host.set_title(&self.context, &time);
            let feedback = Feedback {
                icon: self.thumbnail.payload().map(str::to_string),
                value: Some(time.clone()),
                indicator: Some(Indicator {
                    value: Some(values.percent()),
                    enabled: true,
                }),
                title: non_empty(title),
                song: non_empty(track.title),
                author: non_empty(track.author),
                album: non_empty(track.album),
            };
            host.set_feedback(&self.context, &feedback);
            self.last_time = Some(time);
        }

        if player.track_state != self.track_state {
            self.track_state = player.track_state;
            host.set_state(&self.context, ButtonState::for_track(self.track_state));
        }
    }

    pub fn on_connection(&mut self, state: SocketState, host: &dyn HostSurface) {
        let icon = self.thumbnail.payload().map(str::to_string);
        match state {
            SocketState::Connected => {
                host.show_ok(&self.context);
                host.set_title(&self.context, "");
                host.set_feedback(
                    &self.context,
                    &Feedback {
                        icon,
                        value: Some(ZERO_TIME.to_string()),
                        indicator: Some(Indicator { value: None, enabled: true }),
                        ..Feedback::default()
                    },
                );
            }
            SocketState::Disconnected | SocketState::Error => {
                host.set_title(&self.context, OFFLINE_MARK);
                host.set_feedback(
                    &self.context,
                    &Feedback {
                        icon,
                        value: Some(OFFLINE_MARK.to_string()),
                        indicator: Some(Indicator { value: None, enabled: false }),
                        ..Feedback::default()
                    },
                );
            }
            SocketState::Connecting => return,
        }
        self.last_time = None;
    }

    pub fn on_error(&self, error: &CompanionError, host: &dyn HostSurface) {
        if error.message == TRANSIENT_SOCKET_ERROR {
            return;
        }
        host.show_alert(&self.context);
    }

    pub fn on_key_up(&self, settings: &PlayPauseSettings, host: &dyn HostSurface, remote: &RemoteHandle) {
        let command = match settings.mode() {
            PlayPauseMode::Play => Command::Play,
            PlayPauseMode::Pause => Command::Pause,
            PlayPauseMode::Toggle => Command::PlayPause,
        };
        remote.send(Request::Command(CommandRequest::from_context(&self.context, command)));
        host.set_state(&self.context, ButtonState::for_track(self.track_state));
    }

    pub fn on_dial_up(&self, host: &dyn HostSurface, remote: &RemoteHandle) {
        remote.send(Request::Command(CommandRequest::from_context(
            &self.context,
            Command::PlayPause,
        )));
        host.set_state(&self.context, ButtonState::for_track(self.track_state));
    }

    pub fn on_dial_rotate(&mut self, ticks: i64) {
        self.navigation.rotate(ticks);
    }

    /// A fetched icon arrived. Dropped when the artwork has moved on.
    pub fn on_thumbnail(&mut self, url: &str, payload: String, host: &dyn HostSurface) {
        if !self.thumbnail.accept(url, payload) {
            debug!("{}: dropping stale thumbnail for {}", self.context, url);
            return;
        }
        host.set_feedback(
            &self.context,
            &Feedback {
                icon: self.thumbnail.payload().map(str::to_string),
                ..Feedback::default()
            },
        );
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
