//! Everything that waits on the network.
//!
//! The core never awaits. It hands a [`Request`] to the backend, which runs
//! the work in a spawned task and reports the outcome as a [`CoreEvent`].

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};
use ytmd_proto::config::Config;
use ytmd_proto::protocol::Command;
use ytmd_proto::settings::GlobalSettings;

use crate::auth::AuthProgress;
use crate::core::CoreEvent;
use crate::host::ContextId;
use crate::realtime;
use crate::rest::RestClient;
use crate::thumbnail;

/// One remote command and where its outcome should be shown.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRequest {
    pub origin: Option<ContextId>,
    pub command: Command,
    pub timeout: Option<Duration>,
    /// Flash the ok indicator on the origin when the command succeeds.
    pub confirm: bool,
}

impl CommandRequest {
    pub fn from_context(context: &ContextId, command: Command) -> Self {
        Self {
            origin: Some(context.clone()),
            command,
            timeout: None,
            confirm: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Point REST and realtime at new settings. Stops the running session.
    Configure { settings: GlobalSettings },
    /// Start the realtime session if it is not running.
    Connect,
    Command(CommandRequest),
    Playlists { silent: bool },
    Thumbnail { context: ContextId, url: String },
    /// Run the code/token handshake against `settings`.
    Authorize { settings: GlobalSettings },
    /// Fire `PlaylistLoadDue(generation)` after `delay`, replacing any timer
    /// armed before.
    PlaylistTimer { delay: Duration, generation: u64 },
}

#[derive(Debug, Clone)]
pub struct RemoteHandle {
    tx: mpsc::UnboundedSender<Request>,
}

impl RemoteHandle {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Request>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn send(&self, request: Request) {
        if self.tx.send(request).is_err() {
            warn!("Remote backend is gone, dropping request");
        }
    }
}

pub struct RemoteBackend {
    config: Config,
    http: reqwest::Client,
    rest: RestClient,
    settings: GlobalSettings,
    events: mpsc::Sender<CoreEvent>,
    realtime: Option<JoinHandle<()>>,
    playlist_timer: Option<AbortHandle>,
}

impl RemoteBackend {
    pub fn new(config: &Config, events: mpsc::Sender<CoreEvent>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("ytmd-deck/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let settings = GlobalSettings::default();
        Ok(Self {
            rest: RestClient::new(http.clone(), &config.companion, &settings),
            config: config.clone(),
            http,
            settings,
            events,
            realtime: None,
            playlist_timer: None,
        })
    }

    pub async fn run(mut self, mut requests: mpsc::UnboundedReceiver<Request>) {
        info!("RemoteBackend: running");
        while let Some(request) = requests.recv().await {
            self.handle(request);
        }
        info!("RemoteBackend: request channel closed, shutting down");
        self.stop_realtime();
        if let Some(timer) = self.playlist_timer.take() {
            timer.abort();
        }
    }

    fn handle(&mut self, request: Request) {
        match request {
            Request::Configure { settings } => {
                self.stop_realtime();
                self.rest = self.rest.with_settings(&settings);
                self.settings = settings;
            }
            Request::Connect => self.start_realtime(),
            Request::Command(request) => self.spawn_command(request),
            Request::Playlists { silent } => {
                let rest = self.rest.clone();
                let events = self.events.clone();
                tokio::spawn(async move {
                    let result = rest.playlists().await;
                    let _ = events.send(CoreEvent::PlaylistsLoaded { silent, result }).await;
                });
            }
            Request::Thumbnail { context, url } => {
                let http = self.http.clone();
                let events = self.events.clone();
                tokio::spawn(async move {
                    let event = match thumbnail::fetch(&http, &url).await {
                        Ok(payload) => CoreEvent::ThumbnailReady { context, url, payload },
                        Err(e) => CoreEvent::ThumbnailFailed {
                            context,
                            url,
                            error: format!("{:#}", e),
                        },
                    };
                    let _ = events.send(event).await;
                });
            }
            Request::Authorize { settings } => {
                let rest = self.rest.with_settings(&settings);
                let events = self.events.clone();
                tokio::spawn(authorize(rest, events));
            }
            Request::PlaylistTimer { delay, generation } => {
                if let Some(previous) = self.playlist_timer.take() {
                    previous.abort();
                }
                let events = self.events.clone();
                let task = tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = events.send(CoreEvent::PlaylistLoadDue { generation }).await;
                });
                self.playlist_timer = Some(task.abort_handle());
            }
        }
    }

    fn spawn_command(&self, request: CommandRequest) {
        let rest = self.rest.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = rest.command(&request.command, request.timeout).await;
            let _ = events.send(CoreEvent::CommandFinished { request, result }).await;
        });
    }

    fn start_realtime(&mut self) {
        if self.realtime.as_ref().is_some_and(|task| !task.is_finished()) {
            debug!("RemoteBackend: realtime session already running");
            return;
        }
        if !self.settings.has_token() {
            debug!("RemoteBackend: no token, not starting realtime session");
            return;
        }
        let settings = self.settings.clone();
        let delay = self.config.realtime.reconnect_delay();
        let events = self.events.clone();
        self.realtime = Some(tokio::spawn(realtime::run(settings, delay, events)));
    }

    fn stop_realtime(&mut self) {
        if let Some(task) = self.realtime.take() {
            debug!("RemoteBackend: stopping realtime session");
            task.abort();
        }
    }
}

async fn authorize(rest: RestClient, events: mpsc::Sender<CoreEvent>) {
    let _ = events.send(CoreEvent::Auth(AuthProgress::Requested)).await;

    let progress = match rest.auth_code().await {
        Ok(code) => {
            let _ = events.send(CoreEvent::Auth(AuthProgress::CodeIssued(code.clone()))).await;
            match rest.auth_token(&code).await {
                Ok(token) => AuthProgress::Token(token),
                Err(e) => AuthProgress::Failed(e),
            }
        }
        Err(e) => AuthProgress::Failed(e),
    };
    let _ = events.send(CoreEvent::Auth(progress)).await;
}
