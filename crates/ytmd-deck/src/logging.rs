//! Log setup: a plain file log plus a layer that mirrors warnings and
//! errors into the host's own log.

use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use ytmd_proto::config::LoggingConfig;
use ytmd_proto::platform;

use crate::host::HostSurface;

/// Forwards WARN and ERROR events as preformatted lines.
pub struct HostLogLayer {
    sender: mpsc::UnboundedSender<String>,
}

impl HostLogLayer {
    pub fn new(sender: mpsc::UnboundedSender<String>) -> Self {
        Self { sender }
    }
}

impl<S> tracing_subscriber::Layer<S> for HostLogLayer
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let meta = event.metadata();
        if *meta.level() > tracing::Level::WARN {
            return;
        }

        let mut line = HostLine::default();
        event.record(&mut line);

        // No receiver yet (or any more) is fine.
        let _ = self.sender.send(line.render(*meta.level(), meta.target()));
    }
}

/// `HH:MM:SS LEVEL target: message {key=value, ...}`
#[derive(Default)]
struct HostLine {
    message: String,
    fields: Vec<String>,
}

impl HostLine {
    fn render(self, level: tracing::Level, target: &str) -> String {
        let stamp = chrono::Local::now().format("%H:%M:%S");
        let mut out = format!("{} {:<5} {}: {}", stamp, level, target, self.message);
        if !self.fields.is_empty() {
            out.push_str(&format!(" {{{}}}", self.fields.join(", ")));
        }
        out
    }
}

impl tracing::field::Visit for HostLine {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}

/// Install the global subscriber. Returns the log file path.
pub fn init(config: &LoggingConfig, host_tx: mpsc::UnboundedSender<String>) -> anyhow::Result<PathBuf> {
    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = platform::log_path();

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(HostLogLayer::new(host_tx))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.filter)),
        )
        .try_init()?;

    Ok(log_path)
}

/// Drain forwarded lines into the host log until the sender side is dropped.
pub fn forward_to_host<H>(mut rx: mpsc::UnboundedReceiver<String>, host: H)
where
    H: HostSurface + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            host.log_message(&line);
        }
    });
}
