use tokio::sync::mpsc;
use tracing::{info, warn};
use ytmd_deck::args::HostArgs;
use ytmd_deck::core::{CoreEvent, PluginCore};
use ytmd_deck::remote::{RemoteBackend, RemoteHandle};
use ytmd_deck::{logging, streamdeck};
use ytmd_proto::config::Config;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = HostArgs::parse(std::env::args().skip(1))?;

    // Config is read before logging exists; report a bad file once it does.
    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    let (log_tx, log_rx) = mpsc::unbounded_channel();
    let log_path = logging::init(&config.logging, log_tx)?;
    info!("Log file: {:?}", log_path);
    match config_error {
        None => info!("Config loaded from: {:?}", Config::config_path()),
        Some(e) => warn!("Config unreadable, using defaults: {:#}", e),
    }
    if let Some(info) = &args.info {
        info!("Host info: {}", info);
    }

    // Event channel: all external inputs funnel into PluginCore
    let (event_tx, event_rx) = mpsc::channel::<CoreEvent>(256);

    let (host, _reader) = streamdeck::connect(&args, event_tx.clone()).await?;
    logging::forward_to_host(log_rx, host.clone());

    let (remote, requests) = RemoteHandle::channel();
    let backend = RemoteBackend::new(&config, event_tx)?;
    tokio::spawn(backend.run(requests));

    info!("Plugin {} registered, running event loop", args.plugin_uuid);
    PluginCore::new(host, remote, &config).run(event_rx).await?;

    Ok(())
}
