mod common;

use common::*;
use serde_json::json;
use tokio::sync::mpsc;
use ytmd_deck::core::{CoreEvent, PluginCore};
use ytmd_deck::remote::RemoteHandle;
use ytmd_proto::config::Config;

#[tokio::test]
async fn test_run_asks_for_settings_and_stops_on_shutdown() {
    let host = RecordingHost::default();
    let (remote, _requests) = RemoteHandle::channel();
    let core = PluginCore::new(host.clone(), remote, &Config::default());

    let (tx, rx) = mpsc::channel(8);
    let appear = serde_json::from_value(json!({
        "event": "willAppear",
        "action": PLAY_PAUSE,
        "context": "c1",
        "payload": {"settings": {}}
    }))
    .unwrap();
    tx.send(CoreEvent::Host(appear)).await.unwrap();
    tx.send(CoreEvent::Shutdown).await.unwrap();
    // Never reached.
    tx.send(CoreEvent::Host(ytmd_deck::host::HostEvent::Unknown)).await.unwrap();

    core.run(rx).await.unwrap();

    assert_eq!(
        host.take(),
        vec![Call::GetGlobalSettings, Call::Layout("c1".into(), "$B1".into())]
    );
}

#[tokio::test]
async fn test_run_ends_when_senders_drop() {
    let host = RecordingHost::default();
    let (remote, _requests) = RemoteHandle::channel();
    let core = PluginCore::new(host, remote, &Config::default());
    let (tx, rx) = mpsc::channel::<CoreEvent>(1);
    drop(tx);
    assert!(core.run(rx).await.is_ok());
}
