mod common;

use common::*;
use serde_json::json;
use std::time::Duration;
use ytmd_deck::auth::AuthProgress;
use ytmd_deck::core::CoreEvent;
use ytmd_deck::host::ContextId;
use ytmd_deck::inspector::{StatusLine, Tone, ToInspector};
use ytmd_deck::playlist::{AUTH_HINT, ERROR_TITLE};
use ytmd_deck::remote::{CommandRequest, Request};
use ytmd_proto::protocol::{ChangeVideo, Command, CompanionError, PlaylistOutput};

fn authorized() -> serde_json::Value {
    json!({"host": "localhost", "port": "9863", "token": "secret"})
}

fn catalog() -> Vec<PlaylistOutput> {
    vec![
        PlaylistOutput { id: "PL1".into(), title: "Mix".into() },
        PlaylistOutput { id: "PL2".into(), title: "Liked".into() },
    ]
}

fn playlist_fetches(requests: &[Request]) -> usize {
    requests.iter().filter(|r| matches!(r, Request::Playlists { .. })).count()
}

fn timers(requests: &[Request]) -> Vec<u64> {
    requests
        .iter()
        .filter_map(|r| match r {
            Request::PlaylistTimer { generation, .. } => Some(*generation),
            _ => None,
        })
        .collect()
}

#[test]
fn test_global_settings_connect_once_per_key() {
    let mut h = Harness::new();
    h.global_settings(authorized());
    let requests = h.drain_requests();
    assert!(matches!(&requests[0], Request::Configure { settings } if settings.host == "127.0.0.1"));
    assert_eq!(requests[1], Request::Connect);

    h.send(CoreEvent::Socket(ytmd_deck::connector::SocketEvent::Connection(
        ytmd_proto::protocol::SocketState::Connected,
    )));
    h.global_settings(authorized());
    assert!(h.drain_requests().is_empty());
}

#[test]
fn test_editor_gets_status_on_open() {
    let mut h = Harness::new();
    h.global_settings(json!({}));
    h.appear(PLAY_PAUSE, "c1", json!({}));
    h.host.take();

    h.open_editor(PLAY_PAUSE, "c1");
    let messages = inspector_messages(&h.host.take());
    assert_eq!(
        messages,
        vec![
            ToInspector::ConnectionStatus(StatusLine::new("Authorization required", Tone::Negative)),
            ToInspector::AuthStatus(StatusLine::new("Not connected", Tone::Neutral)),
        ]
    );
}

#[test]
fn test_automatic_playlist_loads_are_coalesced() {
    let mut h = Harness::new();
    h.global_settings(authorized());
    h.appear(PLAY_PLAYLIST, "p1", json!({"playlistId": "PL2"}));
    h.drain_requests();

    h.open_editor(PLAY_PLAYLIST, "p1");
    let requests = h.drain_requests();
    assert_eq!(timers(&requests), vec![1]);
    assert!(matches!(
        requests.last(),
        Some(Request::PlaylistTimer { delay, .. }) if *delay == Duration::from_secs(2)
    ));

    h.send(CoreEvent::PlaylistLoadDue { generation: 1 });
    assert_eq!(h.drain_requests(), vec![Request::Playlists { silent: true }]);
    h.send(CoreEvent::PlaylistsLoaded { silent: true, result: Ok(catalog()) });

    let messages = inspector_messages(&h.host.take());
    assert_eq!(
        messages.last(),
        Some(&ToInspector::Playlists {
            items: catalog(),
            selected: Some("PL2".into()),
            loading: false,
        })
    );

    // Further automatic triggers inside the window never reach the network.
    h.open_editor(PLAY_PLAYLIST, "p1");
    h.global_settings(authorized());
    assert!(timers(&h.drain_requests()).is_empty());
}

#[test]
fn test_pending_load_is_replaced() {
    let mut h = Harness::new();
    h.global_settings(authorized());
    h.appear(PLAY_PLAYLIST, "p1", json!({}));
    h.open_editor(PLAY_PLAYLIST, "p1");
    h.global_settings(json!({"host": "127.0.0.1", "port": "9863", "token": "secret"}));
    assert_eq!(timers(&h.drain_requests()), vec![1, 2]);

    // The superseded timer is ignored even if it fires.
    h.send(CoreEvent::PlaylistLoadDue { generation: 1 });
    assert_eq!(playlist_fetches(&h.drain_requests()), 0);
    h.send(CoreEvent::PlaylistLoadDue { generation: 2 });
    assert_eq!(playlist_fetches(&h.drain_requests()), 1);
}

#[test]
fn test_manual_refresh_without_token_shows_hint() {
    let mut h = Harness::new();
    h.global_settings(json!({"host": "127.0.0.1", "port": "9863"}));
    h.appear(PLAY_PLAYLIST, "p1", json!({}));
    h.open_editor(PLAY_PLAYLIST, "p1");
    h.drain_requests();
    h.host.take();

    h.editor_message(PLAY_PLAYLIST, "p1", json!({"event": "refreshPlaylists"}));
    assert_eq!(playlist_fetches(&h.drain_requests()), 0);
    assert_eq!(
        inspector_messages(&h.host.take()),
        vec![
            ToInspector::ClearPlaylistError,
            ToInspector::PlaylistError {
                title: ERROR_TITLE.into(),
                message: AUTH_HINT.into(),
            },
        ]
    );
}

#[test]
fn test_manual_refresh_failure_shows_rate_limit_banner() {
    let mut h = Harness::new();
    h.global_settings(authorized());
    h.appear(PLAY_PLAYLIST, "p1", json!({}));
    h.open_editor(PLAY_PLAYLIST, "p1");
    h.drain_requests();
    h.host.take();

    h.editor_message(PLAY_PLAYLIST, "p1", json!({"event": "refreshPlaylists"}));
    assert_eq!(h.drain_requests(), vec![Request::Playlists { silent: false }]);
    h.send(CoreEvent::PlaylistsLoaded {
        silent: false,
        result: Err(CompanionError::with_status("Too many requests, retry in 12 seconds", 429)),
    });

    let messages = inspector_messages(&h.host.take());
    match messages.last() {
        Some(ToInspector::PlaylistError { title, message }) => {
            assert_eq!(title, ERROR_TITLE);
            assert!(message.contains("12 seconds"), "{}", message);
        }
        other => panic!("unexpected message {:?}", other),
    }
    assert!(h.core.playlists().items().is_empty());
}

#[test]
fn test_silent_failure_has_no_banner() {
    let mut h = Harness::new();
    h.global_settings(authorized());
    h.appear(PLAY_PLAYLIST, "p1", json!({}));
    h.open_editor(PLAY_PLAYLIST, "p1");
    h.host.take();

    h.send(CoreEvent::PlaylistsLoaded {
        silent: true,
        result: Err(CompanionError::new("Unauthorized")),
    });
    let messages = inspector_messages(&h.host.take());
    assert!(!messages.iter().any(|m| matches!(m, ToInspector::PlaylistError { .. })));
}

#[test]
fn test_save_playlist_persists_and_validates_url() {
    let mut h = Harness::new();
    h.appear(PLAY_PLAYLIST, "p1", json!({}));
    h.open_editor(PLAY_PLAYLIST, "p1");
    h.host.take();

    h.editor_message(
        PLAY_PLAYLIST,
        "p1",
        json!({"event": "savePlaylist", "playlistId": "", "playlistUrl": "https://music.youtube.com/watch?v=abc"}),
    );
    let calls = h.host.take();
    assert!(calls.contains(&Call::Settings(
        "p1".into(),
        json!({"playlistUrl": "https://music.youtube.com/watch?v=abc"})
    )));
    assert!(inspector_messages(&calls).contains(&ToInspector::PlaylistUrlStatus(StatusLine::new(
        "URL has no playlist (list=...) parameter",
        Tone::Warning
    ))));

    h.editor_message(PLAY_PLAYLIST, "p1", json!({"event": "checkPlaylistUrl", "url": "nope"}));
    assert_eq!(
        inspector_messages(&h.host.take()),
        vec![ToInspector::PlaylistUrlStatus(StatusLine::new("Not a valid URL", Tone::Negative))]
    );
}

#[test]
fn test_playlist_key_validates_before_network() {
    let mut h = Harness::new();
    h.appear(PLAY_PLAYLIST, "p1", json!({}));
    h.drain_requests();
    h.host.take();

    h.host_event(json!({
        "event": "keyUp", "action": PLAY_PLAYLIST, "context": "p1",
        "payload": {"settings": {"playlistUrl": "https://music.youtube.com/watch?v=x"}}
    }));
    assert_eq!(h.host.take(), vec![Call::Alert("p1".into())]);
    assert!(h.drain_requests().is_empty());

    h.host_event(json!({
        "event": "keyUp", "action": PLAY_PLAYLIST, "context": "p1",
        "payload": {"settings": {"playlistId": "PLstored", "playlistUrl": "https://music.youtube.com/playlist?list=PLurl"}}
    }));
    let requests = h.drain_requests();
    let expected = CommandRequest {
        origin: Some(ContextId::new("p1")),
        command: Command::ChangeVideo(ChangeVideo {
            video_id: None,
            playlist_id: Some("PLurl".into()),
        }),
        timeout: Some(Duration::from_secs(8)),
        confirm: true,
    };
    assert_eq!(requests, vec![Request::Command(expected.clone())]);

    h.send(CoreEvent::CommandFinished { request: expected.clone(), result: Ok(()) });
    assert_eq!(h.host.take(), vec![Call::Ok("p1".into())]);

    h.send(CoreEvent::CommandFinished {
        request: expected,
        result: Err(CompanionError::new("Timed out after 8s")),
    });
    assert_eq!(h.host.take(), vec![Call::Alert("p1".into())]);
}

#[test]
fn test_authorization_flow_saves_token_and_connects() {
    let mut h = Harness::new();
    h.global_settings(json!({}));
    h.appear(PLAY_PAUSE, "c1", json!({}));
    h.open_editor(PLAY_PAUSE, "c1");
    h.drain_requests();
    h.host.take();

    h.editor_message(
        PLAY_PAUSE,
        "c1",
        json!({"event": "startAuthorization", "host": "localhost", "port": "9863"}),
    );
    let requests = h.drain_requests();
    assert!(matches!(
        requests.as_slice(),
        [Request::Authorize { settings }] if settings.host == "127.0.0.1" && settings.token.is_empty()
    ));

    // A second click while the handshake runs is ignored.
    h.editor_message(
        PLAY_PAUSE,
        "c1",
        json!({"event": "startAuthorization", "host": "localhost", "port": "9863"}),
    );
    assert!(h.drain_requests().is_empty());
    h.host.take();

    h.send(CoreEvent::Auth(AuthProgress::CodeIssued("4821".into())));
    match inspector_messages(&h.host.take()).last() {
        Some(ToInspector::AuthStatus(line)) => assert!(line.text.contains("4821")),
        other => panic!("unexpected message {:?}", other),
    }

    h.send(CoreEvent::Auth(AuthProgress::Token("fresh".into())));
    let calls = h.host.take();
    assert!(calls.iter().any(|c| matches!(c, Call::GlobalSettings(s) if s.token == "fresh")));
    assert_eq!(
        inspector_messages(&calls).last(),
        Some(&ToInspector::AuthStatus(StatusLine::new("Authorized", Tone::Positive)))
    );
    let requests = h.drain_requests();
    assert!(requests.iter().any(|r| matches!(r, Request::Configure { settings } if settings.token == "fresh")));
    assert!(requests.contains(&Request::Connect));
}

#[test]
fn test_save_global_settings_keeps_token() {
    let mut h = Harness::new();
    h.global_settings(authorized());
    h.appear(PLAY_PAUSE, "c1", json!({}));
    h.drain_requests();
    h.host.take();

    h.editor_message(
        PLAY_PAUSE,
        "c1",
        json!({"event": "saveGlobalSettings", "host": "192.168.1.20", "port": "9863"}),
    );
    let calls = h.host.take();
    assert!(calls.iter().any(|c| matches!(
        c,
        Call::GlobalSettings(s) if s.host == "192.168.1.20" && s.token == "secret"
    )));
    let requests = h.drain_requests();
    assert!(matches!(&requests[0], Request::Configure { settings } if settings.host == "192.168.1.20"));
    assert_eq!(requests[1], Request::Connect);
}
