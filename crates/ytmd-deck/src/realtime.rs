//! Realtime state feed: a minimal socket.io v4 client over websocket.
//!
//! Only what the companion server uses is understood: engine open/ping,
//! namespace connect/disconnect/connect_error and plain events. Binary
//! packets and acks are ignored.

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use ytmd_proto::protocol::{CompanionError, SocketState, StateOutput, REALTIME_NAMESPACE};
use ytmd_proto::settings::GlobalSettings;

use crate::actions::play_pause::TRANSIENT_SOCKET_ERROR;
use crate::connector::SocketEvent;
use crate::core::CoreEvent;
use crate::watchdog::retry_seconds;

pub const STATE_EVENT: &str = "state-update";

pub fn socket_url(settings: &GlobalSettings) -> String {
    let settings = settings.normalized();
    format!(
        "ws://{}:{}/socket.io/?EIO=4&transport=websocket",
        settings.host,
        settings.port_number()
    )
}

/// Namespace connect packet carrying the token.
pub fn connect_packet(token: &str) -> String {
    format!("40{},{}", REALTIME_NAMESPACE, serde_json::json!({ "token": token }))
}

#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Open,
    Close,
    Ping,
    Connected,
    Disconnected,
    ConnectError(CompanionError),
    Event { name: String, data: Value },
    Other,
}

impl Packet {
    pub fn parse(frame: &str) -> Packet {
        let mut chars = frame.chars();
        match chars.next() {
            Some('0') => Packet::Open,
            Some('1') => Packet::Close,
            Some('2') => Packet::Ping,
            Some('4') => parse_socket_packet(chars.as_str()),
            _ => Packet::Other,
        }
    }
}

fn parse_socket_packet(body: &str) -> Packet {
    let mut chars = body.chars();
    let Some(kind) = chars.next() else {
        return Packet::Other;
    };
    let mut rest = chars.as_str();

    if rest.starts_with('/') {
        match rest.find(',') {
            Some(idx) => {
                if &rest[..idx] != REALTIME_NAMESPACE {
                    return Packet::Other;
                }
                rest = &rest[idx + 1..];
            }
            None => {
                if rest != REALTIME_NAMESPACE {
                    return Packet::Other;
                }
                rest = "";
            }
        }
    }

    // Optional ack id before the payload.
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_digit());

    match kind {
        '0' => Packet::Connected,
        '1' => Packet::Disconnected,
        '2' => match serde_json::from_str::<Vec<Value>>(rest) {
            Ok(mut items) if !items.is_empty() => {
                let data = if items.len() > 1 { items.swap_remove(1) } else { Value::Null };
                match items.first().and_then(Value::as_str) {
                    Some(name) => Packet::Event { name: name.to_string(), data },
                    None => Packet::Other,
                }
            }
            _ => Packet::Other,
        },
        '4' => {
            let error = serde_json::from_str::<CompanionError>(rest)
                .ok()
                .filter(|e| !e.message.is_empty())
                .unwrap_or_else(|| CompanionError::new("Connection refused"));
            Packet::ConnectError(error)
        }
        _ => Packet::Other,
    }
}

async fn emit(events: &mpsc::Sender<CoreEvent>, event: SocketEvent) -> bool {
    events.send(CoreEvent::Socket(event)).await.is_ok()
}

/// Keep a realtime session alive until the task is aborted or the core goes
/// away. Reconnects after `reconnect_delay`, or after the retry hint when
/// the server rate-limited us.
pub async fn run(settings: GlobalSettings, reconnect_delay: Duration, events: mpsc::Sender<CoreEvent>) {
    loop {
        if !emit(&events, SocketEvent::Connection(SocketState::Connecting)).await {
            return;
        }

        let wait = match session(&settings, &events).await {
            Ok(()) => {
                info!("Realtime: session closed");
                if !emit(&events, SocketEvent::Connection(SocketState::Disconnected)).await {
                    return;
                }
                reconnect_delay
            }
            Err(error) => {
                warn!("Realtime: {}", error);
                let wait = if error.is_rate_limited() {
                    Duration::from_secs(retry_seconds(Some(&error.message)))
                } else {
                    reconnect_delay
                };
                if !emit(&events, SocketEvent::Error(error)).await
                    || !emit(&events, SocketEvent::Connection(SocketState::Error)).await
                {
                    return;
                }
                wait
            }
        };

        debug!("Realtime: reconnecting in {:?}", wait);
        tokio::time::sleep(wait).await;
    }
}

async fn session(settings: &GlobalSettings, events: &mpsc::Sender<CoreEvent>) -> Result<(), CompanionError> {
    let url = socket_url(settings);
    debug!("Realtime: connecting to {}", url);
    let (ws, _) = connect_async(url.as_str()).await.map_err(|e| {
        debug!("Realtime: connect failed: {}", e);
        CompanionError::new(TRANSIENT_SOCKET_ERROR)
    })?;
    let (mut sink, mut stream) = ws.split();

    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => return Ok(()),
            Ok(_) => continue,
            Err(e) => {
                debug!("Realtime: read failed: {}", e);
                return Err(CompanionError::new(TRANSIENT_SOCKET_ERROR));
            }
        };

        let reply = match Packet::parse(&text) {
            Packet::Open => Some(connect_packet(&settings.token)),
            Packet::Ping => Some("3".to_string()),
            Packet::Connected => {
                info!("Realtime: connected");
                if !emit(events, SocketEvent::Connection(SocketState::Connected)).await {
                    return Ok(());
                }
                None
            }
            Packet::Event { name, data } if name == STATE_EVENT => {
                let state = serde_json::from_value::<StateOutput>(data).unwrap_or_else(|e| {
                    warn!("Realtime: malformed state update: {}", e);
                    StateOutput::default()
                });
                if !emit(events, SocketEvent::State(state)).await {
                    return Ok(());
                }
                None
            }
            Packet::ConnectError(error) => return Err(error),
            Packet::Close | Packet::Disconnected => return Ok(()),
            Packet::Event { .. } | Packet::Other => None,
        };

        if let Some(reply) = reply {
            sink.send(Message::Text(reply)).await.map_err(|e| {
                debug!("Realtime: write failed: {}", e);
                CompanionError::new(TRANSIENT_SOCKET_ERROR)
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_socket_url() {
        let settings = GlobalSettings {
            host: "localhost".into(),
            port: "9863".into(),
            token: "t".into(),
        };
        assert_eq!(
            socket_url(&settings),
            "ws://127.0.0.1:9863/socket.io/?EIO=4&transport=websocket"
        );
        assert_eq!(connect_packet("t"), r#"40/api/v1/realtime,{"token":"t"}"#);
    }

    #[test]
    fn test_engine_packets() {
        assert_eq!(Packet::parse(r#"0{"sid":"x","pingInterval":25000}"#), Packet::Open);
        assert_eq!(Packet::parse("2"), Packet::Ping);
        assert_eq!(Packet::parse("1"), Packet::Close);
        assert_eq!(Packet::parse("6"), Packet::Other);
    }

    #[test]
    fn test_namespace_packets() {
        assert_eq!(Packet::parse(r#"40/api/v1/realtime,{"sid":"abc"}"#), Packet::Connected);
        assert_eq!(Packet::parse("41/api/v1/realtime,"), Packet::Disconnected);
        assert_eq!(Packet::parse("40/other,{}"), Packet::Other);

        match Packet::parse(r#"44/api/v1/realtime,{"message":"Unauthorized"}"#) {
            Packet::ConnectError(err) => assert_eq!(err.message, "Unauthorized"),
            other => panic!("unexpected packet {:?}", other),
        }
    }

    #[test]
    fn test_state_event() {
        let frame = format!(
            "42/api/v1/realtime,{}",
            json!(["state-update", {"player": {"trackState": 1, "videoProgress": 45.2}}])
        );
        match Packet::parse(&frame) {
            Packet::Event { name, data } => {
                assert_eq!(name, STATE_EVENT);
                let state: StateOutput = serde_json::from_value(data).unwrap();
                assert_eq!(state.player.unwrap().video_progress, 45.2);
            }
            other => panic!("unexpected packet {:?}", other),
        }
    }
}
