//! Websocket session with the control-surface host.
//!
//! A reader task decodes inbound frames into [`CoreEvent::Host`]; a writer
//! task drains an unbounded queue so that [`StreamDeckHost`] methods never
//! block the core.

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};
use ytmd_proto::platform::host_ws_url;
use ytmd_proto::settings::GlobalSettings;

use crate::args::HostArgs;
use crate::core::CoreEvent;
use crate::host::{
    registration, ButtonState, ContextId, Feedback, HostEvent, HostSurface, LayoutPayload, LogPayload,
    Outbound, StatePayload, TitlePayload,
};
use crate::inspector::ToInspector;

/// Cheap handle for sending frames to the host.
#[derive(Debug, Clone)]
pub struct StreamDeckHost {
    plugin_uuid: String,
    tx: mpsc::UnboundedSender<String>,
}

impl StreamDeckHost {
    pub fn new(plugin_uuid: impl Into<String>, tx: mpsc::UnboundedSender<String>) -> Self {
        Self {
            plugin_uuid: plugin_uuid.into(),
            tx,
        }
    }

    fn send<T: Serialize>(&self, frame: &T) {
        let text = match serde_json::to_string(frame) {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to encode host frame: {}", e);
                return;
            }
        };
        // Writer gone means the host connection closed; the reader reports it.
        let _ = self.tx.send(text);
    }
}

impl HostSurface for StreamDeckHost {
    fn set_title(&self, context: &ContextId, title: &str) {
        self.send(&Outbound::SetTitle {
            context,
            payload: TitlePayload { title, target: 0 },
        });
    }

    fn set_state(&self, context: &ContextId, state: ButtonState) {
        self.send(&Outbound::SetState {
            context,
            payload: StatePayload { state: state as u8 },
        });
    }

    fn set_feedback(&self, context: &ContextId, feedback: &Feedback) {
        self.send(&Outbound::SetFeedback {
            context,
            payload: feedback,
        });
    }

    fn set_feedback_layout(&self, context: &ContextId, layout: &str) {
        self.send(&Outbound::SetFeedbackLayout {
            context,
            payload: LayoutPayload { layout },
        });
    }

    fn show_ok(&self, context: &ContextId) {
        self.send(&Outbound::ShowOk { context });
    }

    fn show_alert(&self, context: &ContextId) {
        self.send(&Outbound::ShowAlert { context });
    }

    fn set_settings(&self, context: &ContextId, settings: Value) {
        self.send(&Outbound::SetSettings {
            context,
            payload: settings,
        });
    }

    fn set_global_settings(&self, settings: &GlobalSettings) {
        self.send(&Outbound::SetGlobalSettings {
            context: &self.plugin_uuid,
            payload: settings,
        });
    }

    fn get_global_settings(&self) {
        self.send(&Outbound::GetGlobalSettings {
            context: &self.plugin_uuid,
        });
    }

    fn log_message(&self, message: &str) {
        self.send(&Outbound::LogMessage {
            payload: LogPayload { message },
        });
    }

    fn send_to_inspector(&self, action: &str, context: &ContextId, message: &ToInspector) {
        self.send(&Outbound::SendToPropertyInspector {
            action,
            context,
            payload: message,
        });
    }
}

/// Connect, register and start the IO tasks. The returned handle finishes
/// when the host closes the connection.
pub async fn connect(
    args: &HostArgs,
    event_tx: mpsc::Sender<CoreEvent>,
) -> anyhow::Result<(StreamDeckHost, JoinHandle<()>)> {
    let url = host_ws_url(args.port);
    let (ws, _) = connect_async(url.as_str())
        .await
        .with_context(|| format!("Failed to connect to host at {}", url))?;
    info!("Connected to host at {}", url);

    let (mut sink, mut stream) = ws.split();
    let hello = registration(&args.register_event, &args.plugin_uuid).to_string();
    sink.send(Message::Text(hello))
        .await
        .context("Failed to register with host")?;

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if let Err(e) = sink.send(Message::Text(frame)).await {
                warn!("Host writer: send failed: {}", e);
                break;
            }
        }
        debug!("Host writer: exiting");
    });

    let reader = tokio::spawn(async move {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => match serde_json::from_str::<HostEvent>(&text) {
                    Ok(HostEvent::Unknown) => {}
                    Ok(event) => {
                        if event_tx.send(CoreEvent::Host(event)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Host reader: undecodable frame: {}", e),
                },
                Ok(Message::Close(_)) => {
                    info!("Host reader: host closed the connection");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    error!("Host reader: {}", e);
                    break;
                }
            }
        }
        let _ = event_tx.send(CoreEvent::Shutdown).await;
    });

    Ok((StreamDeckHost::new(args.plugin_uuid.clone(), tx), reader))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_are_queued_as_json() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let host = StreamDeckHost::new("plugin-1", tx);
        let ctx = ContextId::new("c1");

        host.set_state(&ctx, ButtonState::Off);
        host.get_global_settings();

        let frame: Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(frame["event"], "setState");
        assert_eq!(frame["payload"]["state"], 1);

        let frame: Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(frame, serde_json::json!({"event": "getGlobalSettings", "context": "plugin-1"}));
    }
}
