use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, info, warn};

use super::FrameReceiver;
use crate::event::{Event, EventSender, parse_json_event};

pub const DEFAULT_ADDR: &str = "127.0.0.1:8765";

#[derive(Debug, Serialize)]
pub struct WebSocketResponse {
    pub success: bool,
    pub message: Option<String>,
}

type WsSender = SplitSink<WebSocketStream<TcpStream>, Message>;

pub async fn serve(
    listener: TcpListener,
    events: EventSender,
    frames: FrameReceiver,
) -> std::io::Result<()> {
    loop {
        let (stream, peer_addr) = listener.accept().await?;
        info!(%peer_addr, "new WebSocket connection");
        tokio::spawn(handle_connection(
            stream,
            peer_addr,
            events.clone(),
            frames.clone(),
        ));
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    events: EventSender,
    mut frames: FrameReceiver,
) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%peer_addr, error = %e, "WebSocket handshake failed");
            return;
        }
    };

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Bring the new client up to date before streaming changes.
    let current = frames.borrow_and_update().clone();
    if !current.is_empty() {
        if let Err(e) = ws_sender.send(Message::Text(current)).await {
            warn!(%peer_addr, error = %e, "failed to send initial frame");
            return;
        }
    }

    loop {
        tokio::select! {
            msg = ws_receiver.next() => {
                let Some(msg) = msg else { break };
                match msg {
                    Ok(Message::Text(text)) => {
                        if !handle_text(&text, &mut ws_sender, &events, peer_addr).await {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => {
                        debug!(%peer_addr, "WebSocket connection closed by peer");
                        break;
                    }
                    Ok(Message::Ping(data)) => {
                        if let Err(e) = ws_sender.send(Message::Pong(data)).await {
                            warn!(%peer_addr, error = %e, "failed to send pong");
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(%peer_addr, error = %e, "WebSocket error");
                        break;
                    }
                }
            }
            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
                let frame = frames.borrow_and_update().clone();
                if let Err(e) = ws_sender.send(Message::Text(frame)).await {
                    warn!(%peer_addr, error = %e, "failed to send frame");
                    break;
                }
            }
        }
    }

    info!(%peer_addr, "WebSocket connection terminated");
}

/// Forwards one client message to the controller and acknowledges it.
/// Returns false once the connection should be dropped.
async fn handle_text(
    text: &str,
    ws_sender: &mut WsSender,
    events: &EventSender,
    peer_addr: SocketAddr,
) -> bool {
    let response = match parse_json_event(text) {
        Ok(input) => {
            debug!(%peer_addr, ?input, "WebSocket input");
            if events.send(Event::Input(input)).is_err() {
                return false;
            }
            WebSocketResponse {
                success: true,
                message: Some("Message received".to_string()),
            }
        }
        Err(e) => {
            warn!(%peer_addr, error = %e, "ignoring input");
            WebSocketResponse {
                success: false,
                message: Some(format!("Parse error: {}", e)),
            }
        }
    };

    match serde_json::to_string(&response) {
        Ok(json) => {
            if let Err(e) = ws_sender.send(Message::Text(json)).await {
                warn!(%peer_addr, error = %e, "failed to send WebSocket response");
                return false;
            }
            true
        }
        Err(e) => {
            warn!(error = %e, "failed to encode response");
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{InputEvent, create_event_channel};
    use crate::pomodoro::Phase;
    use std::time::Duration;
    use tokio::sync::watch;
    use tokio::time::timeout;

    async fn next_text<S>(client: &mut S) -> String
    where
        S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
            + Unpin,
    {
        let msg = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out")
            .expect("stream ended")
            .expect("ws error");
        match msg {
            Message::Text(text) => text,
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_client_gets_frames_and_sends_input() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (events_tx, mut events_rx) = create_event_channel();
        let (frames_tx, frames_rx) = watch::channel(r#"{"ops":[]}"#.to_string());
        tokio::spawn(serve(listener, events_tx, frames_rx));

        let (mut client, _) = tokio_tungstenite::connect_async(format!("ws://{}", addr))
            .await
            .unwrap();
        assert_eq!(next_text(&mut client).await, r#"{"ops":[]}"#);

        client
            .send(Message::Text(
                r#"{"type":"switch_mode","phase":"break"}"#.to_string(),
            ))
            .await
            .unwrap();
        let ack: serde_json::Value = serde_json::from_str(&next_text(&mut client).await).unwrap();
        assert_eq!(ack["success"], true);
        assert_eq!(ack["message"], "Message received");
        assert_eq!(
            events_rx.recv().await,
            Some(Event::Input(InputEvent::SwitchMode {
                phase: Phase::Break
            }))
        );

        client
            .send(Message::Text("not json".to_string()))
            .await
            .unwrap();
        let nack: serde_json::Value = serde_json::from_str(&next_text(&mut client).await).unwrap();
        assert_eq!(nack["success"], false);
        let reason = nack["message"].as_str().unwrap();
        assert!(reason.starts_with("Parse error: "), "{}", reason);
        assert!(events_rx.try_recv().is_err());

        frames_tx.send_replace(r#"{"ops":[1]}"#.to_string());
        assert_eq!(next_text(&mut client).await, r#"{"ops":[1]}"#);
    }
}
