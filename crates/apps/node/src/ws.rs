//! Websocket transport to the relay.
//!
//! The socket is split: a writer task drains an unbounded queue of
//! outbound messages, a reader task decodes text frames into
//! [`RelayEvent`]s. The node loop only ever touches the two channel ends.

use futures_util::{SinkExt, StreamExt};
use relay::{decode, encode, OutboundMessage, RelayChannel, RelayEvent};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info, warn};

/// Sending half handed to the coordinator.
#[derive(Debug, Clone)]
pub struct WsRelayChannel {
    tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl RelayChannel for WsRelayChannel {
    fn send(&mut self, msg: OutboundMessage) {
        if let Err(err) = self.tx.send(msg) {
            warn!(kind = err.0.name(), "relay writer gone, dropping message");
        }
    }
}

/// Connect to the relay and start the reader and writer tasks.
///
/// The returned receiver yields `Connected` first and `Disconnected` once
/// the socket closes, after which it ends.
pub async fn connect(
    url: &str,
) -> Result<(WsRelayChannel, mpsc::UnboundedReceiver<RelayEvent>), tungstenite::Error> {
    info!(%url, "connecting to relay");
    let (stream, _response) = tokio_tungstenite::connect_async(url).await?;
    let (mut ws_tx, mut ws_rx) = stream.split();

    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<OutboundMessage>();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let _ = event_tx.send(RelayEvent::Connected);

    tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            let text = match encode(&msg) {
                Ok(text) => text,
                Err(e) => {
                    warn!(kind = msg.name(), "failed to encode message: {e}");
                    continue;
                }
            };
            debug!(%text, "relay <-");
            if let Err(e) = ws_tx.send(Message::Text(text)).await {
                warn!("relay send failed: {e}");
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    tokio::spawn(async move {
        while let Some(frame) = ws_rx.next().await {
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("relay receive error: {e}");
                    break;
                }
            };
            match frame {
                Message::Text(text) => {
                    debug!(%text, "relay ->");
                    match decode(&text) {
                        Ok(msg) => {
                            if event_tx.send(RelayEvent::Message(msg)).is_err() {
                                return;
                            }
                        }
                        Err(e) => warn!("dropping malformed relay message: {e}"),
                    }
                }
                Message::Close(_) => {
                    info!("relay closed the connection");
                    break;
                }
                // Pings are answered by tungstenite.
                _ => {}
            }
        }
        let _ = event_tx.send(RelayEvent::Disconnected);
    });

    Ok((WsRelayChannel { tx: out_tx }, event_rx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use foundation::{SceneId, Viewpoint};
    use pretty_assertions::assert_eq;
    use relay::InboundMessage;
    use serde_json::json;
    use tokio::net::TcpListener;

    /// One-shot relay: records the first frame, replies with three.
    async fn relay_once(listener: TcpListener) -> String {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        let first = match ws.next().await.unwrap().unwrap() {
            Message::Text(text) => text,
            other => panic!("unexpected frame {other:?}"),
        };
        ws.send(Message::Text("{not json".to_string())).await.unwrap();
        ws.send(Message::Text(
            json!({"type": "pov", "data": {"heading": "10", "pitch": 5, "zoom": 2}}).to_string(),
        ))
        .await
        .unwrap();
        ws.send(Message::Text(
            json!({"type": "pano", "data": {"panoid": "abc"}}).to_string(),
        ))
        .await
        .unwrap();
        ws.close(None).await.unwrap();
        first
    }

    #[tokio::test]
    async fn round_trip_through_a_local_relay() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(relay_once(listener));

        let (mut channel, mut events) = connect(&format!("ws://{addr}")).await.unwrap();
        channel.send(OutboundMessage::Refresh {});

        assert_eq!(events.recv().await, Some(RelayEvent::Connected));
        match events.recv().await {
            Some(RelayEvent::Message(InboundMessage::Pov(payload))) => {
                assert_eq!(
                    payload.validate(3).unwrap(),
                    Viewpoint::new(10.0, 5.0, 2)
                );
            }
            other => panic!("expected pov, got {other:?}"),
        }
        match events.recv().await {
            Some(RelayEvent::Message(InboundMessage::Pano(payload))) => {
                assert_eq!(payload.validate().unwrap(), SceneId::parse("abc").unwrap());
            }
            other => panic!("expected pano, got {other:?}"),
        }
        assert_eq!(events.recv().await, Some(RelayEvent::Disconnected));

        let first: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();
        assert_eq!(first, json!({"type": "refresh", "data": {}}));
    }

    #[tokio::test]
    async fn unreachable_relay_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        assert!(connect(&format!("ws://{addr}")).await.is_err());
    }
}
