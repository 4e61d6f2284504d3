//! Websocket transport for peers: one JSON request per remote call, answered by
//! one JSON response carrying the same id.
//!
//! Request:  `{"type":"request","id":7,"method":"add_fru","params":{...}}`
//! Response: `{"type":"response","id":7,"ok":true}` or with an `"error"` string.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{debug, trace};

use super::{PeerConnector, PeerError, PeerKind, PeerRpc};
use crate::tree::Descriptor;

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

pub struct WebSocketConnector {
    kind: PeerKind,
    url: String,
}

impl WebSocketConnector {
    pub fn new(kind: PeerKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
        }
    }
}

#[async_trait]
impl PeerConnector for WebSocketConnector {
    async fn connect(&self) -> Result<Arc<dyn PeerRpc>, PeerError> {
        debug!("Connecting to {} peer: {}", self.kind, self.url);
        let (stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| PeerError::Connect(format!("{}: {}", self.url, e)))?;

        Ok(Arc::new(WebSocketPeer {
            kind: self.kind,
            stream: Mutex::new(stream),
            next_id: AtomicU64::new(1),
        }))
    }

    fn endpoint(&self) -> String {
        self.url.clone()
    }
}

struct WebSocketPeer {
    kind: PeerKind,
    stream: Mutex<WsStream>,
    next_id: AtomicU64,
}

/// Interpret one inbound text frame. `None` means the frame is not the answer
/// to request `id` and should be skipped.
fn parse_response(text: &str, id: u64) -> Option<Result<bool, PeerError>> {
    let value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => return Some(Err(PeerError::Transport(format!("invalid response: {}", e)))),
    };

    if value.get("type").and_then(|v| v.as_str()) != Some("response") {
        return None;
    }
    if value.get("id").and_then(|v| v.as_u64()) != Some(id) {
        return None;
    }
    if let Some(error) = value.get("error").and_then(|v| v.as_str()) {
        return Some(Err(PeerError::Rejected(error.to_string())));
    }
    Some(Ok(value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false)))
}

impl WebSocketPeer {
    async fn request(&self, method: &str, params: Value) -> Result<bool, PeerError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = json!({
            "type": "request",
            "id": id,
            "method": method,
            "params": params,
        });

        // Held for the whole round trip: one outstanding request per connection.
        let mut stream = self.stream.lock().await;
        trace!("{} peer <- {} (id {})", self.kind, method, id);
        stream
            .send(Message::Text(request.to_string()))
            .await
            .map_err(|e| PeerError::Transport(e.to_string()))?;

        loop {
            let message = match stream.next().await {
                Some(Ok(message)) => message,
                Some(Err(e)) => return Err(PeerError::Transport(e.to_string())),
                None => return Err(PeerError::Transport("connection closed".to_string())),
            };

            match message {
                Message::Text(text) => match parse_response(&text, id) {
                    Some(result) => {
                        trace!("{} peer -> {} (id {}): {:?}", self.kind, method, id, result);
                        return result;
                    }
                    None => debug!("Ignoring unrelated {} peer message", self.kind),
                },
                Message::Close(_) => {
                    return Err(PeerError::Transport("peer closed connection".to_string()));
                }
                _ => {}
            }
        }
    }
}

#[async_trait]
impl PeerRpc for WebSocketPeer {
    async fn reset(&self) -> Result<bool, PeerError> {
        self.request("reset", json!({})).await
    }

    async fn add_fru(&self, parent_path: &str, descriptor: &Descriptor) -> Result<bool, PeerError> {
        self.request(
            "add_fru",
            json!({ "parent_path": parent_path, "descriptor": descriptor }),
        )
        .await
    }

    async fn add_sensors(&self, fru_path: &str, descriptors: &[Descriptor]) -> Result<bool, PeerError> {
        self.request(
            "add_sensors",
            json!({ "fru_path": fru_path, "descriptors": descriptors }),
        )
        .await
    }

    async fn remove_fru(&self, path: &str) -> Result<bool, PeerError> {
        self.request("remove_fru", json!({ "path": path })).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn test_parse_response() {
        assert!(matches!(
            parse_response(r#"{"type":"response","id":3,"ok":true}"#, 3),
            Some(Ok(true))
        ));
        assert!(parse_response(r#"{"type":"response","id":2,"ok":true}"#, 3).is_none());
        assert!(parse_response(r#"{"type":"event"}"#, 3).is_none());
        assert!(matches!(
            parse_response(r#"{"type":"response","id":3,"error":"exists"}"#, 3),
            Some(Err(PeerError::Rejected(_)))
        ));
        assert!(matches!(parse_response("not json", 3), Some(Err(PeerError::Transport(_)))));
    }

    /// Minimal peer: accepts one client and answers every request, refusing
    /// `remove_fru`.
    async fn spawn_peer() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            while let Some(Ok(Message::Text(text))) = ws.next().await {
                let request: Value = serde_json::from_str(&text).unwrap();
                let ok = request["method"] != "remove_fru";
                let reply = json!({"type": "response", "id": request["id"], "ok": ok});
                ws.send(Message::Text(reply.to_string())).await.unwrap();
            }
        });
        format!("ws://{}", addr)
    }

    #[tokio::test]
    async fn test_round_trip_against_local_peer() {
        let url = spawn_peer().await;
        let connector = WebSocketConnector::new(PeerKind::Fru, url);
        let peer = connector.connect().await.unwrap();

        assert!(peer.reset().await.unwrap());
        assert!(peer.add_fru("/", &Descriptor::from("mb")).await.unwrap());
        assert!(peer
            .add_sensors("/mb", &[Descriptor::from("t0"), Descriptor::from("t1")])
            .await
            .unwrap());
        assert!(!peer.remove_fru("/mb").await.unwrap());
    }

    #[tokio::test]
    async fn test_connect_failure_is_reported() {
        let connector = WebSocketConnector::new(PeerKind::Sensor, "ws://127.0.0.1:1");
        assert!(matches!(connector.connect().await, Err(PeerError::Connect(_))));
    }
}
