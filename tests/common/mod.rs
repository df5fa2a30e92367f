//! Shared test utilities and fixtures
//!
//! A fake intelligence backend listening on an ephemeral loopback port. It
//! speaks the real frame codec, records every command it receives, and
//! answers through a scripted handler.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use sage_connector::{Endpoint, FramedTransport, IntelligenceClient, Transport};
use sage_types::Envelope;
use serde_json::{Map, Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Reply payload for `(target, command, request payload)`; `None` closes the
/// connection without answering.
pub type Handler = Arc<dyn Fn(&str, &str, &Map<String, Value>) -> Option<Value> + Send + Sync>;

pub struct FakeBackend {
    endpoint: Endpoint,
    requests: Arc<Mutex<Vec<Envelope>>>,
    accept_task: JoinHandle<()>,
}

impl FakeBackend {
    /// Bind to `127.0.0.1:0` and serve every accepted connection with `handler`.
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&str, &str, &Map<String, Value>) -> Option<Value> + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let port = listener.local_addr().expect("local addr").port();
        let endpoint = Endpoint::parse(&format!("tcp://127.0.0.1:{port}")).expect("endpoint");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler: Handler = Arc::new(handler);

        let accept_requests = Arc::clone(&requests);
        let accept_task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(
                    stream,
                    Arc::clone(&handler),
                    Arc::clone(&accept_requests),
                ));
            }
        });

        Self {
            endpoint,
            requests,
            accept_task,
        }
    }

    /// Answers every command with `{success: true}`.
    pub async fn healthy() -> Self {
        Self::start(|_, _, _| Some(ok(json!({})))).await
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint.clone()
    }

    pub fn url(&self) -> String {
        self.endpoint.to_string()
    }

    pub fn client(&self) -> IntelligenceClient {
        IntelligenceClient::new(self.endpoint())
    }

    pub fn requests(&self) -> Vec<Envelope> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| {
                r.payload
                    .get("command")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            })
            .collect()
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

async fn serve(stream: TcpStream, handler: Handler, requests: Arc<Mutex<Vec<Envelope>>>) {
    let (read_half, write_half) = stream.into_split();
    let mut transport = FramedTransport::new(read_half, write_half);

    while let Ok(frame) = transport.recv().await {
        let request: Envelope = serde_json::from_slice(&frame).expect("command envelope");
        requests.lock().expect("requests lock").push(request.clone());

        let command = request
            .payload
            .get("command")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let Some(payload) = handler(&request.target, command, &request.payload) else {
            return;
        };

        let reply = json!({
            "id": format!("backend_{}", request.id),
            "type": "response",
            "source": request.target,
            "target": request.source,
            "timestamp": request.timestamp,
            "payload": payload,
            "correlation_id": request.id,
        });
        let bytes = serde_json::to_vec(&reply).expect("reply json");
        if transport.send(&bytes).await.is_err() {
            return;
        }
    }
}

/// `{success: true}` merged with the fields of `extra`.
pub fn ok(extra: Value) -> Value {
    let mut payload = json!({ "success": true });
    if let (Some(target), Value::Object(fields)) = (payload.as_object_mut(), extra) {
        target.extend(fields);
    }
    payload
}

pub fn failure(message: &str) -> Value {
    json!({ "success": false, "error": message })
}

/// An address nothing is listening on.
pub async fn unused_endpoint() -> Endpoint {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    Endpoint::parse(&format!("tcp://127.0.0.1:{port}")).expect("endpoint")
}
