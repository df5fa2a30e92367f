//! Connection lifecycle over real TCP

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use sage_connector::{ConnectorError, IntelligenceClient};
use sage_types::ConnectionStatus;
use serde_json::{Map, json};

use crate::common::{FakeBackend, ok, unused_endpoint};

fn record(client: &IntelligenceClient) -> Arc<Mutex<Vec<ConnectionStatus>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    client.on_status_change(move |status| sink.lock().unwrap().push(status));
    log
}

#[tokio::test]
async fn connect_and_disconnect_over_tcp() {
    let backend = FakeBackend::healthy().await;
    let client = backend.client();
    let statuses = record(&client);

    client.connect().await.unwrap();
    assert!(client.health_check().await);
    client.disconnect().await;

    assert_eq!(
        *statuses.lock().unwrap(),
        vec![
            ConnectionStatus::Connecting,
            ConnectionStatus::Connected,
            ConnectionStatus::Disconnected,
        ]
    );
    assert_eq!(backend.commands(), vec!["health_check", "health_check"]);
    let first = &backend.requests()[0];
    assert_eq!(first.target, "system");
    assert!(first.id.starts_with("editor_1_"));
}

#[tokio::test]
async fn unreachable_backend_reports_error() {
    let client = IntelligenceClient::new(unused_endpoint().await);
    let statuses = record(&client);

    let err = client.connect().await.unwrap_err();

    assert!(matches!(err, ConnectorError::Connection { .. }));
    assert_eq!(client.status(), ConnectionStatus::Error);
    assert_eq!(
        *statuses.lock().unwrap(),
        vec![ConnectionStatus::Connecting, ConnectionStatus::Error]
    );
    assert!(!client.health_check().await);
}

#[tokio::test]
async fn backend_hangup_moves_to_error() {
    let handshakes = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&handshakes);
    let backend = FakeBackend::start(move |_, command, _| match command {
        "health_check" if seen.fetch_add(1, Ordering::SeqCst) == 0 => Some(ok(json!({}))),
        _ => None,
    })
    .await;
    let client = backend.client();
    client.connect().await.unwrap();

    let err = client
        .call("python_intelligence", "analyze_file", Map::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ConnectorError::Transport(_)));
    assert_eq!(client.status(), ConnectionStatus::Error);
    assert!(matches!(
        client.call("system", "get_status", Map::new()).await,
        Err(ConnectorError::NotConnected)
    ));

    // The backend accepts fresh connections again.
    handshakes.store(0, Ordering::SeqCst);
    client.connect().await.unwrap();
    assert_eq!(client.status(), ConnectionStatus::Connected);
}

#[tokio::test]
async fn switching_backends_reconnects() {
    let first = FakeBackend::healthy().await;
    let second = FakeBackend::healthy().await;
    let client = first.client();
    client.connect().await.unwrap();
    let statuses = record(&client);

    client.update_server_url(&second.url()).await.unwrap();
    assert!(client.health_check().await);

    assert_eq!(client.endpoint().await, second.endpoint());
    assert_eq!(
        *statuses.lock().unwrap(),
        vec![
            ConnectionStatus::Disconnected,
            ConnectionStatus::Connecting,
            ConnectionStatus::Connected,
        ]
    );
    assert_eq!(first.commands(), vec!["health_check"]);
    assert_eq!(second.commands(), vec!["health_check", "health_check"]);
}

#[tokio::test]
async fn switching_to_dead_backend_keeps_new_address() {
    let backend = FakeBackend::healthy().await;
    let client = backend.client();
    client.connect().await.unwrap();
    let dead = unused_endpoint().await;

    assert!(client.update_server_url(&dead.to_string()).await.is_err());

    assert_eq!(client.status(), ConnectionStatus::Error);
    assert_eq!(client.endpoint().await, dead);
}

#[tokio::test]
async fn concurrent_callers_share_one_connection() {
    let backend = FakeBackend::start(|_, _, payload| {
        Some(ok(json!({ "echo": payload.get("n").cloned() })))
    })
    .await;
    let client = Arc::new(backend.client());
    client.connect().await.unwrap();

    let mut tasks = Vec::new();
    for n in 0..8 {
        let client = Arc::clone(&client);
        tasks.push(tokio::spawn(async move {
            let mut params = Map::new();
            params.insert("n".to_string(), json!(n));
            let reply = client.call("system", "echo", params).await.unwrap();
            (n, reply["echo"].clone())
        }));
    }
    for task in tasks {
        let (n, echo) = task.await.unwrap();
        assert_eq!(echo, json!(n));
    }

    let counters: Vec<u64> = backend
        .requests()
        .iter()
        .map(|r| r.id.split('_').nth(1).unwrap().parse().unwrap())
        .collect();
    assert_eq!(counters, (1..=9).collect::<Vec<u64>>());
}
