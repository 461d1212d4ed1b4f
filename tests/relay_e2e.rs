//! End-to-end tests: a real relay on a loopback port driven by WebSocket clients.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use signal_relay::{
    DuplicatePolicy, MemoryDirectory, RegistryConfig, RelayServer, ServerConfig, UserDirectory,
};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

struct TestServer {
    addr: SocketAddr,
    server: Arc<RelayServer>,
    _shutdown: oneshot::Sender<()>,
}

async fn start(server: RelayServer) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = Arc::new(server);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let running = Arc::clone(&server);
    tokio::spawn(async move {
        running
            .serve_until(listener, async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });

    TestServer {
        addr,
        server,
        _shutdown: shutdown_tx,
    }
}

async fn start_default() -> TestServer {
    start(RelayServer::new(ServerConfig::default())).await
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .unwrap();
    ws
}

async fn send(client: &mut Client, value: Value) {
    client.send(Message::Text(value.to_string())).await.unwrap();
}

/// Next text frame as JSON, skipping control frames
async fn recv(client: &mut Client) -> Value {
    loop {
        let frame = tokio::time::timeout(RECV_TIMEOUT, client.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("read error");

        match frame {
            Message::Text(text) => return serde_json::from_str(&text).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

/// Raw text of the next text frame
async fn recv_text(client: &mut Client) -> String {
    loop {
        let frame = tokio::time::timeout(RECV_TIMEOUT, client.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("read error");

        if let Message::Text(text) = frame {
            return text;
        }
    }
}

async fn assert_silent(client: &mut Client) {
    let result = tokio::time::timeout(Duration::from_millis(200), client.next()).await;
    assert!(result.is_err(), "expected no frame, got {result:?}");
}

async fn login(addr: SocketAddr, name: &str) -> Client {
    let mut client = connect(addr).await;
    send(&mut client, json!({"type": "login", "name": name})).await;
    assert_eq!(recv(&mut client).await, json!({"type": "login", "success": true}));
    client
}

fn sorted_users(value: &Value) -> Vec<String> {
    assert_eq!(value["type"], "user_list");
    let mut users: Vec<String> = value["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u.as_str().unwrap().to_string())
        .collect();
    users.sort();
    users
}

#[tokio::test]
async fn test_presence_on_join() {
    let server = start_default().await;

    let mut alice = login(server.addr, "Alice").await;
    assert_eq!(sorted_users(&recv(&mut alice).await), vec!["Alice"]);

    let mut bob = login(server.addr, "Bob").await;
    assert_eq!(sorted_users(&recv(&mut bob).await), vec!["Alice", "Bob"]);
    assert_eq!(sorted_users(&recv(&mut alice).await), vec!["Alice", "Bob"]);

    // Exactly one list per join
    assert_silent(&mut alice).await;
    assert_silent(&mut bob).await;
}

#[tokio::test]
async fn test_offer_forwarded_verbatim() {
    let server = start_default().await;
    let mut alice = login(server.addr, "Alice").await;
    recv(&mut alice).await;
    let mut bob = login(server.addr, "Bob").await;
    recv(&mut bob).await;
    recv(&mut alice).await;

    let offer = r#"{"type":"offer","name":"Alice","target":"Bob","sdp":"v=0\r\no=- 46117 2 IN IP4 127.0.0.1"}"#;
    alice.send(Message::Text(offer.to_string())).await.unwrap();

    assert_eq!(recv_text(&mut bob).await, offer);
    assert_silent(&mut alice).await;
}

#[tokio::test]
async fn test_unknown_target_error_to_sender_only() {
    let server = start_default().await;
    let mut alice = login(server.addr, "Alice").await;
    recv(&mut alice).await;
    let mut bob = login(server.addr, "Bob").await;
    recv(&mut bob).await;
    recv(&mut alice).await;

    send(
        &mut alice,
        json!({"type": "offer", "name": "Alice", "target": "Charlie", "sdp": "..."}),
    )
    .await;

    let reply = recv(&mut alice).await;
    assert_eq!(reply["type"], "error");
    assert!(reply["message"].as_str().unwrap().contains("Charlie"));
    assert_silent(&mut bob).await;
}

#[tokio::test]
async fn test_disconnect_cleans_up() {
    let server = start_default().await;
    let mut alice = login(server.addr, "Alice").await;
    recv(&mut alice).await;
    let mut bob = login(server.addr, "Bob").await;
    recv(&mut bob).await;
    recv(&mut alice).await;

    bob.close(None).await.unwrap();

    assert_eq!(sorted_users(&recv(&mut alice).await), vec!["Alice"]);
    assert!(!server.server.registry().contains("Bob").await);

    send(&mut alice, json!({"type": "answer", "name": "Alice", "target": "Bob"})).await;
    assert_eq!(recv(&mut alice).await["type"], "error");
}

#[tokio::test]
async fn test_abrupt_disconnect_cleans_up() {
    let server = start_default().await;
    let mut alice = login(server.addr, "Alice").await;
    recv(&mut alice).await;
    let bob = login(server.addr, "Bob").await;
    recv(&mut alice).await;

    // Drop the socket without a close handshake
    drop(bob);

    assert_eq!(sorted_users(&recv(&mut alice).await), vec!["Alice"]);
}

#[tokio::test]
async fn test_login_required_first() {
    let server = start_default().await;
    let mut client = connect(server.addr).await;

    send(&mut client, json!({"type": "offer", "name": "Alice", "target": "Bob"})).await;
    assert_eq!(recv(&mut client).await["type"], "error");

    send(&mut client, json!({"type": "login", "name": "Alice"})).await;
    assert_eq!(recv(&mut client).await, json!({"type": "login", "success": true}));
    assert_eq!(sorted_users(&recv(&mut client).await), vec!["Alice"]);
}

#[tokio::test]
async fn test_malformed_frame_does_not_disconnect() {
    let server = start_default().await;
    let mut alice = login(server.addr, "Alice").await;
    recv(&mut alice).await;

    alice.send(Message::Text("{{{".into())).await.unwrap();
    assert_eq!(recv(&mut alice).await["type"], "error");

    // Connection still usable
    let mut bob = login(server.addr, "Bob").await;
    recv(&mut bob).await;
    assert_eq!(sorted_users(&recv(&mut alice).await), vec!["Alice", "Bob"]);
}

#[tokio::test]
async fn test_relogin_evicts_stale_connection() {
    let server = start(RelayServer::with_registry_config(
        ServerConfig::default(),
        RegistryConfig::default().duplicate_policy(DuplicatePolicy::Replace),
    ))
    .await;

    let mut stale = login(server.addr, "Alice").await;
    recv(&mut stale).await;

    let mut fresh = login(server.addr, "Alice").await;
    assert_eq!(sorted_users(&recv(&mut fresh).await), vec!["Alice"]);

    assert_eq!(
        recv(&mut stale).await,
        json!({"type": "error", "message": "signed in from another connection"})
    );

    // Stale connection is closed by the server
    let closed = tokio::time::timeout(RECV_TIMEOUT, async {
        loop {
            match stale.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok());

    // The new login keeps the name; no leave broadcast follows the eviction
    assert_silent(&mut fresh).await;
    assert_eq!(
        server.server.registry().lookup("Alice").await.map(|h| h.session_id()),
        Some(2)
    );
}

#[tokio::test]
async fn test_directory_required_login() {
    let directory = Arc::new(MemoryDirectory::new());
    directory.register_user("Alice").unwrap();
    let server = start(RelayServer::new(ServerConfig::default()).with_directory(directory)).await;

    let mut stranger = connect(server.addr).await;
    send(&mut stranger, json!({"type": "login", "name": "Mallory"})).await;
    assert_eq!(
        recv(&mut stranger).await,
        json!({"type": "login", "success": false, "message": "unknown user: Mallory"})
    );

    let mut alice = login(server.addr, "Alice").await;
    assert_eq!(sorted_users(&recv(&mut alice).await), vec!["Alice"]);
}

#[tokio::test]
async fn test_connection_limit() {
    let server = start(RelayServer::new(ServerConfig::default().max_connections(1))).await;

    let mut alice = login(server.addr, "Alice").await;
    recv(&mut alice).await;

    // Second socket is dropped before the WebSocket handshake
    let result = tokio_tungstenite::connect_async(format!("ws://{}", server.addr)).await;
    assert!(result.is_err());
    assert_eq!(server.server.stats().snapshot().rejected_connections, 1);
}

#[tokio::test]
async fn test_idle_timeout_closes_session() {
    let config = ServerConfig::default()
        .ping_interval(None)
        .idle_timeout(Some(Duration::from_millis(300)));
    let server = start(RelayServer::new(config)).await;

    let mut alice = login(server.addr, "Alice").await;
    recv(&mut alice).await;

    tokio::time::sleep(Duration::from_millis(800)).await;
    assert!(!server.server.registry().contains("Alice").await);
}
