use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use tradewatch_core::ConnectionState;
use tradewatch_feed::{spawn_feed, FeedConfig, Projection};

const SNAPSHOT: &str = r#"{"status":"Active","mt5_status":{"connected":true,"balance":1000.5},
    "open_positions":[{"symbol":"EURUSD","direction":"BUY","status":"Active","volume":1.0,
    "price":1.2345,"deal_id":"D1","timestamp":"2024-01-15 10:00:00.000","mt5_mirrored":true}],
    "closed_positions":[]}"#;

/// Accept one client, answer its `get_data` with a garbage frame followed by
/// a snapshot, then hold the connection open until the client leaves.
async fn serve_once(listener: TcpListener) -> Vec<String> {
    let (tcp, _) = listener.accept().await.unwrap();
    let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
    let mut received = Vec::new();

    while let Some(Ok(msg)) = ws.next().await {
        match msg {
            Message::Text(text) => {
                received.push(text);
                ws.send(Message::Text("garbage".to_string())).await.unwrap();
                ws.send(Message::Text(SNAPSHOT.to_string())).await.unwrap();
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
    received
}

#[tokio::test]
async fn test_feed_against_websocket_server() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(serve_once(listener));

    let handle = spawn_feed(
        FeedConfig {
            url: format!("ws://{}", addr),
            ..Default::default()
        },
        Projection::Full,
    );

    let mut frames = handle.store().subscribe();
    tokio::time::timeout(Duration::from_secs(5), async {
        while frames.borrow_and_update().updated_at.is_none() {
            frames.changed().await.unwrap();
        }
    })
    .await
    .expect("snapshot not received");

    assert_eq!(handle.connection_state(), ConnectionState::Connected);
    let snapshot = handle.store().current();
    assert_eq!(snapshot.status, "Active");
    assert_eq!(snapshot.open_positions[0].symbol, "EURUSD");

    handle.shutdown().await;

    let received = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not observe the close")
        .unwrap();
    assert_eq!(received, vec![r#"{"command":"get_data"}"#.to_string()]);
}

#[tokio::test]
async fn test_refused_connection_reports_disconnected() {
    // Bind then drop to get a port nobody listens on.
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let handle = spawn_feed(
        FeedConfig {
            url: format!("ws://{}", addr),
            reconnect_delay_secs: 60,
        },
        Projection::History,
    );

    let mut state = handle.subscribe_state();
    tokio::time::timeout(Duration::from_secs(5), async {
        while *state.borrow_and_update() != ConnectionState::Disconnected {
            state.changed().await.unwrap();
        }
    })
    .await
    .expect("feed never reported the refused connection");

    assert_eq!(handle.store().current().status, "Connecting...");
    handle.shutdown().await;
}
