use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tradewatch_core::{ConnectionState, Connector, FeedError, Session};

use crate::config::FeedConfig;
use crate::protocol::{OutboundMessage, Projection};
use crate::store::SnapshotStore;

/// Owns the push-data connection for one mounted view.
///
/// The manager connects, asks for the current data once the connection is
/// open, decodes every inbound payload through its [`Projection`], writes
/// each accepted snapshot into its [`SnapshotStore`], and
/// after every close waits a fixed delay before trying again. It never gives
/// up on its own; only its [`FeedHandle`] stops it.
pub struct ConnectionManager {
    config: FeedConfig,
    connector: Arc<dyn Connector>,
    projection: Projection,
    store: SnapshotStore,
    state_tx: watch::Sender<ConnectionState>,
}

impl ConnectionManager {
    pub fn new(config: FeedConfig, connector: Arc<dyn Connector>) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Connecting);
        Self {
            config,
            connector,
            projection: Projection::Full,
            store: SnapshotStore::new(),
            state_tx,
        }
    }

    /// Read only the part of each payload the mounted view uses.
    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    /// Start the connection loop on the current tokio runtime.
    pub fn spawn(self) -> FeedHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let store = self.store.clone();
        let state = self.state_tx.subscribe();
        let task = tokio::spawn(self.run(shutdown_rx));

        FeedHandle {
            store,
            state,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    /// Open a session and request the initial snapshot.
    ///
    /// Returns `None` when the connection could not be opened.
    async fn connect(&self) -> Option<Box<dyn Session>> {
        self.state_tx.send_replace(ConnectionState::Connecting);
        info!(url = %self.config.url, "Connecting to trade monitor server");

        match self.connector.connect(&self.config.url).await {
            Ok(mut session) => {
                self.state_tx.send_replace(ConnectionState::Connected);
                info!("Connected to the trade monitor server");

                if let Err(e) = request_data(session.as_mut()).await {
                    self.on_error(&e);
                }
                Some(session)
            }
            Err(e) => {
                self.on_error(&e);
                None
            }
        }
    }

    /// Apply one inbound payload. Malformed payloads are logged and dropped
    /// without touching the store or the connection state.
    pub fn on_message(&self, payload: &str) {
        match self.projection.decode(payload) {
            Ok(snapshot) => {
                debug!(
                    status = %snapshot.status,
                    open = snapshot.open_positions.len(),
                    closed = snapshot.closed_positions.len(),
                    "Snapshot received"
                );
                self.store.replace(snapshot);
            }
            Err(e) => {
                warn!(error = %e, "Dropping trade monitor message");
            }
        }
    }

    /// Errors are only reported here. The close that follows drives the retry.
    fn on_error(&self, err: &FeedError) {
        warn!(error = %err, "Trade monitor connection error");
    }

    fn on_close(&self) {
        self.state_tx.send_replace(ConnectionState::Disconnected);
        info!(
            retry_in_secs = self.config.reconnect_delay_secs,
            "Disconnected from the trade monitor server"
        );
    }

    async fn run(self, mut shutdown: oneshot::Receiver<()>) {
        loop {
            let session = tokio::select! {
                _ = &mut shutdown => {
                    debug!("Feed stopped while connecting");
                    return;
                }
                session = self.connect() => session,
            };

            if let Some(mut session) = session {
                loop {
                    tokio::select! {
                        _ = &mut shutdown => {
                            session.close().await;
                            self.state_tx.send_replace(ConnectionState::Disconnected);
                            info!("Closed trade monitor connection");
                            return;
                        }
                        event = session.recv() => match event {
                            Some(Ok(payload)) => self.on_message(&payload),
                            Some(Err(e)) => self.on_error(&e),
                            None => break,
                        },
                    }
                }
            }

            self.on_close();

            tokio::select! {
                _ = &mut shutdown => {
                    debug!("Pending reconnect cancelled");
                    return;
                }
                _ = tokio::time::sleep(self.config.reconnect_delay()) => {}
            }
        }
    }
}

async fn request_data(session: &mut dyn Session) -> Result<(), FeedError> {
    let request = OutboundMessage::GetData.encode()?;
    session.send_text(request).await
}

/// Scoped ownership of a running feed.
///
/// Shutting the handle down (or dropping it) closes the open connection and
/// cancels any pending reconnect, so nothing outlives the view that mounted
/// the feed.
pub struct FeedHandle {
    store: SnapshotStore,
    state: watch::Receiver<ConnectionState>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl FeedHandle {
    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Stop the feed and wait until its connection is released.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Feed task ended abnormally");
            }
        }
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tradewatch_core::Snapshot;

    const SNAPSHOT: &str = r#"{"status":"Active","mt5_status":{"connected":true,"balance":1000.5},
        "open_positions":[{"symbol":"EURUSD","direction":"BUY","status":"Active","volume":1.0,
        "price":1.2345,"deal_id":"D1","timestamp":"2024-01-15 10:00:00.000","mt5_mirrored":true}],
        "closed_positions":[]}"#;

    /// Server side of a fake session. Dropping `inbound` ends the session.
    struct Remote {
        inbound: mpsc::UnboundedSender<Result<String, FeedError>>,
        sent: Arc<Mutex<Vec<String>>>,
        closed: Arc<AtomicBool>,
    }

    impl Remote {
        fn push(&self, payload: &str) {
            self.inbound.send(Ok(payload.to_string())).unwrap();
        }

        fn fail(&self, reason: &str) {
            self.inbound
                .send(Err(FeedError::Transport(reason.to_string())))
                .unwrap();
        }
    }

    struct FakeSession {
        inbound: mpsc::UnboundedReceiver<Result<String, FeedError>>,
        sent: Arc<Mutex<Vec<String>>>,
        closed: Arc<AtomicBool>,
    }

    #[async_trait]
    impl Session for FakeSession {
        async fn send_text(&mut self, text: String) -> Result<(), FeedError> {
            self.sent.lock().unwrap().push(text);
            Ok(())
        }

        async fn recv(&mut self) -> Option<Result<String, FeedError>> {
            self.inbound.recv().await
        }

        async fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    /// Hands out queued sessions; refuses once the queue is empty.
    #[derive(Default)]
    struct FakeConnector {
        attempts: AtomicUsize,
        sessions: Mutex<VecDeque<FakeSession>>,
    }

    impl FakeConnector {
        fn accept_next(&self) -> Remote {
            let (tx, rx) = mpsc::unbounded_channel();
            let sent = Arc::new(Mutex::new(Vec::new()));
            let closed = Arc::new(AtomicBool::new(false));
            self.sessions.lock().unwrap().push_back(FakeSession {
                inbound: rx,
                sent: sent.clone(),
                closed: closed.clone(),
            });
            Remote {
                inbound: tx,
                sent,
                closed,
            }
        }

        fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Connector for FakeConnector {
        async fn connect(&self, _url: &str) -> Result<Box<dyn Session>, FeedError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            match self.sessions.lock().unwrap().pop_front() {
                Some(session) => Ok(Box::new(session)),
                None => Err(FeedError::Transport("connection refused".to_string())),
            }
        }
    }

    fn manager(connector: &Arc<FakeConnector>) -> ConnectionManager {
        ConnectionManager::new(FeedConfig::default(), connector.clone())
    }

    /// Let the feed task run until it blocks again.
    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn test_on_message_replaces_store() {
        let connector = Arc::new(FakeConnector::default());
        let manager = manager(&connector);

        manager.on_message(SNAPSHOT);

        let current = manager.store().current();
        assert_eq!(current.status, "Active");
        assert_eq!(current.account_status.balance, dec!(1000.5));
        assert_eq!(current.open_positions[0].deal_id, "D1");
    }

    #[test]
    fn test_on_message_ignores_malformed_payload() {
        let connector = Arc::new(FakeConnector::default());
        let manager = manager(&connector);
        manager.on_message(SNAPSHOT);
        let before = manager.store().current();

        manager.on_message("{\"status\": ");
        manager.on_message("[]");

        assert_eq!(manager.store().current(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_requests_data_and_applies_snapshots() {
        let connector = Arc::new(FakeConnector::default());
        let remote = connector.accept_next();
        let handle = manager(&connector).spawn();
        settle().await;

        assert_eq!(handle.connection_state(), ConnectionState::Connected);
        assert_eq!(
            *remote.sent.lock().unwrap(),
            vec![r#"{"command":"get_data"}"#.to_string()]
        );

        remote.push(SNAPSHOT);
        settle().await;
        assert_eq!(handle.store().current().open_positions.len(), 1);

        // Each message is a full overwrite.
        remote.push(r#"{"status":"Flat"}"#);
        settle().await;
        let expected = Snapshot {
            status: "Flat".to_string(),
            ..Default::default()
        };
        assert_eq!(*handle.store().current(), expected);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_message_keeps_connection_and_data() {
        let connector = Arc::new(FakeConnector::default());
        let remote = connector.accept_next();
        let handle = manager(&connector).spawn();
        settle().await;

        remote.push(SNAPSHOT);
        remote.push("not json");
        settle().await;

        assert_eq!(handle.connection_state(), ConnectionState::Connected);
        assert_eq!(handle.store().current().status, "Active");
        assert_eq!(connector.attempts(), 1);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_schedules_one_retry_after_delay() {
        let connector = Arc::new(FakeConnector::default());
        let remote = connector.accept_next();
        let handle = manager(&connector).spawn();
        settle().await;
        assert_eq!(connector.attempts(), 1);

        drop(remote.inbound);
        settle().await;
        assert_eq!(handle.connection_state(), ConnectionState::Disconnected);

        tokio::time::advance(Duration::from_millis(2900)).await;
        settle().await;
        assert_eq!(connector.attempts(), 1);

        tokio::time::advance(Duration::from_millis(200)).await;
        settle().await;
        assert_eq!(connector.attempts(), 2);

        // The retry was refused: one more attempt per delay, never a burst.
        tokio::time::advance(Duration::from_millis(1000)).await;
        settle().await;
        assert_eq!(connector.attempts(), 2);
        assert_eq!(handle.connection_state(), ConnectionState::Disconnected);

        tokio::time::advance(Duration::from_millis(2100)).await;
        settle().await;
        assert_eq!(connector.attempts(), 3);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_survives_disconnect() {
        let connector = Arc::new(FakeConnector::default());
        let remote = connector.accept_next();
        let handle = manager(&connector).spawn();
        settle().await;

        remote.push(SNAPSHOT);
        settle().await;
        drop(remote.inbound);
        settle().await;

        assert_eq!(handle.connection_state(), ConnectionState::Disconnected);
        assert_eq!(handle.store().current().status, "Active");

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_reconnect() {
        let connector = Arc::new(FakeConnector::default());
        let remote = connector.accept_next();
        let handle = manager(&connector).spawn();
        settle().await;

        drop(remote.inbound);
        settle().await;
        handle.shutdown().await;

        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(connector.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_reconnect() {
        let connector = Arc::new(FakeConnector::default());
        let handle = manager(&connector).spawn();
        settle().await;
        assert_eq!(handle.connection_state(), ConnectionState::Disconnected);

        drop(handle);
        settle().await;

        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(connector.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_closes_open_session() {
        let connector = Arc::new(FakeConnector::default());
        let remote = connector.accept_next();
        let handle = manager(&connector).spawn();
        settle().await;

        let state = handle.subscribe_state();
        handle.shutdown().await;

        assert!(remote.closed.load(Ordering::SeqCst));
        assert_eq!(*state.borrow(), ConnectionState::Disconnected);
        assert_eq!(connector.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_only_logs_until_close() {
        let connector = Arc::new(FakeConnector::default());
        let remote = connector.accept_next();
        let handle = manager(&connector).spawn();
        settle().await;
        remote.push(SNAPSHOT);
        settle().await;

        remote.fail("connection reset");
        settle().await;
        assert_eq!(handle.connection_state(), ConnectionState::Connected);
        assert_eq!(handle.store().current().status, "Active");

        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(connector.attempts(), 1);

        // The close after the error drives exactly one retry.
        drop(remote.inbound);
        settle().await;
        assert_eq!(handle.connection_state(), ConnectionState::Disconnected);

        tokio::time::advance(Duration::from_millis(2900)).await;
        settle().await;
        assert_eq!(connector.attempts(), 1);

        tokio::time::advance(Duration::from_millis(200)).await;
        settle().await;
        assert_eq!(connector.attempts(), 2);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_projection_ignores_open_positions() {
        let connector = Arc::new(FakeConnector::default());
        let remote = connector.accept_next();
        let handle = manager(&connector)
            .with_projection(Projection::History)
            .spawn();
        settle().await;

        remote.push(
            r#"{"status":"Active","open_positions":[{"symbol":"EURUSD"}],
            "closed_positions":[{"symbol":"GBPUSD","direction":"SELL","volume":1,
            "price":1.25,"deal_id":"C1","open_timestamp":"2024-01-15 09:00:00",
            "close_timestamp":"2024-01-15 10:00:00"}]}"#,
        );
        settle().await;

        let current = handle.store().current();
        assert_eq!(current.closed_positions.len(), 1);
        assert_eq!(current.closed_positions[0].deal_id, "C1");
        assert!(current.open_positions.is_empty());

        handle.shutdown().await;
    }
}
