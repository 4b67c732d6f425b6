//! Owned lifecycle for a streaming price feed.
//!
//! A [`StreamManager`] spawns one worker task that connects through the
//! [`StreamTransport`], keeps the desired symbol set subscribed across
//! reconnects, and fans ticks out to consumers. Callers hold the manager;
//! nothing here lives in module globals.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use log::{debug, error, warn};
use tokio::sync::{broadcast, mpsc};

use crate::errors::MarketDataError;
use crate::models::StreamTick;
use crate::stream::transport::{StreamConnection, StreamEvent, StreamRequest, StreamTransport};

/// Streaming feed configuration.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Reconnect attempts per outage before the feed gives up
    pub max_reconnect_attempts: u32,
    /// Base delay for exponential reconnect backoff; doubles per attempt
    pub reconnect_base_delay: Duration,
    /// Capacity of the broadcast channel handed to tick consumers
    pub tick_buffer: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_reconnect_attempts: 5,
            reconnect_base_delay: Duration::from_secs(1),
            tick_buffer: 256,
        }
    }
}

/// Commands accepted by the worker task.
#[derive(Debug)]
enum StreamCommand {
    Subscribe(Vec<String>),
    Unsubscribe(Vec<String>),
    Disconnect,
}

/// Handle to the streaming worker.
///
/// Subscription calls are fire-and-forget: the worker applies them to its
/// desired set and sends only the delta over the wire. The desired set
/// survives connection loss and is replayed on every (re)connect.
pub struct StreamManager {
    command_tx: mpsc::UnboundedSender<StreamCommand>,
    ticks_tx: broadcast::Sender<StreamTick>,
    last_ticks: Arc<DashMap<String, StreamTick>>,
}

impl StreamManager {
    /// Create the manager and spawn its worker task.
    ///
    /// The worker stays idle until the first subscription arrives; the
    /// transport is only opened while at least one symbol is wanted.
    pub fn new(transport: Arc<dyn StreamTransport>, config: StreamConfig) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (ticks_tx, _) = broadcast::channel(config.tick_buffer.max(1));
        let last_ticks = Arc::new(DashMap::new());

        let worker = StreamWorker {
            transport,
            config,
            ticks: ticks_tx.clone(),
            cache: Arc::clone(&last_ticks),
        };
        tokio::spawn(worker.run(command_rx));

        Self {
            command_tx,
            ticks_tx,
            last_ticks,
        }
    }

    /// Add symbols to the desired subscription set.
    pub fn subscribe(&self, symbols: Vec<String>) -> Result<(), MarketDataError> {
        self.send(StreamCommand::Subscribe(symbols))
    }

    /// Remove symbols from the desired subscription set.
    pub fn unsubscribe(&self, symbols: Vec<String>) -> Result<(), MarketDataError> {
        self.send(StreamCommand::Unsubscribe(symbols))
    }

    /// Close the session and clear the desired set.
    ///
    /// A later `subscribe` starts a fresh connection.
    pub fn disconnect(&self) -> Result<(), MarketDataError> {
        self.send(StreamCommand::Disconnect)
    }

    /// Subscribe to the live tick fan-out.
    pub fn ticks(&self) -> broadcast::Receiver<StreamTick> {
        self.ticks_tx.subscribe()
    }

    /// Last tick seen for a symbol, if any arrived since startup.
    pub fn last_tick(&self, symbol: &str) -> Option<StreamTick> {
        self.last_ticks.get(symbol).map(|entry| entry.clone())
    }

    fn send(&self, command: StreamCommand) -> Result<(), MarketDataError> {
        self.command_tx
            .send(command)
            .map_err(|_| MarketDataError::NotConnected)
    }
}

/// Why a session loop returned.
enum SessionEnd {
    /// Abnormal loss; reconnect with backoff.
    Lost(String),
    /// Disconnect was requested; go idle without retrying.
    Idle,
    /// The manager handle was dropped; stop the worker.
    Shutdown,
}

struct StreamWorker {
    transport: Arc<dyn StreamTransport>,
    config: StreamConfig,
    ticks: broadcast::Sender<StreamTick>,
    cache: Arc<DashMap<String, StreamTick>>,
}

impl StreamWorker {
    async fn run(self, mut commands: mpsc::UnboundedReceiver<StreamCommand>) {
        let mut desired: BTreeSet<String> = BTreeSet::new();
        let mut attempts: u32 = 0;

        loop {
            // Idle until at least one symbol is wanted.
            while desired.is_empty() {
                match commands.recv().await {
                    Some(StreamCommand::Subscribe(symbols)) => desired.extend(symbols),
                    Some(StreamCommand::Unsubscribe(symbols)) => {
                        for symbol in &symbols {
                            desired.remove(symbol);
                        }
                    }
                    Some(StreamCommand::Disconnect) => desired.clear(),
                    None => return,
                }
            }

            let mut conn = match self.transport.open().await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!("stream transport open failed: {}", e);
                    if !self.wait_before_retry(&mut attempts).await {
                        desired.clear();
                        attempts = 0;
                    }
                    continue;
                }
            };
            attempts = 0;

            // Replay the whole desired set on every (re)connect.
            let replay: Vec<String> = desired.iter().cloned().collect();
            debug!("stream connected, replaying {} subscriptions", replay.len());
            if conn
                .requests
                .send(StreamRequest::Subscribe(replay))
                .await
                .is_err()
            {
                warn!("stream dropped before subscriptions were replayed");
                if !self.wait_before_retry(&mut attempts).await {
                    desired.clear();
                    attempts = 0;
                }
                continue;
            }

            match self.run_session(&mut conn, &mut commands, &mut desired).await {
                SessionEnd::Lost(reason) => {
                    warn!("stream connection lost: {}", reason);
                    if !self.wait_before_retry(&mut attempts).await {
                        desired.clear();
                        attempts = 0;
                    }
                }
                SessionEnd::Idle => {
                    debug!("stream disconnected");
                    attempts = 0;
                }
                SessionEnd::Shutdown => return,
            }
        }
    }

    async fn run_session(
        &self,
        conn: &mut StreamConnection,
        commands: &mut mpsc::UnboundedReceiver<StreamCommand>,
        desired: &mut BTreeSet<String>,
    ) -> SessionEnd {
        loop {
            tokio::select! {
                event = conn.events.recv() => match event {
                    Some(StreamEvent::Tick(tick)) => {
                        self.cache.insert(tick.symbol.clone(), tick.clone());
                        // Err only means nobody is listening right now.
                        let _ = self.ticks.send(tick);
                    }
                    Some(StreamEvent::Closed { reason }) => return SessionEnd::Lost(reason),
                    None => return SessionEnd::Lost("transport dropped".to_string()),
                },
                cmd = commands.recv() => match cmd {
                    Some(StreamCommand::Subscribe(symbols)) => {
                        let added: Vec<String> = symbols
                            .into_iter()
                            .filter(|symbol| desired.insert(symbol.clone()))
                            .collect();
                        if !added.is_empty()
                            && conn.requests.send(StreamRequest::Subscribe(added)).await.is_err()
                        {
                            return SessionEnd::Lost("request channel closed".to_string());
                        }
                    }
                    Some(StreamCommand::Unsubscribe(symbols)) => {
                        let removed: Vec<String> = symbols
                            .into_iter()
                            .filter(|symbol| desired.remove(symbol))
                            .collect();
                        if !removed.is_empty()
                            && conn.requests.send(StreamRequest::Unsubscribe(removed)).await.is_err()
                        {
                            return SessionEnd::Lost("request channel closed".to_string());
                        }
                    }
                    Some(StreamCommand::Disconnect) => {
                        desired.clear();
                        return SessionEnd::Idle;
                    }
                    None => return SessionEnd::Shutdown,
                },
            }
        }
    }

    /// Sleep out the backoff before the next attempt.
    ///
    /// Returns `false` once the retry budget for this outage is spent.
    async fn wait_before_retry(&self, attempts: &mut u32) -> bool {
        if *attempts >= self.config.max_reconnect_attempts {
            error!(
                "stream gave up after {} reconnect attempts",
                self.config.max_reconnect_attempts
            );
            return false;
        }
        let delay = self.config.reconnect_base_delay * 2u32.saturating_pow(*attempts);
        *attempts += 1;
        warn!(
            "stream reconnecting in {:?} (attempt {}/{})",
            delay, attempts, self.config.max_reconnect_attempts
        );
        tokio::time::sleep(delay).await;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    /// Transport that hands out pre-built connections in order and counts
    /// every open attempt.
    struct ScriptedTransport {
        connections: Mutex<VecDeque<StreamConnection>>,
        opens: AtomicUsize,
    }

    impl ScriptedTransport {
        fn new(connections: Vec<StreamConnection>) -> Self {
            Self {
                connections: Mutex::new(connections.into()),
                opens: AtomicUsize::new(0),
            }
        }

        fn open_count(&self) -> usize {
            self.opens.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StreamTransport for ScriptedTransport {
        async fn open(&self) -> Result<StreamConnection, MarketDataError> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            self.connections
                .lock()
                .unwrap()
                .pop_front()
                .ok_or(MarketDataError::NotConnected)
        }
    }

    /// Build a connection plus the test-side ends of its channels.
    fn scripted_connection() -> (
        StreamConnection,
        mpsc::Receiver<StreamRequest>,
        mpsc::Sender<StreamEvent>,
    ) {
        let (req_tx, req_rx) = mpsc::channel(16);
        let (event_tx, event_rx) = mpsc::channel(16);
        let conn = StreamConnection {
            requests: req_tx,
            events: event_rx,
        };
        (conn, req_rx, event_tx)
    }

    fn fast_config() -> StreamConfig {
        StreamConfig {
            max_reconnect_attempts: 2,
            reconnect_base_delay: Duration::from_millis(1),
            tick_buffer: 16,
        }
    }

    async fn recv_request(rx: &mut mpsc::Receiver<StreamRequest>) -> StreamRequest {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for stream request")
            .expect("request channel closed")
    }

    fn tick(symbol: &str) -> StreamTick {
        StreamTick {
            symbol: symbol.to_string(),
            price: dec!(101.5),
            timestamp: Utc::now(),
            volume: None,
        }
    }

    #[tokio::test]
    async fn test_subscribe_sends_only_new_symbols() {
        let (conn, mut req_rx, _event_tx) = scripted_connection();
        let transport = Arc::new(ScriptedTransport::new(vec![conn]));
        let manager = StreamManager::new(transport, fast_config());

        manager
            .subscribe(vec!["AAPL".to_string(), "MSFT".to_string()])
            .unwrap();
        assert_eq!(
            recv_request(&mut req_rx).await,
            StreamRequest::Subscribe(vec!["AAPL".to_string(), "MSFT".to_string()])
        );

        // AAPL is already subscribed, only GOOG goes over the wire.
        manager
            .subscribe(vec!["AAPL".to_string(), "GOOG".to_string()])
            .unwrap();
        assert_eq!(
            recv_request(&mut req_rx).await,
            StreamRequest::Subscribe(vec!["GOOG".to_string()])
        );

        // TSLA was never subscribed, only MSFT is dropped.
        manager
            .unsubscribe(vec!["MSFT".to_string(), "TSLA".to_string()])
            .unwrap();
        assert_eq!(
            recv_request(&mut req_rx).await,
            StreamRequest::Unsubscribe(vec!["MSFT".to_string()])
        );
    }

    #[tokio::test]
    async fn test_reconnect_replays_desired_set() {
        let (conn1, mut req_rx1, event_tx1) = scripted_connection();
        let (conn2, mut req_rx2, _event_tx2) = scripted_connection();
        let transport = Arc::new(ScriptedTransport::new(vec![conn1, conn2]));
        let manager = StreamManager::new(Arc::clone(&transport) as Arc<dyn StreamTransport>, fast_config());

        manager.subscribe(vec!["AAPL".to_string()]).unwrap();
        assert_eq!(
            recv_request(&mut req_rx1).await,
            StreamRequest::Subscribe(vec!["AAPL".to_string()])
        );

        event_tx1
            .send(StreamEvent::Closed {
                reason: "server went away".to_string(),
            })
            .await
            .unwrap();

        // The replacement session gets the full desired set again.
        assert_eq!(
            recv_request(&mut req_rx2).await,
            StreamRequest::Subscribe(vec!["AAPL".to_string()])
        );
        assert_eq!(transport.open_count(), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_retry_budget_then_rearms() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let manager = StreamManager::new(Arc::clone(&transport) as Arc<dyn StreamTransport>, fast_config());

        manager.subscribe(vec!["AAPL".to_string()]).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        // initial attempt plus two retries
        assert_eq!(transport.open_count(), 3);

        // A fresh subscribe starts a new attempt cycle.
        manager.subscribe(vec!["MSFT".to_string()]).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(transport.open_count(), 6);
    }

    #[tokio::test]
    async fn test_ticks_reach_cache_and_broadcast() {
        let (conn, mut req_rx, event_tx) = scripted_connection();
        let transport = Arc::new(ScriptedTransport::new(vec![conn]));
        let manager = StreamManager::new(transport, fast_config());
        let mut ticks = manager.ticks();

        manager.subscribe(vec!["NVDA".to_string()]).unwrap();
        recv_request(&mut req_rx).await;

        event_tx.send(StreamEvent::Tick(tick("NVDA"))).await.unwrap();

        let received = tokio::time::timeout(Duration::from_secs(1), ticks.recv())
            .await
            .expect("timed out waiting for tick")
            .expect("tick channel closed");
        assert_eq!(received.symbol, "NVDA");
        assert_eq!(received.price, dec!(101.5));

        // Cache is written before the broadcast goes out.
        let cached = manager.last_tick("NVDA").expect("tick should be cached");
        assert_eq!(cached.price, dec!(101.5));
        assert!(manager.last_tick("AAPL").is_none());
    }

    #[tokio::test]
    async fn test_disconnect_clears_desired_set() {
        let (conn1, mut req_rx1, _event_tx1) = scripted_connection();
        let (conn2, mut req_rx2, _event_tx2) = scripted_connection();
        let transport = Arc::new(ScriptedTransport::new(vec![conn1, conn2]));
        let manager = StreamManager::new(transport, fast_config());

        manager.subscribe(vec!["AAPL".to_string()]).unwrap();
        recv_request(&mut req_rx1).await;

        manager.disconnect().unwrap();

        // After a disconnect the old set is gone; only MSFT is replayed.
        manager.subscribe(vec!["MSFT".to_string()]).unwrap();
        assert_eq!(
            recv_request(&mut req_rx2).await,
            StreamRequest::Subscribe(vec!["MSFT".to_string()])
        );
    }
}
