//! Transport seam for streaming feeds.
//!
//! The manager owns reconnection, subscription bookkeeping, and caching; a
//! transport only knows how to open one session and shuttle frames. Tests
//! drive the manager through a scripted transport, production wires in a
//! WebSocket-backed one.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::errors::MarketDataError;
use crate::models::StreamTick;

/// Outbound frames the manager sends over an open session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamRequest {
    Subscribe(Vec<String>),
    Unsubscribe(Vec<String>),
}

/// Inbound events a session delivers to the manager.
#[derive(Clone, Debug)]
pub enum StreamEvent {
    Tick(StreamTick),
    /// The session ended abnormally; the manager decides whether to reconnect.
    Closed { reason: String },
}

/// One open streaming session.
///
/// Dropping either channel end counts as a connection loss.
pub struct StreamConnection {
    pub requests: mpsc::Sender<StreamRequest>,
    pub events: mpsc::Receiver<StreamEvent>,
}

/// Factory for streaming sessions.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// Open a fresh session to the feed.
    async fn open(&self) -> Result<StreamConnection, MarketDataError>;
}
