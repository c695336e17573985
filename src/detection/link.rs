//! DetectionLink: WebSocket client for the live detection channel
//!
//! Owns the full lifecycle of the event connection: connect, receive,
//! auto-reconnect, disconnect. The sensing backend is a LAN-local
//! companion device, so the reconnect policy is deliberately a fixed delay
//! retried forever rather than exponential backoff.
//!
//! Subscribers observe two broadcast streams: canonical detection events
//! and connection state transitions. Malformed payloads are dropped and
//! logged; transport failures surface as an Error state and are retried,
//! never raised as a fatal condition.

use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use futures::StreamExt;
use log::{info, warn};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::config::LinkConfig;
use crate::detection::event::{DetectionEvent, RawDetectionEvent};
use crate::error::LinkError;

/// Connection state of the detection event channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error(String),
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Why the message pump stopped.
enum PumpExit {
    Shutdown,
    Closed(String),
}

/// Running link worker: shutdown signal plus the spawned task.
struct LinkWorker {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Client for the detection event channel.
///
/// `connect()` spawns a background worker and returns immediately; the
/// worker keeps the channel alive until `disconnect()`. Each transport
/// failure schedules exactly one reconnect attempt after the configured
/// delay.
pub struct DetectionLink {
    endpoint: String,
    reconnect_delay: Duration,
    events_tx: broadcast::Sender<DetectionEvent>,
    state_tx: broadcast::Sender<ConnectionState>,
    state: Arc<RwLock<ConnectionState>>,
    worker: Mutex<Option<LinkWorker>>,
}

impl DetectionLink {
    /// Create a link for the configured endpoint. No connection is made
    /// until `connect()`.
    pub fn new(config: &LinkConfig) -> Self {
        // 100-message buffer absorbs bursts from the 10 Hz detection feed
        // without lagging subscribers during a slow UI frame.
        let (events_tx, _) = broadcast::channel(100);
        let (state_tx, _) = broadcast::channel(32);
        Self {
            endpoint: config.event_endpoint.clone(),
            reconnect_delay: Duration::from_millis(config.reconnect_delay_ms),
            events_tx,
            state_tx,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            worker: Mutex::new(None),
        }
    }

    fn lock_worker(&self) -> Result<std::sync::MutexGuard<'_, Option<LinkWorker>>, LinkError> {
        self.worker.lock().map_err(|_| LinkError::LockPoisoned {
            component: "detection_link".to_string(),
        })
    }

    /// Establish the event channel.
    ///
    /// Spawns the connection worker and returns without blocking. The
    /// worker publishes Connecting/Connected/Error transitions and retries
    /// failed connections after the fixed reconnect delay until
    /// `disconnect()`.
    ///
    /// # Errors
    /// - `LinkError::AlreadyConnected` if a worker is already running
    /// - `LinkError::LockPoisoned` on lock failure
    pub fn connect(&self) -> Result<(), LinkError> {
        let mut guard = self.lock_worker()?;
        if guard.is_some() {
            return Err(LinkError::AlreadyConnected);
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run_link(
            self.endpoint.clone(),
            self.reconnect_delay,
            self.events_tx.clone(),
            self.state_tx.clone(),
            Arc::clone(&self.state),
            shutdown_rx,
        ));

        *guard = Some(LinkWorker {
            shutdown_tx,
            handle,
        });
        Ok(())
    }

    /// Tear down the event channel.
    ///
    /// Cancels any pending reconnect timer, closes the socket, and waits
    /// for the worker to finish so the channel is released on return.
    ///
    /// # Errors
    /// - `LinkError::NotConnected` if no worker is running
    /// - `LinkError::LockPoisoned` on lock failure
    pub async fn disconnect(&self) -> Result<(), LinkError> {
        let worker = {
            let mut guard = self.lock_worker()?;
            guard.take()
        };
        let Some(worker) = worker else {
            return Err(LinkError::NotConnected);
        };

        let _ = worker.shutdown_tx.send(true);
        let _ = worker.handle.await;
        Ok(())
    }

    /// Current connection state snapshot.
    pub fn state(&self) -> ConnectionState {
        self.state
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_else(|_| ConnectionState::Error("state lock poisoned".to_string()))
    }

    /// Subscribe to canonical detection events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<DetectionEvent> {
        self.events_tx.subscribe()
    }

    /// Stream of canonical detection events for stream-oriented
    /// consumers. Lagged messages are skipped rather than ending the
    /// stream.
    pub fn events_stream(&self) -> impl futures::Stream<Item = DetectionEvent> {
        tokio_stream::StreamExt::filter_map(
            tokio_stream::wrappers::BroadcastStream::new(self.events_tx.subscribe()),
            |item| item.ok(),
        )
    }

    /// Subscribe to connection state transitions.
    pub fn subscribe_state(&self) -> broadcast::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }
}

impl Drop for DetectionLink {
    fn drop(&mut self) {
        // Signal the worker on every exit path; the select loops make the
        // shutdown take effect even mid-reconnect-delay.
        if let Ok(mut guard) = self.worker.lock() {
            if let Some(worker) = guard.take() {
                let _ = worker.shutdown_tx.send(true);
            }
        }
    }
}

fn set_state(
    state: &Arc<RwLock<ConnectionState>>,
    state_tx: &broadcast::Sender<ConnectionState>,
    next: ConnectionState,
) {
    if let Ok(mut guard) = state.write() {
        *guard = next.clone();
    }
    let _ = state_tx.send(next);
}

/// Connection worker: connect, pump, reconnect after the fixed delay.
async fn run_link(
    endpoint: String,
    reconnect_delay: Duration,
    events_tx: broadcast::Sender<DetectionEvent>,
    state_tx: broadcast::Sender<ConnectionState>,
    state: Arc<RwLock<ConnectionState>>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        set_state(&state, &state_tx, ConnectionState::Connecting);

        let attempt = tokio::select! {
            result = connect_async(endpoint.as_str()) => Some(result),
            _ = shutdown_rx.changed() => None,
        };
        let Some(attempt) = attempt else {
            break;
        };

        match attempt {
            Ok((ws, _response)) => {
                info!("[DetectionLink] Connected to {}", endpoint);
                set_state(&state, &state_tx, ConnectionState::Connected);
                match pump_messages(ws, &events_tx, &mut shutdown_rx).await {
                    PumpExit::Shutdown => break,
                    PumpExit::Closed(reason) => {
                        warn!("[DetectionLink] Channel lost: {}", reason);
                        set_state(&state, &state_tx, ConnectionState::Error(reason));
                    }
                }
            }
            Err(err) => {
                warn!("[DetectionLink] Connect to {} failed: {}", endpoint, err);
                set_state(&state, &state_tx, ConnectionState::Error(err.to_string()));
            }
        }

        // Exactly one reconnect attempt per failure, after the fixed
        // delay. disconnect() lands here too and cancels the wait.
        tokio::select! {
            _ = tokio::time::sleep(reconnect_delay) => {}
            _ = shutdown_rx.changed() => break,
        }
    }

    set_state(&state, &state_tx, ConnectionState::Disconnected);
}

/// Receive frames until the channel drops or shutdown is signalled.
async fn pump_messages(
    mut ws: WsStream,
    events_tx: &broadcast::Sender<DetectionEvent>,
    shutdown_rx: &mut watch::Receiver<bool>,
) -> PumpExit {
    loop {
        tokio::select! {
            message = ws.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<RawDetectionEvent>(&text) {
                        Ok(raw) => {
                            // Nobody listening is fine; history lives in
                            // the normalizer, not here.
                            let _ = events_tx.send(raw.canonicalize());
                        }
                        Err(err) => {
                            warn!("[DetectionLink] Dropping malformed payload: {}", err);
                        }
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    let reason = match frame {
                        Some(frame) => format!("closed by server: {}", frame.reason),
                        None => "closed by server".to_string(),
                    };
                    return PumpExit::Closed(reason);
                }
                // Pings are answered by the protocol layer; binary frames
                // carry nothing we decode.
                Some(Ok(_)) => {}
                Some(Err(err)) => return PumpExit::Closed(err.to_string()),
                None => return PumpExit::Closed("event channel ended".to_string()),
            },
            _ = shutdown_rx.changed() => {
                let _ = ws.close(None).await;
                return PumpExit::Shutdown;
            }
        }
    }
}
