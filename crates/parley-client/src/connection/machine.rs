//! The connection state machine and its background IO task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use parley_common::ClientError;

use crate::config::ClientConfig;
use crate::transport::Connector;

use super::types::{ConnectionEvent, ConnectionState, LinkEvent};

/// Live pairing of an IO task with its outbound command channel.
struct Link {
    outbound_tx: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

/// Drives `Disconnected -> Connecting -> Connected` and the reconnect policy.
/// All mutation happens on the caller's task; IO tasks and timers only feed
/// events back through the channel handed out by [`Connection::new`].
pub struct Connection {
    connector: Arc<dyn Connector>,
    reconnect_interval: Duration,
    connect_timeout: Duration,
    state: ConnectionState,
    event_tx: mpsc::Sender<ConnectionEvent>,
    /// Address retried while a server stays selected. Cleared by
    /// `disconnect`, which makes `Disconnected` terminal.
    url: Option<String>,
    link: Option<Link>,
    retry: Option<JoinHandle<()>>,
    /// Bumped on every `connect`; events stamped with an older generation
    /// belong to a superseded attempt and are dropped.
    generation: u64,
}

impl Connection {
    /// Create the machine and the event stream its tasks report through.
    pub fn new(
        connector: Arc<dyn Connector>,
        config: &ClientConfig,
    ) -> (Self, mpsc::Receiver<ConnectionEvent>) {
        let (event_tx, event_rx) = mpsc::channel(config.event_buffer);
        let machine = Self {
            connector,
            reconnect_interval: Duration::from_millis(config.reconnect_interval_ms),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            state: ConnectionState::Disconnected,
            event_tx,
            url: None,
            link: None,
            retry: None,
            generation: 0,
        };
        (machine, event_rx)
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Open a connection to `url`. Any live connection and any pending
    /// retry are torn down first; the state moves to `Connecting` before
    /// this returns.
    pub fn connect(&mut self, url: &str) {
        self.teardown();
        self.generation += 1;
        self.url = Some(url.to_string());
        self.state = ConnectionState::Connecting;
        info!(url = %url, "Connecting");

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(io_task(
            Arc::clone(&self.connector),
            url.to_string(),
            self.generation,
            self.connect_timeout,
            self.event_tx.clone(),
            outbound_rx,
        ));
        self.link = Some(Link { outbound_tx, task });
    }

    /// Explicit teardown. No retry is scheduled; `Disconnected` is terminal
    /// until the next `connect`.
    pub fn disconnect(&mut self) {
        self.teardown();
        self.url = None;
        self.state = ConnectionState::Disconnected;
        info!("Disconnected");
    }

    /// Transmit an encoded payload. Only valid while `Connected`; anything
    /// else is reported, never fatal.
    pub fn send(&mut self, text: &str) -> Result<(), ClientError> {
        if self.state != ConnectionState::Connected {
            return Err(ClientError::NotConnected);
        }
        let link = self.link.as_ref().ok_or(ClientError::NotConnected)?;
        link.outbound_tx
            .send(text.to_string())
            .map_err(|_| ClientError::NotConnected)
    }

    /// Apply one event from the IO/timer channel. Returns the link event
    /// the session manager should react to, if any.
    pub(crate) fn apply(&mut self, event: ConnectionEvent) -> Option<LinkEvent> {
        if event.generation() != self.generation {
            debug!(generation = event.generation(), "Dropping stale connection event");
            return None;
        }

        match event {
            ConnectionEvent::Opened { .. } => {
                self.state = ConnectionState::Connected;
                info!("Connected");
                Some(LinkEvent::Opened)
            }
            ConnectionEvent::Frame { text, .. } => Some(LinkEvent::Frame(text)),
            ConnectionEvent::Closed { .. } => {
                self.link = None;
                self.state = ConnectionState::Disconnected;
                self.schedule_retry();
                Some(LinkEvent::Closed)
            }
            ConnectionEvent::Failed { reason, .. } => {
                warn!(reason = %reason, "Connection failed");
                self.link = None;
                self.state = ConnectionState::Error;
                self.schedule_retry();
                Some(LinkEvent::Failed(reason))
            }
            ConnectionEvent::RetryDue { .. } => {
                self.retry = None;
                if let Some(url) = self.url.clone() {
                    self.connect(&url);
                }
                None
            }
        }
    }

    /// Schedule one reconnect attempt after the fixed interval. At most one
    /// timer is pending at a time.
    fn schedule_retry(&mut self) {
        if self.url.is_none() || self.retry.is_some() {
            return;
        }
        let generation = self.generation;
        let delay = self.reconnect_interval;
        let event_tx = self.event_tx.clone();
        info!(delay_ms = delay.as_millis() as u64, "Scheduling reconnect");
        self.retry = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = event_tx.send(ConnectionEvent::RetryDue { generation }).await;
        }));
    }

    /// Cancel the live IO task and any pending retry before acquiring new
    /// resources. Nothing survives past this call.
    fn teardown(&mut self) {
        if let Some(link) = self.link.take() {
            link.task.abort();
        }
        if let Some(retry) = self.retry.take() {
            retry.abort();
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Background task owning one transport: dial, then shuttle frames in and
/// commands out until either side ends the connection.
async fn io_task(
    connector: Arc<dyn Connector>,
    url: String,
    generation: u64,
    connect_timeout: Duration,
    event_tx: mpsc::Sender<ConnectionEvent>,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
) {
    let mut transport = match tokio::time::timeout(connect_timeout, connector.connect(&url)).await
    {
        Ok(Ok(transport)) => transport,
        Ok(Err(e)) => {
            let _ = event_tx
                .send(ConnectionEvent::Failed {
                    generation,
                    reason: e.to_string(),
                })
                .await;
            return;
        }
        Err(_elapsed) => {
            let reason =
                parley_common::TransportError::ConnectTimeout(connect_timeout.as_secs());
            let _ = event_tx
                .send(ConnectionEvent::Failed {
                    generation,
                    reason: reason.to_string(),
                })
                .await;
            return;
        }
    };

    let _ = event_tx.send(ConnectionEvent::Opened { generation }).await;

    loop {
        tokio::select! {
            outbound = outbound_rx.recv() => match outbound {
                Some(text) => {
                    if let Err(e) = transport.send(&text).await {
                        let _ = event_tx
                            .send(ConnectionEvent::Failed { generation, reason: e.to_string() })
                            .await;
                        return;
                    }
                }
                None => {
                    // Machine dropped the link; close and go quietly.
                    transport.close().await;
                    return;
                }
            },
            frame = transport.next() => match frame {
                Some(Ok(text)) => {
                    let _ = event_tx
                        .send(ConnectionEvent::Frame { generation, text })
                        .await;
                }
                Some(Err(e)) => {
                    let _ = event_tx
                        .send(ConnectionEvent::Failed { generation, reason: e.to_string() })
                        .await;
                    return;
                }
                None => {
                    let _ = event_tx.send(ConnectionEvent::Closed { generation }).await;
                    return;
                }
            },
        }
    }
}
