//! In-memory transport doubles for exercising the connection machine and
//! session manager without sockets.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use parley_common::TransportError;

use crate::transport::{Connector, Transport};

#[derive(Default)]
struct FakeShared {
    attempts: Mutex<Vec<String>>,
    handles: Mutex<Vec<FakeHandle>>,
    fail: AtomicUsize,
    hang: AtomicUsize,
}

/// Scriptable connector. Each successful dial leaves behind a [`FakeHandle`]
/// the test drives the server side through.
#[derive(Clone, Default)]
pub(crate) struct FakeConnector {
    inner: Arc<FakeShared>,
}

impl FakeConnector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn clone_arc(&self) -> Arc<dyn Connector> {
        Arc::new(self.clone())
    }

    /// Urls dialed so far, in order.
    pub(crate) fn attempts(&self) -> Vec<String> {
        self.inner.attempts.lock().unwrap().clone()
    }

    /// Make the next `n` dials fail immediately.
    pub(crate) fn fail_next_connects(&self, n: usize) {
        self.inner.fail.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` dials hang forever (exercises the dial timeout).
    pub(crate) fn hang_next_connects(&self, n: usize) {
        self.inner.hang.store(n, Ordering::SeqCst);
    }

    /// Handle for the most recent live transport.
    pub(crate) fn handle(&self) -> FakeHandle {
        self.inner
            .handles
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no live fake transport")
    }

    /// Remove and return the most recent handle; dropping it closes the
    /// transport cleanly.
    pub(crate) fn take_handle(&self) -> FakeHandle {
        self.inner
            .handles
            .lock()
            .unwrap()
            .pop()
            .expect("no live fake transport")
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>, TransportError> {
        self.inner.attempts.lock().unwrap().push(url.to_string());

        if decrement(&self.inner.hang) {
            std::future::pending::<()>().await;
            unreachable!();
        }
        if decrement(&self.inner.fail) {
            return Err(TransportError::ConnectFailed("connection refused".into()));
        }

        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let sent = Arc::new(Mutex::new(Vec::new()));
        self.inner.handles.lock().unwrap().push(FakeHandle {
            inbound_tx,
            sent: Arc::clone(&sent),
        });
        Ok(Box::new(FakeTransport { inbound_rx, sent }))
    }
}

fn decrement(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// Test-side handle to one fake transport.
#[derive(Clone)]
pub(crate) struct FakeHandle {
    inbound_tx: mpsc::UnboundedSender<Result<String, TransportError>>,
    sent: Arc<Mutex<Vec<String>>>,
}

impl FakeHandle {
    /// Deliver an inbound frame.
    pub(crate) fn push(&self, text: &str) {
        let _ = self.inbound_tx.send(Ok(text.to_string()));
    }

    /// Deliver a transport error, then end the stream.
    pub(crate) fn fail(self, error: TransportError) {
        let _ = self.inbound_tx.send(Err(error));
    }

    /// Close the transport cleanly. Only meaningful on a handle obtained
    /// via `take_handle`, which holds the last sender.
    pub(crate) fn close(self) {
        drop(self);
    }

    /// Payloads the client has transmitted on this transport.
    pub(crate) fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

struct FakeTransport {
    inbound_rx: mpsc::UnboundedReceiver<Result<String, TransportError>>,
    sent: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&mut self, text: &str) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn next(&mut self) -> Option<Result<String, TransportError>> {
        self.inbound_rx.recv().await
    }

    async fn close(&mut self) {}
}
