//! The facade the presentation layer drives.
//!
//! Owns the server registry's active selection, the live message log, and
//! the typing indicator. The correlation engine and connection machine are
//! re-initialized whenever the active server changes.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use parley_common::{ClientError, Result, ServerId};

use crate::config::ClientConfig;
use crate::connection::{Connection, ConnectionEvent, ConnectionState, LinkEvent};
use crate::correlate::Correlator;
use crate::protocol::{classify, Envelope, Inbound};
use crate::transport::Connector;
use crate::{Message, Origin};

use super::types::{normalize_url, Server};

pub struct SessionManager {
    servers: Vec<Server>,
    active: Option<ServerId>,
    /// Append-only within a session; cleared on server switch.
    log: Vec<Message>,
    typing: bool,
    correlator: Correlator,
    connection: Connection,
    events: mpsc::Receiver<ConnectionEvent>,
}

impl SessionManager {
    pub fn new(connector: Arc<dyn Connector>, config: ClientConfig) -> Self {
        let (connection, events) = Connection::new(connector, &config);
        let mut manager = Self {
            servers: Vec::new(),
            active: None,
            log: Vec::new(),
            typing: false,
            correlator: Correlator::new(),
            connection,
            events,
        };
        for seed in &config.servers {
            manager.add_server(&seed.name, &seed.url);
        }
        manager
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Register a server. Bare host:port urls get the plain scheme.
    pub fn add_server(&mut self, name: &str, url: &str) -> ServerId {
        let server = Server {
            id: ServerId::new(),
            name: name.trim().to_string(),
            url: normalize_url(url),
        };
        let id = server.id.clone();
        self.servers.push(server);
        id
    }

    /// Drop a server from the registry. Removing the active server tears
    /// the connection down first.
    pub fn remove_server(&mut self, id: &ServerId) {
        if self.active.as_ref() == Some(id) {
            self.connection.disconnect();
            self.active = None;
            self.typing = false;
        }
        self.servers.retain(|s| &s.id != id);
    }

    /// Make a server active: clear the log, start a fresh conversation, and
    /// connect. Unknown ids are reported, not fatal.
    pub fn select_server(&mut self, id: &ServerId) -> Result<()> {
        let server = self
            .servers
            .iter()
            .find(|s| &s.id == id)
            .cloned()
            .ok_or_else(|| ClientError::UnknownServer(id.to_string()))?;

        self.active = Some(server.id.clone());
        self.log.clear();
        self.typing = false;
        self.correlator.reset();
        self.connection.connect(&server.url);
        Ok(())
    }

    /// Explicit user-driven teardown. No reconnect is scheduled.
    pub fn disconnect(&mut self) {
        self.connection.disconnect();
        self.typing = false;
    }

    /// Send user text. A no-op returning `false` when the text is blank, no
    /// server is active, or the connection is not up.
    pub fn submit_text(&mut self, text: &str) -> bool {
        if text.trim().is_empty()
            || self.active.is_none()
            || self.connection.state() != ConnectionState::Connected
        {
            return false;
        }

        let classified = Inbound::Plain {
            text: text.to_string(),
        };
        let message = self
            .correlator
            .enrich(Origin::User, text, &classified, self.log.last());
        let envelope = Envelope {
            text: text.to_string(),
            message_id: message.id.clone(),
            conversation_id: message.conversation_id.clone(),
            sequence: message.sequence,
        };
        self.log.push(message);
        self.typing = true;

        match envelope.encode() {
            Ok(encoded) => {
                if let Err(e) = self.connection.send(&encoded) {
                    debug!(error = %e, "Send failed; message kept in log");
                }
            }
            Err(e) => debug!(error = %e, "Envelope refused; message kept in log"),
        }
        true
    }

    /// Drain pending connection events and fold them into the log and
    /// connection state. The presentation layer calls this on its tick.
    pub async fn pump(&mut self) {
        loop {
            tokio::task::yield_now().await;
            let mut progressed = false;
            while let Ok(event) = self.events.try_recv() {
                progressed = true;
                if let Some(link_event) = self.connection.apply(event) {
                    self.apply_link_event(link_event);
                }
            }
            if !progressed {
                break;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    pub fn log(&self) -> &[Message] {
        &self.log
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    pub fn active_server_id(&self) -> Option<&ServerId> {
        self.active.as_ref()
    }

    pub fn active_server(&self) -> Option<&Server> {
        let active = self.active.as_ref()?;
        self.servers.iter().find(|s| &s.id == active)
    }

    // -----------------------------------------------------------------------
    // Inbound handling
    // -----------------------------------------------------------------------

    fn apply_link_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::Opened => debug!("Link opened"),
            LinkEvent::Frame(text) => {
                self.typing = false;
                let classified = classify(&text);
                let origin = classified.origin();
                let message =
                    self.correlator
                        .enrich(origin, text.as_str(), &classified, self.log.last());
                self.log.push(message);
            }
            LinkEvent::Closed => self.push_system_notice("Connection closed by server"),
            LinkEvent::Failed(reason) => {
                self.push_system_notice(&format!("Connection error: {reason}"));
            }
        }
    }

    fn push_system_notice(&mut self, text: &str) {
        let classified = Inbound::Plain {
            text: text.to_string(),
        };
        let message = self
            .correlator
            .enrich(Origin::System, text, &classified, self.log.last());
        self.log.push(message);
    }
}
