//! Client configuration types.

use serde::{Deserialize, Serialize};

/// A server entry seeded into the registry at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSeed {
    pub name: String,
    pub url: String,
}

impl Default for ServerSeed {
    fn default() -> Self {
        Self {
            name: "Local AI Server".into(),
            url: "ws://localhost:8000/ws/ai".into(),
        }
    }
}

/// Session client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Fixed delay before a reconnect attempt, in milliseconds.
    pub reconnect_interval_ms: u64,
    /// How long a dial may take before it is reported as failed.
    pub connect_timeout_secs: u64,
    /// Capacity of the connection event channel.
    pub event_buffer: usize,
    /// Servers available before the user adds any.
    pub servers: Vec<ServerSeed>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            reconnect_interval_ms: 3000,
            connect_timeout_secs: 15,
            event_buffer: 256,
            servers: vec![ServerSeed::default()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.reconnect_interval_ms, 3000);
        assert_eq!(config.connect_timeout_secs, 15);
        assert_eq!(config.event_buffer, 256);
        assert_eq!(config.servers.len(), 1);
        assert_eq!(config.servers[0].url, "ws://localhost:8000/ws/ai");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"reconnect_interval_ms": 500}"#).unwrap();
        assert_eq!(config.reconnect_interval_ms, 500);
        assert_eq!(config.connect_timeout_secs, 15);
        assert_eq!(config.servers.len(), 1);
    }

    #[test]
    fn empty_server_list_is_respected() {
        let config: ClientConfig = serde_json::from_str(r#"{"servers": []}"#).unwrap();
        assert!(config.servers.is_empty());
    }
}
