//! Chat client core for Parley.
//!
//! Maintains a WebSocket connection to a conversational-AI server and
//! reconstructs a structured conversation from the inbound frame stream:
//! - Wire protocol model with one-shot classification of inbound payloads
//! - Correlation of messages into conversations and tool-call groups
//! - Connection state machine with auto-reconnect
//! - Session manager facade driven by the presentation layer

pub mod config;
pub mod connection;
pub mod correlate;
pub mod protocol;
pub mod session;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

use serde::{Deserialize, Serialize};

pub use config::{ClientConfig, ServerSeed};
pub use connection::{Connection, ConnectionState, LinkEvent};
pub use correlate::{group_by_tool, Correlator};
pub use protocol::{classify, Envelope, Inbound};
pub use session::{Server, SessionManager};
pub use transport::{Connector, Transport, WsConnector};

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    User,
    Agent,
    System,
}

/// Which half of a tool exchange a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStage {
    Call,
    Result,
}

/// Links a message to its tool exchange. Two messages sharing a
/// `tool_call_id` (one call, one result) form a complete group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCorrelation {
    pub tool_call_id: String,
    pub execution_time_ms: Option<u64>,
    pub stage: ToolStage,
}

/// One enriched log entry. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    /// Id of the message that was last in the log when this one was
    /// enriched. Only set for Agent messages; a linear chain, not a tree.
    pub parent_id: Option<String>,
    /// Strictly increasing within one conversation, never reused.
    pub sequence: u64,
    pub origin: Origin,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// The payload exactly as it crossed the wire.
    pub raw: String,
    /// Display text derived from the classified payload.
    pub text: String,
    pub tool: Option<ToolCorrelation>,
}
