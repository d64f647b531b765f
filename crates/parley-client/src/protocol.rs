//! Wire protocol model: the outbound envelope and one-shot classification of
//! inbound payloads.
//!
//! Classification is pure. Each raw frame is parsed exactly once and the
//! resulting [`Inbound`] value is what every downstream consumer works from;
//! nothing re-parses the payload.

use serde::Serialize;
use serde_json::Value;

use parley_common::ClientError;

use crate::{Origin, ToolCorrelation, ToolStage};

// ---------------------------------------------------------------------------
// Outbound Envelope
// ---------------------------------------------------------------------------

/// Outbound payload wrapping user-submitted text with correlation fields.
/// Field names are the wire names; casing is significant.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub text: String,
    pub message_id: String,
    pub conversation_id: String,
    pub sequence: u64,
}

impl Envelope {
    /// Serialize to the wire JSON. Refuses blank text; callers are expected
    /// to have checked, but the envelope is the last line of defense.
    pub fn encode(&self) -> Result<String, ClientError> {
        if self.text.trim().is_empty() {
            return Err(ClientError::EmptyMessage);
        }
        serde_json::to_string(self).map_err(|e| ClientError::Protocol(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Inbound Classification
// ---------------------------------------------------------------------------

/// Semantic kind of one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Server greeting (`type == "welcome"`).
    Welcome { message: String },
    /// Server farewell (`type == "goodbye"`).
    Goodbye { message: String },
    /// Server-reported failure (`status == "error"`).
    ServerError { message: String },
    /// Tool invocation announced by the agent (`stage == "tool_call"`).
    ToolCall {
        tool: String,
        arguments: Option<Value>,
        tool_call_id: Option<String>,
        status: Option<String>,
    },
    /// Outcome of a tool invocation (`stage == "tool_result"`).
    ToolResult {
        tool: String,
        response: Option<String>,
        execution_info: Option<String>,
        execution_time_ms: Option<u64>,
        tool_call_id: Option<String>,
        status: Option<String>,
    },
    /// Agent prose (`stage` is `"initial_response"` or `"final_response"`).
    Content { text: String },
    /// Anything that is not recognized structured data; raw passthrough.
    Plain { text: String },
}

fn str_field(obj: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Classify one raw inbound payload. Never fails: malformed or partial
/// structured data falls through to [`Inbound::Plain`].
pub fn classify(raw: &str) -> Inbound {
    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(_) => {
            return Inbound::Plain {
                text: raw.to_string(),
            }
        }
    };
    let Some(obj) = value.as_object() else {
        return Inbound::Plain {
            text: raw.to_string(),
        };
    };

    match obj.get("type").and_then(Value::as_str) {
        Some("welcome") => {
            return Inbound::Welcome {
                message: str_field(obj, "message").unwrap_or_default(),
            }
        }
        Some("goodbye") => {
            return Inbound::Goodbye {
                message: str_field(obj, "message").unwrap_or_default(),
            }
        }
        _ => {}
    }

    if obj.get("status").and_then(Value::as_str) == Some("error") {
        let message = str_field(obj, "error")
            .or_else(|| str_field(obj, "message"))
            .unwrap_or_else(|| "unknown error".to_string());
        return Inbound::ServerError { message };
    }

    match obj.get("stage").and_then(Value::as_str) {
        Some("tool_call") => Inbound::ToolCall {
            tool: str_field(obj, "tool").unwrap_or_default(),
            arguments: obj.get("arguments").or_else(|| obj.get("args")).cloned(),
            tool_call_id: str_field(obj, "tool_call_id"),
            status: str_field(obj, "status"),
        },
        Some("tool_result") => Inbound::ToolResult {
            tool: str_field(obj, "tool").unwrap_or_default(),
            response: str_field(obj, "response"),
            execution_info: str_field(obj, "execution_info"),
            execution_time_ms: obj.get("execution_time_ms").and_then(Value::as_u64),
            tool_call_id: str_field(obj, "tool_call_id"),
            status: str_field(obj, "status"),
        },
        Some("initial_response") | Some("final_response") => Inbound::Content {
            text: str_field(obj, "content").unwrap_or_default(),
        },
        _ => Inbound::Plain {
            text: raw.to_string(),
        },
    }
}

impl Inbound {
    /// Human-readable text for display, derived once at classification time.
    pub fn display_text(&self) -> String {
        match self {
            Inbound::Welcome { message } | Inbound::Goodbye { message } => message.clone(),
            Inbound::ServerError { message } => format!("Error: {message}"),
            Inbound::ToolCall { tool, .. } => format!("Using tool: {tool}"),
            Inbound::ToolResult {
                tool,
                response,
                execution_info,
                execution_time_ms,
                ..
            } => {
                let mut lines = vec![format!("Tool: {tool}")];
                if let Some(response) = response {
                    lines.push(format!("Result: {response}"));
                }
                if let Some(info) = execution_info {
                    lines.push(format!("Details: {info}"));
                }
                if let Some(ms) = execution_time_ms {
                    lines.push(format!("Time: {ms}ms"));
                }
                lines.join("\n")
            }
            Inbound::Content { text } | Inbound::Plain { text } => text.clone(),
        }
    }

    /// Which log origin a frame of this kind belongs to. Lifecycle and
    /// error frames are system messages; everything else is the agent.
    pub fn origin(&self) -> Origin {
        match self {
            Inbound::Welcome { .. } | Inbound::Goodbye { .. } | Inbound::ServerError { .. } => {
                Origin::System
            }
            _ => Origin::Agent,
        }
    }

    /// Tool correlation carried by this frame, if any.
    pub fn tool_correlation(&self) -> Option<ToolCorrelation> {
        match self {
            Inbound::ToolCall { tool_call_id, .. } => {
                tool_call_id.as_ref().map(|id| ToolCorrelation {
                    tool_call_id: id.clone(),
                    execution_time_ms: None,
                    stage: ToolStage::Call,
                })
            }
            Inbound::ToolResult {
                tool_call_id,
                execution_time_ms,
                ..
            } => tool_call_id.as_ref().map(|id| ToolCorrelation {
                tool_call_id: id.clone(),
                execution_time_ms: *execution_time_ms,
                stage: ToolStage::Result,
            }),
            _ => None,
        }
    }
}
