//! Correlation engine: assigns identity, sequence, parent linkage, and
//! conversation/tool-group membership to every message entering the log.

use std::collections::HashMap;

use parley_common::new_id;

use crate::protocol::Inbound;
use crate::{Message, Origin};

/// Owns id and sequence generation for the active conversation. Has no
/// transport access; purely in-memory state.
pub struct Correlator {
    /// Open conversation, if any. Lazily created on the first enrichment.
    conversation_id: Option<String>,
    /// Next sequence number, per conversation.
    next_sequence: u64,
}

impl Correlator {
    pub fn new() -> Self {
        Self {
            conversation_id: None,
            next_sequence: 0,
        }
    }

    /// Build a fully-populated [`Message`] from a classified payload.
    ///
    /// Opens a conversation if none is open. `previous_last` is the log's
    /// last entry at enrichment time; Agent messages are chained to it via
    /// `parent_id` (a linear chain, not a call tree).
    pub fn enrich(
        &mut self,
        origin: Origin,
        raw: impl Into<String>,
        classified: &Inbound,
        previous_last: Option<&Message>,
    ) -> Message {
        let conversation_id = self
            .conversation_id
            .get_or_insert_with(new_id)
            .clone();
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let parent_id = match origin {
            Origin::Agent => previous_last.map(|m| m.id.clone()),
            _ => None,
        };

        Message {
            id: new_id(),
            conversation_id,
            parent_id,
            sequence,
            origin,
            timestamp: chrono::Utc::now(),
            raw: raw.into(),
            text: classified.display_text(),
            tool: classified.tool_correlation(),
        }
    }

    /// Close the current conversation and zero the sequence counter. The
    /// next `enrich` opens a fresh conversation.
    pub fn reset(&mut self) {
        self.conversation_id = None;
        self.next_sequence = 0;
    }

    /// Id of the open conversation, if one is open.
    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new()
    }
}

/// Partition messages into buckets keyed by `tool_call_id`. Messages without
/// a tool correlation appear in no bucket. Stateless; used by the
/// presentation layer to pair tool calls with their results.
pub fn group_by_tool(messages: &[Message]) -> HashMap<String, Vec<&Message>> {
    let mut groups: HashMap<String, Vec<&Message>> = HashMap::new();
    for message in messages {
        if let Some(tool) = &message.tool {
            groups
                .entry(tool.tool_call_id.clone())
                .or_default()
                .push(message);
        }
    }
    groups
}
