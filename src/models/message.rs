use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted conversation message.
///
/// Messages are immutable once written. Within a session they form an
/// append-only sequence where insertion order is display order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub session_id: Uuid,
    pub role: Role,
    pub content: String,
    /// Which agent produced an assistant message.
    pub agent: Option<Agent>,
    /// Model reasoning that accompanied the reply, if any.
    pub reasoning: Option<String>,
    /// Tools invoked while producing the reply, unique by `tool_call_id`.
    pub tool_calls: Option<Vec<ToolRef>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

/// The agent behind an assistant message.
///
/// - `Orchestrator`: Conversational replies (questions, clarifications)
/// - `Writer`: Replies that produced drafts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Agent {
    Orchestrator,
    Writer,
}

impl Agent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Orchestrator => "orchestrator",
            Self::Writer => "writer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "orchestrator" => Some(Self::Orchestrator),
            "writer" => Some(Self::Writer),
            _ => None,
        }
    }
}

/// Reference to a tool invocation made during an assistant turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolRef {
    pub tool_name: String,
    pub tool_call_id: String,
}

/// Drop repeated tool calls, keeping the first occurrence of each `tool_call_id`.
pub fn dedupe_tool_refs(refs: impl IntoIterator<Item = ToolRef>) -> Vec<ToolRef> {
    let mut seen = HashSet::new();
    refs.into_iter()
        .filter(|r| seen.insert(r.tool_call_id.clone()))
        .collect()
}

/// Input for appending a message to a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendMessageInput {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub agent: Option<Agent>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolRef>>,
}

impl AppendMessageInput {
    /// A plain user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            agent: None,
            reasoning: None,
            tool_calls: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(name: &str, id: &str) -> ToolRef {
        ToolRef {
            tool_name: name.to_string(),
            tool_call_id: id.to_string(),
        }
    }

    #[test]
    fn dedupe_keeps_first_occurrence_in_order() {
        let refs = vec![
            tool("search", "a"),
            tool("outline", "b"),
            tool("search-again", "a"),
        ];

        let deduped = dedupe_tool_refs(refs);
        assert_eq!(deduped, vec![tool("search", "a"), tool("outline", "b")]);
    }

    #[test]
    fn role_round_trips_through_str() {
        assert_eq!(Role::from_str(Role::Assistant.as_str()), Some(Role::Assistant));
        assert_eq!(Role::from_str("system"), None);
    }
}
