use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{dedupe_tool_refs, Message, Role, ToolRef};

/// Progress of a tool invocation as reported by the stream.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ToolState {
    Pending,
    Running,
    #[default]
    Complete,
}

/// One typed piece of a message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    Text {
        text: String,
    },
    Reasoning {
        text: String,
    },
    ToolInvocation {
        tool_name: String,
        tool_call_id: String,
        #[serde(default)]
        state: ToolState,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn reasoning(text: impl Into<String>) -> Self {
        Self::Reasoning { text: text.into() }
    }

    pub fn tool(tool_name: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        Self::ToolInvocation {
            tool_name: tool_name.into(),
            tool_call_id: tool_call_id.into(),
            state: ToolState::Complete,
        }
    }
}

/// An event delivered by the generation transport during a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    TextDelta(String),
    ReasoningDelta(String),
    /// A tool call started or changed state.
    ToolInvocation {
        tool_name: String,
        tool_call_id: String,
        state: ToolState,
    },
    /// The turn is over; carries the full set of parts assembled for it.
    Finished { parts: Vec<Part> },
}

/// Parts accumulated for an in-progress assistant turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnState {
    parts: Vec<Part>,
}

impl TurnState {
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<Part> {
        self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Fold one event into the turn.
    ///
    /// Consecutive deltas of the same kind extend the last part; a tool event for
    /// a call already seen updates that part in place. Returns the finished parts
    /// when `event` is terminal.
    pub fn apply(&mut self, event: StreamEvent) -> Option<Vec<Part>> {
        match event {
            StreamEvent::TextDelta(delta) => {
                if let Some(Part::Text { text }) = self.parts.last_mut() {
                    text.push_str(&delta);
                } else {
                    self.parts.push(Part::Text { text: delta });
                }
                None
            }
            StreamEvent::ReasoningDelta(delta) => {
                if let Some(Part::Reasoning { text }) = self.parts.last_mut() {
                    text.push_str(&delta);
                } else {
                    self.parts.push(Part::Reasoning { text: delta });
                }
                None
            }
            StreamEvent::ToolInvocation {
                tool_name,
                tool_call_id,
                state,
            } => {
                let existing = self.parts.iter_mut().find_map(|part| match part {
                    Part::ToolInvocation {
                        tool_name: name,
                        tool_call_id: id,
                        state: current,
                    } if *id == tool_call_id => Some((name, current)),
                    _ => None,
                });

                match existing {
                    Some((name, current)) => {
                        if !tool_name.is_empty() {
                            *name = tool_name;
                        }
                        *current = state;
                    }
                    None => self.parts.push(Part::ToolInvocation {
                        tool_name,
                        tool_call_id,
                        state,
                    }),
                }
                None
            }
            StreamEvent::Finished { parts } => Some(parts),
        }
    }
}

/// All text parts concatenated in order.
pub fn content_of(parts: &[Part]) -> String {
    parts
        .iter()
        .filter_map(|part| match part {
            Part::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

/// All reasoning parts in order, separated by a blank line. Empty if there are none.
pub fn reasoning_of(parts: &[Part]) -> String {
    parts
        .iter()
        .filter_map(|part| match part {
            Part::Reasoning { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Tool calls in first-seen order, one per `tool_call_id`.
pub fn tool_refs_of(parts: &[Part]) -> Vec<ToolRef> {
    dedupe_tool_refs(parts.iter().filter_map(|part| match part {
        Part::ToolInvocation {
            tool_name,
            tool_call_id,
            ..
        } => Some(ToolRef {
            tool_name: tool_name.clone(),
            tool_call_id: tool_call_id.clone(),
        }),
        _ => None,
    }))
}

/// A message as held by an attached chat view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveMessage {
    /// The persisted message id, or a local id for a reply that failed to persist.
    pub id: Uuid,
    pub role: Role,
    pub parts: Vec<Part>,
}

impl LiveMessage {
    /// Rebuild the parts of a persisted message: reasoning first, then each tool
    /// call in order, then the text.
    pub fn from_persisted(message: &Message) -> Self {
        let mut parts = Vec::new();

        if let Some(reasoning) = message.reasoning.as_deref().filter(|r| !r.is_empty()) {
            parts.push(Part::reasoning(reasoning));
        }

        for call in message.tool_calls.iter().flatten() {
            parts.push(Part::tool(&call.tool_name, &call.tool_call_id));
        }

        parts.push(Part::text(&message.content));

        Self {
            id: message.id,
            role: message.role,
            parts,
        }
    }

    /// The message's text parts concatenated.
    pub fn text(&self) -> String {
        content_of(&self.parts)
    }
}
