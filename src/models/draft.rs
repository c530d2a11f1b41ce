use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A candidate piece of content extracted from an assistant reply.
///
/// Drafts are created in extraction order, one per parsed draft block, and are
/// not edited afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Draft {
    pub id: Uuid,
    pub session_id: Uuid,
    pub title: String,
    pub content: String,
    /// The angle the draft takes (e.g. "Contrarian", "Story-driven").
    pub strategy: String,
    pub word_count: u32,
    pub version: u32,
    pub is_selected: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDraftInput {
    pub title: String,
    pub content: String,
    pub strategy: String,
    /// Computed from `content` when not provided.
    #[serde(default)]
    pub word_count: Option<u32>,
}
