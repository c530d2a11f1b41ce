use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title every session starts with until the first user turn renames it.
pub const DEFAULT_SESSION_TITLE: &str = "New Session";

/// A writing session.
///
/// Sessions are created once per writing task and are never deleted. The title is
/// replaced from the first user turn while it still equals
/// [`DEFAULT_SESSION_TITLE`]; the status moves as drafts get produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub id: Uuid,
    /// The user that owns the session.
    pub owner_id: String,
    pub title: String,
    pub content_type: ContentType,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn has_default_title(&self) -> bool {
        self.title == DEFAULT_SESSION_TITLE
    }
}

/// The kind of content a session is writing.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Tweet,
    #[default]
    Blog,
    Email,
    Essay,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tweet => "tweet",
            Self::Blog => "blog",
            Self::Email => "email",
            Self::Essay => "essay",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "tweet" => Some(Self::Tweet),
            "blog" => Some(Self::Blog),
            "email" => Some(Self::Email),
            "essay" => Some(Self::Essay),
            _ => None,
        }
    }
}

/// Where a session is in the writing process.
///
/// - `Interviewing`: Gathering requirements from the user (initial state)
/// - `Drafting`: At least one reply produced drafts
/// - `Refining`: The user is iterating on a chosen draft
/// - `Complete`: Finished
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Interviewing,
    Drafting,
    Refining,
    Complete,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interviewing => "interviewing",
            Self::Drafting => "drafting",
            Self::Refining => "refining",
            Self::Complete => "complete",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "interviewing" => Some(Self::Interviewing),
            "drafting" => Some(Self::Drafting),
            "refining" => Some(Self::Refining),
            "complete" => Some(Self::Complete),
            _ => None,
        }
    }
}

/// Input for creating a new session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionInput {
    pub owner_id: String,
    /// Defaults to [`DEFAULT_SESSION_TITLE`].
    #[serde(default)]
    pub title: Option<String>,
    /// Defaults to `Blog`.
    #[serde(default)]
    pub content_type: Option<ContentType>,
}

/// Input for changing a session's status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusInput {
    pub status: SessionStatus,
}

/// Input for renaming a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTitleInput {
    pub title: String,
}
