mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, Row};
use uuid::Uuid;

use crate::drafts::count_words;
use crate::models::*;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    /// Location of the database in the platform data directory.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "spiral")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(dirs.data_dir().join("spiral.db"))
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Session operations
    // ============================================================

    /// Sessions belonging to `owner_id`, newest first.
    pub fn list_sessions_by_owner(&self, owner_id: &str) -> Result<Vec<Session>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, owner_id, title, content_type, status, created_at, updated_at
             FROM sessions WHERE owner_id = ? ORDER BY created_at DESC, rowid DESC",
        )?;

        let sessions = stmt
            .query_map([owner_id], session_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sessions)
    }

    pub fn get_session(&self, id: Uuid) -> Result<Option<Session>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, owner_id, title, content_type, status, created_at, updated_at
             FROM sessions WHERE id = ?",
        )?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(session_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn create_session(&self, input: CreateSessionInput) -> Result<Session> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();
        let title = input
            .title
            .unwrap_or_else(|| DEFAULT_SESSION_TITLE.to_string());
        let content_type = input.content_type.unwrap_or_default();
        let status = SessionStatus::Interviewing;

        conn.execute(
            "INSERT INTO sessions (id, owner_id, title, content_type, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &input.owner_id,
                &title,
                content_type.as_str(),
                status.as_str(),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        tracing::info!(session_id = %id, owner_id = %input.owner_id, "Created session");

        Ok(Session {
            id,
            owner_id: input.owner_id,
            title,
            content_type,
            status,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns `false` if the session does not exist.
    pub fn update_session_status(&self, id: Uuid, status: SessionStatus) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute(
            "UPDATE sessions SET status = ?, updated_at = ? WHERE id = ?",
            (status.as_str(), Utc::now().to_rfc3339(), id.to_string()),
        )?;
        Ok(rows > 0)
    }

    /// Returns `false` if the session does not exist.
    pub fn update_session_title(&self, id: Uuid, title: &str) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute(
            "UPDATE sessions SET title = ?, updated_at = ? WHERE id = ?",
            (title, Utc::now().to_rfc3339(), id.to_string()),
        )?;
        Ok(rows > 0)
    }

    // ============================================================
    // Message operations
    // ============================================================

    /// Messages of a session in insertion order.
    pub fn list_messages(&self, session_id: Uuid) -> Result<Vec<Message>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, session_id, role, content, agent, reasoning, tool_calls, created_at
             FROM messages WHERE session_id = ? ORDER BY seq",
        )?;

        let messages = stmt
            .query_map([session_id.to_string()], message_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(messages)
    }

    pub fn append_message(&self, session_id: Uuid, input: AppendMessageInput) -> Result<Message> {
        self.get_session(session_id)?
            .ok_or_else(|| anyhow::anyhow!("Session not found"))?;

        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        let reasoning = input.reasoning.filter(|r| !r.is_empty());
        let tool_calls = input
            .tool_calls
            .map(dedupe_tool_refs)
            .filter(|calls| !calls.is_empty());
        let tool_calls_json = tool_calls
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        conn.execute(
            "INSERT INTO messages (id, session_id, role, content, agent, reasoning, tool_calls, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                session_id.to_string(),
                input.role.as_str(),
                &input.content,
                input.agent.map(|a| a.as_str()),
                &reasoning,
                &tool_calls_json,
                now.to_rfc3339(),
            ),
        )?;

        Ok(Message {
            id,
            session_id,
            role: input.role,
            content: input.content,
            agent: input.agent,
            reasoning,
            tool_calls,
            created_at: now,
        })
    }

    // ============================================================
    // Draft operations
    // ============================================================

    /// Drafts of a session in insertion order.
    pub fn list_drafts(&self, session_id: Uuid) -> Result<Vec<Draft>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, session_id, title, content, strategy, word_count, version, is_selected, created_at
             FROM drafts WHERE session_id = ? ORDER BY seq",
        )?;

        let drafts = stmt
            .query_map([session_id.to_string()], draft_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(drafts)
    }

    pub fn get_draft(&self, id: Uuid) -> Result<Option<Draft>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, session_id, title, content, strategy, word_count, version, is_selected, created_at
             FROM drafts WHERE id = ?",
        )?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(draft_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn create_draft(&self, session_id: Uuid, input: CreateDraftInput) -> Result<Draft> {
        self.get_session(session_id)?
            .ok_or_else(|| anyhow::anyhow!("Session not found"))?;

        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();
        let word_count = input
            .word_count
            .unwrap_or_else(|| count_words(&input.content));

        conn.execute(
            "INSERT INTO drafts (id, session_id, title, content, strategy, word_count, version, is_selected, created_at)
             VALUES (?, ?, ?, ?, ?, ?, 1, 0, ?)",
            (
                id.to_string(),
                session_id.to_string(),
                &input.title,
                &input.content,
                &input.strategy,
                word_count,
                now.to_rfc3339(),
            ),
        )?;

        Ok(Draft {
            id,
            session_id,
            title: input.title,
            content: input.content,
            strategy: input.strategy,
            word_count,
            version: 1,
            is_selected: false,
            created_at: now,
        })
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

fn session_from_row(row: &Row) -> rusqlite::Result<Session> {
    Ok(Session {
        id: parse_uuid(row.get::<_, String>(0)?),
        owner_id: row.get(1)?,
        title: row.get(2)?,
        content_type: ContentType::from_str(&row.get::<_, String>(3)?).unwrap_or_default(),
        status: SessionStatus::from_str(&row.get::<_, String>(4)?).unwrap_or_default(),
        created_at: parse_datetime(row.get::<_, String>(5)?),
        updated_at: parse_datetime(row.get::<_, String>(6)?),
    })
}

fn message_from_row(row: &Row) -> rusqlite::Result<Message> {
    Ok(Message {
        id: parse_uuid(row.get::<_, String>(0)?),
        session_id: parse_uuid(row.get::<_, String>(1)?),
        role: Role::from_str(&row.get::<_, String>(2)?).unwrap_or(Role::User),
        content: row.get(3)?,
        agent: row
            .get::<_, Option<String>>(4)?
            .and_then(|a| Agent::from_str(&a)),
        reasoning: row.get(5)?,
        tool_calls: row
            .get::<_, Option<String>>(6)?
            .and_then(|json| serde_json::from_str(&json).ok()),
        created_at: parse_datetime(row.get::<_, String>(7)?),
    })
}

fn draft_from_row(row: &Row) -> rusqlite::Result<Draft> {
    Ok(Draft {
        id: parse_uuid(row.get::<_, String>(0)?),
        session_id: parse_uuid(row.get::<_, String>(1)?),
        title: row.get(2)?,
        content: row.get(3)?,
        strategy: row.get(4)?,
        word_count: row.get(5)?,
        version: row.get(6)?,
        is_selected: row.get::<_, i32>(7)? != 0,
        created_at: parse_datetime(row.get::<_, String>(8)?),
    })
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
