use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::db::Database;
use crate::models::*;

/// The persisted-store operations the chat layer depends on.
///
/// Every call is a suspension point; callers await each one before issuing the
/// next.
#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn get_session(&self, id: Uuid) -> Result<Option<Session>>;

    async fn update_session_title(&self, id: Uuid, title: String) -> Result<()>;

    async fn update_session_status(&self, id: Uuid, status: SessionStatus) -> Result<()>;

    async fn list_messages(&self, session_id: Uuid) -> Result<Vec<Message>>;

    async fn append_message(&self, session_id: Uuid, input: AppendMessageInput) -> Result<Message>;

    async fn create_draft(&self, session_id: Uuid, input: CreateDraftInput) -> Result<Draft>;
}

#[async_trait]
impl ChatStore for Database {
    async fn get_session(&self, id: Uuid) -> Result<Option<Session>> {
        Database::get_session(self, id)
    }

    async fn update_session_title(&self, id: Uuid, title: String) -> Result<()> {
        if !Database::update_session_title(self, id, &title)? {
            anyhow::bail!("Session not found");
        }
        Ok(())
    }

    async fn update_session_status(&self, id: Uuid, status: SessionStatus) -> Result<()> {
        if !Database::update_session_status(self, id, status)? {
            anyhow::bail!("Session not found");
        }
        Ok(())
    }

    async fn list_messages(&self, session_id: Uuid) -> Result<Vec<Message>> {
        Database::list_messages(self, session_id)
    }

    async fn append_message(&self, session_id: Uuid, input: AppendMessageInput) -> Result<Message> {
        Database::append_message(self, session_id, input)
    }

    async fn create_draft(&self, session_id: Uuid, input: CreateDraftInput) -> Result<Draft> {
        Database::create_draft(self, session_id, input)
    }
}
