//! Conversation handling for a writing session.
//!
//! Generation events arrive from a [`Transport`] and accumulate into a
//! [`TurnState`]. When the turn finishes, [`finalize_turn`] turns the assembled
//! parts into persisted drafts, a status change and the assistant message.
//! [`ChatView`] ties this together for one attached session.

mod lifecycle;
mod parts;
mod reconciler;
mod store;
mod transport;

pub use lifecycle::status_after_turn;
pub use parts::*;
pub use reconciler::*;
pub use store::ChatStore;
pub use transport::*;

use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the chat layer.
///
/// Store failures are not retried and earlier writes of the same turn are not
/// rolled back.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Persistence failed: {0:#}")]
    Persistence(anyhow::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Turn finalization aborted: {0}")]
    Aborted(#[from] tokio::task::JoinError),
}
