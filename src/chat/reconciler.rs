use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::lifecycle::status_after_turn;
use super::parts::*;
use super::store::ChatStore;
use super::transport::{ChatRequest, Transport};
use super::ChatError;
use crate::drafts::{has_drafts, parse_drafts};
use crate::models::*;

/// Longest session title derived from a first message, in characters.
pub const TITLE_MAX_CHARS: usize = 40;

/// What a finished turn wrote to the store.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub message: Message,
    /// Drafts created from the reply, in extraction order.
    pub drafts: Vec<Draft>,
    /// The status the session was moved to, if any.
    pub status: Option<SessionStatus>,
}

/// Persist a finished assistant turn.
///
/// Drafts found in the reply are written one at a time in extraction order,
/// then the session status is updated, then the assistant message is appended.
/// A failure stops the sequence; writes that already happened stay.
pub async fn finalize_turn<S: ChatStore>(
    store: &S,
    session_id: Uuid,
    parts: &[Part],
) -> Result<TurnOutcome, ChatError> {
    let content = content_of(parts);
    let reasoning = reasoning_of(parts);
    let tool_calls = tool_refs_of(parts);

    let mut drafts = Vec::new();
    let mut status = None;

    if has_drafts(&content) {
        for parsed in parse_drafts(&content) {
            let draft = store
                .create_draft(
                    session_id,
                    CreateDraftInput {
                        title: parsed.title,
                        content: parsed.content,
                        strategy: parsed.strategy,
                        word_count: Some(parsed.word_count),
                    },
                )
                .await
                .map_err(ChatError::Persistence)?;
            drafts.push(draft);
        }

        if let Some(next) = status_after_turn(drafts.len()) {
            store
                .update_session_status(session_id, next)
                .await
                .map_err(ChatError::Persistence)?;
            status = Some(next);
        }
    }

    let agent = if drafts.is_empty() {
        Agent::Orchestrator
    } else {
        Agent::Writer
    };

    let message = store
        .append_message(
            session_id,
            AppendMessageInput {
                role: Role::Assistant,
                content,
                agent: Some(agent),
                reasoning: (!reasoning.is_empty()).then_some(reasoning),
                tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
            },
        )
        .await
        .map_err(ChatError::Persistence)?;

    tracing::info!(
        session_id = %session_id,
        drafts = drafts.len(),
        agent = agent.as_str(),
        "Finalized assistant turn"
    );

    Ok(TurnOutcome {
        message,
        drafts,
        status,
    })
}

/// Title for a session derived from its first user message.
pub fn title_from_input(text: &str) -> String {
    if text.chars().count() > TITLE_MAX_CHARS {
        let truncated: String = text.chars().take(TITLE_MAX_CHARS).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    }
}

/// The live conversation of one attached session.
///
/// Holds the messages shown for the session and the turn currently being
/// generated, if any. Persisted history is replayed into the view once, when it
/// is first seen while the view is still empty.
pub struct ChatView<S, T> {
    store: S,
    transport: T,
    session: Session,
    messages: Vec<LiveMessage>,
    turn: Option<TurnState>,
    events: Option<mpsc::Receiver<StreamEvent>>,
}

impl<S, T> ChatView<S, T>
where
    S: ChatStore + Clone + 'static,
    T: Transport,
{
    /// Load the session and hydrate from its persisted history.
    pub async fn attach(store: S, transport: T, session_id: Uuid) -> Result<Self, ChatError> {
        let session = store
            .get_session(session_id)
            .await
            .map_err(ChatError::Persistence)?
            .ok_or(ChatError::SessionNotFound(session_id))?;

        let history = store
            .list_messages(session_id)
            .await
            .map_err(ChatError::Persistence)?;

        let mut view = Self {
            store,
            transport,
            session,
            messages: Vec::new(),
            turn: None,
            events: None,
        };
        view.refresh_history(&history);
        Ok(view)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn messages(&self) -> &[LiveMessage] {
        &self.messages
    }

    /// The assistant turn being generated, if one is in flight.
    pub fn live_turn(&self) -> Option<&TurnState> {
        self.turn.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.turn.is_some()
    }

    /// Offer a fresh copy of the persisted history.
    ///
    /// Hydrates only while the view holds no messages; returns whether it did.
    pub fn refresh_history(&mut self, history: &[Message]) -> bool {
        if !self.messages.is_empty() || history.is_empty() {
            return false;
        }

        self.messages = history.iter().map(LiveMessage::from_persisted).collect();
        tracing::debug!(
            session_id = %self.session.id,
            messages = self.messages.len(),
            "Hydrated chat view from history"
        );
        true
    }

    /// Re-read the session and its history from the store.
    pub async fn refresh(&mut self) -> Result<bool, ChatError> {
        let session_id = self.session.id;
        self.session = self
            .store
            .get_session(session_id)
            .await
            .map_err(ChatError::Persistence)?
            .ok_or(ChatError::SessionNotFound(session_id))?;

        let history = self
            .store
            .list_messages(session_id)
            .await
            .map_err(ChatError::Persistence)?;
        Ok(self.refresh_history(&history))
    }

    /// Submit a user turn.
    ///
    /// Blank input, or input while a turn is in flight, is ignored and returns
    /// `false`. On the first turn of a session still carrying the default title,
    /// the title is replaced from the input first.
    pub async fn submit(&mut self, input: &str) -> Result<bool, ChatError> {
        let text = input.trim();
        if text.is_empty() || self.is_busy() {
            return Ok(false);
        }

        let session_id = self.session.id;

        if self.messages.is_empty() && self.session.has_default_title() {
            let title = title_from_input(text);
            self.store
                .update_session_title(session_id, title.clone())
                .await
                .map_err(ChatError::Persistence)?;
            tracing::debug!(session_id = %session_id, title = %title, "Renamed session");
            self.session.title = title;
        }

        let message = self
            .store
            .append_message(session_id, AppendMessageInput::user(text))
            .await
            .map_err(ChatError::Persistence)?;
        self.messages.push(LiveMessage::from_persisted(&message));

        let request = ChatRequest::new(session_id, &self.messages);
        let events = self.transport.submit(request).await?;

        self.turn = Some(TurnState::default());
        self.events = Some(events);
        Ok(true)
    }

    /// Fold a stream event into the in-flight turn.
    ///
    /// Returns the finished parts on the terminal event. Events arriving with no
    /// turn in flight are ignored.
    pub fn apply_event(&mut self, event: StreamEvent) -> Option<Vec<Part>> {
        self.turn.as_mut()?.apply(event)
    }

    /// Persist the finished turn and add the reply to the view.
    ///
    /// The write sequence runs on its own task, so it completes even if the
    /// caller stops waiting for it.
    pub async fn finish_turn(&mut self, parts: Vec<Part>) -> Result<TurnOutcome, ChatError> {
        self.turn = None;
        self.events = None;

        let store = self.store.clone();
        let session_id = self.session.id;
        let shown = parts.clone();
        let result =
            tokio::spawn(async move { finalize_turn(&store, session_id, &parts).await }).await?;

        match result {
            Ok(outcome) => {
                if let Some(status) = outcome.status {
                    if self.session.status != status {
                        tracing::debug!(
                            session_id = %session_id,
                            from = self.session.status.as_str(),
                            to = status.as_str(),
                            "Session status changed"
                        );
                    }
                    self.session.status = status;
                }
                self.messages.push(LiveMessage {
                    id: outcome.message.id,
                    role: Role::Assistant,
                    parts: shown,
                });
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!(session_id = %session_id, "Failed to persist turn: {}", e);
                self.messages.push(LiveMessage {
                    id: Uuid::new_v4(),
                    role: Role::Assistant,
                    parts: shown,
                });
                Err(e)
            }
        }
    }

    /// Consume the in-flight turn's events until it finishes.
    ///
    /// Returns `None` if there is no turn in flight or the stream closed before
    /// finishing; an unfinished turn is dropped without persisting anything.
    /// Dropping the returned future abandons the turn the same way, leaving
    /// the view ready for the next submit.
    pub async fn drive(&mut self) -> Result<Option<TurnOutcome>, ChatError> {
        self.drive_with(|_| {}).await
    }

    /// Like [`drive`](Self::drive), calling `on_event` for every event first.
    pub async fn drive_with(
        &mut self,
        mut on_event: impl FnMut(&StreamEvent),
    ) -> Result<Option<TurnOutcome>, ChatError> {
        // Both halves of the turn live in this future so that cancelling it
        // cannot leave the view busy.
        let (Some(mut events), Some(mut turn)) = (self.events.take(), self.turn.take()) else {
            self.events = None;
            self.turn = None;
            return Ok(None);
        };

        while let Some(event) = events.recv().await {
            on_event(&event);
            if let Some(parts) = turn.apply(event) {
                return self.finish_turn(parts).await.map(Some);
            }
        }

        tracing::warn!(
            session_id = %self.session.id,
            "Chat stream closed before the turn finished; dropping it"
        );
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_input_is_used_as_title() {
        assert_eq!(title_from_input("Launch post"), "Launch post");
    }

    #[test]
    fn long_input_is_truncated_with_ellipsis() {
        let input = "Write a blog post about the quiet joys of maintaining old software";
        let title = title_from_input(input);
        assert_eq!(title, format!("{}...", &input[..40]));
    }

    #[test]
    fn exactly_forty_chars_is_not_truncated() {
        let input = "a".repeat(40);
        assert_eq!(title_from_input(&input), input);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let input = "é".repeat(45);
        assert_eq!(title_from_input(&input), format!("{}...", "é".repeat(40)));
    }
}
