//! The generation transport: submits a conversation and streams back events.

use async_trait::async_trait;
use bytes::Bytes;
use eventsource_stream::Eventsource;
use futures::stream::{self, Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::parts::{LiveMessage, Part, StreamEvent, ToolState, TurnState};
use crate::models::Role;

/// Buffered events per in-flight turn before the reader waits on the consumer.
const EVENT_BUFFER: usize = 64;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unauthorized: API key required or invalid")]
    Unauthorized,

    #[error("Chat endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// A conversation submitted for generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub session_id: Uuid,
    pub messages: Vec<RequestMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestMessage {
    pub role: Role,
    /// Text parts only.
    pub parts: Vec<Part>,
}

impl ChatRequest {
    /// Build a request from the text of each live message, in order.
    pub fn new(session_id: Uuid, messages: &[LiveMessage]) -> Self {
        let messages = messages
            .iter()
            .map(|message| RequestMessage {
                role: message.role,
                parts: message
                    .parts
                    .iter()
                    .filter(|part| matches!(part, Part::Text { .. }))
                    .cloned()
                    .collect(),
            })
            .collect();

        Self {
            session_id,
            messages,
        }
    }
}

/// Something that can generate an assistant turn.
///
/// The returned receiver yields the turn's events and ends after
/// [`StreamEvent::Finished`]. If it closes without one, the turn was cut short.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn submit(
        &self,
        request: ChatRequest,
    ) -> Result<mpsc::Receiver<StreamEvent>, TransportError>;
}

/// Transport backed by an HTTP chat endpoint speaking server-sent events.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn submit(
        &self,
        request: ChatRequest,
    ) -> Result<mpsc::Receiver<StreamEvent>, TransportError> {
        let mut req = self.client.post(&self.endpoint).json(&request);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(TransportError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(session_id = %request.session_id, "Chat stream opened");

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        tokio::spawn(pump(response.bytes_stream(), tx));
        Ok(rx)
    }
}

/// Forward the turn events carried by a server-sent event byte stream.
async fn pump<S, E>(bytes: S, tx: mpsc::Sender<StreamEvent>)
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    // An event is only dispatched at a blank line, so close off a final
    // event the server left unterminated.
    let terminator = stream::iter([Ok(Bytes::from_static(b"\n\n"))]);
    let mut stream = bytes.chain(terminator).eventsource();
    let mut decoder = ChunkDecoder::default();

    while let Some(sse) = stream.next().await {
        let sse = match sse {
            Ok(sse) => sse,
            Err(e) => {
                tracing::warn!("Chat stream interrupted: {}", e);
                return;
            }
        };

        let Some(event) = decoder.decode(&sse.data) else {
            continue;
        };
        if tx.send(event).await.is_err() {
            // Receiver dropped; nobody is listening any more.
            return;
        }
        if decoder.is_finished() {
            return;
        }
    }

    tracing::warn!("Chat stream ended before the turn finished");
}

/// A chunk of the UI message stream, one per event.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum WireChunk {
    TextDelta {
        delta: String,
    },
    ReasoningDelta {
        delta: String,
    },
    #[serde(rename_all = "camelCase")]
    ToolInputStart {
        tool_call_id: String,
        tool_name: String,
    },
    #[serde(rename_all = "camelCase")]
    ToolInputAvailable {
        tool_call_id: String,
        tool_name: String,
    },
    #[serde(rename_all = "camelCase")]
    ToolOutputAvailable {
        tool_call_id: String,
    },
    Finish,
    #[serde(other)]
    Other,
}

/// Decoder for the `data` payloads of the UI message stream.
///
/// Keeps its own [`TurnState`] so the terminal event can carry the assembled
/// parts.
#[derive(Debug, Default)]
pub struct ChunkDecoder {
    turn: TurnState,
    finished: bool,
}

impl ChunkDecoder {
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Decode one event payload. Payloads after the turn finished, empty
    /// payloads and unknown chunk types yield nothing.
    pub fn decode(&mut self, data: &str) -> Option<StreamEvent> {
        let data = data.trim();
        if self.finished || data.is_empty() {
            return None;
        }

        let event = if data == "[DONE]" {
            self.finish()
        } else {
            let chunk = match serde_json::from_str::<WireChunk>(data) {
                Ok(chunk) => chunk,
                Err(e) => {
                    tracing::debug!("Skipping undecodable stream chunk: {}", e);
                    return None;
                }
            };

            match chunk {
                WireChunk::TextDelta { delta } => StreamEvent::TextDelta(delta),
                WireChunk::ReasoningDelta { delta } => StreamEvent::ReasoningDelta(delta),
                WireChunk::ToolInputStart {
                    tool_call_id,
                    tool_name,
                } => StreamEvent::ToolInvocation {
                    tool_name,
                    tool_call_id,
                    state: ToolState::Pending,
                },
                WireChunk::ToolInputAvailable {
                    tool_call_id,
                    tool_name,
                } => StreamEvent::ToolInvocation {
                    tool_name,
                    tool_call_id,
                    state: ToolState::Running,
                },
                WireChunk::ToolOutputAvailable { tool_call_id } => StreamEvent::ToolInvocation {
                    tool_name: String::new(),
                    tool_call_id,
                    state: ToolState::Complete,
                },
                WireChunk::Finish => self.finish(),
                WireChunk::Other => return None,
            }
        };

        if !self.finished {
            self.turn.apply(event.clone());
        }
        Some(event)
    }

    fn finish(&mut self) -> StreamEvent {
        self.finished = true;
        StreamEvent::Finished {
            parts: std::mem::take(&mut self.turn).into_parts(),
        }
    }
}
