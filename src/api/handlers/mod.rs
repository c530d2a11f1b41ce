use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chat::{finalize_turn, ChatError, Part, TurnOutcome};
use crate::db::Database;
use crate::drafts::{self, ParsedDraft};
use crate::models::*;

type ApiResult<T> = Result<T, (StatusCode, String)>;

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
///
/// Missing-record errors raised by the store are safe to expose and map to
/// NOT_FOUND; everything else becomes a generic 500.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    let msg = e.to_string();

    if msg.contains("not found") {
        tracing::warn!("Lookup failed: {}", msg);
        return (StatusCode::NOT_FOUND, msg);
    }

    tracing::error!("Internal error: {}", msg);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

fn chat_error(e: ChatError) -> (StatusCode, String) {
    match e {
        ChatError::SessionNotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
        other => internal_error(other),
    }
}

fn session_not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "Session not found".to_string())
}

fn bad_request(msg: &str) -> (StatusCode, String) {
    tracing::warn!("Validation error: {}", msg);
    (StatusCode::BAD_REQUEST, msg.to_string())
}

/// 404 unless the session exists.
fn require_session(db: &Database, id: Uuid) -> ApiResult<Session> {
    db.get_session(id)
        .map_err(internal_error)?
        .ok_or_else(session_not_found)
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Sessions
// ============================================================

#[derive(Debug, Deserialize)]
pub struct ListSessionsQuery {
    pub owner_id: String,
}

pub async fn list_sessions(
    State(db): State<Database>,
    Query(query): Query<ListSessionsQuery>,
) -> ApiResult<Json<Vec<Session>>> {
    db.list_sessions_by_owner(&query.owner_id)
        .map(Json)
        .map_err(internal_error)
}

pub async fn create_session(
    State(db): State<Database>,
    Json(input): Json<CreateSessionInput>,
) -> ApiResult<(StatusCode, Json<Session>)> {
    if input.owner_id.trim().is_empty() {
        return Err(bad_request("owner_id must not be empty"));
    }

    db.create_session(input)
        .map(|s| (StatusCode::CREATED, Json(s)))
        .map_err(internal_error)
}

pub async fn get_session(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Session>> {
    require_session(&db, id).map(Json)
}

pub async fn update_session_status(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateStatusInput>,
) -> ApiResult<Json<Session>> {
    if !db
        .update_session_status(id, input.status)
        .map_err(internal_error)?
    {
        return Err(session_not_found());
    }
    require_session(&db, id).map(Json)
}

pub async fn update_session_title(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTitleInput>,
) -> ApiResult<Json<Session>> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err(bad_request("title must not be empty"));
    }

    if !db.update_session_title(id, title).map_err(internal_error)? {
        return Err(session_not_found());
    }
    require_session(&db, id).map(Json)
}

// ============================================================
// Messages
// ============================================================

pub async fn list_messages(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Message>>> {
    require_session(&db, id)?;
    db.list_messages(id).map(Json).map_err(internal_error)
}

pub async fn append_message(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<AppendMessageInput>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    db.append_message(id, input)
        .map(|m| (StatusCode::CREATED, Json(m)))
        .map_err(internal_error)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinishTurnInput {
    pub parts: Vec<Part>,
}

/// Persist a finished assistant turn from its parts.
///
/// Runs on its own task so a dropped connection cannot interrupt the write
/// sequence halfway.
pub async fn finish_turn(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<FinishTurnInput>,
) -> ApiResult<Json<TurnOutcome>> {
    require_session(&db, id)?;

    let task = tokio::spawn(async move { finalize_turn(&db, id, &input.parts).await });
    task.await
        .map_err(ChatError::from)
        .and_then(|r| r)
        .map(Json)
        .map_err(chat_error)
}

// ============================================================
// Drafts
// ============================================================

pub async fn list_drafts(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Draft>>> {
    require_session(&db, id)?;
    db.list_drafts(id).map(Json).map_err(internal_error)
}

pub async fn create_draft(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateDraftInput>,
) -> ApiResult<(StatusCode, Json<Draft>)> {
    if input.content.trim().is_empty() {
        return Err(bad_request("content must not be empty"));
    }

    db.create_draft(id, input)
        .map(|d| (StatusCode::CREATED, Json(d)))
        .map_err(internal_error)
}

pub async fn get_draft(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Draft>> {
    db.get_draft(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Draft not found".to_string()))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseDraftsInput {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseDraftsResponse {
    pub has_drafts: bool,
    pub drafts: Vec<ParsedDraft>,
}

pub async fn parse_drafts(Json(input): Json<ParseDraftsInput>) -> Json<ParseDraftsResponse> {
    Json(ParseDraftsResponse {
        has_drafts: drafts::has_drafts(&input.text),
        drafts: drafts::parse_drafts(&input.text),
    })
}
