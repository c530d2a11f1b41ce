mod handlers;
mod middleware;

pub use handlers::{FinishTurnInput, ParseDraftsInput, ParseDraftsResponse};
pub use middleware::{RateLimiter, SecurityConfig, DEFAULT_RATE_LIMIT};

use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::db::Database;

/// Router with security disabled, for local use and tests.
pub fn create_router(db: Database) -> Router {
    create_router_with_security(db, SecurityConfig::disabled())
}

pub fn create_router_with_security(db: Database, security: SecurityConfig) -> Router {
    let protected = Router::new()
        // Sessions
        .route(
            "/sessions",
            get(handlers::list_sessions).post(handlers::create_session),
        )
        .route("/sessions/{id}", get(handlers::get_session))
        .route("/sessions/{id}/status", put(handlers::update_session_status))
        .route("/sessions/{id}/title", put(handlers::update_session_title))
        // Conversation
        .route(
            "/sessions/{id}/messages",
            get(handlers::list_messages).post(handlers::append_message),
        )
        .route("/sessions/{id}/turns", post(handlers::finish_turn))
        // Drafts
        .route(
            "/sessions/{id}/drafts",
            get(handlers::list_drafts).post(handlers::create_draft),
        )
        .route("/drafts/{id}", get(handlers::get_draft))
        .route("/drafts/parse", post(handlers::parse_drafts))
        .with_state(db);

    let protected = match security.rate_limiter.clone() {
        Some(limiter) => protected.layer(from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        )),
        None => protected,
    };

    // Health stays reachable without credentials.
    let api = protected
        .layer(from_fn_with_state(
            security.clone(),
            middleware::auth_middleware,
        ))
        .route("/health", get(handlers::health));

    Router::new().nest("/api/v1", api).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(&security)),
    )
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    match &security.cors_origins {
        Some(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| match o.parse() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed))
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::permissive(),
    }
}
