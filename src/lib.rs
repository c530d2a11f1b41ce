//! Spiral turns AI-generated writing into structured, comparable drafts.
//!
//! - [`drafts`]: parses draft blocks out of assistant text
//! - [`chat`]: merges streamed turns with persisted history and persists results
//! - [`workspace`]: the bounded set of drafts open for side-by-side comparison
//! - [`db`]: SQLite-backed store for sessions, messages and drafts
//! - [`api`]: HTTP surface over the store and the turn finalizer

pub mod api;
pub mod chat;
pub mod config;
pub mod db;
pub mod drafts;
pub mod models;
pub mod workspace;
