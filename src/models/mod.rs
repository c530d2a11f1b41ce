//! Domain models for Spiral.
//!
//! # Core Concepts
//!
//! - [`Session`]: One writing task. Owns a conversation and the drafts it produced.
//!   Its [`SessionStatus`] tracks how far along the task is.
//! - [`Message`]: Append-only conversation record. Assistant messages carry the
//!   reasoning text and tool calls that accompanied them.
//! - [`Draft`]: A structured candidate piece of content extracted from an
//!   assistant reply.

mod draft;
mod message;
mod session;

pub use draft::*;
pub use message::*;
pub use session::*;
