//! Session interaction management
//!
//! This module provides the `SessionController`, the single owner of:
//! - The conversation transcript
//! - The input text
//! - The busy/idle status and the recording status
//!
//! All network calls of a chat session go through the controller, which
//! serializes them: only one user-initiated operation is ever outstanding.

mod config;
mod controller;
mod error;
mod recording;
mod status;

pub use config::SessionConfig;
pub use controller::{SessionController, CONNECTION_ERROR_REPLY};
pub use error::SessionError;
pub use status::{InteractionStatus, SessionEvent};
