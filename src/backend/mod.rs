//! Remote AgroGPT backend
//!
//! The session controller only talks to the backend through the
//! [`ChatBackend`] trait, so tests can substitute a double:
//! - POST /chat - send the conversation, receive the assistant reply
//! - GET /history/:session_id - fetch the stored conversation
//! - POST /transcribe - speech to text (multipart upload)
//! - POST /translate - text translation (not used by the controller)

mod error;
mod http;
pub mod wire;

pub use error::BackendError;
pub use http::{HttpBackend, API_KEY_HEADER, DEFAULT_BASE_URL};

use crate::audio::AudioBlob;
use crate::messages::{Language, Message};

/// Operations the remote chat service offers
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send the full conversation and return the assistant reply
    async fn send(
        &self,
        session_id: &str,
        messages: &[Message],
        language: Language,
        credential: &str,
    ) -> Result<String, BackendError>;

    /// Fetch the conversation stored for a session (possibly empty)
    async fn fetch_history(
        &self,
        session_id: &str,
        credential: &str,
    ) -> Result<Vec<Message>, BackendError>;

    /// Transcribe recorded audio in the given language
    async fn transcribe(
        &self,
        audio: AudioBlob,
        language: Language,
        credential: &str,
    ) -> Result<String, BackendError>;

    /// Translate text between two display languages
    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
        credential: &str,
    ) -> Result<String, BackendError>;
}
