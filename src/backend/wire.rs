//! JSON bodies exchanged with the backend

use crate::messages::{Language, Message};
use serde::{Deserialize, Serialize};

/// Body of POST /chat
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub messages: Vec<Message>,
    pub target_language: Language,
}

/// Response of POST /chat
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// Response of POST /transcribe
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscribeResponse {
    #[serde(default)]
    pub transcript: String,
}

/// Body of POST /translate
#[derive(Debug, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    pub source_language: Language,
    pub target_language: Language,
}

/// Response of POST /translate
#[derive(Debug, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub translated_text: String,
}
