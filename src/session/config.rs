use crate::messages::Language;
use serde::{Deserialize, Serialize};

/// Identity and preferences a session starts with
///
/// Built once at startup from the local store; the controller never reads
/// persisted state itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Opaque conversation identifier (e.g. "session_1730000000000_k3j9x0a2b")
    pub session_id: String,

    /// API key sent with every request; empty when the user has not set one
    pub credential: String,

    /// Language replies and transcriptions are requested in
    pub language: Language,
}

impl SessionConfig {
    pub fn new(session_id: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            credential: credential.into(),
            language: Language::default(),
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn has_credential(&self) -> bool {
        !self.credential.trim().is_empty()
    }

    pub fn has_session_id(&self) -> bool {
        !self.session_id.trim().is_empty()
    }
}
