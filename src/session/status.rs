use crate::messages::{Language, Message};
use std::fmt;

/// What the session is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionStatus {
    /// Ready for user input
    #[default]
    Idle,
    /// Waiting for the stored conversation
    AwaitingHistory,
    /// Waiting for the assistant reply
    AwaitingReply,
    /// Waiting for speech recognition
    AwaitingTranscription,
    /// Microphone is held and audio is being buffered
    Recording,
}

impl InteractionStatus {
    /// Whether a network response is outstanding
    pub fn is_awaiting(&self) -> bool {
        matches!(
            self,
            InteractionStatus::AwaitingHistory
                | InteractionStatus::AwaitingReply
                | InteractionStatus::AwaitingTranscription
        )
    }
}

impl fmt::Display for InteractionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InteractionStatus::Idle => "idle",
            InteractionStatus::AwaitingHistory => "loading history",
            InteractionStatus::AwaitingReply => "waiting for reply",
            InteractionStatus::AwaitingTranscription => "transcribing",
            InteractionStatus::Recording => "recording",
        };
        f.write_str(label)
    }
}

/// Observable change in a session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StatusChanged(InteractionStatus),
    MessageAppended(Message),
    /// Transcript was replaced by a fetched history of this many messages
    TranscriptReplaced(usize),
    InputChanged(String),
    LanguageChanged(Language),
}
