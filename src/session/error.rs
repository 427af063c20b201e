use super::status::InteractionStatus;
use crate::backend::BackendError;

/// Why a session operation did not run (or did not complete)
///
/// The `Display` text is the notice shown to the user.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Type a message first.")]
    EmptyInput,

    #[error("Please enter your API Key in the settings first.")]
    MissingCredential,

    #[error("No session identity is configured.")]
    MissingSessionIdentity,

    #[error("Please wait: session is {0}.")]
    Busy(InteractionStatus),

    #[error("Not recording.")]
    NotRecording,

    #[error("Microphone access is required for voice input.")]
    MicrophoneUnavailable(#[source] anyhow::Error),

    #[error("Could not prepare the recording.")]
    Capture(#[source] anyhow::Error),

    #[error("Could not recognize voice. Please try again.")]
    Recognition(#[source] BackendError),
}

impl SessionError {
    /// Rejections that need no notice (nothing to do, or already busy)
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            SessionError::EmptyInput | SessionError::Busy(_) | SessionError::NotRecording
        )
    }
}
