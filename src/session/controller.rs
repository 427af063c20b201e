use super::config::SessionConfig;
use super::error::SessionError;
use super::recording::{RecordingSession, SharedDevice};
use super::status::{InteractionStatus, SessionEvent};
use crate::audio::CaptureDevice;
use crate::backend::ChatBackend;
use crate::messages::{Language, Message, Transcript};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

/// Assistant message shown in place of a reply when the chat request fails
pub const CONNECTION_ERROR_REPLY: &str =
    "⚠️ Error: Could not connect to the AgroGPT server. Check your API Key and connection.";

const EVENT_CAPACITY: usize = 256;

/// Single authority over one chat session
///
/// Owns the transcript, the input text and the interaction status, and is
/// the only place network calls are issued from. Every operation that starts
/// from `Idle` returns to `Idle` before it completes, except
/// `start_recording`, which leaves the session `Recording` until
/// `stop_recording`.
pub struct SessionController {
    config: SessionConfig,
    backend: Arc<dyn ChatBackend>,
    device: SharedDevice,
    transcript: Transcript,
    input: String,
    status: InteractionStatus,
    recording: Option<RecordingSession>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    pub fn new(
        config: SessionConfig,
        backend: Arc<dyn ChatBackend>,
        device: Box<dyn CaptureDevice>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            config,
            backend,
            device: Arc::new(Mutex::new(device)),
            transcript: Transcript::new(),
            input: String::new(),
            status: InteractionStatus::Idle,
            recording: None,
            events,
        }
    }

    /// Receive every status change, transcript change and input change
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn status(&self) -> InteractionStatus {
        self.status
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn language(&self) -> Language {
        self.config.language
    }

    /// Load the stored conversation for this session
    ///
    /// A non-empty history replaces the transcript, including any messages
    /// added locally before the fetch. Fetch failures are logged and
    /// otherwise ignored.
    pub async fn initialize(&mut self) -> Result<(), SessionError> {
        if !self.config.has_credential() {
            debug!("Skipping history fetch: no API key");
            return Err(SessionError::MissingCredential);
        }
        if !self.config.has_session_id() {
            debug!("Skipping history fetch: no session id");
            return Err(SessionError::MissingSessionIdentity);
        }
        self.ensure_idle()?;

        self.set_status(InteractionStatus::AwaitingHistory);

        match self
            .backend
            .fetch_history(&self.config.session_id, &self.config.credential)
            .await
        {
            Ok(history) => {
                let count = history.len();
                if self.transcript.seed(history) {
                    info!("Restored {} messages for {}", count, self.config.session_id);
                    self.emit(SessionEvent::TranscriptReplaced(count));
                } else {
                    info!("No stored history for {}", self.config.session_id);
                }
            }
            Err(e) => {
                warn!("Could not fetch history for {}: {}", self.config.session_id, e);
            }
        }

        self.set_status(InteractionStatus::Idle);

        Ok(())
    }

    /// Replace the input text
    pub fn set_input(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.input {
            self.input = text;
            self.emit(SessionEvent::InputChanged(self.input.clone()));
        }
    }

    /// Submit whatever is in the input
    pub async fn submit_input(&mut self) -> Result<(), SessionError> {
        let text = self.input.clone();
        self.submit_text(&text).await
    }

    /// Send a user message and wait for the reply
    ///
    /// The user message is appended before the request goes out and stays in
    /// the transcript whatever the outcome. A failed request appends
    /// [`CONNECTION_ERROR_REPLY`] as the assistant's answer.
    pub async fn submit_text(&mut self, text: &str) -> Result<(), SessionError> {
        if text.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }
        if !self.config.has_credential() {
            return Err(SessionError::MissingCredential);
        }
        if !self.config.has_session_id() {
            return Err(SessionError::MissingSessionIdentity);
        }
        self.ensure_idle()?;

        self.append(Message::user(text));
        self.set_input(String::new());
        self.set_status(InteractionStatus::AwaitingReply);

        let reply = self
            .backend
            .send(
                &self.config.session_id,
                self.transcript.messages(),
                self.config.language,
                &self.config.credential,
            )
            .await;

        match reply {
            Ok(reply) => {
                info!("Reply received ({} chars)", reply.chars().count());
                self.append(Message::assistant(reply));
            }
            Err(e) => {
                warn!("Chat request failed: {}", e);
                self.append(Message::assistant(CONNECTION_ERROR_REPLY));
            }
        }

        self.set_status(InteractionStatus::Idle);

        Ok(())
    }

    /// Acquire the microphone and start buffering audio
    pub async fn start_recording(&mut self) -> Result<(), SessionError> {
        self.ensure_idle()?;

        match RecordingSession::begin(Arc::clone(&self.device)).await {
            Ok(recording) => {
                self.recording = Some(recording);
                self.set_status(InteractionStatus::Recording);
                Ok(())
            }
            Err(e) => {
                warn!("Microphone unavailable: {:#}", e);
                Err(SessionError::MicrophoneUnavailable(e))
            }
        }
    }

    /// Release the microphone and transcribe what was recorded
    ///
    /// A successful transcript replaces the input text; it is not submitted.
    pub async fn stop_recording(&mut self) -> Result<(), SessionError> {
        if self.status != InteractionStatus::Recording {
            return Err(SessionError::NotRecording);
        }

        let Some(recording) = self.recording.take() else {
            self.set_status(InteractionStatus::Idle);
            return Err(SessionError::NotRecording);
        };

        let blob = match recording.finish().await {
            Ok(blob) => blob,
            Err(e) => {
                warn!("Could not assemble recording: {:#}", e);
                self.set_status(InteractionStatus::Idle);
                return Err(SessionError::Capture(e));
            }
        };

        if !self.config.has_credential() {
            self.set_status(InteractionStatus::Idle);
            return Err(SessionError::MissingCredential);
        }

        self.set_status(InteractionStatus::AwaitingTranscription);

        let result = self
            .backend
            .transcribe(blob, self.config.language, &self.config.credential)
            .await;

        let outcome = match result {
            Ok(transcript) => {
                if transcript.is_empty() {
                    info!("Transcription returned no text");
                } else {
                    self.set_input(transcript);
                }
                Ok(())
            }
            Err(e) => {
                warn!("Transcription failed: {}", e);
                Err(SessionError::Recognition(e))
            }
        };

        self.set_status(InteractionStatus::Idle);

        outcome
    }

    /// Change the language of subsequent requests
    pub fn set_language(&mut self, language: Language) {
        if language != self.config.language {
            info!("Language set to {}", language);
            self.config.language = language;
            self.emit(SessionEvent::LanguageChanged(language));
        }
    }

    /// Switch to another API key and reload the session history with it
    pub async fn set_credential(&mut self, credential: impl Into<String>) -> Result<(), SessionError> {
        self.ensure_idle()?;

        self.config.credential = credential.into();
        if !self.config.has_credential() {
            return Ok(());
        }

        self.initialize().await
    }

    /// Release the microphone if a recording is still running, discarding it
    pub async fn shutdown(&mut self) {
        if let Some(recording) = self.recording.take() {
            info!("Discarding unfinished recording");
            if let Err(e) = recording.finish().await {
                warn!("Failed to discard recording: {:#}", e);
            }
            self.set_status(InteractionStatus::Idle);
        }
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.status != InteractionStatus::Idle {
            debug!("Rejected while {}", self.status);
            return Err(SessionError::Busy(self.status));
        }
        Ok(())
    }

    fn append(&mut self, message: Message) {
        self.transcript.push(message.clone());
        self.emit(SessionEvent::MessageAppended(message));
    }

    fn set_status(&mut self, status: InteractionStatus) {
        if status != self.status {
            debug!("Status: {} -> {}", self.status, status);
            self.status = status;
            self.emit(SessionEvent::StatusChanged(status));
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}
