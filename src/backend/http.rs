use super::error::BackendError;
use super::wire::{ChatRequest, ChatResponse, TranscribeResponse, TranslateRequest, TranslateResponse};
use super::ChatBackend;
use crate::audio::AudioBlob;
use crate::messages::{Language, Message};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Header carrying the user's credential on every request
pub const API_KEY_HEADER: &str = "X-API-Key";

/// [`ChatBackend`] over HTTP
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    /// Create a client for the backend rooted at `base_url`.
    ///
    /// Without a timeout a hung request keeps the session waiting until the
    /// connection is closed by the server.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, BackendError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| BackendError::InvalidRequest(format!("invalid base URL {}: {}", base_url, e)))?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(BackendError::Transport)?;

        info!("Backend client ready: {}", base_url);

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                BackendError::InvalidRequest(format!("base URL cannot hold a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        credential: &str,
    ) -> Result<T, BackendError> {
        let response = request
            .header(API_KEY_HEADER, credential)
            .send()
            .await
            .map_err(BackendError::Transport)?;

        read_json(response).await
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(BackendError::Status { status, body });
    }

    response.json::<T>().await.map_err(BackendError::Decode)
}

#[async_trait::async_trait]
impl ChatBackend for HttpBackend {
    async fn send(
        &self,
        session_id: &str,
        messages: &[Message],
        language: Language,
        credential: &str,
    ) -> Result<String, BackendError> {
        let url = self.endpoint(&["chat"])?;
        let body = ChatRequest {
            session_id: session_id.to_string(),
            messages: messages.to_vec(),
            target_language: language,
        };

        debug!("POST {} ({} messages, {})", url, body.messages.len(), language);

        let response: ChatResponse = self.execute(self.client.post(url).json(&body), credential).await?;
        Ok(response.reply)
    }

    async fn fetch_history(
        &self,
        session_id: &str,
        credential: &str,
    ) -> Result<Vec<Message>, BackendError> {
        let url = self.endpoint(&["history", session_id])?;

        debug!("GET {}", url);

        self.execute(self.client.get(url), credential).await
    }

    async fn transcribe(
        &self,
        audio: AudioBlob,
        language: Language,
        credential: &str,
    ) -> Result<String, BackendError> {
        let url = self.endpoint(&["transcribe"])?;

        debug!("POST {} ({} bytes, {})", url, audio.len(), language);

        let part = Part::bytes(audio.bytes)
            .file_name(audio.file_name)
            .mime_str(&audio.mime_type)
            .map_err(|e| BackendError::InvalidRequest(format!("invalid audio mime type: {}", e)))?;
        let form = Form::new()
            .part("file", part)
            .text("language_name", language.name());

        let response: TranscribeResponse = self
            .execute(self.client.post(url).multipart(form), credential)
            .await?;
        Ok(response.transcript)
    }

    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
        credential: &str,
    ) -> Result<String, BackendError> {
        let url = self.endpoint(&["translate"])?;
        let body = TranslateRequest {
            text: text.to_string(),
            source_language: source,
            target_language: target,
        };

        debug!("POST {} ({} -> {})", url, source, target);

        let response: TranslateResponse = self.execute(self.client.post(url).json(&body), credential).await?;
        Ok(response.translated_text)
    }
}
