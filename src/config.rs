use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::audio::CaptureSource;
use crate::backend::DEFAULT_BASE_URL;
use crate::messages::Language;

/// Prefix of environment overrides, e.g. `AGROGPT_BACKEND__BASE_URL`
pub const ENV_PREFIX: &str = "AGROGPT";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    #[serde(default)]
    pub store: StoreConfig,
    pub session: SessionSettings,
    pub capture: CaptureConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    /// Per-request timeout; unset means requests may wait indefinitely
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StoreConfig {
    /// Store file; defaults to the platform config directory
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct SessionSettings {
    /// Display name, matched case-insensitively
    pub language: String,
}

#[derive(Debug, Deserialize)]
pub struct CaptureConfig {
    /// WAV file used as the microphone; unset disables recording
    pub file: Option<PathBuf>,
    pub frame_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct LogConfig {
    pub level: String,
}

impl Config {
    /// Load defaults, then the optional file at `path`, then `AGROGPT_*`
    /// environment overrides.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("backend.base_url", DEFAULT_BASE_URL)?
            .set_default("session.language", Language::default().name())?
            .set_default("capture.frame_ms", 100)?
            .set_default("log.level", "info")?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn language(&self) -> Result<Language> {
        Ok(self.session.language.parse()?)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.backend.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn capture_source(&self) -> CaptureSource {
        match &self.capture.file {
            Some(path) => CaptureSource::File(path.clone()),
            None => CaptureSource::None,
        }
    }
}
