use anyhow::{Context, Result};
use hound::WavReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::backend::{AudioFrame, CaptureDevice};

/// Plays a WAV file back as a capture stream
///
/// Stands in for a microphone on machines without one (and in tests). The
/// file is split into `frame_ms` frames which are delivered in real time
/// unless pacing is disabled. When the file runs out the stream ends while
/// the device is still held, the same as a microphone being unplugged.
pub struct WavFileDevice {
    path: PathBuf,
    frame_ms: u64,
    paced: bool,
    capturing: Arc<AtomicBool>,
    feeder: Option<JoinHandle<()>>,
}

impl WavFileDevice {
    pub fn new(path: impl AsRef<Path>, frame_ms: u64) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            frame_ms: frame_ms.max(1),
            paced: true,
            capturing: Arc::new(AtomicBool::new(false)),
            feeder: None,
        }
    }

    /// Deliver frames as fast as the receiver takes them
    pub fn unpaced(mut self) -> Self {
        self.paced = false;
        self
    }

    fn load(&self) -> Result<(Vec<i16>, u32, u16)> {
        let reader = WavReader::open(&self.path)
            .with_context(|| format!("Failed to open WAV file: {}", self.path.display()))?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        Ok((samples, spec.sample_rate, spec.channels))
    }
}

#[async_trait::async_trait]
impl CaptureDevice for WavFileDevice {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.capturing.load(Ordering::SeqCst) {
            anyhow::bail!("{} is already in use", self.path.display());
        }

        let (samples, sample_rate, channels) = self.load()?;

        info!(
            "Capturing from {}: {}Hz, {} channels, {} samples",
            self.path.display(),
            sample_rate,
            channels,
            samples.len()
        );

        let samples_per_frame =
            ((sample_rate as u64 * channels as u64 * self.frame_ms) / 1000).max(1) as usize;
        let frame_ms = self.frame_ms;
        let paced = self.paced;
        let capturing = Arc::clone(&self.capturing);
        let (tx, rx) = mpsc::channel(64);

        self.capturing.store(true, Ordering::SeqCst);

        let feeder = tokio::spawn(async move {
            for (index, chunk) in samples.chunks(samples_per_frame).enumerate() {
                if !capturing.load(Ordering::SeqCst) {
                    break;
                }

                let frame = AudioFrame {
                    samples: chunk.to_vec(),
                    sample_rate,
                    channels,
                    timestamp_ms: index as u64 * frame_ms,
                };

                if tx.send(frame).await.is_err() {
                    break;
                }

                if paced {
                    tokio::time::sleep(Duration::from_millis(frame_ms)).await;
                }
            }
        });

        self.feeder = Some(feeder);

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if !self.capturing.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        // Dropping the feeder's sender is what ends the stream
        if let Some(feeder) = self.feeder.take() {
            feeder.abort();
            if let Err(e) = feeder.await {
                if !e.is_cancelled() {
                    warn!("WAV feeder task failed: {}", e);
                }
            }
        }

        info!("Released {}", self.path.display());

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "wav-file"
    }
}

impl Drop for WavFileDevice {
    fn drop(&mut self) {
        if let Some(feeder) = self.feeder.take() {
            feeder.abort();
        }
    }
}
