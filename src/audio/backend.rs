use anyhow::Result;
use std::path::PathBuf;
use tokio::sync::mpsc;

use super::file::WavFileDevice;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

impl AudioFrame {
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0;
        }
        self.samples.len() as u64 * 1000 / (self.sample_rate as u64 * self.channels as u64)
    }
}

/// Exclusive audio input (a microphone or a stand-in)
///
/// A device is held by at most one recording at a time: `start` acquires it
/// and `stop` releases it. Once `stop` returns, the receiver handed out by
/// `start` must yield `None` after draining buffered frames.
#[async_trait::async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Acquire the device and start capturing
    ///
    /// Fails when the device is missing, already held, or access is denied.
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>>;

    /// Release the device
    async fn stop(&mut self) -> Result<()>;

    /// Check if the device is currently held
    fn is_capturing(&self) -> bool;

    /// Get device name for logging
    fn name(&self) -> &str;
}

/// Where recordings come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureSource {
    /// No input configured; every recording attempt is refused
    None,
    /// Play back a WAV file as if it were spoken into the microphone
    File(PathBuf),
}

/// Capture device factory
pub struct CaptureDeviceFactory;

impl CaptureDeviceFactory {
    /// Create the device for a configured source
    pub fn create(source: CaptureSource, frame_ms: u64) -> Box<dyn CaptureDevice> {
        match source {
            CaptureSource::None => Box::new(UnavailableDevice),
            CaptureSource::File(path) => Box::new(WavFileDevice::new(path, frame_ms)),
        }
    }
}

/// Device that refuses every acquisition
#[derive(Debug, Default)]
pub struct UnavailableDevice;

#[async_trait::async_trait]
impl CaptureDevice for UnavailableDevice {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        anyhow::bail!("No audio input device is configured")
    }

    async fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}
