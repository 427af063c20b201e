use crate::audio::{AudioBlob, CaptureBuffer, CaptureDevice};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

pub(crate) type SharedDevice = Arc<Mutex<Box<dyn CaptureDevice>>>;

/// One microphone capture, from acquisition to blob
///
/// A pump task moves frames from the device into the buffer. If the device
/// stream ends before the user stops (device unplugged, file exhausted), the
/// pump releases the device itself so no capture stream is left open.
pub(crate) struct RecordingSession {
    device: SharedDevice,
    buffer: Arc<Mutex<CaptureBuffer>>,
    pump: JoinHandle<()>,
}

impl RecordingSession {
    /// Acquire the device and start buffering
    pub async fn begin(device: SharedDevice) -> Result<Self> {
        let mut frames = {
            let mut guard = device.lock().await;
            let frames = guard.start().await?;
            info!("Recording started on {}", guard.name());
            frames
        };

        let buffer = Arc::new(Mutex::new(CaptureBuffer::new()));

        let pump_device = Arc::clone(&device);
        let pump_buffer = Arc::clone(&buffer);
        let pump = tokio::spawn(async move {
            while let Some(frame) = frames.recv().await {
                pump_buffer.lock().await.append(frame);
            }

            let mut device = pump_device.lock().await;
            if device.is_capturing() {
                warn!("Capture stream from {} ended, releasing device", device.name());
                if let Err(e) = device.stop().await {
                    error!("Failed to release {}: {}", device.name(), e);
                }
            }
        });

        Ok(Self {
            device,
            buffer,
            pump,
        })
    }

    /// Release the device and assemble everything captured into one blob
    pub async fn finish(self) -> Result<AudioBlob> {
        {
            let mut device = self.device.lock().await;
            if device.is_capturing() {
                if let Err(e) = device.stop().await {
                    error!("Failed to release {}: {}", device.name(), e);
                    self.pump.abort();
                }
            }
        }

        if let Err(e) = self.pump.await {
            if !e.is_cancelled() {
                error!("Capture pump panicked: {}", e);
            }
        }

        let buffer = std::mem::take(&mut *self.buffer.lock().await);
        info!(
            "Recording stopped: {} frames, {}ms",
            buffer.frame_count(),
            buffer.duration_ms()
        );

        buffer.finalize()
    }
}
