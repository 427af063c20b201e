use anyhow::{Context, Result};
use std::io::Cursor;
use tracing::{debug, warn};

use super::backend::AudioFrame;

const DEFAULT_SAMPLE_RATE: u32 = 16000;
const DEFAULT_CHANNELS: u16 = 1;

/// A finished recording, ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBlob {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
}

impl AudioBlob {
    pub fn wav(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime_type: "audio/wav".to_string(),
            file_name: "record.wav".to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Frames captured during one recording
///
/// The format is fixed by the first frame; later frames with a different
/// sample rate or channel count are dropped, as are frames reporting a zero
/// rate or zero channels.
#[derive(Debug, Default)]
pub struct CaptureBuffer {
    samples: Vec<i16>,
    format: Option<(u32, u16)>,
    frames: usize,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, frame: AudioFrame) {
        let format = (frame.sample_rate, frame.channels);
        if format.0 == 0 || format.1 == 0 {
            warn!(
                "Dropping frame at {}ms: invalid format {}Hz/{}ch",
                frame.timestamp_ms, format.0, format.1
            );
            return;
        }
        match self.format {
            None => self.format = Some(format),
            Some(expected) if expected != format => {
                warn!(
                    "Dropping frame at {}ms: format {}Hz/{}ch differs from {}Hz/{}ch",
                    frame.timestamp_ms, format.0, format.1, expected.0, expected.1
                );
                return;
            }
            Some(_) => {}
        }

        self.samples.extend_from_slice(&frame.samples);
        self.frames += 1;
    }

    pub fn frame_count(&self) -> usize {
        self.frames
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn duration_ms(&self) -> u64 {
        let (sample_rate, channels) = self.format.unwrap_or((DEFAULT_SAMPLE_RATE, DEFAULT_CHANNELS));
        self.samples.len() as u64 * 1000 / (sample_rate as u64 * channels as u64)
    }

    /// Encode everything captured so far as a single 16-bit WAV blob.
    ///
    /// An empty buffer still produces a valid (header-only) WAV.
    pub fn finalize(self) -> Result<AudioBlob> {
        let (sample_rate, channels) = self.format.unwrap_or((DEFAULT_SAMPLE_RATE, DEFAULT_CHANNELS));
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .context("Failed to start WAV encoding")?;
            for &sample in &self.samples {
                writer
                    .write_sample(sample)
                    .context("Failed to write sample to WAV")?;
            }
            writer.finalize().context("Failed to finalize WAV")?;
        }

        let bytes = cursor.into_inner();
        debug!(
            "Recording finalized: {} frames, {} samples, {} bytes",
            self.frames,
            self.samples.len(),
            bytes.len()
        );

        Ok(AudioBlob::wav(bytes))
    }
}
