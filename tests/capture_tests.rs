// Integration tests for capture devices
//
// A short WAV is written to a temp dir and played back through the file
// device the CLI uses in place of a microphone.

use agrogpt_client::{CaptureBuffer, CaptureDevice, CaptureDeviceFactory, CaptureSource, WavFileDevice};
use anyhow::Result;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_wav(dir: &Path, samples: &[i16], sample_rate: u32) -> Result<PathBuf> {
    let path = dir.join("question.wav");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(path)
}

#[tokio::test]
async fn test_wav_device_streams_whole_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let samples: Vec<i16> = (0..4000).map(|i| (i % 200) as i16).collect();
    let path = write_wav(temp_dir.path(), &samples, 16000)?;

    let mut device = WavFileDevice::new(&path, 100).unpaced();
    let mut frames = device.start().await?;
    assert!(device.is_capturing());

    let mut buffer = CaptureBuffer::new();
    let mut timestamps = Vec::new();
    while let Some(frame) = frames.recv().await {
        timestamps.push(frame.timestamp_ms);
        buffer.append(frame);
    }

    // 4000 samples at 16kHz in 100ms frames of 1600 samples
    assert_eq!(timestamps, vec![0, 100, 200]);
    assert_eq!(buffer.sample_count(), 4000);
    assert!(device.is_capturing(), "Device stays held until released");

    device.stop().await?;
    assert!(!device.is_capturing());

    let blob = buffer.finalize()?;
    let mut reader = hound::WavReader::new(Cursor::new(blob.bytes))?;
    let decoded: Vec<i16> = reader.samples::<i16>().collect::<Result<_, _>>()?;
    assert_eq!(decoded, samples);

    Ok(())
}

#[tokio::test]
async fn test_wav_device_is_exclusive() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = write_wav(temp_dir.path(), &[0; 16000], 16000)?;

    let mut device = WavFileDevice::new(&path, 100);
    let _frames = device.start().await?;

    assert!(device.start().await.is_err(), "Second acquisition must fail");

    device.stop().await?;
    let _again = device.start().await?;
    device.stop().await?;

    Ok(())
}

#[tokio::test]
async fn test_stop_ends_stream() -> Result<()> {
    let temp_dir = TempDir::new()?;
    // 10 seconds of audio, paced in real time
    let path = write_wav(temp_dir.path(), &vec![1; 160000], 16000)?;

    let mut device = WavFileDevice::new(&path, 100);
    let mut frames = device.start().await?;
    assert!(frames.recv().await.is_some());

    device.stop().await?;

    let drained = tokio::time::timeout(std::time::Duration::from_secs(1), async {
        let mut count = 0;
        while frames.recv().await.is_some() {
            count += 1;
        }
        count
    })
    .await?;
    assert!(drained < 100, "Stream must end after release");

    Ok(())
}

#[tokio::test]
async fn test_missing_file_fails_to_start() {
    let mut device = WavFileDevice::new("/nonexistent/question.wav", 100);

    let err = device.start().await.unwrap_err();

    assert!(err.to_string().contains("Failed to open WAV file"));
    assert!(!device.is_capturing());
}

#[tokio::test]
async fn test_factory_without_source_refuses_recording() {
    let mut device = CaptureDeviceFactory::create(CaptureSource::None, 100);

    assert_eq!(device.name(), "unavailable");
    assert!(device.start().await.is_err());
    assert!(!device.is_capturing());
}

#[tokio::test]
async fn test_factory_builds_file_device() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = write_wav(temp_dir.path(), &[0; 160], 16000)?;

    let mut device = CaptureDeviceFactory::create(CaptureSource::File(path), 10);
    assert_eq!(device.name(), "wav-file");

    let mut frames = device.start().await?;
    assert!(frames.recv().await.is_some());
    device.stop().await?;

    Ok(())
}
