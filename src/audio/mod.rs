pub mod backend;
pub mod buffer;
pub mod file;

pub use backend::{
    AudioFrame, CaptureDevice, CaptureDeviceFactory, CaptureSource, UnavailableDevice,
};
pub use buffer::{AudioBlob, CaptureBuffer};
pub use file::WavFileDevice;
