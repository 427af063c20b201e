pub mod audio;
pub mod backend;
pub mod config;
pub mod messages;
pub mod session;
pub mod store;

pub use audio::{
    AudioBlob, AudioFrame, CaptureBuffer, CaptureDevice, CaptureDeviceFactory, CaptureSource,
    UnavailableDevice, WavFileDevice,
};
pub use backend::{BackendError, ChatBackend, HttpBackend};
pub use config::Config;
pub use messages::{Language, Message, Role, Transcript};
pub use session::{
    InteractionStatus, SessionConfig, SessionController, SessionError, SessionEvent,
    CONNECTION_ERROR_REPLY,
};
pub use store::{load_session_config, LocalStore};
