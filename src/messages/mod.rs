//! Chat message types
//!
//! - `Message` / `Role`: a single immutable chat turn
//! - `Transcript`: the ordered, append-only conversation for one session
//! - `Language`: the display language replies and transcriptions target

mod language;
mod transcript;
mod types;

pub use language::{Language, UnknownLanguage};
pub use transcript::Transcript;
pub use types::{Message, Role};
