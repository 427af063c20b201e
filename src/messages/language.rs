use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Display language for replies and speech recognition
///
/// The backend expects the display name (e.g. `"Hindi"`), not an ISO code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    Hindi,
    Gujarati,
    Bengali,
    Kannada,
    Punjabi,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::English,
        Language::Hindi,
        Language::Gujarati,
        Language::Bengali,
        Language::Kannada,
        Language::Punjabi,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
            Language::Gujarati => "Gujarati",
            Language::Bengali => "Bengali",
            Language::Kannada => "Kannada",
            Language::Punjabi => "Punjabi",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unsupported language: {0}")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Language::ALL
            .into_iter()
            .find(|lang| lang.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownLanguage(wanted.to_string()))
    }
}
