//! Supported target languages

use std::fmt;
use std::str::FromStr;

use crate::error::DubbingError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Language {
    #[default]
    English,
    Spanish,
    French,
    Hindi,
}

impl Language {
    pub const ALL: [Language; 4] = [Language::English, Language::Spanish, Language::French, Language::Hindi];

    /// Two-letter code shared by the recognizer and the TTS provider.
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Spanish => "es",
            Language::French => "fr",
            Language::Hindi => "hi",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Spanish => "Spanish",
            Language::French => "French",
            Language::Hindi => "Hindi",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = DubbingError;

    /// Accepts either the code or the display name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Language::ALL.into_iter()
            .find(|l| l.code().eq_ignore_ascii_case(wanted) || l.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DubbingError::input(format!(
                "Unsupported language '{}'. Choose one of: English, Spanish, French, Hindi", wanted
            )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_code_and_name() {
        assert_eq!("es".parse::<Language>().unwrap(), Language::Spanish);
        assert_eq!("French".parse::<Language>().unwrap(), Language::French);
        assert_eq!(" HI ".parse::<Language>().unwrap(), Language::Hindi);
        assert_eq!(Language::English.code(), "en");
    }

    #[test]
    fn test_parse_unknown() {
        assert!("de".parse::<Language>().is_err());
        assert!("".parse::<Language>().is_err());
    }
}
