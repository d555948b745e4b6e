use std::{fmt, str::FromStr};

/// Client language of the save data. Item text is stored per-language in the
/// save records, so switching language forces a full re-parse.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Language {
    Japanese,
    English,
    French,
    German,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Japanese => "Japanese",
            Language::English => "English",
            Language::French => "French",
            Language::German => "German",
        }
    }

    /// Index of this language's name block inside a save record.
    pub fn index(&self) -> usize {
        match self {
            Language::Japanese => 0,
            Language::English => 1,
            Language::French => 2,
            Language::German => 3,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "japanese" | "jp" => Ok(Self::Japanese),
            "english" | "us" | "en" => Ok(Self::English),
            "french" | "fr" => Ok(Self::French),
            "german" | "de" => Ok(Self::German),
            _ => Err(format!("{} is not a supported client language.", s)),
        }
    }
}
