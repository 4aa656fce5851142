//! Language model identifiers.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A supported language model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ModelTag {
    /// `gpt-4o`
    #[serde(rename = "gpt-4o")]
    Gpt4o,
    /// `gpt-4o-mini`
    #[default]
    #[serde(rename = "gpt-4o-mini")]
    Gpt4oMini,
}

impl ModelTag {
    /// Every supported tag.
    pub const ALL: [Self; 2] = [Self::Gpt4o, Self::Gpt4oMini];

    /// The model name the OpenAI API expects.
    #[must_use]
    pub fn openai_name(self) -> &'static str {
        match self {
            Self::Gpt4o => "gpt-4o",
            Self::Gpt4oMini => "gpt-4o-mini",
        }
    }
}

impl fmt::Display for ModelTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.openai_name())
    }
}

impl FromStr for ModelTag {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|tag| tag.openai_name() == wanted)
            .ok_or_else(|| ConfigError::UnknownModel(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_model_tag() {
        assert_eq!("gpt-4o".parse::<ModelTag>().unwrap(), ModelTag::Gpt4o);
        assert_eq!(" GPT-4o-mini ".parse::<ModelTag>().unwrap(), ModelTag::Gpt4oMini);
    }

    #[test]
    fn test_unknown_model_tag() {
        let err = "gpt-2".parse::<ModelTag>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownModel(ref m) if m == "gpt-2"));
    }

    #[test]
    fn test_model_tag_serde_uses_api_names() {
        let json = serde_json::to_string(&ModelTag::Gpt4o).unwrap();
        assert_eq!(json, "\"gpt-4o\"");
        assert_eq!(ModelTag::default(), ModelTag::Gpt4oMini);
    }
}
