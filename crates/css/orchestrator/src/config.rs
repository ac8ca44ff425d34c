//! Engine configuration.

use css_cascade::CssError;
use css_matching::MatcherConfig;
use css_syntax::ParseOptions;
use serde::Deserialize;

/// Settings of one engine. Missing keys take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EngineConfig {
    /// Log automaton dumps and matcher transitions at trace level.
    pub trace: bool,
    /// Language of a document that declares none.
    pub default_language: String,
    /// Media types whose rules and imports are kept.
    pub media: Vec<String>,
    /// Qualified names of identifier-typed attributes.
    pub id_attributes: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trace: false,
            default_language: MatcherConfig::default().default_language,
            media: ParseOptions::default().media,
            id_attributes: vec!["id".to_owned(), "xml:id".to_owned()],
        }
    }
}

impl EngineConfig {
    /// Read a configuration from JSON.
    ///
    /// # Errors
    /// Returns `CssError::Config` if the text is not a valid configuration.
    pub fn from_json(text: &str) -> Result<Self, CssError> {
        serde_json::from_str(text).map_err(|error| CssError::Config(error.to_string()))
    }

    pub fn matcher_config(&self) -> MatcherConfig {
        MatcherConfig {
            default_language: self.default_language.clone(),
            trace: self.trace,
        }
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            media: self.media.clone(),
        }
    }

    /// Whether the attribute with this qualified name is identifier-typed.
    #[inline]
    pub fn is_id_attribute(&self, qname: &str) -> bool {
        self.id_attributes.iter().any(|name| name == qname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::error::Error;

    #[test]
    fn missing_keys_take_defaults() -> Result<(), Box<dyn Error>> {
        let config = EngineConfig::from_json(r#"{ "trace": true, "media": ["screen"] }"#)?;
        assert!(config.trace);
        assert_eq!(config.media, ["screen"]);
        assert_eq!(config.default_language, "en-GB");
        assert!(config.is_id_attribute("xml:id"));
        assert_eq!(config.parse_options().media, ["screen"]);
        Ok(())
    }

    #[test]
    fn keys_are_kebab_case() -> Result<(), Box<dyn Error>> {
        let config = EngineConfig::from_json(r#"{ "default-language": "nl", "id-attributes": ["name"] }"#)?;
        assert_eq!(config.matcher_config().default_language, "nl");
        assert!(config.is_id_attribute("name"));
        assert!(!config.is_id_attribute("id"));
        Ok(())
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let result = EngineConfig::from_json(r#"{ "trace": "yes" }"#);
        assert!(matches!(result, Err(CssError::Config(_))));
    }
}
