//! Engine configuration
//!
//! Loaded from TOML or JSON text; every field has a default so partial
//! documents are accepted.

use serde::{Deserialize, Serialize};

use crate::errors::{KeyForgeError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Text substituted for absent values when a placeholder has no default
    pub default_text: String,
    /// Resolve placeholders against declared parameter names
    pub use_parameter_names: bool,
    /// Route templates the accessor compiler cannot handle to the expression engine
    pub expression_fallback: bool,
    /// Prefixes accepted for positional references (`arg0`, `p0`)
    pub positional_prefixes: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_text: "null".to_string(),
            use_parameter_names: true,
            expression_fallback: true,
            positional_prefixes: vec!["arg".to_string(), "p".to_string()],
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when the text is not valid TOML or fails validation.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(text).map_err(KeyForgeError::from)?;
        config.validate()
    }

    /// Parse a JSON document
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when the text is not valid JSON or fails validation.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(text).map_err(KeyForgeError::from)?;
        config.validate()
    }

    fn validate(self) -> Result<Self> {
        if let Some(bad) = self
            .positional_prefixes
            .iter()
            .find(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_alphabetic() || c == '_'))
        {
            return Err(KeyForgeError::InvalidConfig {
                reason: format!("positional prefix {:?} must be a non-empty identifier", bad),
            }
            .into());
        }
        Ok(self)
    }
}
