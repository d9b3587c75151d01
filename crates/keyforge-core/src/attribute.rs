//! Declarative key attributes attached to guarded methods.

use serde::{Deserialize, Serialize};

use crate::errors::{KeyForgeError, Result};

/// Key declaration carried by a guard attribute.
///
/// `value` and `key` are aliases; `value` wins when both are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyAttribute {
    pub value: String,
    pub key: String,
    /// Proceed unguarded when the evaluated key is blank
    pub skip_blank_key: bool,
}

impl KeyAttribute {
    pub fn value(template: impl Into<String>) -> Self {
        Self {
            value: template.into(),
            ..Self::default()
        }
    }

    pub fn key(template: impl Into<String>) -> Self {
        Self {
            key: template.into(),
            ..Self::default()
        }
    }

    pub fn skipping_blank_keys(mut self) -> Self {
        self.skip_blank_key = true;
        self
    }

    /// The effective template
    ///
    /// # Errors
    ///
    /// `EmptyTemplate` when both `value` and `key` are blank.
    pub fn template(&self) -> Result<&str> {
        if !self.value.trim().is_empty() {
            Ok(&self.value)
        } else if !self.key.trim().is_empty() {
            Ok(&self.key)
        } else {
            Err(KeyForgeError::EmptyTemplate.into())
        }
    }
}
