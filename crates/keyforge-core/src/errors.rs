use keyforge_core_types::SiteLabel;
use thiserror::Error;

/// Result type alias using KfError
pub type Result<T> = std::result::Result<T, KfError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every failure the engine can report maps to exactly one kind, and every
/// kind maps to a stable code usable by callers and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KfErrorKind {
    // Configuration (first use and every use after)
    EmptyTemplate,
    UnknownParameter,
    UnknownMember,
    MalformedPlaceholder,
    FallbackDisabled,
    MissingBuilder,
    InvalidConfig,

    // Expression fallback
    ExpressionParse,
    ExpressionEvaluation,

    // Usage
    Unsupported,

    // External resource collaborator
    ResourceAcquire,
    ResourceRelease,

    // Internal
    Internal,
}

impl KfErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            KfErrorKind::EmptyTemplate => "ERR_EMPTY_TEMPLATE",
            KfErrorKind::UnknownParameter => "ERR_UNKNOWN_PARAMETER",
            KfErrorKind::UnknownMember => "ERR_UNKNOWN_MEMBER",
            KfErrorKind::MalformedPlaceholder => "ERR_MALFORMED_PLACEHOLDER",
            KfErrorKind::FallbackDisabled => "ERR_FALLBACK_DISABLED",
            KfErrorKind::MissingBuilder => "ERR_MISSING_BUILDER",
            KfErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            KfErrorKind::ExpressionParse => "ERR_EXPRESSION_PARSE",
            KfErrorKind::ExpressionEvaluation => "ERR_EXPRESSION_EVALUATION",
            KfErrorKind::Unsupported => "ERR_UNSUPPORTED",
            KfErrorKind::ResourceAcquire => "ERR_RESOURCE_ACQUIRE",
            KfErrorKind::ResourceRelease => "ERR_RESOURCE_RELEASE",
            KfErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether this kind is a template configuration failure.
    ///
    /// Configuration failures are deterministic for a given (method, template)
    /// pair and are never retried.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            KfErrorKind::EmptyTemplate
                | KfErrorKind::UnknownParameter
                | KfErrorKind::UnknownMember
                | KfErrorKind::MalformedPlaceholder
                | KfErrorKind::FallbackDisabled
                | KfErrorKind::MissingBuilder
                | KfErrorKind::InvalidConfig
        )
    }

    /// Whether this kind came out of the expression fallback
    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            KfErrorKind::ExpressionParse | KfErrorKind::ExpressionEvaluation
        )
    }
}

/// Canonical structured error type
///
/// Carries the classification plus the call-site context needed to find the
/// offending template.
#[derive(Debug, Clone, PartialEq)]
pub struct KfError {
    kind: KfErrorKind,
    op: Option<String>,
    site: Option<SiteLabel>,
    template: Option<String>,
    message: String,
    candidates: Option<Vec<String>>,
}

impl KfError {
    /// Create a new error with the specified kind
    pub fn new(kind: KfErrorKind) -> Self {
        Self {
            kind,
            op: None,
            site: None,
            template: None,
            message: String::new(),
            candidates: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add call-site context
    pub fn with_site(mut self, site: SiteLabel) -> Self {
        self.site = Some(site);
        self
    }

    /// Add template context
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add the names that would have been accepted (used for unknown parameters)
    pub fn with_candidates(mut self, names: Vec<String>) -> Self {
        self.candidates = Some(names);
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> KfErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the call-site context, if any
    pub fn site(&self) -> Option<&SiteLabel> {
        self.site.as_ref()
    }

    /// Get the template context, if any
    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get accepted names, if any (populated on UnknownParameter)
    pub fn candidates(&self) -> Option<&[String]> {
        self.candidates.as_deref()
    }

    /// Shorthand for `kind().is_configuration()`
    pub fn is_configuration(&self) -> bool {
        self.kind.is_configuration()
    }
}

impl std::fmt::Display for KfError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(site) = &self.site {
            write!(f, " (site: {})", site)?;
        }
        if let Some(template) = &self.template {
            write!(f, " (template: {:?})", template)?;
        }
        Ok(())
    }
}

impl std::error::Error for KfError {}

// ========== End Error Facility ==========

/// Failure taxonomy for template compilation and evaluation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KeyForgeError {
    // ===== Configuration =====
    /// Template is empty or blank
    #[error("key is empty")]
    EmptyTemplate,

    /// Placeholder names a parameter the method does not have
    #[error("unknown parameter '{name}' in template {template:?}, available: {}", .available.join(", "))]
    UnknownParameter {
        name: String,
        template: String,
        available: Vec<String>,
    },

    /// Dotted segment names a member the declared or runtime type does not expose
    #[error("type '{type_name}' has no getter or field '{member}' (template {template:?})")]
    UnknownMember {
        type_name: String,
        member: String,
        template: String,
    },

    /// Braces are unbalanced, nested, or enclose an empty path
    #[error("malformed placeholder at offset {offset} in {template:?}: {reason}")]
    MalformedPlaceholder {
        template: String,
        offset: usize,
        reason: String,
    },

    /// Template needs the expression fallback but it is switched off
    #[error("template {template:?} requires the expression fallback, which is disabled")]
    FallbackDisabled { template: String },

    /// Evaluator asked to build a resource without an attached builder
    #[error("no resource builder attached to evaluator for {site}")]
    MissingBuilder { site: String },

    /// Engine configuration could not be parsed
    #[error("invalid engine configuration: {reason}")]
    InvalidConfig { reason: String },

    // ===== Expression fallback =====
    /// Fallback expression failed to parse
    #[error("cannot parse expression {template:?}: {reason}")]
    ExpressionParse { template: String, reason: String },

    /// Fallback expression failed to resolve a reference
    #[error("cannot evaluate expression {template:?}: {reason}")]
    ExpressionEvaluation { template: String, reason: String },

    // ===== Usage =====
    /// Operation not available on this evaluator variant
    #[error("operation '{operation}' is not supported by {variant} evaluators")]
    Unsupported { operation: String, variant: String },

    // ===== Resources =====
    /// External resource could not be acquired
    #[error("acquire of resource {index} ({key}) failed: {reason}")]
    ResourceAcquire {
        index: usize,
        key: String,
        reason: String,
    },

    /// External resource could not be released
    #[error("release of resource ({key}) failed: {reason}")]
    ResourceRelease { key: String, reason: String },
}

impl From<KeyForgeError> for KfError {
    fn from(err: KeyForgeError) -> Self {
        let message = err.to_string();
        match err {
            KeyForgeError::EmptyTemplate => {
                KfError::new(KfErrorKind::EmptyTemplate).with_message(message)
            }

            KeyForgeError::UnknownParameter {
                template,
                available,
                ..
            } => KfError::new(KfErrorKind::UnknownParameter)
                .with_template(template)
                .with_candidates(available)
                .with_message(message),

            KeyForgeError::UnknownMember { template, .. } => {
                KfError::new(KfErrorKind::UnknownMember)
                    .with_template(template)
                    .with_message(message)
            }

            KeyForgeError::MalformedPlaceholder { template, .. } => {
                KfError::new(KfErrorKind::MalformedPlaceholder)
                    .with_template(template)
                    .with_message(message)
            }

            KeyForgeError::FallbackDisabled { template } => {
                KfError::new(KfErrorKind::FallbackDisabled)
                    .with_template(template)
                    .with_message(message)
            }

            KeyForgeError::MissingBuilder { .. } => {
                KfError::new(KfErrorKind::MissingBuilder).with_message(message)
            }

            KeyForgeError::InvalidConfig { .. } => {
                KfError::new(KfErrorKind::InvalidConfig).with_message(message)
            }

            KeyForgeError::ExpressionParse { template, .. } => {
                KfError::new(KfErrorKind::ExpressionParse)
                    .with_template(template)
                    .with_message(message)
            }

            KeyForgeError::ExpressionEvaluation { template, .. } => {
                KfError::new(KfErrorKind::ExpressionEvaluation)
                    .with_template(template)
                    .with_message(message)
            }

            KeyForgeError::Unsupported { .. } => {
                KfError::new(KfErrorKind::Unsupported).with_message(message)
            }

            KeyForgeError::ResourceAcquire { .. } => {
                KfError::new(KfErrorKind::ResourceAcquire).with_message(message)
            }

            KeyForgeError::ResourceRelease { .. } => {
                KfError::new(KfErrorKind::ResourceRelease).with_message(message)
            }
        }
    }
}

impl From<toml::de::Error> for KeyForgeError {
    fn from(err: toml::de::Error) -> Self {
        KeyForgeError::InvalidConfig {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for KeyForgeError {
    fn from(err: serde_json::Error) -> Self {
        KeyForgeError::InvalidConfig {
            reason: err.to_string(),
        }
    }
}
