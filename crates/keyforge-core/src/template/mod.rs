//! Template front end: classification, tokenizing and compilation.

pub mod classify;
pub mod compile;
pub mod parse;

pub use classify::classify;
pub use compile::{compile_accessors, CompiledAccessors};
pub use parse::{parse, PlaceholderSpec, Segment};

use std::fmt;

/// Evaluation strategy chosen for a template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateClass {
    /// No placeholders; the template is the key
    Constant,
    /// Literal text and `{param.member...}` placeholders
    AccessorChain,
    /// Anything else; handed to the expression engine
    Expression,
}

impl TemplateClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateClass::Constant => "constant",
            TemplateClass::AccessorChain => "accessor-chain",
            TemplateClass::Expression => "expression",
        }
    }
}

impl fmt::Display for TemplateClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
