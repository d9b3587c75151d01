//! Tokenizer for accessor-chain templates.
//!
//! Splits a template into literal spans and `{spec}` spans, where
//! `spec = name[.member]*[:default]`.

use crate::errors::KeyForgeError;

/// One parsed placeholder body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderSpec {
    /// Parameter name or positional alias
    pub name: String,
    /// Member segments after the parameter name
    pub path: Vec<String>,
    /// Text after the first `:`, if any
    pub default: Option<String>,
    /// Byte offset of the opening brace
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Placeholder(PlaceholderSpec),
}

/// Tokenize `template`.
///
/// Adjacent literal text is merged into one segment.
///
/// # Errors
///
/// `MalformedPlaceholder` for nested `{`, an unclosed `{`, a stray `}`, an
/// empty placeholder, or an empty path segment.
pub fn parse(template: &str) -> Result<Vec<Segment>, KeyForgeError> {
    let malformed = |offset: usize, reason: &str| KeyForgeError::MalformedPlaceholder {
        template: template.to_string(),
        offset,
        reason: reason.to_string(),
    };

    let mut segments = Vec::new();
    let mut literal_start = 0usize;
    let mut open: Option<usize> = None;

    for (i, c) in template.char_indices() {
        match (c, open) {
            ('{', Some(_)) => return Err(malformed(i, "nested '{'")),
            ('{', None) => {
                if literal_start < i {
                    segments.push(Segment::Literal(template[literal_start..i].to_string()));
                }
                open = Some(i);
            }
            ('}', None) => return Err(malformed(i, "unmatched '}'")),
            ('}', Some(start)) => {
                let body = &template[start + 1..i];
                segments.push(Segment::Placeholder(parse_spec(body, start, &malformed)?));
                open = None;
                literal_start = i + 1;
            }
            _ => {}
        }
    }

    if let Some(start) = open {
        return Err(malformed(start, "unclosed '{'"));
    }
    if literal_start < template.len() {
        segments.push(Segment::Literal(template[literal_start..].to_string()));
    }
    Ok(segments)
}

fn parse_spec(
    body: &str,
    offset: usize,
    malformed: &dyn Fn(usize, &str) -> KeyForgeError,
) -> Result<PlaceholderSpec, KeyForgeError> {
    let (path, default) = match body.split_once(':') {
        Some((path, default)) => (path, Some(default.to_string())),
        None => (body, None),
    };

    if path.trim().is_empty() {
        return Err(malformed(offset, "empty placeholder"));
    }

    let mut parts = path.split('.').map(str::trim);
    let name = parts.next().unwrap_or_default().to_string();
    let members: Vec<String> = parts.map(str::to_string).collect();

    if name.is_empty() || members.iter().any(String::is_empty) {
        return Err(malformed(offset, "empty path segment"));
    }

    Ok(PlaceholderSpec {
        name,
        path: members,
        default,
        offset,
    })
}
