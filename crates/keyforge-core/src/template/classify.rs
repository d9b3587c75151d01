use super::TemplateClass;

/// Characters allowed in literal text of a non-expression template
fn is_literal_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')
}

/// Decide how a template will be evaluated, in one forward scan.
///
/// Only the text before the first `{` is inspected: a character outside
/// `[A-Za-z0-9_.-}]` there makes the template an expression and ends the scan.
/// Once a `{` is seen the template is an accessor chain; everything after it,
/// placeholder bodies and trailing literals alike, is validated by the
/// compiler.
pub fn classify(template: &str) -> TemplateClass {
    for c in template.chars() {
        match c {
            '{' => return TemplateClass::AccessorChain,
            '}' => {}
            c if is_literal_char(c) => {}
            _ => return TemplateClass::Expression,
        }
    }
    TemplateClass::Constant
}
