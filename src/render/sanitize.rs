//! Markup sanitizers
//!
//! Two distinct sanitizers with different safety requirements:
//! - [`node_id`] produces a bare token (letters, digits, underscore, not
//!   digit-leading) safe to use as a Mermaid node/participant identifier.
//! - [`label`] produces human-readable text safe inside quoted markup.
//!
//! They are deliberately separate; merging them would either corrupt labels
//! or produce unsafe identifiers.

/// Sanitize a raw name into a safe markup identifier.
pub fn node_id(raw: &str) -> String {
    let mut id: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    if id.is_empty() || id.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        id.insert(0, 'n');
    }
    id
}

/// Sanitize a raw name into quoted-label-safe text: quotes and markup
/// delimiters are replaced, newlines collapsed, surrounding whitespace
/// trimmed.
pub fn label(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '"' | '`' => '\'',
            '[' | '{' | '<' => '(',
            ']' | '}' | '>' => ')',
            '|' => '/',
            '\n' | '\r' | '\t' => ' ',
            other => other,
        })
        .collect::<String>()
        .trim()
        .to_string()
}
