//! Action-line parser.
//!
//! A model reply is plain text; only lines of the form
//! `Action: Name(key=value, ...)` are actionable. Everything else is
//! commentary and is dropped here.

use crate::literal::parse_literal;
use sentinel_core::action::{ActionCall, Arguments};
use serde_json::Value;
use tracing::debug;

pub const DIRECTIVE_PREFIX: &str = "Action:";

/// Extract every directive in `reply`, in order.
pub fn extract_directives(reply: &str) -> Vec<ActionCall> {
    reply.lines().filter_map(parse_directive).collect()
}

/// Parse one line. `None` means "not a directive", which is distinct from a
/// directive with no arguments.
pub fn parse_directive(line: &str) -> Option<ActionCall> {
    let line = strip_decoration(line);
    let rest = line.strip_prefix(DIRECTIVE_PREFIX)?.trim_start();

    let name_len = identifier_len(rest)?;
    let (name, after_name) = rest.split_at(name_len);

    let after_name = after_name.trim_start_matches([' ', '\t']);
    if !after_name.starts_with('(') {
        return None;
    }
    let close = after_name.rfind(')')?;
    let inner = &after_name[1..close];

    Some(ActionCall {
        name: name.to_string(),
        arguments: parse_arguments(inner),
    })
}

/// Leading whitespace, list bullets and wrapping backticks.
fn strip_decoration(line: &str) -> &str {
    let mut line = line.trim();
    for bullet in ["- ", "* ", "• "] {
        if let Some(rest) = line.strip_prefix(bullet) {
            line = rest.trim_start();
            break;
        }
    }
    line.trim_matches('`').trim()
}

/// Byte length of the identifier at the start of `text`, if any.
fn identifier_len(text: &str) -> Option<usize> {
    let mut chars = text.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return None,
    }
    let end = chars
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    Some(end)
}

fn is_identifier(text: &str) -> bool {
    identifier_len(text) == Some(text.len())
}

/// Parse the text between the parentheses into named arguments.
///
/// Pieces without a `key=` prefix are skipped; they never abort the line.
pub fn parse_arguments(text: &str) -> Arguments {
    let mut arguments = Arguments::new();

    for piece in split_top_level(text, ',') {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }

        let Some(eq) = find_top_level(piece, '=') else {
            debug!(piece = %piece, "Skipping positional argument");
            continue;
        };

        let key = piece[..eq].trim();
        if !is_identifier(key) {
            debug!(key = %key, "Skipping argument with invalid key");
            continue;
        }

        let raw = piece[eq + 1..].trim();
        let value = parse_literal(raw).unwrap_or_else(|| fallback_string(raw));
        arguments.insert(key.to_string(), value);
    }

    arguments
}

/// Keep unparseable text as a string, minus one pair of surrounding quotes.
fn fallback_string(raw: &str) -> Value {
    let trimmed = raw.trim();
    let unquoted = ['\'', '"']
        .iter()
        .find_map(|q| {
            trimmed
                .strip_prefix(*q)
                .and_then(|s| s.strip_suffix(*q))
        })
        .unwrap_or(trimmed);
    Value::String(unquoted.to_string())
}

/// Split on `sep` where it appears outside quotes and outside `()`, `[]`, `{}`.
pub fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    scan_top_level(text, |i, c| {
        if c == sep {
            pieces.push(&text[start..i]);
            start = i + c.len_utf8();
        }
        false
    });
    pieces.push(&text[start..]);
    pieces
}

/// Byte offset of the first top-level `target`.
fn find_top_level(text: &str, target: char) -> Option<usize> {
    let mut found = None;
    scan_top_level(text, |i, c| {
        if c == target {
            found = Some(i);
            return true;
        }
        false
    });
    found
}

/// Call `visit` for every char at nesting depth zero outside a string.
/// Stops early when `visit` returns true.
fn scan_top_level(text: &str, mut visit: impl FnMut(usize, char) -> bool) {
    let mut depth: usize = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '\'' | '"' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ if depth == 0 => {
                if visit(i, c) {
                    return;
                }
            }
            _ => {}
        }
    }
}
