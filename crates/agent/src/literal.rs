//! Literal grammar for action argument values.
//!
//! Only literals are recognized, nothing is evaluated:
//!
//! ```text
//! value    = string | number | constant | mapping | sequence
//! string   = '...' | "..." | '''...''' | """..."""   (backslash escapes)
//! number   = ["+" | "-"] digits ["." digits] [("e" | "E") ["+" | "-"] digits]
//! constant = True | False | None | true | false | null
//! mapping  = "{" [key ":" value ("," key ":" value)* [","]] "}"
//! key      = string | IDENT | number
//! sequence = "[" [value ("," value)* [","]] "]"
//!          | "(" [value ("," value)* [","]] ")"
//! ```
//!
//! `(x)` without a comma is a parenthesized value, not a sequence.

use serde_json::{Map, Number, Value};

/// Nesting deeper than this is rejected instead of recursing further.
const MAX_DEPTH: usize = 64;

/// Parse `text` as a single literal. `None` if it is not exactly one literal.
pub fn parse_literal(text: &str) -> Option<Value> {
    let tokens = tokenize(text).ok()?;
    if tokens.is_empty() {
        return None;
    }
    let (value, rest) = parse_value(&tokens, 0).ok()?;
    rest.is_empty().then_some(value)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    Ident(String),
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Colon,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '{' | '}' | '[' | ']' | '(' | ')' | ',' | ':' => {
                chars.next();
                tokens.push(match c {
                    '{' => Token::LBrace,
                    '}' => Token::RBrace,
                    '[' => Token::LBracket,
                    ']' => Token::RBracket,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    ',' => Token::Comma,
                    _ => Token::Colon,
                });
            }
            '"' | '\'' => {
                let quote = c;
                chars.next();
                let triple = {
                    let mut ahead = chars.clone();
                    ahead.next() == Some(quote) && ahead.next() == Some(quote)
                };
                if triple {
                    chars.next();
                    chars.next();
                }
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some('\\') => match chars.next() {
                            Some('n') => s.push('\n'),
                            Some('t') => s.push('\t'),
                            Some('r') => s.push('\r'),
                            Some('0') => s.push('\0'),
                            Some('\\') => s.push('\\'),
                            Some('\'') => s.push('\''),
                            Some('"') => s.push('"'),
                            Some('\n') => {}
                            Some(other) => {
                                s.push('\\');
                                s.push(other);
                            }
                            None => return Err("unterminated string literal".into()),
                        },
                        Some(ch) if ch == quote && !triple => break,
                        Some(ch) if ch == quote => {
                            let mut ahead = chars.clone();
                            if ahead.next() == Some(quote) && ahead.next() == Some(quote) {
                                chars.next();
                                chars.next();
                                break;
                            }
                            s.push(ch);
                        }
                        Some(ch) => s.push(ch),
                        None => return Err("unterminated string literal".into()),
                    }
                }
                tokens.push(Token::Str(s));
            }
            _ if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                let mut num = String::new();
                num.push(c);
                chars.next();
                while let Some(&nc) = chars.peek() {
                    let exponent_sign =
                        (nc == '-' || nc == '+') && matches!(num.chars().last(), Some('e' | 'E'));
                    if nc.is_ascii_digit() || nc == '.' || nc == 'e' || nc == 'E' || nc == '_' || exponent_sign {
                        if nc != '_' {
                            num.push(nc);
                        }
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(number_token(&num)?);
            }
            _ if c.is_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some(&wc) = chars.peek() {
                    if wc.is_alphanumeric() || wc == '_' {
                        word.push(wc);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(match word.as_str() {
                    "True" | "true" => Token::Bool(true),
                    "False" | "false" => Token::Bool(false),
                    "None" | "null" => Token::Null,
                    _ => Token::Ident(word),
                });
            }
            _ => return Err(format!("unexpected character: {c}")),
        }
    }

    Ok(tokens)
}

fn number_token(text: &str) -> Result<Token, String> {
    let is_float = text.contains(['.', 'e', 'E']);
    if !is_float && let Ok(n) = text.parse::<i64>() {
        return Ok(Token::Int(n));
    }
    match text.parse::<f64>() {
        Ok(f) if f.is_finite() => Ok(Token::Float(f)),
        _ => Err(format!("invalid number: {text}")),
    }
}

fn parse_value(tokens: &[Token], depth: usize) -> Result<(Value, &[Token]), String> {
    if depth > MAX_DEPTH {
        return Err("literal nested too deeply".into());
    }

    let (first, rest) = tokens
        .split_first()
        .ok_or_else(|| "unexpected end of input".to_string())?;

    match first {
        Token::Str(s) => Ok((Value::String(s.clone()), rest)),
        Token::Int(n) => Ok((Value::Number((*n).into()), rest)),
        Token::Float(f) => Number::from_f64(*f)
            .map(|n| (Value::Number(n), rest))
            .ok_or_else(|| format!("invalid float: {f}")),
        Token::Bool(b) => Ok((Value::Bool(*b), rest)),
        Token::Null => Ok((Value::Null, rest)),
        Token::LBracket => parse_sequence(rest, &Token::RBracket, depth),
        Token::LParen => parse_parenthesized(rest, depth),
        Token::LBrace => parse_mapping(rest, depth),
        other => Err(format!("unexpected token: {other:?}")),
    }
}

fn parse_sequence<'a>(
    mut tokens: &'a [Token],
    close: &Token,
    depth: usize,
) -> Result<(Value, &'a [Token]), String> {
    let mut items = Vec::new();
    loop {
        if tokens.first() == Some(close) {
            return Ok((Value::Array(items), &tokens[1..]));
        }
        let (item, rest) = parse_value(tokens, depth + 1)?;
        items.push(item);
        match rest.first() {
            Some(Token::Comma) => tokens = &rest[1..],
            Some(t) if t == close => return Ok((Value::Array(items), &rest[1..])),
            _ => return Err("expected ',' or closing bracket".into()),
        }
    }
}

fn parse_parenthesized(tokens: &[Token], depth: usize) -> Result<(Value, &[Token]), String> {
    if tokens.first() == Some(&Token::RParen) {
        return Ok((Value::Array(Vec::new()), &tokens[1..]));
    }
    let (first, rest) = parse_value(tokens, depth + 1)?;
    match rest.first() {
        Some(Token::RParen) => Ok((first, &rest[1..])),
        Some(Token::Comma) => {
            let (tail, rest) = parse_sequence(&rest[1..], &Token::RParen, depth)?;
            let mut items = vec![first];
            if let Value::Array(more) = tail {
                items.extend(more);
            }
            Ok((Value::Array(items), rest))
        }
        _ => Err("expected ',' or ')'".into()),
    }
}

fn parse_mapping(mut tokens: &[Token], depth: usize) -> Result<(Value, &[Token]), String> {
    let mut map = Map::new();
    loop {
        let (key_token, rest) = tokens
            .split_first()
            .ok_or_else(|| "unterminated mapping".to_string())?;
        let key = match key_token {
            Token::RBrace => return Ok((Value::Object(map), rest)),
            Token::Str(s) | Token::Ident(s) => s.clone(),
            Token::Int(n) => n.to_string(),
            Token::Float(f) => f.to_string(),
            Token::Bool(b) => (if *b { "True" } else { "False" }).to_string(),
            other => return Err(format!("invalid mapping key: {other:?}")),
        };

        if rest.first() != Some(&Token::Colon) {
            return Err(format!("expected ':' after key '{key}'"));
        }
        let (value, rest) = parse_value(&rest[1..], depth + 1)?;
        map.insert(key, value);

        match rest.first() {
            Some(Token::Comma) => tokens = &rest[1..],
            Some(Token::RBrace) => return Ok((Value::Object(map), &rest[1..])),
            _ => return Err("expected ',' or '}'".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strings_with_either_quote() {
        assert_eq!(parse_literal("'a,b'"), Some(json!("a,b")));
        assert_eq!(parse_literal(r#""it's""#), Some(json!("it's")));
        assert_eq!(parse_literal(r"'don\'t'"), Some(json!("don't")));
        assert_eq!(parse_literal(r"'line\nbreak'"), Some(json!("line\nbreak")));
    }

    #[test]
    fn triple_quoted_strings() {
        assert_eq!(
            parse_literal("'''say 'hi' twice'''"),
            Some(json!("say 'hi' twice"))
        );
        assert_eq!(parse_literal(r#""""a""""#), Some(json!("a")));
    }

    #[test]
    fn unknown_escapes_are_kept() {
        assert_eq!(parse_literal(r"'C:\path'"), Some(json!(r"C:\path")));
    }

    #[test]
    fn numbers() {
        assert_eq!(parse_literal("1"), Some(json!(1)));
        assert_eq!(parse_literal("-42"), Some(json!(-42)));
        assert_eq!(parse_literal("3.5"), Some(json!(3.5)));
        assert_eq!(parse_literal("1e3"), Some(json!(1000.0)));
        assert_eq!(parse_literal("1_000"), Some(json!(1000)));
    }

    #[test]
    fn constants_in_both_spellings() {
        assert_eq!(parse_literal("True"), Some(json!(true)));
        assert_eq!(parse_literal("false"), Some(json!(false)));
        assert_eq!(parse_literal("None"), Some(Value::Null));
        assert_eq!(parse_literal("null"), Some(Value::Null));
    }

    #[test]
    fn mappings_with_quoted_and_bare_keys() {
        assert_eq!(
            parse_literal("{'search_query': 'cat:cs.AI', max_results: 5,}"),
            Some(json!({"search_query": "cat:cs.AI", "max_results": 5}))
        );
        assert_eq!(parse_literal("{}"), Some(json!({})));
    }

    #[test]
    fn sequences_and_tuples() {
        assert_eq!(parse_literal("[1, 'two', None]"), Some(json!([1, "two", null])));
        assert_eq!(parse_literal("(1, 2,)"), Some(json!([1, 2])));
        assert_eq!(parse_literal("()"), Some(json!([])));
        assert_eq!(parse_literal("('grouped')"), Some(json!("grouped")));
        assert_eq!(
            parse_literal("{'a': [1, {'b': (True,)}]}"),
            Some(json!({"a": [1, {"b": [true]}]}))
        );
    }

    #[test]
    fn non_literals_are_rejected() {
        assert_eq!(parse_literal(""), None);
        assert_eq!(parse_literal("arxiv.org"), None);
        assert_eq!(parse_literal("os.system('rm -rf /')"), None);
        assert_eq!(parse_literal("__import__('os')"), None);
        assert_eq!(parse_literal("1 + 1"), None);
        assert_eq!(parse_literal("'unterminated"), None);
        assert_eq!(parse_literal("{'a' 1}"), None);
        assert_eq!(parse_literal("[1, 2"), None);
    }

    #[test]
    fn deep_nesting_is_rejected_not_overflowed() {
        let deep = format!("{}{}", "[".repeat(10_000), "]".repeat(10_000));
        assert_eq!(parse_literal(&deep), None);
    }
}
