//! Presentation-format helpers shared by the per-type codecs.

use std::{net::Ipv6Addr, str::FromStr};

use itertools::Itertools;

use super::{DecodeError, RecordType};

/// Appends the root label to a domain name unless it already carries one.
pub(crate) fn ensure_trailing_dot(name: &str) -> String {
    let name = name.trim();
    if name.ends_with('.') {
        name.to_owned()
    } else {
        format!("{}.", name)
    }
}

/// Wraps a character-string in double quotes, escaping `\` and `"`.
pub(crate) fn escape_text(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Like [`escape_text`], but strings that already arrive quoted with their inner
/// quotes escaped are passed through untouched.
pub(crate) fn quote_text(text: &str) -> String {
    if is_quoted(text) {
        text.to_owned()
    } else {
        escape_text(text)
    }
}

// A complete quoted character-string: no bare quote inside, no dangling escape
fn is_quoted(text: &str) -> bool {
    let inner = match text.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
        Some(inner) => inner,
        None => return false,
    };
    let mut escaped = false;
    for c in inner.chars() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return false,
            _ => {}
        }
    }
    !escaped
}

/// Resolves the backslash escapes [`tokenize`] leaves in a quoted token.
pub(crate) fn unescape_text(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            _ => out.push(c),
        }
    }
    out
}

/// Collapses any run of whitespace into a single space.
pub(crate) fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().join(" ")
}

/// Removes all whitespace, for base64/hex blobs that servers may return wrapped.
pub(crate) fn strip_whitespace(s: &str) -> String {
    s.split_whitespace().collect()
}

/// Renders an IPv6 address as eight groups of four hex digits.
pub(crate) fn expand_ipv6(addr: &Ipv6Addr) -> String {
    addr.segments()
        .iter()
        .map(|s| format!("{:04x}", s))
        .join(":")
}

/// Splits presentation-format RDATA into tokens. Quoted character-strings become a
/// single token holding the text between the quotes, escapes left as they are.
pub(crate) fn tokenize(rdata: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = rdata.trim().chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let mut token = String::new();
        if c == '"' {
            chars.next();
            let mut escaped = false;
            for c in chars.by_ref() {
                if escaped {
                    token.push(c);
                    escaped = false;
                    continue;
                }
                match c {
                    '\\' => {
                        token.push(c);
                        escaped = true;
                    }
                    '"' => break,
                    _ => token.push(c),
                }
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                token.push(c);
                chars.next();
            }
        }
        tokens.push(token);
    }
    tokens
}

/// Sequential reader over the tokens of a single RDATA entry.
pub(crate) struct RdataReader {
    record_type: RecordType,
    tokens: std::vec::IntoIter<String>,
}

impl RdataReader {
    /// Reader for types that render exactly one RDATA string.
    pub(crate) fn single(record_type: RecordType, rdata: &[String]) -> Result<Self, DecodeError> {
        match rdata {
            [entry] => Ok(Self::entry(record_type, entry)),
            _ => Err(DecodeError::new(
                record_type,
                format!("expected exactly one RDATA entry, got {}", rdata.len()),
            )),
        }
    }

    pub(crate) fn entry(record_type: RecordType, entry: &str) -> Self {
        RdataReader {
            record_type,
            tokens: tokenize(entry).into_iter(),
        }
    }

    pub(crate) fn text(&mut self, field: &str) -> Result<String, DecodeError> {
        self.tokens
            .next()
            .ok_or_else(|| DecodeError::new(self.record_type, format!("missing field '{}'", field)))
    }

    pub(crate) fn number<T: FromStr>(&mut self, field: &str) -> Result<T, DecodeError> {
        let token = self.text(field)?;
        token.parse().map_err(|_| {
            DecodeError::new(
                self.record_type,
                format!("field '{}' is not a valid number: '{}'", field, token),
            )
        })
    }

    /// Everything left, joined with `sep`.
    pub(crate) fn rest(&mut self, sep: &str) -> String {
        self.tokens.by_ref().join(sep)
    }

    pub(crate) fn finish(mut self) -> Result<(), DecodeError> {
        match self.tokens.next() {
            None => Ok(()),
            Some(extra) => Err(DecodeError::new(
                self.record_type,
                format!("unexpected trailing data '{}'", extra),
            )),
        }
    }
}
