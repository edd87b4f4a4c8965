#![doc = include_str!("../README.md")]

use core::fmt::Display;

use serde_json::Value;
use thisisplural::Plural;

/// Prefix used for pointers written in URI fragment form.
pub const FRAGMENT_ROOT: &str = "#";

/// A parsed JSON pointer: the unescaped reference tokens in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Plural)]
pub struct JsonPointer(pub Vec<String>);

impl JsonPointer {
    /// Create an empty pointer referencing the whole document
    pub fn root() -> Self {
        JsonPointer(Vec::new())
    }

    /// Check if this pointer references the whole document
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse a pointer in plain (`/a/b`) or fragment (`#/a/b`) form.
    pub fn parse(pointer: &str) -> Self {
        JsonPointer(split(pointer))
    }

    /// Append one unescaped token.
    pub fn push(&mut self, token: impl Into<String>) {
        self.0.push(token.into());
    }

    /// Remove and return the last token.
    pub fn pop(&mut self) -> Option<String> {
        self.0.pop()
    }

    /// Resolve this pointer against `value`.
    pub fn get<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        self.0
            .iter()
            .try_fold(value, |current, token| get_token(current, token))
    }
}

impl Display for JsonPointer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{FRAGMENT_ROOT}")?;
        for token in &self.0 {
            write!(f, "/{}", escape(token))?;
        }
        Ok(())
    }
}

/// Escape a single reference token (`~` → `~0`, `/` → `~1`).
pub fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Unescape a single reference token (`~1` → `/`, `~0` → `~`).
pub fn unescape(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

/// Split a pointer into its unescaped tokens.
///
/// Accepts `""`, `"#"`, `"/a/b"` and `"#/a/b"`. A pointer without a leading
/// slash (`"a/b"`) is read leniently as if it had one.
pub fn split(pointer: &str) -> Vec<String> {
    let pointer = pointer.strip_prefix(FRAGMENT_ROOT).unwrap_or(pointer);
    let pointer = pointer.strip_prefix('/').unwrap_or(pointer);
    if pointer.is_empty() {
        return Vec::new();
    }
    pointer.split('/').map(unescape).collect()
}

/// Append one unescaped token to a pointer, returning fragment form.
pub fn join(base: &str, token: &str) -> String {
    let base = normalize(base);
    format!("{base}/{}", escape(token))
}

/// Append several unescaped tokens to a pointer, returning fragment form.
pub fn join_all<I, S>(base: &str, tokens: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = normalize(base);
    for token in tokens {
        out.push('/');
        out.push_str(&escape(token.as_ref()));
    }
    out
}

/// Bring a pointer into fragment form without a trailing slash.
pub fn normalize(pointer: &str) -> String {
    let rest = pointer.strip_prefix(FRAGMENT_ROOT).unwrap_or(pointer);
    let rest = rest.strip_suffix('/').unwrap_or(rest);
    if rest.is_empty() {
        FRAGMENT_ROOT.to_string()
    } else if rest.starts_with('/') {
        format!("{FRAGMENT_ROOT}{rest}")
    } else {
        format!("{FRAGMENT_ROOT}/{rest}")
    }
}

/// Resolve `pointer` against `value`.
pub fn get<'v>(value: &'v Value, pointer: &str) -> Option<&'v Value> {
    split(pointer)
        .iter()
        .try_fold(value, |current, token| get_token(current, token))
}

/// Look up one unescaped token in an object or array.
pub fn get_token<'v>(value: &'v Value, token: &str) -> Option<&'v Value> {
    match value {
        Value::Object(map) => map.get(token),
        Value::Array(items) => parse_index(token).and_then(|index| items.get(index)),
        _ => None,
    }
}

/// Parse an array index token. Leading zeros are rejected.
pub fn parse_index(token: &str) -> Option<usize> {
    if token.is_empty() || (token.len() > 1 && token.starts_with('0')) {
        return None;
    }
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// Check that a string is a syntactically valid JSON pointer (plain form).
pub fn is_valid(pointer: &str) -> bool {
    if pointer.is_empty() {
        return true;
    }
    if !pointer.starts_with('/') {
        return false;
    }
    let bytes = pointer.as_bytes();
    bytes.iter().enumerate().all(|(i, &b)| {
        b != b'~' || matches!(bytes.get(i + 1), Some(b'0') | Some(b'1'))
    })
}

/// The parent pointer and the last unescaped token, if any.
pub fn split_last(pointer: &str) -> Option<(String, String)> {
    let mut tokens = split(pointer);
    let last = tokens.pop()?;
    Some((join_all(FRAGMENT_ROOT, &tokens), last))
}
