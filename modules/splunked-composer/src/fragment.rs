//! Structural tests and rewrites over opaque SPL fragments.
//!
//! Fragments are never parsed. The only markers that matter are a leading `|`
//! (generating command), a leading `NOT` (already negated), a standalone `OR`
//! token (disjunction), and outer parentheses.

use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static OR_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bOR\b").unwrap());
static NOT_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^NOT\b").unwrap());

/// Collapse whitespace runs to single spaces and trim both ends.
pub fn normalize(fragment: &str) -> String {
    WHITESPACE_RE.replace_all(fragment.trim(), " ").into_owned()
}

/// A generating fragment starts a pipeline (`| tstats ...`) and cannot be
/// combined with other terms by juxtaposition.
pub fn is_generating(fragment: &str) -> bool {
    fragment.trim_start().starts_with('|')
}

/// True when the whole fragment sits inside one pair of parentheses, i.e. the
/// opening paren closes on the last character. `(a) OR (b)` is not wrapped.
/// Parens inside double-quoted strings are ignored.
pub fn is_wrapped(fragment: &str) -> bool {
    if fragment.len() < 2 || !fragment.starts_with('(') || !fragment.ends_with(')') {
        return false;
    }

    let last = fragment.len() - 1;
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, c) in fragment.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => in_quotes = !in_quotes,
            '(' if !in_quotes => depth += 1,
            ')' if !in_quotes => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i == last;
                }
            }
            _ => {}
        }
    }

    false
}

/// Starts with a standalone `NOT` (any case).
pub fn is_negated(fragment: &str) -> bool {
    NOT_PREFIX_RE.is_match(fragment)
}

/// Contains `OR` as a standalone token (any case). Identifiers such as
/// `category` or `error_code` do not count.
pub fn contains_or(fragment: &str) -> bool {
    OR_TOKEN_RE.is_match(fragment)
}

/// Parenthesize unless already wrapped or empty.
pub fn wrap(fragment: &str) -> String {
    if fragment.is_empty() || is_wrapped(fragment) {
        fragment.to_string()
    } else {
        format!("({fragment})")
    }
}

/// Protect a disjunction before it is juxtaposed with AND-implicit terms.
///
/// Negated fragments keep their `NOT`; only the remainder is wrapped, and only
/// when it holds an unprotected `OR`.
pub fn wrap_if_or(fragment: &str) -> String {
    if let Some(prefix) = NOT_PREFIX_RE.find(fragment) {
        let remainder = fragment[prefix.end()..].trim();
        if contains_or(remainder) && !is_wrapped(remainder) {
            return format!("NOT ({remainder})");
        }
        return fragment.to_string();
    }

    if contains_or(fragment) {
        wrap(fragment)
    } else {
        fragment.to_string()
    }
}
