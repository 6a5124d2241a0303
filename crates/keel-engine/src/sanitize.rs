//! Path sanitization
//!
//! Model output decorates paths with quotes, trailing punctuation, Windows
//! separators and template prefixes. Cleaning runs a single pass until the
//! path stops changing, so `sanitize_path` is idempotent.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static PLACEHOLDER_ROOT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^/?path/to(?:/|$)(?:(?:project|your-project|your_project|app|repo|workspace)(?:/|$))?",
    )
    .expect("valid placeholder regex")
});

const WRAPPERS: &[char] = &['`', '"', '\''];

/// Clean a raw path until it reaches a fixpoint
#[must_use]
pub fn sanitize_path(raw: &str) -> String {
    let mut current = raw.to_string();
    loop {
        let next = sanitize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Rewrite an absolute path under `root` to a root-relative one
///
/// Paths outside the root and relative paths are returned unchanged.
#[must_use]
pub fn relativize(root: &Path, path: &str) -> String {
    let root = root.to_string_lossy().replace('\\', "/");
    let root = root.trim_end_matches('/');
    if root.is_empty() || root == "." {
        return path.to_string();
    }

    let normalized = path.trim().replace('\\', "/");
    match normalized.strip_prefix(root) {
        Some(rest) if rest.starts_with('/') => rest.trim_start_matches('/').to_string(),
        _ => path.to_string(),
    }
}

fn sanitize_once(path: &str) -> String {
    let mut text = path.trim();

    while let Some(inner) = strip_wrapper(text) {
        text = inner.trim();
    }

    loop {
        let before = text.len();
        text = text.trim_end();
        text = text
            .strip_suffix("...")
            .or_else(|| text.strip_suffix('…'))
            .or_else(|| text.strip_suffix(','))
            .or_else(|| text.strip_suffix('.'))
            .unwrap_or(text);
        if text.len() == before {
            break;
        }
    }

    let mut cleaned = text.replace('\\', "/");
    while cleaned.contains("//") {
        cleaned = cleaned.replace("//", "/");
    }
    while let Some(rest) = cleaned.strip_prefix("./") {
        cleaned = rest.to_string();
    }
    PLACEHOLDER_ROOT.replace(&cleaned, "").into_owned()
}

fn strip_wrapper(text: &str) -> Option<&str> {
    let first = text.chars().next()?;
    if !WRAPPERS.contains(&first) || text.len() < 2 {
        return None;
    }
    text[first.len_utf8()..].strip_suffix(first)
}
