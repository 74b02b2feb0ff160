//! Naming rules shared by the layout planner and the index renderer.
//!
//! Two different strings are derived from every title and they must never be
//! swapped:
//!
//! - the **path name** ([`sanitize_path_name`]) names folders and files, and
//! - the **display label** ([`display_label`]) is the text shown in headings
//!   and link labels.
//!
//! Link targets are the path names joined with `/` and passed through
//! [`link_target`].

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

/// Default maximum length (in characters) of a sanitized name.
pub const DEFAULT_MAX_NAME_LENGTH: usize = 200;

/// Fallback path name for titles that sanitize to nothing.
pub const UNTITLED_PATH_NAME: &str = "untitled";

/// Fallback display label for empty titles.
pub const UNTITLED_LABEL: &str = "Untitled";

/// Convert text to a filesystem-safe name.
///
/// Characters forbidden on common filesystems (`< > : " / \ | ? *`) become
/// `_`, leading and trailing dots and whitespace are stripped, and the
/// result is truncated to `max_length` characters. Never returns an empty
/// string. Distinct inputs may map to the same name; callers resolve that.
pub fn sanitize_path_name(text: &str, max_length: usize) -> String {
    static FORBIDDEN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("valid regex"));

    let replaced = FORBIDDEN_RE.replace_all(text, "_");
    let stripped = strip_edges(&replaced);

    let name = if stripped.chars().count() > max_length {
        let truncated: String = stripped.chars().take(max_length).collect();
        strip_edges(&truncated).to_string()
    } else {
        stripped.to_string()
    };

    if name.is_empty() {
        UNTITLED_PATH_NAME.to_string()
    } else {
        name
    }
}

/// Human-facing text for a title: trimmed, or `Untitled` when blank.
pub fn display_label(title: &str) -> &str {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        UNTITLED_LABEL
    } else {
        trimmed
    }
}

/// Encode a relative path for use as a Markdown link target.
///
/// Backslashes become `/`, then `%`, space, `#` and `?` are percent-encoded.
/// Slashes are left alone.
pub fn link_target(relative_path: &str) -> String {
    relative_path
        .replace('\\', "/")
        .replace('%', "%25")
        .replace(' ', "%20")
        .replace('#', "%23")
        .replace('?', "%3F")
}

/// Zero-padded 1-based position, padded to the width the sibling count needs.
pub fn format_order_prefix(index: usize, total: usize) -> String {
    let width = match total {
        0..=9 => 1,
        10..=99 => 2,
        100..=999 => 3,
        _ => 4,
    };
    format!("{index:0width$}")
}

/// Render `path` relative to `base` with forward slashes.
///
/// Falls back to the full path when `path` is not under `base`.
pub fn relative_link_path(path: &Path, base: &Path) -> String {
    let rel = path.strip_prefix(base).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn strip_edges(text: &str) -> &str {
    text.trim_matches(|c: char| c == '.' || c.is_whitespace())
}
