//! Helpers for sanitizing values before they enter log lines and span
//! attributes.

use std::path::Path;

/// Returns only the filename component of a path (no directory).
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Reduces a database connection string to its file name.
///
/// - `sqlite:///var/lib/app/signbook.db` → `sqlite://signbook.db`
/// - `:memory:` → `:memory:`
pub fn redact_database_url(url: &str) -> String {
    let (scheme, rest) = match url.find("://") {
        Some(pos) => (&url[..pos + 3], &url[pos + 3..]),
        None => ("", url),
    };
    if rest.is_empty() || rest == ":memory:" {
        return url.to_string();
    }
    format!("{}{}", scheme, redact_path(Path::new(rest)))
}
