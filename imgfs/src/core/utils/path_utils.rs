// SPDX-License-Identifier: MIT

//! Path utilities for image paths.
//!
//! Image paths always use `/` as separator. A trailing `/` marks a path that
//! must resolve to a directory, and `/` alone is the root.

use crate::core::errors::*;

/// Splits a path into its components, using `/` as separator.
///
/// Returns a Vec of non-empty components.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|part| !part.is_empty()).collect()
}

/// Join two path components with `/`, ensuring no duplicate slash
pub fn join_paths(base: &str, part: &str) -> String {
    let mut out = String::new();
    out.push_str(base.trim_end_matches('/'));
    out.push('/');
    out.push_str(part.trim_start_matches('/'));
    out
}

/// Parses an image path into its components and whether it names a
/// directory.
///
/// Doubled separators and empty paths are rejected.
pub fn parse_path(path: &str) -> FsPathResult<(Vec<&str>, bool)> {
    let path = path.trim();
    if path.is_empty() {
        return Err(FsPathError::Invalid("Empty path"));
    }
    if path.contains("//") {
        return Err(FsPathError::Invalid("Wrong syntax for path"));
    }
    if path == "/" {
        return Ok((Vec::new(), true));
    }

    let is_dir = path.ends_with('/');
    Ok((split_path(path), is_dir))
}

/// Last component of a path, if any.
pub fn file_name(path: &str) -> Option<&str> {
    split_path(path).pop()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_path() {
        assert_eq!(parse_path("/").unwrap(), (vec![], true));
        assert_eq!(parse_path("/A/X.TXT").unwrap(), (vec!["A", "X.TXT"], false));
        assert_eq!(parse_path("A/B/").unwrap(), (vec!["A", "B"], true));
        assert_eq!(parse_path("  docs  ").unwrap(), (vec!["docs"], false));
        assert!(parse_path("").is_err());
        assert!(parse_path("/A//B").is_err());
    }

    #[test]
    fn test_join_and_file_name() {
        assert_eq!(join_paths("A/", "/B"), "A/B");
        assert_eq!(join_paths("", "B"), "/B");
        assert_eq!(file_name("/A/B/"), Some("B"));
        assert_eq!(file_name("/"), None);
    }
}
