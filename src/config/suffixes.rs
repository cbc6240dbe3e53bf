//! URL suffix list loading for file mode

use crate::error::{AppError, Result};
use std::path::Path;

/// Read a suffix file: one suffix per line, blank lines and `#` comments skipped
pub fn read_suffix_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| AppError::config(format!("Failed to read suffix file '{}': {}", path.display(), e)))?;

    let suffixes = parse_suffixes(&content);
    if suffixes.is_empty() {
        return Err(AppError::config(format!(
            "Suffix file '{}' contains no URL suffixes",
            path.display()
        )));
    }

    Ok(suffixes)
}

/// Extract suffixes from file content
pub fn parse_suffixes(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_skips_blank_and_comment_lines() {
        let suffixes = parse_suffixes("# endpoints\n/users\n\n  /orders?page=2  \n#/skipped\n/health\n");
        assert_eq!(suffixes, vec!["/users", "/orders?page=2", "/health"]);
    }

    #[test]
    fn test_read_suffix_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "/a").unwrap();
        writeln!(file, "/b").unwrap();
        writeln!(file, "/a").unwrap();

        let suffixes = read_suffix_file(file.path()).unwrap();
        // duplicates are separate requests
        assert_eq!(suffixes, vec!["/a", "/b", "/a"]);
    }

    #[test]
    fn test_empty_suffix_file_is_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# nothing here").unwrap();
        writeln!(file).unwrap();

        let result = read_suffix_file(file.path());
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_missing_suffix_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_suffix_file(&dir.path().join("missing.txt"));
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
