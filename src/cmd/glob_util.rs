//! Expansion of `--init` arguments, which may be glob patterns.

use anyhow::{bail, Context};
use std::path::{Path, PathBuf};

pub fn is_glob_pattern(path: &str) -> bool {
    path.contains('*') || path.contains('?') || path.contains('[')
}

/// Files matching one literal path or glob pattern, sorted.
///
/// A literal path must exist; a pattern must match at least one file.
pub fn expand_file_pattern(pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    if !is_glob_pattern(pattern) {
        let path = Path::new(pattern);
        if !path.exists() {
            bail!("file does not exist: {}", path.display());
        }
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in glob::glob(pattern).with_context(|| format!("invalid glob pattern '{}'", pattern))? {
        let path = entry.with_context(|| format!("error reading path for pattern '{}'", pattern))?;
        if path.is_file() {
            files.push(path);
        }
    }

    if files.is_empty() {
        bail!("no files match pattern: {}", pattern);
    }
    files.sort();
    Ok(files)
}

/// Expand every pattern in order, keeping the first occurrence of a file
pub fn expand_scripts(patterns: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut scripts: Vec<PathBuf> = Vec::new();
    for pattern in patterns {
        for file in expand_file_pattern(pattern)? {
            if !scripts.contains(&file) {
                scripts.push(file);
            }
        }
    }
    Ok(scripts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_is_glob_pattern() {
        assert!(!is_glob_pattern("schema.sql"));
        assert!(is_glob_pattern("schema/*.sql"));
        assert!(is_glob_pattern("seed?.sql"));
        assert!(is_glob_pattern("[ab].sql"));
    }

    #[test]
    fn test_expand_sorted_and_deduplicated() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("02_data.sql"), "").unwrap();
        fs::write(dir.path().join("01_schema.sql"), "").unwrap();

        let first = dir.path().join("01_schema.sql").display().to_string();
        let all = format!("{}/*.sql", dir.path().display());
        let scripts = expand_scripts(&[first, all]).unwrap();

        let names: Vec<_> = scripts
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["01_schema.sql", "02_data.sql"]);
    }

    #[test]
    fn test_missing_literal_path_fails() {
        assert!(expand_file_pattern("/definitely/not/here.sql").is_err());
    }

    #[test]
    fn test_pattern_without_matches_fails() {
        let dir = TempDir::new().unwrap();
        let pattern = format!("{}/*.sql", dir.path().display());
        assert!(expand_file_pattern(&pattern).is_err());
    }
}
