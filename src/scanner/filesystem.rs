//! File system walking for scanners

use ignore::WalkBuilder;
use std::path::{Component, Path};

use crate::error::ScanError;

/// List the files under `path` (a file or a directory below `root`)
///
/// Returns repository-relative paths with `/` separators, sorted. Hidden
/// files are included, `.git` is skipped and `.gitignore` rules apply.
pub fn walk_path(root: &Path, path: &str) -> Result<Vec<String>, ScanError> {
    let start = root.join(path);
    if !start.exists() {
        return Err(ScanError::PathNotFound {
            path: path.to_string(),
        });
    }

    let walker = WalkBuilder::new(&start)
        .hidden(false)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(true)
        .ignore(true)
        .parents(true)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut files = Vec::new();
    for entry in walker.flatten() {
        let entry_path = entry.path();

        if entry_path.components().any(|c| c.as_os_str() == ".git") {
            continue;
        }
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }

        if let Some(relative) = relative_slash_path(root, entry_path) {
            files.push(relative);
        }
    }

    files.sort();
    Ok(files)
}

fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_walk_directory() {
        let dir = tempdir().unwrap();
        let root = dir.path();

        fs::create_dir_all(root.join(".github/workflows")).unwrap();
        fs::write(root.join(".github/workflows/ci.yml"), "on: push").unwrap();
        fs::write(root.join(".github/workflows/release.yaml"), "on: push").unwrap();
        fs::write(root.join("README.md"), "hello").unwrap();

        let files = walk_path(root, ".github/workflows").unwrap();

        assert_eq!(
            files,
            vec![
                ".github/workflows/ci.yml".to_string(),
                ".github/workflows/release.yaml".to_string(),
            ]
        );
    }

    #[test]
    fn test_walk_single_file_and_root() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("deploy")).unwrap();
        fs::write(root.join("deploy/app.yaml"), "image: nginx").unwrap();
        fs::create_dir(root.join(".git")).unwrap();
        fs::write(root.join(".git/config"), "[core]").unwrap();

        assert_eq!(
            walk_path(root, "deploy/app.yaml").unwrap(),
            vec!["deploy/app.yaml".to_string()]
        );
        assert_eq!(
            walk_path(root, ".").unwrap(),
            vec!["deploy/app.yaml".to_string()]
        );
    }

    #[test]
    fn test_walk_missing_path() {
        let dir = tempdir().unwrap();
        let result = walk_path(dir.path(), "does/not/exist");
        assert!(matches!(result, Err(ScanError::PathNotFound { .. })));
    }
}
