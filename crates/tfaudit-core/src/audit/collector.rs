use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

/// Collect the files under `root` whose name ends with `extension`.
///
/// A single matching file yields a one-element vector. A directory is walked
/// recursively. Anything else (missing path, wrong extension) yields an empty
/// vector, which callers treat as "nothing to audit" rather than an error.
pub fn collect_files(root: &Path, extension: &str) -> Vec<PathBuf> {
    if root.is_file() {
        return if matches_extension(root, extension) {
            vec![root.to_path_buf()]
        } else {
            Vec::new()
        };
    }
    if !root.is_dir() {
        debug!(path = %root.display(), "path does not exist or is not a regular file");
        return Vec::new();
    }
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| matches_extension(path, extension))
        .collect()
}

fn matches_extension(path: &Path, extension: &str) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(extension))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "# terraform\n").unwrap();
    }

    #[test]
    fn single_matching_file_is_collected() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("main.tf");
        touch(&file);
        assert_eq!(collect_files(&file, ".tf"), vec![file]);
    }

    #[test]
    fn single_file_with_other_extension_is_ignored() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("notes.txt");
        touch(&file);
        assert!(collect_files(&file, ".tf").is_empty());
    }

    #[test]
    fn directory_walk_finds_nested_files() {
        let temp = tempfile::tempdir().unwrap();
        touch(&temp.path().join("main.tf"));
        touch(&temp.path().join("modules/vpc/network.tf"));
        touch(&temp.path().join("README.md"));
        let mut found = collect_files(temp.path(), ".tf");
        found.sort();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| p.to_str().unwrap().ends_with(".tf")));
    }

    #[test]
    fn missing_path_yields_nothing() {
        let temp = tempfile::tempdir().unwrap();
        assert!(collect_files(&temp.path().join("absent"), ".tf").is_empty());
    }

    #[test]
    fn empty_directory_yields_nothing() {
        let temp = tempfile::tempdir().unwrap();
        assert!(collect_files(temp.path(), ".tf").is_empty());
    }
}
