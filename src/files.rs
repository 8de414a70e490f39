//! Project file discovery
//!
//! Walks the project root, keeps files matching the include globs, and prunes
//! excluded trees. Results are relative to the root and sorted, so every run
//! visits files in the same order.

use crate::error::MigrateError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Trees never scanned, on top of any user excludes
pub const DEFAULT_EXCLUDES: &[&str] = &["target/**", ".git/**", "migration_backup/**"];

/// Build a glob set from a list of patterns
pub fn build_globset(globs: &[String]) -> Result<GlobSet, MigrateError> {
    let mut builder = GlobSetBuilder::new();
    for glob in globs {
        builder.add(Glob::new(glob)?);
    }
    Ok(builder.build()?)
}

/// Recursive scanner over one project root
#[derive(Debug)]
pub struct FileScanner {
    root: PathBuf,
    include: GlobSet,
    exclude: GlobSet,
}

impl FileScanner {
    pub fn new(
        root: &Path,
        includes: &[String],
        extra_excludes: &[String],
    ) -> Result<FileScanner, MigrateError> {
        let mut exclude = GlobSetBuilder::new();
        for glob in DEFAULT_EXCLUDES
            .iter()
            .map(|g| g.to_string())
            .chain(extra_excludes.iter().cloned())
        {
            exclude.add(Glob::new(&glob)?);
            // Also match the bare directory so the walker can prune it
            if let Some(dir) = glob.strip_suffix("/**") {
                exclude.add(Glob::new(dir)?);
            }
        }
        Ok(FileScanner {
            root: root.to_path_buf(),
            include: build_globset(includes)?,
            exclude: exclude.build()?,
        })
    }

    /// All matching files, relative to the root, sorted
    pub fn scan(&self) -> Result<Vec<PathBuf>, MigrateError> {
        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root).into_iter().filter_entry(|entry| {
            match entry.path().strip_prefix(&self.root) {
                Ok(rel) if rel.as_os_str().is_empty() => true,
                Ok(rel) => !self.exclude.is_match(rel),
                Err(_) => true,
            }
        });
        for entry in walker {
            let entry = entry.map_err(|e| MigrateError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&self.root)
                .unwrap_or(entry.path())
                .to_path_buf();
            if self.include.is_match(&rel) {
                files.push(rel);
            }
        }
        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn rs_globs() -> Vec<String> {
        vec!["**/*.rs".to_string()]
    }

    #[test]
    fn test_scan_is_relative_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/main.rs");
        touch(dir.path(), "src/audio.rs");
        touch(dir.path(), "Cargo.toml");
        let scanner = FileScanner::new(dir.path(), &rs_globs(), &[]).unwrap();
        assert_eq!(
            scanner.scan().unwrap(),
            vec![PathBuf::from("src/audio.rs"), PathBuf::from("src/main.rs")]
        );
    }

    #[test]
    fn test_default_excludes_pruned() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/main.rs");
        touch(dir.path(), "target/debug/build.rs");
        touch(dir.path(), ".git/hooks/pre-commit.rs");
        touch(dir.path(), "migration_backup/1700000000/src/main.rs");
        let scanner = FileScanner::new(dir.path(), &rs_globs(), &[]).unwrap();
        assert_eq!(scanner.scan().unwrap(), vec![PathBuf::from("src/main.rs")]);
    }

    #[test]
    fn test_user_excludes() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/main.rs");
        touch(dir.path(), "vendor/dep/lib.rs");
        let scanner =
            FileScanner::new(dir.path(), &rs_globs(), &["vendor/**".to_string()]).unwrap();
        assert_eq!(scanner.scan().unwrap(), vec![PathBuf::from("src/main.rs")]);
    }

    #[test]
    fn test_non_matching_extension_skipped() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/main.rs");
        touch(dir.path(), "assets/sprite.png");
        let scanner = FileScanner::new(dir.path(), &rs_globs(), &[]).unwrap();
        assert_eq!(scanner.scan().unwrap(), vec![PathBuf::from("src/main.rs")]);
    }

    #[test]
    fn test_invalid_glob_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileScanner::new(dir.path(), &["{bad".to_string()], &[]).unwrap_err();
        assert!(matches!(err, MigrateError::InvalidGlob(_)));
    }
}
