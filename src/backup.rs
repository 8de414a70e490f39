//! Backup snapshots and final writes
//!
//! Both sides of the disk boundary sit behind traits so the engine can be
//! exercised without touching a real project tree. The defaults copy into a
//! timestamped directory under `migration_backup/` and write files in place.

use crate::error::MigrateError;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Where a snapshot ended up
#[derive(Debug, Clone)]
pub struct BackupHandle {
    pub location: PathBuf,
    pub file_count: usize,
}

impl BackupHandle {
    /// Copy every backed-up file back into the project. Never called by the
    /// engine; restoring is a user decision.
    pub fn restore(&self, root: &Path) -> Result<usize, MigrateError> {
        let mut restored = 0;
        for entry in walkdir::WalkDir::new(&self.location) {
            let entry = entry.map_err(|e| MigrateError::Snapshot(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&self.location)
                .map_err(|e| MigrateError::Snapshot(e.to_string()))?;
            let dest = root.join(rel);
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), dest)?;
            restored += 1;
        }
        Ok(restored)
    }
}

/// Copies the files about to be modified somewhere recoverable
pub trait Snapshot: Send + Sync {
    fn snapshot(&self, root: &Path, files: &[PathBuf]) -> Result<BackupHandle, MigrateError>;
}

/// Writes final file contents back to the project
pub trait Persist: Send + Sync {
    fn persist(&self, root: &Path, rel: &Path, content: &str) -> Result<(), MigrateError>;
}

/// Filesystem snapshot into `migration_backup/<epoch-secs>/`, or a caller
/// supplied directory
#[derive(Default)]
pub struct FsBackup {
    override_dir: Option<PathBuf>,
}

impl FsBackup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dir(dir: PathBuf) -> Self {
        FsBackup {
            override_dir: Some(dir),
        }
    }

    fn target_dir(&self, root: &Path) -> PathBuf {
        match &self.override_dir {
            Some(dir) => dir.clone(),
            None => {
                let stamp = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or(0);
                root.join("migration_backup").join(stamp.to_string())
            }
        }
    }
}

impl Snapshot for FsBackup {
    fn snapshot(&self, root: &Path, files: &[PathBuf]) -> Result<BackupHandle, MigrateError> {
        let target = self.target_dir(root);
        for rel in files {
            let dest = target.join(rel);
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| MigrateError::Snapshot(format!("{}: {e}", parent.display())))?;
            }
            std::fs::copy(root.join(rel), &dest)
                .map_err(|e| MigrateError::Snapshot(format!("{}: {e}", rel.display())))?;
        }
        Ok(BackupHandle {
            location: target,
            file_count: files.len(),
        })
    }
}

/// In-place writes under the project root
#[derive(Default)]
pub struct FsPersist;

impl Persist for FsPersist {
    fn persist(&self, root: &Path, rel: &Path, content: &str) -> Result<(), MigrateError> {
        let path = root.join(rel);
        std::fs::write(&path, content).map_err(|source| MigrateError::Persist { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_snapshot_preserves_structure() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "fn main() {}").unwrap();
        fs::write(dir.path().join("Cargo.toml"), "[package]").unwrap();

        let files = vec![PathBuf::from("src/main.rs"), PathBuf::from("Cargo.toml")];
        let handle = FsBackup::new().snapshot(dir.path(), &files).unwrap();

        assert_eq!(handle.file_count, 2);
        assert!(handle.location.starts_with(dir.path().join("migration_backup")));
        assert_eq!(
            fs::read_to_string(handle.location.join("src/main.rs")).unwrap(),
            "fn main() {}"
        );
    }

    #[test]
    fn test_snapshot_into_override_dir() {
        let project = tempfile::tempdir().unwrap();
        let backups = tempfile::tempdir().unwrap();
        fs::write(project.path().join("Cargo.toml"), "x").unwrap();

        let backup = FsBackup::with_dir(backups.path().join("snap"));
        let handle = backup
            .snapshot(project.path(), &[PathBuf::from("Cargo.toml")])
            .unwrap();
        assert_eq!(handle.location, backups.path().join("snap"));
        assert!(handle.location.join("Cargo.toml").is_file());
    }

    #[test]
    fn test_snapshot_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = FsBackup::new()
            .snapshot(dir.path(), &[PathBuf::from("missing.rs")])
            .unwrap_err();
        assert!(matches!(err, MigrateError::Snapshot(_)));
    }

    #[test]
    fn test_restore_puts_files_back() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "original").unwrap();

        let files = vec![PathBuf::from("src/main.rs")];
        let handle = FsBackup::new().snapshot(dir.path(), &files).unwrap();
        fs::write(dir.path().join("src/main.rs"), "mangled").unwrap();

        assert_eq!(handle.restore(dir.path()).unwrap(), 1);
        assert_eq!(
            fs::read_to_string(dir.path().join("src/main.rs")).unwrap(),
            "original"
        );
    }

    #[test]
    fn test_persist_writes_in_place() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        FsPersist
            .persist(dir.path(), Path::new("src/main.rs"), "fn main() {}")
            .unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("src/main.rs")).unwrap(),
            "fn main() {}"
        );
    }
}
