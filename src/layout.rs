//! Output layout: the timestamped `_backup` and `_new` folders.
//!
//! ```text
//! <destination>/<TS>_backup/<original-filename>
//! <destination>/<TS>_new/<normalized-filename>
//! ```
//!
//! `<TS>` is the local wall-clock time at run start, `YYYYMMDDHHMMSS`, so
//! folders of successive runs sort chronologically.

use crate::error::UnlockError;
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::debug;

/// `strftime` pattern for the run timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Paths derived once at run start; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub timestamp: String,
    pub backup_dir: PathBuf,
    pub new_dir: PathBuf,
}

impl RunContext {
    /// Derive the folder paths for an explicit timestamp.
    pub fn new(destination: &Path, timestamp: impl Into<String>) -> Self {
        let timestamp = timestamp.into();
        Self {
            backup_dir: destination.join(format!("{timestamp}_backup")),
            new_dir: destination.join(format!("{timestamp}_new")),
            timestamp,
        }
    }

    /// Derive the folder paths from the current local time.
    pub fn now(destination: &Path) -> Self {
        Self::new(destination, Local::now().format(TIMESTAMP_FORMAT).to_string())
    }

    /// Create both folders. Existing folders are not an error.
    pub async fn provision(&self) -> Result<(), UnlockError> {
        for dir in [&self.backup_dir, &self.new_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| UnlockError::Provision {
                    path: dir.clone(),
                    source,
                })?;
            debug!("Provisioned {}", dir.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_names_carry_timestamp() {
        let ctx = RunContext::new(Path::new("/out"), "20240131235959");
        assert_eq!(ctx.backup_dir, PathBuf::from("/out/20240131235959_backup"));
        assert_eq!(ctx.new_dir, PathBuf::from("/out/20240131235959_new"));
    }

    #[test]
    fn now_timestamp_is_fourteen_digits() {
        let ctx = RunContext::now(Path::new("out"));
        assert_eq!(ctx.timestamp.len(), 14);
        assert!(ctx.timestamp.chars().all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn provision_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = RunContext::new(tmp.path(), "20240101000000");
        ctx.provision().await.unwrap();
        ctx.provision().await.unwrap();
        assert!(ctx.backup_dir.is_dir());
        assert!(ctx.new_dir.is_dir());
    }

    #[tokio::test]
    async fn provision_fails_under_a_file() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();
        let ctx = RunContext::new(&blocker, "20240101000000");
        let err = ctx.provision().await.unwrap_err();
        assert!(matches!(err, UnlockError::Provision { .. }));
    }
}
