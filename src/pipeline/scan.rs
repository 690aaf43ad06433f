//! Directory scan: list regular files directly under the source directory.

use crate::error::UnlockError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// A regular file found directly under the source directory.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Position in listing order (0-based).
    pub index: usize,
    /// Exact name on disk, used for the backup copy.
    pub file_name: OsString,
    pub path: PathBuf,
    /// Last modification time, if the platform reports one.
    pub modified: Option<SystemTime>,
}

impl Candidate {
    /// File name for logs and name normalisation.
    pub fn display_name(&self) -> String {
        self.file_name.to_string_lossy().into_owned()
    }

    /// Seconds since last modification. A missing or future mtime counts as 0.
    pub fn age_secs(&self, now: SystemTime) -> f64 {
        self.modified
            .and_then(|m| now.duration_since(m).ok())
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }

    /// `Some(age)` if a threshold is set and the file is younger than it.
    pub fn too_young(&self, min_age_secs: Option<f64>, now: SystemTime) -> Option<f64> {
        let threshold = min_age_secs?;
        let age = self.age_secs(now);
        (age < threshold).then_some(age)
    }
}

/// List regular files under `source_dir`, sorted by file name.
///
/// Non-recursive. Directories, sockets and dangling symlinks are ignored; a
/// symlink to a regular file is a candidate.
pub async fn list_candidates(source_dir: &Path) -> Result<Vec<Candidate>, UnlockError> {
    let unreadable = |source| UnlockError::SourceUnreadable {
        path: source_dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(source_dir).await.map_err(unreadable)?;
    let mut found = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(unreadable)? {
        let path = entry.path();
        // Follows symlinks.
        let meta = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) => {
                debug!("Ignoring {}: {}", path.display(), e);
                continue;
            }
        };
        if !meta.is_file() {
            debug!("Ignoring non-regular entry {}", path.display());
            continue;
        }
        found.push((entry.file_name(), path, meta.modified().ok()));
    }

    found.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(found
        .into_iter()
        .enumerate()
        .map(|(index, (file_name, path, modified))| Candidate {
            index,
            file_name,
            path,
            modified,
        })
        .collect())
}
