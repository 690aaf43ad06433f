//! Move originals into the backup folder under their exact original name.

use crate::error::FileError;
use crate::output::ArchiveOutcome;
use std::ffi::OsStr;
use std::io;
use std::path::Path;
use tracing::debug;

/// Move `source` to `backup_dir/file_name`.
///
/// Uses a rename, falling back to copy + delete when the backup folder is on
/// another filesystem. An existing backup file is never replaced.
pub async fn archive_original(source: &Path, backup_dir: &Path, file_name: &OsStr) -> ArchiveOutcome {
    let dest = backup_dir.join(file_name);
    let move_error = |e: io::Error| FileError::Move {
        from: source.to_path_buf(),
        to: dest.clone(),
        detail: e.to_string(),
    };

    match tokio::fs::try_exists(&dest).await {
        Ok(true) => {
            return ArchiveOutcome::Failed {
                error: FileError::BackupExists {
                    from: source.to_path_buf(),
                    to: dest.clone(),
                },
            }
        }
        Ok(false) => {}
        Err(e) => return ArchiveOutcome::Failed { error: move_error(e) },
    }

    let moved = match tokio::fs::rename(source, &dest).await {
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!("{} is on another device; copying", dest.display());
            copy_then_remove(source, &dest).await
        }
        other => other,
    };

    match moved {
        Ok(()) => {
            debug!("Archived {} → {}", source.display(), dest.display());
            ArchiveOutcome::Archived { backup: dest.clone() }
        }
        Err(e) => ArchiveOutcome::Failed { error: move_error(e) },
    }
}

async fn copy_then_remove(source: &Path, dest: &Path) -> io::Result<()> {
    if let Err(e) = tokio::fs::copy(source, dest).await {
        // Don't leave half a backup behind.
        let _ = tokio::fs::remove_file(dest).await;
        return Err(e);
    }
    tokio::fs::remove_file(source).await
}
