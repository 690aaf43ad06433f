//! Error types for the pdf-unlock library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`UnlockError`] — **Fatal**: the run cannot proceed at all (output
//!   folders cannot be created, source directory cannot be listed, invalid
//!   configuration). Returned as `Err(UnlockError)` from [`crate::run`].
//!
//! * [`FileError`] — **Non-fatal**: a single file failed to rewrite or to
//!   move, but every other file is fine. Stored inside
//!   [`crate::output::FileOutcome`] so a bad PDF never costs the batch.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf-unlock library.
///
/// Per-file failures use [`FileError`] and are stored in
/// [`crate::output::FileReport`] rather than propagated here.
#[derive(Debug, Error)]
pub enum UnlockError {
    // ── Layout errors ─────────────────────────────────────────────────────
    /// The `_backup` or `_new` folder could not be created.
    #[error("Failed to create output folder '{path}': {source}")]
    Provision {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Scan errors ───────────────────────────────────────────────────────
    /// The source directory does not exist or cannot be listed.
    #[error("Cannot read source directory '{path}': {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Inspection errors ─────────────────────────────────────────────────
    /// A single-file inspection failed.
    #[error("Cannot inspect '{path}': {source}")]
    Inspect {
        path: PathBuf,
        #[source]
        source: FileError,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single file.
///
/// A rewrite failure does not prevent the archive attempt, and an archive
/// failure does not undo a rewrite that already succeeded.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum FileError {
    /// The source file could not be read.
    #[error("Failed to read '{path}': {detail}")]
    Read { path: PathBuf, detail: String },

    /// lopdf could not parse the file.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// The empty user password did not open the document.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was configured but it does not open the document.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The rewritten document could not be built or written.
    #[error("Failed to write '{path}': {detail}")]
    Write { path: PathBuf, detail: String },

    /// Another candidate already claimed this output name.
    #[error("Output '{path}' already claimed by '{claimed_by}'")]
    OutputCollision { path: PathBuf, claimed_by: String },

    /// The original could not be moved into the backup folder.
    #[error("Failed to move '{from}' to '{to}': {detail}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        detail: String,
    },

    /// A file with the same name already sits in the backup folder.
    #[error("Backup '{to}' already exists; refusing to overwrite it with '{from}'")]
    BackupExists { from: PathBuf, to: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_error_names_both_paths() {
        let e = FileError::Move {
            from: PathBuf::from("/in/a.pdf"),
            to: PathBuf::from("/out/x_backup/a.pdf"),
            detail: "permission denied".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("/in/a.pdf"), "got: {msg}");
        assert!(msg.contains("/out/x_backup/a.pdf"), "got: {msg}");
        assert!(msg.contains("permission denied"), "got: {msg}");
    }

    #[test]
    fn password_required_display() {
        let e = FileError::PasswordRequired {
            path: PathBuf::from("secret.pdf"),
        };
        assert!(e.to_string().contains("--password"));
    }

    #[test]
    fn provision_error_keeps_source() {
        use std::error::Error as _;
        let e = UnlockError::Provision {
            path: PathBuf::from("/out/20240101000000_new"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(e.to_string().contains("20240101000000_new"));
        assert!(e.source().is_some());
    }

    #[test]
    fn file_error_serialises() {
        let e = FileError::CorruptPdf {
            path: PathBuf::from("bad.pdf"),
            detail: "invalid file header".into(),
        };
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("CorruptPdf"), "got: {json}");
    }
}
