//! Per-file outcomes and the run summary.
//!
//! Every candidate walks three independent stages (age filter → rewrite →
//! archive) and each stage records its own result. Nothing here is shared
//! mutable state: the counters in [`RunSummary`] are folded from the
//! per-file reports once the scan is over.

use crate::error::FileError;
use crate::layout::RunContext;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of the decrypt-and-rewrite stage for one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RewriteOutcome {
    /// An unencrypted copy was written to the `_new` folder.
    Rewritten {
        output: PathBuf,
        pages: usize,
        was_encrypted: bool,
    },
    /// The document has more pages than the configured limit.
    TooManyPages { pages: usize, max_pages: usize },
    /// The file name does not look like a PDF; it is archived untouched.
    NotPdf,
    /// A later file claims the same output name under the overwrite policy.
    Superseded { output: PathBuf, by: String },
    /// Open, parse, decrypt or write failed.
    Failed { error: FileError },
}

/// Result of moving the original into the `_backup` folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ArchiveOutcome {
    Archived { backup: PathBuf },
    Failed { error: FileError },
}

/// What happened to one candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FileOutcome {
    /// Modified too recently; neither rewritten nor moved.
    SkippedTooYoung { age_secs: f64, min_age_secs: f64 },
    /// Went through both the rewrite and the archive stage.
    Processed {
        rewrite: RewriteOutcome,
        archive: ArchiveOutcome,
    },
}

/// Outcome of one candidate, in directory-listing order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    /// Original file name (lossy UTF-8 for display).
    pub file_name: String,
    /// Path the file was found at.
    pub source: PathBuf,
    pub outcome: FileOutcome,
}

impl FileReport {
    /// `true` if the rewrite or the archive stage failed.
    pub fn is_failure(&self) -> bool {
        matches!(
            self.outcome,
            FileOutcome::Processed {
                rewrite: RewriteOutcome::Failed { .. },
                ..
            } | FileOutcome::Processed {
                archive: ArchiveOutcome::Failed { .. },
                ..
            }
        )
    }

    /// Short status label used in CLI output.
    pub fn label(&self) -> &'static str {
        match &self.outcome {
            FileOutcome::SkippedTooYoung { .. } => "too young",
            FileOutcome::Processed { rewrite, archive } => match (rewrite, archive) {
                (_, ArchiveOutcome::Failed { .. }) => "archive failed",
                (RewriteOutcome::Rewritten { .. }, _) => "rewritten",
                (RewriteOutcome::TooManyPages { .. }, _) => "too many pages",
                (RewriteOutcome::NotPdf, _) => "archived",
                (RewriteOutcome::Superseded { .. }, _) => "superseded",
                (RewriteOutcome::Failed { .. }, _) => "rewrite failed",
            },
        }
    }
}

/// Aggregate result of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// `YYYYMMDDHHMMSS` prefix of both output folders.
    pub timestamp: String,
    pub backup_dir: PathBuf,
    pub new_dir: PathBuf,

    /// Originals moved into the backup folder.
    pub files_moved: usize,
    /// PDFs written without encryption into the new folder.
    pub pdfs_rewritten: usize,

    pub skipped_too_young: usize,
    pub skipped_too_many_pages: usize,
    pub not_pdf: usize,
    /// PDFs not rewritten because a later file took their output name.
    pub superseded: usize,
    pub rewrite_failures: usize,
    pub archive_failures: usize,

    /// Wall-clock duration of the whole run.
    pub duration_ms: u64,

    /// One report per regular file found, in listing order.
    pub files: Vec<FileReport>,
}

impl RunSummary {
    /// Fold per-file reports into counters.
    pub fn from_reports(context: &RunContext, files: Vec<FileReport>, duration_ms: u64) -> Self {
        let mut summary = RunSummary {
            timestamp: context.timestamp.clone(),
            backup_dir: context.backup_dir.clone(),
            new_dir: context.new_dir.clone(),
            duration_ms,
            ..Default::default()
        };

        for report in &files {
            match &report.outcome {
                FileOutcome::SkippedTooYoung { .. } => summary.skipped_too_young += 1,
                FileOutcome::Processed { rewrite, archive } => {
                    match rewrite {
                        RewriteOutcome::Rewritten { .. } => summary.pdfs_rewritten += 1,
                        RewriteOutcome::TooManyPages { .. } => summary.skipped_too_many_pages += 1,
                        RewriteOutcome::NotPdf => summary.not_pdf += 1,
                        RewriteOutcome::Superseded { .. } => summary.superseded += 1,
                        RewriteOutcome::Failed { .. } => summary.rewrite_failures += 1,
                    }
                    match archive {
                        ArchiveOutcome::Archived { .. } => summary.files_moved += 1,
                        ArchiveOutcome::Failed { .. } => summary.archive_failures += 1,
                    }
                }
            }
        }

        summary.files = files;
        summary
    }

    /// Files with at least one failed stage.
    pub fn failed_files(&self) -> usize {
        self.files.iter().filter(|f| f.is_failure()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.rewrite_failures > 0 || self.archive_failures > 0
    }
}
