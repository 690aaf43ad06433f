//! Batch entry points.
//!
//! [`run`] performs one full pass over the source directory:
//! provision folders, scan, plan output names, then rewrite and archive each
//! file. Per-file failures are recorded in the returned [`RunSummary`];
//! only failures that make the whole run meaningless are returned as `Err`.

use crate::config::UnlockConfig;
use crate::error::{FileError, UnlockError};
use crate::layout::RunContext;
use crate::output::{ArchiveOutcome, FileOutcome, FileReport, RewriteOutcome, RunSummary};
use crate::pipeline::plan::{plan_outputs, PlannedFile, Target};
use crate::pipeline::rewrite::{self, PdfInfo};
use crate::pipeline::{archive, scan};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::time::{Instant, SystemTime};
use tracing::{debug, error, info};

/// Decrypt every PDF in `config.source_dir` and archive the originals.
///
/// The output folders are stamped with the current local time.
///
/// # Returns
/// `Ok(RunSummary)` once every file has been attempted, even if some failed
/// (check [`RunSummary::has_failures`]).
///
/// # Errors
/// Returns `Err(UnlockError)` only for fatal errors:
/// - the `_backup` / `_new` folders cannot be created
/// - the source directory cannot be listed
pub async fn run(config: &UnlockConfig) -> Result<RunSummary, UnlockError> {
    let context = RunContext::now(&config.destination_dir);
    run_with_context(config, context).await
}

/// Like [`run`], with explicit output folders.
pub async fn run_with_context(
    config: &UnlockConfig,
    context: RunContext,
) -> Result<RunSummary, UnlockError> {
    let start = Instant::now();
    info!(
        "Starting run: {} → {}",
        config.source_dir.display(),
        config.destination_dir.display()
    );

    // ── Step 1: Provision output folders ─────────────────────────────────
    context.provision().await?;

    // ── Step 2: Scan and filter by age ───────────────────────────────────
    let candidates = scan::list_candidates(&config.source_dir).await?;
    debug!("Found {} regular files", candidates.len());

    let now = SystemTime::now();
    let mut reports: Vec<(usize, FileReport)> = Vec::with_capacity(candidates.len());
    let mut eligible = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match candidate.too_young(config.min_age_secs, now) {
            Some(age_secs) => {
                debug!(
                    "Skipping {}: modified {:.0}s ago",
                    candidate.path.display(),
                    age_secs
                );
                reports.push((
                    candidate.index,
                    FileReport {
                        file_name: candidate.display_name(),
                        source: candidate.path.clone(),
                        outcome: FileOutcome::SkippedTooYoung {
                            age_secs,
                            min_age_secs: config.min_age_secs.unwrap_or_default(),
                        },
                    },
                ));
            }
            None => eligible.push(candidate),
        }
    }

    // ── Step 3: Plan output names ────────────────────────────────────────
    let planned = plan_outputs(eligible, &context.new_dir, config.collision_policy);
    let total = planned.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total);
    }

    // ── Step 4: Rewrite + archive each file ──────────────────────────────
    let context_ref = &context;
    let processed: Vec<(usize, FileReport)> = stream::iter(planned.into_iter().enumerate().map(
        |(position, file)| async move {
            let index = file.candidate.index;
            let name = file.candidate.display_name();
            if let Some(ref cb) = config.progress_callback {
                cb.on_file_start(position + 1, total, &name);
            }
            let report = process_file(file, context_ref, config).await;
            if let Some(ref cb) = config.progress_callback {
                cb.on_file_complete(position + 1, total, &report);
            }
            (index, report)
        },
    ))
    .buffered(config.concurrency)
    .collect()
    .await;

    reports.extend(processed);
    reports.sort_by_key(|(index, _)| *index);

    // ── Step 5: Summarise ────────────────────────────────────────────────
    let summary = RunSummary::from_reports(
        &context,
        reports.into_iter().map(|(_, r)| r).collect(),
        start.elapsed().as_millis() as u64,
    );

    info!(
        "{} file(s) have been moved to {}",
        summary.files_moved,
        summary.backup_dir.display()
    );
    info!("{} pdf file(s) have been treated.", summary.pdfs_rewritten);

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(&summary);
    }

    Ok(summary)
}

/// Rewrite (if it is a PDF) and then archive one planned file.
///
/// The archive step runs whatever the rewrite produced.
pub async fn process_file(
    file: PlannedFile,
    context: &RunContext,
    config: &UnlockConfig,
) -> FileReport {
    let PlannedFile { candidate, target } = file;
    let name = candidate.display_name();

    let rewrite = match target {
        Target::NotPdf => {
            debug!("{} is not a PDF; archiving only", candidate.path.display());
            RewriteOutcome::NotPdf
        }
        Target::Collision { path, claimed_by } => RewriteOutcome::Failed {
            error: FileError::OutputCollision { path, claimed_by },
        },
        Target::Superseded { path, by } => RewriteOutcome::Superseded { output: path, by },
        Target::Output(output) => {
            let source = candidate.path.clone();
            let max_pages = config.max_pages;
            let password = config.password.clone();
            let task_output = output.clone();
            tokio::task::spawn_blocking(move || {
                rewrite::rewrite_pdf(&source, &task_output, max_pages, password.as_deref())
            })
            .await
            .unwrap_or_else(|e| RewriteOutcome::Failed {
                error: FileError::Write {
                    path: output,
                    detail: format!("Rewrite task panicked: {e}"),
                },
            })
        }
    };

    if let RewriteOutcome::Failed { ref error } = rewrite {
        error!("Failed to rewrite {}: {}", candidate.path.display(), error);
    }

    let archive =
        archive::archive_original(&candidate.path, &context.backup_dir, &candidate.file_name).await;
    if let ArchiveOutcome::Failed { ref error } = archive {
        error!("{}", error);
    }

    FileReport {
        file_name: name,
        source: candidate.path,
        outcome: FileOutcome::Processed { rewrite, archive },
    }
}

/// Synchronous wrapper around [`run`].
///
/// Creates a temporary tokio runtime internally.
pub fn run_sync(config: &UnlockConfig) -> Result<RunSummary, UnlockError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| UnlockError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(run(config))
}

/// Report page count, PDF version and encryption of one file without
/// rewriting it.
pub async fn inspect(
    path: impl AsRef<Path>,
    password: Option<&str>,
) -> Result<PdfInfo, UnlockError> {
    let path = path.as_ref().to_path_buf();
    let pwd = password.map(str::to_string);
    let task_path = path.clone();

    tokio::task::spawn_blocking(move || rewrite::inspect_pdf(&task_path, pwd.as_deref()))
        .await
        .map_err(|e| UnlockError::Internal(format!("Inspect task panicked: {}", e)))?
        .map_err(|source| UnlockError::Inspect { path, source })
}
