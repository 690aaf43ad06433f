//! Progress-callback trait for per-file run events.
//!
//! Inject an [`Arc<dyn RunProgressCallback>`] via
//! [`crate::config::UnlockConfigBuilder::progress_callback`] to receive
//! events as the run works through the source directory.
//!
//! # Example
//!
//! ```rust
//! use pdf_unlock::{FileReport, RunProgressCallback, UnlockConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     done: AtomicUsize,
//! }
//!
//! impl RunProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, index: usize, total: usize, report: &FileReport) {
//!         self.done.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{index}/{total} {}: {}", report.file_name, report.label());
//!     }
//! }
//!
//! let config = UnlockConfig::builder("inbox", "outbox")
//!     .progress_callback(Arc::new(CountingCallback { done: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::{FileReport, RunSummary};
use std::sync::Arc;

/// Called by the run as it processes each file.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. With `concurrency > 1`, `on_file_start` and
/// `on_file_complete` may interleave across files, so implementations must
/// be `Send + Sync`.
pub trait RunProgressCallback: Send + Sync {
    /// Called once after scanning, before any file is processed.
    ///
    /// # Arguments
    /// * `total_files` — files that passed the age filter
    fn on_run_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called just before a file is rewritten.
    ///
    /// # Arguments
    /// * `index`     — 1-indexed position in listing order
    /// * `total`     — files that will be processed
    /// * `file_name` — original file name
    fn on_file_start(&self, index: usize, total: usize, file_name: &str) {
        let _ = (index, total, file_name);
    }

    /// Called once a file has been rewritten (or not) and archived (or not).
    fn on_file_complete(&self, index: usize, total: usize, report: &FileReport) {
        let _ = (index, total, report);
    }

    /// Called once after every file has been attempted.
    fn on_run_complete(&self, summary: &RunSummary) {
        let _ = summary;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RunProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::UnlockConfig`].
pub type ProgressCallback = Arc<dyn RunProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::FileOutcome;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        started_total: AtomicUsize,
        starts: AtomicUsize,
        completes: AtomicUsize,
        finished: AtomicUsize,
    }

    impl RunProgressCallback for TrackingCallback {
        fn on_run_start(&self, total_files: usize) {
            self.started_total.store(total_files, Ordering::SeqCst);
        }

        fn on_file_start(&self, _index: usize, _total: usize, _file_name: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_complete(&self, _index: usize, _total: usize, _report: &FileReport) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_run_complete(&self, _summary: &RunSummary) {
            self.finished.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn skipped() -> FileReport {
        FileReport {
            file_name: "a.pdf".into(),
            source: PathBuf::from("a.pdf"),
            outcome: FileOutcome::SkippedTooYoung {
                age_secs: 1.0,
                min_age_secs: 60.0,
            },
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(2);
        cb.on_file_start(1, 2, "a.pdf");
        cb.on_file_complete(1, 2, &skipped());
        cb.on_run_complete(&RunSummary::default());
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_run_start(2);
        tracker.on_file_start(1, 2, "a.pdf");
        tracker.on_file_complete(1, 2, &skipped());
        tracker.on_file_start(2, 2, "b.pdf");
        tracker.on_file_complete(2, 2, &skipped());
        tracker.on_run_complete(&RunSummary::default());

        assert_eq!(tracker.started_total.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.finished.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_run_start(10);
        cb.on_file_start(1, 10, "x.pdf");
    }
}
