//! # pdf-unlock
//!
//! Strip password protection from every PDF in a folder, keeping the
//! originals.
//!
//! Scanners, mail gateways and document archives often deliver PDFs that
//! carry an encryption dictionary with an empty user password: anyone can
//! read them, but many downstream tools refuse to process them or disable
//! printing and copying. This crate rewrites such files into plain PDFs with
//! the same pages, and moves each original into a timestamped backup folder.
//!
//! ## Pipeline Overview
//!
//! ```text
//! source dir
//!  │
//!  ├─ 1. Layout   create <TS>_backup and <TS>_new under the destination
//!  ├─ 2. Scan     regular files only, optional minimum age
//!  ├─ 3. Plan     normalised, collision-free output names
//!  ├─ 4. Rewrite  lopdf: decrypt, copy pages into a fresh document
//!  ├─ 5. Archive  move the original into <TS>_backup
//!  └─ 6. Summary  counters + one FileReport per file
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_unlock::{run, UnlockConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = UnlockConfig::builder("/srv/scans/inbox", "/srv/scans")
//!         .min_age_secs(60.0)
//!         .max_pages(200)
//!         .build()?;
//!     let summary = run(&config).await?;
//!     eprintln!(
//!         "{} moved, {} rewritten",
//!         summary.files_moved, summary.pdfs_rewritten
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfunlock` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod layout;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod unlock;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{CollisionPolicy, UnlockConfig, UnlockConfigBuilder};
pub use error::{FileError, UnlockError};
pub use layout::RunContext;
pub use output::{ArchiveOutcome, FileOutcome, FileReport, RewriteOutcome, RunSummary};
pub use pipeline::normalize::normalize_name;
pub use pipeline::rewrite::PdfInfo;
pub use progress::{NoopProgressCallback, ProgressCallback, RunProgressCallback};
pub use unlock::{inspect, process_file, run, run_sync, run_with_context};
