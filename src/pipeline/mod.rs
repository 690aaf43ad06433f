//! Pipeline stages for a batch unlock run.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own against a temporary directory.
//!
//! ## Data Flow
//!
//! ```text
//! scan ──▶ plan ──▶ rewrite ──▶ archive
//! (list)   (names)  (lopdf)     (move)
//! ```
//!
//! 1. [`scan`]      — list regular files in the source directory
//! 2. [`normalize`] — lower-case output names, collapse `.pdf.convert` /
//!    `.pdf.import`
//! 3. [`plan`]      — give each PDF a collision-free output path before any
//!    file is touched
//! 4. [`rewrite`]   — decrypt and copy pages into a fresh document; blocking,
//!    runs in `spawn_blocking`
//! 5. [`archive`]   — move the original into the backup folder

pub mod archive;
pub mod normalize;
pub mod plan;
pub mod rewrite;
pub mod scan;
