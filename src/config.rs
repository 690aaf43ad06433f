//! Configuration types for a batch unlock run.
//!
//! All run behaviour is controlled through [`UnlockConfig`], built via its
//! [`UnlockConfigBuilder`]. The config is immutable once the run starts.

use crate::error::UnlockError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Configuration for one batch run.
///
/// # Example
/// ```rust
/// use pdf_unlock::{CollisionPolicy, UnlockConfig};
///
/// let config = UnlockConfig::builder("/srv/inbox", "/srv/outbox")
///     .min_age_secs(3600.0)
///     .max_pages(50)
///     .collision_policy(CollisionPolicy::Rename)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_pages, Some(50));
/// ```
#[derive(Clone)]
pub struct UnlockConfig {
    /// Directory scanned (non-recursively) for candidates.
    pub source_dir: PathBuf,

    /// Directory receiving the `<TS>_backup` and `<TS>_new` folders.
    pub destination_dir: PathBuf,

    /// Only files at least this old (seconds since last modification) are
    /// treated. `None` disables age filtering.
    ///
    /// Files still being written by a scanner or a mail gateway are usually
    /// only a few seconds old; a threshold keeps them for the next run.
    pub min_age_secs: Option<f64>,

    /// PDFs with more pages than this are archived but not rewritten.
    pub max_pages: Option<usize>,

    /// User password tried on encrypted documents. Default: the empty password.
    pub password: Option<String>,

    /// What to do when two candidates normalise to the same output name.
    /// Default: [`CollisionPolicy::Rename`].
    pub collision_policy: CollisionPolicy,

    /// Number of files processed at once. Default: 1 (strictly sequential).
    ///
    /// Results and log order still follow the directory listing when this is
    /// raised, since outputs are collected with `buffered`, not
    /// `buffer_unordered`.
    pub concurrency: usize,

    /// Optional per-file progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for UnlockConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnlockConfig")
            .field("source_dir", &self.source_dir)
            .field("destination_dir", &self.destination_dir)
            .field("min_age_secs", &self.min_age_secs)
            .field("max_pages", &self.max_pages)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("collision_policy", &self.collision_policy)
            .field("concurrency", &self.concurrency)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn RunProgressCallback>"),
            )
            .finish()
    }
}

impl UnlockConfig {
    /// Create a new builder for `UnlockConfig`.
    pub fn builder(
        source_dir: impl AsRef<Path>,
        destination_dir: impl AsRef<Path>,
    ) -> UnlockConfigBuilder {
        UnlockConfigBuilder {
            config: Self {
                source_dir: source_dir.as_ref().to_path_buf(),
                destination_dir: destination_dir.as_ref().to_path_buf(),
                min_age_secs: None,
                max_pages: None,
                password: None,
                collision_policy: CollisionPolicy::default(),
                concurrency: 1,
                progress_callback: None,
            },
        }
    }
}

/// Builder for [`UnlockConfig`].
#[derive(Debug)]
pub struct UnlockConfigBuilder {
    config: UnlockConfig,
}

impl UnlockConfigBuilder {
    pub fn min_age_secs(mut self, secs: f64) -> Self {
        self.config.min_age_secs = Some(secs);
        self
    }

    pub fn max_pages(mut self, pages: usize) -> Self {
        self.config.max_pages = Some(pages);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    /// How to resolve two files that normalise to the same output name.
    pub fn collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.config.collision_policy = policy;
        self
    }

    /// Files processed at once; reports keep listing order regardless.
    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<UnlockConfig, UnlockError> {
        let c = &self.config;
        if let Some(age) = c.min_age_secs {
            if age.is_nan() || age < 0.0 {
                return Err(UnlockError::InvalidConfig(format!(
                    "Age threshold must be a non-negative number of seconds, got {age}"
                )));
            }
        }
        if c.concurrency == 0 {
            return Err(UnlockError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How to resolve two candidates that normalise to the same output name,
/// e.g. `Report.pdf.convert` and `report.PDF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollisionPolicy {
    /// Later claimants get `name (1).pdf`, `name (2).pdf`, … (default)
    #[default]
    Rename,
    /// Last claimant in listing order wins; earlier claimants are archived
    /// but not rewritten.
    Overwrite,
    /// Later claimants are not rewritten, only archived.
    Skip,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sequential_and_unfiltered() {
        let c = UnlockConfig::builder("in", "out").build().unwrap();
        assert_eq!(c.concurrency, 1);
        assert_eq!(c.min_age_secs, None);
        assert_eq!(c.max_pages, None);
        assert_eq!(c.collision_policy, CollisionPolicy::Rename);
        assert!(c.password.is_none());
    }

    #[test]
    fn negative_age_is_rejected() {
        let err = UnlockConfig::builder("in", "out")
            .min_age_secs(-1.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, UnlockError::InvalidConfig(_)));
    }

    #[test]
    fn nan_age_is_rejected() {
        assert!(UnlockConfig::builder("in", "out")
            .min_age_secs(f64::NAN)
            .build()
            .is_err());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        assert!(UnlockConfig::builder("in", "out")
            .concurrency(0)
            .build()
            .is_err());
    }

    #[test]
    fn debug_redacts_password() {
        let c = UnlockConfig::builder("in", "out")
            .password("hunter2")
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"), "got: {dbg}");
        assert!(dbg.contains("<redacted>"));
    }
}
