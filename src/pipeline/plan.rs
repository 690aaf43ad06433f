//! Output planning: decide every rewrite target before any file is touched.
//!
//! Two candidates can normalise to the same output name (`Scan.PDF` and
//! `scan.pdf.convert`). Assigning names up front, in listing order, makes the
//! result independent of how many files are processed at once.

use crate::config::CollisionPolicy;
use crate::pipeline::normalize::{is_pdf_candidate, normalize_name};
use crate::pipeline::scan::Candidate;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Where (if anywhere) a candidate's rewritten copy goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Write the unencrypted copy here.
    Output(PathBuf),
    /// Name already taken under [`CollisionPolicy::Skip`].
    Collision { path: PathBuf, claimed_by: String },
    /// A later file takes this name under [`CollisionPolicy::Overwrite`];
    /// archive only.
    Superseded { path: PathBuf, by: String },
    /// Not a PDF by name; archive only.
    NotPdf,
}

/// A candidate paired with its rewrite target.
#[derive(Debug, Clone)]
pub struct PlannedFile {
    pub candidate: Candidate,
    pub target: Target,
}

/// Assign output paths under `new_dir` for `candidates`, in order.
pub fn plan_outputs(
    candidates: Vec<Candidate>,
    new_dir: &Path,
    policy: CollisionPolicy,
) -> Vec<PlannedFile> {
    // normalized name → original name of the first claimant
    let mut claimed: HashMap<String, String> = HashMap::new();
    let overwritten = if policy == CollisionPolicy::Overwrite {
        last_claimants(&candidates)
    } else {
        HashMap::new()
    };

    candidates
        .into_iter()
        .enumerate()
        .map(|(position, candidate)| {
            let original = candidate.display_name();
            if !is_pdf_candidate(&original) {
                return PlannedFile {
                    candidate,
                    target: Target::NotPdf,
                };
            }

            let name = normalize_name(&original);
            if let Some((last, by)) = overwritten.get(&name) {
                if *last != position {
                    debug!("{} is superseded by {} for {}", original, by, name);
                    return PlannedFile {
                        candidate,
                        target: Target::Superseded {
                            path: new_dir.join(&name),
                            by: by.clone(),
                        },
                    };
                }
            }

            let target = match claimed.get(&name) {
                Some(first) if policy == CollisionPolicy::Skip => {
                    warn!(
                        "{} normalises to {} already claimed by {}; not rewriting",
                        original, name, first
                    );
                    Target::Collision {
                        path: new_dir.join(&name),
                        claimed_by: first.clone(),
                    }
                }
                _ => claim(&mut claimed, &name, &original, new_dir, policy),
            };

            PlannedFile { candidate, target }
        })
        .collect()
}

/// normalized name → (position, original name) of its last claimant.
///
/// Only the last claimant of an overwritten name is rewritten, so concurrent
/// workers never write the same path.
fn last_claimants(candidates: &[Candidate]) -> HashMap<String, (usize, String)> {
    candidates
        .iter()
        .enumerate()
        .filter_map(|(position, candidate)| {
            let original = candidate.display_name();
            is_pdf_candidate(&original).then(|| (normalize_name(&original), (position, original)))
        })
        .collect()
}

fn claim(
    claimed: &mut HashMap<String, String>,
    name: &str,
    original: &str,
    new_dir: &Path,
    policy: CollisionPolicy,
) -> Target {
    let chosen = if policy == CollisionPolicy::Rename {
        free_name(claimed, name, new_dir)
    } else {
        name.to_string()
    };
    if chosen != name {
        warn!("{} normalises to {}; writing {} instead", original, name, chosen);
    }
    claimed.entry(name.to_string()).or_insert_with(|| original.to_string());
    claimed.entry(chosen.clone()).or_insert_with(|| original.to_string());
    Target::Output(new_dir.join(chosen))
}

/// First of `name`, `stem (1).pdf`, `stem (2).pdf`, … that is neither claimed
/// in this run nor present on disk.
fn free_name(claimed: &HashMap<String, String>, name: &str, new_dir: &Path) -> String {
    let taken = |n: &str| claimed.contains_key(n) || new_dir.join(n).exists();
    if !taken(name) {
        return name.to_string();
    }
    let stem = name.strip_suffix(".pdf").unwrap_or(name);
    (1..)
        .map(|n| format!("{stem} ({n}).pdf"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| name.to_string())
}
