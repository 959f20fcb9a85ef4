//! Staleness evaluation.
//!
//! Decides whether a rebuild is needed by comparing modification times of
//! the patch overlay (every patch file plus the series file) against the
//! build artifact. Purely local and recomputed on every invocation; no
//! content hashing. A patch touched without a content change triggers an
//! unnecessary rebuild, and a patch edited with a preserved mtime goes
//! unnoticed. Callers depend only on the verdict, so a hash-based
//! implementation could replace this module without touching them.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use tracing::debug;

/// Verdict on what kind of rebuild, if any, is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Staleness {
  /// The artifact is at least as new as every overlay input.
  UpToDate,
  /// The overlay changed after the last build; the existing checkout can
  /// be re-patched and incrementally recompiled.
  NeedsIncremental,
  /// No checkout or no artifact exists; the full pipeline is required.
  NeedsFullSetup,
}

impl Staleness {
  pub fn as_str(&self) -> &'static str {
    match self {
      Staleness::UpToDate => "up-to-date",
      Staleness::NeedsIncremental => "needs-incremental",
      Staleness::NeedsFullSetup => "needs-full-setup",
    }
  }
}

impl std::fmt::Display for Staleness {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Evaluate the overlay against the build artifact.
///
/// Checkout absence takes precedence over everything else: without a
/// source tree no timestamp comparison is meaningful.
pub fn evaluate(
  src_dir: &Path,
  artifact: &Path,
  patch_files: &[PathBuf],
  series_file: &Path,
) -> Staleness {
  if !src_dir.exists() {
    debug!(src = %src_dir.display(), "source checkout missing");
    return Staleness::NeedsFullSetup;
  }

  let Some(artifact_mtime) = mtime(artifact) else {
    debug!(artifact = %artifact.display(), "build artifact missing");
    return Staleness::NeedsFullSetup;
  };

  let latest_patch_time = patch_files
    .iter()
    .filter_map(|p| mtime(p))
    .chain(mtime(series_file))
    .max();

  match latest_patch_time {
    Some(patch_time) if patch_time > artifact_mtime => Staleness::NeedsIncremental,
    _ => Staleness::UpToDate,
  }
}

fn mtime(path: &Path) -> Option<SystemTime> {
  std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
