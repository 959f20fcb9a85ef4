//! Build configuration.
//!
//! All configuration is static: a project root, a pinned source tag, the
//! build output directory and a parallel-job count, optionally overridden
//! through `PATCHSTACK_*` environment variables. Values are resolved once
//! and threaded explicitly through every pipeline stage; nothing reads or
//! mutates ambient process state after construction.

use std::path::PathBuf;

use serde::Serialize;

/// Pinned upstream tag built when no override is given.
pub const DEFAULT_TAG: &str = "144.0.7521.1";

/// Build output directory, relative to the source checkout.
pub const DEFAULT_OUT_DIR: &str = "out/Default";

/// Static configuration for one invocation.
#[derive(Debug, Clone, Serialize)]
pub struct BuildConfig {
  /// Project root holding `patches/`, `chromium-src/` and `depot_tools/`.
  pub root: PathBuf,

  /// Upstream tag to fetch and build.
  pub tag: String,

  /// Build output directory relative to the source checkout.
  pub out_dir: String,

  /// Parallel compile jobs passed to ninja.
  pub jobs: usize,

  /// Program used as the patch-stack tool. Overridable so tests can
  /// substitute a recording stub.
  #[serde(skip)]
  pub quilt: String,
}

impl BuildConfig {
  /// Build a configuration for `root` with all defaults.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self {
      root: root.into(),
      tag: DEFAULT_TAG.to_string(),
      out_dir: DEFAULT_OUT_DIR.to_string(),
      jobs: default_jobs(),
      quilt: "quilt".to_string(),
    }
  }

  /// Build a configuration for `root`, honoring `PATCHSTACK_TAG`,
  /// `PATCHSTACK_OUT_DIR` and `PATCHSTACK_JOBS` overrides.
  pub fn from_env(root: impl Into<PathBuf>) -> Self {
    let mut config = Self::new(root);
    if let Ok(tag) = std::env::var("PATCHSTACK_TAG") {
      if !tag.is_empty() {
        config.tag = tag;
      }
    }
    if let Ok(out_dir) = std::env::var("PATCHSTACK_OUT_DIR") {
      if !out_dir.is_empty() {
        config.out_dir = out_dir;
      }
    }
    if let Ok(jobs) = std::env::var("PATCHSTACK_JOBS") {
      if let Ok(jobs) = jobs.parse::<usize>() {
        if jobs > 0 {
          config.jobs = jobs;
        }
      }
    }
    config
  }

  /// Directory holding patch files and the series file.
  pub fn patches_dir(&self) -> PathBuf {
    self.root.join("patches")
  }

  /// The quilt series file.
  pub fn series_file(&self) -> PathBuf {
    self.patches_dir().join("series")
  }

  /// Parent directory of the source checkout (holds `.gclient`).
  pub fn checkout_dir(&self) -> PathBuf {
    self.root.join("chromium-src")
  }

  /// The source tree the patch series is applied to.
  pub fn src_dir(&self) -> PathBuf {
    self.checkout_dir().join("src")
  }

  /// Local depot_tools clone.
  pub fn depot_tools_dir(&self) -> PathBuf {
    self.root.join("depot_tools")
  }

  /// Build output directory inside the source tree.
  pub fn out_path(&self) -> PathBuf {
    self.src_dir().join(&self.out_dir)
  }

  /// The primary build artifact: the chrome binary.
  pub fn binary_path(&self) -> PathBuf {
    self.out_path().join("chrome")
  }

  /// Staging directory for release packaging.
  pub fn release_dir(&self) -> PathBuf {
    self.root.join("release-build")
  }
}

/// Default compile parallelism: two jobs per available core.
pub fn default_jobs() -> usize {
  let cores = std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4);
  cores * 2
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn derived_paths_hang_off_root() {
    let config = BuildConfig::new("/work");
    assert_eq!(config.patches_dir(), PathBuf::from("/work/patches"));
    assert_eq!(config.series_file(), PathBuf::from("/work/patches/series"));
    assert_eq!(config.src_dir(), PathBuf::from("/work/chromium-src/src"));
    assert_eq!(
      config.binary_path(),
      PathBuf::from("/work/chromium-src/src/out/Default/chrome")
    );
  }

  #[test]
  fn defaults_are_sane() {
    let config = BuildConfig::new(".");
    assert_eq!(config.tag, DEFAULT_TAG);
    assert_eq!(config.out_dir, DEFAULT_OUT_DIR);
    assert!(config.jobs >= 2);
    assert_eq!(config.quilt, "quilt");
  }

}
