//! The quilt patch series.
//!
//! A series is an ordered, line-oriented list of patch file names stored
//! next to the patches themselves. Lines starting with `#` are comments,
//! blank lines are ignored, and the remaining lines name patches in
//! application order. The series file is the single source of truth for
//! which patches exist and in what order; patch content is addressed by
//! name, never by hash.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{CoreError, Result};

/// Header written when a series file is first created.
pub const SERIES_HEADER: &str = "# Quilt patch series";

/// Comment line preceding each appended entry.
pub const USER_PATCH_COMMENT: &str = "# User-added patch";

/// Required suffix for patch file names.
pub const PATCH_SUFFIX: &str = ".patch";

/// Outcome of adding a patch to the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
  /// The patch was appended to the series.
  Appended,
  /// The series already names this patch; nothing changed.
  AlreadyPresent,
}

/// An ordered patch series backed by a managed directory.
#[derive(Debug, Clone)]
pub struct PatchSeries {
  patches_dir: PathBuf,
}

impl PatchSeries {
  pub fn new(patches_dir: impl Into<PathBuf>) -> Self {
    Self {
      patches_dir: patches_dir.into(),
    }
  }

  /// The managed patch storage directory.
  pub fn patches_dir(&self) -> &Path {
    &self.patches_dir
  }

  /// The series file inside the managed directory.
  pub fn series_file(&self) -> PathBuf {
    self.patches_dir.join("series")
  }

  /// Normalize a patch name to carry the `.patch` suffix.
  pub fn normalize_name(name: &str) -> String {
    if name.ends_with(PATCH_SUFFIX) {
      name.to_string()
    } else {
      format!("{name}{PATCH_SUFFIX}")
    }
  }

  /// Copy a patch into managed storage and append it to the series.
  ///
  /// The destination name defaults to the source file name; a same-named
  /// prior copy is overwritten (last write wins, no versioning). Creates
  /// the series file with a header on first use. Re-adding a name that the
  /// series already lists leaves the file untouched and reports
  /// [`AddOutcome::AlreadyPresent`].
  pub fn add(&self, source: &Path, name: Option<&str>) -> Result<AddOutcome> {
    if !source.exists() {
      return Err(CoreError::NotFound(source.to_path_buf()));
    }

    let name = match name {
      Some(name) => Self::normalize_name(name),
      None => {
        let file_name = source
          .file_name()
          .and_then(|n| n.to_str())
          .ok_or_else(|| CoreError::NotFound(source.to_path_buf()))?;
        Self::normalize_name(file_name)
      }
    };

    fs::create_dir_all(&self.patches_dir)?;

    let dest = self.patches_dir.join(&name);
    fs::copy(source, &dest)?;
    info!(patch = %name, dest = %dest.display(), "patch copied");

    let series_file = self.series_file();
    if !series_file.exists() {
      fs::write(&series_file, format!("{SERIES_HEADER}\n\n{name}\n"))?;
      info!(path = %series_file.display(), "series file created");
      return Ok(AddOutcome::Appended);
    }

    // Exact line membership, not a substring scan: a name that is a
    // prefix of an existing entry must still be appendable.
    if self.entries()?.iter().any(|entry| entry == &name) {
      warn!(patch = %name, "patch already in series");
      return Ok(AddOutcome::AlreadyPresent);
    }

    let content = fs::read_to_string(&series_file)?;
    let mut appended = content;
    appended.push_str(&format!("\n{USER_PATCH_COMMENT}\n{name}\n"));
    fs::write(&series_file, appended)?;
    info!(patch = %name, "patch appended to series");

    Ok(AddOutcome::Appended)
  }

  /// Patch names in application order.
  ///
  /// A missing series file means no overlay is requested and yields an
  /// empty list, not an error.
  pub fn entries(&self) -> Result<Vec<String>> {
    let series_file = self.series_file();
    if !series_file.exists() {
      debug!(path = %series_file.display(), "no series file");
      return Ok(Vec::new());
    }

    let content = fs::read_to_string(&series_file)?;
    Ok(
      content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect(),
    )
  }

  /// All `*.patch` files in managed storage, for staleness evaluation.
  pub fn patch_files(&self) -> Result<Vec<PathBuf>> {
    if !self.patches_dir.exists() {
      return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(&self.patches_dir)? {
      let path = entry?.path();
      if path.is_file()
        && path
          .extension()
          .is_some_and(|ext| ext == PATCH_SUFFIX.trim_start_matches('.'))
      {
        files.push(path);
      }
    }
    files.sort();
    Ok(files)
  }
}
