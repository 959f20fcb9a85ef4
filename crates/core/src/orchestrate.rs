//! Top-level build orchestration.
//!
//! A one-shot state machine over the staleness verdict: full setup when no
//! checkout or artifact exists, incremental rebuild when the overlay is
//! newer than the artifact, nothing otherwise. The orchestrator itself is
//! stateless between runs; everything it decides on lives in filesystem
//! timestamps.

use tracing::info;

use crate::config::BuildConfig;
use crate::error::Result;
use crate::pipeline;
use crate::series::PatchSeries;
use crate::staleness::{self, Staleness};

/// Evaluate the current staleness verdict for `config` without acting on it.
pub fn verdict(config: &BuildConfig) -> Result<Staleness> {
  let series = PatchSeries::new(config.patches_dir());
  let patch_files = series.patch_files()?;
  Ok(staleness::evaluate(
    &config.src_dir(),
    &config.binary_path(),
    &patch_files,
    &series.series_file(),
  ))
}

/// Evaluate staleness and dispatch to the matching pipeline pathway.
///
/// Returns the verdict that was acted on so the caller can report what
/// happened (`UpToDate` means nothing ran).
pub fn orchestrate(config: &BuildConfig) -> Result<Staleness> {
  let verdict = verdict(config)?;
  info!(%verdict, "staleness evaluated");

  match verdict {
    Staleness::NeedsFullSetup => {
      info!("running full build setup");
      pipeline::full_setup(config)?;
    }
    Staleness::NeedsIncremental => {
      info!("new patches detected, running quick rebuild");
      pipeline::rebuild(config)?;
    }
    Staleness::UpToDate => {
      info!("no changes detected");
    }
  }

  Ok(verdict)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::TempDir;

  #[test]
  fn verdict_full_setup_on_empty_root() {
    let temp = TempDir::new().unwrap();
    let config = BuildConfig::new(temp.path());
    assert_eq!(verdict(&config).unwrap(), Staleness::NeedsFullSetup);
  }

  #[test]
  fn verdict_up_to_date_with_fresh_artifact_and_no_overlay() {
    let temp = TempDir::new().unwrap();
    let config = BuildConfig::new(temp.path());
    fs::create_dir_all(config.out_path()).unwrap();
    fs::write(config.binary_path(), "binary").unwrap();

    assert_eq!(verdict(&config).unwrap(), Staleness::UpToDate);
  }

  #[test]
  fn orchestrate_is_a_noop_when_up_to_date() {
    let temp = TempDir::new().unwrap();
    let config = BuildConfig::new(temp.path());
    fs::create_dir_all(config.out_path()).unwrap();
    fs::write(config.binary_path(), "binary").unwrap();

    // Up-to-date must not touch any external tool, so this succeeds even
    // with no toolchain installed.
    assert_eq!(orchestrate(&config).unwrap(), Staleness::UpToDate);
  }

  #[test]
  fn verdict_incremental_when_series_newer_than_artifact() {
    use std::time::{Duration, SystemTime};

    let temp = TempDir::new().unwrap();
    let config = BuildConfig::new(temp.path());
    fs::create_dir_all(config.out_path()).unwrap();
    fs::write(config.binary_path(), "binary").unwrap();
    fs::create_dir_all(config.patches_dir()).unwrap();
    fs::write(config.series_file(), "# Quilt patch series\n").unwrap();

    let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
    fs::File::options()
      .write(true)
      .open(config.binary_path())
      .unwrap()
      .set_modified(base)
      .unwrap();
    fs::File::options()
      .write(true)
      .open(config.series_file())
      .unwrap()
      .set_modified(base + Duration::from_secs(1))
      .unwrap();

    assert_eq!(verdict(&config).unwrap(), Staleness::NeedsIncremental);
  }
}
