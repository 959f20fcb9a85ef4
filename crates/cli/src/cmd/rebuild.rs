//! Implementation of the `patchstack rebuild` command.
//!
//! Forces the incremental pathway regardless of the staleness verdict, for
//! explicit manual reapplication of the patch series.

use anyhow::Result;
use patchstack_core::{BuildConfig, pipeline};

use crate::output;

pub fn cmd_rebuild(config: &BuildConfig) -> Result<()> {
  output::print_info("Quick rebuild with current patches");

  pipeline::rebuild(config)?;

  output::print_success("Rebuild complete!");
  output::print_stat("Binary", &config.binary_path().display().to_string());
  println!();
  output::print_info("Next: run 'patchstack release' to create a release package");

  Ok(())
}
