//! Implementation of the `patchstack build` command.
//!
//! Evaluates the staleness verdict and dispatches to the matching pathway:
//! full setup when no checkout or binary exists, quick rebuild when the
//! patch overlay is newer than the binary, and a no-op report otherwise.

use anyhow::Result;
use patchstack_core::{BuildConfig, Staleness, orchestrate};

use crate::output;

pub fn cmd_build(config: &BuildConfig) -> Result<()> {
  output::print_info(&format!(
    "Checking build state in {}",
    config.root.display()
  ));

  let verdict = orchestrate(config)?;
  let binary = config.binary_path();

  match verdict {
    Staleness::NeedsFullSetup => {
      output::print_success("Full build complete!");
      output::print_stat("Binary", &binary.display().to_string());
    }
    Staleness::NeedsIncremental => {
      output::print_success("Rebuild complete!");
      output::print_stat("Binary", &binary.display().to_string());
      println!();
      output::print_info("Next: run 'patchstack release' to create a release package");
    }
    Staleness::UpToDate => {
      output::print_success("No changes detected, binary is up to date");
      output::print_stat("Binary", &binary.display().to_string());
      println!();
      println!("Options:");
      println!("  patchstack rebuild          - Rebuild with current patches");
      println!("  patchstack add-patch <file> - Add a new patch");
      println!("  patchstack release          - Create release package");
    }
  }

  Ok(())
}
