//! Implementation of the `patchstack add-patch` command.

use std::path::Path;

use anyhow::Result;
use patchstack_core::{AddOutcome, BuildConfig, PatchSeries};

use crate::output;

/// Copy a patch into managed storage and register it in the series file.
///
/// Re-adding a patch the series already names is reported as a warning,
/// not an error.
pub fn cmd_add_patch(config: &BuildConfig, path: &Path, name: Option<&str>) -> Result<()> {
  let series = PatchSeries::new(config.patches_dir());

  let display_name = match name {
    Some(name) => PatchSeries::normalize_name(name),
    None => PatchSeries::normalize_name(&path.file_name().unwrap_or_default().to_string_lossy()),
  };

  match series.add(path, name)? {
    AddOutcome::Appended => {
      output::print_success(&format!(
        "Patch added to series: {}",
        series.patches_dir().join(&display_name).display()
      ));
      println!();
      output::print_info("Now run: patchstack build");
    }
    AddOutcome::AlreadyPresent => {
      output::print_warning(&format!("Patch already in series: {display_name}"));
    }
  }

  Ok(())
}
