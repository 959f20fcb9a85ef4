//! Implementation of the `patchstack release` command.

use anyhow::Result;
use patchstack_core::{BuildConfig, release};

use crate::output;

/// Package the built browser into a versioned tarball at the project root.
pub fn cmd_release(config: &BuildConfig) -> Result<()> {
  output::print_info("Creating release package");

  let archive = release::package(config)?;
  let size = std::fs::metadata(&archive).map(|m| m.len()).unwrap_or(0);

  output::print_success(&format!("Release package created: {}", archive.display()));
  output::print_stat("Size", &output::format_bytes(size));
  println!();
  println!("Next steps:");
  println!("  gh release create <tag> {}", archive.display());

  Ok(())
}
