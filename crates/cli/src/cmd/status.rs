//! Implementation of the `patchstack status` command.

use anyhow::Result;
use patchstack_core::{BuildConfig, PatchSeries, Staleness, verdict};
use serde::Serialize;

use crate::output::{self, OutputFormat};

/// Machine-readable status snapshot.
#[derive(Debug, Serialize)]
struct StatusReport {
  #[serde(flatten)]
  config: BuildConfig,
  verdict: Staleness,
  binary: String,
  binary_exists: bool,
  patches: Vec<String>,
}

pub fn cmd_status(config: &BuildConfig, format: OutputFormat) -> Result<()> {
  let series = PatchSeries::new(config.patches_dir());
  let verdict = verdict(config)?;
  let binary = config.binary_path();

  let report = StatusReport {
    config: config.clone(),
    verdict,
    binary: binary.display().to_string(),
    binary_exists: binary.exists(),
    patches: series.entries()?,
  };

  if format.is_json() {
    return output::print_json(&report);
  }

  output::print_info(&format!("patchstack v{}", env!("CARGO_PKG_VERSION")));
  println!();
  output::print_stat("Root", &config.root.display().to_string());
  output::print_stat("Tag", &config.tag);
  output::print_stat("Out dir", &config.out_dir);
  output::print_stat("Jobs", &config.jobs.to_string());
  output::print_stat("Binary", &report.binary);
  output::print_stat("Verdict", verdict.as_str());
  println!();

  if report.patches.is_empty() {
    output::print_info("No patches in series");
  } else {
    output::print_info(&format!("{} patch(es) in series:", report.patches.len()));
    for patch in &report.patches {
      println!("    {patch}");
    }
  }

  Ok(())
}
