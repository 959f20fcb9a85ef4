//! patchstack - patched-browser build orchestrator
//!
//! Manages a quilt patch series over a pinned Chromium checkout, decides
//! from filesystem timestamps whether a rebuild is needed, drives the
//! external build toolchain, and packages the result for distribution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use patchstack_core::{BuildConfig, CoreError};
use tracing_subscriber::EnvFilter;

mod cmd;
mod output;

use output::OutputFormat;

#[derive(Parser)]
#[command(name = "patchstack")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Project root holding patches/, chromium-src/ and depot_tools/
  #[arg(long, global = true, default_value = ".")]
  root: PathBuf,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Copy a patch into the managed series
  AddPatch {
    /// Path to the patch file to add
    path: PathBuf,

    /// Name to store the patch under (default: the source file name)
    name: Option<String>,
  },

  /// Detect what needs to be done and run the matching build pathway
  Build,

  /// Force the incremental pathway: re-apply patches and recompile
  Rebuild,

  /// Package the built browser into a distributable tarball
  Release,

  /// Show configuration and the current staleness verdict
  Status {
    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
  },
}

fn main() {
  let cli = Cli::parse();

  let filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .without_time()
    .init();

  let config = BuildConfig::from_env(&cli.root);

  let result = match cli.command {
    Commands::AddPatch { path, name } => cmd::cmd_add_patch(&config, &path, name.as_deref()),
    Commands::Build => cmd::cmd_build(&config),
    Commands::Rebuild => cmd::cmd_rebuild(&config),
    Commands::Release => cmd::cmd_release(&config),
    Commands::Status { format } => cmd::cmd_status(&config, format),
  };

  if let Err(err) = result {
    output::print_error(&format!("{err:#}"));
    // A fatal external tool failure terminates with that tool's exit code
    // so the operator can act on it directly.
    let code = err
      .downcast_ref::<CoreError>()
      .map(CoreError::exit_code)
      .unwrap_or(1);
    std::process::exit(code);
  }
}
