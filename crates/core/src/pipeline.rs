//! Build pipeline stages.
//!
//! Two pathways over the same external toolchain:
//! - full setup: system dependencies, depot_tools, pinned source fetch,
//!   patch application, hooks, gn configuration, full compile
//! - incremental rebuild: re-apply the patch series against the existing
//!   checkout, re-run hooks, and let ninja's own dependency tracking decide
//!   what recompiles
//!
//! Every stage is a blocking subprocess invocation with explicit working
//! directory and environment; a stage either completes or aborts the whole
//! pipeline (the tolerated quilt and hook cases excepted).

use std::fs;

use tracing::{info, warn};

use crate::apply::reset_and_apply;
use crate::config::BuildConfig;
use crate::error::{CoreError, Result};
use crate::process::{ExternalCommand, depot_tools_command};

const DEPOT_TOOLS_URL: &str =
  "https://chromium.googlesource.com/chromium/tools/depot_tools.git";

const CHROMIUM_URL: &str = "https://chromium.googlesource.com/chromium/src.git";

/// Arch Linux build dependency catalog.
const PACKAGES: &[&str] = &[
  "python", "perl", "gcc", "gcc-libs", "bison", "flex", "gperf", "pkgconfig",
  "nss", "alsa-lib", "glib2", "gtk3", "nspr", "freetype2", "cairo", "dbus",
  "xorg-server-xvfb", "xorg-xdpyinfo", "ninja", "git", "libxss", "libxtst",
  "libgnome-keyring", "cups", "libpulse", "ttf-liberation", "xdg-utils",
  "mesa", "libva", "libvdpau", "libxslt", "libexif", "libxrandr", "libxt",
  "libxcb", "libxkbcommon", "libxkbfile", "libxinerama", "libxi", "libxext",
  "libxfixes", "libxdamage", "at-spi2-core", "imagemagick", "quilt",
];

/// Static gn argument catalog for the optimized release configuration.
const GN_ARGS: &[&str] = &[
  "is_debug=false",
  "is_component_build=false",
  "symbol_level=0",
  "blink_symbol_level=0",
  "enable_nacl=false",
  "use_mold=true",
  "is_cfi=false",
  "enable_resource_allowlist_generation=false",
  "enable_precompiled_headers=false",
  "optimize_webui=true",
  "enable_iterator_debugging=false",
  "remove_webcore_debug_symbols=true",
  "enable_reading_list=false",
  "enable_service_discovery=false",
  "enable_hangout_services_extension=false",
  "use_remoteexec=false",
  "enable_print_preview=true",
  "v8_symbol_level=0",
  "v8_enable_debugging_features=false",
];

/// Run the complete pipeline from dependency installation through the first
/// successful compile.
pub fn full_setup(config: &BuildConfig) -> Result<()> {
  install_dependencies()?;
  setup_depot_tools(config)?;
  fetch_source(config)?;
  reset_and_apply(config)?;
  run_hooks(config, true)?;
  ensure_bootstrap(config)?;
  configure_build(config)?;
  compile(config)?;
  Ok(())
}

/// Re-apply the overlay and incrementally recompile an existing checkout.
pub fn rebuild(config: &BuildConfig) -> Result<()> {
  let src_dir = config.src_dir();
  if !src_dir.exists() {
    return Err(CoreError::NotFound(src_dir));
  }

  reset_and_apply(config)?;
  run_hooks(config, false)?;
  compile(config)?;
  Ok(())
}

/// Install the build dependency catalog.
fn install_dependencies() -> Result<()> {
  info!("installing build dependencies");
  ExternalCommand::new("sudo")
    .args(["pacman", "-Syu", "--needed", "--noconfirm"])
    .args(PACKAGES.iter().copied())
    .run()?;
  info!("dependencies installed");
  Ok(())
}

/// Clone depot_tools if not already present.
fn setup_depot_tools(config: &BuildConfig) -> Result<()> {
  let depot_tools = config.depot_tools_dir();
  if depot_tools.exists() {
    info!(path = %depot_tools.display(), "depot_tools already exists");
    return Ok(());
  }

  info!("cloning depot_tools");
  ExternalCommand::new("git")
    .args(["clone", "--depth=1", DEPOT_TOOLS_URL])
    .arg(depot_tools.to_string_lossy())
    .run()?;
  info!("depot_tools cloned");
  Ok(())
}

/// Fetch the pinned source tag: write the gclient solution, shallow-clone
/// the tag, then sync dependencies for exactly that revision.
fn fetch_source(config: &BuildConfig) -> Result<()> {
  let checkout = config.checkout_dir();
  let src_dir = config.src_dir();
  if src_dir.exists() {
    info!(path = %src_dir.display(), "source already exists");
    return Ok(());
  }

  info!(tag = %config.tag, "fetching source (shallow clone)");
  fs::create_dir_all(&src_dir)?;
  fs::write(checkout.join(".gclient"), gclient_solution())?;

  ExternalCommand::new("git")
    .args(["clone", "--depth=1", "--branch"])
    .arg(config.tag.as_str())
    .args(["--single-branch", CHROMIUM_URL, "."])
    .current_dir(&src_dir)
    .run()?;
  info!("source cloned");

  info!(tag = %config.tag, "syncing dependencies");
  depot_tools_command("gclient", &config.depot_tools_dir())
    .args(["sync", "--no-history", "-D"])
    .current_dir(&checkout)
    .run()?;
  Ok(())
}

/// The gclient solution written next to the checkout.
fn gclient_solution() -> &'static str {
  r#"solutions = [
  {
    "name": "src",
    "url": "https://chromium.googlesource.com/chromium/src.git",
    "managed": False,
    "custom_deps": {},
    "custom_vars": {},
  },
]
target_os = ["linux"]
"#
}

/// Run gclient hooks. Fatal in the full-setup pathway; in the incremental
/// pathway hook failures are tolerated so a flaky hook cannot block a
/// rebuild of already-synced sources.
fn run_hooks(config: &BuildConfig, fatal: bool) -> Result<()> {
  info!("running gclient hooks");
  let cmd = depot_tools_command("gclient", &config.depot_tools_dir())
    .arg("runhooks")
    .current_dir(config.src_dir());

  if fatal {
    cmd.run()?;
    info!("hooks completed");
  } else {
    let code = cmd.status()?;
    if code != 0 {
      warn!(code, "gclient hooks had issues, continuing anyway");
    }
  }
  Ok(())
}

/// Run the depot_tools bootstrap script if the clone ships one.
fn ensure_bootstrap(config: &BuildConfig) -> Result<()> {
  let bootstrap = config.depot_tools_dir().join("ensure_bootstrap");
  if !bootstrap.exists() {
    return Ok(());
  }

  info!("initializing depot_tools");
  ExternalCommand::new(bootstrap.to_string_lossy())
    .current_dir(config.depot_tools_dir())
    .run()?;
  Ok(())
}

/// Configure the build with gn and the static argument catalog.
fn configure_build(config: &BuildConfig) -> Result<()> {
  info!("configuring build");
  depot_tools_command("gn", &config.depot_tools_dir())
    .arg("gen")
    .arg(config.out_dir.as_str())
    .arg(format!("--args={}", GN_ARGS.join(" ")))
    .current_dir(config.src_dir())
    .run()?;
  info!("build configured");
  Ok(())
}

/// Compile the chrome target with ninja. Incremental by construction: the
/// build system's own dependency tracking determines what recompiles.
fn compile(config: &BuildConfig) -> Result<()> {
  info!(jobs = config.jobs, "building chrome");
  depot_tools_command("ninja", &config.depot_tools_dir())
    .args(["-C", config.out_dir.as_str()])
    .arg(format!("-j{}", config.jobs))
    .arg("chrome")
    .current_dir(config.src_dir())
    .run()?;
  info!(binary = %config.binary_path().display(), "build complete");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn rebuild_without_checkout_fails() {
    let temp = TempDir::new().unwrap();
    let config = BuildConfig::new(temp.path());
    let err = rebuild(&config).unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
  }

  #[test]
  fn gn_args_form_a_single_argument() {
    let args = GN_ARGS.join(" ");
    assert!(args.starts_with("is_debug=false"));
    assert!(args.contains("use_mold=true"));
    assert!(!args.contains("  "));
  }

  #[test]
  fn dependency_catalog_includes_toolchain() {
    assert!(PACKAGES.contains(&"ninja"));
    assert!(PACKAGES.contains(&"quilt"));
    assert!(PACKAGES.contains(&"git"));
  }

  #[test]
  fn gclient_solution_pins_linux() {
    let solution = gclient_solution();
    assert!(solution.contains("\"name\": \"src\""));
    assert!(solution.contains("target_os = [\"linux\"]"));
  }
}
