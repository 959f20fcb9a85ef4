//! Release packaging.
//!
//! Stages the built browser with its resources, data blobs and bundled
//! shared libraries, adds a launcher script, and packs everything into a
//! versioned tar.gz at the project root. The version is the short git
//! revision of the project itself, falling back to "dev" outside a repo.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::BuildConfig;
use crate::error::{CoreError, Result};
use crate::process::ExternalCommand;

/// Directory name inside the tarball.
pub const BUNDLE_NAME: &str = "patched-chromium";

/// Main binaries copied from the build output.
const BINARIES: &[&str] = &[
  "chrome",
  "chrome-wrapper",
  "chrome_sandbox",
  "chrome_crashpad_handler",
];

/// Standalone data blobs the browser needs at runtime.
const DATA_FILES: &[&str] = &["icudtl.dat", "snapshot_blob.bin", "v8_context_snapshot.bin"];

/// Resource directories copied wholesale.
const RESOURCE_DIRS: &[&str] = &["resources", "locales"];

const LAUNCHER: &str = r#"#!/usr/bin/env bash
# Standalone launcher for the bundled browser
SCRIPT_DIR="$(cd "$(dirname "${BASH_SOURCE[0]}")" && pwd)"

# Use bundled libraries
export LD_LIBRARY_PATH="$SCRIPT_DIR:$LD_LIBRARY_PATH"

exec "$SCRIPT_DIR/chrome" \
    --no-sandbox \
    "$@"
"#;

/// Package the build output into a distributable tarball.
///
/// Returns the path of the created archive. Fails with `NotFound` when no
/// chrome binary has been built yet.
pub fn package(config: &BuildConfig) -> Result<PathBuf> {
  let out_dir = config.out_path();
  let chrome = config.binary_path();
  if !chrome.exists() {
    return Err(CoreError::NotFound(chrome));
  }

  let version = project_version(config);
  info!(%version, "creating release package");

  clean_old_tarballs(&config.root)?;

  let release_dir = config.release_dir();
  if release_dir.exists() {
    fs::remove_dir_all(&release_dir)?;
  }
  let bundle_dir = release_dir.join(BUNDLE_NAME);
  fs::create_dir_all(&bundle_dir)?;

  stage(&out_dir, &bundle_dir)?;
  write_launcher(&bundle_dir)?;

  let archive_name = format!("{BUNDLE_NAME}-{version}-linux-x86_64.tar.gz");
  let archive_path = config.root.join(&archive_name);
  create_tarball(&release_dir, &archive_path)?;

  info!(archive = %archive_path.display(), "release package created");
  Ok(archive_path)
}

/// Short git revision of the project, or "dev" when unavailable.
fn project_version(config: &BuildConfig) -> String {
  ExternalCommand::new("git")
    .args(["rev-parse", "--short", "HEAD"])
    .current_dir(&config.root)
    .output()
    .unwrap_or_else(|_| "dev".to_string())
}

/// Remove tarballs from previous packaging runs.
fn clean_old_tarballs(root: &Path) -> Result<()> {
  for entry in fs::read_dir(root)? {
    let path = entry?.path();
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
      continue;
    };
    if name.starts_with(BUNDLE_NAME) && name.ends_with(".tar.gz") {
      fs::remove_file(&path)?;
      info!(removed = %name, "removed old release");
    }
  }
  Ok(())
}

/// Copy binaries, resources, data blobs and shared libraries into the
/// bundle directory. Missing optional pieces are skipped with a warning.
fn stage(out_dir: &Path, bundle_dir: &Path) -> Result<()> {
  for binary in BINARIES {
    let src = out_dir.join(binary);
    if src.exists() {
      fs::copy(&src, bundle_dir.join(binary))?;
      set_mode(&bundle_dir.join(binary), 0o755)?;
      info!(file = %binary, "copied binary");
    } else {
      warn!(file = %binary, "binary not present in build output");
    }
  }

  let pak_count = copy_matching(out_dir, bundle_dir, |name| name.ends_with(".pak"))?;
  info!(count = pak_count, "copied resource packs");

  for dir_name in RESOURCE_DIRS {
    let src = out_dir.join(dir_name);
    if src.exists() {
      copy_tree(&src, &bundle_dir.join(dir_name))?;
      info!(dir = %dir_name, "copied directory");
    }
  }

  for data_file in DATA_FILES {
    let src = out_dir.join(data_file);
    if src.exists() {
      fs::copy(&src, bundle_dir.join(data_file))?;
      info!(file = %data_file, "copied data file");
    }
  }

  let so_count = copy_matching(out_dir, bundle_dir, |name| {
    name.ends_with(".so") || name.contains(".so.")
  })?;
  info!(count = so_count, "copied shared libraries");

  Ok(())
}

/// Copy top-level files of `src` whose names satisfy `matches`.
fn copy_matching(
  src: &Path,
  dest: &Path,
  matches: impl Fn(&str) -> bool,
) -> Result<usize> {
  let mut copied = 0;
  for entry in fs::read_dir(src)? {
    let path = entry?.path();
    if !path.is_file() {
      continue;
    }
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
      continue;
    };
    if matches(name) {
      fs::copy(&path, dest.join(name))?;
      copied += 1;
    }
  }
  Ok(copied)
}

/// Recursively copy a directory tree.
fn copy_tree(src: &Path, dest: &Path) -> Result<()> {
  for entry in WalkDir::new(src) {
    let entry = entry.map_err(|e| std::io::Error::other(e.to_string()))?;
    let relative = entry
      .path()
      .strip_prefix(src)
      .expect("walkdir yields descendants of src");
    let target = dest.join(relative);
    if entry.file_type().is_dir() {
      fs::create_dir_all(&target)?;
    } else if entry.file_type().is_file() {
      if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
      }
      fs::copy(entry.path(), &target)?;
    }
  }
  Ok(())
}

fn write_launcher(bundle_dir: &Path) -> Result<()> {
  let launcher = bundle_dir.join(BUNDLE_NAME);
  fs::write(&launcher, LAUNCHER)?;
  set_mode(&launcher, 0o755)?;
  info!("created launcher script");
  Ok(())
}

/// Pack the staged bundle into a gzipped tarball.
fn create_tarball(release_dir: &Path, archive_path: &Path) -> Result<()> {
  let file = File::create(archive_path)?;
  let encoder = GzEncoder::new(file, Compression::default());
  let mut builder = tar::Builder::new(encoder);
  builder.append_dir_all(BUNDLE_NAME, release_dir.join(BUNDLE_NAME))?;
  builder.into_inner()?.finish()?;
  Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
  use std::os::unix::fs::PermissionsExt;
  fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
  Ok(())
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
  Ok(())
}
