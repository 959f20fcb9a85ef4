//! Idempotent patch application via the quilt patch stack.
//!
//! Quilt tracks applied patches as a stack inside the working tree, and its
//! behavior when pushed against a partially-applied tree is order-sensitive.
//! The applier therefore never trusts the tree's current state: every apply
//! first pops the whole stack back to the clean baseline, then pushes the
//! full series. Repeated invocations yield the same tree regardless of
//! whether the previous state was clean, partial, or fully applied.

use std::path::Path;

use tracing::{info, warn};

use crate::config::BuildConfig;
use crate::error::{CoreError, Result};
use crate::process::ExternalCommand;
use crate::series::PatchSeries;

/// Classified quilt exit status.
///
/// Quilt's contract: 0 is success, 2 means there was nothing to do (empty
/// stack on pop, empty or fully-applied series on push), 1 is a partial
/// failure (some patch did not apply cleanly). Anything else is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuiltOutcome {
  Success,
  NothingToDo,
  PartialFailure,
  Fatal(i32),
}

impl QuiltOutcome {
  pub fn classify(code: i32) -> Self {
    match code {
      0 => QuiltOutcome::Success,
      2 => QuiltOutcome::NothingToDo,
      1 => QuiltOutcome::PartialFailure,
      code => QuiltOutcome::Fatal(code),
    }
  }
}

/// Result of a reset-and-apply pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyReport {
  /// The full series was applied cleanly.
  Applied,
  /// The series was empty or already reflected in the tree.
  NothingToApply,
  /// Some patches failed to apply; the build proceeds anyway so one bad
  /// patch does not block a rebuild.
  AppliedWithWarnings,
  /// No series file exists: no overlay requested, nothing done.
  NoSeries,
}

/// Reset the working tree to the clean baseline, then apply the full series.
///
/// A missing series file is not an error. Pop failures are warned about and
/// tolerated (a tree with nothing tracked pops "unsuccessfully"); push
/// partial failures are downgraded to warnings; any other push failure
/// aborts the pipeline with the tool's exit code.
pub fn reset_and_apply(config: &BuildConfig) -> Result<ApplyReport> {
  let series = PatchSeries::new(config.patches_dir());
  let series_file = series.series_file();
  if !series_file.exists() {
    warn!(path = %series_file.display(), "no series file, skipping patch application");
    return Ok(ApplyReport::NoSeries);
  }

  let src_dir = config.src_dir();

  info!("resetting working tree to clean state");
  let pop = quilt(config, &src_dir).arg("pop").arg("-a").status()?;
  match QuiltOutcome::classify(pop) {
    QuiltOutcome::Success | QuiltOutcome::NothingToDo => {}
    outcome => {
      warn!(?outcome, "issue popping patches, continuing anyway");
    }
  }

  info!("applying patch series");
  let push = quilt(config, &src_dir).arg("push").arg("-a").status()?;
  match QuiltOutcome::classify(push) {
    QuiltOutcome::Success => {
      info!("all patches applied");
      Ok(ApplyReport::Applied)
    }
    QuiltOutcome::NothingToDo => {
      info!("no patches to apply");
      Ok(ApplyReport::NothingToApply)
    }
    QuiltOutcome::PartialFailure => {
      warn!("some patches may have failed to apply, continuing with build");
      Ok(ApplyReport::AppliedWithWarnings)
    }
    QuiltOutcome::Fatal(code) => Err(CoreError::ExternalTool {
      tool: format!("{} push -a", config.quilt),
      code,
    }),
  }
}

/// Base quilt invocation: explicit working directory and patch directory,
/// no reliance on ambient process state.
fn quilt(config: &BuildConfig, src_dir: &Path) -> ExternalCommand {
  ExternalCommand::new(config.quilt.as_str())
    .current_dir(src_dir)
    .env("QUILT_PATCHES", config.patches_dir().to_string_lossy())
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::TempDir;

  #[test]
  fn classify_maps_quilt_codes() {
    assert_eq!(QuiltOutcome::classify(0), QuiltOutcome::Success);
    assert_eq!(QuiltOutcome::classify(2), QuiltOutcome::NothingToDo);
    assert_eq!(QuiltOutcome::classify(1), QuiltOutcome::PartialFailure);
    assert_eq!(QuiltOutcome::classify(127), QuiltOutcome::Fatal(127));
  }

  #[test]
  fn missing_series_is_a_noop() {
    let temp = TempDir::new().unwrap();
    let config = BuildConfig::new(temp.path());
    let report = reset_and_apply(&config).unwrap();
    assert_eq!(report, ApplyReport::NoSeries);
  }

  #[cfg(unix)]
  mod with_stub {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    /// Stand up a config whose quilt is a shell stub that logs every
    /// invocation (subcommand, cwd, QUILT_PATCHES) and exits with the code
    /// configured per subcommand.
    fn stub_config(temp: &TempDir, pop_code: i32, push_code: i32) -> (BuildConfig, PathBuf) {
      let root = temp.path();
      fs::create_dir_all(root.join("patches")).unwrap();
      fs::create_dir_all(root.join("chromium-src/src")).unwrap();
      fs::write(root.join("patches/series"), "# Quilt patch series\n\na.patch\n").unwrap();

      let log = root.join("quilt.log");
      let stub = root.join("quilt-stub");
      let script = format!(
        "#!/bin/sh\necho \"$1 cwd=$(pwd -P) patches=$QUILT_PATCHES\" >> {log}\n\
         case \"$1\" in\n  pop) exit {pop_code} ;;\n  push) exit {push_code} ;;\nesac\nexit 9\n",
        log = log.display(),
      );
      fs::write(&stub, script).unwrap();
      fs::set_permissions(&stub, fs::Permissions::from_mode(0o755)).unwrap();

      let mut config = BuildConfig::new(root);
      config.quilt = stub.to_string_lossy().to_string();
      (config, log)
    }

    #[test]
    fn pops_before_pushing_with_explicit_env() {
      let temp = TempDir::new().unwrap();
      let (config, log) = stub_config(&temp, 0, 0);

      let report = reset_and_apply(&config).unwrap();
      assert_eq!(report, ApplyReport::Applied);

      let log = fs::read_to_string(&log).unwrap();
      let lines: Vec<&str> = log.lines().collect();
      assert_eq!(lines.len(), 2);
      assert!(lines[0].starts_with("pop "));
      assert!(lines[1].starts_with("push "));
      let src = config.src_dir().canonicalize().unwrap();
      assert!(lines[0].contains(&format!("cwd={}", src.display())));
      assert!(lines[0].contains(&format!("patches={}", config.patches_dir().display())));
    }

    #[test]
    fn nothing_to_do_is_success() {
      let temp = TempDir::new().unwrap();
      let (config, _) = stub_config(&temp, 2, 2);
      let report = reset_and_apply(&config).unwrap();
      assert_eq!(report, ApplyReport::NothingToApply);
    }

    #[test]
    fn partial_push_downgrades_to_warning() {
      let temp = TempDir::new().unwrap();
      let (config, _) = stub_config(&temp, 0, 1);
      let report = reset_and_apply(&config).unwrap();
      assert_eq!(report, ApplyReport::AppliedWithWarnings);
    }

    #[test]
    fn fatal_push_aborts_with_code() {
      let temp = TempDir::new().unwrap();
      let (config, _) = stub_config(&temp, 0, 3);
      let err = reset_and_apply(&config).unwrap_err();
      assert!(matches!(err, CoreError::ExternalTool { code: 3, .. }));
    }

    #[test]
    fn pop_failure_does_not_block_apply() {
      let temp = TempDir::new().unwrap();
      let (config, log) = stub_config(&temp, 1, 0);
      let report = reset_and_apply(&config).unwrap();
      assert_eq!(report, ApplyReport::Applied);

      let log = fs::read_to_string(&log).unwrap();
      assert_eq!(log.lines().count(), 2);
    }
  }
}
