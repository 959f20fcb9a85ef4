//! External command execution.
//!
//! Every pipeline stage drives an external tool (git, gclient, gn, ninja,
//! quilt, pacman) through this module. Working directory and environment
//! overrides are explicit per invocation; the process environment is never
//! mutated. Stdio is inherited so the operator sees the tool's own output,
//! and the call blocks until the tool exits.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::error::{CoreError, Result};

/// A fully-specified external tool invocation.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
  program: String,
  args: Vec<String>,
  cwd: Option<PathBuf>,
  envs: Vec<(String, String)>,
}

impl ExternalCommand {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      cwd: None,
      envs: Vec::new(),
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  /// Working directory for the invocation (explicit, never a chdir).
  pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.cwd = Some(dir.into());
    self
  }

  /// Environment override for this invocation only.
  pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.envs.push((key.into(), value.into()));
    self
  }

  /// Human-readable command line, for logs and error messages.
  pub fn render(&self) -> String {
    let mut line = self.program.clone();
    for arg in &self.args {
      line.push(' ');
      line.push_str(arg);
    }
    line
  }

  /// Run the tool with inherited stdio and wait for it to exit.
  ///
  /// Returns the raw exit code for callers that classify outcomes
  /// themselves (the quilt applier). A missing code means the tool was
  /// killed by a signal, which no caller tolerates.
  pub fn status(&self) -> Result<i32> {
    info!(cmd = %self.render(), "running");

    let mut command = Command::new(&self.program);
    command.args(&self.args);
    if let Some(cwd) = &self.cwd {
      command.current_dir(cwd);
    }
    for (key, value) in &self.envs {
      command.env(key, value);
    }

    let status = command.status().map_err(|source| CoreError::Spawn {
      tool: self.program.clone(),
      source,
    })?;

    match status.code() {
      Some(code) => {
        debug!(cmd = %self.render(), code, "exited");
        Ok(code)
      }
      None => Err(CoreError::Terminated {
        tool: self.render(),
      }),
    }
  }

  /// Run the tool and treat any nonzero exit as a fatal pipeline failure.
  pub fn run(&self) -> Result<()> {
    let code = self.status()?;
    if code != 0 {
      return Err(CoreError::ExternalTool {
        tool: self.render(),
        code,
      });
    }
    Ok(())
  }

  /// Run the tool with captured stdout, returning the trimmed output on
  /// success. Used for short queries like `git rev-parse`.
  pub fn output(&self) -> Result<String> {
    debug!(cmd = %self.render(), "running (captured)");

    let mut command = Command::new(&self.program);
    command.args(&self.args);
    if let Some(cwd) = &self.cwd {
      command.current_dir(cwd);
    }
    for (key, value) in &self.envs {
      command.env(key, value);
    }

    let output = command.output().map_err(|source| CoreError::Spawn {
      tool: self.program.clone(),
      source,
    })?;

    if !output.status.success() {
      return Err(CoreError::ExternalTool {
        tool: self.render(),
        code: output.status.code().unwrap_or(1),
      });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }
}

/// Convenience helper for commands that need the depot_tools PATH prepend
/// and the auto-update guard.
pub fn depot_tools_command(
  program: &str,
  depot_tools_dir: &Path,
) -> ExternalCommand {
  let base_path = std::env::var("PATH").unwrap_or_default();
  ExternalCommand::new(program)
    .env(
      "PATH",
      format!("{}:{}", depot_tools_dir.display(), base_path),
    )
    .env("DEPOT_TOOLS_UPDATE", "0")
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn status_returns_exit_code() {
    let code = ExternalCommand::new("sh").arg("-c").arg("exit 3").status().unwrap();
    assert_eq!(code, 3);
  }

  #[test]
  fn run_succeeds_on_zero() {
    ExternalCommand::new("sh").arg("-c").arg("exit 0").run().unwrap();
  }

  #[test]
  fn run_fails_on_nonzero_with_code() {
    let err = ExternalCommand::new("sh").arg("-c").arg("exit 7").run().unwrap_err();
    assert!(matches!(err, CoreError::ExternalTool { code: 7, .. }));
    assert_eq!(err.exit_code(), 7);
  }

  #[test]
  fn spawn_failure_is_reported() {
    let err = ExternalCommand::new("/nonexistent/tool-xyz").run().unwrap_err();
    assert!(matches!(err, CoreError::Spawn { .. }));
  }

  #[test]
  fn output_captures_stdout() {
    let out = ExternalCommand::new("sh").arg("-c").arg("echo hello").output().unwrap();
    assert_eq!(out, "hello");
  }

  #[test]
  fn env_override_is_visible_to_child() {
    let temp = TempDir::new().unwrap();
    let marker = temp.path().join("marker");
    ExternalCommand::new("sh")
      .arg("-c")
      .arg("echo $PST_TEST_VAR > \"$PST_TEST_OUT\"")
      .env("PST_TEST_VAR", "value-42")
      .env("PST_TEST_OUT", marker.to_string_lossy())
      .run()
      .unwrap();
    let content = std::fs::read_to_string(&marker).unwrap();
    assert_eq!(content.trim(), "value-42");
  }

  #[test]
  fn cwd_is_respected() {
    let temp = TempDir::new().unwrap();
    ExternalCommand::new("sh")
      .arg("-c")
      .arg("touch cwd_marker")
      .current_dir(temp.path())
      .run()
      .unwrap();
    assert!(temp.path().join("cwd_marker").exists());
  }

  #[test]
  fn render_joins_program_and_args() {
    let cmd = ExternalCommand::new("ninja").args(["-C", "out/Default", "chrome"]);
    assert_eq!(cmd.render(), "ninja -C out/Default chrome");
  }
}
