//! Error types for patchstack-core

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in core operations
#[derive(Debug, Error)]
pub enum CoreError {
  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("path not found: {0}")]
  NotFound(PathBuf),

  #[error("failed to spawn '{tool}': {source}")]
  Spawn {
    tool: String,
    source: std::io::Error,
  },

  /// An external tool exited nonzero and the failure is fatal for the
  /// pipeline. The exit code is propagated as the process exit code.
  #[error("'{tool}' failed with exit code {code}")]
  ExternalTool { tool: String, code: i32 },

  /// An external tool was killed by a signal before producing an exit code.
  #[error("'{tool}' terminated by signal")]
  Terminated { tool: String },
}

impl CoreError {
  /// The exit code the process should terminate with for this error.
  ///
  /// Fatal external-tool failures carry the tool's own exit code so the
  /// operator gets a directly actionable signal; everything else maps to 1.
  pub fn exit_code(&self) -> i32 {
    match self {
      CoreError::ExternalTool { code, .. } => *code,
      _ => 1,
    }
  }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn external_tool_exit_code_is_propagated() {
    let err = CoreError::ExternalTool {
      tool: "ninja".to_string(),
      code: 42,
    };
    assert_eq!(err.exit_code(), 42);
  }

  #[test]
  fn other_errors_exit_with_one() {
    let err = CoreError::NotFound(PathBuf::from("/missing"));
    assert_eq!(err.exit_code(), 1);
  }
}
