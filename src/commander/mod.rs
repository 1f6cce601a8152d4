//! External process execution.
//!
//! Every installer talks to native package tools through the [`Commander`]
//! trait so it can be exercised without invoking real binaries.
//!
//! - [`SystemCommander`] spawns real processes
//! - [`MockCommander`] records calls and returns canned responses
//! - [`RunContext`] carries the caller's deadline and cancellation flag

pub mod context;
pub mod mock;
pub mod system;

pub use context::RunContext;
pub use mock::{MockCommander, RecordedCall};
pub use system::SystemCommander;

use std::path::{Path, PathBuf};

use crate::error::Result;

/// Captured result of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Combined stdout and stderr.
    pub output: String,

    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Whether the process exited with code 0.
    pub success: bool,
}

impl CommandOutput {
    /// Create a success result.
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            exit_code: Some(0),
            success: true,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: Option<i32>, output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            exit_code,
            success: false,
        }
    }
}

/// Abstraction over process lookup and execution.
pub trait Commander: Send + Sync {
    /// Resolve a tool name to an executable path.
    fn look_path(&self, name: &str) -> Result<PathBuf>;

    /// Run `name args...` in `dir`, returning combined output.
    ///
    /// A non-zero exit is reported through [`CommandOutput::success`], not as
    /// an `Err`. Errors are reserved for spawn failures and cancellation.
    fn run(&self, ctx: &RunContext, name: &str, args: &[String], dir: &Path)
        -> Result<CommandOutput>;

    /// Whether a tool is available.
    fn has_tool(&self, name: &str) -> bool {
        self.look_path(name).is_ok()
    }
}

/// Render a command line for logs and error messages.
pub fn display_command(name: &str, args: &[String]) -> String {
    if args.is_empty() {
        name.to_string()
    } else {
        format!("{} {}", name, args.join(" "))
    }
}
