//! Mock commander for testing.
//!
//! `MockCommander` implements the [`Commander`] trait, records every call,
//! and answers with pre-configured responses. Response and failure keys are
//! matched against `"name arg1 arg2 ..."`: an exact match wins, otherwise the
//! longest configured prefix applies.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use instrumentor::commander::{Commander, MockCommander, RunContext};
//!
//! let mock = MockCommander::new()
//!     .with_tool("go")
//!     .with_response("go list -m -json", r#"{"Version": "v1.24.0"}"#);
//!
//! let args = vec!["list".to_string(), "-m".to_string(), "-json".to_string()];
//! let out = mock.run(&RunContext::new(), "go", &args, Path::new(".")).unwrap();
//! assert!(out.output.contains("v1.24.0"));
//! assert_eq!(mock.calls().len(), 1);
//! ```

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{display_command, CommandOutput, Commander, RunContext};
use crate::error::{InstrumentorError, Result};

/// A captured command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub name: String,
    pub args: Vec<String>,
    pub dir: PathBuf,
}

impl RecordedCall {
    /// The call rendered as `"name arg1 arg2"`.
    pub fn command_line(&self) -> String {
        display_command(&self.name, &self.args)
    }
}

/// Recording [`Commander`] with canned responses.
#[derive(Debug, Default)]
pub struct MockCommander {
    tools: HashSet<String>,
    responses: HashMap<String, String>,
    failures: HashMap<String, String>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockCommander {
    /// Create a mock with no tools available.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a tool discoverable through `look_path`.
    pub fn with_tool(mut self, name: &str) -> Self {
        self.tools.insert(name.to_string());
        self
    }

    /// Answer commands matching `pattern` with successful `output`.
    pub fn with_response(mut self, pattern: &str, output: &str) -> Self {
        self.responses
            .insert(pattern.to_string(), output.to_string());
        self
    }

    /// Fail commands matching `pattern` with exit code 1 and `output`.
    pub fn with_failure(mut self, pattern: &str, output: &str) -> Self {
        self.failures.insert(pattern.to_string(), output.to_string());
        self
    }

    /// All calls made so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Calls rendered as command lines.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(RecordedCall::command_line).collect()
    }

    fn lookup<'a>(table: &'a HashMap<String, String>, key: &str) -> Option<(usize, &'a String)> {
        if let Some(value) = table.get(key) {
            return Some((usize::MAX, value));
        }
        table
            .iter()
            .filter(|(pattern, _)| key.starts_with(pattern.as_str()))
            .max_by_key(|(pattern, _)| pattern.len())
            .map(|(pattern, value)| (pattern.len(), value))
    }
}

impl Commander for MockCommander {
    fn look_path(&self, name: &str) -> Result<PathBuf> {
        if self.tools.contains(name) {
            Ok(PathBuf::from("/usr/bin").join(name))
        } else {
            Err(InstrumentorError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("executable file not found in PATH: {name}"),
            )))
        }
    }

    fn run(
        &self,
        ctx: &RunContext,
        name: &str,
        args: &[String],
        dir: &Path,
    ) -> Result<CommandOutput> {
        let key = display_command(name, args);
        ctx.check(&key)?;

        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                name: name.to_string(),
                args: args.to_vec(),
                dir: dir.to_path_buf(),
            });
        }

        let failure = Self::lookup(&self.failures, &key);
        let response = Self::lookup(&self.responses, &key);
        match (failure, response) {
            (Some((f, out)), Some((r, _))) if f >= r => Ok(CommandOutput::failure(Some(1), out.clone())),
            (Some((_, out)), None) => Ok(CommandOutput::failure(Some(1), out.clone())),
            (_, Some((_, out))) => Ok(CommandOutput::success(out.clone())),
            (None, None) => Ok(CommandOutput::success("")),
        }
    }
}
