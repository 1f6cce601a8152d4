//! Command-line interface for instrumentor.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations
//! - [`output`] - Styled terminal output

pub mod args;
pub mod commands;
pub mod output;

pub use args::{Cli, Commands, InstallArgs, PlanArgs, ScanArgs, Selection};
pub use commands::{Command, CommandDispatcher, CommandResult};
pub use output::Output;
