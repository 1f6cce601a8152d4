//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait and is routed by
//! [`CommandDispatcher`]. Running without a subcommand installs.

pub mod completions;
pub mod dispatcher;
pub mod install;
pub mod plan;
pub mod scan;
pub mod setup;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
