//! Shell completions generation.
//!
//! The `instrumentor completions` command generates shell completion scripts.

use crate::cli::args::{Cli, CompletionsArgs};
use crate::cli::output::Output;
use clap::CommandFactory;

use super::dispatcher::{Command, CommandResult};

/// The completions command implementation.
pub struct CompletionsCommand {
    args: CompletionsArgs,
}

impl CompletionsCommand {
    pub fn new(args: CompletionsArgs) -> Self {
        Self { args }
    }
}

impl Command for CompletionsCommand {
    fn execute(&self, _out: &Output) -> crate::error::Result<CommandResult> {
        let mut cmd = Cli::command();
        clap_complete::generate(self.args.shell, &mut cmd, "instrumentor", &mut std::io::stdout());
        Ok(CommandResult::success())
    }
}
