//! The `plan` command.

use std::path::{Path, PathBuf};

use anyhow::anyhow;
use serde_json::json;

use crate::cli::args::PlanArgs;
use crate::cli::output::Output;
use crate::commander::RunContext;
use crate::config::Config;
use crate::error::Result;

use super::dispatcher::{Command, CommandResult};
use super::setup;

/// Prints what `install` would add, without running any tool.
pub struct PlanCommand {
    project_root: PathBuf,
    args: PlanArgs,
}

impl PlanCommand {
    pub fn new(project_root: &Path, args: PlanArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            args,
        }
    }
}

impl Command for PlanCommand {
    fn execute(&self, out: &Output) -> Result<CommandResult> {
        let selection = &self.args.selection;
        let plan = selection
            .plan()
            .ok_or_else(|| anyhow!("--language is required"))?;
        let config = Config::load(&self.project_root)?;
        let orchestrator = setup::orchestrator(&self.project_root, &config, selection)?;

        let missing = orchestrator.run(&RunContext::new(), &self.project_root, &plan, true)?;

        if self.args.json {
            let doc = json!({
                "language": plan.language,
                "project": self.project_root,
                "missing": missing,
            });
            out.raw(&serde_json::to_string_pretty(&doc).map_err(anyhow::Error::from)?);
            return Ok(CommandResult::success());
        }

        out.header(&format!("Plan for {} project", plan.language));
        if missing.is_empty() {
            out.success("Nothing to install");
        }
        for package in &missing {
            out.item(package);
        }
        Ok(CommandResult::success())
    }
}
