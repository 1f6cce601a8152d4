//! The `install` command.

use std::path::{Path, PathBuf};

use anyhow::anyhow;

use crate::cli::args::InstallArgs;
use crate::cli::output::Output;
use crate::config::{Config, CONFIG_FILE};
use crate::error::Result;
use crate::orchestrator::InstallJob;

use super::dispatcher::{Command, CommandResult};
use super::setup;

/// Installs one plan given on the command line, or every configured project.
pub struct InstallCommand {
    project_root: PathBuf,
    args: InstallArgs,
}

impl InstallCommand {
    pub fn new(project_root: &Path, args: InstallArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            args,
        }
    }

    fn jobs(&self, config: &Config) -> Result<Vec<InstallJob>> {
        let selection = &self.args.selection;
        if selection.is_partial() {
            return Err(anyhow!("--language is required when selecting packages").into());
        }
        match selection.plan() {
            Some(plan) => Ok(vec![InstallJob::new(self.project_root.clone(), plan)]),
            None if !config.projects.is_empty() => Ok(config.jobs(&self.project_root)),
            None => Err(anyhow!(
                "no --language given and no projects configured in {}",
                CONFIG_FILE
            )
            .into()),
        }
    }
}

impl Command for InstallCommand {
    fn execute(&self, out: &Output) -> Result<CommandResult> {
        let config = Config::load(&self.project_root)?;
        let jobs = self.jobs(&config)?;
        let orchestrator = setup::orchestrator(&self.project_root, &config, &self.args.selection)?;
        let ctx = setup::run_context(self.args.timeout, &config);
        let dry_run = self.args.dry_run;

        if let [job] = jobs.as_slice() {
            let missing = orchestrator.run(&ctx, &job.project, &job.plan, dry_run)?;
            report(out, job, &missing, dry_run);
            return Ok(CommandResult::success());
        }

        let results = orchestrator.run_batch(&ctx, &jobs, dry_run)?;
        let mut failed = 0;
        for (job, result) in jobs.iter().zip(results) {
            match result {
                Ok(missing) => report(out, job, &missing, dry_run),
                Err(e) => {
                    failed += 1;
                    out.error(&format!("{}: {}", job.project.display(), e));
                }
            }
        }

        if failed > 0 {
            out.warning(&format!("{} of {} project(s) failed", failed, jobs.len()));
            return Ok(CommandResult::failure(1));
        }
        Ok(CommandResult::success())
    }
}

fn report(out: &Output, job: &InstallJob, missing: &[String], dry_run: bool) {
    out.header(&format!("{} ({})", job.plan.language, job.project.display()));
    if missing.is_empty() {
        out.success("Up to date");
        return;
    }
    for package in missing {
        out.item(package);
    }
    if dry_run {
        out.message(&format!("Dry run: {} package(s) would be installed", missing.len()));
    } else {
        out.success(&format!("Installed {} package(s)", missing.len()));
    }
}
