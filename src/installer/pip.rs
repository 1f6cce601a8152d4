//! pip installer.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::{append_lines, require_manifest, write_atomic, Installer, ToolCandidate, ToolChain, ToolRunner};
use crate::commander::{Commander, RunContext};
use crate::error::Result;
use crate::registry::Ecosystem;
use crate::scanner::pip::{requirement_name, REQUIREMENTS_TXT};

/// Installs packages with the first available pip, then records them in
/// requirements.txt.
pub struct PipInstaller {
    commander: Arc<dyn Commander>,
    tools: ToolChain,
}

impl PipInstaller {
    pub fn new(commander: Arc<dyn Commander>) -> Self {
        Self {
            commander,
            tools: ToolChain::new(vec![
                ToolCandidate::new("pip"),
                ToolCandidate::new("pip3"),
                ToolCandidate::with_prefix("python", &["-m", "pip"]),
            ]),
        }
    }
}

fn requirement_key(line: &str) -> Option<String> {
    requirement_name(line).map(str::to_lowercase)
}

/// Append requirements whose names are not yet listed.
///
/// Names are compared case-insensitively, ignoring version operators.
pub fn add_requirements(content: &str, dependencies: &[String]) -> String {
    let mut listed: HashSet<String> = content.lines().filter_map(requirement_key).collect();
    let additions: Vec<String> = dependencies
        .iter()
        .filter(|dep| requirement_key(dep).is_some_and(|key| listed.insert(key)))
        .map(|dep| dep.trim().to_string())
        .collect();

    if additions.is_empty() {
        content.to_string()
    } else {
        append_lines(content, &additions)
    }
}

impl Installer for PipInstaller {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Pip
    }

    fn install(
        &self,
        ctx: &RunContext,
        project: &Path,
        dependencies: &[String],
        dry_run: bool,
    ) -> Result<()> {
        if dependencies.is_empty() {
            return Ok(());
        }
        let requirements = require_manifest(project, REQUIREMENTS_TXT)?;
        if dry_run {
            return Ok(());
        }

        if let Some(tool) = self.tools.resolve(self.commander.as_ref()) {
            let pip = ToolRunner::new(self.commander.as_ref(), ctx, project, tool);
            for dep in dependencies {
                pip.run(&["install".to_string(), "-U".to_string(), dep.clone()], Some(dep.as_str()))?;
            }
            info!("Installed {} package(s) with {}", dependencies.len(), pip.program());
        }

        let content = fs::read_to_string(&requirements)?;
        let updated = add_requirements(&content, dependencies);
        if write_atomic(&requirements, &content, &updated)? {
            info!("Updated {}", requirements.display());
        }
        Ok(())
    }
}
