//! Bundler installer.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::{append_lines, require_manifest, write_atomic, Installer, ToolChain, ToolRunner};
use crate::commander::{Commander, RunContext};
use crate::error::Result;
use crate::registry::Ecosystem;
use crate::scanner::gemfile::{declared_gems, GEMFILE};

/// Adds gems with `bundle add`, or appends `gem` lines to the Gemfile when
/// bundler is missing.
pub struct BundlerInstaller {
    commander: Arc<dyn Commander>,
    tools: ToolChain,
}

impl BundlerInstaller {
    pub fn new(commander: Arc<dyn Commander>) -> Self {
        Self {
            commander,
            tools: ToolChain::single("bundle"),
        }
    }
}

/// `name[:version]` → (name, version).
fn split_gem(dep: &str) -> (&str, Option<&str>) {
    match dep.split_once(':') {
        Some((name, version)) if !version.is_empty() => (name, Some(version)),
        Some((name, _)) => (name, None),
        None => (dep, None),
    }
}

fn gem_line(name: &str, version: Option<&str>) -> String {
    match version {
        Some(version) => format!("gem '{name}', '{version}'"),
        None => format!("gem '{name}'"),
    }
}

/// Append `gem` declarations for gems the Gemfile does not mention.
pub fn add_gems(content: &str, dependencies: &[String]) -> String {
    let mut declared: HashSet<String> = declared_gems(content).into_iter().collect();
    let lines: Vec<String> = dependencies
        .iter()
        .map(|dep| split_gem(dep))
        .filter(|(name, _)| declared.insert(name.to_string()))
        .map(|(name, version)| gem_line(name, version))
        .collect();

    if lines.is_empty() {
        content.to_string()
    } else {
        append_lines(content, &lines)
    }
}

impl Installer for BundlerInstaller {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Bundler
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
        let gemfile = require_manifest(project, GEMFILE)?;
        if dry_run {
            return Ok(());
        }

        if let Some(tool) = self.tools.resolve(self.commander.as_ref()) {
            let bundle = ToolRunner::new(self.commander.as_ref(), ctx, project, tool);
            for dep in dependencies {
                let (name, version) = split_gem(dep);
                let mut args = vec!["add".to_string(), name.to_string()];
                if let Some(version) = version {
                    args.push("--version".to_string());
                    args.push(version.to_string());
                }
                bundle.run(&args, Some(dep.as_str()))?;
            }
            info!("Added {} gem(s) with bundler", dependencies.len());
            return Ok(());
        }

        let content = fs::read_to_string(&gemfile)?;
        let updated = add_gems(&content, dependencies);
        if write_atomic(&gemfile, &content, &updated)? {
            info!("Updated {}", gemfile.display());
        }
        Ok(())
    }
}
