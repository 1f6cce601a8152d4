//! Composer installer.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::json::merge_section;
use super::{require_manifest, write_atomic, Installer, ToolChain, ToolRunner};
use crate::commander::{Commander, RunContext};
use crate::error::Result;
use crate::registry::Ecosystem;
use crate::scanner::composer::COMPOSER_JSON;

/// Constraint written when a package has no version.
pub const ANY_VERSION: &str = "*";

/// Installs packages with one `composer require`, or merges them into
/// composer.json when composer is missing.
pub struct ComposerInstaller {
    commander: Arc<dyn Commander>,
    tools: ToolChain,
}

impl ComposerInstaller {
    pub fn new(commander: Arc<dyn Commander>) -> Self {
        Self {
            commander,
            tools: ToolChain::single("composer"),
        }
    }
}

/// `vendor/package[:constraint]` → (name, constraint).
fn split_requirement(dep: &str) -> (String, String) {
    match dep.split_once(':') {
        Some((name, version)) if !version.is_empty() => (name.to_string(), version.to_string()),
        Some((name, _)) => (name.to_string(), ANY_VERSION.to_string()),
        None => (dep.to_string(), ANY_VERSION.to_string()),
    }
}

impl Installer for ComposerInstaller {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Composer
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
        let composer_json = require_manifest(project, COMPOSER_JSON)?;
        if dry_run {
            return Ok(());
        }

        if let Some(tool) = self.tools.resolve(self.commander.as_ref()) {
            let composer = ToolRunner::new(self.commander.as_ref(), ctx, project, tool);
            let mut args = vec!["require".to_string()];
            args.extend(dependencies.iter().cloned());
            args.push("--no-interaction".to_string());
            composer.run(&args, None)?;
            info!("Installed {} package(s) with composer", dependencies.len());
            return Ok(());
        }

        let entries: Vec<(String, String)> =
            dependencies.iter().map(|d| split_requirement(d)).collect();
        let content = fs::read_to_string(&composer_json)?;
        if let Some(updated) = merge_section(&composer_json, &content, "require", &entries, b"    ")? {
            write_atomic(&composer_json, &content, &updated)?;
            info!("Updated {}", composer_json.display());
        }
        Ok(())
    }
}
