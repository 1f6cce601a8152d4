//! Go modules installer.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::info;

use super::{require_manifest, write_atomic, Installer, ToolChain, ToolRunner};
use crate::commander::{Commander, RunContext};
use crate::error::{InstrumentorError, Result};
use crate::registry::Ecosystem;
use crate::scanner::gomod::{required_modules, GO_MOD};

/// Version used when `go list` cannot resolve one.
pub const LATEST: &str = "latest";

static PATH_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v\d+\.\d+\.\d+$").expect("valid path version regex"));

static LIST_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""Version":\s*"([^"]+)""#).expect("valid go list regex"));

/// Installs modules with `go get`, or edits go.mod when `go` is missing.
pub struct GoInstaller {
    commander: Arc<dyn Commander>,
    tools: ToolChain,
}

impl GoInstaller {
    pub fn new(commander: Arc<dyn Commander>) -> Self {
        Self {
            commander,
            tools: ToolChain::single("go"),
        }
    }

    fn resolve_version(&self, runner: Option<&ToolRunner<'_>>, dep: &str) -> String {
        if dep.contains('@') || path_encoded_version(dep).is_some() {
            return dep.to_string();
        }
        let version = runner
            .and_then(|go| {
                go.query(&[
                    "list".to_string(),
                    "-m".to_string(),
                    "-json".to_string(),
                    format!("{dep}@latest"),
                ])
            })
            .and_then(|out| LIST_VERSION.captures(&out).map(|caps| caps[1].to_string()))
            .unwrap_or_else(|| LATEST.to_string());
        format!("{dep}@{version}")
    }
}

/// The version encoded in a module path's last segment (`.../v1.34.0`).
pub fn path_encoded_version(module: &str) -> Option<&str> {
    let segment = module.rsplit('/').next().unwrap_or(module);
    PATH_VERSION.is_match(segment).then_some(segment)
}

/// Split a resolved dependency into module path and version.
fn module_and_version(dep: &str) -> Result<(&str, &str)> {
    if !dep.contains('@') {
        if let Some(version) = path_encoded_version(dep) {
            return Ok((dep, version));
        }
    }
    let mut parts = dep.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(module), Some(version), None) if !module.is_empty() => {
            let version = match path_encoded_version(module) {
                Some(encoded) if version == LATEST => encoded,
                _ => version,
            };
            Ok((module, version))
        }
        _ => Err(InstrumentorError::InvalidDependency {
            dependency: dep.to_string(),
            message: "expected module@version".to_string(),
        }),
    }
}

/// Add `require` lines for modules go.mod does not already require.
pub fn add_requirements(content: &str, dependencies: &[String]) -> Result<String> {
    let mut known: HashSet<String> = required_modules(content).into_iter().collect();
    let mut lines = Vec::new();
    for dep in dependencies {
        let (module, version) = module_and_version(dep)?;
        if known.insert(module.to_string()) {
            lines.push(format!("\t{module} {version}\n"));
        }
    }
    if lines.is_empty() {
        return Ok(content.to_string());
    }

    if let Some(close) = require_block_close(content) {
        let mut out = String::with_capacity(content.len() + lines.concat().len());
        out.push_str(&content[..close]);
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&lines.concat());
        out.push_str(&content[close..]);
        return Ok(out);
    }

    let mut out = content.to_string();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("\nrequire (\n");
    out.push_str(&lines.concat());
    out.push_str(")\n");
    Ok(out)
}

/// Offset of the line holding the first `require (` block's closing paren.
fn require_block_close(content: &str) -> Option<usize> {
    let mut offset = 0;
    let mut in_block = false;
    for line in content.split_inclusive('\n') {
        let trimmed = line.trim();
        if in_block && trimmed.starts_with(')') {
            return Some(offset);
        }
        if !in_block {
            if let Some(rest) = trimmed.strip_prefix("require") {
                in_block = rest.trim_start().starts_with('(');
            }
        }
        offset += line.len();
    }
    None
}

impl Installer for GoInstaller {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Go
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
        let go_mod = require_manifest(project, GO_MOD)?;
        if dry_run {
            return Ok(());
        }

        let runner = self
            .tools
            .resolve(self.commander.as_ref())
            .map(|tool| ToolRunner::new(self.commander.as_ref(), ctx, project, tool));

        let resolved: Vec<String> = dependencies
            .iter()
            .map(|dep| self.resolve_version(runner.as_ref(), dep))
            .collect();

        if let Some(go) = &runner {
            for dep in &resolved {
                go.run(&["get".to_string(), dep.clone()], Some(dep.as_str()))?;
            }
            info!("Installed {} module(s) with go get", resolved.len());
            return Ok(());
        }

        let content = fs::read_to_string(&go_mod)?;
        let updated = add_requirements(&content, &resolved)?;
        if write_atomic(&go_mod, &content, &updated)? {
            info!("Added {} requirement(s) to {}", resolved.len(), go_mod.display());
        }
        Ok(())
    }
}
