//! npm installer.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::json::merge_section;
use super::{require_manifest, write_atomic, Installer, ToolChain, ToolRunner};
use crate::commander::{Commander, RunContext};
use crate::error::{InstrumentorError, Result};
use crate::registry::Ecosystem;
use crate::scanner::npm::PACKAGE_JSON;

/// Version used when `npm view` cannot resolve one.
pub const LATEST: &str = "latest";

/// Installs packages with one batched `npm install`, or merges them into
/// package.json when npm is missing.
pub struct NpmInstaller {
    commander: Arc<dyn Commander>,
    tools: ToolChain,
}

/// Split `name@version`, honouring a leading scope `@`.
///
/// Returns `None` for the version when the identifier carries none.
pub fn split_package(dep: &str) -> (&str, Option<&str>) {
    match dep.rfind('@') {
        Some(idx) if idx > 0 => (&dep[..idx], Some(&dep[idx + 1..])),
        _ => (dep, None),
    }
}

impl NpmInstaller {
    pub fn new(commander: Arc<dyn Commander>) -> Self {
        Self {
            commander,
            tools: ToolChain::single("npm"),
        }
    }

    fn resolve_version(&self, runner: Option<&ToolRunner<'_>>, dep: &str) -> String {
        if let (_, Some(version)) = split_package(dep) {
            if !version.is_empty() {
                return dep.to_string();
            }
        }
        let (name, _) = split_package(dep);
        let version = runner
            .and_then(|npm| {
                npm.query(&[
                    "view".to_string(),
                    name.to_string(),
                    "version".to_string(),
                    "--json".to_string(),
                ])
            })
            .and_then(|out| parse_view_output(&out))
            .unwrap_or_else(|| LATEST.to_string());
        format!("{name}@{version}")
    }
}

/// The version printed by `npm view <pkg> version --json`.
fn parse_view_output(out: &str) -> Option<String> {
    let version = serde_json::from_str::<String>(out.trim())
        .unwrap_or_else(|_| out.trim().to_string());
    (!version.is_empty()).then_some(version)
}

/// Merge resolved packages into package.json `dependencies`.
pub fn add_to_package_json(path: &Path, content: &str, dependencies: &[String]) -> Result<Option<String>> {
    let mut entries = Vec::with_capacity(dependencies.len());
    for dep in dependencies {
        match split_package(dep) {
            (name, Some(version)) => entries.push((name.to_string(), version.to_string())),
            (_, None) => {
                return Err(InstrumentorError::InvalidDependency {
                    dependency: dep.clone(),
                    message: "expected name@version".to_string(),
                })
            }
        }
    }
    merge_section(path, content, "dependencies", &entries, b"  ")
}

impl Installer for NpmInstaller {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Npm
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
        let package_json = require_manifest(project, PACKAGE_JSON)?;
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

        if let Some(npm) = &runner {
            let mut args = vec!["install".to_string()];
            args.extend(resolved.iter().cloned());
            npm.run(&args, None)?;
            info!("Installed {} package(s) with npm", resolved.len());
            return Ok(());
        }

        let content = fs::read_to_string(&package_json)?;
        if let Some(updated) = add_to_package_json(&package_json, &content, &resolved)? {
            write_atomic(&package_json, &content, &updated)?;
            info!("Updated {}", package_json.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commander::MockCommander;
    use tempfile::TempDir;

    fn deps(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn project(package_json: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(PACKAGE_JSON), package_json).unwrap();
        temp
    }

    #[test]
    fn split_handles_scopes() {
        assert_eq!(split_package("@opentelemetry/api@1.9.0"), ("@opentelemetry/api", Some("1.9.0")));
        assert_eq!(split_package("@opentelemetry/api"), ("@opentelemetry/api", None));
        assert_eq!(split_package("express@4.19.2"), ("express", Some("4.19.2")));
        assert_eq!(split_package("express"), ("express", None));
    }

    #[test]
    fn batched_install_with_resolved_versions() {
        let temp = project(r#"{"name":"app"}"#);
        let mock = Arc::new(
            MockCommander::new()
                .with_tool("npm")
                .with_response("npm view @opentelemetry/api version --json", "\"1.9.0\"\n"),
        );

        NpmInstaller::new(mock.clone())
            .install(
                &RunContext::new(),
                temp.path(),
                &deps(&["@opentelemetry/api", "express@4.19.2"]),
                false,
            )
            .unwrap();

        assert_eq!(
            mock.command_lines(),
            vec![
                "npm view @opentelemetry/api version --json",
                "npm install @opentelemetry/api@1.9.0 express@4.19.2",
            ]
        );
    }

    #[test]
    fn install_failure_embeds_output() {
        let temp = project("{}");
        let mock = Arc::new(
            MockCommander::new()
                .with_tool("npm")
                .with_failure("npm install", "npm ERR! 404"),
        );
        let err = NpmInstaller::new(mock)
            .install(&RunContext::new(), temp.path(), &deps(&["x@1.0.0"]), false)
            .unwrap_err();
        assert!(err.to_string().contains("npm ERR! 404"));
    }

    #[test]
    fn edits_package_json_without_npm() {
        let temp = project("{\n  \"name\": \"app\",\n  \"dependencies\": {\n    \"express\": \"^4.19.2\"\n  }\n}\n");
        let installer = NpmInstaller::new(Arc::new(MockCommander::new()));

        installer
            .install(
                &RunContext::new(),
                temp.path(),
                &deps(&["@opentelemetry/api@1.9.0", "express", "@opentelemetry/sdk-node"]),
                false,
            )
            .unwrap();

        let content = fs::read_to_string(temp.path().join(PACKAGE_JSON)).unwrap();
        assert_eq!(
            content,
            "{\n  \"name\": \"app\",\n  \"dependencies\": {\n    \"express\": \"^4.19.2\",\n    \"@opentelemetry/api\": \"1.9.0\",\n    \"@opentelemetry/sdk-node\": \"latest\"\n  }\n}\n"
        );
    }

    #[test]
    fn second_edit_is_a_no_op() {
        let temp = project(r#"{"dependencies":{}}"#);
        let installer = NpmInstaller::new(Arc::new(MockCommander::new()));
        let list = deps(&["pino@9.0.0"]);

        installer.install(&RunContext::new(), temp.path(), &list, false).unwrap();
        let first = fs::read_to_string(temp.path().join(PACKAGE_JSON)).unwrap();
        installer.install(&RunContext::new(), temp.path(), &list, false).unwrap();
        let second = fs::read_to_string(temp.path().join(PACKAGE_JSON)).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.matches("pino").count(), 1);
    }

    #[test]
    fn view_output_parsing() {
        assert_eq!(parse_view_output("\"1.2.3\"\n"), Some("1.2.3".to_string()));
        assert_eq!(parse_view_output("1.2.3\n"), Some("1.2.3".to_string()));
        assert_eq!(parse_view_output("  "), None);
    }
}
