//! .NET installer.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::{insert_block, write_atomic, Installer, ToolChain, ToolRunner};
use crate::commander::{Commander, RunContext};
use crate::error::{InstrumentorError, Result};
use crate::registry::Ecosystem;
use crate::scanner::csproj::{package_references, CSPROJ_EXTENSION};
use crate::scanner::find_by_extension;

/// Version attribute written when a package has none.
pub const ANY_VERSION: &str = "*";

/// Adds packages with `dotnet add package`, or inserts `PackageReference`
/// items into the project file when the SDK is missing.
pub struct DotNetInstaller {
    commander: Arc<dyn Commander>,
    tools: ToolChain,
}

impl DotNetInstaller {
    pub fn new(commander: Arc<dyn Commander>) -> Self {
        Self {
            commander,
            tools: ToolChain::single("dotnet"),
        }
    }
}

/// `Name[@version]` → (name, version).
fn split_package(dep: &str) -> (&str, Option<&str>) {
    match dep.split_once('@') {
        Some((name, version)) if !version.is_empty() => (name, Some(version)),
        Some((name, _)) => (name, None),
        None => (dep, None),
    }
}

/// Insert an `ItemGroup` with references the project file lacks.
///
/// Existing includes are compared case-insensitively. The group goes right
/// before the closing `</Project>` tag.
pub fn add_package_references(path: &Path, content: &str, dependencies: &[String]) -> Result<String> {
    let mut referenced: HashSet<String> = package_references(content)
        .into_iter()
        .map(|name| name.to_lowercase())
        .collect();

    let items: Vec<String> = dependencies
        .iter()
        .map(|dep| split_package(dep))
        .filter(|(name, _)| referenced.insert(name.to_lowercase()))
        .map(|(name, version)| {
            format!(
                "    <PackageReference Include=\"{name}\" Version=\"{}\" />\n",
                version.unwrap_or(ANY_VERSION)
            )
        })
        .collect();
    if items.is_empty() {
        return Ok(content.to_string());
    }

    let close = content
        .to_ascii_lowercase()
        .rfind("</project>")
        .ok_or_else(|| InstrumentorError::MalformedManifest {
            path: path.to_path_buf(),
            message: "missing </Project> closing tag".to_string(),
        })?;

    let block = format!("  <ItemGroup>\n{}  </ItemGroup>\n", items.concat());
    Ok(insert_block(content, close, &block))
}

impl Installer for DotNetInstaller {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::DotNet
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
        let csproj = find_by_extension(project, CSPROJ_EXTENSION).ok_or_else(|| {
            InstrumentorError::ManifestNotFound {
                manifest: format!("*.{CSPROJ_EXTENSION}"),
                dir: project.to_path_buf(),
            }
        })?;
        if dry_run {
            return Ok(());
        }

        if let Some(tool) = self.tools.resolve(self.commander.as_ref()) {
            let dotnet = ToolRunner::new(self.commander.as_ref(), ctx, project, tool);
            let project_file = csproj.to_string_lossy().into_owned();
            for dep in dependencies {
                let (name, version) = split_package(dep);
                let mut args = vec![
                    "add".to_string(),
                    project_file.clone(),
                    "package".to_string(),
                    name.to_string(),
                ];
                if let Some(version) = version {
                    args.push("--version".to_string());
                    args.push(version.to_string());
                }
                dotnet.run(&args, Some(dep.as_str()))?;
            }
            info!("Added {} package(s) with dotnet", dependencies.len());
            return Ok(());
        }

        let content = fs::read_to_string(&csproj)?;
        let updated = add_package_references(&csproj, &content, dependencies)?;
        if write_atomic(&csproj, &content, &updated)? {
            info!("Updated {}", csproj.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commander::MockCommander;
    use tempfile::TempDir;

    const CSPROJ: &str = r#"<Project Sdk="Microsoft.NET.Sdk">
  <PropertyGroup>
    <TargetFramework>net8.0</TargetFramework>
  </PropertyGroup>
  <ItemGroup>
    <PackageReference Include="Serilog" Version="3.1.1" />
  </ItemGroup>
</Project>
"#;

    fn deps(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn inserts_item_group_before_project_close() {
        let out = add_package_references(
            Path::new("App.csproj"),
            CSPROJ,
            &deps(&["serilog", "OpenTelemetry@1.9.0", "OpenTelemetry.Extensions.Hosting"]),
        )
        .unwrap();

        assert!(out.ends_with(
            "  <ItemGroup>\n    <PackageReference Include=\"OpenTelemetry\" Version=\"1.9.0\" />\n    <PackageReference Include=\"OpenTelemetry.Extensions.Hosting\" Version=\"*\" />\n  </ItemGroup>\n</Project>\n"
        ));
        assert_eq!(out.matches("Serilog").count(), 1);
        assert!(out.starts_with(CSPROJ.trim_end_matches("</Project>\n")));
    }

    #[test]
    fn nothing_new_leaves_content_alone() {
        let out = add_package_references(Path::new("App.csproj"), CSPROJ, &deps(&["SERILOG"])).unwrap();
        assert_eq!(out, CSPROJ);
    }

    #[test]
    fn missing_project_close_is_malformed() {
        let err = add_package_references(
            Path::new("App.csproj"),
            "<Project Sdk=\"Microsoft.NET.Sdk\">",
            &deps(&["OpenTelemetry"]),
        )
        .unwrap_err();
        assert!(matches!(err, InstrumentorError::MalformedManifest { .. }));
    }

    #[test]
    fn dotnet_add_package_per_dependency() {
        let temp = TempDir::new().unwrap();
        let csproj = temp.path().join("App.csproj");
        fs::write(&csproj, CSPROJ).unwrap();
        let mock = Arc::new(MockCommander::new().with_tool("dotnet"));

        DotNetInstaller::new(mock.clone())
            .install(
                &RunContext::new(),
                temp.path(),
                &deps(&["OpenTelemetry@1.9.0", "OpenTelemetry.Exporter.Console"]),
                false,
            )
            .unwrap();

        let calls = mock.calls();
        assert_eq!(calls.len(), 2);
        let expected: Vec<String> = vec![
            "add".into(),
            csproj.to_string_lossy().into_owned(),
            "package".into(),
            "OpenTelemetry".into(),
            "--version".into(),
            "1.9.0".into(),
        ];
        assert_eq!(calls[0].args, expected);
        assert_eq!(calls[1].args[3], "OpenTelemetry.Exporter.Console");
        assert_eq!(calls[1].args.len(), 4);
    }

    #[test]
    fn missing_project_file_is_reported() {
        let temp = TempDir::new().unwrap();
        let err = DotNetInstaller::new(Arc::new(MockCommander::new()))
            .install(&RunContext::new(), temp.path(), &deps(&["OpenTelemetry"]), true)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("*.csproj not found in {}", temp.path().display())
        );
    }
}
