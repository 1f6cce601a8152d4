//! Maven and Gradle installer.
//!
//! JVM build files are always edited directly. For Maven projects with `mvn`
//! available, artifacts are prefetched into the local repository first; a
//! failed prefetch only logs a warning, since the POM edit is what records
//! the dependency.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use super::{gradle, pom, write_atomic, Installer, ToolChain, ToolRunner};
use crate::commander::{Commander, RunContext};
use crate::error::{InstrumentorError, Result};
use crate::registry::Ecosystem;
use crate::scanner::jvm::{BuildFile, BUILD_GRADLE, POM_XML};

pub struct JvmInstaller {
    commander: Arc<dyn Commander>,
    tools: ToolChain,
}

impl JvmInstaller {
    pub fn new(commander: Arc<dyn Commander>) -> Self {
        Self {
            commander,
            tools: ToolChain::single("mvn"),
        }
    }

    fn prefetch(&self, ctx: &RunContext, project: &Path, coordinates: &[String]) -> Result<()> {
        let Some(tool) = self.tools.resolve(self.commander.as_ref()) else {
            return Ok(());
        };
        let mvn = ToolRunner::new(self.commander.as_ref(), ctx, project, tool);
        for coordinate in coordinates {
            let args = ["dependency:get".to_string(), format!("-Dartifact={coordinate}")];
            match mvn.run(&args, Some(coordinate.as_str())) {
                Ok(_) => {}
                Err(e @ InstrumentorError::Cancelled { .. }) => return Err(e),
                Err(e) => warn!("Prefetch failed, continuing with pom edit: {}", e),
            }
        }
        Ok(())
    }
}

/// Give every coordinate a version, using `LATEST` when none is set.
pub fn resolve_coordinates(dependencies: &[String]) -> Result<Vec<String>> {
    dependencies
        .iter()
        .map(|dep| {
            let parts: Vec<&str> = dep.split(':').collect();
            if parts.iter().any(|part| part.is_empty()) {
                return Err(invalid(dep));
            }
            match parts.len() {
                2 => Ok(format!("{dep}:{}", pom::LATEST)),
                n if n >= 3 => Ok(dep.clone()),
                _ => Err(invalid(dep)),
            }
        })
        .collect()
}

fn invalid(dep: &str) -> InstrumentorError {
    InstrumentorError::InvalidDependency {
        dependency: dep.to_string(),
        message: "expected Maven coordinate group:artifact[:version]".to_string(),
    }
}

impl Installer for JvmInstaller {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Jvm
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
        let build = BuildFile::locate(project).ok_or_else(|| InstrumentorError::ManifestNotFound {
            manifest: format!("{POM_XML} or {BUILD_GRADLE}"),
            dir: project.to_path_buf(),
        })?;
        let coordinates = resolve_coordinates(dependencies)?;
        if dry_run {
            return Ok(());
        }

        let path = build.path();
        let content = fs::read_to_string(path)?;
        let updated = match &build {
            BuildFile::Maven(_) => {
                self.prefetch(ctx, project, &coordinates)?;
                pom::add_dependencies(path, &content, &coordinates)?
            }
            BuildFile::Gradle(_) => gradle::add_dependencies(path, &content, &coordinates)?,
        };
        if write_atomic(path, &content, &updated)? {
            info!("Added {} dependencies to {}", coordinates.len(), path.display());
        }
        Ok(())
    }
}
