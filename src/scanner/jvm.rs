//! Maven and Gradle scanner.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use super::{read_manifest_path, Scanner};
use crate::error::Result;
use crate::xml;

pub const POM_XML: &str = "pom.xml";
pub const BUILD_GRADLE: &str = "build.gradle";
pub const BUILD_GRADLE_KTS: &str = "build.gradle.kts";

static GRADLE_DEPENDENCY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^\s*(?:implementation|api|compileOnly|runtimeOnly)\s*\(?\s*['"]([^'":\s]+):([^'":\s]+)(?::[^'"]*)?['"]"#,
    )
    .expect("valid gradle dependency regex")
});

/// The JVM build file a project uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildFile {
    Maven(PathBuf),
    Gradle(PathBuf),
}

impl BuildFile {
    /// Locate the build file, preferring `pom.xml`.
    pub fn locate(project: &Path) -> Option<Self> {
        let pom = project.join(POM_XML);
        if pom.is_file() {
            return Some(Self::Maven(pom));
        }
        [BUILD_GRADLE, BUILD_GRADLE_KTS]
            .iter()
            .map(|name| project.join(name))
            .find(|path| path.is_file())
            .map(Self::Gradle)
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Maven(path) | Self::Gradle(path) => path,
        }
    }
}

/// Lists `group:artifact` coordinates of top-level dependencies.
#[derive(Debug, Default)]
pub struct JvmScanner;

impl JvmScanner {
    pub fn new() -> Self {
        Self
    }
}

/// Coordinates declared in a POM's top-level `<dependencies>`.
pub fn pom_coordinates(content: &str) -> Vec<String> {
    xml::elements(content, &["project", "dependencies", "dependency"])
        .into_iter()
        .filter_map(|dep| {
            let inner = &content[dep.inner()];
            let group = xml::child_text(inner, "groupId")?;
            let artifact = xml::child_text(inner, "artifactId")?;
            (!group.is_empty() && !artifact.is_empty()).then(|| format!("{group}:{artifact}"))
        })
        .collect()
}

/// Coordinates declared in a Gradle build script.
pub fn gradle_coordinates(content: &str) -> Vec<String> {
    GRADLE_DEPENDENCY
        .captures_iter(content)
        .map(|caps| format!("{}:{}", &caps[1], &caps[2]))
        .collect()
}

impl Scanner for JvmScanner {
    fn detect(&self, project: &Path) -> bool {
        BuildFile::locate(project).is_some()
    }

    fn scan(&self, project: &Path) -> Result<Vec<String>> {
        match BuildFile::locate(project) {
            Some(BuildFile::Maven(path)) => Ok(pom_coordinates(&read_manifest_path(&path)?)),
            Some(BuildFile::Gradle(path)) => Ok(gradle_coordinates(&read_manifest_path(&path)?)),
            None => Ok(Vec::new()),
        }
    }
}
