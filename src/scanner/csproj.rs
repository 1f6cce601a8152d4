//! .csproj scanner.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::{find_by_extension, read_manifest_path, Scanner};
use crate::error::Result;

pub const CSPROJ_EXTENSION: &str = "csproj";

static PACKAGE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<PackageReference\s+Include="([^"]+)""#).expect("valid package reference regex")
});

/// Lists `PackageReference` includes from the first project file.
#[derive(Debug, Default)]
pub struct CsprojScanner;

impl CsprojScanner {
    pub fn new() -> Self {
        Self
    }
}

/// Package names referenced by a project file.
pub fn package_references(content: &str) -> Vec<String> {
    PACKAGE_REFERENCE
        .captures_iter(content)
        .map(|caps| caps[1].to_string())
        .collect()
}

impl Scanner for CsprojScanner {
    fn detect(&self, project: &Path) -> bool {
        find_by_extension(project, CSPROJ_EXTENSION).is_some()
    }

    fn scan(&self, project: &Path) -> Result<Vec<String>> {
        match find_by_extension(project, CSPROJ_EXTENSION) {
            Some(path) => Ok(package_references(&read_manifest_path(&path)?)),
            None => Ok(Vec::new()),
        }
    }
}
