//! package.json scanner.

use std::path::Path;

use super::{json_object_keys, read_manifest, Scanner};
use crate::error::Result;

pub const PACKAGE_JSON: &str = "package.json";

/// Lists `dependencies` and `devDependencies` keys.
#[derive(Debug, Default)]
pub struct NpmScanner;

impl NpmScanner {
    pub fn new() -> Self {
        Self
    }
}

impl Scanner for NpmScanner {
    fn detect(&self, project: &Path) -> bool {
        project.join(PACKAGE_JSON).is_file()
    }

    fn scan(&self, project: &Path) -> Result<Vec<String>> {
        let content = read_manifest(project, PACKAGE_JSON)?;
        json_object_keys(
            &project.join(PACKAGE_JSON),
            &content,
            &["dependencies", "devDependencies"],
        )
    }
}
