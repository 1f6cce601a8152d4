//! composer.json scanner.

use std::path::Path;

use super::{json_object_keys, read_manifest, Scanner};
use crate::error::Result;

pub const COMPOSER_JSON: &str = "composer.json";

/// Lists `require` and `require-dev` packages, skipping platform entries.
#[derive(Debug, Default)]
pub struct ComposerScanner;

impl ComposerScanner {
    pub fn new() -> Self {
        Self
    }
}

fn is_platform_package(name: &str) -> bool {
    name == "php" || name.starts_with("ext-")
}

impl Scanner for ComposerScanner {
    fn detect(&self, project: &Path) -> bool {
        project.join(COMPOSER_JSON).is_file()
    }

    fn scan(&self, project: &Path) -> Result<Vec<String>> {
        let content = read_manifest(project, COMPOSER_JSON)?;
        let keys = json_object_keys(
            &project.join(COMPOSER_JSON),
            &content,
            &["require", "require-dev"],
        )?;
        Ok(keys.into_iter().filter(|k| !is_platform_package(k)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn skips_php_and_extensions() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(COMPOSER_JSON),
            r#"{"require":{"php":">=8.1","ext-json":"*","slim/slim":"^4.0"},"require-dev":{"phpunit/phpunit":"^10"}}"#,
        )
        .unwrap();

        let scanner = ComposerScanner::new();
        assert!(scanner.detect(temp.path()));
        assert_eq!(
            scanner.scan(temp.path()).unwrap(),
            vec!["slim/slim", "phpunit/phpunit"]
        );
    }
}
