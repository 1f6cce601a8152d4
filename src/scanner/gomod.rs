//! go.mod scanner.

use std::path::Path;

use super::{read_manifest, Scanner};
use crate::error::Result;

pub const GO_MOD: &str = "go.mod";

/// Lists modules from `require` directives.
#[derive(Debug, Default)]
pub struct GoModScanner;

impl GoModScanner {
    pub fn new() -> Self {
        Self
    }
}

/// Module paths required by a go.mod file, single-line and block form.
pub fn required_modules(content: &str) -> Vec<String> {
    let mut modules = Vec::new();
    let mut in_block = false;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("//") || trimmed.is_empty() {
            continue;
        }
        if in_block {
            if trimmed.starts_with(')') {
                in_block = false;
                continue;
            }
            if let Some(module) = trimmed.split_whitespace().next() {
                modules.push(module.to_string());
            }
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("require") {
            let rest = rest.trim_start();
            if rest.starts_with('(') {
                in_block = true;
            } else if let Some(module) = rest.split_whitespace().next() {
                modules.push(module.to_string());
            }
        }
    }

    modules
}

impl Scanner for GoModScanner {
    fn detect(&self, project: &Path) -> bool {
        project.join(GO_MOD).is_file()
    }

    fn scan(&self, project: &Path) -> Result<Vec<String>> {
        Ok(required_modules(&read_manifest(project, GO_MOD)?))
    }
}
