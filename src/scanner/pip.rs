//! requirements.txt scanner.

use std::path::Path;

use super::{read_manifest, Scanner};
use crate::error::Result;

pub const REQUIREMENTS_TXT: &str = "requirements.txt";

/// Version operators recognised in requirement lines, longest first.
pub const VERSION_OPERATORS: &[&str] = &["==", ">=", "<=", "~=", "!=", ">", "<"];

/// Lists requirement names.
#[derive(Debug, Default)]
pub struct PipScanner;

impl PipScanner {
    pub fn new() -> Self {
        Self
    }
}

/// Bare package name from a requirement line, if it declares one.
///
/// Blank lines, comments, and pip options yield `None`. Version
/// operators, extras, and environment markers are stripped.
pub fn requirement_name(line: &str) -> Option<&str> {
    let line = line.split('#').next().unwrap_or_default().trim();
    if line.is_empty() || line.starts_with('-') {
        return None;
    }
    let end = line
        .find(|c: char| matches!(c, '=' | '>' | '<' | '~' | '!' | '[' | ';' | ' ' | '\t' | '@'))
        .unwrap_or(line.len());
    let name = line[..end].trim();
    (!name.is_empty()).then_some(name)
}

impl Scanner for PipScanner {
    fn detect(&self, project: &Path) -> bool {
        project.join(REQUIREMENTS_TXT).is_file()
    }

    fn scan(&self, project: &Path) -> Result<Vec<String>> {
        let content = read_manifest(project, REQUIREMENTS_TXT)?;
        Ok(content
            .lines()
            .filter_map(requirement_name)
            .map(str::to_string)
            .collect())
    }
}
