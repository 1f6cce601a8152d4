//! Gemfile scanner.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::{read_manifest, Scanner};
use crate::error::Result;

pub const GEMFILE: &str = "Gemfile";

static GEM_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*gem\s+['"]([^'"]+)['"]"#).expect("valid gem regex"));

/// Lists gems declared with `gem '<name>'`.
#[derive(Debug, Default)]
pub struct GemfileScanner;

impl GemfileScanner {
    pub fn new() -> Self {
        Self
    }
}

/// Gem names declared in a Gemfile, skipping comments.
pub fn declared_gems(content: &str) -> Vec<String> {
    content
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .filter_map(|line| GEM_LINE.captures(line))
        .map(|caps| caps[1].to_string())
        .collect()
}

impl Scanner for GemfileScanner {
    fn detect(&self, project: &Path) -> bool {
        project.join(GEMFILE).is_file()
    }

    fn scan(&self, project: &Path) -> Result<Vec<String>> {
        Ok(declared_gems(&read_manifest(project, GEMFILE)?))
    }
}
