//! Gradle build script edits.

use std::collections::HashSet;
use std::path::Path;

use regex::Regex;

use super::insert_block;
use crate::error::Result;

/// Dynamic version Gradle resolves to the newest release.
pub const LATEST_RELEASE: &str = "latest.release";

const LATEST_SUFFIX: &str = ":LATEST";

/// Script dialect, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Groovy,
    Kotlin,
}

impl Dialect {
    pub fn for_path(path: &Path) -> Self {
        if path.extension().is_some_and(|ext| ext == "kts") {
            Self::Kotlin
        } else {
            Self::Groovy
        }
    }

    fn declaration(self, notation: &str) -> String {
        match self {
            Self::Groovy => format!("    implementation '{notation}'"),
            Self::Kotlin => format!("    implementation(\"{notation}\")"),
        }
    }
}

/// Gradle notation for a resolved Maven coordinate.
pub fn notation(dep: &str) -> String {
    match dep.strip_suffix(LATEST_SUFFIX) {
        Some(base) => format!("{base}:{LATEST_RELEASE}"),
        None => dep.to_string(),
    }
}

fn is_declared(block: &str, notation: &str) -> bool {
    let pattern = format!(r#"implementation\s*\(?\s*['"]{}['"]"#, regex::escape(notation));
    Regex::new(&pattern).is_ok_and(|re| re.is_match(block))
}

/// Add `implementation` declarations to the top-level `dependencies` block.
///
/// A declaration is skipped when the block already holds the same notation.
/// Without a top-level block, one is appended to the script.
pub fn add_dependencies(path: &Path, content: &str, dependencies: &[String]) -> Result<String> {
    let dialect = Dialect::for_path(path);
    let block = top_level_block(content, "dependencies");
    let existing = block.map(|(open, close)| &content[open..close]).unwrap_or("");

    let mut seen = HashSet::new();
    let lines: Vec<String> = dependencies
        .iter()
        .map(|dep| notation(dep))
        .filter(|n| !is_declared(existing, n) && seen.insert(n.clone()))
        .map(|n| dialect.declaration(&n))
        .collect();
    if lines.is_empty() {
        return Ok(content.to_string());
    }

    let body: String = lines.iter().map(|line| format!("{line}\n")).collect();
    if let Some((_, close)) = block {
        return Ok(insert_block(content, close, &body));
    }

    let mut out = content.to_string();
    if !out.is_empty() {
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
    }
    out.push_str("dependencies {\n");
    out.push_str(&body);
    out.push_str("}\n");
    Ok(out)
}

/// Offsets of the `{` and matching `}` of a block named `name` at brace
/// depth zero. Comments and string literals are skipped.
fn top_level_block(content: &str, name: &str) -> Option<(usize, usize)> {
    let bytes = content.as_bytes();
    let mut depth = 0usize;
    let mut open = None;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = content[i..].find('\n').map_or(bytes.len(), |n| i + n);
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = content[i + 2..].find("*/").map_or(bytes.len(), |n| i + 2 + n + 2);
                continue;
            }
            quote @ (b'\'' | b'"') => {
                i = skip_string(bytes, i, quote);
                continue;
            }
            b'{' => {
                if depth == 0 && open.is_none() && names_block(content, i, name) {
                    open = Some(i);
                }
                depth += 1;
            }
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    if let Some(start) = open {
                        return Some((start, i));
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn names_block(content: &str, brace: usize, name: &str) -> bool {
    content[..brace]
        .trim_end()
        .strip_suffix(name)
        .is_some_and(|rest| !rest.ends_with(|c: char| c.is_alphanumeric() || c == '_' || c == '.'))
}

/// Index just past the string literal starting at `start`.
///
/// Literals end at the matching quote or the end of the line.
fn skip_string(bytes: &[u8], start: usize, quote: u8) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return i + 1,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}
