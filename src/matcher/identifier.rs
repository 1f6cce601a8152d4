//! Package identifier helpers.

/// Separators that mark an identifier as already carrying a version.
const VERSION_SEPARATORS: &[&str] = &["@", "==", ">=", "<=", ">", "<", "~=", "!=", ":"];

/// Normalize an identifier for comparison: trimmed and lowercased.
pub fn normalize(identifier: &str) -> String {
    identifier.trim().to_lowercase()
}

/// Whether an identifier already pins a version.
///
/// A leading `@` of a scoped npm package does not count.
pub fn has_version_specifier(identifier: &str) -> bool {
    VERSION_SEPARATORS.iter().any(|sep| {
        if *sep == "@" && identifier.starts_with('@') {
            identifier.matches('@').count() > 1
        } else {
            identifier.contains(sep)
        }
    })
}

/// Attach `version` to `package` using the language's convention.
pub fn format_with_version(package: &str, version: &str, language: &str) -> String {
    match language.to_lowercase().as_str() {
        "python" => format!("{package}=={version}"),
        "java" | "php" | "ruby" => format!("{package}:{version}"),
        _ => format!("{package}@{version}"),
    }
}
