//! Declared-dependency scanners.
//!
//! Each ecosystem has a [`Scanner`] that recognises a project by its
//! manifest and lists the identifiers it already declares. The orchestrator
//! feeds those identifiers to the matcher.

pub mod composer;
pub mod csproj;
pub mod gemfile;
pub mod gomod;
pub mod jvm;
pub mod npm;
pub mod pip;

pub use composer::ComposerScanner;
pub use csproj::CsprojScanner;
pub use gemfile::GemfileScanner;
pub use gomod::GoModScanner;
pub use jvm::JvmScanner;
pub use npm::NpmScanner;
pub use pip::PipScanner;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{InstrumentorError, Result};

/// Detects a project's ecosystem and lists its declared dependencies.
pub trait Scanner: Send + Sync {
    /// Whether the project at `project` is managed by this ecosystem.
    fn detect(&self, project: &Path) -> bool;

    /// Identifiers the project already declares.
    fn scan(&self, project: &Path) -> Result<Vec<String>>;
}

/// Read a manifest, mapping a missing file to `ManifestNotFound`.
pub(crate) fn read_manifest(dir: &Path, file_name: &str) -> Result<String> {
    read_manifest_path(&dir.join(file_name))
}

pub(crate) fn read_manifest_path(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            InstrumentorError::ManifestNotFound {
                manifest: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            }
        } else {
            InstrumentorError::Io(e)
        }
    })
}

/// First file in `dir` (sorted by name) with the given extension.
pub fn find_by_extension(dir: &Path, extension: &str) -> Option<PathBuf> {
    let mut matches: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| path.extension().is_some_and(|ext| ext == extension))
        .collect();
    matches.sort();
    matches.into_iter().next()
}

/// Keys of the named objects in a JSON manifest, in document order.
pub(crate) fn json_object_keys(path: &Path, content: &str, sections: &[&str]) -> Result<Vec<String>> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| InstrumentorError::MalformedManifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let mut keys = Vec::new();
    for section in sections {
        if let Some(object) = value.get(section).and_then(|v| v.as_object()) {
            keys.extend(object.keys().cloned());
        }
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn find_by_extension_is_deterministic() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b.csproj"), "").unwrap();
        fs::write(temp.path().join("a.csproj"), "").unwrap();
        fs::write(temp.path().join("readme.md"), "").unwrap();

        assert_eq!(
            find_by_extension(temp.path(), "csproj"),
            Some(temp.path().join("a.csproj"))
        );
        assert_eq!(find_by_extension(temp.path(), "fsproj"), None);
    }

    #[test]
    fn read_manifest_reports_not_found() {
        let temp = TempDir::new().unwrap();
        let err = read_manifest(temp.path(), "go.mod").unwrap_err();
        assert!(matches!(err, InstrumentorError::ManifestNotFound { ref manifest, .. } if manifest == "go.mod"));
    }

    #[test]
    fn json_keys_skip_missing_sections() {
        let keys = json_object_keys(
            Path::new("package.json"),
            r#"{"dependencies":{"b":"1","a":"2"},"scripts":{"x":"y"}}"#,
            &["dependencies", "devDependencies"],
        )
        .unwrap();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn json_keys_reject_invalid_json() {
        let err = json_object_keys(Path::new("composer.json"), "{", &["require"]).unwrap_err();
        assert!(matches!(err, InstrumentorError::MalformedManifest { .. }));
    }
}
