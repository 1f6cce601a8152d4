//! JSON-backed knowledge catalog.
//!
//! ```json
//! {
//!   "languages": {
//!     "go": {
//!       "core": ["go.opentelemetry.io/otel"],
//!       "instrumentations": {"net/http": "go.opentelemetry.io/contrib/..."},
//!       "components": {"exporter": {"otlp": "go.opentelemetry.io/..."}},
//!       "prerequisites": [{"if": ["gin"], "requires": ["net/http"]}]
//!     }
//!   },
//!   "components": [
//!     {"name": "go.opentelemetry.io/otel", "language": "go",
//!      "versions": [{"name": "v1.24.0", "status": "latest"}]}
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Component, KnowledgeProvider, PrerequisiteRule};
use crate::error::{InstrumentorError, Result};
use crate::plan::INSTRUMENTATION;
use crate::registry::Ecosystem;

/// Packages known for one language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguagePackages {
    pub core: Vec<String>,
    /// Instrumentation name → package.
    pub instrumentations: BTreeMap<String, String>,
    /// Component type → component name → package.
    pub components: BTreeMap<String, BTreeMap<String, String>>,
    pub prerequisites: Vec<PrerequisiteRule>,
}

/// In-memory catalog, usually loaded from a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeCatalog {
    pub languages: BTreeMap<String, LanguagePackages>,
    pub components: Vec<Component>,
}

impl KnowledgeCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `KnowledgeLoad` if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| InstrumentorError::KnowledgeLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let catalog: Self =
            serde_json::from_str(&content).map_err(|e| InstrumentorError::KnowledgeLoad {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        debug!(
            "Loaded knowledge catalog from {} ({} languages, {} versioned components)",
            path.display(),
            catalog.languages.len(),
            catalog.components.len()
        );
        Ok(catalog)
    }

    pub fn with_core<I, S>(mut self, language: &str, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.language_mut(language)
            .core
            .extend(packages.into_iter().map(Into::into));
        self
    }

    pub fn with_instrumentation(mut self, language: &str, name: &str, package: &str) -> Self {
        self.language_mut(language)
            .instrumentations
            .insert(name.to_string(), package.to_string());
        self
    }

    pub fn with_component_package(
        mut self,
        language: &str,
        component_type: &str,
        name: &str,
        package: &str,
    ) -> Self {
        self.language_mut(language)
            .components
            .entry(component_type.to_string())
            .or_default()
            .insert(name.to_string(), package.to_string());
        self
    }

    pub fn with_rule(mut self, language: &str, rule: PrerequisiteRule) -> Self {
        self.language_mut(language).prerequisites.push(rule);
        self
    }

    pub fn with_component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    fn language_mut(&mut self, language: &str) -> &mut LanguagePackages {
        self.languages.entry(language.to_string()).or_default()
    }

    /// Entry for `language`: exact key, then case-insensitive, then any
    /// alias of the same ecosystem.
    fn language(&self, language: &str) -> Option<&LanguagePackages> {
        if let Some(packages) = self.languages.get(language) {
            return Some(packages);
        }
        if let Some((_, packages)) = self
            .languages
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(language))
        {
            return Some(packages);
        }
        let ecosystem = Ecosystem::from_language(language)?;
        self.languages
            .iter()
            .find(|(key, _)| Ecosystem::from_language(key) == Some(ecosystem))
            .map(|(_, packages)| packages)
    }
}

impl KnowledgeProvider for KnowledgeCatalog {
    fn core_packages(&self, language: &str) -> Vec<String> {
        self.language(language)
            .map(|l| l.core.clone())
            .unwrap_or_default()
    }

    fn component_package(
        &self,
        language: &str,
        component_type: &str,
        name: &str,
    ) -> Option<String> {
        let packages = self.language(language)?;
        if component_type == INSTRUMENTATION {
            if let Some(pkg) = packages.instrumentations.get(name) {
                return Some(pkg.clone());
            }
        }
        packages
            .components
            .get(component_type)
            .and_then(|by_name| by_name.get(name))
            .cloned()
    }

    fn prerequisites(&self, language: &str) -> Vec<PrerequisiteRule> {
        self.language(language)
            .map(|l| l.prerequisites.clone())
            .unwrap_or_default()
    }

    fn component_by_name(&self, name: &str) -> Option<Component> {
        self.components
            .iter()
            .find(|c| c.name == name)
            .or_else(|| {
                self.components
                    .iter()
                    .find(|c| c.name.eq_ignore_ascii_case(name))
            })
            .cloned()
    }

    fn has_version_catalog(&self) -> bool {
        !self.components.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::{Version, VersionStatus};
    use tempfile::TempDir;

    const CATALOG: &str = r#"{
        "languages": {
            "javascript": {
                "core": ["@opentelemetry/api", "@opentelemetry/sdk-node"],
                "instrumentations": {
                    "express": "@opentelemetry/instrumentation-express",
                    "http": "@opentelemetry/instrumentation-http"
                },
                "components": {
                    "exporter": {"otlp": "@opentelemetry/exporter-trace-otlp-http"}
                },
                "prerequisites": [{"if": ["express"], "requires": ["http"]}]
            }
        },
        "components": [
            {"name": "@opentelemetry/api", "language": "javascript",
             "versions": [{"name": "1.9.0", "status": "latest"}]}
        ]
    }"#;

    fn write_catalog(content: &str) -> (TempDir, std::path::PathBuf) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("knowledge.json");
        fs::write(&path, content).unwrap();
        (temp, path)
    }

    #[test]
    fn load_reads_languages_and_components() {
        let (_temp, path) = write_catalog(CATALOG);
        let catalog = KnowledgeCatalog::load(&path).unwrap();

        assert_eq!(
            catalog.core_packages("javascript"),
            vec!["@opentelemetry/api", "@opentelemetry/sdk-node"]
        );
        assert_eq!(catalog.prerequisites("javascript").len(), 1);
        assert!(catalog.has_version_catalog());
    }

    #[test]
    fn load_reports_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = KnowledgeCatalog::load(&temp.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, InstrumentorError::KnowledgeLoad { .. }));
    }

    #[test]
    fn load_reports_invalid_json() {
        let (_temp, path) = write_catalog("{ not json");
        let err = KnowledgeCatalog::load(&path).unwrap_err();
        assert!(err.to_string().contains("knowledge.json"));
    }

    #[test]
    fn instrumentation_lookup_checks_both_tables() {
        let catalog = KnowledgeCatalog::new()
            .with_instrumentation("python", "flask", "opentelemetry-instrumentation-flask")
            .with_component_package(
                "python",
                INSTRUMENTATION,
                "requests",
                "opentelemetry-instrumentation-requests",
            );

        assert_eq!(
            catalog.component_package("python", INSTRUMENTATION, "flask"),
            Some("opentelemetry-instrumentation-flask".into())
        );
        assert_eq!(
            catalog.component_package("python", INSTRUMENTATION, "requests"),
            Some("opentelemetry-instrumentation-requests".into())
        );
        assert_eq!(catalog.component_package("python", "exporter", "flask"), None);
    }

    #[test]
    fn unknown_language_yields_nothing() {
        let (_temp, path) = write_catalog(CATALOG);
        let catalog = KnowledgeCatalog::load(&path).unwrap();

        assert!(catalog.core_packages("cobol").is_empty());
        assert!(catalog.prerequisites("cobol").is_empty());
        assert_eq!(catalog.component_package("cobol", "exporter", "otlp"), None);
    }

    #[test]
    fn language_lookup_is_case_insensitive() {
        let catalog = KnowledgeCatalog::new().with_core("Go", ["go.opentelemetry.io/otel"]);
        assert_eq!(catalog.core_packages("go"), vec!["go.opentelemetry.io/otel"]);
    }

    #[test]
    fn language_aliases_share_entries() {
        let catalog = KnowledgeCatalog::new().with_core("javascript", ["@opentelemetry/api"]);
        assert_eq!(catalog.core_packages("ts"), vec!["@opentelemetry/api"]);
        assert!(catalog.core_packages("python").is_empty());
    }

    #[test]
    fn component_by_name_finds_versions() {
        let catalog = KnowledgeCatalog::new().with_component(
            Component::new("flask", "python").with_version(Version::new("3.0.0", VersionStatus::Latest)),
        );
        assert!(catalog.component_by_name("Flask").is_some());
        assert!(catalog.component_by_name("django").is_none());
        assert!(!KnowledgeCatalog::new().has_version_catalog());
    }
}
