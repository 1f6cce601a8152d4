//! Install plans and dependency descriptions.
//!
//! An [`InstallPlan`] captures what a run intends to ensure is present for
//! one language. The matcher turns it into concrete package identifiers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Component type whose names participate in prerequisite expansion.
pub const INSTRUMENTATION: &str = "instrumentation";

/// A normalized description of a package requirement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dependency {
    /// Package name.
    pub name: String,

    /// Version constraint (empty when unversioned).
    pub version: String,

    /// Language this dependency belongs to.
    pub language: String,

    /// Ecosystem-native identifier used for lookups and manifest writes.
    pub import_path: String,

    /// Free-form category (core, instrumentation, exporter, ...).
    pub category: String,

    /// Human readable description.
    pub description: String,

    /// Whether the dependency must be present.
    pub required: bool,
}

impl Dependency {
    /// Create a dependency with a name and language.
    pub fn new(name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: language.into(),
            ..Self::default()
        }
    }

    /// Set the version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the import path.
    pub fn with_import_path(mut self, import_path: impl Into<String>) -> Self {
        self.import_path = import_path.into();
        self
    }

    /// The ecosystem-native identifier, with the version appended when set.
    pub fn identifier(&self) -> String {
        let base = if self.import_path.is_empty() {
            &self.name
        } else {
            &self.import_path
        };
        if self.version.is_empty() {
            base.clone()
        } else {
            crate::matcher::format_with_version(base, &self.version, &self.language)
        }
    }
}

/// What a run intends to install for one language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallPlan {
    pub language: String,
    pub install_core: bool,
    pub install_instrumentations: Vec<String>,
    /// Component type → component names.
    pub install_components: BTreeMap<String, Vec<String>>,
}

impl InstallPlan {
    /// An empty plan for `language`.
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            ..Self::default()
        }
    }

    pub fn with_core(mut self) -> Self {
        self.install_core = true;
        self
    }

    pub fn with_instrumentations<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.install_instrumentations
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_component(mut self, component_type: &str, name: &str) -> Self {
        self.install_components
            .entry(component_type.to_string())
            .or_default()
            .push(name.to_string());
        self
    }

    /// Whether the plan requests nothing.
    pub fn is_empty(&self) -> bool {
        !self.install_core
            && self.install_instrumentations.is_empty()
            && self.install_components.values().all(Vec::is_empty)
    }

    /// Requested instrumentation names, from both the dedicated list and the
    /// `instrumentation` component type, in request order without repeats.
    pub fn instrumentation_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let from_components = self
            .install_components
            .get(INSTRUMENTATION)
            .into_iter()
            .flatten();
        for name in self.install_instrumentations.iter().chain(from_components) {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }
}
