//! Package knowledge consumed by the matcher.
//!
//! The [`KnowledgeProvider`] trait is the read-only view of the package
//! catalog: core packages per language, the package behind a named
//! component, prerequisite rules, and version data per component.
//! [`KnowledgeCatalog`] is the JSON-backed implementation.

pub mod catalog;
pub mod version;

pub use catalog::{KnowledgeCatalog, LanguagePackages};
pub use version::{best_version, Component, Version, VersionStatus};

use serde::{Deserialize, Serialize};

/// Implication over instrumentation names.
///
/// If any name in `if` is requested and no name in `unless` is, every name
/// in `requires` is added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrerequisiteRule {
    #[serde(rename = "if")]
    pub if_any: Vec<String>,
    pub unless: Vec<String>,
    pub requires: Vec<String>,
}

impl PrerequisiteRule {
    /// A rule with no `unless` guard.
    pub fn new<I, R>(if_any: I, requires: R) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            if_any: if_any.into_iter().map(Into::into).collect(),
            unless: Vec::new(),
            requires: requires.into_iter().map(Into::into).collect(),
        }
    }

    /// Add an `unless` guard.
    pub fn unless<U>(mut self, unless: U) -> Self
    where
        U: IntoIterator,
        U::Item: Into<String>,
    {
        self.unless = unless.into_iter().map(Into::into).collect();
        self
    }
}

/// Read-only package knowledge.
pub trait KnowledgeProvider: Send + Sync {
    /// Packages installed when a plan asks for the core SDK.
    fn core_packages(&self, language: &str) -> Vec<String>;

    /// Package implementing `name` of `component_type`, if known.
    fn component_package(&self, language: &str, component_type: &str, name: &str)
        -> Option<String>;

    /// Ordered prerequisite rules for a language.
    fn prerequisites(&self, language: &str) -> Vec<PrerequisiteRule>;

    /// Version data for a package, if the catalog tracks it.
    fn component_by_name(&self, _name: &str) -> Option<Component> {
        None
    }

    /// Whether this provider carries version data.
    fn has_version_catalog(&self) -> bool {
        false
    }
}
