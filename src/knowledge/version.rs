//! Component version data and best-version selection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version name the catalog uses when a package manager has no release.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Release status of a version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionStatus {
    Latest,
    #[default]
    Stable,
    Beta,
    Alpha,
    Deprecated,
}

/// One released version of a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub name: String,
    #[serde(default)]
    pub status: VersionStatus,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub release_date: Option<DateTime<Utc>>,
}

impl Version {
    pub fn new(name: impl Into<String>, status: VersionStatus) -> Self {
        Self {
            name: name.into(),
            status,
            deprecated: status == VersionStatus::Deprecated,
            release_date: None,
        }
    }

    pub fn released(mut self, date: DateTime<Utc>) -> Self {
        self.release_date = Some(date);
        self
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated || self.status == VersionStatus::Deprecated
    }

    pub fn is_unknown(&self) -> bool {
        self.name == UNKNOWN_VERSION
    }
}

/// A cataloged package with its versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub language: String,
    #[serde(default, rename = "type")]
    pub component_type: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub versions: Vec<Version>,
}

impl Component {
    pub fn new(name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: language.into(),
            component_type: String::new(),
            category: String::new(),
            versions: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.versions.push(version);
        self
    }

    /// True when the component lists versions but none of them is real.
    pub fn only_unknown_versions(&self) -> bool {
        !self.versions.is_empty() && self.versions.iter().all(Version::is_unknown)
    }
}

/// Pick the version to install for a component.
///
/// The first non-deprecated `latest` version wins. Otherwise the most recent
/// non-deprecated release that is neither alpha nor beta is chosen. On equal
/// or missing dates the earlier catalog entry is kept.
pub fn best_version(component: &Component) -> Option<&Version> {
    if let Some(latest) = component
        .versions
        .iter()
        .find(|v| v.status == VersionStatus::Latest && !v.is_deprecated() && !v.is_unknown())
    {
        return Some(latest);
    }

    component
        .versions
        .iter()
        .filter(|v| !v.is_deprecated() && !v.is_unknown())
        .filter(|v| !matches!(v.status, VersionStatus::Alpha | VersionStatus::Beta))
        .reduce(|best, v| if v.release_date > best.release_date { v } else { best })
}
