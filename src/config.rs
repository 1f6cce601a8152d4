//! Project configuration.
//!
//! Settings are read from `.instrumentor.yml` at the project root. Every
//! field is optional; a missing file yields the defaults.
//!
//! ```yaml
//! knowledge: knowledge.json
//! tool_timeout: 300
//! guard_scope: requested
//! resolve_versions: true
//! projects:
//!   - path: services/api
//!     language: go
//!     install_core: true
//!   - path: web
//!     language: javascript
//!     install_instrumentations: [express]
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{InstrumentorError, Result};
use crate::matcher::GuardScope;
use crate::orchestrator::InstallJob;
use crate::plan::InstallPlan;

/// File name looked up in the project root.
pub const CONFIG_FILE: &str = ".instrumentor.yml";

/// A project configured for batch installs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEntry {
    /// Directory relative to the configuration's project root.
    pub path: PathBuf,
    #[serde(flatten)]
    pub plan: InstallPlan,
}

/// Settings from `.instrumentor.yml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Knowledge catalog JSON, relative to the project root.
    pub knowledge: Option<PathBuf>,
    /// Seconds allowed for the whole run of native tool calls.
    pub tool_timeout: Option<u64>,
    /// Set `unless` guards are evaluated against.
    pub guard_scope: GuardScope,
    /// Pin versions from the catalog when it carries version data.
    pub resolve_versions: bool,
    pub projects: Vec<ProjectEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            knowledge: None,
            tool_timeout: None,
            guard_scope: GuardScope::default(),
            resolve_versions: true,
            projects: Vec::new(),
        }
    }
}

impl Config {
    /// Load `.instrumentor.yml` from `project_root`, or defaults when absent.
    pub fn load(project_root: &Path) -> Result<Self> {
        let path = project_root.join(CONFIG_FILE);
        if !path.is_file() {
            debug!("No {} in {}, using defaults", CONFIG_FILE, project_root.display());
            return Ok(Self::default());
        }
        Self::from_path(&path)
    }

    /// Parse a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigParseError` if the YAML is invalid.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(path, &content)
    }

    fn parse(path: &Path, content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| InstrumentorError::ConfigParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Knowledge catalog path resolved against `project_root`.
    pub fn knowledge_path(&self, project_root: &Path) -> Option<PathBuf> {
        self.knowledge.as_ref().map(|p| project_root.join(p))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.tool_timeout.map(Duration::from_secs)
    }

    /// Configured projects as batch jobs rooted at `project_root`.
    pub fn jobs(&self, project_root: &Path) -> Vec<InstallJob> {
        self.projects
            .iter()
            .map(|entry| InstallJob::new(project_root.join(&entry.path), entry.plan.clone()))
            .collect()
    }
}
