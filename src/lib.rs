//! Instrumentor - Resolve and install observability instrumentation.
//!
//! Given an install plan (a language plus the core SDK, instrumentations
//! and other components wanted), instrumentor scans a project's manifest,
//! works out which packages are missing using a knowledge catalog, and
//! installs them with the ecosystem's native tool. When the tool is not
//! on the PATH the manifest is edited directly.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`commander`] - External command execution with deadlines
//! - [`config`] - `.instrumentor.yml` loading
//! - [`error`] - Error types and result aliases
//! - [`installer`] - Per-ecosystem package installers
//! - [`knowledge`] - Package catalog and version selection
//! - [`matcher`] - Missing-package computation
//! - [`orchestrator`] - Scan, match and install pipeline
//! - [`plan`] - Install plans and dependency identifiers
//! - [`registry`] - Language to scanner/installer resolution
//! - [`scanner`] - Manifest scanners
//!
//! # Example
//!
//! ```
//! use instrumentor::knowledge::KnowledgeCatalog;
//! use instrumentor::matcher::{Matcher, PlanMatcher};
//! use instrumentor::plan::InstallPlan;
//!
//! let catalog = KnowledgeCatalog::new()
//!     .with_core("go", ["go.opentelemetry.io/otel", "go.opentelemetry.io/otel/sdk"]);
//! let plan = InstallPlan::new("go").with_core();
//! let existing = vec!["go.opentelemetry.io/otel".to_string()];
//!
//! let missing = PlanMatcher::new().match_missing(&existing, &plan, &catalog);
//! assert_eq!(missing, vec!["go.opentelemetry.io/otel/sdk"]);
//! ```

pub mod cli;
pub mod commander;
pub mod config;
pub mod error;
pub mod installer;
pub mod knowledge;
pub mod matcher;
pub mod orchestrator;
pub mod plan;
pub mod registry;
pub mod scanner;
pub mod xml;

pub use error::{InstrumentorError, Result};
