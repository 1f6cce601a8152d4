//! Missing-package computation.
//!
//! A [`Matcher`] turns an [`InstallPlan`] plus the identifiers a project
//! already declares into the list of packages that still need installing.
//! Matching never fails: requests the knowledge provider cannot resolve are
//! dropped and logged at debug level.

pub mod identifier;
pub mod prerequisites;
pub mod versioned;

pub use identifier::{format_with_version, has_version_specifier, normalize};
pub use prerequisites::{expand, GuardScope};
pub use versioned::VersionedMatcher;

use std::collections::HashSet;

use tracing::debug;

use crate::knowledge::KnowledgeProvider;
use crate::plan::{InstallPlan, INSTRUMENTATION};

/// Computes missing packages for a plan.
pub trait Matcher: Send + Sync {
    /// Package identifiers required by `plan` and absent from `existing`.
    fn match_missing(
        &self,
        existing: &[String],
        plan: &InstallPlan,
        kb: &dyn KnowledgeProvider,
    ) -> Vec<String>;
}

/// Matcher driven by the plan and the provider's prerequisite rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanMatcher {
    guard_scope: GuardScope,
}

impl PlanMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose which set `unless` guards are checked against.
    pub fn with_guard_scope(mut self, scope: GuardScope) -> Self {
        self.guard_scope = scope;
        self
    }

    pub fn guard_scope(&self) -> GuardScope {
        self.guard_scope
    }
}

/// Insertion-ordered map from normalized identifier to original identifier.
#[derive(Default)]
struct Required {
    keys: HashSet<String>,
    entries: Vec<(String, String)>,
}

impl Required {
    fn add(&mut self, package: String) {
        let key = normalize(&package);
        if self.keys.insert(key.clone()) {
            self.entries.push((key, package));
        }
    }
}

impl Matcher for PlanMatcher {
    fn match_missing(
        &self,
        existing: &[String],
        plan: &InstallPlan,
        kb: &dyn KnowledgeProvider,
    ) -> Vec<String> {
        let language = plan.language.as_str();
        let existing: HashSet<String> = existing.iter().map(|e| normalize(e)).collect();
        let mut required = Required::default();

        if plan.install_core {
            for package in kb.core_packages(language) {
                required.add(package);
            }
        }

        let instrumentations = expand(
            &plan.instrumentation_names(),
            &kb.prerequisites(language),
            self.guard_scope,
        );
        for name in &instrumentations {
            match kb.component_package(language, INSTRUMENTATION, name) {
                Some(package) => required.add(package),
                None => debug!("No {} package for instrumentation '{}'", language, name),
            }
        }

        for (component_type, names) in &plan.install_components {
            if component_type == INSTRUMENTATION {
                continue;
            }
            for name in names {
                match kb.component_package(language, component_type, name) {
                    Some(package) => required.add(package),
                    None => debug!("No {} package for {} '{}'", language, component_type, name),
                }
            }
        }

        let missing: Vec<String> = required
            .entries
            .into_iter()
            .filter(|(key, _)| !existing.contains(key))
            .map(|(_, package)| package)
            .collect();
        debug!("{} package(s) missing for {}", missing.len(), language);
        missing
    }
}
