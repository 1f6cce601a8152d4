//! Version-aware matching.

use tracing::debug;

use super::{format_with_version, has_version_specifier, Matcher, PlanMatcher};
use crate::knowledge::{best_version, KnowledgeProvider};
use crate::plan::InstallPlan;

/// Matcher that pins each missing package to its best catalog version.
///
/// Identifiers that already carry a version pass through unchanged, as do
/// packages the catalog does not track. Tracked packages with no
/// installable version are excluded.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionedMatcher {
    base: PlanMatcher,
}

impl VersionedMatcher {
    pub fn new(base: PlanMatcher) -> Self {
        Self { base }
    }

    fn resolve(&self, package: String, language: &str, kb: &dyn KnowledgeProvider) -> Option<String> {
        if has_version_specifier(&package) {
            return Some(package);
        }

        let Some(component) = kb.component_by_name(&package) else {
            return Some(package);
        };

        if !component.language.eq_ignore_ascii_case(language) {
            if component.only_unknown_versions() {
                debug!("Skipping {}: no installable version", package);
                return None;
            }
            return Some(package);
        }

        match best_version(&component) {
            Some(version) => Some(format_with_version(&package, &version.name, language)),
            None => {
                debug!("Skipping {}: no installable version", package);
                None
            }
        }
    }
}

impl Matcher for VersionedMatcher {
    fn match_missing(
        &self,
        existing: &[String],
        plan: &InstallPlan,
        kb: &dyn KnowledgeProvider,
    ) -> Vec<String> {
        self.base
            .match_missing(existing, plan, kb)
            .into_iter()
            .filter_map(|package| self.resolve(package, &plan.language, kb))
            .collect()
    }
}
