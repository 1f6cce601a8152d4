//! Pipeline assembly shared by the commands.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cli::args::Selection;
use crate::commander::{RunContext, SystemCommander};
use crate::config::Config;
use crate::error::Result;
use crate::knowledge::{KnowledgeCatalog, KnowledgeProvider};
use crate::matcher::{GuardScope, Matcher, PlanMatcher, VersionedMatcher};
use crate::orchestrator::Orchestrator;
use crate::registry::Registry;

/// Load the catalog named by `--knowledge` or the config file.
///
/// With neither set the catalog is empty, so only identifiers passed
/// verbatim can be installed.
pub fn load_knowledge(
    project_root: &Path,
    config: &Config,
    selection: &Selection,
) -> Result<KnowledgeCatalog> {
    let path = selection
        .knowledge
        .clone()
        .or_else(|| config.knowledge_path(project_root));
    match path {
        Some(path) => KnowledgeCatalog::load(&path),
        None => {
            debug!("No knowledge catalog configured");
            Ok(KnowledgeCatalog::new())
        }
    }
}

/// Pick the matcher for this run.
pub fn matcher_for(
    guard_scope: GuardScope,
    resolve_versions: bool,
    knowledge: &dyn KnowledgeProvider,
) -> Box<dyn Matcher> {
    let base = PlanMatcher::new().with_guard_scope(guard_scope);
    if resolve_versions && knowledge.has_version_catalog() {
        Box::new(VersionedMatcher::new(base))
    } else {
        Box::new(base)
    }
}

/// Orchestrator over the system toolchain, configured from flags and config.
pub fn orchestrator(
    project_root: &Path,
    config: &Config,
    selection: &Selection,
) -> Result<Orchestrator> {
    let knowledge = load_knowledge(project_root, config, selection)?;
    let guard_scope = selection.guard_scope.unwrap_or(config.guard_scope);
    let resolve_versions = config.resolve_versions && !selection.no_versions;
    let matcher = matcher_for(guard_scope, resolve_versions, &knowledge);

    let registry = Registry::new(Arc::new(SystemCommander::new()));
    Ok(Orchestrator::new(registry, Arc::new(knowledge)).with_matcher(matcher))
}

/// Run context bounded by the flag timeout, else the configured one.
pub fn run_context(timeout_secs: Option<u64>, config: &Config) -> RunContext {
    match timeout_secs.map(Duration::from_secs).or_else(|| config.timeout()) {
        Some(timeout) => RunContext::with_timeout(timeout),
        None => RunContext::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::{Component, Version, VersionStatus};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_catalog_setting_gives_empty_catalog() {
        let temp = TempDir::new().unwrap();
        let catalog =
            load_knowledge(temp.path(), &Config::default(), &Selection::default()).unwrap();
        assert_eq!(catalog, KnowledgeCatalog::new());
    }

    #[test]
    fn flag_overrides_config_catalog() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("flag.json"), r#"{"languages": {"go": {}}}"#).unwrap();
        let config = Config {
            knowledge: Some("missing.json".into()),
            ..Config::default()
        };
        let selection = Selection {
            knowledge: Some(temp.path().join("flag.json")),
            ..Default::default()
        };
        let catalog = load_knowledge(temp.path(), &config, &selection).unwrap();
        assert!(catalog.languages.contains_key("go"));
    }

    #[test]
    fn configured_catalog_that_is_missing_fails() {
        let temp = TempDir::new().unwrap();
        let config = Config {
            knowledge: Some("missing.json".into()),
            ..Config::default()
        };
        assert!(load_knowledge(temp.path(), &config, &Selection::default()).is_err());
    }

    #[test]
    fn versions_are_pinned_only_when_enabled() {
        let catalog = KnowledgeCatalog::new()
            .with_instrumentation("javascript", "express", "express")
            .with_component(
                Component::new("express", "javascript")
                    .with_version(Version::new("1.2.0", VersionStatus::Latest)),
            );
        let plan = crate::plan::InstallPlan::new("javascript").with_instrumentations(["express"]);

        let pinned = matcher_for(GuardScope::Requested, true, &catalog);
        let plain = matcher_for(GuardScope::Requested, false, &catalog);
        assert_eq!(pinned.match_missing(&[], &plan, &catalog), vec!["express@1.2.0"]);
        assert_eq!(plain.match_missing(&[], &plan, &catalog), vec!["express"]);
    }

    #[test]
    fn flag_timeout_wins() {
        let config = Config {
            tool_timeout: Some(600),
            ..Config::default()
        };
        let ctx = run_context(Some(5), &config);
        assert!(ctx.remaining().unwrap() <= Duration::from_secs(5));
        assert!(run_context(None, &Config::default()).remaining().is_none());
    }
}
