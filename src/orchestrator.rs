//! Scan, match, and install for one project.
//!
//! A run moves through [`PipelineStage`]s:
//!
//! ```text
//! Scanning -> Matching -> Installing -> Done
//!                 \-> Done            (nothing missing)
//! any stage -> Failed
//! ```
//!
//! Errors raised while scanning or installing are wrapped with the stage
//! and language they occurred in. Matching never fails.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use tracing::{debug, info};

use crate::commander::RunContext;
use crate::error::{InstrumentorError, Result};
use crate::knowledge::KnowledgeProvider;
use crate::matcher::{Matcher, PlanMatcher, VersionedMatcher};
use crate::plan::InstallPlan;
use crate::registry::{Ecosystem, Registry};

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Scanning,
    Matching,
    Installing,
    Done,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Scanning => "scanning",
            PipelineStage::Matching => "matching",
            PipelineStage::Installing => "installing",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

struct Progress<'a> {
    language: &'a str,
    stage: PipelineStage,
}

impl<'a> Progress<'a> {
    fn start(language: &'a str) -> Self {
        debug!("{} pipeline: {}", language, PipelineStage::Scanning);
        Self {
            language,
            stage: PipelineStage::Scanning,
        }
    }

    fn advance(&mut self, next: PipelineStage) {
        debug!("{} pipeline: {} -> {}", self.language, self.stage, next);
        self.stage = next;
    }

    fn fail(&mut self, err: InstrumentorError) -> InstrumentorError {
        let stage = self.stage;
        self.advance(PipelineStage::Failed);
        err.in_stage(stage, self.language)
    }
}

/// One project and the plan to apply to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallJob {
    pub project: PathBuf,
    pub plan: InstallPlan,
}

impl InstallJob {
    pub fn new(project: impl Into<PathBuf>, plan: InstallPlan) -> Self {
        Self {
            project: project.into(),
            plan,
        }
    }
}

/// Drives scanners, the matcher, and installers.
pub struct Orchestrator {
    registry: Registry,
    knowledge: Arc<dyn KnowledgeProvider>,
    matcher: Box<dyn Matcher>,
}

impl Orchestrator {
    /// Uses the version-aware matcher when the provider has version data.
    pub fn new(registry: Registry, knowledge: Arc<dyn KnowledgeProvider>) -> Self {
        let matcher: Box<dyn Matcher> = if knowledge.has_version_catalog() {
            Box::new(VersionedMatcher::default())
        } else {
            Box::new(PlanMatcher::new())
        };
        Self {
            registry,
            knowledge,
            matcher,
        }
    }

    pub fn with_matcher(mut self, matcher: Box<dyn Matcher>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Identifiers the project at `project` already declares for `language`.
    pub fn scan(&self, project: &Path, language: &str) -> Result<Vec<String>> {
        let toolset = self.registry.lookup(language)?;
        if !toolset.scanner.detect(project) {
            return Err(InstrumentorError::NoDependencyFile {
                language: language.to_string(),
            });
        }
        toolset.scanner.scan(project)
    }

    /// Install whatever `plan` requires and `project` lacks.
    ///
    /// Returns the missing identifiers, also for a dry run. An empty result
    /// means the installer was never called.
    pub fn run(
        &self,
        ctx: &RunContext,
        project: &Path,
        plan: &InstallPlan,
        dry_run: bool,
    ) -> Result<Vec<String>> {
        let language = plan.language.as_str();
        let toolset = self.registry.lookup(language)?;
        let mut progress = Progress::start(language);

        if !toolset.scanner.detect(project) {
            progress.advance(PipelineStage::Failed);
            return Err(InstrumentorError::NoDependencyFile {
                language: language.to_string(),
            });
        }
        let existing = toolset
            .scanner
            .scan(project)
            .map_err(|e| progress.fail(e))?;
        debug!("{} declares {} dependencies", project.display(), existing.len());

        progress.advance(PipelineStage::Matching);
        let missing = self
            .matcher
            .match_missing(&existing, plan, self.knowledge.as_ref());
        if missing.is_empty() {
            progress.advance(PipelineStage::Done);
            info!("{} project at {} is up to date", language, project.display());
            return Ok(missing);
        }

        progress.advance(PipelineStage::Installing);
        toolset
            .installer
            .install(ctx, project, &missing, dry_run)
            .map_err(|e| progress.fail(e))?;

        progress.advance(PipelineStage::Done);
        if dry_run {
            info!("Would install {} package(s): {}", missing.len(), missing.join(", "));
        } else {
            info!("Installed {} package(s) into {}", missing.len(), project.display());
        }
        Ok(missing)
    }

    /// Run independent jobs concurrently, one result per job in input order.
    ///
    /// Jobs must not share a manifest: two jobs for the same directory and
    /// ecosystem are rejected with `DuplicateJob` before anything runs.
    pub fn run_batch(
        &self,
        ctx: &RunContext,
        jobs: &[InstallJob],
        dry_run: bool,
    ) -> Result<Vec<Result<Vec<String>>>> {
        let mut seen = HashSet::new();
        for job in jobs {
            let ecosystem = Ecosystem::from_language(&job.plan.language)
                .map(|e| e.name().to_string())
                .unwrap_or_else(|| job.plan.language.to_lowercase());
            if !seen.insert((job.project.clone(), ecosystem)) {
                return Err(InstrumentorError::DuplicateJob {
                    project: job.project.clone(),
                    language: job.plan.language.clone(),
                });
            }
        }

        let results: Vec<Result<Vec<String>>> = thread::scope(|scope| {
            let handles: Vec<_> = jobs
                .iter()
                .map(|job| scope.spawn(move || self.run(ctx, &job.project, &job.plan, dry_run)))
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle.join().unwrap_or_else(|_| {
                        Err(anyhow::anyhow!("install job panicked").into())
                    })
                })
                .collect()
        });
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commander::MockCommander;
    use crate::installer::Installer;
    use crate::knowledge::{Component, KnowledgeCatalog, Version, VersionStatus};
    use crate::scanner::Scanner;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct FixedScanner(Vec<&'static str>);

    impl Scanner for FixedScanner {
        fn detect(&self, _project: &Path) -> bool {
            true
        }

        fn scan(&self, _project: &Path) -> Result<Vec<String>> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    #[derive(Default)]
    struct RecordingInstaller {
        installs: Mutex<Vec<Vec<String>>>,
        fail: bool,
    }

    impl Installer for Arc<RecordingInstaller> {
        fn ecosystem(&self) -> Ecosystem {
            Ecosystem::Go
        }

        fn install(&self, _ctx: &RunContext, _project: &Path, deps: &[String], _dry_run: bool) -> Result<()> {
            self.installs.lock().unwrap().push(deps.to_vec());
            if self.fail {
                return Err(InstrumentorError::ToolFailed {
                    command: "go get".into(),
                    dependency: Some(deps[0].clone()),
                    code: Some(1),
                    output: "boom".into(),
                });
            }
            Ok(())
        }
    }

    fn go_catalog() -> Arc<KnowledgeCatalog> {
        Arc::new(
            KnowledgeCatalog::new()
                .with_core("go", ["go.opentelemetry.io/otel", "go.opentelemetry.io/otel/sdk"]),
        )
    }

    fn orchestrator(existing: Vec<&'static str>, installer: Arc<RecordingInstaller>) -> Orchestrator {
        let registry = Registry::empty().register(
            Ecosystem::Go,
            Box::new(FixedScanner(existing)),
            Box::new(installer),
        );
        Orchestrator::new(registry, go_catalog())
    }

    #[test]
    fn installs_only_the_gap() {
        let installer = Arc::new(RecordingInstaller::default());
        let orch = orchestrator(vec!["GO.OPENTELEMETRY.IO/OTEL"], installer.clone());

        let missing = orch
            .run(&RunContext::new(), Path::new("."), &InstallPlan::new("go").with_core(), false)
            .unwrap();

        assert_eq!(missing, vec!["go.opentelemetry.io/otel/sdk"]);
        assert_eq!(*installer.installs.lock().unwrap(), vec![missing]);
    }

    #[test]
    fn nothing_missing_skips_installer() {
        let installer = Arc::new(RecordingInstaller::default());
        let orch = orchestrator(
            vec!["go.opentelemetry.io/otel", "go.opentelemetry.io/otel/sdk"],
            installer.clone(),
        );
        let missing = orch
            .run(&RunContext::new(), Path::new("."), &InstallPlan::new("go").with_core(), false)
            .unwrap();
        assert!(missing.is_empty());
        assert!(installer.installs.lock().unwrap().is_empty());
    }

    #[test]
    fn install_errors_carry_stage() {
        let installer = Arc::new(RecordingInstaller {
            fail: true,
            ..Default::default()
        });
        let orch = orchestrator(vec![], installer);
        let err = orch
            .run(&RunContext::new(), Path::new("."), &InstallPlan::new("go").with_core(), false)
            .unwrap_err();

        assert!(matches!(
            err,
            InstrumentorError::Stage {
                stage: PipelineStage::Installing,
                ..
            }
        ));
        assert!(matches!(err.root(), InstrumentorError::ToolFailed { .. }));
        assert!(err.to_string().starts_with("installing failed for go project"));
    }

    #[test]
    fn unsupported_language_and_missing_manifest() {
        let orch = Orchestrator::new(
            Registry::new(Arc::new(MockCommander::new())),
            Arc::new(KnowledgeCatalog::new()),
        );
        let temp = TempDir::new().unwrap();

        let err = orch
            .run(&RunContext::new(), temp.path(), &InstallPlan::new("cobol").with_core(), false)
            .unwrap_err();
        assert!(matches!(err, InstrumentorError::UnsupportedLanguage { .. }));

        let err = orch
            .run(&RunContext::new(), temp.path(), &InstallPlan::new("go").with_core(), false)
            .unwrap_err();
        assert_eq!(err.to_string(), "no dependency file found for go project");
    }

    #[test]
    fn malformed_manifest_fails_in_scanning() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("package.json"), "{ not json").unwrap();
        let orch = Orchestrator::new(
            Registry::new(Arc::new(MockCommander::new())),
            Arc::new(KnowledgeCatalog::new()),
        );
        let err = orch
            .run(&RunContext::new(), temp.path(), &InstallPlan::new("javascript").with_core(), false)
            .unwrap_err();
        assert!(matches!(
            err,
            InstrumentorError::Stage {
                stage: PipelineStage::Scanning,
                ..
            }
        ));
    }

    #[test]
    fn version_catalog_selects_versioned_matcher() {
        let catalog = KnowledgeCatalog::new()
            .with_core("go", ["go.opentelemetry.io/otel"])
            .with_component(
                Component::new("go.opentelemetry.io/otel", "go")
                    .with_version(Version::new("v1.24.0", VersionStatus::Latest)),
            );
        let installer = Arc::new(RecordingInstaller::default());
        let registry = Registry::empty().register(
            Ecosystem::Go,
            Box::new(FixedScanner(vec![])),
            Box::new(installer.clone()),
        );
        let orch = Orchestrator::new(registry, Arc::new(catalog));

        let missing = orch
            .run(&RunContext::new(), Path::new("."), &InstallPlan::new("go").with_core(), true)
            .unwrap();
        assert_eq!(missing, vec!["go.opentelemetry.io/otel@v1.24.0"]);
    }

    #[test]
    fn batch_rejects_duplicate_targets() {
        let orch = orchestrator(vec![], Arc::new(RecordingInstaller::default()));
        let jobs = vec![
            InstallJob::new("/srv/app", InstallPlan::new("go").with_core()),
            InstallJob::new("/srv/app", InstallPlan::new("golang").with_core()),
        ];
        let err = orch.run_batch(&RunContext::new(), &jobs, true).unwrap_err();
        assert!(matches!(err, InstrumentorError::DuplicateJob { .. }));
    }

    #[test]
    fn batch_keeps_input_order() {
        let installer = Arc::new(RecordingInstaller::default());
        let orch = orchestrator(vec!["go.opentelemetry.io/otel"], installer.clone());
        let jobs = vec![
            InstallJob::new("/srv/a", InstallPlan::new("go").with_core()),
            InstallJob::new("/srv/b", InstallPlan::new("go")),
            InstallJob::new("/srv/c", InstallPlan::new("python").with_core()),
        ];

        let results = orch.run_batch(&RunContext::new(), &jobs, false).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap(), &vec!["go.opentelemetry.io/otel/sdk".to_string()]);
        assert!(results[1].as_ref().unwrap().is_empty());
        assert!(matches!(
            results[2],
            Err(InstrumentorError::UnsupportedLanguage { .. })
        ));
        assert_eq!(installer.installs.lock().unwrap().len(), 1);
    }
}
