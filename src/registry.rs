//! Language to ecosystem resolution.
//!
//! Each supported [`Ecosystem`] pairs one [`Scanner`] with one
//! [`Installer`]. The [`Registry`] builds those pairs once and hands them
//! out by language name, accepting the common aliases for each ecosystem.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::commander::Commander;
use crate::error::{InstrumentorError, Result};
use crate::installer::{
    BundlerInstaller, ComposerInstaller, DotNetInstaller, GoInstaller, Installer, JvmInstaller,
    NpmInstaller, PipInstaller,
};
use crate::scanner::{
    ComposerScanner, CsprojScanner, GemfileScanner, GoModScanner, JvmScanner, NpmScanner,
    PipScanner, Scanner,
};

/// A package ecosystem with its own manifest format and native tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    Go,
    Npm,
    Pip,
    Jvm,
    Bundler,
    Composer,
    DotNet,
}

impl Ecosystem {
    pub const ALL: [Ecosystem; 7] = [
        Ecosystem::Go,
        Ecosystem::Npm,
        Ecosystem::Pip,
        Ecosystem::Jvm,
        Ecosystem::Bundler,
        Ecosystem::Composer,
        Ecosystem::DotNet,
    ];

    /// Resolve a language name or alias, case-insensitively.
    pub fn from_language(language: &str) -> Option<Self> {
        let language = language.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|ecosystem| ecosystem.languages().contains(&language.as_str()))
    }

    /// Language names that select this ecosystem.
    pub fn languages(self) -> &'static [&'static str] {
        match self {
            Ecosystem::Go => &["go", "golang"],
            Ecosystem::Npm => &["javascript", "typescript", "node", "nodejs", "js", "ts"],
            Ecosystem::Pip => &["python", "py"],
            Ecosystem::Jvm => &["java", "kotlin"],
            Ecosystem::Bundler => &["ruby", "rb"],
            Ecosystem::Composer => &["php"],
            Ecosystem::DotNet => &["csharp", "c#", "dotnet", ".net"],
        }
    }

    /// Manifest the ecosystem's scanner and installer work on.
    pub fn manifest(self) -> &'static str {
        match self {
            Ecosystem::Go => "go.mod",
            Ecosystem::Npm => "package.json",
            Ecosystem::Pip => "requirements.txt",
            Ecosystem::Jvm => "pom.xml / build.gradle",
            Ecosystem::Bundler => "Gemfile",
            Ecosystem::Composer => "composer.json",
            Ecosystem::DotNet => "*.csproj",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Ecosystem::Go => "go",
            Ecosystem::Npm => "npm",
            Ecosystem::Pip => "pip",
            Ecosystem::Jvm => "jvm",
            Ecosystem::Bundler => "bundler",
            Ecosystem::Composer => "composer",
            Ecosystem::DotNet => "dotnet",
        }
    }

    fn scanner(self) -> Box<dyn Scanner> {
        match self {
            Ecosystem::Go => Box::new(GoModScanner::new()),
            Ecosystem::Npm => Box::new(NpmScanner::new()),
            Ecosystem::Pip => Box::new(PipScanner::new()),
            Ecosystem::Jvm => Box::new(JvmScanner::new()),
            Ecosystem::Bundler => Box::new(GemfileScanner::new()),
            Ecosystem::Composer => Box::new(ComposerScanner::new()),
            Ecosystem::DotNet => Box::new(CsprojScanner::new()),
        }
    }

    fn installer(self, commander: Arc<dyn Commander>) -> Box<dyn Installer> {
        match self {
            Ecosystem::Go => Box::new(GoInstaller::new(commander)),
            Ecosystem::Npm => Box::new(NpmInstaller::new(commander)),
            Ecosystem::Pip => Box::new(PipInstaller::new(commander)),
            Ecosystem::Jvm => Box::new(JvmInstaller::new(commander)),
            Ecosystem::Bundler => Box::new(BundlerInstaller::new(commander)),
            Ecosystem::Composer => Box::new(ComposerInstaller::new(commander)),
            Ecosystem::DotNet => Box::new(DotNetInstaller::new(commander)),
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Scanner and installer serving one ecosystem.
pub struct Toolset {
    pub scanner: Box<dyn Scanner>,
    pub installer: Box<dyn Installer>,
}

/// Scanner/installer pairs keyed by ecosystem.
pub struct Registry {
    entries: HashMap<Ecosystem, Toolset>,
}

impl Registry {
    /// Registry with every built-in ecosystem, sharing one commander.
    pub fn new(commander: Arc<dyn Commander>) -> Self {
        let entries = Ecosystem::ALL
            .into_iter()
            .map(|ecosystem| {
                let toolset = Toolset {
                    scanner: ecosystem.scanner(),
                    installer: ecosystem.installer(Arc::clone(&commander)),
                };
                (ecosystem, toolset)
            })
            .collect();
        Self { entries }
    }

    /// Registry with no ecosystems.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register or replace the pair for `ecosystem`.
    pub fn register(
        mut self,
        ecosystem: Ecosystem,
        scanner: Box<dyn Scanner>,
        installer: Box<dyn Installer>,
    ) -> Self {
        self.entries.insert(ecosystem, Toolset { scanner, installer });
        self
    }

    /// The pair serving `language`, or `UnsupportedLanguage`.
    pub fn lookup(&self, language: &str) -> Result<&Toolset> {
        Ecosystem::from_language(language)
            .and_then(|ecosystem| self.entries.get(&ecosystem))
            .ok_or_else(|| InstrumentorError::UnsupportedLanguage {
                language: language.to_string(),
            })
    }

    /// Registered ecosystems whose scanner recognises `project`.
    pub fn detect(&self, project: &Path) -> Vec<Ecosystem> {
        self.ecosystems()
            .into_iter()
            .filter(|ecosystem| {
                self.entries
                    .get(ecosystem)
                    .is_some_and(|toolset| toolset.scanner.detect(project))
            })
            .collect()
    }

    /// Registered ecosystems in declaration order.
    pub fn ecosystems(&self) -> Vec<Ecosystem> {
        let mut ecosystems: Vec<Ecosystem> = self.entries.keys().copied().collect();
        ecosystems.sort();
        ecosystems
    }
}
