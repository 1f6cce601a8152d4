//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::matcher::GuardScope;
use crate::plan::InstallPlan;

/// Instrumentor - Install observability instrumentation packages.
#[derive(Debug, Parser)]
#[command(name = "instrumentor")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to project root (overrides current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Install missing packages (default if no command specified)
    Install(InstallArgs),

    /// Show the packages a plan would install, without changing anything
    Plan(PlanArgs),

    /// List dependencies the project already declares
    Scan(ScanArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// What to install, shared by `install` and `plan`.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct Selection {
    /// Project language (go, javascript, python, java, ruby, php, csharp)
    #[arg(short, long)]
    pub language: Option<String>,

    /// Install the language's core SDK packages
    #[arg(long)]
    pub core: bool,

    /// Instrumentations to install (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub instrumentation: Vec<String>,

    /// Other components as TYPE=NAME (repeatable)
    #[arg(long, value_parser = parse_component)]
    pub component: Vec<(String, String)>,

    /// Knowledge catalog JSON file
    #[arg(short, long, env = "INSTRUMENTOR_KNOWLEDGE")]
    pub knowledge: Option<PathBuf>,

    /// Which set prerequisite `unless` guards are checked against
    #[arg(long, value_parser = parse_guard_scope)]
    pub guard_scope: Option<GuardScope>,

    /// Do not pin versions from the knowledge catalog
    #[arg(long)]
    pub no_versions: bool,
}

impl Selection {
    /// The plan described by the flags, if a language was given.
    ///
    /// A language with nothing else selected means the core packages.
    pub fn plan(&self) -> Option<InstallPlan> {
        let language = self.language.as_ref()?;
        let mut plan = InstallPlan::new(language.as_str())
            .with_instrumentations(self.instrumentation.iter().cloned());
        plan.install_core = self.core;
        for (component_type, name) in &self.component {
            plan = plan.with_component(component_type, name);
        }
        if plan.is_empty() {
            plan.install_core = true;
        }
        Some(plan)
    }

    /// Whether any plan flag was given without `--language`.
    pub fn is_partial(&self) -> bool {
        self.language.is_none()
            && (self.core || !self.instrumentation.is_empty() || !self.component.is_empty())
    }
}

/// Arguments for the `install` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct InstallArgs {
    #[command(flatten)]
    pub selection: Selection,

    /// Compute the missing packages without installing them
    #[arg(long)]
    pub dry_run: bool,

    /// Seconds allowed for native tool calls
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Arguments for the `plan` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub selection: Selection,

    /// Print the missing packages as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `scan` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ScanArgs {
    /// Only scan this language's manifest
    #[arg(short, long)]
    pub language: Option<String>,

    /// Print the declared dependencies as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

fn parse_component(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((kind, name)) if !kind.trim().is_empty() && !name.trim().is_empty() => {
            Ok((kind.trim().to_string(), name.trim().to_string()))
        }
        _ => Err(format!("expected TYPE=NAME, got '{value}'")),
    }
}

fn parse_guard_scope(value: &str) -> Result<GuardScope, String> {
    match value {
        "requested" => Ok(GuardScope::Requested),
        "working" => Ok(GuardScope::Working),
        other => Err(format!("expected 'requested' or 'working', got '{other}'")),
    }
}
