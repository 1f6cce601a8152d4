//! Error types for instrumentor operations.
//!
//! This module defines [`InstrumentorError`], the primary error type used
//! throughout the pipeline, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Configuration problems (unknown language, bad dependency identifiers)
//!   are reported before any file is touched
//! - Tool failures carry the captured combined output of the process
//! - Stage errors wrap an inner error with the pipeline stage and language
//! - Unresolvable catalog entries are never errors; the matcher drops them

use std::path::PathBuf;
use thiserror::Error;

use crate::orchestrator::PipelineStage;

/// Core error type for instrumentor operations.
#[derive(Debug, Error)]
pub enum InstrumentorError {
    /// No scanner/installer pair is registered for the language.
    #[error("Unsupported language: {language}")]
    UnsupportedLanguage { language: String },

    /// The project has no manifest recognised by the language's scanner.
    #[error("no dependency file found for {language} project")]
    NoDependencyFile { language: String },

    /// The manifest an installer needs does not exist.
    #[error("{manifest} not found in {}", .dir.display())]
    ManifestNotFound { manifest: String, dir: PathBuf },

    /// The manifest exists but lacks a structure needed for editing.
    #[error("Malformed manifest {}: {message}", .path.display())]
    MalformedManifest { path: PathBuf, message: String },

    /// A package identifier could not be interpreted for the ecosystem.
    #[error("Invalid dependency '{dependency}': {message}")]
    InvalidDependency { dependency: String, message: String },

    /// A native tool invocation failed.
    #[error("{command} failed{}{}\nOutput: {output}",
        .dependency.as_ref().map(|d| format!(" for {d}")).unwrap_or_default(),
        .code.map(|c| format!(" with exit code {c}")).unwrap_or_default())]
    ToolFailed {
        command: String,
        dependency: Option<String>,
        code: Option<i32>,
        output: String,
    },

    /// A native tool invocation was cancelled or ran past its deadline.
    #[error("Command cancelled: {command}")]
    Cancelled { command: String },

    /// Failed to parse the configuration file.
    #[error("Failed to parse config at {}: {message}", .path.display())]
    ConfigParseError { path: PathBuf, message: String },

    /// Failed to load the knowledge catalog.
    #[error("Failed to load knowledge catalog {}: {message}", .path.display())]
    KnowledgeLoad { path: PathBuf, message: String },

    /// Two batch jobs target the same manifest.
    #[error("Duplicate job for {language} project at {}", .project.display())]
    DuplicateJob { project: PathBuf, language: String },

    /// An error raised inside a pipeline stage.
    #[error("{stage} failed for {language} project: {source}")]
    Stage {
        stage: PipelineStage,
        language: String,
        #[source]
        source: Box<InstrumentorError>,
    },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl InstrumentorError {
    /// Wrap this error with the pipeline stage it occurred in.
    pub fn in_stage(self, stage: PipelineStage, language: &str) -> Self {
        InstrumentorError::Stage {
            stage,
            language: language.to_string(),
            source: Box::new(self),
        }
    }

    /// The innermost error, unwrapping any stage context.
    pub fn root(&self) -> &InstrumentorError {
        match self {
            InstrumentorError::Stage { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type alias for instrumentor operations.
pub type Result<T> = std::result::Result<T, InstrumentorError>;
