//! Per-ecosystem dependency installers.
//!
//! Every installer follows the same policy:
//!
//! - an empty dependency list is a no-op
//! - the ecosystem's manifest must exist, even for a dry run
//! - a dry run returns before any tool call or file write
//! - when the native tool is found it is invoked (Phase A), and any failed
//!   call aborts the install with the tool's output
//! - otherwise, or where the manifest edit is the only path, the manifest is
//!   rewritten as a whole (Phase B), skipping entries that already exist
//!
//! Version discovery through the native tool never fails an install; the
//! ecosystem's "latest" sentinel is used instead.

pub mod bundler;
pub mod composer;
pub mod dotnet;
pub mod go;
pub mod gradle;
pub mod java;
mod json;
pub mod npm;
pub mod pip;
pub mod pom;

pub use bundler::BundlerInstaller;
pub use composer::ComposerInstaller;
pub use dotnet::DotNetInstaller;
pub use go::GoInstaller;
pub use java::JvmInstaller;
pub use npm::NpmInstaller;
pub use pip::PipInstaller;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::commander::{display_command, Commander, RunContext};
use crate::error::{InstrumentorError, Result};
use crate::registry::Ecosystem;

/// Installs package identifiers into a project.
pub trait Installer: Send + Sync {
    /// The ecosystem this installer serves.
    fn ecosystem(&self) -> Ecosystem;

    /// Ensure every identifier in `dependencies` is declared by the project.
    fn install(
        &self,
        ctx: &RunContext,
        project: &Path,
        dependencies: &[String],
        dry_run: bool,
    ) -> Result<()>;
}

/// One native binary an installer may use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCandidate {
    pub program: &'static str,
    /// Arguments placed before every call (`-m pip` for `python`).
    pub prefix: &'static [&'static str],
}

impl ToolCandidate {
    pub const fn new(program: &'static str) -> Self {
        Self {
            program,
            prefix: &[],
        }
    }

    pub const fn with_prefix(program: &'static str, prefix: &'static [&'static str]) -> Self {
        Self { program, prefix }
    }

    fn argv(&self, args: &[String]) -> Vec<String> {
        self.prefix
            .iter()
            .map(|s| s.to_string())
            .chain(args.iter().cloned())
            .collect()
    }
}

/// Ordered tool candidates; the first one found on PATH wins.
#[derive(Debug, Clone)]
pub struct ToolChain {
    candidates: Vec<ToolCandidate>,
}

impl ToolChain {
    pub fn new(candidates: Vec<ToolCandidate>) -> Self {
        Self { candidates }
    }

    /// A chain with a single binary.
    pub fn single(program: &'static str) -> Self {
        Self::new(vec![ToolCandidate::new(program)])
    }

    /// Probe candidates in order, stopping at the first hit.
    pub fn resolve(&self, commander: &dyn Commander) -> Option<ToolCandidate> {
        let found = self
            .candidates
            .iter()
            .find(|candidate| commander.look_path(candidate.program).is_ok())
            .cloned();
        match &found {
            Some(tool) => debug!("Using native tool '{}'", tool.program),
            None => debug!(
                "No native tool found (tried {})",
                self.candidates
                    .iter()
                    .map(|c| c.program)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
        found
    }
}

/// Runs a resolved tool inside a project directory.
pub struct ToolRunner<'a> {
    commander: &'a dyn Commander,
    ctx: &'a RunContext,
    dir: &'a Path,
    tool: ToolCandidate,
}

impl<'a> ToolRunner<'a> {
    pub fn new(
        commander: &'a dyn Commander,
        ctx: &'a RunContext,
        dir: &'a Path,
        tool: ToolCandidate,
    ) -> Self {
        Self {
            commander,
            ctx,
            dir,
            tool,
        }
    }

    pub fn program(&self) -> &'static str {
        self.tool.program
    }

    /// Run the tool, turning a non-zero exit into `ToolFailed`.
    pub fn run(&self, args: &[String], dependency: Option<&str>) -> Result<String> {
        let argv = self.tool.argv(args);
        let label = self.label(&argv);
        self.ctx.check(&label)?;

        let out = self.commander.run(self.ctx, self.tool.program, &argv, self.dir)?;
        if out.success {
            Ok(out.output)
        } else {
            Err(InstrumentorError::ToolFailed {
                command: label,
                dependency: dependency.map(str::to_string),
                code: out.exit_code,
                output: out.output,
            })
        }
    }

    /// Run a lookup whose failure is not an error.
    pub fn query(&self, args: &[String]) -> Option<String> {
        match self.run(args, None) {
            Ok(output) => Some(output),
            Err(e) => {
                debug!("Lookup failed, using fallback: {}", e);
                None
            }
        }
    }

    /// `program [prefix...] subcommand`, without the dependency arguments.
    fn label(&self, argv: &[String]) -> String {
        let shown = (self.tool.prefix.len() + 1).min(argv.len());
        display_command(self.tool.program, &argv[..shown])
    }
}

/// Path of `file_name` in `dir`, or `ManifestNotFound`.
pub fn require_manifest(dir: &Path, file_name: &str) -> Result<PathBuf> {
    let path = dir.join(file_name);
    if path.is_file() {
        Ok(path)
    } else {
        Err(InstrumentorError::ManifestNotFound {
            manifest: file_name.to_string(),
            dir: dir.to_path_buf(),
        })
    }
}

/// Replace `path` with `updated` in one step.
///
/// Writes a sibling temporary file and renames it over the manifest so a
/// reader never sees a partial edit. Returns `false` without touching the
/// file when nothing changed.
pub fn write_atomic(path: &Path, original: &str, updated: &str) -> Result<bool> {
    if original == updated {
        debug!("{} unchanged", path.display());
        return Ok(false);
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.instrumentor.tmp"));

    fs::write(&tmp, updated)?;
    if let Ok(meta) = fs::metadata(path) {
        let _ = fs::set_permissions(&tmp, meta.permissions());
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(true)
}

/// Append `lines` to line-oriented content, one per line.
///
/// A newline is added first when the content does not end with one, so an
/// appended entry never joins the last existing line.
pub fn append_lines(content: &str, lines: &[String]) -> String {
    let mut out = String::with_capacity(content.len() + lines.iter().map(|l| l.len() + 1).sum::<usize>());
    out.push_str(content);
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Byte offset where a block should be inserted to land before the tag at
/// `offset`, plus a prefix to emit first.
///
/// When the tag starts its line the block goes at the line start, so it
/// inherits no stray indentation; otherwise a newline is emitted first.
pub fn block_insertion_point(content: &str, offset: usize) -> (usize, &'static str) {
    let line_start = content[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    if content[line_start..offset].trim().is_empty() {
        (line_start, "")
    } else {
        (offset, "\n")
    }
}

/// Insert `block` before the tag starting at `offset`.
pub fn insert_block(content: &str, offset: usize, block: &str) -> String {
    let (at, prefix) = block_insertion_point(content, offset);
    let mut out = String::with_capacity(content.len() + block.len() + 1);
    out.push_str(&content[..at]);
    out.push_str(prefix);
    out.push_str(block);
    out.push_str(&content[at..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commander::MockCommander;
    use tempfile::TempDir;

    #[test]
    fn tool_chain_takes_first_available() {
        let mock = MockCommander::new().with_tool("pip3").with_tool("python");
        let chain = ToolChain::new(vec![
            ToolCandidate::new("pip"),
            ToolCandidate::new("pip3"),
            ToolCandidate::with_prefix("python", &["-m", "pip"]),
        ]);
        assert_eq!(chain.resolve(&mock).unwrap().program, "pip3");
        assert!(ToolChain::single("go").resolve(&mock).is_none());
    }

    #[test]
    fn runner_maps_failure_to_tool_failed() {
        let mock = MockCommander::new().with_failure("python -m pip install", "no matching distribution");
        let ctx = RunContext::new();
        let runner = ToolRunner::new(
            &mock,
            &ctx,
            Path::new("/app"),
            ToolCandidate::with_prefix("python", &["-m", "pip"]),
        );

        let err = runner
            .run(&["install".into(), "-U".into(), "flask".into()], Some("flask"))
            .unwrap_err();
        match err {
            InstrumentorError::ToolFailed {
                command,
                dependency,
                output,
                ..
            } => {
                assert_eq!(command, "python -m pip install");
                assert_eq!(dependency.as_deref(), Some("flask"));
                assert_eq!(output, "no matching distribution");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(mock.command_lines(), vec!["python -m pip install -U flask"]);
    }

    #[test]
    fn query_swallows_failures() {
        let mock = MockCommander::new().with_failure("npm view", "404");
        let ctx = RunContext::new();
        let runner = ToolRunner::new(&mock, &ctx, Path::new("."), ToolCandidate::new("npm"));
        assert!(runner.query(&["view".into(), "x".into()]).is_none());
    }

    #[test]
    fn require_manifest_reports_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = require_manifest(temp.path(), "Gemfile").unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("Gemfile not found in {}", temp.path().display())
        );
    }

    #[test]
    fn write_atomic_skips_unchanged_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("go.mod");
        fs::write(&path, "module x\n").unwrap();

        assert!(!write_atomic(&path, "module x\n", "module x\n").unwrap());
        assert!(write_atomic(&path, "module x\n", "module y\n").unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "module y\n");
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn append_lines_never_joins_lines() {
        assert_eq!(append_lines("a\nb", &["c".into()]), "a\nb\nc\n");
        assert_eq!(append_lines("a\n", &["c".into(), "d".into()]), "a\nc\nd\n");
        assert_eq!(append_lines("", &["c".into()]), "c\n");
    }

    #[test]
    fn insert_block_respects_line_layout() {
        let content = "<project>\n</project>\n";
        let offset = content.find("</project>").unwrap();
        assert_eq!(
            insert_block(content, offset, "  <build/>\n"),
            "<project>\n  <build/>\n</project>\n"
        );

        let inline = "<project><a/></project>";
        let offset = inline.find("</project>").unwrap();
        assert_eq!(
            insert_block(inline, offset, "  <b/>\n"),
            "<project><a/>\n  <b/>\n</project>"
        );
    }
}
