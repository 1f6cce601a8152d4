//! The `scan` command.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::cli::args::{ScanArgs, Selection};
use crate::cli::output::Output;
use crate::config::Config;
use crate::error::Result;

use super::dispatcher::{Command, CommandResult};
use super::setup;

/// Lists the dependencies each detected manifest declares.
pub struct ScanCommand {
    project_root: PathBuf,
    args: ScanArgs,
}

impl ScanCommand {
    pub fn new(project_root: &Path, args: ScanArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            args,
        }
    }
}

impl Command for ScanCommand {
    fn execute(&self, out: &Output) -> Result<CommandResult> {
        let config = Config::load(&self.project_root)?;
        let orchestrator = setup::orchestrator(&self.project_root, &config, &Selection::default())?;

        let languages: Vec<String> = match &self.args.language {
            Some(language) => vec![language.clone()],
            None => orchestrator
                .registry()
                .detect(&self.project_root)
                .into_iter()
                .map(|ecosystem| ecosystem.languages()[0].to_string())
                .collect(),
        };
        if languages.is_empty() {
            out.error(&format!(
                "No dependency manifest found in {}",
                self.project_root.display()
            ));
            return Ok(CommandResult::failure(1));
        }

        let mut found = BTreeMap::new();
        for language in &languages {
            let declared = orchestrator.scan(&self.project_root, language)?;
            found.insert(language.clone(), declared);
        }

        if self.args.json {
            out.raw(&serde_json::to_string_pretty(&found).map_err(anyhow::Error::from)?);
            return Ok(CommandResult::success());
        }

        for (language, declared) in &found {
            out.header(&format!("{} ({} dependencies)", language, declared.len()));
            for identifier in declared {
                out.item(identifier);
            }
        }
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn explicit_language_without_manifest_fails() {
        let temp = TempDir::new().unwrap();
        let args = ScanArgs {
            language: Some("python".into()),
            json: false,
        };
        let err = ScanCommand::new(temp.path(), args)
            .execute(&Output::new(true, false))
            .unwrap_err();
        assert!(err.to_string().contains("no dependency file found"));
    }

    #[test]
    fn detects_manifests() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("requirements.txt"), "flask==3.0\n").unwrap();
        let result = ScanCommand::new(temp.path(), ScanArgs::default())
            .execute(&Output::new(true, false))
            .unwrap();
        assert!(result.success);
    }
}
