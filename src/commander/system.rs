//! Real process execution.

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use super::{display_command, CommandOutput, Commander, RunContext};
use crate::error::{InstrumentorError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// [`Commander`] backed by `std::process`.
#[derive(Debug, Clone, Default)]
pub struct SystemCommander {
    /// Extra directories searched before the system PATH.
    extra_path: Vec<PathBuf>,
}

impl SystemCommander {
    /// Create a commander that searches the system PATH.
    pub fn new() -> Self {
        Self::default()
    }

    /// Search these directories before the system PATH.
    pub fn with_extra_path(mut self, dirs: Vec<PathBuf>) -> Self {
        self.extra_path = dirs;
        self
    }

    fn search_path(&self) -> Vec<PathBuf> {
        let mut entries = self.extra_path.clone();
        entries.extend(parse_system_path());
        entries
    }
}

impl Commander for SystemCommander {
    fn look_path(&self, name: &str) -> Result<PathBuf> {
        resolve_tool_path(name, &self.search_path()).ok_or_else(|| {
            InstrumentorError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("executable file not found in PATH: {name}"),
            ))
        })
    }

    fn run(
        &self,
        ctx: &RunContext,
        name: &str,
        args: &[String],
        dir: &Path,
    ) -> Result<CommandOutput> {
        let command = display_command(name, args);
        ctx.check(&command)?;

        let start = Instant::now();
        let mut cmd = Command::new(name);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if !dir.as_os_str().is_empty() {
            cmd.current_dir(dir);
        }
        // Own process group, so cancellation reaches helpers the tool spawns.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let mut child = cmd.spawn()?;

        let (tx, rx) = mpsc::channel::<Vec<u8>>();
        for stream in [
            child.stdout.take().map(|s| Box::new(s) as Box<dyn Read + Send>),
            child.stderr.take().map(|s| Box::new(s) as Box<dyn Read + Send>),
        ]
        .into_iter()
        .flatten()
        {
            let tx = tx.clone();
            // Detached: a reader may outlive a cancelled run until the pipe closes.
            thread::spawn(move || forward_lines(stream, &tx));
        }
        drop(tx);

        let mut output = Vec::new();
        let mut streams_open = true;
        let status = loop {
            if streams_open {
                match rx.recv_timeout(POLL_INTERVAL) {
                    Ok(line) => output.extend_from_slice(&line),
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => streams_open = false,
                }
            } else {
                thread::sleep(POLL_INTERVAL);
            }
            if !streams_open {
                if let Some(status) = child.try_wait()? {
                    break status;
                }
            }
            if ctx.is_cancelled() {
                terminate(&mut child);
                debug!("Cancelled '{}' after {:?}", command, start.elapsed());
                return Err(InstrumentorError::Cancelled { command });
            }
        };
        let output = String::from_utf8_lossy(&output).into_owned();

        debug!(
            "'{}' exited with {:?} in {:?}",
            command,
            status.code(),
            start.elapsed()
        );

        if status.success() {
            Ok(CommandOutput::success(output))
        } else {
            Ok(CommandOutput::failure(status.code(), output))
        }
    }
}

/// Send raw lines from `stream` until it ends or the receiver is gone.
///
/// Lines are kept as bytes; tools print in whatever encoding the locale has.
fn forward_lines(stream: Box<dyn Read + Send>, tx: &mpsc::Sender<Vec<u8>>) {
    let mut reader = BufReader::new(stream);
    loop {
        let mut line = Vec::new();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                if tx.send(line).is_err() {
                    break;
                }
            }
        }
    }
}

/// Kill the child and, on unix, everything left in its process group.
fn terminate(child: &mut Child) {
    #[cfg(unix)]
    if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
        // SAFETY: kill(2) with a negative pid only signals that group.
        unsafe {
            libc::kill(-pgid, libc::SIGKILL);
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}

/// Check whether a file has executable permission bits set.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// On Windows, executability is determined by file extension, not permission bits.
#[cfg(not(unix))]
pub fn is_executable(_path: &Path) -> bool {
    true
}

/// Resolve a tool's binary path by iterating over PATH entries.
///
/// Returns the first match that exists and is executable.
pub fn resolve_tool_path(tool: &str, path_entries: &[PathBuf]) -> Option<PathBuf> {
    for dir in path_entries {
        for candidate in candidate_names(tool) {
            let candidate = dir.join(candidate);
            if candidate.is_file() && is_executable(&candidate) {
                return Some(candidate);
            }
        }
    }
    None
}

#[cfg(windows)]
fn candidate_names(tool: &str) -> Vec<String> {
    vec![
        format!("{tool}.exe"),
        format!("{tool}.cmd"),
        format!("{tool}.bat"),
        tool.to_string(),
    ]
}

#[cfg(not(windows))]
fn candidate_names(tool: &str) -> Vec<String> {
    vec![tool.to_string()]
}

/// Parse the system PATH environment variable into a list of directories.
pub fn parse_system_path() -> Vec<PathBuf> {
    std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Create a fake binary at a path (creates parent dirs as needed).
    fn create_fake_binary(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "#!/bin/sh\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
        }
    }

    #[cfg(unix)]
    #[test]
    fn resolve_tool_path_finds_first_match() {
        let temp = TempDir::new().unwrap();
        let dir_a = temp.path().join("a");
        let dir_b = temp.path().join("b");
        create_fake_binary(&dir_a.join("mvn"));
        create_fake_binary(&dir_b.join("mvn"));

        let result = resolve_tool_path("mvn", &[dir_a.clone(), dir_b]);
        assert_eq!(result, Some(dir_a.join("mvn")));
    }

    #[cfg(unix)]
    #[test]
    fn resolve_tool_path_skips_non_executable() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let dir_a = temp.path().join("a");
        let dir_b = temp.path().join("b");
        fs::create_dir_all(&dir_a).unwrap();
        fs::write(dir_a.join("pip"), "not executable").unwrap();
        fs::set_permissions(dir_a.join("pip"), fs::Permissions::from_mode(0o644)).unwrap();
        create_fake_binary(&dir_b.join("pip"));

        let result = resolve_tool_path("pip", &[dir_a, dir_b.clone()]);
        assert_eq!(result, Some(dir_b.join("pip")));
    }

    #[test]
    fn resolve_tool_path_returns_none_when_not_found() {
        let temp = TempDir::new().unwrap();
        assert!(resolve_tool_path("composer", &[temp.path().to_path_buf()]).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn look_path_uses_extra_path_first() {
        let temp = TempDir::new().unwrap();
        create_fake_binary(&temp.path().join("instrumentor-fake-tool"));

        let commander = SystemCommander::new().with_extra_path(vec![temp.path().to_path_buf()]);
        assert_eq!(
            commander.look_path("instrumentor-fake-tool").unwrap(),
            temp.path().join("instrumentor-fake-tool")
        );
        assert!(commander.look_path("instrumentor-missing-tool").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn run_captures_combined_output() {
        let temp = TempDir::new().unwrap();
        let commander = SystemCommander::new();
        let args = vec!["-c".to_string(), "echo out; echo err >&2".to_string()];

        let result = commander
            .run(&RunContext::new(), "sh", &args, temp.path())
            .unwrap();

        assert!(result.success);
        assert!(result.output.contains("out"));
        assert!(result.output.contains("err"));
    }

    #[cfg(unix)]
    #[test]
    fn run_reports_non_zero_exit_as_failure() {
        let commander = SystemCommander::new();
        let args = vec!["-c".to_string(), "echo nope; exit 3".to_string()];

        let result = commander
            .run(&RunContext::new(), "sh", &args, Path::new(""))
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.exit_code, Some(3));
        assert!(result.output.contains("nope"));
    }

    #[cfg(unix)]
    #[test]
    fn run_kills_process_past_deadline() {
        let commander = SystemCommander::new();
        let ctx = RunContext::with_timeout(Duration::from_millis(150));
        // The shell forks sleep, so the grandchild holds the pipes open.
        let args = vec!["-c".to_string(), "sleep 4; echo done".to_string()];

        let start = Instant::now();
        let result = commander.run(&ctx, "sh", &args, Path::new(""));

        assert!(matches!(result, Err(InstrumentorError::Cancelled { .. })));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[cfg(unix)]
    #[test]
    fn run_keeps_reading_past_invalid_utf8() {
        let commander = SystemCommander::new();
        let args = vec![
            "-c".to_string(),
            "printf 'caf\\351\\n'; sleep 0.2; echo installed ok".to_string(),
        ];

        let result = commander
            .run(&RunContext::new(), "sh", &args, Path::new(""))
            .unwrap();

        assert!(result.success);
        assert!(result.output.contains("caf\u{FFFD}"));
        assert!(result.output.contains("installed ok"));
    }

    #[test]
    fn run_refuses_cancelled_context() {
        let ctx = RunContext::new();
        ctx.cancel();
        let result = SystemCommander::new().run(&ctx, "go", &[], Path::new(""));
        assert!(matches!(result, Err(InstrumentorError::Cancelled { .. })));
    }
}
