//! Snippet execution harness.
//!
//! Every [`SnippetHarness::execute`] call runs the code in a new interpreter
//! process inside its own scratch directory, so nothing a snippet defines,
//! imports or writes is visible to the next one. Failures of any kind come
//! back as data in an [`ExecutionOutcome`], never as an error.

mod capture;
pub mod classify;
pub mod report;

pub use classify::BehaviorClassifier;
pub use report::VerificationSummary;

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::HarnessError;
use crate::types::config::HarnessConfig;
use crate::types::snippet::{ExecutionOutcome, ExitStatus};

use capture::Capture;

/// Environment variable name fragments never passed to snippets
/// (case-insensitive).
const SENSITIVE_PATTERNS: &[&str] = &["KEY", "SECRET", "TOKEN", "PASSWORD", "CREDENTIAL"];

/// How long to keep reading pipes once the interpreter itself is gone.
/// Background jobs it left behind may hold them open indefinitely.
const DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Runs code strings in fresh interpreter processes.
#[derive(Debug, Clone)]
pub struct SnippetHarness {
    interpreter: PathBuf,
    config: HarnessConfig,
}

impl SnippetHarness {
    /// Resolve the configured interpreter on `PATH`.
    pub fn new(config: HarnessConfig) -> Result<Self, HarnessError> {
        let interpreter =
            which::which(&config.program).map_err(|source| HarnessError::InterpreterNotFound {
                program: config.program.clone(),
                source,
            })?;

        debug!(interpreter = %interpreter.display(), "Snippet harness ready");
        Ok(Self {
            interpreter,
            config,
        })
    }

    /// Run `code` and capture what it printed and how it ended.
    ///
    /// The interpreter leads its own process group; whatever is left of the
    /// group when the interpreter exits or times out is killed. Output kept
    /// per stream is bounded by [`HarnessConfig::max_output_bytes`], and on
    /// timeout everything printed so far is kept.
    pub async fn execute(&self, code: &str) -> ExecutionOutcome {
        let start = Instant::now();

        let scratch = match tempfile::Builder::new().prefix("snippet-").tempdir() {
            Ok(dir) => dir,
            Err(e) => return harness_failure(start, format!("could not create scratch dir: {}", e)),
        };

        let mut cmd = Command::new(&self.interpreter);
        cmd.args(&self.config.args)
            .arg(code)
            .current_dir(scratch.path())
            .env_clear()
            .envs(snippet_environment())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(interpreter = %self.interpreter.display(), error = %e, "Failed to spawn snippet");
                return harness_failure(start, format!("failed to spawn interpreter: {}", e));
            }
        };
        let pid = child.id();

        let limit = self.config.max_output_bytes;
        let mut stdout = Capture::spawn(child.stdout.take(), limit);
        let mut stderr = Capture::spawn(child.stderr.take(), limit);

        let waited = tokio::time::timeout(self.config.timeout, child.wait()).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let (exit_status, timed_out, note) = match waited {
            Ok(Ok(status)) => {
                let exit_status = if status.success() {
                    ExitStatus::Ok
                } else {
                    ExitStatus::Failed
                };
                (exit_status, false, None)
            }
            Ok(Err(e)) => (
                ExitStatus::Failed,
                false,
                Some(format!("HarnessError: failed to wait for snippet: {}\n", e)),
            ),
            Err(_) => {
                warn!(timeout = ?self.config.timeout, "Snippet timed out");
                kill_process_group(pid);
                let _ = child.start_kill();
                (
                    ExitStatus::Failed,
                    true,
                    Some(format!(
                        "TimeoutError: snippet did not finish within {:?}\n",
                        self.config.timeout
                    )),
                )
            }
        };

        let drained = tokio::time::timeout(DRAIN_GRACE, async {
            stdout.finished().await;
            stderr.finished().await;
        })
        .await;
        if drained.is_err() {
            debug!("Snippet left processes holding its output open");
        }
        kill_process_group(pid);
        let _ = child.wait().await;

        let captured_stdout = stdout.into_text();
        let mut captured_stderr = stderr.into_text();
        if let Some(note) = note {
            captured_stderr.push_str(&note);
        }
        debug!(?exit_status, duration_ms, timed_out, "Snippet finished");

        ExecutionOutcome {
            exit_status,
            captured_stdout,
            captured_stderr,
            duration_ms,
            timed_out,
        }
    }
}

/// Kill every process left in the snippet's group.
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    if let Some(pid) = pid {
        // SAFETY: kill(2) with a negative pid signals a process group and
        // touches no memory.
        unsafe {
            libc::kill(-(pid as libc::pid_t), libc::SIGKILL);
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

fn harness_failure(start: Instant, message: String) -> ExecutionOutcome {
    ExecutionOutcome {
        exit_status: ExitStatus::Failed,
        captured_stdout: String::new(),
        captured_stderr: format!("HarnessError: {}\n", message),
        duration_ms: start.elapsed().as_millis() as u64,
        timed_out: false,
    }
}

/// Parent environment minus anything that looks like a credential.
fn snippet_environment() -> HashMap<String, String> {
    let mut env: HashMap<String, String> = std::env::vars()
        .filter(|(key, _)| !is_sensitive(key))
        .collect();

    env.insert("PYTHONDONTWRITEBYTECODE".to_string(), "1".to_string());
    env.insert("PYTHONIOENCODING".to_string(), "utf-8".to_string());
    env.insert("NO_COLOR".to_string(), "1".to_string());
    env
}

fn is_sensitive(key: &str) -> bool {
    let upper = key.to_uppercase();
    SENSITIVE_PATTERNS.iter().any(|pattern| upper.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sh() -> SnippetHarness {
        SnippetHarness::new(HarnessConfig::new("sh").with_timeout(Duration::from_secs(10))).unwrap()
    }

    #[test]
    fn test_sensitive_names() {
        assert!(is_sensitive("GEMINI_API_KEY"));
        assert!(is_sensitive("github_token"));
        assert!(is_sensitive("DB_PASSWORD"));
        assert!(!is_sensitive("PATH"));
        assert!(!is_sensitive("HOME"));
    }

    #[test]
    fn test_missing_interpreter() {
        let err = SnippetHarness::new(HarnessConfig::new("definitely-not-an-interpreter-xyz")).unwrap_err();
        assert!(matches!(err, HarnessError::InterpreterNotFound { .. }));
    }

    #[tokio::test]
    async fn test_captures_both_streams() {
        let outcome = sh().execute("echo out; echo err >&2").await;

        assert!(outcome.is_ok());
        assert_eq!(outcome.captured_stdout, "out\n");
        assert_eq!(outcome.captured_stderr, "err\n");
        assert!(!outcome.timed_out);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_failed() {
        let outcome = sh().execute("echo boom >&2; exit 3").await;

        assert!(outcome.is_failed());
        assert!(outcome.captured_stderr.contains("boom"));
    }

    #[tokio::test]
    async fn test_runs_in_scratch_directory() {
        let harness = sh();
        let first = harness.execute("pwd").await;
        let second = harness.execute("pwd").await;

        assert_ne!(first.captured_stdout, second.captured_stdout);
        assert!(!PathBuf::from(first.captured_stdout.trim()).exists());
    }
}
