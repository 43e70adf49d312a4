//! Session driver: the seam between the bridge and the tmux binary.
//!
//! Every operation is one short-lived `tmux` invocation bounded by its own
//! timeout. The [`SessionDriver`] trait lets the bridge logic run against an
//! in-memory fake in tests.

use async_trait::async_trait;
use std::borrow::Cow;
use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

const DEFAULT_TMUX_BINARY: &str = "tmux";

/// Format queried by [`SessionDriver::info`].
pub const INFO_FORMAT: &str = "#{session_name}:#{window_name}:#{pane_pid}";

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("tmux {op} timed out after {timeout:?}")]
    Timeout { op: &'static str, timeout: Duration },

    #[error("tmux {op} failed: {stderr}")]
    Failed { op: &'static str, stderr: String },

    #[error("failed to run tmux: {0}")]
    Spawn(#[from] std::io::Error),
}

impl DriverError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, DriverError::Timeout { .. })
    }
}

/// Named keys the bridge injects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Enter,
}

impl Key {
    pub fn tmux_name(self) -> &'static str {
        match self {
            Key::Escape => "Escape",
            Key::Enter => "Enter",
        }
    }
}

#[async_trait]
pub trait SessionDriver: Send + Sync {
    async fn exists(&self, session: &str, timeout: Duration) -> Result<bool, DriverError>;

    /// Create a detached session running `command`, with the given scrollback limit.
    async fn create(
        &self,
        session: &str,
        command: &str,
        history_limit: usize,
        timeout: Duration,
    ) -> Result<(), DriverError>;

    /// Inject `text` verbatim; key names inside it are not interpreted.
    async fn send_literal(
        &self,
        session: &str,
        text: &str,
        timeout: Duration,
    ) -> Result<(), DriverError>;

    async fn send_key(&self, session: &str, key: Key, timeout: Duration)
        -> Result<(), DriverError>;

    /// Capture the last `lines` lines of the pane, escape sequences included.
    async fn capture_pane(
        &self,
        session: &str,
        lines: usize,
        timeout: Duration,
    ) -> Result<String, DriverError>;

    /// Kill the session. A missing session is not an error.
    async fn kill(&self, session: &str, timeout: Duration) -> Result<(), DriverError>;

    /// Raw [`INFO_FORMAT`] line for the session's active pane.
    async fn info(&self, session: &str, timeout: Duration) -> Result<String, DriverError>;
}

/// [`SessionDriver`] backed by the system `tmux` binary.
#[derive(Debug, Clone)]
pub struct TmuxDriver {
    binary: String,
    socket_name: Option<String>,
}

impl Default for TmuxDriver {
    fn default() -> Self {
        Self::new(None)
    }
}

impl TmuxDriver {
    pub fn new(socket_name: Option<String>) -> Self {
        Self {
            binary: DEFAULT_TMUX_BINARY.to_string(),
            socket_name,
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Current global `history-limit`, starting the server if needed.
    async fn global_history_limit(&self, timeout: Duration) -> Result<String, DriverError> {
        let output = self
            .run_checked(
                "show-options",
                &["start-server", ";", "show-options", "-gv", "history-limit"],
                timeout,
            )
            .await?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// `tmux -V`, used by the startup preflight.
    pub async fn version(&self, timeout: Duration) -> Result<String, DriverError> {
        let output = self.run("version", &["-V"], timeout).await?;
        if !output.status.success() {
            return Err(failed("version", &output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn run(
        &self,
        op: &'static str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output, DriverError> {
        let mut cmd = Command::new(&self.binary);
        if let Some(socket) = &self.socket_name {
            cmd.args(["-L", socket]);
        }
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::trace!(op, ?args, "running tmux");
        match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(DriverError::Timeout { op, timeout }),
        }
    }

    /// Run and require a zero exit status.
    async fn run_checked(
        &self,
        op: &'static str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output, DriverError> {
        let output = self.run(op, args, timeout).await?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(failed(op, &output))
        }
    }
}

fn failed(op: &'static str, output: &Output) -> DriverError {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let stderr = if stderr.is_empty() {
        format!("exit status {}", output.status)
    } else {
        stderr
    };
    DriverError::Failed { op, stderr }
}

/// True for tmux errors meaning "nothing to act on" rather than a real failure.
pub fn is_missing_session_error(stderr: &str) -> bool {
    let lower = stderr.to_ascii_lowercase();
    lower.contains("can't find session")
        || lower.contains("session not found")
        || lower.contains("no server running")
        || lower.contains("error connecting to")
}

/// Exact-match session target, so `claude` never resolves to `claude-session` by prefix.
fn exact_target(session: &str) -> String {
    format!("={session}")
}

/// Active pane of the exactly-named session.
fn pane_target(session: &str) -> String {
    format!("={session}:")
}

/// tmux splits commands on an argument ending in `;`, even after `--`.
/// A trailing `\;` is unescaped back to `;`.
fn escape_trailing_semicolon(text: &str) -> Cow<'_, str> {
    match text.strip_suffix(';') {
        Some(head) => Cow::Owned(format!("{head}\\;")),
        None => Cow::Borrowed(text),
    }
}

#[async_trait]
impl SessionDriver for TmuxDriver {
    async fn exists(&self, session: &str, timeout: Duration) -> Result<bool, DriverError> {
        let target = exact_target(session);
        let output = self
            .run("has-session", &["has-session", "-t", &target], timeout)
            .await?;
        Ok(output.status.success())
    }

    async fn create(
        &self,
        session: &str,
        command: &str,
        history_limit: usize,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        // history-limit only applies to panes created after it is set and
        // tmux has no per-pane override, so the global value is swapped in
        // around new-session and restored in the same command list.
        let previous = self.global_history_limit(timeout).await?;
        let limit = history_limit.to_string();
        let args: [&str; 17] = [
            "start-server",
            ";",
            "set-option",
            "-g",
            "history-limit",
            &limit,
            ";",
            "new-session",
            "-d",
            "-s",
            session,
            command,
            ";",
            "set-option",
            "-g",
            "history-limit",
            &previous,
        ];
        let result = self.run_checked("new-session", &args, timeout).await;
        if result.is_err() {
            // A failed new-session aborts the list before the restore.
            let restore = ["set-option", "-g", "history-limit", previous.as_str()];
            if let Err(e) = self.run_checked("set-option", &restore, timeout).await {
                tracing::warn!(error = %e, "failed to restore global history-limit");
            }
        }
        result.map(|_| ())
    }

    async fn send_literal(
        &self,
        session: &str,
        text: &str,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        let target = pane_target(session);
        let text = escape_trailing_semicolon(text);
        self.run_checked("send-keys", &["send-keys", "-t", &target, "-l", "--", &text], timeout)
            .await?;
        Ok(())
    }

    async fn send_key(
        &self,
        session: &str,
        key: Key,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        let target = pane_target(session);
        self.run_checked("send-keys", &["send-keys", "-t", &target, key.tmux_name()], timeout)
            .await?;
        Ok(())
    }

    async fn capture_pane(
        &self,
        session: &str,
        lines: usize,
        timeout: Duration,
    ) -> Result<String, DriverError> {
        let target = pane_target(session);
        let start = format!("-{lines}");
        let output = self
            .run_checked(
                "capture-pane",
                &["capture-pane", "-t", &target, "-p", "-e", "-S", &start],
                timeout,
            )
            .await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn kill(&self, session: &str, timeout: Duration) -> Result<(), DriverError> {
        let target = exact_target(session);
        match self
            .run_checked("kill-session", &["kill-session", "-t", &target], timeout)
            .await
        {
            Err(DriverError::Failed { stderr, .. }) if is_missing_session_error(&stderr) => {
                tracing::debug!(session, "kill-session: session already gone");
                Ok(())
            }
            other => other.map(|_| ()),
        }
    }

    async fn info(&self, session: &str, timeout: Duration) -> Result<String, DriverError> {
        let target = pane_target(session);
        let output = self
            .run_checked(
                "display-message",
                &["display-message", "-t", &target, "-p", INFO_FORMAT],
                timeout,
            )
            .await?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
