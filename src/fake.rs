//! In-memory [`SessionDriver`] that records every call.
//!
//! Models just enough of tmux for the bridge's logic: named sessions with a
//! line buffer, literal text appended to the current line, Enter starting a
//! new one. Individual operations can be made to time out or fail.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

use crate::tmux::{DriverError, Key, SessionDriver};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Exists,
    Create,
    SendLiteral,
    SendKey,
    Capture,
    Kill,
    Info,
}

impl Op {
    fn tmux_name(self) -> &'static str {
        match self {
            Op::Exists => "has-session",
            Op::Create => "new-session",
            Op::SendLiteral | Op::SendKey => "send-keys",
            Op::Capture => "capture-pane",
            Op::Kill => "kill-session",
            Op::Info => "display-message",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    Timeout,
    Fail(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Exists(String),
    Create {
        session: String,
        command: String,
        history_limit: usize,
    },
    SendLiteral {
        session: String,
        text: String,
    },
    SendKey {
        session: String,
        key: Key,
    },
    Capture {
        session: String,
        lines: usize,
    },
    Kill(String),
    Info(String),
}

#[derive(Debug, Default)]
struct FakeState {
    sessions: HashMap<String, Vec<String>>,
    calls: Vec<Call>,
    faults: HashMap<Op, Fault>,
    info_override: Option<String>,
    latency: Duration,
}

#[derive(Debug, Default)]
pub struct FakeDriver {
    state: Mutex<FakeState>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `session` already present.
    pub fn with_session(session: &str) -> Self {
        let driver = Self::new();
        driver
            .state
            .lock()
            .sessions
            .insert(session.to_string(), vec![String::new()]);
        driver
    }

    pub fn set_fault(&self, op: Op, fault: Fault) {
        self.state.lock().faults.insert(op, fault);
    }

    pub fn clear_fault(&self, op: Op) {
        self.state.lock().faults.remove(&op);
    }

    /// Replace the line returned by `info`.
    pub fn set_info(&self, raw: impl Into<String>) {
        self.state.lock().info_override = Some(raw.into());
    }

    /// Sleep this long inside every call, so concurrent callers overlap.
    pub fn set_latency(&self, latency: Duration) {
        self.state.lock().latency = latency;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn session_count(&self) -> usize {
        self.state.lock().sessions.len()
    }

    pub fn has_session(&self, session: &str) -> bool {
        self.state.lock().sessions.contains_key(session)
    }

    /// Current buffer of `session`, lines joined with `\n`.
    pub fn screen(&self, session: &str) -> Option<String> {
        self.state
            .lock()
            .sessions
            .get(session)
            .map(|lines| lines.join("\n"))
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| pred(c)).count()
    }

    /// Record the call, wait out the latency, then apply any configured fault.
    async fn enter(&self, op: Op, call: Call) -> Result<(), DriverError> {
        let latency = {
            let mut state = self.state.lock();
            state.calls.push(call);
            state.latency
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        match self.state.lock().faults.get(&op) {
            Some(Fault::Timeout) => Err(DriverError::Timeout {
                op: op.tmux_name(),
                timeout: Duration::from_secs(5),
            }),
            Some(Fault::Fail(stderr)) => Err(DriverError::Failed {
                op: op.tmux_name(),
                stderr: stderr.clone(),
            }),
            None => Ok(()),
        }
    }

    fn missing(op: Op, session: &str) -> DriverError {
        DriverError::Failed {
            op: op.tmux_name(),
            stderr: format!("can't find session: {session}"),
        }
    }
}

#[async_trait]
impl SessionDriver for FakeDriver {
    async fn exists(&self, session: &str, _timeout: Duration) -> Result<bool, DriverError> {
        self.enter(Op::Exists, Call::Exists(session.to_string()))
            .await?;
        Ok(self.has_session(session))
    }

    async fn create(
        &self,
        session: &str,
        command: &str,
        history_limit: usize,
        _timeout: Duration,
    ) -> Result<(), DriverError> {
        self.enter(
            Op::Create,
            Call::Create {
                session: session.to_string(),
                command: command.to_string(),
                history_limit,
            },
        )
        .await?;
        let mut state = self.state.lock();
        if state.sessions.contains_key(session) {
            return Err(DriverError::Failed {
                op: Op::Create.tmux_name(),
                stderr: format!("duplicate session: {session}"),
            });
        }
        state
            .sessions
            .insert(session.to_string(), vec![String::new()]);
        Ok(())
    }

    async fn send_literal(
        &self,
        session: &str,
        text: &str,
        _timeout: Duration,
    ) -> Result<(), DriverError> {
        self.enter(
            Op::SendLiteral,
            Call::SendLiteral {
                session: session.to_string(),
                text: text.to_string(),
            },
        )
        .await?;
        let mut state = self.state.lock();
        let lines = state
            .sessions
            .get_mut(session)
            .ok_or_else(|| Self::missing(Op::SendLiteral, session))?;
        let mut parts = text.split('\n');
        if let (Some(first), Some(last)) = (parts.next(), lines.last_mut()) {
            last.push_str(first);
        }
        lines.extend(parts.map(str::to_string));
        Ok(())
    }

    async fn send_key(
        &self,
        session: &str,
        key: Key,
        _timeout: Duration,
    ) -> Result<(), DriverError> {
        self.enter(
            Op::SendKey,
            Call::SendKey {
                session: session.to_string(),
                key,
            },
        )
        .await?;
        let mut state = self.state.lock();
        let lines = state
            .sessions
            .get_mut(session)
            .ok_or_else(|| Self::missing(Op::SendKey, session))?;
        if key == Key::Enter {
            lines.push(String::new());
        }
        Ok(())
    }

    async fn capture_pane(
        &self,
        session: &str,
        lines: usize,
        _timeout: Duration,
    ) -> Result<String, DriverError> {
        self.enter(
            Op::Capture,
            Call::Capture {
                session: session.to_string(),
                lines,
            },
        )
        .await?;
        let state = self.state.lock();
        let buffer = state
            .sessions
            .get(session)
            .ok_or_else(|| Self::missing(Op::Capture, session))?;
        let start = buffer.len().saturating_sub(lines);
        let mut out = buffer[start..].join("\n");
        out.push('\n');
        Ok(out)
    }

    async fn kill(&self, session: &str, _timeout: Duration) -> Result<(), DriverError> {
        self.enter(Op::Kill, Call::Kill(session.to_string())).await?;
        self.state.lock().sessions.remove(session);
        Ok(())
    }

    async fn info(&self, session: &str, _timeout: Duration) -> Result<String, DriverError> {
        self.enter(Op::Info, Call::Info(session.to_string())).await?;
        let state = self.state.lock();
        if !state.sessions.contains_key(session) {
            return Err(Self::missing(Op::Info, session));
        }
        Ok(state
            .info_override
            .clone()
            .unwrap_or_else(|| format!("{session}:claude:4242")))
    }
}
