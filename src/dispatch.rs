use crate::error::BridgeError;
use crate::protocol::{Ack, ESCAPE_SENTINEL};
use crate::session::SessionManager;
use crate::tmux::Key;

/// Why a command was rejected before dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidCommand {
    Empty,
    TooLong { len: usize, max: usize },
}

/// Reject empty commands and commands longer than `max_len` characters.
pub fn validate_command(command: &str, max_len: usize) -> Result<(), InvalidCommand> {
    if command.is_empty() {
        return Err(InvalidCommand::Empty);
    }
    let len = command.chars().count();
    if len > max_len {
        return Err(InvalidCommand::TooLong { len, max: max_len });
    }
    Ok(())
}

/// Inject one input event into the session.
///
/// The caller must have run `ensure_session` first. The ESC sentinel becomes
/// a single Escape key event; anything else is typed literally and then
/// submitted with a separate Enter. A failed Enter leaves the typed text in
/// the assistant's input line.
pub async fn send(manager: &SessionManager, input: &str) -> Result<Ack, BridgeError> {
    let driver = manager.driver();
    let name = manager.session_name();
    let timeout = manager.config().timeouts.keys();
    let classify =
        |e| BridgeError::classify(e, BridgeError::CommandTimeout, BridgeError::CommandDispatch);

    if input == ESCAPE_SENTINEL {
        driver
            .send_key(name, Key::Escape, timeout)
            .await
            .map_err(classify)?;
        tracing::info!(session = %name, "sent ESC key");
    } else {
        driver
            .send_literal(name, input, timeout)
            .await
            .map_err(classify)?;
        driver
            .send_key(name, Key::Enter, timeout)
            .await
            .map_err(classify)?;
        tracing::info!(session = %name, command = %preview(input), "sent command");
    }

    Ok(Ack::success("Command sent successfully"))
}

/// First 50 characters, for log lines.
fn preview(input: &str) -> String {
    const MAX: usize = 50;
    match input.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &input[..idx]),
        None => input.to_string(),
    }
}
