use crate::error::BridgeError;
use crate::protocol::{unix_timestamp, OutputSnapshot};
use crate::session::SessionManager;

/// Capture the pane's scrollback window, escape sequences intact.
///
/// The caller must have run `ensure_session` first. Output larger than
/// `max_output_size` keeps only its newest lines.
pub async fn capture_output(manager: &SessionManager) -> Result<OutputSnapshot, BridgeError> {
    let config = manager.config();
    let output = manager
        .driver()
        .capture_pane(
            manager.session_name(),
            config.capture_lines,
            config.timeouts.capture(),
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "failed to capture tmux output");
            BridgeError::classify(e, BridgeError::CaptureTimeout, BridgeError::Capture)
        })?;

    let output = truncate_to_newest_lines(output, config.max_output_size);
    Ok(OutputSnapshot {
        status: "success".to_string(),
        output,
        timestamp: unix_timestamp(),
    })
}

/// Drop leading lines until `text` fits in `max_bytes`. 0 means unlimited.
///
/// Cuts only after a `\n`, so an escape sequence is never split. A single
/// line longer than the cap is returned as the empty string rather than cut.
pub fn truncate_to_newest_lines(text: String, max_bytes: usize) -> String {
    if max_bytes == 0 || text.len() <= max_bytes {
        return text;
    }
    let bytes = text.as_bytes();
    let min_start = text.len() - max_bytes;
    // A cut that lands exactly on a line start keeps that line.
    let start = if bytes[min_start - 1] == b'\n' {
        min_start
    } else {
        bytes[min_start..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|i| min_start + i + 1)
            .unwrap_or(text.len())
    };
    tracing::debug!(
        original = text.len(),
        kept = text.len() - start,
        "output exceeded max size, dropped oldest lines"
    );
    text[start..].to_string()
}
