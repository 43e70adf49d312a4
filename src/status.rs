use crate::error::BridgeError;
use crate::protocol::{unix_timestamp, SessionInfo, StatusSnapshot};
use crate::session::SessionManager;

/// Report whether the session exists, and who it is if it does.
///
/// Never creates the session. Only a failed existence probe is an error; a
/// failed or malformed metadata query just leaves `session_info` empty.
pub async fn get_status(manager: &SessionManager) -> Result<StatusSnapshot, BridgeError> {
    let driver = manager.driver();
    let name = manager.session_name();
    let timeouts = &manager.config().timeouts;

    let exists = driver
        .exists(name, timeouts.probe())
        .await
        .map_err(|e| BridgeError::classify(e, BridgeError::StatusTimeout, BridgeError::Status))?;

    let session_info = if exists {
        match driver.info(name, timeouts.info()).await {
            Ok(raw) => parse_session_info(&raw),
            Err(e) => {
                tracing::warn!(session = %name, error = %e, "failed to read session info");
                None
            }
        }
    } else {
        None
    };

    Ok(StatusSnapshot {
        status: "success".to_string(),
        session_exists: exists,
        session_name: name.to_string(),
        session_info,
        timestamp: unix_timestamp(),
    })
}

/// Parse `session:window:pid`.
///
/// Session names cannot contain `:` and the pid is numeric, so any extra
/// colons belong to the window name.
pub fn parse_session_info(raw: &str) -> Option<SessionInfo> {
    let raw = raw.trim();
    let (session_name, rest) = raw.split_once(':')?;
    let (window_name, pane_pid) = rest.rsplit_once(':')?;
    Some(SessionInfo {
        session_name: session_name.to_string(),
        window_name: window_name.to_string(),
        pane_pid: pane_pid.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BridgeConfig;
    use crate::fake::{Call, FakeDriver, Fault, Op};
    use std::sync::Arc;

    fn manager(driver: Arc<FakeDriver>) -> SessionManager {
        SessionManager::new(driver, Arc::new(BridgeConfig::default()))
    }

    #[test]
    fn parses_three_fields() {
        assert_eq!(
            parse_session_info("claude-session:node:1234\n"),
            Some(SessionInfo {
                session_name: "claude-session".into(),
                window_name: "node".into(),
                pane_pid: "1234".into(),
            })
        );
    }

    #[test]
    fn window_name_may_contain_colons() {
        let info = parse_session_info("s:a:b:c:99").unwrap();
        assert_eq!(info.session_name, "s");
        assert_eq!(info.window_name, "a:b:c");
        assert_eq!(info.pane_pid, "99");
    }

    #[test]
    fn fewer_than_three_fields_is_none() {
        assert_eq!(parse_session_info("claude-session:node"), None);
        assert_eq!(parse_session_info(""), None);
    }

    #[tokio::test]
    async fn absent_session_reports_false_and_creates_nothing() {
        let driver = Arc::new(FakeDriver::new());
        let mgr = manager(driver.clone());

        let status = get_status(&mgr).await.unwrap();
        assert!(!status.session_exists);
        assert_eq!(status.session_name, "claude-session");
        assert_eq!(status.session_info, None);
        assert_eq!(driver.calls(), vec![Call::Exists("claude-session".into())]);
        assert_eq!(driver.session_count(), 0);
    }

    #[tokio::test]
    async fn present_session_includes_info() {
        let driver = Arc::new(FakeDriver::with_session("claude-session"));
        let mgr = manager(driver);

        let status = get_status(&mgr).await.unwrap();
        assert!(status.session_exists);
        let info = status.session_info.unwrap();
        assert_eq!(info.session_name, "claude-session");
        assert_eq!(info.pane_pid, "4242");
    }

    #[tokio::test]
    async fn malformed_info_is_omitted() {
        let driver = Arc::new(FakeDriver::with_session("claude-session"));
        driver.set_info("garbage");
        let mgr = manager(driver);

        let status = get_status(&mgr).await.unwrap();
        assert!(status.session_exists);
        assert_eq!(status.session_info, None);
    }

    #[tokio::test]
    async fn failed_info_query_is_not_an_error() {
        let driver = Arc::new(FakeDriver::with_session("claude-session"));
        driver.set_fault(Op::Info, Fault::Fail("server exited".into()));
        let mgr = manager(driver);

        let status = get_status(&mgr).await.unwrap();
        assert!(status.session_exists);
        assert_eq!(status.session_info, None);
    }

    #[tokio::test]
    async fn probe_timeout_is_status_timeout() {
        let driver = Arc::new(FakeDriver::new());
        driver.set_fault(Op::Exists, Fault::Timeout);
        let mgr = manager(driver);

        let err = get_status(&mgr).await.unwrap_err();
        assert!(matches!(err, BridgeError::StatusTimeout));
        assert_eq!(err.to_string(), "Status check timeout");
    }
}
