use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::tmux::SessionDriver;

/// Owns the lifecycle of the single named tmux session.
///
/// The manager holds no session state of its own; tmux is the source of
/// truth. What it does hold is the exclusion scope: callers that mutate or
/// read the pane take [`SessionManager::lock`] around the whole
/// ensure-then-act sequence, so two requests never interleave key injections
/// or both decide to create the session.
pub struct SessionManager {
    driver: Arc<dyn SessionDriver>,
    config: Arc<BridgeConfig>,
    scope: Mutex<()>,
}

impl SessionManager {
    pub fn new(driver: Arc<dyn SessionDriver>, config: Arc<BridgeConfig>) -> Self {
        Self {
            driver,
            config,
            scope: Mutex::new(()),
        }
    }

    pub fn driver(&self) -> &dyn SessionDriver {
        self.driver.as_ref()
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn session_name(&self) -> &str {
        &self.config.session_name
    }

    /// Enter the per-session exclusion scope.
    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.scope.lock().await
    }

    /// Create the session unless it already exists.
    ///
    /// After a creation, waits the settle delay so the assistant has drawn
    /// its UI before the caller sends keys or captures.
    pub async fn ensure_session(&self) -> Result<(), BridgeError> {
        let name = self.session_name();
        let timeouts = &self.config.timeouts;

        let exists = self
            .driver
            .exists(name, timeouts.probe())
            .await
            .map_err(|e| {
                BridgeError::classify(e, BridgeError::SessionCheckTimeout, BridgeError::SessionCheck)
            })?;
        if exists {
            return Ok(());
        }

        tracing::info!(session = %name, command = %self.config.assistant_command, "creating tmux session");
        self.driver
            .create(
                name,
                &self.config.assistant_command,
                self.config.history_limit,
                timeouts.create(),
            )
            .await
            .map_err(|e| {
                tracing::error!(session = %name, error = %e, "failed to create tmux session");
                BridgeError::classify(
                    e,
                    BridgeError::SessionCreationTimeout,
                    BridgeError::SessionCreation,
                )
            })?;

        let settle = timeouts.create_settle();
        if !settle.is_zero() {
            tracing::debug!(?settle, "waiting for assistant to start");
            tokio::time::sleep(settle).await;
        }
        Ok(())
    }

    /// Kill the session (a missing one is fine), pause, then recreate it.
    ///
    /// Nothing is rolled back: if recreation fails the session stays gone
    /// until the next request's `ensure_session`.
    pub async fn restart_session(&self) -> Result<(), BridgeError> {
        let name = self.session_name();
        let timeouts = &self.config.timeouts;

        tracing::info!(session = %name, "restarting tmux session");
        self.driver
            .kill(name, timeouts.kill())
            .await
            .map_err(|e| BridgeError::classify(e, BridgeError::RestartTimeout, BridgeError::Restart))?;

        let settle = timeouts.restart_settle();
        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }
        self.ensure_session().await
    }
}
