use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_SESSION_NAME: &str = "claude-session";
pub const DEFAULT_ASSISTANT_COMMAND: &str = "claude -c --dangerously-skip-permissions";

/// Runtime configuration for the bridge.
///
/// Built once at startup (defaults, then the optional TOML file, then
/// environment/CLI overrides applied by `main`) and shared by `Arc` with the
/// session manager and the HTTP router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Name of the tmux session the bridge owns.
    pub session_name: String,
    /// Number of scrollback lines included in each capture.
    pub capture_lines: usize,
    /// `history-limit` applied when the session is created.
    pub history_limit: usize,
    /// Optional tmux server socket name (`tmux -L`). `None` uses the default server.
    pub tmux_socket: Option<String>,
    /// Command line launched as the session's initial program.
    pub assistant_command: String,
    pub host: String,
    pub port: u16,
    pub debug: bool,
    /// Poll interval reported to the frontend by `/health`. The bridge itself never polls.
    pub polling_interval_ms: u64,
    /// Upper bound on the bytes returned by the output endpoint. 0 disables it.
    pub max_output_size: usize,
    pub max_command_length: usize,
    pub log_level: String,
    /// Directory holding the web frontend (index.html, css/, js/, icons/).
    pub static_dir: Option<PathBuf>,
    pub cors: bool,
    pub timeouts: Timeouts,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            session_name: DEFAULT_SESSION_NAME.to_string(),
            capture_lines: 5000,
            history_limit: 50_000,
            tmux_socket: None,
            assistant_command: DEFAULT_ASSISTANT_COMMAND.to_string(),
            host: "0.0.0.0".to_string(),
            port: 5000,
            debug: false,
            polling_interval_ms: 500,
            max_output_size: 1024 * 1024,
            max_command_length: 10_000,
            log_level: "info".to_string(),
            static_dir: None,
            cors: true,
            timeouts: Timeouts::default(),
        }
    }
}

/// Per-operation bounds on external tmux calls, plus the settle delays.
///
/// All values are milliseconds in the TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub probe_ms: u64,
    pub create_ms: u64,
    pub keys_ms: u64,
    pub capture_ms: u64,
    pub kill_ms: u64,
    pub info_ms: u64,
    /// Pause after creating the session so the assistant can draw its UI.
    pub create_settle_ms: u64,
    /// Pause between killing and recreating the session on restart.
    pub restart_settle_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            probe_ms: 5_000,
            create_ms: 10_000,
            keys_ms: 5_000,
            capture_ms: 5_000,
            kill_ms: 5_000,
            info_ms: 5_000,
            create_settle_ms: 2_000,
            restart_settle_ms: 1_000,
        }
    }
}

impl Timeouts {
    pub fn probe(&self) -> Duration {
        Duration::from_millis(self.probe_ms)
    }

    pub fn create(&self) -> Duration {
        Duration::from_millis(self.create_ms)
    }

    pub fn keys(&self) -> Duration {
        Duration::from_millis(self.keys_ms)
    }

    pub fn capture(&self) -> Duration {
        Duration::from_millis(self.capture_ms)
    }

    pub fn kill(&self) -> Duration {
        Duration::from_millis(self.kill_ms)
    }

    pub fn info(&self) -> Duration {
        Duration::from_millis(self.info_ms)
    }

    pub fn create_settle(&self) -> Duration {
        Duration::from_millis(self.create_settle_ms)
    }

    pub fn restart_settle(&self) -> Duration {
        Duration::from_millis(self.restart_settle_ms)
    }

    /// Zero settle delays, for tests driving a fake session driver.
    pub fn without_settle(mut self) -> Self {
        self.create_settle_ms = 0;
        self.restart_settle_ms = 0;
        self
    }
}

impl BridgeConfig {
    /// Load config from a TOML file. Returns `None` if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(Some(config))
    }

    /// Reject values that would make every request fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_name.trim().is_empty() {
            return Err(ConfigError::Invalid("session_name must not be empty".into()));
        }
        // tmux treats ':' and '.' as target separators.
        if self.session_name.contains([':', '.']) {
            return Err(ConfigError::Invalid(format!(
                "session_name must not contain ':' or '.': {}",
                self.session_name
            )));
        }
        if self.assistant_command.trim().is_empty() {
            return Err(ConfigError::Invalid("assistant_command must not be empty".into()));
        }
        if self.capture_lines == 0 {
            return Err(ConfigError::Invalid("capture_lines must be at least 1".into()));
        }
        Ok(())
    }

    /// Resolve `host:port`. The host may be an IP literal or a hostname.
    pub async fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let invalid = |detail: String| {
            ConfigError::Invalid(format!(
                "invalid bind address {}:{}: {detail}",
                self.host, self.port
            ))
        };
        let mut addrs = tokio::net::lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|e| invalid(e.to_string()))?;
        addrs
            .next()
            .ok_or_else(|| invalid("host resolved to no addresses".to_string()))
    }

    /// Effective tracing directive for this crate and tower-http.
    pub fn log_directive(&self) -> String {
        let level = if self.debug {
            "debug"
        } else {
            self.log_level.as_str()
        };
        format!("tmux_bridge={level},tower_http={level}")
    }
}

/// Default location of the config file: `$XDG_CONFIG_HOME/tmux-bridge/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tmux-bridge").join("config.toml"))
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {1}", .0.display())]
    ReadFailed(PathBuf, #[source] std::io::Error),

    #[error("failed to parse config {}: {1}", .0.display())]
    ParseFailed(PathBuf, #[source] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = BridgeConfig::default();
        assert_eq!(config.session_name, "claude-session");
        assert_eq!(config.capture_lines, 5000);
        assert_eq!(config.history_limit, 50_000);
        assert_eq!(config.port, 5000);
        assert_eq!(config.max_output_size, 1_048_576);
        assert_eq!(config.timeouts.probe(), Duration::from_secs(5));
        assert_eq!(config.timeouts.create(), Duration::from_secs(10));
        assert_eq!(config.timeouts.create_settle(), Duration::from_secs(2));
        assert_eq!(config.timeouts.restart_settle(), Duration::from_secs(1));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: BridgeConfig = toml::from_str(
            r#"
            session_name = "work"
            port = 8081

            [timeouts]
            capture_ms = 250
            "#,
        )
        .unwrap();
        assert_eq!(config.session_name, "work");
        assert_eq!(config.port, 8081);
        assert_eq!(config.capture_lines, 5000);
        assert_eq!(config.timeouts.capture_ms, 250);
        assert_eq!(config.timeouts.probe_ms, 5_000);
    }

    #[test]
    fn validate_rejects_target_separators() {
        let config = BridgeConfig {
            session_name: "a:b".into(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn validate_rejects_empty_command() {
        let config = BridgeConfig {
            assistant_command: "  ".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn bind_addr_combines_host_and_port() {
        let config = BridgeConfig {
            host: "127.0.0.1".into(),
            port: 9000,
            ..Default::default()
        };
        assert_eq!(
            config.bind_addr().await.unwrap(),
            "127.0.0.1:9000".parse::<SocketAddr>().unwrap()
        );
    }

    #[tokio::test]
    async fn bind_addr_accepts_ipv6_literal() {
        let config = BridgeConfig {
            host: "::1".into(),
            port: 9000,
            ..Default::default()
        };
        assert_eq!(
            config.bind_addr().await.unwrap(),
            "[::1]:9000".parse::<SocketAddr>().unwrap()
        );
    }

    #[tokio::test]
    async fn bind_addr_resolves_hostnames() {
        let config = BridgeConfig {
            host: "localhost".into(),
            port: 9000,
            ..Default::default()
        };
        let addr = config.bind_addr().await.unwrap();
        assert!(addr.ip().is_loopback());
        assert_eq!(addr.port(), 9000);
    }

    #[test]
    fn debug_forces_debug_directive() {
        let config = BridgeConfig {
            debug: true,
            log_level: "warn".into(),
            ..Default::default()
        };
        assert_eq!(config.log_directive(), "tmux_bridge=debug,tower_http=debug");
    }

    #[test]
    fn without_settle_zeroes_delays_only() {
        let t = Timeouts::default().without_settle();
        assert_eq!(t.create_settle(), Duration::ZERO);
        assert_eq!(t.restart_settle(), Duration::ZERO);
        assert_eq!(t.probe(), Duration::from_secs(5));
    }
}
