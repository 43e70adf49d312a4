//! tmux-bridge - HTTP bridge to a tmux-hosted CLI assistant.
//!
//! Serves four JSON endpoints under `/api/terminal/claude/` that send keys
//! to, capture, inspect, and restart a single named tmux session, plus the
//! web frontend when `--static-dir` is given.

use clap::Parser as ClapParser;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tmux_bridge::{
    api,
    config::{self, BridgeConfig, ConfigError},
    session::SessionManager,
    tmux::TmuxDriver,
};

/// tmux-bridge - drive a tmux-hosted CLI assistant over HTTP
///
/// Every option can also be set in the TOML config file or through the
/// environment variable shown next to it.
#[derive(ClapParser, Debug)]
#[command(name = "tmux-bridge", version, about, long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, env = "BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Name of the tmux session to drive
    #[arg(long, env = "TMUX_SESSION_NAME")]
    session_name: Option<String>,

    /// Scrollback lines included in each capture
    #[arg(long, env = "TMUX_CAPTURE_LINES")]
    capture_lines: Option<usize>,

    /// history-limit applied when the session is created
    #[arg(long, env = "TMUX_HISTORY_LIMIT")]
    history_limit: Option<usize>,

    /// tmux server socket name (tmux -L)
    #[arg(long, env = "TMUX_SOCKET_NAME")]
    tmux_socket: Option<String>,

    /// Command launched inside a newly created session
    #[arg(long, env = "CLAUDE_COMMAND")]
    assistant_command: Option<String>,

    /// Address to bind the HTTP server
    #[arg(long, env = "BRIDGE_HOST")]
    host: Option<String>,

    /// Port to bind the HTTP server
    #[arg(long, env = "BRIDGE_PORT")]
    port: Option<u16>,

    /// Enable debug logging
    #[arg(long, env = "BRIDGE_DEBUG", value_parser = clap::builder::BoolishValueParser::new())]
    debug: Option<bool>,

    /// Poll interval reported to the frontend by /health, in milliseconds
    #[arg(long, env = "POLLING_INTERVAL")]
    polling_interval: Option<u64>,

    /// Maximum bytes returned by the output endpoint (0 = unlimited)
    #[arg(long, env = "MAX_OUTPUT_SIZE")]
    max_output_size: Option<usize>,

    /// Maximum accepted command length, in characters
    #[arg(long, env = "MAX_COMMAND_LENGTH")]
    max_command_length: Option<usize>,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,

    /// Directory containing the web frontend
    #[arg(long, env = "BRIDGE_STATIC_DIR")]
    static_dir: Option<PathBuf>,

    /// Send permissive CORS headers
    #[arg(long, env = "BRIDGE_CORS", value_parser = clap::builder::BoolishValueParser::new())]
    cors: Option<bool>,
}

impl Cli {
    /// Overlay flags and environment values onto the file/default config.
    fn apply(self, config: &mut BridgeConfig) {
        if let Some(v) = self.session_name {
            config.session_name = v;
        }
        if let Some(v) = self.capture_lines {
            config.capture_lines = v;
        }
        if let Some(v) = self.history_limit {
            config.history_limit = v;
        }
        if let Some(v) = self.tmux_socket {
            config.tmux_socket = Some(v);
        }
        if let Some(v) = self.assistant_command {
            config.assistant_command = v;
        }
        if let Some(v) = self.host {
            config.host = v;
        }
        if let Some(v) = self.port {
            config.port = v;
        }
        if let Some(v) = self.debug {
            config.debug = v;
        }
        if let Some(v) = self.polling_interval {
            config.polling_interval_ms = v;
        }
        if let Some(v) = self.max_output_size {
            config.max_output_size = v;
        }
        if let Some(v) = self.max_command_length {
            config.max_command_length = v;
        }
        if let Some(v) = self.log_level {
            config.log_level = v;
        }
        if let Some(v) = self.static_dir {
            config.static_dir = Some(v);
        }
        if let Some(v) = self.cors {
            config.cors = v;
        }
    }
}

#[derive(Error, Debug)]
pub enum BridgeMainError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), BridgeMainError> {
    let cli = Cli::parse();
    let config = load_config(cli)?;

    init_tracing(&config);
    run_server(config).await
}

fn load_config(mut cli: Cli) -> Result<BridgeConfig, ConfigError> {
    let path = cli.config.take().or_else(config::default_config_path);
    let mut config = match path.as_deref() {
        Some(path) => BridgeConfig::load(path)?.unwrap_or_default(),
        None => BridgeConfig::default(),
    };
    cli.apply(&mut config);
    config.validate()?;
    Ok(config)
}

fn init_tracing(config: &BridgeConfig) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_directive()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

const PREFLIGHT_TIMEOUT: Duration = Duration::from_secs(5);

/// Log the tmux and assistant versions, or warn about whichever is missing.
async fn preflight(driver: &TmuxDriver, assistant_command: &str) {
    match driver.version(PREFLIGHT_TIMEOUT).await {
        Ok(version) => tracing::info!(%version, "found tmux"),
        Err(e) => tracing::warn!(error = %e, "tmux is not usable; API requests will fail"),
    }

    let Some(program) = assistant_program(assistant_command) else {
        return;
    };
    match program_version(program, PREFLIGHT_TIMEOUT).await {
        Ok(version) => tracing::info!(program, %version, "found assistant CLI"),
        Err(e) => tracing::warn!(
            program,
            error = %e,
            "assistant CLI is not usable; new sessions will exit immediately"
        ),
    }
}

/// Program name of the assistant command line.
fn assistant_program(command: &str) -> Option<&str> {
    command.split_whitespace().next()
}

/// `<program> --version`, first line of stdout.
async fn program_version(program: &str, timeout: Duration) -> std::io::Result<String> {
    let mut cmd = tokio::process::Command::new(program);
    cmd.arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    let output = tokio::time::timeout(timeout, cmd.output()).await.map_err(|_| {
        std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            format!("{program} --version timed out after {timeout:?}"),
        )
    })??;
    if !output.status.success() {
        return Err(std::io::Error::other(format!(
            "{program} --version exited with {}",
            output.status
        )));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
}

async fn run_server(config: BridgeConfig) -> Result<(), BridgeMainError> {
    let addr = config.bind_addr().await?;
    tracing::info!(
        session = %config.session_name,
        command = %config.assistant_command,
        debug = config.debug,
        "tmux-bridge starting"
    );

    let driver = TmuxDriver::new(config.tmux_socket.clone());
    preflight(&driver, &config.assistant_command).await;

    let config = Arc::new(config);
    let manager = SessionManager::new(Arc::new(driver), config.clone());
    let app = api::router(api::AppState::new(manager));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "HTTP server listening");
    if config.static_dir.is_some() {
        tracing::info!("terminal interface: http://{}/terminal", addr);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("received Ctrl+C");
            }
        })
        .await?;

    tracing::info!("tmux-bridge exiting");
    Ok(())
}
