#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tmux_bridge::api::{router, AppState};
use tmux_bridge::config::{BridgeConfig, Timeouts};
use tmux_bridge::fake::FakeDriver;
use tmux_bridge::session::SessionManager;
use tmux_bridge::tmux::SessionDriver;

/// Default config with the settle delays removed.
pub fn test_config() -> BridgeConfig {
    BridgeConfig {
        timeouts: Timeouts::default().without_settle(),
        ..Default::default()
    }
}

/// Create a test AppState over `driver`.
pub fn create_test_state(driver: Arc<dyn SessionDriver>, config: BridgeConfig) -> AppState {
    AppState::new(SessionManager::new(driver, Arc::new(config)))
}

/// Router over a fresh fake driver, returning both.
pub fn create_test_app() -> (axum::Router, Arc<FakeDriver>) {
    let driver = Arc::new(FakeDriver::new());
    let state = create_test_state(driver.clone(), test_config());
    (router(state), driver)
}

/// Starts the server on a random available port and returns the address.
pub async fn start_test_server(app: axum::Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start
    tokio::time::sleep(Duration::from_millis(10)).await;

    addr
}
