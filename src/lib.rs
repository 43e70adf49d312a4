//! tmux-bridge: drive a persistent tmux session over HTTP.
//!
//! A web client posts keystrokes and polls the pane contents of one named
//! tmux session in which an interactive CLI assistant runs. All session state
//! lives in tmux; the bridge shells out for every operation.

pub mod api;
pub mod capture;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod fake;
pub mod protocol;
pub mod session;
pub mod status;
pub mod tmux;
