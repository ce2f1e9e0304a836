//! The control socket.
//!
//! A key binding runs `niri-float-sticky --ipc toggle_sticky`, which looks up
//! the focused window and sends one JSON command to the running daemon:
//!
//! ```json
//! {"action":"toggle_sticky","window_id":42}
//! ```

pub mod client;
pub mod listener;

/// Largest control message the daemon reads from one connection.
pub const MAX_COMMAND_SIZE: u64 = 512;

/// Errors produced on either side of the control socket.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to remove old socket {path}: {source}")]
    StaleSocket {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("connection closed without a command")]
    Empty,
    #[error("listener is already running")]
    AlreadyRunning,
}
