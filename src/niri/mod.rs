//! niri-specific implementations.
//!
//! This module provides the concrete [`Compositor`](crate::traits::Compositor)
//! and the event-stream [`InputSource`](crate::traits::InputSource), both
//! speaking niri's JSON IPC over the Unix socket at `$NIRI_SOCKET`.
//!
//! Nothing outside this module should reference niri's wire format directly.

pub mod compositor;
pub mod events;
pub mod socket;

use crate::config::ConfigError;

/// Errors that can occur when talking to niri.
#[derive(Debug, thiserror::Error)]
pub enum NiriError {
    #[error("niri IPC: {0}")]
    Config(#[from] ConfigError),
    #[error("niri IPC io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("niri IPC parse error: {0}")]
    Json(#[from] serde_json::Error),
    /// niri answered the request with `{"Err": ...}`.
    #[error("niri replied with an error: {0}")]
    Reply(String),
    /// niri closed the connection before answering.
    #[error("niri closed the connection before replying")]
    Closed,
    #[error("niri IPC protocol error: {0}")]
    Protocol(String),
}

impl NiriError {
    /// Whether the failure means the connection itself is unusable, as
    /// opposed to niri rejecting or garbling the request.
    fn is_stale_connection(&self) -> bool {
        matches!(self, NiriError::Io(_) | NiriError::Closed)
    }
}
