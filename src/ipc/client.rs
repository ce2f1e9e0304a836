//! One-shot control client.

use super::ControlError;
use crate::command::{ControlCommand, InvalidAction, StickyAction};
use crate::config::ConfigError;
use crate::traits::Compositor;
use log::info;
use std::io::Write;
use std::os::unix::net::UnixStream;
use std::path::Path;

/// Errors the client reports to the user before exiting.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    InvalidAction(#[from] InvalidAction),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to get focused window: {0}")]
    FocusedWindow(String),
    #[error("failed to get focused window: no window is focused")]
    NoFocusedWindow,
    #[error("failed to send command: {0}")]
    Send(#[from] ControlError),
}

/// Write `cmd` to the daemon's control socket, followed by a newline.
pub fn send_command(socket: &Path, cmd: &ControlCommand) -> Result<(), ControlError> {
    let mut stream = UnixStream::connect(socket)?;
    let mut line = serde_json::to_vec(cmd)?;
    line.push(b'\n');
    stream.write_all(&line)?;
    Ok(())
}

/// Apply `action` to the focused window through the daemon at `socket`.
///
/// The action name is validated before the compositor or the daemon are
/// contacted.
pub fn send_for_focused<C: Compositor>(
    compositor: &C,
    action: &str,
    socket: &Path,
) -> Result<ControlCommand, ClientError> {
    let action: StickyAction = action.parse()?;
    let focused = compositor
        .focused_window()
        .map_err(|e| ClientError::FocusedWindow(e.to_string()))?
        .ok_or(ClientError::NoFocusedWindow)?;

    let cmd = ControlCommand {
        action,
        window_id: focused.id,
    };
    send_command(socket, &cmd)?;
    info!("Sent command '{}' for window {}", action, focused.id);
    Ok(cmd)
}
