//! [`Compositor`] implementation backed by niri IPC.

use super::socket::{Action, Request, SocketPool, WorkspaceReference};
use super::NiriError;
use crate::command::{Window, WindowId, WorkspaceId};
use crate::config::niri_socket_path;
use crate::traits::Compositor;
use serde::Deserialize;
use std::path::Path;

/// niri-backed compositor handle.
///
/// Requests go over pooled connections to `$NIRI_SOCKET`; one that niri has
/// already closed is dropped and the request is sent again on a new one.
pub struct NiriCompositor {
    pool: SocketPool,
}

impl NiriCompositor {
    /// Create a handle for the socket at `path`.  No connection is opened
    /// eagerly.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            pool: SocketPool::new(path),
        }
    }

    /// Create a handle for the socket named by `$NIRI_SOCKET`.
    pub fn from_env() -> Result<Self, NiriError> {
        Ok(Self::new(niri_socket_path()?))
    }
}

/// Payload of a successful `FocusedWindow` reply.
#[derive(Deserialize)]
enum FocusedWindowResponse {
    FocusedWindow(Option<Window>),
}

impl Compositor for NiriCompositor {
    type Error = NiriError;

    fn move_window_to_workspace(
        &self,
        window: WindowId,
        workspace: WorkspaceId,
    ) -> Result<(), NiriError> {
        let request = Request::Action(Action::MoveWindowToWorkspace {
            window_id: window,
            reference: WorkspaceReference::Id(workspace),
            focus: false,
        });
        self.pool.request(&request).map(|_| ())
    }

    fn focused_window(&self) -> Result<Option<Window>, NiriError> {
        let value = self.pool.request(&Request::FocusedWindow)?;
        let response: FocusedWindowResponse = serde_json::from_value(value)?;
        let FocusedWindowResponse::FocusedWindow(window) = response;
        Ok(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::niri::socket::tests::{fake_niri, tmp_socket_path};

    #[test]
    fn move_sends_action_and_accepts_handled() {
        let path = tmp_socket_path("move");
        let rx = fake_niri(&path, vec![r#"{"Ok":"Handled"}"#]);
        let niri = NiriCompositor::new(&path);

        niri.move_window_to_workspace(1, 20).unwrap();
        let (_, line) = rx.recv().unwrap();
        assert_eq!(
            line,
            r#"{"Action":{"MoveWindowToWorkspace":{"window_id":1,"reference":{"Id":20},"focus":false}}}"#
        );

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn consecutive_moves_all_succeed() {
        let path = tmp_socket_path("moves");
        let rx = fake_niri(&path, vec![r#"{"Ok":"Handled"}"#; 4]);
        let niri = NiriCompositor::new(&path);

        let results: Vec<_> = (1..=4)
            .map(|window| niri.move_window_to_workspace(window, 20).map_err(|e| e.to_string()))
            .collect();
        assert_eq!(results, vec![Ok(()); 4]);

        let windows: Vec<String> = rx.iter().take(4).map(|(_, line)| line).collect();
        for (i, line) in windows.iter().enumerate() {
            assert!(line.contains(&format!(r#""window_id":{}"#, i + 1)), "{}", line);
        }

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn move_error_reply_surfaces() {
        let path = tmp_socket_path("move-err");
        let _rx = fake_niri(&path, vec![r#"{"Err":"no window with id 9"}"#]);
        let niri = NiriCompositor::new(&path);

        let err = niri.move_window_to_workspace(9, 1).unwrap_err();
        assert!(matches!(err, NiriError::Reply(_)));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn focused_window_is_decoded() {
        let path = tmp_socket_path("focus");
        let _rx = fake_niri(
            &path,
            vec![
                r#"{"Ok":{"FocusedWindow":{"id":12,"title":"htop","app_id":"foot","pid":1,"workspace_id":3,"is_focused":true,"is_floating":true}}}"#,
                r#"{"Ok":{"FocusedWindow":null}}"#,
            ],
        );
        let niri = NiriCompositor::new(&path);

        let win = niri.focused_window().unwrap().unwrap();
        assert_eq!(win.id, 12);
        assert_eq!(win.app_id(), "foot");
        assert_eq!(niri.focused_window().unwrap(), None);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn unreachable_socket_fails_the_request() {
        let niri = NiriCompositor::new(tmp_socket_path("nobody"));
        assert!(niri.move_window_to_workspace(1, 1).is_err());
    }
}
