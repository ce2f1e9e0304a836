//! Types shared by every component of the daemon.
//!
//! [`CompositorEvent`] and [`ControlCommand`] are the two kinds of input the
//! [`StickyDispatcher`](crate::dispatcher::StickyDispatcher) reacts to.  Both
//! are funnelled into a single queue as [`Input`] so they are applied one at a
//! time, in arrival order.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Compositor-assigned window id.
pub type WindowId = u64;

/// Compositor-assigned workspace id.
pub type WorkspaceId = u64;

/// The subset of a compositor window the daemon cares about.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Window {
    #[serde(alias = "window_id")]
    pub id: WindowId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub app_id: Option<String>,
    /// `None` while the window is not on any workspace.
    #[serde(default)]
    pub workspace_id: Option<WorkspaceId>,
    #[serde(default)]
    pub is_floating: bool,
}

impl Window {
    /// App id, or `""` when the compositor did not report one.
    pub fn app_id(&self) -> &str {
        self.app_id.as_deref().unwrap_or("")
    }

    /// Title, or `""` when the compositor did not report one.
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }
}

/// A workspace and the output (monitor) it lives on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Workspace {
    #[serde(alias = "workspace_id")]
    pub id: WorkspaceId,
    #[serde(default)]
    pub output: Option<String>,
}

/// Every compositor event the dispatcher reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompositorEvent {
    /// A workspace became the active one on its output.
    WorkspaceActivated(WorkspaceId),
    /// Full replacement of the workspace list.
    WorkspacesChanged(Vec<Workspace>),
    /// Full replacement of the window list.
    WindowsChanged(Vec<Window>),
    /// A single window was opened or one of its properties changed.
    WindowOpenedOrChanged(Window),
    /// A window was closed.
    WindowClosed(WindowId),
}

/// What a control command asks the daemon to do with the window's
/// stickiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StickyAction {
    Set,
    Unset,
    Toggle,
}

impl StickyAction {
    /// Wire name of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            StickyAction::Set => "set_sticky",
            StickyAction::Unset => "unset_sticky",
            StickyAction::Toggle => "toggle_sticky",
        }
    }
}

impl fmt::Display for StickyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an action name that is not one of the three known ones.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid ipc command: {0:?}")]
pub struct InvalidAction(pub String);

impl FromStr for StickyAction {
    type Err = InvalidAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "set_sticky" => Ok(StickyAction::Set),
            "unset_sticky" => Ok(StickyAction::Unset),
            "toggle_sticky" => Ok(StickyAction::Toggle),
            other => Err(InvalidAction(other.to_string())),
        }
    }
}

impl Serialize for StickyAction {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StickyAction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(DeError::custom)
    }
}

/// A stickiness request for one window, as sent over the control socket.
///
/// ```json
/// {"action":"toggle_sticky","window_id":42}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlCommand {
    pub action: StickyAction,
    pub window_id: WindowId,
}

/// One item of the dispatcher's merged input queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Compositor(CompositorEvent),
    Control(ControlCommand),
    /// Stop the dispatcher loop.
    Shutdown,
}
