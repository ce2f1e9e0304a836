//! Workspace → output and window → output lookup tables.

use crate::command::{WindowId, Workspace, WorkspaceId};
use std::collections::HashMap;

/// Which output every workspace and every tracked window lives on.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    workspaces: HashMap<WorkspaceId, String>,
    windows: HashMap<WindowId, String>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole workspace table.
    ///
    /// Workspaces without an output are left out, so their lookups are
    /// absent.
    pub fn replace_workspaces<'a, I>(&mut self, workspaces: I)
    where
        I: IntoIterator<Item = &'a Workspace>,
    {
        self.workspaces.clear();
        self.workspaces.extend(
            workspaces
                .into_iter()
                .filter_map(|ws| ws.output.clone().map(|output| (ws.id, output))),
        );
    }

    /// Output the window was last seen on.
    pub fn lookup(&self, window: WindowId) -> Option<&str> {
        self.windows.get(&window).map(String::as_str)
    }

    pub fn lookup_workspace(&self, workspace: WorkspaceId) -> Option<&str> {
        self.workspaces.get(&workspace).map(String::as_str)
    }

    /// Bind `window` to the output of `workspace`.
    ///
    /// If the workspace is not known yet the binding is cleared; it is
    /// restored by the next window update.
    pub fn bind_window(&mut self, window: WindowId, workspace: WorkspaceId) -> Option<&str> {
        match self.workspaces.get(&workspace) {
            Some(output) => {
                self.windows.insert(window, output.clone());
            }
            None => {
                self.windows.remove(&window);
            }
        }
        self.lookup(window)
    }

    pub fn reset_window_bindings(&mut self) {
        self.windows.clear();
    }

    /// Whether `window` and `workspace` resolve to the same output.
    ///
    /// Two unknown outputs compare equal.
    pub fn same_output(&self, window: WindowId, workspace: WorkspaceId) -> bool {
        self.lookup(window) == self.lookup_workspace(workspace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ws(id: WorkspaceId, output: &str) -> Workspace {
        Workspace {
            id,
            output: Some(output.into()),
        }
    }

    #[test]
    fn replace_workspaces_drops_previous_entries() {
        let mut t = Topology::new();
        t.replace_workspaces(&[ws(1, "DP-1"), ws(2, "HDMI-A-1")]);
        assert_eq!(t.lookup_workspace(2), Some("HDMI-A-1"));

        t.replace_workspaces(&[ws(3, "DP-1")]);
        assert_eq!(t.lookup_workspace(1), None);
        assert_eq!(t.lookup_workspace(2), None);
        assert_eq!(t.lookup_workspace(3), Some("DP-1"));
    }

    #[test]
    fn workspace_without_output_is_absent() {
        let mut t = Topology::new();
        t.replace_workspaces(&[Workspace { id: 4, output: None }]);
        assert_eq!(t.lookup_workspace(4), None);
    }

    #[test]
    fn bind_window_follows_workspace_output() {
        let mut t = Topology::new();
        t.replace_workspaces(&[ws(10, "DP-1"), ws(20, "HDMI-A-1")]);
        assert_eq!(t.bind_window(1, 10), Some("DP-1"));
        assert_eq!(t.bind_window(1, 20), Some("HDMI-A-1"));
        assert_eq!(t.lookup(1), Some("HDMI-A-1"));
    }

    #[test]
    fn bind_to_unknown_workspace_clears_binding() {
        let mut t = Topology::new();
        t.replace_workspaces(&[ws(10, "DP-1")]);
        t.bind_window(1, 10);
        assert_eq!(t.bind_window(1, 99), None);
        assert_eq!(t.lookup(1), None);
    }

    #[test]
    fn reset_window_bindings_keeps_workspaces() {
        let mut t = Topology::new();
        t.replace_workspaces(&[ws(10, "DP-1")]);
        t.bind_window(1, 10);
        t.reset_window_bindings();
        assert_eq!(t.lookup(1), None);
        assert_eq!(t.lookup_workspace(10), Some("DP-1"));
    }

    #[test]
    fn same_output_checks() {
        let mut t = Topology::new();
        t.replace_workspaces(&[ws(10, "DP-1"), ws(20, "DP-1"), ws(30, "HDMI-A-1")]);
        t.bind_window(1, 10);
        assert!(t.same_output(1, 20));
        assert!(!t.same_output(1, 30));
        assert!(!t.same_output(1, 40));
        assert!(t.same_output(2, 40), "two unknown outputs compare equal");
    }
}
