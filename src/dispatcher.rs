//! The policy core: reacts to compositor events and control commands.
//!
//! [`StickyDispatcher`] owns the [`WindowStates`] and the [`Topology`] and is
//! the only thing that mutates them.  Inputs are applied one at a time from a
//! single queue, so no locking is needed.

use crate::command::{
    CompositorEvent, ControlCommand, Input, StickyAction, Window, WindowId, Workspace, WorkspaceId,
};
use crate::config::Config;
use crate::pattern::WindowFilter;
use crate::topology::Topology;
use crate::traits::Compositor;
use crate::windows::WindowStates;
use log::{debug, error, info, warn};
use std::sync::mpsc;

/// Whether the run loop should keep going after an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Shutdown,
}

/// What happened to one sticky window on a workspace switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved(WindowId),
    /// Skipped because the window lives on another output.
    Foreign(WindowId),
    /// The compositor rejected or failed the request.
    Failed(WindowId),
}

/// Applies the stickiness policy and issues move requests.
pub struct StickyDispatcher<C: Compositor> {
    compositor: C,
    windows: WindowStates,
    topology: Topology,
    filter: WindowFilter,
    allow_foreign_monitors: bool,
}

impl<C: Compositor> StickyDispatcher<C> {
    pub fn new(
        compositor: C,
        windows: WindowStates,
        topology: Topology,
        filter: WindowFilter,
        allow_foreign_monitors: bool,
    ) -> Self {
        Self {
            compositor,
            windows,
            topology,
            filter,
            allow_foreign_monitors,
        }
    }

    /// Build a dispatcher with empty state from the runtime options.
    pub fn from_config(compositor: C, config: &Config) -> Self {
        Self::new(
            compositor,
            WindowStates::new(config.auto_stick),
            Topology::new(),
            config.filter.clone(),
            config.allow_foreign_monitors,
        )
    }

    pub fn windows(&self) -> &WindowStates {
        &self.windows
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn compositor(&self) -> &C {
        &self.compositor
    }

    /// Drain `inputs` until a shutdown is requested or every sender is gone.
    pub fn run(&mut self, inputs: mpsc::Receiver<Input>) {
        info!("niri-float-sticky running");
        for input in inputs {
            if self.handle(input) == Flow::Shutdown {
                info!("shutdown");
                return;
            }
        }
        info!("all input sources closed, exiting");
    }

    /// Process a single [`Input`].
    pub fn handle(&mut self, input: Input) -> Flow {
        match input {
            Input::Compositor(event) => self.handle_event(event),
            Input::Control(cmd) => {
                self.handle_control(cmd);
            }
            Input::Shutdown => return Flow::Shutdown,
        }
        Flow::Continue
    }

    fn handle_event(&mut self, event: CompositorEvent) {
        match event {
            CompositorEvent::WorkspaceActivated(ws) => {
                self.workspace_activated(ws);
            }
            CompositorEvent::WorkspacesChanged(workspaces) => {
                self.workspaces_changed(&workspaces);
            }
            CompositorEvent::WindowsChanged(windows) => {
                self.windows.reset_floating();
                debug!("floating windows cache has been reset");
                self.topology.reset_window_bindings();
                debug!("window to monitor bindings have been reset");
                for win in &windows {
                    self.track_if_eligible(win);
                }
            }
            CompositorEvent::WindowOpenedOrChanged(win) => {
                if !self.track_if_eligible(&win) && !win.is_floating {
                    self.windows.remove(win.id);
                    debug!("window {} is now tiled (app_id={})", win.id, win.app_id());
                }
            }
            CompositorEvent::WindowClosed(id) => {
                debug!("window {} is closed", id);
                self.windows.remove(id);
            }
        }
    }

    /// Move every sticky window to `workspace`, one request per window.
    ///
    /// A failed request is logged and does not stop the rest of the batch.
    pub fn workspace_activated(&mut self, workspace: WorkspaceId) -> Vec<MoveOutcome> {
        debug!("workspace {} activated", workspace);
        let mut outcomes = Vec::new();
        for id in self.windows.sticky() {
            if !self.allow_foreign_monitors && !self.topology.same_output(id, workspace) {
                warn!(
                    "ignore moving window {} to foreign monitor {}",
                    id,
                    self.topology.lookup_workspace(workspace).unwrap_or("<unknown>")
                );
                outcomes.push(MoveOutcome::Foreign(id));
                continue;
            }
            debug!("moving window {} to workspace {}", id, workspace);
            match self.compositor.move_window_to_workspace(id, workspace) {
                Ok(()) => outcomes.push(MoveOutcome::Moved(id)),
                Err(e) => {
                    error!("move window {} to workspace {}: {}", id, workspace, e);
                    outcomes.push(MoveOutcome::Failed(id));
                }
            }
        }
        outcomes
    }

    fn workspaces_changed(&mut self, workspaces: &[Workspace]) {
        self.topology.replace_workspaces(workspaces);
        debug!("workspace to monitor bindings have been reset");
        for ws in workspaces {
            debug!(
                "workspace {} bound to monitor {}",
                ws.id,
                ws.output.as_deref().unwrap_or("<none>")
            );
        }
    }

    /// Mark `win` floating and bind its output if it is a floating window on
    /// a workspace that passes the filters.  Returns whether it was tracked.
    fn track_if_eligible(&mut self, win: &Window) -> bool {
        let workspace = match win.workspace_id {
            Some(ws) if win.is_floating => ws,
            _ => return false,
        };
        if !self.filter.matches(win.app_id(), win.title()) {
            return false;
        }
        self.windows.set_floating(win.id);
        let output = self.topology.bind_window(win.id, workspace);
        debug!(
            "window {} is now floating on workspace {} (app_id={}, output={})",
            win.id,
            workspace,
            win.app_id(),
            output.unwrap_or("<unknown>")
        );
        true
    }

    /// Apply a manual stickiness request and return the resulting effective
    /// stickiness.
    pub fn handle_control(&mut self, cmd: ControlCommand) -> bool {
        let current = self.windows.is_sticky(cmd.window_id);
        let desired = match cmd.action {
            StickyAction::Set => true,
            StickyAction::Unset => false,
            StickyAction::Toggle => !current,
        };
        self.windows.set_manual(cmd.window_id, desired);
        let sticky = self.windows.is_sticky(cmd.window_id);
        info!(
            "window {} sticky state changed. Is sticky now: {}",
            cmd.window_id, sticky
        );
        sticky
    }
}

//  Tests
