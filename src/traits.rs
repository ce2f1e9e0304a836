//! Seams between the dispatcher and the outside world.
//!
//! The [`StickyDispatcher`](crate::dispatcher::StickyDispatcher) only talks
//! to a [`Compositor`], and only receives work through the queue that
//! [`InputSource`]s feed.  Concrete niri and control-socket implementations
//! live in [`niri`](crate::niri) and [`ipc`](crate::ipc).

use crate::command::{Input, Window, WindowId, WorkspaceId};
use std::sync::mpsc;

/// Requests the daemon sends to the compositor.
pub trait Compositor {
    /// The error type produced by this compositor.
    type Error: std::error::Error + Send + 'static;

    /// Move `window` to `workspace` without focusing it.
    fn move_window_to_workspace(
        &self,
        window: WindowId,
        workspace: WorkspaceId,
    ) -> Result<(), Self::Error>;

    /// The currently focused window, or `None` if nothing has focus.
    fn focused_window(&self) -> Result<Option<Window>, Self::Error>;
}

/// A producer for the dispatcher's input queue.
///
/// # Contract
///
/// * [`run`](InputSource::run) **blocks** until the source is exhausted, it
///   is stopped, or an unrecoverable error occurs.
/// * Every decoded input is sent through `sink` exactly once.
/// * A closed `sink` means the dispatcher is gone; the source should return.
pub trait InputSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start producing and forward every input into `sink`.
    fn run(&mut self, sink: mpsc::Sender<Input>) -> Result<(), Self::Error>;
}
