//! **niri-float-sticky**: keeps floating windows on the active workspace.
//!
//! When a workspace becomes active, every *sticky* floating window that lives
//! on the same output is moved onto it, so it follows the user around instead
//! of being left behind.  Floating windows are sticky automatically (subject
//! to app-id/title filters); a key binding can override that per window
//! through a small control socket.
//!
//! # Architecture
//!
//! The crate is organised around two core traits:
//!
//! * [`traits::Compositor`]: the requests sent to the compositor (moving a
//!   window, asking for the focused one).
//! * [`traits::InputSource`]: a producer that feeds the dispatcher's single
//!   input queue (the compositor event stream, the control socket).
//!
//! [`dispatcher::StickyDispatcher`] drains that queue and owns all state:
//! [`windows::WindowStates`] and [`topology::Topology`].  Concrete
//! implementations live in [`niri`] (niri IPC) and [`ipc`] (control socket).

pub mod command;
pub mod config;
pub mod dispatcher;
pub mod ipc;
pub mod niri;
pub mod pattern;
pub mod topology;
pub mod traits;
pub mod windows;
