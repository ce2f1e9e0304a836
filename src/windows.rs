//! Per-window floating and stickiness state.
//!
//! A window is *automatically* sticky while it is floating (and auto-stick is
//! enabled).  A user can override that through the control socket; an
//! override always wins over the automatic value.

use crate::command::WindowId;
use std::collections::{BTreeSet, HashMap};

/// Floating set plus manual stickiness overrides.
#[derive(Debug, Clone)]
pub struct WindowStates {
    auto_stick: bool,
    floating: BTreeSet<WindowId>,
    manual: HashMap<WindowId, bool>,
}

impl Default for WindowStates {
    fn default() -> Self {
        Self::new(true)
    }
}

impl WindowStates {
    /// Create an empty store.
    ///
    /// With `auto_stick` off, floating windows are only sticky after a manual
    /// override.
    pub fn new(auto_stick: bool) -> Self {
        Self {
            auto_stick,
            floating: BTreeSet::new(),
            manual: HashMap::new(),
        }
    }

    pub fn set_floating(&mut self, id: WindowId) {
        self.floating.insert(id);
    }

    /// Forget every floating window.  Manual overrides are kept.
    pub fn reset_floating(&mut self) {
        self.floating.clear();
    }

    /// Drop everything known about `id`.
    pub fn remove(&mut self, id: WindowId) {
        self.floating.remove(&id);
        self.manual.remove(&id);
    }

    pub fn is_floating(&self, id: WindowId) -> bool {
        self.floating.contains(&id)
    }

    /// Stickiness derived from the floating state alone.
    fn automatic(&self, id: WindowId) -> bool {
        self.auto_stick && self.floating.contains(&id)
    }

    /// Effective stickiness: the manual override if there is one, otherwise
    /// the automatic value.
    pub fn is_sticky(&self, id: WindowId) -> bool {
        self.manual
            .get(&id)
            .copied()
            .unwrap_or_else(|| self.automatic(id))
    }

    /// Record a manual override for `id`.
    ///
    /// Nothing is stored when `sticky` already equals the current effective
    /// value, so later floating/tiling transitions keep applying.
    pub fn set_manual(&mut self, id: WindowId, sticky: bool) {
        if self.is_sticky(id) == sticky {
            return;
        }
        self.manual.insert(id, sticky);
    }

    /// Floating windows whose effective stickiness is on, in ascending id
    /// order.
    ///
    /// Windows that are only sticky through an override but not floating are
    /// not returned.
    pub fn sticky(&self) -> Vec<WindowId> {
        self.floating
            .iter()
            .copied()
            .filter(|id| self.manual.get(id).copied().unwrap_or(self.auto_stick))
            .collect()
    }

    pub fn has_override(&self, id: WindowId) -> bool {
        self.manual.contains_key(&id)
    }
}
