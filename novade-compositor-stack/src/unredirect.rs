// novade-compositor-stack/src/unredirect.rs
//! Unredirection: letting a fullscreen client bypass compositing.
//!
//! Screen recorders and similar tools inhibit it while they run. The inhibit
//! is a counter so that independent callers can nest.

use tracing::{debug, warn};

use crate::actor::{ActorId, WindowActor};

#[derive(Debug, Default, Clone)]
pub struct UnredirectInhibitor {
    count: u32,
}

impl UnredirectInhibitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disable(&mut self) {
        self.count += 1;
        debug!(count = self.count, "Unredirection disabled");
    }

    /// Drops one inhibit. Returns `false` if there was none to drop; the
    /// counter stays at zero.
    pub fn enable(&mut self) -> bool {
        if self.count == 0 {
            warn!("Called enable_unredirect while unredirection is enabled");
            return false;
        }
        self.count -= 1;
        debug!(count = self.count, "Unredirection enable requested");
        true
    }

    pub fn is_inhibited(&self) -> bool {
        self.count > 0
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// The actor that may be unredirected, given the current top actor.
    pub fn candidate(&self, top: Option<&WindowActor>) -> Option<ActorId> {
        if self.is_inhibited() {
            return None;
        }
        let actor = top?;
        if !actor.backend().can_unredirect() || actor.effect_in_progress() || !actor.is_mapped() {
            return None;
        }
        Some(actor.id())
    }
}
