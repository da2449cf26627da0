// novade-compositor-stack/src/workspace_switch.rs
//! Accounting for animated workspace switches.
//!
//! A workspace switch may be animated by several plugins at once. Each
//! plugin that takes part receives one [`WorkspaceSwitchToken`]; the switch
//! is over when every token has been completed (or dropped). Only then are
//! actor visibility and stacking reconciled, in one pass.
//!
//! The counter lives behind an `Rc<RefCell<_>>` shared with the tokens; all
//! of this runs on the compositor thread, so tokens are deliberately
//! neither `Send` nor `Sync`.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

/// Index of a workspace as numbered by the window manager.
pub type WorkspaceIndex = usize;

/// Direction of travel between workspaces, passed through to plugins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionDirection {
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

/// A workspace switch request as offered to plugins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkspaceSwitch {
    pub from: WorkspaceIndex,
    pub to: WorkspaceIndex,
    pub direction: MotionDirection,
}

/// Result of recording one completed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Other steps are still running.
    Pending(u32),
    /// This was the last step; the switch must now be finished.
    Finished,
    /// More completions than steps. Clamped at zero.
    Underflow,
    /// The step belonged to a switch that was superseded or cancelled.
    Stale,
}

#[derive(Debug, Default)]
struct SwitchState {
    generation: u64,
    in_progress: u32,
    finish_pending: bool,
    underflows: u32,
}

impl SwitchState {
    fn step_completed(&mut self, generation: u64) -> StepOutcome {
        if generation != self.generation {
            debug!(
                generation,
                current = self.generation,
                "Ignoring completion of a superseded workspace switch"
            );
            return StepOutcome::Stale;
        }
        if self.in_progress == 0 {
            warn!("Error in workspace switch accounting: completion without a running step");
            self.underflows += 1;
            return StepOutcome::Underflow;
        }
        self.in_progress -= 1;
        if self.in_progress == 0 {
            self.finish_pending = true;
            StepOutcome::Finished
        } else {
            StepOutcome::Pending(self.in_progress)
        }
    }
}

/// Shared in-flight counter of the current workspace switch.
#[derive(Debug, Clone, Default)]
pub struct SwitchTracker {
    state: Rc<RefCell<SwitchState>>,
}

impl SwitchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new switch and holds it open until [`Self::release_hold`].
    ///
    /// The hold keeps a plugin that completes its token synchronously from
    /// finishing the switch before every plugin has been asked. Any switch
    /// still in flight is superseded: its tokens turn stale.
    pub(crate) fn begin(&self) -> u64 {
        let mut state = self.state.borrow_mut();
        if state.in_progress > 0 {
            debug!(
                pending = state.in_progress,
                "Superseding workspace switch that is still animating"
            );
        }
        state.generation += 1;
        state.in_progress = 1;
        state.finish_pending = false;
        state.generation
    }

    pub(crate) fn release_hold(&self) -> StepOutcome {
        self.record_step_completed()
    }

    /// Hands out a token for one more animated step of the current switch.
    ///
    /// Returns `None` when no switch is running, so a stray token can never
    /// start a switch of its own.
    pub fn mint(&self) -> Option<WorkspaceSwitchToken> {
        let mut state = self.state.borrow_mut();
        if state.in_progress == 0 {
            debug!(generation = state.generation, "No workspace switch running, refusing to mint a token");
            return None;
        }
        state.in_progress += 1;
        Some(WorkspaceSwitchToken {
            state: Rc::downgrade(&self.state),
            generation: state.generation,
            settled: false,
        })
    }

    /// Records a completed step of the current switch.
    ///
    /// This is the untracked path for callers that do not hold a token; it
    /// is clamped at zero like every other path.
    pub fn record_step_completed(&self) -> StepOutcome {
        let mut state = self.state.borrow_mut();
        let generation = state.generation;
        state.step_completed(generation)
    }

    /// Steps still running for the current switch.
    pub fn in_progress(&self) -> u32 {
        self.state.borrow().in_progress
    }

    pub fn is_switching(&self) -> bool {
        self.in_progress() > 0
    }

    pub fn generation(&self) -> u64 {
        self.state.borrow().generation
    }

    /// Drops the in-flight switch without waiting for its steps. Returns
    /// `true` if there was one.
    pub(crate) fn discard(&self) -> bool {
        let mut state = self.state.borrow_mut();
        let had_switch = state.in_progress > 0 || state.finish_pending;
        state.generation += 1;
        state.in_progress = 0;
        state.finish_pending = false;
        had_switch
    }

    /// Consumes the "switch reached zero" signal. True at most once per switch.
    pub(crate) fn take_finish_pending(&self) -> bool {
        std::mem::take(&mut self.state.borrow_mut().finish_pending)
    }

    /// Consumes the number of underflows recorded since the last call.
    pub(crate) fn take_underflows(&self) -> u32 {
        std::mem::take(&mut self.state.borrow_mut().underflows)
    }
}

/// One plugin's share of a workspace switch.
///
/// [`WorkspaceSwitchToken::complete`] is the only way to count the step as
/// done. A token dropped without completing (a plugin that gave up, or was
/// unloaded) counts as completed, so a switch can never be left dangling.
#[derive(Debug)]
pub struct WorkspaceSwitchToken {
    state: Weak<RefCell<SwitchState>>,
    generation: u64,
    settled: bool,
}

impl WorkspaceSwitchToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Marks this plugin's animation as done.
    pub fn complete(mut self) -> StepOutcome {
        self.settle()
    }

    fn settle(&mut self) -> StepOutcome {
        if self.settled {
            return StepOutcome::Stale;
        }
        self.settled = true;
        match self.state.upgrade() {
            Some(state) => state.borrow_mut().step_completed(self.generation),
            None => StepOutcome::Stale,
        }
    }
}

impl Drop for WorkspaceSwitchToken {
    fn drop(&mut self) {
        if !self.settled {
            debug!(generation = self.generation, "Workspace switch token dropped without completion");
            self.settle();
        }
    }
}
