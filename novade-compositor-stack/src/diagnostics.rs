// novade-compositor-stack/src/diagnostics.rs
//! A bounded record of protocol inconsistencies.
//!
//! Every inconsistency is also logged; this log exists so that developer
//! tooling and tests can look at what went wrong without scraping logs.

use std::collections::VecDeque;

use crate::effects::EffectId;
use crate::window::WindowId;

/// One protocol inconsistency the compositor recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnostic {
    /// The logical stacking order named a window without an actor.
    UnknownWindowInStack { window: WindowId },
    /// `window_added` for a window that already has an actor.
    DuplicateActor { window: WindowId },
    /// A request for a window that has no actor.
    UnknownWindow { window: WindowId },
    /// `window_added` for a window the window manager does not know.
    MissingWindowInfo { window: WindowId },
    /// More workspace switch completions than steps.
    SwitchCounterUnderflow,
    /// Completion of an effect that was killed or never started.
    StaleEffect { effect: EffectId },
    /// `enable_unredirect` without a matching `disable_unredirect`.
    UnbalancedUnredirect,
}

#[derive(Debug, Clone)]
pub struct DiagnosticsLog {
    entries: VecDeque<Diagnostic>,
    capacity: usize,
    dropped: u64,
}

impl DiagnosticsLog {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Appends `diagnostic`, evicting the oldest entry when full.
    pub fn record(&mut self, diagnostic: Diagnostic) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
            self.dropped += 1;
        }
        self.entries.push_back(diagnostic);
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.entries.iter()
    }

    pub fn contains(&self, diagnostic: &Diagnostic) -> bool {
        self.entries.contains(diagnostic)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries evicted because the log was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_log_is_bounded() {
        let mut log = DiagnosticsLog::with_capacity(2);
        for raw in 1..=3 {
            log.record(Diagnostic::UnknownWindow { window: WindowId::new(raw) });
        }
        let kept: Vec<_> = log.iter().copied().collect();
        assert_eq!(
            kept,
            vec![
                Diagnostic::UnknownWindow { window: WindowId::new(2) },
                Diagnostic::UnknownWindow { window: WindowId::new(3) },
            ]
        );
        assert_eq!(log.dropped(), 1);
    }

    #[test]
    fn test_zero_capacity_keeps_latest() {
        let mut log = DiagnosticsLog::with_capacity(0);
        log.record(Diagnostic::SwitchCounterUnderflow);
        log.record(Diagnostic::UnbalancedUnredirect);
        assert_eq!(log.len(), 1);
        assert!(log.contains(&Diagnostic::UnbalancedUnredirect));
        log.clear();
        assert!(log.is_empty());
    }
}
