// novade-compositor-stack/src/stack_sync.rs
//! Merging the window manager's logical stack into the actor order.
//!
//! The window manager only knows about windows that are logically present.
//! Windows that were just minimized or closed drop to the bottom of (or out
//! of) its stack immediately, but their actors are still being animated and
//! must stay where they were until the effect ends. The merge below is a
//! stable walk over both orders, topmost first:
//!
//! * the previous actor order, skipping actors whose window is hidden or
//!   unmanaging and which nothing animates any more;
//! * the new logical order, skipping windows that have no actor.
//!
//! At every step the head of the new order wins, unless the head of the
//! previous order is an actor that is animating out, in which case it is
//! emitted in place. An animating-out actor therefore keeps exactly the
//! actors above it that were above it before, and is never lifted over
//! windows that the window manager placed above it.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, trace, warn};

use crate::actor::ActorId;
use crate::registry::ActorRegistry;
use crate::window::{WindowId, WindowSource};

/// Outcome of one merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackMerge {
    /// The new actor order, bottom-to-top.
    pub order: Vec<ActorId>,
    /// Windows of the logical order that have no actor.
    pub unknown_windows: Vec<WindowId>,
    /// Actors kept in their old slot because an effect still animates them.
    pub retained: Vec<ActorId>,
    /// Previously stacked actors that no longer have a slot.
    pub released: Vec<ActorId>,
}

/// Computes actor orders from logical stacking orders.
#[derive(Debug, Default, Clone, Copy)]
pub struct StackSynchronizer;

impl StackSynchronizer {
    /// Merges `new_order` (topmost first) with the registry's current order.
    ///
    /// Pure with respect to the registry: the caller installs the result.
    pub fn merge<W>(registry: &ActorRegistry, windows: &W, new_order: &[WindowId]) -> StackMerge
    where
        W: WindowSource + ?Sized,
    {
        let going_away = |actor: ActorId| -> bool {
            let Some(window) = registry.get(actor).map(|a| a.window()) else {
                return true;
            };
            windows
                .window_info(window)
                .map(|info| info.is_going_away())
                .unwrap_or(true)
        };
        let animating = |actor: ActorId| -> bool {
            registry
                .get(actor)
                .map(|a| a.effect_in_progress())
                .unwrap_or(false)
        };

        let mut previous: VecDeque<ActorId> = registry.order().iter().rev().copied().collect();
        let mut incoming: VecDeque<WindowId> = new_order.iter().copied().collect();
        let logical: HashSet<WindowId> = new_order.iter().copied().collect();

        let mut emitted: HashSet<ActorId> = HashSet::new();
        let mut top_first: Vec<ActorId> = Vec::with_capacity(previous.len().max(incoming.len()));
        let mut merge = StackMerge::default();

        loop {
            let old_head = loop {
                let Some(&actor) = previous.front() else {
                    break None;
                };
                if emitted.contains(&actor) {
                    previous.pop_front();
                    continue;
                }
                let away = going_away(actor);
                if away && !animating(actor) {
                    trace!(actor = %actor, "Dropping hidden actor that is no longer animating");
                    previous.pop_front();
                    continue;
                }
                break Some((actor, away));
            };

            let new_head = loop {
                let Some(&window) = incoming.front() else {
                    break None;
                };
                match registry.lookup(window) {
                    None => {
                        warn!(window = %window, "No window actor for window in new stacking order");
                        merge.unknown_windows.push(window);
                        incoming.pop_front();
                    }
                    Some(actor) if emitted.contains(&actor) => {
                        debug!(window = %window, "Window listed twice in stacking order");
                        incoming.pop_front();
                    }
                    Some(actor) => break Some(actor),
                }
            };

            let next = match (old_head, new_head) {
                (None, None) => break,
                (Some((actor, away)), new_head) if away || new_head.is_none() => actor,
                (_, Some(actor)) => actor,
                (Some((actor, _)), None) => actor,
            };

            if let Some(window) = registry.get(next).map(|a| a.window()) {
                if !logical.contains(&window) && going_away(next) {
                    merge.retained.push(next);
                }
            }
            emitted.insert(next);
            top_first.push(next);
        }

        merge.released = registry
            .order()
            .iter()
            .copied()
            .filter(|actor| !emitted.contains(actor))
            .collect();

        top_first.reverse();
        merge.order = top_first;

        debug!(
            actors = merge.order.len(),
            retained = merge.retained.len(),
            released = merge.released.len(),
            unknown = merge.unknown_windows.len(),
            "Merged logical stacking order"
        );
        merge
    }
}
