// novade-compositor-stack/src/registry.rs
//! The actor registry: sole owner of the window actors and of their order.
//!
//! The order is bottom-to-top. Actors can be registered without being
//! stacked: a minimized window that the window manager leaves out of its
//! logical order keeps its actor (so unminimizing finds it again) but has no
//! slot in the order until the next stack sync puts it back.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::actor::{ActorBackend, ActorId, ActorLayer, WindowActor};
use crate::error::{Result, StackError};
use crate::window::{WindowId, WindowInfo};

#[derive(Debug, Default)]
pub struct ActorRegistry {
    actors: HashMap<ActorId, WindowActor>,
    by_window: HashMap<WindowId, ActorId>,
    /// Stacked actors, bottom-to-top.
    order: Vec<ActorId>,
    next_id: u64,
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the actor for `window` and stacks it on top.
    ///
    /// The position is provisional; the next stack sync moves it where the
    /// window manager wants it.
    pub fn add(&mut self, window: &WindowInfo) -> Result<ActorId> {
        if self.by_window.contains_key(&window.id) {
            warn!(window = %window.id, "Refusing to create a second window actor");
            return Err(StackError::DuplicateActor(window.id));
        }

        self.next_id += 1;
        let id = ActorId::from_raw(self.next_id);
        let actor = WindowActor::new(
            id,
            window.id,
            ActorLayer::for_window_layer(window.layer),
            ActorBackend::for_client(window.client_type),
        );

        self.actors.insert(id, actor);
        self.by_window.insert(window.id, id);
        self.order.push(id);
        debug!(window = %window.id, actor = %id, "Window actor added");
        Ok(id)
    }

    /// Drops an actor from the registry. The render tree is left alone.
    pub fn remove(&mut self, actor: ActorId) -> Option<WindowActor> {
        let removed = self.actors.remove(&actor)?;
        if self.by_window.get(&removed.window()) == Some(&actor) {
            self.by_window.remove(&removed.window());
        }
        self.order.retain(|id| *id != actor);
        debug!(window = %removed.window(), actor = %actor, "Window actor removed");
        Some(removed)
    }

    /// The actor of `window`, if there is one. Callers may race window
    /// teardown, so a miss is not an error.
    pub fn lookup(&self, window: WindowId) -> Option<ActorId> {
        self.by_window.get(&window).copied()
    }

    pub fn get(&self, actor: ActorId) -> Option<&WindowActor> {
        self.actors.get(&actor)
    }

    pub fn get_mut(&mut self, actor: ActorId) -> Option<&mut WindowActor> {
        self.actors.get_mut(&actor)
    }

    pub fn contains(&self, actor: ActorId) -> bool {
        self.actors.contains_key(&actor)
    }

    /// Stacked actors, bottom-to-top.
    pub fn order(&self) -> &[ActorId] {
        &self.order
    }

    pub fn is_stacked(&self, actor: ActorId) -> bool {
        self.order.contains(&actor)
    }

    /// Stacked actors from the top of the stack down.
    pub fn iter_top_down(&self) -> impl Iterator<Item = &WindowActor> + '_ {
        self.order.iter().rev().filter_map(|id| self.actors.get(id))
    }

    /// Every registered actor, stacked or not, in allocation order.
    pub fn actor_ids(&self) -> Vec<ActorId> {
        let mut ids: Vec<ActorId> = self.actors.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Installs a new bottom-to-top order.
    ///
    /// Unknown and repeated ids are dropped; the stack synchronizer never
    /// produces them, so hitting this is a bug worth a warning.
    pub(crate) fn replace_order(&mut self, order: Vec<ActorId>) {
        let mut seen = HashSet::with_capacity(order.len());
        let before = order.len();
        let order: Vec<ActorId> = order
            .into_iter()
            .filter(|id| self.actors.contains_key(id) && seen.insert(*id))
            .collect();
        if order.len() != before {
            warn!(
                dropped = before - order.len(),
                "Discarded unknown or repeated actors from new stacking order"
            );
        }
        self.order = order;
    }
}
