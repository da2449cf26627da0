// novade-compositor-stack/src/top_actor.rs
//! Tracking the topmost actor that fills the output.
//!
//! The top actor is what fullscreen optimizations key on (unredirection,
//! skipping the paint of everything underneath). It is recomputed after every
//! stacking change and subscribers hear about each change exactly once.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::actor::ActorId;
use crate::geometry::Rect;
use crate::registry::ActorRegistry;
use crate::window::WindowSource;

/// Which actors qualify as the top actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopActorPolicy {
    /// The buffer rectangle covers the whole output.
    #[default]
    CoversOutput,
    /// The buffer rectangle intersects the output.
    OverlapsOutput,
}

impl TopActorPolicy {
    pub fn qualifies(&self, buffer: &Rect, display: &Rect) -> bool {
        match self {
            TopActorPolicy::CoversOutput => buffer.contains_rect(display),
            TopActorPolicy::OverlapsOutput => buffer.intersects(display),
        }
    }
}

/// Handle returned by [`TopActorTracker::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type TopActorCallback = Box<dyn FnMut(Option<ActorId>)>;

pub struct TopActorTracker {
    policy: TopActorPolicy,
    current: Option<ActorId>,
    subscribers: Vec<(SubscriptionId, TopActorCallback)>,
    next_subscription: u64,
}

impl fmt::Debug for TopActorTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopActorTracker")
            .field("policy", &self.policy)
            .field("current", &self.current)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl Default for TopActorTracker {
    fn default() -> Self {
        Self::new(TopActorPolicy::default())
    }
}

impl TopActorTracker {
    pub fn new(policy: TopActorPolicy) -> Self {
        Self {
            policy,
            current: None,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn policy(&self) -> TopActorPolicy {
        self.policy
    }

    /// The highest stacked actor whose window is visible to the compositor,
    /// is not being minimized or unmanaged, and qualifies under the policy.
    pub fn compute<W>(&self, registry: &ActorRegistry, windows: &W) -> Option<ActorId>
    where
        W: WindowSource + ?Sized,
    {
        let display = windows.display_rect();
        registry
            .iter_top_down()
            .find(|actor| {
                windows
                    .window_info(actor.window())
                    .map(|info| {
                        info.visible_to_compositor
                            && !info.is_going_away()
                            && self.policy.qualifies(&info.buffer_rect, &display)
                    })
                    .unwrap_or(false)
            })
            .map(|actor| actor.id())
    }

    /// Recomputes the top actor. Returns `true` and notifies subscribers if
    /// it changed.
    pub fn update<W>(&mut self, registry: &ActorRegistry, windows: &W) -> bool
    where
        W: WindowSource + ?Sized,
    {
        let top = self.compute(registry, windows);
        if top == self.current {
            return false;
        }
        debug!(previous = ?self.current, current = ?top, "Top window actor changed");
        self.current = top;
        self.notify();
        true
    }

    /// The cached top actor, validated against the registry. A dangling
    /// cache is answered with a fresh scan.
    pub fn get<W>(&self, registry: &ActorRegistry, windows: &W) -> Option<ActorId>
    where
        W: WindowSource + ?Sized,
    {
        match self.current {
            Some(actor) if registry.contains(actor) => Some(actor),
            Some(_) => self.compute(registry, windows),
            None => None,
        }
    }

    /// The cached value as last published to subscribers.
    pub fn current(&self) -> Option<ActorId> {
        self.current
    }

    /// Clears the reference if `actor` is the top actor. Returns `true` if it
    /// was; the caller then has to resync.
    pub fn actor_destroyed(&mut self, actor: ActorId) -> bool {
        if self.current != Some(actor) {
            return false;
        }
        debug!(actor = %actor, "Top window actor destroyed");
        self.current = None;
        self.notify();
        true
    }

    pub fn subscribe(&mut self, callback: TopActorCallback) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.subscribers.push((id, callback));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    fn notify(&mut self) {
        let current = self.current;
        for (_, callback) in self.subscribers.iter_mut() {
            callback(current);
        }
    }
}
