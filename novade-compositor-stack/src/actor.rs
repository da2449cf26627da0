// novade-compositor-stack/src/actor.rs
//! Window actors: the compositor-side visual proxies of logical windows.
//!
//! A [`WindowActor`] outlives its window for as long as an effect is still
//! animating it, which is why it only holds the [`WindowId`] (a lookup key)
//! and never the window itself.

use std::fmt;

use crate::effects::{EffectId, EffectKind};
use crate::render_order::RenderGroup;
use crate::window::{ClientType, WindowId, WindowLayer};

/// Identity of a window actor. Allocated by the [`crate::ActorRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(u64);

impl ActorId {
    pub(crate) const fn from_raw(raw: u64) -> Self {
        ActorId(raw)
    }

    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

/// Rendering group classification of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorLayer {
    Normal,
    /// Override-redirect popups and menus, always above normal windows.
    Override,
}

impl ActorLayer {
    pub fn for_window_layer(layer: WindowLayer) -> Self {
        match layer {
            WindowLayer::Normal => ActorLayer::Normal,
            WindowLayer::OverrideRedirect => ActorLayer::Override,
        }
    }

    /// The render group actors of this layer are parented to.
    pub fn render_group(&self) -> RenderGroup {
        match self {
            ActorLayer::Normal => RenderGroup::Windows,
            ActorLayer::Override => RenderGroup::TopWindows,
        }
    }
}

/// Backend-specific part of an actor, chosen from the window's client type.
///
/// Stacking and visibility never look at this; only backend capability
/// queries such as [`ActorBackend::can_unredirect`] do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorBackend {
    X11,
    Wayland,
}

impl ActorBackend {
    pub fn for_client(client_type: ClientType) -> Self {
        match client_type {
            ClientType::X11 => ActorBackend::X11,
            ClientType::Wayland => ActorBackend::Wayland,
        }
    }

    /// Whether a fullscreen actor of this backend may bypass compositing.
    /// Wayland clients are scanned out directly instead.
    pub fn can_unredirect(&self) -> bool {
        matches!(self, ActorBackend::X11)
    }
}

/// Desired visibility of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    NotVisible,
    Visible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RunningEffect {
    id: EffectId,
    kind: EffectKind,
}

/// Visual proxy for one logical window.
#[derive(Debug, Clone)]
pub struct WindowActor {
    id: ActorId,
    window: WindowId,
    layer: ActorLayer,
    backend: ActorBackend,
    visibility: Visibility,
    /// Whether the render node is currently shown. Lags `visibility` while a
    /// hide effect runs or a workspace switch is being animated.
    mapped: bool,
    effects: Vec<RunningEffect>,
    destroy_queued: bool,
}

impl WindowActor {
    pub(crate) fn new(
        id: ActorId,
        window: WindowId,
        layer: ActorLayer,
        backend: ActorBackend,
    ) -> Self {
        Self {
            id,
            window,
            layer,
            backend,
            visibility: Visibility::NotVisible,
            mapped: false,
            effects: Vec::new(),
            destroy_queued: false,
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn window(&self) -> WindowId {
        self.window
    }

    pub fn layer(&self) -> ActorLayer {
        self.layer
    }

    pub fn backend(&self) -> ActorBackend {
        self.backend
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_visible(&self) -> bool {
        self.visibility == Visibility::Visible
    }

    pub fn is_mapped(&self) -> bool {
        self.mapped
    }

    /// True while the effects engine is animating this actor.
    pub fn effect_in_progress(&self) -> bool {
        !self.effects.is_empty()
    }

    pub fn has_effect(&self, kind: EffectKind) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }

    /// Ids of running effects of the given kind.
    pub fn effects_of_kind(&self, kind: EffectKind) -> Vec<EffectId> {
        self.effects
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.id)
            .collect()
    }

    /// The window is gone; the actor is destroyed once its effects finish.
    pub fn is_destroy_queued(&self) -> bool {
        self.destroy_queued
    }

    pub(crate) fn set_visibility(&mut self, visibility: Visibility) {
        self.visibility = visibility;
    }

    pub(crate) fn set_mapped(&mut self, mapped: bool) {
        self.mapped = mapped;
    }

    pub(crate) fn queue_destroy(&mut self) {
        self.destroy_queued = true;
    }

    pub(crate) fn effect_started(&mut self, id: EffectId, kind: EffectKind) {
        self.effects.push(RunningEffect { id, kind });
    }

    /// Forgets a running effect. Returns its kind if it was known.
    pub(crate) fn effect_ended(&mut self, id: EffectId) -> Option<EffectKind> {
        let index = self.effects.iter().position(|e| e.id == id)?;
        Some(self.effects.remove(index).kind)
    }

    /// Ready to be dropped for good.
    pub fn can_be_destroyed(&self) -> bool {
        self.destroy_queued && !self.effect_in_progress()
    }
}
