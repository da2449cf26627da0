// novade-compositor-stack/src/effects.rs
//! The seam towards the effects/plugin engine.
//!
//! Effects are asynchronous: the compositor asks for one, gets told whether
//! it actually started, and later hears back through
//! [`crate::Compositor::effect_finished`] with the same [`EffectId`]. An
//! effect can be killed early (a window hidden while its map animation is
//! still running); a late completion for a killed effect is ignored.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, info, warn};

use crate::actor::ActorId;
use crate::window::WindowId;
use crate::workspace_switch::{SwitchTracker, WorkspaceSwitch, WorkspaceSwitchToken};

/// Completion handle of one running effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(u64);

impl EffectId {
    pub(crate) const fn from_raw(raw: u64) -> Self {
        EffectId(raw)
    }

    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "effect#{}", self.0)
    }
}

/// What the window manager would like to see when a window changes visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EffectHint {
    #[default]
    None,
    /// Window was just created and mapped.
    Create,
    Unminimize,
    Minimize,
    /// Window is being destroyed.
    Destroy,
}

impl EffectHint {
    /// Effect to run when showing with this hint.
    pub fn show_kind(self) -> Option<EffectKind> {
        match self {
            EffectHint::Create => Some(EffectKind::Map),
            EffectHint::Unminimize => Some(EffectKind::Unminimize),
            EffectHint::None | EffectHint::Minimize | EffectHint::Destroy => None,
        }
    }

    /// Effect to run when hiding with this hint.
    pub fn hide_kind(self) -> Option<EffectKind> {
        match self {
            EffectHint::Minimize => Some(EffectKind::Minimize),
            EffectHint::Destroy => Some(EffectKind::Destroy),
            EffectHint::None | EffectHint::Create | EffectHint::Unminimize => None,
        }
    }
}

/// Kind of a running effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Map,
    Unminimize,
    Minimize,
    Destroy,
}

impl EffectKind {
    /// Effects that animate an actor onto the screen.
    pub fn is_show(&self) -> bool {
        matches!(self, EffectKind::Map | EffectKind::Unminimize)
    }
}

/// A request to animate one actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectRequest {
    pub id: EffectId,
    pub actor: ActorId,
    pub window: WindowId,
    pub kind: EffectKind,
}

/// What the compositor needs from the effects engine.
pub trait EffectsEngine {
    /// Starts a show effect. `true` means it is running and
    /// `effect_finished(request.id)` will follow.
    fn play_show_effect(&mut self, request: &EffectRequest) -> bool;

    /// Starts a hide effect. Same contract as [`Self::play_show_effect`].
    fn play_hide_effect(&mut self, request: &EffectRequest) -> bool;

    /// Aborts a running effect. No completion is expected afterwards.
    fn kill_effect(&mut self, effect: EffectId);

    /// Bookkeeping hook, called once an effect's completion was processed.
    fn effect_finished(&mut self, _effect: EffectId) {}

    /// Offers a workspace switch. Every participant takes a token from
    /// `tracker`; returns how many took part.
    fn switch_workspace(&mut self, switch: &WorkspaceSwitch, tracker: &SwitchTracker) -> usize;
}

/// Answer of a plugin to a workspace switch offer.
#[derive(Debug)]
pub enum SwitchResponse {
    /// The plugin animates the switch and completes the token when done.
    Animating,
    /// The plugin does not care; the token is handed back.
    Declined(WorkspaceSwitchToken),
}

/// A compositor plugin as seen by the [`PluginManager`].
pub trait CompositorPlugin {
    fn name(&self) -> &str;

    fn show_effect(&mut self, _request: &EffectRequest) -> bool {
        false
    }

    fn hide_effect(&mut self, _request: &EffectRequest) -> bool {
        false
    }

    fn kill_effect(&mut self, _effect: EffectId) {}

    fn switch_workspace(
        &mut self,
        _switch: &WorkspaceSwitch,
        token: WorkspaceSwitchToken,
    ) -> SwitchResponse {
        SwitchResponse::Declined(token)
    }
}

/// Fans effect requests out to the registered plugins.
///
/// Show/hide effects go to the first plugin that accepts them; workspace
/// switches are offered to every plugin.
#[derive(Default)]
pub struct PluginManager {
    plugins: Vec<Box<dyn CompositorPlugin>>,
    owners: HashMap<EffectId, usize>,
}

impl fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginManager")
            .field("plugins", &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>())
            .field("running_effects", &self.owners.len())
            .finish()
    }
}

impl PluginManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: Box<dyn CompositorPlugin>) {
        info!(plugin = plugin.name(), "Registered compositor plugin");
        self.plugins.push(plugin);
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    fn dispatch(&mut self, request: &EffectRequest, show: bool) -> bool {
        for (index, plugin) in self.plugins.iter_mut().enumerate() {
            let started = if show {
                plugin.show_effect(request)
            } else {
                plugin.hide_effect(request)
            };
            if started {
                debug!(plugin = plugin.name(), effect = %request.id, kind = ?request.kind, "Effect started");
                self.owners.insert(request.id, index);
                return true;
            }
        }
        false
    }
}

impl EffectsEngine for PluginManager {
    fn play_show_effect(&mut self, request: &EffectRequest) -> bool {
        self.dispatch(request, true)
    }

    fn play_hide_effect(&mut self, request: &EffectRequest) -> bool {
        self.dispatch(request, false)
    }

    fn kill_effect(&mut self, effect: EffectId) {
        if let Some(index) = self.owners.remove(&effect) {
            if let Some(plugin) = self.plugins.get_mut(index) {
                plugin.kill_effect(effect);
            }
        }
    }

    fn effect_finished(&mut self, effect: EffectId) {
        self.owners.remove(&effect);
    }

    fn switch_workspace(&mut self, switch: &WorkspaceSwitch, tracker: &SwitchTracker) -> usize {
        let mut animating = 0;
        for plugin in self.plugins.iter_mut() {
            let Some(token) = tracker.mint() else {
                warn!(plugin = plugin.name(), "Workspace switch offered while none is running");
                break;
            };
            match plugin.switch_workspace(switch, token) {
                SwitchResponse::Animating => {
                    debug!(plugin = plugin.name(), "Plugin animates workspace switch");
                    animating += 1;
                }
                SwitchResponse::Declined(token) => {
                    token.complete();
                }
            }
        }
        animating
    }
}
