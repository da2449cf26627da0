#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use novade_compositor_stack::{
    ActorId, ClientType, Compositor, CompositorPlugin, EffectHint, EffectId, EffectRequest, PluginManager, Rect,
    RenderGroup, RenderNode, RenderTree, SceneTree, StaticWindowSource, SwitchResponse, WindowId, WindowInfo,
    WorkspaceSwitch, WorkspaceSwitchToken,
};

pub type TestCompositor = Compositor<StaticWindowSource, PluginManager, SceneTree>;

pub const DISPLAY: Rect = Rect { x: 0, y: 0, width: 1920, height: 1080 };

/// What scripted plugins saw, shared with the test.
#[derive(Debug, Default, Clone)]
pub struct PluginLog {
    pub started: Rc<RefCell<Vec<EffectRequest>>>,
    pub killed: Rc<RefCell<Vec<EffectId>>>,
    pub tokens: Rc<RefCell<Vec<WorkspaceSwitchToken>>>,
}

impl PluginLog {
    pub fn last_effect(&self) -> EffectId {
        self.started.borrow().last().map(|r| r.id).expect("no effect was started")
    }

    pub fn take_tokens(&self) -> Vec<WorkspaceSwitchToken> {
        std::mem::take(&mut *self.tokens.borrow_mut())
    }
}

pub struct ScriptedPlugin {
    pub animate_show: bool,
    pub animate_hide: bool,
    pub animate_switch: bool,
    pub log: PluginLog,
}

impl ScriptedPlugin {
    pub fn effects(log: &PluginLog) -> Self {
        Self { animate_show: true, animate_hide: true, animate_switch: false, log: log.clone() }
    }

    pub fn switcher(log: &PluginLog) -> Self {
        Self { animate_show: false, animate_hide: false, animate_switch: true, log: log.clone() }
    }
}

impl CompositorPlugin for ScriptedPlugin {
    fn name(&self) -> &str {
        "scripted"
    }

    fn show_effect(&mut self, request: &EffectRequest) -> bool {
        if self.animate_show {
            self.log.started.borrow_mut().push(*request);
        }
        self.animate_show
    }

    fn hide_effect(&mut self, request: &EffectRequest) -> bool {
        if self.animate_hide {
            self.log.started.borrow_mut().push(*request);
        }
        self.animate_hide
    }

    fn kill_effect(&mut self, effect: EffectId) {
        self.log.killed.borrow_mut().push(effect);
    }

    fn switch_workspace(&mut self, _switch: &WorkspaceSwitch, token: WorkspaceSwitchToken) -> SwitchResponse {
        if !self.animate_switch {
            return SwitchResponse::Declined(token);
        }
        self.log.tokens.borrow_mut().push(token);
        SwitchResponse::Animating
    }
}

pub fn w(raw: u64) -> WindowId {
    WindowId::new(raw)
}

pub fn fullscreen(raw: u64) -> WindowInfo {
    WindowInfo::new(w(raw), DISPLAY)
}

pub fn x11_fullscreen(raw: u64) -> WindowInfo {
    let mut info = fullscreen(raw);
    info.client_type = ClientType::X11;
    info
}

/// A compositor with the given windows added (bottom-to-top) and shown
/// without effects.
pub fn compositor_with(windows: Vec<WindowInfo>, plugins: Vec<ScriptedPlugin>) -> TestCompositor {
    let mut source = StaticWindowSource::new(DISPLAY);
    for info in &windows {
        source.insert(info.clone());
    }
    let mut manager = PluginManager::new();
    for plugin in plugins {
        manager.register(Box::new(plugin));
    }

    let mut compositor = Compositor::new(source, manager, SceneTree::new());
    for info in &windows {
        compositor.window_added(info.id).expect("window actor");
        compositor.show_window(info.id, EffectHint::None);
    }
    compositor
}

pub fn harness(raws: &[u64], plugins: Vec<ScriptedPlugin>) -> TestCompositor {
    compositor_with(raws.iter().map(|raw| fullscreen(*raw)).collect(), plugins)
}

pub fn actor_of(compositor: &TestCompositor, raw: u64) -> ActorId {
    compositor.actor_for_window(w(raw)).expect("window has an actor")
}

/// Top-first window ids, the way the window manager passes them.
pub fn top_first(raws: &[u64]) -> Vec<WindowId> {
    raws.iter().map(|raw| w(*raw)).collect()
}

/// Per group: stacked actors appear in registry order and every background
/// is below every stacked actor.
pub fn assert_render_order(compositor: &TestCompositor) {
    let registry = compositor.registry();
    for group in [RenderGroup::Windows, RenderGroup::TopWindows] {
        let children = compositor.tree().children(group);
        let stacked: Vec<ActorId> = children
            .iter()
            .filter_map(|node| match node {
                RenderNode::Actor(id) if registry.is_stacked(*id) => Some(*id),
                _ => None,
            })
            .collect();
        let expected: Vec<ActorId> = registry
            .order()
            .iter()
            .copied()
            .filter(|id| compositor.tree().group_of(RenderNode::Actor(*id)) == Some(group))
            .collect();
        assert_eq!(stacked, expected, "actor order in {:?}", group);

        let first_actor = children
            .iter()
            .position(|node| matches!(node, RenderNode::Actor(id) if registry.is_stacked(*id)));
        let last_background = children
            .iter()
            .rposition(|node| matches!(node, RenderNode::Background(_)));
        if let (Some(actor), Some(background)) = (first_actor, last_background) {
            assert!(background < actor, "background above a window actor in {:?}", group);
        }
    }
}
