mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::*;
use novade_compositor_stack::{
    Compositor, EffectHint, PluginManager, Rect, SceneTree, StackConfig, StaticWindowSource, TopActorPolicy,
    WindowInfo,
};
use pretty_assertions::assert_eq;

#[test]
fn test_subscribers_follow_top_actor_changes() {
    let mut c = harness(&[1, 2], vec![]);
    let (a, b) = (actor_of(&c, 1), actor_of(&c, 2));
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let subscription = c.subscribe_top_actor(move |top| sink.borrow_mut().push(top));

    c.sync_stack(&top_first(&[1, 2]));
    c.sync_stack(&top_first(&[1, 2]));
    c.sync_stack(&top_first(&[2, 1]));
    assert_eq!(*seen.borrow(), vec![Some(a), Some(b)]);

    c.window_removed(w(2));
    c.windows_mut().remove(w(2));
    assert_eq!(*seen.borrow(), vec![Some(a), Some(b), None]);
    assert_eq!(c.top_actor(), None);

    c.before_paint();
    assert_eq!(*seen.borrow(), vec![Some(a), Some(b), None, Some(a)]);
    assert_eq!(c.top_actor(), Some(a));
    assert!(c.diagnostics().is_empty());

    assert!(c.unsubscribe_top_actor(subscription));
    c.sync_stack(&[]);
    assert_eq!(seen.borrow().len(), 4);
}

#[test]
fn test_partial_window_is_not_top_by_default() {
    let small = WindowInfo::new(w(2), Rect::new(100, 100, 640, 480));
    let mut c = compositor_with(vec![fullscreen(1), small], vec![]);
    c.sync_stack(&top_first(&[2, 1]));
    assert_eq!(c.top_actor(), Some(actor_of(&c, 1)));
}

#[test]
fn test_overlap_policy_from_config() {
    let config = StackConfig::from_toml_str("top_actor = \"overlaps_output\"").unwrap();
    assert_eq!(config.top_actor, TopActorPolicy::OverlapsOutput);

    let mut source = StaticWindowSource::new(DISPLAY);
    source.insert(fullscreen(1));
    source.insert(WindowInfo::new(w(2), Rect::new(100, 100, 640, 480)));
    let mut c = Compositor::with_config(source, PluginManager::new(), SceneTree::new(), &config);
    c.window_added(w(1));
    let small = c.window_added(w(2)).unwrap();
    c.sync_stack(&top_first(&[2, 1]));
    assert_eq!(c.top_actor(), Some(small));
}

#[test]
fn test_window_on_other_workspace_is_not_top() {
    let mut c = harness(&[1, 2], vec![]);
    if let Some(info) = c.windows_mut().get_mut(w(2)) {
        info.visible_to_compositor = false;
    }
    c.sync_stack(&top_first(&[2, 1]));
    assert_eq!(c.top_actor(), Some(actor_of(&c, 1)));
}

#[test]
fn test_minimized_top_window_is_not_top() {
    let log = PluginLog::default();
    let mut c = harness(&[1, 2], vec![ScriptedPlugin::effects(&log)]);
    let (a, b) = (actor_of(&c, 1), actor_of(&c, 2));
    c.sync_stack(&top_first(&[2, 1]));
    assert_eq!(c.top_actor(), Some(b));

    if let Some(info) = c.windows_mut().get_mut(w(2)) {
        info.hidden = true;
    }
    c.hide_window(w(2), EffectHint::Minimize);
    c.sync_stack(&top_first(&[1]));
    assert!(c.actor(b).unwrap().is_mapped(), "minimize effect still running");
    assert_eq!(c.registry().order(), &[a, b]);
    assert_eq!(c.top_actor(), Some(a));
}

#[test]
fn test_unredirect_candidate() {
    let mut c = compositor_with(vec![fullscreen(1), x11_fullscreen(2)], vec![]);
    let x11 = actor_of(&c, 2);
    c.sync_stack(&top_first(&[2, 1]));
    assert_eq!(c.unredirect_candidate(), Some(x11));

    c.disable_unredirect();
    c.disable_unredirect();
    assert!(c.is_unredirect_inhibited());
    assert_eq!(c.unredirect_candidate(), None);
    c.enable_unredirect();
    assert_eq!(c.unredirect_candidate(), None);
    c.enable_unredirect();
    assert_eq!(c.unredirect_candidate(), Some(x11));

    c.sync_stack(&top_first(&[1, 2]));
    assert_eq!(c.unredirect_candidate(), None, "wayland actors are never unredirected");
}

#[test]
fn test_hidden_top_actor_is_not_unredirected() {
    let mut c = compositor_with(vec![x11_fullscreen(1)], vec![]);
    c.sync_stack(&top_first(&[1]));
    c.hide_window(w(1), EffectHint::None);
    assert_eq!(c.unredirect_candidate(), None);
}
