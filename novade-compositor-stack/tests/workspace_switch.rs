mod common;

use common::*;
use novade_compositor_stack::{Diagnostic, EffectHint, MotionDirection, RenderNode, StepOutcome};
use pretty_assertions::assert_eq;

fn switchers(count: usize, log: &PluginLog) -> Vec<ScriptedPlugin> {
    (0..count).map(|_| ScriptedPlugin::switcher(log)).collect()
}

fn move_to_other_workspace(c: &mut TestCompositor, raw: u64) {
    if let Some(info) = c.windows_mut().get_mut(w(raw)) {
        info.visible_to_compositor = false;
    }
}

#[test]
fn test_reconciles_once_after_last_plugin() {
    let log = PluginLog::default();
    let mut c = harness(&[1, 2], switchers(3, &log));
    c.switch_workspace(0, 1, MotionDirection::Right);
    assert!(c.is_switching_workspace());

    let tokens = log.take_tokens();
    assert_eq!(tokens.len(), 3);

    let mut outcomes = Vec::new();
    for token in tokens {
        assert_eq!(c.stats().switch_reconciliations, 0);
        outcomes.push(c.switch_step_completed(token));
    }
    assert_eq!(
        outcomes,
        vec![StepOutcome::Pending(2), StepOutcome::Pending(1), StepOutcome::Finished]
    );
    assert_eq!(c.stats().switch_reconciliations, 1);
    assert!(!c.is_switching_workspace());

    c.before_paint();
    assert_eq!(c.stats().switch_reconciliations, 1);
}

#[test]
fn test_extra_completion_is_clamped_and_diagnosed() {
    let log = PluginLog::default();
    let mut c = harness(&[1], switchers(1, &log));
    c.switch_workspace(0, 1, MotionDirection::Left);
    for token in log.take_tokens() {
        c.switch_step_completed(token);
    }

    assert_eq!(c.record_switch_step_completed(), StepOutcome::Underflow);
    assert_eq!(c.switch_tracker().in_progress(), 0);
    assert_eq!(c.stats().switch_reconciliations, 1);
    assert_eq!(c.stats().switch_underflows, 1);
    assert!(c.diagnostics().contains(&Diagnostic::SwitchCounterUnderflow));
}

#[test]
fn test_unanimated_switch_reconciles_immediately() {
    let mut c = harness(&[1, 2], vec![]);
    let b = actor_of(&c, 2);
    move_to_other_workspace(&mut c, 2);

    c.switch_workspace(0, 1, MotionDirection::Down);
    assert!(!c.is_switching_workspace());
    assert_eq!(c.stats().switch_reconciliations, 1);
    assert!(!c.actor(b).unwrap().is_mapped());
    assert!(!c.tree().is_visible(RenderNode::Actor(b)));
}

#[test]
fn test_visibility_is_deferred_until_switch_ends() {
    let log = PluginLog::default();
    let mut c = harness(&[1, 2], switchers(1, &log));
    let (a, b) = (actor_of(&c, 1), actor_of(&c, 2));
    c.switch_workspace(0, 1, MotionDirection::Up);

    move_to_other_workspace(&mut c, 2);
    c.hide_window(w(2), EffectHint::None);
    assert!(c.actor(b).unwrap().is_mapped(), "plugin still shows the old workspace");

    c.sync_stack(&top_first(&[1, 2]));
    assert!(c.is_switching_workspace(), "stacking does not cancel the switch");

    for token in log.take_tokens() {
        c.switch_step_completed(token);
    }
    assert!(!c.actor(b).unwrap().is_mapped());
    assert!(c.actor(a).unwrap().is_mapped());
    assert_render_order(&c);
}

#[test]
fn test_dropped_tokens_finish_at_before_paint() {
    let log = PluginLog::default();
    let mut c = harness(&[1], switchers(2, &log));
    c.switch_workspace(0, 1, MotionDirection::Right);

    drop(log.take_tokens());
    assert_eq!(c.stats().switch_reconciliations, 0);
    c.before_paint();
    assert_eq!(c.stats().switch_reconciliations, 1);
    assert!(!c.is_switching_workspace());
}

#[test]
fn test_new_switch_supersedes_running_one() {
    let log = PluginLog::default();
    let mut c = harness(&[1], switchers(1, &log));
    c.switch_workspace(0, 1, MotionDirection::Right);
    let stale = log.take_tokens();

    c.switch_workspace(1, 2, MotionDirection::Right);
    for token in stale {
        assert_eq!(c.switch_step_completed(token), StepOutcome::Stale);
    }
    assert!(c.is_switching_workspace());
    assert_eq!(c.stats().switch_reconciliations, 0);

    for token in log.take_tokens() {
        assert_eq!(c.switch_step_completed(token), StepOutcome::Finished);
    }
    assert_eq!(c.stats().switch_reconciliations, 1);
    assert_eq!(c.stats().switches_started, 2);
}

#[test]
fn test_cancel_reconciles_and_invalidates_tokens() {
    let log = PluginLog::default();
    let mut c = harness(&[1, 2], switchers(2, &log));
    let b = actor_of(&c, 2);
    c.switch_workspace(0, 1, MotionDirection::Left);
    move_to_other_workspace(&mut c, 2);

    assert!(c.cancel_workspace_switch());
    assert!(!c.cancel_workspace_switch());
    assert_eq!(c.stats().switch_reconciliations, 1);
    assert!(!c.actor(b).unwrap().is_mapped());

    for token in log.take_tokens() {
        assert_eq!(c.switch_step_completed(token), StepOutcome::Stale);
    }
    assert_eq!(c.stats().switch_reconciliations, 1);
}

#[test]
fn test_sync_after_switch_restacks_once() {
    let log = PluginLog::default();
    let mut c = harness(&[1, 2], switchers(1, &log));
    c.sync_stack(&top_first(&[2, 1]));
    c.switch_workspace(0, 1, MotionDirection::Right);
    drop(log.take_tokens());

    let before = c.stats();
    c.sync_stack(&top_first(&[1, 2]));
    let after = c.stats();
    assert_eq!(after.switch_reconciliations, before.switch_reconciliations + 1);
    assert_eq!(
        (after.fast_path_hits + after.restacks) - (before.fast_path_hits + before.restacks),
        1
    );
    assert_eq!(c.top_actor(), Some(actor_of(&c, 1)));
    assert_render_order(&c);
}
