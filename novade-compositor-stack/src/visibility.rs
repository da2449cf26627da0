// novade-compositor-stack/src/visibility.rs
//! Show/hide transitions of window actors.
//!
//! The coordinator decides when an actor is mapped (its render node shown)
//! relative to the effects that animate it:
//!
//! * showing maps immediately and lets a show effect animate in;
//! * hiding kills a running show effect and plays the hide effect; the actor
//!   stays mapped until that effect finishes, or is unmapped right away when
//!   nothing animates it.
//!
//! While a workspace switch is animating, plugins own the look of the screen:
//! show and hide only record the desired state, and the rendered state is
//! reconciled for every actor at once when the switch finishes.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::actor::{ActorId, Visibility, WindowActor};
use crate::effects::{EffectHint, EffectId, EffectKind, EffectRequest, EffectsEngine};
use crate::error::{Result, StackError};
use crate::registry::ActorRegistry;
use crate::render_order::{RenderNode, RenderTree};
use crate::window::WindowSource;
use crate::workspace_switch::{StepOutcome, SwitchTracker, WorkspaceSwitch};

/// What a completion reported through `effect_finished` amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectCompletion {
    /// The effect was killed, already finished, or never started.
    Stale,
    Finished {
        actor: ActorId,
        kind: EffectKind,
        /// The actor's window is gone and nothing animates it any more.
        destroy_ready: bool,
    },
}

/// State of the workspace switch after draining its signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SwitchSignals {
    pub finished: bool,
    pub underflows: u32,
}

#[derive(Debug, Default)]
pub struct VisibilityCoordinator {
    next_effect: u64,
    running: HashMap<EffectId, ActorId>,
    switch: SwitchTracker,
}

fn set_mapped<T>(actor: &mut WindowActor, tree: &mut T, mapped: bool)
where
    T: RenderTree + ?Sized,
{
    if actor.is_mapped() != mapped {
        actor.set_mapped(mapped);
        tree.set_visible(RenderNode::Actor(actor.id()), mapped);
    }
}

impl VisibilityCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn switch_tracker(&self) -> &SwitchTracker {
        &self.switch
    }

    pub fn is_switching(&self) -> bool {
        self.switch.is_switching()
    }

    /// Effects started and not yet finished or killed.
    pub fn running_effects(&self) -> usize {
        self.running.len()
    }

    fn start_effect<E>(&mut self, actor: &mut WindowActor, engine: &mut E, kind: EffectKind) -> bool
    where
        E: EffectsEngine + ?Sized,
    {
        self.next_effect += 1;
        let request = EffectRequest {
            id: EffectId::from_raw(self.next_effect),
            actor: actor.id(),
            window: actor.window(),
            kind,
        };
        let started = if kind.is_show() {
            engine.play_show_effect(&request)
        } else {
            engine.play_hide_effect(&request)
        };
        if started {
            actor.effect_started(request.id, kind);
            self.running.insert(request.id, actor.id());
        } else {
            trace!(actor = %actor.id(), ?kind, "No plugin animates effect");
        }
        started
    }

    /// Makes `actor` visible.
    pub fn show<E, T>(
        &mut self,
        registry: &mut ActorRegistry,
        engine: &mut E,
        tree: &mut T,
        actor: ActorId,
        hint: EffectHint,
    ) -> Result<()>
    where
        E: EffectsEngine + ?Sized,
        T: RenderTree + ?Sized,
    {
        let window_actor = registry.get_mut(actor).ok_or(StackError::UnknownActor(actor))?;
        window_actor.set_visibility(Visibility::Visible);

        if self.is_switching() {
            debug!(actor = %actor, "Deferring show until the workspace switch finishes");
            return Ok(());
        }

        set_mapped(window_actor, tree, true);
        if let Some(kind) = hint.show_kind() {
            self.start_effect(window_actor, engine, kind);
        }
        Ok(())
    }

    /// Makes `actor` invisible. Returns `false` if it already was, in which
    /// case nothing happened.
    pub fn hide<E, T>(
        &mut self,
        registry: &mut ActorRegistry,
        engine: &mut E,
        tree: &mut T,
        actor: ActorId,
        hint: EffectHint,
    ) -> Result<bool>
    where
        E: EffectsEngine + ?Sized,
        T: RenderTree + ?Sized,
    {
        let window_actor = registry.get_mut(actor).ok_or(StackError::UnknownActor(actor))?;
        if !window_actor.is_visible() {
            return Ok(false);
        }
        window_actor.set_visibility(Visibility::NotVisible);

        if self.is_switching() {
            debug!(actor = %actor, "Deferring hide until the workspace switch finishes");
            return Ok(true);
        }

        for kind in [EffectKind::Map, EffectKind::Unminimize] {
            for effect in window_actor.effects_of_kind(kind) {
                debug!(actor = %actor, effect = %effect, "Killing show effect of hidden actor");
                engine.kill_effect(effect);
                window_actor.effect_ended(effect);
                self.running.remove(&effect);
            }
        }

        let animating = match hint.hide_kind() {
            Some(kind) => self.start_effect(window_actor, engine, kind),
            None => false,
        };
        if !animating {
            set_mapped(window_actor, tree, false);
        }
        Ok(true)
    }

    /// Processes the completion of `effect`.
    pub fn effect_finished<E, T>(
        &mut self,
        registry: &mut ActorRegistry,
        engine: &mut E,
        tree: &mut T,
        effect: EffectId,
    ) -> EffectCompletion
    where
        E: EffectsEngine + ?Sized,
        T: RenderTree + ?Sized,
    {
        let Some(actor) = self.running.remove(&effect) else {
            debug!(effect = %effect, "Ignoring completion of unknown effect");
            return EffectCompletion::Stale;
        };
        engine.effect_finished(effect);

        let Some(window_actor) = registry.get_mut(actor) else {
            debug!(effect = %effect, actor = %actor, "Effect finished for an actor that is gone");
            return EffectCompletion::Stale;
        };
        let Some(kind) = window_actor.effect_ended(effect) else {
            return EffectCompletion::Stale;
        };

        if !kind.is_show() && !window_actor.is_visible() && !window_actor.effect_in_progress() {
            set_mapped(window_actor, tree, false);
        }
        debug!(effect = %effect, actor = %actor, ?kind, "Effect finished");
        EffectCompletion::Finished {
            actor,
            kind,
            destroy_ready: window_actor.can_be_destroyed(),
        }
    }

    /// Offers `switch` to the effects engine. Whether it already finished
    /// (nobody animates it) shows up in the next [`Self::take_switch_signals`].
    pub fn begin_switch<E>(&mut self, engine: &mut E, switch: &WorkspaceSwitch) -> usize
    where
        E: EffectsEngine + ?Sized,
    {
        self.switch.begin();
        let animating = engine.switch_workspace(switch, &self.switch);
        let outcome = self.switch.release_hold();
        debug!(
            from = switch.from,
            to = switch.to,
            animating,
            ?outcome,
            "Workspace switch offered to plugins"
        );
        animating
    }

    /// Untracked completion of one switch step.
    pub fn record_step_completed(&self) -> StepOutcome {
        self.switch.record_step_completed()
    }

    /// Drops the in-flight switch. Returns `true` if there was one.
    pub fn cancel_switch(&mut self) -> bool {
        self.switch.discard()
    }

    pub fn take_switch_signals(&self) -> SwitchSignals {
        SwitchSignals {
            underflows: self.switch.take_underflows(),
            finished: self.switch.take_finish_pending(),
        }
    }

    /// Brings every actor's visibility in line with what the window manager
    /// currently shows. Returns how many actors changed.
    ///
    /// Actors still running a hide effect stay mapped until it ends.
    pub fn reconcile_all<W, T>(&mut self, registry: &mut ActorRegistry, windows: &W, tree: &mut T) -> usize
    where
        W: WindowSource + ?Sized,
        T: RenderTree + ?Sized,
    {
        let mut changed = 0;
        for id in registry.actor_ids() {
            let Some(actor) = registry.get_mut(id) else {
                continue;
            };
            let visible = windows
                .window_info(actor.window())
                .map(|info| info.visible_to_compositor && !info.is_going_away())
                .unwrap_or(false);
            let visibility = if visible {
                Visibility::Visible
            } else {
                Visibility::NotVisible
            };
            let hiding = actor.has_effect(EffectKind::Minimize) || actor.has_effect(EffectKind::Destroy);
            let mapped = visible || hiding;

            if actor.visibility() != visibility || actor.is_mapped() != mapped {
                changed += 1;
            }
            actor.set_visibility(visibility);
            set_mapped(actor, tree, mapped);
        }
        debug!(changed, "Reconciled actor visibility");
        changed
    }
}
