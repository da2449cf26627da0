// novade-compositor-stack/src/compositor.rs
//! The compositor context: one owner for every piece of stacking state.
//!
//! [`Compositor`] is what the window manager core talks to. It owns the
//! [`ActorRegistry`], the render tree, the effects engine and the trackers,
//! and runs everything on the calling (compositor) thread. Work that cannot
//! be done right away (a resync after a hide, a switch that finished because
//! a plugin dropped its token) is queued and flushed by
//! [`Compositor::before_paint`], so nothing is deferred across frames.

use tracing::{debug, info, warn};

use crate::actor::{ActorId, ActorLayer, WindowActor};
use crate::config::StackConfig;
use crate::diagnostics::{Diagnostic, DiagnosticsLog};
use crate::effects::{EffectHint, EffectId, EffectsEngine};
use crate::registry::ActorRegistry;
use crate::render_order::{RenderNode, RenderOrderEnforcer, RenderTree, RestackOutcome};
use crate::stack_sync::StackSynchronizer;
use crate::top_actor::{SubscriptionId, TopActorTracker};
use crate::unredirect::UnredirectInhibitor;
use crate::visibility::{EffectCompletion, VisibilityCoordinator};
use crate::window::{WindowId, WindowSource};
use crate::workspace_switch::{
    MotionDirection, StepOutcome, SwitchTracker, WorkspaceIndex, WorkspaceSwitch, WorkspaceSwitchToken,
};

/// Counters for tests and developer tooling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompositorStats {
    /// Stack merges, whether requested by the window manager or queued.
    pub stack_syncs: u64,
    /// Enforcement passes that had to reorder the render tree.
    pub restacks: u64,
    /// Enforcement passes that found the tree already in order.
    pub fast_path_hits: u64,
    /// Render tree moves over all restacks.
    pub restack_moves: u64,
    pub switches_started: u64,
    /// Visibility reconciliations at the end of a switch.
    pub switch_reconciliations: u64,
    pub switch_underflows: u64,
    pub actors_destroyed: u64,
}

pub struct Compositor<W, E, T> {
    windows: W,
    effects: E,
    tree: T,
    registry: ActorRegistry,
    visibility: VisibilityCoordinator,
    top_actor: TopActorTracker,
    unredirect: UnredirectInhibitor,
    diagnostics: DiagnosticsLog,
    stats: CompositorStats,
    /// Last logical order from the window manager, topmost first.
    last_order: Vec<WindowId>,
    resync_queued: bool,
}

impl<W, E, T> Compositor<W, E, T>
where
    W: WindowSource,
    E: EffectsEngine,
    T: RenderTree,
{
    pub fn new(windows: W, effects: E, tree: T) -> Self {
        Self::with_config(windows, effects, tree, &StackConfig::default())
    }

    pub fn with_config(windows: W, effects: E, tree: T, config: &StackConfig) -> Self {
        info!(top_actor = ?config.top_actor, "Creating compositor stacking context");
        Self {
            windows,
            effects,
            tree,
            registry: ActorRegistry::new(),
            visibility: VisibilityCoordinator::new(),
            top_actor: TopActorTracker::new(config.top_actor),
            unredirect: UnredirectInhibitor::new(),
            diagnostics: DiagnosticsLog::with_capacity(config.diagnostics_capacity),
            stats: CompositorStats::default(),
            last_order: Vec::new(),
            resync_queued: false,
        }
    }

    pub fn windows(&self) -> &W {
        &self.windows
    }

    /// Window manager state. Changes become visible to the compositor at the
    /// next operation that reads them.
    pub fn windows_mut(&mut self) -> &mut W {
        &mut self.windows
    }

    pub fn effects(&self) -> &E {
        &self.effects
    }

    pub fn effects_mut(&mut self) -> &mut E {
        &mut self.effects
    }

    pub fn tree(&self) -> &T {
        &self.tree
    }

    /// The render tree, e.g. to parent background nodes. Misplaced nodes are
    /// put back in order by the next stacking pass.
    pub fn tree_mut(&mut self) -> &mut T {
        &mut self.tree
    }

    pub fn registry(&self) -> &ActorRegistry {
        &self.registry
    }

    pub fn actor(&self, actor: ActorId) -> Option<&WindowActor> {
        self.registry.get(actor)
    }

    pub fn actor_for_window(&self, window: WindowId) -> Option<ActorId> {
        self.registry.lookup(window)
    }

    fn record(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.record(diagnostic);
    }

    /// Creates the actor for a window the window manager just started
    /// managing. The actor starts out hidden; `show_window` maps it.
    pub fn window_added(&mut self, window: WindowId) -> Option<ActorId> {
        self.flush_switch();

        let Some(info) = self.windows.window_info(window) else {
            warn!(window = %window, "Window added but unknown to the window manager");
            self.record(Diagnostic::MissingWindowInfo { window });
            return None;
        };

        match self.registry.add(&info) {
            Ok(actor) => {
                let group = ActorLayer::for_window_layer(info.layer).render_group();
                let node = RenderNode::Actor(actor);
                self.tree.add_child(group, node);
                self.tree.set_visible(node, false);
                self.enforce_order();
                Some(actor)
            }
            Err(e) => {
                warn!(window = %window, error = %e, "Ignoring window_added");
                self.record(Diagnostic::DuplicateActor { window });
                None
            }
        }
    }

    /// The window is gone. Its actor plays the destroy effect if a plugin
    /// animates one and is destroyed afterwards.
    pub fn window_removed(&mut self, window: WindowId) {
        self.flush_switch();
        // The replay at `before_paint` must not name a window that is gone.
        self.last_order.retain(|w| *w != window);

        let Some(actor) = self.registry.lookup(window) else {
            debug!(window = %window, "Window removed without an actor");
            self.record(Diagnostic::UnknownWindow { window });
            return;
        };
        if let Some(window_actor) = self.registry.get_mut(actor) {
            window_actor.queue_destroy();
        }

        if let Err(e) = self.visibility.hide(
            &mut self.registry,
            &mut self.effects,
            &mut self.tree,
            actor,
            EffectHint::Destroy,
        ) {
            warn!(actor = %actor, error = %e, "Failed to hide removed window");
        }

        if self.registry.get(actor).map(|a| a.can_be_destroyed()).unwrap_or(false) {
            self.destroy_actor(actor);
        }
        self.resync_queued = true;
    }

    /// Applies a new logical stacking order, topmost window first.
    ///
    /// Performs exactly one render order pass and recomputes the top actor.
    pub fn sync_stack(&mut self, order: &[WindowId]) {
        self.drain_switch_signals(false);
        self.resync_queued = false;
        self.apply_order(order.to_vec());
    }

    fn apply_order(&mut self, order: Vec<WindowId>) {
        let merge = StackSynchronizer::merge(&self.registry, &self.windows, &order);
        for window in &merge.unknown_windows {
            self.record(Diagnostic::UnknownWindowInStack { window: *window });
        }
        self.registry.replace_order(merge.order);

        for actor in merge.released {
            if self.registry.get(actor).map(|a| a.can_be_destroyed()).unwrap_or(false) {
                self.destroy_actor(actor);
            } else {
                debug!(actor = %actor, "Actor left the stacking order");
            }
        }

        self.last_order = order;
        self.stats.stack_syncs += 1;
        self.enforce_order();
        self.top_actor.update(&self.registry, &self.windows);
    }

    fn enforce_order(&mut self) {
        match RenderOrderEnforcer::enforce(&self.registry, &mut self.tree) {
            RestackOutcome::AlreadyConsistent => self.stats.fast_path_hits += 1,
            RestackOutcome::Restacked { moves } => {
                self.stats.restacks += 1;
                self.stats.restack_moves += moves as u64;
            }
        }
    }

    fn destroy_actor(&mut self, actor: ActorId) {
        if self.registry.remove(actor).is_none() {
            return;
        }
        self.tree.remove_child(RenderNode::Actor(actor));
        self.stats.actors_destroyed += 1;
        if self.top_actor.actor_destroyed(actor) {
            self.resync_queued = true;
        }
    }

    /// Shows the window's actor, replaying the effect `hint` asks for.
    pub fn show_window(&mut self, window: WindowId, hint: EffectHint) {
        self.flush_switch();
        let Some(actor) = self.lookup_for_request(window) else {
            return;
        };
        if let Err(e) = self
            .visibility
            .show(&mut self.registry, &mut self.effects, &mut self.tree, actor, hint)
        {
            warn!(window = %window, error = %e, "Failed to show window");
        }
    }

    /// Hides the window's actor and queues a stacking resync.
    pub fn hide_window(&mut self, window: WindowId, hint: EffectHint) {
        self.flush_switch();
        let Some(actor) = self.lookup_for_request(window) else {
            return;
        };
        match self
            .visibility
            .hide(&mut self.registry, &mut self.effects, &mut self.tree, actor, hint)
        {
            Ok(true) => self.resync_queued = true,
            Ok(false) => debug!(window = %window, "Window already hidden"),
            Err(e) => warn!(window = %window, error = %e, "Failed to hide window"),
        }
    }

    fn lookup_for_request(&mut self, window: WindowId) -> Option<ActorId> {
        let actor = self.registry.lookup(window);
        if actor.is_none() {
            warn!(window = %window, "No window actor for window");
            self.record(Diagnostic::UnknownWindow { window });
        }
        actor
    }

    /// Processes the completion of an effect started by this compositor.
    pub fn effect_finished(&mut self, effect: EffectId) {
        self.flush_switch();
        match self
            .visibility
            .effect_finished(&mut self.registry, &mut self.effects, &mut self.tree, effect)
        {
            EffectCompletion::Stale => self.record(Diagnostic::StaleEffect { effect }),
            EffectCompletion::Finished { actor, destroy_ready, .. } => {
                if destroy_ready {
                    self.destroy_actor(actor);
                }
                self.resync_queued = true;
            }
        }
    }

    /// Starts a workspace switch. Without a plugin animating it, the switch
    /// finishes before this returns.
    pub fn switch_workspace(&mut self, from: WorkspaceIndex, to: WorkspaceIndex, direction: MotionDirection) {
        self.flush_switch();
        self.stats.switches_started += 1;
        let switch = WorkspaceSwitch { from, to, direction };
        self.visibility.begin_switch(&mut self.effects, &switch);
        self.flush_switch();
    }

    /// Completes one plugin's share of the running switch.
    pub fn switch_step_completed(&mut self, token: WorkspaceSwitchToken) -> StepOutcome {
        let outcome = token.complete();
        self.flush_switch();
        outcome
    }

    /// Completion without a token, for plugins driven through the tracker.
    pub fn record_switch_step_completed(&mut self) -> StepOutcome {
        let outcome = self.visibility.record_step_completed();
        self.flush_switch();
        outcome
    }

    /// Abandons the running switch and reconciles right away. Outstanding
    /// tokens become no-ops.
    pub fn cancel_workspace_switch(&mut self) -> bool {
        if !self.visibility.cancel_switch() {
            return false;
        }
        info!("Workspace switch cancelled");
        self.finish_switch(true);
        true
    }

    pub fn is_switching_workspace(&self) -> bool {
        self.visibility.is_switching()
    }

    pub fn switch_tracker(&self) -> &SwitchTracker {
        self.visibility.switch_tracker()
    }

    fn flush_switch(&mut self) {
        self.drain_switch_signals(true);
    }

    /// Records underflows and reconciles a finished switch. Without
    /// `restack` the caller owes the render order pass and the top actor
    /// update.
    fn drain_switch_signals(&mut self, restack: bool) {
        let signals = self.visibility.take_switch_signals();
        for _ in 0..signals.underflows {
            self.record(Diagnostic::SwitchCounterUnderflow);
        }
        self.stats.switch_underflows += u64::from(signals.underflows);
        if signals.finished {
            self.finish_switch(restack);
        }
    }

    fn finish_switch(&mut self, restack: bool) {
        self.stats.switch_reconciliations += 1;
        self.visibility
            .reconcile_all(&mut self.registry, &self.windows, &mut self.tree);

        let ready: Vec<ActorId> = self
            .registry
            .actor_ids()
            .into_iter()
            .filter(|id| self.registry.get(*id).map(|a| a.can_be_destroyed()).unwrap_or(false))
            .collect();
        for actor in ready {
            self.destroy_actor(actor);
        }

        if restack {
            self.enforce_order();
            self.top_actor.update(&self.registry, &self.windows);
        }
        debug!("Workspace switch finished");
    }

    /// Frame hook: flushes queued work before the next frame is painted.
    pub fn before_paint(&mut self) {
        self.flush_switch();
        if self.resync_queued {
            self.resync_queued = false;
            let order = self.last_order.clone();
            self.apply_order(order);
        }
    }

    /// Topmost actor that fills the output, if any.
    pub fn top_actor(&self) -> Option<ActorId> {
        self.top_actor.get(&self.registry, &self.windows)
    }

    pub fn subscribe_top_actor<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(Option<ActorId>) + 'static,
    {
        self.top_actor.subscribe(Box::new(callback))
    }

    pub fn unsubscribe_top_actor(&mut self, id: SubscriptionId) -> bool {
        self.top_actor.unsubscribe(id)
    }

    /// Stacked actors, topmost first.
    pub fn window_actors(&self) -> Vec<ActorId> {
        self.registry.iter_top_down().map(|a| a.id()).collect()
    }

    pub fn disable_unredirect(&mut self) {
        self.unredirect.disable();
    }

    pub fn enable_unredirect(&mut self) {
        if !self.unredirect.enable() {
            self.record(Diagnostic::UnbalancedUnredirect);
        }
    }

    pub fn is_unredirect_inhibited(&self) -> bool {
        self.unredirect.is_inhibited()
    }

    /// The actor that may bypass compositing right now.
    pub fn unredirect_candidate(&self) -> Option<ActorId> {
        let top = self.top_actor().and_then(|id| self.registry.get(id));
        self.unredirect.candidate(top)
    }

    pub fn diagnostics(&self) -> &DiagnosticsLog {
        &self.diagnostics
    }

    pub fn stats(&self) -> CompositorStats {
        self.stats
    }
}
