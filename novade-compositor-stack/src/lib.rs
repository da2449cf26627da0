//! # NovaDE Compositor Stacking (`novade-compositor-stack`)
//!
//! Keeps the rendering order and show/hide state of window actors (the
//! compositor's visual proxies of windows) in step with the window manager,
//! while plugins animate windows in and out.
//!
//! ## Components
//!
//! - **[`ActorRegistry`]**: owns the window actors and their bottom-to-top order.
//! - **[`StackSynchronizer`]**: merges the window manager's logical stacking
//!   order into the actor order, keeping actors that are still animating out
//!   in their old slot.
//! - **[`RenderOrderEnforcer`]**: brings a [`RenderTree`] in line with the
//!   registry, backgrounds at the bottom, touching nothing when it already is.
//! - **[`VisibilityCoordinator`]**: show/hide transitions and workspace switch
//!   accounting through [`WorkspaceSwitchToken`]s.
//! - **[`TopActorTracker`]**: the topmost actor that fills the output.
//! - **[`Compositor`]**: the single owner of all of the above, driven by the
//!   window manager core and the effects engine.
//!
//! Everything runs on the compositor thread. Protocol inconsistencies (an
//! unknown window in the stacking order, a second `window_added`) are logged,
//! recorded as [`Diagnostic`]s and otherwise ignored.
//!
//! ## Usage
//!
//! ```
//! use novade_compositor_stack::{
//!     Compositor, EffectHint, PluginManager, Rect, SceneTree, StaticWindowSource, WindowId, WindowInfo,
//! };
//!
//! let mut windows = StaticWindowSource::new(Rect::from_size(1920, 1080));
//! windows.insert(WindowInfo::new(WindowId::new(1), Rect::from_size(1920, 1080)));
//!
//! let mut compositor = Compositor::new(windows, PluginManager::new(), SceneTree::new());
//! let actor = compositor.window_added(WindowId::new(1)).unwrap();
//! compositor.show_window(WindowId::new(1), EffectHint::Create);
//! compositor.sync_stack(&[WindowId::new(1)]);
//! assert_eq!(compositor.top_actor(), Some(actor));
//! ```

pub mod actor;
pub mod compositor;
pub mod config;
pub mod diagnostics;
pub mod effects;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod registry;
pub mod render_order;
pub mod stack_sync;
pub mod top_actor;
pub mod unredirect;
pub mod visibility;
pub mod window;
pub mod workspace_switch;

pub use actor::{ActorBackend, ActorId, ActorLayer, Visibility, WindowActor};
pub use compositor::{Compositor, CompositorStats};
pub use config::{LoggingConfig, StackConfig};
pub use diagnostics::{Diagnostic, DiagnosticsLog};
pub use effects::{
    CompositorPlugin, EffectHint, EffectId, EffectKind, EffectRequest, EffectsEngine, PluginManager, SwitchResponse,
};
pub use error::{ConfigError, Result, StackError};
pub use geometry::Rect;
pub use logging::{init_logging, init_minimal_logging};
pub use registry::ActorRegistry;
pub use render_order::{BackgroundId, RenderGroup, RenderNode, RenderOrderEnforcer, RenderTree, RestackOutcome, SceneTree};
pub use stack_sync::{StackMerge, StackSynchronizer};
pub use top_actor::{SubscriptionId, TopActorPolicy, TopActorTracker};
pub use unredirect::UnredirectInhibitor;
pub use visibility::{EffectCompletion, VisibilityCoordinator};
pub use window::{ClientType, StaticWindowSource, WindowId, WindowInfo, WindowLayer, WindowSource};
pub use workspace_switch::{
    MotionDirection, StepOutcome, SwitchTracker, WorkspaceIndex, WorkspaceSwitch, WorkspaceSwitchToken,
};
