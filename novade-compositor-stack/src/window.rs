// novade-compositor-stack/src/window.rs
//! The window manager's side of the boundary.
//!
//! Windows belong to the window-manager core. This crate only refers to them
//! by [`WindowId`] and reads their current attributes through a
//! [`WindowSource`] whenever it needs them; it never caches or mutates them.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Opaque identity of a logical window, assigned by the window manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId(u64);

impl WindowId {
    pub const fn new(raw: u64) -> Self {
        WindowId(raw)
    }

    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Which protocol the window's client speaks. Selects the actor backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ClientType {
    X11,
    #[default]
    Wayland,
}

/// Stacking layer as far as the compositor cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WindowLayer {
    #[default]
    Normal,
    /// Popups and menus; rendered in the always-on-top group.
    OverrideRedirect,
}

/// Snapshot of the attributes this crate reads from a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub id: WindowId,
    pub client_type: ClientType,
    pub layer: WindowLayer,
    /// Minimized, or otherwise not wanted on screen by the window manager.
    pub hidden: bool,
    /// The window manager is tearing the window down.
    pub unmanaging: bool,
    /// On the active workspace and meant to be drawn.
    pub visible_to_compositor: bool,
    /// Buffer rectangle in stage coordinates.
    pub buffer_rect: Rect,
}

impl WindowInfo {
    /// A mapped, normal-layer window with the given buffer rectangle.
    pub fn new(id: WindowId, buffer_rect: Rect) -> Self {
        Self {
            id,
            client_type: ClientType::default(),
            layer: WindowLayer::default(),
            hidden: false,
            unmanaging: false,
            visible_to_compositor: true,
            buffer_rect,
        }
    }

    /// Hidden or on its way out; such a window only stays stacked while an
    /// effect is still animating it.
    pub fn is_going_away(&self) -> bool {
        self.hidden || self.unmanaging
    }
}

/// Read access to window-manager state.
pub trait WindowSource {
    /// Current attributes of `window`, or `None` when the window manager has
    /// already forgotten it.
    fn window_info(&self, window: WindowId) -> Option<WindowInfo>;

    /// Visible rectangle of the output the stack is presented on.
    fn display_rect(&self) -> Rect;
}

/// A [`WindowSource`] backed by a plain map.
///
/// Used by tests and by embedders that mirror window state into the
/// compositor instead of exposing the window manager directly.
#[derive(Debug, Clone, Default)]
pub struct StaticWindowSource {
    windows: HashMap<WindowId, WindowInfo>,
    display: Rect,
}

impl StaticWindowSource {
    pub fn new(display: Rect) -> Self {
        Self {
            windows: HashMap::new(),
            display,
        }
    }

    /// Inserts or replaces a window.
    pub fn insert(&mut self, info: WindowInfo) {
        self.windows.insert(info.id, info);
    }

    pub fn remove(&mut self, window: WindowId) -> Option<WindowInfo> {
        self.windows.remove(&window)
    }

    pub fn get_mut(&mut self, window: WindowId) -> Option<&mut WindowInfo> {
        self.windows.get_mut(&window)
    }

    pub fn set_display_rect(&mut self, display: Rect) {
        self.display = display;
    }
}

impl WindowSource for StaticWindowSource {
    fn window_info(&self, window: WindowId) -> Option<WindowInfo> {
        self.windows.get(&window).cloned()
    }

    fn display_rect(&self) -> Rect {
        self.display
    }
}
