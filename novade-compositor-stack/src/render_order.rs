// novade-compositor-stack/src/render_order.rs
//! Keeping the render tree in registry order.
//!
//! Restacking render nodes damages the whole output, so the enforcer first
//! checks whether anything is actually out of place and only then reorders.
//! Reordering lowers every stacked actor to the bottom of its group, from
//! the top of the registry down, and finally lowers the backgrounds so they
//! end up beneath everything. That is one move per node no matter how
//! scrambled the tree was.
//!
//! Nodes the registry does not know about (plugin decorations, actors of
//! unstacked windows) are tolerated and left where the moves leave them.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::{debug, trace};

use crate::actor::ActorId;
use crate::registry::ActorRegistry;

/// Rendering groups, painted in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderGroup {
    /// Normal windows and backgrounds.
    Windows,
    /// Override-redirect windows.
    TopWindows,
}

impl RenderGroup {
    pub const ALL: [RenderGroup; 2] = [RenderGroup::Windows, RenderGroup::TopWindows];
}

/// Identity of a background (wallpaper/backdrop) node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BackgroundId(u64);

impl BackgroundId {
    pub const fn new(raw: u64) -> Self {
        BackgroundId(raw)
    }
}

impl fmt::Display for BackgroundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "background#{}", self.0)
    }
}

/// A child of a render group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderNode {
    Actor(ActorId),
    Background(BackgroundId),
    /// Anything else parented to a group by someone else.
    Foreign(u64),
}

/// Operations the enforcer needs from the scene graph.
pub trait RenderTree {
    /// Children of `group`, bottom-to-top.
    fn children(&self, group: RenderGroup) -> Vec<RenderNode>;

    /// Group `node` is parented to, if any.
    fn group_of(&self, node: RenderNode) -> Option<RenderGroup>;

    /// Parents `node` to `group`, above its current children.
    fn add_child(&mut self, group: RenderGroup, node: RenderNode);

    fn remove_child(&mut self, node: RenderNode);

    /// Moves `node` below all of its siblings.
    fn lower_to_bottom(&mut self, node: RenderNode);

    fn set_visible(&mut self, node: RenderNode, visible: bool);
}

/// Result of one enforcement pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestackOutcome {
    /// Nothing was out of place; the tree was not touched.
    AlreadyConsistent,
    /// The tree was reordered with this many moves.
    Restacked { moves: usize },
}

#[derive(Debug, Default)]
struct Scan {
    reordered: bool,
    backgrounds: Vec<RenderNode>,
}

/// Makes render groups follow the registry order.
#[derive(Debug, Default, Clone, Copy)]
pub struct RenderOrderEnforcer;

impl RenderOrderEnforcer {
    fn scan<T>(registry: &ActorRegistry, tree: &T) -> Scan
    where
        T: RenderTree + ?Sized,
    {
        let stacked: HashSet<ActorId> = registry.order().iter().copied().collect();
        let mut scan = Scan::default();

        for group in RenderGroup::ALL {
            let expected: Vec<ActorId> = registry
                .order()
                .iter()
                .copied()
                .filter(|id| tree.group_of(RenderNode::Actor(*id)) == Some(group))
                .collect();
            let mut next_expected = 0;
            let mut has_windows = false;

            for node in tree.children(group) {
                match node {
                    RenderNode::Background(_) => {
                        scan.backgrounds.push(node);
                        if has_windows {
                            trace!(?group, "Background above a window actor");
                            scan.reordered = true;
                        }
                    }
                    RenderNode::Actor(id) if stacked.contains(&id) && !scan.reordered => {
                        has_windows = true;
                        if expected.get(next_expected) == Some(&id) {
                            next_expected += 1;
                        } else {
                            trace!(?group, actor = %id, "Window actor out of order");
                            scan.reordered = true;
                        }
                    }
                    _ => {}
                }
            }

            if next_expected != expected.len() {
                scan.reordered = true;
            }
        }
        scan
    }

    /// True when the tree already matches the registry.
    pub fn is_consistent<T>(registry: &ActorRegistry, tree: &T) -> bool
    where
        T: RenderTree + ?Sized,
    {
        !Self::scan(registry, tree).reordered
    }

    /// Reconciles `tree` with the registry order.
    pub fn enforce<T>(registry: &ActorRegistry, tree: &mut T) -> RestackOutcome
    where
        T: RenderTree + ?Sized,
    {
        let scan = Self::scan(registry, tree);
        if !scan.reordered {
            trace!("Render tree already in stacking order");
            return RestackOutcome::AlreadyConsistent;
        }

        let mut moves = 0;
        for id in registry.order().iter().rev() {
            tree.lower_to_bottom(RenderNode::Actor(*id));
            moves += 1;
        }
        // Collected bottom-to-top; the lowest one has to be lowered last.
        for background in scan.backgrounds.iter().rev() {
            tree.lower_to_bottom(*background);
            moves += 1;
        }

        debug!(moves, "Restacked render tree");
        RestackOutcome::Restacked { moves }
    }
}

/// In-memory [`RenderTree`].
///
/// Serves headless embedders and tests; it counts restacking moves so that
/// callers can verify the fast path.
#[derive(Debug, Clone, Default)]
pub struct SceneTree {
    groups: HashMap<RenderGroup, Vec<RenderNode>>,
    hidden: HashSet<RenderNode>,
    restacks: usize,
}

impl SceneTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `lower_to_bottom` moves performed so far.
    pub fn restack_count(&self) -> usize {
        self.restacks
    }

    pub fn is_visible(&self, node: RenderNode) -> bool {
        self.group_of(node).is_some() && !self.hidden.contains(&node)
    }

    pub fn contains(&self, node: RenderNode) -> bool {
        self.group_of(node).is_some()
    }
}

impl RenderTree for SceneTree {
    fn children(&self, group: RenderGroup) -> Vec<RenderNode> {
        self.groups.get(&group).cloned().unwrap_or_default()
    }

    fn group_of(&self, node: RenderNode) -> Option<RenderGroup> {
        self.groups
            .iter()
            .find(|(_, children)| children.contains(&node))
            .map(|(group, _)| *group)
    }

    fn add_child(&mut self, group: RenderGroup, node: RenderNode) {
        self.remove_child(node);
        self.groups.entry(group).or_default().push(node);
    }

    fn remove_child(&mut self, node: RenderNode) {
        for children in self.groups.values_mut() {
            children.retain(|n| *n != node);
        }
        self.hidden.remove(&node);
    }

    fn lower_to_bottom(&mut self, node: RenderNode) {
        for children in self.groups.values_mut() {
            if let Some(index) = children.iter().position(|n| *n == node) {
                let node = children.remove(index);
                children.insert(0, node);
                self.restacks += 1;
                return;
            }
        }
    }

    fn set_visible(&mut self, node: RenderNode, visible: bool) {
        if visible {
            self.hidden.remove(&node);
        } else {
            self.hidden.insert(node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::window::{WindowId, WindowInfo, WindowLayer};
    use pretty_assertions::assert_eq;

    fn registry_with(count: u64) -> (ActorRegistry, Vec<ActorId>) {
        let mut registry = ActorRegistry::new();
        let ids = (1..=count)
            .map(|raw| {
                registry
                    .add(&WindowInfo::new(WindowId::new(raw), Rect::from_size(10, 10)))
                    .unwrap()
            })
            .collect();
        (registry, ids)
    }

    fn actors(ids: &[ActorId]) -> Vec<RenderNode> {
        ids.iter().map(|id| RenderNode::Actor(*id)).collect()
    }

    #[test]
    fn test_consistent_tree_is_untouched() {
        let (registry, ids) = registry_with(3);
        let mut tree = SceneTree::new();
        tree.add_child(RenderGroup::Windows, RenderNode::Background(BackgroundId::new(1)));
        for id in &ids {
            tree.add_child(RenderGroup::Windows, RenderNode::Actor(*id));
        }
        assert_eq!(RenderOrderEnforcer::enforce(&registry, &mut tree), RestackOutcome::AlreadyConsistent);
        assert_eq!(tree.restack_count(), 0);
    }

    #[test]
    fn test_scrambled_tree_is_restored() {
        let (mut registry, ids) = registry_with(4);
        let mut tree = SceneTree::new();
        for id in [ids[2], ids[0], ids[3], ids[1]] {
            tree.add_child(RenderGroup::Windows, RenderNode::Actor(id));
        }
        registry.replace_order(vec![ids[3], ids[1], ids[0], ids[2]]);

        let outcome = RenderOrderEnforcer::enforce(&registry, &mut tree);
        assert_eq!(outcome, RestackOutcome::Restacked { moves: 4 });
        assert_eq!(
            tree.children(RenderGroup::Windows),
            actors(&[ids[3], ids[1], ids[0], ids[2]])
        );
        assert!(RenderOrderEnforcer::is_consistent(&registry, &tree));
    }

    #[test]
    fn test_backgrounds_sink_below_windows() {
        let (registry, ids) = registry_with(2);
        let bg1 = RenderNode::Background(BackgroundId::new(1));
        let bg2 = RenderNode::Background(BackgroundId::new(2));
        let mut tree = SceneTree::new();
        tree.add_child(RenderGroup::Windows, RenderNode::Actor(ids[0]));
        tree.add_child(RenderGroup::Windows, bg1);
        tree.add_child(RenderGroup::Windows, RenderNode::Actor(ids[1]));
        tree.add_child(RenderGroup::Windows, bg2);

        RenderOrderEnforcer::enforce(&registry, &mut tree);
        assert_eq!(
            tree.children(RenderGroup::Windows),
            vec![bg1, bg2, RenderNode::Actor(ids[0]), RenderNode::Actor(ids[1])]
        );
    }

    #[test]
    fn test_foreign_nodes_are_tolerated() {
        let (registry, ids) = registry_with(2);
        let mut tree = SceneTree::new();
        tree.add_child(RenderGroup::Windows, RenderNode::Actor(ids[0]));
        tree.add_child(RenderGroup::Windows, RenderNode::Foreign(9));
        tree.add_child(RenderGroup::Windows, RenderNode::Actor(ids[1]));
        assert_eq!(RenderOrderEnforcer::enforce(&registry, &mut tree), RestackOutcome::AlreadyConsistent);
    }

    #[test]
    fn test_groups_are_checked_separately() {
        let mut registry = ActorRegistry::new();
        let normal = registry
            .add(&WindowInfo::new(WindowId::new(1), Rect::from_size(10, 10)))
            .unwrap();
        let mut popup_info = WindowInfo::new(WindowId::new(2), Rect::from_size(10, 10));
        popup_info.layer = WindowLayer::OverrideRedirect;
        let popup = registry.add(&popup_info).unwrap();
        let normal_top = registry
            .add(&WindowInfo::new(WindowId::new(3), Rect::from_size(10, 10)))
            .unwrap();

        let mut tree = SceneTree::new();
        tree.add_child(RenderGroup::Windows, RenderNode::Actor(normal));
        tree.add_child(RenderGroup::TopWindows, RenderNode::Actor(popup));
        tree.add_child(RenderGroup::Windows, RenderNode::Actor(normal_top));
        assert_eq!(RenderOrderEnforcer::enforce(&registry, &mut tree), RestackOutcome::AlreadyConsistent);

        registry.replace_order(vec![normal_top, popup, normal]);
        assert!(matches!(
            RenderOrderEnforcer::enforce(&registry, &mut tree),
            RestackOutcome::Restacked { .. }
        ));
        assert_eq!(tree.children(RenderGroup::Windows), actors(&[normal_top, normal]));
        assert_eq!(tree.children(RenderGroup::TopWindows), actors(&[popup]));
    }

    #[test]
    fn test_scene_tree_visibility() {
        let mut tree = SceneTree::new();
        let node = RenderNode::Foreign(1);
        assert!(!tree.is_visible(node));
        tree.add_child(RenderGroup::Windows, node);
        assert!(tree.is_visible(node));
        tree.set_visible(node, false);
        assert!(!tree.is_visible(node));
        tree.remove_child(node);
        assert!(!tree.contains(node));
    }
}
