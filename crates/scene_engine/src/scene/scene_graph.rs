//! Scene graph arena
//!
//! Nodes live in a [`SlotMap`] keyed by [`NodeId`]. Parent links are plain
//! keys, children are ordered key lists. Every traversal here is iterative:
//! pre-order walks use an explicit stack, and bound recomputation processes
//! the dirty set in reverse pre-order so children are always finished before
//! their parents.

use super::renderable::RenderablePtr;
use super::scene_node::{NodeId, SceneNode};
use crate::foundation::math::Mat4;
use slotmap::SlotMap;
use std::ops::{Index, IndexMut};

/// Result of [`SceneGraph::main_thread_update`]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MainThreadUpdate {
    /// A renderable became hardware-ready during this call
    pub refreshed: bool,
    /// Child nodes spawned from newly expandable composite renderables,
    /// parents before children
    pub spawned: Vec<NodeId>,
}

/// Arena owning every scene node
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, SceneNode>,
}

impl SceneGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Move a node into the arena as a root. Composite renderables already
    /// attached to it are expanded into child nodes.
    pub fn insert(&mut self, node: SceneNode) -> NodeId {
        let id = self.insert_raw(node);
        self.on_attach_renderable(id);
        id
    }

    fn insert_raw(&mut self, mut node: SceneNode) -> NodeId {
        node.parent = None;
        node.children.clear();
        node.registered = false;
        self.nodes.insert(node)
    }

    /// Number of nodes in the arena
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` refers to a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Node by key
    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    /// Mutable node by key
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    /// Iterate all nodes in arena order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.iter()
    }

    /// Drop every node
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Attach `child` under `parent`. A child that already has a parent is
    /// detached from it first.
    ///
    /// # Panics
    /// Panics if either key is dead. Creating a cycle is caught in debug
    /// builds only.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert_ne!(parent, child, "a node cannot be its own child");
        debug_assert!(
            !self.is_node_in_subtree(child, parent),
            "adding this child would create a cycle"
        );

        if let Some(old_parent) = self[child].parent {
            self.remove_child(old_parent, child);
        }

        self[child].parent = Some(parent);
        self[parent].children.push(child);
        self.mark_bound_dirty(parent);
    }

    /// Detach `child` from `parent`. The child stays in the arena as a root.
    /// Returns false when `child` was not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let Some(index) = self[parent].children.iter().position(|&c| c == child) else {
            return false;
        };

        self[parent].children.remove(index);
        self[child].parent = None;
        self.mark_bound_dirty(parent);
        true
    }

    /// Detach every child of `parent`, returning them as roots
    pub fn clear_children(&mut self, parent: NodeId) -> Vec<NodeId> {
        let children = std::mem::take(&mut self[parent].children);
        for &child in &children {
            self[child].parent = None;
        }
        self.mark_bound_dirty(parent);
        children
    }

    /// Attach a renderable and expand it when it is a composite. Returns the
    /// spawned child nodes, parents before children.
    pub fn add_renderable(&mut self, id: NodeId, renderable: RenderablePtr) -> Vec<NodeId> {
        self[id].push_renderable(renderable);
        self.mark_bound_dirty(id);
        self.on_attach_renderable(id)
    }

    /// Detach a renderable (by identity). Child nodes spawned from it are
    /// left in place.
    pub fn del_renderable(&mut self, id: NodeId, renderable: &RenderablePtr) -> bool {
        let removed = self[id].remove_renderable(renderable);
        if removed {
            self.mark_bound_dirty(id);
        }
        removed
    }

    /// Flag the object-space bound of `id` and all its ancestors dirty
    pub fn mark_bound_dirty(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = &mut self[node_id];
            node.pos_aabb_dirty = true;
            current = node.parent;
        }
    }

    /// Pre-order list of `root` and all its descendants
    pub fn subtree(&self, root: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self[id].children.iter().rev());
        }
        order
    }

    /// First node named `name` in depth-first pre-order, `root` included
    pub fn find_first_node(&self, root: NodeId, name: &str) -> Option<NodeId> {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = &self[id];
            if node.name() == name {
                return Some(id);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    /// Every node named `name`, depth-first pre-order
    pub fn find_all_nodes(&self, root: NodeId, name: &str) -> Vec<NodeId> {
        self.subtree(root)
            .into_iter()
            .filter(|&id| self[id].name() == name)
            .collect()
    }

    /// Whether `node` is `root` or one of its descendants
    pub fn is_node_in_subtree(&self, root: NodeId, node: NodeId) -> bool {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if id == node {
                return true;
            }
            stack.extend(self[id].children.iter().rev());
        }
        false
    }

    /// Recompute dirty object-space bounds in the subtree of `id`
    ///
    /// A bound is the union of the node's renderable bounds and its
    /// bound-bearing children's object-space bounds. A node with nothing to
    /// enclose keeps no bound and adds nothing to its parent's union. Nodes
    /// without a bound only get their dirty flag cleared.
    pub fn update_pos_bound(&mut self, id: NodeId) {
        // dirty(child) implies dirty(parent), so clean subtrees are skipped
        let mut dirty = Vec::new();
        let mut stack = vec![id];
        while let Some(node_id) = stack.pop() {
            let node = &self[node_id];
            if node.pos_aabb_dirty {
                dirty.push(node_id);
                stack.extend(node.children.iter().copied());
            }
        }

        for &node_id in dirty.iter().rev() {
            let node = &self[node_id];
            if node.has_bound() {
                let from_renderables = node
                    .renderables
                    .iter()
                    .map(|slot| slot.renderable.pos_bound());
                let from_children = node
                    .children
                    .iter()
                    .map(|&child| &self[child])
                    .filter(|child| child.has_bound())
                    .filter_map(|child| child.pos_aabb_os);
                let bound = from_renderables
                    .chain(from_children)
                    .reduce(|a, b| a.union(&b));
                self[node_id].pos_aabb_os = bound;
            }
            self[node_id].pos_aabb_dirty = false;
        }
    }

    /// Recompute the absolute transform of `id` from its parent's, refresh
    /// its world-space bound and push the transform to its renderables
    pub fn update_abs_model_matrix(&mut self, id: NodeId) {
        let abs_model = match self[id].parent {
            Some(parent) => self[parent].abs_model * self[id].model_matrix(),
            None => *self[id].model_matrix(),
        };

        if self[id].has_bound() {
            self.update_pos_bound(id);
        }

        let node = &mut self[id];
        node.abs_model = abs_model;
        if node.has_bound() {
            node.pos_aabb_ws = node.pos_aabb_os.map(|bound| bound.transform(&abs_model));
        }
        for slot in &node.renderables {
            slot.renderable.set_model_matrix(&abs_model);
        }
    }

    /// Absolute transforms for `root` and every descendant, top-down
    pub fn update_transforms(&mut self, root: NodeId) {
        for id in self.subtree(root) {
            self.update_abs_model_matrix(id);
        }
    }

    /// Set the local transform of `id`
    pub fn set_model_matrix(&mut self, id: NodeId, model: Mat4) {
        self[id].set_model_matrix(model);
    }

    /// Show or hide `id` and every descendant
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        for node_id in self.subtree(id) {
            self[node_id].set_invisible_bit(visible);
        }
    }

    /// Spawn one child per sub-part of every composite renderable on `id`
    /// that has not been expanded yet. Spawned children inherit the
    /// attribute mask and are expanded in turn. Returns the spawned nodes,
    /// parents before children.
    pub fn on_attach_renderable(&mut self, id: NodeId) -> Vec<NodeId> {
        let mut spawned = Vec::new();
        let mut pending = vec![id];

        while let Some(node_id) = pending.pop() {
            let attrib = self[node_id].attrib();
            let mut parts = Vec::new();
            for slot in &mut self[node_id].renderables {
                if slot.expanded {
                    continue;
                }
                let subs = slot.renderable.subrenderables();
                if !subs.is_empty() {
                    slot.expanded = true;
                    parts.extend(subs);
                }
            }

            let first_new = spawned.len();
            for part in parts {
                let child = self.insert_raw(SceneNode::with_renderable(part, attrib));
                self.add_child(node_id, child);
                spawned.push(child);
            }
            pending.extend(spawned[first_new..].iter().rev());
        }

        if !spawned.is_empty() {
            log::trace!("Expanded {} sub-part nodes under {:?}", spawned.len(), id);
        }
        spawned
    }

    /// Main-thread update of one node: poll renderable readiness, expand
    /// composites that just became ready, refresh the transform, then run
    /// the bound main-thread callback
    pub fn main_thread_update(&mut self, id: NodeId, app_time: f32, elapsed_time: f32) -> MainThreadUpdate {
        let mut result = MainThreadUpdate::default();

        for slot in &mut self[id].renderables {
            if !slot.hw_ready && slot.renderable.hw_resource_ready() {
                slot.hw_ready = true;
                result.refreshed = true;
            }
        }

        if result.refreshed {
            result.spawned = self.on_attach_renderable(id);
            self.update_abs_model_matrix(id);
        }

        let node = &mut self[id];
        if let Some(mut func) = node.main_thread_update.take() {
            func(&mut *node, app_time, elapsed_time);
            if node.main_thread_update.is_none() {
                node.main_thread_update = Some(func);
            }
        }

        result
    }

    /// Detach `id` from its parent and remove it with all descendants.
    /// Returns the removed nodes in pre-order.
    pub fn remove_subtree(&mut self, id: NodeId) -> Vec<SceneNode> {
        if let Some(parent) = self[id].parent {
            self.remove_child(parent, id);
        }
        self.subtree(id)
            .into_iter()
            .filter_map(|node_id| self.nodes.remove(node_id))
            .collect()
    }
}

impl Index<NodeId> for SceneGraph {
    type Output = SceneNode;

    fn index(&self, id: NodeId) -> &SceneNode {
        &self.nodes[id]
    }
}

impl IndexMut<NodeId> for SceneGraph {
    fn index_mut(&mut self, id: NodeId) -> &mut SceneNode {
        &mut self.nodes[id]
    }
}
