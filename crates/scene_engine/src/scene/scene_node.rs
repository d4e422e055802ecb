//! Scene node
//!
//! A node is a transform plus zero or more renderables. Hierarchy links are
//! arena keys; operations that need to look at other nodes (bounds, absolute
//! transforms, visibility cascade) live on [`super::SceneGraph`].

use super::bounds::{Aabb, BoundOverlap};
use super::renderable::{same_renderable, RenderablePtr};
use super::update_thread::SubThreadContext;
use crate::foundation::math::Mat4;
use bitflags::bitflags;
use slotmap::new_key_type;
use std::fmt;
use std::sync::Arc;

new_key_type! {
    /// Arena key of a scene node
    pub struct NodeId;
}

bitflags! {
    /// Scene node attribute mask
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SceneNodeAttrib: u32 {
        /// Tested against camera frustums
        const CULLABLE = 1 << 0;
        /// Screen-space node, never culled and never bounded
        const OVERLAY = 1 << 1;
        /// Transform changes at runtime
        const MOVEABLE = 1 << 2;
        /// Hidden, together with every descendant
        const INVISIBLE = 1 << 3;
        /// Skipped by shadow-map passes
        const NOT_CAST_SHADOW = 1 << 4;
        /// Subsurface scattering
        const SSS = 1 << 5;
    }
}

/// Background-thread callback: `(context, app_time, elapsed_time)`
pub type SubThreadUpdateFn = Arc<dyn Fn(&mut SubThreadContext, f32, f32) + Send + Sync>;

/// Main-thread callback: `(node, app_time, elapsed_time)`
pub type MainThreadUpdateFn = Box<dyn FnMut(&mut SceneNode, f32, f32) + Send>;

/// A renderable attached to a node
#[derive(Clone)]
pub struct RenderableSlot {
    /// The payload
    pub renderable: RenderablePtr,
    /// Hardware readiness observed by the last main-thread poll
    pub hw_ready: bool,
    /// Sub-parts already spawned as child nodes
    pub expanded: bool,
}

impl RenderableSlot {
    fn new(renderable: RenderablePtr) -> Self {
        Self {
            renderable,
            hw_ready: false,
            expanded: false,
        }
    }
}

/// Scene hierarchy node
pub struct SceneNode {
    name: String,
    attrib: SceneNodeAttrib,

    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,

    model: Mat4,
    pub(crate) abs_model: Mat4,

    pub(crate) renderables: Vec<RenderableSlot>,

    pub(crate) pos_aabb_os: Option<Aabb>,
    pub(crate) pos_aabb_ws: Option<Aabb>,
    pub(crate) pos_aabb_dirty: bool,

    visible_mark: BoundOverlap,
    pub(crate) registered: bool,

    sub_thread_update: Option<SubThreadUpdateFn>,
    pub(crate) main_thread_update: Option<MainThreadUpdateFn>,
}

impl SceneNode {
    /// Create an empty node
    pub fn new(attrib: SceneNodeAttrib) -> Self {
        Self {
            name: String::new(),
            attrib,
            parent: None,
            children: Vec::new(),
            model: Mat4::identity(),
            abs_model: Mat4::identity(),
            renderables: Vec::new(),
            pos_aabb_os: None,
            pos_aabb_ws: None,
            pos_aabb_dirty: true,
            visible_mark: BoundOverlap::No,
            registered: false,
            sub_thread_update: None,
            main_thread_update: None,
        }
    }

    /// Create an empty named node
    pub fn named(name: impl Into<String>, attrib: SceneNodeAttrib) -> Self {
        let mut node = Self::new(attrib);
        node.name = name.into();
        node
    }

    /// Create a node carrying one renderable
    pub fn with_renderable(renderable: RenderablePtr, attrib: SceneNodeAttrib) -> Self {
        let mut node = Self::new(attrib);
        node.renderables.push(RenderableSlot::new(renderable));
        node
    }

    /// Create a named node carrying one renderable
    pub fn with_renderable_named(
        renderable: RenderablePtr,
        name: impl Into<String>,
        attrib: SceneNodeAttrib,
    ) -> Self {
        let mut node = Self::with_renderable(renderable, attrib);
        node.name = name.into();
        node
    }

    /// Node name (empty when unnamed)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the node
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Attribute mask
    pub fn attrib(&self) -> SceneNodeAttrib {
        self.attrib
    }

    /// Whether the `INVISIBLE` bit is clear
    pub fn visible(&self) -> bool {
        !self.attrib.contains(SceneNodeAttrib::INVISIBLE)
    }

    pub(crate) fn set_invisible_bit(&mut self, visible: bool) {
        self.attrib.set(SceneNodeAttrib::INVISIBLE, !visible);
    }

    /// Whether the node carries a bounding volume
    pub fn has_bound(&self) -> bool {
        !self.attrib.contains(SceneNodeAttrib::OVERLAY)
            && self
                .attrib
                .intersects(SceneNodeAttrib::CULLABLE | SceneNodeAttrib::MOVEABLE)
    }

    /// Whether culling tests this node's bound
    pub fn is_cullable(&self) -> bool {
        self.has_bound() && self.attrib.contains(SceneNodeAttrib::CULLABLE)
    }

    /// Whether this is an overlay node
    pub fn is_overlay(&self) -> bool {
        self.attrib.contains(SceneNodeAttrib::OVERLAY)
    }

    /// Whether shadow-map passes draw this node
    pub fn casts_shadow(&self) -> bool {
        !self.attrib.contains(SceneNodeAttrib::NOT_CAST_SHADOW)
    }

    /// Whether the node uses subsurface scattering
    pub fn is_sss(&self) -> bool {
        self.attrib.contains(SceneNodeAttrib::SSS)
    }

    /// Parent node, `None` for roots
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Child at `index`
    ///
    /// # Panics
    /// Panics when `index` is out of range.
    pub fn child(&self, index: usize) -> NodeId {
        self.children[index]
    }

    /// Number of children
    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    /// Number of attached renderables
    pub fn num_renderables(&self) -> usize {
        self.renderables.len()
    }

    /// Renderable at `index`
    ///
    /// # Panics
    /// Panics when `index` is out of range.
    pub fn renderable(&self, index: usize) -> &RenderablePtr {
        &self.renderables[index].renderable
    }

    /// First renderable, if any
    pub fn first_renderable(&self) -> Option<&RenderablePtr> {
        self.renderables.first().map(|slot| &slot.renderable)
    }

    /// Attached renderables with their readiness state
    pub fn renderable_slots(&self) -> &[RenderableSlot] {
        &self.renderables
    }

    pub(crate) fn push_renderable(&mut self, renderable: RenderablePtr) {
        self.renderables.push(RenderableSlot::new(renderable));
        self.pos_aabb_dirty = true;
    }

    pub(crate) fn remove_renderable(&mut self, renderable: &RenderablePtr) -> bool {
        let Some(index) = self
            .renderables
            .iter()
            .position(|slot| same_renderable(&slot.renderable, renderable))
        else {
            return false;
        };
        self.renderables.remove(index);
        self.pos_aabb_dirty = true;
        true
    }

    /// Local transform (relative to the parent)
    pub fn model_matrix(&self) -> &Mat4 {
        &self.model
    }

    /// Set the local transform. The absolute transform follows on the next
    /// transform update.
    pub fn set_model_matrix(&mut self, model: Mat4) {
        self.model = model;
    }

    /// Absolute transform computed by the last transform update
    pub fn abs_model_matrix(&self) -> &Mat4 {
        &self.abs_model
    }

    /// Object-space bound (current after a bound update)
    ///
    /// `None` for nodes without a bound and for bound-bearing nodes with
    /// nothing to enclose yet (no renderables, no bounded children).
    pub fn pos_bound_os(&self) -> Option<&Aabb> {
        self.pos_aabb_os.as_ref()
    }

    /// World-space bound computed by the last transform update
    pub fn pos_bound_ws(&self) -> Option<&Aabb> {
        self.pos_aabb_ws.as_ref()
    }

    /// Whether the object-space bound needs recomputing
    pub fn bound_dirty(&self) -> bool {
        self.pos_aabb_dirty
    }

    /// Mark from the most recent culling pass
    pub fn visible_mark(&self) -> BoundOverlap {
        self.visible_mark
    }

    /// Overwrite the culling mark
    pub fn set_visible_mark(&mut self, mark: BoundOverlap) {
        self.visible_mark = mark;
    }

    /// Whether the node is registered with a scene manager
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Bind the background-thread callback
    pub fn bind_sub_thread_update<F>(&mut self, func: F)
    where
        F: Fn(&mut SubThreadContext, f32, f32) + Send + Sync + 'static,
    {
        self.sub_thread_update = Some(Arc::new(func));
    }

    /// Bind the main-thread callback
    pub fn bind_main_thread_update<F>(&mut self, func: F)
    where
        F: FnMut(&mut SceneNode, f32, f32) + Send + 'static,
    {
        self.main_thread_update = Some(Box::new(func));
    }

    /// Background callback, if bound
    pub fn sub_thread_update_fn(&self) -> Option<&SubThreadUpdateFn> {
        self.sub_thread_update.as_ref()
    }

    /// Run the background callback against this node's local transform, in
    /// place. Used for inline updates.
    pub fn sub_thread_update(&mut self, id: NodeId, app_time: f32, elapsed_time: f32) {
        if let Some(func) = self.sub_thread_update.clone() {
            let mut context = SubThreadContext::new(id, self.attrib, self.model);
            func(&mut context, app_time, elapsed_time);
            if let Some(model) = context.take_changed() {
                self.model = model;
            }
        }
    }

    /// Forward an object id to every renderable
    pub fn set_object_id(&self, id: u32) {
        for slot in &self.renderables {
            slot.renderable.set_object_id(id);
        }
    }

    /// Forward select mode to every renderable
    pub fn set_select_mode(&self, select_mode: bool) {
        for slot in &self.renderables {
            slot.renderable.set_select_mode(select_mode);
        }
    }

    /// Select mode of the first renderable
    pub fn select_mode(&self) -> bool {
        self.first_renderable().is_some_and(|r| r.select_mode())
    }
}

impl fmt::Debug for SceneNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneNode")
            .field("name", &self.name)
            .field("attrib", &self.attrib)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("renderables", &self.renderables.len())
            .field("visible_mark", &self.visible_mark)
            .field("registered", &self.registered)
            .finish_non_exhaustive()
    }
}
