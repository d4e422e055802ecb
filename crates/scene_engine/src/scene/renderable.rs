//! Renderable payload contract
//!
//! A renderable is what a scene node draws. The scene core only needs its
//! local bound, the technique it renders with, whether its GPU resources are
//! ready, a place to put the node's absolute transform, and (for composite
//! models) its sub-parts.

use super::bounds::Aabb;
use crate::foundation::math::Mat4;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Groups renderables sharing the same GPU pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TechniqueId(pub u32);

/// Shared handle to a renderable
pub type RenderablePtr = Arc<dyn Renderable>;

/// Drawable payload attached to scene nodes
///
/// Implementations are shared between the scene thread and the render
/// backend, so mutation goes through `&self` and interior mutability.
pub trait Renderable: Send + Sync {
    /// Object-space bound
    fn pos_bound(&self) -> Aabb;

    /// Technique used as the render-queue bucket key
    fn technique(&self) -> TechniqueId;

    /// Whether GPU resources finished loading. Polled every main-thread
    /// update until true.
    fn hw_resource_ready(&self) -> bool {
        true
    }

    /// Receive the owning node's absolute transform
    fn set_model_matrix(&self, model: &Mat4);

    /// Last transform received through [`Renderable::set_model_matrix`]
    fn model_matrix(&self) -> Mat4;

    /// Sub-parts of a composite model. Each one gets its own child node.
    fn subrenderables(&self) -> Vec<RenderablePtr> {
        Vec::new()
    }

    /// Primitive count, for statistics
    fn num_primitives(&self) -> u32 {
        0
    }

    /// Vertex count, for statistics
    fn num_vertices(&self) -> u32 {
        0
    }

    /// Object id written by picking passes
    fn set_object_id(&self, _id: u32) {}

    /// Toggle select (picking) mode
    fn set_select_mode(&self, _select_mode: bool) {}

    /// Whether select mode is on
    fn select_mode(&self) -> bool {
        false
    }
}

/// Identity comparison for shared renderables (data pointer only)
pub fn same_renderable(a: &RenderablePtr, b: &RenderablePtr) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}

/// Leaf renderable with fixed geometry statistics
#[derive(Debug)]
pub struct StaticMesh {
    name: String,
    bound: Aabb,
    technique: TechniqueId,
    num_vertices: u32,
    num_primitives: u32,
    model: RwLock<Mat4>,
    hw_ready: AtomicBool,
    object_id: AtomicU32,
    select_mode: AtomicBool,
}

impl StaticMesh {
    /// Create a mesh whose GPU resources are already resident
    pub fn new(name: impl Into<String>, bound: Aabb, technique: TechniqueId) -> Self {
        Self {
            name: name.into(),
            bound,
            technique,
            num_vertices: 0,
            num_primitives: 0,
            model: RwLock::new(Mat4::identity()),
            hw_ready: AtomicBool::new(true),
            object_id: AtomicU32::new(0),
            select_mode: AtomicBool::new(false),
        }
    }

    /// Set vertex and primitive counts
    pub fn with_counts(mut self, num_vertices: u32, num_primitives: u32) -> Self {
        self.num_vertices = num_vertices;
        self.num_primitives = num_primitives;
        self
    }

    /// Start with GPU resources still loading
    pub fn loading(self) -> Self {
        self.hw_ready.store(false, Ordering::Release);
        self
    }

    /// Flag GPU resources as loaded (called by the asset loader)
    pub fn mark_hw_ready(&self) {
        self.hw_ready.store(true, Ordering::Release);
    }

    /// Mesh name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last id written by [`Renderable::set_object_id`]
    pub fn object_id(&self) -> u32 {
        self.object_id.load(Ordering::Acquire)
    }

    /// Wrap into a shared handle
    pub fn into_ptr(self) -> RenderablePtr {
        Arc::new(self)
    }
}

impl Renderable for StaticMesh {
    fn pos_bound(&self) -> Aabb {
        self.bound
    }

    fn technique(&self) -> TechniqueId {
        self.technique
    }

    fn hw_resource_ready(&self) -> bool {
        self.hw_ready.load(Ordering::Acquire)
    }

    fn set_model_matrix(&self, model: &Mat4) {
        *self.model.write().unwrap_or_else(PoisonError::into_inner) = *model;
    }

    fn model_matrix(&self) -> Mat4 {
        *self.model.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn num_primitives(&self) -> u32 {
        self.num_primitives
    }

    fn num_vertices(&self) -> u32 {
        self.num_vertices
    }

    fn set_object_id(&self, id: u32) {
        self.object_id.store(id, Ordering::Release);
    }

    fn set_select_mode(&self, select_mode: bool) {
        self.select_mode.store(select_mode, Ordering::Release);
    }

    fn select_mode(&self) -> bool {
        self.select_mode.load(Ordering::Acquire)
    }
}

/// Composite renderable: a container of meshes
///
/// The model itself is never drawn. Nodes carrying it spawn one child per
/// mesh, and only once the model reports its resources ready.
pub struct RenderModel {
    name: String,
    meshes: Vec<RenderablePtr>,
    model: RwLock<Mat4>,
    hw_ready: AtomicBool,
}

impl RenderModel {
    /// Create a loaded model
    pub fn new(name: impl Into<String>, meshes: Vec<RenderablePtr>) -> Self {
        Self {
            name: name.into(),
            meshes,
            model: RwLock::new(Mat4::identity()),
            hw_ready: AtomicBool::new(true),
        }
    }

    /// Start with the model still loading; sub-parts stay hidden until
    /// [`RenderModel::mark_hw_ready`]
    pub fn loading(self) -> Self {
        self.hw_ready.store(false, Ordering::Release);
        self
    }

    /// Flag the model as loaded
    pub fn mark_hw_ready(&self) {
        self.hw_ready.store(true, Ordering::Release);
    }

    /// Model name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wrap into a shared handle
    pub fn into_ptr(self) -> RenderablePtr {
        Arc::new(self)
    }
}

impl Renderable for RenderModel {
    fn pos_bound(&self) -> Aabb {
        self.meshes
            .iter()
            .map(|mesh| mesh.pos_bound())
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(|| Aabb::cube(0.0))
    }

    fn technique(&self) -> TechniqueId {
        TechniqueId::default()
    }

    fn hw_resource_ready(&self) -> bool {
        self.hw_ready.load(Ordering::Acquire)
    }

    fn set_model_matrix(&self, model: &Mat4) {
        *self.model.write().unwrap_or_else(PoisonError::into_inner) = *model;
    }

    fn model_matrix(&self) -> Mat4 {
        *self.model.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn subrenderables(&self) -> Vec<RenderablePtr> {
        if self.hw_resource_ready() {
            self.meshes.clone()
        } else {
            Vec::new()
        }
    }

    fn set_object_id(&self, id: u32) {
        for mesh in &self.meshes {
            mesh.set_object_id(id);
        }
    }

    fn set_select_mode(&self, select_mode: bool) {
        for mesh in &self.meshes {
            mesh.set_select_mode(select_mode);
        }
    }

    fn select_mode(&self) -> bool {
        self.meshes.first().is_some_and(|mesh| mesh.select_mode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_mesh_loading_flag() {
        let mesh = StaticMesh::new("crate", Aabb::cube(1.0), TechniqueId(3)).loading();
        assert!(!mesh.hw_resource_ready());
        mesh.mark_hw_ready();
        assert!(mesh.hw_resource_ready());
        assert_eq!(mesh.technique(), TechniqueId(3));
    }

    #[test]
    fn test_render_model_hides_parts_until_ready() {
        let parts: Vec<RenderablePtr> = (0..2)
            .map(|i| StaticMesh::new(format!("part{i}"), Aabb::cube(1.0), TechniqueId(i)).into_ptr())
            .collect();
        let model = RenderModel::new("model", parts).loading();
        assert!(model.subrenderables().is_empty());
        model.mark_hw_ready();
        assert_eq!(model.subrenderables().len(), 2);
    }

    #[test]
    fn test_same_renderable_is_identity() {
        let a = StaticMesh::new("a", Aabb::cube(1.0), TechniqueId(0)).into_ptr();
        let b = StaticMesh::new("a", Aabb::cube(1.0), TechniqueId(0)).into_ptr();
        assert!(same_renderable(&a, &a.clone()));
        assert!(!same_renderable(&a, &b));
    }

    #[test]
    fn test_model_forwards_select_mode() {
        let mesh = StaticMesh::new("m", Aabb::cube(1.0), TechniqueId(0)).into_ptr();
        let model = RenderModel::new("model", vec![Arc::clone(&mesh)]);
        model.set_select_mode(true);
        assert!(mesh.select_mode());
        assert!(model.select_mode());
    }
}
