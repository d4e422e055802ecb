//! Scene management system
//!
//! A hierarchical scene graph with per-camera visibility culling, bridged to
//! a render backend through per-technique render queues.
//!
//! ## Architecture
//!
//! ```text
//! SceneNode tree (SceneGraph arena)
//!      ↓  update worker + main-thread callbacks
//! SceneManager (cull per camera)
//!      ↓  RenderQueue per camera
//! RenderBackend
//! ```
//!
//! The Scene Manager:
//! - Owns the node arena behind a lock shared with the update worker
//! - Recomputes world transforms and bounds lazily, bottom-up
//! - Classifies every registered node against each camera frustum
//! - Generates render queues batched by technique
//! - Collects per-frame statistics

mod bounds;
mod camera;
mod culling;
pub mod helpers;
mod light;
mod render_backend;
mod render_queue;
mod renderable;
mod scene_graph;
mod scene_manager;
mod scene_node;
mod stats;
mod update_thread;

#[cfg(test)]
mod tests;

pub use bounds::{Aabb, BoundOverlap, Frustum, Obb, Plane, Sphere};
pub use camera::{Camera, CameraPtr};
pub use culling::{CullContext, VisibilityTest};
pub use light::{LightPtr, LightSource, LightType};
pub use render_backend::{BackendReport, RecordedPass, RecordingBackend, RenderBackend};
pub use render_queue::{RenderBatch, RenderQueue};
pub use renderable::{same_renderable, RenderModel, Renderable, RenderablePtr, StaticMesh, TechniqueId};
pub use scene_graph::{MainThreadUpdate, SceneGraph};
pub use scene_manager::{PassCategory, SceneHandle, SceneManager, SceneState};
pub use scene_node::{
    MainThreadUpdateFn, NodeId, RenderableSlot, SceneNode, SceneNodeAttrib, SubThreadUpdateFn,
};
pub use stats::FrameStats;
pub use update_thread::{run_jobs, StagedFrame, SubThreadContext, SubThreadJob, UpdateCadence, UpdateTick};
