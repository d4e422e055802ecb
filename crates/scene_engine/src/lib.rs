//! # Scene Engine
//!
//! Scene graph and visibility culling core for a real-time renderer.
//!
//! ## Features
//!
//! - **Scene Graph**: Arena-backed node hierarchy with lazy bounds
//! - **Culling**: Per-camera frustum and small-object classification
//! - **Render Queues**: Visible renderables batched by technique
//! - **Background Updates**: Node callbacks on a dedicated worker thread
//! - **Statistics**: Per-frame object, primitive and draw-call counters
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_engine::prelude::*;
//!
//! fn main() -> Result<(), SceneError> {
//!     let mut scene = SceneManager::new(SceneConfig::default())?;
//!     scene.add_camera(Camera::perspective(Vec3::new(0.0, 2.0, 10.0), 45.0, 16.0 / 9.0, 0.1, 100.0).into_ptr());
//!
//!     let mesh = StaticMesh::new("crate", Aabb::cube(1.0), TechniqueId(0)).into_ptr();
//!     scene.add_node(SceneNode::with_renderable(mesh, SceneNodeAttrib::CULLABLE));
//!
//!     let mut backend = RecordingBackend::new();
//!     scene.update(&mut backend)?;
//!     println!("{} objects rendered", scene.num_objects_rendered());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod error;
pub mod foundation;
pub mod scene;

pub use error::SceneError;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, SceneConfig},
        error::SceneError,
        foundation::{
            math::{Mat4, Quat, Transform, Vec3},
            time::{Stopwatch, Timer},
        },
        scene::{
            Aabb, BoundOverlap, Camera, CameraPtr, FrameStats, LightPtr, LightSource, NodeId, PassCategory,
            RecordingBackend, RenderBackend, RenderModel, RenderQueue, Renderable, RenderablePtr, SceneHandle,
            SceneManager, SceneNode, SceneNodeAttrib, StaticMesh, TechniqueId,
        },
    };
}
