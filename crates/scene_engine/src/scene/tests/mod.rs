//! Whole-pipeline tests for the scene manager

mod end_to_end;

use crate::config::SceneConfig;
use crate::foundation::math::Vec3;
use crate::scene::{Aabb, Camera, CameraPtr, RenderablePtr, SceneManager, StaticMesh, TechniqueId};

/// Camera at z = 10 looking at the origin with a 90 degree field of view
pub(super) fn front_camera() -> CameraPtr {
    Camera::perspective(Vec3::new(0.0, 0.0, 10.0), 90.0, 1.0, 0.1, 100.0).into_ptr()
}

pub(super) fn cube(technique: u32) -> RenderablePtr {
    StaticMesh::new("cube", Aabb::cube(1.0), TechniqueId(technique))
        .with_counts(24, 12)
        .into_ptr()
}

/// Manager running every callback on the calling thread
pub(super) fn inline_manager() -> SceneManager {
    SceneManager::new(
        SceneConfig::default()
            .with_background_thread(false)
            .with_update_elapse(0.0),
    )
    .unwrap()
}
