//! Render backend seam
//!
//! The scene manager builds one [`RenderQueue`] per camera and hands it to a
//! [`RenderBackend`], which issues the actual GPU work and reports how many
//! calls it made.

use super::camera::Camera;
use super::render_queue::RenderQueue;
use super::renderable::TechniqueId;

/// Work a backend did for one queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendReport {
    /// Draw calls issued
    pub draw_calls: u32,
    /// Compute dispatches issued
    pub dispatch_calls: u32,
}

/// Consumer of finished render queues
pub trait RenderBackend {
    /// Render one camera's queue
    fn render(&mut self, camera: &Camera, queue: &RenderQueue) -> BackendReport;
}

/// One recorded pass of [`RecordingBackend`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPass {
    /// Camera position the pass was rendered from
    pub eye: crate::foundation::math::Vec3,
    /// `(technique, renderable count)` per scene batch
    pub batches: Vec<(TechniqueId, usize)>,
    /// `(technique, renderable count)` per overlay batch
    pub overlay_batches: Vec<(TechniqueId, usize)>,
}

/// Headless backend that records what it was asked to draw
///
/// Reports one draw call per renderable. Useful for tests and for running
/// the scene pipeline without a GPU.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    passes: Vec<RecordedPass>,
    frames: u64,
}

impl RecordingBackend {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Every pass since the last [`RecordingBackend::reset`]
    pub fn passes(&self) -> &[RecordedPass] {
        &self.passes
    }

    /// Most recent pass
    pub fn last_pass(&self) -> Option<&RecordedPass> {
        self.passes.last()
    }

    /// Number of `render` calls so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Forget recorded passes
    pub fn reset(&mut self) {
        self.passes.clear();
    }
}

impl RenderBackend for RecordingBackend {
    fn render(&mut self, camera: &Camera, queue: &RenderQueue) -> BackendReport {
        let summarize = |batches: &[super::render_queue::RenderBatch]| {
            batches.iter().map(|b| (b.technique, b.len())).collect::<Vec<_>>()
        };

        self.passes.push(RecordedPass {
            eye: camera.eye_pos(),
            batches: summarize(queue.batches()),
            overlay_batches: summarize(queue.overlay_batches()),
        });
        self.frames += 1;

        let draw_calls = u32::try_from(queue.renderable_count()).unwrap_or(u32::MAX);
        log::trace!("Recorded pass with {} draw calls", draw_calls);
        BackendReport {
            draw_calls,
            dispatch_calls: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::bounds::Aabb;
    use crate::scene::renderable::StaticMesh;

    #[test]
    fn test_recording_backend_counts_draws() {
        let mut queue = RenderQueue::new();
        queue.push(StaticMesh::new("a", Aabb::cube(1.0), TechniqueId(1)).into_ptr());
        queue.push(StaticMesh::new("b", Aabb::cube(1.0), TechniqueId(1)).into_ptr());
        queue.push_overlay(StaticMesh::new("hud", Aabb::cube(1.0), TechniqueId(9)).into_ptr());

        let mut backend = RecordingBackend::new();
        let report = backend.render(&Camera::default(), &queue);

        assert_eq!(report, BackendReport { draw_calls: 3, dispatch_calls: 0 });
        let pass = backend.last_pass().unwrap();
        assert_eq!(pass.batches, vec![(TechniqueId(1), 2)]);
        assert_eq!(pass.overlay_batches, vec![(TechniqueId(9), 1)]);
        assert_eq!(backend.frames(), 1);
    }
}
