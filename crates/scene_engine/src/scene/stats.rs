//! Per-frame rendering statistics

use super::render_backend::BackendReport;
use super::renderable::Renderable;

/// Counters reset at the start of every scene update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Nodes that contributed at least one renderable
    pub objects: u32,
    /// Renderables queued
    pub renderables: u32,
    /// Primitives of the queued renderables
    pub primitives: u32,
    /// Vertices of the queued renderables
    pub vertices: u32,
    /// Draw calls reported by the backend
    pub draw_calls: u32,
    /// Dispatch calls reported by the backend
    pub dispatch_calls: u32,
}

impl FrameStats {
    /// Zero every counter
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Count one queued renderable
    pub fn add_renderable(&mut self, renderable: &dyn Renderable) {
        self.renderables += 1;
        self.primitives += renderable.num_primitives();
        self.vertices += renderable.num_vertices();
    }

    /// Fold in what the backend reported
    pub fn add_backend_report(&mut self, report: BackendReport) {
        self.draw_calls += report.draw_calls;
        self.dispatch_calls += report.dispatch_calls;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::bounds::Aabb;
    use crate::scene::renderable::{StaticMesh, TechniqueId};

    #[test]
    fn test_accumulate_and_reset() {
        let mesh = StaticMesh::new("m", Aabb::cube(1.0), TechniqueId(0)).with_counts(24, 12);
        let mut stats = FrameStats::default();
        stats.add_renderable(&mesh);
        stats.add_renderable(&mesh);
        stats.add_backend_report(BackendReport { draw_calls: 2, dispatch_calls: 1 });

        assert_eq!(stats.renderables, 2);
        assert_eq!(stats.vertices, 48);
        assert_eq!(stats.primitives, 24);
        assert_eq!(stats.dispatch_calls, 1);

        stats.reset();
        assert_eq!(stats, FrameStats::default());
    }
}
