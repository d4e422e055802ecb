//! Per-camera visibility classification
//!
//! [`CullContext`] holds what one culling pass needs from a camera. The scene
//! manager walks registered nodes top-down and feeds each node the mark its
//! parent produced.

use super::bounds::{Aabb, BoundOverlap, Frustum};
use super::camera::Camera;
use super::scene_node::SceneNode;
use crate::foundation::math::{Mat4, Vec3, Vec4};

/// Outcome of [`CullContext::visible_test_from_parent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityTest {
    /// Mark for the node itself
    pub mark: BoundOverlap,
    /// Parent mark to hand to the node's children
    pub children: BoundOverlap,
}

impl VisibilityTest {
    fn same(mark: BoundOverlap) -> Self {
        Self { mark, children: mark }
    }
}

/// Camera data for one culling pass
#[derive(Debug, Clone)]
pub struct CullContext {
    /// Camera frustum in world space
    pub frustum: Frustum,
    /// World-to-clip transform
    pub view_proj: Mat4,
    /// Eye position
    pub eye_pos: Vec3,
    /// Normalized viewing direction
    pub view_dir: Vec3,
    /// Viewport fraction below which bounded nodes are dropped (0 disables)
    pub small_object_threshold: f32,
}

impl CullContext {
    /// Capture a camera
    pub fn from_camera(camera: &Camera, small_object_threshold: f32) -> Self {
        let view_proj = camera.view_proj_matrix();
        Self {
            frustum: Frustum::from_matrix(&view_proj),
            view_proj,
            eye_pos: camera.eye_pos(),
            view_dir: camera.view_dir(),
            small_object_threshold,
        }
    }

    /// Classify `node` given the mark of its parent (`Partial` for roots)
    ///
    /// Invisible nodes and children of `No` parents are `No` without a test.
    /// Nodes that are not cullable are `Yes` and pass their parent's mark
    /// through. Children of `Yes` parents inherit `Yes`. Everything else is
    /// tested against the frustum and, when small-object culling is on,
    /// against the projected area.
    pub fn visible_test_from_parent(&self, node: &SceneNode, parent_mark: BoundOverlap) -> VisibilityTest {
        if !node.visible() || parent_mark == BoundOverlap::No {
            return VisibilityTest::same(BoundOverlap::No);
        }

        // nothing to test against: drawn, children inherit the parent's mark
        let bound = match node.pos_bound_ws() {
            Some(bound) if node.is_cullable() => bound,
            _ => {
                return VisibilityTest {
                    mark: BoundOverlap::Yes,
                    children: parent_mark,
                }
            }
        };

        let mark = if parent_mark == BoundOverlap::Yes {
            BoundOverlap::Yes
        } else {
            self.frustum.aabb_visible(bound)
        };

        if mark != BoundOverlap::No && self.is_small(bound) {
            return VisibilityTest::same(BoundOverlap::No);
        }

        VisibilityTest::same(mark)
    }

    fn is_small(&self, bound: &Aabb) -> bool {
        self.small_object_threshold > 0.0
            && self
                .projected_area(bound)
                .is_some_and(|area| area < self.small_object_threshold)
    }

    /// Fraction of the viewport covered by the screen rectangle of `bound`
    ///
    /// `None` when part of the box is at or behind the eye, where the
    /// projection is meaningless.
    pub fn projected_area(&self, bound: &Aabb) -> Option<f32> {
        let mut min = [f32::MAX; 2];
        let mut max = [f32::MIN; 2];

        for corner in bound.corners() {
            if (corner - self.eye_pos).dot(&self.view_dir) <= 0.0 {
                return None;
            }
            let clip = self.view_proj * Vec4::new(corner.x, corner.y, corner.z, 1.0);
            if clip.w <= f32::EPSILON {
                return None;
            }
            for axis in 0..2 {
                let ndc = (clip[axis] / clip.w).clamp(-1.0, 1.0);
                min[axis] = min[axis].min(ndc);
                max[axis] = max[axis].max(ndc);
            }
        }

        Some((max[0] - min[0]) * (max[1] - min[1]) / 4.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::scene_graph::SceneGraph;
    use crate::scene::scene_node::SceneNodeAttrib;
    use crate::scene::renderable::{StaticMesh, TechniqueId};
    use approx::assert_relative_eq;

    fn context(threshold: f32) -> CullContext {
        let camera = Camera::perspective(Vec3::new(0.0, 0.0, 10.0), 90.0, 1.0, 0.1, 100.0);
        CullContext::from_camera(&camera, threshold)
    }

    fn placed_node(attrib: SceneNodeAttrib, center: Vec3, half: f32) -> SceneNode {
        let mesh = StaticMesh::new("m", Aabb::cube(half), TechniqueId(0)).into_ptr();
        let mut graph = SceneGraph::new();
        let id = graph.insert(SceneNode::with_renderable(mesh, attrib));
        graph.set_model_matrix(id, Mat4::new_translation(&center));
        graph.update_transforms(id);
        graph.remove_subtree(id).remove(0)
    }

    #[test]
    fn test_frustum_result_for_roots() {
        let ctx = context(0.0);
        let inside = placed_node(SceneNodeAttrib::CULLABLE, Vec3::zeros(), 1.0);
        let outside = placed_node(SceneNodeAttrib::CULLABLE, Vec3::new(0.0, 0.0, 30.0), 1.0);
        assert_eq!(ctx.visible_test_from_parent(&inside, BoundOverlap::Partial).mark, BoundOverlap::Yes);
        assert_eq!(ctx.visible_test_from_parent(&outside, BoundOverlap::Partial).mark, BoundOverlap::No);
    }

    #[test]
    fn test_parent_marks_short_circuit() {
        let ctx = context(0.0);
        let outside = placed_node(SceneNodeAttrib::CULLABLE, Vec3::new(0.0, 0.0, 30.0), 1.0);
        let inside = placed_node(SceneNodeAttrib::CULLABLE, Vec3::zeros(), 1.0);

        // a Yes parent is trusted even for a bound that lies outside
        assert_eq!(ctx.visible_test_from_parent(&outside, BoundOverlap::Yes).mark, BoundOverlap::Yes);
        assert_eq!(ctx.visible_test_from_parent(&inside, BoundOverlap::No).mark, BoundOverlap::No);
    }

    #[test]
    fn test_non_cullable_passes_parent_mark_through() {
        let ctx = context(0.0);
        let node = placed_node(SceneNodeAttrib::empty(), Vec3::new(0.0, 0.0, 30.0), 1.0);
        let test = ctx.visible_test_from_parent(&node, BoundOverlap::Partial);
        assert_eq!(test.mark, BoundOverlap::Yes);
        assert_eq!(test.children, BoundOverlap::Partial);
    }

    #[test]
    fn test_cullable_without_bound_passes_parent_mark_through() {
        let ctx = context(0.01);
        let mut graph = SceneGraph::new();
        let id = graph.insert(SceneNode::new(SceneNodeAttrib::CULLABLE));
        graph.update_transforms(id);
        let empty = graph.remove_subtree(id).remove(0);

        let test = ctx.visible_test_from_parent(&empty, BoundOverlap::Partial);
        assert_eq!(test.mark, BoundOverlap::Yes);
        assert_eq!(test.children, BoundOverlap::Partial);
    }

    #[test]
    fn test_invisible_is_never_drawn() {
        let ctx = context(0.0);
        let node = placed_node(SceneNodeAttrib::CULLABLE | SceneNodeAttrib::INVISIBLE, Vec3::zeros(), 1.0);
        assert_eq!(ctx.visible_test_from_parent(&node, BoundOverlap::Yes).mark, BoundOverlap::No);
    }

    #[test]
    fn test_small_objects_are_dropped() {
        let ctx = context(0.01);
        let speck = placed_node(SceneNodeAttrib::CULLABLE, Vec3::zeros(), 0.05);
        let boulder = placed_node(SceneNodeAttrib::CULLABLE, Vec3::zeros(), 2.0);
        assert_eq!(ctx.visible_test_from_parent(&speck, BoundOverlap::Partial).mark, BoundOverlap::No);
        assert_eq!(ctx.visible_test_from_parent(&boulder, BoundOverlap::Partial).mark, BoundOverlap::Yes);
    }

    #[test]
    fn test_projected_area() {
        let ctx = context(0.0);
        // a 2x2 face at distance 9..11 in a 90 degree frustum
        let area = ctx.projected_area(&Aabb::cube(1.0)).unwrap();
        let half = 1.0 / 9.0;
        assert_relative_eq!(area, half * half, epsilon = 1e-4);

        let around_eye = Aabb::from_center_extents(Vec3::new(0.0, 0.0, 10.0), Vec3::new(1.0, 1.0, 1.0));
        assert!(ctx.projected_area(&around_eye).is_none());
    }
}
