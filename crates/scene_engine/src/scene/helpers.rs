//! Ready-made node behaviours
//!
//! Skyboxes, light proxies and camera proxies are ordinary [`SceneNode`]s
//! with the right attribute mask and an update callback bound to them.

use super::camera::CameraPtr;
use super::light::{LightSource, LightType, LightPtr};
use super::renderable::RenderablePtr;
use super::scene_node::{SceneNode, SceneNodeAttrib};
use crate::foundation::math::{Mat4, Quat, Vec3};
use std::sync::PoisonError;

/// Attribute mask shared by light and camera proxies
pub fn proxy_attrib() -> SceneNodeAttrib {
    SceneNodeAttrib::CULLABLE | SceneNodeAttrib::MOVEABLE | SceneNodeAttrib::NOT_CAST_SHADOW
}

/// Sky box node; never casts shadows
pub fn skybox_node(renderable: RenderablePtr, attrib: SceneNodeAttrib) -> SceneNode {
    SceneNode::with_renderable_named(renderable, "skybox", attrib | SceneNodeAttrib::NOT_CAST_SHADOW)
}

/// Rotation taking the proxy mesh's +Z axis onto `direction`
fn rotation_towards(direction: &Vec3) -> Quat {
    Quat::rotation_between(&Vec3::z(), direction).unwrap_or_else(|| {
        if direction.z < 0.0 {
            Quat::from_axis_angle(&Vec3::x_axis(), std::f32::consts::PI)
        } else {
            Quat::identity()
        }
    })
}

/// Local transform placing a proxy mesh on `light`
pub fn light_proxy_matrix(light: &LightSource, scaling: &Vec3) -> Mat4 {
    let mut model = Mat4::new_translation(&light.position)
        * rotation_towards(&light.direction).to_homogeneous()
        * Mat4::new_nonuniform_scaling(scaling);

    if light.light_type == LightType::Spot {
        let radius = light.outer_cone.tan();
        model *= Mat4::new_nonuniform_scaling(&Vec3::new(radius, radius, 1.0));
    }
    model
}

/// Node drawing `proxy` at a light's position and orientation
///
/// The transform follows the light on every main-thread update.
pub fn light_source_proxy(light: LightPtr, proxy: RenderablePtr, scaling: Vec3) -> SceneNode {
    let mut node = SceneNode::with_renderable_named(proxy, "light_proxy", proxy_attrib());
    node.bind_main_thread_update(move |node, _, _| {
        let light = light.read().unwrap_or_else(PoisonError::into_inner);
        node.set_model_matrix(light_proxy_matrix(&light, &scaling));
    });
    node
}

/// Node drawing `proxy` where a camera is
///
/// The transform is recomputed from the camera's inverse view matrix on the
/// background thread.
pub fn camera_proxy(camera: CameraPtr, proxy: RenderablePtr, scaling: Vec3) -> SceneNode {
    let mut node = SceneNode::with_renderable_named(proxy, "camera_proxy", proxy_attrib());
    node.bind_sub_thread_update(move |ctx, _, _| {
        let camera = camera.read().unwrap_or_else(PoisonError::into_inner);
        ctx.set_model_matrix(camera.inverse_view_matrix() * Mat4::new_nonuniform_scaling(&scaling));
    });
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Point3;
    use crate::scene::bounds::Aabb;
    use crate::scene::camera::Camera;
    use crate::scene::renderable::{StaticMesh, TechniqueId};
    use crate::scene::scene_graph::SceneGraph;
    use crate::scene::scene_node::NodeId;
    use approx::assert_relative_eq;

    fn proxy_mesh() -> RenderablePtr {
        StaticMesh::new("proxy", Aabb::cube(0.5), TechniqueId(42)).into_ptr()
    }

    #[test]
    fn test_skybox_never_casts_shadow() {
        let node = skybox_node(proxy_mesh(), SceneNodeAttrib::empty());
        assert!(!node.casts_shadow());
        assert_eq!(node.name(), "skybox");
    }

    #[test]
    fn test_light_proxy_follows_light() {
        let light = LightSource::point(Vec3::new(1.0, 2.0, 3.0), Vec3::new(1.0, 1.0, 1.0), 1.0, 10.0).into_ptr();
        let mut graph = SceneGraph::new();
        let id = graph.insert(light_source_proxy(light.clone(), proxy_mesh(), Vec3::new(1.0, 1.0, 1.0)));
        assert_eq!(graph[id].attrib(), proxy_attrib());

        graph.main_thread_update(id, 0.0, 0.0);
        let origin = graph[id].model_matrix().transform_point(&Point3::origin());
        assert_relative_eq!(origin.coords, Vec3::new(1.0, 2.0, 3.0));

        light.write().unwrap().position = Vec3::new(-4.0, 0.0, 0.0);
        graph.main_thread_update(id, 0.1, 0.1);
        let origin = graph[id].model_matrix().transform_point(&Point3::origin());
        assert_relative_eq!(origin.coords, Vec3::new(-4.0, 0.0, 0.0));
    }

    #[test]
    fn test_spot_proxy_widens_with_cone() {
        let light = LightSource::spot(
            Vec3::zeros(),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            1.0,
            10.0,
            0.2,
            std::f32::consts::FRAC_PI_4,
        );
        let model = light_proxy_matrix(&light, &Vec3::new(1.0, 1.0, 1.0));
        let tip = model.transform_point(&Point3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(tip.coords, Vec3::new(1.0, 1.0, 1.0), epsilon = 1e-5);

        let narrow = LightSource { outer_cone: 0.1, ..light };
        let model = light_proxy_matrix(&narrow, &Vec3::new(1.0, 1.0, 1.0));
        let tip = model.transform_point(&Point3::new(1.0, 0.0, 1.0));
        assert!(tip.x < 0.2);
    }

    #[test]
    fn test_camera_proxy_sits_at_eye() {
        let camera = Camera::perspective(Vec3::new(0.0, 5.0, 5.0), 60.0, 1.0, 0.1, 100.0).into_ptr();
        let mut node = camera_proxy(camera, proxy_mesh(), Vec3::new(1.0, 1.0, 1.0));
        node.sub_thread_update(NodeId::default(), 0.0, 0.0);

        let eye = node.model_matrix().transform_point(&Point3::origin());
        assert_relative_eq!(eye.coords, Vec3::new(0.0, 5.0, 5.0), epsilon = 1e-4);
    }
}
