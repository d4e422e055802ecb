//! Culling and queue assembly through `SceneManager::update_with_time`

use super::{cube, front_camera, inline_manager};
use crate::foundation::math::{Mat4, Vec3};
use crate::scene::{
    Aabb, BoundOverlap, RecordingBackend, RenderModel, Renderable, RenderablePtr, SceneNode, SceneNodeAttrib, StaticMesh,
    TechniqueId,
};
use approx::assert_relative_eq;
use std::sync::Arc;

#[test]
fn test_node_behind_camera_is_not_queued() {
    let mut manager = inline_manager();
    manager.add_camera(front_camera());

    let id = manager.add_node(SceneNode::with_renderable(cube(1), SceneNodeAttrib::CULLABLE));
    manager.scene().graph_mut().set_model_matrix(id, Mat4::new_translation(&Vec3::new(0.0, 0.0, 30.0)));

    let mut backend = RecordingBackend::new();
    manager.update_with_time(0.0, 0.0, &mut backend).unwrap();

    assert!(manager.render_queue(0).is_empty());
    assert_eq!(manager.num_objects_rendered(), 0);
    assert_eq!(manager.num_draw_calls(), 0);
    assert_eq!(manager.visible_mark(&manager.camera(0), id), BoundOverlap::No);
}

#[test]
fn test_node_at_origin_is_batched_and_counted() {
    let mut manager = inline_manager();
    manager.set_small_object_threshold(0.0);
    manager.add_camera(front_camera());
    manager.add_node(SceneNode::with_renderable(cube(7), SceneNodeAttrib::CULLABLE));

    let mut backend = RecordingBackend::new();
    manager.update_with_time(0.0, 0.0, &mut backend).unwrap();

    let queue = manager.render_queue(0);
    assert_eq!(queue.batch_count(), 1);
    assert_eq!(queue.batch(TechniqueId(7)).map(|b| b.len()), Some(1));

    let stats = manager.stats();
    assert_eq!(stats.objects, 1);
    assert_eq!(stats.renderables, 1);
    assert_eq!(stats.vertices, 24);
    assert_eq!(stats.primitives, 12);
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(backend.last_pass().unwrap().batches, vec![(TechniqueId(7), 1)]);
}

#[test]
fn test_composite_on_registered_node_registers_parts() {
    let mut manager = inline_manager();
    let id = manager.add_node(SceneNode::new(SceneNodeAttrib::CULLABLE));
    assert_eq!(manager.num_scene_nodes(), 1);

    let model = RenderModel::new("ship", vec![cube(1), cube(2), cube(3)]).into_ptr();
    let spawned = manager.scene().attach_renderable(id, model);

    assert_eq!(spawned.len(), 3);
    assert_eq!(manager.num_scene_nodes(), 4);
    assert_eq!(manager.scene().graph()[id].num_children(), 3);
}

#[test]
fn test_loading_composite_expands_when_ready() {
    let mut manager = inline_manager();
    manager.add_camera(front_camera());

    let model = Arc::new(RenderModel::new("ship", vec![cube(1), cube(2)]).loading());
    let ptr: RenderablePtr = model.clone();
    manager.add_node(SceneNode::with_renderable(ptr, SceneNodeAttrib::CULLABLE));

    let mut backend = RecordingBackend::new();
    manager.update_with_time(0.0, 0.0, &mut backend).unwrap();
    assert_eq!(manager.num_scene_nodes(), 1);
    assert_eq!(manager.num_renderables_rendered(), 0);

    model.mark_hw_ready();
    manager.update_with_time(0.1, 0.1, &mut backend).unwrap();
    assert_eq!(manager.num_scene_nodes(), 3);
    // the container itself is never drawn
    assert_eq!(manager.num_renderables_rendered(), 2);
    assert_eq!(manager.render_queue(0).batch_count(), 2);
}

#[test]
fn test_visible_parent_short_circuits_children() {
    let mut manager = inline_manager();
    manager.add_camera(front_camera());

    let (parent, child) = {
        let mut state = manager.scene();
        let parent = state.insert(SceneNode::with_renderable(cube(1), SceneNodeAttrib::CULLABLE));
        let child = state.insert(SceneNode::with_renderable(cube(2), SceneNodeAttrib::CULLABLE));
        state.graph_mut().add_child(parent, child);
        // child bound lies outside, but the parent box is fully inside
        state
            .graph_mut()
            .set_model_matrix(child, Mat4::new_translation(&Vec3::new(50.0, 0.0, 0.0)));
        state.add_scene_node(parent);
        (parent, child)
    };

    let mut backend = RecordingBackend::new();
    manager.update_with_time(0.0, 0.0, &mut backend).unwrap();

    let camera = manager.camera(0);
    assert_eq!(manager.visible_mark(&camera, parent), BoundOverlap::Yes);
    assert_eq!(manager.visible_mark(&camera, child), BoundOverlap::Yes);
    assert_eq!(manager.num_objects_rendered(), 2);
}

#[test]
fn test_culled_parent_short_circuits_children() {
    let mut manager = inline_manager();
    manager.add_camera(front_camera());

    let (parent, child) = {
        let mut state = manager.scene();
        let parent = state.insert(SceneNode::with_renderable(cube(1), SceneNodeAttrib::CULLABLE));
        let child = state.insert(SceneNode::with_renderable(cube(2), SceneNodeAttrib::CULLABLE));
        state.graph_mut().add_child(parent, child);
        // the child would land at the origin, in plain view
        state
            .graph_mut()
            .set_model_matrix(parent, Mat4::new_translation(&Vec3::new(50.0, 0.0, 0.0)));
        state
            .graph_mut()
            .set_model_matrix(child, Mat4::new_translation(&Vec3::new(-50.0, 0.0, 0.0)));
        state.add_scene_node(parent);
        (parent, child)
    };

    let mut backend = RecordingBackend::new();
    manager.update_with_time(0.0, 0.0, &mut backend).unwrap();

    let camera = manager.camera(0);
    assert_eq!(manager.visible_mark(&camera, parent), BoundOverlap::No);
    assert_eq!(manager.visible_mark(&camera, child), BoundOverlap::No);
    assert_eq!(manager.num_objects_rendered(), 0);
}

#[test]
fn test_visibility_cascades_through_deep_chain() {
    let mut manager = inline_manager();
    manager.add_camera(front_camera());

    let chain = {
        let mut state = manager.scene();
        let chain: Vec<_> = (0..4)
            .map(|i| state.insert(SceneNode::with_renderable(cube(i), SceneNodeAttrib::CULLABLE)))
            .collect();
        for pair in chain.windows(2) {
            state.graph_mut().add_child(pair[0], pair[1]);
        }
        state.add_scene_node(chain[0]);
        chain
    };

    let mut backend = RecordingBackend::new();
    manager.update_with_time(0.0, 0.0, &mut backend).unwrap();
    assert_eq!(manager.num_objects_rendered(), 4);

    manager.scene().graph_mut().set_visible(chain[0], false);
    manager.update_with_time(0.1, 0.1, &mut backend).unwrap();
    assert_eq!(manager.num_objects_rendered(), 0);
    assert!(chain.iter().all(|&id| !manager.scene().graph()[id].visible()));

    manager.scene().graph_mut().set_visible(chain[1], true);
    manager.update_with_time(0.2, 0.2, &mut backend).unwrap();
    // the hidden root still hides the re-shown branch
    assert_eq!(manager.num_objects_rendered(), 0);
}

#[test]
fn test_mixed_attributes_cascade() {
    let mut manager = inline_manager();
    manager.add_camera(front_camera());

    let big = StaticMesh::new("hangar", Aabb::cube(50.0), TechniqueId(0)).into_ptr();
    let (root, pass_through, outside, hidden, inside) = {
        let mut state = manager.scene();
        let graph = state.graph_mut();
        let root = graph.insert(SceneNode::with_renderable(big, SceneNodeAttrib::CULLABLE));
        let pass_through = graph.insert(SceneNode::with_renderable(cube(1), SceneNodeAttrib::empty()));
        let outside = graph.insert(SceneNode::with_renderable(cube(2), SceneNodeAttrib::CULLABLE));
        let hidden = graph.insert(SceneNode::with_renderable(cube(3), SceneNodeAttrib::CULLABLE));
        let inside = graph.insert(SceneNode::with_renderable(cube(4), SceneNodeAttrib::CULLABLE));
        graph.add_child(root, pass_through);
        graph.add_child(pass_through, outside);
        graph.add_child(pass_through, inside);
        graph.add_child(outside, hidden);
        graph.set_model_matrix(outside, Mat4::new_translation(&Vec3::new(50.0, 0.0, 0.0)));
        graph.set_model_matrix(hidden, Mat4::new_translation(&Vec3::new(-50.0, 0.0, 0.0)));
        state.add_scene_node(root);
        (root, pass_through, outside, hidden, inside)
    };

    let mut backend = RecordingBackend::new();
    manager.update_with_time(0.0, 0.0, &mut backend).unwrap();

    let camera = manager.camera(0);
    // the eye sits inside the hangar box
    assert_eq!(manager.visible_mark(&camera, root), BoundOverlap::Partial);
    // not cullable: always drawn, hands the partial mark on
    assert_eq!(manager.visible_mark(&camera, pass_through), BoundOverlap::Yes);
    assert_eq!(manager.visible_mark(&camera, outside), BoundOverlap::No);
    assert_eq!(manager.visible_mark(&camera, hidden), BoundOverlap::No);
    assert_eq!(manager.visible_mark(&camera, inside), BoundOverlap::Yes);
    assert_eq!(manager.num_objects_rendered(), 3);
}

#[test]
fn test_world_transform_moves_renderables() {
    let mut manager = inline_manager();
    manager.add_camera(front_camera());

    let mesh = Arc::new(StaticMesh::new("crate", Aabb::cube(1.0), TechniqueId(0)));
    let ptr: RenderablePtr = mesh.clone();
    let parent = manager.add_node(SceneNode::new(SceneNodeAttrib::empty()));
    {
        let mut state = manager.scene();
        let child = state.insert(SceneNode::with_renderable(ptr, SceneNodeAttrib::CULLABLE));
        state.graph_mut().add_child(parent, child);
        state.add_scene_node(child);
        state
            .graph_mut()
            .set_model_matrix(parent, Mat4::new_translation(&Vec3::new(1.0, 0.0, 0.0)));
        state
            .graph_mut()
            .set_model_matrix(child, Mat4::new_translation(&Vec3::new(0.0, 2.0, 0.0)));
    }

    let mut backend = RecordingBackend::new();
    manager.update_with_time(0.0, 0.0, &mut backend).unwrap();

    let world = mesh.model_matrix();
    assert_eq!(world, Mat4::new_translation(&Vec3::new(1.0, 2.0, 0.0)));
}

#[test]
fn test_empty_cullable_child_does_not_widen_parent() {
    let mut manager = inline_manager();
    manager.add_camera(front_camera());

    let far = StaticMesh::new(
        "far",
        Aabb::from_center_extents(Vec3::new(60.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0)),
        TechniqueId(0),
    )
    .into_ptr();
    let (parent, empty) = {
        let mut state = manager.scene();
        let parent = state.insert(SceneNode::with_renderable(far, SceneNodeAttrib::CULLABLE));
        let empty = state.insert(SceneNode::new(SceneNodeAttrib::CULLABLE));
        state.graph_mut().add_child(parent, empty);
        state.add_scene_node(parent);
        (parent, empty)
    };

    let mut backend = RecordingBackend::new();
    manager.update_with_time(0.0, 0.0, &mut backend).unwrap();

    let camera = manager.camera(0);
    assert_relative_eq!(manager.scene().graph()[parent].pos_bound_ws().unwrap().min.x, 59.0);
    assert_eq!(manager.visible_mark(&camera, parent), BoundOverlap::No);
    assert_eq!(manager.visible_mark(&camera, empty), BoundOverlap::No);
    assert_eq!(manager.num_objects_rendered(), 0);
    assert!(manager.render_queue(0).is_empty());
}
