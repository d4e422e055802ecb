//! Headless scene demo
//!
//! Builds an asteroid field around a ship, lets the background thread spin
//! the rocks, orbits a light, and runs a fixed number of frames through a
//! recording backend while logging what the culler let through.
//!
//! Usage: `scene_demo [config.toml|config.ron]`

use rand::{rngs::StdRng, Rng, SeedableRng};
use scene_engine::foundation::logging;
use scene_engine::foundation::math::{Quat, Vec3};
use scene_engine::prelude::*;
use scene_engine::scene::helpers;
use std::sync::PoisonError;

const FRAMES: u32 = 300;
const FRAME_TIME: f32 = 1.0 / 60.0;
const ASTEROIDS: usize = 200;
const FIELD_RADIUS: f32 = 60.0;

fn load_config() -> Result<SceneConfig, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading scene config from {}", path);
            Ok(SceneConfig::load_from_file(&path)?)
        }
        None => Ok(SceneConfig::default().with_small_object_threshold(0.0005)),
    }
}

fn asteroid(rng: &mut StdRng, rock: &RenderablePtr) -> SceneNode {
    let position = Vec3::new(
        rng.gen_range(-FIELD_RADIUS..FIELD_RADIUS),
        rng.gen_range(-FIELD_RADIUS * 0.25..FIELD_RADIUS * 0.25),
        rng.gen_range(-FIELD_RADIUS..FIELD_RADIUS),
    );
    let axis = nalgebra::Unit::new_normalize(Vec3::new(rng.gen(), rng.gen(), rng.gen::<f32>() + 0.1));
    let spin = rng.gen_range(0.2..2.0);
    let scale = rng.gen_range(0.3..3.0);

    let mut node = SceneNode::with_renderable_named(
        RenderablePtr::clone(rock),
        "asteroid",
        SceneNodeAttrib::CULLABLE | SceneNodeAttrib::MOVEABLE,
    );
    node.bind_sub_thread_update(move |ctx, app_time: f32, _elapsed: f32| {
        let rotation = Quat::from_axis_angle(&axis, spin * app_time);
        ctx.set_model_matrix(
            Transform::from_position_rotation(position, rotation)
                .with_uniform_scale(scale)
                .to_matrix(),
        );
    });
    node
}

fn ship() -> SceneNode {
    let hull = StaticMesh::new("hull", Aabb::from_center_extents(Vec3::zeros(), Vec3::new(1.0, 0.5, 3.0)), TechniqueId(1))
        .with_counts(4_800, 1_600)
        .into_ptr();
    let wing = |side: f32| {
        StaticMesh::new(
            "wing",
            Aabb::from_center_extents(Vec3::new(side * 2.0, 0.0, 0.5), Vec3::new(1.5, 0.1, 1.0)),
            TechniqueId(1),
        )
        .with_counts(600, 200)
        .into_ptr()
    };
    let engine = StaticMesh::new("engine", Aabb::from_center_extents(Vec3::new(0.0, 0.0, 3.2), Vec3::new(0.5, 0.5, 0.5)), TechniqueId(2))
        .with_counts(900, 300)
        .into_ptr();

    let model = RenderModel::new("ship", vec![hull, wing(-1.0), wing(1.0), engine]).into_ptr();
    let mut node = SceneNode::with_renderable_named(model, "ship", SceneNodeAttrib::CULLABLE | SceneNodeAttrib::MOVEABLE);
    node.bind_main_thread_update(|node: &mut SceneNode, app_time: f32, _elapsed: f32| {
        let bob = (app_time * 1.5).sin() * 0.5;
        node.set_model_matrix(Mat4::new_translation(&Vec3::new(0.0, bob, 0.0)));
    });
    node
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_level("info");
    log::info!("Starting scene demo...");

    let config = load_config()?;
    let mut scene = SceneManager::new(config)?;

    let main_camera = Camera::perspective(Vec3::new(0.0, 10.0, 45.0), 60.0, 16.0 / 9.0, 0.1, 200.0).into_ptr();
    let chase_camera = Camera::perspective(Vec3::new(0.0, 3.0, 12.0), 75.0, 16.0 / 9.0, 0.1, 80.0).into_ptr();
    scene.add_camera(CameraPtr::clone(&main_camera));
    scene.add_camera(CameraPtr::clone(&chase_camera));

    let sun = LightSource::directional(Vec3::new(-0.7, -1.0, 0.3), Vec3::new(1.0, 0.95, 0.9), 1.0).into_ptr();
    let beacon = LightSource::point(Vec3::new(10.0, 5.0, 0.0), Vec3::new(1.0, 0.3, 0.2), 4.0, 25.0).into_ptr();
    scene.add_light(LightPtr::clone(&sun));
    scene.add_light(LightPtr::clone(&beacon));

    let mut rng = StdRng::seed_from_u64(0x5eed);
    let rock = StaticMesh::new("rock", Aabb::cube(1.0), TechniqueId(0))
        .with_counts(2_400, 800)
        .into_ptr();
    for _ in 0..ASTEROIDS {
        scene.add_node(asteroid(&mut rng, &rock));
    }
    scene.add_node(ship());

    let marker = StaticMesh::new("marker", Aabb::cube(0.25), TechniqueId(3)).into_ptr();
    scene.add_node(helpers::light_source_proxy(LightPtr::clone(&beacon), RenderablePtr::clone(&marker), Vec3::new(1.0, 1.0, 1.0)));
    scene.add_node(helpers::camera_proxy(CameraPtr::clone(&chase_camera), marker, Vec3::new(0.5, 0.5, 0.5)));

    let sky = StaticMesh::new("sky", Aabb::cube(150.0), TechniqueId(4)).into_ptr();
    scene.add_node(helpers::skybox_node(sky, SceneNodeAttrib::empty()));
    let hud = StaticMesh::new("hud", Aabb::cube(1.0), TechniqueId(9)).into_ptr();
    scene.add_node(SceneNode::with_renderable_named(hud, "hud", SceneNodeAttrib::OVERLAY));

    log::info!(
        "Scene ready: {} scene nodes, {} overlay nodes, {} cameras, {} lights",
        scene.num_scene_nodes(),
        scene.num_overlay_nodes(),
        scene.num_cameras(),
        scene.num_lights()
    );

    let mut backend = RecordingBackend::new();
    let stopwatch = Stopwatch::start_new();
    let mut totals = FrameStats::default();

    for frame in 0..FRAMES {
        let app_time = frame as f32 * FRAME_TIME;

        {
            let mut light = beacon.write().unwrap_or_else(PoisonError::into_inner);
            light.position = Vec3::new(10.0 * app_time.cos(), 5.0, 10.0 * app_time.sin());
        }
        main_camera
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set_position(Vec3::new(45.0 * (app_time * 0.2).sin(), 10.0, 45.0 * (app_time * 0.2).cos()));

        scene.update_with_time(app_time, FRAME_TIME, &mut backend)?;

        let stats = scene.stats();
        totals.objects += stats.objects;
        totals.renderables += stats.renderables;
        totals.draw_calls += stats.draw_calls;

        if frame % 60 == 0 {
            log::info!(
                "Frame {}: {} objects, {} renderables, {} primitives, {} draw calls",
                frame,
                stats.objects,
                stats.renderables,
                stats.primitives,
                stats.draw_calls
            );
            for (index, queue) in scene.render_queues().iter().enumerate() {
                log::debug!("  camera {}: {} batches, {} renderables", index, queue.batch_count(), queue.renderable_count());
            }
        }
    }

    scene.set_pass_category(PassCategory::ShadowMap);
    scene.update_with_time(FRAMES as f32 * FRAME_TIME, FRAME_TIME, &mut backend)?;
    log::info!(
        "Shadow pass: {} casters of {} scene nodes",
        scene.num_objects_rendered(),
        scene.num_scene_nodes()
    );

    scene.suspend()?;
    let positional = scene
        .scene()
        .lights()
        .iter()
        .filter(|light| light.read().unwrap_or_else(PoisonError::into_inner).is_positional())
        .count();

    log::info!(
        "Rendered {} frames in {:.1} ms ({} passes, {} positional lights)",
        FRAMES,
        stopwatch.elapsed_millis(),
        backend.passes().len(),
        positional
    );
    log::info!(
        "Average per frame: {:.1} objects, {:.1} renderables, {:.1} draw calls",
        totals.objects as f32 / FRAMES as f32,
        totals.renderables as f32 / FRAMES as f32,
        totals.draw_calls as f32 / FRAMES as f32
    );
    log::info!("Scene demo completed");
    Ok(())
}
