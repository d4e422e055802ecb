//! Scene Manager
//!
//! Owns the scene graph together with the camera, light and node registries,
//! and drives the per-frame pipeline:
//!
//! 1. Barrier: collect the background tick started last frame (or run the
//!    background callbacks inline when suspended) and apply its staged
//!    transforms
//! 2. Reset frame statistics
//! 3. Main-thread node updates, then absolute transforms top-down
//! 4. Culling for every camera ([`SceneManager::clip_scene`])
//! 5. Render-queue assembly per camera
//! 6. Start the next background tick, release the lock, submit the queues
//!
//! All registries live in one [`SceneState`] behind a single mutex. The main
//! thread never waits on the background worker while holding that mutex, so
//! background callbacks may register nodes through a [`SceneHandle`].

use super::bounds::{Aabb, BoundOverlap, Frustum, Obb, Sphere};
use super::camera::{Camera, CameraPtr};
use super::culling::CullContext;
use super::light::LightPtr;
use super::render_backend::RenderBackend;
use super::render_queue::RenderQueue;
use super::renderable::RenderablePtr;
use super::scene_graph::SceneGraph;
use super::scene_node::{NodeId, SceneNode};
use super::stats::FrameStats;
use super::update_thread::{run_jobs, StagedFrame, SubThreadJob, UpdateCadence, UpdateThread, UpdateTick};
use crate::config::SceneConfig;
use crate::error::SceneError;
use crate::foundation::time::Timer;
use slotmap::SecondaryMap;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLockReadGuard, Weak};

/// Kind of pass the queues are built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassCategory {
    /// Regular colour pass
    #[default]
    Color,
    /// Shadow-map pass; nodes flagged `NOT_CAST_SHADOW` are skipped
    ShadowMap,
}

/// Everything guarded by the scene mutex
#[derive(Debug, Default)]
pub struct SceneState {
    graph: SceneGraph,
    cameras: Vec<CameraPtr>,
    lights: Vec<LightPtr>,
    scene_nodes: Vec<NodeId>,
    overlay_nodes: Vec<NodeId>,
}

impl SceneState {
    /// Node arena
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// Mutable node arena
    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    /// Move a node into the arena without registering it
    pub fn insert(&mut self, node: SceneNode) -> NodeId {
        self.graph.insert(node)
    }

    /// Insert a node and register it (with any sub-part children)
    pub fn spawn(&mut self, node: SceneNode) -> NodeId {
        let id = self.graph.insert(node);
        self.add_scene_node(id);
        id
    }

    fn register(&mut self, id: NodeId) {
        let node = &mut self.graph[id];
        node.registered = true;
        if node.is_overlay() {
            self.overlay_nodes.push(id);
        } else {
            self.scene_nodes.push(id);
        }
    }

    /// Register `id` and every unregistered descendant, parents first
    ///
    /// # Panics
    /// Panics when `id` is already registered.
    pub fn add_scene_node(&mut self, id: NodeId) {
        assert!(
            !self.graph[id].registered,
            "scene node {id:?} is already registered"
        );

        for node_id in self.graph.subtree(id) {
            if !self.graph[node_id].registered {
                self.register(node_id);
            }
        }
    }

    /// Unregister `id` and its descendants. The nodes stay in the arena.
    /// Returns false when `id` is dead or was not registered.
    pub fn del_scene_node(&mut self, id: NodeId) -> bool {
        if !self.graph.get(id).is_some_and(SceneNode::is_registered) {
            return false;
        }

        for node_id in self.graph.subtree(id).into_iter().rev() {
            self.graph[node_id].registered = false;
        }

        let graph = &self.graph;
        let still_registered = |node_id: &NodeId| graph.get(*node_id).is_some_and(SceneNode::is_registered);
        self.scene_nodes.retain(still_registered);
        self.overlay_nodes.retain(still_registered);
        true
    }

    /// Unregister and free `id` with its whole subtree
    pub fn destroy_node(&mut self, id: NodeId) {
        if !self.graph.contains(id) {
            return;
        }
        self.del_scene_node(id);
        self.graph.remove_subtree(id);
    }

    /// Attach a renderable to a node. Sub-part children of a composite are
    /// registered immediately when the node is registered.
    pub fn attach_renderable(&mut self, id: NodeId, renderable: RenderablePtr) -> Vec<NodeId> {
        let spawned = self.graph.add_renderable(id, renderable);
        self.register_spawned(id, &spawned);
        spawned
    }

    fn register_spawned(&mut self, parent: NodeId, spawned: &[NodeId]) {
        if self.graph[parent].registered {
            for &child in spawned {
                if !self.graph[child].registered {
                    self.register(child);
                }
            }
        }
    }

    /// Registered non-overlay nodes, parents before children
    pub fn scene_nodes(&self) -> &[NodeId] {
        &self.scene_nodes
    }

    /// Registered overlay nodes
    pub fn overlay_nodes(&self) -> &[NodeId] {
        &self.overlay_nodes
    }

    /// Registered cameras
    pub fn cameras(&self) -> &[CameraPtr] {
        &self.cameras
    }

    /// Registered lights
    pub fn lights(&self) -> &[LightPtr] {
        &self.lights
    }

    /// Registered nodes whose parent is not walked by culling
    fn cull_roots(&self) -> Vec<NodeId> {
        self.scene_nodes
            .iter()
            .copied()
            .filter(|&id| match self.graph[id].parent() {
                None => true,
                Some(parent) => {
                    let parent = &self.graph[parent];
                    !parent.registered || parent.is_overlay()
                }
            })
            .collect()
    }

    fn gather_jobs(&self) -> Vec<SubThreadJob> {
        self.scene_nodes
            .iter()
            .chain(&self.overlay_nodes)
            .filter_map(|&id| {
                let node = &self.graph[id];
                node.sub_thread_update_fn().map(|func| SubThreadJob {
                    node: id,
                    func: Arc::clone(func),
                    model: *node.model_matrix(),
                    attrib: node.attrib(),
                })
            })
            .collect()
    }

    fn apply_staged(&mut self, frame: &StagedFrame) {
        for (id, model) in &frame.transforms {
            if let Some(node) = self.graph.get_mut(*id) {
                node.set_model_matrix(*model);
            }
        }
    }

    fn main_thread_updates(&mut self, app_time: f32, elapsed_time: f32) {
        let mut work: VecDeque<NodeId> = self
            .scene_nodes
            .iter()
            .chain(&self.overlay_nodes)
            .copied()
            .collect();

        while let Some(id) = work.pop_front() {
            let update = self.graph.main_thread_update(id, app_time, elapsed_time);
            if !update.spawned.is_empty() {
                self.register_spawned(id, &update.spawned);
                work.extend(update.spawned);
            }
        }
    }

    fn update_transforms(&mut self) {
        let roots: Vec<NodeId> = self
            .scene_nodes
            .iter()
            .chain(&self.overlay_nodes)
            .copied()
            .filter(|&id| {
                self.graph[id]
                    .parent()
                    .map_or(true, |parent| !self.graph[parent].registered)
            })
            .collect();

        for root in roots {
            self.graph.update_transforms(root);
        }
    }
}

/// Cloneable access to the scene state from any thread
///
/// Holds a weak reference: a handle captured by a node callback does not keep
/// the scene alive, and every access fails with [`SceneError::SceneDropped`]
/// once the manager is gone.
#[derive(Clone)]
pub struct SceneHandle {
    state: Weak<Mutex<SceneState>>,
}

impl SceneHandle {
    /// Run `f` with the scene locked
    pub fn with_scene<R>(&self, f: impl FnOnce(&mut SceneState) -> R) -> Result<R, SceneError> {
        let state = self.state.upgrade().ok_or(SceneError::SceneDropped)?;
        let mut guard = lock_state(&state);
        Ok(f(&mut guard))
    }

    /// Register an arena node (and its subtree)
    ///
    /// # Panics
    /// Panics when the node is already registered.
    pub fn add_scene_node_locked(&self, id: NodeId) -> Result<(), SceneError> {
        self.with_scene(|state| state.add_scene_node(id))
    }

    /// Insert a node into the arena and register it
    pub fn spawn_scene_node_locked(&self, node: SceneNode) -> Result<NodeId, SceneError> {
        self.with_scene(|state| state.spawn(node))
    }

    /// Unregister a node (and its subtree)
    pub fn del_scene_node_locked(&self, id: NodeId) -> Result<bool, SceneError> {
        self.with_scene(|state| state.del_scene_node(id))
    }
}

fn lock_state(state: &Mutex<SceneState>) -> MutexGuard<'_, SceneState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read_camera(camera: &CameraPtr) -> RwLockReadGuard<'_, Camera> {
    camera.read().unwrap_or_else(PoisonError::into_inner)
}

fn camera_key(camera: &CameraPtr) -> usize {
    Arc::as_ptr(camera) as usize
}

/// Scene manager
///
/// Registry edits (cameras, lights, nodes) take `&mut self` and queries take
/// `&self`. Registration from other threads goes through a [`SceneHandle`].
///
/// Main-thread callbacks run with the scene locked and must not lock it again
/// through a [`SceneHandle`]. Background callbacks run unlocked.
pub struct SceneManager {
    state: Arc<Mutex<SceneState>>,
    config: SceneConfig,

    update_thread: Option<UpdateThread>,
    cadence: UpdateCadence,
    generation: u64,
    pending_frame: Option<StagedFrame>,

    visible_marks: HashMap<usize, SecondaryMap<NodeId, BoundOverlap>>,
    last_frustum: Option<Frustum>,
    render_queues: Vec<RenderQueue>,
    immediate: Vec<RenderablePtr>,
    pass_category: PassCategory,
    stats: FrameStats,
    timer: Timer,
}

impl SceneManager {
    /// Create a manager, starting the background thread when configured
    pub fn new(config: SceneConfig) -> Result<Self, SceneError> {
        config.validate()?;

        let update_thread = if config.background_thread {
            Some(UpdateThread::spawn()?)
        } else {
            None
        };

        log::info!(
            "Scene manager created (background thread: {}, update elapse: {:.4}s, small object threshold: {})",
            config.background_thread,
            config.update_elapse,
            config.small_object_threshold
        );

        Ok(Self {
            state: Arc::new(Mutex::new(SceneState::default())),
            cadence: UpdateCadence::new(config.update_elapse),
            config,
            update_thread,
            generation: 0,
            pending_frame: None,
            visible_marks: HashMap::new(),
            last_frustum: None,
            render_queues: Vec::new(),
            immediate: Vec::new(),
            pass_category: PassCategory::Color,
            stats: FrameStats::default(),
            timer: Timer::new(),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Lock the scene state
    pub fn scene(&self) -> MutexGuard<'_, SceneState> {
        lock_state(&self.state)
    }

    /// Handle for use from other threads and from background callbacks
    pub fn handle(&self) -> SceneHandle {
        SceneHandle {
            state: Arc::downgrade(&self.state),
        }
    }

    // ---- background thread control ----

    /// Stop the background thread at a quiescent point
    ///
    /// A tick still in flight is collected and applied on the next update.
    /// Until [`SceneManager::resume`] background callbacks run inline.
    pub fn suspend(&mut self) -> Result<(), SceneError> {
        let Some(thread) = self.update_thread.take() else {
            return Ok(());
        };

        if let Some(frame) = thread.shutdown()? {
            self.stash(frame);
        }
        log::info!("Scene update thread suspended");
        Ok(())
    }

    /// Restart the background thread
    pub fn resume(&mut self) -> Result<(), SceneError> {
        if self.update_thread.is_some() || !self.config.background_thread {
            return Ok(());
        }
        self.update_thread = Some(UpdateThread::spawn()?);
        log::info!("Scene update thread resumed");
        Ok(())
    }

    /// Whether background callbacks currently run inline
    pub fn is_suspended(&self) -> bool {
        self.update_thread.is_none()
    }

    fn stash(&mut self, frame: StagedFrame) {
        match self.pending_frame.as_mut() {
            Some(pending) => pending.merge(frame),
            None => self.pending_frame = Some(frame),
        }
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    // ---- configuration ----

    /// Viewport fraction below which bounded nodes are culled (0 disables)
    pub fn set_small_object_threshold(&mut self, area: f32) {
        self.config.small_object_threshold = area;
    }

    /// Minimum seconds between background ticks
    pub fn set_scene_update_elapse(&mut self, elapse: f32) {
        self.config.update_elapse = elapse;
        self.cadence.set_elapse(elapse);
    }

    /// Restrict queues to the given kind of pass
    pub fn set_pass_category(&mut self, category: PassCategory) {
        self.pass_category = category;
    }

    /// Current pass category
    pub fn pass_category(&self) -> PassCategory {
        self.pass_category
    }

    // ---- cameras ----

    /// Register a camera
    pub fn add_camera(&mut self, camera: CameraPtr) {
        self.scene().cameras.push(camera);
    }

    /// Unregister a camera (by identity)
    pub fn del_camera(&mut self, camera: &CameraPtr) -> bool {
        self.visible_marks.remove(&camera_key(camera));
        let mut state = self.scene();
        let before = state.cameras.len();
        state.cameras.retain(|c| !Arc::ptr_eq(c, camera));
        state.cameras.len() != before
    }

    /// Number of cameras
    pub fn num_cameras(&self) -> usize {
        self.scene().cameras.len()
    }

    /// Camera at `index`
    ///
    /// # Panics
    /// Panics when `index` is out of range.
    pub fn camera(&self, index: usize) -> CameraPtr {
        Arc::clone(&self.scene().cameras[index])
    }

    /// Unregister every camera
    pub fn clear_cameras(&mut self) {
        self.scene().cameras.clear();
        self.visible_marks.clear();
    }

    // ---- lights ----

    /// Register a light
    pub fn add_light(&mut self, light: LightPtr) {
        self.scene().lights.push(light);
    }

    /// Unregister a light (by identity)
    pub fn del_light(&mut self, light: &LightPtr) -> bool {
        let mut state = self.scene();
        let before = state.lights.len();
        state.lights.retain(|l| !Arc::ptr_eq(l, light));
        state.lights.len() != before
    }

    /// Number of lights
    pub fn num_lights(&self) -> usize {
        self.scene().lights.len()
    }

    /// Light at `index`
    ///
    /// # Panics
    /// Panics when `index` is out of range.
    pub fn light(&self, index: usize) -> LightPtr {
        Arc::clone(&self.scene().lights[index])
    }

    /// Unregister every light
    pub fn clear_lights(&mut self) {
        self.scene().lights.clear();
    }

    // ---- scene nodes ----

    /// Insert a node into the arena and register it
    pub fn add_node(&mut self, node: SceneNode) -> NodeId {
        self.scene().spawn(node)
    }

    /// Register an arena node and its subtree
    ///
    /// # Panics
    /// Panics when the node is already registered.
    pub fn add_scene_node(&mut self, id: NodeId) {
        self.scene().add_scene_node(id);
    }

    /// Unregister a node and its subtree
    pub fn del_scene_node(&mut self, id: NodeId) -> bool {
        self.scene().del_scene_node(id)
    }

    /// Number of registered non-overlay nodes
    pub fn num_scene_nodes(&self) -> usize {
        self.scene().scene_nodes.len()
    }

    /// Registered node at `index`
    ///
    /// # Panics
    /// Panics when `index` is out of range.
    pub fn scene_node(&self, index: usize) -> NodeId {
        self.scene().scene_nodes[index]
    }

    /// Number of registered overlay nodes
    pub fn num_overlay_nodes(&self) -> usize {
        self.scene().overlay_nodes.len()
    }

    /// Unregister and free every node
    pub fn clear_objects(&mut self) {
        let mut state = self.scene();
        state.scene_nodes.clear();
        state.overlay_nodes.clear();
        state.graph.clear();
        drop(state);

        self.visible_marks.values_mut().for_each(SecondaryMap::clear);
        self.render_queues.iter_mut().for_each(RenderQueue::clear);
        self.pending_frame = None;
    }

    /// Queue a renderable for every camera in the next frame, bypassing
    /// culling
    pub fn add_renderable(&mut self, renderable: RenderablePtr) {
        self.immediate.push(renderable);
    }

    // ---- visibility queries ----

    /// Classify a box against the most recently culled camera (`Yes` before
    /// any culling pass)
    pub fn aabb_visible(&self, aabb: &Aabb) -> BoundOverlap {
        self.last_frustum
            .as_ref()
            .map_or(BoundOverlap::Yes, |f| f.aabb_visible(aabb))
    }

    /// Classify an oriented box against the most recently culled camera
    pub fn obb_visible(&self, obb: &Obb) -> BoundOverlap {
        self.last_frustum
            .as_ref()
            .map_or(BoundOverlap::Yes, |f| f.obb_visible(obb))
    }

    /// Classify a sphere against the most recently culled camera
    pub fn sphere_visible(&self, sphere: &Sphere) -> BoundOverlap {
        self.last_frustum
            .as_ref()
            .map_or(BoundOverlap::Yes, |f| f.sphere_visible(sphere))
    }

    /// Classify a frustum against the most recently culled camera
    pub fn frustum_visible(&self, frustum: &Frustum) -> BoundOverlap {
        self.last_frustum
            .as_ref()
            .map_or(BoundOverlap::Yes, |f| f.frustum_visible(frustum))
    }

    /// Mark of `node` for `camera` from the last culling pass
    pub fn visible_mark(&self, camera: &CameraPtr, node: NodeId) -> BoundOverlap {
        self.visible_marks
            .get(&camera_key(camera))
            .and_then(|marks| marks.get(node).copied())
            .unwrap_or_default()
    }

    // ---- culling ----

    /// Cull the registered nodes against every camera
    pub fn clip_scene(&mut self) {
        let shared = Arc::clone(&self.state);
        let mut state = lock_state(&shared);
        self.clip_scene_locked(&mut state);
    }

    fn clip_scene_locked(&mut self, state: &mut SceneState) {
        let live: HashSet<usize> = state.cameras.iter().map(camera_key).collect();
        self.visible_marks.retain(|key, _| live.contains(key));

        let roots = state.cull_roots();
        let cameras = state.cameras.clone();

        for camera in &cameras {
            let ctx = CullContext::from_camera(&read_camera(camera), self.config.small_object_threshold);
            let marks = self.visible_marks.entry(camera_key(camera)).or_default();
            marks.clear();

            let graph = &mut state.graph;
            let mut stack: Vec<(NodeId, BoundOverlap)> =
                roots.iter().rev().map(|&id| (id, BoundOverlap::Partial)).collect();
            while let Some((id, parent_mark)) = stack.pop() {
                let test = ctx.visible_test_from_parent(&graph[id], parent_mark);
                graph[id].set_visible_mark(test.mark);
                marks.insert(id, test.mark);

                for &child in graph[id].children().iter().rev() {
                    let child_node = &graph[child];
                    if child_node.registered && !child_node.is_overlay() {
                        stack.push((child, test.children));
                    }
                }
            }

            for &id in &state.overlay_nodes {
                let node = &mut state.graph[id];
                let mark = if node.visible() {
                    BoundOverlap::Yes
                } else {
                    BoundOverlap::No
                };
                node.set_visible_mark(mark);
                marks.insert(id, mark);
            }

            self.last_frustum = Some(ctx.frustum);
        }

        log::trace!(
            "Culled {} nodes against {} cameras",
            state.scene_nodes.len(),
            cameras.len()
        );
    }

    // ---- queue assembly ----

    fn flush(&mut self, state: &SceneState, camera: &CameraPtr, queue: &mut RenderQueue) {
        queue.clear();

        let Some(marks) = self.visible_marks.get(&camera_key(camera)) else {
            return;
        };
        let shadow_pass = self.pass_category == PassCategory::ShadowMap;
        let stats = &mut self.stats;

        let mut collect = |id: NodeId, queue: &mut RenderQueue, overlay: bool| {
            let node = &state.graph[id];
            if marks.get(id).map_or(true, |&mark| mark == BoundOverlap::No) {
                return;
            }
            if shadow_pass && !node.casts_shadow() {
                return;
            }

            let mut added = false;
            for slot in node.renderable_slots() {
                if slot.expanded || !slot.hw_ready {
                    continue;
                }
                stats.add_renderable(&*slot.renderable);
                if overlay {
                    queue.push_overlay(Arc::clone(&slot.renderable));
                } else {
                    queue.push(Arc::clone(&slot.renderable));
                }
                added = true;
            }
            if added {
                stats.objects += 1;
            }
        };

        for &id in &state.scene_nodes {
            collect(id, &mut *queue, false);
        }
        for &id in &state.overlay_nodes {
            collect(id, &mut *queue, true);
        }

        for renderable in &self.immediate {
            self.stats.add_renderable(&**renderable);
            queue.push(Arc::clone(renderable));
        }
    }

    // ---- frame ----

    /// Run one frame using the internal clock
    pub fn update(&mut self, backend: &mut dyn RenderBackend) -> Result<(), SceneError> {
        self.timer.update();
        let app_time = self.timer.total_time();
        let elapsed_time = self.timer.delta_time();
        self.update_with_time(app_time, elapsed_time, backend)
    }

    /// Run one frame at the given application time
    pub fn update_with_time(
        &mut self,
        app_time: f32,
        elapsed_time: f32,
        backend: &mut dyn RenderBackend,
    ) -> Result<(), SceneError> {
        // 1. barrier
        if let Some(thread) = self.update_thread.as_mut() {
            if let Some(frame) = thread.wait()? {
                self.stash(frame);
            }
        } else if let Some(tick_elapsed) = self.cadence.poll(app_time) {
            let jobs = self.scene().gather_jobs();
            let generation = self.next_generation();
            let frame = run_jobs(UpdateTick {
                generation,
                app_time,
                elapsed_time: tick_elapsed,
                jobs,
            });
            self.stash(frame);
        }

        let shared = Arc::clone(&self.state);
        let mut state = lock_state(&shared);

        if let Some(frame) = self.pending_frame.take() {
            state.apply_staged(&frame);
        }

        // 2. statistics
        self.stats.reset();

        // 3. main-thread updates and transforms
        state.main_thread_updates(app_time, elapsed_time);
        state.update_transforms();

        // 4. culling
        self.clip_scene_locked(&mut state);

        // 5. queues
        let cameras = state.cameras.clone();
        let mut queues = std::mem::take(&mut self.render_queues);
        queues.resize_with(cameras.len(), RenderQueue::new);
        for (camera, queue) in cameras.iter().zip(queues.iter_mut()) {
            self.flush(&state, camera, queue);
        }
        self.render_queues = queues;
        self.immediate.clear();

        // 6. next tick, then submit unlocked
        let next_tick = match self.update_thread {
            Some(_) => self.cadence.poll(app_time).map(|tick_elapsed| (tick_elapsed, state.gather_jobs())),
            None => None,
        };
        drop(state);

        if let Some((tick_elapsed, jobs)) = next_tick {
            let generation = self.next_generation();
            if let Some(thread) = self.update_thread.as_mut() {
                thread.kick(UpdateTick {
                    generation,
                    app_time,
                    elapsed_time: tick_elapsed,
                    jobs,
                })?;
            }
        }

        for (camera, queue) in cameras.iter().zip(&self.render_queues) {
            let report = backend.render(&read_camera(camera), queue);
            self.stats.add_backend_report(report);
        }

        log::trace!(
            "Frame at {:.3}s: {} objects, {} renderables, {} draw calls",
            app_time,
            self.stats.objects,
            self.stats.renderables,
            self.stats.draw_calls
        );
        Ok(())
    }

    // ---- statistics ----

    /// Counters of the last frame
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Nodes that contributed renderables in the last frame
    pub fn num_objects_rendered(&self) -> u32 {
        self.stats.objects
    }

    /// Renderables queued in the last frame
    pub fn num_renderables_rendered(&self) -> u32 {
        self.stats.renderables
    }

    /// Primitives queued in the last frame
    pub fn num_primitives_rendered(&self) -> u32 {
        self.stats.primitives
    }

    /// Vertices queued in the last frame
    pub fn num_vertices_rendered(&self) -> u32 {
        self.stats.vertices
    }

    /// Draw calls reported by the backend in the last frame
    pub fn num_draw_calls(&self) -> u32 {
        self.stats.draw_calls
    }

    /// Dispatch calls reported by the backend in the last frame
    pub fn num_dispatch_calls(&self) -> u32 {
        self.stats.dispatch_calls
    }

    /// Queue built for camera `index` in the last frame
    ///
    /// # Panics
    /// Panics when `index` is out of range.
    pub fn render_queue(&self, index: usize) -> &RenderQueue {
        &self.render_queues[index]
    }

    /// Queues built in the last frame, one per camera
    pub fn render_queues(&self) -> &[RenderQueue] {
        &self.render_queues
    }
}
