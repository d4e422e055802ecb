//! Background scene update worker
//!
//! The worker never touches the scene graph. At the end of a frame the main
//! thread snapshots one [`SubThreadJob`] per node with a background callback
//! and hands them over as a numbered [`UpdateTick`]. The worker runs the
//! callbacks against [`SubThreadContext`] staging records and answers with a
//! [`StagedFrame`] that the main thread applies at the top of the next frame.

use super::scene_node::{NodeId, SceneNodeAttrib, SubThreadUpdateFn};
use crate::error::SceneError;
use crate::foundation::math::Mat4;
use crossbeam::channel::{bounded, Receiver, Sender};
use std::thread;

/// What a background callback may read and write
///
/// Changes are staged here and copied into the node when the main thread
/// applies the tick.
#[derive(Debug, Clone)]
pub struct SubThreadContext {
    node: NodeId,
    attrib: SceneNodeAttrib,
    model: Mat4,
    changed: bool,
}

impl SubThreadContext {
    /// Staging record for `node` starting from its local transform
    pub fn new(node: NodeId, attrib: SceneNodeAttrib, model: Mat4) -> Self {
        Self {
            node,
            attrib,
            model,
            changed: false,
        }
    }

    /// Node being updated
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Node attributes at snapshot time
    pub fn attrib(&self) -> SceneNodeAttrib {
        self.attrib
    }

    /// Local transform (snapshot, or the last value set)
    pub fn model_matrix(&self) -> &Mat4 {
        &self.model
    }

    /// Stage a new local transform
    pub fn set_model_matrix(&mut self, model: Mat4) {
        self.model = model;
        self.changed = true;
    }

    pub(crate) fn take_changed(self) -> Option<Mat4> {
        self.changed.then_some(self.model)
    }
}

/// Snapshot of one node's background work
#[derive(Clone)]
pub struct SubThreadJob {
    /// Node the result belongs to
    pub node: NodeId,
    /// Callback to run
    pub func: SubThreadUpdateFn,
    /// Local transform at snapshot time
    pub model: Mat4,
    /// Attributes at snapshot time
    pub attrib: SceneNodeAttrib,
}

/// One background tick
pub struct UpdateTick {
    /// Monotonic tick number
    pub generation: u64,
    /// Application time in seconds
    pub app_time: f32,
    /// Seconds since the previous tick
    pub elapsed_time: f32,
    /// Per-node work
    pub jobs: Vec<SubThreadJob>,
}

/// Results of one background tick
#[derive(Debug, Clone, Default)]
pub struct StagedFrame {
    /// Tick number this frame answers
    pub generation: u64,
    /// New local transforms
    pub transforms: Vec<(NodeId, Mat4)>,
}

impl StagedFrame {
    /// Whether the tick produced no changes
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Fold a later frame into this one. Later transforms win.
    pub fn merge(&mut self, later: StagedFrame) {
        self.generation = later.generation;
        self.transforms.extend(later.transforms);
    }
}

/// Run every job of a tick, in order
pub fn run_jobs(tick: UpdateTick) -> StagedFrame {
    let UpdateTick {
        generation,
        app_time,
        elapsed_time,
        jobs,
    } = tick;

    let mut transforms = Vec::new();
    for job in jobs {
        let mut context = SubThreadContext::new(job.node, job.attrib, job.model);
        (job.func)(&mut context, app_time, elapsed_time);
        if let Some(model) = context.take_changed() {
            transforms.push((job.node, model));
        }
    }

    StagedFrame {
        generation,
        transforms,
    }
}

/// Gates background ticks by a minimum interval
#[derive(Debug, Clone)]
pub struct UpdateCadence {
    elapse: f32,
    last: Option<f32>,
}

impl UpdateCadence {
    /// Tick at most once every `elapse` seconds
    pub fn new(elapse: f32) -> Self {
        Self { elapse, last: None }
    }

    /// Minimum interval in seconds
    pub fn elapse(&self) -> f32 {
        self.elapse
    }

    /// Change the interval
    pub fn set_elapse(&mut self, elapse: f32) {
        self.elapse = elapse;
    }

    /// Returns the elapsed time since the previous tick when a tick is due
    /// at `app_time`. The first poll is always due, with zero elapsed time.
    pub fn poll(&mut self, app_time: f32) -> Option<f32> {
        match self.last {
            None => {
                self.last = Some(app_time);
                Some(0.0)
            }
            Some(last) if app_time - last >= self.elapse => {
                self.last = Some(app_time);
                Some(app_time - last)
            }
            Some(_) => None,
        }
    }
}

enum WorkerMessage {
    Tick(UpdateTick),
    Quit,
}

/// Handle to the running worker thread
pub(crate) struct UpdateThread {
    sender: Sender<WorkerMessage>,
    receiver: Receiver<StagedFrame>,
    handle: Option<thread::JoinHandle<()>>,
    in_flight: Option<u64>,
}

impl UpdateThread {
    /// Start the worker
    pub(crate) fn spawn() -> Result<Self, SceneError> {
        let (sender, work) = bounded::<WorkerMessage>(1);
        let (results, receiver) = bounded::<StagedFrame>(1);

        let handle = thread::Builder::new()
            .name("scene-update".to_string())
            .spawn(move || loop {
                match work.recv() {
                    Ok(WorkerMessage::Tick(tick)) => {
                        let staged = run_jobs(tick);
                        if results.send(staged).is_err() {
                            break;
                        }
                    }
                    Ok(WorkerMessage::Quit) | Err(_) => break,
                }
            })
            .map_err(SceneError::ThreadSpawn)?;

        log::debug!("Scene update thread started");

        Ok(Self {
            sender,
            receiver,
            handle: Some(handle),
            in_flight: None,
        })
    }

    /// Whether a tick has been sent and not yet collected
    pub(crate) fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Send a tick. At most one tick is in flight.
    pub(crate) fn kick(&mut self, tick: UpdateTick) -> Result<(), SceneError> {
        debug_assert!(self.in_flight.is_none(), "previous tick was not collected");
        let generation = tick.generation;
        self.sender
            .send(WorkerMessage::Tick(tick))
            .map_err(|_| SceneError::UpdateThreadDisconnected)?;
        self.in_flight = Some(generation);
        Ok(())
    }

    /// Block until the in-flight tick finishes. `Ok(None)` when nothing was
    /// in flight.
    pub(crate) fn wait(&mut self) -> Result<Option<StagedFrame>, SceneError> {
        let Some(generation) = self.in_flight.take() else {
            return Ok(None);
        };

        let staged = self
            .receiver
            .recv()
            .map_err(|_| SceneError::UpdateThreadDisconnected)?;
        debug_assert_eq!(staged.generation, generation);
        log::trace!(
            "Collected update tick {} ({} transforms)",
            staged.generation,
            staged.transforms.len()
        );
        Ok(Some(staged))
    }

    /// Stop and join the worker, returning any tick still in flight
    pub(crate) fn shutdown(mut self) -> Result<Option<StagedFrame>, SceneError> {
        let pending = self.wait();
        self.stop();
        pending
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.sender.send(WorkerMessage::Quit);
            if handle.join().is_err() {
                log::error!("Scene update thread panicked");
            } else {
                log::debug!("Scene update thread stopped");
            }
        }
    }
}

impl Drop for UpdateThread {
    fn drop(&mut self) {
        if self.in_flight.take().is_some() {
            let _ = self.receiver.recv();
        }
        self.stop();
    }
}
