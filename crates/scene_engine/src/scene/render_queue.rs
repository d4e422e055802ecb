//! Render queue for batched rendering
//!
//! Visible renderables grouped by technique, in order of first appearance.
//! One queue is built per camera per frame and handed to the render backend.

use super::renderable::{RenderablePtr, TechniqueId};
use std::collections::HashMap;

/// Renderables sharing one technique
#[derive(Clone)]
pub struct RenderBatch {
    /// Technique used by every renderable in this batch
    pub technique: TechniqueId,

    /// Renderables in submission order
    pub renderables: Vec<RenderablePtr>,
}

impl RenderBatch {
    /// Create an empty batch
    pub fn new(technique: TechniqueId) -> Self {
        Self {
            technique,
            renderables: Vec::new(),
        }
    }

    /// Number of renderables in this batch
    pub fn len(&self) -> usize {
        self.renderables.len()
    }

    /// Whether the batch holds nothing
    pub fn is_empty(&self) -> bool {
        self.renderables.is_empty()
    }
}

impl std::fmt::Debug for RenderBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderBatch")
            .field("technique", &self.technique)
            .field("renderables", &self.renderables.len())
            .finish()
    }
}

/// Per-technique render queue for one camera
///
/// Scene batches are culled; overlay batches are drawn after them without
/// culling.
#[derive(Debug, Default, Clone)]
pub struct RenderQueue {
    batches: Vec<RenderBatch>,
    overlay_batches: Vec<RenderBatch>,
    index: HashMap<TechniqueId, usize>,
    overlay_index: HashMap<TechniqueId, usize>,
}

impl RenderQueue {
    /// Create an empty render queue
    pub fn new() -> Self {
        Self::default()
    }

    fn push_into(
        batches: &mut Vec<RenderBatch>,
        index: &mut HashMap<TechniqueId, usize>,
        renderable: RenderablePtr,
    ) {
        let technique = renderable.technique();
        let slot = *index.entry(technique).or_insert_with(|| {
            batches.push(RenderBatch::new(technique));
            batches.len() - 1
        });
        batches[slot].renderables.push(renderable);
    }

    /// Add a renderable to its technique's batch
    pub fn push(&mut self, renderable: RenderablePtr) {
        Self::push_into(&mut self.batches, &mut self.index, renderable);
    }

    /// Add an overlay renderable
    pub fn push_overlay(&mut self, renderable: RenderablePtr) {
        Self::push_into(&mut self.overlay_batches, &mut self.overlay_index, renderable);
    }

    /// Drop every batch
    pub fn clear(&mut self) {
        self.batches.clear();
        self.overlay_batches.clear();
        self.index.clear();
        self.overlay_index.clear();
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty() && self.overlay_batches.is_empty()
    }

    /// Scene batches in first-appearance order
    pub fn batches(&self) -> &[RenderBatch] {
        &self.batches
    }

    /// Overlay batches in first-appearance order
    pub fn overlay_batches(&self) -> &[RenderBatch] {
        &self.overlay_batches
    }

    /// Batch for a technique, if present
    pub fn batch(&self, technique: TechniqueId) -> Option<&RenderBatch> {
        self.index.get(&technique).map(|&slot| &self.batches[slot])
    }

    /// Total number of batches (scene and overlay)
    pub fn batch_count(&self) -> usize {
        self.batches.len() + self.overlay_batches.len()
    }

    /// Total number of queued renderables (scene and overlay)
    pub fn renderable_count(&self) -> usize {
        self.batches
            .iter()
            .chain(&self.overlay_batches)
            .map(RenderBatch::len)
            .sum()
    }

    /// Every batch, scene first, then overlay
    pub fn iter(&self) -> impl Iterator<Item = &RenderBatch> {
        self.batches.iter().chain(&self.overlay_batches)
    }
}
