//! Foundation module - shared building blocks for the scene layer
//!
//! - nalgebra aliases and the decomposed transform
//! - Frame clock and stopwatch
//! - Logger setup

pub mod logging;
pub mod math;
pub mod time;
