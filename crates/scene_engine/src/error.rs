//! Crate-level error type

use crate::config::ConfigError;
use thiserror::Error;

/// Recoverable scene manager failures
///
/// Contract violations (bad indices, double registration) are not represented
/// here; they panic at the call site.
#[derive(Error, Debug)]
pub enum SceneError {
    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The background update thread could not be started
    #[error("Failed to spawn scene update thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),

    /// The background update thread went away mid-tick (a node callback panicked)
    #[error("Scene update thread disconnected while a tick was in flight")]
    UpdateThreadDisconnected,

    /// A [`SceneHandle`](crate::scene::SceneHandle) outlived its scene manager
    #[error("Scene manager was dropped")]
    SceneDropped,
}
