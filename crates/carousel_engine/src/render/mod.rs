//! # Rendering System
//!
//! The part of the renderer the lighting subsystem owns: shadow-casting
//! projectors, the render targets they draw into, and the free-look camera.
//!
//! ## Architecture
//!
//! - **Shadow**: light-space transforms and depth render targets per light kind
//! - **Backends**: graphics API implementations of the shadow target traits
//! - **Primitives**: the camera controls that produce the view matrix
//!
//! Draw-call sequencing stays with the caller. Projectors hand out a scoped
//! depth pass and a light matrix, the caller records its geometry into it.

use thiserror::Error;

pub mod backends;
pub mod primitives;
pub mod shadow;

pub use backends::headless::{HeadlessShadowBackend, HeadlessShadowTarget, PassEvent, PassRecorder};
pub use backends::vulkan::{VulkanShadowBackend, VulkanShadowTarget};
pub use primitives::{CameraControls, Direction};
pub use shadow::{
    DepthPass, DepthTextureBinding, DirectionalProjector, HeadlightProjector, LightProjector,
    PositionalProjector, Projector, ShadowBackend, ShadowTarget, SpotlightProjector, UniformSink,
};

/// High-level rendering error types
///
/// Backend errors are logged where they happen and surfaced here as strings
/// so callers do not depend on the graphics API's error types.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Renderer initialization failed during setup
    #[error("Renderer initialization failed: {0}")]
    InitializationFailed(String),

    /// A rendering operation failed during execution
    ///
    /// Raised when a depth pass cannot be opened on its target.
    #[error("Rendering failed: {0}")]
    RenderingFailed(String),

    /// Resource creation or management failed
    ///
    /// Shadow map allocation failures land here. They are fatal for the
    /// light under construction.
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// Backend-specific error occurred
    #[error("Backend error: {0}")]
    BackendError(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
