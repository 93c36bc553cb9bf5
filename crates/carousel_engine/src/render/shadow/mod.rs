//! # Shadow-casting projectors
//!
//! Every light that casts shadows is a [`Projector`]: a view matrix, a
//! projection matrix and an exclusively owned depth render target. The light
//! kinds differ only in how they derive the two matrices from their pose:
//!
//! - [`DirectionalProjector`]: the sun, orthographic and fitted to the scene box
//! - [`PositionalProjector`]: looks straight down, frustum spans the scene box
//! - [`SpotlightProjector`]: street lamp at a fixed position and direction
//! - [`HeadlightProjector`]: spot light mounted on a moving chassis
//!
//! Each kind implements [`LightProjector`], which is all the renderer needs
//! for the depth pass and the lit pass.

pub mod directional;
pub mod headlight;
pub mod positional;
pub mod projector;
pub mod spotlight;
pub mod target;
pub mod uniforms;

pub use directional::{DirectionalProjector, DEFAULT_SUN_DIRECTION};
pub use headlight::HeadlightProjector;
pub use positional::PositionalProjector;
pub use projector::{LightProjector, Projector};
pub use spotlight::{SpotlightProjector, DEFAULT_SPOT_DIRECTION};
pub use target::{DepthPass, DepthTextureBinding, ShadowBackend, ShadowTarget};
pub use uniforms::{
    names, DepthPushConstants, GpuShadowCaster, RecordingSink, UniformSink, UniformValue,
};
