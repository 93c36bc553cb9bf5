//! # Viewer
//!
//! Session state and input handling of the interactive scene viewer. The
//! host owns the window and the day clock; each frame it forwards input as
//! [`ViewerCommand`]s, calls [`ViewerContext::update_frame`] with the new sun
//! direction and car pose, then renders [`ViewerContext::shadow_casters`].

pub mod context;
pub mod input;

pub use context::{SceneLayout, ShadowCaster, ViewerContext, MIN_EYE_HEIGHT};
pub use input::{KeyCode, ViewerCommand};
