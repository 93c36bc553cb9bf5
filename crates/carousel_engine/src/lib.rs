//! # Carousel Engine
//!
//! Shadow-casting lights for the carousel track viewer: a sun that follows
//! the day clock, a pool of street lamps and the headlights of a car, each
//! rendered into its own depth map.
//!
//! ## Features
//!
//! - **Projectors**: light matrices for orthographic, positional, spot and
//!   chassis-mounted lights
//! - **Light switching**: lamps and headlights come on at dusk, with a user
//!   override that only ever adds light
//! - **Render targets**: depth-only Vulkan targets, plus a headless backend
//! - **Camera**: free-look fly camera producing the view matrix
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use carousel_engine::prelude::*;
//!
//! let mut backend = HeadlessShadowBackend::new();
//! let scene = SceneLayout {
//!     bounds: Aabb::new(Point3::new(-10.0, 0.0, -10.0), Point3::new(10.0, 2.0, 10.0)),
//!     lamp_positions: vec![Vec3::new(0.0, 2.0, 0.0)],
//! };
//! let mut viewer =
//!     ViewerContext::new(&mut backend, ViewerConfig::default(), &scene, Vec3::y()).unwrap();
//!
//! let recorder = PassRecorder::new();
//! viewer.update_frame(Vec3::new(0.3, 0.8, 0.1), &Mat4::identity());
//! for caster in viewer.shadow_casters() {
//!     viewer
//!         .render_shadow_pass(caster, &recorder, |_light_matrix, pass| {
//!             pass.recorder().draw("scene");
//!         })
//!         .unwrap();
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod core;
pub mod foundation;
pub mod lighting;
pub mod render;
pub mod viewer;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError},
        core::config::{CameraConfig, LightingConfig, ShadowConfig, ViewerConfig},
        foundation::{
            bounds::{transform_bounding_box, Aabb},
            math::{Mat4, Mat4Ext, Point3, Vec3},
            time::{Stopwatch, Timer},
        },
        lighting::{Headlights, LampGroup, LightSwitch},
        render::{
            shadow::{DepthPushConstants, RecordingSink},
            CameraControls, Direction, DirectionalProjector, HeadlessShadowBackend,
            LightProjector, PassRecorder, RenderError, RenderResult, ShadowBackend, ShadowTarget,
            UniformSink,
        },
        viewer::{KeyCode, SceneLayout, ShadowCaster, ViewerCommand, ViewerContext},
    };
}
