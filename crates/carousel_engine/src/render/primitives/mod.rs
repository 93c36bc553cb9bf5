//! Core primitive types for rendering
//!
//! Pose-to-matrix building blocks that are not lights, currently the
//! free-look camera.

pub mod camera;

pub use camera::{CameraControls, Direction, MAX_PITCH_DEG};
