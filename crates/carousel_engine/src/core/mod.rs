//! Core engine types shared across subsystems

pub mod config;

pub use config::{CameraConfig, LightingConfig, ShadowConfig, ViewerConfig};
