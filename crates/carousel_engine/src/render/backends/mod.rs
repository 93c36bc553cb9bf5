//! Shadow target backends
//!
//! - [`vulkan`]: depth images, samplers and framebuffers through ash
//! - [`headless`]: CPU bookkeeping for the viewer binary and tests

pub mod headless;
pub mod vulkan;
