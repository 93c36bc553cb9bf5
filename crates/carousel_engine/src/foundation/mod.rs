//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and projection builders
//! - Axis-aligned bounding boxes
//! - Time management
//! - Logging utilities

pub mod bounds;
pub mod logging;
pub mod math;
pub mod time;
