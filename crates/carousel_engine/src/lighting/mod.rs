//! # Artificial lights
//!
//! Street lamps and car headlights built on the shadow projectors, plus the
//! sun-driven switching that decides when they shine.

pub mod headlights;
pub mod lamps;
pub mod switch;

pub use headlights::{default_mounts, HeadlightOptics, Headlights};
pub use lamps::{LampCone, LampGroup};
pub use switch::{is_daytime, LightSwitch};
