//! # Viewer Configuration
//!
//! Every tunable constant of the lighting subsystem and the camera lives
//! here so it can be loaded from TOML or RON. Defaults reproduce the look of
//! the carousel scene normalized to unit size (the scene is scaled by the
//! inverse of its bounding-box diagonal).
//!
//! ## Configuration Categories
//!
//! - **Shadows**: shadow map resolutions and texture unit assignment
//! - **Lighting**: spot cone angles, near/far planes, day/night thresholds
//! - **Camera**: starting pose, movement speeds, mouse sensitivity

use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigError};
use crate::foundation::math::{utils, Vec3};

/// Shadow map resolutions and texture units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    /// Side length of the sun's shadow map in texels
    pub sun_shadowmap_size: u32,
    /// Side length of each street lamp's shadow map in texels
    pub lamp_shadowmap_size: u32,
    /// Side length of each headlight's shadow map in texels
    pub headlight_shadowmap_size: u32,
    /// Texture unit of the sun's depth texture
    pub sun_texture_slot: u32,
    /// First texture unit handed out to lamps; headlights follow the lamps
    pub lamp_texture_slot_base: u32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            sun_shadowmap_size: 2048,
            lamp_shadowmap_size: 512,
            headlight_shadowmap_size: 512,
            sun_texture_slot: 4,
            lamp_texture_slot_base: 5,
        }
    }
}

/// Spot cone geometry and day/night switching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Inner cone half-angle of the street lamps, degrees (full intensity inside)
    pub lamp_angle_in_deg: f32,
    /// Outer cone half-angle of the street lamps, degrees (also the shadow frustum)
    pub lamp_angle_out_deg: f32,
    /// Near plane of a lamp's shadow frustum, world units
    pub lamp_near: f32,
    /// Far plane of a lamp's shadow frustum, world units
    pub lamp_far: f32,
    /// Full opening angle of a headlight beam, degrees
    pub headlight_angle_deg: f32,
    /// Near plane of a headlight's shadow frustum, world units
    pub headlight_near: f32,
    /// Far plane of a headlight's shadow frustum, world units
    pub headlight_far: f32,
    /// Sun elevation (degrees above the horizon) at or below which lamps switch on
    pub lamp_nighttime_elevation_deg: f32,
    /// Sun elevation (degrees above the horizon) at or below which headlights switch on
    pub headlight_nighttime_elevation_deg: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            lamp_angle_in_deg: 15.0,
            lamp_angle_out_deg: 50.0,
            lamp_near: 0.001,
            lamp_far: 0.5,
            headlight_angle_deg: 50.0,
            headlight_near: 0.001,
            headlight_far: 1.0,
            lamp_nighttime_elevation_deg: 20.0,
            headlight_nighttime_elevation_deg: 0.0,
        }
    }
}

impl LightingConfig {
    /// Threshold on `dot(sun, up)` below which lamps count as night
    pub fn lamp_nighttime_threshold(&self) -> f32 {
        nighttime_threshold(self.lamp_nighttime_elevation_deg)
    }

    /// Threshold on `dot(sun, up)` below which headlights count as night
    pub fn headlight_nighttime_threshold(&self) -> f32 {
        nighttime_threshold(self.headlight_nighttime_elevation_deg)
    }
}

/// Convert a sun elevation above the horizon into a threshold on `dot(sun, up)`
pub fn nighttime_threshold(elevation_deg: f32) -> f32 {
    utils::deg_to_rad(90.0 - elevation_deg).cos()
}

/// Free-look camera settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Starting eye position
    pub eye: [f32; 3],
    /// Starting look-at target
    pub target: [f32; 3],
    /// Movement speed in world units per second (default mode)
    pub fast_speed: f32,
    /// Movement speed in world units per second (fine movement mode)
    pub slow_speed: f32,
    /// Degrees of rotation per unit of normalized cursor travel
    pub mouse_sensitivity: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: [0.0, 0.5, 1.0],
            target: [0.0, 0.0, 0.0],
            fast_speed: 0.25,
            slow_speed: 0.025,
            mouse_sensitivity: 50.0,
        }
    }
}

impl CameraConfig {
    /// Starting eye position as a vector
    pub fn eye(&self) -> Vec3 {
        Vec3::from(self.eye)
    }

    /// Starting target as a vector
    pub fn target(&self) -> Vec3 {
        Vec3::from(self.target)
    }
}

/// Top-level viewer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Shadow map settings
    pub shadows: ShadowConfig,
    /// Light geometry and switching
    pub lighting: LightingConfig,
    /// Camera settings
    pub camera: CameraConfig,
}

impl Config for ViewerConfig {}

impl ViewerConfig {
    /// Reject values the projectors cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sizes = [
            ("shadows.sun_shadowmap_size", self.shadows.sun_shadowmap_size),
            ("shadows.lamp_shadowmap_size", self.shadows.lamp_shadowmap_size),
            ("shadows.headlight_shadowmap_size", self.shadows.headlight_shadowmap_size),
        ];
        for (field, size) in sizes {
            if size == 0 {
                return Err(ConfigError::Invalid { field, reason: "must be positive".to_string() });
            }
        }

        let angles = [
            ("lighting.lamp_angle_in_deg", self.lighting.lamp_angle_in_deg, 90.0),
            ("lighting.lamp_angle_out_deg", self.lighting.lamp_angle_out_deg, 90.0),
            ("lighting.headlight_angle_deg", self.lighting.headlight_angle_deg, 180.0),
        ];
        for (field, angle, limit) in angles {
            if !(angle > 0.0 && angle < limit) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{angle} is outside (0, {limit})"),
                });
            }
        }

        let planes = [
            ("lighting.lamp_far", self.lighting.lamp_near, self.lighting.lamp_far),
            ("lighting.headlight_far", self.lighting.headlight_near, self.lighting.headlight_far),
        ];
        for (field, near, far) in planes {
            if !(near > 0.0 && far > near) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("near {near} / far {far} must satisfy 0 < near < far"),
                });
            }
        }

        if self.camera.fast_speed < 0.0 || self.camera.slow_speed < 0.0 {
            return Err(ConfigError::Invalid {
                field: "camera.fast_speed",
                reason: "speeds must not be negative".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ViewerConfig::default().validate().is_ok());
    }

    #[test]
    fn nighttime_threshold_matches_sun_elevation() {
        assert!(nighttime_threshold(0.0).abs() < 1e-6);
        assert!((nighttime_threshold(90.0) - 1.0).abs() < 1e-6);
        assert!((nighttime_threshold(30.0) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn toml_round_trip_through_file() {
        let mut config = ViewerConfig::default();
        config.shadows.lamp_shadowmap_size = 256;
        config.camera.eye = [1.0, 2.0, 3.0];

        let path = std::env::temp_dir().join(format!("carousel_viewer_{}.toml", std::process::id()));
        config.save_to_file(&path).unwrap();
        let loaded = ViewerConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_ron_fills_defaults() {
        let parsed: ViewerConfig = ron::from_str("(shadows: (sun_shadowmap_size: 1024))").unwrap();
        assert_eq!(parsed.shadows.sun_shadowmap_size, 1024);
        assert_eq!(parsed.shadows.lamp_shadowmap_size, 512);
        assert_eq!(parsed.camera, CameraConfig::default());
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = ViewerConfig::load_from_file("viewer.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn inverted_planes_are_rejected() {
        let mut config = ViewerConfig::default();
        config.lighting.lamp_far = config.lighting.lamp_near;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "lighting.lamp_far", .. })
        ));
    }
}
