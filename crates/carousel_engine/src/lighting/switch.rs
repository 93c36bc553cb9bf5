//! Day/night switching of artificial lights
//!
//! Lamps and headlights come on when the sun sinks low enough. The user can
//! force them on at any time; forcing them off at night is not possible since
//! the two switches are OR-combined.

use crate::foundation::math::{utils, Vec3, WORLD_UP};

/// Sun-driven switch OR-combined with a user override
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LightSwitch {
    sunlight: bool,
    user: bool,
}

impl LightSwitch {
    /// Both switches off
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn the sunlight switch on when `dot(sun, up) <= nighttime_threshold`
    ///
    /// A zero-length sun direction leaves the switch as it was.
    pub fn set_sunlight(&mut self, sun_direction: Vec3, nighttime_threshold: f32) {
        let Some(sun) = utils::try_normalize(&sun_direction) else {
            log::warn!("Zero-length sun direction, light switch unchanged");
            return;
        };

        let night = sun.dot(&WORLD_UP) <= nighttime_threshold;
        if night != self.sunlight {
            log::debug!("Sunlight switch {}", if night { "on" } else { "off" });
        }
        self.sunlight = night;
    }

    /// Set the user override
    pub fn set_user(&mut self, on: bool) {
        self.user = on;
    }

    /// State of the sunlight switch alone
    pub fn sunlight(&self) -> bool {
        self.sunlight
    }

    /// State of the user override alone
    pub fn user(&self) -> bool {
        self.user
    }

    /// Whether the lights should shine
    pub fn is_on(&self) -> bool {
        self.user || self.sunlight
    }
}

/// True while the sun is at or above the horizon
pub fn is_daytime(sun_direction: &Vec3) -> bool {
    sun_direction.dot(&WORLD_UP) >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sun_straight_down_is_night() {
        let mut switch = LightSwitch::new();
        switch.set_sunlight(Vec3::new(0.0, -1.0, 0.0), 0.15);
        assert!(switch.sunlight());
        assert!(switch.is_on());

        switch.set_sunlight(Vec3::new(0.0, 1.0, 0.0), 0.15);
        assert!(!switch.sunlight());
        assert!(!switch.is_on());
    }

    #[test]
    fn direction_length_does_not_matter() {
        let mut switch = LightSwitch::new();
        // 0.1 above the horizon once normalized, below the threshold
        switch.set_sunlight(Vec3::new(9.95, 1.0, 0.0), 0.15);
        assert!(switch.sunlight());
    }

    #[test]
    fn threshold_is_inclusive() {
        let mut switch = LightSwitch::new();
        switch.set_sunlight(Vec3::new(1.0, 0.0, 0.0), 0.0);
        assert!(switch.sunlight());
    }

    #[test]
    fn user_override_only_adds() {
        let mut switch = LightSwitch::new();
        switch.set_sunlight(Vec3::new(0.0, 1.0, 0.0), 0.15);
        switch.set_user(true);
        assert!(switch.is_on());

        switch.set_sunlight(Vec3::new(0.0, -1.0, 0.0), 0.15);
        switch.set_user(false);
        assert!(switch.is_on());
    }

    #[test]
    fn zero_sun_keeps_state() {
        let mut switch = LightSwitch::new();
        switch.set_sunlight(Vec3::new(0.0, -1.0, 0.0), 0.15);
        switch.set_sunlight(Vec3::zeros(), 0.15);
        assert!(switch.sunlight());
    }

    #[test]
    fn daytime_starts_at_horizon() {
        assert!(is_daytime(&Vec3::new(1.0, 0.0, 0.0)));
        assert!(is_daytime(&Vec3::new(0.0, 0.3, 1.0)));
        assert!(!is_daytime(&Vec3::new(0.0, -0.01, 1.0)));
    }
}
