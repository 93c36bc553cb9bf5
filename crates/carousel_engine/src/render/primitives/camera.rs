//! # Free-look Camera
//!
//! Fly camera driven by two input channels: discrete steps along the six
//! cardinal directions and continuous cursor positions for looking around.
//!
//! ## Orientation
//! The pose is stored as yaw and pitch in degrees plus a horizontal basis
//! (`heading`, `right`) derived from the yaw. Yaw 0 looks down -Z; positive
//! yaw turns towards -X. Positive pitch looks up. Pitch always stays within
//! [-89, 89] so the basis never flips.
//!
//! Steps move along the horizontal basis, so looking up or down never tilts
//! the movement; up and down always follow the world up axis.

use crate::core::config::CameraConfig;
use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3, WORLD_UP};

/// Pitch limit applied by mouse look, degrees
pub const MAX_PITCH_DEG: f32 = 89.0;

/// Cardinal movement direction relative to the camera heading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Along the heading
    Forward,
    /// Against the heading
    Back,
    /// Against the right vector
    Left,
    /// Along the right vector
    Right,
    /// Along world up
    Up,
    /// Against world up
    Down,
}

/// First-person fly camera
#[derive(Debug, Clone)]
pub struct CameraControls {
    position: Vec3,
    heading: Vec3,
    right: Vec3,
    yaw: f32,
    pitch: f32,
    speed: f32,
    sensitivity: f32,
    last_cursor: Option<(f64, f64)>,
}

impl CameraControls {
    /// Place the camera at `eye` looking at `target`
    ///
    /// `speed` is in world units per second, `sensitivity` in degrees per
    /// unit of cursor travel.
    pub fn new(eye: Vec3, target: Vec3, speed: f32, sensitivity: f32) -> Self {
        let mut camera = Self {
            position: eye,
            heading: Vec3::new(0.0, 0.0, -1.0),
            right: Vec3::new(1.0, 0.0, 0.0),
            yaw: 0.0,
            pitch: 0.0,
            speed,
            sensitivity,
            last_cursor: None,
        };
        camera.set_view(eye, target);
        camera
    }

    /// Camera at the configured starting pose moving at the fast speed
    pub fn from_config(config: &CameraConfig) -> Self {
        Self::new(config.eye(), config.target(), config.fast_speed, config.mouse_sensitivity)
    }

    /// Move to `eye` and look at `target`, re-deriving yaw and pitch
    ///
    /// Looking straight up or down has no horizontal heading; -Z is used
    /// instead. An eye sitting on its target looks down -Z. Views steeper
    /// than [`MAX_PITCH_DEG`] are clamped to it.
    pub fn set_view(&mut self, eye: Vec3, target: Vec3) {
        self.position = eye;

        let mut back = eye - target;
        if back.norm_squared() == 0.0 {
            log::warn!("Camera eye equals target at {:?}, looking down -Z", eye);
            back = Vec3::new(0.0, 0.0, 1.0);
        }
        let length = back.norm();

        match utils::try_normalize(&Vec3::new(back.x, 0.0, back.z)) {
            Some(horizontal) => {
                self.heading = -horizontal;
                self.right = self.heading.cross(&WORLD_UP).normalize();
                self.yaw = utils::rad_to_deg(back.x.atan2(back.z));
            }
            None => {
                self.heading = Vec3::new(0.0, 0.0, -1.0);
                self.right = Vec3::new(1.0, 0.0, 0.0);
                self.yaw = 0.0;
            }
        }
        self.pitch = utils::rad_to_deg(-(back.y / length).clamp(-1.0, 1.0).asin())
            .clamp(-MAX_PITCH_DEG, MAX_PITCH_DEG);

        log::trace!(
            "Camera view set: position {:?}, yaw {:.2}, pitch {:.2}",
            self.position,
            self.yaw,
            self.pitch
        );
    }

    /// Change the movement speed, world units per second
    pub fn set_speed(&mut self, speed: f32) {
        log::debug!("Camera speed {:.3} -> {:.3}", self.speed, speed);
        self.speed = speed;
    }

    /// Current movement speed
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Move `speed * delta_time` units in `direction`
    pub fn step(&mut self, direction: Direction, delta_time: f32) {
        let distance = self.speed * delta_time;
        let offset = match direction {
            Direction::Forward => self.heading,
            Direction::Back => -self.heading,
            Direction::Left => -self.right,
            Direction::Right => self.right,
            Direction::Up => WORLD_UP,
            Direction::Down => -WORLD_UP,
        };
        self.position += offset * distance;
    }

    /// Rotate from the cursor travel since the previous call
    ///
    /// The first call after construction or [`reset_mouse_look`] only
    /// records the cursor. Moving the cursor left or up turns the camera
    /// left or up.
    ///
    /// [`reset_mouse_look`]: CameraControls::reset_mouse_look
    pub fn mouse_look(&mut self, x: f64, y: f64) {
        let Some((last_x, last_y)) = self.last_cursor.replace((x, y)) else {
            return;
        };

        self.yaw += (last_x - x) as f32 * self.sensitivity;
        self.pitch += (last_y - y) as f32 * self.sensitivity;
        self.pitch = self.pitch.clamp(-MAX_PITCH_DEG, MAX_PITCH_DEG);

        let yaw = utils::deg_to_rad(self.yaw);
        self.heading = -Vec3::new(yaw.sin(), 0.0, yaw.cos());
        self.right = self.heading.cross(&WORLD_UP).normalize();
    }

    /// Forget the last cursor position so the next look only sets a baseline
    pub fn reset_mouse_look(&mut self) {
        self.last_cursor = None;
    }

    /// World-to-view matrix for the current pose
    pub fn matrix(&self) -> Mat4 {
        Mat4::rotation_x(-utils::deg_to_rad(self.pitch))
            * Mat4::rotation_y(-utils::deg_to_rad(self.yaw))
            * Mat4::new_translation(&-self.position)
    }

    /// Eye position in world space
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Unit viewing direction including pitch
    pub fn forward(&self) -> Vec3 {
        let (yaw, pitch) = (utils::deg_to_rad(self.yaw), utils::deg_to_rad(self.pitch));
        Vec3::new(-yaw.sin() * pitch.cos(), pitch.sin(), -yaw.cos() * pitch.cos())
    }

    /// Unit horizontal movement direction
    pub fn heading(&self) -> Vec3 {
        self.heading
    }

    /// Unit horizontal right vector
    pub fn right(&self) -> Vec3 {
        self.right
    }

    /// Yaw in degrees
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Pitch in degrees
    pub fn pitch(&self) -> f32 {
        self.pitch
    }
}
