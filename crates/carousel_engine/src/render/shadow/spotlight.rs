//! Spot lights at a fixed world position

use crate::foundation::math::{constants, utils, Mat4, Mat4Ext, Vec3, WORLD_UP};
use crate::render::shadow::projector::{LightProjector, Projector};
use crate::render::shadow::target::{ShadowBackend, ShadowTarget};
use crate::render::RenderResult;

/// Street lamps point straight down unless told otherwise
pub const DEFAULT_SPOT_DIRECTION: Vec3 = Vec3::new(0.0, -1.0, 0.0);

/// Perspective projector anchored at a position and facing a direction
///
/// The frustum is a square cone of `2 * half_angle` with tuned near/far
/// planes; it does not depend on the scene extent.
pub struct SpotlightProjector<T: ShadowTarget> {
    projector: Projector<T>,
    position: Vec3,
    direction: Vec3,
    half_angle: f32,
    near: f32,
    far: f32,
}

impl<T: ShadowTarget> SpotlightProjector<T> {
    /// Create a spot light; `half_angle` is in radians
    pub fn new<B>(
        backend: &mut B,
        shadowmap_size: u32,
        position: Vec3,
        half_angle: f32,
        direction: Vec3,
        near: f32,
        far: f32,
    ) -> RenderResult<Self>
    where
        B: ShadowBackend<Target = T>,
    {
        assert!(
            half_angle > 0.0 && half_angle < constants::HALF_PI,
            "spot half-angle must be in (0, pi/2), got {half_angle}"
        );
        assert!(near > 0.0 && far > near, "spot planes must satisfy 0 < near < far");

        let projector = Projector::new(backend, shadowmap_size)?;
        let direction = utils::try_normalize(&direction).unwrap_or_else(|| {
            log::warn!("Spot light at {:?} has no direction, pointing it down", position);
            DEFAULT_SPOT_DIRECTION
        });

        let mut spot = Self {
            projector,
            position,
            direction,
            half_angle,
            near,
            far,
        };
        spot.update();
        Ok(spot)
    }

    /// Move the light
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.update();
    }

    /// Re-aim the light; a zero-length direction keeps the previous one
    pub fn set_direction(&mut self, direction: Vec3) {
        self.set_pose(self.position, direction);
    }

    /// Move and re-aim in one update
    pub fn set_pose(&mut self, position: Vec3, direction: Vec3) {
        self.position = position;
        match utils::try_normalize(&direction) {
            Some(direction) => self.direction = direction,
            None => log::warn!("Ignoring zero-length spot direction at {:?}", position),
        }
        self.update();
    }

    /// World position
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Normalized facing direction
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Half opening angle in radians
    pub fn half_angle(&self) -> f32 {
        self.half_angle
    }

    /// Light-to-world transform: columns are right, up, back and position
    pub fn light_to_world(&self) -> Mat4 {
        let (right, up, forward) = self.basis();
        let mut m = Mat4::identity();
        m.fixed_view_mut::<3, 1>(0, 0).copy_from(&right);
        m.fixed_view_mut::<3, 1>(0, 1).copy_from(&up);
        m.fixed_view_mut::<3, 1>(0, 2).copy_from(&(-forward));
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.position);
        m
    }

    fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let forward = self.direction;
        // Lamps look straight down, where world up gives no right vector
        let right = utils::try_normalize(&forward.cross(&WORLD_UP)).unwrap_or_else(Vec3::x);
        let up = right.cross(&forward);
        (right, up, forward)
    }

    fn update(&mut self) {
        let (right, up, forward) = self.basis();
        let p = self.position;

        // Rigid inverse of light_to_world
        let view = Mat4::new(
            right.x, right.y, right.z, -right.dot(&p),
            up.x, up.y, up.z, -up.dot(&p),
            -forward.x, -forward.y, -forward.z, forward.dot(&p),
            0.0, 0.0, 0.0, 1.0,
        );
        let projection = Mat4::perspective(2.0 * self.half_angle, 1.0, self.near, self.far);

        log::trace!("Spot light at {:?} facing {:?}", p, forward);
        self.projector.set_matrices(view, projection);
    }
}

impl<T: ShadowTarget> LightProjector for SpotlightProjector<T> {
    type Target = T;

    fn projector(&self) -> &Projector<T> {
        &self.projector
    }

    fn projector_mut(&mut self) -> &mut Projector<T> {
        &mut self.projector
    }
}
