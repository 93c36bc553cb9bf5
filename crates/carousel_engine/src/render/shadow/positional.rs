//! Positional light hanging above the scene

use crate::foundation::bounds::{transform_bounding_box, Aabb};
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use crate::render::shadow::projector::{LightProjector, Projector};
use crate::render::shadow::target::{ShadowBackend, ShadowTarget};
use crate::render::RenderResult;

/// Near plane of a positional light's frustum
const POSITIONAL_NEAR: f32 = 0.001;

/// Looks straight down from its position with a frustum spanning the scene box
///
/// The far plane reaches the deepest point of the box and the frustum's
/// cross-section at that depth matches the box's footprint.
pub struct PositionalProjector<T: ShadowTarget> {
    projector: Projector<T>,
    scene_bounds: Aabb,
    position: Vec3,
}

impl<T: ShadowTarget> PositionalProjector<T> {
    /// Create the light at `position` over `scene_bounds`
    pub fn new<B>(
        backend: &mut B,
        scene_bounds: Aabb,
        shadowmap_size: u32,
        position: Vec3,
    ) -> RenderResult<Self>
    where
        B: ShadowBackend<Target = T>,
    {
        let projector = Projector::new(backend, shadowmap_size)?;
        let mut light = Self {
            projector,
            scene_bounds,
            position,
        };
        light.update();
        Ok(light)
    }

    /// Move the light and refit its frustum
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.update();
    }

    /// World position
    pub fn position(&self) -> Vec3 {
        self.position
    }

    fn update(&mut self) {
        // Screen up is world X so looking down never degenerates
        let view = Mat4::look_at(self.position, self.position - Vec3::y(), Vec3::x());

        if self.scene_bounds.is_empty() {
            log::warn!("Positional light has an empty scene box, using a unit frustum");
            let projection = Mat4::frustum(
                -POSITIONAL_NEAR,
                POSITIONAL_NEAR,
                -POSITIONAL_NEAR,
                POSITIONAL_NEAR,
                POSITIONAL_NEAR,
                1.0,
            );
            self.projector.set_matrices(view, projection);
            return;
        }

        let light_box = transform_bounding_box(&self.scene_bounds, &view);
        let mut far = light_box.min.z.abs();
        if far <= POSITIONAL_NEAR {
            log::warn!(
                "Positional light at {:?} sits below the scene, clamping its far plane",
                self.position
            );
            far = 2.0 * POSITIONAL_NEAR;
        }

        let scale = POSITIONAL_NEAR / far;
        let mut left = light_box.min.x * scale;
        let mut right = light_box.max.x * scale;
        let mut bottom = light_box.min.y * scale;
        let mut top = light_box.max.y * scale;
        if right - left <= f32::EPSILON {
            left -= POSITIONAL_NEAR;
            right += POSITIONAL_NEAR;
        }
        if top - bottom <= f32::EPSILON {
            bottom -= POSITIONAL_NEAR;
            top += POSITIONAL_NEAR;
        }

        let projection = Mat4::frustum(left, right, bottom, top, POSITIONAL_NEAR, far);
        self.projector.set_matrices(view, projection);
    }
}

impl<T: ShadowTarget> LightProjector for PositionalProjector<T> {
    type Target = T;

    fn projector(&self) -> &Projector<T> {
        &self.projector
    }

    fn projector_mut(&mut self) -> &mut Projector<T> {
        &mut self.projector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{project_point, Point3};
    use crate::render::backends::headless::{HeadlessShadowBackend, HeadlessShadowTarget};
    use approx::assert_relative_eq;

    fn light(position: Vec3) -> PositionalProjector<HeadlessShadowTarget> {
        let bounds = Aabb::new(Point3::new(-1.0, 0.0, -1.0), Point3::new(1.0, 0.5, 1.0));
        let mut backend = HeadlessShadowBackend::new();
        PositionalProjector::new(&mut backend, bounds, 256, position).unwrap()
    }

    #[test]
    fn floor_below_light_is_at_far_plane() {
        let light = light(Vec3::new(0.0, 2.0, 0.0));
        let clip = project_point(&light.light_matrix(), &Point3::origin());

        assert_relative_eq!(clip.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(clip.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(clip.z, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn floor_corners_touch_frustum_edges() {
        let light = light(Vec3::new(0.0, 2.0, 0.0));
        for corner in [
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(-1.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, -1.0),
            Point3::new(-1.0, 0.0, -1.0),
        ] {
            let clip = project_point(&light.light_matrix(), &corner);
            assert_relative_eq!(clip.x.abs(), 1.0, epsilon = 1e-4);
            assert_relative_eq!(clip.y.abs(), 1.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn light_below_scene_stays_finite() {
        let mut light = light(Vec3::new(0.0, 2.0, 0.0));
        light.set_position(Vec3::new(0.0, -3.0, 0.0));
        assert!(light.light_matrix().iter().all(|v| v.is_finite()));
    }
}
