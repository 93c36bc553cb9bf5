//! Spot light rigidly mounted on a moving chassis

use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use crate::render::shadow::projector::{LightProjector, Projector};
use crate::render::shadow::target::{ShadowBackend, ShadowTarget};
use crate::render::RenderResult;

/// One headlight: a fixed mount offset on the chassis plus a shared projection
pub struct HeadlightProjector<T: ShadowTarget> {
    projector: Projector<T>,
    mount: Mat4,
    projection: Mat4,
    light_to_world: Mat4,
}

impl<T: ShadowTarget> HeadlightProjector<T> {
    /// Create a headlight at `mount` (light to chassis) with a given projection
    ///
    /// Until the first [`HeadlightProjector::set_car_transform`] the chassis
    /// sits at the origin.
    pub fn new<B>(
        backend: &mut B,
        shadowmap_size: u32,
        mount: Mat4,
        projection: Mat4,
    ) -> RenderResult<Self>
    where
        B: ShadowBackend<Target = T>,
    {
        let projector = Projector::new(backend, shadowmap_size)?;
        let mut light = Self {
            projector,
            mount,
            projection,
            light_to_world: Mat4::identity(),
        };
        light.set_car_transform(&Mat4::identity());
        Ok(light)
    }

    /// Follow the chassis; `car_to_world` is the chassis pose this tick
    ///
    /// A singular pose is ignored and the previous view kept.
    pub fn set_car_transform(&mut self, car_to_world: &Mat4) {
        let light_to_world = car_to_world * self.mount;
        match light_to_world.try_inverse() {
            Some(view) => {
                self.light_to_world = light_to_world;
                self.projector.set_matrices(view, self.projection);
            }
            None => log::warn!("Singular chassis transform, headlight keeps its previous pose"),
        }
    }

    /// Light to world transform of the latest pose
    pub fn light_to_world(&self) -> &Mat4 {
        &self.light_to_world
    }

    /// World position of the latest pose
    pub fn position(&self) -> Vec3 {
        self.light_to_world.translation_part()
    }

    /// Mount offset relative to the chassis origin
    pub fn mount(&self) -> &Mat4 {
        &self.mount
    }
}

impl<T: ShadowTarget> LightProjector for HeadlightProjector<T> {
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
    use crate::foundation::math::{project_point, utils, Point3};
    use crate::render::backends::headless::{HeadlessShadowBackend, HeadlessShadowTarget};
    use approx::assert_relative_eq;

    fn headlight(mount: Mat4) -> HeadlightProjector<HeadlessShadowTarget> {
        let mut backend = HeadlessShadowBackend::new();
        let projection = Mat4::perspective(utils::deg_to_rad(50.0), 1.0, 0.001, 1.0);
        HeadlightProjector::new(&mut backend, 64, mount, projection).unwrap()
    }

    #[test]
    fn follows_chassis_without_lag() {
        let mount = Mat4::new_translation(&Vec3::new(0.45, 0.5, -1.25));
        let mut light = headlight(mount);

        let frame = Mat4::new_translation(&Vec3::new(10.0, 0.0, 3.0)) * Mat4::rotation_y(0.7);
        light.set_car_transform(&frame);

        let expected = frame * mount;
        assert_relative_eq!(*light.light_to_world(), expected, epsilon = 1e-5);
        assert_relative_eq!(
            light.projector().view_matrix() * expected,
            Mat4::identity(),
            epsilon = 1e-5
        );
    }

    #[test]
    fn beam_points_down_chassis_minus_z() {
        let mut light = headlight(Mat4::identity());
        light.set_car_transform(&Mat4::new_translation(&Vec3::new(1.0, 0.0, 0.0)));

        let ahead = Point3::new(1.0, 0.0, -0.5);
        let clip = project_point(&light.light_matrix(), &ahead);
        assert_relative_eq!(clip.x, 0.0, epsilon = 1e-5);
        assert!(clip.z > 0.0 && clip.z < 1.0);
    }

    #[test]
    fn singular_frame_keeps_previous_pose() {
        let mut light = headlight(Mat4::identity());
        let before = light.light_matrix();
        light.set_car_transform(&Mat4::zeros());
        assert_eq!(light.light_matrix(), before);
    }
}
