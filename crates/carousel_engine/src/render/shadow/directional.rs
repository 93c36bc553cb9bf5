//! The sun: an orthographic projector fitted to the scene box

use crate::foundation::bounds::{transform_bounding_box, Aabb};
use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};
use crate::render::shadow::projector::{LightProjector, Projector};
use crate::render::shadow::target::{ShadowBackend, ShadowTarget};
use crate::render::shadow::uniforms::UniformSink;
use crate::render::RenderResult;

/// Direction used when none has been set yet
pub const DEFAULT_SUN_DIRECTION: Vec3 = Vec3::new(0.0, -1.0, 0.0);

/// Up vector of the sun's view. World up would degenerate at noon.
const SUN_VIEW_UP: Vec3 = Vec3::new(0.0, 0.0, 1.0);

/// Substitute up vector when the sun lies along `SUN_VIEW_UP`
const SUN_VIEW_UP_FALLBACK: Vec3 = Vec3::new(0.0, 1.0, 0.0);

/// Minimum width of any fitted frustum axis
const MIN_FRUSTUM_EXTENT: f32 = 1.0e-4;

/// Directional light whose frustum always encloses the scene box
///
/// `direction` points from the scene toward the sun; the light's view looks
/// along `-direction`.
pub struct DirectionalProjector<T: ShadowTarget> {
    projector: Projector<T>,
    scene_bounds: Aabb,
    direction: Vec3,
}

impl<T: ShadowTarget> DirectionalProjector<T> {
    /// Create the sun over `scene_bounds`, positioned along `direction`
    pub fn new<B>(
        backend: &mut B,
        scene_bounds: Aabb,
        shadowmap_size: u32,
        direction: Vec3,
    ) -> RenderResult<Self>
    where
        B: ShadowBackend<Target = T>,
    {
        let projector = Projector::new(backend, shadowmap_size)?;
        log::info!(
            "Sun projector: {}x{} shadow map over scene box {:?} - {:?}",
            shadowmap_size,
            shadowmap_size,
            scene_bounds.min,
            scene_bounds.max
        );

        let mut sun = Self {
            projector,
            scene_bounds,
            direction: DEFAULT_SUN_DIRECTION,
        };
        sun.set_direction(direction);
        Ok(sun)
    }

    /// Move the sun to `direction` and refit the frustum
    ///
    /// A zero-length direction keeps the previous one.
    pub fn set_direction(&mut self, direction: Vec3) {
        match utils::try_normalize(&direction) {
            Some(direction) => self.direction = direction,
            None => log::warn!(
                "Ignoring zero-length sun direction, keeping {:?}",
                self.direction
            ),
        }
        self.update();
    }

    /// Normalized direction toward the sun
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Scene box the frustum is fitted to
    pub fn scene_bounds(&self) -> &Aabb {
        &self.scene_bounds
    }

    /// Upload the light direction under `name`
    pub fn update_light_direction_uniform(&self, sink: &mut dyn UniformSink, name: &str) {
        sink.set_vec3(name, &self.direction);
    }

    fn update(&mut self) {
        let up = if utils::is_parallel(&self.direction, &SUN_VIEW_UP) {
            SUN_VIEW_UP_FALLBACK
        } else {
            SUN_VIEW_UP
        };

        // Orientation only, looking from the sun toward the origin
        let view = Mat4::look_at(self.direction, Vec3::zeros(), up).without_translation();

        if self.scene_bounds.is_empty() {
            log::warn!("Sun projector has an empty scene box, using a unit frustum");
            self.projector
                .set_matrices(view, Mat4::orthographic(-1.0, 1.0, -1.0, 1.0, -1.0, 1.0));
            return;
        }

        let light_box = transform_bounding_box(&self.scene_bounds, &view);
        let (left, right) = padded(light_box.min.x, light_box.max.x);
        let (bottom, top) = padded(light_box.min.y, light_box.max.y);
        // View space looks down -Z: the nearest point has the largest z
        let far = -light_box.min.z.min(light_box.max.z);
        let near = -light_box.min.z.max(light_box.max.z);
        let (near, far) = padded(near, far);

        let projection = Mat4::orthographic(left, right, bottom, top, near, far);
        log::trace!(
            "Sun direction {:?}: x [{}, {}] y [{}, {}] depth [{}, {}]",
            self.direction,
            left,
            right,
            bottom,
            top,
            near,
            far
        );
        self.projector.set_matrices(view, projection);
    }
}

/// Widen `[lo, hi]` around its center when it is too thin to invert
fn padded(lo: f32, hi: f32) -> (f32, f32) {
    if hi - lo < MIN_FRUSTUM_EXTENT {
        let center = 0.5 * (lo + hi);
        (center - 0.5 * MIN_FRUSTUM_EXTENT, center + 0.5 * MIN_FRUSTUM_EXTENT)
    } else {
        (lo, hi)
    }
}

impl<T: ShadowTarget> LightProjector for DirectionalProjector<T> {
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
    use crate::render::shadow::uniforms::{names, RecordingSink};
    use approx::assert_relative_eq;

    const CLIP_TOLERANCE: f32 = 1e-4;

    fn scene_box() -> Aabb {
        Aabb::new(Point3::new(-0.6, -0.05, -0.4), Point3::new(0.5, 0.1, 0.45))
    }

    fn sun(direction: Vec3) -> DirectionalProjector<HeadlessShadowTarget> {
        let mut backend = HeadlessShadowBackend::new();
        DirectionalProjector::new(&mut backend, scene_box(), 256, direction).unwrap()
    }

    fn assert_corners_inside(sun: &DirectionalProjector<HeadlessShadowTarget>) {
        let light_matrix = sun.light_matrix();
        for corner in sun.scene_bounds().corners() {
            let clip = project_point(&light_matrix, &corner);
            assert!(
                clip.x.abs() <= 1.0 + CLIP_TOLERANCE
                    && clip.y.abs() <= 1.0 + CLIP_TOLERANCE
                    && clip.z >= -CLIP_TOLERANCE
                    && clip.z <= 1.0 + CLIP_TOLERANCE,
                "corner {:?} maps outside clip volume: {:?} (sun {:?})",
                corner,
                clip,
                sun.direction()
            );
            assert!(clip.x.is_finite() && clip.y.is_finite() && clip.z.is_finite());
        }
    }

    #[test]
    fn frustum_encloses_scene_for_many_directions() {
        let directions = [
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(0.3, -0.8, 0.52),
            Vec3::new(-0.7, -0.2, -0.1),
            Vec3::new(5.0, 5.0, 5.0),
        ];
        for direction in directions {
            assert_corners_inside(&sun(direction));
        }
    }

    #[test]
    fn frustum_encloses_offset_and_elongated_scenes() {
        let boxes = [
            Aabb::new(Point3::new(40.0, 3.0, -22.0), Point3::new(42.0, 4.5, -19.0)),
            Aabb::new(Point3::new(-30.0, -8.0, 25.0), Point3::new(-29.5, -7.9, 31.0)),
            Aabb::new(Point3::new(-0.01, 0.0, -5.0), Point3::new(0.01, 0.02, 5.0)),
            Aabb::new(Point3::new(-6.0, -0.1, 0.3), Point3::new(6.0, 0.1, 0.4)),
            Aabb::new(Point3::new(10.0, 0.0, 10.0), Point3::new(10.2, 20.0, 10.2)),
        ];
        let directions = [
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.3, -0.8, 0.52),
            Vec3::new(-0.7, 0.4, -0.1),
            Vec3::new(0.05, 0.02, -1.0),
        ];
        for bounds in boxes {
            let mut backend = HeadlessShadowBackend::new();
            let mut sun =
                DirectionalProjector::new(&mut backend, bounds, 64, directions[0]).unwrap();
            for direction in directions {
                sun.set_direction(direction);
                assert_corners_inside(&sun);
            }
        }
    }

    #[test]
    fn moving_sun_refits_every_time() {
        let mut sun = sun(Vec3::new(0.0, -1.0, 0.0));
        let mut angle = 0.0_f32;
        while angle < std::f32::consts::TAU {
            sun.set_direction(Vec3::new(angle.cos(), angle.sin(), 0.2));
            assert_corners_inside(&sun);
            angle += 0.1;
        }
    }

    #[test]
    fn view_has_no_translation_and_looks_away_from_sun() {
        let direction = Vec3::new(0.2, -0.9, 0.1);
        let sun = sun(direction);
        let view = sun.projector().view_matrix();

        assert_relative_eq!(view.translation_part(), Vec3::zeros(), epsilon = 1e-6);
        // Light travels along -direction, which is the view's -Z axis
        let along = view.transform_vector(&(-direction.normalize()));
        assert_relative_eq!(along, Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-5);
    }

    #[test]
    fn zero_direction_keeps_previous() {
        let mut sun = sun(Vec3::new(1.0, -1.0, 0.0));
        let before = sun.light_matrix();
        sun.set_direction(Vec3::zeros());

        assert_relative_eq!(sun.direction(), Vec3::new(1.0, -1.0, 0.0).normalize());
        assert_relative_eq!(sun.light_matrix(), before);
    }

    #[test]
    fn flat_scene_gets_padded_depth() {
        let flat = Aabb::new(Point3::new(-1.0, 0.0, -1.0), Point3::new(1.0, 0.0, 1.0));
        let mut backend = HeadlessShadowBackend::new();
        let sun = DirectionalProjector::new(&mut backend, flat, 64, Vec3::new(0.0, -1.0, 0.0)).unwrap();

        let m = sun.light_matrix();
        assert!(m.iter().all(|v| v.is_finite()));
        let clip = project_point(&m, &Point3::origin());
        assert_relative_eq!(clip.z, 0.5, epsilon = 1e-3);
    }

    #[test]
    fn direction_uniform_is_normalized() {
        let sun = sun(Vec3::new(0.0, -2.0, 0.0));
        let mut sink = RecordingSink::new();
        sun.update_light_direction_uniform(&mut sink, names::SUN_DIRECTION);
        sun.update_light_matrix_uniform(&mut sink, names::SUN_MATRIX);

        assert_eq!(sink.vec3(names::SUN_DIRECTION), Some(Vec3::new(0.0, -1.0, 0.0)));
        assert_eq!(sink.mat4(names::SUN_MATRIX), Some(sun.light_matrix()));
    }

    #[test]
    fn allocation_failure_aborts_construction() {
        let mut backend = HeadlessShadowBackend::with_memory_budget(16);
        let result = DirectionalProjector::new(&mut backend, scene_box(), 2048, DEFAULT_SUN_DIRECTION);
        assert!(result.is_err());
    }
}
