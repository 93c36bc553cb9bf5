//! Car headlights: two spot lights following one chassis
//!
//! Car frames arrive in scene units. The scene is normalized for rendering
//! (translated by `-frame_origin`, scaled by `frame_scale`), so the chassis
//! pose is composed with that normalization before the mounts are applied.
//! Because the light's view inherits the scale, the world-space near/far
//! planes are divided by it when building the projection.

use crate::core::config::LightingConfig;
use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};
use crate::lighting::switch::LightSwitch;
use crate::render::shadow::uniforms::{names, GpuShadowCaster, UniformSink};
use crate::render::shadow::{
    DepthPass, DepthTextureBinding, HeadlightProjector, LightProjector, ShadowBackend,
    ShadowTarget,
};
use crate::render::RenderResult;

/// Mount offsets of the two lamps in chassis space
pub const HEADLIGHT_MOUNT_OFFSETS: [Vec3; 2] = [
    Vec3::new(0.45, 0.5, -1.25),
    Vec3::new(-0.45, 0.5, -1.25),
];

/// Downward tilt of both beams, degrees
pub const HEADLIGHT_TILT_DEG: f32 = 5.0;

/// Beam shape shared by both headlights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadlightOptics {
    /// Full opening angle in radians
    pub opening_angle: f32,
    /// Near plane in world units
    pub near: f32,
    /// Far plane in world units
    pub far: f32,
}

impl HeadlightOptics {
    /// Optics described by the lighting configuration
    pub fn from_config(config: &LightingConfig) -> Self {
        Self {
            opening_angle: utils::deg_to_rad(config.headlight_angle_deg),
            near: config.headlight_near,
            far: config.headlight_far,
        }
    }
}

impl Default for HeadlightOptics {
    fn default() -> Self {
        Self::from_config(&LightingConfig::default())
    }
}

/// The standard mounts: both offsets tilted down around chassis X
pub fn default_mounts() -> [Mat4; 2] {
    let tilt = Mat4::rotation_x(utils::deg_to_rad(-HEADLIGHT_TILT_DEG));
    HEADLIGHT_MOUNT_OFFSETS.map(|offset| tilt * Mat4::new_translation(&offset))
}

/// The headlight pair of one car
pub struct Headlights<T: ShadowTarget> {
    lights: [HeadlightProjector<T>; 2],
    frame_normalization: Mat4,
    texture_slots: [u32; 2],
    shadowmap_size: u32,
    switch: LightSwitch,
}

impl<T: ShadowTarget> Headlights<T> {
    /// Create the pair with the standard mounts
    pub fn new<B>(
        backend: &mut B,
        optics: HeadlightOptics,
        frame_origin: Vec3,
        frame_scale: f32,
        shadowmap_size: u32,
        texture_slots: [u32; 2],
    ) -> RenderResult<Self>
    where
        B: ShadowBackend<Target = T>,
    {
        Self::with_mounts(
            backend,
            optics,
            frame_origin,
            frame_scale,
            shadowmap_size,
            texture_slots,
            default_mounts(),
        )
    }

    /// Create the pair with custom light-to-chassis mounts
    pub fn with_mounts<B>(
        backend: &mut B,
        optics: HeadlightOptics,
        frame_origin: Vec3,
        frame_scale: f32,
        shadowmap_size: u32,
        texture_slots: [u32; 2],
        mounts: [Mat4; 2],
    ) -> RenderResult<Self>
    where
        B: ShadowBackend<Target = T>,
    {
        assert!(frame_scale > 0.0, "car frame scale must be positive, got {frame_scale}");
        assert!(
            optics.near > 0.0 && optics.far > optics.near,
            "headlight planes must satisfy 0 < near < far"
        );

        let projection = Mat4::perspective(
            optics.opening_angle,
            1.0,
            optics.near / frame_scale,
            optics.far / frame_scale,
        );
        let frame_normalization =
            Mat4::new_scaling(frame_scale) * Mat4::new_translation(&(-frame_origin));

        let [left_mount, right_mount] = mounts;
        let left = HeadlightProjector::new(backend, shadowmap_size, left_mount, projection)?;
        let right = HeadlightProjector::new(backend, shadowmap_size, right_mount, projection)?;

        log::info!(
            "Headlights: {}x{} shadow maps on texture units {:?}",
            shadowmap_size,
            shadowmap_size,
            texture_slots
        );

        let mut headlights = Self {
            lights: [left, right],
            frame_normalization,
            texture_slots,
            shadowmap_size,
            switch: LightSwitch::new(),
        };
        headlights.set_car_frame(&Mat4::identity());
        Ok(headlights)
    }

    /// Follow the car; `frame` is the chassis pose in scene units this tick
    pub fn set_car_frame(&mut self, frame: &Mat4) {
        let car_to_world = self.frame_normalization * frame;
        for light in &mut self.lights {
            light.set_car_transform(&car_to_world);
        }
        log::trace!("Headlights at {:?} / {:?}", self.lights[0].position(), self.lights[1].position());
    }

    /// Light matrix of headlight `i`
    ///
    /// # Panics
    /// If `i` is not 0 or 1.
    pub fn light_matrix(&self, i: usize) -> Mat4 {
        self.light(i).light_matrix()
    }

    /// Headlight `i`
    pub fn light(&self, i: usize) -> &HeadlightProjector<T> {
        assert!(i < 2, "headlight index {i} out of range");
        &self.lights[i]
    }

    /// Both light matrices
    pub fn light_matrices(&self) -> [Mat4; 2] {
        [self.lights[0].light_matrix(), self.lights[1].light_matrix()]
    }

    /// Both world positions
    pub fn positions(&self) -> [Vec3; 2] {
        [self.lights[0].position(), self.lights[1].position()]
    }

    /// Texture unit reserved for headlight `i`
    pub fn texture_slot(&self, i: usize) -> u32 {
        assert!(i < 2, "headlight index {i} out of range");
        self.texture_slots[i]
    }

    /// Open a depth pass on headlight `i`'s shadow map
    pub fn bind_render_target<'a>(
        &'a mut self,
        i: usize,
        recorder: &'a T::Recorder,
    ) -> RenderResult<DepthPass<'a, T>> {
        assert!(i < 2, "headlight index {i} out of range");
        self.lights[i].bind_render_target(recorder)
    }

    /// Expose headlight `i`'s depth texture at `slot`
    pub fn bind_depth_texture(&self, i: usize, slot: u32) -> DepthTextureBinding<T::Texture> {
        self.light(i).bind_depth_texture(slot)
    }

    /// Upload headlight `i`'s light matrix under `name`
    pub fn update_light_matrix_uniform(&self, i: usize, sink: &mut dyn UniformSink, name: &str) {
        self.light(i).update_light_matrix_uniform(sink, name);
    }

    /// Both lights packed for a storage buffer
    pub fn gpu_casters(&self) -> [GpuShadowCaster; 2] {
        let caster = |i: usize| {
            GpuShadowCaster::new(
                &self.lights[i].light_matrix(),
                &self.lights[i].position(),
                self.texture_slots[i] as i32,
            )
        };
        [caster(0), caster(1)]
    }

    /// Upload matrices, positions and texture units for the lit pass
    pub fn upload_uniforms(&self, sink: &mut dyn UniformSink) {
        sink.set_mat4_array(names::HEADLIGHT_MATRICES, &self.light_matrices());
        sink.set_vec3_array(names::HEADLIGHT_POSITIONS, &self.positions());
        sink.set_i32_array(
            names::HEADLIGHT_SHADOWMAPS,
            &self.texture_slots.map(|slot| slot as i32),
        );
        sink.set_i32(names::HEADLIGHT_SHADOWMAP_SIZE, self.shadowmap_size as i32);
    }

    /// Update the darkness switch from the current sun direction
    pub fn set_sunlight_switch(&mut self, sun_direction: Vec3, nighttime_threshold: f32) {
        self.switch.set_sunlight(sun_direction, nighttime_threshold);
    }

    /// Set the user override
    pub fn set_user_switch(&mut self, on: bool) {
        self.switch.set_user(on);
    }

    /// Whether the headlights should shine
    pub fn is_on(&self) -> bool {
        self.switch.is_on()
    }

    /// Both switch states
    pub fn switch(&self) -> &LightSwitch {
        &self.switch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::headless::{HeadlessShadowBackend, HeadlessShadowTarget, PassRecorder};
    use crate::render::shadow::RecordingSink;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    fn headlights(origin: Vec3, scale: f32) -> Headlights<HeadlessShadowTarget> {
        let mut backend = HeadlessShadowBackend::new();
        Headlights::new(&mut backend, HeadlightOptics::default(), origin, scale, 64, [21, 22]).unwrap()
    }

    #[test]
    fn identity_frame_mirrors_in_x() {
        let mut lights = headlights(Vec3::zeros(), 1.0);
        lights.set_car_frame(&Mat4::identity());

        let [a, b] = lights.positions();
        assert_relative_eq!(a.x, 0.45, epsilon = EPSILON);
        assert_relative_eq!(b.x, -0.45, epsilon = EPSILON);
        assert_relative_eq!(a.y, b.y, epsilon = EPSILON);
        assert_relative_eq!(a.z, b.z, epsilon = EPSILON);
    }

    #[test]
    fn matrices_reflect_new_frame_immediately() {
        let origin = Vec3::new(10.0, 0.0, -4.0);
        let scale = 0.05;
        let mut lights = headlights(origin, scale);

        let frame = Mat4::new_translation(&Vec3::new(12.0, 0.3, -1.0)) * Mat4::rotation_y(1.1);
        lights.set_car_frame(&frame);

        let normalization = Mat4::new_scaling(scale) * Mat4::new_translation(&(-origin));
        let optics = HeadlightOptics::default();
        let projection =
            Mat4::perspective(optics.opening_angle, 1.0, optics.near / scale, optics.far / scale);

        for (i, mount) in default_mounts().iter().enumerate() {
            let light_to_world = normalization * frame * mount;
            let expected = projection * light_to_world.try_inverse().unwrap();
            assert_relative_eq!(lights.light_matrix(i), expected, epsilon = 1e-3, max_relative = 1e-4);
            assert_relative_eq!(lights.positions()[i], light_to_world.translation_part(), epsilon = EPSILON);
        }
    }

    #[test]
    fn beams_tilt_down() {
        let lights = headlights(Vec3::zeros(), 1.0);
        // The beam axis is the light's -Z column
        let m = lights.light(0).light_to_world();
        let axis = -Vec3::new(m[(0, 2)], m[(1, 2)], m[(2, 2)]);
        assert!(axis.y < 0.0);
        assert!(axis.z < 0.0);
    }

    #[test]
    fn upload_writes_pairs() {
        let lights = headlights(Vec3::zeros(), 1.0);
        let mut sink = RecordingSink::new();
        lights.upload_uniforms(&mut sink);

        assert_eq!(sink.mat4_array(names::HEADLIGHT_MATRICES).map(<[Mat4]>::len), Some(2));
        assert_eq!(sink.vec3_array(names::HEADLIGHT_POSITIONS).map(<[Vec3]>::len), Some(2));
        assert_eq!(sink.i32_array(names::HEADLIGHT_SHADOWMAPS), Some(&[21, 22][..]));
        assert_eq!(lights.gpu_casters()[1].texture_slot, 22);
    }

    #[test]
    fn each_light_renders_into_its_own_target() {
        let mut lights = headlights(Vec3::zeros(), 1.0);
        let recorder = PassRecorder::new();
        for i in 0..2 {
            let _pass = lights.bind_render_target(i, &recorder).unwrap();
        }
        assert_eq!(recorder.pass_count(), 2);
        assert_ne!(lights.bind_depth_texture(0, 21).texture, lights.bind_depth_texture(1, 22).texture);
    }

    #[test]
    fn switch_follows_sun_and_user() {
        let mut lights = headlights(Vec3::zeros(), 1.0);
        lights.set_sunlight_switch(Vec3::new(0.0, -0.2, 1.0), 0.0);
        assert!(lights.is_on());
        lights.set_sunlight_switch(Vec3::new(0.0, 0.2, 1.0), 0.0);
        assert!(!lights.is_on());
        lights.set_user_switch(true);
        assert!(lights.is_on());
    }

    #[test]
    #[should_panic]
    fn third_headlight_panics() {
        headlights(Vec3::zeros(), 1.0).light_matrix(2);
    }
}
