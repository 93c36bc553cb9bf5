//! Street lamps: a fixed pool of spot lights with sparse activation
//!
//! Every lamp post owns a spot light and a shadow texture unit for the
//! lifetime of the group. Only lamps that are switched on take part in the
//! shadow pass and the uniform upload; they are tracked in a dense list of
//! pool slots.
//!
//! Two index spaces are in play:
//! - **slot**: position in the pool, used by [`LampGroup::toggle`] and the
//!   per-lamp queries
//! - **active index**: position in the active list, `0..active_count()`,
//!   used by everything the renderer iterates over

use crate::core::config::LightingConfig;
use crate::foundation::math::{utils, Mat4, Vec3};
use crate::lighting::switch::LightSwitch;
use crate::render::shadow::uniforms::{names, GpuShadowCaster, UniformSink};
use crate::render::shadow::{
    DepthPass, DepthTextureBinding, LightProjector, ShadowBackend, ShadowTarget,
    SpotlightProjector, DEFAULT_SPOT_DIRECTION,
};
use crate::render::RenderResult;

/// Cone geometry shared by all lamps; angles are half-angles in radians
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LampCone {
    /// Full intensity inside this angle
    pub angle_in: f32,
    /// No light outside this angle; also the shadow frustum
    pub angle_out: f32,
    /// Near plane of the shadow frustum
    pub near: f32,
    /// Far plane of the shadow frustum
    pub far: f32,
}

impl LampCone {
    /// Cone described by the lighting configuration
    pub fn from_config(config: &LightingConfig) -> Self {
        Self {
            angle_in: utils::deg_to_rad(config.lamp_angle_in_deg),
            angle_out: utils::deg_to_rad(config.lamp_angle_out_deg),
            near: config.lamp_near,
            far: config.lamp_far,
        }
    }
}

impl Default for LampCone {
    fn default() -> Self {
        Self::from_config(&LightingConfig::default())
    }
}

/// Fixed pool of street lamps, initially all off
pub struct LampGroup<T: ShadowTarget> {
    projectors: Vec<SpotlightProjector<T>>,
    texture_slots: Vec<u32>,
    lamp_on: Vec<bool>,
    active: Vec<usize>,
    cone: LampCone,
    shadowmap_size: u32,
    switch: LightSwitch,
}

impl<T: ShadowTarget> LampGroup<T> {
    /// Build one spot light per position; lamp `slot` samples from unit
    /// `texture_slot_base + slot`
    pub fn new<B>(
        backend: &mut B,
        positions: &[Vec3],
        cone: LampCone,
        shadowmap_size: u32,
        texture_slot_base: u32,
    ) -> RenderResult<Self>
    where
        B: ShadowBackend<Target = T>,
    {
        let projectors = positions
            .iter()
            .map(|&position| {
                SpotlightProjector::new(
                    &mut *backend,
                    shadowmap_size,
                    position,
                    cone.angle_out,
                    DEFAULT_SPOT_DIRECTION,
                    cone.near,
                    cone.far,
                )
            })
            .collect::<RenderResult<Vec<_>>>()?;

        let size = projectors.len();
        let texture_slots = (0..size as u32).map(|slot| texture_slot_base + slot).collect();

        log::info!(
            "Lamp group: {} lamps, {}x{} shadow maps, texture units from {}",
            size,
            shadowmap_size,
            shadowmap_size,
            texture_slot_base
        );

        Ok(Self {
            projectors,
            texture_slots,
            lamp_on: vec![false; size],
            active: Vec::with_capacity(size),
            cone,
            shadowmap_size,
            switch: LightSwitch::new(),
        })
    }

    /// Total number of lamps in the pool
    pub fn size(&self) -> usize {
        self.projectors.len()
    }

    /// Number of lamps currently on
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Flip lamp `slot` on or off
    ///
    /// Turning on appends to the active list. Turning off moves the last
    /// active entry into the freed position, so active order is not stable.
    ///
    /// # Panics
    /// If `slot >= size()`.
    pub fn toggle(&mut self, slot: usize) {
        assert!(slot < self.size(), "lamp slot {slot} out of range (pool of {})", self.size());

        self.lamp_on[slot] = !self.lamp_on[slot];
        if self.lamp_on[slot] {
            self.active.push(slot);
        } else if let Some(index) = self.active.iter().position(|&s| s == slot) {
            self.active.swap_remove(index);
        }
        log::debug!(
            "Lamp {} {} ({} active)",
            slot,
            if self.lamp_on[slot] { "on" } else { "off" },
            self.active.len()
        );
    }

    /// Whether lamp `slot` is on
    pub fn is_lamp_on(&self, slot: usize) -> bool {
        assert!(slot < self.size(), "lamp slot {slot} out of range (pool of {})", self.size());
        self.lamp_on[slot]
    }

    /// Pool slot of the `i`th active lamp
    ///
    /// # Panics
    /// If `i >= active_count()`.
    pub fn active_lamp(&self, i: usize) -> usize {
        assert!(
            i < self.active.len(),
            "active lamp index {i} out of range ({} active)",
            self.active.len()
        );
        self.active[i]
    }

    /// Active pool slots in render order
    pub fn active_lamps(&self) -> &[usize] {
        &self.active
    }

    /// World position of lamp `slot`
    pub fn position(&self, slot: usize) -> Vec3 {
        self.projectors[slot].position()
    }

    /// Texture unit owned by lamp `slot`
    pub fn texture_slot(&self, slot: usize) -> u32 {
        self.texture_slots[slot]
    }

    /// Spot light of the `i`th active lamp
    pub fn projector(&self, i: usize) -> &SpotlightProjector<T> {
        &self.projectors[self.active_lamp(i)]
    }

    /// Light matrix of the `i`th active lamp
    pub fn light_matrix(&self, i: usize) -> Mat4 {
        self.projector(i).light_matrix()
    }

    /// Open a depth pass on the `i`th active lamp's shadow map
    pub fn bind_render_target<'a>(
        &'a mut self,
        i: usize,
        recorder: &'a T::Recorder,
    ) -> RenderResult<DepthPass<'a, T>> {
        let slot = self.active_lamp(i);
        self.projectors[slot].bind_render_target(recorder)
    }

    /// Expose the `i`th active lamp's depth texture at the unit its slot owns
    pub fn bind_depth_texture(&self, i: usize) -> DepthTextureBinding<T::Texture> {
        let slot = self.active_lamp(i);
        self.projectors[slot].bind_depth_texture(self.texture_slots[slot])
    }

    /// Upload the `i`th active lamp's light matrix under `name`
    pub fn update_light_matrix_uniform(&self, i: usize, sink: &mut dyn UniformSink, name: &str) {
        self.projector(i).update_light_matrix_uniform(sink, name);
    }

    /// Light matrices of the active lamps, in active order
    pub fn light_matrices(&self) -> Vec<Mat4> {
        self.active.iter().map(|&slot| self.projectors[slot].light_matrix()).collect()
    }

    /// Positions of the active lamps, in active order
    pub fn positions(&self) -> Vec<Vec3> {
        self.active.iter().map(|&slot| self.projectors[slot].position()).collect()
    }

    /// Texture units of the active lamps, in active order
    pub fn texture_slots(&self) -> Vec<i32> {
        self.active.iter().map(|&slot| self.texture_slots[slot] as i32).collect()
    }

    /// Active lamps packed for a storage buffer
    pub fn gpu_casters(&self) -> Vec<GpuShadowCaster> {
        self.active
            .iter()
            .map(|&slot| {
                let projector = &self.projectors[slot];
                GpuShadowCaster::new(
                    &projector.light_matrix(),
                    &projector.position(),
                    self.texture_slots[slot] as i32,
                )
            })
            .collect()
    }

    /// Cone geometry shared by every lamp
    pub fn cone(&self) -> &LampCone {
        &self.cone
    }

    /// Upload the lamp arrays and cone parameters for the lit pass
    pub fn upload_uniforms(&self, sink: &mut dyn UniformSink) {
        sink.set_f32(names::LAMP_ANGLE_IN, self.cone.angle_in.cos());
        sink.set_f32(names::LAMP_ANGLE_OUT, self.cone.angle_out.cos());
        sink.set_vec3(names::LAMP_DIRECTION, &DEFAULT_SPOT_DIRECTION);
        sink.set_i32(names::LAMP_COUNT, self.active.len() as i32);
        sink.set_i32(names::LAMP_SHADOWMAP_SIZE, self.shadowmap_size as i32);
        sink.set_vec3_array(names::LAMP_POSITIONS, &self.positions());
        sink.set_mat4_array(names::LAMP_MATRICES, &self.light_matrices());
        sink.set_i32_array(names::LAMP_SHADOWMAPS, &self.texture_slots());
    }

    /// Update the darkness switch from the current sun direction
    pub fn set_sunlight_switch(&mut self, sun_direction: Vec3, nighttime_threshold: f32) {
        self.switch.set_sunlight(sun_direction, nighttime_threshold);
    }

    /// Set the user override
    pub fn set_user_switch(&mut self, on: bool) {
        self.switch.set_user(on);
    }

    /// Whether the lamps should shine
    pub fn is_on(&self) -> bool {
        self.switch.is_on()
    }

    /// Both switch states
    pub fn switch(&self) -> &LightSwitch {
        &self.switch
    }
}
