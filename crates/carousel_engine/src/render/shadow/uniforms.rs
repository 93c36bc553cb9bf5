//! Shader uniform contract of the lighting subsystem
//!
//! Uniform names and texture unit numbering are shared with the lit and depth
//! shaders and must stay stable. Each light kind uploads one light matrix, one
//! depth texture unit and (where the shader needs it) one position per light.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{Mat4, Vec3};

/// Uniform names understood by the depth and lit shaders
pub mod names {
    /// Light matrix of the caster currently being rendered (depth shader)
    pub const LIGHT_MATRIX: &str = "uLightMatrix";

    /// Unit direction from the scene toward the sun
    pub const SUN_DIRECTION: &str = "uSunDirection";
    /// Sun light matrix
    pub const SUN_MATRIX: &str = "uSunMatrix";
    /// Texture unit of the sun's shadow map
    pub const SUN_SHADOWMAP: &str = "uSunShadowmap";
    /// Side length of the sun's shadow map
    pub const SUN_SHADOWMAP_SIZE: &str = "uSunShadowmapSize";

    /// Cosine of the lamps' inner cone half-angle
    pub const LAMP_ANGLE_IN: &str = "uLampAngleIn";
    /// Cosine of the lamps' outer cone half-angle
    pub const LAMP_ANGLE_OUT: &str = "uLampAngleOut";
    /// Direction every lamp points in
    pub const LAMP_DIRECTION: &str = "uLampDirection";
    /// Positions of the active lamps
    pub const LAMP_POSITIONS: &str = "uLamps";
    /// Light matrices of the active lamps
    pub const LAMP_MATRICES: &str = "uLampMatrix";
    /// Texture units of the active lamps' shadow maps
    pub const LAMP_SHADOWMAPS: &str = "uLampShadowmaps";
    /// Number of entries in the lamp arrays
    pub const LAMP_COUNT: &str = "uLampCount";
    /// Side length of a lamp shadow map
    pub const LAMP_SHADOWMAP_SIZE: &str = "uLampShadowmapSize";

    /// Light matrices of the two headlights
    pub const HEADLIGHT_MATRICES: &str = "uHeadlightMatrix";
    /// World positions of the two headlights
    pub const HEADLIGHT_POSITIONS: &str = "uHeadlightPos";
    /// Texture units of the two headlight shadow maps
    pub const HEADLIGHT_SHADOWMAPS: &str = "uHeadlightShadowmap";
    /// Side length of a headlight shadow map
    pub const HEADLIGHT_SHADOWMAP_SIZE: &str = "uHeadlightShadowmapSize";

    /// Whether shadow lookups are enabled at all
    pub const DRAW_SHADOWS: &str = "uDrawShadows";
    /// Whether the sun contributes light
    pub const SUN_STATE: &str = "uSunState";
    /// Whether the lamps contribute light
    pub const LAMP_STATE: &str = "uLampState";
    /// Whether the headlights contribute light
    pub const HEADLIGHT_STATE: &str = "uHeadlightState";
}

/// Destination of uniform uploads
///
/// Implemented by whatever owns the active shader program. Array uploads
/// replace the whole array; their length is the element count.
pub trait UniformSink {
    /// Upload a single matrix
    fn set_mat4(&mut self, name: &str, value: &Mat4);

    /// Upload a matrix array
    fn set_mat4_array(&mut self, name: &str, values: &[Mat4]);

    /// Upload a single vector
    fn set_vec3(&mut self, name: &str, value: &Vec3);

    /// Upload a vector array
    fn set_vec3_array(&mut self, name: &str, values: &[Vec3]);

    /// Upload a single integer (texture units, sizes, counts)
    fn set_i32(&mut self, name: &str, value: i32);

    /// Upload an integer array
    fn set_i32_array(&mut self, name: &str, values: &[i32]);

    /// Upload a single float
    fn set_f32(&mut self, name: &str, value: f32);

    /// Upload a flag; the shaders read flags as 0.0 / 1.0 floats
    fn set_bool(&mut self, name: &str, value: bool) {
        self.set_f32(name, if value { 1.0 } else { 0.0 });
    }
}

/// A value captured by [`RecordingSink`]
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    /// Single matrix
    Mat4(Mat4),
    /// Matrix array
    Mat4Array(Vec<Mat4>),
    /// Single vector
    Vec3(Vec3),
    /// Vector array
    Vec3Array(Vec<Vec3>),
    /// Single integer
    I32(i32),
    /// Integer array
    I32Array(Vec<i32>),
    /// Single float
    F32(f32),
}

/// Sink that keeps the last value uploaded under each name
#[derive(Debug, Default)]
pub struct RecordingSink {
    values: HashMap<String, UniformValue>,
}

impl RecordingSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Last value uploaded under `name`
    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.values.get(name)
    }

    /// Last single matrix uploaded under `name`
    pub fn mat4(&self, name: &str) -> Option<Mat4> {
        match self.values.get(name) {
            Some(UniformValue::Mat4(m)) => Some(*m),
            _ => None,
        }
    }

    /// Last matrix array uploaded under `name`
    pub fn mat4_array(&self, name: &str) -> Option<&[Mat4]> {
        match self.values.get(name) {
            Some(UniformValue::Mat4Array(m)) => Some(m),
            _ => None,
        }
    }

    /// Last single vector uploaded under `name`
    pub fn vec3(&self, name: &str) -> Option<Vec3> {
        match self.values.get(name) {
            Some(UniformValue::Vec3(v)) => Some(*v),
            _ => None,
        }
    }

    /// Last vector array uploaded under `name`
    pub fn vec3_array(&self, name: &str) -> Option<&[Vec3]> {
        match self.values.get(name) {
            Some(UniformValue::Vec3Array(v)) => Some(v),
            _ => None,
        }
    }

    /// Last integer uploaded under `name`
    pub fn i32(&self, name: &str) -> Option<i32> {
        match self.values.get(name) {
            Some(UniformValue::I32(v)) => Some(*v),
            _ => None,
        }
    }

    /// Last integer array uploaded under `name`
    pub fn i32_array(&self, name: &str) -> Option<&[i32]> {
        match self.values.get(name) {
            Some(UniformValue::I32Array(v)) => Some(v),
            _ => None,
        }
    }

    /// Last float uploaded under `name`
    pub fn f32(&self, name: &str) -> Option<f32> {
        match self.values.get(name) {
            Some(UniformValue::F32(v)) => Some(*v),
            _ => None,
        }
    }

    /// Number of distinct names uploaded so far
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when nothing has been uploaded
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl UniformSink for RecordingSink {
    fn set_mat4(&mut self, name: &str, value: &Mat4) {
        self.values.insert(name.to_string(), UniformValue::Mat4(*value));
    }

    fn set_mat4_array(&mut self, name: &str, values: &[Mat4]) {
        self.values.insert(name.to_string(), UniformValue::Mat4Array(values.to_vec()));
    }

    fn set_vec3(&mut self, name: &str, value: &Vec3) {
        self.values.insert(name.to_string(), UniformValue::Vec3(*value));
    }

    fn set_vec3_array(&mut self, name: &str, values: &[Vec3]) {
        self.values.insert(name.to_string(), UniformValue::Vec3Array(values.to_vec()));
    }

    fn set_i32(&mut self, name: &str, value: i32) {
        self.values.insert(name.to_string(), UniformValue::I32(value));
    }

    fn set_i32_array(&mut self, name: &str, values: &[i32]) {
        self.values.insert(name.to_string(), UniformValue::I32Array(values.to_vec()));
    }

    fn set_f32(&mut self, name: &str, value: f32) {
        self.values.insert(name.to_string(), UniformValue::F32(value));
    }
}

/// Push constant block of the depth-only pipeline
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DepthPushConstants {
    /// Light matrix of the caster being rendered, column major
    pub light_matrix: [[f32; 4]; 4],
}

impl DepthPushConstants {
    /// Pack a light matrix for `vkCmdPushConstants`
    pub fn new(light_matrix: &Mat4) -> Self {
        Self {
            light_matrix: (*light_matrix).into(),
        }
    }

    /// Raw bytes to hand to the command buffer
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// One shadow caster as laid out in the lit shader's storage buffer (std430)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuShadowCaster {
    /// Light matrix, column major
    pub light_matrix: [[f32; 4]; 4],
    /// Light position, w unused
    pub position: [f32; 4],
    /// Texture unit of the caster's depth map
    pub texture_slot: i32,
    /// Pads the struct to a multiple of 16 bytes
    pub _padding: [i32; 3],
}

impl GpuShadowCaster {
    /// Pack one caster
    pub fn new(light_matrix: &Mat4, position: &Vec3, texture_slot: i32) -> Self {
        Self {
            light_matrix: (*light_matrix).into(),
            position: [position.x, position.y, position.z, 1.0],
            texture_slot,
            _padding: [0; 3],
        }
    }
}

/// View a caster array as bytes for a buffer upload
pub fn casters_as_bytes(casters: &[GpuShadowCaster]) -> &[u8] {
    bytemuck::cast_slice(casters)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_keeps_last_value() {
        let mut sink = RecordingSink::new();
        sink.set_i32(names::SUN_SHADOWMAP, 4);
        sink.set_i32(names::SUN_SHADOWMAP, 7);
        sink.set_bool(names::LAMP_STATE, true);

        assert_eq!(sink.i32(names::SUN_SHADOWMAP), Some(7));
        assert_eq!(sink.f32(names::LAMP_STATE), Some(1.0));
        assert_eq!(sink.mat4(names::SUN_SHADOWMAP), None);
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn gpu_layouts_are_std430_friendly() {
        assert_eq!(std::mem::size_of::<DepthPushConstants>(), 64);
        assert_eq!(std::mem::size_of::<GpuShadowCaster>() % 16, 0);
    }

    #[test]
    fn caster_packs_column_major() {
        let m = Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0));
        let caster = GpuShadowCaster::new(&m, &Vec3::new(4.0, 5.0, 6.0), 9);

        assert_eq!(caster.light_matrix[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(caster.position, [4.0, 5.0, 6.0, 1.0]);

        let casters = [caster, caster];
        assert_eq!(casters_as_bytes(&casters).len(), 2 * std::mem::size_of::<GpuShadowCaster>());
        assert_eq!(DepthPushConstants::new(&m).as_bytes().len(), 64);
    }
}
