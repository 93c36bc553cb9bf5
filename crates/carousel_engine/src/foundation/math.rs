//! Math utilities and types
//!
//! Provides the nalgebra aliases and the projection helpers shared by the
//! camera and every shadow-casting light.
//!
//! # Conventions
//! - World space is right-handed and Y-up.
//! - View space looks down -Z (the camera sits at the origin facing -Z).
//! - Projections map view depth to [0, 1], the Vulkan clip range. A point is
//!   inside the clip volume when `-1 <= x, y <= 1` and `0 <= z <= 1` after the
//!   perspective divide.

pub use nalgebra::{Matrix4, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// World up axis
pub const WORLD_UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;

    /// Lengths below this are treated as zero when normalizing
    pub const NORMALIZE_EPSILON: f32 = 1.0e-6;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Vec3};

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }

    /// Normalize `v`, or return `None` when it is too short to have a direction.
    pub fn try_normalize(v: &Vec3) -> Option<Vec3> {
        v.try_normalize(constants::NORMALIZE_EPSILON)
    }

    /// Normalize `v`, substituting `fallback` when `v` has no usable direction.
    pub fn safe_normalize(v: &Vec3, fallback: Vec3) -> Vec3 {
        try_normalize(v).unwrap_or(fallback)
    }

    /// Returns true when `a` and `b` point along the same line (either sense).
    pub fn is_parallel(a: &Vec3, b: &Vec3) -> bool {
        a.cross(b).norm() < constants::NORMALIZE_EPSILON
    }
}

/// Extension trait for Mat4 with the view and projection builders
pub trait Mat4Ext {
    /// Create a rotation matrix around the X axis
    fn rotation_x(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Y axis
    fn rotation_y(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Z axis
    fn rotation_z(angle: f32) -> Mat4;

    /// Create a right-handed look-at view matrix
    ///
    /// The caller guarantees that `target - eye` is non-zero and not parallel
    /// to `up`; light and camera code substitutes a safe basis before calling.
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Create an orthographic projection for the given view-space box
    ///
    /// `near` and `far` are distances along -Z, depth maps to [0, 1].
    fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4;

    /// Create an off-axis perspective projection from the near-plane rectangle
    fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4;

    /// Create a symmetric perspective projection
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Translation column of an affine transform
    fn translation_part(&self) -> Vec3;

    /// Copy of this matrix with the translation column zeroed
    fn without_translation(&self) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn rotation_x(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::x_axis(), angle)
    }

    fn rotation_y(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::y_axis(), angle)
    }

    fn rotation_z(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::z_axis(), angle)
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let forward = (target - eye).normalize();
        let right = forward.cross(&up).normalize();
        let camera_up = right.cross(&forward);

        let translation = Mat4::new(
            1.0, 0.0, 0.0, -eye.x,
            0.0, 1.0, 0.0, -eye.y,
            0.0, 0.0, 1.0, -eye.z,
            0.0, 0.0, 0.0, 1.0,
        );

        let rotation = Mat4::new(
            right.x, right.y, right.z, 0.0,
            camera_up.x, camera_up.y, camera_up.z, 0.0,
            -forward.x, -forward.y, -forward.z, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );

        rotation * translation
    }

    fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        let mut result = Mat4::identity();

        result[(0, 0)] = 2.0 / (right - left);
        result[(1, 1)] = 2.0 / (top - bottom);
        result[(2, 2)] = -1.0 / (far - near);
        result[(0, 3)] = -(right + left) / (right - left);
        result[(1, 3)] = -(top + bottom) / (top - bottom);
        result[(2, 3)] = -near / (far - near);

        result
    }

    fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        let mut result = Mat4::zeros();

        result[(0, 0)] = 2.0 * near / (right - left);
        result[(0, 2)] = (right + left) / (right - left);
        result[(1, 1)] = 2.0 * near / (top - bottom);
        result[(1, 2)] = (top + bottom) / (top - bottom);
        result[(2, 2)] = far / (near - far);
        result[(2, 3)] = -(far * near) / (far - near);
        result[(3, 2)] = -1.0;

        result
    }

    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let tan_half_fovy = (fov_y * 0.5).tan();

        let mut result = Mat4::zeros();

        // P = [1/(a*t)  0     0           0         ]
        //     [0        1/t   0           0         ]
        //     [0        0     f/(n-f)    -nf/(f-n)  ]
        //     [0        0    -1           0         ]
        result[(0, 0)] = 1.0 / (aspect * tan_half_fovy);
        result[(1, 1)] = 1.0 / tan_half_fovy;
        result[(2, 2)] = far / (near - far);
        result[(2, 3)] = -(far * near) / (far - near);
        result[(3, 2)] = -1.0;

        result
    }

    fn translation_part(&self) -> Vec3 {
        Vec3::new(self[(0, 3)], self[(1, 3)], self[(2, 3)])
    }

    fn without_translation(&self) -> Mat4 {
        let mut result = *self;
        result[(0, 3)] = 0.0;
        result[(1, 3)] = 0.0;
        result[(2, 3)] = 0.0;
        result
    }
}

/// Transform a point by a full 4x4 matrix, including the homogeneous divide
pub fn project_point(matrix: &Mat4, point: &Point3) -> Point3 {
    let clip = matrix * point.to_homogeneous();
    if clip.w.abs() > f32::EPSILON && (clip.w - 1.0).abs() > f32::EPSILON {
        Point3::new(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w)
    } else {
        Point3::new(clip.x, clip.y, clip.z)
    }
}
