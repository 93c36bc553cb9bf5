//! Axis-aligned bounding boxes
//!
//! The scene box is the only piece of world geometry the lighting code sees:
//! the sun fits its orthographic frustum to it and positional lights fit
//! their perspective frustum to it.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{project_point, Mat4, Point3};

/// Axis-Aligned Bounding Box
///
/// An empty box has `min = +inf` and `max = -inf` so that the first
/// [`Aabb::add`] collapses it onto that point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Point3,
    /// Maximum corner of the bounding box
    pub max: Point3,
}

impl Aabb {
    /// Create a new AABB from two opposite corners, in any order
    pub fn new(a: Point3, b: Point3) -> Self {
        Self {
            min: a.inf(&b),
            max: a.sup(&b),
        }
    }

    /// Create a box that contains nothing yet
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Point3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    /// Smallest box enclosing every point of the iterator
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = Point3>,
    {
        let mut aabb = Self::empty();
        for point in points {
            aabb.add(point);
        }
        aabb
    }

    /// Grow the box so it encloses `point`
    pub fn add(&mut self, point: Point3) {
        self.min = self.min.inf(&point);
        self.max = self.max.sup(&point);
    }

    /// True until the first point is added
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> nalgebra::Vector3<f32> {
        (self.max - self.min) * 0.5
    }

    /// Length of the main diagonal
    pub fn diagonal(&self) -> f32 {
        (self.max - self.min).norm()
    }

    /// Check if this AABB contains a point (boundary included)
    pub fn contains_point(&self, point: &Point3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// The eight corners of the box
    pub fn corners(&self) -> [Point3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            lo,
            Point3::new(lo.x, lo.y, hi.z),
            Point3::new(lo.x, hi.y, hi.z),
            Point3::new(lo.x, hi.y, lo.z),
            Point3::new(hi.x, hi.y, lo.z),
            Point3::new(hi.x, lo.y, lo.z),
            Point3::new(hi.x, lo.y, hi.z),
            hi,
        ]
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

/// Axis-aligned box enclosing the image of `aabb`'s corners under `transform`
///
/// Exact for affine transforms. An empty input yields an empty output and a
/// point-sized box stays point-sized.
pub fn transform_bounding_box(aabb: &Aabb, transform: &Mat4) -> Aabb {
    if aabb.is_empty() {
        return Aabb::empty();
    }

    Aabb::from_points(
        aabb.corners()
            .iter()
            .map(|corner| project_point(transform, corner)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat4Ext, Vec3};
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    fn unit_box() -> Aabb {
        Aabb::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn add_grows_from_empty() {
        let mut aabb = Aabb::empty();
        assert!(aabb.is_empty());

        aabb.add(Point3::new(1.0, 2.0, 3.0));
        assert!(!aabb.is_empty());
        assert_eq!(aabb.min, aabb.max);

        aabb.add(Point3::new(-1.0, 5.0, 0.0));
        assert_eq!(aabb.min, Point3::new(-1.0, 2.0, 0.0));
        assert_eq!(aabb.max, Point3::new(1.0, 5.0, 3.0));
    }

    #[test]
    fn new_orders_corners() {
        let aabb = Aabb::new(Point3::new(2.0, -1.0, 0.0), Point3::new(-2.0, 1.0, 4.0));
        assert_eq!(aabb.min, Point3::new(-2.0, -1.0, 0.0));
        assert_eq!(aabb.max, Point3::new(2.0, 1.0, 4.0));
        assert_relative_eq!(aabb.center(), Point3::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn translation_shifts_box() {
        let t = Mat4::new_translation(&Vec3::new(5.0, 0.0, -2.0));
        let moved = transform_bounding_box(&unit_box(), &t);
        assert_relative_eq!(moved.min, Point3::new(4.0, -1.0, -3.0), epsilon = EPSILON);
        assert_relative_eq!(moved.max, Point3::new(6.0, 1.0, -1.0), epsilon = EPSILON);
    }

    #[test]
    fn rotation_encloses_all_corners() {
        let r = Mat4::rotation_y(std::f32::consts::FRAC_PI_4);
        let rotated = transform_bounding_box(&unit_box(), &r);
        let sqrt2 = std::f32::consts::SQRT_2;

        assert_relative_eq!(rotated.max.x, sqrt2, epsilon = EPSILON);
        assert_relative_eq!(rotated.min.z, -sqrt2, epsilon = EPSILON);
        assert_relative_eq!(rotated.max.y, 1.0, epsilon = EPSILON);

        for corner in unit_box().corners() {
            let image = project_point(&r, &corner);
            assert!(rotated.contains_point(&image));
        }
    }

    #[test]
    fn point_box_stays_a_point() {
        let p = Point3::new(1.0, 2.0, 3.0);
        let aabb = Aabb::new(p, p);
        let scaled = transform_bounding_box(&aabb, &Mat4::new_scaling(2.0));
        assert_relative_eq!(scaled.min, Point3::new(2.0, 4.0, 6.0), epsilon = EPSILON);
        assert_eq!(scaled.min, scaled.max);
    }

    #[test]
    fn empty_box_stays_empty() {
        assert!(transform_bounding_box(&Aabb::empty(), &Mat4::identity()).is_empty());
    }
}
