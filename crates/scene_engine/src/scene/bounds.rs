//! Bounding volumes and frustum classification
//!
//! All tests return a three-way [`BoundOverlap`] so the culler can tell a
//! fully contained subtree (no further tests needed) from a straddling one.

use crate::foundation::math::{utils, Mat4, Point3, Vec3, Vec4};

/// Result of classifying a volume against a frustum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BoundOverlap {
    /// Completely outside
    #[default]
    No,
    /// Straddles at least one plane
    Partial,
    /// Completely inside
    Yes,
}

/// Axis-Aligned Bounding Box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Cube of half-size `half` around the origin
    pub fn cube(half: f32) -> Self {
        Self::from_center_extents(Vec3::zeros(), Vec3::new(half, half, half))
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Smallest box enclosing both
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// The eight corners, x varying fastest
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Box enclosing this box after an affine transform
    #[must_use]
    pub fn transform(&self, matrix: &Mat4) -> Self {
        let center = matrix.transform_point(&Point3::from(self.center())).coords;
        let extents = utils::abs_linear_part(matrix) * self.extents();
        Self::from_center_extents(center, extents)
    }
}

/// Bounding sphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    /// Center in world space
    pub center: Vec3,
    /// Radius
    pub radius: f32,
}

impl Sphere {
    /// Create a sphere
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}

/// Oriented bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obb {
    /// Center in world space
    pub center: Vec3,
    /// Unit axes
    pub axes: [Vec3; 3],
    /// Half-size along each axis
    pub extents: Vec3,
}

impl Obb {
    /// Oriented box obtained by pushing an AABB through `matrix` without
    /// re-axis-aligning it
    pub fn from_aabb(aabb: &Aabb, matrix: &Mat4) -> Self {
        let center = matrix.transform_point(&Point3::from(aabb.center())).coords;
        let mut axes = [Vec3::x(), Vec3::y(), Vec3::z()];
        let mut extents = aabb.extents();
        for (i, axis) in axes.iter_mut().enumerate() {
            let scaled = matrix.transform_vector(axis);
            let length = scaled.norm();
            if length > f32::EPSILON {
                *axis = scaled / length;
                extents[i] *= length;
            }
        }
        Self { center, axes, extents }
    }

    /// Projected radius onto a plane normal
    fn radius_along(&self, normal: &Vec3) -> f32 {
        self.axes
            .iter()
            .zip(self.extents.iter())
            .map(|(axis, extent)| extent * normal.dot(axis).abs())
            .sum()
    }
}

/// Plane defined by normal and distance from origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal vector (normalized, pointing into the frustum)
    pub normal: Vec3,
    /// Distance from origin along the normal
    pub distance: f32,
}

impl Plane {
    /// Plane from the raw `(a, b, c, d)` coefficients of `ax + by + cz + d = 0`
    fn from_coefficients(coefficients: Vec4) -> Self {
        let normal = Vec3::new(coefficients.x, coefficients.y, coefficients.z);
        let length = normal.norm();
        Self {
            normal: normal / length,
            distance: coefficients.w / length,
        }
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }

    /// Classify a volume with the given center and projected radius
    fn classify(&self, center: Vec3, radius: f32) -> BoundOverlap {
        let distance = self.distance_to_point(center);
        if distance < -radius {
            BoundOverlap::No
        } else if distance < radius {
            BoundOverlap::Partial
        } else {
            BoundOverlap::Yes
        }
    }
}

/// Frustum for visibility culling
#[derive(Debug, Clone)]
pub struct Frustum {
    /// Six planes (left, right, bottom, top, near, far), normals facing inward
    pub planes: [Plane; 6],
    /// World-space corners, used for frustum-vs-frustum tests
    corners: [Vec3; 8],
}

impl Frustum {
    /// Extract frustum planes from a view-projection matrix
    ///
    /// Gribb-Hartmann extraction for an OpenGL style clip space
    /// (`-w <= x, y, z <= w`).
    pub fn from_matrix(vp_matrix: &Mat4) -> Self {
        let row = |r: usize| {
            Vec4::new(vp_matrix[(r, 0)], vp_matrix[(r, 1)], vp_matrix[(r, 2)], vp_matrix[(r, 3)])
        };
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        let planes = [
            Plane::from_coefficients(r3 + r0),
            Plane::from_coefficients(r3 - r0),
            Plane::from_coefficients(r3 + r1),
            Plane::from_coefficients(r3 - r1),
            Plane::from_coefficients(r3 + r2),
            Plane::from_coefficients(r3 - r2),
        ];

        let inverse = vp_matrix.try_inverse().unwrap_or_else(Mat4::identity);
        let corners = Aabb::cube(1.0)
            .corners()
            .map(|ndc| inverse.transform_point(&Point3::from(ndc)).coords);

        Self { planes, corners }
    }

    /// World-space corners of the frustum volume
    pub fn corners(&self) -> &[Vec3; 8] {
        &self.corners
    }

    /// Combine per-plane classifications: any `No` wins, then any `Partial`
    fn classify_with(&self, mut per_plane: impl FnMut(&Plane) -> BoundOverlap) -> BoundOverlap {
        let mut result = BoundOverlap::Yes;
        for plane in &self.planes {
            match per_plane(plane) {
                BoundOverlap::No => return BoundOverlap::No,
                BoundOverlap::Partial => result = BoundOverlap::Partial,
                BoundOverlap::Yes => {}
            }
        }
        result
    }

    /// Classify an AABB
    pub fn aabb_visible(&self, aabb: &Aabb) -> BoundOverlap {
        let center = aabb.center();
        let extents = aabb.extents();
        self.classify_with(|plane| plane.classify(center, extents.dot(&plane.normal.abs())))
    }

    /// Classify an oriented box
    pub fn obb_visible(&self, obb: &Obb) -> BoundOverlap {
        self.classify_with(|plane| plane.classify(obb.center, obb.radius_along(&plane.normal)))
    }

    /// Classify a sphere
    pub fn sphere_visible(&self, sphere: &Sphere) -> BoundOverlap {
        self.classify_with(|plane| plane.classify(sphere.center, sphere.radius))
    }

    /// Classify another frustum by its corners
    ///
    /// Conservative: a frustum crossing a plane edge-on may report `Partial`
    /// where an exact separating-axis test would report `No`.
    pub fn frustum_visible(&self, other: &Self) -> BoundOverlap {
        self.classify_with(|plane| {
            let inside = other
                .corners
                .iter()
                .filter(|corner| plane.distance_to_point(**corner) >= 0.0)
                .count();
            match inside {
                0 => BoundOverlap::No,
                8 => BoundOverlap::Yes,
                _ => BoundOverlap::Partial,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Camera at +5 z looking at the origin
    fn test_frustum() -> Frustum {
        let view = Mat4::look_at_rh(
            &Point3::new(0.0, 0.0, 5.0),
            &Point3::origin(),
            &Vec3::y(),
        );
        let proj = Mat4::new_perspective(1.0, std::f32::consts::FRAC_PI_2, 0.1, 100.0);
        Frustum::from_matrix(&(proj * view))
    }

    #[test]
    fn test_aabb_union() {
        let a = Aabb::new(Vec3::new(-1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 1.0));
        let b = Aabb::new(Vec3::new(0.0, -2.0, 0.0), Vec3::new(3.0, 0.0, 1.0));
        let u = a.union(&b);
        assert_relative_eq!(u.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_relative_eq!(u.max, Vec3::new(3.0, 1.0, 1.0));
    }

    #[test]
    fn test_aabb_transform_translation_and_rotation() {
        let moved = Aabb::cube(1.0).transform(&Mat4::new_translation(&Vec3::new(10.0, 0.0, 0.0)));
        assert_relative_eq!(moved.center(), Vec3::new(10.0, 0.0, 0.0));
        assert_relative_eq!(moved.extents(), Vec3::new(1.0, 1.0, 1.0));

        let rotation = Mat4::from_axis_angle(&Vec3::z_axis(), std::f32::consts::FRAC_PI_4);
        let rotated = Aabb::cube(1.0).transform(&rotation);
        let expected = std::f32::consts::SQRT_2;
        assert_relative_eq!(rotated.extents().x, expected, epsilon = 1e-5);
        assert_relative_eq!(rotated.extents().z, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_frustum_classifies_aabb() {
        let frustum = test_frustum();
        assert_eq!(frustum.aabb_visible(&Aabb::cube(1.0)), BoundOverlap::Yes);

        let behind = Aabb::from_center_extents(Vec3::new(0.0, 0.0, 20.0), Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(frustum.aabb_visible(&behind), BoundOverlap::No);

        let straddling = Aabb::from_center_extents(Vec3::new(5.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(frustum.aabb_visible(&straddling), BoundOverlap::Partial);
    }

    #[test]
    fn test_frustum_classifies_sphere_and_obb() {
        let frustum = test_frustum();
        assert_eq!(frustum.sphere_visible(&Sphere::new(Vec3::zeros(), 1.0)), BoundOverlap::Yes);
        assert_eq!(
            frustum.sphere_visible(&Sphere::new(Vec3::new(0.0, 0.0, 50.0), 1.0)),
            BoundOverlap::No
        );

        let obb = Obb::from_aabb(&Aabb::cube(1.0), &Mat4::new_translation(&Vec3::new(0.0, 0.0, 30.0)));
        assert_eq!(frustum.obb_visible(&obb), BoundOverlap::No);
    }

    #[test]
    fn test_frustum_contains_itself() {
        let frustum = test_frustum();
        assert_ne!(frustum.frustum_visible(&frustum), BoundOverlap::No);
    }
}
