//! View frustum extraction and culling
//!
//! Planes are pulled straight out of a combined view-projection matrix
//! (Gribb/Hartmann). The projection is expected to map depth to `[-1, 1]`,
//! which is what `nalgebra::Perspective3` produces.

use crate::foundation::math::{Mat4, Vec3, Vec4};
use super::collision::{Aabb, BoundingSphere};

/// Result of a containment test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    /// Completely outside at least one plane
    Disjoint,
    /// Straddles a plane
    Intersects,
    /// Inside every plane
    Contains,
}

/// Six clip planes with inward-facing normals, as `(a, b, c, d)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    planes: [Vec4; 6],
}

impl Frustum {
    /// Extract the frustum of a view-projection matrix
    pub fn from_matrix(view_projection: &Mat4) -> Self {
        let row = |i: usize| -> Vec4 { view_projection.row(i).transpose() };
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        let planes = [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r3 + r2, r3 - r2]
            .map(|plane| {
                let length = plane.xyz().magnitude();
                if length > f32::EPSILON { plane / length } else { plane }
            });

        Self { planes }
    }

    /// Planes in left, right, bottom, top, near, far order
    pub fn planes(&self) -> &[Vec4; 6] {
        &self.planes
    }

    fn signed_distance(plane: &Vec4, point: &Vec3) -> f32 {
        plane.xyz().dot(point) + plane.w
    }

    /// Classify a sphere against the frustum
    pub fn contains_sphere(&self, sphere: &BoundingSphere) -> Containment {
        let mut result = Containment::Contains;
        for plane in &self.planes {
            let distance = Self::signed_distance(plane, &sphere.center);
            if distance < -sphere.radius {
                return Containment::Disjoint;
            }
            if distance < sphere.radius {
                result = Containment::Intersects;
            }
        }
        result
    }

    /// Classify a box against the frustum
    pub fn contains_aabb(&self, aabb: &Aabb) -> Containment {
        let mut result = Containment::Contains;
        for plane in &self.planes {
            let normal = plane.xyz();
            let positive = Vec3::new(
                if normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );
            let negative = Vec3::new(
                if normal.x >= 0.0 { aabb.min.x } else { aabb.max.x },
                if normal.y >= 0.0 { aabb.min.y } else { aabb.max.y },
                if normal.z >= 0.0 { aabb.min.z } else { aabb.max.z },
            );

            if Self::signed_distance(plane, &positive) < 0.0 {
                return Containment::Disjoint;
            }
            if Self::signed_distance(plane, &negative) < 0.0 {
                result = Containment::Intersects;
            }
        }
        result
    }

    /// True unless the sphere is completely outside
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        self.contains_sphere(sphere) != Containment::Disjoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Mat4Ext;
    use nalgebra::Perspective3;

    fn test_frustum() -> Frustum {
        let projection = Perspective3::new(1.0, 60.0_f32.to_radians(), 0.1, 100.0);
        let view = Mat4::look_at(Vec3::zeros(), Vec3::new(0.0, 0.0, -1.0), Vec3::y());
        Frustum::from_matrix(&(projection.to_homogeneous() * view))
    }

    #[test]
    fn test_sphere_classification() {
        let frustum = test_frustum();

        let ahead = BoundingSphere::new(Vec3::new(0.0, 0.0, -20.0), 1.0);
        assert_eq!(frustum.contains_sphere(&ahead), Containment::Contains);

        let behind = BoundingSphere::new(Vec3::new(0.0, 0.0, 20.0), 1.0);
        assert_eq!(frustum.contains_sphere(&behind), Containment::Disjoint);

        let beyond_far = BoundingSphere::new(Vec3::new(0.0, 0.0, -150.0), 1.0);
        assert!(!frustum.intersects_sphere(&beyond_far));

        let on_near_plane = BoundingSphere::new(Vec3::new(0.0, 0.0, -0.1), 0.5);
        assert_eq!(frustum.contains_sphere(&on_near_plane), Containment::Intersects);
    }

    #[test]
    fn test_box_classification() {
        let frustum = test_frustum();

        let ahead = Aabb::new(Vec3::new(-1.0, -1.0, -21.0), Vec3::new(1.0, 1.0, -19.0));
        assert_eq!(frustum.contains_aabb(&ahead), Containment::Contains);

        let far_left = Aabb::new(Vec3::new(-200.0, -1.0, -11.0), Vec3::new(-190.0, 1.0, -9.0));
        assert_eq!(frustum.contains_aabb(&far_left), Containment::Disjoint);
    }
}
