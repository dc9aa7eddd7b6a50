//! Bounding volumes and ray casting
//!
//! Narrow-phase tests for the shapes units carry: a sphere for visibility
//! culling and an axis-aligned box for weapon picking.

use crate::foundation::math::{utils, Vec3};

/// A ray for ray casting and picking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// The origin point of the ray in world space
    pub origin: Vec3,
    /// The direction of the ray, normalized (zero when built from a zero vector)
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray with the given origin and direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: utils::try_normalize(&direction).unwrap_or_else(Vec3::zeros),
        }
    }

    /// True when the ray has no usable direction
    pub fn is_degenerate(&self) -> bool {
        self.direction == Vec3::zeros()
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// A bounding sphere for collision detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// The center position of the sphere in world space
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Smallest sphere centred on the box that encloses it
    pub fn from_aabb(aabb: &Aabb) -> Self {
        Self::new(aabb.center(), aabb.extents().magnitude())
    }

    /// The same sphere moved by `offset`
    pub fn translated(&self, offset: Vec3) -> Self {
        Self::new(self.center + offset, self.radius)
    }

    /// Check if this sphere intersects with another
    pub fn intersects(&self, other: &BoundingSphere) -> bool {
        let distance_squared = (self.center - other.center).magnitude_squared();
        let radius_sum = self.radius + other.radius;
        distance_squared <= radius_sum * radius_sum
    }

    /// Check if a point lies inside or on the sphere
    pub fn contains_point(&self, point: &Vec3) -> bool {
        (point - self.center).magnitude_squared() <= self.radius * self.radius
    }

    /// Distance along the ray to the nearest intersection in front of its origin
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let oc = ray.origin - self.center;

        // |origin + t*direction - center|^2 = radius^2
        let a = ray.direction.dot(&ray.direction);
        if a <= f32::EPSILON {
            return None;
        }
        let b = 2.0 * oc.dot(&ray.direction);
        let c = oc.dot(&oc) - self.radius * self.radius;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrt_discriminant = discriminant.sqrt();
        let t1 = (-b - sqrt_discriminant) / (2.0 * a);
        let t2 = (-b + sqrt_discriminant) / (2.0 * a);

        if t1 >= 0.0 {
            Some(t1)
        } else if t2 >= 0.0 {
            // Origin inside the sphere
            Some(0.0)
        } else {
            None
        }
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Aabb {
    /// Create a box from its corners, reordering components as needed
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.inf(&b),
            max: a.sup(&b),
        }
    }

    /// Smallest box containing every point, or `None` for an empty set
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(Self { min: first, max: first }, |acc, p| Self {
            min: acc.min.inf(p),
            max: acc.max.sup(p),
        }))
    }

    /// Center of the box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half size along each axis
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// The same box moved by `offset`
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Check if a point lies inside or on the box
    pub fn contains_point(&self, point: &Vec3) -> bool {
        (0..3).all(|i| point[i] >= self.min[i] && point[i] <= self.max[i])
    }

    /// Slab test; distance to the entry point, or 0 when the origin is inside
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let mut t_min = 0.0_f32;
        let mut t_max = f32::INFINITY;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let direction = ray.direction[axis];

            if direction.abs() < f32::EPSILON {
                if origin < self.min[axis] || origin > self.max[axis] {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / direction;
            let mut t0 = (self.min[axis] - origin) * inv;
            let mut t1 = (self.max[axis] - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }

            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }

        Some(t_min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ray_normalizes_direction() {
        let ray = Ray::new(Vec3::zeros(), Vec3::new(0.0, 0.0, 5.0));
        assert_relative_eq!(ray.direction, Vec3::new(0.0, 0.0, 1.0));
        assert!(Ray::new(Vec3::zeros(), Vec3::zeros()).is_degenerate());
    }

    #[test]
    fn test_sphere_ray_hit_and_miss() {
        let sphere = BoundingSphere::new(Vec3::new(0.0, 0.0, -10.0), 2.0);

        let hit = sphere.intersect_ray(&Ray::new(Vec3::zeros(), Vec3::new(0.0, 0.0, -1.0)));
        assert_relative_eq!(hit.unwrap(), 8.0, epsilon = 1e-4);

        let miss = sphere.intersect_ray(&Ray::new(Vec3::zeros(), Vec3::new(0.0, 0.0, 1.0)));
        assert!(miss.is_none());
    }

    #[test]
    fn test_box_ray_entry_distance() {
        let aabb = Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));

        let ray = Ray::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(aabb.intersect_ray(&ray).unwrap(), 4.0, epsilon = 1e-5);

        let inside = Ray::new(Vec3::zeros(), Vec3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(aabb.intersect_ray(&inside).unwrap(), 0.0);

        let parallel_outside = Ray::new(Vec3::new(-5.0, 3.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(aabb.intersect_ray(&parallel_outside).is_none());
    }

    #[test]
    fn test_box_from_points_and_translation() {
        let points = [Vec3::new(1.0, 2.0, 3.0), Vec3::new(-1.0, 5.0, 0.0)];
        let aabb = Aabb::from_points(&points).unwrap();

        assert_eq!(aabb.min, Vec3::new(-1.0, 2.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 5.0, 3.0));
        assert!(Aabb::from_points(&[]).is_none());

        let moved = aabb.translated(Vec3::new(10.0, 0.0, 0.0));
        assert!(moved.contains_point(&Vec3::new(10.0, 3.0, 1.0)));
        assert!(!moved.contains_point(&Vec3::new(0.0, 3.0, 1.0)));
    }
}
