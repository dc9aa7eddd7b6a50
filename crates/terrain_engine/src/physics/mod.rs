//! Physics module
//!
//! Geometric queries used by picking and visibility:
//! - Rays, bounding spheres and axis-aligned boxes
//! - View frustum culling

pub mod collision;
pub mod frustum;

pub use collision::{Aabb, BoundingSphere, Ray};
pub use frustum::{Containment, Frustum};
