//! Skinned model description shared between unit instances

use std::sync::Arc;

use crate::physics::{Aabb, BoundingSphere};
use super::skeleton::SkeletonPose;

/// Imported skinned model: skeleton plus model-space bounds
///
/// Mesh data lives with the renderer; the core only needs a handle to ask for
/// it and the bounds for picking and culling.
#[derive(Debug, Clone)]
pub struct SkinnedModel {
    /// Renderer handle of the mesh
    pub mesh_id: String,
    /// Bone hierarchy and clips
    pub skeleton: Arc<SkeletonPose>,
    /// Bounds of the bind pose mesh in model space
    pub bounding_box: Aabb,
    /// Sphere enclosing the bind pose mesh in model space
    pub bounding_sphere: BoundingSphere,
}

impl SkinnedModel {
    /// Create a model description, deriving the sphere from the box
    pub fn new(mesh_id: impl Into<String>, skeleton: Arc<SkeletonPose>, bounding_box: Aabb) -> Self {
        Self {
            mesh_id: mesh_id.into(),
            skeleton,
            bounding_box,
            bounding_sphere: BoundingSphere::from_aabb(&bounding_box),
        }
    }

    /// Replace the bounding sphere
    pub fn with_bounding_sphere(mut self, sphere: BoundingSphere) -> Self {
        self.bounding_sphere = sphere;
        self
    }
}
