//! Terrain mesh generation
//!
//! Turns a [`HeightField`] into a renderable triangle list with everything a
//! normal-mapped terrain shader needs per vertex: position, normal, tangent,
//! binormal and texture coordinates.

use bytemuck::{Pod, Zeroable};
use log::info;

use crate::foundation::math::Vec3;
use crate::physics::Aabb;
use super::HeightField;

/// Vertex layout of the terrain mesh
///
/// The `#[repr(C)]` attribute keeps the field order stable for GPU upload.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TerrainVertex {
    /// Position in terrain space
    pub position: [f32; 3],

    /// Normal vector
    pub normal: [f32; 3],

    /// Tangent vector for normal mapping
    pub tangent: [f32; 3],

    /// Binormal vector for normal mapping
    pub binormal: [f32; 3],

    /// Texture coordinates, `[0, 1]` across the whole grid
    pub tex_coord: [f32; 2],
}

/// Immutable terrain geometry built from a height field
#[derive(Debug, Clone)]
pub struct TerrainMesh {
    vertices: Vec<TerrainVertex>,
    indices: Vec<u32>,
    bounds: Aabb,
}

impl TerrainMesh {
    /// Build the mesh for a height field
    ///
    /// One vertex per sample and two triangles per cell, wound so their
    /// face normals point up (+Y) on a flat field.
    pub fn build(field: &HeightField) -> Self {
        let width = field.width();
        let depth = field.depth();
        let positions = Self::generate_positions(field);
        let indices = Self::generate_indices(width, depth);
        let normals = Self::generate_normals(&positions, &indices);

        let vertices = positions
            .iter()
            .zip(&normals)
            .enumerate()
            .map(|(index, (position, normal))| {
                let column = index % width;
                let row = index / width;

                let tangent = Self::tangent_at(&positions, index, column, width);
                let binormal = tangent.cross(normal).try_normalize(1.0e-6).unwrap_or_else(Vec3::z);

                TerrainVertex {
                    position: (*position).into(),
                    normal: (*normal).into(),
                    tangent: tangent.into(),
                    binormal: binormal.into(),
                    tex_coord: [
                        column as f32 / (width - 1) as f32,
                        row as f32 / (depth - 1) as f32,
                    ],
                }
            })
            .collect();

        let bounds = Aabb::from_points(&positions)
            .unwrap_or_else(|| Aabb::new(Vec3::zeros(), Vec3::zeros()));

        info!(
            "Terrain mesh built: {} vertices, {} triangles",
            positions.len(),
            indices.len() / 3
        );

        Self { vertices, indices, bounds }
    }

    fn generate_positions(field: &HeightField) -> Vec<Vec3> {
        let width = field.width();
        let depth = field.depth();
        let block_scale = field.block_scale();
        let half = field.world_size() * 0.5;

        let mut positions = Vec::with_capacity(width * depth);
        for row in 0..depth {
            for column in 0..width {
                let sample = field.samples()[column + row * width];
                positions.push(Vec3::new(
                    -half.x + column as f32 * block_scale,
                    sample * field.height_scale(),
                    -half.y + row as f32 * block_scale,
                ));
            }
        }
        positions
    }

    fn generate_indices(width: usize, depth: usize) -> Vec<u32> {
        let mut indices = Vec::with_capacity((width - 1) * (depth - 1) * 6);
        for row in 0..depth - 1 {
            for column in 0..width - 1 {
                let index = (column + row * width) as u32;
                let w = width as u32;

                indices.extend_from_slice(&[index, index + 1, index + w + 1]);
                indices.extend_from_slice(&[index + w + 1, index + w, index]);
            }
        }
        indices
    }

    fn generate_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
        let mut normals = vec![Vec3::zeros(); positions.len()];

        for triangle in indices.chunks_exact(3) {
            let (i1, i2, i3) = (triangle[0] as usize, triangle[1] as usize, triangle[2] as usize);
            let v1 = positions[i1];
            let v2 = positions[i2];
            let v3 = positions[i3];

            // Every face adds the same weight regardless of its area
            let Some(face_normal) = (v3 - v1).cross(&(v2 - v1)).try_normalize(1.0e-12) else {
                continue;
            };
            normals[i1] += face_normal;
            normals[i2] += face_normal;
            normals[i3] += face_normal;
        }

        normals
            .into_iter()
            .map(|n| n.try_normalize(1.0e-6).unwrap_or_else(Vec3::y))
            .collect()
    }

    fn tangent_at(positions: &[Vec3], index: usize, column: usize, width: usize) -> Vec3 {
        let difference = if column + 1 < width {
            positions[index + 1] - positions[index]
        } else {
            positions[index] - positions[index - 1]
        };
        difference.try_normalize(1.0e-6).unwrap_or_else(Vec3::x)
    }

    /// Vertex buffer contents
    pub fn vertices(&self) -> &[TerrainVertex] {
        &self.vertices
    }

    /// Index buffer contents, three indices per triangle
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Raw vertex bytes for upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Raw index bytes for upload
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Bounding box in terrain space
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }
}
