//! Height field queries
//!
//! A [`HeightField`] is a regular grid of normalized samples laid out on the
//! XZ plane, centred on the origin plus an optional translation. Sample
//! `(ix, iz)` lives at index `ix + iz * width`; +X walks along a row and +Z
//! walks down the rows.
//!
//! Each grid cell is split along its diagonal into two triangles. Heights
//! inside a cell are interpolated on the triangle the point falls in, so the
//! surface is continuous and matches the rendered [`TerrainMesh`].
//!
//! [`TerrainMesh`]: super::TerrainMesh

use log::info;

use crate::core::config::TerrainConfig;
use crate::error::{EngineError, EngineResult};
use crate::foundation::math::{Vec2, Vec3};
use crate::physics::Ray;

/// Height returned by [`HeightField::height_at`] for points outside the grid
pub const NOT_ON_FIELD: f32 = -999_999.0;

/// Binary search passes used to refine a ray hit
pub const INTERSECT_REFINE_STEPS: usize = 32;

/// Immutable grid of normalized height samples
#[derive(Debug, Clone)]
pub struct HeightField {
    width: usize,
    depth: usize,
    samples: Vec<f32>,
    block_scale: f32,
    height_scale: f32,
    translation: Vec3,
    max_sample: f32,
}

impl HeightField {
    /// Build a height field from row-major samples
    ///
    /// `samples` must hold `width * depth` values in `[0, 1]`, and both
    /// dimensions must be at least 2 so the grid has at least one cell.
    pub fn new(
        width: usize,
        depth: usize,
        samples: Vec<f32>,
        block_scale: f32,
        height_scale: f32,
    ) -> EngineResult<Self> {
        if width < 2 || depth < 2 {
            return Err(EngineError::InvalidHeightField(format!(
                "grid must be at least 2x2 samples, got {width}x{depth}"
            )));
        }
        if samples.len() != width * depth {
            return Err(EngineError::InvalidHeightField(format!(
                "expected {} samples for a {width}x{depth} grid, got {}",
                width * depth,
                samples.len()
            )));
        }
        if let Some(index) = samples.iter().position(|s| !(0.0..=1.0).contains(s)) {
            return Err(EngineError::InvalidHeightField(format!(
                "sample {index} is {} which is outside [0, 1]",
                samples[index]
            )));
        }
        if !(block_scale > 0.0) || !(height_scale >= 0.0) {
            return Err(EngineError::InvalidHeightField(format!(
                "block scale must be positive and height scale non-negative, got {block_scale} and {height_scale}"
            )));
        }

        let max_sample = samples.iter().copied().fold(0.0_f32, f32::max);

        info!(
            "Height field created: {}x{} samples, block scale {}, height scale {}",
            width, depth, block_scale, height_scale
        );

        Ok(Self {
            width,
            depth,
            samples,
            block_scale,
            height_scale,
            translation: Vec3::zeros(),
            max_sample,
        })
    }

    /// Build a height field using the scales from a terrain configuration
    pub fn from_config(
        width: usize,
        depth: usize,
        samples: Vec<f32>,
        config: &TerrainConfig,
    ) -> EngineResult<Self> {
        config.validate().map_err(EngineError::Configuration)?;
        Self::new(width, depth, samples, config.block_scale, config.height_scale)
    }

    /// Flat field with every sample set to `level`
    pub fn flat(
        width: usize,
        depth: usize,
        level: f32,
        block_scale: f32,
        height_scale: f32,
    ) -> EngineResult<Self> {
        Self::new(width, depth, vec![level; width * depth], block_scale, height_scale)
    }

    /// Move the grid on the XZ plane; the Y component is ignored
    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = Vec3::new(translation.x, 0.0, translation.z);
        self
    }

    /// Number of samples along X
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of samples along Z
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Normalized samples, row by row
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Normalized sample at grid coordinates, if inside the grid
    pub fn sample(&self, ix: usize, iz: usize) -> Option<f32> {
        (ix < self.width && iz < self.depth).then(|| self.samples[ix + iz * self.width])
    }

    /// World units between neighbouring samples
    pub fn block_scale(&self) -> f32 {
        self.block_scale
    }

    /// World units per unit of normalized height
    pub fn height_scale(&self) -> f32 {
        self.height_scale
    }

    /// Horizontal offset of the grid
    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    /// Extent of the grid in world units along X and Z
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(
            (self.width - 1) as f32 * self.block_scale,
            (self.depth - 1) as f32 * self.block_scale,
        )
    }

    /// World XZ coordinates of the first sample
    pub fn start_position(&self) -> Vec2 {
        let half = self.world_size() * 0.5;
        Vec2::new(self.translation.x - half.x, self.translation.z - half.y)
    }

    /// World XZ coordinates of the last sample
    pub fn end_position(&self) -> Vec2 {
        let half = self.world_size() * 0.5;
        Vec2::new(self.translation.x + half.x, self.translation.z + half.y)
    }

    /// Highest point of the surface in world units
    pub fn max_height(&self) -> f32 {
        self.max_sample * self.height_scale
    }

    /// Surface height at a world position, or [`NOT_ON_FIELD`] outside the grid
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        self.try_height_at(x, z).unwrap_or(NOT_ON_FIELD)
    }

    /// Surface height below a world point
    pub fn height_at_point(&self, position: &Vec3) -> f32 {
        self.height_at(position.x, position.z)
    }

    /// Surface height at a world position, if inside the grid
    pub fn try_height_at(&self, x: f32, z: f32) -> Option<f32> {
        let start = self.start_position();
        let block_x = (x - start.x) / self.block_scale;
        let block_z = (z - start.y) / self.block_scale;

        // The far edge belongs to no cell
        let cells_x = (self.width - 1) as f32;
        let cells_z = (self.depth - 1) as f32;
        if !(block_x >= 0.0 && block_x < cells_x && block_z >= 0.0 && block_z < cells_z) {
            return None;
        }

        let ix = block_x as usize;
        let iz = block_z as usize;
        let frac_x = block_x - ix as f32;
        let frac_z = block_z - iz as f32;

        let index = ix + iz * self.width;
        let h_right = self.samples[index + 1];
        let h_origin = self.samples[index];
        let h_far = self.samples[index + self.width + 1];
        let h_below = self.samples[index + self.width];

        let (inc_x, inc_z) = if frac_x > frac_z {
            (h_right - h_origin, h_far - h_right)
        } else {
            (h_far - h_below, h_below - h_origin)
        };

        Some((h_origin + inc_x * frac_x + inc_z * frac_z) * self.height_scale)
    }

    /// True when the XZ position lies over the grid
    pub fn contains(&self, x: f32, z: f32) -> bool {
        self.try_height_at(x, z).is_some()
    }

    /// Nearest XZ position over the grid
    ///
    /// Positions already on the grid come back unchanged. The far edges are
    /// pulled in by a thousandth of a cell since they belong to no cell.
    pub fn clamp_inside(&self, x: f32, z: f32) -> Vec2 {
        let start = self.start_position();
        let end = self.end_position() - Vec2::repeat(self.block_scale * 1.0e-3);
        Vec2::new(x.clamp(start.x, end.x), z.clamp(start.y, end.y))
    }

    /// Distance along the ray to the first point where it dips below the surface
    ///
    /// The ray is marched in half-cell steps until it goes under the surface
    /// or leaves the grid, then the crossing is refined with a binary search
    /// between the last two march points. Rays with no direction and rays
    /// climbing above the highest sample return `None`.
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        if ray.is_degenerate() {
            return None;
        }

        let max_height = self.max_height();
        let rising = ray.direction.y >= 0.0;
        let step = ray.direction * self.block_scale * 0.5;

        let mut last = ray.origin;
        let mut current = ray.origin + step;
        let mut height = self.height_at_point(&current);

        while current.y > height && height >= 0.0 {
            if rising && current.y > max_height {
                return None;
            }
            last = current;
            current += step;
            height = self.height_at_point(&current);
        }

        if height < 0.0 {
            return None;
        }

        let mut start = last;
        let mut end = current;
        for _ in 0..INTERSECT_REFINE_STEPS {
            let middle = (start + end) * 0.5;
            // Off-grid midpoints report the sentinel and count as above ground
            if middle.y < self.height_at_point(&middle) {
                end = middle;
            } else {
                start = middle;
            }
        }

        let hit = (start + end) * 0.5;
        Some((hit - ray.origin).magnitude())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp_field() -> HeightField {
        // Height rises with X: 0.0, 0.5, 1.0 along every row
        let samples = vec![
            0.0, 0.5, 1.0,
            0.0, 0.5, 1.0,
            0.0, 0.5, 1.0,
        ];
        HeightField::new(3, 3, samples, 2.0, 10.0).unwrap()
    }

    #[test]
    fn test_rejects_malformed_grids() {
        assert!(matches!(
            HeightField::new(1, 4, vec![0.0; 4], 1.0, 1.0),
            Err(EngineError::InvalidHeightField(_))
        ));
        assert!(HeightField::new(2, 2, vec![0.0; 3], 1.0, 1.0).is_err());
        assert!(HeightField::new(2, 2, vec![0.0, 0.5, 1.5, 0.0], 1.0, 1.0).is_err());
        assert!(HeightField::new(2, 2, vec![0.0; 4], 0.0, 1.0).is_err());
    }

    #[test]
    fn test_grid_is_centred() {
        let field = ramp_field();

        assert_relative_eq!(field.start_position(), Vec2::new(-2.0, -2.0));
        assert_relative_eq!(field.end_position(), Vec2::new(2.0, 2.0));
        assert_relative_eq!(field.height_at(-2.0, -2.0), 0.0);
        assert_relative_eq!(field.height_at(0.0, 0.0), 5.0, epsilon = 1e-5);
    }

    #[test]
    fn test_interpolates_along_ramp() {
        let field = ramp_field();

        assert_relative_eq!(field.height_at(-1.0, 0.5), 2.5, epsilon = 1e-5);
        assert_relative_eq!(field.height_at(1.5, -1.0), 8.75, epsilon = 1e-5);
    }

    #[test]
    fn test_continuous_across_cell_diagonal() {
        let samples = vec![0.1, 0.9, 0.4, 0.7];
        let field = HeightField::new(2, 2, samples, 4.0, 3.0).unwrap();
        let start = field.start_position();

        for i in 1..10 {
            let t = i as f32 / 10.0;
            let x = start.x + t * 4.0;
            let z = start.y + t * 4.0;
            let below = field.height_at(x + 1e-4, z);
            let above = field.height_at(x, z + 1e-4);
            assert_relative_eq!(below, above, epsilon = 1e-2);
        }
    }

    #[test]
    fn test_outside_queries_return_sentinel() {
        let field = ramp_field();

        assert_eq!(field.height_at(-2.1, 0.0), NOT_ON_FIELD);
        assert_eq!(field.height_at(0.0, 2.0), NOT_ON_FIELD);
        assert!(field.try_height_at(100.0, 0.0).is_none());
        assert!(!field.contains(f32::NAN, 0.0));
    }

    #[test]
    fn test_clamp_inside_pulls_points_onto_grid() {
        let field = ramp_field();

        assert_relative_eq!(field.clamp_inside(0.5, -1.0), Vec2::new(0.5, -1.0));

        let clamped = field.clamp_inside(50.0, -50.0);
        assert_relative_eq!(clamped.y, -2.0);
        assert!(clamped.x < 2.0 && clamped.x > 1.99);
        assert!(field.contains(clamped.x, clamped.y));
        assert_relative_eq!(field.height_at(clamped.x, clamped.y), 10.0, epsilon = 1e-2);
    }

    #[test]
    fn test_translation_moves_grid() {
        let field = ramp_field().with_translation(Vec3::new(100.0, 50.0, 0.0));

        assert_eq!(field.height_at(0.0, 0.0), NOT_ON_FIELD);
        assert_relative_eq!(field.height_at(100.0, 0.0), 5.0, epsilon = 1e-5);
    }

    #[test]
    fn test_downward_ray_hits_flat_field() {
        let field = HeightField::flat(16, 16, 0.5, 4.0, 20.0).unwrap();
        let ray = Ray::new(Vec3::new(3.0, 20.0, -7.0), Vec3::new(0.0, -1.0, 0.0));

        let distance = field.intersect(&ray).unwrap();
        assert_relative_eq!(distance, 10.0, epsilon = 0.01);
    }

    #[test]
    fn test_slanted_ray_hits_surface() {
        let field = HeightField::flat(32, 32, 0.0, 2.0, 1.0).unwrap();
        let direction = Vec3::new(1.0, -1.0, 0.0);
        let ray = Ray::new(Vec3::new(-10.0, 5.0, 0.0), direction);

        let distance = field.intersect(&ray).unwrap();
        let hit = ray.point_at(distance);
        assert_relative_eq!(hit.y, 0.0, epsilon = 0.01);
        assert_relative_eq!(hit.x, -5.0, epsilon = 0.01);
    }

    #[test]
    fn test_rays_that_cannot_hit_return_none() {
        let field = HeightField::flat(8, 8, 0.5, 1.0, 2.0).unwrap();

        let zero = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::zeros());
        assert!(field.intersect(&zero).is_none());

        let upward = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        assert!(field.intersect(&upward).is_none());

        let level = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(field.intersect(&level).is_none());

        let off_grid = Ray::new(Vec3::new(500.0, 5.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        assert!(field.intersect(&off_grid).is_none());
    }
}
