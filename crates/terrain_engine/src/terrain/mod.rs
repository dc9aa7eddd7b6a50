//! Terrain module
//!
//! - [`HeightField`]: height and ray queries against a normalized sample grid
//! - [`TerrainMesh`]: the renderable mesh built from it

pub mod height_field;
pub mod mesh;

pub use height_field::{HeightField, NOT_ON_FIELD};
pub use mesh::{TerrainMesh, TerrainVertex};
