//! Render queue
//!
//! Game code does not talk to a graphics API. Each frame it fills a
//! [`RenderQueue`] with draw commands and hands it, together with the camera
//! matrices, to whatever [`Renderer`] the application plugged in.

use std::sync::Arc;

use thiserror::Error;

use crate::foundation::math::{utils, Mat4, Vec3};
use crate::terrain::TerrainMesh;

/// Camera matrices for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameView {
    /// World to view transform
    pub view: Mat4,
    /// View to clip transform
    pub projection: Mat4,
    /// Eye position in world space
    pub eye: Vec3,
}

/// One thing to draw
#[derive(Debug, Clone)]
pub enum DrawCommand {
    /// Terrain geometry with its world transform
    Terrain {
        /// Vertex and index buffers
        mesh: Arc<TerrainMesh>,
        /// Model to world transform
        world: Mat4,
    },
    /// Skinned model posed by a bone palette
    Skinned {
        /// Renderer handle of the mesh
        mesh_id: String,
        /// Model to world transform
        world: Mat4,
        /// Skinning matrices, one per bone
        palette: Vec<Mat4>,
    },
}

impl DrawCommand {
    /// Model to world transform
    pub fn world(&self) -> &Mat4 {
        match self {
            Self::Terrain { world, .. } | Self::Skinned { world, .. } => world,
        }
    }
}

/// Draw commands collected for one frame
#[derive(Debug, Clone, Default)]
pub struct RenderQueue {
    terrain: Vec<DrawCommand>,
    skinned: Vec<DrawCommand>,
}

impl RenderQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all commands, keeping allocations
    pub fn clear(&mut self) {
        self.terrain.clear();
        self.skinned.clear();
    }

    /// Queue the terrain
    pub fn submit_terrain(&mut self, mesh: Arc<TerrainMesh>, world: Mat4) {
        self.terrain.push(DrawCommand::Terrain { mesh, world });
    }

    /// Queue a skinned model
    pub fn submit_skinned(&mut self, mesh_id: impl Into<String>, world: Mat4, palette: &[Mat4]) {
        self.skinned.push(DrawCommand::Skinned {
            mesh_id: mesh_id.into(),
            world,
            palette: palette.to_vec(),
        });
    }

    /// Order skinned models front to back from `eye`
    pub fn sort_front_to_back(&mut self, eye: &Vec3) {
        let distance = |command: &DrawCommand| (utils::translation_of(command.world()) - eye).magnitude_squared();
        self.skinned.sort_by(|a, b| distance(a).total_cmp(&distance(b)));
    }

    /// Commands in submission order: terrain first, then skinned models
    pub fn commands(&self) -> impl Iterator<Item = &DrawCommand> {
        self.terrain.iter().chain(self.skinned.iter())
    }

    /// Number of queued commands
    pub fn len(&self) -> usize {
        self.terrain.len() + self.skinned.len()
    }

    /// True when nothing is queued
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Rendering errors reported by a [`Renderer`]
#[derive(Error, Debug)]
pub enum RenderError {
    /// The renderer does not know a mesh handle
    #[error("Unknown mesh: {0}")]
    UnknownMesh(String),

    /// Backend failure
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Consumer of a frame's draw commands
pub trait Renderer {
    /// Draw one frame
    fn render(&mut self, view: &FrameView, queue: &RenderQueue) -> Result<(), RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::HeightField;

    #[derive(Default)]
    struct RecordingRenderer {
        frames: Vec<Vec<String>>,
    }

    impl Renderer for RecordingRenderer {
        fn render(&mut self, _view: &FrameView, queue: &RenderQueue) -> Result<(), RenderError> {
            let names = queue
                .commands()
                .map(|command| match command {
                    DrawCommand::Terrain { .. } => "terrain".to_string(),
                    DrawCommand::Skinned { mesh_id, .. } => mesh_id.clone(),
                })
                .collect();
            self.frames.push(names);
            Ok(())
        }
    }

    #[test]
    fn test_terrain_first_then_nearest_models() {
        let field = HeightField::flat(2, 2, 0.0, 1.0, 1.0).unwrap();
        let mut queue = RenderQueue::new();

        queue.submit_skinned("far", Mat4::new_translation(&Vec3::new(0.0, 0.0, -50.0)), &[Mat4::identity()]);
        queue.submit_skinned("near", Mat4::new_translation(&Vec3::new(0.0, 0.0, -5.0)), &[Mat4::identity()]);
        queue.submit_terrain(Arc::new(TerrainMesh::build(&field)), Mat4::identity());
        queue.sort_front_to_back(&Vec3::zeros());

        let mut renderer = RecordingRenderer::default();
        let view = FrameView { view: Mat4::identity(), projection: Mat4::identity(), eye: Vec3::zeros() };
        renderer.render(&view, &queue).unwrap();

        assert_eq!(renderer.frames[0], vec!["terrain", "near", "far"]);

        queue.clear();
        assert!(queue.is_empty());
    }
}
