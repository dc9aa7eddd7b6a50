//! Headless renderer
//!
//! Walks each frame's draw commands without a GPU, checking mesh handles
//! and logging what a real backend would have drawn.

use std::collections::HashSet;

use log::{debug, trace};

use terrain_engine::render::{DrawCommand, FrameView, RenderError, RenderQueue, Renderer};

/// What the last frame contained
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Draw commands submitted
    pub commands: usize,
    /// Terrain triangles
    pub triangles: usize,
    /// Skinning matrices uploaded
    pub bones: usize,
}

/// Renderer that only counts and logs
#[derive(Debug, Clone, Default)]
pub struct LoggingRenderer {
    meshes: HashSet<String>,
    frames: u64,
    last_frame: FrameStats,
}

impl LoggingRenderer {
    /// Create a renderer that accepts any mesh handle
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a renderer that only knows the given meshes
    pub fn with_meshes<'a>(meshes: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            meshes: meshes.into_iter().map(str::to_string).collect(),
            ..Self::default()
        }
    }

    /// Frames rendered so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Contents of the last frame
    pub fn last_frame(&self) -> FrameStats {
        self.last_frame
    }
}

impl Renderer for LoggingRenderer {
    fn render(&mut self, view: &FrameView, queue: &RenderQueue) -> Result<(), RenderError> {
        let mut stats = FrameStats::default();

        for command in queue.commands() {
            stats.commands += 1;
            match command {
                DrawCommand::Terrain { mesh, .. } => stats.triangles += mesh.triangle_count(),
                DrawCommand::Skinned { mesh_id, palette, .. } => {
                    if !self.meshes.is_empty() && !self.meshes.contains(mesh_id) {
                        return Err(RenderError::UnknownMesh(mesh_id.clone()));
                    }
                    stats.bones += palette.len();
                    trace!("Draw '{}' with {} bones", mesh_id, palette.len());
                }
            }
        }

        self.frames += 1;
        self.last_frame = stats;
        if self.frames % 60 == 0 {
            debug!(
                "Frame {}: eye {:?}, {} commands, {} terrain triangles, {} bones",
                self.frames, view.eye, stats.commands, stats.triangles, stats.bones
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use terrain_engine::foundation::math::{Mat4, Vec3};
    use terrain_engine::terrain::{HeightField, TerrainMesh};

    fn view() -> FrameView {
        FrameView {
            view: Mat4::identity(),
            projection: Mat4::identity(),
            eye: Vec3::zeros(),
        }
    }

    #[test]
    fn test_counts_frame_contents() {
        let field = HeightField::flat(4, 4, 0.0, 1.0, 1.0).unwrap();
        let mut queue = RenderQueue::new();
        queue.submit_terrain(Arc::new(TerrainMesh::build(&field)), Mat4::identity());
        queue.submit_skinned("EnemyBeast", Mat4::identity(), &[Mat4::identity(); 9]);

        let mut renderer = LoggingRenderer::new();
        renderer.render(&view(), &queue).unwrap();

        assert_eq!(renderer.frames(), 1);
        assert_eq!(
            renderer.last_frame(),
            FrameStats {
                commands: 2,
                triangles: 18,
                bones: 9,
            }
        );
    }

    #[test]
    fn test_rejects_unknown_mesh() {
        let mut queue = RenderQueue::new();
        queue.submit_skinned("Teapot", Mat4::identity(), &[]);

        let mut renderer = LoggingRenderer::with_meshes(["PlayerMarine"]);
        let result = renderer.render(&view(), &queue);

        assert!(matches!(result, Err(RenderError::UnknownMesh(name)) if name == "Teapot"));
        assert_eq!(renderer.frames(), 0);
    }
}
