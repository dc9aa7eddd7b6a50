//! Rendering-facing types
//!
//! - Cameras: a perspective [`Camera`], the third-person [`ChaseCamera`] and
//!   a [`CameraManager`] holding the level's cameras by name
//! - The per-frame [`RenderQueue`] and the [`Renderer`] trait it is drawn by

pub mod camera;
pub mod chase_camera;
pub mod camera_manager;
pub mod queue;

pub use camera::Camera;
pub use chase_camera::ChaseCamera;
pub use camera_manager::{CameraManager, SceneCamera};
pub use queue::{DrawCommand, FrameView, RenderError, RenderQueue, Renderer};
