//! Named cameras with one active at a time

use log::debug;

use crate::error::{EngineError, EngineResult};
use crate::foundation::math::{Mat4, Vec3};
use crate::physics::Frustum;
use super::camera::Camera;
use super::chase_camera::ChaseCamera;

/// A camera that can be registered with the [`CameraManager`]
#[derive(Debug, Clone)]
pub enum SceneCamera {
    /// Camera placed by hand
    Fixed(Camera),
    /// Third-person chase camera
    Chase(ChaseCamera),
}

impl SceneCamera {
    /// Advance the camera; fixed cameras do not move
    pub fn update(&mut self, dt: f32) {
        if let Self::Chase(chase) = self {
            chase.update(dt);
        }
    }

    /// View matrix
    pub fn view_matrix(&self) -> Mat4 {
        match self {
            Self::Fixed(camera) => camera.view_matrix(),
            Self::Chase(chase) => chase.view_matrix(),
        }
    }

    /// Projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        match self {
            Self::Fixed(camera) => camera.projection_matrix(),
            Self::Chase(chase) => chase.projection_matrix(),
        }
    }

    /// View frustum
    pub fn frustum(&self) -> Frustum {
        match self {
            Self::Fixed(camera) => camera.frustum(),
            Self::Chase(chase) => chase.frustum(),
        }
    }

    /// Eye position used for rendering
    pub fn eye_position(&self) -> Vec3 {
        match self {
            Self::Fixed(camera) => camera.position(),
            Self::Chase(chase) => chase.eye_position(),
        }
    }

    /// The chase camera, if this is one
    pub fn as_chase(&self) -> Option<&ChaseCamera> {
        match self {
            Self::Chase(chase) => Some(chase),
            Self::Fixed(_) => None,
        }
    }

    /// The chase camera, if this is one
    pub fn as_chase_mut(&mut self) -> Option<&mut ChaseCamera> {
        match self {
            Self::Chase(chase) => Some(chase),
            Self::Fixed(_) => None,
        }
    }
}

/// Registry of named cameras
#[derive(Debug, Clone, Default)]
pub struct CameraManager {
    cameras: Vec<(String, SceneCamera)>,
    active: usize,
}

impl CameraManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a camera, replacing any camera with the same name
    ///
    /// The first camera added becomes the active one.
    pub fn add(&mut self, name: impl Into<String>, camera: SceneCamera) {
        let name = name.into();
        match self.index_of(&name) {
            Some(index) => self.cameras[index].1 = camera,
            None => self.cameras.push((name, camera)),
        }
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.cameras.iter().position(|(n, _)| n == name)
    }

    /// Number of registered cameras
    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    /// True when no camera is registered
    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    /// Make the named camera active
    ///
    /// Switching to a different chase camera re-arms it so it snaps behind
    /// its target instead of sweeping across the level.
    pub fn set_active(&mut self, name: &str) -> EngineResult<()> {
        let index = self
            .index_of(name)
            .ok_or_else(|| EngineError::Configuration(format!("no camera named '{name}'")))?;

        if index != self.active {
            if let Some(chase) = self.cameras[index].1.as_chase_mut() {
                chase.rearm();
            }
            debug!("Active camera switched to '{}'", name);
        }
        self.active = index;
        Ok(())
    }

    /// Name of the active camera
    pub fn active_name(&self) -> Option<&str> {
        self.cameras.get(self.active).map(|(name, _)| name.as_str())
    }

    /// The active camera
    pub fn active(&self) -> Option<&SceneCamera> {
        self.cameras.get(self.active).map(|(_, camera)| camera)
    }

    /// The active camera
    pub fn active_mut(&mut self) -> Option<&mut SceneCamera> {
        self.cameras.get_mut(self.active).map(|(_, camera)| camera)
    }

    /// Camera by name
    pub fn get(&self, name: &str) -> Option<&SceneCamera> {
        self.index_of(name).map(|index| &self.cameras[index].1)
    }

    /// Camera by name
    pub fn get_mut(&mut self, name: &str) -> Option<&mut SceneCamera> {
        self.index_of(name).map(move |index| &mut self.cameras[index].1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ChaseCameraConfig;

    fn manager() -> CameraManager {
        let mut manager = CameraManager::new();
        manager.add("Follow", SceneCamera::Chase(ChaseCamera::from_config(&ChaseCameraConfig::follow(), 1.0)));
        manager.add("Aim", SceneCamera::Chase(ChaseCamera::from_config(&ChaseCameraConfig::aim(), 1.0)));
        manager.add("Overview", SceneCamera::Fixed(Camera::default()));
        manager
    }

    #[test]
    fn test_first_camera_is_active() {
        let manager = manager();
        assert_eq!(manager.len(), 3);
        assert_eq!(manager.active_name(), Some("Follow"));
    }

    #[test]
    fn test_switching_rearms_chase_camera() {
        let mut manager = manager();
        if let Some(aim) = manager.get_mut("Aim").and_then(SceneCamera::as_chase_mut) {
            aim.update(0.016);
            assert!(!aim.is_first_time_chase());
        }

        manager.set_active("Aim").unwrap();
        let aim = manager.active().and_then(SceneCamera::as_chase).unwrap();
        assert!(aim.is_first_time_chase());
    }

    #[test]
    fn test_reselecting_active_camera_keeps_state() {
        let mut manager = manager();
        manager.active_mut().unwrap().update(0.016);

        manager.set_active("Follow").unwrap();
        let follow = manager.active().and_then(SceneCamera::as_chase).unwrap();
        assert!(!follow.is_first_time_chase());
    }

    #[test]
    fn test_unknown_camera_is_an_error() {
        let mut manager = manager();
        assert!(manager.set_active("Orbit").is_err());
        assert_eq!(manager.active_name(), Some("Follow"));
    }
}
