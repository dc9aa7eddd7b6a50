//! Skeleton data shared by every instance of an animated model
//!
//! Bones are stored depth-first: every bone's parent comes before it, so a
//! single forward pass is enough to compose world transforms. The ordering is
//! checked once when a [`SkeletonPose`] is built and relied on afterwards.

use std::collections::HashSet;

use log::info;

use crate::error::{EngineError, EngineResult};
use crate::foundation::math::Mat4;

/// One bone transform at one point in time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    /// Time in seconds from the start of the clip
    pub time: f32,
    /// Index of the bone this keyframe drives
    pub bone: usize,
    /// Local transform of the bone relative to its parent
    pub transform: Mat4,
}

impl Keyframe {
    /// Create a keyframe
    pub fn new(time: f32, bone: usize, transform: Mat4) -> Self {
        Self { time, bone, transform }
    }
}

/// Named animation as a time-ordered stream of keyframes
#[derive(Debug, Clone)]
pub struct AnimationClip {
    name: String,
    duration: f32,
    keyframes: Vec<Keyframe>,
}

impl AnimationClip {
    /// Build a clip, sorting keyframes by time
    ///
    /// The sort is stable, so keyframes sharing a timestamp keep their
    /// relative order and the last one listed wins for its bone.
    pub fn new(name: impl Into<String>, duration: f32, mut keyframes: Vec<Keyframe>) -> EngineResult<Self> {
        let name = name.into();
        if !(duration > 0.0) || !duration.is_finite() {
            return Err(EngineError::InvariantViolation(format!(
                "clip '{name}' has invalid duration {duration}"
            )));
        }
        if let Some(keyframe) = keyframes.iter().find(|k| !(k.time >= 0.0) || !k.time.is_finite()) {
            return Err(EngineError::InvariantViolation(format!(
                "clip '{name}' has a keyframe at invalid time {}",
                keyframe.time
            )));
        }

        keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));

        Ok(Self { name, duration, keyframes })
    }

    /// Clip name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Length of the clip in seconds
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Keyframes in ascending time order
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }
}

/// Bone hierarchy, bind pose and animation library of a skinned model
#[derive(Debug, Clone)]
pub struct SkeletonPose {
    bind_pose: Vec<Mat4>,
    inverse_bind_pose: Vec<Mat4>,
    parent: Vec<Option<usize>>,
    animations: Vec<AnimationClip>,
}

impl SkeletonPose {
    /// Build a skeleton from imported data
    ///
    /// `parent[i]` is `None` for a root bone. Bone 0 may also list itself as
    /// its parent. Every other bone must name a parent with a lower index.
    pub fn new(
        bind_pose: Vec<Mat4>,
        inverse_bind_pose: Vec<Mat4>,
        parent: Vec<Option<usize>>,
        animations: Vec<AnimationClip>,
    ) -> EngineResult<Self> {
        let bone_count = bind_pose.len();
        if bone_count == 0 {
            return Err(EngineError::InvariantViolation("skeleton has no bones".to_string()));
        }
        if inverse_bind_pose.len() != bone_count || parent.len() != bone_count {
            return Err(EngineError::InvariantViolation(format!(
                "bone arrays differ in length: {} bind, {} inverse bind, {} parents",
                bone_count,
                inverse_bind_pose.len(),
                parent.len()
            )));
        }

        let parent = Self::validate_hierarchy(parent)?;
        Self::validate_animations(&animations, bone_count)?;

        info!(
            "Skeleton validated: {} bones, {} animation clips",
            bone_count,
            animations.len()
        );

        Ok(Self {
            bind_pose,
            inverse_bind_pose,
            parent,
            animations,
        })
    }

    /// Build a skeleton whose inverse bind pose is derived from the bind pose
    pub fn from_bind_pose(
        bind_pose: Vec<Mat4>,
        parent: Vec<Option<usize>>,
        animations: Vec<AnimationClip>,
    ) -> EngineResult<Self> {
        if parent.len() != bind_pose.len() {
            return Err(EngineError::InvariantViolation(format!(
                "bone arrays differ in length: {} bind, {} parents",
                bind_pose.len(),
                parent.len()
            )));
        }
        let parent = Self::validate_hierarchy(parent)?;

        let mut absolute: Vec<Mat4> = Vec::with_capacity(bind_pose.len());
        for (bone, local) in bind_pose.iter().enumerate() {
            let world = match parent[bone] {
                Some(p) => absolute[p] * local,
                None => *local,
            };
            absolute.push(world);
        }

        let inverse_bind_pose = absolute
            .iter()
            .enumerate()
            .map(|(bone, m)| {
                m.try_inverse().ok_or_else(|| {
                    EngineError::InvariantViolation(format!("bind pose of bone {bone} is not invertible"))
                })
            })
            .collect::<EngineResult<Vec<_>>>()?;

        Self::new(bind_pose, inverse_bind_pose, parent, animations)
    }

    fn validate_hierarchy(parent: Vec<Option<usize>>) -> EngineResult<Vec<Option<usize>>> {
        parent
            .into_iter()
            .enumerate()
            .map(|(bone, p)| match p {
                None => Ok(None),
                Some(0) if bone == 0 => Ok(None),
                Some(p) if p < bone => Ok(Some(p)),
                Some(p) => Err(EngineError::InvariantViolation(format!(
                    "bone {bone} has parent {p}; parents must precede their children"
                ))),
            })
            .collect()
    }

    fn validate_animations(animations: &[AnimationClip], bone_count: usize) -> EngineResult<()> {
        let mut names = HashSet::new();
        for clip in animations {
            if !names.insert(clip.name()) {
                return Err(EngineError::InvariantViolation(format!(
                    "duplicate animation clip '{}'",
                    clip.name()
                )));
            }
            if let Some(keyframe) = clip.keyframes().iter().find(|k| k.bone >= bone_count) {
                return Err(EngineError::InvariantViolation(format!(
                    "clip '{}' drives bone {} but the skeleton has {} bones",
                    clip.name(),
                    keyframe.bone,
                    bone_count
                )));
            }
        }
        Ok(())
    }

    /// Number of bones
    pub fn bone_count(&self) -> usize {
        self.bind_pose.len()
    }

    /// Local bind transform per bone
    pub fn bind_pose(&self) -> &[Mat4] {
        &self.bind_pose
    }

    /// Inverse of each bone's absolute bind transform
    pub fn inverse_bind_pose(&self) -> &[Mat4] {
        &self.inverse_bind_pose
    }

    /// Parent index per bone, `None` for roots
    pub fn parents(&self) -> &[Option<usize>] {
        &self.parent
    }

    /// Every clip in the library
    pub fn animations(&self) -> &[AnimationClip] {
        &self.animations
    }

    /// Index of the clip called `name`
    pub fn clip_index(&self, name: &str) -> Option<usize> {
        self.animations.iter().position(|clip| clip.name() == name)
    }

    /// Clip called `name`
    pub fn clip(&self, name: &str) -> Option<&AnimationClip> {
        self.clip_index(name).map(|index| &self.animations[index])
    }

    /// Fail with [`EngineError::UnknownAnimation`] unless every name is present
    pub fn require_clips(&self, names: &[&str]) -> EngineResult<()> {
        match names.iter().find(|name| self.clip_index(name).is_none()) {
            Some(missing) => Err(EngineError::UnknownAnimation((*missing).to_string())),
            None => Ok(()),
        }
    }
}
