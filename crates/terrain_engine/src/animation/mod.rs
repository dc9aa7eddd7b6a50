//! Skeletal animation
//!
//! - [`SkeletonPose`] and [`AnimationClip`]: immutable imported data, shared via `Arc`
//! - [`AnimationPlayer`]: per-instance playback producing the skinning palette
//! - [`SkinnedModel`]: skeleton plus bounds, what a unit is built from

pub mod skeleton;
pub mod player;
pub mod model;

pub use skeleton::{AnimationClip, Keyframe, SkeletonPose};
pub use player::AnimationPlayer;
pub use model::SkinnedModel;
