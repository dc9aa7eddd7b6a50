//! Per-instance animation playback
//!
//! An [`AnimationPlayer`] plays one clip of a shared [`SkeletonPose`] at a
//! time. Every advance it:
//!
//! - moves the cursor by `dt * speed`, wrapping or clamping at the clip end
//! - applies every keyframe up to the cursor (step sampling, last writer wins)
//! - composes local, absolute and skinning matrices in bone order
//!
//! Matrices use column vectors, so composition reads right-to-left: a bone's
//! absolute transform is `absolute[parent] * local`.

use std::ops::Range;
use std::sync::Arc;

use log::trace;

use crate::error::{EngineError, EngineResult};
use crate::foundation::math::Mat4;
use super::skeleton::{AnimationClip, SkeletonPose};

/// Plays animation clips on one instance of a skinned model
#[derive(Debug, Clone)]
pub struct AnimationPlayer {
    skeleton: Arc<SkeletonPose>,
    active_clip: Option<usize>,
    cursor: f32,
    looping: bool,
    speed: f32,
    next_keyframe: usize,
    /// Local, override, absolute and skinning matrices, one block per bone set
    bones: Vec<Mat4>,
}

impl AnimationPlayer {
    /// Create a player showing the bind pose with no active clip
    pub fn new(skeleton: Arc<SkeletonPose>) -> Self {
        let bone_count = skeleton.bone_count();
        let mut bones = Vec::with_capacity(bone_count * 4);
        bones.extend_from_slice(skeleton.bind_pose());
        bones.extend(std::iter::repeat(Mat4::identity()).take(bone_count * 3));

        let mut player = Self {
            skeleton,
            active_clip: None,
            cursor: 0.0,
            looping: true,
            speed: 1.0,
            next_keyframe: 0,
            bones,
        };
        player.compose(&Mat4::identity());
        player
    }

    /// Set the playback speed multiplier
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    fn section(&self, index: usize) -> Range<usize> {
        let count = self.skeleton.bone_count();
        index * count..(index + 1) * count
    }

    /// Shared skeleton this player animates
    pub fn skeleton(&self) -> &Arc<SkeletonPose> {
        &self.skeleton
    }

    /// Clip currently playing
    pub fn active_clip(&self) -> Option<&AnimationClip> {
        self.active_clip.map(|index| &self.skeleton.animations()[index])
    }

    /// Name of the clip currently playing
    pub fn active_clip_name(&self) -> Option<&str> {
        self.active_clip().map(AnimationClip::name)
    }

    /// Switch to the clip called `name`, restarting from its first frame
    pub fn play(&mut self, name: &str) -> EngineResult<()> {
        let index = self
            .skeleton
            .clip_index(name)
            .ok_or_else(|| EngineError::UnknownAnimation(name.to_string()))?;
        self.active_clip = Some(index);
        self.reset();
        trace!("Animation clip '{}' started", name);
        Ok(())
    }

    /// Rewind to the start of the clip and restore the bind pose
    pub fn reset(&mut self) {
        self.cursor = 0.0;
        self.rewind_keyframes();
    }

    /// Time into the active clip in seconds
    pub fn cursor(&self) -> f32 {
        self.cursor
    }

    /// Whether the clip restarts after reaching its end
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Enable or disable looping
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Playback speed multiplier
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Set the playback speed multiplier
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    /// True once the cursor has reached the end of the clip
    ///
    /// A player with no active clip counts as finished.
    pub fn is_finished(&self) -> bool {
        self.active_clip().map_or(true, |clip| self.cursor >= clip.duration())
    }

    /// Extra transform applied to a bone on top of its animated local transform
    pub fn bone_override(&self, bone: usize) -> Option<&Mat4> {
        self.bones[self.section(1)].get(bone)
    }

    /// Replace a bone's override; out-of-range bones are ignored
    pub fn set_bone_override(&mut self, bone: usize, transform: Mat4) {
        let range = self.section(1);
        if let Some(slot) = self.bones[range].get_mut(bone) {
            *slot = transform;
        }
    }

    /// Restore every override to identity
    pub fn clear_bone_overrides(&mut self) {
        let range = self.section(1);
        self.bones[range].fill(Mat4::identity());
    }

    /// Current local transform per bone
    pub fn local_bones(&self) -> &[Mat4] {
        &self.bones[self.section(0)]
    }

    /// Bone transforms in the parent world space passed to [`advance`](Self::advance)
    pub fn absolute(&self) -> &[Mat4] {
        &self.bones[self.section(2)]
    }

    /// Skinning palette for the renderer
    pub fn skinning(&self) -> &[Mat4] {
        &self.bones[self.section(3)]
    }

    /// Advance the active clip and recompute the bone matrices
    pub fn advance(&mut self, dt: f32, parent_world: &Mat4) {
        self.advance_cursor(dt);
        self.apply_keyframes();
        self.compose(parent_world);
    }

    fn advance_cursor(&mut self, dt: f32) {
        let Some(duration) = self.active_clip().map(AnimationClip::duration) else {
            return;
        };

        let previous = self.cursor;
        self.cursor = (self.cursor + dt * self.speed).max(0.0);

        if self.cursor > duration {
            if self.looping {
                self.cursor %= duration;
                self.rewind_keyframes();
            } else {
                self.cursor = duration;
            }
        } else if self.cursor < previous {
            self.rewind_keyframes();
        }
    }

    fn rewind_keyframes(&mut self) {
        self.next_keyframe = 0;
        let local = self.section(0);
        self.bones[local].copy_from_slice(self.skeleton.bind_pose());
    }

    fn apply_keyframes(&mut self) {
        let Some(index) = self.active_clip else {
            return;
        };
        let skeleton = Arc::clone(&self.skeleton);
        let keyframes = skeleton.animations()[index].keyframes();
        let local = self.section(0);
        let bones = &mut self.bones[local];

        while let Some(keyframe) = keyframes.get(self.next_keyframe) {
            if keyframe.time > self.cursor {
                break;
            }
            bones[keyframe.bone] = keyframe.transform;
            self.next_keyframe += 1;
        }
    }

    fn compose(&mut self, parent_world: &Mat4) {
        let count = self.skeleton.bone_count();
        let (local, rest) = self.bones.split_at_mut(count);
        let (overrides, rest) = rest.split_at_mut(count);
        let (absolute, skinning) = rest.split_at_mut(count);

        let parents = self.skeleton.parents();
        let inverse_bind = self.skeleton.inverse_bind_pose();

        for bone in 0..count {
            let posed = overrides[bone] * local[bone];
            absolute[bone] = match parents[bone] {
                Some(parent) => absolute[parent] * posed,
                None => parent_world * posed,
            };
            skinning[bone] = absolute[bone] * inverse_bind[bone];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::skeleton::Keyframe;
    use crate::foundation::math::{utils, Mat4Ext, Vec3};
    use approx::assert_relative_eq;

    fn translation(x: f32, y: f32, z: f32) -> Mat4 {
        Mat4::new_translation(&Vec3::new(x, y, z))
    }

    /// Two-bone chain; bone 1 sits one unit above bone 0
    fn test_skeleton() -> Arc<SkeletonPose> {
        let wave = AnimationClip::new(
            "Wave",
            2.0,
            vec![
                Keyframe::new(0.0, 1, translation(0.0, 1.0, 0.0)),
                Keyframe::new(0.5, 1, translation(1.0, 1.0, 0.0)),
                Keyframe::new(1.0, 1, translation(2.0, 1.0, 0.0)),
                Keyframe::new(2.0, 1, translation(0.0, 1.0, 0.0)),
            ],
        )
        .unwrap();
        let lift = AnimationClip::new("Lift", 1.0, vec![Keyframe::new(0.25, 0, translation(0.0, 5.0, 0.0))]).unwrap();

        let bind = vec![Mat4::identity(), translation(0.0, 1.0, 0.0)];
        Arc::new(SkeletonPose::from_bind_pose(bind, vec![None, Some(0)], vec![wave, lift]).unwrap())
    }

    #[test]
    fn test_bind_pose_skinning_is_identity() {
        let player = AnimationPlayer::new(test_skeleton());

        for matrix in player.skinning() {
            assert_relative_eq!(*matrix, Mat4::identity(), epsilon = 1e-6);
        }
        assert!(player.is_finished());
    }

    #[test]
    fn test_unknown_clip_is_an_error() {
        let mut player = AnimationPlayer::new(test_skeleton());
        assert!(matches!(player.play("Fly"), Err(EngineError::UnknownAnimation(_))));
        assert!(player.active_clip().is_none());
    }

    #[test]
    fn test_step_sampling_holds_last_keyframe() {
        let mut player = AnimationPlayer::new(test_skeleton());
        player.play("Wave").unwrap();

        player.advance(0.75, &Mat4::identity());
        assert_relative_eq!(player.local_bones()[1], translation(1.0, 1.0, 0.0));
        assert_relative_eq!(utils::translation_of(&player.absolute()[1]), Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_incremental_matches_single_advance() {
        let skeleton = test_skeleton();
        let mut stepped = AnimationPlayer::new(Arc::clone(&skeleton));
        let mut jumped = AnimationPlayer::new(skeleton);
        stepped.play("Wave").unwrap();
        jumped.play("Wave").unwrap();

        for _ in 0..5 {
            stepped.advance(0.25, &Mat4::identity());
        }
        jumped.advance(1.25, &Mat4::identity());

        assert_relative_eq!(stepped.cursor(), jumped.cursor(), epsilon = 1e-6);
        for (a, b) in stepped.skinning().iter().zip(jumped.skinning()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_loop_by_whole_durations_is_idempotent() {
        let skeleton = test_skeleton();
        let mut reference = AnimationPlayer::new(Arc::clone(&skeleton));
        reference.play("Wave").unwrap();
        reference.advance(0.0, &Mat4::identity());

        for cycles in 1..=3 {
            let mut player = AnimationPlayer::new(Arc::clone(&skeleton));
            player.play("Wave").unwrap();
            player.advance(2.0 * cycles as f32, &Mat4::identity());

            for (a, b) in player.skinning().iter().zip(reference.skinning()) {
                assert_relative_eq!(*a, *b, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_loop_wraps_cursor_and_restores_bind_pose() {
        let mut player = AnimationPlayer::new(test_skeleton());
        player.play("Lift").unwrap();

        player.advance(0.5, &Mat4::identity());
        assert_relative_eq!(player.local_bones()[0], translation(0.0, 5.0, 0.0));

        player.advance(0.6, &Mat4::identity());
        assert_relative_eq!(player.cursor(), 0.1, epsilon = 1e-5);
        assert_relative_eq!(player.local_bones()[0], Mat4::identity());
        assert!(!player.is_finished());
    }

    #[test]
    fn test_non_looping_clamps_and_finishes() {
        let mut player = AnimationPlayer::new(test_skeleton());
        player.play("Lift").unwrap();
        player.set_looping(false);

        player.advance(3.0, &Mat4::identity());
        assert_relative_eq!(player.cursor(), 1.0);
        assert!(player.is_finished());
        assert_relative_eq!(player.local_bones()[0], translation(0.0, 5.0, 0.0));

        player.advance(1.0, &Mat4::identity());
        assert_relative_eq!(player.cursor(), 1.0);
    }

    #[test]
    fn test_switching_clip_resets_cursor_and_bones() {
        let mut player = AnimationPlayer::new(test_skeleton());
        player.play("Lift").unwrap();
        player.advance(0.5, &Mat4::identity());

        player.play("Wave").unwrap();
        assert_eq!(player.cursor(), 0.0);
        assert_relative_eq!(player.local_bones()[0], Mat4::identity());
        assert_eq!(player.active_clip_name(), Some("Wave"));
    }

    #[test]
    fn test_speed_scales_cursor() {
        let mut player = AnimationPlayer::new(test_skeleton()).with_speed(2.0);
        player.play("Wave").unwrap();

        player.advance(0.25, &Mat4::identity());
        assert_relative_eq!(player.cursor(), 0.5);
    }

    #[test]
    fn test_override_and_parent_world_compose_down_the_chain() {
        let mut player = AnimationPlayer::new(test_skeleton());
        let quarter_turn = Mat4::rotation_z(std::f32::consts::FRAC_PI_2);
        player.set_bone_override(0, quarter_turn);

        let world = translation(10.0, 0.0, 0.0);
        player.advance(0.0, &world);

        // Bone 1 sits at +Y of bone 0; the turn swings it onto -X
        let tip = utils::translation_of(&player.absolute()[1]);
        assert_relative_eq!(tip, Vec3::new(9.0, 0.0, 0.0), epsilon = 1e-5);

        player.clear_bone_overrides();
        assert_relative_eq!(*player.bone_override(0).unwrap(), Mat4::identity());
    }
}
