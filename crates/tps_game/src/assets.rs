//! Game assets
//!
//! The demo ships without art. Terrain comes from a grayscale heightmap
//! image when one is configured and from seeded value noise otherwise. The
//! marine, the beast and the machine gun are built in code with the bones
//! and clips the game logic expects.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use image::GrayImage;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use terrain_engine::animation::{AnimationClip, Keyframe, SkeletonPose, SkinnedModel};
use terrain_engine::core::config::TerrainConfig;
use terrain_engine::foundation::math::{Mat4, Mat4Ext, Vec3};
use terrain_engine::physics::Aabb;
use terrain_engine::terrain::HeightField;
use terrain_engine::units::{EnemyAnimation, PlayerAnimation};
use terrain_engine::EngineError;

use crate::config::LevelConfig;

/// Value noise octaves summed for procedural terrain
const NOISE_OCTAVES: u32 = 5;

/// Lattice cells per side of the coarsest octave
const NOISE_BASE_CELLS: usize = 4;

/// Fraction of the height scale used by procedural terrain
const TERRAIN_RELIEF: f32 = 0.35;

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// Heightmap image could not be read or decoded
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Asset data broke an engine invariant
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// No model registered under the name
    #[error("Unknown model: {0}")]
    UnknownModel(String),
}

/// Build the level's height field from the configured source
pub fn load_height_field(level: &LevelConfig, terrain: &TerrainConfig) -> Result<HeightField, AssetError> {
    let (width, depth, samples) = match &level.heightmap {
        Some(path) => decode_heightmap(path)?,
        None => {
            let size = level.terrain_size;
            (size, size, procedural_samples(size, level.seed))
        }
    };
    Ok(HeightField::from_config(width, depth, samples, terrain)?)
}

/// Decode a heightmap image into normalized samples
///
/// Color images are converted to luminance first.
pub fn decode_heightmap(path: &Path) -> Result<(usize, usize, Vec<f32>), AssetError> {
    let image = image::open(path)?.to_luma8();
    info!("Heightmap loaded: {} ({}x{})", path.display(), image.width(), image.height());
    Ok(samples_from_luma(&image))
}

/// Normalized samples of a grayscale image, row by row
pub fn samples_from_luma(image: &GrayImage) -> (usize, usize, Vec<f32>) {
    let samples = image.pixels().map(|pixel| f32::from(pixel.0[0]) / 255.0).collect();
    (image.width() as usize, image.height() as usize, samples)
}

/// Seeded value noise over a `size` x `size` grid
///
/// Samples lie in `[0, TERRAIN_RELIEF]` and the same seed always gives the
/// same terrain.
pub fn procedural_samples(size: usize, seed: u64) -> Vec<f32> {
    let size = size.max(2);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut samples = vec![0.0_f32; size * size];

    let mut amplitude = 1.0;
    let mut cells = NOISE_BASE_CELLS;
    for _ in 0..NOISE_OCTAVES {
        let stride = cells + 1;
        let lattice: Vec<f32> = (0..stride * stride).map(|_| rng.gen::<f32>()).collect();

        for iz in 0..size {
            for ix in 0..size {
                let fx = ix as f32 / (size - 1) as f32 * cells as f32;
                let fz = iz as f32 / (size - 1) as f32 * cells as f32;
                let cx = (fx as usize).min(cells - 1);
                let cz = (fz as usize).min(cells - 1);
                let tx = smoothstep(fx - cx as f32);
                let tz = smoothstep(fz - cz as f32);

                let at = |x: usize, z: usize| lattice[x + z * stride];
                let top = lerp(at(cx, cz), at(cx + 1, cz), tx);
                let bottom = lerp(at(cx, cz + 1), at(cx + 1, cz + 1), tx);
                samples[ix + iz * size] += amplitude * lerp(top, bottom, tz);
            }
        }

        amplitude *= 0.5;
        cells *= 2;
    }

    let (low, high) = samples
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), &s| (lo.min(s), hi.max(s)));
    let range = high - low;
    for sample in &mut samples {
        *sample = if range > f32::EPSILON {
            (*sample - low) / range * TERRAIN_RELIEF
        } else {
            0.0
        };
    }
    samples
}

fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Skinned models by name
#[derive(Debug, Clone, Default)]
pub struct ModelLibrary {
    models: HashMap<String, Arc<SkinnedModel>>,
}

impl ModelLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Library holding the marine, the beast and the machine gun
    pub fn builtin() -> Result<Self, AssetError> {
        let mut library = Self::new();
        library.insert(marine_model()?);
        library.insert(beast_model()?);
        library.insert(machine_gun_model()?);
        info!("Model library ready: {} models", library.len());
        Ok(library)
    }

    /// Register a model under its mesh id
    pub fn insert(&mut self, model: SkinnedModel) {
        self.models.insert(model.mesh_id.clone(), Arc::new(model));
    }

    /// Look up a model
    pub fn get(&self, name: &str) -> Result<Arc<SkinnedModel>, AssetError> {
        self.models
            .get(name)
            .cloned()
            .ok_or_else(|| AssetError::UnknownModel(name.to_string()))
    }

    /// Registered model names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    /// Number of models
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// True when no model is registered
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

fn translation(x: f32, y: f32, z: f32) -> Mat4 {
    Mat4::new_translation(&Vec3::new(x, y, z))
}

/// Keyframe posing `bone` at its bind offset turned by `rotation`
fn posed(bind: &[Mat4], time: f32, bone: usize, rotation: Mat4) -> Keyframe {
    Keyframe::new(time, bone, bind[bone] * rotation)
}

/// Sixteen bone humanoid; bone 2 is the waist and bone 15 the right hand
pub fn marine_model() -> Result<SkinnedModel, AssetError> {
    let bind = vec![
        Mat4::identity(),
        translation(0.0, 2.5, 0.0),
        translation(0.0, 0.5, 0.0),
        translation(0.0, 1.0, 0.0),
        translation(0.0, 1.0, 0.0),
        translation(0.0, 0.4, 0.0),
        translation(-0.4, 0.0, 0.0),
        translation(0.0, -1.5, 0.0),
        translation(0.4, 0.0, 0.0),
        translation(0.0, -1.5, 0.0),
        translation(-0.7, 0.8, 0.0),
        translation(0.0, -0.8, 0.0),
        translation(0.0, -0.7, 0.0),
        translation(0.7, 0.8, 0.0),
        translation(0.0, -0.8, 0.0),
        translation(0.0, -0.7, 0.0),
    ];
    let parents = vec![
        None,
        Some(0),
        Some(1),
        Some(2),
        Some(3),
        Some(4),
        Some(1),
        Some(6),
        Some(1),
        Some(8),
        Some(3),
        Some(10),
        Some(11),
        Some(3),
        Some(13),
        Some(14),
    ];

    let arm_raised = Mat4::rotation_x(1.4);
    let clips = vec![
        AnimationClip::new(
            PlayerAnimation::Idle.name(),
            2.0,
            vec![
                posed(&bind, 0.0, 3, Mat4::rotation_x(0.03)),
                posed(&bind, 1.0, 3, Mat4::identity()),
            ],
        )?,
        AnimationClip::new(
            PlayerAnimation::Run.name(),
            0.6,
            vec![
                posed(&bind, 0.0, 6, Mat4::rotation_x(0.6)),
                posed(&bind, 0.0, 8, Mat4::rotation_x(-0.6)),
                posed(&bind, 0.3, 6, Mat4::rotation_x(-0.6)),
                posed(&bind, 0.3, 8, Mat4::rotation_x(0.6)),
            ],
        )?,
        AnimationClip::new(
            PlayerAnimation::Aim.name(),
            0.25,
            vec![
                posed(&bind, 0.0, 13, Mat4::rotation_x(0.7)),
                posed(&bind, 0.2, 13, arm_raised),
            ],
        )?,
        AnimationClip::new(
            PlayerAnimation::Shoot.name(),
            0.15,
            vec![
                posed(&bind, 0.0, 13, arm_raised),
                Keyframe::new(0.0, 14, bind[14] * translation(0.0, 0.15, 0.0)),
                posed(&bind, 0.1, 14, Mat4::identity()),
            ],
        )?,
    ];

    let skeleton = SkeletonPose::from_bind_pose(bind, parents, clips)?;
    let bounds = Aabb::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 6.0, 1.0));
    Ok(SkinnedModel::new("PlayerMarine", Arc::new(skeleton), bounds))
}

/// Four legged beast with a biting jaw
pub fn beast_model() -> Result<SkinnedModel, AssetError> {
    let bind = vec![
        Mat4::identity(),
        translation(0.0, 3.0, 0.0),
        translation(0.0, 0.5, -2.0),
        translation(0.0, 0.5, -1.0),
        translation(0.0, -0.4, -0.5),
        translation(-1.2, -0.5, -1.5),
        translation(1.2, -0.5, -1.5),
        translation(-1.2, -0.5, 1.5),
        translation(1.2, -0.5, 1.5),
    ];
    let parents = vec![None, Some(0), Some(1), Some(2), Some(3), Some(1), Some(1), Some(1), Some(1)];

    let stride = |time: f32, swing: f32| {
        vec![
            posed(&bind, time, 5, Mat4::rotation_x(swing)),
            posed(&bind, time, 6, Mat4::rotation_x(-swing)),
            posed(&bind, time, 7, Mat4::rotation_x(-swing)),
            posed(&bind, time, 8, Mat4::rotation_x(swing)),
        ]
    };
    let run = [stride(0.0, 0.5), stride(0.25, -0.5)].concat();

    let clips = vec![
        AnimationClip::new(
            EnemyAnimation::Idle.name(),
            2.0,
            vec![
                posed(&bind, 0.0, 3, Mat4::rotation_x(0.1)),
                posed(&bind, 1.0, 3, Mat4::identity()),
            ],
        )?,
        AnimationClip::new(EnemyAnimation::Run.name(), 0.5, run)?,
        AnimationClip::new(
            EnemyAnimation::Bite.name(),
            0.6,
            vec![
                posed(&bind, 0.0, 4, Mat4::rotation_x(0.8)),
                posed(&bind, 0.3, 4, Mat4::identity()),
            ],
        )?,
        AnimationClip::new(
            EnemyAnimation::TakeDamage.name(),
            0.4,
            vec![
                posed(&bind, 0.0, 1, Mat4::rotation_z(0.2)),
                posed(&bind, 0.3, 1, Mat4::identity()),
            ],
        )?,
        AnimationClip::new(
            EnemyAnimation::Die.name(),
            1.0,
            vec![
                posed(&bind, 0.0, 1, Mat4::rotation_z(0.5)),
                posed(&bind, 0.4, 1, Mat4::rotation_z(1.0)),
                Keyframe::new(0.8, 1, translation(0.0, 1.5, 0.0) * Mat4::rotation_z(1.5)),
            ],
        )?,
    ];

    let skeleton = SkeletonPose::from_bind_pose(bind, parents, clips)?;
    let bounds = Aabb::new(Vec3::new(-2.5, 0.0, -4.0), Vec3::new(2.5, 5.5, 2.5));
    Ok(SkinnedModel::new("EnemyBeast", Arc::new(skeleton), bounds))
}

/// Three bone gun; bone 2 sits at the muzzle
///
/// The barrel runs along the hand's -Y axis, so it points where the arm
/// points once the aim clip raises it.
pub fn machine_gun_model() -> Result<SkinnedModel, AssetError> {
    let bind = vec![
        Mat4::identity(),
        translation(0.0, -0.6, -0.2),
        translation(0.0, -1.2, 0.0),
    ];
    let skeleton = SkeletonPose::from_bind_pose(bind, vec![None, Some(0), Some(1)], Vec::new())?;
    let bounds = Aabb::new(Vec3::new(-0.2, -2.0, -0.4), Vec3::new(0.2, 0.3, 0.3));
    Ok(SkinnedModel::new("WeaponMachineGun", Arc::new(skeleton), bounds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use terrain_engine::core::config::LocomotionConfig;
    use terrain_engine::units::{Enemy, EnemyArchetype, Player, PlayerArchetype, PlayerWeapon, WeaponArchetype};
    use terrain_engine::core::config::EnemyTuning;

    #[test]
    fn test_procedural_terrain_is_deterministic() {
        let a = procedural_samples(33, 11);
        let b = procedural_samples(33, 11);
        let c = procedural_samples(33, 12);

        assert_eq!(a.len(), 33 * 33);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.iter().all(|s| (0.0..=TERRAIN_RELIEF).contains(s)));
        assert_relative_eq!(a.iter().copied().fold(f32::MAX, f32::min), 0.0);
    }

    #[test]
    fn test_luma_image_becomes_samples() {
        let image = GrayImage::from_fn(4, 2, |x, y| image::Luma([if y == 0 { x as u8 * 85 } else { 255 }]));
        let (width, depth, samples) = samples_from_luma(&image);

        assert_eq!((width, depth), (4, 2));
        assert_relative_eq!(samples[1], 85.0 / 255.0);
        assert_relative_eq!(samples[3], 1.0);
        assert_relative_eq!(samples[4], 1.0);
    }

    #[test]
    fn test_missing_heightmap_is_an_image_error() {
        let level = LevelConfig::default().with_heightmap("does/not/exist.png");
        let result = load_height_field(&level, &TerrainConfig::default());
        assert!(matches!(result, Err(AssetError::Image(_))));
    }

    #[test]
    fn test_procedural_level_terrain() {
        let level = LevelConfig {
            terrain_size: 17,
            ..LevelConfig::default()
        };
        let field = load_height_field(&level, &TerrainConfig::default()).unwrap();
        assert_eq!((field.width(), field.depth()), (17, 17));
    }

    #[test]
    fn test_builtin_models_fit_the_units() {
        let library = ModelLibrary::builtin().unwrap();
        assert_eq!(library.len(), 3);

        let player = library.get(&PlayerArchetype::marine().model).unwrap();
        let enemy = library.get(&EnemyArchetype::beast().model).unwrap();
        let gun = library.get(&WeaponArchetype::machine_gun().model).unwrap();

        assert!(Player::new(player, &PlayerArchetype::marine(), LocomotionConfig::default()).is_ok());
        assert!(Enemy::new(enemy, &EnemyArchetype::beast(), EnemyTuning::default(), LocomotionConfig::default()).is_ok());
        assert!(PlayerWeapon::new(gun, &WeaponArchetype::machine_gun()).is_ok());
    }

    #[test]
    fn test_unknown_model_is_reported() {
        let library = ModelLibrary::builtin().unwrap();
        assert!(matches!(library.get("Teapot"), Err(AssetError::UnknownModel(name)) if name == "Teapot"));
    }
}
