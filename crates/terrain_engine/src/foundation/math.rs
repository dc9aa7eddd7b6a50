//! Math utilities and types
//!
//! Provides the fundamental math types used by the terrain, animation and
//! camera code. Matrices use nalgebra's column-vector convention, so a product
//! `a * b` applies `b` first and `a` second.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix4,
    Quaternion,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Translation, Euler rotation and scale of a placed object.
///
/// `rotation` holds pitch (X), yaw (Y) and roll (Z) in degrees. Units turn by
/// integrating an angular velocity straight into these angles, which is why
/// they are stored as a vector rather than a quaternion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position in world space
    pub position: Vec3,

    /// Euler angles in degrees (pitch, yaw, roll)
    pub rotation: Vec3,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and Euler rotation in degrees
    pub fn from_position_rotation(position: Vec3, rotation: Vec3) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Rotation part as a quaternion (yaw, then pitch, then roll)
    pub fn rotation_quat(&self) -> Quat {
        let yaw = Quat::from_axis_angle(&Vec3::y_axis(), utils::deg_to_rad(self.rotation.y));
        let pitch = Quat::from_axis_angle(&Vec3::x_axis(), utils::deg_to_rad(self.rotation.x));
        let roll = Quat::from_axis_angle(&Vec3::z_axis(), utils::deg_to_rad(self.rotation.z));
        yaw * pitch * roll
    }

    /// Convert to a transformation matrix (scale, rotate, then translate)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation_quat().to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Normalized forward direction (-Z rotated into world space)
    pub fn heading(&self) -> Vec3 {
        self.rotation_quat() * -Vec3::z()
    }

    /// Normalized right direction (+X rotated into world space)
    pub fn strafe(&self) -> Vec3 {
        self.rotation_quat() * Vec3::x()
    }

    /// Normalized up direction (+Y rotated into world space)
    pub fn up(&self) -> Vec3 {
        self.rotation_quat() * Vec3::y()
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: Point3) -> Point3 {
        self.to_matrix().transform_point(&point)
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Mat4, Vec3};

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Component-wise linear interpolation between two vectors
    pub fn lerp_vec3(a: &Vec3, b: &Vec3, t: f32) -> Vec3 {
        a + (b - a) * t
    }

    /// Translation column of an affine matrix
    pub fn translation_of(matrix: &Mat4) -> Vec3 {
        Vec3::new(matrix.m14, matrix.m24, matrix.m34)
    }

    /// Normalize `v`, or return `None` when it is (nearly) zero length
    pub fn try_normalize(v: &Vec3) -> Option<Vec3> {
        v.try_normalize(1.0e-6)
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Create a rotation matrix around the X axis
    fn rotation_x(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Y axis
    fn rotation_y(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Z axis
    fn rotation_z(angle: f32) -> Mat4;

    /// Create a right-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn rotation_x(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::x_axis(), angle)
    }

    fn rotation_y(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::y_axis(), angle)
    }

    fn rotation_z(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::z_axis(), angle)
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        Mat4::look_at_rh(&Point3::from(eye), &Point3::from(target), &up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_identity_basis() {
        let transform = Transform::identity();

        assert_relative_eq!(transform.heading(), Vec3::new(0.0, 0.0, -1.0), epsilon = EPSILON);
        assert_relative_eq!(transform.strafe(), Vec3::new(1.0, 0.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(transform.up(), Vec3::new(0.0, 1.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_positive_yaw_turns_heading_left() {
        let transform = Transform::from_position_rotation(Vec3::zeros(), Vec3::new(0.0, 90.0, 0.0));

        // Facing -Z, a quarter turn about +Y faces -X
        assert_relative_eq!(transform.heading(), Vec3::new(-1.0, 0.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(transform.strafe(), Vec3::new(0.0, 0.0, -1.0), epsilon = EPSILON);
    }

    #[test]
    fn test_matrix_translation_and_scale() {
        let transform = Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Vec3::zeros(),
            scale: Vec3::new(2.0, 2.0, 2.0),
        };

        let point = transform.transform_point(Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(point, Point3::new(3.0, 2.0, 3.0), epsilon = EPSILON);
        assert_relative_eq!(utils::translation_of(&transform.to_matrix()), transform.position, epsilon = EPSILON);
    }

    #[test]
    fn test_look_at_maps_eye_to_origin() {
        let eye = Vec3::new(0.0, 5.0, 10.0);
        let view = Mat4::look_at(eye, Vec3::zeros(), Vec3::y());

        let transformed = view.transform_point(&Point3::from(eye));
        assert_relative_eq!(transformed, Point3::origin(), epsilon = EPSILON);
    }
}
