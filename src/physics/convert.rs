//! Conversions between the engine's cgmath types and rapier's nalgebra types.

use cgmath::{Matrix4, Point3, Quaternion, Vector3};
use rapier3d::na::{self, Translation3, UnitQuaternion};
use rapier3d::prelude::*;

pub fn to_vector(v: Vector3<f32>) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

pub fn to_point(p: Point3<f32>) -> Point<Real> {
    point![p.x, p.y, p.z]
}

/// Converts to a unit quaternion, normalising the input.
pub fn to_rotation(q: Quaternion<f32>) -> UnitQuaternion<Real> {
    UnitQuaternion::from_quaternion(na::Quaternion::new(q.s, q.v.x, q.v.y, q.v.z))
}

pub fn to_isometry(position: Vector3<f32>, rotation: Quaternion<f32>) -> Isometry<Real> {
    Isometry::from_parts(
        Translation3::new(position.x, position.y, position.z),
        to_rotation(rotation),
    )
}

pub fn from_vector(v: &Vector<Real>) -> Vector3<f32> {
    Vector3::new(v.x, v.y, v.z)
}

pub fn from_rotation(q: &UnitQuaternion<Real>) -> Quaternion<f32> {
    Quaternion::new(q.w, q.i, q.j, q.k)
}

/// Pose as a column-major model matrix: `T * R`.
pub fn isometry_to_matrix(iso: &Isometry<Real>) -> Matrix4<f32> {
    Matrix4::from_translation(from_vector(&iso.translation.vector))
        * Matrix4::from(from_rotation(&iso.rotation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, Rotation3, SquareMatrix};

    #[test]
    fn test_rotation_round_trip() {
        let q = Quaternion::from_angle_y(Deg(30.0));
        let back = from_rotation(&to_rotation(q));
        assert!((back.s - q.s).abs() < 1e-6);
        assert!((back.v.y - q.v.y).abs() < 1e-6);
    }

    #[test]
    fn test_isometry_matrix_translation() {
        let iso = to_isometry(Vector3::new(1.0, 2.0, 3.0), Quaternion::new(1.0, 0.0, 0.0, 0.0));
        let m = isometry_to_matrix(&iso);
        assert_eq!(m.w.x, 1.0);
        assert_eq!(m.w.y, 2.0);
        assert_eq!(m.w.z, 3.0);

        let identity = isometry_to_matrix(&Isometry::identity());
        assert_eq!(identity, Matrix4::identity());
    }
}
