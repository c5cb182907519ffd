//! Quaternion and vector helpers used by every joint-space computation.
//!
//! Quaternions are plain `nalgebra::Quaternion<f32>` values rather than
//! `UnitQuaternion`: source data is only approximately normalized, and the
//! interpolation and angle/axis rules below must behave exactly the same for
//! every input, including degenerate ones.

use nalgebra::{Quaternion, Vector3};

/// Dot-product threshold above which slerp degrades to a linear blend.
const SLERP_LINEAR_THRESHOLD: f32 = 0.9999;

/// Hamilton product `a * b`.
///
/// `multiply(inverse(a), b)` expresses `b` relative to `a`.
pub fn multiply(a: &Quaternion<f32>, b: &Quaternion<f32>) -> Quaternion<f32> {
    a * b
}

/// Divides the quaternion by its magnitude.
///
/// A zero-length quaternion is returned unchanged.
pub fn normalize(q: &Quaternion<f32>) -> Quaternion<f32> {
    let magnitude = q.norm();
    if magnitude > 0.0 {
        q / magnitude
    } else {
        *q
    }
}

/// Normalized conjugate.
pub fn inverse(q: &Quaternion<f32>) -> Quaternion<f32> {
    normalize(&q.conjugate())
}

pub fn dot(a: &Quaternion<f32>, b: &Quaternion<f32>) -> f32 {
    a.coords.dot(&b.coords)
}

/// Rotates a point with the sandwich product `q * (0, v) * inverse(q)`.
pub fn rotate_point(q: &Quaternion<f32>, point: &Vector3<f32>) -> Vector3<f32> {
    let pure = Quaternion::from_imag(*point);
    let rotated = q * pure * inverse(q);
    rotated.imag()
}

/// Spherical linear interpolation from `a` (t = 0) to `b` (t = 1).
///
/// Endpoints are returned bit-exact, the shortest arc is taken, and nearly
/// identical inputs are blended linearly instead of dividing by a tiny sine.
pub fn slerp(t: f32, a: &Quaternion<f32>, b: &Quaternion<f32>) -> Quaternion<f32> {
    if t <= 0.0 {
        return *a;
    }
    if t >= 1.0 {
        return *b;
    }

    let mut cos_omega = dot(a, b);
    let mut target = *b;
    if cos_omega < 0.0 {
        target = -target;
        cos_omega = -cos_omega;
    }

    let (k0, k1) = if cos_omega > SLERP_LINEAR_THRESHOLD {
        (1.0 - t, t)
    } else {
        let sin_omega = (1.0 - cos_omega * cos_omega).sqrt();
        let omega = sin_omega.atan2(cos_omega);
        let one_over_sin = 1.0 / sin_omega;
        (
            ((1.0 - t) * omega).sin() * one_over_sin,
            (t * omega).sin() * one_over_sin,
        )
    };

    Quaternion::from(a.coords * k0 + target.coords * k1)
}

/// Angle (radians) and unit axis of a rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleAxis {
    pub angle: f32,
    pub axis: Vector3<f32>,
}

impl AngleAxis {
    pub fn identity() -> Self {
        Self {
            angle: 0.0,
            axis: Vector3::x(),
        }
    }
}

/// Extracts angle and axis, falling back to a zero rotation about +X when the
/// vector part vanishes.
pub fn to_angle_axis(q: &Quaternion<f32>) -> AngleAxis {
    let unit = normalize(q);
    let imag = unit.imag();
    let len_sq = imag.norm_squared();

    if unit.w <= 1.0 && len_sq > f32::EPSILON * f32::EPSILON {
        AngleAxis {
            angle: 2.0 * unit.w.clamp(-1.0, 1.0).acos(),
            axis: imag / len_sq.sqrt(),
        }
    } else {
        AngleAxis::identity()
    }
}

/// Rebuilds a unit quaternion from its vector part, choosing `w <= 0` as the
/// source format does.
pub fn compute_w(x: f32, y: f32, z: f32) -> Quaternion<f32> {
    let t = 1.0 - x * x - y * y - z * z;
    let w = if t < 0.0 { 0.0 } else { -t.sqrt() };
    Quaternion::new(w, x, y, z)
}

pub fn lerp_vector(a: &Vector3<f32>, b: &Vector3<f32>, t: f32) -> Vector3<f32> {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn axis_angle(axis: Vector3<f32>, angle: f32) -> Quaternion<f32> {
        let half = angle * 0.5;
        Quaternion::from_parts(half.cos(), axis.normalize() * half.sin())
    }

    fn close(a: &Quaternion<f32>, b: &Quaternion<f32>) -> bool {
        (a.coords - b.coords).norm() < 1e-4
    }

    #[test]
    fn given_quarter_turns_when_multiplying_then_order_matters() {
        let about_x = axis_angle(Vector3::x(), FRAC_PI_2);
        let about_y = axis_angle(Vector3::y(), FRAC_PI_2);

        let xy = multiply(&about_x, &about_y);
        let yx = multiply(&about_y, &about_x);

        assert!(!close(&xy, &yx));
    }

    #[test]
    fn given_zero_quaternion_when_normalizing_then_no_nan_is_produced() {
        let zero = Quaternion::new(0.0, 0.0, 0.0, 0.0);
        let result = normalize(&zero);
        assert!(result.coords.iter().all(|c| c.is_finite()));
        assert_eq!(result, zero);
    }

    #[test]
    fn given_rotation_when_multiplying_by_inverse_then_identity_is_recovered() {
        let q = axis_angle(Vector3::new(1.0, 2.0, 3.0), 1.2);
        let identity = multiply(&inverse(&q), &q);
        assert!(close(&identity, &Quaternion::identity()));
    }

    #[test]
    fn given_quarter_turn_about_z_when_rotating_x_then_y_is_obtained() {
        let q = axis_angle(Vector3::z(), FRAC_PI_2);
        let rotated = rotate_point(&q, &Vector3::x());
        assert!((rotated - Vector3::y()).norm() < 1e-5);
    }

    #[test]
    fn given_endpoints_when_slerping_then_inputs_are_returned_exactly() {
        let a = axis_angle(Vector3::x(), 0.3);
        let b = axis_angle(Vector3::y(), 1.1);

        assert_eq!(slerp(0.0, &a, &b), a);
        assert_eq!(slerp(1.0, &a, &b), b);
        assert_eq!(slerp(-0.5, &a, &b), a);
        assert_eq!(slerp(1.5, &a, &b), b);
    }

    #[test]
    fn given_identical_inputs_when_slerping_halfway_then_input_is_returned() {
        let a = axis_angle(Vector3::new(0.3, -1.0, 0.2), 0.8);
        assert!(close(&slerp(0.5, &a, &a), &a));
    }

    #[test]
    fn given_opposite_hemispheres_when_slerping_then_shortest_path_is_taken() {
        let a = Quaternion::identity();
        let b = -axis_angle(Vector3::z(), 0.5);

        let mid = slerp(0.5, &a, &b);
        let expected = axis_angle(Vector3::z(), 0.25);
        assert!(close(&mid, &expected));
    }

    #[test]
    fn given_distinct_rotations_when_slerping_halfway_then_angle_is_halved() {
        let a = Quaternion::identity();
        let b = axis_angle(Vector3::y(), FRAC_PI_2);

        let mid = slerp(0.5, &a, &b);
        let angle_axis = to_angle_axis(&mid);
        assert!((angle_axis.angle - FRAC_PI_2 * 0.5).abs() < 1e-4);
        assert!((angle_axis.axis - Vector3::y()).norm() < 1e-4);
    }

    #[test]
    fn given_identity_when_extracting_angle_axis_then_fallback_is_used() {
        let angle_axis = to_angle_axis(&Quaternion::identity());
        assert_eq!(angle_axis, AngleAxis::identity());
    }

    #[test]
    fn given_vector_part_when_computing_w_then_quaternion_is_unit_with_negative_w() {
        let q = compute_w(0.2, 0.3, 0.4);
        assert!((q.norm() - 1.0).abs() < 1e-5);
        assert!(q.w <= 0.0);
    }
}
