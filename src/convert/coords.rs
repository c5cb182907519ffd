use std::f32::consts::FRAC_1_SQRT_2;

use nalgebra::{Quaternion, Vector3};

use super::math;
use super::types::{AnimationClip, BoundingBox, Joint, Skeleton};

/// Quarter turn about X that maps source Z-up onto destination Y-up.
///
/// Rotating a point by this quaternion gives the same result as
/// [`convert_vector`], so converted joints and converted vertices stay aligned.
fn axis_correction() -> Quaternion<f32> {
    Quaternion::new(FRAC_1_SQRT_2, -FRAC_1_SQRT_2, 0.0, 0.0)
}

/// `(x, y, z) -> (x, z, -y)`
pub fn convert_vector(v: &Vector3<f32>) -> Vector3<f32> {
    Vector3::new(v.x, v.z, -v.y)
}

pub fn convert_quaternion(q: &Quaternion<f32>) -> Quaternion<f32> {
    math::multiply(&axis_correction(), q)
}

pub fn convert_joint(joint: &mut Joint) {
    joint.position = convert_vector(&joint.position);
    joint.orientation = convert_quaternion(&joint.orientation);
}

pub fn convert_bounding_box(bbox: &mut BoundingBox) {
    let a = convert_vector(&bbox.min);
    let b = convert_vector(&bbox.max);
    // Negating an axis swaps which corner is the minimum.
    bbox.min = a.inf(&b);
    bbox.max = a.sup(&b);
}

pub fn convert_skeleton(skeleton: &mut Skeleton) {
    skeleton.joints.iter_mut().for_each(convert_joint);
}

pub fn convert_clip(clip: &mut AnimationClip) {
    for frame in &mut clip.frames {
        frame.joints.iter_mut().for_each(convert_joint);
    }
    clip.bounding_boxes.iter_mut().for_each(convert_bounding_box);
}
