use nalgebra::{Quaternion, Vector3};

use super::math;
use super::types::{AnimationClip, BoneParent, BoneRecord, BoundingBox, Joint, Skeleton};

// ─── Joint-space deltas ───────────────────────────────────────────────────────

/// Rigid transform of one joint expressed in the local frame of another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointDelta {
    pub translate: Vector3<f32>,
    pub rotate: Quaternion<f32>,
}

/// Express `to` in the local space of `from`.
///
/// `rotate = inv(from.q) * to.q`, `translate = inv(from.q) * (to.p - from.p)`.
/// The result does not depend on where `from` sits in object space.
pub fn joint_difference(from: &Joint, to: &Joint) -> JointDelta {
    let from_inverse = math::inverse(&from.orientation);
    JointDelta {
        rotate: math::multiply(&from_inverse, &to.orientation),
        translate: math::rotate_point(&from_inverse, &(to.position - from.position)),
    }
}

/// Apply a delta on top of `from`, giving the absolute transform it describes.
///
/// Inverse of [`joint_difference`] for unit orientations.
pub fn compose(from: &Joint, delta: &JointDelta) -> (Vector3<f32>, Quaternion<f32>) {
    let position = from.position + math::rotate_point(&from.orientation, &delta.translate);
    let orientation = math::multiply(&from.orientation, &delta.rotate);
    (position, orientation)
}

pub fn find_joint(skeleton: &Skeleton, name: &str) -> Option<usize> {
    skeleton.joints.iter().position(|joint| joint.name == name)
}

// ─── Bones ────────────────────────────────────────────────────────────────────

/// Convert the base pose into parent-relative bone records.
///
/// Root joints keep their absolute transform, or are re-expressed in the local
/// space of `origin` when one is given so that the origin bone ends up at the
/// coordinate origin.
pub fn build_bones(skeleton: &Skeleton, origin: Option<&Joint>) -> Vec<BoneRecord> {
    skeleton
        .joints
        .iter()
        .enumerate()
        .map(|(id, joint)| {
            let (position, orientation) = match joint.parent {
                Some(parent) => {
                    let delta = joint_difference(&skeleton.joints[parent], joint);
                    (delta.translate, delta.rotate)
                }
                None => match origin {
                    Some(origin) => {
                        let delta = joint_difference(origin, joint);
                        (delta.translate, delta.rotate)
                    }
                    None => (joint.position, joint.orientation),
                },
            };

            BoneRecord {
                id,
                name: joint.name.clone(),
                position: position.into(),
                rotation: (&orientation).into(),
            }
        })
        .collect()
}

/// Parent/child name edges for every non-root joint.
pub fn build_bone_hierarchy(skeleton: &Skeleton) -> Vec<BoneParent> {
    skeleton
        .joints
        .iter()
        .filter_map(|joint| {
            let parent = skeleton.joints.get(joint.parent?)?;
            Some(BoneParent {
                bone: joint.name.clone(),
                parent: parent.name.clone(),
            })
        })
        .collect()
}

// ─── Re-rooting ───────────────────────────────────────────────────────────────

fn reroot_joint(origin: &Joint, joint: &mut Joint) {
    let delta = joint_difference(origin, joint);
    joint.position = delta.translate;
    joint.orientation = delta.rotate;
}

/// Express every joint of the skeleton relative to `origin`.
///
/// Parent-relative deltas are unchanged; the roots end up at
/// `joint_difference(origin, root)`.
pub fn reroot_skeleton(skeleton: &Skeleton, origin: &Joint) -> Skeleton {
    let mut rerooted = skeleton.clone();
    for joint in &mut rerooted.joints {
        reroot_joint(origin, joint);
    }
    rerooted
}

/// Apply the same re-rooting transform to every frame of a clip.
///
/// `origin` is the base-pose origin joint, so the whole animation moves by one
/// constant rigid transform.
pub fn reroot_clip(clip: &mut AnimationClip, origin: &Joint) {
    for frame in &mut clip.frames {
        for joint in &mut frame.joints {
            reroot_joint(origin, joint);
        }
    }
    for bbox in &mut clip.bounding_boxes {
        *bbox = reroot_bounding_box(origin, bbox);
    }
}

fn reroot_bounding_box(origin: &Joint, bbox: &BoundingBox) -> BoundingBox {
    let inverse = math::inverse(&origin.orientation);
    let mut min = Vector3::repeat(f32::INFINITY);
    let mut max = Vector3::repeat(f32::NEG_INFINITY);

    for corner in 0..8 {
        let point = Vector3::new(
            if corner & 1 == 0 { bbox.min.x } else { bbox.max.x },
            if corner & 2 == 0 { bbox.min.y } else { bbox.max.y },
            if corner & 4 == 0 { bbox.min.z } else { bbox.max.z },
        );
        let moved = math::rotate_point(&inverse, &(point - origin.position));
        min = min.inf(&moved);
        max = max.sup(&moved);
    }

    BoundingBox { min, max }
}
