use log::debug;
use nalgebra::Vector3;

use crate::error::{ConvertError, ConvertResult};

use super::math;
use super::skeleton::{JointDelta, joint_difference};
use super::types::{
    AnimationClip, AnimationFrame, BoundingBox, Joint, Keyframe, Skeleton, Track,
};
use super::validation::{validate_clip, validate_clip_against_skeleton};

// ─── Track building ───────────────────────────────────────────────────────────

/// Local-space change of one bone between the base pose and an animated pose.
///
/// With a parent, the animated parent-relative transform is measured against
/// the base-pose parent-relative transform. Without one, the animated joint is
/// measured directly against its base-pose self.
pub fn animation_delta(
    parents: Option<(&Joint, &Joint)>,
    base_joint: &Joint,
    anim_joint: &Joint,
) -> JointDelta {
    match parents {
        Some((base_parent, anim_parent)) => {
            let relative_base = joint_difference(base_parent, base_joint);
            let anim_parent_inverse = math::inverse(&anim_parent.orientation);

            let animated_local = math::multiply(&anim_parent_inverse, &anim_joint.orientation);
            let rotate = math::multiply(&math::inverse(&relative_base.rotate), &animated_local);

            let animated_offset = math::rotate_point(
                &anim_parent_inverse,
                &(anim_joint.position - anim_parent.position),
            );
            JointDelta {
                translate: animated_offset - relative_base.translate,
                rotate,
            }
        }
        None => JointDelta {
            translate: anim_joint.position - base_joint.position,
            rotate: math::multiply(&math::inverse(&base_joint.orientation), &anim_joint.orientation),
        },
    }
}

/// Build one keyframe per frame for the bone at `joint_index`.
///
/// The clip must already be validated against the skeleton.
pub fn build_track(
    skeleton: &Skeleton,
    clip: &AnimationClip,
    joint_index: usize,
    lock_root: bool,
) -> Track {
    let base_joint = &skeleton.joints[joint_index];
    let frame_rate = clip.frame_rate as f32;

    let keyframes = clip
        .frames
        .iter()
        .enumerate()
        .map(|(frame_index, frame)| {
            let anim_joint = &frame.joints[joint_index];
            let parents = base_joint
                .parent
                .map(|parent| (&skeleton.joints[parent], &frame.joints[parent]));

            let mut delta = animation_delta(parents, base_joint, anim_joint);
            if parents.is_none() && lock_root {
                delta.translate = Vector3::zeros();
            }

            Keyframe {
                time: frame_index as f32 / frame_rate,
                translate: delta.translate.into(),
                rotate: (&delta.rotate).into(),
            }
        })
        .collect();

    Track {
        bone: base_joint.name.clone(),
        keyframes,
    }
}

/// Build a track for every bone of the skeleton.
///
/// Fails without producing anything when the clip's joint structure differs
/// from the skeleton's.
pub fn build_tracks(
    skeleton: &Skeleton,
    clip: &AnimationClip,
    lock_root: bool,
) -> ConvertResult<Vec<Track>> {
    validate_clip_against_skeleton(skeleton, clip)?;

    let tracks = (0..skeleton.joints.len())
        .map(|joint_index| {
            debug!(
                "building track '{}' ({} keyframes)",
                skeleton.joints[joint_index].name,
                clip.frames.len()
            );
            build_track(skeleton, clip, joint_index, lock_root)
        })
        .collect();

    Ok(tracks)
}

// ─── Resampling ───────────────────────────────────────────────────────────────

/// Source frame pair and blend factor for one output frame.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SamplePoint {
    frame: usize,
    interp: f32,
}

fn resampled_frame_count(frames: usize, source_fps: u32, target_fps: u32) -> usize {
    (frames as u64 * target_fps as u64 / source_fps as u64) as usize
}

/// `position = i * source_fps / target_fps`, kept as an exact fraction so that
/// whole-frame hits have an interpolation factor of exactly zero.
fn sample_point(output_frame: usize, source_fps: u32, target_fps: u32) -> SamplePoint {
    let numerator = output_frame as u64 * source_fps as u64;
    let target = target_fps as u64;
    SamplePoint {
        frame: (numerator / target) as usize,
        interp: (numerator % target) as f32 / target_fps as f32,
    }
}

/// Check that every output frame can be built from frames that exist.
///
/// An exact hit on the last source frame needs no successor; anything else
/// needs `frame + 1` to be a valid source frame.
fn check_resample_range(
    frames: usize,
    source_fps: u32,
    target_fps: u32,
    output_frames: usize,
) -> ConvertResult<()> {
    for output_frame in 0..output_frames {
        let point = sample_point(output_frame, source_fps, target_fps);
        let required = if point.interp == 0.0 {
            point.frame
        } else {
            point.frame + 1
        };
        if required >= frames {
            return Err(ConvertError::ResampleOutOfRange {
                frames,
                source_fps,
                target_fps,
                required,
            });
        }
    }
    Ok(())
}

fn interpolate_frames(a: &AnimationFrame, b: &AnimationFrame, interp: f32) -> AnimationFrame {
    let joints = a
        .joints
        .iter()
        .zip(&b.joints)
        .map(|(ja, jb)| Joint {
            name: ja.name.clone(),
            parent: ja.parent,
            position: math::lerp_vector(&ja.position, &jb.position, interp),
            orientation: math::slerp(interp, &ja.orientation, &jb.orientation),
        })
        .collect();
    AnimationFrame { joints }
}

fn interpolate_bounding_boxes(a: &BoundingBox, b: &BoundingBox, interp: f32) -> BoundingBox {
    BoundingBox {
        min: math::lerp_vector(&a.min, &b.min, interp),
        max: math::lerp_vector(&a.max, &b.max, interp),
    }
}

/// Produce a new clip at `target_fps` by interpolating between the two source
/// frames that bracket each output frame.
///
/// The source clip is left untouched; the result is an independent clip.
pub fn resample_clip(source: &AnimationClip, target_fps: u32) -> ConvertResult<AnimationClip> {
    if target_fps == 0 {
        return Err(ConvertError::InvalidFrameRate(target_fps));
    }
    validate_clip(source)?;

    let source_fps = source.frame_rate;
    let frame_count = source.frames.len();
    let output_frames = resampled_frame_count(frame_count, source_fps, target_fps);
    check_resample_range(frame_count, source_fps, target_fps, output_frames)?;

    let mut frames = Vec::with_capacity(output_frames);
    let mut bounding_boxes = Vec::with_capacity(if source.bounding_boxes.is_empty() {
        0
    } else {
        output_frames
    });

    for output_frame in 0..output_frames {
        let point = sample_point(output_frame, source_fps, target_fps);
        let current = &source.frames[point.frame];

        if point.interp == 0.0 {
            frames.push(current.clone());
            if let Some(bbox) = source.bounding_boxes.get(point.frame) {
                bounding_boxes.push(*bbox);
            }
            continue;
        }

        let next = &source.frames[point.frame + 1];
        frames.push(interpolate_frames(current, next, point.interp));

        if let (Some(a), Some(b)) = (
            source.bounding_boxes.get(point.frame),
            source.bounding_boxes.get(point.frame + 1),
        ) {
            bounding_boxes.push(interpolate_bounding_boxes(a, b, point.interp));
        }
    }

    Ok(AnimationClip {
        name: source.name.clone(),
        frames,
        frame_rate: target_fps,
        bounding_boxes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Quaternion;

    fn rotation(axis: Vector3<f32>, angle: f32) -> Quaternion<f32> {
        let half = angle * 0.5;
        Quaternion::from_parts(half.cos(), axis.normalize() * half.sin())
    }

    fn base_skeleton() -> Skeleton {
        Skeleton::new(vec![
            Joint::new("root", None, Vector3::new(0.0, 0.0, 1.0), rotation(Vector3::z(), 0.3)),
            Joint::new(
                "child",
                Some(0),
                Vector3::new(0.0, 1.0, 1.0),
                rotation(Vector3::x(), 0.5),
            ),
            Joint::new(
                "grandchild",
                Some(1),
                Vector3::new(0.5, 1.5, 1.2),
                rotation(Vector3::new(1.0, 0.0, 1.0), -0.4),
            ),
        ])
        .unwrap()
    }

    fn posed_frame(shift: f32, twist: f32) -> AnimationFrame {
        let mut joints = base_skeleton().joints;
        for joint in &mut joints {
            joint.position += Vector3::new(shift, 0.0, shift * 0.5);
            joint.orientation = math::multiply(&rotation(Vector3::y(), twist), &joint.orientation);
        }
        joints[2].orientation = math::multiply(&joints[2].orientation, &rotation(Vector3::z(), twist));
        AnimationFrame { joints }
    }

    fn clip(frames: Vec<AnimationFrame>, frame_rate: u32) -> AnimationClip {
        AnimationClip {
            name: "walk".to_string(),
            frames,
            frame_rate,
            bounding_boxes: vec![],
        }
    }

    #[test]
    fn given_base_pose_as_frame_when_building_tracks_then_deltas_are_identity() {
        let skeleton = base_skeleton();
        let rest = clip(vec![AnimationFrame { joints: skeleton.joints.clone() }], 24);

        let tracks = build_tracks(&skeleton, &rest, false).unwrap();
        assert_eq!(tracks.len(), 3);
        for track in &tracks {
            let keyframe = &track.keyframes[0];
            assert_eq!(keyframe.time, 0.0);
            assert!(Vector3::from(keyframe.translate).norm() < 1e-4);
            assert!(keyframe.rotate.angle.abs() < 1e-2);
        }
    }

    #[test]
    fn given_root_keyframes_when_reapplying_to_base_then_animated_root_is_recovered() {
        let skeleton = base_skeleton();
        let frames = vec![posed_frame(0.0, 0.0), posed_frame(0.4, 0.3), posed_frame(1.0, 0.9)];
        let animation = clip(frames.clone(), 10);

        let root = &skeleton.joints[0];
        for (index, frame) in frames.iter().enumerate() {
            let delta = animation_delta(None, root, &frame.joints[0]);
            let position = root.position + delta.translate;
            let orientation = math::multiply(&root.orientation, &delta.rotate);
            assert!((position - frame.joints[0].position).norm() < 1e-4);
            assert!((orientation.coords - frame.joints[0].orientation.coords).norm() < 1e-4);

            let track = build_track(&skeleton, &animation, 0, false);
            let expected: [f32; 3] = delta.translate.into();
            assert_eq!(track.keyframes[index].translate, expected);
        }
    }

    #[test]
    fn given_child_keyframe_when_composing_with_base_local_then_animated_local_is_recovered() {
        let skeleton = base_skeleton();
        let frame = posed_frame(0.4, 0.7);

        let base_parent = &skeleton.joints[1];
        let base_joint = &skeleton.joints[2];
        let anim_parent = &frame.joints[1];
        let anim_joint = &frame.joints[2];

        let delta = animation_delta(Some((base_parent, anim_parent)), base_joint, anim_joint);
        let relative_base = joint_difference(base_parent, base_joint);
        let animated_local = joint_difference(anim_parent, anim_joint);

        let rebuilt_rotate = math::multiply(&relative_base.rotate, &delta.rotate);
        let rebuilt_translate = relative_base.translate + delta.translate;
        assert!((rebuilt_rotate.coords - animated_local.rotate.coords).norm() < 1e-4);
        assert!((rebuilt_translate - animated_local.translate).norm() < 1e-4);
    }

    #[test]
    fn given_root_lock_when_building_tracks_then_root_translation_is_zero_but_rotation_animates() {
        let skeleton = base_skeleton();
        let animation = clip(vec![posed_frame(0.0, 0.0), posed_frame(2.0, 0.8)], 24);

        let tracks = build_tracks(&skeleton, &animation, true).unwrap();
        let root = &tracks[0];
        assert_eq!(root.bone, "root");
        assert!(root.keyframes.iter().all(|k| k.translate == [0.0, 0.0, 0.0]));
        assert!(root.keyframes[1].rotate.angle > 0.1);
        assert!((root.keyframes[1].time - 1.0 / 24.0).abs() < 1e-6);
    }

    #[test]
    fn given_mismatched_clip_when_building_tracks_then_error_is_returned() {
        let skeleton = base_skeleton();
        let mut frame = posed_frame(0.0, 0.0);
        frame.joints.pop();
        assert!(matches!(
            build_tracks(&skeleton, &clip(vec![frame], 24), false),
            Err(ConvertError::JointCountMismatch { .. })
        ));
    }

    #[test]
    fn given_same_rate_when_resampling_then_clip_is_unchanged() {
        let frames = vec![posed_frame(0.0, 0.0), posed_frame(0.5, 0.2), posed_frame(1.0, 0.4)];
        let source = clip(frames, 24);

        let resampled = resample_clip(&source, 24).unwrap();
        assert_eq!(resampled, source);
    }

    #[test]
    fn given_two_frames_at_24_when_resampling_to_12_then_one_frame_equal_to_first_remains() {
        let source = clip(vec![posed_frame(0.0, 0.0), posed_frame(1.0, 0.5)], 24);

        let resampled = resample_clip(&source, 12).unwrap();
        assert_eq!(resampled.frames.len(), 1);
        assert_eq!(resampled.frame_rate, 12);
        assert_eq!(resampled.frames[0], source.frames[0]);
    }

    #[test]
    fn given_half_rate_step_when_resampling_then_joints_are_interpolated() {
        let source = clip(
            vec![posed_frame(0.0, 0.0), posed_frame(1.0, 0.6), posed_frame(2.0, 1.2)],
            10,
        );

        // 3 frames at 10 fps -> 4 frames at 15 fps; frame 1 sits at 2/3.
        let resampled = resample_clip(&source, 15).unwrap();
        assert_eq!(resampled.frames.len(), 4);

        let a = &source.frames[0].joints[1];
        let b = &source.frames[1].joints[1];
        let expected_position = math::lerp_vector(&a.position, &b.position, 2.0 / 3.0);
        let expected_orientation = math::slerp(2.0 / 3.0, &a.orientation, &b.orientation);
        let joint = &resampled.frames[1].joints[1];
        assert!((joint.position - expected_position).norm() < 1e-5);
        assert!((joint.orientation.coords - expected_orientation.coords).norm() < 1e-5);
        assert_eq!(joint.name, "child");
        assert_eq!(joint.parent, Some(0));
    }

    #[test]
    fn given_upsampling_past_last_frame_when_resampling_then_range_error_is_returned() {
        let source = clip(vec![posed_frame(0.0, 0.0), posed_frame(1.0, 0.5)], 12);

        // 4 output frames; the last one sits at 1.5 and would need frame 2.
        assert!(matches!(
            resample_clip(&source, 24),
            Err(ConvertError::ResampleOutOfRange { required: 2, .. })
        ));
    }

    #[test]
    fn given_zero_target_rate_when_resampling_then_error_is_returned() {
        let source = clip(vec![posed_frame(0.0, 0.0)], 12);
        assert!(matches!(
            resample_clip(&source, 0),
            Err(ConvertError::InvalidFrameRate(0))
        ));
    }

    #[test]
    fn given_bounding_boxes_when_resampling_then_boxes_follow_frames() {
        let mut source = clip(
            vec![posed_frame(0.0, 0.0), posed_frame(1.0, 0.5), posed_frame(2.0, 1.0)],
            10,
        );
        source.bounding_boxes = (0..3)
            .map(|i| BoundingBox {
                min: Vector3::repeat(-(i as f32)),
                max: Vector3::repeat(i as f32),
            })
            .collect();

        let resampled = resample_clip(&source, 5).unwrap();
        assert_eq!(resampled.frames.len(), 1);
        assert_eq!(resampled.bounding_boxes, vec![source.bounding_boxes[0]]);
    }

    #[test]
    fn given_origin_joint_when_rerooting_before_or_after_resampling_then_frames_match() {
        use crate::convert::skeleton::reroot_clip;

        let skeleton = base_skeleton();
        let origin = skeleton.joints[1].clone();
        let source = clip(
            vec![posed_frame(0.0, 0.0), posed_frame(0.4, 0.3), posed_frame(1.0, 0.9)],
            10,
        );

        let mut resampled_first = resample_clip(&source, 15).unwrap();
        reroot_clip(&mut resampled_first, &origin);

        let mut rerooted_first = source.clone();
        reroot_clip(&mut rerooted_first, &origin);
        let rerooted_first = resample_clip(&rerooted_first, 15).unwrap();

        assert_eq!(resampled_first.frames.len(), 4);
        assert_eq!(rerooted_first.frames.len(), 4);
        for (a, b) in resampled_first.frames.iter().zip(&rerooted_first.frames) {
            for (joint_a, joint_b) in a.joints.iter().zip(&b.joints) {
                assert!((joint_a.position - joint_b.position).norm() < 1e-4);
                assert!((joint_a.orientation.coords - joint_b.orientation.coords).norm() < 1e-4);
            }
        }
    }
}
