use crate::error::{ConvertError, ConvertResult};

use super::types::{AnimationClip, Joint, Skeleton, SubMesh};

// ─── Skeleton ordering ────────────────────────────────────────────────────────

/// Check that every parent index refers to an earlier joint.
pub fn validate_joint_order(joints: &[Joint]) -> ConvertResult<()> {
    for (index, joint) in joints.iter().enumerate() {
        if let Some(parent) = joint.parent
            && parent >= index
        {
            return Err(ConvertError::InvalidParent {
                joint: index,
                name: joint.name.clone(),
                parent,
            });
        }
    }
    Ok(())
}

impl Skeleton {
    /// Build a skeleton, rejecting joints whose parent is not defined before them.
    pub fn new(joints: Vec<Joint>) -> ConvertResult<Self> {
        validate_joint_order(&joints)?;
        Ok(Self { joints })
    }

    pub fn validate(&self) -> ConvertResult<()> {
        validate_joint_order(&self.joints)
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}

// ─── Animation compatibility ──────────────────────────────────────────────────

/// Check frame rate, frame count and bounding-box count of a clip on its own.
pub fn validate_clip(clip: &AnimationClip) -> ConvertResult<()> {
    if clip.frame_rate == 0 {
        return Err(ConvertError::InvalidFrameRate(clip.frame_rate));
    }
    if clip.frames.is_empty() {
        return Err(ConvertError::EmptyClip);
    }
    if !clip.bounding_boxes.is_empty() && clip.bounding_boxes.len() != clip.frames.len() {
        return Err(ConvertError::BoundingBoxCountMismatch {
            frames: clip.frames.len(),
            boxes: clip.bounding_boxes.len(),
        });
    }
    Ok(())
}

/// Check that every frame of the clip has exactly the skeleton's shape:
/// same joint count, and the same name and parent at every index.
pub fn validate_clip_against_skeleton(
    skeleton: &Skeleton,
    clip: &AnimationClip,
) -> ConvertResult<()> {
    validate_clip(clip)?;

    for (frame_index, frame) in clip.frames.iter().enumerate() {
        if frame.joints.len() != skeleton.joints.len() {
            return Err(ConvertError::JointCountMismatch {
                expected: skeleton.joints.len(),
                actual: frame.joints.len(),
            });
        }

        for (joint_index, (base, posed)) in skeleton.joints.iter().zip(&frame.joints).enumerate() {
            if base.name != posed.name || base.parent != posed.parent {
                return Err(ConvertError::JointMismatch {
                    frame: frame_index,
                    joint: joint_index,
                    expected: describe(base),
                    actual: describe(posed),
                });
            }
        }
    }

    Ok(())
}

fn describe(joint: &Joint) -> String {
    match joint.parent {
        Some(parent) => format!("{} (parent {})", joint.name, parent),
        None => format!("{} (root)", joint.name),
    }
}

// ─── Mesh references ──────────────────────────────────────────────────────────

/// Check that weights reference existing joints and triangles existing vertices.
pub fn validate_mesh_references(mesh: &SubMesh, joint_count: usize) -> ConvertResult<()> {
    for (vertex_index, vertex) in mesh.vertices.iter().enumerate() {
        if let Some(weight) = vertex.weights.iter().find(|w| w.bone >= joint_count) {
            return Err(ConvertError::InvalidBoneIndex {
                vertex: vertex_index,
                bone: weight.bone,
                joint_count,
            });
        }
    }

    let vertex_count = mesh.vertices.len();
    for (triangle_index, triangle) in mesh.triangles.iter().enumerate() {
        if let Some(&vertex) = triangle.0.iter().find(|&&v| v >= vertex_count) {
            return Err(ConvertError::InvalidTriangle {
                triangle: triangle_index,
                vertex,
                vertex_count,
            });
        }
    }

    Ok(())
}
