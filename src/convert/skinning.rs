use log::warn;
use nalgebra::Vector3;

use crate::error::{ConvertError, ConvertResult};

use super::math;
use super::types::{BoneAssignment, Skeleton, SkinWeight, SubMesh};

/// Total bias below which a vertex is treated as unweighted.
const MIN_TOTAL_WEIGHT: f32 = 1e-7;

// ─── Weight normalization ─────────────────────────────────────────────────────

/// Keep the strongest influences of one vertex and rescale them to sum to 1.
///
/// Influences are stable-sorted by descending bias, truncated to
/// `max_influences` when set to a positive count, then divided by their total.
/// `None` and `Some(0)` both keep every influence. Returns `None` when nothing
/// usable remains (no weights, or a zero total).
pub fn normalize_vertex_weights(
    weights: &[SkinWeight],
    max_influences: Option<usize>,
) -> Option<Vec<(usize, f32)>> {
    let mut sorted: Vec<&SkinWeight> = weights.iter().collect();
    sorted.sort_by(|a, b| b.bias.total_cmp(&a.bias));

    if let Some(max) = max_influences.filter(|&max| max > 0) {
        sorted.truncate(max);
    }

    let total: f32 = sorted.iter().map(|w| w.bias).sum();
    if sorted.is_empty() || !total.is_finite() || total <= MIN_TOTAL_WEIGHT {
        return None;
    }

    Some(sorted.iter().map(|w| (w.bone, w.bias / total)).collect())
}

/// Normalized bone assignments for every vertex of a submesh.
///
/// Vertices without usable weights emit nothing; their indices are returned
/// alongside so the caller can report them.
pub fn build_bone_assignments(
    mesh: &SubMesh,
    max_influences: Option<usize>,
) -> (Vec<BoneAssignment>, Vec<usize>) {
    let mut assignments = Vec::new();
    let mut unweighted = Vec::new();

    for (vertex, skinned) in mesh.vertices.iter().enumerate() {
        match normalize_vertex_weights(&skinned.weights, max_influences) {
            Some(weights) => {
                assignments.extend(
                    weights
                        .into_iter()
                        .map(|(bone, weight)| BoneAssignment { vertex, bone, weight }),
                );
            }
            None => {
                warn!(
                    "submesh '{}': vertex {} has no usable bone weights",
                    mesh.name, vertex
                );
                unweighted.push(vertex);
            }
        }
    }

    (assignments, unweighted)
}

// ─── Posing ───────────────────────────────────────────────────────────────────

/// Evaluate vertex positions in the skeleton's base pose.
///
/// Each weight contributes `bias * (joint.p + joint.q * offset)`; source biases
/// are expected to already sum to 1.
pub fn pose_vertices(mesh: &SubMesh, skeleton: &Skeleton) -> ConvertResult<Vec<Vector3<f32>>> {
    let joint_count = skeleton.joints.len();

    mesh.vertices
        .iter()
        .enumerate()
        .map(|(vertex, skinned)| {
            skinned
                .weights
                .iter()
                .try_fold(Vector3::zeros(), |acc, weight| {
                    let joint = skeleton.joints.get(weight.bone).ok_or(
                        ConvertError::InvalidBoneIndex {
                            vertex,
                            bone: weight.bone,
                            joint_count,
                        },
                    )?;
                    let local = math::rotate_point(&joint.orientation, &weight.offset);
                    Ok(acc + (joint.position + local) * weight.bias)
                })
        })
        .collect()
}
