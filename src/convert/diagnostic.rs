use serde::Serialize;

use super::types::Model;

// ─── Diagnostic structs ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct JointSummary {
    pub index: usize,
    pub name: String,
    pub parent: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubMeshSummary {
    pub name: String,
    pub material: String,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub weight_count: usize,
    /// Largest number of influences on a single vertex.
    pub max_influences: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClipSummary {
    pub name: String,
    pub frame_count: usize,
    pub frame_rate: u32,
    pub length: f32,
    pub joint_count: usize,
}

/// Read-only overview of a decoded model, printed by `--info`.
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub joints: Vec<JointSummary>,
    pub submeshes: Vec<SubMeshSummary>,
    pub animations: Vec<ClipSummary>,
}

// ─── Summary builder ──────────────────────────────────────────────────────────

pub fn summarize_model(model: &Model) -> ModelSummary {
    let joints = &model.skeleton.joints;

    let joints_summary = joints
        .iter()
        .enumerate()
        .map(|(index, joint)| JointSummary {
            index,
            name: joint.name.clone(),
            parent: joint
                .parent
                .and_then(|parent| joints.get(parent))
                .map(|parent| parent.name.clone()),
        })
        .collect();

    let submeshes = model
        .meshes
        .iter()
        .map(|mesh| SubMeshSummary {
            name: mesh.name.clone(),
            material: mesh.material.clone(),
            vertex_count: mesh.vertices.len(),
            triangle_count: mesh.triangles.len(),
            weight_count: mesh.vertices.iter().map(|v| v.weights.len()).sum(),
            max_influences: mesh
                .vertices
                .iter()
                .map(|v| v.weights.len())
                .max()
                .unwrap_or(0),
        })
        .collect();

    let animations = model
        .animations
        .iter()
        .map(|clip| ClipSummary {
            name: clip.name.clone(),
            frame_count: clip.frames.len(),
            frame_rate: clip.frame_rate,
            length: clip.length(),
            joint_count: clip.frames.first().map_or(0, |frame| frame.joints.len()),
        })
        .collect();

    ModelSummary {
        joints: joints_summary,
        submeshes,
        animations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::types::{
        AnimationClip, AnimationFrame, Joint, MeshTriangle, Skeleton, SkinWeight, SkinnedVertex,
        SubMesh,
    };
    use nalgebra::{Quaternion, Vector3};

    #[test]
    fn given_model_when_summarizing_then_counts_and_parent_names_are_reported() {
        let joints = vec![
            Joint::new("root", None, Vector3::zeros(), Quaternion::identity()),
            Joint::new("spine", Some(0), Vector3::zeros(), Quaternion::identity()),
        ];
        let weight = SkinWeight {
            bone: 1,
            bias: 1.0,
            offset: Vector3::zeros(),
        };
        let model = Model {
            skeleton: Skeleton {
                joints: joints.clone(),
            },
            meshes: vec![SubMesh {
                name: "body".to_string(),
                material: "skin".to_string(),
                vertices: vec![
                    SkinnedVertex {
                        tex_coord: [0.0, 0.0],
                        weights: vec![weight, weight],
                    },
                    SkinnedVertex {
                        tex_coord: [0.0, 0.0],
                        weights: vec![weight],
                    },
                    SkinnedVertex::default(),
                ],
                triangles: vec![MeshTriangle([0, 1, 2])],
            }],
            animations: vec![AnimationClip {
                name: "walk".to_string(),
                frames: vec![AnimationFrame { joints }; 12],
                frame_rate: 24,
                bounding_boxes: vec![],
            }],
        };

        let summary = summarize_model(&model);
        assert_eq!(summary.joints[1].parent.as_deref(), Some("root"));
        assert_eq!(summary.joints[0].parent, None);
        assert_eq!(summary.submeshes[0].vertex_count, 3);
        assert_eq!(summary.submeshes[0].triangle_count, 1);
        assert_eq!(summary.submeshes[0].weight_count, 3);
        assert_eq!(summary.submeshes[0].max_influences, 2);
        assert_eq!(summary.animations[0].frame_count, 12);
        assert!((summary.animations[0].length - 0.5).abs() < 1e-6);

        let json = serde_json::to_string(&summary).expect("serialize summary");
        assert!(json.contains("\"walk\""));
    }
}
