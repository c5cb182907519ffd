use std::collections::BTreeMap;

use nalgebra::{Quaternion, Vector3};
use serde::{Deserialize, Deserializer, Serialize, de};

use super::math::{self, AngleAxis};

// ─── Decoded input ────────────────────────────────────────────────────────────

/// A named joint with a position and orientation.
///
/// In a skeleton or animation frame both values are absolute (object space).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Joint {
    pub name: String,
    /// Parent joint index; always smaller than this joint's own index.
    pub parent: Option<usize>,
    pub position: Vector3<f32>,
    #[serde(deserialize_with = "deserialize_orientation")]
    pub orientation: Quaternion<f32>,
}

/// Reads `[x, y, z, w]`, or the compressed `[x, y, z]` form of a unit
/// quaternion whose `w` is recovered from the other three.
fn deserialize_orientation<'de, D>(deserializer: D) -> Result<Quaternion<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let components = Vec::<f32>::deserialize(deserializer)?;
    match components.as_slice() {
        [x, y, z] => Ok(math::compute_w(*x, *y, *z)),
        [x, y, z, w] => Ok(Quaternion::new(*w, *x, *y, *z)),
        other => Err(de::Error::invalid_length(
            other.len(),
            &"3 or 4 orientation components",
        )),
    }
}

impl Joint {
    pub fn new(
        name: impl Into<String>,
        parent: Option<usize>,
        position: Vector3<f32>,
        orientation: Quaternion<f32>,
    ) -> Self {
        Self {
            name: name.into(),
            parent,
            position,
            orientation,
        }
    }
}

/// Base-pose skeleton, joints in absolute space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Skeleton {
    pub joints: Vec<Joint>,
}

/// One posed instant of an animation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnimationFrame {
    pub joints: Vec<Joint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

/// A decoded animation: absolute joint poses sampled at a fixed rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationClip {
    pub name: String,
    pub frames: Vec<AnimationFrame>,
    pub frame_rate: u32,
    #[serde(default)]
    pub bounding_boxes: Vec<BoundingBox>,
}

impl AnimationClip {
    /// Duration in seconds.
    pub fn length(&self) -> f32 {
        if self.frame_rate == 0 {
            return 0.0;
        }
        self.frames.len() as f32 / self.frame_rate as f32
    }
}

/// A bone influence. `offset` is the weight position in the bone's local space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkinWeight {
    pub bone: usize,
    pub bias: f32,
    #[serde(default = "zero_offset")]
    pub offset: Vector3<f32>,
}

fn zero_offset() -> Vector3<f32> {
    Vector3::zeros()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkinnedVertex {
    pub tex_coord: [f32; 2],
    pub weights: Vec<SkinWeight>,
}

/// Vertex indices in source winding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeshTriangle(pub [usize; 3]);

impl MeshTriangle {
    /// Indices in the destination engine's front-face order.
    pub fn flipped(&self) -> [usize; 3] {
        [self.0[0], self.0[2], self.0[1]]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubMesh {
    pub name: String,
    /// Material (shader) name carried by the source file.
    #[serde(default)]
    pub material: String,
    pub vertices: Vec<SkinnedVertex>,
    pub triangles: Vec<MeshTriangle>,
}

/// Everything the format decoders hand over for one model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub skeleton: Skeleton,
    #[serde(default)]
    pub meshes: Vec<SubMesh>,
    #[serde(default)]
    pub animations: Vec<AnimationClip>,
}

// ─── Export records ───────────────────────────────────────────────────────────

/// Rotation in the angle + axis form the destination engine reads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub angle: f32,
    pub axis: [f32; 3],
}

impl From<AngleAxis> for Rotation {
    fn from(value: AngleAxis) -> Self {
        Self {
            angle: value.angle,
            axis: value.axis.into(),
        }
    }
}

impl From<&Quaternion<f32>> for Rotation {
    fn from(value: &Quaternion<f32>) -> Self {
        math::to_angle_axis(value).into()
    }
}

/// Parent-relative base-pose transform of one bone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneRecord {
    pub id: usize,
    pub name: String,
    pub position: [f32; 3],
    pub rotation: Rotation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoneParent {
    pub bone: String,
    pub parent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub translate: [f32; 3],
    pub rotate: Rotation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub bone: String,
    pub keyframes: Vec<Keyframe>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationExport {
    pub name: String,
    pub length: f32,
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkeletonExport {
    pub bones: Vec<BoneRecord>,
    pub hierarchy: Vec<BoneParent>,
    pub animations: Vec<AnimationExport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexRecord {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coord: [f32; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoneAssignment {
    pub vertex: usize,
    pub bone: usize,
    pub weight: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubMeshExport {
    pub name: String,
    pub material: String,
    pub faces: Vec<[usize; 3]>,
    pub vertices: Vec<VertexRecord>,
    pub bone_assignments: Vec<BoneAssignment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshExport {
    pub submeshes: Vec<SubMeshExport>,
    /// Name of the skeleton resource the mesh is bound to.
    pub skeleton_link: Option<String>,
}

// ─── Options and reports ──────────────────────────────────────────────────────

/// Per-conversion options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Remap axes from the source (Z-up) to the destination (Y-up) convention.
    pub convert_coordinates: bool,
    /// Maximum influences kept per vertex; `None` or `Some(0)` keeps all of them.
    pub max_bone_weights: Option<usize>,
    /// Joint that becomes the coordinate origin of the exported skeleton.
    pub origin_bone: Option<String>,
    /// Freezes root-bone translation in every animation.
    pub lock_root_translation: bool,
    /// Skeleton resource name; no skeleton is exported when unset.
    pub skeleton_name: Option<String>,
    /// Material overrides keyed by submesh name.
    pub materials: BTreeMap<String, String>,
    /// Target frame rates keyed by animation name.
    pub animation_rates: BTreeMap<String, u32>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            convert_coordinates: false,
            max_bone_weights: None,
            origin_bone: None,
            lock_root_translation: false,
            skeleton_name: None,
            materials: BTreeMap::new(),
            animation_rates: BTreeMap::new(),
        }
    }
}

/// Severity level used by validation issues.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A single non-fatal problem met during conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn warning(code: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn info(code: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Summary returned after a conversion.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionReport {
    pub bone_count: usize,
    pub submesh_count: usize,
    pub total_vertices: usize,
    pub total_triangles: usize,
    pub exported_animations: Vec<String>,
    pub skipped_animations: Vec<String>,
    pub rerooted_to: Option<String>,
    pub issues: Vec<ValidationIssue>,
}
