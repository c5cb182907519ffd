pub mod animation;
pub mod coords;
mod diagnostic;
pub mod geometry;
pub mod math;
pub mod skeleton;
pub mod skinning;
mod types;
pub mod validation;

use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::{error, info, warn};
use serde::Serialize;

use crate::error::{ConvertError, ConvertResult};

// Re-export public types for callers of this module.
pub use diagnostic::{ClipSummary, JointSummary, ModelSummary, SubMeshSummary, summarize_model};
pub use types::{
    AnimationClip, AnimationExport, AnimationFrame, BoneAssignment, BoneParent, BoneRecord,
    BoundingBox, ConversionReport, ConvertOptions, Joint, Keyframe, MeshExport, MeshTriangle,
    Model, Rotation, Severity, Skeleton, SkeletonExport, SkinWeight, SkinnedVertex, SubMesh,
    SubMeshExport, Track, ValidationIssue, VertexRecord,
};

use animation::{build_tracks, resample_clip};
use geometry::{build_vertex_records, flipped_faces, generate_normals};
use skeleton::{build_bone_hierarchy, build_bones, find_joint, reroot_clip, reroot_skeleton};
use skinning::{build_bone_assignments, pose_vertices};
use validation::{validate_clip_against_skeleton, validate_mesh_references};

/// Everything produced for one model.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    pub skeleton: SkeletonExport,
    pub mesh: MeshExport,
    pub report: ConversionReport,
}

// ─── Issue helpers ────────────────────────────────────────────────────────────

fn push_issue(issues: &mut Vec<ValidationIssue>, issue: ValidationIssue) {
    match issue.severity {
        Severity::Error => error!("{}: {}", issue.code, issue.message),
        Severity::Warning => warn!("{}: {}", issue.code, issue.message),
        Severity::Info => info!("{}: {}", issue.code, issue.message),
    }
    issues.push(issue);
}

fn animation_issue_code(err: &ConvertError) -> &'static str {
    match err {
        ConvertError::JointCountMismatch { .. } | ConvertError::JointMismatch { .. } => {
            "STRUCTURE_MISMATCH"
        }
        ConvertError::ResampleOutOfRange { .. } | ConvertError::InvalidFrameRate(_) => {
            "RESAMPLE_FAILED"
        }
        _ => "INVALID_ANIMATION",
    }
}

// ─── Mesh export ──────────────────────────────────────────────────────────────

fn export_submesh(
    mesh: &SubMesh,
    skeleton: &Skeleton,
    options: &ConvertOptions,
    issues: &mut Vec<ValidationIssue>,
) -> ConvertResult<SubMeshExport> {
    validate_mesh_references(mesh, skeleton.len())?;

    let positions = pose_vertices(mesh, skeleton)?;
    let normals = generate_normals(&positions, &mesh.triangles);
    let (bone_assignments, unweighted) = build_bone_assignments(mesh, options.max_bone_weights);

    if !unweighted.is_empty() {
        push_issue(
            issues,
            ValidationIssue::warning(
                "UNWEIGHTED_VERTICES",
                format!(
                    "submesh '{}': {} vertices have no usable bone weights",
                    mesh.name,
                    unweighted.len()
                ),
            ),
        );
    }

    let material = options
        .materials
        .get(&mesh.name)
        .cloned()
        .unwrap_or_else(|| mesh.material.clone());

    Ok(SubMeshExport {
        name: mesh.name.clone(),
        material,
        faces: flipped_faces(&mesh.triangles),
        vertices: build_vertex_records(&mesh.vertices, &positions, &normals),
        bone_assignments,
    })
}

// ─── Animation export ─────────────────────────────────────────────────────────

fn export_animation(
    clip: &AnimationClip,
    skeleton: &Skeleton,
    track_skeleton: &Skeleton,
    origin: Option<&Joint>,
    options: &ConvertOptions,
    issues: &mut Vec<ValidationIssue>,
) -> ConvertResult<AnimationExport> {
    validate_clip_against_skeleton(skeleton, clip)?;

    let mut prepared = match options.animation_rates.get(&clip.name) {
        Some(&rate) if rate != clip.frame_rate => {
            let resampled = resample_clip(clip, rate)?;
            push_issue(
                issues,
                ValidationIssue::info(
                    "ANIMATION_RESAMPLED",
                    format!(
                        "animation '{}' resampled from {} fps ({} frames) to {} fps ({} frames)",
                        clip.name,
                        clip.frame_rate,
                        clip.frames.len(),
                        rate,
                        resampled.frames.len()
                    ),
                ),
            );
            resampled
        }
        _ => clip.clone(),
    };

    if let Some(origin) = origin {
        reroot_clip(&mut prepared, origin);
    }

    let tracks = build_tracks(track_skeleton, &prepared, options.lock_root_translation)?;

    Ok(AnimationExport {
        name: prepared.name.clone(),
        // Resampling floors the frame count, so the length comes from the source.
        length: clip.length(),
        tracks,
    })
}

// ─── Public API ───────────────────────────────────────────────────────────────

/// Convert a decoded model into skeleton and mesh exports.
///
/// Only an invalid base skeleton fails the whole conversion. Submeshes and
/// animations that cannot be converted are skipped and reported as issues.
pub fn convert_model(mut model: Model, options: &ConvertOptions) -> ConvertResult<ConversionOutput> {
    if options.convert_coordinates {
        coords::convert_skeleton(&mut model.skeleton);
        model.animations.iter_mut().for_each(coords::convert_clip);
    }

    model.skeleton.validate()?;
    let skeleton = &model.skeleton;
    let mut issues = Vec::<ValidationIssue>::new();

    // Mesh
    let mut submeshes = Vec::with_capacity(model.meshes.len());
    for mesh in &model.meshes {
        match export_submesh(mesh, skeleton, options, &mut issues) {
            Ok(submesh) => submeshes.push(submesh),
            Err(err) => push_issue(
                &mut issues,
                ValidationIssue::error(
                    "INVALID_SUBMESH",
                    format!("submesh '{}' skipped: {err}", mesh.name),
                ),
            ),
        }
    }

    // Skeleton
    let origin = match options.origin_bone.as_deref() {
        Some(name) => match find_joint(skeleton, name) {
            Some(index) => {
                push_issue(
                    &mut issues,
                    ValidationIssue::info(
                        "SKELETON_REROOTED",
                        format!("skeleton and animations re-rooted to '{name}'"),
                    ),
                );
                Some(skeleton.joints[index].clone())
            }
            None => {
                push_issue(
                    &mut issues,
                    ValidationIssue::warning(
                        "MISSING_ORIGIN_BONE",
                        format!("origin bone '{name}' not found, skeleton is not re-rooted"),
                    ),
                );
                None
            }
        },
        None => None,
    };

    let bones = build_bones(skeleton, origin.as_ref());
    let hierarchy = build_bone_hierarchy(skeleton);
    let track_skeleton = match &origin {
        Some(origin) => reroot_skeleton(skeleton, origin),
        None => skeleton.clone(),
    };

    // Animations
    let mut animations = Vec::new();
    let mut exported_animations = Vec::new();
    let mut skipped_animations = Vec::new();
    for clip in &model.animations {
        match export_animation(
            clip,
            skeleton,
            &track_skeleton,
            origin.as_ref(),
            options,
            &mut issues,
        ) {
            Ok(animation) => {
                exported_animations.push(animation.name.clone());
                animations.push(animation);
            }
            Err(err) => {
                push_issue(
                    &mut issues,
                    ValidationIssue::warning(
                        animation_issue_code(&err),
                        format!("animation '{}' skipped: {err}", clip.name),
                    ),
                );
                skipped_animations.push(clip.name.clone());
            }
        }
    }

    let report = ConversionReport {
        bone_count: bones.len(),
        submesh_count: submeshes.len(),
        total_vertices: submeshes.iter().map(|s| s.vertices.len()).sum(),
        total_triangles: submeshes.iter().map(|s| s.faces.len()).sum(),
        exported_animations,
        skipped_animations,
        rerooted_to: origin.map(|joint| joint.name),
        issues,
    };

    info!(
        "converted {} bones, {} submeshes, {} animations ({} skipped)",
        report.bone_count,
        report.submesh_count,
        report.exported_animations.len(),
        report.skipped_animations.len()
    );

    Ok(ConversionOutput {
        skeleton: SkeletonExport {
            bones,
            hierarchy,
            animations,
        },
        mesh: MeshExport {
            submeshes,
            skeleton_link: options.skeleton_name.clone(),
        },
        report,
    })
}

/// `<prefix><suffix>` without touching any extension already in the prefix.
pub fn output_path(prefix: &Path, suffix: &str) -> PathBuf {
    let mut path = OsString::from(prefix.as_os_str());
    path.push(suffix);
    PathBuf::from(path)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)
        .with_context(|| format!("failed to serialize {}", path.display()))?;
    fs::write(path, content)
        .with_context(|| format!("failed to write output file: {}", path.display()))?;
    Ok(())
}

pub fn load_model(input_path: &Path) -> Result<Model> {
    let content = fs::read_to_string(input_path)
        .with_context(|| format!("failed to read input file: {}", input_path.display()))?;
    let model: Model = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse model JSON: {}", input_path.display()))?;
    Ok(model)
}

/// Convert a model file and write `<prefix>.mesh.json`, plus
/// `<prefix>.skeleton.json` when a skeleton name is configured.
pub fn convert_file(
    input_path: &Path,
    output_prefix: &Path,
    options: &ConvertOptions,
) -> Result<ConversionReport> {
    info!("converting {}", input_path.display());
    let model = load_model(input_path)?;

    let output = convert_model(model, options)
        .with_context(|| format!("failed to convert model: {}", input_path.display()))?;

    let mesh_path = output_path(output_prefix, ".mesh.json");
    write_json(&mesh_path, &output.mesh)?;
    info!("wrote {}", mesh_path.display());

    if options.skeleton_name.is_some() {
        let skeleton_path = output_path(output_prefix, ".skeleton.json");
        write_json(&skeleton_path, &output.skeleton)?;
        info!("wrote {}", skeleton_path.display());
    }

    Ok(output.report)
}
