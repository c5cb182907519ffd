use nalgebra::Vector3;

use super::types::{MeshTriangle, SkinnedVertex, VertexRecord};

// ─── Normals ──────────────────────────────────────────────────────────────────

/// Smooth per-vertex normals from triangle faces.
///
/// Each face contributes `cross(v2 - v0, v1 - v0)` to its three vertices, which
/// matches the flipped front-face winding of the exported triangles. Vertices
/// that no face touches, or whose contributions cancel out, keep a zero normal.
pub fn generate_normals(
    positions: &[Vector3<f32>],
    triangles: &[MeshTriangle],
) -> Vec<Vector3<f32>> {
    let mut normals = vec![Vector3::zeros(); positions.len()];

    for MeshTriangle([i0, i1, i2]) in triangles {
        let (Some(v0), Some(v1), Some(v2)) =
            (positions.get(*i0), positions.get(*i1), positions.get(*i2))
        else {
            continue;
        };

        let face = (v2 - v0).cross(&(v1 - v0));
        normals[*i0] += face;
        normals[*i1] += face;
        normals[*i2] += face;
    }

    for normal in &mut normals {
        *normal = normal.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::zeros);
    }

    normals
}

// ─── Faces and vertex records ─────────────────────────────────────────────────

/// Triangle indices in the destination winding order.
pub fn flipped_faces(triangles: &[MeshTriangle]) -> Vec<[usize; 3]> {
    triangles.iter().map(MeshTriangle::flipped).collect()
}

/// Pair posed positions and generated normals with each vertex's UV.
pub fn build_vertex_records(
    vertices: &[SkinnedVertex],
    positions: &[Vector3<f32>],
    normals: &[Vector3<f32>],
) -> Vec<VertexRecord> {
    vertices
        .iter()
        .zip(positions)
        .zip(normals)
        .map(|((vertex, position), normal)| VertexRecord {
            position: (*position).into(),
            normal: (*normal).into(),
            tex_coord: vertex.tex_coord,
        })
        .collect()
}
