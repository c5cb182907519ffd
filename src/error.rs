use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("joint {joint} ('{name}') references parent {parent}, which is not defined before it")]
    InvalidParent {
        joint: usize,
        name: String,
        parent: usize,
    },

    #[error("animation has {actual} joints but the skeleton has {expected}")]
    JointCountMismatch { expected: usize, actual: usize },

    #[error("frame {frame}, joint {joint}: expected '{expected}', found '{actual}'")]
    JointMismatch {
        frame: usize,
        joint: usize,
        expected: String,
        actual: String,
    },

    #[error("frame rate must be positive (got {0})")]
    InvalidFrameRate(u32),

    #[error(
        "resampling {frames} frames from {source_fps} to {target_fps} fps would read source frame {required}"
    )]
    ResampleOutOfRange {
        frames: usize,
        source_fps: u32,
        target_fps: u32,
        required: usize,
    },

    #[error("vertex {vertex} references bone {bone} (skeleton has {joint_count} joints)")]
    InvalidBoneIndex {
        vertex: usize,
        bone: usize,
        joint_count: usize,
    },

    #[error("triangle {triangle} references vertex {vertex} (mesh has {vertex_count} vertices)")]
    InvalidTriangle {
        triangle: usize,
        vertex: usize,
        vertex_count: usize,
    },

    #[error("animation has {frames} frames but {boxes} bounding boxes")]
    BoundingBoxCountMismatch { frames: usize, boxes: usize },

    #[error("animation has no frames")]
    EmptyClip,
}

pub type ConvertResult<T> = std::result::Result<T, ConvertError>;
