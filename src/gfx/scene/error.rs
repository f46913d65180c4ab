//! Errors raised while importing or assembling a scene.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("failed to import '{path}': {message}")]
    Import { path: PathBuf, message: String },

    #[error("imported scene has no root node")]
    MissingRoot,

    #[error("imported scene is incomplete")]
    Incomplete,

    #[error("node '{node}' references mesh {index}, but the scene has {count} meshes")]
    MeshIndexOutOfRange {
        node: String,
        index: usize,
        count: usize,
    },

    #[error("mesh '{mesh}' references material {index}, but the scene has {count} materials")]
    MaterialIndexOutOfRange {
        mesh: String,
        index: usize,
        count: usize,
    },

    #[error("mesh '{mesh}' has {actual} {attribute} for {expected} vertices")]
    AttributeLengthMismatch {
        mesh: String,
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("mesh '{mesh}' indexes vertex {index}, but it has {count} vertices")]
    VertexIndexOutOfRange {
        mesh: String,
        index: u32,
        count: usize,
    },
}
