//! # Scene Loading Module
//!
//! Turns hierarchical scene files into drawable meshes.
//!
//! ## Key Components
//!
//! - [`ModelLoader`] - Depth-first traversal composing node transforms
//! - [`Model`] - A loaded asset with its meshes, shared textures and
//!   optional flattened buffers
//! - [`MeshRecord`] - One mesh with its accumulated transform and GPU buffers
//! - [`SceneImporter`] - Boundary to file-format parsers, with [`ObjImporter`]
//!   provided
//!
//! ## Usage
//!
//! ```no_run
//! use tessera::gfx::scene::{LoadOptions, Model};
//!
//! let model = Model::from_path("assets/crate.obj", LoadOptions::default().with_flatten(true));
//! println!("{} meshes", model.meshes.len());
//! ```

pub mod error;
pub mod flattened;
pub mod import;
pub mod loader;
pub mod mesh;
pub mod model;
pub mod obj;
pub mod texture;
pub mod vertex;

pub use error::SceneError;
pub use flattened::{FlattenedBuffer, MeshRange};
pub use import::{
    EmbeddedTexture, ImportedMaterial, ImportedMesh, ImportedScene, MaterialSlot, SceneImporter,
    SceneNode,
};
pub use loader::{LoadOptions, ModelLoader};
pub use mesh::{DrawMesh, MeshRecord, MeshUniform};
pub use model::Model;
pub use obj::ObjImporter;
pub use texture::{Texture, TextureKind, TextureSource};
pub use vertex::{Vertex, FLOATS_PER_VERTEX};
