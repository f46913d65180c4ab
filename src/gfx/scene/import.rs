//! # Importer Boundary
//!
//! Scene files are parsed by an external importer into the plain hierarchy
//! defined here. The loader only ever sees an [`ImportedScene`]: nodes with a
//! local transform, mesh references into a flat mesh table, materials that
//! name their texture paths per slot, and textures embedded in the file.
//!
//! Any format can be supported by implementing [`SceneImporter`]; the crate
//! ships an OBJ importer in [`super::obj`].

use std::path::Path;

use cgmath::{Matrix4, SquareMatrix};

use super::error::SceneError;

/// Parses a scene file into an [`ImportedScene`].
pub trait SceneImporter {
    fn import(&self, path: &Path) -> Result<ImportedScene, SceneError>;
}

/// A parsed scene, as handed over by an importer.
#[derive(Debug, Clone, Default)]
pub struct ImportedScene {
    pub root: Option<SceneNode>,
    pub meshes: Vec<ImportedMesh>,
    pub materials: Vec<ImportedMaterial>,
    pub embedded_textures: Vec<EmbeddedTexture>,
    /// Set by importers that could only partially read the file.
    pub incomplete: bool,
}

impl ImportedScene {
    pub fn new(root: SceneNode) -> Self {
        Self {
            root: Some(root),
            ..Default::default()
        }
    }

    pub fn with_meshes(mut self, meshes: Vec<ImportedMesh>) -> Self {
        self.meshes = meshes;
        self
    }

    pub fn with_materials(mut self, materials: Vec<ImportedMaterial>) -> Self {
        self.materials = materials;
        self
    }

    pub fn with_embedded_textures(mut self, textures: Vec<EmbeddedTexture>) -> Self {
        self.embedded_textures = textures;
        self
    }
}

/// One node of the scene hierarchy.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    /// Transform relative to the parent node.
    pub transform: Matrix4<f32>,
    /// Indices into [`ImportedScene::meshes`].
    pub meshes: Vec<usize>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Matrix4::identity(),
            meshes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Matrix4<f32>) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_mesh(mut self, mesh_index: usize) -> Self {
        self.meshes.push(mesh_index);
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }
}

/// Raw per-vertex attribute streams of one triangle mesh.
///
/// Only positions are required. Optional streams, when present, must hold
/// one entry per position.
#[derive(Debug, Clone, Default)]
pub struct ImportedMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub tex_coords: Option<Vec<[f32; 2]>>,
    pub tangents: Option<Vec<[f32; 3]>>,
    pub bitangents: Option<Vec<[f32; 3]>>,
    /// Triangle list indices, local to this mesh.
    pub indices: Vec<u32>,
    /// Index into [`ImportedScene::materials`].
    pub material: Option<usize>,
}

impl ImportedMesh {
    pub fn new(name: impl Into<String>, positions: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            positions,
            indices,
            ..Default::default()
        }
    }

    pub fn with_normals(mut self, normals: Vec<[f32; 3]>) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn with_tex_coords(mut self, tex_coords: Vec<[f32; 2]>) -> Self {
        self.tex_coords = Some(tex_coords);
        self
    }

    pub fn with_tangent_space(mut self, tangents: Vec<[f32; 3]>, bitangents: Vec<[f32; 3]>) -> Self {
        self.tangents = Some(tangents);
        self.bitangents = Some(bitangents);
        self
    }

    pub fn with_material(mut self, material: usize) -> Self {
        self.material = Some(material);
        self
    }
}

/// Texture slot a material assigns a path to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialSlot {
    Diffuse,
    Specular,
    Height,
    Ambient,
}

#[derive(Debug, Clone, Default)]
pub struct ImportedMaterial {
    pub name: String,
    /// Texture paths in import order, tagged by slot.
    pub textures: Vec<(MaterialSlot, String)>,
}

impl ImportedMaterial {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            textures: Vec::new(),
        }
    }

    pub fn with_texture(mut self, slot: MaterialSlot, path: impl Into<String>) -> Self {
        self.textures.push((slot, path.into()));
        self
    }

    /// Texture paths assigned to `slot`, in import order.
    pub fn textures(&self, slot: MaterialSlot) -> impl Iterator<Item = &str> {
        self.textures
            .iter()
            .filter(move |(s, _)| *s == slot)
            .map(|(_, path)| path.as_str())
    }
}

/// Texture data stored inside the scene file itself.
///
/// A `height` of zero marks compressed data (PNG, JPEG, ...) whose byte
/// length is `width`; anything else is an uncompressed texel array.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedTexture {
    pub width: u32,
    pub height: u32,
    pub format_hint: String,
    pub data: Vec<u8>,
}

impl EmbeddedTexture {
    pub fn compressed(format_hint: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            width: data.len() as u32,
            height: 0,
            format_hint: format_hint.into(),
            data,
        }
    }

    pub fn is_compressed(&self) -> bool {
        self.height == 0
    }
}
