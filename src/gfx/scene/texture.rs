//! Texture records referenced by loaded meshes.
//!
//! Decoding is left to the renderer; a [`Texture`] holds the encoded bytes
//! read from disk or from the scene file. Textures are shared between meshes
//! of one model through `Arc`, keyed by their path string.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use super::import::{ImportedScene, MaterialSlot};

/// Shader role of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Diffuse,
    Specular,
    Normal,
    Height,
}

impl TextureKind {
    /// Base uniform name the shader binds this kind to.
    pub fn uniform_name(self) -> &'static str {
        match self {
            TextureKind::Diffuse => "texture_diffuse",
            TextureKind::Specular => "texture_specular",
            TextureKind::Normal => "texture_normal",
            TextureKind::Height => "texture_height",
        }
    }

    /// Kind assigned to textures found in an importer material slot.
    ///
    /// Importers place normal maps in the height slot and height maps in
    /// the ambient slot.
    pub fn from_slot(slot: MaterialSlot) -> Self {
        match slot {
            MaterialSlot::Diffuse => TextureKind::Diffuse,
            MaterialSlot::Specular => TextureKind::Specular,
            MaterialSlot::Height => TextureKind::Normal,
            MaterialSlot::Ambient => TextureKind::Height,
        }
    }

    /// Whether uniforms of this kind are numbered per mesh.
    pub fn is_numbered(self) -> bool {
        matches!(self, TextureKind::Diffuse | TextureKind::Specular)
    }
}

/// Where a texture's bytes came from.
#[derive(Debug, Clone, PartialEq)]
pub enum TextureSource {
    File(PathBuf),
    Embedded { index: usize, format_hint: String },
}

#[derive(Debug, Clone)]
pub struct Texture {
    pub kind: TextureKind,
    /// Path exactly as the material spelled it; the de-duplication key.
    pub path: String,
    pub source: TextureSource,
    /// Encoded image bytes.
    pub data: Vec<u8>,
    pub gamma_correction: bool,
}

/// Resolves one material texture path into a shared texture record.
///
/// Paths of the form `*N` refer to the N-th embedded texture of `scene`;
/// everything else is read from `directory/path`. Failures are logged and
/// yield `None` so the mesh is built without that texture.
pub fn resolve(
    path: &str,
    kind: TextureKind,
    directory: &Path,
    scene: &ImportedScene,
    gamma_correction: bool,
) -> Option<Arc<Texture>> {
    if let Some(index) = path.strip_prefix('*') {
        return resolve_embedded(path, index, kind, scene, gamma_correction);
    }

    let file = directory.join(path);
    log::info!("Loading texture: {}", file.display());
    match std::fs::read(&file) {
        Ok(data) => Some(Arc::new(Texture {
            kind,
            path: path.to_string(),
            source: TextureSource::File(file),
            data,
            gamma_correction,
        })),
        Err(err) => {
            log::error!("Texture failed to load at path {}: {}", file.display(), err);
            None
        }
    }
}

fn resolve_embedded(
    path: &str,
    index: &str,
    kind: TextureKind,
    scene: &ImportedScene,
    gamma_correction: bool,
) -> Option<Arc<Texture>> {
    let Some((index, embedded)) = index
        .parse::<usize>()
        .ok()
        .and_then(|i| scene.embedded_textures.get(i).map(|t| (i, t)))
    else {
        log::error!("Embedded texture {} not found in scene", path);
        return None;
    };

    if !embedded.is_compressed() {
        log::warn!("Uncompressed embedded texture {} is not supported", path);
        return None;
    }

    log::info!("Loading embedded texture: {}", path);
    Some(Arc::new(Texture {
        kind,
        path: path.to_string(),
        source: TextureSource::Embedded {
            index,
            format_hint: embedded.format_hint.clone(),
        },
        data: embedded.data.clone(),
        gamma_correction,
    }))
}

/// Shader uniform names for a mesh's textures, in draw order.
///
/// Diffuse and specular maps are numbered from 1 (`texture_diffuse1`,
/// `texture_diffuse2`, ...); other kinds use the bare name.
pub fn uniform_names(textures: &[Arc<Texture>]) -> Vec<String> {
    let mut diffuse = 0;
    let mut specular = 0;
    textures
        .iter()
        .map(|texture| {
            let base = texture.kind.uniform_name();
            match texture.kind {
                TextureKind::Diffuse => {
                    diffuse += 1;
                    format!("{base}{diffuse}")
                }
                TextureKind::Specular => {
                    specular += 1;
                    format!("{base}{specular}")
                }
                TextureKind::Normal | TextureKind::Height => base.to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::import::{EmbeddedTexture, SceneNode};

    fn texture(kind: TextureKind, path: &str) -> Arc<Texture> {
        Arc::new(Texture {
            kind,
            path: path.to_string(),
            source: TextureSource::File(PathBuf::from(path)),
            data: Vec::new(),
            gamma_correction: false,
        })
    }

    #[test]
    fn test_slot_mapping() {
        assert_eq!(TextureKind::from_slot(MaterialSlot::Height), TextureKind::Normal);
        assert_eq!(TextureKind::from_slot(MaterialSlot::Ambient), TextureKind::Height);
        assert_eq!(TextureKind::from_slot(MaterialSlot::Height).uniform_name(), "texture_normal");
    }

    #[test]
    fn test_uniform_numbering() {
        let textures = vec![
            texture(TextureKind::Diffuse, "a.png"),
            texture(TextureKind::Specular, "b.png"),
            texture(TextureKind::Diffuse, "c.png"),
            texture(TextureKind::Normal, "d.png"),
        ];
        assert_eq!(
            uniform_names(&textures),
            vec![
                "texture_diffuse1",
                "texture_specular1",
                "texture_diffuse2",
                "texture_normal"
            ]
        );
    }

    #[test]
    fn test_resolve_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("wall.png"), [0x89, b'P', b'N', b'G']).unwrap();
        let scene = ImportedScene::new(SceneNode::new("root"));

        let resolved = resolve("wall.png", TextureKind::Diffuse, dir.path(), &scene, false).unwrap();
        assert_eq!(resolved.path, "wall.png");
        assert_eq!(resolved.data, vec![0x89, b'P', b'N', b'G']);
        assert_eq!(resolved.source, TextureSource::File(dir.path().join("wall.png")));
    }

    #[test]
    fn test_missing_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let scene = ImportedScene::new(SceneNode::new("root"));
        assert!(resolve("missing.png", TextureKind::Diffuse, dir.path(), &scene, false).is_none());
    }

    #[test]
    fn test_resolve_embedded() {
        let scene = ImportedScene::new(SceneNode::new("root")).with_embedded_textures(vec![
            EmbeddedTexture::compressed("png", vec![1, 2, 3]),
            EmbeddedTexture {
                width: 2,
                height: 2,
                format_hint: "rgba8888".to_string(),
                data: vec![0; 16],
            },
        ]);

        let compressed = resolve("*0", TextureKind::Specular, Path::new("."), &scene, false).unwrap();
        assert_eq!(compressed.data, vec![1, 2, 3]);
        assert!(matches!(compressed.source, TextureSource::Embedded { index: 0, .. }));

        assert!(resolve("*1", TextureKind::Diffuse, Path::new("."), &scene, false).is_none());
        assert!(resolve("*7", TextureKind::Diffuse, Path::new("."), &scene, false).is_none());
        assert!(resolve("*x", TextureKind::Diffuse, Path::new("."), &scene, false).is_none());
    }
}
