//! # Scene Loading
//!
//! [`ModelLoader`] turns an [`ImportedScene`] into a [`Model`]. The scene
//! hierarchy is walked depth-first, pre-order. Each node's accumulated
//! transform is `parent × local`, so child transforms are expressed in their
//! parent's space, and every mesh a node references becomes a [`MeshRecord`]
//! carrying that node's accumulated transform.
//!
//! With [`LoadOptions::flatten`] set, every mesh is also appended to the
//! model's [`FlattenedBuffer`] in the same order the records are created.

use std::{path::Path, sync::Arc};

use cgmath::{Matrix4, SquareMatrix};

use super::{
    error::SceneError,
    flattened::FlattenedBuffer,
    import::{ImportedMesh, ImportedScene, MaterialSlot, SceneImporter, SceneNode},
    mesh::MeshRecord,
    model::Model,
    texture::{self, Texture, TextureKind},
    vertex::{Vertex, DEFAULT_BITANGENT, DEFAULT_NORMAL, DEFAULT_TANGENT, DEFAULT_TEX_COORDS},
};

/// Material slots in the order their textures are attached to a mesh.
const TEXTURE_SLOTS: [MaterialSlot; 4] = [
    MaterialSlot::Diffuse,
    MaterialSlot::Specular,
    MaterialSlot::Height,
    MaterialSlot::Ambient,
];

/// Model loading options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Build the flattened vertex and index buffers for deformable bodies.
    pub flatten: bool,
    /// Mark loaded textures as sRGB.
    pub gamma_correction: bool,
}

impl LoadOptions {
    pub fn with_flatten(mut self, flatten: bool) -> Self {
        self.flatten = flatten;
        self
    }

    pub fn with_gamma_correction(mut self, gamma_correction: bool) -> Self {
        self.gamma_correction = gamma_correction;
        self
    }
}

pub struct ModelLoader {
    options: LoadOptions,
}

impl ModelLoader {
    pub fn new(options: LoadOptions) -> Self {
        Self { options }
    }

    /// Imports `path` and builds a model from it.
    pub fn load(&self, importer: &impl SceneImporter, path: &Path) -> Result<Model, SceneError> {
        let scene = importer.import(path)?;
        let directory = path.parent().unwrap_or_else(|| Path::new(""));
        let model = self.build(&scene, directory)?;
        log::info!(
            "Loaded model {} ({} meshes, {} textures)",
            path.display(),
            model.meshes.len(),
            model.textures_loaded.len()
        );
        Ok(model)
    }

    /// Builds a model from an already imported scene.
    ///
    /// `directory` is where external texture paths are resolved.
    pub fn build(&self, scene: &ImportedScene, directory: &Path) -> Result<Model, SceneError> {
        if scene.incomplete {
            return Err(SceneError::Incomplete);
        }
        let root = scene.root.as_ref().ok_or(SceneError::MissingRoot)?;

        let mut model = Model {
            directory: directory.to_path_buf(),
            gamma_correction: self.options.gamma_correction,
            flattened: self.options.flatten.then(FlattenedBuffer::new),
            ..Model::default()
        };

        self.process_node(root, Matrix4::identity(), scene, &mut model)?;
        Ok(model)
    }

    fn process_node(
        &self,
        node: &SceneNode,
        parent_transform: Matrix4<f32>,
        scene: &ImportedScene,
        model: &mut Model,
    ) -> Result<(), SceneError> {
        let accumulated = parent_transform * node.transform;

        for &mesh_index in &node.meshes {
            let mesh = scene
                .meshes
                .get(mesh_index)
                .ok_or_else(|| SceneError::MeshIndexOutOfRange {
                    node: node.name.clone(),
                    index: mesh_index,
                    count: scene.meshes.len(),
                })?;
            let record = self.process_mesh(mesh, scene, model)?.with_transform(accumulated);
            model.meshes.push(record);
        }

        for child in &node.children {
            self.process_node(child, accumulated, scene, model)?;
        }

        Ok(())
    }

    fn process_mesh(
        &self,
        mesh: &ImportedMesh,
        scene: &ImportedScene,
        model: &mut Model,
    ) -> Result<MeshRecord, SceneError> {
        let vertices = assemble_vertices(mesh)?;
        check_indices(mesh)?;
        let textures = self.load_material_textures(mesh, scene, model)?;

        if let Some(flattened) = model.flattened.as_mut() {
            flattened.append_mesh(&vertices, &mesh.indices);
        }

        Ok(MeshRecord::new(
            mesh.name.clone(),
            vertices,
            mesh.indices.clone(),
            textures,
        ))
    }

    fn load_material_textures(
        &self,
        mesh: &ImportedMesh,
        scene: &ImportedScene,
        model: &mut Model,
    ) -> Result<Vec<Arc<Texture>>, SceneError> {
        let Some(material_index) = mesh.material else {
            return Ok(Vec::new());
        };
        let material = scene.materials.get(material_index).ok_or_else(|| {
            SceneError::MaterialIndexOutOfRange {
                mesh: mesh.name.clone(),
                index: material_index,
                count: scene.materials.len(),
            }
        })?;

        let mut textures = Vec::new();
        for slot in TEXTURE_SLOTS {
            let kind = TextureKind::from_slot(slot);
            for path in material.textures(slot) {
                log::debug!("Texture path: {}", path);

                // Textures are unique per model by path, whatever their kind
                if let Some(loaded) = model.textures_loaded.iter().find(|t| t.path == path) {
                    textures.push(Arc::clone(loaded));
                    continue;
                }

                if let Some(loaded) = texture::resolve(
                    path,
                    kind,
                    &model.directory,
                    scene,
                    self.options.gamma_correction,
                ) {
                    model.textures_loaded.push(Arc::clone(&loaded));
                    textures.push(loaded);
                }
            }
        }

        Ok(textures)
    }
}

/// Interleaves a mesh's attribute streams, defaulting the missing ones.
fn assemble_vertices(mesh: &ImportedMesh) -> Result<Vec<Vertex>, SceneError> {
    let count = mesh.positions.len();
    check_len(mesh, "normals", mesh.normals.as_deref())?;
    check_len(mesh, "texture coordinates", mesh.tex_coords.as_deref())?;
    check_len(mesh, "tangents", mesh.tangents.as_deref())?;
    check_len(mesh, "bitangents", mesh.bitangents.as_deref())?;

    let attribute = |stream: &Option<Vec<[f32; 3]>>, i: usize, default: [f32; 3]| {
        stream.as_ref().map_or(default, |values| values[i])
    };

    Ok((0..count)
        .map(|i| Vertex {
            position: mesh.positions[i],
            normal: attribute(&mesh.normals, i, DEFAULT_NORMAL),
            tex_coords: mesh
                .tex_coords
                .as_ref()
                .map_or(DEFAULT_TEX_COORDS, |values| values[i]),
            tangent: attribute(&mesh.tangents, i, DEFAULT_TANGENT),
            bitangent: attribute(&mesh.bitangents, i, DEFAULT_BITANGENT),
        })
        .collect())
}

fn check_len<T>(mesh: &ImportedMesh, attribute: &'static str, stream: Option<&[T]>) -> Result<(), SceneError> {
    match stream {
        Some(values) if values.len() != mesh.positions.len() => {
            Err(SceneError::AttributeLengthMismatch {
                mesh: mesh.name.clone(),
                attribute,
                expected: mesh.positions.len(),
                actual: values.len(),
            })
        }
        _ => Ok(()),
    }
}

/// Rejects indices that would reach past the mesh's own vertices.
fn check_indices(mesh: &ImportedMesh) -> Result<(), SceneError> {
    let count = mesh.positions.len();
    match mesh.indices.iter().find(|&&index| index as usize >= count) {
        Some(&index) => Err(SceneError::VertexIndexOutOfRange {
            mesh: mesh.name.clone(),
            index,
            count,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::{
        import::ImportedMaterial,
        vertex::FLOATS_PER_VERTEX,
    };
    use cgmath::Vector3;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn triangle(name: &str) -> ImportedMesh {
        ImportedMesh::new(
            name,
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![0, 1, 2],
        )
    }

    fn translation(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::from_translation(Vector3::new(x, y, z))
    }

    fn build(scene: &ImportedScene, options: LoadOptions) -> Model {
        ModelLoader::new(options).build(scene, Path::new("")).unwrap()
    }

    #[test]
    fn test_three_level_transform_composition() {
        let scene = ImportedScene::new(
            SceneNode::new("a").with_transform(translation(1.0, 0.0, 0.0)).with_child(
                SceneNode::new("b").with_transform(translation(0.0, 2.0, 0.0)).with_child(
                    SceneNode::new("c")
                        .with_transform(translation(0.0, 0.0, 3.0))
                        .with_mesh(0),
                ),
            ),
        )
        .with_meshes(vec![triangle("leaf")]);

        let model = build(&scene, LoadOptions::default());
        assert_eq!(model.meshes.len(), 1);
        assert_eq!(model.meshes[0].transform.w.truncate(), Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_parent_transform_applies_to_child_space() {
        // Parent scale must scale the child's translation
        let scene = ImportedScene::new(
            SceneNode::new("root")
                .with_transform(Matrix4::from_scale(2.0))
                .with_child(SceneNode::new("child").with_transform(translation(1.0, 0.0, 0.0)).with_mesh(0)),
        )
        .with_meshes(vec![triangle("t")]);

        let model = build(&scene, LoadOptions::default());
        assert_eq!(model.meshes[0].transform.w.truncate(), Vector3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_missing_attributes_use_defaults() {
        let scene = ImportedScene::new(SceneNode::new("root").with_mesh(0))
            .with_meshes(vec![triangle("bare")]);

        let model = build(&scene, LoadOptions::default());
        for vertex in &model.meshes[0].vertices {
            assert_eq!(vertex.normal, [0.0, 1.0, 0.0]);
            assert_eq!(vertex.tex_coords, [0.0, 0.0]);
            assert_eq!(vertex.tangent, [1.0, 0.0, 0.0]);
            assert_eq!(vertex.bitangent, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn test_present_attributes_are_kept() {
        let mesh = triangle("full")
            .with_normals(vec![[0.0, 0.0, 1.0]; 3])
            .with_tex_coords(vec![[0.5, 0.25]; 3])
            .with_tangent_space(vec![[0.0, 1.0, 0.0]; 3], vec![[1.0, 0.0, 0.0]; 3]);
        let scene = ImportedScene::new(SceneNode::new("root").with_mesh(0)).with_meshes(vec![mesh]);

        let model = build(&scene, LoadOptions::default());
        let vertex = model.meshes[0].vertices[1];
        assert_eq!(vertex.position, [1.0, 0.0, 0.0]);
        assert_eq!(vertex.normal, [0.0, 0.0, 1.0]);
        assert_eq!(vertex.tex_coords, [0.5, 0.25]);
        assert_eq!(vertex.tangent, [0.0, 1.0, 0.0]);
        assert_eq!(vertex.bitangent, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_two_node_scene_end_to_end() {
        let scene = ImportedScene::new(
            SceneNode::new("root")
                .with_mesh(0)
                .with_child(SceneNode::new("child").with_transform(translation(1.0, 0.0, 0.0)).with_mesh(1)),
        )
        .with_meshes(vec![triangle("first"), triangle("second")]);

        let model = build(&scene, LoadOptions::default().with_flatten(true));

        assert_eq!(model.meshes.len(), 2);
        assert_eq!(model.meshes[0].transform.w.truncate(), Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(model.meshes[1].transform.w.truncate(), Vector3::new(1.0, 0.0, 0.0));

        let flattened = model.flattened.as_ref().unwrap();
        assert_eq!(flattened.vertices().len(), 2 * 3 * FLOATS_PER_VERTEX);
        assert_eq!(flattened.indices(), &[0, 1, 2, 3, 4, 5]);
        assert_eq!(flattened.ranges()[1].vertex_offset, 3);
    }

    #[test]
    fn test_flattened_offsets_stay_in_mesh_range() {
        let mut rng = StdRng::seed_from_u64(0x7e55e7a);

        for _ in 0..20 {
            let mesh_count = rng.random_range(1..8);
            let meshes: Vec<ImportedMesh> = (0..mesh_count)
                .map(|m| {
                    let vertex_count = rng.random_range(3..40u32);
                    let positions = (0..vertex_count)
                        .map(|_| [rng.random(), rng.random(), rng.random()])
                        .collect();
                    let indices = (0..rng.random_range(1..20) * 3)
                        .map(|_| rng.random_range(0..vertex_count))
                        .collect();
                    ImportedMesh::new(format!("mesh{m}"), positions, indices)
                })
                .collect();

            // Chain the meshes through a random-depth hierarchy
            let mut node = SceneNode::new("leaf").with_mesh(mesh_count - 1);
            for m in (0..mesh_count - 1).rev() {
                node = if rng.random_bool(0.5) {
                    SceneNode::new(format!("n{m}")).with_mesh(m).with_child(node)
                } else {
                    SceneNode::new(format!("n{m}")).with_child(node).with_mesh(m)
                };
            }
            let scene = ImportedScene::new(node).with_meshes(meshes);

            let model = build(&scene, LoadOptions::default().with_flatten(true));
            let flattened = model.flattened.as_ref().unwrap();
            assert_eq!(flattened.ranges().len(), model.meshes.len());

            for (record, range) in model.meshes.iter().zip(flattened.ranges()) {
                assert_eq!(range.vertex_count as usize, record.vertices.len());
                let indices = &flattened.indices()
                    [range.index_offset as usize..(range.index_offset + range.index_count) as usize];
                for (&flat, &local) in indices.iter().zip(&record.indices) {
                    assert!(range.vertices().contains(&(flat as usize)));
                    assert_eq!(flat, local + range.vertex_offset);
                }
            }
            assert_eq!(
                flattened.vertex_count(),
                model.meshes.iter().map(|m| m.vertices.len()).sum::<usize>()
            );
        }
    }

    #[test]
    fn test_flattened_buffer_is_optional() {
        let scene = ImportedScene::new(SceneNode::new("root").with_mesh(0))
            .with_meshes(vec![triangle("t")]);
        assert!(build(&scene, LoadOptions::default()).flattened.is_none());
    }

    #[test]
    fn test_shared_texture_loaded_once() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("shared.png"), b"png").unwrap();

        let scene = ImportedScene::new(
            SceneNode::new("root")
                .with_mesh(0)
                .with_child(SceneNode::new("child").with_mesh(1)),
        )
        .with_meshes(vec![triangle("a").with_material(0), triangle("b").with_material(1)])
        .with_materials(vec![
            ImportedMaterial::new("m0").with_texture(MaterialSlot::Diffuse, "shared.png"),
            ImportedMaterial::new("m1").with_texture(MaterialSlot::Diffuse, "shared.png"),
        ]);

        let model = ModelLoader::new(LoadOptions::default())
            .build(&scene, dir.path())
            .unwrap();

        assert_eq!(model.textures_loaded.len(), 1);
        assert!(Arc::ptr_eq(&model.meshes[0].textures[0], &model.meshes[1].textures[0]));
        assert!(Arc::ptr_eq(&model.meshes[0].textures[0], &model.textures_loaded[0]));
    }

    #[test]
    fn test_texture_order_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["diffuse.png", "spec.png", "normal.png"] {
            std::fs::write(dir.path().join(name), name.as_bytes()).unwrap();
        }

        let material = ImportedMaterial::new("m")
            .with_texture(MaterialSlot::Height, "normal.png")
            .with_texture(MaterialSlot::Specular, "spec.png")
            .with_texture(MaterialSlot::Diffuse, "missing.png")
            .with_texture(MaterialSlot::Diffuse, "diffuse.png");
        let scene = ImportedScene::new(SceneNode::new("root").with_mesh(0))
            .with_meshes(vec![triangle("t").with_material(0)])
            .with_materials(vec![material]);

        let model = ModelLoader::new(LoadOptions::default())
            .build(&scene, dir.path())
            .unwrap();

        let kinds: Vec<TextureKind> = model.meshes[0].textures.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![TextureKind::Diffuse, TextureKind::Specular, TextureKind::Normal]
        );
        assert_eq!(model.textures_loaded.len(), 3);
    }

    #[test]
    fn test_structural_failures() {
        let loader = ModelLoader::new(LoadOptions::default());

        let rootless = ImportedScene::default();
        assert!(matches!(
            loader.build(&rootless, Path::new("")),
            Err(SceneError::MissingRoot)
        ));

        let mut incomplete = ImportedScene::new(SceneNode::new("root"));
        incomplete.incomplete = true;
        assert!(matches!(
            loader.build(&incomplete, Path::new("")),
            Err(SceneError::Incomplete)
        ));

        let dangling = ImportedScene::new(SceneNode::new("root").with_mesh(4));
        assert!(matches!(
            loader.build(&dangling, Path::new("")),
            Err(SceneError::MeshIndexOutOfRange { index: 4, .. })
        ));

        let short_normals = ImportedScene::new(SceneNode::new("root").with_mesh(0))
            .with_meshes(vec![triangle("t").with_normals(vec![[0.0, 1.0, 0.0]])]);
        assert!(matches!(
            loader.build(&short_normals, Path::new("")),
            Err(SceneError::AttributeLengthMismatch { actual: 1, expected: 3, .. })
        ));
    }

    #[test]
    fn test_vertex_index_out_of_range() {
        let loader = ModelLoader::new(LoadOptions::default().with_flatten(true));
        let mesh_with_indices = |name: &str, indices: Vec<u32>| {
            ImportedMesh::new(
                name,
                vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                indices,
            )
        };

        // Index 5 would land in the second mesh once rebased
        let into_neighbour = ImportedScene::new(SceneNode::new("root").with_mesh(0).with_mesh(1))
            .with_meshes(vec![mesh_with_indices("a", vec![0, 1, 5]), triangle("b")]);
        assert!(matches!(
            loader.build(&into_neighbour, Path::new("")),
            Err(SceneError::VertexIndexOutOfRange { index: 5, count: 3, .. })
        ));

        let overflowing = ImportedScene::new(SceneNode::new("root").with_mesh(0).with_mesh(1))
            .with_meshes(vec![triangle("a"), mesh_with_indices("b", vec![0, 1, u32::MAX])]);
        assert!(matches!(
            loader.build(&overflowing, Path::new("")),
            Err(SceneError::VertexIndexOutOfRange { index: u32::MAX, .. })
        ));
    }
}
