//! Wavefront OBJ importer built on `tobj`.
//!
//! OBJ has no node hierarchy, so the imported scene is a root node with one
//! identity child per OBJ object. Import post-processing matches what the
//! renderer expects from any importer: triangulated faces, flipped V texture
//! coordinates, smooth normals when the file has none, and tangent space
//! when texture coordinates exist.

use std::path::Path;

use super::{
    error::SceneError,
    import::{ImportedMaterial, ImportedMesh, ImportedScene, MaterialSlot, SceneImporter, SceneNode},
};

#[derive(Debug, Clone, Copy)]
pub struct ObjImporter {
    /// Replace `v` with `1 - v` so images load top row first.
    pub flip_uvs: bool,
}

impl Default for ObjImporter {
    fn default() -> Self {
        Self { flip_uvs: true }
    }
}

impl SceneImporter for ObjImporter {
    fn import(&self, path: &Path) -> Result<ImportedScene, SceneError> {
        let (models, materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|err| SceneError::Import {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;

        let materials = materials.unwrap_or_else(|err| {
            log::debug!("No MTL data for {}: {}", path.display(), err);
            Vec::new()
        });

        let mut root = SceneNode::new(
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
        let mut meshes = Vec::with_capacity(models.len());
        for (index, model) in models.into_iter().enumerate() {
            let mesh = self.convert_mesh(model, materials.len());
            root = root.with_child(SceneNode::new(mesh.name.clone()).with_mesh(index));
            meshes.push(mesh);
        }

        Ok(ImportedScene::new(root)
            .with_meshes(meshes)
            .with_materials(materials.iter().map(convert_material).collect()))
    }
}

impl ObjImporter {
    fn convert_mesh(&self, model: tobj::Model, material_count: usize) -> ImportedMesh {
        let mesh = model.mesh;
        let positions: Vec<[f32; 3]> = mesh
            .positions
            .chunks_exact(3)
            .map(|p| [p[0], p[1], p[2]])
            .collect();

        let normals = if !mesh.normals.is_empty() && mesh.normals.len() == mesh.positions.len() {
            mesh.normals.chunks_exact(3).map(|n| [n[0], n[1], n[2]]).collect()
        } else {
            calculate_smooth_normals(&positions, &mesh.indices)
        };

        let tex_coords: Option<Vec<[f32; 2]>> =
            (mesh.texcoords.len() / 2 == positions.len() && !positions.is_empty()).then(|| {
                mesh.texcoords
                    .chunks_exact(2)
                    .map(|t| if self.flip_uvs { [t[0], 1.0 - t[1]] } else { [t[0], t[1]] })
                    .collect()
            });

        let mut imported = ImportedMesh::new(model.name, positions, mesh.indices).with_normals(normals);
        if let Some(tex_coords) = tex_coords {
            let (tangents, bitangents) =
                calculate_tangent_space(&imported.positions, &tex_coords, &imported.indices);
            imported = imported
                .with_tex_coords(tex_coords)
                .with_tangent_space(tangents, bitangents);
        }

        match mesh.material_id {
            Some(id) if id < material_count => imported.with_material(id),
            _ => imported,
        }
    }
}

fn convert_material(material: &tobj::Material) -> ImportedMaterial {
    let slots = [
        (MaterialSlot::Diffuse, &material.diffuse_texture),
        (MaterialSlot::Specular, &material.specular_texture),
        (MaterialSlot::Height, &material.normal_texture),
        (MaterialSlot::Ambient, &material.ambient_texture),
    ];

    slots
        .into_iter()
        .filter_map(|(slot, path)| path.as_ref().map(|path| (slot, path)))
        .fold(ImportedMaterial::new(material.name.clone()), |m, (slot, path)| {
            m.with_texture(slot, path.clone())
        })
}

fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn add_assign(target: &mut [f32; 3], v: [f32; 3]) {
    target[0] += v[0];
    target[1] += v[1];
    target[2] += v[2];
}

fn normalized_or(v: [f32; 3], fallback: [f32; 3]) -> [f32; 3] {
    let length = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if length > f32::EPSILON {
        [v[0] / length, v[1] / length, v[2] / length]
    } else {
        fallback
    }
}

fn triangles<'a>(indices: &'a [u32], vertex_count: usize) -> impl Iterator<Item = [usize; 3]> + 'a {
    indices
        .chunks_exact(3)
        .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize])
        .filter(move |t| t.iter().all(|&i| i < vertex_count))
}

/// Area-weighted vertex normals from the triangle list.
pub fn calculate_smooth_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut normals = vec![[0.0; 3]; positions.len()];

    for [i0, i1, i2] in triangles(indices, positions.len()) {
        let face_normal = cross(
            sub(positions[i1], positions[i0]),
            sub(positions[i2], positions[i0]),
        );
        for i in [i0, i1, i2] {
            add_assign(&mut normals[i], face_normal);
        }
    }

    normals
        .into_iter()
        .map(|n| normalized_or(n, [0.0, 1.0, 0.0]))
        .collect()
}

/// Per-vertex tangents and bitangents from positions and texture coordinates.
pub fn calculate_tangent_space(
    positions: &[[f32; 3]],
    tex_coords: &[[f32; 2]],
    indices: &[u32],
) -> (Vec<[f32; 3]>, Vec<[f32; 3]>) {
    let mut tangents = vec![[0.0; 3]; positions.len()];
    let mut bitangents = vec![[0.0; 3]; positions.len()];

    for [i0, i1, i2] in triangles(indices, positions.len()) {
        let edge1 = sub(positions[i1], positions[i0]);
        let edge2 = sub(positions[i2], positions[i0]);
        let (du1, dv1) = (tex_coords[i1][0] - tex_coords[i0][0], tex_coords[i1][1] - tex_coords[i0][1]);
        let (du2, dv2) = (tex_coords[i2][0] - tex_coords[i0][0], tex_coords[i2][1] - tex_coords[i0][1]);

        let det = du1 * dv2 - du2 * dv1;
        if det.abs() < f32::EPSILON {
            continue;
        }
        let r = 1.0 / det;
        let tangent = [
            (edge1[0] * dv2 - edge2[0] * dv1) * r,
            (edge1[1] * dv2 - edge2[1] * dv1) * r,
            (edge1[2] * dv2 - edge2[2] * dv1) * r,
        ];
        let bitangent = [
            (edge2[0] * du1 - edge1[0] * du2) * r,
            (edge2[1] * du1 - edge1[1] * du2) * r,
            (edge2[2] * du1 - edge1[2] * du2) * r,
        ];

        for i in [i0, i1, i2] {
            add_assign(&mut tangents[i], tangent);
            add_assign(&mut bitangents[i], bitangent);
        }
    }

    (
        tangents
            .into_iter()
            .map(|t| normalized_or(t, [1.0, 0.0, 0.0]))
            .collect(),
        bitangents
            .into_iter()
            .map(|b| normalized_or(b, [0.0, 0.0, 1.0]))
            .collect(),
    )
}
