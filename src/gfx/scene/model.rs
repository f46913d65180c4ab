use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use cgmath::{Deg, InnerSpace, Matrix4, Quaternion, SquareMatrix, Vector3};

use super::{
    error::SceneError,
    flattened::FlattenedBuffer,
    loader::{LoadOptions, ModelLoader},
    mesh::{MeshRecord, MeshUniform},
    obj::ObjImporter,
    texture::Texture,
};

/// A loaded asset: its meshes, the textures they share, and the model-level
/// transform and material scalars applied when drawing.
pub struct Model {
    pub meshes: Vec<MeshRecord>,
    /// Every texture loaded for this model, unique by path.
    pub textures_loaded: Vec<Arc<Texture>>,
    /// Present when the model was loaded with flattening enabled.
    pub flattened: Option<FlattenedBuffer>,
    /// Directory texture paths are resolved against.
    pub directory: PathBuf,
    pub transform: Matrix4<f32>,
    pub ambient: Vector3<f32>,
    pub shininess: f32,
    pub gamma_correction: bool,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            meshes: Vec::new(),
            textures_loaded: Vec::new(),
            flattened: None,
            directory: PathBuf::new(),
            transform: Matrix4::identity(),
            ambient: Vector3::new(0.2, 0.2, 0.2),
            shininess: 32.0,
            gamma_correction: false,
        }
    }
}

impl Model {
    /// Loads an OBJ file.
    ///
    /// Import failures are logged and produce an empty model; check
    /// [`Model::is_empty`] or use [`Model::load`] to get the error.
    pub fn from_path(path: impl AsRef<Path>, options: LoadOptions) -> Self {
        let path = path.as_ref();
        match Self::load(path, options) {
            Ok(model) => model,
            Err(err) => {
                log::error!("Failed to load model {}: {}", path.display(), err);
                Self {
                    gamma_correction: options.gamma_correction,
                    ..Self::default()
                }
            }
        }
    }

    /// Loads an OBJ file, returning the import error on failure.
    pub fn load(path: impl AsRef<Path>, options: LoadOptions) -> Result<Self, SceneError> {
        ModelLoader::new(options).load(&ObjImporter::default(), path.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Replaces the translation, keeping rotation and scale.
    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.transform.w = position.extend(1.0);
    }

    pub fn position(&self) -> Vector3<f32> {
        self.transform.w.truncate()
    }

    /// Replaces the rotation with `angle` about `axis`, keeping the translation.
    pub fn set_rotation_axis_angle(&mut self, angle: Deg<f32>, axis: Vector3<f32>) {
        let translation = self.transform.w;
        self.transform = Matrix4::from_axis_angle(axis.normalize(), angle);
        self.transform.w = translation;
    }

    /// Replaces the rotation with `rotation`, keeping the translation.
    pub fn set_rotation(&mut self, rotation: Quaternion<f32>) {
        let translation = self.transform.w;
        self.transform = Matrix4::from(rotation);
        self.transform.w = translation;
    }

    pub fn set_transform(&mut self, transform: Matrix4<f32>) {
        self.transform = transform;
    }

    /// Resets the model transform and every mesh transform to identity.
    ///
    /// For geometry whose vertices are already in world space, such as a
    /// deformable body's output.
    pub fn reset_transforms(&mut self) {
        self.transform = Matrix4::identity();
        for mesh in &mut self.meshes {
            mesh.transform = Matrix4::identity();
        }
    }

    /// Final transform of the `index`-th mesh: model transform, then mesh transform.
    pub fn mesh_transform(&self, index: usize) -> Option<Matrix4<f32>> {
        self.meshes
            .get(index)
            .map(|mesh| self.transform * mesh.transform)
    }

    fn mesh_uniform(&self, mesh: &MeshRecord) -> MeshUniform {
        MeshUniform::new(self.transform * mesh.transform, self.ambient, self.shininess)
    }

    pub fn init_gpu_resources(&mut self, device: &wgpu::Device, layout: &wgpu::BindGroupLayout) {
        let uniforms: Vec<MeshUniform> = self
            .meshes
            .iter()
            .map(|mesh| self.mesh_uniform(mesh))
            .collect();
        for (mesh, uniform) in self.meshes.iter_mut().zip(&uniforms) {
            mesh.init_gpu_resources(device, layout, uniform);
        }
    }

    /// Pushes the current model transform and material scalars to every mesh.
    pub fn update_uniforms(&self, queue: &wgpu::Queue) {
        for mesh in &self.meshes {
            mesh.update_uniform(queue, &self.mesh_uniform(mesh));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::vertex::Vertex;
    use cgmath::{Rotation3, Transform};

    fn single_mesh_model(mesh_transform: Matrix4<f32>) -> Model {
        Model {
            meshes: vec![MeshRecord::new("m", vec![Vertex::at([0.0; 3])], vec![0, 0, 0], vec![])
                .with_transform(mesh_transform)],
            ..Model::default()
        }
    }

    #[test]
    fn test_defaults() {
        let model = Model::default();
        assert_eq!(model.transform, Matrix4::identity());
        assert_eq!(model.ambient, Vector3::new(0.2, 0.2, 0.2));
        assert_eq!(model.shininess, 32.0);
        assert!(model.is_empty());
    }

    #[test]
    fn test_set_position_keeps_rotation() {
        let mut model = Model::default();
        model.set_rotation(Quaternion::from_angle_y(Deg(90.0)));
        model.set_position(Vector3::new(1.0, 2.0, 3.0));

        assert_eq!(model.position(), Vector3::new(1.0, 2.0, 3.0));
        let rotated = model.transform.transform_vector(Vector3::new(1.0, 0.0, 0.0));
        assert!((rotated - Vector3::new(0.0, 0.0, -1.0)).magnitude() < 1e-5);
    }

    #[test]
    fn test_set_rotation_keeps_translation() {
        let mut model = Model::default();
        model.set_position(Vector3::new(4.0, 0.0, 0.0));
        model.set_rotation_axis_angle(Deg(45.0), Vector3::new(0.0, 0.0, 2.0));
        assert_eq!(model.position(), Vector3::new(4.0, 0.0, 0.0));
    }

    #[test]
    fn test_mesh_transform_composition() {
        let mut model = single_mesh_model(Matrix4::from_translation(Vector3::new(1.0, 0.0, 0.0)));
        model.set_transform(Matrix4::from_scale(2.0));

        let transform = model.mesh_transform(0).unwrap();
        // Model scale applies after the mesh translation
        assert_eq!(transform.w.truncate(), Vector3::new(2.0, 0.0, 0.0));
        assert!(model.mesh_transform(1).is_none());
    }

    #[test]
    fn test_reset_transforms() {
        let mut model = single_mesh_model(Matrix4::from_translation(Vector3::new(1.0, 0.0, 0.0)));
        model.set_position(Vector3::new(0.0, 3.0, 0.0));

        model.reset_transforms();
        assert_eq!(model.mesh_transform(0), Some(Matrix4::identity()));
    }

    #[test]
    fn test_missing_file_yields_empty_model() {
        let model = Model::from_path("does/not/exist.obj", LoadOptions::default());
        assert!(model.is_empty());
        assert!(Model::load("does/not/exist.obj", LoadOptions::default()).is_err());
    }
}
