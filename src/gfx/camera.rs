use cgmath::{perspective, Deg, InnerSpace, Matrix4, Point3, SquareMatrix, Vector3};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Pitch is kept inside this range so the view never flips over the pole.
pub const MAX_PITCH: f32 = 89.0;

/// Free-look camera oriented by yaw and pitch, in degrees.
///
/// Yaw 0 looks down +X; the default yaw of -90 looks down -Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyCamera {
    pub position: Point3<f32>,
    pub world_up: Vector3<f32>,
    pub yaw: f32,
    pub pitch: f32,
    pub fov: Deg<f32>,
    pub aspect: f32,
    pub znear: f32,
    pub zfar: f32,
    front: Vector3<f32>,
    up: Vector3<f32>,
}

impl FlyCamera {
    pub fn new(position: Point3<f32>, yaw: f32, pitch: f32, aspect: f32) -> Self {
        let mut camera = Self {
            position,
            world_up: Vector3::unit_y(),
            yaw,
            pitch: pitch.clamp(-MAX_PITCH, MAX_PITCH),
            fov: Deg(45.0),
            aspect,
            znear: 0.1,
            zfar: 1000.0,
            front: -Vector3::unit_z(),
            up: Vector3::unit_y(),
        };
        camera.update_vectors();
        camera
    }

    pub fn front(&self) -> Vector3<f32> {
        self.front
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    /// Sets the orientation, clamping pitch.
    pub fn set_orientation(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-MAX_PITCH, MAX_PITCH);
        self.update_vectors();
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vector3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos())
            .normalize();
        let right = self.front.cross(self.world_up).normalize();
        self.up = right.cross(self.front).normalize();
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    pub fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fov, self.aspect, self.znear, self.zfar)
            * self.view_matrix()
    }
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::new(Point3::new(0.0, 2.0, 10.0), -90.0, 0.0, 1600.0 / 920.0)
    }
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct CameraUniform {
    /// Eye position in homogeneous coordinates, padded for 16 byte alignment.
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }
}

impl CameraUniform {
    pub fn update(&mut self, camera: &FlyCamera) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = camera.build_view_projection_matrix().into();
    }
}
