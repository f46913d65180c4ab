//! # Graphics Module
//!
//! Rendering side of the engine: scene loading into drawable meshes, the
//! camera, GPU resource helpers and the wgpu render engine that submits
//! loaded models.
//!
//! - **Scene Loading** ([`scene`]) - Hierarchical import, accumulated
//!   transforms, shared textures and flattened buffers
//! - **Camera** ([`camera`]) - Yaw/pitch fly camera
//! - **Resources** ([`resources`]) - Depth buffer and uniform buffers
//! - **Render Engine** ([`render_engine`]) - Surface, pipeline and draw submission

pub mod camera;
pub mod render_engine;
pub mod resources;
pub mod scene;

pub use camera::{CameraUniform, FlyCamera};
pub use render_engine::RenderEngine;
