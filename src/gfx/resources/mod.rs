//! GPU resource helpers
//!
//! Depth buffer, typed uniform buffers and the camera bind group.

pub mod camera_bindings;
pub mod depth_texture;
pub mod uniform_buffer;

pub use camera_bindings::CameraBindings;
pub use depth_texture::DepthTexture;
pub use uniform_buffer::UniformBuffer;
