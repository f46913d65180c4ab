//! Simulation-side plumbing for the frame loop
//!
//! Frame timing, and the bridge that carries simulated vertex positions to
//! the renderer's vertex buffers.

pub mod clock;
pub mod soft_body;
pub mod upload;

pub use clock::FrameClock;
pub use soft_body::{DeformableBody, RigidSkin, SoftBodySync, SyncError};
pub use upload::{GpuUpload, HostVertexBuffers, VertexUpload};
