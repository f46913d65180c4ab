// src/lib.rs
//! Tessera 3D Engine
//!
//! A real-time 3D engine shell: hierarchical model loading into drawable
//! meshes, rigid-body physics over rapier, and a winit/wgpu frame loop that
//! keeps the two in step.

pub mod app;
pub mod gfx;
pub mod physics;
pub mod prelude;
pub mod simulation;

// Re-export main types for convenience
pub use app::{Engine, EngineConfig, SceneState};

/// Creates an engine with the default window and physics settings
pub fn default() -> anyhow::Result<Engine> {
    Engine::new(EngineConfig::default())
}
