//! # Tessera Viewer
//!
//! Loads a model, drops it onto a static ground plane and renders it.
//!
//! ```bash
//! cargo run --example viewer -- path/to/model.obj
//! cargo run --example viewer -- path/to/model.obj --hull
//! ```
//!
//! With `--hull` the falling body is a convex hull of the model's own
//! vertices instead of a unit box.

use env_logger::Env;
use tessera::prelude::*;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("usage: viewer <model.obj> [--hull]"))?;
    let use_hull = args.any(|arg| arg == "--hull");

    let mut engine = Engine::new(
        EngineConfig::default()
            .with_title(format!("Tessera - {}", path))
            .with_vsync(true),
    )?;

    // Flattening gives one position array to build the hull from
    let model = Model::from_path(&path, LoadOptions::default().with_flatten(use_hull));
    if model.is_empty() {
        log::warn!("'{}' produced no meshes", path);
    }
    let hull_points = model
        .flattened
        .as_ref()
        .map(|flattened| flattened.positions())
        .unwrap_or_default();

    let scene = engine.scene_mut();
    let model = scene.add_model(model);

    scene.physics_mut().add_primitive_rigid_body(&ShapeDescriptor::new(
        Shape::StaticPlane {
            normal: Vector3::unit_y(),
            constant: 0.0,
        },
    ))?;

    let falling = ShapeDescriptor::new(Shape::Box {
        half_extents: Vector3::new(0.5, 0.5, 0.5),
    })
    .with_mass(1.0)
    .with_position(Vector3::new(0.0, 6.0, 0.0))
    .with_rotation(Quaternion::from(cgmath::Euler::new(
        Deg(20.0),
        Deg(0.0),
        Deg(35.0),
    )));

    let body = if use_hull && !hull_points.is_empty() {
        scene
            .physics_mut()
            .add_convex_hull_rigid_body(&falling, &hull_points)?
    } else {
        scene.physics_mut().add_primitive_rigid_body(&falling)?
    };
    scene.bind_rigid_body(model, body);

    engine.run()
}
