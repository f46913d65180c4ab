//! Rigid-body physics
//!
//! A thin, strongly typed layer over rapier: shape descriptors, body
//! construction and a world that owns the simulation context and steps it
//! with a fixed-timestep accumulator.

pub mod body;
pub mod convert;
pub mod error;
pub mod factory;
pub mod shape;
pub mod world;

pub use body::SimulatedBody;
pub use error::PhysicsError;
pub use factory::{BodyFactory, ConstructionInfo};
pub use shape::{Shape, ShapeDescriptor, ShapeKind, DEFAULT_COLLISION_GROUP, DEFAULT_COLLISION_MASK};
pub use world::{PhysicsConfig, PhysicsWorld, StepReport, DEFAULT_GRAVITY};

pub use rapier3d::prelude::RigidBodyHandle;
