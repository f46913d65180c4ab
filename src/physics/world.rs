use cgmath::{Matrix4, Point3, Quaternion, Vector3};
use rapier3d::prelude::*;

use super::{
    body::SimulatedBody,
    convert,
    error::PhysicsError,
    factory::BodyFactory,
    shape::{Shape, ShapeDescriptor},
};

/// Earth gravity, used unless the configuration overrides it.
pub const DEFAULT_GRAVITY: Vector3<f32> = Vector3::new(0.0, -9.8, 0.0);

/// Physics world configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsConfig {
    pub gravity: Vector3<f32>,
    /// Duration of one internal simulation step, in seconds.
    pub fixed_time_step: f32,
    /// Upper bound on internal steps taken by one call to [`PhysicsWorld::step`].
    pub max_sub_steps: u32,
    /// Frame deltas above this are clamped before stepping. `None` disables the clamp.
    pub max_frame_time: Option<f32>,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
            fixed_time_step: 1.0 / 60.0,
            max_sub_steps: 10,
            max_frame_time: Some(0.25),
        }
    }
}

impl PhysicsConfig {
    pub fn with_gravity(mut self, gravity: Vector3<f32>) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_fixed_time_step(mut self, fixed_time_step: f32) -> Self {
        self.fixed_time_step = fixed_time_step;
        self
    }

    pub fn with_max_sub_steps(mut self, max_sub_steps: u32) -> Self {
        self.max_sub_steps = max_sub_steps;
        self
    }

    pub fn with_max_frame_time(mut self, max_frame_time: Option<f32>) -> Self {
        self.max_frame_time = max_frame_time;
        self
    }

    fn validate(&self) -> Result<(), PhysicsError> {
        let g = self.gravity;
        if !(g.x.is_finite() && g.y.is_finite() && g.z.is_finite()) {
            return Err(PhysicsError::InvalidConfig(format!(
                "gravity must be finite, got {:?}",
                g
            )));
        }
        if !(self.fixed_time_step.is_finite() && self.fixed_time_step > 0.0) {
            return Err(PhysicsError::InvalidConfig(format!(
                "fixed time step must be positive, got {}",
                self.fixed_time_step
            )));
        }
        if self.max_sub_steps == 0 {
            return Err(PhysicsError::InvalidConfig(
                "max sub-steps must be at least 1".to_string(),
            ));
        }
        if let Some(max) = self.max_frame_time {
            if !(max.is_finite() && max > 0.0) {
                return Err(PhysicsError::InvalidConfig(format!(
                    "max frame time must be positive, got {}",
                    max
                )));
            }
        }
        Ok(())
    }
}

/// Outcome of one [`PhysicsWorld::step`] call.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepReport {
    /// Internal fixed steps actually simulated.
    pub sub_steps: u32,
    /// Whether the frame delta exceeded `max_frame_time` and was clamped.
    pub clamped: bool,
    /// Fixed steps owed but dropped because of the sub-step cap.
    pub dropped_steps: u32,
}

/// Owns the simulation context and every body registered in it.
///
/// One world is created by the frame loop and passed to whatever needs it;
/// there is no global instance.
pub struct PhysicsWorld {
    config: PhysicsConfig,
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhaseMultiSap,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    accumulator: f64,
    primitive_bodies: Vec<SimulatedBody>,
    convex_hull_bodies: Vec<SimulatedBody>,
}

impl PhysicsWorld {
    /// Allocates the simulation context.
    pub fn init(config: PhysicsConfig) -> Result<Self, PhysicsError> {
        config.validate()?;

        if config.gravity == DEFAULT_GRAVITY {
            log::info!("Using default gravity: {:?}", DEFAULT_GRAVITY);
        } else {
            log::info!("Using custom gravity: {:?}", config.gravity);
        }

        let integration_parameters = IntegrationParameters {
            dt: config.fixed_time_step,
            ..IntegrationParameters::default()
        };

        log::info!("Physics world initialized");
        Ok(Self {
            gravity: convert::to_vector(config.gravity),
            integration_parameters,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseMultiSap::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            accumulator: 0.0,
            primitive_bodies: Vec::new(),
            convex_hull_bodies: Vec::new(),
            config,
        })
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn set_gravity(&mut self, gravity: Vector3<f32>) {
        self.config.gravity = gravity;
        self.gravity = convert::to_vector(gravity);
    }

    pub fn gravity(&self) -> Vector3<f32> {
        convert::from_vector(&self.gravity)
    }

    /// Constructs a body from `descriptor` and retains it in the primitive list.
    ///
    /// A descriptor that cannot be built is logged and dropped; nothing is
    /// registered in the simulation for it.
    pub fn add_primitive_rigid_body(
        &mut self,
        descriptor: &ShapeDescriptor,
    ) -> Result<RigidBodyHandle, PhysicsError> {
        match BodyFactory::new(&mut self.bodies, &mut self.colliders).construct(descriptor) {
            Ok(body) => {
                let handle = body.handle();
                self.primitive_bodies.push(body);
                Ok(handle)
            }
            Err(err) => {
                log::warn!("Dropping rigid body: {}", err);
                Err(err)
            }
        }
    }

    /// Builds a convex hull from `points` and registers it with the pose,
    /// mass and collision filter of `descriptor`. The descriptor's own shape
    /// is ignored.
    pub fn add_convex_hull_rigid_body(
        &mut self,
        descriptor: &ShapeDescriptor,
        points: &[Point3<f32>],
    ) -> Result<RigidBodyHandle, PhysicsError> {
        let hull = ShapeDescriptor {
            shape: Shape::ConvexHull {
                points: points.to_vec(),
            },
            ..descriptor.clone()
        };

        match BodyFactory::new(&mut self.bodies, &mut self.colliders).construct(&hull) {
            Ok(body) => {
                log::debug!("Convex hull built from {} points", points.len());
                let handle = body.handle();
                self.convex_hull_bodies.push(body);
                Ok(handle)
            }
            Err(err) => {
                log::warn!("Dropping convex hull body: {}", err);
                Err(err)
            }
        }
    }

    /// Advances the simulation by a measured frame delta.
    ///
    /// The delta is accumulated and consumed in steps of `fixed_time_step`,
    /// at most `max_sub_steps` per call. Owed steps beyond that are dropped.
    pub fn step(&mut self, frame_dt: f32) -> StepReport {
        let mut report = StepReport::default();

        let mut dt = if frame_dt.is_finite() { frame_dt.max(0.0) } else { 0.0 };
        if let Some(max) = self.config.max_frame_time {
            if dt > max {
                log::warn!("Frame time {:.3}s exceeds {:.3}s, clamping", dt, max);
                dt = max;
                report.clamped = true;
            }
        }

        let fixed = self.config.fixed_time_step as f64;
        self.accumulator += dt as f64;
        let owed = (self.accumulator / fixed + 1.0e-6).floor();
        self.accumulator = (self.accumulator - owed * fixed).max(0.0);

        let owed = owed as u32;
        report.sub_steps = owed.min(self.config.max_sub_steps);
        report.dropped_steps = owed - report.sub_steps;
        if report.dropped_steps > 0 {
            log::debug!("Dropped {} physics steps", report.dropped_steps);
        }

        for _ in 0..report.sub_steps {
            self.pipeline.step(
                &self.gravity,
                &self.integration_parameters,
                &mut self.islands,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.bodies,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                &mut self.ccd_solver,
                None,
                &(),
                &(),
            );
        }

        report
    }

    /// Current pose of a body as a model matrix.
    pub fn body_transform(&self, handle: RigidBodyHandle) -> Option<Matrix4<f32>> {
        self.bodies
            .get(handle)
            .map(|body| convert::isometry_to_matrix(body.position()))
    }

    /// Current position and orientation of a body.
    pub fn body_pose(&self, handle: RigidBodyHandle) -> Option<(Vector3<f32>, Quaternion<f32>)> {
        self.bodies.get(handle).map(|body| {
            let pose = body.position();
            (
                convert::from_vector(&pose.translation.vector),
                convert::from_rotation(&pose.rotation),
            )
        })
    }

    /// Removes a body and its collider from the simulation and the retained lists.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) -> Result<SimulatedBody, PhysicsError> {
        let body = take_body(&mut self.primitive_bodies, handle)
            .or_else(|| take_body(&mut self.convex_hull_bodies, handle))
            .ok_or(PhysicsError::UnknownBody(handle))?;

        self.bodies.remove(
            handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        log::debug!("Removed {:?} body {:?}", body.kind(), handle);
        Ok(body)
    }

    pub fn primitive_bodies(&self) -> &[SimulatedBody] {
        &self.primitive_bodies
    }

    pub fn convex_hull_bodies(&self) -> &[SimulatedBody] {
        &self.convex_hull_bodies
    }

    /// Number of bodies registered in the simulation.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Releases the simulation context.
    ///
    /// Bodies and colliders go first, then the solver, broadphase and
    /// narrowphase structures that reference them.
    pub fn free(self) {
        let Self {
            pipeline,
            islands,
            broad_phase,
            narrow_phase,
            bodies,
            colliders,
            impulse_joints,
            multibody_joints,
            ccd_solver,
            primitive_bodies,
            convex_hull_bodies,
            ..
        } = self;

        log::info!(
            "Freeing physics world ({} primitive, {} convex hull bodies)",
            primitive_bodies.len(),
            convex_hull_bodies.len()
        );
        drop(primitive_bodies);
        drop(convex_hull_bodies);
        drop(impulse_joints);
        drop(multibody_joints);
        drop(colliders);
        drop(bodies);
        drop(ccd_solver);
        drop(islands);
        drop(broad_phase);
        drop(narrow_phase);
        drop(pipeline);
        log::info!("Physics world freed");
    }
}

fn take_body(list: &mut Vec<SimulatedBody>, handle: RigidBodyHandle) -> Option<SimulatedBody> {
    let index = list.iter().position(|body| body.handle() == handle)?;
    Some(list.remove(index))
}
