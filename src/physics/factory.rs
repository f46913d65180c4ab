//! Body construction
//!
//! Turns a [`ShapeDescriptor`] into a live body registered in the world's
//! rigid-body and collider sets. Construction is a closed, exhaustive dispatch
//! over [`Shape`]; every branch builds the concrete collider, derives the local
//! inertia (fixed bodies carry zero inertia), wraps the initial pose into a
//! motion state and inserts the body. Nothing is inserted unless the collider
//! could be built, so a failed construction leaves the world untouched.

use cgmath::{InnerSpace, Point3, Vector3, Zero};
use rapier3d::na::Unit;
use rapier3d::prelude::*;

use super::{
    body::SimulatedBody,
    convert,
    error::PhysicsError,
    shape::{Shape, ShapeDescriptor, ShapeKind},
};

const DEGENERATE_EPSILON: f32 = 1.0e-6;

/// Mass, pose, shape and inertia bundle required to instantiate a body.
#[derive(Debug, Clone)]
pub struct ConstructionInfo {
    pub mass: f32,
    pub motion_state: Isometry<Real>,
    pub collider: Collider,
    pub inertia: Vector3<f32>,
}

/// Builds bodies into a pair of borrowed simulation sets.
pub struct BodyFactory<'a> {
    bodies: &'a mut RigidBodySet,
    colliders: &'a mut ColliderSet,
}

impl<'a> BodyFactory<'a> {
    pub fn new(bodies: &'a mut RigidBodySet, colliders: &'a mut ColliderSet) -> Self {
        Self { bodies, colliders }
    }

    /// Constructs and registers the body described by `descriptor`.
    pub fn construct(&mut self, descriptor: &ShapeDescriptor) -> Result<SimulatedBody, PhysicsError> {
        log::debug!("Identifying rigid body's collision shape...");
        let kind = descriptor.kind();
        let info = Self::construction_info(descriptor)?;
        log::info!("Rigid body's collision shape: {:?}", kind);

        let builder = if descriptor.is_dynamic() {
            RigidBodyBuilder::dynamic()
        } else {
            RigidBodyBuilder::fixed()
        };
        let handle = self.bodies.insert(builder.position(info.motion_state).build());
        let collider = self
            .colliders
            .insert_with_parent(info.collider, handle, self.bodies);

        Ok(SimulatedBody {
            handle,
            collider,
            kind,
            mass: info.mass,
            inertia: info.inertia,
        })
    }

    /// Builds the construction info for a descriptor without registering anything.
    pub fn construction_info(descriptor: &ShapeDescriptor) -> Result<ConstructionInfo, PhysicsError> {
        let collider = Self::build_collider(descriptor)?;

        // Static bodies carry zero inertia by convention
        let (mass, inertia) = if descriptor.is_dynamic() {
            let principal = collider.mass_properties().principal_inertia();
            (descriptor.mass, convert::from_vector(&principal))
        } else {
            (0.0, Vector3::zero())
        };

        Ok(ConstructionInfo {
            mass,
            motion_state: Self::motion_state(descriptor),
            collider,
            inertia,
        })
    }

    /// Wraps the descriptor's initial orientation and position into a pose.
    pub fn motion_state(descriptor: &ShapeDescriptor) -> Isometry<Real> {
        log::trace!("Creating default motion state...");
        convert::to_isometry(descriptor.position, descriptor.rotation)
    }

    /// Builds the concrete collider matching the descriptor's shape.
    pub fn build_collider(descriptor: &ShapeDescriptor) -> Result<Collider, PhysicsError> {
        let kind = descriptor.kind();
        let builder = match &descriptor.shape {
            Shape::Box { half_extents } => {
                require_positive(kind, "half extents", &[half_extents.x, half_extents.y, half_extents.z])?;
                ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
            Shape::Sphere { radius } => {
                require_positive(kind, "radius", &[*radius])?;
                ColliderBuilder::ball(*radius)
            }
            Shape::Capsule { radius, height } => {
                require_positive(kind, "radius", &[*radius])?;
                require_non_negative(kind, "height", *height)?;
                ColliderBuilder::capsule_y(height * 0.5, *radius)
            }
            Shape::Cylinder { half_extents } => {
                require_positive(kind, "half extents", &[half_extents.x, half_extents.y])?;
                ColliderBuilder::cylinder(half_extents.y, half_extents.x)
            }
            Shape::Cone { radius, height } => {
                require_positive(kind, "radius and height", &[*radius, *height])?;
                ColliderBuilder::cone(height * 0.5, *radius)
            }
            Shape::StaticPlane { normal, constant } => {
                let length = normal.magnitude();
                if !length.is_finite() || length < DEGENERATE_EPSILON || !constant.is_finite() {
                    return Err(degenerate(kind, "plane normal must be finite and non-zero"));
                }
                let unit = normal / length;
                let outward = Unit::new_unchecked(convert::to_vector(unit));
                ColliderBuilder::halfspace(outward).translation(convert::to_vector(unit * *constant))
            }
            Shape::ConvexHull { points } => Self::convex_hull_builder(points)?,
        };

        let groups = InteractionGroups::new(
            Group::from_bits_truncate(descriptor.collision_group),
            Group::from_bits_truncate(descriptor.collision_mask),
        );
        let builder = builder.collision_groups(groups);
        let builder = if descriptor.is_dynamic() {
            builder.mass(descriptor.mass)
        } else {
            builder
        };

        Ok(builder.build())
    }

    /// Builds a hull collider by inserting every point of the cloud.
    pub fn convex_hull_builder(points: &[Point3<f32>]) -> Result<ColliderBuilder, PhysicsError> {
        let kind = ShapeKind::ConvexHull;
        if !spans_volume(points) {
            return Err(degenerate(
                kind,
                &format!("{} points do not span a volume", points.len()),
            ));
        }

        let cloud: Vec<Point<Real>> = points.iter().copied().map(convert::to_point).collect();
        ColliderBuilder::convex_hull(&cloud)
            .ok_or_else(|| degenerate(kind, "hull computation failed"))
    }
}

fn degenerate(kind: ShapeKind, reason: &str) -> PhysicsError {
    PhysicsError::DegenerateShape {
        kind,
        reason: reason.to_string(),
    }
}

fn require_positive(kind: ShapeKind, what: &str, values: &[f32]) -> Result<(), PhysicsError> {
    if values.iter().all(|v| v.is_finite() && *v > 0.0) {
        Ok(())
    } else {
        Err(degenerate(kind, &format!("{what} must be finite and positive")))
    }
}

fn require_non_negative(kind: ShapeKind, what: &str, value: f32) -> Result<(), PhysicsError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(degenerate(kind, &format!("{what} must be finite and non-negative")))
    }
}

/// True when the cloud has four finite points that are not coplanar.
fn spans_volume(points: &[Point3<f32>]) -> bool {
    if points.len() < 4 || points.iter().any(|p| !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite())) {
        return false;
    }

    let origin = points[0];
    let Some(edge) = points.iter().map(|p| p - origin).find(|e| e.magnitude2() > DEGENERATE_EPSILON) else {
        return false;
    };
    let Some(normal) = points
        .iter()
        .map(|p| edge.cross(p - origin))
        .find(|n| n.magnitude2() > DEGENERATE_EPSILON)
    else {
        return false;
    };

    points
        .iter()
        .any(|p| normal.dot(p - origin).abs() > DEGENERATE_EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_cube_points() -> Vec<Point3<f32>> {
        let mut points = Vec::new();
        for x in [-0.5, 0.5] {
            for y in [-0.5, 0.5] {
                for z in [-0.5, 0.5] {
                    points.push(Point3::new(x, y, z));
                }
            }
        }
        points
    }

    fn descriptor_for(kind: ShapeKind) -> ShapeDescriptor {
        let shape = match kind {
            ShapeKind::Box => Shape::Box {
                half_extents: Vector3::new(0.5, 0.5, 0.5),
            },
            ShapeKind::Sphere => Shape::Sphere { radius: 0.5 },
            ShapeKind::Capsule => Shape::Capsule {
                radius: 0.25,
                height: 1.0,
            },
            ShapeKind::Cylinder => Shape::Cylinder {
                half_extents: Vector3::new(0.5, 1.0, 0.5),
            },
            ShapeKind::Cone => Shape::Cone {
                radius: 0.5,
                height: 1.0,
            },
            ShapeKind::StaticPlane => Shape::StaticPlane {
                normal: Vector3::new(0.0, 1.0, 0.0),
                constant: 0.0,
            },
            ShapeKind::ConvexHull => Shape::ConvexHull {
                points: unit_cube_points(),
            },
        };
        ShapeDescriptor::new(shape).with_mass(2.0)
    }

    #[test]
    fn test_every_kind_constructs() {
        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        for kind in ShapeKind::ALL {
            let descriptor = descriptor_for(kind);
            let body = BodyFactory::new(&mut bodies, &mut colliders)
                .construct(&descriptor)
                .unwrap();
            assert_eq!(body.kind(), kind);
            assert!(bodies.get(body.handle()).is_some());
            assert!(colliders.get(body.collider()).is_some());
        }

        assert_eq!(bodies.len(), ShapeKind::ALL.len());
    }

    #[test]
    fn test_static_plane_has_zero_inertia() {
        let info = BodyFactory::construction_info(&descriptor_for(ShapeKind::StaticPlane)).unwrap();
        assert_eq!(info.inertia, Vector3::zero());
        assert_eq!(info.mass, 0.0);
    }

    #[test]
    fn test_dynamic_body_has_inertia() {
        let info = BodyFactory::construction_info(&descriptor_for(ShapeKind::Box)).unwrap();
        assert_eq!(info.mass, 2.0);
        // Solid cube: I = m * (2 * 0.5)^2 / 6 on every axis
        let expected = 2.0 * 1.0 / 6.0;
        assert!((info.inertia.x - expected).abs() < 1e-4);
        assert!((info.inertia.y - expected).abs() < 1e-4);
        assert!((info.inertia.z - expected).abs() < 1e-4);
    }

    #[test]
    fn test_massless_body_is_fixed() {
        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();
        let descriptor = ShapeDescriptor::new(Shape::Sphere { radius: 1.0 });
        let body = BodyFactory::new(&mut bodies, &mut colliders)
            .construct(&descriptor)
            .unwrap();
        assert!(bodies[body.handle()].is_fixed());
        assert_eq!(body.inertia(), Vector3::zero());
    }

    #[test]
    fn test_motion_state_carries_pose() {
        let descriptor =
            descriptor_for(ShapeKind::Sphere).with_position(Vector3::new(1.0, 2.0, 3.0));
        let pose = BodyFactory::motion_state(&descriptor);
        assert_eq!(pose.translation.vector, vector![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_degenerate_hull_inserts_nothing() {
        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();
        let flat = ShapeDescriptor::new(Shape::ConvexHull {
            points: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
                Point3::new(1.0, 0.0, 1.0),
            ],
        });

        let result = BodyFactory::new(&mut bodies, &mut colliders).construct(&flat);
        assert!(matches!(
            result,
            Err(PhysicsError::DegenerateShape {
                kind: ShapeKind::ConvexHull,
                ..
            })
        ));
        assert_eq!(bodies.len(), 0);
        assert_eq!(colliders.len(), 0);
    }

    #[test]
    fn test_zero_plane_normal_rejected() {
        let plane = ShapeDescriptor::new(Shape::StaticPlane {
            normal: Vector3::zero(),
            constant: 1.0,
        });
        assert!(BodyFactory::build_collider(&plane).is_err());
    }

    #[test]
    fn test_collision_filter_applied() {
        let descriptor = descriptor_for(ShapeKind::Sphere).with_collision_filter(0b10, 0b01);
        let collider = BodyFactory::build_collider(&descriptor).unwrap();
        let groups = collider.collision_groups();
        assert_eq!(groups.memberships, Group::GROUP_2);
        assert_eq!(groups.filter, Group::GROUP_1);
    }
}
