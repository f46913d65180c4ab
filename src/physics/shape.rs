//! Shape descriptors
//!
//! A [`ShapeDescriptor`] is the plain data needed to construct one simulated
//! body: which collision shape it has, the shape's parameters, its mass,
//! initial pose and collision filtering. The shape kind is carried explicitly
//! by the [`Shape`] variant, so construction never has to probe a shape object
//! to find out what it is.

use cgmath::{One, Point3, Quaternion, Vector3};

/// Collision group every body belongs to unless told otherwise.
pub const DEFAULT_COLLISION_GROUP: u32 = 0x0000_0001;

/// Collision mask that lets a body collide with every group.
pub const DEFAULT_COLLISION_MASK: u32 = u32::MAX;

/// Discriminant of [`Shape`], used for logging and error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Box,
    Sphere,
    Capsule,
    Cylinder,
    Cone,
    StaticPlane,
    ConvexHull,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 7] = [
        ShapeKind::Box,
        ShapeKind::Sphere,
        ShapeKind::Capsule,
        ShapeKind::Cylinder,
        ShapeKind::Cone,
        ShapeKind::StaticPlane,
        ShapeKind::ConvexHull,
    ];
}

/// Collision geometry with its kind-specific parameters.
///
/// All shapes are Y-aligned where an axis matters.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Box with the given half-extents.
    Box { half_extents: Vector3<f32> },
    Sphere { radius: f32 },
    /// Capsule whose `height` is the distance between the two hemisphere centres.
    Capsule { radius: f32, height: f32 },
    /// Cylinder described by half-extents: `x` is the radius, `y` the half-height.
    Cylinder { half_extents: Vector3<f32> },
    /// Cone with base `radius` and total `height`.
    Cone { radius: f32, height: f32 },
    /// Infinite plane `normal · p = constant`. Always static.
    StaticPlane { normal: Vector3<f32>, constant: f32 },
    /// Convex hull of a point cloud.
    ConvexHull { points: Vec<Point3<f32>> },
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Box { .. } => ShapeKind::Box,
            Shape::Sphere { .. } => ShapeKind::Sphere,
            Shape::Capsule { .. } => ShapeKind::Capsule,
            Shape::Cylinder { .. } => ShapeKind::Cylinder,
            Shape::Cone { .. } => ShapeKind::Cone,
            Shape::StaticPlane { .. } => ShapeKind::StaticPlane,
            Shape::ConvexHull { .. } => ShapeKind::ConvexHull,
        }
    }
}

/// Everything needed to construct one simulated rigid body.
///
/// A `mass` of zero produces a fixed body. Planes are fixed regardless of mass.
///
/// # Examples
///
/// ```no_run
/// use cgmath::Vector3;
/// use tessera::physics::{Shape, ShapeDescriptor};
///
/// let ball = ShapeDescriptor::new(Shape::Sphere { radius: 0.5 })
///     .with_mass(1.0)
///     .with_position(Vector3::new(0.0, 10.0, 0.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeDescriptor {
    pub shape: Shape,
    pub mass: f32,
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub collision_group: u32,
    pub collision_mask: u32,
}

impl ShapeDescriptor {
    /// Creates a massless descriptor at the origin with identity rotation
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            mass: 0.0,
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::one(),
            collision_group: DEFAULT_COLLISION_GROUP,
            collision_mask: DEFAULT_COLLISION_MASK,
        }
    }

    /// Builder pattern: Set mass (negative values are treated as zero)
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass.max(0.0);
        self
    }

    /// Builder pattern: Set initial position
    pub fn with_position(mut self, position: Vector3<f32>) -> Self {
        self.position = position;
        self
    }

    /// Builder pattern: Set initial orientation
    pub fn with_rotation(mut self, rotation: Quaternion<f32>) -> Self {
        self.rotation = rotation;
        self
    }

    /// Builder pattern: Set collision group membership and filter mask
    pub fn with_collision_filter(mut self, group: u32, mask: u32) -> Self {
        self.collision_group = group;
        self.collision_mask = mask;
        self
    }

    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    /// Whether the constructed body will be dynamic.
    pub fn is_dynamic(&self) -> bool {
        self.kind() != ShapeKind::StaticPlane && self.mass > 0.0
    }
}
