//! Collision shapes and static constraints.
//!
//! A [`Collider`] only describes geometry in body-local space. It is paired
//! with a [`RigidBody`](crate::body::RigidBody) by the
//! [`PhysicsWorld`](crate::world::PhysicsWorld), which owns both; the collider
//! never holds the body itself.

use nalgebra::{Matrix3, Unit, Vector3};

use crate::error::PhysicsError;
use crate::math::SINGULAR_EPSILON;

/// Discriminant of a [`Collider`], used to index the narrow-phase tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Sphere = 0,
    Box = 1,
}

impl ShapeKind {
    /// Number of collider shapes.
    pub const COUNT: usize = 2;
}

/// A collision shape attached to a rigid body.
///
/// The shape is centered on the body's position and rotates with it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Collider {
    /// A sphere defined by its radius.
    Sphere { radius: f32 },
    /// An oriented box defined by half-extents along the body's local axes.
    Box { half_extents: Vector3<f32> },
}

impl Collider {
    /// Unit-radius sphere.
    pub const DEFAULT_SPHERE: Collider = Collider::Sphere { radius: 1.0 };

    /// Unit cube (half-extent 0.5 on every axis).
    pub const DEFAULT_BOX: Collider = Collider::Box {
        half_extents: Vector3::new(0.5, 0.5, 0.5),
    };

    /// The default-sized collider for `kind`.
    pub fn default_for(kind: ShapeKind) -> Self {
        match kind {
            ShapeKind::Sphere => Self::DEFAULT_SPHERE,
            ShapeKind::Box => Self::DEFAULT_BOX,
        }
    }

    #[inline]
    pub fn kind(&self) -> ShapeKind {
        match self {
            Collider::Sphere { .. } => ShapeKind::Sphere,
            Collider::Box { .. } => ShapeKind::Box,
        }
    }

    /// Re-parameterizes the shape extents: one value (radius) for a sphere,
    /// three values (half-extents) for a box.
    ///
    /// This does not touch any body; keeping the inertia tensor consistent
    /// is the owner's job (see [`PhysicsWorld::set_scale`](crate::world::PhysicsWorld::set_scale)).
    pub fn set_scale(&mut self, values: &[f32]) -> Result<(), PhysicsError> {
        match (self, values) {
            (Collider::Sphere { radius }, &[r]) => {
                *radius = r;
                Ok(())
            }
            (Collider::Box { half_extents }, &[x, y, z]) => {
                *half_extents = Vector3::new(x, y, z);
                Ok(())
            }
            (collider, values) => Err(PhysicsError::ScaleArity {
                kind: collider.kind(),
                expected: collider.scale_arity(),
                got: values.len(),
            }),
        }
    }

    fn scale_arity(&self) -> usize {
        match self {
            Collider::Sphere { .. } => 1,
            Collider::Box { .. } => 3,
        }
    }

    /// Extents along each local axis (the radius repeated for a sphere).
    pub fn scale(&self) -> Vector3<f32> {
        match self {
            Collider::Sphere { radius } => Vector3::repeat(*radius),
            Collider::Box { half_extents } => *half_extents,
        }
    }

    /// Radius of a sphere around the body origin that encloses the shape.
    pub fn bounding_radius(&self) -> f32 {
        match self {
            Collider::Sphere { radius } => *radius,
            Collider::Box { half_extents } => half_extents.norm(),
        }
    }

    /// Inertia tensor (body space) of a solid body of this shape and `mass`.
    ///
    /// - sphere: `I = (2/5) * m * r²` on every axis
    /// - box of full size `(2hx, 2hy, 2hz)`: `Ixx = m/12 * (4hy² + 4hz²)` etc.
    pub fn inertia_tensor(&self, mass: f32) -> Matrix3<f32> {
        match self {
            Collider::Sphere { radius } => {
                Matrix3::from_diagonal_element(0.4 * mass * radius * radius)
            }
            Collider::Box { half_extents } => {
                let hx2 = 4.0 * half_extents.x * half_extents.x;
                let hy2 = 4.0 * half_extents.y * half_extents.y;
                let hz2 = 4.0 * half_extents.z * half_extents.z;
                let k = mass / 12.0;
                Matrix3::from_diagonal(&Vector3::new(k * (hy2 + hz2), k * (hx2 + hz2), k * (hx2 + hy2)))
            }
        }
    }
}

/// Which way a box vertex is chosen relative to a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexSide {
    /// The vertex furthest along the direction.
    Along,
    /// The vertex furthest against the direction.
    Against,
}

/// Local-space vertex of a box that is extreme along (or against) `direction`.
///
/// Each half-extent component takes the sign of the matching world axis'
/// projection onto `direction` (negated for [`VertexSide::Against`]).
pub fn box_support_vertex(
    half_extents: &Vector3<f32>,
    axes: &[Vector3<f32>; 3],
    direction: &Vector3<f32>,
    side: VertexSide,
) -> Vector3<f32> {
    let mut vertex = *half_extents;
    for (i, axis) in axes.iter().enumerate() {
        let projection = axis.dot(direction);
        let flip = match side {
            VertexSide::Along => projection < 0.0,
            VertexSide::Against => projection > 0.0,
        };
        if flip {
            vertex[i] = -vertex[i];
        }
    }
    vertex
}

/// The eight corners of a box in local space.
pub fn box_vertices(half_extents: &Vector3<f32>) -> [Vector3<f32>; 8] {
    let (x, y, z) = (half_extents.x, half_extents.y, half_extents.z);
    [
        Vector3::new(-x, y, z),
        Vector3::new(-x, -y, z),
        Vector3::new(x, -y, z),
        Vector3::new(x, y, z),
        Vector3::new(-x, y, -z),
        Vector3::new(-x, -y, -z),
        Vector3::new(x, -y, -z),
        Vector3::new(x, y, -z),
    ]
}

/// Discriminant of a [`Constraint`], used to index the narrow-phase tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    Plane = 0,
}

impl ConstraintKind {
    /// Number of constraint shapes.
    pub const COUNT: usize = 1;
}

/// An infinite static plane `normal · x = distance`.
///
/// Bodies are pushed toward the side the normal points to.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "PlaneSchema", into = "PlaneSchema")
)]
pub struct Plane {
    normal: Unit<Vector3<f32>>,
    distance: f32,
}

/// Serialized form of [`Plane`]. Deserializing goes through [`Plane::new`] so
/// the stored normal is always unit length.
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct PlaneSchema {
    normal: Vector3<f32>,
    distance: f32,
}

#[cfg(feature = "serde")]
impl TryFrom<PlaneSchema> for Plane {
    type Error = PhysicsError;

    fn try_from(schema: PlaneSchema) -> Result<Self, Self::Error> {
        Plane::new(schema.normal, schema.distance)
    }
}

#[cfg(feature = "serde")]
impl From<Plane> for PlaneSchema {
    fn from(plane: Plane) -> Self {
        PlaneSchema {
            normal: plane.normal(),
            distance: plane.distance,
        }
    }
}

impl Plane {
    /// Creates a plane; `normal` is normalized.
    pub fn new(normal: Vector3<f32>, offset: f32) -> Result<Self, PhysicsError> {
        let normal = Unit::try_new(normal, SINGULAR_EPSILON).ok_or(PhysicsError::DegenerateNormal)?;
        Ok(Self {
            normal,
            distance: offset,
        })
    }

    /// The horizontal plane `y = 0` facing up.
    pub fn ground() -> Self {
        Self {
            normal: Vector3::y_axis(),
            distance: 0.0,
        }
    }

    #[inline]
    pub fn normal(&self) -> Vector3<f32> {
        self.normal.into_inner()
    }

    #[inline]
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Signed distance of `point` above the plane.
    #[inline]
    pub fn signed_distance(&self, point: &Vector3<f32>) -> f32 {
        self.normal.dot(point) - self.distance
    }
}

/// A static, massless collision surface.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Constraint {
    Plane(Plane),
}

impl Constraint {
    #[inline]
    pub fn kind(&self) -> ConstraintKind {
        match self {
            Constraint::Plane(_) => ConstraintKind::Plane,
        }
    }
}

impl From<Plane> for Constraint {
    fn from(plane: Plane) -> Self {
        Constraint::Plane(plane)
    }
}
