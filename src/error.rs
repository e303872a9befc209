//! Error type shared by the whole crate.

use crate::arena::BodyHandle;
use crate::collider::ShapeKind;

/// Ways an operation on the physics kernel can fail.
///
/// Per-contact numeric trouble inside the solver (zero effective mass, NaN
/// impulses) is not reported here: those impulses are skipped and the tick
/// carries on.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum PhysicsError {
    /// [`RigidBody::axis`](crate::body::RigidBody::axis) was asked for an axis
    /// other than 0, 1 or 2.
    #[error("axis index {0} is out of range (expected 0, 1 or 2)")]
    AxisOutOfRange(usize),

    /// A checked component access was out of bounds.
    #[error("index {index} is out of range for a value with {len} components")]
    IndexOutOfRange { index: usize, len: usize },

    /// Mass must be positive (infinite mass is allowed and means fixed).
    #[error("mass must be positive, got {0}")]
    InvalidMass(f32),

    /// [`Collider::set_scale`](crate::collider::Collider::set_scale) was given
    /// the wrong number of values for the shape.
    #[error("{kind:?} collider expects {expected} scale value(s), got {got}")]
    ScaleArity {
        kind: ShapeKind,
        expected: usize,
        got: usize,
    },

    /// A plane normal had (near) zero length.
    #[error("plane normal must have nonzero length")]
    DegenerateNormal,

    /// A fixed-capacity container is full.
    #[error("capacity of {capacity} exceeded")]
    CapacityExceeded { capacity: usize },

    /// The handle refers to an object that has been removed (or never existed).
    #[error("{0:?} does not refer to a live object")]
    StaleHandle(BodyHandle),

    /// The operation needs a collider but the object has none.
    #[error("{0:?} has no collider attached")]
    MissingCollider(BodyHandle),
}
