//! Contact manifolds produced by the narrow phase and consumed by the solver.

use nalgebra::Vector3;

use crate::arena::BodyHandle;

/// A world-space contact location. Invalid points are ignored by the solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPoint {
    pub point: Vector3<f32>,
    pub valid: bool,
}

impl ContactPoint {
    pub const INVALID: ContactPoint = ContactPoint {
        point: Vector3::new(0.0, 0.0, 0.0),
        valid: false,
    };

    #[inline]
    pub fn new(point: Vector3<f32>) -> Self {
        Self { point, valid: true }
    }
}

/// One contact event between two bodies, or between a body and a static
/// constraint, for a single tick.
///
/// Manifolds are rebuilt from scratch each tick; nothing here survives into
/// the next one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionManifold {
    pub body_a: BodyHandle,
    /// `None` for a contact with a static constraint.
    pub body_b: Option<BodyHandle>,
    /// Unit normal pointing from `body_b` (or the constraint) toward `body_a`.
    pub normal: Vector3<f32>,
    /// Overlap along the normal, never negative.
    pub penetration_depth: f32,
    pub restitution: f32,
    pub friction: f32,
    /// Running total of normal impulse applied this tick.
    pub accumulated_normal_impulse: f32,
    /// Separating speed the solver aims for, set once per tick before the
    /// first solver pass.
    pub target_separating_speed: f32,
    /// Contact on `body_a`'s surface (index 0) and on `body_b`'s (index 1).
    pub contact_points: [ContactPoint; 2],
}

impl CollisionManifold {
    /// A manifold with no impulse applied yet. Body handles are filled in by
    /// the caller that knows them.
    pub fn new(
        body_a: BodyHandle,
        body_b: Option<BodyHandle>,
        normal: Vector3<f32>,
        penetration_depth: f32,
        contact_points: [ContactPoint; 2],
    ) -> Self {
        Self {
            body_a,
            body_b,
            normal,
            penetration_depth: penetration_depth.max(0.0),
            restitution: 0.0,
            friction: 0.0,
            accumulated_normal_impulse: 0.0,
            target_separating_speed: 0.0,
            contact_points,
        }
    }

    /// Builder: set the surface material of the contact.
    pub fn with_material(mut self, restitution: f32, friction: f32) -> Self {
        self.restitution = restitution;
        self.friction = friction;
        self
    }

    /// Whether the contact involves a static constraint.
    #[inline]
    pub fn is_constraint_contact(&self) -> bool {
        self.body_b.is_none()
    }

    /// Valid contact points.
    pub fn points(&self) -> impl Iterator<Item = &Vector3<f32>> {
        self.contact_points
            .iter()
            .filter(|contact| contact.valid)
            .map(|contact| &contact.point)
    }
}
