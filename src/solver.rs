//! Sequential-impulse contact solver.
//!
//! Each manifold is solved on its own, repeatedly, with every pass seeing
//! the velocities left by the manifolds before it. A normal impulse:
//!
//! ```text
//! j = (-(v_rel · n) + target + bias) / (1/m_a + 1/m_b + ((I_a⁻¹(r_a × n)) × r_a) · n + ...)
//! ```
//!
//! where `target` is the restitution separating speed captured before the
//! first pass and `bias` is the Baumgarte positional correction. The total
//! normal impulse per manifold is clamped to be non-negative and Coulomb
//! friction is clamped against it.

use nalgebra::Vector3;

use crate::body::RigidBody;
use crate::contact::CollisionManifold;
use crate::math::tangent_basis;
use crate::narrow_phase::ContactMaterial;

/// Tunables for contact resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolverConfig {
    /// Coulomb friction coefficient for every contact.
    pub friction: f32,
    /// Restitution between two bodies.
    pub object_restitution: f32,
    /// Restitution between a body and a static constraint.
    pub ground_restitution: f32,
    /// Solver passes over all manifolds per tick.
    pub iteration_limit: u32,
    /// Penetration left uncorrected, so resting contacts do not jitter.
    pub penetration_tolerance: f32,
    /// Closing speed below which contacts do not bounce.
    pub closing_speed_tolerance: f32,
    /// Fraction of excess penetration removed per second of `dt` (Baumgarte).
    pub correction_ratio: f32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            friction: 0.6,
            object_restitution: 0.5,
            ground_restitution: 0.2,
            iteration_limit: 30,
            penetration_tolerance: 0.0005,
            closing_speed_tolerance: 0.005,
            correction_ratio: 0.1,
        }
    }
}

impl SolverConfig {
    /// Material for body-vs-body contacts.
    pub fn object_material(&self) -> ContactMaterial {
        ContactMaterial {
            restitution: self.object_restitution,
            friction: self.friction,
        }
    }

    /// Material for body-vs-constraint contacts.
    pub fn ground_material(&self) -> ContactMaterial {
        ContactMaterial {
            restitution: self.ground_restitution,
            friction: self.friction,
        }
    }
}

/// What one solver visit did to a manifold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpulseOutcome {
    /// A normal impulse (possibly zero after clamping) was applied.
    Applied,
    /// Zero effective mass or a non-finite impulse; nothing was applied.
    SkippedDegenerate,
    /// Neither side can move.
    SkippedStatic,
}

/// Contact offsets from each body's centre of mass.
#[derive(Debug, Clone, Copy)]
struct LeverArms {
    a: Vector3<f32>,
    b: Vector3<f32>,
}

impl LeverArms {
    fn new(manifold: &CollisionManifold, a: &RigidBody, b: Option<&RigidBody>) -> Self {
        let [point_a, point_b] = manifold.contact_points;
        let a_arm = point_a.point - a.position();
        let b_arm = match b {
            Some(b) if point_b.valid => point_b.point - b.position(),
            // Fall back to body a's point when b's own point is missing
            Some(b) => point_a.point - b.position(),
            None => Vector3::zeros(),
        };
        Self { a: a_arm, b: b_arm }
    }
}

/// Angular share of the effective inverse mass along `direction`.
fn angular_term(body: &RigidBody, arm: &Vector3<f32>, direction: &Vector3<f32>) -> f32 {
    if body.is_fixed() {
        return 0.0;
    }
    (body.inverse_inertia_tensor_world() * arm.cross(direction))
        .cross(arm)
        .dot(direction)
}

fn effective_inverse_mass(
    a: &RigidBody,
    b: Option<&RigidBody>,
    arms: &LeverArms,
    direction: &Vector3<f32>,
) -> f32 {
    let mut sum = a.inverse_mass() + angular_term(a, &arms.a, direction);
    if let Some(b) = b {
        sum += b.inverse_mass() + angular_term(b, &arms.b, direction);
    }
    sum
}

/// Velocity of `a`'s contact point relative to `b`'s.
fn relative_velocity(a: &RigidBody, b: Option<&RigidBody>, arms: &LeverArms) -> Vector3<f32> {
    let mut velocity = a.linear_velocity() + a.angular_velocity().cross(&arms.a);
    if let Some(b) = b {
        velocity -= b.linear_velocity() + b.angular_velocity().cross(&arms.b);
    }
    velocity
}

/// Apply `magnitude` along `direction` to `a` and the opposite to `b`, at
/// the given lever arms. Fixed bodies ignore it.
pub fn apply_impulse(
    a: &mut RigidBody,
    b: Option<&mut RigidBody>,
    arm_a: &Vector3<f32>,
    arm_b: &Vector3<f32>,
    direction: &Vector3<f32>,
    magnitude: f32,
) {
    let impulse = direction * magnitude;
    a.apply_linear_impulse(impulse);
    a.apply_angular_impulse(arm_a.cross(&impulse));
    if let Some(b) = b {
        b.apply_linear_impulse(-impulse);
        b.apply_angular_impulse(arm_b.cross(&-impulse));
    }
}

/// Reset the manifold's per-tick solver state and capture the restitution
/// target from the velocities before any impulse of this tick.
pub fn prepare_manifold(
    manifold: &mut CollisionManifold,
    a: &RigidBody,
    b: Option<&RigidBody>,
    config: &SolverConfig,
) {
    manifold.accumulated_normal_impulse = 0.0;
    let arms = LeverArms::new(manifold, a, b);
    let closing_speed = -relative_velocity(a, b, &arms).dot(&manifold.normal);
    manifold.target_separating_speed = if closing_speed > config.closing_speed_tolerance {
        manifold.restitution * (closing_speed - config.closing_speed_tolerance)
    } else {
        0.0
    };
}

/// One solver visit: normal impulse with accumulated clamping, then friction.
pub fn sequential_impulse(
    manifold: &mut CollisionManifold,
    a: &mut RigidBody,
    mut b: Option<&mut RigidBody>,
    config: &SolverConfig,
    dt: f32,
) -> ImpulseOutcome {
    let inverse_mass_sum = a.inverse_mass() + b.as_deref().map_or(0.0, RigidBody::inverse_mass);
    if inverse_mass_sum == 0.0 {
        return ImpulseOutcome::SkippedStatic;
    }

    let normal = manifold.normal;
    let arms = LeverArms::new(manifold, a, b.as_deref());

    let effective = effective_inverse_mass(a, b.as_deref(), &arms, &normal);
    let normal_speed = relative_velocity(a, b.as_deref(), &arms).dot(&normal);

    let excess = manifold.penetration_depth - config.penetration_tolerance;
    let bias = if excess > 0.0 && dt > 0.0 {
        excess * config.correction_ratio / dt
    } else {
        0.0
    };

    let impulse = (-normal_speed + manifold.target_separating_speed + bias) / effective;
    if effective <= 0.0 || !impulse.is_finite() {
        log::trace!("skipping degenerate contact impulse (effective mass {})", effective);
        return ImpulseOutcome::SkippedDegenerate;
    }

    let previous = manifold.accumulated_normal_impulse;
    manifold.accumulated_normal_impulse = (previous + impulse).max(0.0);
    let delta = manifold.accumulated_normal_impulse - previous;
    apply_impulse(a, b.as_deref_mut(), &arms.a, &arms.b, &normal, delta);

    apply_friction_impulses(manifold, a, b, &arms);
    ImpulseOutcome::Applied
}

/// Coulomb friction along two tangents, each clamped to
/// `friction * accumulated normal impulse`.
fn apply_friction_impulses(
    manifold: &CollisionManifold,
    a: &mut RigidBody,
    mut b: Option<&mut RigidBody>,
    arms: &LeverArms,
) {
    let max_friction = (manifold.friction * manifold.accumulated_normal_impulse).max(0.0);
    if max_friction == 0.0 {
        return;
    }

    let (tangent1, tangent2) = tangent_basis(&manifold.normal);
    for tangent in [tangent1, tangent2] {
        let effective = effective_inverse_mass(a, b.as_deref(), arms, &tangent);
        if effective <= 0.0 {
            continue;
        }
        let tangent_speed = relative_velocity(a, b.as_deref(), arms).dot(&tangent);
        let impulse = (-tangent_speed / effective).clamp(-max_friction, max_friction);
        if !impulse.is_finite() {
            log::trace!("skipping non-finite friction impulse");
            continue;
        }
        apply_impulse(a, b.as_deref_mut(), &arms.a, &arms.b, &tangent, impulse);
    }
}
