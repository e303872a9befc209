//! Rigid-body state and integration.

use nalgebra::{Matrix3, Matrix4, UnitQuaternion, Vector3};

// ComplexField provides powf() for f32 in no_std via libm
#[allow(unused_imports)]
use nalgebra::ComplexField;

use crate::collider::Collider;
use crate::error::PhysicsError;
use crate::math::{self, InverseOrSelf};

/// Default mass (kg) of objects created through
/// [`PhysicsWorld::add_default_object`](crate::world::PhysicsWorld::add_default_object).
pub const DEFAULT_MASS: f32 = 5.0;

/// A rigid body with linear and angular dynamics.
///
/// Position and orientation are authoritative. The local-to-world transform
/// and the world-space inverse inertia tensor are derived from them and are
/// recomputed by every mutator, so getters never return stale values.
///
/// Angular velocity is expressed in world space.
#[derive(Debug, Clone)]
pub struct RigidBody {
    // -- Pose --
    position: Vector3<f32>,
    orientation: UnitQuaternion<f32>,

    // -- Motion --
    velocity: Vector3<f32>,
    angular_velocity: Vector3<f32>,
    /// Reported linear acceleration (the world keeps it equal to gravity).
    linear_acceleration: Vector3<f32>,

    /// Accumulated forces applied this tick. Cleared by `integrate()`.
    force: Vector3<f32>,
    /// Accumulated torques applied this tick. Cleared by `integrate()`.
    torque: Vector3<f32>,

    /// `0.0` encodes infinite mass (a fixed body).
    inv_mass: f32,
    inv_inertia_local: Matrix3<f32>,

    // -- Derived --
    inv_inertia_world: Matrix3<f32>,
    local_to_world: Matrix4<f32>,

    /// Fraction of linear velocity retained after one second.
    linear_damping: f32,
    /// Fraction of angular velocity retained after one second.
    angular_damping: f32,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self::new(DEFAULT_MASS)
    }
}

impl RigidBody {
    /// Create a new dynamic rigid body with the given mass (in kg).
    ///
    /// The body starts with the inertia tensor of a solid unit sphere
    /// (`I = 2/5 * m`). Use [`with_inertia_for`](Self::with_inertia_for) once
    /// the collider is known.
    ///
    /// # Panics
    /// Panics if `mass` is not positive and finite.
    pub fn new(mass: f32) -> Self {
        assert!(mass > 0.0 && mass.is_finite(), "mass must be positive and finite");
        let inv_i = 1.0 / (0.4 * mass);
        let mut body = Self {
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
            velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            linear_acceleration: Vector3::zeros(),
            force: Vector3::zeros(),
            torque: Vector3::zeros(),
            inv_mass: 1.0 / mass,
            inv_inertia_local: Matrix3::from_diagonal_element(inv_i),
            inv_inertia_world: Matrix3::zeros(),
            local_to_world: Matrix4::identity(),
            linear_damping: 0.99,
            angular_damping: 0.7,
        };
        body.sync_derived_state();
        body
    }

    /// Create a fixed body (infinite mass and inertia, unaffected by forces
    /// and impulses).
    pub fn new_fixed() -> Self {
        let mut body = Self::new(1.0);
        body.inv_mass = 0.0;
        body.inv_inertia_local = Matrix3::zeros();
        body.sync_derived_state();
        body
    }

    /// Builder: set initial position.
    pub fn with_position(mut self, position: Vector3<f32>) -> Self {
        self.set_position(position);
        self
    }

    /// Builder: set initial orientation.
    pub fn with_orientation(mut self, orientation: UnitQuaternion<f32>) -> Self {
        self.set_orientation(orientation);
        self
    }

    /// Builder: set initial linear velocity.
    pub fn with_velocity(mut self, velocity: Vector3<f32>) -> Self {
        self.velocity = velocity;
        self
    }

    /// Builder: set initial angular velocity (world space, radians per second).
    pub fn with_angular_velocity(mut self, angular_velocity: Vector3<f32>) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    /// Builder: set linear damping (fraction of velocity kept per second).
    pub fn with_linear_damping(mut self, damping: f32) -> Self {
        self.set_linear_damping(damping);
        self
    }

    /// Builder: set angular damping (fraction of angular velocity kept per second).
    pub fn with_angular_damping(mut self, damping: f32) -> Self {
        self.set_angular_damping(damping);
        self
    }

    /// Builder: use the inertia tensor of a solid body shaped like `collider`.
    ///
    /// Fixed bodies keep their zero inverse inertia.
    pub fn with_inertia_for(mut self, collider: &Collider) -> Self {
        if !self.is_fixed() {
            self.set_inertia_tensor(&collider.inertia_tensor(self.mass()));
        }
        self
    }

    // -- Derived state --

    /// Recompute the local-to-world transform and the world-space inverse
    /// inertia tensor from the current pose. Every mutator of pose or inertia
    /// ends here.
    fn sync_derived_state(&mut self) {
        self.local_to_world = math::local_to_world(&self.position, &self.orientation);
        let rotation = math::rotation_block(&self.local_to_world);
        self.inv_inertia_world = rotation * self.inv_inertia_local * rotation.transpose();
    }

    // -- Forces --

    /// Apply a force (in Newtons) through the center of mass. Forces
    /// accumulate until the next [`integrate`](Self::integrate).
    #[inline]
    pub fn add_force(&mut self, force: Vector3<f32>) {
        self.force += force;
    }

    /// Apply a force at a world-space point, producing a torque about the
    /// center of mass: `τ = (point - position) × force`.
    #[inline]
    pub fn add_force_at(&mut self, force: Vector3<f32>, point: Vector3<f32>) {
        self.force += force;
        self.torque += (point - self.position).cross(&force);
    }

    /// Apply a torque (in N·m). Torques accumulate until the next
    /// [`integrate`](Self::integrate).
    #[inline]
    pub fn add_torque(&mut self, torque: Vector3<f32>) {
        self.torque += torque;
    }

    /// Apply an instantaneous linear impulse: `Δv = J / m`.
    #[inline]
    pub fn apply_linear_impulse(&mut self, impulse: Vector3<f32>) {
        if !self.is_fixed() {
            self.velocity += impulse * self.inv_mass;
        }
    }

    /// Apply an instantaneous angular impulse: `Δω = I⁻¹_world * L`.
    #[inline]
    pub fn apply_angular_impulse(&mut self, impulse: Vector3<f32>) {
        if !self.is_fixed() {
            self.angular_velocity += self.inv_inertia_world * impulse;
        }
    }

    /// Integrate this body forward by `dt` seconds using semi-implicit Euler.
    ///
    /// Velocities are updated first (with exponential damping `d^dt`), then
    /// position and orientation. Force and torque accumulators are cleared
    /// whether or not the body moved. A fixed body does not move.
    pub fn integrate(&mut self, dt: f32) {
        if !self.is_fixed() {
            // --- Linear ---
            let acceleration = self.force * self.inv_mass;
            self.velocity += acceleration * dt;
            self.velocity *= self.linear_damping.powf(dt);

            // --- Angular ---
            let angular_acceleration = self.inv_inertia_world * self.torque;
            self.angular_velocity += angular_acceleration * dt;
            self.angular_velocity *= self.angular_damping.powf(dt);

            // --- Pose ---
            self.position += self.velocity * dt;
            self.orientation =
                math::integrate_orientation(&self.orientation, &self.angular_velocity, dt);
            self.sync_derived_state();
        }

        self.force = Vector3::zeros();
        self.torque = Vector3::zeros();
    }

    /// Rotate the body by `rotation` applied in its local frame.
    pub fn rotate_by(&mut self, rotation: &UnitQuaternion<f32>) {
        let composed = self.orientation.into_inner() * rotation.into_inner();
        self.set_orientation(UnitQuaternion::new_normalize(composed));
    }

    // -- Queries --

    /// The `index`-th local axis expressed in world space, normalized.
    ///
    /// Fails for any index other than 0, 1 or 2.
    pub fn axis(&self, index: usize) -> Result<Vector3<f32>, PhysicsError> {
        math::basis_axis(&self.local_to_world, index)
    }

    /// All three local axes in world space.
    pub fn axes(&self) -> [Vector3<f32>; 3] {
        let rotation = math::rotation_block(&self.local_to_world);
        [
            rotation.column(0).normalize(),
            rotation.column(1).normalize(),
            rotation.column(2).normalize(),
        ]
    }

    /// Transform a body-local point to world space.
    #[inline]
    pub fn transform_point(&self, local: &Vector3<f32>) -> Vector3<f32> {
        math::transform_point(&self.local_to_world, local)
    }

    #[inline]
    pub fn is_fixed(&self) -> bool {
        self.inv_mass == 0.0
    }

    /// Returns the kinetic energy of this body (linear and rotational).
    pub fn kinetic_energy(&self) -> f32 {
        if self.is_fixed() {
            return 0.0;
        }
        let linear = 0.5 * self.mass() * self.velocity.norm_squared();
        let inertia_world = self.inv_inertia_world.inverse_or_self();
        let angular = 0.5 * self.angular_velocity.dot(&(inertia_world * self.angular_velocity));
        linear + angular
    }

    // -- Setters --

    /// Set the mass. `f32::INFINITY` makes the body fixed.
    pub fn set_mass(&mut self, mass: f32) -> Result<(), PhysicsError> {
        if !(mass > 0.0) {
            return Err(PhysicsError::InvalidMass(mass));
        }
        self.inv_mass = 1.0 / mass;
        self.sync_derived_state();
        Ok(())
    }

    /// Set the inverse mass directly. `0.0` makes the body fixed.
    pub fn set_inverse_mass(&mut self, inverse_mass: f32) -> Result<(), PhysicsError> {
        if !(inverse_mass >= 0.0) || inverse_mass.is_infinite() {
            return Err(PhysicsError::InvalidMass(1.0 / inverse_mass));
        }
        self.inv_mass = inverse_mass;
        self.sync_derived_state();
        Ok(())
    }

    /// Set the body-space inertia tensor. It is inverted here; a singular
    /// tensor is logged and stored uninverted.
    pub fn set_inertia_tensor(&mut self, inertia: &Matrix3<f32>) {
        self.inv_inertia_local = inertia.inverse_or_self();
        self.sync_derived_state();
    }

    /// Set the already-inverted body-space inertia tensor.
    pub fn set_inverse_inertia_tensor(&mut self, inverse_inertia: &Matrix3<f32>) {
        self.inv_inertia_local = *inverse_inertia;
        self.sync_derived_state();
    }

    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.position = position;
        self.sync_derived_state();
    }

    pub fn set_orientation(&mut self, orientation: UnitQuaternion<f32>) {
        self.orientation = orientation;
        self.sync_derived_state();
    }

    pub fn set_linear_velocity(&mut self, velocity: Vector3<f32>) {
        self.velocity = velocity;
    }

    /// Set angular velocity in world space.
    pub fn set_angular_velocity(&mut self, angular_velocity: Vector3<f32>) {
        self.angular_velocity = angular_velocity;
    }

    pub fn set_linear_acceleration(&mut self, acceleration: Vector3<f32>) {
        self.linear_acceleration = acceleration;
    }

    /// Fraction of linear velocity kept per second, clamped to `0.0..=1.0`.
    pub fn set_linear_damping(&mut self, damping: f32) {
        self.linear_damping = damping.clamp(0.0, 1.0);
    }

    /// Fraction of angular velocity kept per second, clamped to `0.0..=1.0`.
    pub fn set_angular_damping(&mut self, damping: f32) {
        self.angular_damping = damping.clamp(0.0, 1.0);
    }

    // -- Getters --

    /// Mass in kg; infinite for a fixed body.
    #[inline]
    pub fn mass(&self) -> f32 {
        if self.is_fixed() {
            f32::INFINITY
        } else {
            1.0 / self.inv_mass
        }
    }

    #[inline]
    pub fn inverse_mass(&self) -> f32 {
        self.inv_mass
    }

    /// Inverse inertia tensor in body space.
    #[inline]
    pub fn inverse_inertia_tensor(&self) -> &Matrix3<f32> {
        &self.inv_inertia_local
    }

    /// Inverse inertia tensor rotated into world space: `R * I⁻¹ * Rᵀ`.
    #[inline]
    pub fn inverse_inertia_tensor_world(&self) -> &Matrix3<f32> {
        &self.inv_inertia_world
    }

    #[inline]
    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    #[inline]
    pub fn orientation(&self) -> UnitQuaternion<f32> {
        self.orientation
    }

    #[inline]
    pub fn linear_velocity(&self) -> Vector3<f32> {
        self.velocity
    }

    /// Angular velocity in world space.
    #[inline]
    pub fn angular_velocity(&self) -> Vector3<f32> {
        self.angular_velocity
    }

    /// Angular velocity expressed in the body's local frame.
    pub fn local_angular_velocity(&self) -> Vector3<f32> {
        self.orientation.inverse_transform_vector(&self.angular_velocity)
    }

    #[inline]
    pub fn linear_acceleration(&self) -> Vector3<f32> {
        self.linear_acceleration
    }

    #[inline]
    pub fn linear_damping(&self) -> f32 {
        self.linear_damping
    }

    #[inline]
    pub fn angular_damping(&self) -> f32 {
        self.angular_damping
    }

    /// Pending force for this tick.
    #[inline]
    pub fn force(&self) -> Vector3<f32> {
        self.force
    }

    /// Pending torque for this tick.
    #[inline]
    pub fn torque(&self) -> Vector3<f32> {
        self.torque
    }

    #[inline]
    pub fn local_to_world(&self) -> &Matrix4<f32> {
        &self.local_to_world
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use crate::math::quaternion_from_axis_angle;
    use core::f32::consts::FRAC_PI_2;

    const EPSILON: f32 = 1e-4;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn approx_vec_eq(a: &Vector3<f32>, b: &Vector3<f32>) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
    }

    #[test]
    fn test_body_creation() {
        let body = RigidBody::new(5.0);
        assert!(approx_eq(body.mass(), 5.0));
        assert!(approx_eq(body.inverse_mass(), 0.2));
        assert!(!body.is_fixed());
        assert!(approx_vec_eq(&body.position(), &Vector3::zeros()));
        assert!(approx_eq(body.inverse_inertia_tensor()[(0, 0)], 0.5));
        assert_eq!(body.local_to_world(), &Matrix4::identity());
    }

    #[test]
    fn test_fixed_body() {
        let body = RigidBody::new_fixed();
        assert!(body.is_fixed());
        assert!(body.mass().is_infinite());
        assert_eq!(body.inverse_inertia_tensor_world(), &Matrix3::zeros());
    }

    #[test]
    #[should_panic]
    fn test_body_zero_mass_panics() {
        RigidBody::new(0.0);
    }

    #[test]
    fn test_set_mass_validation() {
        let mut body = RigidBody::new(1.0);
        assert_eq!(body.set_mass(-1.0), Err(PhysicsError::InvalidMass(-1.0)));
        assert!(body.set_mass(f32::NAN).is_err());
        body.set_mass(f32::INFINITY).unwrap();
        assert!(body.is_fixed());
        body.set_inverse_mass(0.5).unwrap();
        assert!(approx_eq(body.mass(), 2.0));
        assert!(body.set_inverse_mass(-0.5).is_err());
    }

    #[test]
    fn test_fixed_body_integrate_is_noop() {
        let mut body = RigidBody::new_fixed()
            .with_position(Vector3::new(1.0, 2.0, 3.0))
            .with_orientation(quaternion_from_axis_angle(&Vector3::x(), 0.3));
        let before = body.clone();
        body.add_force(Vector3::new(0.0, -100.0, 0.0));
        body.add_torque(Vector3::new(5.0, 0.0, 0.0));
        for dt in [0.0, 1.0 / 60.0, 1.0, 100.0] {
            body.integrate(dt);
        }
        assert_eq!(body.position(), before.position());
        assert_eq!(body.orientation(), before.orientation());
        assert_eq!(body.linear_velocity(), before.linear_velocity());
        assert_eq!(body.angular_velocity(), before.angular_velocity());
        assert_eq!(body.force(), Vector3::zeros());
    }

    #[test]
    fn test_integrate_applies_force_then_clears() {
        let mut body = RigidBody::new(2.0).with_linear_damping(1.0);
        body.add_force(Vector3::new(4.0, 0.0, 0.0));
        body.integrate(0.5);
        // a = 2, v = 1, x = v * dt = 0.5 (semi-implicit)
        assert!(approx_vec_eq(&body.linear_velocity(), &Vector3::new(1.0, 0.0, 0.0)));
        assert!(approx_vec_eq(&body.position(), &Vector3::new(0.5, 0.0, 0.0)));
        assert_eq!(body.force(), Vector3::zeros());

        // No force re-added: velocity carries on unchanged
        body.integrate(0.5);
        assert!(approx_vec_eq(&body.linear_velocity(), &Vector3::new(1.0, 0.0, 0.0)));
        assert!(approx_vec_eq(&body.position(), &Vector3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_damping_is_exponential_in_time() {
        let mut a = RigidBody::new(1.0)
            .with_velocity(Vector3::new(10.0, 0.0, 0.0))
            .with_linear_damping(0.5);
        let mut b = a.clone();
        a.integrate(1.0);
        for _ in 0..4 {
            b.integrate(0.25);
        }
        assert!(approx_eq(a.linear_velocity().x, 5.0));
        assert!(approx_eq(b.linear_velocity().x, 5.0));
    }

    #[test]
    fn test_add_force_at_produces_torque() {
        let mut body = RigidBody::new(1.0).with_position(Vector3::new(1.0, 0.0, 0.0));
        body.add_force_at(Vector3::new(0.0, 1.0, 0.0), Vector3::new(2.0, 0.0, 0.0));
        assert!(approx_vec_eq(&body.force(), &Vector3::new(0.0, 1.0, 0.0)));
        assert!(approx_vec_eq(&body.torque(), &Vector3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_angular_integration_rotates() {
        let mut body = RigidBody::new(1.0)
            .with_angular_velocity(Vector3::new(0.0, 0.0, 1.0))
            .with_angular_damping(1.0);
        for _ in 0..100 {
            body.integrate(0.01);
        }
        assert!(approx_eq(body.orientation().angle(), 1.0));
        let x = body.axis(0).unwrap();
        assert!(approx_vec_eq(&x, &Vector3::new(1.0_f32.cos(), 1.0_f32.sin(), 0.0)));
    }

    #[test]
    fn test_orientation_round_trip() {
        let q = quaternion_from_axis_angle(&Vector3::new(1.0, 2.0, -0.5), 0.8);
        let mut body = RigidBody::new(1.0);
        body.set_orientation(q);
        assert_eq!(body.orientation(), q);

        let block = math::rotation_block(body.local_to_world());
        assert!((block - q.to_rotation_matrix().into_inner()).norm() < EPSILON);
    }

    #[test]
    fn test_world_inertia_follows_orientation() {
        let collider = Collider::Box {
            half_extents: Vector3::new(2.0, 0.5, 0.5),
        };
        let mut body = RigidBody::new(1.0).with_inertia_for(&collider);
        let local = *body.inverse_inertia_tensor();
        assert_eq!(body.inverse_inertia_tensor_world(), &local);

        // Quarter turn about z swaps the x and y principal axes
        body.set_orientation(quaternion_from_axis_angle(&Vector3::z(), FRAC_PI_2));
        let world = body.inverse_inertia_tensor_world();
        assert!(approx_eq(world[(0, 0)], local[(1, 1)]));
        assert!(approx_eq(world[(1, 1)], local[(0, 0)]));
        assert!(approx_eq(world[(2, 2)], local[(2, 2)]));
    }

    #[test]
    fn test_transform_follows_position() {
        let mut body = RigidBody::new(1.0);
        body.set_position(Vector3::new(0.0, 5.0, 0.0));
        assert!(approx_vec_eq(
            &body.transform_point(&Vector3::new(1.0, 0.0, 0.0)),
            &Vector3::new(1.0, 5.0, 0.0)
        ));
    }

    #[test]
    fn test_axis_out_of_range() {
        let body = RigidBody::new(1.0);
        assert_eq!(body.axis(3), Err(PhysicsError::AxisOutOfRange(3)));
        assert!(approx_vec_eq(&body.axis(2).unwrap(), &Vector3::z()));
    }

    #[test]
    fn test_singular_inertia_is_kept() {
        let mut body = RigidBody::new(1.0);
        let singular = Matrix3::from_diagonal(&Vector3::new(1.0, 0.0, 1.0));
        body.set_inertia_tensor(&singular);
        assert_eq!(body.inverse_inertia_tensor(), &singular);
    }

    #[test]
    fn test_impulses_ignore_fixed_bodies() {
        let mut body = RigidBody::new_fixed();
        body.apply_linear_impulse(Vector3::new(1.0, 2.0, 3.0));
        body.apply_angular_impulse(Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(body.linear_velocity(), Vector3::zeros());
        assert_eq!(body.angular_velocity(), Vector3::zeros());
    }

    #[test]
    fn test_rotate_by_composes_locally() {
        let mut body = RigidBody::new(1.0)
            .with_orientation(quaternion_from_axis_angle(&Vector3::z(), FRAC_PI_2));
        body.rotate_by(&quaternion_from_axis_angle(&Vector3::x(), FRAC_PI_2));
        // Local x is still world y after a rotation about local x
        assert!(approx_vec_eq(&body.axis(0).unwrap(), &Vector3::y()));
        assert!(approx_eq(body.orientation().into_inner().norm(), 1.0));
    }

    #[test]
    fn test_local_angular_velocity() {
        let body = RigidBody::new(1.0)
            .with_orientation(quaternion_from_axis_angle(&Vector3::z(), FRAC_PI_2))
            .with_angular_velocity(Vector3::new(0.0, 1.0, 0.0));
        // World y is the body's local x
        assert!(approx_vec_eq(&body.local_angular_velocity(), &Vector3::x()));
    }

    #[test]
    fn test_kinetic_energy() {
        let body = RigidBody::new(2.0).with_velocity(Vector3::new(3.0, 0.0, 0.0));
        assert!(approx_eq(body.kinetic_energy(), 9.0));
        assert_eq!(RigidBody::new_fixed().kinetic_energy(), 0.0);
    }
}
