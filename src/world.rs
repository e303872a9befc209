//! Top-level simulation container.
//!
//! [`PhysicsWorld`] owns every object and static constraint and runs one
//! simulation tick per [`simulate`](PhysicsWorld::simulate) call:
//!
//! 1. gravity is added to every movable body as a force,
//! 2. the collision manager rebuilds the contact list,
//! 3. the sequential-impulse solver adjusts velocities,
//! 4. every body integrates and clears its force accumulators.
//!
//! # Example
//!
//! ```
//! use impulse3d::{PhysicsWorld, ShapeKind};
//! use nalgebra::Vector3;
//!
//! let mut world = PhysicsWorld::<16>::new();
//! let ball = world
//!     .add_default_object(Vector3::new(0.0, 5.0, 0.0), ShapeKind::Sphere)
//!     .unwrap();
//! for _ in 0..60 {
//!     world.simulate(1.0 / 60.0);
//! }
//! assert!(world.body(ball).unwrap().position().y < 5.0);
//! ```

use heapless::Vec;
use nalgebra::{Matrix3, Vector3};

use crate::arena::{BodyHandle, BodySet, PhysicsObject};
use crate::body::{RigidBody, DEFAULT_MASS};
use crate::collider::{Collider, Constraint, Plane, ShapeKind};
use crate::collision_manager::CollisionManager;
use crate::contact::CollisionManifold;
use crate::error::PhysicsError;
use crate::raycast;
use crate::solver::SolverConfig;

/// Gravity of a new world (m/s²).
pub const DEFAULT_GRAVITY: Vector3<f32> = Vector3::new(0.0, -9.8, 0.0);

/// A physics world holding up to `N` objects, `P` static constraints and `C`
/// contact manifolds per tick.
#[derive(Debug, Clone)]
pub struct PhysicsWorld<const N: usize, const P: usize = 4, const C: usize = 256> {
    objects: BodySet<N>,
    constraints: Vec<Constraint, P>,
    collision_manager: CollisionManager<C>,
    gravity: Vector3<f32>,
}

impl<const N: usize, const P: usize, const C: usize> Default for PhysicsWorld<N, P, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize, const P: usize, const C: usize> PhysicsWorld<N, P, C> {
    /// A world with default gravity and a ground plane at `y = 0` facing up.
    pub fn new() -> Self {
        let mut world = Self::empty();
        if world.add_constraint(Plane::ground().into()).is_err() {
            log::warn!("no room for the ground plane (constraint capacity {})", P);
        }
        world
    }

    /// A world with default gravity and no constraints.
    pub fn empty() -> Self {
        Self {
            objects: BodySet::new(),
            constraints: Vec::new(),
            collision_manager: CollisionManager::default(),
            gravity: DEFAULT_GRAVITY,
        }
    }

    // -- Simulation --

    /// Advance the world by one tick of `dt` seconds.
    pub fn simulate(&mut self, dt: f32) {
        let gravity = self.gravity;
        for (_, object) in self.objects.iter_mut() {
            let body = &mut object.body;
            if !body.is_fixed() {
                body.add_force(gravity * body.mass());
            }
        }

        self.collision_manager
            .detect_collision(&self.objects, &self.constraints);
        self.collision_manager.resolve_collision(&mut self.objects, dt);

        for (_, object) in self.objects.iter_mut() {
            object.body.integrate(dt);
        }
    }

    /// Advance by `dt` split into `substeps` equal ticks.
    pub fn simulate_substeps(&mut self, dt: f32, substeps: u32) {
        if substeps == 0 {
            return;
        }
        let sub_dt = dt / substeps as f32;
        for _ in 0..substeps {
            self.simulate(sub_dt);
        }
    }

    // -- Objects --

    /// Add a body without a collider. It moves under gravity but never collides.
    pub fn add_rigid_body(&mut self, body: RigidBody) -> Result<BodyHandle, PhysicsError> {
        self.insert(body, None)
    }

    /// Attach (or replace) the collider of an existing object.
    pub fn add_collider(&mut self, handle: BodyHandle, collider: Collider) -> Result<(), PhysicsError> {
        let object = self
            .objects
            .get_mut(handle)
            .ok_or(PhysicsError::StaleHandle(handle))?;
        object.collider = Some(collider);
        Ok(())
    }

    /// Add a body together with its collider.
    pub fn add_physical_object(
        &mut self,
        body: RigidBody,
        collider: Collider,
    ) -> Result<BodyHandle, PhysicsError> {
        self.insert(body, Some(collider))
    }

    /// Add a default-sized object of `kind` at `position`, with the default
    /// mass and the matching solid-shape inertia.
    pub fn add_default_object(
        &mut self,
        position: Vector3<f32>,
        kind: ShapeKind,
    ) -> Result<BodyHandle, PhysicsError> {
        let collider = Collider::default_for(kind);
        let body = RigidBody::new(DEFAULT_MASS)
            .with_inertia_for(&collider)
            .with_position(position);
        self.add_physical_object(body, collider)
    }

    fn insert(&mut self, mut body: RigidBody, collider: Option<Collider>) -> Result<BodyHandle, PhysicsError> {
        body.set_linear_acceleration(self.gravity);
        let handle = self.objects.insert(PhysicsObject { body, collider })?;
        log::debug!("added {:?} ({:?})", handle, collider.map(|c| c.kind()));
        Ok(handle)
    }

    /// Remove an object and hand it back. Its handle is stale afterwards.
    pub fn remove_physics_object(&mut self, handle: BodyHandle) -> Result<PhysicsObject, PhysicsError> {
        let object = self.objects.remove(handle)?;
        log::debug!("removed {:?}", handle);
        Ok(object)
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.objects.get(handle).map(|object| &object.body)
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.objects.get_mut(handle).map(|object| &mut object.body)
    }

    pub fn collider(&self, handle: BodyHandle) -> Option<&Collider> {
        self.objects.get(handle).and_then(|object| object.collider.as_ref())
    }

    /// Live objects in insertion-slot order.
    pub fn objects(&self) -> impl Iterator<Item = (BodyHandle, &PhysicsObject)> {
        self.objects.iter()
    }

    /// Number of live objects.
    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Pin an object in place (`fixed = true`) or release it.
    ///
    /// Fixing zeroes the inverse mass, inverse inertia and both velocities.
    /// Releasing restores the default mass and the collider's inertia.
    pub fn set_fixed(&mut self, handle: BodyHandle, fixed: bool) -> Result<(), PhysicsError> {
        let object = self
            .objects
            .get_mut(handle)
            .ok_or(PhysicsError::StaleHandle(handle))?;
        let body = &mut object.body;
        if fixed {
            body.set_inverse_mass(0.0)?;
            body.set_inverse_inertia_tensor(&Matrix3::zeros());
            body.set_linear_velocity(Vector3::zeros());
            body.set_angular_velocity(Vector3::zeros());
        } else {
            body.set_mass(DEFAULT_MASS)?;
            let inertia = object
                .collider
                .unwrap_or(Collider::DEFAULT_SPHERE)
                .inertia_tensor(DEFAULT_MASS);
            body.set_inertia_tensor(&inertia);
        }
        Ok(())
    }

    /// Resize an object's collider (one value for a sphere, three for a box)
    /// and, for a movable body, refresh its inertia to match.
    pub fn set_scale(&mut self, handle: BodyHandle, values: &[f32]) -> Result<(), PhysicsError> {
        let object = self
            .objects
            .get_mut(handle)
            .ok_or(PhysicsError::StaleHandle(handle))?;
        let collider = object
            .collider
            .as_mut()
            .ok_or(PhysicsError::MissingCollider(handle))?;
        collider.set_scale(values)?;
        if !object.body.is_fixed() {
            let inertia = collider.inertia_tensor(object.body.mass());
            object.body.set_inertia_tensor(&inertia);
        }
        Ok(())
    }

    // -- Constraints --

    /// Add a static constraint, returning its index.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<usize, PhysicsError> {
        self.constraints
            .push(constraint)
            .map_err(|_| PhysicsError::CapacityExceeded { capacity: P })?;
        Ok(self.constraints.len() - 1)
    }

    /// Remove the constraint at `index`; later constraints shift down by one.
    pub fn remove_constraint(&mut self, index: usize) -> Option<Constraint> {
        if index < self.constraints.len() {
            Some(self.constraints.remove(index))
        } else {
            None
        }
    }

    #[inline]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    // -- Tunables --

    #[inline]
    pub fn gravity(&self) -> Vector3<f32> {
        self.gravity
    }

    /// Set gravity. Every body's reported linear acceleration follows.
    pub fn set_gravity(&mut self, gravity: Vector3<f32>) {
        self.gravity = gravity;
        for (_, object) in self.objects.iter_mut() {
            object.body.set_linear_acceleration(gravity);
        }
    }

    pub fn set_ground_restitution(&mut self, restitution: f32) {
        self.collision_manager.config.ground_restitution = restitution;
    }

    pub fn set_object_restitution(&mut self, restitution: f32) {
        self.collision_manager.config.object_restitution = restitution;
    }

    pub fn set_friction(&mut self, friction: f32) {
        self.collision_manager.config.friction = friction;
    }

    #[inline]
    pub fn solver_config(&self) -> &SolverConfig {
        self.collision_manager.config()
    }

    #[inline]
    pub fn solver_config_mut(&mut self) -> &mut SolverConfig {
        self.collision_manager.config_mut()
    }

    // -- Queries --

    /// Distance along the ray from `origin` to the object's collider.
    ///
    /// `Ok(None)` means the ray misses (or the object is behind the origin).
    pub fn calc_distance_between_ray_and_object(
        &self,
        handle: BodyHandle,
        origin: &Vector3<f32>,
        direction: &Vector3<f32>,
    ) -> Result<Option<f32>, PhysicsError> {
        let object = self.objects.get(handle).ok_or(PhysicsError::StaleHandle(handle))?;
        let collider = object
            .collider
            .as_ref()
            .ok_or(PhysicsError::MissingCollider(handle))?;
        Ok(raycast::ray_distance(origin, direction, &object.body, collider))
    }

    /// The object whose collider the ray hits first, at a positive distance.
    pub fn pick(&self, origin: &Vector3<f32>, direction: &Vector3<f32>) -> Option<(BodyHandle, f32)> {
        self.objects
            .iter()
            .filter_map(|(handle, object)| {
                let collider = object.collider.as_ref()?;
                raycast::ray_distance(origin, direction, &object.body, collider)
                    .filter(|distance| *distance > 0.0)
                    .map(|distance| (handle, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Contacts of the last tick, for inspection and debug drawing.
    #[inline]
    pub fn manifolds(&self) -> &[CollisionManifold] {
        self.collision_manager.manifolds()
    }

    /// Contacts dropped in the last tick because the contact list was full.
    #[inline]
    pub fn dropped_manifolds(&self) -> usize {
        self.collision_manager.dropped_manifolds()
    }
}
