#![no_std]
//! A `no_std` rigid-body physics kernel for spheres and oriented boxes.
//!
//! Bodies live in a fixed-capacity [`PhysicsWorld`] and are addressed by
//! [`BodyHandle`]. Each tick applies gravity, runs the narrow phase over every
//! pair (sphere/box against sphere/box and static planes, boxes via the
//! separating axis test), resolves the contacts with a sequential-impulse
//! solver (Baumgarte stabilization, accumulated-impulse clamping, Coulomb
//! friction) and integrates with semi-implicit Euler.
//!
//! Linear algebra comes from `nalgebra`; [`math`] only adds what the solver
//! needs on top of it.

pub mod arena;
pub mod body;
pub mod collider;
pub mod collision_manager;
pub mod contact;
pub mod error;
pub mod math;
pub mod narrow_phase;
pub mod raycast;
pub mod solver;
pub mod world;

pub use arena::{BodyHandle, PhysicsObject};
pub use body::RigidBody;
pub use collider::{Collider, Constraint, Plane, ShapeKind};
pub use collision_manager::CollisionManager;
pub use contact::{CollisionManifold, ContactPoint};
pub use error::PhysicsError;
pub use solver::SolverConfig;
pub use world::PhysicsWorld;
