//! Linear-algebra helpers layered on top of `nalgebra`.
//!
//! `nalgebra` supplies the vector, matrix and quaternion types themselves
//! (`Matrix4` stores its four columns contiguously, column-major). This module
//! only adds the operations the simulation needs that nalgebra does not spell
//! the same way: singular-tolerant inversion, checked flat indexing, pose to
//! transform composition and first-order quaternion integration.

use nalgebra::{
    Isometry3, Matrix3, Matrix4, Quaternion, SMatrix, Translation3, Unit, UnitQuaternion, Vector3,
};

// ComplexField provides sqrt()/abs() for f32 in no_std via libm
#[allow(unused_imports)]
use nalgebra::ComplexField;

use crate::error::PhysicsError;

/// Determinant magnitude at or below which a matrix is treated as singular.
pub const SINGULAR_EPSILON: f32 = 1e-6;

/// Component of a unit normal above which the x axis is considered dominant
/// when building a tangent basis (`1/sqrt(3)`).
const DOMINANT_AXIS_THRESHOLD: f32 = 0.57735;

/// Inversion that degrades gracefully on singular input.
pub trait InverseOrSelf: Sized {
    /// Returns the inverse when `|det| > SINGULAR_EPSILON`.
    ///
    /// A singular matrix is logged and returned unchanged, so callers must be
    /// prepared for a non-inverse coming back (e.g. a degenerate inertia
    /// tensor).
    fn inverse_or_self(&self) -> Self;
}

macro_rules! impl_inverse_or_self {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl InverseOrSelf for $ty {
                fn inverse_or_self(&self) -> Self {
                    let det = self.determinant();
                    if det.abs() > SINGULAR_EPSILON {
                        if let Some(inverse) = self.try_inverse() {
                            return inverse;
                        }
                    }
                    log::warn!("{} is singular (det = {}), returning it uninverted", $name, det);
                    *self
                }
            }
        )*
    };
}

impl_inverse_or_self!(Matrix3<f32> => "Matrix3", Matrix4<f32> => "Matrix4");

/// Reads component `index` of a vector or matrix in flat column-major order.
///
/// Plain `m[index]` panics when out of range; this is the recoverable form.
pub fn component<const R: usize, const C: usize>(
    m: &SMatrix<f32, R, C>,
    index: usize,
) -> Result<f32, PhysicsError> {
    m.as_slice()
        .get(index)
        .copied()
        .ok_or(PhysicsError::IndexOutOfRange { index, len: R * C })
}

/// Upper-left 3×3 block of a transform (its rotation part for rigid transforms).
#[inline]
pub fn rotation_block(m: &Matrix4<f32>) -> Matrix3<f32> {
    m.fixed_view::<3, 3>(0, 0).into_owned()
}

/// The `index`-th basis column of a transform, normalized.
pub fn basis_axis(m: &Matrix4<f32>, index: usize) -> Result<Vector3<f32>, PhysicsError> {
    if index > 2 {
        return Err(PhysicsError::AxisOutOfRange(index));
    }
    let column: Vector3<f32> = m.fixed_view::<3, 1>(0, index).into_owned();
    Ok(column.normalize())
}

/// Builds the local-to-world transform for a pose.
#[inline]
pub fn local_to_world(position: &Vector3<f32>, orientation: &UnitQuaternion<f32>) -> Matrix4<f32> {
    Isometry3::from_parts(Translation3::from(*position), *orientation).to_homogeneous()
}

/// Applies an affine transform to a point (w = 1).
#[inline]
pub fn transform_point(m: &Matrix4<f32>, point: &Vector3<f32>) -> Vector3<f32> {
    (m * point.push(1.0)).xyz()
}

/// Advances `orientation` by the world-space angular velocity `omega` over `dt`.
///
/// First order: `q' = q + (dt/2) * (0, ω) * q`, renormalized to counter drift.
pub fn integrate_orientation(
    orientation: &UnitQuaternion<f32>,
    omega: &Vector3<f32>,
    dt: f32,
) -> UnitQuaternion<f32> {
    let half_dt = 0.5 * dt;
    let spin = Quaternion::new(0.0, omega.x * half_dt, omega.y * half_dt, omega.z * half_dt);
    let q = orientation.into_inner();
    UnitQuaternion::new_normalize(q + spin * q)
}

/// Rotation of `angle` radians about `axis`. A zero axis yields the identity.
pub fn quaternion_from_axis_angle(axis: &Vector3<f32>, angle: f32) -> UnitQuaternion<f32> {
    match Unit::try_new(*axis, SINGULAR_EPSILON) {
        Some(axis) => UnitQuaternion::from_axis_angle(&axis, angle),
        None => UnitQuaternion::identity(),
    }
}

/// Two unit tangents orthogonal to the unit `normal` and to each other.
///
/// The first tangent is built from the two components that are not the least
/// dominant, which keeps it well conditioned.
pub fn tangent_basis(normal: &Vector3<f32>) -> (Vector3<f32>, Vector3<f32>) {
    let tangent1 = if normal.x.abs() >= DOMINANT_AXIS_THRESHOLD {
        Vector3::new(normal.y, -normal.x, 0.0)
    } else {
        Vector3::new(0.0, normal.z, -normal.y)
    }
    .normalize();
    let tangent2 = normal.cross(&tangent1);
    (tangent1, tangent2)
}
