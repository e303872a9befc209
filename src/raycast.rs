//! Ray queries against colliders, used for picking.
//!
//! Distances are measured along the normalized ray direction. A query
//! returns `None` when the ray misses or the shape lies entirely behind the
//! origin, and `Some(0.0)` when the origin is inside the shape.

use nalgebra::Vector3;

// ComplexField provides sqrt()/abs() for f32 in no_std via libm
#[allow(unused_imports)]
use nalgebra::ComplexField;

use crate::body::RigidBody;
use crate::collider::Collider;
use crate::math::SINGULAR_EPSILON;

/// Ray direction components smaller than this are treated as parallel to a
/// box slab.
const PARALLEL_SLAB_THRESHOLD: f32 = 0.001;

fn normalized(direction: &Vector3<f32>) -> Option<Vector3<f32>> {
    direction.try_normalize(SINGULAR_EPSILON)
}

/// Distance along the ray to the first hit on a sphere.
pub fn ray_sphere_distance(
    origin: &Vector3<f32>,
    direction: &Vector3<f32>,
    center: &Vector3<f32>,
    radius: f32,
) -> Option<f32> {
    let direction = normalized(direction)?;
    let to_center = center - origin;
    let projected = to_center.dot(&direction);
    let orthogonal_sq = to_center.norm_squared() - projected * projected;
    if orthogonal_sq > radius * radius {
        return None;
    }

    let half_chord = (radius * radius - orthogonal_sq).sqrt();
    let far = projected + half_chord;
    if far < 0.0 {
        return None;
    }
    Some((projected - half_chord).max(0.0))
}

/// Distance along the ray to the first hit on an oriented box (slab test in
/// the box's own axes).
pub fn ray_box_distance(
    origin: &Vector3<f32>,
    direction: &Vector3<f32>,
    center: &Vector3<f32>,
    axes: &[Vector3<f32>; 3],
    half_extents: &Vector3<f32>,
) -> Option<f32> {
    let direction = normalized(direction)?;
    let to_center = center - origin;
    let mut t_near = 0.0_f32;
    let mut t_far = f32::MAX;

    for (i, axis) in axes.iter().enumerate() {
        let extent = half_extents[i];
        let offset = axis.dot(&to_center);
        let speed = axis.dot(&direction);

        if speed.abs() > PARALLEL_SLAB_THRESHOLD {
            let mut t1 = (offset - extent) / speed;
            let mut t2 = (offset + extent) / speed;
            if t1 > t2 {
                core::mem::swap(&mut t1, &mut t2);
            }
            t_near = t_near.max(t1);
            t_far = t_far.min(t2);
            if t_far < t_near {
                return None;
            }
        } else if -offset - extent > 0.0 || -offset + extent < 0.0 {
            // Parallel to this slab and outside it
            return None;
        }
    }

    Some(t_near)
}

/// Ray query against a collider posed by `body`.
pub fn ray_distance(
    origin: &Vector3<f32>,
    direction: &Vector3<f32>,
    body: &RigidBody,
    collider: &Collider,
) -> Option<f32> {
    match collider {
        Collider::Sphere { radius } => ray_sphere_distance(origin, direction, &body.position(), *radius),
        Collider::Box { half_extents } => {
            ray_box_distance(origin, direction, &body.position(), &body.axes(), half_extents)
        }
    }
}
