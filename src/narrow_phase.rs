//! Exact shape-pair collision tests.
//!
//! Every test takes two posed shapes (or a shape and a static constraint) and
//! returns the manifolds for that pair, empty when they do not touch. Tests
//! are looked up in [`BODY_PAIR_TESTS`] and [`CONSTRAINT_TESTS`] by shape kind,
//! so a new shape only needs new table entries.
//!
//! Normal convention: every manifold normal points from `body_b` (or the
//! constraint) toward `body_a`.

use heapless::Vec;
use nalgebra::Vector3;

// ComplexField provides sqrt()/abs() for f32 in no_std via libm
#[allow(unused_imports)]
use nalgebra::ComplexField;

use crate::arena::BodyHandle;
use crate::body::RigidBody;
use crate::collider::{
    box_support_vertex, box_vertices, Collider, Constraint, ConstraintKind, ShapeKind, VertexSide,
};
use crate::contact::{CollisionManifold, ContactPoint};

/// Upper bound on manifolds a single pair test can emit (one per box corner).
pub const MAX_PAIR_CONTACTS: usize = 8;

/// Manifolds produced by a single pair test.
pub type PairContacts = Vec<CollisionManifold, MAX_PAIR_CONTACTS>;

/// Squared length below which an edge-edge cross product is treated as
/// parallel edges and skipped as a candidate axis.
const PARALLEL_AXIS_EPSILON: f32 = 1e-6;

/// Distance below which two points are treated as coincident.
const COINCIDENT_EPSILON: f32 = 1e-6;

/// A collider posed by its body, as seen by the narrow phase.
#[derive(Debug, Clone, Copy)]
pub struct ShapeInstance<'a> {
    pub handle: BodyHandle,
    pub body: &'a RigidBody,
    pub collider: &'a Collider,
}

/// Surface response copied into every manifold a test emits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactMaterial {
    pub restitution: f32,
    pub friction: f32,
}

pub type BodyPairTest = fn(&ShapeInstance<'_>, &ShapeInstance<'_>, ContactMaterial) -> PairContacts;
pub type ConstraintTest = fn(&ShapeInstance<'_>, &Constraint, ContactMaterial) -> PairContacts;

/// Body-vs-body tests indexed by `[ShapeKind of a][ShapeKind of b]`.
pub const BODY_PAIR_TESTS: [[BodyPairTest; ShapeKind::COUNT]; ShapeKind::COUNT] = [
    [sphere_sphere, sphere_box],
    [box_sphere, box_box],
];

/// Body-vs-constraint tests indexed by `[ShapeKind][ConstraintKind]`.
pub const CONSTRAINT_TESTS: [[ConstraintTest; ConstraintKind::COUNT]; ShapeKind::COUNT] =
    [[sphere_plane], [box_plane]];

/// Test two bodies against each other.
pub fn collide_bodies(
    a: &ShapeInstance<'_>,
    b: &ShapeInstance<'_>,
    material: ContactMaterial,
) -> PairContacts {
    let test = BODY_PAIR_TESTS[a.collider.kind() as usize][b.collider.kind() as usize];
    test(a, b, material)
}

/// Test a body against a static constraint.
pub fn collide_with_constraint(
    shape: &ShapeInstance<'_>,
    constraint: &Constraint,
    material: ContactMaterial,
) -> PairContacts {
    let test = CONSTRAINT_TESTS[shape.collider.kind() as usize][constraint.kind() as usize];
    test(shape, constraint, material)
}

fn single(manifold: CollisionManifold) -> PairContacts {
    let mut contacts = PairContacts::new();
    // Capacity is at least one
    let _ = contacts.push(manifold);
    contacts
}

/// Sphere vs sphere.
///
/// Collide iff the centre distance is at most the radius sum. The normal runs
/// from `b`'s centre to `a`'s; coincident centres use +Y.
pub fn sphere_sphere(
    a: &ShapeInstance<'_>,
    b: &ShapeInstance<'_>,
    material: ContactMaterial,
) -> PairContacts {
    let (&Collider::Sphere { radius: ra }, &Collider::Sphere { radius: rb }) = (a.collider, b.collider)
    else {
        return PairContacts::new();
    };

    let pos_a = a.body.position();
    let pos_b = b.body.position();
    let diff = pos_a - pos_b;
    let dist_sq = diff.norm_squared();
    let sum_r = ra + rb;

    if dist_sq > sum_r * sum_r {
        return PairContacts::new();
    }

    let dist = dist_sq.sqrt();
    let normal = if dist > COINCIDENT_EPSILON {
        diff / dist
    } else {
        Vector3::new(0.0, 1.0, 0.0)
    };

    let manifold = CollisionManifold::new(
        a.handle,
        Some(b.handle),
        normal,
        sum_r - dist,
        [
            ContactPoint::new(pos_a - normal * ra),
            ContactPoint::new(pos_b + normal * rb),
        ],
    )
    .with_material(material.restitution, material.friction);
    single(manifold)
}

/// Box vs sphere: the sphere becomes `body_a`.
pub fn box_sphere(
    a: &ShapeInstance<'_>,
    b: &ShapeInstance<'_>,
    material: ContactMaterial,
) -> PairContacts {
    sphere_box(b, a, material)
}

/// Sphere (`a`) vs oriented box (`b`).
///
/// The closest point on the box is found by clamping the centre offset to the
/// half-extents along each box axis. The normal points from that point to the
/// sphere centre. When the centre lies inside the box, the face of least
/// penetration gives the normal instead.
pub fn sphere_box(
    a: &ShapeInstance<'_>,
    b: &ShapeInstance<'_>,
    material: ContactMaterial,
) -> PairContacts {
    let (&Collider::Sphere { radius }, &Collider::Box { half_extents }) = (a.collider, b.collider)
    else {
        return PairContacts::new();
    };

    let sphere_pos = a.body.position();
    let box_pos = b.body.position();
    let axes = b.body.axes();
    let center_to_center = sphere_pos - box_pos;

    let mut local = Vector3::zeros();
    let mut closest = box_pos;
    for (i, axis) in axes.iter().enumerate() {
        local[i] = center_to_center.dot(axis);
        closest += axis * local[i].clamp(-half_extents[i], half_extents[i]);
    }

    let diff = sphere_pos - closest;
    let dist_sq = diff.norm_squared();
    if dist_sq > radius * radius {
        return PairContacts::new();
    }

    let dist = dist_sq.sqrt();
    let (normal, penetration, box_point) = if dist > COINCIDENT_EPSILON {
        (diff / dist, radius - dist, closest)
    } else {
        // Centre inside the box: push out through the nearest face
        let mut best_axis = 0;
        let mut best_gap = half_extents[0] - local[0].abs();
        for i in 1..3 {
            let gap = half_extents[i] - local[i].abs();
            if gap < best_gap {
                best_gap = gap;
                best_axis = i;
            }
        }
        let sign = if local[best_axis] >= 0.0 { 1.0 } else { -1.0 };
        let normal = axes[best_axis] * sign;
        (normal, radius + best_gap, sphere_pos + normal * best_gap)
    };

    let manifold = CollisionManifold::new(
        a.handle,
        Some(b.handle),
        normal,
        penetration,
        [
            ContactPoint::new(sphere_pos - normal * radius),
            ContactPoint::new(box_point),
        ],
    )
    .with_material(material.restitution, material.friction);
    single(manifold)
}

/// Sphere vs plane.
///
/// Collide iff the centre is within one radius of the plane on either side.
/// Depth is measured from the sphere's lowest point along the plane normal.
pub fn sphere_plane(
    shape: &ShapeInstance<'_>,
    constraint: &Constraint,
    material: ContactMaterial,
) -> PairContacts {
    let (&Collider::Sphere { radius }, Constraint::Plane(plane)) = (shape.collider, constraint) else {
        return PairContacts::new();
    };

    let center = shape.body.position();
    let height = plane.signed_distance(&center);
    if height.abs() > radius {
        return PairContacts::new();
    }

    let normal = plane.normal();
    let manifold = CollisionManifold::new(
        shape.handle,
        None,
        normal,
        radius - height,
        [ContactPoint::new(center - normal * height), ContactPoint::INVALID],
    )
    .with_material(material.restitution, material.friction);
    single(manifold)
}

/// Box vs plane: one manifold per corner below the plane.
pub fn box_plane(
    shape: &ShapeInstance<'_>,
    constraint: &Constraint,
    material: ContactMaterial,
) -> PairContacts {
    let (&Collider::Box { half_extents }, Constraint::Plane(plane)) = (shape.collider, constraint) else {
        return PairContacts::new();
    };

    let normal = plane.normal();
    let mut contacts = PairContacts::new();
    for local in box_vertices(&half_extents) {
        let vertex = shape.body.transform_point(&local);
        let height = plane.signed_distance(&vertex);
        if height < 0.0 {
            let manifold = CollisionManifold::new(
                shape.handle,
                None,
                normal,
                -height,
                [ContactPoint::new(vertex), ContactPoint::INVALID],
            )
            .with_material(material.restitution, material.friction);
            // Eight corners fit by construction
            let _ = contacts.push(manifold);
        }
    }
    contacts
}

/// Which family of separating axis produced the minimum penetration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SatAxis {
    /// Face normal of box `a` (axis index 0..3).
    FaceA(usize),
    /// Face normal of box `b` (axis index 0..3).
    FaceB(usize),
    /// Cross product of box `a`'s axis `.0` with box `b`'s axis `.1`.
    Edge(usize, usize),
}

impl SatAxis {
    /// Position in the canonical 0..15 axis ordering.
    fn index(self) -> usize {
        match self {
            SatAxis::FaceA(i) => i,
            SatAxis::FaceB(j) => 3 + j,
            SatAxis::Edge(i, j) => 6 + 3 * i + j,
        }
    }

    fn from_index(index: usize) -> Self {
        match index {
            0..=2 => SatAxis::FaceA(index),
            3..=5 => SatAxis::FaceB(index - 3),
            _ => SatAxis::Edge((index - 6) / 3, (index - 6) % 3),
        }
    }
}

/// A box's world-space geometry, gathered once per test.
struct OrientedBox {
    center: Vector3<f32>,
    axes: [Vector3<f32>; 3],
    half_extents: Vector3<f32>,
}

impl OrientedBox {
    fn new(body: &RigidBody, half_extents: Vector3<f32>) -> Self {
        Self {
            center: body.position(),
            axes: body.axes(),
            half_extents,
        }
    }

    /// Half of the box's extent projected onto `axis`.
    fn projected_radius(&self, axis: &Vector3<f32>) -> f32 {
        self.axes
            .iter()
            .enumerate()
            .map(|(i, box_axis)| (box_axis * self.half_extents[i]).dot(axis).abs())
            .sum()
    }
}

/// Overlap of the two boxes' projections on `axis`. Not positive means
/// `axis` separates them.
fn penetration_on_axis(a: &OrientedBox, b: &OrientedBox, axis: &Vector3<f32>) -> f32 {
    let distance = (b.center - a.center).dot(axis).abs();
    a.projected_radius(axis) + b.projected_radius(axis) - distance
}

/// Candidate separating axis `index` in the canonical ordering, or `None` for
/// a degenerate edge pair.
fn candidate_axis(a: &OrientedBox, b: &OrientedBox, axis: SatAxis) -> Option<Vector3<f32>> {
    match axis {
        SatAxis::FaceA(i) => Some(a.axes[i]),
        SatAxis::FaceB(j) => Some(b.axes[j]),
        SatAxis::Edge(i, j) => {
            let cross = a.axes[i].cross(&b.axes[j]);
            if cross.norm_squared() < PARALLEL_AXIS_EPSILON {
                None
            } else {
                Some(cross.normalize())
            }
        }
    }
}

/// Oriented box vs oriented box via the separating axis test.
///
/// Fifteen axes are tried in order: `a`'s faces, `b`'s faces, then the nine
/// edge-edge cross products. Any separating axis ends the test; otherwise the
/// first axis of minimum penetration becomes the normal.
pub fn box_box(
    a: &ShapeInstance<'_>,
    b: &ShapeInstance<'_>,
    material: ContactMaterial,
) -> PairContacts {
    let (&Collider::Box { half_extents: half_a }, &Collider::Box { half_extents: half_b }) =
        (a.collider, b.collider)
    else {
        return PairContacts::new();
    };

    // Bounding-sphere early out
    let reach = half_a.norm() + half_b.norm();
    if (a.body.position() - b.body.position()).norm_squared() > reach * reach {
        return PairContacts::new();
    }

    let box_a = OrientedBox::new(a.body, half_a);
    let box_b = OrientedBox::new(b.body, half_b);

    let mut best: Option<(SatAxis, Vector3<f32>, f32)> = None;
    for index in 0..15 {
        let sat_axis = SatAxis::from_index(index);
        let Some(axis) = candidate_axis(&box_a, &box_b, sat_axis) else {
            continue;
        };
        let penetration = penetration_on_axis(&box_a, &box_b, &axis);
        if penetration <= 0.0 {
            return PairContacts::new();
        }
        if best.is_none_or(|(_, _, min)| penetration < min) {
            best = Some((sat_axis, axis, penetration));
        }
    }
    let Some((sat_axis, axis, penetration)) = best else {
        return PairContacts::new();
    };

    let b_to_a = box_a.center - box_b.center;
    let normal = if axis.dot(&b_to_a) < 0.0 { -axis } else { axis };
    log::trace!("box-box contact on axis {} (depth {})", sat_axis.index(), penetration);

    let contact_points = box_contact_points(a.body, &box_a, b.body, &box_b, sat_axis, &normal, penetration);
    let manifold = CollisionManifold::new(a.handle, Some(b.handle), normal, penetration, contact_points)
        .with_material(material.restitution, material.friction);
    single(manifold)
}

/// Contact points for a box-box manifold: index 0 on `a`, index 1 on `b`.
fn box_contact_points(
    body_a: &RigidBody,
    box_a: &OrientedBox,
    body_b: &RigidBody,
    box_b: &OrientedBox,
    sat_axis: SatAxis,
    normal: &Vector3<f32>,
    penetration: f32,
) -> [ContactPoint; 2] {
    match sat_axis {
        SatAxis::FaceA(_) => {
            // b's corner pushed into a's face
            let local = box_support_vertex(&box_b.half_extents, &box_b.axes, normal, VertexSide::Along);
            let vertex = body_b.transform_point(&local);
            [
                ContactPoint::new(vertex - normal * penetration),
                ContactPoint::new(vertex),
            ]
        }
        SatAxis::FaceB(_) => {
            // a's corner pushed into b's face
            let local = box_support_vertex(&box_a.half_extents, &box_a.axes, normal, VertexSide::Against);
            let vertex = body_a.transform_point(&local);
            [
                ContactPoint::new(vertex),
                ContactPoint::new(vertex + normal * penetration),
            ]
        }
        SatAxis::Edge(i, j) => {
            let local_a = box_support_vertex(&box_a.half_extents, &box_a.axes, normal, VertexSide::Against);
            let local_b = box_support_vertex(&box_b.half_extents, &box_b.axes, normal, VertexSide::Along);

            // Edges run from the chosen corner across the box
            let edge_a = if local_a[i] < 0.0 { box_a.axes[i] } else { -box_a.axes[i] };
            let edge_b = if local_b[j] < 0.0 { box_b.axes[j] } else { -box_b.axes[j] };

            let vertex_a = body_a.transform_point(&local_a);
            let vertex_b = body_b.transform_point(&local_b);

            // Closest points between the two edge lines; 1 - k² > 0 because
            // parallel pairs never become the contact axis.
            let k = edge_a.dot(&edge_b);
            let t = (vertex_b - vertex_a).dot(&(edge_a - edge_b * k)) / (1.0 - k * k);
            let closest_a = vertex_a + edge_a * t;
            let closest_b = vertex_b + edge_b * (closest_a - vertex_b).dot(&edge_b);
            [ContactPoint::new(closest_a), ContactPoint::new(closest_b)]
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use crate::arena::BodySet;
    use crate::arena::PhysicsObject;
    use crate::collider::Plane;
    use crate::math::quaternion_from_axis_angle;
    use core::f32::consts::FRAC_PI_4;

    const EPSILON: f32 = 1e-4;

    const MATERIAL: ContactMaterial = ContactMaterial {
        restitution: 0.5,
        friction: 0.6,
    };

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn approx_vec_eq(a: &Vector3<f32>, b: &Vector3<f32>) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
    }

    /// Stores posed shapes so tests can borrow them as [`ShapeInstance`]s.
    struct Scene {
        set: BodySet<4>,
    }

    impl Scene {
        fn new() -> Self {
            Self { set: BodySet::new() }
        }

        fn add(&mut self, body: RigidBody, collider: Collider) -> BodyHandle {
            self.set
                .insert(PhysicsObject {
                    body,
                    collider: Some(collider),
                })
                .unwrap()
        }

        fn shape(&self, handle: BodyHandle) -> ShapeInstance<'_> {
            let object = self.set.get(handle).unwrap();
            ShapeInstance {
                handle,
                body: &object.body,
                collider: object.collider.as_ref().unwrap(),
            }
        }
    }

    fn at(x: f32, y: f32, z: f32) -> RigidBody {
        RigidBody::new(5.0).with_position(Vector3::new(x, y, z))
    }

    fn sphere(radius: f32) -> Collider {
        Collider::Sphere { radius }
    }

    fn cube(half: f32) -> Collider {
        Collider::Box {
            half_extents: Vector3::repeat(half),
        }
    }

    #[test]
    fn test_sphere_sphere_overlapping() {
        let mut scene = Scene::new();
        let a = scene.add(at(0.0, 0.0, 0.0), sphere(1.0));
        let b = scene.add(at(1.5, 0.0, 0.0), sphere(1.0));
        let contacts = collide_bodies(&scene.shape(a), &scene.shape(b), MATERIAL);
        assert_eq!(contacts.len(), 1);
        let m = &contacts[0];
        assert_eq!(m.body_a, a);
        assert_eq!(m.body_b, Some(b));
        assert!(approx_eq(m.penetration_depth, 0.5));
        assert!(approx_vec_eq(&m.normal, &Vector3::new(-1.0, 0.0, 0.0)));
        assert!(approx_vec_eq(&m.contact_points[0].point, &Vector3::new(1.0, 0.0, 0.0)));
        assert!(approx_vec_eq(&m.contact_points[1].point, &Vector3::new(0.5, 0.0, 0.0)));
        assert!(approx_eq(m.restitution, 0.5));
        assert!(approx_eq(m.friction, 0.6));
    }

    #[test]
    fn test_sphere_sphere_separated_and_touching() {
        let mut scene = Scene::new();
        let a = scene.add(at(0.0, 0.0, 0.0), sphere(1.0));
        let far = scene.add(at(2.5, 0.0, 0.0), sphere(1.0));
        let touching = scene.add(at(0.0, 2.0, 0.0), sphere(1.0));
        assert!(collide_bodies(&scene.shape(a), &scene.shape(far), MATERIAL).is_empty());

        let contacts = collide_bodies(&scene.shape(a), &scene.shape(touching), MATERIAL);
        assert_eq!(contacts.len(), 1);
        assert!(approx_eq(contacts[0].penetration_depth, 0.0));
    }

    #[test]
    fn test_sphere_sphere_coincident() {
        let mut scene = Scene::new();
        let a = scene.add(at(1.0, 1.0, 1.0), sphere(1.0));
        let b = scene.add(at(1.0, 1.0, 1.0), sphere(0.5));
        let contacts = collide_bodies(&scene.shape(a), &scene.shape(b), MATERIAL);
        assert_eq!(contacts[0].normal, Vector3::new(0.0, 1.0, 0.0));
        assert!(approx_eq(contacts[0].penetration_depth, 1.5));
    }

    #[test]
    fn test_sphere_box_from_above() {
        let mut scene = Scene::new();
        let s = scene.add(at(0.0, 1.2, 0.0), sphere(1.0));
        let b = scene.add(at(0.0, 0.0, 0.0), cube(0.5));
        let contacts = collide_bodies(&scene.shape(s), &scene.shape(b), MATERIAL);
        assert_eq!(contacts.len(), 1);
        let m = &contacts[0];
        assert_eq!(m.body_a, s);
        assert!(approx_vec_eq(&m.normal, &Vector3::new(0.0, 1.0, 0.0)));
        assert!(approx_eq(m.penetration_depth, 0.3));
        assert!(approx_vec_eq(&m.contact_points[0].point, &Vector3::new(0.0, 0.2, 0.0)));
        assert!(approx_vec_eq(&m.contact_points[1].point, &Vector3::new(0.0, 0.5, 0.0)));
    }

    #[test]
    fn test_box_sphere_puts_sphere_first() {
        let mut scene = Scene::new();
        let b = scene.add(at(0.0, 0.0, 0.0), cube(0.5));
        let s = scene.add(at(1.2, 0.0, 0.0), sphere(1.0));
        let contacts = collide_bodies(&scene.shape(b), &scene.shape(s), MATERIAL);
        assert_eq!(contacts[0].body_a, s);
        assert_eq!(contacts[0].body_b, Some(b));
        assert!(approx_vec_eq(&contacts[0].normal, &Vector3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_sphere_box_rotated() {
        let mut scene = Scene::new();
        let s = scene.add(at(1.0, 0.0, 0.0), sphere(0.5));
        // Diamond: a corner points along +x at distance sqrt(2)/2
        let rotated = at(0.0, 0.0, 0.0).with_orientation(quaternion_from_axis_angle(&Vector3::z(), FRAC_PI_4));
        let b = scene.add(rotated, cube(0.5));
        let contacts = collide_bodies(&scene.shape(s), &scene.shape(b), MATERIAL);
        assert_eq!(contacts.len(), 1);
        assert!(approx_vec_eq(&contacts[0].contact_points[1].point, &Vector3::new(0.5_f32.sqrt(), 0.0, 0.0)));
        assert!(approx_eq(contacts[0].penetration_depth, 0.5 - (1.0 - 0.5_f32.sqrt())));
    }

    #[test]
    fn test_sphere_box_center_inside() {
        let mut scene = Scene::new();
        let s = scene.add(at(0.0, 0.4, 0.0), sphere(0.2));
        let b = scene.add(at(0.0, 0.0, 0.0), cube(0.5));
        let contacts = collide_bodies(&scene.shape(s), &scene.shape(b), MATERIAL);
        let m = &contacts[0];
        assert!(approx_vec_eq(&m.normal, &Vector3::new(0.0, 1.0, 0.0)));
        assert!(approx_eq(m.penetration_depth, 0.3));
        assert!(m.normal.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_sphere_box_no_collision() {
        let mut scene = Scene::new();
        let s = scene.add(at(0.0, 2.0, 0.0), sphere(1.0));
        let b = scene.add(at(0.0, 0.0, 0.0), cube(0.5));
        assert!(collide_bodies(&scene.shape(s), &scene.shape(b), MATERIAL).is_empty());
    }

    #[test]
    fn test_box_box_overlapping_x() {
        let mut scene = Scene::new();
        let a = scene.add(at(0.0, 0.0, 0.0), cube(0.5));
        let b = scene.add(at(0.9, 0.0, 0.0), cube(0.5));
        let contacts = collide_bodies(&scene.shape(a), &scene.shape(b), MATERIAL);
        assert_eq!(contacts.len(), 1);
        let m = &contacts[0];
        assert!(approx_eq(m.penetration_depth, 0.1));
        assert!(approx_vec_eq(&m.normal, &Vector3::new(-1.0, 0.0, 0.0)));
        // b's corner sits 0.1 inside a's +x face
        assert!(approx_eq(m.contact_points[1].point.x, 0.4));
        assert!(approx_eq(m.contact_points[0].point.x, 0.5));
    }

    #[test]
    fn test_box_box_separated() {
        let mut scene = Scene::new();
        let a = scene.add(at(0.0, 0.0, 0.0), cube(0.5));
        let b = scene.add(at(1.1, 0.0, 0.0), cube(0.5));
        assert!(collide_bodies(&scene.shape(a), &scene.shape(b), MATERIAL).is_empty());
    }

    #[test]
    fn test_box_box_face_tie_prefers_first_box() {
        let mut scene = Scene::new();
        let a = scene.add(at(0.0, 0.0, 0.0), cube(0.5));
        let big = scene.add(at(0.0, -1.4, 0.0), cube(1.0));
        let contacts = collide_bodies(&scene.shape(a), &scene.shape(big), MATERIAL);
        let m = &contacts[0];
        assert!(approx_eq(m.penetration_depth, 0.1));
        assert!(approx_vec_eq(&m.normal, &Vector3::new(0.0, 1.0, 0.0)));
        // Ties between a's and big's y faces go to a's face (lower index),
        // so the reported corner belongs to `big`
        assert!(approx_eq(m.contact_points[0].point.y, -0.5));
        assert!(approx_eq(m.contact_points[1].point.y, -0.4));
    }

    #[test]
    fn test_box_box_far_apart_early_out() {
        let mut scene = Scene::new();
        let a = scene.add(at(0.0, 0.0, 0.0), cube(0.5));
        let b = scene.add(at(10.0, 10.0, 10.0), cube(0.5));
        assert!(collide_bodies(&scene.shape(a), &scene.shape(b), MATERIAL).is_empty());
    }

    #[test]
    fn test_box_box_edge_edge() {
        let mut scene = Scene::new();
        // Top edge of `a` runs along z, bottom edge of `b` along x
        let a = scene.add(
            at(0.0, 0.0, 0.0).with_orientation(quaternion_from_axis_angle(&Vector3::z(), FRAC_PI_4)),
            cube(0.5),
        );
        let b = scene.add(
            at(0.0, 1.3, 0.0).with_orientation(quaternion_from_axis_angle(&Vector3::x(), FRAC_PI_4)),
            cube(0.5),
        );
        let contacts = collide_bodies(&scene.shape(a), &scene.shape(b), MATERIAL);
        assert_eq!(contacts.len(), 1);
        let m = &contacts[0];
        let edge_height = 0.5_f32.sqrt();
        assert!(approx_eq(m.penetration_depth, 2.0 * edge_height - 1.3));
        assert!(approx_vec_eq(&m.normal, &Vector3::new(0.0, -1.0, 0.0)));
        assert!(approx_vec_eq(&m.contact_points[0].point, &Vector3::new(0.0, edge_height, 0.0)));
        assert!(approx_vec_eq(
            &m.contact_points[1].point,
            &Vector3::new(0.0, 1.3 - edge_height, 0.0)
        ));
    }

    #[test]
    fn test_sat_axis_indexing() {
        for index in 0..15 {
            assert_eq!(SatAxis::from_index(index).index(), index);
        }
        assert_eq!(SatAxis::from_index(7), SatAxis::Edge(0, 1));
        assert_eq!(SatAxis::from_index(12), SatAxis::Edge(2, 0));
    }

    #[test]
    fn test_sphere_plane() {
        let mut scene = Scene::new();
        let s = scene.add(at(3.0, 0.8, -1.0), sphere(1.0));
        let ground = Constraint::Plane(Plane::ground());
        let contacts = collide_with_constraint(&scene.shape(s), &ground, MATERIAL);
        assert_eq!(contacts.len(), 1);
        let m = &contacts[0];
        assert_eq!(m.body_b, None);
        assert!(m.is_constraint_contact());
        assert!(approx_eq(m.penetration_depth, 0.2));
        assert_eq!(m.normal, Vector3::new(0.0, 1.0, 0.0));
        assert!(approx_vec_eq(&m.contact_points[0].point, &Vector3::new(3.0, 0.0, -1.0)));
        assert!(!m.contact_points[1].valid);
        assert_eq!(m.points().count(), 1);
    }

    #[test]
    fn test_sphere_plane_clear() {
        let mut scene = Scene::new();
        let s = scene.add(at(0.0, 1.01, 0.0), sphere(1.0));
        let ground = Constraint::Plane(Plane::ground());
        assert!(collide_with_constraint(&scene.shape(s), &ground, MATERIAL).is_empty());
    }

    #[test]
    fn test_box_plane_resting_face() {
        let mut scene = Scene::new();
        let b = scene.add(at(0.0, 0.45, 0.0), cube(0.5));
        let ground = Constraint::Plane(Plane::ground());
        let contacts = collide_with_constraint(&scene.shape(b), &ground, MATERIAL);
        // Four bottom corners
        assert_eq!(contacts.len(), 4);
        for m in &contacts {
            assert!(approx_eq(m.penetration_depth, 0.05));
            assert!(approx_eq(m.contact_points[0].point.y, -0.05));
        }
    }

    #[test]
    fn test_box_plane_tilted_single_corner() {
        let mut scene = Scene::new();
        let tilted = at(0.0, 0.8, 0.0)
            .with_orientation(quaternion_from_axis_angle(&Vector3::new(-1.0, 0.0, 1.0), 0.9553166));
        let b = scene.add(tilted, cube(0.5));
        let ground = Constraint::Plane(Plane::ground());
        let contacts = collide_with_constraint(&scene.shape(b), &ground, MATERIAL);
        // Standing on a corner: half-diagonal is sqrt(0.75) > 0.8
        assert_eq!(contacts.len(), 1);
        assert!(approx_eq(contacts[0].penetration_depth, 0.75_f32.sqrt() - 0.8));
    }
}
