//! Per-tick contact list: detection over every pair, then iterative resolution.

use heapless::Vec;

use crate::arena::BodySet;
use crate::collider::Constraint;
use crate::contact::CollisionManifold;
use crate::narrow_phase::{self, PairContacts, ShapeInstance};
use crate::solver::{self, ImpulseOutcome, SolverConfig};

/// Owns the contact manifolds of the current tick (up to `C`) and the solver
/// tunables.
#[derive(Debug, Clone)]
pub struct CollisionManager<const C: usize> {
    manifolds: Vec<CollisionManifold, C>,
    dropped: usize,
    /// Solver tunables; may be adjusted between ticks.
    pub config: SolverConfig,
}

impl<const C: usize> Default for CollisionManager<C> {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

impl<const C: usize> CollisionManager<C> {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            manifolds: Vec::new(),
            dropped: 0,
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    #[inline]
    pub fn config_mut(&mut self) -> &mut SolverConfig {
        &mut self.config
    }

    /// Contacts found by the last [`detect_collision`](Self::detect_collision),
    /// in detection order.
    #[inline]
    pub fn manifolds(&self) -> &[CollisionManifold] {
        &self.manifolds
    }

    /// Manifolds discarded during the last detection because the list was full.
    #[inline]
    pub fn dropped_manifolds(&self) -> usize {
        self.dropped
    }

    pub fn clear(&mut self) {
        self.manifolds.clear();
        self.dropped = 0;
    }

    /// Rebuild the contact list from scratch.
    ///
    /// Every unordered pair of objects with colliders is tested in slot order,
    /// followed by each object against every constraint. Pairs where nothing
    /// can move are skipped.
    pub fn detect_collision<const N: usize>(&mut self, bodies: &BodySet<N>, constraints: &[Constraint]) {
        self.clear();
        let object_material = self.config.object_material();
        let ground_material = self.config.ground_material();

        for (i, (handle_a, object_a)) in bodies.iter().enumerate() {
            let Some(collider_a) = &object_a.collider else {
                continue;
            };
            let shape_a = ShapeInstance {
                handle: handle_a,
                body: &object_a.body,
                collider: collider_a,
            };

            for (handle_b, object_b) in bodies.iter().skip(i + 1) {
                let Some(collider_b) = &object_b.collider else {
                    continue;
                };
                if object_a.body.is_fixed() && object_b.body.is_fixed() {
                    continue;
                }
                let shape_b = ShapeInstance {
                    handle: handle_b,
                    body: &object_b.body,
                    collider: collider_b,
                };
                let contacts = narrow_phase::collide_bodies(&shape_a, &shape_b, object_material);
                self.extend(contacts);
            }

            if object_a.body.is_fixed() {
                continue;
            }
            for constraint in constraints {
                let contacts = narrow_phase::collide_with_constraint(&shape_a, constraint, ground_material);
                self.extend(contacts);
            }
        }

        if self.dropped > 0 {
            log::warn!(
                "contact list full ({} manifolds), dropped {} this tick",
                C,
                self.dropped
            );
        }
        log::trace!("detected {} contact manifolds", self.manifolds.len());
    }

    fn extend(&mut self, contacts: PairContacts) {
        for manifold in contacts {
            if self.manifolds.push(manifold).is_err() {
                self.dropped += 1;
            }
        }
    }

    /// Run `iteration_limit` sequential-impulse passes over this tick's
    /// manifolds. Manifolds whose bodies are gone are ignored.
    pub fn resolve_collision<const N: usize>(&mut self, bodies: &mut BodySet<N>, dt: f32) {
        let config = &self.config;

        for manifold in self.manifolds.iter_mut() {
            if let Some((a, b)) = bodies.pair_mut(manifold.body_a, manifold.body_b) {
                solver::prepare_manifold(manifold, a, b.as_deref(), config);
            }
        }

        let mut skipped = 0usize;
        for _ in 0..config.iteration_limit {
            for manifold in self.manifolds.iter_mut() {
                let Some((a, b)) = bodies.pair_mut(manifold.body_a, manifold.body_b) else {
                    continue;
                };
                if solver::sequential_impulse(manifold, a, b, config, dt) == ImpulseOutcome::SkippedDegenerate {
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            log::trace!("skipped {} degenerate impulses", skipped);
        }
    }
}
