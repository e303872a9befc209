//! Fixed-capacity storage for physics objects addressed by generational handles.

use heapless::Vec;

use crate::body::RigidBody;
use crate::collider::Collider;
use crate::error::PhysicsError;

/// Stable identifier for an object in a [`PhysicsWorld`](crate::world::PhysicsWorld).
///
/// A handle stays valid until its object is removed. Removing an object frees
/// its slot for reuse; the slot's generation is bumped so old handles to it
/// are rejected instead of silently aliasing the new occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle {
    index: u16,
    generation: u16,
}

impl BodyHandle {
    /// Slot index inside the owning set.
    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }

    #[inline]
    pub fn generation(&self) -> u16 {
        self.generation
    }
}

/// A rigid body together with its optional collision shape.
///
/// Objects without a collider take part in integration but never collide.
#[derive(Debug, Clone)]
pub struct PhysicsObject {
    pub body: RigidBody,
    pub collider: Option<Collider>,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u16,
    object: Option<PhysicsObject>,
}

/// Slot storage for up to `N` objects.
#[derive(Debug, Clone)]
pub struct BodySet<const N: usize> {
    slots: Vec<Slot, N>,
    len: usize,
}

impl<const N: usize> Default for BodySet<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> BodySet<N> {
    pub const fn new() -> Self {
        // Slot indices are stored as u16
        const { assert!(N <= u16::MAX as usize + 1, "BodySet capacity exceeds u16 handle range") };
        Self {
            slots: Vec::new(),
            len: 0,
        }
    }

    /// Number of live objects.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Store `object`, reusing the lowest vacated slot first.
    pub fn insert(&mut self, object: PhysicsObject) -> Result<BodyHandle, PhysicsError> {
        if let Some(index) = self.slots.iter().position(|slot| slot.object.is_none()) {
            let slot = &mut self.slots[index];
            slot.object = Some(object);
            self.len += 1;
            return Ok(BodyHandle {
                index: index as u16,
                generation: slot.generation,
            });
        }

        let index = self.slots.len();
        self.slots
            .push(Slot {
                generation: 0,
                object: Some(object),
            })
            .map_err(|_| PhysicsError::CapacityExceeded { capacity: N })?;
        self.len += 1;
        Ok(BodyHandle {
            index: index as u16,
            generation: 0,
        })
    }

    /// Take the object out of its slot. The handle (and any copy of it) is
    /// stale afterwards.
    pub fn remove(&mut self, handle: BodyHandle) -> Result<PhysicsObject, PhysicsError> {
        let slot = self
            .slots
            .get_mut(handle.index())
            .filter(|slot| slot.generation == handle.generation)
            .ok_or(PhysicsError::StaleHandle(handle))?;
        let object = slot.object.take().ok_or(PhysicsError::StaleHandle(handle))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.len -= 1;
        Ok(object)
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: BodyHandle) -> Option<&PhysicsObject> {
        self.slots
            .get(handle.index())
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.object.as_ref())
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut PhysicsObject> {
        self.slots
            .get_mut(handle.index())
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.object.as_mut())
    }

    /// Live objects in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &PhysicsObject)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.object.as_ref().map(|object| {
                (
                    BodyHandle {
                        index: index as u16,
                        generation: slot.generation,
                    },
                    object,
                )
            })
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BodyHandle, &mut PhysicsObject)> {
        self.slots.iter_mut().enumerate().filter_map(|(index, slot)| {
            let generation = slot.generation;
            slot.object.as_mut().map(|object| {
                (
                    BodyHandle {
                        index: index as u16,
                        generation,
                    },
                    object,
                )
            })
        })
    }

    /// Handles of the live objects, in slot order.
    pub fn handles(&self) -> Vec<BodyHandle, N> {
        self.iter().map(|(handle, _)| handle).collect()
    }

    /// Mutable access to one body, or to two distinct bodies at once.
    ///
    /// Returns `None` if either handle is stale or both handles are equal.
    pub fn pair_mut(
        &mut self,
        a: BodyHandle,
        b: Option<BodyHandle>,
    ) -> Option<(&mut RigidBody, Option<&mut RigidBody>)> {
        let Some(b) = b else {
            return self.get_mut(a).map(|object| (&mut object.body, None));
        };
        if a.index == b.index || !self.contains(a) || !self.contains(b) {
            return None;
        }

        let (low, high) = if a.index < b.index { (a, b) } else { (b, a) };
        let (head, tail) = self.slots.split_at_mut(high.index());
        let low_body = &mut head[low.index()].object.as_mut()?.body;
        let high_body = &mut tail[0].object.as_mut()?.body;
        if a.index < b.index {
            Some((low_body, Some(high_body)))
        } else {
            Some((high_body, Some(low_body)))
        }
    }
}
