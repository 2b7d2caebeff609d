//! Deferred-mutation store that owns every live entity.

use std::collections::BTreeSet;

use waypoint_defence_core::{Bounds, EntityId, Vec2};

/// Describes what an entity collided with during a collision pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Contact<K> {
    /// Identifier of the other entity.
    pub(crate) other: EntityId,
    /// Variant of the other entity.
    pub(crate) kind: K,
}

/// Capability set shared by every entity stored in the registry.
pub(crate) trait Entity {
    /// Closed set of entity variants used by kind queries.
    type Kind: Copy + Eq;
    /// Deferred message emitted from hooks and resolved by the owner.
    type Signal;

    fn id(&self) -> EntityId;

    fn kind(&self) -> Self::Kind;

    fn bounds(&self) -> Bounds;

    fn is_active(&self) -> bool;

    /// Marks the entity inactive so queries skip it before the next flush.
    fn deactivate(&mut self);

    fn on_collision(&mut self, contact: Contact<Self::Kind>, signals: &mut Vec<Self::Signal>);

    /// Invoked once when the registry is cleared.
    fn teardown(&mut self, signals: &mut Vec<Self::Signal>);
}

/// Owns entities and stages structural changes until the next flush.
///
/// Entities are kept in identifier order because identifiers are allocated
/// monotonically and staged additions are appended in allocation order.
#[derive(Debug)]
pub(crate) struct EntityRegistry<E> {
    live: Vec<E>,
    pending_add: Vec<E>,
    pending_remove: BTreeSet<EntityId>,
    next_id: u32,
}

impl<E: Entity> EntityRegistry<E> {
    pub(crate) fn new() -> Self {
        Self {
            live: Vec::new(),
            pending_add: Vec::new(),
            pending_remove: BTreeSet::new(),
            next_id: 0,
        }
    }

    /// Allocates an identifier and stages the entity built from it.
    pub(crate) fn add(&mut self, build: impl FnOnce(EntityId) -> E) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.pending_add.push(build(id));
        id
    }

    /// Deactivates the entity immediately and stages its removal.
    ///
    /// Returns `false` when no live or staged entity carries the identifier.
    pub(crate) fn remove(&mut self, id: EntityId) -> bool {
        match self.get_mut(id) {
            Some(entity) => {
                entity.deactivate();
                let _ = self.pending_remove.insert(id);
                true
            }
            None => false,
        }
    }

    /// Applies staged additions, then staged removals.
    pub(crate) fn flush(&mut self) {
        self.live.append(&mut self.pending_add);
        if self.pending_remove.is_empty() {
            return;
        }
        let removed = std::mem::take(&mut self.pending_remove);
        self.live.retain(|entity| !removed.contains(&entity.id()));
    }

    /// Looks up a live or staged entity.
    pub(crate) fn get(&self, id: EntityId) -> Option<&E> {
        match self.live.binary_search_by_key(&id, |entity| entity.id()) {
            Ok(index) => self.live.get(index),
            Err(_) => self.pending_add.iter().find(|entity| entity.id() == id),
        }
    }

    /// Looks up a live or staged entity for mutation.
    pub(crate) fn get_mut(&mut self, id: EntityId) -> Option<&mut E> {
        match self.live.binary_search_by_key(&id, |entity| entity.id()) {
            Ok(index) => self.live.get_mut(index),
            Err(_) => self.pending_add.iter_mut().find(|entity| entity.id() == id),
        }
    }

    /// Iterates flushed entities, active or not, in identifier order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &E> {
        self.live.iter()
    }

    /// Iterates flushed entities mutably in identifier order.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut E> {
        self.live.iter_mut()
    }

    /// Active flushed entities of one variant.
    pub(crate) fn query_by_kind(&self, kind: E::Kind) -> impl Iterator<Item = &E> {
        self.live
            .iter()
            .filter(move |entity| entity.is_active() && entity.kind() == kind)
    }

    /// Active flushed entities whose center lies within `radius` of `center`.
    pub(crate) fn query_in_radius(&self, center: Vec2, radius: f32) -> impl Iterator<Item = &E> {
        let radius_squared = radius * radius;
        self.live.iter().filter(move |entity| {
            entity.is_active() && entity.bounds().center().distance_squared(center) <= radius_squared
        })
    }

    /// Counts active entities of one variant, staged additions included.
    pub(crate) fn count_by_kind(&self, kind: E::Kind) -> usize {
        self.live
            .iter()
            .chain(self.pending_add.iter())
            .filter(|entity| entity.is_active() && entity.kind() == kind)
            .count()
    }

    /// Invokes both collision hooks for every intersecting pair of active
    /// entities and returns the number of pairs.
    ///
    /// Bounds are captured before any hook runs, so a hook that deactivates
    /// an entity does not hide it from the remaining pairs of this pass.
    pub(crate) fn collision_pass(&mut self, signals: &mut Vec<E::Signal>) -> usize {
        let snapshot: Vec<(usize, Bounds, Contact<E::Kind>)> = self
            .live
            .iter()
            .enumerate()
            .filter(|(_, entity)| entity.is_active())
            .map(|(index, entity)| {
                let contact = Contact {
                    other: entity.id(),
                    kind: entity.kind(),
                };
                (index, entity.bounds(), contact)
            })
            .collect();

        let mut pairs = 0;
        for (offset, (first_index, first_bounds, first)) in snapshot.iter().enumerate() {
            for (second_index, second_bounds, second) in &snapshot[offset + 1..] {
                if !first_bounds.intersects(second_bounds) {
                    continue;
                }
                self.live[*first_index].on_collision(*second, signals);
                self.live[*second_index].on_collision(*first, signals);
                pairs += 1;
            }
        }
        pairs
    }

    /// Tears down every live and staged entity and discards all queues.
    pub(crate) fn clear(&mut self, signals: &mut Vec<E::Signal>) {
        for entity in self.live.iter_mut().chain(self.pending_add.iter_mut()) {
            entity.teardown(signals);
        }
        self.live.clear();
        self.pending_add.clear();
        self.pending_remove.clear();
    }
}
