//! Authoritative structure state management utilities.

use std::collections::BTreeMap;

use rampart_core::{StructureId, StructureKind, StructureProfile, Vec2};
use rampart_system_health::HealthTracker;
use rampart_system_tower_targeting::{AttackerRegistry, TargetSelector};

/// Snapshot of a structure stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct StructureState {
    pub(crate) id: StructureId,
    pub(crate) kind: StructureKind,
    pub(crate) position: Vec2,
    pub(crate) profile: StructureProfile,
    pub(crate) health: HealthTracker,
    pub(crate) attackers: AttackerRegistry,
    pub(crate) selector: TargetSelector,
}

/// Registry that stores structures and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct StructureRegistry {
    entries: BTreeMap<StructureId, StructureState>,
    next_structure_id: StructureId,
}

impl StructureRegistry {
    /// Creates an empty registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_structure_id: StructureId::new(0),
        }
    }

    /// Builds a structure from its catalog profile and stores it.
    pub(crate) fn insert(
        &mut self,
        kind: StructureKind,
        profile: &StructureProfile,
        position: Vec2,
    ) -> StructureId {
        let id = self.next_structure_id;
        self.next_structure_id = StructureId::new(id.get().wrapping_add(1));

        if !profile.fire_interval.is_valid() {
            tracing::warn!(
                %kind,
                value = profile.fire_interval.get(),
                "structure fire interval is invalid; using zero"
            );
        }

        let state = StructureState {
            id,
            kind,
            position,
            profile: profile.clone(),
            health: HealthTracker::new(profile.max_health),
            attackers: AttackerRegistry::new(),
            selector: TargetSelector::for_structure(id, profile),
        };
        let _ = self.entries.insert(id, state);
        id
    }

    pub(crate) fn get(&self, id: StructureId) -> Option<&StructureState> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: StructureId) -> Option<&mut StructureState> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: StructureId) -> Option<StructureState> {
        self.entries.remove(&id)
    }

    /// Reports whether a living structure with the identifier exists.
    pub(crate) fn is_standing(&self, id: StructureId) -> bool {
        self.entries
            .get(&id)
            .is_some_and(|structure| !structure.health.is_dead())
    }

    /// Iterates structures in identifier order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &StructureState> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut StructureState> {
        self.entries.values_mut()
    }
}
