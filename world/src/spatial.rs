//! Linear-scan spatial collaborator.

use rampart_core::{EntityFilter, EntityRef, SpatialEntry, SpatialIndex, Vec2};

/// Answers range queries by scanning every entry.
///
/// Results are returned in the order entries were published, which the world
/// keeps sorted by identifier.
#[derive(Clone, Debug, Default)]
pub struct BruteForceIndex {
    entries: Vec<SpatialEntry>,
}

impl BruteForceIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpatialIndex for BruteForceIndex {
    fn rebuild(&mut self, entries: &[SpatialEntry]) {
        self.entries.clear();
        self.entries.extend_from_slice(entries);
    }

    fn query_in_range(
        &self,
        center: Vec2,
        radius: f32,
        filter: EntityFilter,
        out: &mut Vec<EntityRef>,
    ) {
        out.clear();
        let radius_squared = radius * radius;
        out.extend(
            self.entries
                .iter()
                .filter(|entry| filter.accepts(entry.entity))
                .filter(|entry| entry.position.distance_squared(center) <= radius_squared)
                .map(|entry| entry.entity),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rampart_core::{StructureId, UnitId};

    #[test]
    fn query_filters_by_family_and_radius() {
        let mut index = BruteForceIndex::new();
        index.rebuild(&[
            SpatialEntry {
                entity: EntityRef::Unit(UnitId::new(1)),
                position: Vec2::new(1.0, 0.0),
            },
            SpatialEntry {
                entity: EntityRef::Unit(UnitId::new(2)),
                position: Vec2::new(9.0, 0.0),
            },
            SpatialEntry {
                entity: EntityRef::Structure(StructureId::new(1)),
                position: Vec2::new(0.0, 1.0),
            },
        ]);

        let mut out = vec![EntityRef::Unit(UnitId::new(42))];
        index.query_in_range(Vec2::ZERO, 2.0, EntityFilter::Units, &mut out);
        assert_eq!(out, vec![EntityRef::Unit(UnitId::new(1))]);

        index.query_in_range(Vec2::ZERO, 2.0, EntityFilter::Structures, &mut out);
        assert_eq!(out, vec![EntityRef::Structure(StructureId::new(1))]);
    }

    #[test]
    fn rebuild_replaces_previous_entries() {
        let mut index = BruteForceIndex::new();
        index.rebuild(&[SpatialEntry {
            entity: EntityRef::Unit(UnitId::new(1)),
            position: Vec2::ZERO,
        }]);
        index.rebuild(&[]);

        let mut out = Vec::new();
        index.query_in_range(Vec2::ZERO, 100.0, EntityFilter::Units, &mut out);
        assert!(out.is_empty());
    }
}
