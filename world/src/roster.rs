//! Entity storage shared by the world's collaborator implementations.
//!
//! The roster is the spawn factory handed to the wave scheduler and the
//! combat view handed to the combat resolver. Every unit it removes is
//! queued exactly once so the world can report the removal to the scheduler.

use std::{collections::BTreeMap, time::Duration};

use rampart_core::{
    EntityFilter, EntityRef, Event, Movement, SpatialIndex, SpawnError, SpawnFactory, StructureId,
    UnitId, UnitKind, UnitProfile, Vec2,
};
use rampart_system_health::HealthChange;
use rampart_system_tower_combat::{CombatTargets, Shot};
use rampart_system_tower_targeting::{UnitLookup, UnitStatus};

use crate::{towers::StructureRegistry, units::UnitRegistry};

pub(crate) struct Roster {
    pub(crate) units: UnitRegistry,
    pub(crate) structures: StructureRegistry,
    pub(crate) movement: Box<dyn Movement>,
    unit_kinds: BTreeMap<UnitKind, UnitProfile>,
    goal: Vec2,
    removed: Vec<UnitId>,
    scratch: Vec<UnitId>,
}

impl Roster {
    pub(crate) fn new(
        unit_kinds: BTreeMap<UnitKind, UnitProfile>,
        movement: Box<dyn Movement>,
        goal: Vec2,
    ) -> Self {
        Self {
            units: UnitRegistry::new(),
            structures: StructureRegistry::new(),
            movement,
            unit_kinds,
            goal,
            removed: Vec::new(),
            scratch: Vec::new(),
        }
    }

    /// Number of units removed since the last call, clearing the queue.
    pub(crate) fn drain_removed(&mut self) -> usize {
        let count = self.removed.len();
        self.removed.clear();
        count
    }

    /// Removes every unit that reached the goal.
    pub(crate) fn collect_arrivals(&mut self, out: &mut Vec<Event>) {
        let mut arrived = std::mem::take(&mut self.scratch);
        arrived.clear();
        arrived.extend(
            self.units
                .iter()
                .map(|unit| unit.id)
                .filter(|unit| self.movement.has_arrived(*unit)),
        );

        for &unit in &arrived {
            tracing::debug!(unit = unit.get(), "unit reached the goal");
            out.push(Event::UnitReachedGoal { unit });
            self.remove_unit(unit);
        }
        self.scratch = arrived;
    }

    /// Lets every raider pick, keep or drop its structure target and queue shots.
    pub(crate) fn drive_raiders(
        &mut self,
        now: Duration,
        spatial: &dyn SpatialIndex,
        query: &mut Vec<EntityRef>,
        shots: &mut Vec<Shot>,
    ) {
        let Self {
            units,
            structures,
            movement,
            goal,
            ..
        } = self;

        for unit in units.iter_mut() {
            let Some(raid) = unit.raid else {
                continue;
            };

            if let Some(target) = unit.engagement {
                if !structures.is_standing(target) {
                    unit.engagement = None;
                    movement.move_to(unit.id, *goal);
                    tracing::debug!(
                        unit = unit.id.get(),
                        structure = target.get(),
                        "raider target gone; resuming march"
                    );
                }
            }

            if unit.engagement.is_none() {
                let Some(position) = movement.position(unit.id) else {
                    continue;
                };
                spatial.query_in_range(position, raid.range, EntityFilter::Structures, query);
                let Some(target) = query
                    .iter()
                    .filter_map(|entity| entity.structure())
                    .find(|structure| structures.is_standing(*structure))
                else {
                    continue;
                };

                unit.engagement = Some(target);
                movement.halt(unit.id);
                tracing::debug!(
                    unit = unit.id.get(),
                    structure = target.get(),
                    "raider engaging structure"
                );
            }

            let Some(target) = unit.engagement else {
                continue;
            };
            if unit.cooldown.is_ready(now, raid.interval) {
                unit.cooldown.mark(now);
                shots.push(Shot {
                    source: EntityRef::Unit(unit.id),
                    target: EntityRef::Structure(target),
                    damage: raid.damage,
                    color: raid.color,
                });
            }
        }
    }

    fn remove_unit(&mut self, unit: UnitId) {
        if self.units.remove(unit).is_some() {
            self.movement.remove(unit);
            self.removed.push(unit);
        }
    }

    fn destroy_structure(&mut self, structure: StructureId, out: &mut Vec<Event>) {
        if self.structures.remove(structure).is_some() {
            tracing::debug!(structure = structure.get(), "structure destroyed");
            out.push(Event::StructureDestroyed { structure });
        }
    }
}

impl SpawnFactory for Roster {
    fn spawn(&mut self, kind: &UnitKind, position: Vec2) -> Result<UnitId, SpawnError> {
        let profile = self
            .unit_kinds
            .get(kind)
            .ok_or_else(|| SpawnError::UnknownKind(kind.clone()))?;
        if !has_health(profile.max_health) {
            return Err(SpawnError::NoHealth(kind.clone()));
        }

        let unit = self.units.insert(kind, profile);
        self.movement.insert(unit, position, profile.speed);
        self.movement.move_to(unit, self.goal);
        Ok(unit)
    }
}

impl CombatTargets for Roster {
    fn locate(&self, entity: EntityRef) -> Option<Vec2> {
        match entity {
            EntityRef::Unit(unit) => {
                let state = self.units.get(unit)?;
                if state.health.is_dead() {
                    return None;
                }
                self.movement.position(unit)
            }
            EntityRef::Structure(structure) => self
                .structures
                .get(structure)
                .filter(|state| !state.health.is_dead())
                .map(|state| state.position),
        }
    }

    fn apply_damage(&mut self, entity: EntityRef, amount: f32, out: &mut Vec<Event>) {
        match entity {
            EntityRef::Unit(unit) => {
                let Some(state) = self.units.get_mut(unit) else {
                    return;
                };
                if state.health.take_damage(amount) == HealthChange::Died {
                    tracing::debug!(unit = unit.get(), "unit died");
                    out.push(Event::UnitDied { unit });
                    self.remove_unit(unit);
                }
            }
            EntityRef::Structure(structure) => {
                let Some(state) = self.structures.get_mut(structure) else {
                    return;
                };
                if state.health.take_damage(amount) == HealthChange::Died {
                    self.destroy_structure(structure, out);
                }
            }
        }
    }

    fn register_attacker(&mut self, structure: StructureId, unit: UnitId) {
        if let Some(state) = self.structures.get_mut(structure) {
            if state.attackers.register(unit) {
                tracing::debug!(
                    structure = structure.get(),
                    unit = unit.get(),
                    "attacker registered"
                );
            }
        }
    }
}

/// Reports whether a catalog maximum yields a living entity.
pub(crate) fn has_health(max_health: f32) -> bool {
    max_health.is_finite() && max_health > 0.0
}

/// Read-only unit view lent to targeting while structures are borrowed mutably.
pub(crate) struct UnitView<'a> {
    pub(crate) units: &'a UnitRegistry,
    pub(crate) movement: &'a dyn Movement,
}

impl UnitLookup for UnitView<'_> {
    fn unit_status(&self, unit: UnitId) -> Option<UnitStatus> {
        let state = self.units.get(unit)?;
        let position = self.movement.position(unit)?;
        Some(UnitStatus {
            position,
            health: state.health.current(),
            dead: state.health.is_dead(),
        })
    }
}
