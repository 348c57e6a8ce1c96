//! Hostile unit state owned by the world.

use std::{collections::BTreeMap, time::Duration};

use rampart_core::{ProjectileColor, StructureId, UnitBehavior, UnitId, UnitKind, UnitProfile};
use rampart_system_health::HealthTracker;
use rampart_system_tower_targeting::Cooldown;

/// Attack parameters of a raider, resolved once at spawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct RaidProfile {
    pub(crate) range: f32,
    pub(crate) damage: f32,
    pub(crate) interval: Duration,
    pub(crate) color: ProjectileColor,
}

impl RaidProfile {
    fn from_behavior(kind: &UnitKind, behavior: &UnitBehavior) -> Option<Self> {
        let UnitBehavior::Raider {
            attack_range,
            attack_damage,
            attack_interval,
            projectile_color,
        } = behavior
        else {
            return None;
        };

        if !attack_interval.is_valid() {
            tracing::warn!(
                %kind,
                value = attack_interval.get(),
                "raider attack interval is invalid; using zero"
            );
        }

        Some(Self {
            range: finite_or_zero(*attack_range),
            damage: finite_or_zero(*attack_damage),
            interval: attack_interval.to_duration(),
            color: *projectile_color,
        })
    }
}

/// Live state of a hostile unit.
#[derive(Clone, Debug)]
pub(crate) struct UnitState {
    pub(crate) id: UnitId,
    pub(crate) kind: UnitKind,
    pub(crate) health: HealthTracker,
    pub(crate) raid: Option<RaidProfile>,
    pub(crate) engagement: Option<StructureId>,
    pub(crate) cooldown: Cooldown,
}

/// Registry that stores hostile units and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct UnitRegistry {
    entries: BTreeMap<UnitId, UnitState>,
    next_unit_id: UnitId,
}

impl UnitRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_unit_id: UnitId::new(0),
        }
    }

    /// Creates a unit from its catalog profile and stores it.
    pub(crate) fn insert(&mut self, kind: &UnitKind, profile: &UnitProfile) -> UnitId {
        let id = self.next_unit_id;
        self.next_unit_id = UnitId::new(id.get().wrapping_add(1));

        let state = UnitState {
            id,
            kind: kind.clone(),
            health: HealthTracker::new(profile.max_health),
            raid: RaidProfile::from_behavior(kind, &profile.behavior),
            engagement: None,
            cooldown: Cooldown::default(),
        };
        let _ = self.entries.insert(id, state);
        id
    }

    pub(crate) fn get(&self, id: UnitId) -> Option<&UnitState> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: UnitId) -> Option<&mut UnitState> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: UnitId) -> Option<UnitState> {
        self.entries.remove(&id)
    }

    /// Iterates units in identifier order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &UnitState> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut UnitState> {
        self.entries.values_mut()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

pub(crate) fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}
