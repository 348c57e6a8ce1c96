//! Straight-line movement collaborator used by headless runs and tests.

use std::{collections::BTreeMap, time::Duration};

use rampart_core::{Movement, UnitId, Vec2};

#[derive(Clone, Copy, Debug, PartialEq)]
struct Mover {
    position: Vec2,
    speed: f32,
    destination: Option<Vec2>,
    arrived: bool,
}

/// Moves every unit in a straight line toward its requested point.
///
/// Units travel at their configured speed and snap onto the destination once
/// it is within one step. Halting drops the destination, so a halted unit
/// never reports arrival.
#[derive(Clone, Debug, Default)]
pub struct StraightLineMovement {
    movers: BTreeMap<UnitId, Mover>,
}

impl StraightLineMovement {
    /// Creates a collaborator that tracks no units.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.movers.len()
    }

    /// Reports whether no unit is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.movers.is_empty()
    }
}

impl Movement for StraightLineMovement {
    fn insert(&mut self, unit: UnitId, position: Vec2, speed: f32) {
        let speed = if speed.is_finite() { speed.max(0.0) } else { 0.0 };
        let _ = self.movers.insert(
            unit,
            Mover {
                position,
                speed,
                destination: None,
                arrived: false,
            },
        );
    }

    fn remove(&mut self, unit: UnitId) {
        let _ = self.movers.remove(&unit);
    }

    fn move_to(&mut self, unit: UnitId, point: Vec2) {
        if let Some(mover) = self.movers.get_mut(&unit) {
            mover.destination = Some(point);
            mover.arrived = false;
        }
    }

    fn halt(&mut self, unit: UnitId) {
        if let Some(mover) = self.movers.get_mut(&unit) {
            mover.destination = None;
            mover.arrived = false;
        }
    }

    fn advance(&mut self, dt: Duration) {
        let seconds = dt.as_secs_f32();
        for mover in self.movers.values_mut() {
            let Some(destination) = mover.destination else {
                continue;
            };

            let offset = destination - mover.position;
            let step = mover.speed * seconds;
            if offset.length() <= step {
                mover.position = destination;
                mover.destination = None;
                mover.arrived = true;
            } else {
                mover.position += offset.normalize_or_zero() * step;
            }
        }
    }

    fn position(&self, unit: UnitId) -> Option<Vec2> {
        self.movers.get(&unit).map(|mover| mover.position)
    }

    fn has_arrived(&self, unit: UnitId) -> bool {
        self.movers.get(&unit).is_some_and(|mover| mover.arrived)
    }
}
