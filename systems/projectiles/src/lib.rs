#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Reusable pool of projectile slots.
//!
//! Slots cycle between idle and active. [`ProjectilePool::acquire`] never
//! fails: when no idle slot is available the pool grows by one. Slots are
//! never freed, so a [`ProjectileId`] stays a valid index for the lifetime of
//! the pool even after the projectile it named has been released.

use std::collections::VecDeque;

use rampart_core::{EntityRef, ProjectileColor, ProjectileId, Vec2};

/// Number of idle slots created up front by [`ProjectilePool::default`].
pub const DEFAULT_PREWARM: usize = 20;

/// Damage payload delivered when a projectile arrives.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Flight {
    /// Entity that fired the projectile.
    pub source: EntityRef,
    /// Entity the projectile tracks.
    pub target: EntityRef,
    /// Damage applied on arrival.
    pub damage: f32,
}

/// State of a single pooled projectile.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Projectile {
    active: bool,
    origin: Vec2,
    position: Vec2,
    progress: f32,
    color: ProjectileColor,
    flight: Option<Flight>,
}

impl Projectile {
    /// Places the projectile at its launch point and attaches its payload.
    pub fn launch(&mut self, origin: Vec2, color: ProjectileColor, flight: Flight) {
        self.origin = origin;
        self.position = origin;
        self.progress = 0.0;
        self.color = color;
        self.flight = Some(flight);
    }

    /// Moves the projectile toward the target's current position.
    ///
    /// `step` is the fraction of the full flight covered during this tick.
    /// Returns `true` once the projectile arrived.
    pub fn advance_toward(&mut self, target: Vec2, step: f32) -> bool {
        self.progress = (self.progress + step.max(0.0)).min(1.0);
        self.position = self.origin.lerp(target, self.progress);
        self.progress >= 1.0
    }

    /// Reports whether the slot is currently in flight.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Launch point of the current flight.
    #[must_use]
    pub const fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Interpolated position of the current flight.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Flight progress in `[0, 1]`.
    #[must_use]
    pub const fn progress(&self) -> f32 {
        self.progress
    }

    /// Visual tag of the current flight.
    #[must_use]
    pub const fn color(&self) -> ProjectileColor {
        self.color
    }

    /// Payload of the current flight, if one was launched.
    #[must_use]
    pub const fn flight(&self) -> Option<&Flight> {
        self.flight.as_ref()
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Pool that owns every projectile slot of the simulation.
#[derive(Debug)]
pub struct ProjectilePool {
    slots: Vec<Projectile>,
    idle: VecDeque<ProjectileId>,
}

impl ProjectilePool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::with_prewarmed(0)
    }

    /// Creates a pool holding `count` idle slots.
    #[must_use]
    pub fn with_prewarmed(count: usize) -> Self {
        let mut pool = Self {
            slots: Vec::with_capacity(count),
            idle: VecDeque::with_capacity(count),
        };
        for _ in 0..count {
            let id = pool.create_slot();
            pool.idle.push_back(id);
        }
        pool
    }

    /// Returns an idle slot marked active, creating one if none is idle.
    pub fn acquire(&mut self) -> ProjectileId {
        while let Some(id) = self.idle.pop_front() {
            let slot = &mut self.slots[id.index()];
            debug_assert!(!slot.active, "idle queue held active projectile {id:?}");
            if slot.active {
                tracing::error!(?id, "idle queue held an active projectile; skipping it");
                continue;
            }
            slot.active = true;
            return id;
        }

        let id = self.create_slot();
        self.slots[id.index()].active = true;
        id
    }

    /// Returns a slot to the idle set.
    ///
    /// Releasing an idle or unknown slot is a no-op and returns `false`.
    pub fn release(&mut self, id: ProjectileId) -> bool {
        let Some(slot) = self.slots.get_mut(id.index()) else {
            return false;
        };
        if !slot.active {
            return false;
        }

        slot.reset();
        self.idle.push_back(id);
        true
    }

    /// Retrieves the slot named by the handle.
    #[must_use]
    pub fn get(&self, id: ProjectileId) -> Option<&Projectile> {
        self.slots.get(id.index())
    }

    /// Retrieves mutable access to the slot named by the handle.
    pub fn get_mut(&mut self, id: ProjectileId) -> Option<&mut Projectile> {
        self.slots.get_mut(id.index())
    }

    /// Iterator over the handles of every active slot in index order.
    pub fn active_ids(&self) -> impl Iterator<Item = ProjectileId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.active)
            .map(|(index, _)| slot_id(index))
    }

    /// Iterator over every active slot in index order.
    pub fn iter_active(&self) -> impl Iterator<Item = (ProjectileId, &Projectile)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.active)
            .map(|(index, slot)| (slot_id(index), slot))
    }

    /// Total number of slots ever created.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots currently in flight.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.slots.len() - self.idle.len()
    }

    /// Number of slots waiting to be acquired.
    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.idle.len()
    }

    fn create_slot(&mut self) -> ProjectileId {
        let id = slot_id(self.slots.len());
        self.slots.push(Projectile::default());
        id
    }
}

impl Default for ProjectilePool {
    fn default() -> Self {
        Self::with_prewarmed(DEFAULT_PREWARM)
    }
}

fn slot_id(index: usize) -> ProjectileId {
    let value = u32::try_from(index).unwrap_or(u32::MAX);
    ProjectileId::new(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rampart_core::UnitId;

    fn flight() -> Flight {
        Flight {
            source: EntityRef::Unit(UnitId::new(1)),
            target: EntityRef::Unit(UnitId::new(2)),
            damage: 3.0,
        }
    }

    #[test]
    fn prewarmed_pool_reuses_slots_before_growing() {
        let mut pool = ProjectilePool::with_prewarmed(2);
        let first = pool.acquire();
        let second = pool.acquire();
        assert_eq!(pool.capacity(), 2);

        let third = pool.acquire();
        assert_eq!(pool.capacity(), 3);
        assert_ne!(first, second);
        assert_ne!(second, third);
    }

    #[test]
    fn release_clears_payload() {
        let mut pool = ProjectilePool::new();
        let id = pool.acquire();
        pool.get_mut(id)
            .expect("slot exists")
            .launch(Vec2::new(1.0, 2.0), ProjectileColor::from_rgb(1, 2, 3), flight());
        assert!(pool.release(id));

        let slot = pool.get(id).expect("slot retained");
        assert!(!slot.is_active());
        assert!(slot.flight().is_none());
    }

    #[test]
    fn advance_interpolates_toward_moving_target() {
        let mut projectile = Projectile::default();
        projectile.launch(Vec2::ZERO, ProjectileColor::default(), flight());

        assert!(!projectile.advance_toward(Vec2::new(10.0, 0.0), 0.5));
        assert_eq!(projectile.position(), Vec2::new(5.0, 0.0));

        assert!(!projectile.advance_toward(Vec2::new(0.0, 20.0), 0.25));
        assert_eq!(projectile.position(), Vec2::new(0.0, 15.0));

        assert!(projectile.advance_toward(Vec2::new(0.0, 20.0), 0.5));
        assert_eq!(projectile.position(), Vec2::new(0.0, 20.0));
        assert_eq!(projectile.progress(), 1.0);
    }

    #[test]
    fn releasing_unknown_slot_is_ignored() {
        let mut pool = ProjectilePool::new();
        assert!(!pool.release(ProjectileId::new(7)));
        assert_eq!(pool.capacity(), 0);
    }
}
