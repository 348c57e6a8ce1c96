#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Projectile flight and damage resolution.
//!
//! Structures and raiders hand their shots to the [`CombatResolver`], which
//! launches a pooled projectile, re-samples the target's position every tick,
//! and applies the damage on arrival. A projectile whose target vanished
//! before impact is returned to the pool without dealing damage.

use std::time::Duration;

use rampart_core::{EntityRef, Event, ProjectileColor, ProjectileId, StructureId, UnitId, Vec2};
use rampart_system_projectiles::{Flight, ProjectilePool};

/// Time a projectile needs to travel from its source to its target.
pub const DEFAULT_FLIGHT_TIME: Duration = Duration::from_secs(1);

/// World view the resolver needs to launch and land projectiles.
pub trait CombatTargets {
    /// Position of the entity, or `None` if it is dead or no longer exists.
    fn locate(&self, entity: EntityRef) -> Option<Vec2>;

    /// Applies damage to the entity and records any resulting death in `out`.
    fn apply_damage(&mut self, entity: EntityRef, amount: f32, out: &mut Vec<Event>);

    /// Records that `unit` attacked `structure`.
    fn register_attacker(&mut self, structure: StructureId, unit: UnitId);
}

/// One shot requested by a structure or a raider.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shot {
    /// Entity firing the shot.
    pub source: EntityRef,
    /// Entity the shot tracks.
    pub target: EntityRef,
    /// Damage applied on arrival.
    pub damage: f32,
    /// Visual tag of the projectile.
    pub color: ProjectileColor,
}

/// Owns the projectile pool and moves every active projectile.
#[derive(Debug)]
pub struct CombatResolver {
    pool: ProjectilePool,
    flight_time: Duration,
    scratch: Vec<ProjectileId>,
}

impl CombatResolver {
    /// Creates a resolver around the provided pool.
    #[must_use]
    pub fn new(pool: ProjectilePool, flight_time: Duration) -> Self {
        Self {
            pool,
            flight_time,
            scratch: Vec::new(),
        }
    }

    /// Pool backing the resolver.
    #[must_use]
    pub fn pool(&self) -> &ProjectilePool {
        &self.pool
    }

    /// Time a projectile needs to reach its target.
    #[must_use]
    pub const fn flight_time(&self) -> Duration {
        self.flight_time
    }

    /// Launches a projectile for the shot.
    ///
    /// Returns `None` without touching the pool when either end of the shot
    /// is already gone. A unit firing at a structure is registered as one of
    /// the structure's attackers.
    pub fn fire(
        &mut self,
        shot: Shot,
        targets: &mut dyn CombatTargets,
        out: &mut Vec<Event>,
    ) -> Option<ProjectileId> {
        let origin = targets.locate(shot.source)?;
        if targets.locate(shot.target).is_none() {
            tracing::trace!(target = ?shot.target, "shot dropped; target already gone");
            return None;
        }

        if let (EntityRef::Unit(unit), EntityRef::Structure(structure)) = (shot.source, shot.target)
        {
            targets.register_attacker(structure, unit);
        }

        let projectile = self.pool.acquire();
        if let Some(slot) = self.pool.get_mut(projectile) {
            slot.launch(
                origin,
                shot.color,
                Flight {
                    source: shot.source,
                    target: shot.target,
                    damage: shot.damage,
                },
            );
        }

        out.push(Event::ProjectileFired {
            projectile,
            source: shot.source,
            target: shot.target,
        });
        Some(projectile)
    }

    /// Moves every active projectile by `dt` and resolves arrivals.
    pub fn advance(&mut self, dt: Duration, targets: &mut dyn CombatTargets, out: &mut Vec<Event>) {
        let step = if self.flight_time.is_zero() {
            1.0
        } else {
            dt.as_secs_f32() / self.flight_time.as_secs_f32()
        };

        let mut active = std::mem::take(&mut self.scratch);
        active.clear();
        active.extend(self.pool.active_ids());

        for &projectile in &active {
            let Some(slot) = self.pool.get_mut(projectile) else {
                continue;
            };
            let Some(flight) = slot.flight().copied() else {
                let _ = self.pool.release(projectile);
                continue;
            };

            let Some(target_position) = targets.locate(flight.target) else {
                let _ = self.pool.release(projectile);
                out.push(Event::ProjectileExpired {
                    projectile,
                    target: flight.target,
                });
                continue;
            };

            if !slot.advance_toward(target_position, step) {
                continue;
            }

            let _ = self.pool.release(projectile);
            out.push(Event::ProjectileHit {
                projectile,
                target: flight.target,
                damage: flight.damage,
            });
            targets.apply_damage(flight.target, flight.damage, out);
        }

        self.scratch = active;
    }
}

impl Default for CombatResolver {
    fn default() -> Self {
        Self::new(ProjectilePool::default(), DEFAULT_FLIGHT_TIME)
    }
}
