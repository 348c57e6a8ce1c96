#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Rampart.
//!
//! The world owns every unit and structure, the wave scheduler and the
//! combat resolver. Adapters mutate it exclusively through [`apply`] and read
//! it through the [`query`] module.

mod navigation;
mod roster;
mod spatial;
mod towers;
mod units;

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use rampart_core::{
    Command, EntityRef, Event, Movement, PlacementError, PlacementGate, ProgressReporter,
    SilentProgress, SpatialEntry, SpatialIndex, StructureKind, StructureProfile, UnitKind,
    UnitProfile, Vec2, WaveSet,
};
use rampart_system_projectiles::ProjectilePool;
use rampart_system_tower_combat::{CombatResolver, Shot};
use rampart_system_tower_targeting::{FireOrder, TargetingContext, TargetingStrategy};
use rampart_system_waves::{SchedulerConfig, WaveHooks, WaveScheduler};

pub use navigation::StraightLineMovement;
pub use rampart_system_projectiles::DEFAULT_PREWARM;
pub use rampart_system_spawning::SpawnSite;
pub use rampart_system_tower_combat::DEFAULT_FLIGHT_TIME;
pub use rampart_system_waves::{WavePhase, WaveRunState};
pub use spatial::BruteForceIndex;

use roster::{Roster, UnitView};

/// Static description of a session.
#[derive(Clone, Debug)]
pub struct WorldConfig {
    /// Waves played during the session.
    pub waves: WaveSet,
    /// Catalog of hostile unit kinds.
    pub unit_kinds: BTreeMap<UnitKind, UnitProfile>,
    /// Catalog of structure kinds.
    pub structure_kinds: BTreeMap<StructureKind, StructureProfile>,
    /// Area in which hostile units appear.
    pub spawn_site: SpawnSite,
    /// Point every hostile unit marches toward.
    pub goal: Vec2,
    /// Seed for spawn-position sampling.
    pub seed: u64,
    /// Idle projectile slots created up front.
    pub projectile_prewarm: usize,
    /// Time a projectile needs to reach its target.
    pub flight_time: Duration,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            waves: WaveSet::default(),
            unit_kinds: BTreeMap::new(),
            structure_kinds: BTreeMap::new(),
            spawn_site: SpawnSite::default(),
            goal: Vec2::ZERO,
            seed: 0,
            projectile_prewarm: DEFAULT_PREWARM,
            flight_time: DEFAULT_FLIGHT_TIME,
        }
    }
}

/// External collaborators plugged into the world.
pub struct Collaborators {
    /// Executes unit movement.
    pub movement: Box<dyn Movement>,
    /// Answers proximity queries.
    pub spatial: Box<dyn SpatialIndex>,
    /// Observes wave progress.
    pub progress: Box<dyn ProgressReporter>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            movement: Box::new(StraightLineMovement::new()),
            spatial: Box::new(BruteForceIndex::new()),
            progress: Box::new(SilentProgress),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct PlacementState {
    enabled: bool,
}

impl PlacementGate for PlacementState {
    fn set_placement_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

/// Represents the authoritative Rampart world state.
pub struct World {
    scheduler: WaveScheduler,
    roster: Roster,
    combat: CombatResolver,
    structure_kinds: BTreeMap<StructureKind, StructureProfile>,
    spatial: Box<dyn SpatialIndex>,
    progress: Box<dyn ProgressReporter>,
    placement: PlacementState,
    clock: Duration,
    tick_index: u64,
    spatial_entries: Vec<SpatialEntry>,
    fire_orders: Vec<FireOrder>,
    shots: Vec<Shot>,
    query_buffer: Vec<EntityRef>,
}

impl World {
    /// Creates a world that uses the reference collaborators.
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        Self::with_collaborators(config, Collaborators::default())
    }

    /// Creates a world around the provided collaborators.
    #[must_use]
    pub fn with_collaborators(config: WorldConfig, collaborators: Collaborators) -> Self {
        let WorldConfig {
            waves,
            unit_kinds,
            structure_kinds,
            spawn_site,
            goal,
            seed,
            projectile_prewarm,
            flight_time,
        } = config;

        let scheduler = WaveScheduler::new(
            Arc::new(waves),
            SchedulerConfig {
                spawn_site,
                seed,
            },
        );
        let combat = CombatResolver::new(
            ProjectilePool::with_prewarmed(projectile_prewarm),
            flight_time,
        );

        Self {
            scheduler,
            roster: Roster::new(unit_kinds, collaborators.movement, goal),
            combat,
            structure_kinds,
            spatial: collaborators.spatial,
            progress: collaborators.progress,
            placement: PlacementState::default(),
            clock: Duration::ZERO,
            tick_index: 0,
            spatial_entries: Vec::new(),
            fire_orders: Vec::new(),
            shots: Vec::new(),
            query_buffer: Vec::new(),
        }
    }

    fn step(&mut self, dt: Duration, out: &mut Vec<Event>) {
        self.tick_index = self.tick_index.saturating_add(1);
        self.clock = self.clock.saturating_add(dt);
        out.push(Event::TimeAdvanced { dt });

        let mut hooks = WaveHooks {
            factory: &mut self.roster,
            placement: &mut self.placement,
            progress: &mut *self.progress,
        };
        self.scheduler.tick(dt, &mut hooks, out);

        self.roster.movement.advance(dt);
        self.roster.collect_arrivals(out);
        self.combat.advance(dt, &mut self.roster, out);

        self.publish_positions();
        self.run_structures(out);
        self.run_raiders(out);
        self.settle_removals();
    }

    fn publish_positions(&mut self) {
        self.spatial_entries.clear();
        for unit in self.roster.units.iter() {
            if let Some(position) = self.roster.movement.position(unit.id) {
                self.spatial_entries.push(SpatialEntry {
                    entity: EntityRef::Unit(unit.id),
                    position,
                });
            }
        }
        self.spatial_entries
            .extend(self.roster.structures.iter().map(|structure| SpatialEntry {
                entity: EntityRef::Structure(structure.id),
                position: structure.position,
            }));
        self.spatial.rebuild(&self.spatial_entries);
    }

    fn run_structures(&mut self, out: &mut Vec<Event>) {
        let now = self.clock;
        let mut orders = std::mem::take(&mut self.fire_orders);
        orders.clear();

        {
            let roster = &mut self.roster;
            let view = UnitView {
                units: &roster.units,
                movement: &*roster.movement,
            };
            for structure in roster.structures.iter_mut() {
                let mut ctx = TargetingContext {
                    now,
                    origin: structure.position,
                    attackers: &mut structure.attackers,
                    units: &view,
                    spatial: &*self.spatial,
                };
                structure.selector.tick(&mut ctx, &mut orders);
            }
        }

        for order in &orders {
            let Some(structure) = self.roster.structures.get(order.structure) else {
                continue;
            };
            let shot = Shot {
                source: EntityRef::Structure(order.structure),
                target: EntityRef::Unit(order.target),
                damage: units::finite_or_zero(structure.profile.damage),
                color: structure.profile.projectile_color,
            };
            let _ = self.combat.fire(shot, &mut self.roster, out);
        }
        self.fire_orders = orders;
    }

    fn run_raiders(&mut self, out: &mut Vec<Event>) {
        let mut shots = std::mem::take(&mut self.shots);
        shots.clear();
        self.roster.drive_raiders(
            self.clock,
            &*self.spatial,
            &mut self.query_buffer,
            &mut shots,
        );
        for shot in shots.drain(..) {
            let _ = self.combat.fire(shot, &mut self.roster, out);
        }
        self.shots = shots;
    }

    fn settle_removals(&mut self) {
        for _ in 0..self.roster.drain_removed() {
            self.scheduler.on_unit_removed(&mut *self.progress);
        }
    }

    fn place_structure(&mut self, kind: StructureKind, position: Vec2, out: &mut Vec<Event>) {
        if !self.placement.enabled {
            reject_placement(kind, position, PlacementError::PlacementDisabled, out);
            return;
        }
        let Some(profile) = self.structure_kinds.get(&kind) else {
            reject_placement(kind, position, PlacementError::UnknownKind, out);
            return;
        };
        if !roster::has_health(profile.max_health) {
            reject_placement(kind, position, PlacementError::NoHealth, out);
            return;
        }

        let structure = self
            .roster
            .structures
            .insert(kind.clone(), profile, position);
        tracing::debug!(structure = structure.get(), %kind, "structure placed");
        out.push(Event::StructurePlaced {
            structure,
            kind,
            position,
        });
    }
}

fn reject_placement(
    kind: StructureKind,
    position: Vec2,
    reason: PlacementError,
    out: &mut Vec<Event>,
) {
    tracing::debug!(%kind, ?reason, "structure placement rejected");
    out.push(Event::StructurePlacementRejected {
        kind,
        position,
        reason,
    });
}

/// Applies the provided command to the world.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::StartWaves => {
            let mut hooks = WaveHooks {
                factory: &mut world.roster,
                placement: &mut world.placement,
                progress: &mut *world.progress,
            };
            world.scheduler.start(&mut hooks, out_events);
        }
        Command::StopWaves => {
            world.scheduler.stop();
            tracing::info!(phase = ?world.scheduler.phase(), "wave processing stopped");
        }
        Command::Tick { dt } => world.step(dt, out_events),
        Command::PlaceStructure { kind, position } => {
            world.place_structure(kind, position, out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use rampart_core::{
        AttackType, EntityRef, ProjectileColor, ProjectileId, StructureId, StructureKind, UnitId,
        UnitKind, Vec2,
    };
    use rampart_system_waves::{WavePhase, WaveRunState};

    use super::World;

    /// Current phase of the wave state machine.
    #[must_use]
    pub fn wave_phase(world: &World) -> WavePhase {
        world.scheduler.phase()
    }

    /// Wave index, live count and running flag.
    #[must_use]
    pub fn run_state(world: &World) -> WaveRunState {
        world.scheduler.run_state()
    }

    /// Number of waves in the session.
    #[must_use]
    pub fn wave_count(world: &World) -> usize {
        world.scheduler.wave_count()
    }

    /// Build time left in the current preparation phase.
    #[must_use]
    pub fn preparation_remaining(world: &World) -> Option<Duration> {
        world.scheduler.preparation_remaining()
    }

    /// Reports whether structure placement is accepted.
    #[must_use]
    pub fn placement_enabled(world: &World) -> bool {
        world.placement.enabled
    }

    /// Simulated time elapsed since the world was created.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Number of hostile units held by the world.
    #[must_use]
    pub fn unit_count(world: &World) -> usize {
        world.roster.units.len()
    }

    /// Captures every hostile unit in identifier order.
    #[must_use]
    pub fn unit_view(world: &World) -> Vec<UnitSnapshot> {
        world
            .roster
            .units
            .iter()
            .map(|unit| UnitSnapshot {
                id: unit.id,
                kind: unit.kind.clone(),
                position: world.roster.movement.position(unit.id),
                health: unit.health.current(),
                max_health: unit.health.max(),
                engaged: unit.engagement,
            })
            .collect()
    }

    /// Captures every structure in identifier order.
    #[must_use]
    pub fn structure_view(world: &World) -> Vec<StructureSnapshot> {
        world
            .roster
            .structures
            .iter()
            .map(|structure| StructureSnapshot {
                id: structure.id,
                kind: structure.kind.clone(),
                position: structure.position,
                health: structure.health.current(),
                max_health: structure.health.max(),
                attack: structure.selector.attack_type(),
                attackers: structure.attackers.iter().collect(),
                target: structure.selector.current_target(),
            })
            .collect()
    }

    /// Captures every projectile in flight in slot order.
    #[must_use]
    pub fn projectile_view(world: &World) -> Vec<ProjectileSnapshot> {
        world
            .combat
            .pool()
            .iter_active()
            .filter_map(|(id, projectile)| {
                let flight = projectile.flight()?;
                Some(ProjectileSnapshot {
                    id,
                    position: projectile.position(),
                    progress: projectile.progress(),
                    color: projectile.color(),
                    source: flight.source,
                    target: flight.target,
                })
            })
            .collect()
    }

    /// Slot counts of the projectile pool.
    #[must_use]
    pub fn pool_stats(world: &World) -> PoolStats {
        let pool = world.combat.pool();
        PoolStats {
            capacity: pool.capacity(),
            active: pool.active_count(),
            idle: pool.idle_count(),
        }
    }

    /// Immutable representation of a hostile unit.
    #[derive(Clone, Debug, PartialEq)]
    pub struct UnitSnapshot {
        /// Identifier of the unit.
        pub id: UnitId,
        /// Catalog entry the unit was spawned from.
        pub kind: UnitKind,
        /// Position reported by the movement collaborator.
        pub position: Option<Vec2>,
        /// Current health.
        pub health: f32,
        /// Health the unit spawned with.
        pub max_health: f32,
        /// Structure the unit is attacking, if it is a raider in combat.
        pub engaged: Option<StructureId>,
    }

    /// Immutable representation of a structure.
    #[derive(Clone, Debug, PartialEq)]
    pub struct StructureSnapshot {
        /// Identifier of the structure.
        pub id: StructureId,
        /// Catalog entry the structure was built from.
        pub kind: StructureKind,
        /// Position of the structure.
        pub position: Vec2,
        /// Current health.
        pub health: f32,
        /// Health the structure was placed with.
        pub max_health: f32,
        /// Targeting behaviour.
        pub attack: AttackType,
        /// Registered attackers in registration order.
        pub attackers: Vec<UnitId>,
        /// Target tracked by a single-target structure.
        pub target: Option<UnitId>,
    }

    /// Immutable representation of a projectile in flight.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct ProjectileSnapshot {
        /// Pool slot carrying the projectile.
        pub id: ProjectileId,
        /// Interpolated position.
        pub position: Vec2,
        /// Flight progress in `[0, 1]`.
        pub progress: f32,
        /// Visual tag.
        pub color: ProjectileColor,
        /// Entity that fired.
        pub source: EntityRef,
        /// Entity being tracked.
        pub target: EntityRef,
    }

    /// Slot counts of the projectile pool.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct PoolStats {
        /// Slots ever created.
        pub capacity: usize,
        /// Slots in flight.
        pub active: usize,
        /// Slots waiting to be acquired.
        pub idle: usize,
    }
}
