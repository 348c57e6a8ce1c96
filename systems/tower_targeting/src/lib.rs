#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Structure targeting strategies and the per-structure attacker registry.
//!
//! Every structure owns one [`TargetSelector`] and one [`AttackerRegistry`].
//! Each tick the selector inspects the registry, the unit lookup and the
//! spatial collaborator, and emits [`FireOrder`] values for the combat
//! resolver. Selectors never touch health or projectiles themselves.

use std::time::Duration;

use rampart_core::{
    AttackType, EntityFilter, EntityRef, SpatialIndex, StructureId, StructureProfile, UnitId, Vec2,
};

/// Live attributes of a unit consulted while targeting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitStatus {
    /// Current position of the unit.
    pub position: Vec2,
    /// Current health of the unit.
    pub health: f32,
    /// Whether the unit's health reached zero.
    pub dead: bool,
}

/// Read access to the units owned by the simulation.
pub trait UnitLookup {
    /// Status of the unit, or `None` when it no longer exists.
    fn unit_status(&self, unit: UnitId) -> Option<UnitStatus>;
}

fn living(units: &dyn UnitLookup, unit: UnitId) -> Option<UnitStatus> {
    units.unit_status(unit).filter(|status| !status.dead)
}

/// Set of units currently attacking one structure, in registration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttackerRegistry {
    attackers: Vec<UnitId>,
}

impl AttackerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the unit unless it is already registered. Returns whether it was added.
    pub fn register(&mut self, unit: UnitId) -> bool {
        if self.attackers.contains(&unit) {
            return false;
        }
        self.attackers.push(unit);
        true
    }

    /// Removes entries that died or no longer exist.
    pub fn prune_dead(&mut self, units: &dyn UnitLookup) {
        self.attackers
            .retain(|unit| living(units, *unit).is_some());
    }

    /// Reports whether the unit is registered.
    #[must_use]
    pub fn contains(&self, unit: UnitId) -> bool {
        self.attackers.contains(&unit)
    }

    /// Registered attackers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.attackers.iter().copied()
    }

    /// Number of registered attackers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attackers.len()
    }

    /// Reports whether no attacker is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attackers.is_empty()
    }
}

/// Tracks the time of the last shot against a fixed interval.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cooldown {
    last_fire: Option<Duration>,
}

impl Cooldown {
    /// Reports whether at least `interval` elapsed since the last shot.
    ///
    /// A cooldown that never fired is always ready, and a zero interval is
    /// ready on every tick.
    #[must_use]
    pub fn is_ready(&self, now: Duration, interval: Duration) -> bool {
        match self.last_fire {
            None => true,
            Some(last) => now.saturating_sub(last) >= interval,
        }
    }

    /// Records a shot at `now`.
    pub fn mark(&mut self, now: Duration) {
        self.last_fire = Some(now);
    }

    /// Time of the last recorded shot.
    #[must_use]
    pub const fn last_fire(&self) -> Option<Duration> {
        self.last_fire
    }
}

/// Targeting parameters derived from a structure profile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetingConfig {
    /// Engagement radius.
    pub range: f32,
    /// Minimum delay between volleys.
    pub fire_interval: Duration,
}

impl TargetingConfig {
    /// Extracts targeting parameters, clamping invalid values to zero.
    #[must_use]
    pub fn from_profile(profile: &StructureProfile) -> Self {
        let range = if profile.range.is_finite() {
            profile.range.max(0.0)
        } else {
            0.0
        };
        Self {
            range,
            fire_interval: profile.fire_interval.to_duration(),
        }
    }
}

impl Default for TargetingConfig {
    fn default() -> Self {
        Self {
            range: 0.0,
            fire_interval: Duration::ZERO,
        }
    }
}

/// Request for the combat resolver to fire one projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FireOrder {
    /// Structure that fires.
    pub structure: StructureId,
    /// Unit to fire at.
    pub target: UnitId,
}

/// Per-tick inputs shared by every targeting strategy.
pub struct TargetingContext<'a> {
    /// Current simulation time.
    pub now: Duration,
    /// Position of the owning structure.
    pub origin: Vec2,
    /// Attacker registry of the owning structure.
    pub attackers: &'a mut AttackerRegistry,
    /// Unit lookup used for liveness, health and positions.
    pub units: &'a dyn UnitLookup,
    /// Spatial collaborator used for range queries.
    pub spatial: &'a dyn SpatialIndex,
}

/// Shared contract implemented by every targeting strategy.
pub trait TargetingStrategy {
    /// Binds the strategy to its owning structure.
    fn initialize(&mut self, owner: StructureId, config: TargetingConfig);

    /// Runs one targeting step, appending fire orders to `out`.
    fn tick(&mut self, ctx: &mut TargetingContext<'_>, out: &mut Vec<FireOrder>);
}

/// Strategy that tracks a single target and retaliates against attackers.
#[derive(Clone, Debug, Default)]
pub struct SingleTarget {
    owner: Option<StructureId>,
    config: TargetingConfig,
    current: Option<UnitId>,
    cooldown: Cooldown,
    scratch: Vec<EntityRef>,
}

impl SingleTarget {
    /// Creates an unbound single-target strategy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Unit currently tracked, if any.
    #[must_use]
    pub const fn current_target(&self) -> Option<UnitId> {
        self.current
    }

    fn select(&mut self, ctx: &mut TargetingContext<'_>) -> Option<UnitId> {
        ctx.attackers.prune_dead(ctx.units);

        let mut weakest: Option<(UnitId, f32)> = None;
        for unit in ctx.attackers.iter() {
            let Some(status) = living(ctx.units, unit) else {
                continue;
            };
            let replaces = match weakest {
                Some((_, health)) => status.health < health,
                None => true,
            };
            if replaces {
                weakest = Some((unit, status.health));
            }
        }

        if let Some((unit, _)) = weakest {
            return Some(unit);
        }

        ctx.spatial.query_in_range(
            ctx.origin,
            self.config.range,
            EntityFilter::Units,
            &mut self.scratch,
        );
        self.scratch
            .iter()
            .filter_map(|entity| entity.unit())
            .find(|unit| living(ctx.units, *unit).is_some())
    }
}

impl TargetingStrategy for SingleTarget {
    fn initialize(&mut self, owner: StructureId, config: TargetingConfig) {
        self.owner = Some(owner);
        self.config = config;
        self.current = None;
        self.cooldown = Cooldown::default();
    }

    fn tick(&mut self, ctx: &mut TargetingContext<'_>, out: &mut Vec<FireOrder>) {
        let Some(owner) = self.owner else {
            return;
        };

        // A non-empty registry forces re-selection even while the current
        // target is still valid.
        let stale = self
            .current
            .map_or(true, |unit| living(ctx.units, unit).is_none());
        if stale || !ctx.attackers.is_empty() {
            self.current = self.select(ctx);
        }

        let Some(target) = self.current else {
            return;
        };
        let Some(status) = living(ctx.units, target) else {
            self.current = None;
            return;
        };

        if ctx.origin.distance(status.position) > self.config.range {
            self.current = None;
            return;
        }

        if self.cooldown.is_ready(ctx.now, self.config.fire_interval) {
            tracing::debug!(structure = owner.get(), unit = target.get(), "single target fire");
            out.push(FireOrder {
                structure: owner,
                target,
            });
            self.cooldown.mark(ctx.now);
        }
    }
}

/// Strategy that fires one projectile at every unit in range per volley.
#[derive(Clone, Debug, Default)]
pub struct MultiTarget {
    owner: Option<StructureId>,
    config: TargetingConfig,
    cooldown: Cooldown,
    scratch: Vec<EntityRef>,
}

impl MultiTarget {
    /// Creates an unbound multi-target strategy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TargetingStrategy for MultiTarget {
    fn initialize(&mut self, owner: StructureId, config: TargetingConfig) {
        self.owner = Some(owner);
        self.config = config;
        self.cooldown = Cooldown::default();
    }

    fn tick(&mut self, ctx: &mut TargetingContext<'_>, out: &mut Vec<FireOrder>) {
        let Some(owner) = self.owner else {
            return;
        };
        if !self.cooldown.is_ready(ctx.now, self.config.fire_interval) {
            return;
        }

        ctx.spatial.query_in_range(
            ctx.origin,
            self.config.range,
            EntityFilter::Units,
            &mut self.scratch,
        );
        let before = out.len();
        for unit in self.scratch.iter().filter_map(|entity| entity.unit()) {
            if living(ctx.units, unit).is_some() {
                out.push(FireOrder {
                    structure: owner,
                    target: unit,
                });
            }
        }
        if out.len() > before {
            tracing::debug!(
                structure = owner.get(),
                volley = out.len() - before,
                "multi target fire"
            );
        }

        // The shared cooldown restarts after every volley, empty or not.
        self.cooldown.mark(ctx.now);
    }
}

/// Targeting strategy chosen by a structure's attack type.
#[derive(Clone, Debug)]
pub enum TargetSelector {
    /// Single-target strategy.
    Single(SingleTarget),
    /// Multi-target strategy.
    Multi(MultiTarget),
}

impl TargetSelector {
    /// Creates the unbound strategy matching the attack type.
    #[must_use]
    pub fn for_attack(attack: AttackType) -> Self {
        match attack {
            AttackType::Single => Self::Single(SingleTarget::new()),
            AttackType::Multi => Self::Multi(MultiTarget::new()),
        }
    }

    /// Creates and binds the strategy described by a structure profile.
    #[must_use]
    pub fn for_structure(owner: StructureId, profile: &StructureProfile) -> Self {
        let mut selector = Self::for_attack(profile.attack);
        selector.initialize(owner, TargetingConfig::from_profile(profile));
        selector
    }

    /// Attack type implemented by the selector.
    #[must_use]
    pub const fn attack_type(&self) -> AttackType {
        match self {
            Self::Single(_) => AttackType::Single,
            Self::Multi(_) => AttackType::Multi,
        }
    }

    /// Unit currently tracked by a single-target selector.
    #[must_use]
    pub const fn current_target(&self) -> Option<UnitId> {
        match self {
            Self::Single(single) => single.current_target(),
            Self::Multi(_) => None,
        }
    }
}

impl TargetingStrategy for TargetSelector {
    fn initialize(&mut self, owner: StructureId, config: TargetingConfig) {
        match self {
            Self::Single(single) => single.initialize(owner, config),
            Self::Multi(multi) => multi.initialize(owner, config),
        }
    }

    fn tick(&mut self, ctx: &mut TargetingContext<'_>, out: &mut Vec<FireOrder>) {
        match self {
            Self::Single(single) => single.tick(ctx, out),
            Self::Multi(multi) => multi.tick(ctx, out),
        }
    }
}
