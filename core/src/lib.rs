#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Rampart wave simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and the pure systems. Adapters submit [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values describing
//! what happened. Everything the simulation does not own itself (spawning
//! assets, movement, spatial partitioning, placement UI and progress display)
//! is reached through the narrow collaborator traits declared here.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use glam::Vec2;

/// Preparation time granted before each wave when a wave set omits it.
pub const DEFAULT_PREPARATION_SECONDS: f32 = 5.0;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Starts wave processing. Ignored if the waves already started.
    StartWaves,
    /// Halts wave processing and cancels every outstanding spawn timer.
    StopWaves,
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests placement of a defensive structure.
    PlaceStructure {
        /// Catalog entry describing the structure to build.
        kind: StructureKind,
        /// World position the structure occupies.
        position: Vec2,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that the build phase preceding a wave began.
    PreparationStarted {
        /// Zero-based index of the upcoming wave.
        wave: usize,
        /// Length of the build phase.
        duration: Duration,
    },
    /// Announces that the spawn groups of a wave were launched.
    WaveStarted {
        /// Zero-based index of the wave.
        wave: usize,
    },
    /// Announces that every unit of a wave was spawned and removed.
    WaveCleared {
        /// Zero-based index of the wave.
        wave: usize,
    },
    /// Announces that the final wave was cleared.
    AllWavesComplete,
    /// Reports that structure placement was enabled or disabled.
    PlacementChanged {
        /// Whether placement requests are currently accepted.
        enabled: bool,
    },
    /// Confirms that a hostile unit entered the simulation.
    UnitSpawned {
        /// Identifier assigned to the unit.
        unit: UnitId,
        /// Catalog entry the unit was created from.
        kind: UnitKind,
        /// Position the unit spawned at.
        position: Vec2,
    },
    /// Reports that a scheduled spawn could not be materialised.
    SpawnFailed {
        /// Catalog entry the spawn requested.
        kind: UnitKind,
        /// Reason reported by the spawn factory.
        reason: SpawnError,
    },
    /// Reports that a hostile unit's health reached zero.
    UnitDied {
        /// Identifier of the unit that died.
        unit: UnitId,
    },
    /// Reports that a hostile unit arrived at the goal and left the field.
    UnitReachedGoal {
        /// Identifier of the unit that arrived.
        unit: UnitId,
    },
    /// Confirms that a structure was placed.
    StructurePlaced {
        /// Identifier assigned to the structure.
        structure: StructureId,
        /// Catalog entry the structure was built from.
        kind: StructureKind,
        /// Position occupied by the structure.
        position: Vec2,
    },
    /// Reports that a placement request was rejected.
    StructurePlacementRejected {
        /// Catalog entry named by the request.
        kind: StructureKind,
        /// Position named by the request.
        position: Vec2,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Reports that a structure's health reached zero and it was removed.
    StructureDestroyed {
        /// Identifier of the destroyed structure.
        structure: StructureId,
    },
    /// Confirms that a projectile was dispatched.
    ProjectileFired {
        /// Pool slot carrying the projectile.
        projectile: ProjectileId,
        /// Entity that fired.
        source: EntityRef,
        /// Entity the projectile tracks.
        target: EntityRef,
    },
    /// Confirms that a projectile reached a living target and dealt damage.
    ProjectileHit {
        /// Pool slot that carried the projectile.
        projectile: ProjectileId,
        /// Entity that received the damage.
        target: EntityRef,
        /// Damage applied on impact.
        damage: f32,
    },
    /// Reports that a projectile's target vanished before impact.
    ProjectileExpired {
        /// Pool slot that carried the projectile.
        projectile: ProjectileId,
        /// Entity the projectile was tracking.
        target: EntityRef,
    },
}

/// Unique identifier assigned to a hostile unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructureId(u32);

impl StructureId {
    /// Creates a new structure identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Handle to a slot owned by the projectile pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile handle with the provided slot index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Index of the slot inside the owning pool.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Reference to any entity that can fire or be fired upon.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityRef {
    /// A hostile unit.
    Unit(UnitId),
    /// A defensive structure.
    Structure(StructureId),
}

impl EntityRef {
    /// Returns the unit identifier when the reference names a unit.
    #[must_use]
    pub const fn unit(self) -> Option<UnitId> {
        match self {
            Self::Unit(unit) => Some(unit),
            Self::Structure(_) => None,
        }
    }

    /// Returns the structure identifier when the reference names a structure.
    #[must_use]
    pub const fn structure(self) -> Option<StructureId> {
        match self {
            Self::Unit(_) => None,
            Self::Structure(structure) => Some(structure),
        }
    }
}

/// Restricts spatial queries to a single entity family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityFilter {
    /// Only hostile units are returned.
    Units,
    /// Only structures are returned.
    Structures,
}

impl EntityFilter {
    /// Reports whether the entity passes the filter.
    #[must_use]
    pub const fn accepts(self, entity: EntityRef) -> bool {
        matches!(
            (self, entity),
            (Self::Units, EntityRef::Unit(_)) | (Self::Structures, EntityRef::Structure(_))
        )
    }
}

/// Name of a hostile unit entry inside the unit catalog.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitKind(String);

impl UnitKind {
    /// Creates a unit kind reference from its catalog name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Catalog name of the unit kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of a structure entry inside the structure catalog.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructureKind(String);

impl StructureKind {
    /// Creates a structure kind reference from its catalog name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Catalog name of the structure kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Visual tag carried by projectiles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectileColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl ProjectileColor {
    /// Creates a new projectile color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// Duration expressed in seconds as it appears in configuration data.
///
/// Configuration is supplied by an external loader and may carry negative or
/// non-finite values. Such values are never rejected: [`Seconds::to_duration`]
/// clamps them to zero and [`Seconds::is_valid`] lets callers report them.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seconds(f32);

impl Seconds {
    /// Zero-length duration.
    pub const ZERO: Self = Self(0.0);

    /// Wraps a raw number of seconds.
    #[must_use]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Raw configured value, possibly negative.
    #[must_use]
    pub const fn get(self) -> f32 {
        self.0
    }

    /// Reports whether the value is finite and non-negative.
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.0.is_finite() && self.0 >= 0.0
    }

    /// Converts the value into a [`Duration`], clamping invalid values to zero.
    ///
    /// The result is rounded to whole microseconds so decimal values such as
    /// `0.6` land exactly on millisecond tick boundaries.
    #[must_use]
    pub fn to_duration(self) -> Duration {
        if !self.is_valid() {
            return Duration::ZERO;
        }
        let micros = (f64::from(self.0) * MICROS_PER_SECOND).round();
        if micros >= u64::MAX as f64 {
            return Duration::MAX;
        }
        Duration::from_micros(micros as u64)
    }
}

impl From<f32> for Seconds {
    fn from(value: f32) -> Self {
        Self(value)
    }
}

/// One timed group of identical units released during a wave.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnGroupConfig {
    /// Unit kind released by the group.
    pub kind: UnitKind,
    /// Number of units released.
    pub count: u32,
    /// Delay between the wave start and the first release.
    #[serde(default)]
    pub start_offset: Seconds,
    /// Delay between consecutive releases.
    #[serde(default)]
    pub interval: Seconds,
}

impl SpawnGroupConfig {
    /// Creates a spawn group description.
    #[must_use]
    pub fn new(kind: UnitKind, count: u32, start_offset: Seconds, interval: Seconds) -> Self {
        Self {
            kind,
            count,
            start_offset,
            interval,
        }
    }
}

/// Spawn groups that fire concurrently once a wave starts.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WaveInfo {
    /// Groups released by the wave.
    #[serde(default)]
    pub groups: Vec<SpawnGroupConfig>,
}

impl WaveInfo {
    /// Creates a wave from its spawn groups.
    #[must_use]
    pub fn new(groups: Vec<SpawnGroupConfig>) -> Self {
        Self { groups }
    }

    /// Total number of units the wave releases.
    #[must_use]
    pub fn unit_count(&self) -> u64 {
        self.groups.iter().map(|group| u64::from(group.count)).sum()
    }
}

/// Ordered, immutable sequence of waves played during a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveSet {
    /// Build phase granted before every wave.
    #[serde(default = "default_preparation")]
    pub preparation: Seconds,
    /// Waves in play order.
    #[serde(default)]
    pub waves: Vec<WaveInfo>,
}

impl WaveSet {
    /// Creates a wave set from a preparation duration and its waves.
    #[must_use]
    pub fn new(preparation: Seconds, waves: Vec<WaveInfo>) -> Self {
        Self { preparation, waves }
    }

    /// Number of waves contained in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waves.len()
    }

    /// Reports whether the set contains no waves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }

    /// Retrieves the wave at the provided index.
    #[must_use]
    pub fn wave(&self, index: usize) -> Option<&WaveInfo> {
        self.waves.get(index)
    }
}

impl Default for WaveSet {
    fn default() -> Self {
        Self::new(default_preparation(), Vec::new())
    }
}

fn default_preparation() -> Seconds {
    Seconds::new(DEFAULT_PREPARATION_SECONDS)
}

/// Behaviour attached to a hostile unit kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UnitBehavior {
    /// Heads straight for the goal and never attacks.
    Runner,
    /// Stops to shoot at structures that come within reach.
    Raider {
        /// Distance within which structures are engaged.
        attack_range: f32,
        /// Damage dealt per projectile.
        attack_damage: f32,
        /// Minimum delay between two shots.
        attack_interval: Seconds,
        /// Visual tag applied to fired projectiles.
        #[serde(default)]
        projectile_color: ProjectileColor,
    },
}

/// Static attributes of a hostile unit kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitProfile {
    /// Health assigned when the unit spawns.
    pub max_health: f32,
    /// Travel speed in world units per second.
    pub speed: f32,
    /// Combat behaviour of the unit.
    pub behavior: UnitBehavior,
}

/// Targeting behaviour of a structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackType {
    /// Tracks one target at a time, preferring units that attack it.
    Single,
    /// Fires at every unit in range at once.
    Multi,
}

/// Static attributes of a structure kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructureProfile {
    /// Health assigned when the structure is placed.
    pub max_health: f32,
    /// Distance within which units are engaged.
    pub range: f32,
    /// Damage dealt per projectile.
    pub damage: f32,
    /// Minimum delay between two volleys.
    pub fire_interval: Seconds,
    /// Targeting behaviour.
    pub attack: AttackType,
    /// Visual tag applied to fired projectiles.
    #[serde(default)]
    pub projectile_color: ProjectileColor,
}

/// Reasons a spawn factory may fail to materialise a unit.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SpawnError {
    /// The unit catalog has no entry for the requested kind.
    #[error("unit kind `{0}` is not registered")]
    UnknownKind(UnitKind),
    /// The asset backing the requested kind could not be loaded.
    #[error("asset for unit kind `{0}` is unavailable")]
    AssetUnavailable(UnitKind),
    /// The catalog entry grants no health, so the unit would spawn dead.
    #[error("unit kind `{0}` has no health")]
    NoHealth(UnitKind),
}

/// Reasons a structure placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// Placement is only accepted during the preparation phase.
    PlacementDisabled,
    /// The structure catalog has no entry for the requested kind.
    UnknownKind,
    /// The catalog entry grants no health, so the structure would be built dead.
    NoHealth,
}

/// External factory that materialises hostile units.
pub trait SpawnFactory {
    /// Creates a unit of the provided kind at the provided position.
    ///
    /// Failures are transient: the caller logs them and moves on.
    fn spawn(&mut self, kind: &UnitKind, position: Vec2) -> Result<UnitId, SpawnError>;
}

/// External movement collaborator that owns unit positions.
pub trait Movement {
    /// Starts tracking a unit at the provided position.
    fn insert(&mut self, unit: UnitId, position: Vec2, speed: f32);
    /// Stops tracking a unit.
    fn remove(&mut self, unit: UnitId);
    /// Requests that the unit travel toward the provided point.
    fn move_to(&mut self, unit: UnitId, point: Vec2);
    /// Requests that the unit stop where it stands.
    fn halt(&mut self, unit: UnitId);
    /// Advances every tracked unit by the provided delta time.
    fn advance(&mut self, dt: Duration);
    /// Current position of the unit, if tracked.
    fn position(&self, unit: UnitId) -> Option<Vec2>;
    /// Reports whether the unit reached the point of its last `move_to`.
    fn has_arrived(&self, unit: UnitId) -> bool;
}

/// Entity position published to the spatial collaborator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpatialEntry {
    /// Entity occupying the position.
    pub entity: EntityRef,
    /// Position of the entity.
    pub position: Vec2,
}

/// External proximity query collaborator.
pub trait SpatialIndex {
    /// Replaces the indexed entities with the provided entries.
    fn rebuild(&mut self, entries: &[SpatialEntry]);
    /// Writes every entity accepted by `filter` within `radius` of `center`.
    ///
    /// The output buffer is cleared before it is populated.
    fn query_in_range(
        &self,
        center: Vec2,
        radius: f32,
        filter: EntityFilter,
        out: &mut Vec<EntityRef>,
    );
}

/// External gate that enables or disables structure placement.
pub trait PlacementGate {
    /// Enables or disables placement.
    fn set_placement_enabled(&mut self, enabled: bool);
}

/// Observer notified about wave progress. All methods default to no-ops.
pub trait ProgressReporter {
    /// Remaining build time of the current preparation phase.
    fn on_preparation_tick(&mut self, _remaining: Duration) {}
    /// Number of waves remaining after the upcoming one.
    fn on_wave_count_changed(&mut self, _remaining: usize) {}
    /// Number of hostile units currently alive.
    fn on_live_count_changed(&mut self, _live: u32) {}
}

/// Progress reporter that discards every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {}
