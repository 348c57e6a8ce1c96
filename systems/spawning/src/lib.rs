#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Timed spawn sequences that release hostile units during a wave.
//!
//! A [`SpawnGroupTimer`] turns one [`SpawnGroupConfig`] into a lazy,
//! time-ordered sequence of releases. The timer does not own a clock: the
//! wave scheduler schedules each pending release in its [`TimerQueue`] and
//! calls [`SpawnGroupTimer::fire`] when the entry comes due.

mod queue;

use std::time::Duration;

use rampart_core::{SpawnError, SpawnFactory, SpawnGroupConfig, UnitId, UnitKind, Vec2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub use queue::TimerQueue;

/// Disc around the map's spawn point in which units appear.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnSite {
    /// Centre of the disc.
    pub origin: Vec2,
    /// Radius of the disc.
    pub radius: f32,
}

impl SpawnSite {
    /// Creates a spawn site.
    #[must_use]
    pub const fn new(origin: Vec2, radius: f32) -> Self {
        Self { origin, radius }
    }

    /// Samples a uniformly distributed point inside the disc.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec2 {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return self.origin;
        }

        let distance = self.radius * rng.gen::<f32>().sqrt();
        let angle = std::f32::consts::TAU * rng.gen::<f32>();
        self.origin + Vec2::new(angle.cos(), angle.sin()) * distance
    }
}

impl Default for SpawnSite {
    fn default() -> Self {
        Self::new(Vec2::ZERO, 0.0)
    }
}

/// One scheduled release within a spawn group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnEvent {
    /// Zero-based position of the release within its group.
    pub ordinal: u32,
    /// Offset of the release from the wave start.
    pub at: Duration,
}

/// Lazy sequence of release times: `start_offset`, then every `interval`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpawnSchedule {
    count: u32,
    start_offset: Duration,
    interval: Duration,
    emitted: u32,
}

impl SpawnSchedule {
    /// Creates a schedule of `count` releases.
    #[must_use]
    pub const fn new(count: u32, start_offset: Duration, interval: Duration) -> Self {
        Self {
            count,
            start_offset,
            interval,
            emitted: 0,
        }
    }
}

impl Iterator for SpawnSchedule {
    type Item = SpawnEvent;

    fn next(&mut self) -> Option<SpawnEvent> {
        if self.emitted >= self.count {
            return None;
        }

        let ordinal = self.emitted;
        self.emitted += 1;
        let at = self
            .interval
            .checked_mul(ordinal)
            .and_then(|elapsed| self.start_offset.checked_add(elapsed))
            .unwrap_or(Duration::MAX);
        Some(SpawnEvent { ordinal, at })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.count - self.emitted).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

/// Unit materialised by a successful release.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnedUnit {
    /// Identifier returned by the spawn factory.
    pub unit: UnitId,
    /// Position the unit was requested at.
    pub position: Vec2,
}

/// Independent timed sequence releasing a fixed count of one unit kind.
#[derive(Clone, Debug)]
pub struct SpawnGroupTimer {
    kind: UnitKind,
    schedule: SpawnSchedule,
    pending: Option<SpawnEvent>,
    site: SpawnSite,
    rng: ChaCha8Rng,
}

impl SpawnGroupTimer {
    /// Creates a timer for the group, clamping invalid durations to zero.
    #[must_use]
    pub fn new(config: &SpawnGroupConfig, site: SpawnSite, seed: u64) -> Self {
        if !config.start_offset.is_valid() {
            tracing::warn!(
                kind = %config.kind,
                value = config.start_offset.get(),
                "spawn group start offset is invalid; using zero"
            );
        }
        if !config.interval.is_valid() {
            tracing::warn!(
                kind = %config.kind,
                value = config.interval.get(),
                "spawn group interval is invalid; using zero"
            );
        }

        let mut schedule = SpawnSchedule::new(
            config.count,
            config.start_offset.to_duration(),
            config.interval.to_duration(),
        );
        let pending = schedule.next();
        Self {
            kind: config.kind.clone(),
            schedule,
            pending,
            site,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Unit kind released by the group.
    #[must_use]
    pub fn kind(&self) -> &UnitKind {
        &self.kind
    }

    /// Offset from the wave start of the next release, if any remain.
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        self.pending.map(|event| event.at)
    }

    /// Number of releases that have not fired yet.
    #[must_use]
    pub fn remaining(&self) -> usize {
        usize::from(self.pending.is_some()) + self.schedule.size_hint().0
    }

    /// Reports whether every release has fired.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.pending.is_none()
    }

    /// Fires the pending release through the spawn factory.
    ///
    /// Returns `None` once the group is finished. A factory failure consumes
    /// the release, is logged, and leaves the rest of the sequence intact.
    pub fn fire(
        &mut self,
        factory: &mut dyn SpawnFactory,
    ) -> Option<Result<SpawnedUnit, SpawnError>> {
        let event = self.pending.take()?;
        self.pending = self.schedule.next();

        let position = self.site.sample(&mut self.rng);
        let outcome = factory
            .spawn(&self.kind, position)
            .map(|unit| SpawnedUnit { unit, position });

        if let Err(error) = &outcome {
            tracing::warn!(
                kind = %self.kind,
                ordinal = event.ordinal,
                %error,
                "spawn failed; continuing with the next release"
            );
        }

        Some(outcome)
    }
}
