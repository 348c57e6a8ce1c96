#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave state machine that drives preparation, spawning and clear-wait.
//!
//! The scheduler is advanced by the tick driver and never blocks. Every
//! suspension (preparation, spawn offsets, spawn intervals) is an entry in a
//! [`TimerQueue`]; the clear-wait is a predicate re-evaluated on every tick.
//! The live-unit count is owned here and only changes through a successful
//! spawn or [`WaveScheduler::on_unit_removed`].

use std::{sync::Arc, time::Duration};

use rampart_core::{Event, PlacementGate, ProgressReporter, SpawnFactory, WaveSet};
use rampart_system_spawning::{SpawnGroupTimer, SpawnSite, TimerQueue};

/// Phase of the wave state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WavePhase {
    /// Waiting for `start`.
    Idle,
    /// Build phase before a wave; placement is enabled.
    Preparing,
    /// Spawn group timers of the current wave are still releasing units.
    Spawning,
    /// Every unit of the wave was released; waiting for the live count to hit zero.
    AwaitingClear,
    /// Every wave was cleared.
    Complete,
    /// Processing was halted before completion.
    Stopped,
}

/// Progress counters of the running session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WaveRunState {
    wave_index: usize,
    live_count: u32,
    running: bool,
}

impl WaveRunState {
    /// Zero-based index of the current wave.
    #[must_use]
    pub const fn wave_index(&self) -> usize {
        self.wave_index
    }

    /// Number of hostile units currently alive.
    #[must_use]
    pub const fn live_count(&self) -> u32 {
        self.live_count
    }

    /// Reports whether the scheduler is processing waves.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    fn on_unit_spawned(&mut self) -> u32 {
        self.live_count = self.live_count.saturating_add(1);
        self.live_count
    }

    fn on_unit_removed(&mut self) -> u32 {
        debug_assert!(self.live_count > 0, "unit removed while live count is zero");
        self.live_count = self.live_count.saturating_sub(1);
        self.live_count
    }
}

/// Parameters that are not part of the wave set itself.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SchedulerConfig {
    /// Area in which spawned units appear.
    pub spawn_site: SpawnSite,
    /// Seed from which every spawn group derives its RNG stream.
    pub seed: u64,
}

/// Collaborators the scheduler calls while it runs.
pub struct WaveHooks<'a> {
    /// Materialises hostile units.
    pub factory: &'a mut dyn SpawnFactory,
    /// Enables placement during preparation.
    pub placement: &'a mut dyn PlacementGate,
    /// Receives countdown and counter updates.
    pub progress: &'a mut dyn ProgressReporter,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Wake {
    EndPreparation,
    Release { group: usize },
}

/// Top-level wave state machine.
#[derive(Debug)]
pub struct WaveScheduler {
    waves: Arc<WaveSet>,
    preparation: Duration,
    config: SchedulerConfig,
    phase: WavePhase,
    run: WaveRunState,
    clock: Duration,
    wave_started_at: Duration,
    preparation_ends_at: Duration,
    last_preparation_report: Option<Duration>,
    queue: TimerQueue<Wake>,
    groups: Vec<SpawnGroupTimer>,
}

impl WaveScheduler {
    /// Creates an idle scheduler for the provided wave set.
    #[must_use]
    pub fn new(waves: Arc<WaveSet>, config: SchedulerConfig) -> Self {
        if !waves.preparation.is_valid() {
            tracing::warn!(
                value = waves.preparation.get(),
                "preparation duration is invalid; using zero"
            );
        }
        let preparation = waves.preparation.to_duration();

        Self {
            waves,
            preparation,
            config,
            phase: WavePhase::Idle,
            run: WaveRunState::default(),
            clock: Duration::ZERO,
            wave_started_at: Duration::ZERO,
            preparation_ends_at: Duration::ZERO,
            last_preparation_report: None,
            queue: TimerQueue::new(),
            groups: Vec::new(),
        }
    }

    /// Current phase of the state machine.
    #[must_use]
    pub const fn phase(&self) -> WavePhase {
        self.phase
    }

    /// Snapshot of the progress counters.
    #[must_use]
    pub const fn run_state(&self) -> WaveRunState {
        self.run
    }

    /// Number of hostile units currently alive.
    #[must_use]
    pub const fn live_count(&self) -> u32 {
        self.run.live_count
    }

    /// Time elapsed since the scheduler started.
    #[must_use]
    pub const fn clock(&self) -> Duration {
        self.clock
    }

    /// Number of waves in the wave set.
    #[must_use]
    pub fn wave_count(&self) -> usize {
        self.waves.len()
    }

    /// Build time left in the current preparation phase.
    #[must_use]
    pub fn preparation_remaining(&self) -> Option<Duration> {
        (self.phase == WavePhase::Preparing)
            .then(|| self.preparation_ends_at.saturating_sub(self.clock))
    }

    /// Begins processing. Does nothing unless the scheduler is idle.
    pub fn start(&mut self, hooks: &mut WaveHooks<'_>, out: &mut Vec<Event>) {
        if self.phase != WavePhase::Idle {
            return;
        }

        self.run.running = true;
        if self.waves.is_empty() {
            tracing::warn!("wave set is empty; completing immediately");
            self.complete(out);
            return;
        }
        self.enter_preparation(hooks, out);
    }

    /// Halts processing. Outstanding spawn timers are discarded without firing.
    pub fn stop(&mut self) {
        self.queue.clear();
        self.groups.clear();
        self.run.running = false;
        if self.phase != WavePhase::Complete {
            self.phase = WavePhase::Stopped;
        }
    }

    /// Advances the state machine by `dt`.
    pub fn tick(&mut self, dt: Duration, hooks: &mut WaveHooks<'_>, out: &mut Vec<Event>) {
        if !self.run.running {
            return;
        }
        self.clock = self.clock.saturating_add(dt);

        loop {
            let mut progressed = false;
            while let Some((due, wake)) = self.queue.pop_due(self.clock) {
                progressed = true;
                match wake {
                    Wake::EndPreparation => self.begin_wave(due, hooks, out),
                    Wake::Release { group } => self.release(group, hooks, out),
                }
            }
            if self.advance_if_cleared(hooks, out) {
                progressed = true;
            }
            if !progressed || !self.run.running {
                break;
            }
        }

        if self.phase == WavePhase::Preparing {
            self.report_preparation(hooks);
        }
    }

    /// Records the removal of a hostile unit (death or arrival at the goal).
    ///
    /// The count is always kept, but observers are only notified while waves
    /// are running.
    pub fn on_unit_removed(&mut self, progress: &mut dyn ProgressReporter) {
        let live = self.run.on_unit_removed();
        if self.run.running {
            progress.on_live_count_changed(live);
        }
    }

    fn enter_preparation(&mut self, hooks: &mut WaveHooks<'_>, out: &mut Vec<Event>) {
        let wave = self.run.wave_index;
        self.phase = WavePhase::Preparing;

        hooks.placement.set_placement_enabled(true);
        out.push(Event::PlacementChanged { enabled: true });

        let remaining_waves = self.waves.len().saturating_sub(wave + 1);
        hooks.progress.on_wave_count_changed(remaining_waves);
        hooks.progress.on_live_count_changed(self.run.live_count);
        hooks.progress.on_preparation_tick(self.preparation);
        self.last_preparation_report = Some(self.preparation);

        self.preparation_ends_at = self.clock.saturating_add(self.preparation);
        self.queue.schedule(self.preparation_ends_at, Wake::EndPreparation);

        out.push(Event::PreparationStarted {
            wave,
            duration: self.preparation,
        });
        tracing::debug!(wave, remaining_waves, "preparation started");
    }

    fn begin_wave(&mut self, at: Duration, hooks: &mut WaveHooks<'_>, out: &mut Vec<Event>) {
        let wave = self.run.wave_index;
        self.phase = WavePhase::Spawning;
        self.last_preparation_report = None;
        self.wave_started_at = at;

        hooks.placement.set_placement_enabled(false);
        out.push(Event::PlacementChanged { enabled: false });
        out.push(Event::WaveStarted { wave });

        self.groups.clear();
        let waves = Arc::clone(&self.waves);
        let Some(info) = waves.wave(wave) else {
            return;
        };

        for (index, config) in info.groups.iter().enumerate() {
            let seed = group_seed(self.config.seed, wave, index);
            let timer = SpawnGroupTimer::new(config, self.config.spawn_site, seed);
            if let Some(offset) = timer.next_due() {
                self.queue.schedule(at.saturating_add(offset), Wake::Release { group: index });
            }
            self.groups.push(timer);
        }
        tracing::debug!(wave, groups = self.groups.len(), "wave started");
    }

    fn release(&mut self, group: usize, hooks: &mut WaveHooks<'_>, out: &mut Vec<Event>) {
        let Some(timer) = self.groups.get_mut(group) else {
            return;
        };
        let kind = timer.kind().clone();
        let Some(outcome) = timer.fire(&mut *hooks.factory) else {
            return;
        };
        let next = timer.next_due();

        match outcome {
            Ok(spawned) => {
                let live = self.run.on_unit_spawned();
                hooks.progress.on_live_count_changed(live);
                out.push(Event::UnitSpawned {
                    unit: spawned.unit,
                    kind,
                    position: spawned.position,
                });
            }
            Err(reason) => out.push(Event::SpawnFailed { kind, reason }),
        }

        if let Some(offset) = next {
            self.queue.schedule(
                self.wave_started_at.saturating_add(offset),
                Wake::Release { group },
            );
        }
    }

    fn advance_if_cleared(&mut self, hooks: &mut WaveHooks<'_>, out: &mut Vec<Event>) -> bool {
        if self.phase == WavePhase::Spawning
            && self.groups.iter().all(SpawnGroupTimer::is_finished)
        {
            self.phase = WavePhase::AwaitingClear;
            tracing::debug!(wave = self.run.wave_index, "all groups released");
        }

        if self.phase != WavePhase::AwaitingClear || self.run.live_count > 0 {
            return false;
        }

        let wave = self.run.wave_index;
        out.push(Event::WaveCleared { wave });
        tracing::debug!(wave, "wave cleared");

        self.groups.clear();
        self.run.wave_index += 1;
        if self.run.wave_index >= self.waves.len() {
            self.complete(out);
        } else {
            self.enter_preparation(hooks, out);
        }
        true
    }

    fn complete(&mut self, out: &mut Vec<Event>) {
        self.phase = WavePhase::Complete;
        self.run.running = false;
        self.queue.clear();
        out.push(Event::AllWavesComplete);
        tracing::info!(waves = self.waves.len(), "all waves completed");
    }

    fn report_preparation(&mut self, hooks: &mut WaveHooks<'_>) {
        let remaining = self.preparation_ends_at.saturating_sub(self.clock);
        if remaining.is_zero() {
            return;
        }

        let decreased = self
            .last_preparation_report
            .map_or(true, |last| remaining < last);
        if decreased {
            hooks.progress.on_preparation_tick(remaining);
            self.last_preparation_report = Some(remaining);
        }
    }
}

fn group_seed(seed: u64, wave: usize, group: usize) -> u64 {
    let wave = u64::try_from(wave).unwrap_or(u64::MAX);
    let group = u64::try_from(group).unwrap_or(u64::MAX);
    seed ^ wave.wrapping_mul(0x9e37_79b9_7f4a_7c15) ^ group.rotate_left(32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_state_counts_spawns_and_removals() {
        let mut run = WaveRunState::default();
        assert_eq!(run.on_unit_spawned(), 1);
        assert_eq!(run.on_unit_spawned(), 2);
        assert_eq!(run.on_unit_removed(), 1);
        assert_eq!(run.live_count(), 1);
    }

    #[test]
    fn group_seeds_differ_per_wave_and_group() {
        assert_ne!(group_seed(5, 0, 0), group_seed(5, 0, 1));
        assert_ne!(group_seed(5, 0, 0), group_seed(5, 1, 0));
        assert_eq!(group_seed(5, 2, 3), group_seed(5, 2, 3));
    }

    #[test]
    #[should_panic(expected = "live count is zero")]
    #[cfg(debug_assertions)]
    fn removing_from_empty_count_is_a_defect() {
        let mut run = WaveRunState::default();
        let _ = run.on_unit_removed();
    }
}
