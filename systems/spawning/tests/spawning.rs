use std::time::Duration;

use rampart_core::{Seconds, SpawnError, SpawnFactory, SpawnGroupConfig, UnitId, UnitKind, Vec2};
use rampart_system_spawning::{SpawnGroupTimer, SpawnSite};

/// Factory that fails on the listed call indices.
struct ScriptedFactory {
    calls: u32,
    failures: Vec<u32>,
    positions: Vec<Vec2>,
}

impl ScriptedFactory {
    fn failing_on(failures: Vec<u32>) -> Self {
        Self {
            calls: 0,
            failures,
            positions: Vec::new(),
        }
    }
}

impl SpawnFactory for ScriptedFactory {
    fn spawn(&mut self, kind: &UnitKind, position: Vec2) -> Result<UnitId, SpawnError> {
        let call = self.calls;
        self.calls += 1;
        if self.failures.contains(&call) {
            return Err(SpawnError::AssetUnavailable(kind.clone()));
        }
        self.positions.push(position);
        Ok(UnitId::new(call))
    }
}

fn group(count: u32, start_offset: f32, interval: f32) -> SpawnGroupConfig {
    SpawnGroupConfig::new(
        UnitKind::new("grunt"),
        count,
        Seconds::new(start_offset),
        Seconds::new(interval),
    )
}

#[test]
fn timer_walks_its_schedule_lazily() {
    let mut timer = SpawnGroupTimer::new(&group(3, 1.5, 2.0), SpawnSite::default(), 1);
    let mut factory = ScriptedFactory::failing_on(Vec::new());
    let mut due = Vec::new();

    while let Some(at) = timer.next_due() {
        due.push(at);
        let outcome = timer.fire(&mut factory).expect("pending release");
        assert!(outcome.is_ok());
    }

    assert_eq!(
        due,
        vec![
            Duration::from_millis(1500),
            Duration::from_millis(3500),
            Duration::from_millis(5500),
        ]
    );
    assert!(timer.is_finished());
    assert!(timer.fire(&mut factory).is_none());
    assert_eq!(factory.calls, 3);
}

#[test]
fn failed_release_does_not_stall_the_sequence() {
    let mut timer = SpawnGroupTimer::new(&group(4, 0.0, 1.0), SpawnSite::default(), 1);
    let mut factory = ScriptedFactory::failing_on(vec![1]);

    let outcomes: Vec<bool> = std::iter::from_fn(|| timer.fire(&mut factory))
        .map(|outcome| outcome.is_ok())
        .collect();

    assert_eq!(outcomes, vec![true, false, true, true]);
    assert_eq!(factory.positions.len(), 3);
}

#[test]
fn spawn_positions_are_reproducible_per_seed() {
    let site = SpawnSite::new(Vec2::new(3.0, 4.0), 5.0);
    let run = |seed| {
        let mut timer = SpawnGroupTimer::new(&group(5, 0.0, 0.0), site, seed);
        let mut factory = ScriptedFactory::failing_on(Vec::new());
        while timer.fire(&mut factory).is_some() {}
        factory.positions
    };

    let first = run(11);
    assert_eq!(first, run(11));
    assert_ne!(first, run(12));
    assert!(first.iter().all(|point| point.distance(site.origin) <= 5.0 + 1e-4));
}

#[test]
fn zero_count_group_is_finished_immediately() {
    let timer = SpawnGroupTimer::new(&group(0, 2.0, 1.0), SpawnSite::default(), 1);
    assert!(timer.is_finished());
    assert_eq!(timer.remaining(), 0);
    assert_eq!(timer.next_due(), None);
}
