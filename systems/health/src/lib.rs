#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-entity health bookkeeping with a latched death notification.
//!
//! A [`HealthTracker`] never reports death twice: the call that drives health
//! to zero returns [`HealthChange::Died`] and every later damage or heal
//! request is ignored. The owner of the tracker (unit or structure) is the
//! only party that observes the notification and is responsible for removing
//! the entity.

/// Outcome of a damage request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HealthChange {
    /// The tracker was already dead; nothing changed.
    Ignored,
    /// Health decreased (possibly by zero) and the entity survived.
    Damaged,
    /// Health reached zero during this call. Reported exactly once.
    Died,
}

/// Current and maximum health of one entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HealthTracker {
    current: f32,
    max: f32,
    dead: bool,
}

impl HealthTracker {
    /// Creates a tracker at full health.
    #[must_use]
    pub fn new(max: f32) -> Self {
        let mut tracker = Self {
            current: 0.0,
            max: 0.0,
            dead: false,
        };
        tracker.initialize(max);
        tracker
    }

    /// Resets the tracker to full health using the provided maximum.
    ///
    /// Negative or non-finite maxima are clamped to zero. A tracker without
    /// health starts out dead.
    pub fn initialize(&mut self, max: f32) {
        let max = if max.is_finite() { max.max(0.0) } else { 0.0 };
        self.max = max;
        self.current = max;
        self.dead = max <= 0.0;
    }

    /// Applies damage, clamping health at zero.
    #[must_use = "the death notification is only reported once"]
    pub fn take_damage(&mut self, amount: f32) -> HealthChange {
        if self.dead {
            return HealthChange::Ignored;
        }

        debug_assert!(
            amount.is_finite() && amount >= 0.0,
            "damage must be a non-negative finite amount, got {amount}"
        );
        let amount = sanitize(amount);

        self.current = (self.current - amount).max(0.0);
        if self.current <= 0.0 {
            self.current = 0.0;
            self.dead = true;
            return HealthChange::Died;
        }

        HealthChange::Damaged
    }

    /// Restores health without exceeding the maximum. Ignored once dead.
    pub fn heal(&mut self, amount: f32) {
        if self.dead {
            return;
        }

        debug_assert!(
            amount.is_finite() && amount >= 0.0,
            "heal must be a non-negative finite amount, got {amount}"
        );
        self.current = (self.current + sanitize(amount)).min(self.max);
    }

    /// Current health.
    #[must_use]
    pub const fn current(&self) -> f32 {
        self.current
    }

    /// Maximum health.
    #[must_use]
    pub const fn max(&self) -> f32 {
        self.max
    }

    /// Reports whether health reached zero.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.dead
    }

    /// Current health as a fraction of the maximum, in `[0, 1]`.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            return 0.0;
        }
        self.current / self.max
    }
}

fn sanitize(amount: f32) -> f32 {
    if amount.is_finite() {
        amount.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_fills_health() {
        let tracker = HealthTracker::new(30.0);
        assert_eq!(tracker.current(), 30.0);
        assert_eq!(tracker.max(), 30.0);
        assert!(!tracker.is_dead());
        assert_eq!(tracker.fraction(), 1.0);
    }

    #[test]
    fn damage_clamps_at_zero_and_reports_death_once() {
        let mut tracker = HealthTracker::new(10.0);
        assert_eq!(tracker.take_damage(4.0), HealthChange::Damaged);
        assert_eq!(tracker.current(), 6.0);

        assert_eq!(tracker.take_damage(50.0), HealthChange::Died);
        assert_eq!(tracker.current(), 0.0);
        assert!(tracker.is_dead());

        assert_eq!(tracker.take_damage(1.0), HealthChange::Ignored);
        assert_eq!(tracker.take_damage(0.0), HealthChange::Ignored);
    }

    #[test]
    fn exact_lethal_damage_kills() {
        let mut tracker = HealthTracker::new(5.0);
        assert_eq!(tracker.take_damage(5.0), HealthChange::Died);
    }

    #[test]
    fn zero_damage_on_living_tracker_is_harmless() {
        let mut tracker = HealthTracker::new(5.0);
        assert_eq!(tracker.take_damage(0.0), HealthChange::Damaged);
        assert_eq!(tracker.current(), 5.0);
    }

    #[test]
    fn heal_caps_at_maximum() {
        let mut tracker = HealthTracker::new(20.0);
        let _ = tracker.take_damage(15.0);
        tracker.heal(4.0);
        assert_eq!(tracker.current(), 9.0);
        tracker.heal(100.0);
        assert_eq!(tracker.current(), 20.0);
    }

    #[test]
    fn heal_after_death_is_ignored() {
        let mut tracker = HealthTracker::new(1.0);
        assert_eq!(tracker.take_damage(1.0), HealthChange::Died);
        tracker.heal(10.0);
        assert_eq!(tracker.current(), 0.0);
        assert!(tracker.is_dead());
    }

    #[test]
    fn reinitialize_revives() {
        let mut tracker = HealthTracker::new(3.0);
        let _ = tracker.take_damage(3.0);
        tracker.initialize(8.0);
        assert!(!tracker.is_dead());
        assert_eq!(tracker.current(), 8.0);
    }

    #[test]
    fn invalid_maximum_clamps_to_zero() {
        let tracker = HealthTracker::new(-4.0);
        assert_eq!(tracker.max(), 0.0);
        assert_eq!(tracker.fraction(), 0.0);
    }

    #[test]
    fn tracker_without_health_starts_dead() {
        let mut tracker = HealthTracker::new(0.0);
        assert!(tracker.is_dead());
        assert_eq!(tracker.take_damage(1.0), HealthChange::Ignored);

        tracker.initialize(f32::NAN);
        assert!(tracker.is_dead());
        tracker.initialize(2.0);
        assert!(!tracker.is_dead());
    }
}
