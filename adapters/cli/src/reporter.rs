use std::time::Duration;

use rampart_core::ProgressReporter;

/// Forwards wave progress to the tracing subscriber.
///
/// Preparation countdowns arrive every tick; only whole-second changes are
/// logged.
#[derive(Debug, Default)]
pub(crate) struct TracingReporter {
    last_whole_second: Option<u64>,
}

impl ProgressReporter for TracingReporter {
    fn on_preparation_tick(&mut self, remaining: Duration) {
        let whole = remaining.as_secs_f64().ceil() as u64;
        if self.last_whole_second == Some(whole) {
            return;
        }
        self.last_whole_second = Some(whole);
        tracing::info!(seconds = whole, "preparing");
    }

    fn on_wave_count_changed(&mut self, remaining: usize) {
        self.last_whole_second = None;
        tracing::info!(remaining, "waves remaining");
    }

    fn on_live_count_changed(&mut self, live: u32) {
        tracing::debug!(live, "hostile units alive");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_only_tracks_whole_second_changes() {
        let mut reporter = TracingReporter::default();
        reporter.on_preparation_tick(Duration::from_millis(2_900));
        assert_eq!(reporter.last_whole_second, Some(3));
        reporter.on_preparation_tick(Duration::from_millis(2_100));
        assert_eq!(reporter.last_whole_second, Some(3));
        reporter.on_preparation_tick(Duration::from_millis(1_950));
        assert_eq!(reporter.last_whole_second, Some(2));

        reporter.on_wave_count_changed(1);
        assert_eq!(reporter.last_whole_second, None);
    }
}
