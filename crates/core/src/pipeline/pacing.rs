use std::time::{Duration, Instant};

use crate::capture::domain::capture_view::CaptureView;
use crate::shared::constants::{DEFAULT_NAVIGATION_DELAY, DEFAULT_SPINNER_DURATION};

/// Source of time for the post-detection delays.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep_until(&self, deadline: Instant);
}

/// Wall-clock time; sleeps the calling thread.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep_until(&self, deadline: Instant) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
    }
}

/// Delays between finding a face and leaving the capture screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pacing {
    /// How long the spinner stays visible.
    pub spinner: Duration,
    /// When navigation happens.
    pub navigation_delay: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            spinner: DEFAULT_SPINNER_DURATION,
            navigation_delay: DEFAULT_NAVIGATION_DELAY,
        }
    }
}

impl Pacing {
    /// Runs both timers from one start instant and returns when it is time
    /// to navigate.
    ///
    /// The spinner is hidden first when its timer fires no later than
    /// navigation. A spinner outliving navigation is hidden as the screen
    /// is left.
    pub fn run(&self, clock: &dyn Clock, view: &mut dyn CaptureView) {
        let start = clock.now();
        if self.spinner <= self.navigation_delay {
            clock.sleep_until(start + self.spinner);
            view.hide_spinner();
            clock.sleep_until(start + self.navigation_delay);
        } else {
            clock.sleep_until(start + self.navigation_delay);
            view.hide_spinner();
        }
    }
}
