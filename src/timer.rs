use crate::error::ConfigError;

/// What a single tick of a [`CountdownTimer`] produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerSignal {
    /// The timer is not running; nothing happened.
    Idle,
    /// Time advanced and is still above zero.
    Tick { remaining_ms: i64 },
    /// This tick reached zero. Emitted exactly once per `start`.
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Idle,
    Running,
    Completed,
    Stopped,
}

/// Restartable fixed-resolution countdown.
///
/// The timer does not own a clock. Whoever owns it calls [`tick`] once per
/// `interval_ms` and routes the returned [`TimerSignal`] into its own state
/// machine, so a stopped or replaced timer can never complete behind the
/// owner's back.
///
/// [`tick`]: CountdownTimer::tick
#[derive(Debug, Clone)]
pub struct CountdownTimer {
    total_ms: i64,
    interval_ms: i64,
    remaining_ms: i64,
    ticks: u64,
    state: TimerState,
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl CountdownTimer {
    pub fn new() -> Self {
        Self {
            total_ms: 0,
            interval_ms: 0,
            remaining_ms: 0,
            ticks: 0,
            state: TimerState::Idle,
        }
    }

    /// Begin (or restart) a countdown. Any schedule already in flight is
    /// discarded first, so a restarted timer completes once, for the new run.
    pub fn start(&mut self, total_ms: i64, interval_ms: i64) -> Result<(), ConfigError> {
        if interval_ms <= 0 {
            return Err(ConfigError::NonPositiveTickInterval(interval_ms));
        }
        if total_ms < 0 {
            return Err(ConfigError::NegativeDuration(total_ms));
        }

        self.stop();
        self.total_ms = total_ms;
        self.interval_ms = interval_ms;
        self.remaining_ms = total_ms;
        self.ticks = 0;
        self.state = TimerState::Running;
        Ok(())
    }

    /// Cancel future ticks. A stopped timer never reports completion.
    pub fn stop(&mut self) {
        if self.state == TimerState::Running {
            self.state = TimerState::Stopped;
        }
    }

    pub fn tick(&mut self) -> TimerSignal {
        if self.state != TimerState::Running {
            return TimerSignal::Idle;
        }

        self.ticks += 1;
        self.remaining_ms = (self.remaining_ms - self.interval_ms).max(0);

        if self.remaining_ms == 0 {
            self.state = TimerState::Completed;
            TimerSignal::Completed
        } else {
            TimerSignal::Tick {
                remaining_ms: self.remaining_ms,
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn has_completed(&self) -> bool {
        self.state == TimerState::Completed
    }

    pub fn total_ms(&self) -> i64 {
        self.total_ms
    }

    pub fn interval_ms(&self) -> i64 {
        self.interval_ms
    }

    pub fn remaining_ms(&self) -> i64 {
        self.remaining_ms
    }

    /// Time that has passed on this run, counted in whole ticks.
    pub fn elapsed_ms(&self) -> i64 {
        (self.ticks as i64).saturating_mul(self.interval_ms)
    }

    /// Remaining fraction in `[0, 1]`. A zero-length countdown reports 0.
    pub fn progress(&self) -> f64 {
        if self.total_ms == 0 {
            return 0.0;
        }
        (self.remaining_ms as f64 / self.total_ms as f64).clamp(0.0, 1.0)
    }

    pub fn remaining_secs(&self) -> f64 {
        self.remaining_ms as f64 / 1000.0
    }

    /// Seconds left with one decimal place, e.g. `"2.9"`.
    pub fn display(&self) -> String {
        format!("{:.1}", self.remaining_secs())
    }
}
