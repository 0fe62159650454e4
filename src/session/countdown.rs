use crate::core::time::format_clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tick {
    Running(u64),
    /// Fired exactly once, on the tick that reaches zero.
    Expired,
    Stopped,
}

/// Remaining test time. Only ever decreases; zero is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Countdown {
    remaining_seconds: u64,
    stopped: bool,
}

impl Countdown {
    pub(crate) fn new(duration_seconds: u64) -> Self {
        Self { remaining_seconds: duration_seconds, stopped: duration_seconds == 0 }
    }

    pub(crate) fn tick(&mut self) -> Tick {
        if self.stopped {
            return Tick::Stopped;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.stopped = true;
            return Tick::Expired;
        }

        Tick::Running(self.remaining_seconds)
    }

    pub(crate) fn stop(&mut self) {
        self.stopped = true;
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub(crate) fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub(crate) fn display(&self) -> String {
        format_clock(self.remaining_seconds)
    }
}
