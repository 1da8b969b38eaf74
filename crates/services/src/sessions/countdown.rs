/// Countdown state. `Expired` and `Stopped` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownState {
    Running(u64),
    Expired,
    Stopped,
}

/// Result of advancing the countdown by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Remaining(u64),
    /// Reached zero on this tick. Returned once per countdown.
    Expired,
    /// Already expired or stopped; nothing to do.
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    state: CountdownState,
}

impl Countdown {
    /// A zero duration expires on the first tick.
    #[must_use]
    pub fn new(secs: u64) -> Self {
        Self {
            state: CountdownState::Running(secs),
        }
    }

    #[must_use]
    pub fn state(&self) -> CountdownState {
        self.state
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u64 {
        match self.state {
            CountdownState::Running(secs) => secs,
            CountdownState::Expired | CountdownState::Stopped => 0,
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self.state, CountdownState::Running(_))
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.state == CountdownState::Expired
    }

    pub fn tick(&mut self) -> Tick {
        match self.state {
            CountdownState::Running(secs) if secs > 1 => {
                self.state = CountdownState::Running(secs - 1);
                Tick::Remaining(secs - 1)
            }
            CountdownState::Running(_) => {
                self.state = CountdownState::Expired;
                Tick::Expired
            }
            CountdownState::Expired | CountdownState::Stopped => Tick::Inactive,
        }
    }

    /// Halts a running countdown. Returns true if it was running.
    pub fn stop(&mut self) -> bool {
        if self.is_running() {
            self.state = CountdownState::Stopped;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_down_and_expires_once() {
        let mut countdown = Countdown::new(3);
        assert_eq!(countdown.tick(), Tick::Remaining(2));
        assert_eq!(countdown.tick(), Tick::Remaining(1));
        assert_eq!(countdown.tick(), Tick::Expired);
        assert_eq!(countdown.tick(), Tick::Inactive);
        assert!(countdown.is_expired());
        assert_eq!(countdown.remaining_secs(), 0);
    }

    #[test]
    fn stopped_countdown_never_expires() {
        let mut countdown = Countdown::new(2);
        assert!(countdown.stop());
        assert!(!countdown.stop());
        assert_eq!(countdown.tick(), Tick::Inactive);
        assert_eq!(countdown.state(), CountdownState::Stopped);
    }

    #[test]
    fn expired_countdown_cannot_be_stopped() {
        let mut countdown = Countdown::new(0);
        assert_eq!(countdown.tick(), Tick::Expired);
        assert!(!countdown.stop());
        assert!(countdown.is_expired());
    }
}
