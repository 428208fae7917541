use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch. Zero means "unset".
pub type Millis = u64;

pub const MS_PER_MINUTE: Millis = 60 * 1000;

/// Current wall-clock time in milliseconds.
pub fn now_ms() -> Millis {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as Millis)
        .unwrap_or(0)
}

/// Time-control state of one game.
///
/// Remaining budgets live on the players; the clock only knows when the match
/// and the current turn started and charges elapsed time against a budget.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clock {
    pub is_timed: bool,
    pub total_time_ms: Millis,
    pub match_started_at: Millis,
    pub last_turn_started_at: Millis,
}

impl Clock {
    pub fn untimed() -> Self {
        Self::default()
    }

    pub fn timed(minutes: u32) -> Self {
        Self {
            is_timed: true,
            total_time_ms: Millis::from(minutes) * MS_PER_MINUTE,
            ..Self::default()
        }
    }

    /// The clock starts ticking once both sides have made their first move.
    pub fn is_running(&self) -> bool {
        self.is_timed && self.last_turn_started_at != 0
    }

    pub fn start(&mut self, now: Millis) {
        self.match_started_at = now;
        self.last_turn_started_at = now;
    }

    /// Back to the not-yet-started state; budgets are left untouched.
    pub fn stop(&mut self) {
        self.match_started_at = 0;
        self.last_turn_started_at = 0;
    }

    pub fn elapsed(&self, now: Millis) -> Millis {
        now.saturating_sub(self.last_turn_started_at)
    }

    /// Charge the time spent on the current turn against `remaining` and
    /// start a new turn. Returns true when the budget is exhausted.
    pub fn charge(&mut self, remaining: &mut Millis, now: Millis) -> bool {
        *remaining = remaining.saturating_sub(self.elapsed(now));
        self.last_turn_started_at = now;
        *remaining == 0
    }

    /// What `remaining` would be if the current turn were charged at `now`.
    pub fn projected_remaining(&self, remaining: Millis, now: Millis) -> Millis {
        if self.is_running() {
            remaining.saturating_sub(self.elapsed(now))
        } else {
            remaining
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timed_clock_converts_minutes() {
        let clock = Clock::timed(3);
        assert!(clock.is_timed);
        assert_eq!(clock.total_time_ms, 180_000);
        assert!(!clock.is_running());
    }

    #[test]
    fn charge_floors_at_zero() {
        let mut clock = Clock::timed(1);
        clock.start(1_000);
        let mut remaining = 500;
        assert!(clock.charge(&mut remaining, 1_700));
        assert_eq!(remaining, 0);
        assert_eq!(clock.last_turn_started_at, 1_700);
    }

    #[test]
    fn charge_resets_the_turn_start() {
        let mut clock = Clock::timed(1);
        clock.start(10_000);
        let mut remaining = 60_000;
        assert!(!clock.charge(&mut remaining, 12_500));
        assert_eq!(remaining, 57_500);
        assert!(!clock.charge(&mut remaining, 13_000));
        assert_eq!(remaining, 57_000);
        assert_eq!(clock.match_started_at, 10_000);
    }

    #[test]
    fn stopped_clock_is_not_running() {
        let mut clock = Clock::timed(1);
        clock.start(1_000);
        clock.stop();
        assert!(clock.is_timed);
        assert!(!clock.is_running());
        assert_eq!(clock.projected_remaining(60_000, 90_000), 60_000);
    }

    #[test]
    fn projection_does_not_mutate() {
        let mut clock = Clock::timed(1);
        assert_eq!(clock.projected_remaining(1_000, 99_999), 1_000);
        clock.start(1_000);
        assert_eq!(clock.projected_remaining(1_000, 1_400), 600);
        assert_eq!(clock.projected_remaining(1_000, 5_000), 0);
        assert_eq!(clock.last_turn_started_at, 1_000);
    }
}
