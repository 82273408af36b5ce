use std::cell::Cell;
use std::rc::Rc;

use redline_game::Clock;

const MS_PER_MINUTE: i64 = 60_000;

/// Simulated wall clock shared between the runner and the engine.
#[derive(Debug, Clone)]
pub struct SimClock {
    now: Rc<Cell<i64>>,
}

impl SimClock {
    #[must_use]
    pub fn starting_at(epoch_ms: i64) -> Self {
        Self {
            now: Rc::new(Cell::new(epoch_ms)),
        }
    }

    pub fn advance_minutes(&self, minutes: i64) {
        self.advance_ms(minutes.saturating_mul(MS_PER_MINUTE));
    }

    pub fn advance_ms(&self, ms: i64) {
        self.now.set(self.now.get().saturating_add(ms.max(0)));
    }
}

impl Clock for SimClock {
    fn now_ms(&self) -> i64 {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_time() {
        let clock = SimClock::starting_at(1_000);
        let engine_side = clock.clone();
        clock.advance_minutes(2);
        assert_eq!(engine_side.now_ms(), 121_000);
    }

    #[test]
    fn time_never_runs_backwards() {
        let clock = SimClock::starting_at(5_000);
        clock.advance_ms(-4_000);
        assert_eq!(clock.now_ms(), 5_000);
    }
}
