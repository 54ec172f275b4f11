use std::time::Duration;

const TIMER_DEC_PER_SECOND: u64 = 60;
pub const TIMER_PERIOD: Duration = Duration::from_nanos(1_000_000_000 / TIMER_DEC_PER_SECOND);

/// A 60 Hz countdown fed with elapsed wall time.
#[derive(Debug, Default)]
pub struct Timer {
    pub count: u8,
    accumulated: Duration,
}

impl Timer {
    pub fn new(init_count: u8) -> Self {
        Self {
            count: init_count,
            accumulated: Duration::ZERO,
        }
    }

    pub fn set(&mut self, value: u8) {
        self.count = value;
    }

    /// Consumes `elapsed` in whole periods. Returns true if the count just reached zero.
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        if self.count == 0 {
            return false;
        }
        self.accumulated += elapsed;
        while self.accumulated >= TIMER_PERIOD {
            self.accumulated -= TIMER_PERIOD;
            self.count -= 1;
            if self.count == 0 {
                self.accumulated = Duration::ZERO;
                return true;
            }
        }
        false
    }
}

/// Delay and sound timers, each with its own accumulator.
#[derive(Debug, Default)]
pub struct Timers {
    pub delay: Timer,
    pub sound: Timer,
}

impl Timers {
    pub fn new() -> Self {
        Self {
            delay: Timer::new(0),
            sound: Timer::new(0),
        }
    }

    /// Advances both timers. Returns true when the sound timer ran out, i.e. time to beep.
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        self.delay.advance(elapsed);
        self.sound.advance(elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_periods_in_one_go() {
        let mut timer = Timer::new(5);
        assert!(timer.advance(TIMER_PERIOD * 5));
        assert_eq!(timer.count, 0);
        assert!(!timer.advance(TIMER_PERIOD * 5));
        assert_eq!(timer.count, 0);
    }

    #[test]
    fn five_periods_in_small_steps() {
        let mut timer = Timer::new(5);
        let step = TIMER_PERIOD / 2;
        let mut seen = vec![];
        for _ in 0..10 {
            timer.advance(step);
            seen.push(timer.count);
        }
        assert_eq!(timer.count, 0);
        // never skips a value, never wraps
        assert!(seen.windows(2).all(|w| w[0] >= w[1] && w[0] - w[1] <= 1));
    }

    #[test]
    fn partial_period_does_not_tick() {
        let mut timer = Timer::new(2);
        assert!(!timer.advance(TIMER_PERIOD - Duration::from_nanos(1)));
        assert_eq!(timer.count, 2);
        timer.advance(Duration::from_nanos(1));
        assert_eq!(timer.count, 1);
    }

    #[test]
    fn idle_timer_does_not_bank_time() {
        let mut timer = Timer::new(0);
        timer.advance(Duration::from_secs(3));
        timer.set(3);
        timer.advance(TIMER_PERIOD);
        assert_eq!(timer.count, 2);
    }

    #[test]
    fn leftover_time_is_dropped_at_zero() {
        let mut timer = Timer::new(1);
        assert!(timer.advance(TIMER_PERIOD * 10));
        timer.set(2);
        timer.advance(TIMER_PERIOD / 2);
        assert_eq!(timer.count, 2);
    }

    #[test]
    fn timers_are_independent() {
        let mut timers = Timers::new();
        timers.delay.set(3);
        timers.sound.set(1);
        assert!(timers.advance(TIMER_PERIOD));
        assert_eq!(timers.delay.count, 2);
        assert_eq!(timers.sound.count, 0);
        assert!(!timers.advance(TIMER_PERIOD));
        assert_eq!(timers.delay.count, 1);
    }
}
