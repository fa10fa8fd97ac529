//! Periodic callbacks driven from the UI loop. Widgets use these for
//! blinking carets, timed button feedback and status bar timeouts;
//! anything the callback mutates travels in as an 'Rc' clone.

use rfront_util::Pool;

use std::time::Duration;

/// What a callback wants to happen to its entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    Continue,
    Stop,
}

pub type TimerHandle = rfront_util::Handle;

/// Sleep hint handed back when no timer is registered.
const IDLE_WAIT: Duration = Duration::from_millis(50);

struct Entry {
    period: Duration,
    /// Wall-clock time accumulated towards the next firing.
    waited: Duration,
    callback: Box<dyn FnMut() -> Tick>,
}

#[derive(Default)]
pub struct Timers {
    entries: Pool<Entry>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback fired every 'period'. A zero period would
    /// mean firing forever within a single ['Timers::run'] and is a
    /// caller bug.
    pub fn add(&mut self, period: Duration, callback: impl FnMut() -> Tick + 'static) -> TimerHandle {
        assert!(!period.is_zero(), "timer registered with zero period");
        self.entries.insert(Entry {
            period,
            waited: Duration::ZERO,
            callback: Box::new(callback),
        })
    }

    /// Drop an entry. The handle must be live: removing twice, or
    /// removing an entry that already stopped itself, panics.
    pub fn remove(&mut self, handle: TimerHandle) {
        self.entries.remove(handle);
    }

    pub fn contains(&self, handle: TimerHandle) -> bool {
        self.entries.contains(handle)
    }

    /// Advance every entry by 'dt', firing callbacks once per elapsed
    /// period. Returns the time until the next entry is due, floored at
    /// 'min_wait', which the loop uses as its sleep duration.
    pub fn run(&mut self, dt: Duration, min_wait: Duration) -> Duration {
        let mut wait = IDLE_WAIT.max(min_wait);
        let mut stopped = Vec::new();

        for (handle, entry) in self.entries.iter_mut() {
            entry.waited += dt;
            let mut live = true;
            while entry.waited >= entry.period {
                entry.waited -= entry.period;
                if (entry.callback)() == Tick::Stop {
                    live = false;
                    stopped.push(handle);
                    break;
                }
            }
            if live {
                wait = wait.min(entry.period - entry.waited);
            }
        }

        for handle in stopped {
            self.entries.remove(handle);
        }

        wait.max(min_wait)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn fires_once_per_elapsed_period() {
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);

        let mut timers = Timers::new();
        timers.add(Duration::from_micros(100), move || {
            seen.set(seen.get() + 1);
            Tick::Continue
        });

        // 350 us of simulated time, whatever the step size.
        for _ in 0..7 {
            timers.run(Duration::from_micros(50), Duration::ZERO);
        }
        assert_eq!(count.get(), 3);

        let mut timers = Timers::new();
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        timers.add(Duration::from_micros(100), move || {
            seen.set(seen.get() + 1);
            Tick::Continue
        });
        timers.run(Duration::from_micros(350), Duration::ZERO);
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn stop_deactivates_the_entry() {
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);

        let mut timers = Timers::new();
        let handle = timers.add(Duration::from_micros(10), move || {
            seen.set(seen.get() + 1);
            Tick::Stop
        });

        timers.run(Duration::from_micros(100), Duration::ZERO);
        assert_eq!(count.get(), 1);
        assert!(!timers.contains(handle));
    }

    #[test]
    fn wait_is_time_to_next_due() {
        let mut timers = Timers::new();
        timers.add(Duration::from_micros(100), || Tick::Continue);
        timers.add(Duration::from_micros(60), || Tick::Continue);

        let wait = timers.run(Duration::from_micros(50), Duration::ZERO);
        assert_eq!(wait, Duration::from_micros(10));
    }

    #[test]
    fn wait_is_floored_at_the_requested_minimum() {
        let mut timers = Timers::new();
        timers.add(Duration::from_micros(100), || Tick::Continue);

        let wait = timers.run(Duration::from_micros(99), Duration::from_micros(25));
        assert_eq!(wait, Duration::from_micros(25));
    }

    #[test]
    #[should_panic]
    fn zero_period_is_a_bug() {
        let mut timers = Timers::new();
        timers.add(Duration::ZERO, || Tick::Continue);
    }

    #[test]
    #[should_panic]
    fn double_remove_is_a_bug() {
        let mut timers = Timers::new();
        let handle = timers.add(Duration::from_micros(10), || Tick::Continue);
        timers.remove(handle);
        timers.remove(handle);
    }
}
