use std::time::{Duration, Instant};

// seconds per delivered tick, fixed for the life of the engine
const TICK_INTERVAL_SECS: f64 = 0.01;

/// What observers receive after every mutation: the full state, nothing
/// incremental.
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct StateSnapshot {
    pub elapsed_seconds: f64,
    pub is_running: bool,
}

/// Live registration with the periodic tick source. Exists only while
/// running; dropping it is the cancellation.
#[derive(Debug, Clone, Copy)]
struct TickSubscription {
    next_due: Instant,
}

/// The stopwatch state machine. Elapsed time is counted in fixed ticks, not
/// measured against the clock, so delayed delivery drifts rather than
/// catching up.
pub struct StopwatchEngine {
    elapsed_seconds: f64,
    is_running: bool,
    tick_interval_seconds: f64,
    subscription: Option<TickSubscription>,
    observers: Vec<Box<dyn FnMut(StateSnapshot)>>,
}

impl Default for StopwatchEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StopwatchEngine {
    pub fn new() -> Self {
        Self {
            elapsed_seconds: 0.0,
            is_running: false,
            tick_interval_seconds: TICK_INTERVAL_SECS,
            subscription: None,
            observers: Vec::new(),
        }
    }

    /// Register a callback for state-changed notifications. Every mutating
    /// operation notifies synchronously before it returns, one notification
    /// per tick.
    pub fn observe(&mut self, observer: impl FnMut(StateSnapshot) + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            elapsed_seconds: self.elapsed_seconds,
            is_running: self.is_running,
        }
    }

    fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(self.tick_interval_seconds)
    }

    /// Start counting. Replacing the subscription drops any live one first,
    /// so at most one exists. Callable in any state.
    pub fn start(&mut self, now: Instant) {
        self.subscription = Some(TickSubscription {
            next_due: now + self.tick_interval(),
        });
        self.is_running = true;
        self.notify();
    }

    /// Stop counting, keep the elapsed time. While idle this changes
    /// nothing but still notifies.
    pub fn pause(&mut self) {
        self.subscription = None;
        self.is_running = false;
        self.notify();
    }

    /// Back to idle and zero, from any state. The long-press path relies on
    /// this working mid-run.
    pub fn reset(&mut self) {
        self.subscription = None;
        self.is_running = false;
        self.elapsed_seconds = 0.0;
        self.notify();
    }

    /// When the subscription next wants to fire. `None` while idle.
    pub fn next_tick_due(&self) -> Option<Instant> {
        self.subscription.map(|sub| sub.next_due)
    }

    /// Deliver the due tick, if any. Re-arms relative to `now`, so late
    /// delivery shows up as drift.
    pub fn poll_tick(&mut self, now: Instant) -> bool {
        let interval = self.tick_interval();
        let due = match self.subscription.as_mut() {
            Some(sub) if now >= sub.next_due => {
                sub.next_due = now + interval;
                true
            }
            _ => false,
        };
        if due {
            self.on_tick();
        }
        due
    }

    fn on_tick(&mut self) {
        self.elapsed_seconds += self.tick_interval_seconds;
        self.notify();
    }

    fn notify(&mut self) {
        let snapshot = self.snapshot();
        for observer in &mut self.observers {
            observer(snapshot);
        }
    }
}
