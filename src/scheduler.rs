//! Per-frame driver shared by the choreography and the particle field.
//!
//! The browser build pumps [`FrameScheduler::run_frame`] from
//! `requestAnimationFrame`; the headless simulator pumps it from a loop.

/// Timestamps in seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameTime {
    pub now: f64,
    /// Seconds since the previous frame, clamped
    pub dt: f64,
}

/// Turns raw frame timestamps into clamped deltas.
///
/// A background tab can pause frames for seconds; the clamp keeps the
/// first frame after that from teleporting the simulation.
#[derive(Clone, Debug)]
pub struct FrameClock {
    last: Option<f64>,
    max_dt: f64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self {
            last: None,
            max_dt: 0.1,
        }
    }
}

impl FrameClock {
    pub fn tick(&mut self, timestamp_ms: f64) -> FrameTime {
        let now = timestamp_ms / 1000.0;
        let dt = self.last.map_or(0.0, |last| (now - last).clamp(0.0, self.max_dt));
        self.last = Some(now);
        FrameTime { now, dt }
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

type TickFn<S> = Box<dyn FnMut(&mut S, FrameTime)>;

/// Ordered, named tick consumers sharing one state value.
pub struct FrameScheduler<S> {
    consumers: Vec<(&'static str, TickFn<S>)>,
    clock: FrameClock,
    running: bool,
}

impl<S> Default for FrameScheduler<S> {
    fn default() -> Self {
        Self {
            consumers: Vec::new(),
            clock: FrameClock::default(),
            running: false,
        }
    }
}

impl<S> FrameScheduler<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumers run in registration order; re-registering a name replaces it.
    pub fn register(&mut self, name: &'static str, tick: impl FnMut(&mut S, FrameTime) + 'static) {
        self.unregister(name);
        self.consumers.push((name, Box::new(tick)));
    }

    pub fn unregister(&mut self, name: &str) {
        self.consumers.retain(|(n, _)| *n != name);
    }

    pub fn start(&mut self) {
        if !self.running {
            self.clock.reset();
            self.running = true;
        }
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Run one frame. Returns `None` while stopped.
    pub fn run_frame(&mut self, state: &mut S, timestamp_ms: f64) -> Option<FrameTime> {
        if !self.running {
            return None;
        }
        let time = self.clock.tick(timestamp_ms);
        for (_, tick) in &mut self.consumers {
            tick(state, time);
        }
        Some(time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_clamps_long_gaps() {
        let mut clock = FrameClock::default();
        assert_eq!(clock.tick(1000.0), FrameTime { now: 1.0, dt: 0.0 });
        let t = clock.tick(1016.0);
        assert!((t.dt - 0.016).abs() < 1e-9);
        assert_eq!(clock.tick(6000.0).dt, 0.1);
    }

    #[test]
    fn consumers_run_in_order_only_while_running() {
        let mut sched: FrameScheduler<Vec<&'static str>> = FrameScheduler::new();
        sched.register("choreography", |log, _| log.push("choreography"));
        sched.register("field", |log, _| log.push("field"));
        let mut log = Vec::new();
        assert!(sched.run_frame(&mut log, 0.0).is_none());
        sched.start();
        sched.run_frame(&mut log, 16.0);
        assert_eq!(log, vec!["choreography", "field"]);
        sched.stop();
        sched.run_frame(&mut log, 32.0);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn reregistering_replaces_consumer() {
        let mut sched: FrameScheduler<u32> = FrameScheduler::new();
        sched.register("field", |n, _| *n += 1);
        sched.register("field", |n, _| *n += 10);
        sched.start();
        let mut n = 0;
        sched.run_frame(&mut n, 0.0);
        assert_eq!(n, 10);
    }
}
