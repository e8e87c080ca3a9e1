//! Named, gated stages advanced cooperatively once per frame.
//!
//! Each stage waits on a [`Gate`] evaluated against shared frame state, then
//! hands its cue back to the caller. Scroll gates carry a timeout after which
//! they resolve anyway, so one stalled transition never blocks the rest.

use std::collections::VecDeque;

use crate::timeline::Timeline;

#[derive(Clone, Debug, PartialEq)]
pub enum Gate {
    Immediately,
    /// Seconds after the previous stage fired (or the sequence started)
    Delay(f64),
    TweenFinished(&'static str),
    /// Scroll offset within `distance` of the current auto-scroll target
    ScrollWithin { distance: f64, timeout: f64 },
    /// Scroll offset within `tolerance` of the target with the scripted motion finished
    ScrollSettled { tolerance: f64, timeout: f64 },
}

/// Frame state the gates read.
#[derive(Clone, Copy, Debug)]
pub struct GateContext<'a> {
    pub now: f64,
    pub scroll_y: f64,
    pub scroll_target: Option<f64>,
    pub scroll_idle: bool,
    pub timeline: &'a Timeline,
}

impl Gate {
    fn holds(&self, ctx: &GateContext<'_>, elapsed: f64) -> bool {
        match *self {
            Gate::Immediately => true,
            Gate::Delay(secs) => elapsed >= secs,
            Gate::TweenFinished(name) => ctx.timeline.finished(name),
            Gate::ScrollWithin { distance, timeout } => {
                let near = ctx.scroll_target.map_or(true, |t| (ctx.scroll_y - t).abs() <= distance);
                near || timed_out(elapsed, timeout)
            }
            Gate::ScrollSettled { tolerance, timeout } => {
                let settled = ctx.scroll_idle
                    && ctx.scroll_target.map_or(true, |t| (ctx.scroll_y - t).abs() <= tolerance);
                settled || timed_out(elapsed, timeout)
            }
        }
    }
}

fn timed_out(elapsed: f64, timeout: f64) -> bool {
    if elapsed >= timeout {
        log::warn!("scroll wait timed out after {elapsed:.2}s; continuing");
        return true;
    }
    false
}

#[derive(Clone, Debug)]
pub struct Stage<C> {
    pub name: &'static str,
    pub gate: Gate,
    pub cue: C,
}

#[derive(Clone, Debug)]
pub struct Sequence<C> {
    name: &'static str,
    stages: VecDeque<Stage<C>>,
    entered_at: Option<f64>,
}

impl<C> Sequence<C> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            stages: VecDeque::new(),
            entered_at: None,
        }
    }

    pub fn then(mut self, name: &'static str, gate: Gate, cue: C) -> Self {
        self.stages.push_back(Stage { name, gate, cue });
        self
    }

    pub fn start(&mut self, now: f64) {
        self.entered_at = Some(now);
    }

    pub fn is_running(&self) -> bool {
        self.entered_at.is_some() && !self.stages.is_empty()
    }

    pub fn is_done(&self) -> bool {
        self.stages.is_empty()
    }

    /// Name of the stage currently waiting on its gate.
    pub fn pending(&self) -> Option<&'static str> {
        self.stages.front().map(|s| s.name)
    }

    /// Drop every remaining stage.
    pub fn cancel(&mut self) {
        if !self.stages.is_empty() {
            log::debug!("sequence '{}' cancelled at '{}'", self.name, self.stages[0].name);
        }
        self.stages.clear();
        self.entered_at = None;
    }

    /// Fire every consecutive stage whose gate holds, in order.
    pub fn poll(&mut self, ctx: &GateContext<'_>) -> Vec<(&'static str, C)> {
        let mut fired = Vec::new();
        let Some(mut entered) = self.entered_at else {
            return fired;
        };
        while let Some(stage) = self.stages.front() {
            if !stage.gate.holds(ctx, ctx.now - entered) {
                break;
            }
            if let Some(stage) = self.stages.pop_front() {
                log::debug!("sequence '{}': stage '{}'", self.name, stage.name);
                fired.push((stage.name, stage.cue));
                entered = ctx.now;
            }
        }
        self.entered_at = Some(entered);
        fired
    }
}
