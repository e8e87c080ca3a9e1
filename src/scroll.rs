//! Scroll choreography: scroll lock, scripted auto-scroll and wheel smoothing.
//!
//! Exactly one writer owns the page's scroll offset at any time:
//!
//! * `Idle`: the browser, or the wheel glide when one is running
//! * `Locked`: lock enforcement, which snaps every `scroll` event back to the hold point
//! * `AutoScrolling`: the scripted animation; lock enforcement is suspended

use crate::config::ScrollConfig;
use crate::geometry::ease_in_out_cubic;

/// Rounding a browser may apply to a scroll offset we just wrote.
const GLIDE_SLACK: f64 = 1.0;

/// Native page scrolling.
pub trait Scroller {
    fn scroll_y(&self) -> f64;
    fn max_scroll_y(&self) -> f64;
    fn set_scroll_y(&mut self, y: f64);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollBehavior {
    /// Eased scripted animation over `auto_duration`
    Smooth,
    /// Jump straight to the target
    Instant,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScrollMode {
    Idle,
    Locked { hold_y: f64 },
    AutoScrolling { from: f64, to: f64, started_at: f64 },
}

/// What the caller should do with a wheel event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WheelOutcome {
    /// Let the browser scroll natively
    Native,
    /// Handled here; the caller must `preventDefault`
    Consumed,
}

#[derive(Clone, Debug)]
pub struct ScrollChoreographer {
    cfg: ScrollConfig,
    mode: ScrollMode,
    smooth_wheel: bool,
    wheel_target: f64,
    glide: Option<f64>,
    auto_target: Option<f64>,
    user_interacted: bool,
}

impl ScrollChoreographer {
    /// `smooth_wheel` enables the wheel glide (desktop, fine pointer,
    /// motion allowed).
    pub fn new(cfg: ScrollConfig, smooth_wheel: bool) -> Self {
        Self {
            cfg,
            mode: ScrollMode::Idle,
            smooth_wheel,
            wheel_target: 0.0,
            glide: None,
            auto_target: None,
            user_interacted: false,
        }
    }

    pub fn mode(&self) -> ScrollMode {
        self.mode
    }

    pub fn is_idle(&self) -> bool {
        self.mode == ScrollMode::Idle
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.mode, ScrollMode::Locked { .. })
    }

    pub fn is_auto_scrolling(&self) -> bool {
        matches!(self.mode, ScrollMode::AutoScrolling { .. })
    }

    pub fn is_gliding(&self) -> bool {
        self.glide.is_some()
    }

    pub fn wheel_target(&self) -> f64 {
        self.wheel_target
    }

    /// Destination of the most recent auto-scroll.
    pub fn auto_target(&self) -> Option<f64> {
        self.auto_target
    }

    pub fn user_interacted(&self) -> bool {
        self.user_interacted
    }

    pub fn set_smooth_wheel(&mut self, enabled: bool) {
        self.smooth_wheel = enabled;
        if !enabled {
            self.glide = None;
        }
    }

    /// One-way latch set by the first wheel, touch or key input.
    pub fn note_user_input(&mut self) {
        if !self.user_interacted {
            self.user_interacted = true;
            log::debug!("user input latched; automatic scroll to content disabled");
        }
    }

    /// Hold the page at its current offset and cancel any glide or scripted motion.
    pub fn lock(&mut self, scroller: &dyn Scroller) {
        let hold_y = scroller.scroll_y();
        self.glide = None;
        self.mode = ScrollMode::Locked { hold_y };
        log::debug!("scroll locked at {hold_y:.1}");
    }

    /// Return control to the browser and resync the wheel target.
    pub fn release(&mut self, scroller: &dyn Scroller) {
        self.mode = ScrollMode::Idle;
        self.glide = None;
        self.wheel_target = scroller.scroll_y();
        log::debug!("scroll released at {:.1}", self.wheel_target);
    }

    /// Lock, then move to `target`. `Instant` lands and releases immediately.
    pub fn auto_scroll_to(
        &mut self,
        target: f64,
        now: f64,
        behavior: ScrollBehavior,
        scroller: &mut dyn Scroller,
    ) {
        let to = target.clamp(0.0, scroller.max_scroll_y().max(0.0));
        self.lock(scroller);
        self.auto_target = Some(to);
        match behavior {
            ScrollBehavior::Instant => {
                scroller.set_scroll_y(to);
                self.release(scroller);
            }
            ScrollBehavior::Smooth => {
                let from = scroller.scroll_y();
                self.mode = ScrollMode::AutoScrolling {
                    from,
                    to,
                    started_at: now,
                };
                log::info!("auto-scroll {from:.0} -> {to:.0}");
            }
        }
    }

    /// Lock enforcement and wheel-target sync; call on every `scroll` event.
    /// Returns `true` when the offset was snapped back.
    pub fn on_scroll(&mut self, scroller: &mut dyn Scroller) -> bool {
        match self.mode {
            ScrollMode::Locked { hold_y } => {
                if (scroller.scroll_y() - hold_y).abs() > self.cfg.lock_tolerance {
                    scroller.set_scroll_y(hold_y);
                    return true;
                }
                false
            }
            ScrollMode::AutoScrolling { .. } => false,
            ScrollMode::Idle => {
                let y = scroller.scroll_y();
                match self.glide {
                    // Our own glide step; browsers may round it to whole pixels.
                    Some(g) if (y - g).abs() <= GLIDE_SLACK + self.cfg.wheel_epsilon => {}
                    Some(_) => {
                        log::debug!("native scroll to {y:.1} ends wheel glide");
                        self.glide = None;
                        self.wheel_target = y;
                    }
                    None => self.wheel_target = y,
                }
                false
            }
        }
    }

    pub fn on_wheel(&mut self, delta_y: f64, scroller: &dyn Scroller) -> WheelOutcome {
        self.note_user_input();
        if !self.is_idle() {
            return WheelOutcome::Consumed;
        }
        if !self.smooth_wheel {
            return WheelOutcome::Native;
        }
        let current = self.glide.unwrap_or_else(|| scroller.scroll_y());
        if self.glide.is_none() {
            self.wheel_target = current;
        }
        let step = delta_y.clamp(-self.cfg.wheel_max_step, self.cfg.wheel_max_step);
        self.wheel_target = (self.wheel_target + step).clamp(0.0, scroller.max_scroll_y().max(0.0));
        self.glide = Some(current);
        WheelOutcome::Consumed
    }

    /// Per-frame driver for the scripted scroll and the wheel glide.
    pub fn tick(&mut self, now: f64, scroller: &mut dyn Scroller) {
        match self.mode {
            ScrollMode::AutoScrolling { from, to, started_at } => {
                let duration = self.cfg.auto_duration.max(1e-3);
                let elapsed = now - started_at;
                let t = (elapsed / duration).clamp(0.0, 1.0);
                scroller.set_scroll_y(from + (to - from) * f64::from(ease_in_out_cubic(t as f32)));
                if elapsed < duration - 1e-6 {
                    return;
                }
                let off = (scroller.scroll_y() - to).abs();
                if off <= self.cfg.settle_tolerance {
                    self.release(scroller);
                } else if elapsed >= duration + self.cfg.settle_timeout {
                    log::warn!("auto-scroll stalled {off:.1}px short of {to:.0}; releasing");
                    self.release(scroller);
                }
            }
            ScrollMode::Idle => {
                let Some(y) = self.glide else {
                    return;
                };
                let next = y + (self.wheel_target - y) * self.cfg.wheel_lag;
                if (self.wheel_target - next).abs() < self.cfg.wheel_epsilon {
                    scroller.set_scroll_y(self.wheel_target);
                    self.glide = None;
                } else {
                    scroller.set_scroll_y(next);
                    self.glide = Some(next);
                }
            }
            ScrollMode::Locked { .. } => {}
        }
    }
}
