//! Minimal tween timeline driving the hero's animation parameters.
//!
//! Tweens sit at fixed offsets from the moment the timeline is played, so
//! ordering between sub-animations is explicit rather than a consequence of
//! callback order.

use crate::geometry::{ease_in_out_cubic, ease_in_out_sine, ease_out_cubic, ease_out_expo};

/// A value the timeline can write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HeroParam {
    /// Headline letter reveal, forwarded to the page
    Letters,
    Intro,
    Ripple,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Ease {
    #[default]
    Linear,
    OutCubic,
    InOutCubic,
    OutExpo,
    InOutSine,
}

impl Ease {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::OutCubic => ease_out_cubic(t),
            Ease::InOutCubic => ease_in_out_cubic(t),
            Ease::OutExpo => ease_out_expo(t),
            Ease::InOutSine => ease_in_out_sine(t),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tween {
    pub name: &'static str,
    pub param: HeroParam,
    pub from: f32,
    pub to: f32,
    /// Seconds after `play` at which the tween starts
    pub offset: f64,
    pub duration: f64,
    pub ease: Ease,
}

impl Tween {
    pub fn new(name: &'static str, param: HeroParam, offset: f64, duration: f64) -> Self {
        Self {
            name,
            param,
            from: 0.0,
            to: 1.0,
            offset,
            duration,
            ease: Ease::Linear,
        }
    }

    pub fn ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    pub fn end(&self) -> f64 {
        self.offset + self.duration.max(0.0)
    }

    fn value_at(&self, local: f64) -> f32 {
        let t = if self.duration <= 0.0 {
            1.0
        } else {
            (local / self.duration).clamp(0.0, 1.0) as f32
        };
        self.from + (self.to - self.from) * self.ease.apply(t)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Timeline {
    tweens: Vec<(Tween, bool)>,
    started_at: Option<f64>,
    killed: bool,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, tween: Tween) -> &mut Self {
        self.tweens.push((tween, false));
        self
    }

    pub fn play(&mut self, now: f64) {
        self.started_at = Some(now);
        self.killed = false;
        for (_, done) in &mut self.tweens {
            *done = false;
        }
    }

    /// Stop writing values; finished tweens keep reporting as finished.
    pub fn kill(&mut self) {
        self.killed = true;
    }

    /// Values to write this frame: every tween that has started, once more
    /// on the frame it completes, and never again afterwards.
    pub fn advance(&mut self, now: f64) -> Vec<(HeroParam, f32)> {
        let Some(t0) = self.started_at else {
            return Vec::new();
        };
        if self.killed {
            return Vec::new();
        }
        let elapsed = now - t0;
        let mut out = Vec::new();
        for (tween, done) in &mut self.tweens {
            if *done || elapsed < tween.offset {
                continue;
            }
            out.push((tween.param, tween.value_at(elapsed - tween.offset)));
            if elapsed >= tween.end() {
                *done = true;
                log::debug!("tween '{}' complete", tween.name);
            }
        }
        out
    }

    pub fn finished(&self, name: &str) -> bool {
        self.tweens.iter().any(|(t, done)| *done && t.name == name)
    }

    pub fn is_complete(&self) -> bool {
        self.tweens.iter().all(|(_, done)| *done)
    }
}
