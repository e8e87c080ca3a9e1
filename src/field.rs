//! Particle field simulation and rendering.
//!
//! The three animation parameters are written by the choreography layer and
//! only read here. [`step`] derives one [`Sprite`] per visible particle from
//! them; the only particle state it mutates is the swirl lag.

use crate::anchor::{AnchorBinder, AnchorTarget, Binding};
use crate::config::{HeroConfig, MotionConfig, PointerConfig, RippleConfig};
use crate::geometry::{clamp01, ease_out_expo, lerp, smoothstep, Point, Point3, Rgb, Viewport};
use crate::sampler::Particle;
use crate::surface::Surface;

/// Normalised animation phases, each in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnimationState {
    /// 0 = scattered pre-formation, 1 = formed glyphs
    pub intro: f32,
    /// 0 = formed, 1 = fully exploded
    pub scatter: f32,
    /// Progress of the single inbound shock wave
    pub ripple: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerState {
    pub position: Point,
    pub active: bool,
}

/// Everything [`step`] reads besides the particles themselves.
#[derive(Clone, Copy, Debug)]
pub struct StepInput<'a> {
    pub state: AnimationState,
    /// Pointer position when swirl interaction is allowed this frame
    pub pointer: Option<Point>,
    /// Seconds since the field was created
    pub time: f32,
    pub ripple_origin: Point,
    pub viewport: Viewport,
    pub motion: &'a MotionConfig,
    pub ripple: &'a RippleConfig,
    pub swirl: &'a PointerConfig,
}

/// A projected particle ready to draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sprite {
    pub index: usize,
    /// Position before projection
    pub world: Point3,
    pub screen: Point,
    pub radius: f32,
    pub alpha: f32,
    pub color: Rgb,
}

/// Radial push weight of the ripple band at distance `d` from its origin.
fn ripple_weight(d: f32, progress: f32, max_radius: f32, cfg: &RippleConfig) -> f32 {
    if progress <= 0.0 || progress >= 1.0 {
        return 0.0;
    }
    let band_radius = (1.0 - progress) * max_radius;
    let k = 1.0 - smoothstep(0.0, cfg.band_width, (d - band_radius).abs());
    let fade_in = smoothstep(0.0, cfg.fade_in, progress);
    let fade_out = 1.0 - smoothstep(1.0 - cfg.fade_out, 1.0, progress);
    let decay = fade_in * fade_out;
    k * k * decay
}

fn drift(time: f32, freq: f32, phase: f32, amp: f32) -> f32 {
    (time * freq + phase).sin() * amp
}

/// Advance every particle one frame and collect the visible sprites into `out`.
pub fn step(particles: &mut [Particle], input: &StepInput<'_>, out: &mut Vec<Sprite>) {
    out.clear();
    let AnimationState { intro, scatter, ripple } = input.state;
    let motion = input.motion;
    let eased = ease_out_expo(intro);
    let explode = (scatter * motion.explode_factor).min(1.0);
    let drift_base = scatter.max(0.0).powf(motion.drift_exponent);
    let fade = 1.0 - smoothstep(motion.fade_start, 1.0, scatter) * motion.fade_amount;
    let max_radius = input.viewport.diagonal() * input.ripple.max_radius;
    let center = input.viewport.center();
    let swirl = input.swirl;
    let pointer = input.pointer.filter(|_| scatter < swirl.max_scatter);

    for (index, p) in particles.iter_mut().enumerate() {
        let home = p.home.with_z(0.0);
        let formed = p.start.lerp(home, eased);
        let exploded = home.lerp(p.scatter, explode);
        let mut world = formed.lerp(exploded, scatter);

        let lock = p.anchor.map_or(0.0, |a| a.mix(scatter));
        let d = drift_base * (1.0 - lock);
        if d > 0.0 {
            world.x += drift(input.time, p.drift_freq.x, p.drift_phase.x, p.drift_amp.x) * d;
            world.y += drift(input.time, p.drift_freq.y, p.drift_phase.y, p.drift_amp.y) * d;
            world.z += drift(input.time, p.drift_freq.z, p.drift_phase.z, p.drift_amp.z) * d;
        }

        let mut boost = 1.0;
        let dist = world.xy().distance(input.ripple_origin);
        let w = ripple_weight(dist, ripple, max_radius, input.ripple);
        if w > 0.0 {
            if dist > 1e-3 {
                world.x += (world.x - input.ripple_origin.x) / dist * input.ripple.push * w;
                world.y += (world.y - input.ripple_origin.y) / dist * input.ripple.push * w;
            }
            world.z += input.ripple.lift * w;
            boost += input.ripple.alpha_boost * w;
        }

        let mut target = Point::ZERO;
        if let Some(ptr) = pointer {
            let pd = world.xy().distance(ptr);
            if pd < swirl.radius {
                let falloff = (1.0 - pd / swirl.radius).powi(2);
                let angle = p.swirl_phase + input.time * swirl.swirl_speed;
                target = Point::new(angle.cos(), angle.sin());
                target.x *= swirl.strength * falloff;
                target.y *= swirl.strength * falloff;
            }
        }
        p.swirl_offset.x += (target.x - p.swirl_offset.x) * swirl.lag;
        p.swirl_offset.y += (target.y - p.swirl_offset.y) * swirl.lag;
        world.x += p.swirl_offset.x;
        world.y += p.swirl_offset.y;

        let mut size = p.size;
        let mut alpha = p.base_alpha * eased * fade * boost;
        if let Some(anchor) = p.anchor.filter(|_| lock > 0.0) {
            let t = anchor.target;
            world = world.lerp(Point3::new(t.x, t.y, 0.0), lock);
            size = lerp(size, t.radius, lock);
            alpha = lerp(alpha, eased, lock);
        }

        let depth = motion.focal_length / (motion.focal_length - world.z).max(motion.min_depth);
        let alpha = clamp01(alpha);
        if alpha < motion.visibility_floor {
            continue;
        }
        out.push(Sprite {
            index,
            world,
            screen: Point::new(
                center.x + (world.x - center.x) * depth,
                center.y + (world.y - center.y) * depth,
            ),
            radius: size * depth,
            alpha,
            color: p.color,
        });
    }
}

/// Owns the particle set and the animation parameters for one canvas.
pub struct ParticleField {
    particles: Vec<Particle>,
    binder: AnchorBinder,
    state: AnimationState,
    pointer: PointerState,
    pointer_enabled: bool,
    ripple_origin: Point,
    viewport: Viewport,
    motion: MotionConfig,
    ripple: RippleConfig,
    swirl: PointerConfig,
    sprites: Vec<Sprite>,
    time: f32,
}

impl ParticleField {
    pub fn new(config: &HeroConfig) -> Self {
        Self {
            particles: Vec::new(),
            binder: AnchorBinder::new(config.anchors.slots.clone()),
            state: AnimationState::default(),
            pointer: PointerState::default(),
            pointer_enabled: true,
            ripple_origin: Point::ZERO,
            viewport: Viewport::new(0.0, 0.0, 1.0),
            motion: config.motion.clone(),
            ripple: config.ripple.clone(),
            swirl: config.pointer.clone(),
            sprites: Vec::new(),
            time: 0.0,
        }
    }

    /// Replace the particle set. Animation parameters carry over so a
    /// resize mid-scroll does not restart the intro.
    pub fn rebuild(
        &mut self,
        mut particles: Vec<Particle>,
        viewport: Viewport,
        ripple_origin: Point,
        anchors: bool,
    ) {
        self.binder.bind(&mut particles, anchors);
        self.particles = particles;
        self.viewport = viewport;
        self.ripple_origin = ripple_origin;
        self.sprites.clear();
        log::info!(
            "particle field rebuilt: {} particles, {} anchors, {}x{}@{}",
            self.particles.len(),
            self.binder.bindings().len(),
            viewport.width,
            viewport.height,
            viewport.dpr
        );
    }

    /// Push re-measured anchor targets (indexed by slot) into bound particles.
    pub fn refresh_anchors(&mut self, targets: &[Option<AnchorTarget>]) {
        self.binder.refresh(&mut self.particles, targets);
    }

    pub fn bindings(&self) -> &[Binding] {
        self.binder.bindings()
    }

    pub fn set_intro(&mut self, v: f32) {
        self.state.intro = clamp01(v);
    }

    pub fn set_scatter(&mut self, v: f32) {
        self.state.scatter = clamp01(v);
    }

    pub fn set_ripple(&mut self, v: f32) {
        self.state.ripple = clamp01(v);
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    /// Swirl is a fine-pointer effect; coarse-pointer devices disable it.
    pub fn set_pointer_enabled(&mut self, enabled: bool) {
        self.pointer_enabled = enabled;
        if !enabled {
            self.pointer.active = false;
        }
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.pointer = PointerState {
            position: Point::new(x, y),
            active: self.pointer_enabled,
        };
    }

    pub fn pointer_leave(&mut self) {
        self.pointer.active = false;
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn sprites(&self) -> &[Sprite] {
        &self.sprites
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn ripple_origin(&self) -> Point {
        self.ripple_origin
    }

    /// Advance the simulation by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        self.time += dt.max(0.0);
        let pointer = self.pointer.active.then_some(self.pointer.position);
        let input = StepInput {
            state: self.state,
            pointer,
            time: self.time,
            ripple_origin: self.ripple_origin,
            viewport: self.viewport,
            motion: &self.motion,
            ripple: &self.ripple,
            swirl: &self.swirl,
        };
        step(&mut self.particles, &input, &mut self.sprites);
    }

    /// Draw the last computed frame. Returns the number of circles drawn;
    /// a zero-sized surface draws nothing and is retried next frame.
    pub fn render(&self, surface: &mut dyn Surface) -> usize {
        if !surface.is_drawable() {
            return 0;
        }
        surface.clear();
        for s in &self.sprites {
            surface.fill_circle(s.screen.x, s.screen.y, s.radius, s.color, s.alpha);
        }
        self.sprites.len()
    }
}
