//! Ties the particle field, the intro timeline and the scroll choreographer
//! together for one page.
//!
//! The director is the only writer of the field's animation parameters. It
//! is platform independent: the browser glue and the headless simulator feed
//! it the same events and frame ticks.

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::anchor::AnchorTarget;
use crate::config::HeroConfig;
use crate::error::Result;
use crate::field::ParticleField;
use crate::geometry::{clamp01, Rect, Tier, Viewport};
use crate::raster::{GlyphBox, GlyphRasterizer};
use crate::sampler::{sample_particles, SampleStats};
use crate::scroll::{ScrollBehavior, ScrollChoreographer, Scroller, WheelOutcome};
use crate::sequence::{Gate, GateContext, Sequence};
use crate::surface::Surface;
use crate::timeline::{Ease, HeroParam, Timeline, Tween};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    pub canvas_2d: bool,
    /// Tween-driven animation; off means jump straight to the final state
    pub timeline: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            canvas_2d: true,
            timeline: true,
        }
    }
}

/// What the page reports about the device.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Environment {
    pub viewport: Viewport,
    pub reduced_motion: bool,
    pub coarse_pointer: bool,
    pub capabilities: Capabilities,
}

impl Environment {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            reduced_motion: false,
            coarse_pointer: false,
            capabilities: Capabilities::default(),
        }
    }
}

/// Document offsets in CSS pixels, re-measured on resize.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PageLayout {
    pub hero_top: f64,
    pub hero_height: f64,
    pub content_top: f64,
    pub footer_top: f64,
}

/// Page-side effects the choreography triggers but does not own.
pub trait PageEffects {
    /// Headline letter reveal progress in `[0, 1]`.
    fn set_letters(&mut self, progress: f32);
    fn reveal_footer(&mut self);
    fn hide_footer(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Presentation {
    Animated,
    /// Formed immediately, no tweens, instant auto-scroll
    ReducedMotion,
    /// A capability is missing: final state, scroll untouched
    Static,
}

impl Presentation {
    pub fn for_env(env: &Environment) -> Self {
        let caps = env.capabilities;
        if !caps.canvas_2d || !caps.timeline {
            Presentation::Static
        } else if env.reduced_motion {
            Presentation::ReducedMotion
        } else {
            Presentation::Animated
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Cue {
    /// Hold the page where it is until the scripted scroll takes over
    Hold,
    ScrollToContent(ScrollBehavior),
    ContentReached,
    RevealFooter,
    FooterSettled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FooterState {
    Armed,
    Revealing,
    Revealed,
}

pub struct HeroDirector {
    cfg: HeroConfig,
    env: Environment,
    presentation: Presentation,
    layout: PageLayout,
    field: ParticleField,
    timeline: Timeline,
    scroll: ScrollChoreographer,
    content: Sequence<Cue>,
    footer: Sequence<Cue>,
    footer_state: FooterState,
    rng: SmallRng,
    scrub: f32,
    last_scroll_y: f64,
    started: bool,
    last_stats: Option<SampleStats>,
}

impl HeroDirector {
    pub fn new(cfg: HeroConfig, env: Environment, seed: u64) -> Self {
        let presentation = Presentation::for_env(&env);
        let mut field = ParticleField::new(&cfg);
        field.set_pointer_enabled(pointer_allowed(&cfg, &env));
        let scroll = ScrollChoreographer::new(cfg.scroll.clone(), smooth_wheel_allowed(&cfg, &env));
        log::info!("hero presentation: {presentation:?}");
        Self {
            cfg,
            env,
            presentation,
            layout: PageLayout::default(),
            field,
            timeline: Timeline::new(),
            scroll,
            content: Sequence::new("content"),
            footer: Sequence::new("footer"),
            footer_state: FooterState::Armed,
            rng: SmallRng::seed_from_u64(seed),
            scrub: 0.0,
            last_scroll_y: 0.0,
            started: false,
            last_stats: None,
        }
    }

    pub fn config(&self) -> &HeroConfig {
        &self.cfg
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn presentation(&self) -> Presentation {
        self.presentation
    }

    pub fn layout(&self) -> PageLayout {
        self.layout
    }

    pub fn set_layout(&mut self, layout: PageLayout) {
        self.layout = layout;
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn scroll(&self) -> &ScrollChoreographer {
        &self.scroll
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn footer_state(&self) -> FooterState {
        self.footer_state
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Stage the one-shot scroll to content is waiting on, if any.
    pub fn content_stage(&self) -> Option<&'static str> {
        self.content.pending()
    }

    pub fn last_stats(&self) -> Option<SampleStats> {
        self.last_stats
    }

    /// Viewport or media-query change without resampling. The presentation
    /// chosen at construction is kept.
    pub fn set_environment(&mut self, env: Environment) {
        self.env = env;
        self.field.set_pointer_enabled(pointer_allowed(&self.cfg, &env));
        self.scroll.set_smooth_wheel(smooth_wheel_allowed(&self.cfg, &env));
    }

    /// Resample the headline for a (possibly new) environment.
    ///
    /// Animation parameters carry over; a degenerate viewport or empty
    /// rasterisation leaves the field empty until the next rebuild.
    pub fn rebuild(
        &mut self,
        env: Environment,
        rasterizer: &mut dyn GlyphRasterizer,
        glyphs: &[GlyphBox],
    ) -> Result<SampleStats> {
        self.set_environment(env);
        let vp = env.viewport;
        let mask = rasterizer.rasterize(glyphs, vp.width, vp.height, vp.dpr)?;
        let (particles, stats) = sample_particles(
            &mask,
            vp,
            &self.cfg.sampling,
            &self.cfg.palette,
            &mut self.rng,
        );
        let origin = Rect::union_all(glyphs.iter().filter(|g| !g.is_blank()).map(|g| &g.rect))
            .map_or_else(|| vp.center(), |r| r.center());
        let anchors = self.cfg.anchors.enabled && stats.tier == Tier::Desktop;
        log::debug!(
            "sampled {} of {} seeds (stride {}, cap {}, {:?})",
            stats.kept,
            stats.raw,
            stats.stride,
            stats.cap,
            stats.tier
        );
        self.field.rebuild(particles, vp, origin, anchors);
        self.last_stats = Some(stats);
        Ok(stats)
    }

    /// Anchor targets from measured punctuation glyph boxes, one per slot.
    pub fn anchor_targets(&self, rects: &[Option<Rect>]) -> Vec<Option<AnchorTarget>> {
        rects
            .iter()
            .map(|r| r.and_then(|r| AnchorTarget::from_glyph_rect(r, &self.cfg.anchors)))
            .collect()
    }

    pub fn refresh_anchors(&mut self, targets: &[Option<AnchorTarget>]) {
        self.field.refresh_anchors(targets);
    }

    /// Kick off the presentation. Called lazily by the first choreography
    /// frame when the caller has not done so.
    pub fn start(&mut self, now: f64, scroller: &mut dyn Scroller, effects: &mut dyn PageEffects) {
        if self.started {
            return;
        }
        self.started = true;
        self.last_scroll_y = scroller.scroll_y();
        let tl = &self.cfg.timeline;
        let half_viewport = f64::from(self.env.viewport.height) * 0.5;
        let in_hero = scroller.scroll_y() < self.layout.content_top - half_viewport;

        match self.presentation {
            Presentation::Animated => {
                self.timeline = Timeline::new();
                self.timeline
                    .add(
                        Tween::new("letters", HeroParam::Letters, 0.0, tl.letters_duration)
                            .ease(Ease::OutCubic),
                    )
                    .add(Tween::new("intro", HeroParam::Intro, 0.0, tl.intro_duration))
                    .add(
                        Tween::new(
                            "ripple",
                            HeroParam::Ripple,
                            tl.ripple_offset,
                            tl.ripple_duration,
                        )
                        .ease(Ease::InOutSine),
                    );
                self.timeline.play(now);
                self.field.set_intro(0.0);
                self.field.set_ripple(0.0);
                if in_hero {
                    let settle = self.cfg.scroll.auto_duration + self.cfg.scroll.settle_timeout;
                    self.content = Sequence::new("content")
                        .then("ripple-done", Gate::TweenFinished("ripple"), Cue::Hold)
                        .then(
                            "auto-scroll",
                            Gate::Delay(tl.auto_scroll_delay),
                            Cue::ScrollToContent(ScrollBehavior::Smooth),
                        )
                        .then(
                            "settled",
                            Gate::ScrollSettled {
                                tolerance: self.cfg.scroll.settle_tolerance,
                                timeout: settle,
                            },
                            Cue::ContentReached,
                        );
                }
            }
            Presentation::ReducedMotion => {
                self.field.set_intro(1.0);
                self.field.set_ripple(0.0);
                effects.set_letters(1.0);
                if in_hero {
                    self.content = Sequence::new("content")
                        .then("formed", Gate::Immediately, Cue::Hold)
                        .then(
                            "auto-scroll",
                            Gate::Delay(tl.reduced_motion_delay),
                            Cue::ScrollToContent(ScrollBehavior::Instant),
                        );
                }
            }
            Presentation::Static => {
                self.field.set_intro(1.0);
                self.field.set_ripple(0.0);
                effects.set_letters(1.0);
            }
        }
        if self.scroll.user_interacted() {
            self.content.cancel();
        }
        self.content.start(now);
        log::info!("hero started ({:?}) at {now:.3}s", self.presentation);
    }

    // ---- events -----------------------------------------------------------

    pub fn on_scroll(&mut self, scroller: &mut dyn Scroller) -> bool {
        self.scroll.on_scroll(scroller)
    }

    pub fn on_wheel(&mut self, delta_y: f64, scroller: &dyn Scroller) -> WheelOutcome {
        self.user_input(scroller);
        self.scroll.on_wheel(delta_y, scroller)
    }

    pub fn on_touch(&mut self, scroller: &dyn Scroller) {
        self.user_input(scroller);
    }

    pub fn on_key(&mut self, scroller: &dyn Scroller) {
        self.user_input(scroller);
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.field.pointer_move(x, y);
    }

    pub fn pointer_leave(&mut self) {
        self.field.pointer_leave();
    }

    /// First user input permanently cancels the automatic scroll to
    /// content unless it is already under way, and hands back a held page.
    fn user_input(&mut self, scroller: &dyn Scroller) {
        self.scroll.note_user_input();
        if matches!(self.content.pending(), Some("ripple-done" | "formed" | "auto-scroll")) {
            self.content.cancel();
            if self.scroll.is_locked() {
                self.scroll.release(scroller);
            }
        }
    }

    // ---- frame ------------------------------------------------------------

    /// Timeline, scripted scroll, stage sequencing and scatter drive.
    pub fn frame_choreography(
        &mut self,
        now: f64,
        scroller: &mut dyn Scroller,
        effects: &mut dyn PageEffects,
    ) {
        if !self.started {
            self.start(now, scroller, effects);
        }

        for (param, value) in self.timeline.advance(now) {
            match param {
                HeroParam::Letters => effects.set_letters(value),
                HeroParam::Intro => self.field.set_intro(value),
                HeroParam::Ripple => self.field.set_ripple(value),
            }
        }

        self.scroll.tick(now, scroller);

        let ctx = GateContext {
            now,
            scroll_y: scroller.scroll_y(),
            scroll_target: self.scroll.auto_target(),
            scroll_idle: self.scroll.is_idle(),
            timeline: &self.timeline,
        };
        let mut cues = self.content.poll(&ctx);
        cues.extend(self.footer.poll(&ctx));
        for (_, cue) in cues {
            self.apply(cue, now, scroller, effects);
        }

        self.drive_footer(now, scroller, effects);
        self.drive_scatter(scroller.scroll_y());
        self.last_scroll_y = scroller.scroll_y();
    }

    /// Advance the particles and draw them.
    pub fn frame_field(&mut self, dt: f64, surface: &mut dyn Surface) -> usize {
        self.field.update(dt as f32);
        if !self.env.capabilities.canvas_2d {
            return 0;
        }
        self.field.render(surface)
    }

    fn apply(
        &mut self,
        cue: Cue,
        now: f64,
        scroller: &mut dyn Scroller,
        effects: &mut dyn PageEffects,
    ) {
        match cue {
            Cue::Hold => self.scroll.lock(scroller),
            Cue::ScrollToContent(behavior) => {
                self.scroll.auto_scroll_to(self.layout.content_top, now, behavior, scroller);
            }
            Cue::ContentReached => log::info!("content reached at {:.0}", scroller.scroll_y()),
            Cue::RevealFooter => effects.reveal_footer(),
            Cue::FooterSettled => {
                self.footer_state = FooterState::Revealed;
                log::debug!("footer transition settled");
            }
        }
    }

    fn footer_trigger(&self) -> f64 {
        let viewport_h = f64::from(self.env.viewport.height);
        self.layout.footer_top - viewport_h * self.cfg.scroll.footer_trigger
    }

    fn drive_footer(
        &mut self,
        now: f64,
        scroller: &mut dyn Scroller,
        effects: &mut dyn PageEffects,
    ) {
        if self.layout.footer_top <= 0.0 {
            return;
        }
        let y = scroller.scroll_y();
        let trigger = self.footer_trigger();
        match self.footer_state {
            FooterState::Armed => {
                let downward = y > self.last_scroll_y;
                let free = self.scroll.is_idle() && !self.content.is_running();
                if !(downward && free && y >= trigger) {
                    return;
                }
                if self.presentation == Presentation::Static {
                    effects.reveal_footer();
                    self.footer_state = FooterState::Revealed;
                    return;
                }
                let behavior = match self.presentation {
                    Presentation::Animated => ScrollBehavior::Smooth,
                    _ => ScrollBehavior::Instant,
                };
                let cfg = &self.cfg.scroll;
                let timeout = cfg.auto_duration + cfg.settle_timeout;
                self.footer = Sequence::new("footer")
                    .then(
                        "near-footer",
                        Gate::ScrollWithin {
                            distance: cfg.footer_reveal_distance,
                            timeout,
                        },
                        Cue::RevealFooter,
                    )
                    .then(
                        "footer-settled",
                        Gate::ScrollSettled {
                            tolerance: cfg.settle_tolerance,
                            timeout,
                        },
                        Cue::FooterSettled,
                    );
                self.scroll.auto_scroll_to(self.layout.footer_top, now, behavior, scroller);
                self.footer.start(now);
                self.footer_state = FooterState::Revealing;
            }
            FooterState::Revealing => {}
            FooterState::Revealed => {
                if y < trigger && self.scroll.is_idle() {
                    effects.hide_footer();
                    self.footer_state = FooterState::Armed;
                }
            }
        }
    }

    fn drive_scatter(&mut self, scroll_y: f64) {
        let hero_height = self.layout.hero_height;
        if hero_height <= 0.0 {
            self.field.set_scatter(0.0);
            return;
        }
        let tier = self.env.viewport.tier(self.cfg.sampling.mobile_breakpoint);
        if tier == Tier::Mobile {
            let span = hero_height * f64::from(self.cfg.scroll.mobile_scatter_span);
            self.field.set_scatter(clamp01((scroll_y / span) as f32));
            return;
        }
        let target = clamp01(((scroll_y - self.layout.hero_top) / hero_height) as f32);
        if self.presentation != Presentation::Animated {
            self.scrub = target;
        } else {
            self.scrub += (target - self.scrub) * self.cfg.scroll.scrub_lag;
            if (target - self.scrub).abs() < 1e-4 {
                self.scrub = target;
            }
        }
        self.field.set_scatter(self.scrub);
    }
}

fn pointer_allowed(cfg: &HeroConfig, env: &Environment) -> bool {
    !env.coarse_pointer
        && !env.reduced_motion
        && env.viewport.tier(cfg.sampling.mobile_breakpoint) == Tier::Desktop
}

fn smooth_wheel_allowed(cfg: &HeroConfig, env: &Environment) -> bool {
    pointer_allowed(cfg, env) && env.capabilities.timeline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::BoxRasterizer;

    struct Page {
        y: f64,
        max: f64,
    }

    impl Scroller for Page {
        fn scroll_y(&self) -> f64 {
            self.y
        }
        fn max_scroll_y(&self) -> f64 {
            self.max
        }
        fn set_scroll_y(&mut self, y: f64) {
            self.y = y.clamp(0.0, self.max);
        }
    }

    #[derive(Default)]
    struct Effects {
        letters: f32,
        revealed: u32,
        hidden: u32,
    }

    impl PageEffects for Effects {
        fn set_letters(&mut self, progress: f32) {
            self.letters = progress;
        }
        fn reveal_footer(&mut self) {
            self.revealed += 1;
        }
        fn hide_footer(&mut self) {
            self.hidden += 1;
        }
    }

    fn layout() -> PageLayout {
        PageLayout {
            hero_top: 0.0,
            hero_height: 900.0,
            content_top: 900.0,
            footer_top: 3000.0,
        }
    }

    fn glyphs() -> Vec<GlyphBox> {
        "HERO"
            .chars()
            .enumerate()
            .map(|(i, ch)| {
                GlyphBox::new(ch, Rect::new(300.0 + i as f32 * 200.0, 350.0, 160.0, 200.0))
            })
            .collect()
    }

    fn director(env: Environment) -> HeroDirector {
        let mut d = HeroDirector::new(HeroConfig::default(), env, 7);
        d.set_layout(layout());
        d
    }

    #[test]
    fn presentation_follows_capabilities() {
        let mut env = Environment::new(Viewport::new(1440.0, 900.0, 1.0));
        assert_eq!(Presentation::for_env(&env), Presentation::Animated);
        env.reduced_motion = true;
        assert_eq!(Presentation::for_env(&env), Presentation::ReducedMotion);
        env.capabilities.canvas_2d = false;
        assert_eq!(Presentation::for_env(&env), Presentation::Static);
    }

    #[test]
    fn rebuild_binds_anchors_on_desktop_only() {
        let env = Environment::new(Viewport::new(1440.0, 900.0, 1.0));
        let mut d = director(env);
        let stats = d.rebuild(env, &mut BoxRasterizer::default(), &glyphs()).unwrap();
        assert!(stats.kept > 0);
        assert_eq!(d.field().bindings().len(), 2);
        assert_eq!(d.field().ripple_origin().x, 300.0 + (4.0 * 200.0 - 40.0) / 2.0);

        let mobile = Environment::new(Viewport::new(390.0, 844.0, 3.0));
        d.rebuild(mobile, &mut BoxRasterizer::default(), &glyphs()).unwrap();
        assert!(d.field().bindings().is_empty());
    }

    #[test]
    fn static_presentation_is_formed_and_never_scrolls() {
        let mut env = Environment::new(Viewport::new(1440.0, 900.0, 1.0));
        env.capabilities.timeline = false;
        let mut d = director(env);
        let mut page = Page { y: 0.0, max: 4000.0 };
        let mut fx = Effects::default();
        for i in 0..300 {
            d.frame_choreography(f64::from(i) / 60.0, &mut page, &mut fx);
        }
        assert_eq!(d.field().state().intro, 1.0);
        assert_eq!(fx.letters, 1.0);
        assert_eq!(page.y, 0.0);
    }

    #[test]
    fn user_input_before_ripple_cancels_scroll_to_content() {
        let env = Environment::new(Viewport::new(1440.0, 900.0, 1.0));
        let mut d = director(env);
        let mut page = Page { y: 0.0, max: 4000.0 };
        let mut fx = Effects::default();
        d.frame_choreography(0.0, &mut page, &mut fx);
        assert_eq!(d.content_stage(), Some("ripple-done"));
        d.on_touch(&page);
        assert_eq!(d.content_stage(), None);
        for i in 1..300 {
            d.frame_choreography(f64::from(i) / 60.0, &mut page, &mut fx);
        }
        assert_eq!(page.y, 0.0);
        assert!(d.scroll().is_idle());
    }

    #[test]
    fn footer_reveals_then_hides_and_rearms() {
        let env = Environment::new(Viewport::new(1440.0, 900.0, 1.0));
        let mut d = director(env);
        let mut page = Page { y: 2000.0, max: 3400.0 };
        let mut fx = Effects::default();
        d.frame_choreography(0.0, &mut page, &mut fx);
        assert_eq!(d.content_stage(), None);

        page.y = 2600.0;
        let mut t = 0.0;
        while t < 5.0 {
            t += 1.0 / 60.0;
            d.frame_choreography(t, &mut page, &mut fx);
        }
        assert_eq!(fx.revealed, 1);
        assert_eq!(d.footer_state(), FooterState::Revealed);
        assert_eq!(page.y, 3000.0);

        page.y = 1000.0;
        d.frame_choreography(t + 0.1, &mut page, &mut fx);
        assert_eq!(fx.hidden, 1);
        assert_eq!(d.footer_state(), FooterState::Armed);
    }
}
