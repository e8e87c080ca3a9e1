#![cfg(not(target_arch = "wasm32"))]

use drifft_hero::anchor::{lock_mix, AnchorTarget};
use drifft_hero::config::HeroConfig;
use drifft_hero::field::ParticleField;
use drifft_hero::geometry::{Point, Point3, Rect, Rgb, Viewport};
use drifft_hero::raster::{BoxRasterizer, GlyphBox, GlyphRasterizer};
use drifft_hero::sampler::{sample_particles, Particle};
use drifft_hero::surface::Surface;
use pretty_assertions::assert_eq;
use rand::rngs::SmallRng;
use rand::SeedableRng;

const VIEWPORT: Viewport = Viewport::new(1440.0, 900.0, 1.0);

fn particles(cfg: &HeroConfig) -> Vec<Particle> {
    let glyphs: Vec<GlyphBox> = "DRIFT"
        .chars()
        .enumerate()
        .map(|(i, ch)| {
            GlyphBox::new(ch, Rect::new(320.0 + i as f32 * 170.0, 340.0, 140.0, 200.0))
        })
        .collect();
    let mask = BoxRasterizer::default()
        .rasterize(&glyphs, VIEWPORT.width, VIEWPORT.height, VIEWPORT.dpr)
        .unwrap();
    let mut rng = SmallRng::seed_from_u64(42);
    let (particles, _) = sample_particles(&mask, VIEWPORT, &cfg.sampling, &cfg.palette, &mut rng);
    particles
}

fn field(anchors: bool) -> (ParticleField, Vec<Particle>) {
    let cfg = HeroConfig::default();
    let particles = particles(&cfg);
    let mut field = ParticleField::new(&cfg);
    field.rebuild(particles, VIEWPORT, Point::new(720.0, 440.0), anchors);
    let snapshot = field.particles().to_vec();
    (field, snapshot)
}

#[derive(Default)]
struct Recorder {
    size: (u32, u32),
    cleared: usize,
    circles: Vec<(f32, f32, f32, Rgb, f32)>,
}

impl Surface for Recorder {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn clear(&mut self) {
        self.cleared += 1;
        self.circles.clear();
    }

    fn fill_circle(&mut self, x: f32, y: f32, radius: f32, color: Rgb, alpha: f32) {
        self.circles.push((x, y, radius, color, alpha));
    }
}

#[test]
fn formed_headline_renders_at_home() {
    let (mut field, snapshot) = field(false);
    field.set_intro(1.0);
    field.set_scatter(0.0);
    field.update(1.0 / 60.0);
    assert_eq!(field.sprites().len(), snapshot.len());
    for sprite in field.sprites() {
        let home = snapshot[sprite.index].home;
        assert_eq!(sprite.world, Point3::new(home.x, home.y, 0.0));
        assert!(sprite.screen.distance(home) < 1e-3);
    }
}

#[test]
fn exploded_particles_stay_within_drift_of_scatter_target() {
    let (mut field, snapshot) = field(false);
    field.set_intro(1.0);
    field.set_scatter(1.0);
    // Drift keeps moving at full scatter; check a few moments.
    for _ in 0..5 {
        field.update(0.37);
        for sprite in field.sprites() {
            let p = &snapshot[sprite.index];
            assert!((sprite.world.x - p.scatter.x).abs() <= p.drift_amp.x + 1e-3);
            assert!((sprite.world.y - p.scatter.y).abs() <= p.drift_amp.y + 1e-3);
            assert!((sprite.world.z - p.scatter.z).abs() <= p.drift_amp.z + 1e-3);
        }
    }
}

#[test]
fn anchors_bind_and_lock_onto_targets() {
    let (mut field, _) = field(true);
    assert_eq!(field.bindings().len(), 2);
    let targets = [
        Some(AnchorTarget { x: 1200.0, y: 700.0, radius: 6.0 }),
        Some(AnchorTarget { x: 300.0, y: 120.0, radius: 4.0 }),
    ];
    field.refresh_anchors(&targets);
    field.set_intro(1.0);
    field.set_scatter(1.0);
    field.update(0.5);

    for binding in field.bindings().to_vec() {
        let target = targets[binding.slot].unwrap();
        let sprite = field
            .sprites()
            .iter()
            .find(|s| s.index == binding.particle)
            .copied()
            .unwrap();
        assert_eq!(sprite.world, Point3::new(target.x, target.y, 0.0));
        assert_eq!(sprite.radius, target.radius);
        assert_eq!(sprite.alpha, 1.0);
    }
}

#[test]
fn anchor_refresh_moves_target_without_reselecting() {
    let (mut field, _) = field(true);
    let before = field.bindings().to_vec();
    field.refresh_anchors(&[Some(AnchorTarget { x: 10.0, y: 10.0, radius: 2.0 }), None]);
    field.refresh_anchors(&[Some(AnchorTarget { x: 50.0, y: 60.0, radius: 2.0 }), None]);
    assert_eq!(field.bindings(), before.as_slice());

    let bound = field.particles()[before[0].particle].anchor.unwrap();
    assert_eq!((bound.target.x, bound.target.y), (50.0, 60.0));
    // A slot whose target vanished behaves like any other particle.
    assert!(field.particles()[before[1].particle].anchor.is_none());
}

#[test]
fn lock_window_matches_smoothstep() {
    let cfg = HeroConfig::default();
    let slot = &cfg.anchors.slots[0];
    assert_eq!(lock_mix(0.64, slot.lock_start, slot.lock_span), 0.0);
    assert!((lock_mix(0.79, slot.lock_start, slot.lock_span) - 0.5).abs() < 1e-5);
    assert_eq!(lock_mix(0.94, slot.lock_start, slot.lock_span), 1.0);
}

#[test]
fn render_skips_zero_sized_surface() {
    let (mut field, _) = field(false);
    field.set_intro(1.0);
    field.update(0.016);

    let mut hidden = Recorder::default();
    assert_eq!(field.render(&mut hidden), 0);
    assert_eq!(hidden.cleared, 0);

    let mut surface = Recorder {
        size: (1440, 900),
        ..Recorder::default()
    };
    let drawn = field.render(&mut surface);
    assert_eq!(drawn, field.sprites().len());
    assert_eq!(surface.circles.len(), drawn);
    assert_eq!(surface.cleared, 1);
}

#[test]
fn empty_field_tracks_parameters() {
    let cfg = HeroConfig::default();
    let mut field = ParticleField::new(&cfg);
    field.rebuild(Vec::new(), Viewport::new(0.0, 0.0, 1.0), Point::ZERO, true);
    field.set_intro(0.4);
    field.set_scatter(1.7);
    field.update(0.016);
    assert!(field.sprites().is_empty());
    assert!(field.bindings().is_empty());
    assert_eq!(field.state().intro, 0.4);
    assert_eq!(field.state().scatter, 1.0);
}

#[test]
fn intro_fades_particles_in() {
    let (mut field, _) = field(false);
    field.update(0.016);
    assert!(field.sprites().is_empty());
    field.set_intro(0.05);
    field.update(0.016);
    let early = field.sprites().len();
    field.set_intro(1.0);
    field.update(0.016);
    assert!(field.sprites().len() >= early);
    assert!(!field.sprites().is_empty());
}
