#![cfg(not(target_arch = "wasm32"))]

use drifft_hero::config::SamplingConfig;
use drifft_hero::geometry::{Rect, Rgb, Tier, Viewport};
use drifft_hero::raster::{BoxRasterizer, GlyphBox, GlyphRasterizer};
use drifft_hero::sampler::sample_particles;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

const PALETTE: [Rgb; 2] = [Rgb::new(0x00, 0x47, 0xFF), Rgb::new(0xF2, 0xF4, 0xFF)];

/// A centred headline of `n` glyph boxes scaled to the viewport.
fn headline(vp: Viewport, n: usize) -> Vec<GlyphBox> {
    let height = (vp.height * 0.22).min(vp.width * 0.8 / n as f32 / 0.62);
    let width = height * 0.62;
    let x0 = (vp.width - width * n as f32) * 0.5;
    let y = (vp.height - height) * 0.5;
    (0..n)
        .map(|i| GlyphBox::new('X', Rect::new(x0 + i as f32 * width, y, width * 0.86, height)))
        .collect()
}

#[test]
fn homes_lie_on_glyph_pixels() {
    let vp = Viewport::new(1280.0, 720.0, 1.0);
    let glyphs = headline(vp, 5);
    let mask = BoxRasterizer::default().rasterize(&glyphs, vp.width, vp.height, vp.dpr).unwrap();
    let cfg = SamplingConfig::default();
    let mut rng = SmallRng::seed_from_u64(5);
    let (particles, _) = sample_particles(&mask, vp, &cfg, &PALETTE, &mut rng);
    assert!(!particles.is_empty());
    for p in &particles {
        assert!(mask.alpha(p.home.x as u32, p.home.y as u32) > cfg.alpha_threshold);
        assert!(PALETTE.contains(&p.color));
        assert!(p.anchor.is_none());
    }
}

#[test]
fn high_dpr_keeps_css_pixel_homes() {
    let vp = Viewport::new(1280.0, 720.0, 2.0);
    let glyphs = headline(vp, 3);
    let mask = BoxRasterizer::default().rasterize(&glyphs, vp.width, vp.height, vp.dpr).unwrap();
    let mut rng = SmallRng::seed_from_u64(9);
    let (particles, stats) =
        sample_particles(&mask, vp, &SamplingConfig::default(), &PALETTE, &mut rng);
    assert_eq!(stats.stride, 8);
    let block = Rect::union_all(glyphs.iter().map(|g| &g.rect)).unwrap();
    for p in &particles {
        assert!(p.home.x >= block.x - 1.0 && p.home.x <= block.right() + 1.0);
        assert!(p.home.y >= block.y - 1.0 && p.home.y <= block.bottom() + 1.0);
    }
}

#[test]
fn mobile_and_desktop_caps_differ() {
    let cfg = SamplingConfig {
        stride_desktop: 1.0,
        stride_mobile: 1.0,
        ..SamplingConfig::default()
    };
    for (vp, tier, cap) in [
        (Viewport::new(1440.0, 900.0, 1.0), Tier::Desktop, cfg.cap_desktop),
        (Viewport::new(390.0, 844.0, 1.0), Tier::Mobile, cfg.cap_mobile),
    ] {
        let mask = BoxRasterizer::default()
            .rasterize(&headline(vp, 4), vp.width, vp.height, vp.dpr)
            .unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        let (particles, stats) = sample_particles(&mask, vp, &cfg, &PALETTE, &mut rng);
        assert_eq!(stats.tier, tier);
        assert!(stats.raw > cap, "raw {} should exceed cap {cap}", stats.raw);
        assert!(particles.len() <= cap);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn rebuild_is_count_stable_and_capped(
        width in 200.0f32..1920.0,
        height in 200.0f32..1200.0,
        dpr in prop::sample::select(vec![1.0f32, 1.5, 2.0]),
        glyph_count in 1usize..9,
        seed_a in any::<u64>(),
        seed_b in any::<u64>(),
    ) {
        let vp = Viewport::new(width, height, dpr);
        let glyphs = headline(vp, glyph_count);
        let cfg = SamplingConfig::default();
        let mut rasterizer = BoxRasterizer::default();

        let mask_a = rasterizer.rasterize(&glyphs, width, height, dpr).unwrap();
        let mask_b = rasterizer.rasterize(&glyphs, width, height, dpr).unwrap();
        let (a, stats) =
            sample_particles(&mask_a, vp, &cfg, &PALETTE, &mut SmallRng::seed_from_u64(seed_a));
        let (b, _) =
            sample_particles(&mask_b, vp, &cfg, &PALETTE, &mut SmallRng::seed_from_u64(seed_b));

        prop_assert_eq!(a.len(), b.len());
        prop_assert!(a.len() <= stats.cap);
        for (pa, pb) in a.iter().zip(&b) {
            prop_assert_eq!(pa.home, pb.home);
        }
    }

    #[test]
    fn randomised_attributes_stay_in_range(seed in any::<u64>()) {
        let vp = Viewport::new(1024.0, 768.0, 1.0);
        let mask = BoxRasterizer::default()
            .rasterize(&headline(vp, 3), vp.width, vp.height, vp.dpr)
            .unwrap();
        let cfg = SamplingConfig::default();
        let mut rng = SmallRng::seed_from_u64(seed);
        let (particles, _) = sample_particles(&mask, vp, &cfg, &PALETTE, &mut rng);
        for p in &particles {
            prop_assert!(p.size >= cfg.size[0] && p.size <= cfg.size[1]);
            prop_assert!(p.base_alpha >= cfg.base_alpha[0] && p.base_alpha <= cfg.base_alpha[1]);
            prop_assert!(p.start.z >= cfg.start_z[0] && p.start.z <= cfg.start_z[1]);
            prop_assert!(p.scatter.z >= cfg.scatter_z[0] && p.scatter.z <= cfg.scatter_z[1]);
            let [xy_lo, xy_hi] = cfg.drift_amp_xy;
            let [z_lo, z_hi] = cfg.drift_amp_z;
            prop_assert!(p.drift_amp.x >= xy_lo && p.drift_amp.x <= xy_hi);
            prop_assert!(p.drift_amp.z >= z_lo && p.drift_amp.z <= z_hi);
        }
    }
}
