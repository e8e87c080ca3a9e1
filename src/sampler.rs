//! Particle seeding from a glyph alpha mask.

use std::f32::consts::TAU;

use rand::Rng;

use crate::anchor::AnchorLock;
use crate::config::{Range, SamplingConfig};
use crate::geometry::{Point, Point3, Rgb, Tier, Viewport};
use crate::raster::AlphaMask;

/// One simulated particle.
///
/// Everything but `swirl_offset` and `anchor` is fixed for the lifetime of a
/// build; a rebuild replaces the whole set.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    /// Formed position on a sampled glyph pixel (CSS px)
    pub home: Point,
    /// Pre-intro position
    pub start: Point3,
    /// Fully exploded position
    pub scatter: Point3,
    pub color: Rgb,
    pub size: f32,
    pub base_alpha: f32,
    pub drift_amp: Point3,
    pub drift_freq: Point3,
    pub drift_phase: Point3,
    pub swirl_phase: f32,
    pub swirl_offset: Point,
    pub anchor: Option<AnchorLock>,
}

impl Particle {
    /// A motionless particle whose start and scatter positions coincide
    /// with `home`.
    pub fn at_rest(home: Point, color: Rgb) -> Self {
        Self {
            home,
            start: home.with_z(0.0),
            scatter: home.with_z(0.0),
            color,
            size: 1.0,
            base_alpha: 1.0,
            drift_amp: Point3::default(),
            drift_freq: Point3::default(),
            drift_phase: Point3::default(),
            swirl_phase: 0.0,
            swirl_offset: Point::ZERO,
            anchor: None,
        }
    }
}

/// Numbers worth logging after a build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleStats {
    /// Seeds found before down-sampling
    pub raw: usize,
    pub kept: usize,
    /// Grid stride in device pixels
    pub stride: u32,
    pub cap: usize,
    pub tier: Tier,
}

fn uniform<R: Rng>(rng: &mut R, range: Range) -> f32 {
    if range[1] <= range[0] {
        return range[0];
    }
    rng.random_range(range[0]..=range[1])
}

fn signed<R: Rng>(rng: &mut R, magnitude: f32) -> f32 {
    if magnitude <= 0.0 {
        return 0.0;
    }
    rng.random_range(-magnitude..=magnitude)
}

/// Grid positions (device px) whose alpha clears the threshold.
///
/// Depends only on the mask, so identical geometry yields identical seeds.
pub fn seed_positions(mask: &AlphaMask, stride: u32, threshold: u8) -> Vec<(u32, u32)> {
    let stride = stride.max(1) as usize;
    let mut seeds = Vec::new();
    for y in (0..mask.height).step_by(stride) {
        for x in (0..mask.width).step_by(stride) {
            if mask.alpha(x, y) > threshold {
                seeds.push((x, y));
            }
        }
    }
    seeds
}

/// Keep every Nth seed so the result fits under `cap`.
pub fn downsample<T>(seeds: Vec<T>, cap: usize) -> Vec<T> {
    if cap == 0 {
        return Vec::new();
    }
    if seeds.len() <= cap {
        return seeds;
    }
    let step = seeds.len().div_ceil(cap);
    seeds.into_iter().step_by(step).collect()
}

/// Turn a glyph mask into particles.
///
/// Seed positions are deterministic; per-particle attributes come from `rng`
/// and are only bounded by the configured ranges.
pub fn sample_particles<R: Rng>(
    mask: &AlphaMask,
    viewport: Viewport,
    cfg: &SamplingConfig,
    palette: &[Rgb],
    rng: &mut R,
) -> (Vec<Particle>, SampleStats) {
    let tier = viewport.tier(cfg.mobile_breakpoint);
    let (stride_css, cap) = match tier {
        Tier::Desktop => (cfg.stride_desktop, cfg.cap_desktop),
        Tier::Mobile => (cfg.stride_mobile, cfg.cap_mobile),
    };
    let scale = if mask.scale > 0.0 { mask.scale } else { 1.0 };
    let stride = (stride_css * scale).round().max(1.0) as u32;
    let mut stats = SampleStats {
        raw: 0,
        kept: 0,
        stride,
        cap,
        tier,
    };
    if viewport.is_degenerate() || mask.is_empty() || palette.is_empty() {
        return (Vec::new(), stats);
    }

    let seeds = seed_positions(mask, stride, cfg.alpha_threshold);
    stats.raw = seeds.len();
    let homes: Vec<Point> = downsample(seeds, cap)
        .into_iter()
        .map(|(x, y)| Point::new(x as f32 / scale, y as f32 / scale))
        .collect();
    stats.kept = homes.len();
    if homes.is_empty() {
        return (Vec::new(), stats);
    }

    // Glyph-block bounds drive the outward scatter direction.
    let (mut min, mut max) = (homes[0], homes[0]);
    for h in &homes {
        min = Point::new(min.x.min(h.x), min.y.min(h.y));
        max = Point::new(max.x.max(h.x), max.y.max(h.y));
    }
    let center = min.lerp(max, 0.5);
    let half_w = ((max.x - min.x) * 0.5).max(1.0);
    let half_h = ((max.y - min.y) * 0.5).max(1.0);

    let (vw, vh) = (viewport.width, viewport.height);
    let particles = homes
        .into_iter()
        .map(|home| {
            let nx = (home.x - center.x) / half_w;
            let ny = (home.y - center.y) / half_h;
            let start = Point3::new(
                home.x + signed(rng, cfg.start_spread[0] * vw),
                home.y + signed(rng, cfg.start_spread[1] * vh),
                uniform(rng, cfg.start_z),
            );
            let scatter = Point3::new(
                home.x
                    + nx * cfg.scatter_spread[0] * vw * uniform(rng, [0.6, 1.4])
                    + signed(rng, cfg.scatter_jitter),
                home.y
                    + ny * cfg.scatter_spread[1] * vh * uniform(rng, [0.6, 1.4])
                    + signed(rng, cfg.scatter_jitter),
                uniform(rng, cfg.scatter_z),
            );
            Particle {
                home,
                start,
                scatter,
                color: palette[rng.random_range(0..palette.len())],
                size: uniform(rng, cfg.size),
                base_alpha: uniform(rng, cfg.base_alpha),
                drift_amp: Point3::new(
                    uniform(rng, cfg.drift_amp_xy),
                    uniform(rng, cfg.drift_amp_xy),
                    uniform(rng, cfg.drift_amp_z),
                ),
                drift_freq: Point3::new(
                    uniform(rng, cfg.drift_freq),
                    uniform(rng, cfg.drift_freq),
                    uniform(rng, cfg.drift_freq),
                ),
                drift_phase: Point3::new(
                    uniform(rng, [0.0, TAU]),
                    uniform(rng, [0.0, TAU]),
                    uniform(rng, [0.0, TAU]),
                ),
                swirl_phase: uniform(rng, [0.0, TAU]),
                swirl_offset: Point::ZERO,
                anchor: None,
            }
        })
        .collect();

    (particles, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn solid_mask(w: u32, h: u32) -> AlphaMask {
        AlphaMask::from_raw(w, h, 1.0, vec![255; (w * h) as usize]).unwrap()
    }

    #[test]
    fn threshold_rejects_faint_pixels() {
        let mask = AlphaMask::from_raw(3, 1, 1.0, vec![35, 36, 0]).unwrap();
        assert_eq!(seed_positions(&mask, 1, 35), vec![(1, 0)]);
    }

    #[test]
    fn downsample_keeps_every_nth() {
        let seeds: Vec<u32> = (0..10).collect();
        assert_eq!(downsample(seeds.clone(), 4), vec![0, 3, 6, 9]);
        assert_eq!(downsample(seeds.clone(), 10), seeds);
        assert!(downsample(seeds, 0).is_empty());
    }

    #[test]
    fn respects_cap_and_stride() {
        let cfg = SamplingConfig {
            cap_desktop: 50,
            ..SamplingConfig::default()
        };
        let mask = solid_mask(200, 100);
        let mut rng = SmallRng::seed_from_u64(7);
        let vp = Viewport::new(1440.0, 900.0, 1.0);
        let (particles, stats) = sample_particles(&mask, vp, &cfg, &[Rgb::new(1, 2, 3)], &mut rng);
        assert_eq!(stats.stride, 4);
        assert_eq!(stats.raw, 50 * 25);
        assert!(particles.len() <= 50);
        assert_eq!(stats.kept, particles.len());
        assert_eq!(stats.tier, Tier::Desktop);
    }

    #[test]
    fn scatter_points_away_from_block_centre() {
        let cfg = SamplingConfig {
            scatter_jitter: 0.0,
            ..SamplingConfig::default()
        };
        let mask = solid_mask(80, 40);
        let mut rng = SmallRng::seed_from_u64(11);
        let vp = Viewport::new(1000.0, 800.0, 1.0);
        let (particles, _) = sample_particles(&mask, vp, &cfg, &[Rgb::new(0, 0, 0)], &mut rng);
        let center_x = 38.0; // homes span 0..=76
        for p in particles.iter().filter(|p| (p.home.x - center_x).abs() > 1.0) {
            assert_eq!((p.scatter.x - p.home.x).signum(), (p.home.x - center_x).signum());
        }
    }

    #[test]
    fn empty_inputs_yield_no_particles() {
        let cfg = SamplingConfig::default();
        let mut rng = SmallRng::seed_from_u64(1);
        let palette = [Rgb::new(0, 0, 0)];
        let vp = Viewport::new(800.0, 600.0, 1.0);
        let (p, _) = sample_particles(&AlphaMask::empty(1.0), vp, &cfg, &palette, &mut rng);
        assert!(p.is_empty());
        let vp = Viewport::new(0.0, 0.0, 1.0);
        let (p, _) = sample_particles(&solid_mask(10, 10), vp, &cfg, &palette, &mut rng);
        assert!(p.is_empty());
    }

    #[test]
    fn mobile_tier_uses_coarser_stride() {
        let cfg = SamplingConfig::default();
        let mask = AlphaMask::from_raw(60, 60, 2.0, vec![255; 3600]).unwrap();
        let mut rng = SmallRng::seed_from_u64(3);
        let vp = Viewport::new(390.0, 844.0, 2.0);
        let (_, stats) = sample_particles(&mask, vp, &cfg, &[Rgb::new(0, 0, 0)], &mut rng);
        assert_eq!(stats.tier, Tier::Mobile);
        assert_eq!(stats.stride, 12);
        assert_eq!(stats.cap, cfg.cap_mobile);
    }
}
