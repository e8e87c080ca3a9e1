//! Tunables for the hero headline.
//!
//! Every section deserialises with defaults, so a page can override a single
//! value through the canvas's `data-hero-config` attribute.

use serde::{Deserialize, Serialize};

use crate::error::{HeroError, Result};
use crate::geometry::Rgb;

/// Closed `[min, max]` range for randomised per-particle attributes.
pub type Range = [f32; 2];

// ============================================================================
// Sampling
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Minimum mask alpha (0-255) for a pixel to seed a particle
    pub alpha_threshold: u8,
    /// Grid stride in CSS pixels
    pub stride_desktop: f32,
    pub stride_mobile: f32,
    /// Particle caps after fixed-stride down-sampling
    pub cap_desktop: usize,
    pub cap_mobile: usize,
    /// Viewports narrower than this use the mobile tier
    pub mobile_breakpoint: f32,
    /// Rasterised font size as a fraction of the measured glyph box height
    pub font_scale: f32,
    /// Pre-intro offset as a fraction of the viewport, per axis
    pub start_spread: [f32; 2],
    pub start_z: Range,
    /// Explode offset as a fraction of the viewport, per axis
    pub scatter_spread: [f32; 2],
    pub scatter_jitter: f32,
    pub scatter_z: Range,
    pub size: Range,
    pub base_alpha: Range,
    pub drift_amp_xy: Range,
    pub drift_amp_z: Range,
    /// Radians per second
    pub drift_freq: Range,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            alpha_threshold: 35,
            stride_desktop: 4.0,
            stride_mobile: 6.0,
            cap_desktop: 2600,
            cap_mobile: 1800,
            mobile_breakpoint: 768.0,
            font_scale: 0.92,
            start_spread: [0.55, 0.55],
            start_z: [-600.0, 400.0],
            scatter_spread: [0.6, 0.5],
            scatter_jitter: 60.0,
            scatter_z: [-900.0, 500.0],
            size: [0.9, 2.1],
            base_alpha: [0.55, 1.0],
            drift_amp_xy: [2.0, 9.0],
            drift_amp_z: [6.0, 24.0],
            drift_freq: [0.35, 1.1],
        }
    }
}

// ============================================================================
// Simulation
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// `explode = min(1, scatter * explode_factor)`
    pub explode_factor: f32,
    /// Drift scales with `scatter.powf(drift_exponent)`
    pub drift_exponent: f32,
    pub focal_length: f32,
    /// Lower bound on `focal_length - z` in the perspective divide
    pub min_depth: f32,
    /// Global fade: `1 - smoothstep(fade_start, 1, scatter) * fade_amount`
    pub fade_start: f32,
    pub fade_amount: f32,
    /// Sprites below this alpha are not drawn
    pub visibility_floor: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            explode_factor: 1.55,
            drift_exponent: 1.2,
            focal_length: 800.0,
            min_depth: 120.0,
            fade_start: 0.55,
            fade_amount: 0.7,
            visibility_floor: 0.02,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RippleConfig {
    pub band_width: f32,
    pub push: f32,
    pub lift: f32,
    /// Fraction of ripple progress spent fading in
    pub fade_in: f32,
    /// Fraction of ripple progress spent fading out
    pub fade_out: f32,
    pub alpha_boost: f32,
    /// Starting band radius as a fraction of the viewport diagonal
    pub max_radius: f32,
}

impl Default for RippleConfig {
    fn default() -> Self {
        Self {
            band_width: 110.0,
            push: 26.0,
            lift: 70.0,
            fade_in: 0.10,
            fade_out: 0.18,
            alpha_boost: 0.45,
            max_radius: 0.75,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerConfig {
    pub radius: f32,
    pub strength: f32,
    /// Radians per second added to each particle's swirl phase
    pub swirl_speed: f32,
    /// First-order lag factor applied every frame
    pub lag: f32,
    /// Swirl only while `scatter` is below this
    pub max_scatter: f32,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            radius: 150.0,
            strength: 12.0,
            swirl_speed: 1.6,
            lag: 0.18,
            max_scatter: 0.18,
        }
    }
}

// ============================================================================
// Anchors
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorSlotConfig {
    pub name: String,
    /// Score is `weight_x * home.x + weight_y * home.y`
    pub weight_x: f32,
    pub weight_y: f32,
    pub lock_start: f32,
    pub lock_span: f32,
    /// Overrides the particle's colour once bound
    pub color: Option<Rgb>,
}

impl Default for AnchorSlotConfig {
    fn default() -> Self {
        Self {
            name: "trailing".to_string(),
            weight_x: 1.6,
            weight_y: 1.0,
            lock_start: 0.64,
            lock_span: 0.30,
            color: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorConfig {
    pub enabled: bool,
    pub slots: Vec<AnchorSlotConfig>,
    /// Dot centre sits this fraction of the target's height above its bottom
    pub baseline_offset: f32,
    /// Dot radius as a fraction of the target's height
    pub radius_ratio: f32,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            slots: vec![
                AnchorSlotConfig::default(),
                AnchorSlotConfig {
                    name: "competing".to_string(),
                    weight_x: 1.2,
                    weight_y: -1.0,
                    lock_start: 0.72,
                    lock_span: 0.24,
                    color: None,
                },
            ],
            baseline_offset: 0.24,
            radius_ratio: 0.11,
        }
    }
}

// ============================================================================
// Scroll
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    pub wheel_max_step: f64,
    pub wheel_lag: f64,
    /// Glide stops once within this many pixels of its target
    pub wheel_epsilon: f64,
    pub lock_tolerance: f64,
    /// Seconds for a scripted auto-scroll
    pub auto_duration: f64,
    pub settle_tolerance: f64,
    /// Seconds past `auto_duration` before a stalled auto-scroll is released
    pub settle_timeout: f64,
    /// Footer content reveals once the auto-scroll is this close
    pub footer_reveal_distance: f64,
    /// Footer transition arms this fraction of a viewport above the footer
    pub footer_trigger: f64,
    /// Per-frame approach factor for desktop scrubbing of `scatter`
    pub scrub_lag: f32,
    /// Mobile: `scatter = scroll_y / (hero_height * mobile_scatter_span)`
    pub mobile_scatter_span: f32,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            wheel_max_step: 120.0,
            wheel_lag: 0.18,
            wheel_epsilon: 0.5,
            lock_tolerance: 0.5,
            auto_duration: 1.1,
            settle_tolerance: 2.0,
            settle_timeout: 2.5,
            footer_reveal_distance: 140.0,
            footer_trigger: 0.5,
            scrub_lag: 0.12,
            mobile_scatter_span: 0.9,
        }
    }
}

// ============================================================================
// Timeline
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub letters_duration: f64,
    pub intro_duration: f64,
    pub ripple_offset: f64,
    pub ripple_duration: f64,
    /// Delay between the ripple ending and the auto-scroll to content
    pub auto_scroll_delay: f64,
    /// Flat delay before the auto-scroll when reduced motion is requested
    pub reduced_motion_delay: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            letters_duration: 0.6,
            intro_duration: 1.4,
            ripple_offset: 0.08,
            ripple_duration: 1.0,
            auto_scroll_delay: 0.5,
            reduced_motion_delay: 0.9,
        }
    }
}

// ============================================================================
// Root
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroConfig {
    pub sampling: SamplingConfig,
    pub motion: MotionConfig,
    pub ripple: RippleConfig,
    pub pointer: PointerConfig,
    pub anchors: AnchorConfig,
    pub scroll: ScrollConfig,
    pub timeline: TimelineConfig,
    pub palette: Vec<Rgb>,
}

impl Default for HeroConfig {
    fn default() -> Self {
        Self {
            sampling: SamplingConfig::default(),
            motion: MotionConfig::default(),
            ripple: RippleConfig::default(),
            pointer: PointerConfig::default(),
            anchors: AnchorConfig::default(),
            scroll: ScrollConfig::default(),
            timeline: TimelineConfig::default(),
            palette: vec![Rgb::new(0x00, 0x47, 0xFF), Rgb::new(0xF2, 0xF4, 0xFF)],
        }
    }
}

impl HeroConfig {
    /// Parse a (possibly partial) JSON override and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: HeroConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let s = &self.sampling;
        if s.stride_desktop <= 0.0 || s.stride_mobile <= 0.0 {
            return Err(HeroError::InvalidConfig("sampling stride must be positive".into()));
        }
        if s.cap_desktop == 0 || s.cap_mobile == 0 {
            return Err(HeroError::InvalidConfig("particle caps must be non-zero".into()));
        }
        let ranges = [
            ("start_z", s.start_z),
            ("scatter_z", s.scatter_z),
            ("size", s.size),
            ("base_alpha", s.base_alpha),
            ("drift_amp_xy", s.drift_amp_xy),
            ("drift_amp_z", s.drift_amp_z),
            ("drift_freq", s.drift_freq),
        ];
        if let Some((name, _)) = ranges.iter().find(|(_, r)| r[0] > r[1]) {
            return Err(HeroError::InvalidConfig(format!("range {name} is inverted")));
        }
        if self.motion.focal_length <= 0.0 || self.motion.min_depth <= 0.0 {
            return Err(HeroError::InvalidConfig(
                "projection needs positive focal length and depth clamp".into(),
            ));
        }
        if self.anchors.slots.len() > 2 {
            return Err(HeroError::InvalidConfig("at most two anchor slots are supported".into()));
        }
        if self.palette.is_empty() {
            return Err(HeroError::InvalidConfig("palette is empty".into()));
        }
        if !(0.0..=1.0).contains(&self.scroll.wheel_lag)
            || !(0.0..=1.0).contains(&self.pointer.lag)
        {
            return Err(HeroError::InvalidConfig("lag factors must lie in [0, 1]".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(HeroConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config = HeroConfig::from_json(r#"{"sampling": {"cap_mobile": 1400}}"#).unwrap();
        assert_eq!(config.sampling.cap_mobile, 1400);
        assert_eq!(config.sampling.cap_desktop, 2600);
        assert_eq!(config.anchors.slots.len(), 2);
    }

    #[test]
    fn rejects_three_anchor_slots() {
        let mut config = HeroConfig::default();
        config.anchors.slots.push(AnchorSlotConfig::default());
        assert!(matches!(config.validate(), Err(HeroError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(HeroConfig::from_json("{"), Err(HeroError::Config(_))));
    }
}
