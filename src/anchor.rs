//! Anchor binding: a few headline particles leave the dispersal pattern and
//! settle onto a decorative dot elsewhere on the page.
//!
//! Selection runs once per build and is reproducible for identical geometry.
//! Only the target position is refreshed afterwards (resize, scroll, fonts).

use crate::config::{AnchorConfig, AnchorSlotConfig};
use crate::geometry::{smoothstep, Rect};
use crate::sampler::Particle;

/// Live screen position and radius of the dot a bound particle becomes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnchorTarget {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

impl AnchorTarget {
    /// Locate the dot of a punctuation glyph from its measured box.
    ///
    /// The dot sits on the baseline, so its centre is lifted from the box
    /// bottom rather than taken from the box centre.
    pub fn from_glyph_rect(rect: Rect, cfg: &AnchorConfig) -> Option<Self> {
        if rect.is_empty() {
            return None;
        }
        Some(Self {
            x: rect.x + rect.width * 0.5,
            y: rect.bottom() - rect.height * cfg.baseline_offset,
            radius: (rect.height * cfg.radius_ratio).max(0.5),
        })
    }
}

/// Per-particle lock state written by [`AnchorBinder::refresh`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnchorLock {
    pub slot: usize,
    pub target: AnchorTarget,
    pub lock_start: f32,
    pub lock_span: f32,
}

impl AnchorLock {
    pub fn mix(&self, scatter: f32) -> f32 {
        lock_mix(scatter, self.lock_start, self.lock_span)
    }
}

/// 0 below `start`, 1 above `start + span`, smoothstep in between.
pub fn lock_mix(scatter: f32, start: f32, span: f32) -> f32 {
    smoothstep(start, start + span, scatter)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Binding {
    pub slot: usize,
    pub particle: usize,
}

#[derive(Clone, Debug, Default)]
pub struct AnchorBinder {
    slots: Vec<AnchorSlotConfig>,
    bindings: Vec<Binding>,
}

fn score(slot: &AnchorSlotConfig, p: &Particle) -> f32 {
    slot.weight_x * p.home.x + slot.weight_y * p.home.y
}

/// Highest-scoring particle not in `taken`; ties keep the lower index.
fn best_particle(
    particles: &[Particle],
    slot: &AnchorSlotConfig,
    taken: &[usize],
) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, p) in particles.iter().enumerate() {
        if taken.contains(&i) {
            continue;
        }
        let s = score(slot, p);
        match best {
            Some((_, b)) if s <= b => {}
            _ => best = Some((i, s)),
        }
    }
    best.map(|(i, _)| i)
}

impl AnchorBinder {
    pub fn new(slots: Vec<AnchorSlotConfig>) -> Self {
        Self {
            slots,
            bindings: Vec::new(),
        }
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Choose one particle per slot. Earlier slots win collisions; a later
    /// slot that would pick an already-taken particle re-scans without it.
    pub fn bind(&mut self, particles: &mut [Particle], enabled: bool) -> &[Binding] {
        self.bindings.clear();
        if !enabled {
            return &self.bindings;
        }
        let mut taken = Vec::with_capacity(self.slots.len());
        for (slot_idx, slot) in self.slots.iter().enumerate() {
            let Some(idx) = best_particle(particles, slot, &taken) else {
                break;
            };
            taken.push(idx);
            if let Some(color) = slot.color {
                particles[idx].color = color;
            }
            log::debug!("anchor slot '{}' bound to particle {}", slot.name, idx);
            self.bindings.push(Binding {
                slot: slot_idx,
                particle: idx,
            });
        }
        &self.bindings
    }

    /// Push freshly measured targets into the bound particles.
    ///
    /// `targets` is indexed by slot. A missing target releases the lock
    /// until the next refresh finds it again.
    pub fn refresh(&self, particles: &mut [Particle], targets: &[Option<AnchorTarget>]) {
        for binding in &self.bindings {
            let Some(particle) = particles.get_mut(binding.particle) else {
                continue;
            };
            let slot = &self.slots[binding.slot];
            particle.anchor = targets
                .get(binding.slot)
                .copied()
                .flatten()
                .map(|target| AnchorLock {
                    slot: binding.slot,
                    target,
                    lock_start: slot.lock_start,
                    lock_span: slot.lock_span,
                });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Point3, Rgb};

    fn particle_at(x: f32, y: f32) -> Particle {
        Particle::at_rest(Point::new(x, y), Rgb::new(255, 255, 255))
    }

    fn slots() -> Vec<AnchorSlotConfig> {
        AnchorConfig::default().slots
    }

    #[test]
    fn lock_mix_window() {
        assert_eq!(lock_mix(0.64, 0.64, 0.3), 0.0);
        assert_eq!(lock_mix(0.5, 0.64, 0.3), 0.0);
        assert!((lock_mix(0.79, 0.64, 0.3) - 0.5).abs() < 1e-5);
        assert_eq!(lock_mix(0.94, 0.64, 0.3), 1.0);
        assert_eq!(lock_mix(1.0, 0.64, 0.3), 1.0);
    }

    #[test]
    fn picks_max_score_per_slot() {
        let mut particles = vec![
            particle_at(10.0, 10.0),
            particle_at(100.0, 90.0), // 1.6x + y = 250
            particle_at(95.0, 0.0),   // 1.2x - y = 114
            particle_at(50.0, 50.0),
        ];
        let mut binder = AnchorBinder::new(slots());
        let bindings = binder.bind(&mut particles, true).to_vec();
        assert_eq!(
            bindings,
            vec![
                Binding { slot: 0, particle: 1 },
                Binding { slot: 1, particle: 2 },
            ]
        );
    }

    #[test]
    fn colliding_slot_rescans() {
        // Particle 0 maximises both scores.
        let mut particles = vec![
            particle_at(200.0, 0.0),
            particle_at(10.0, 5.0),
            particle_at(0.0, 0.0),
        ];
        let mut binder = AnchorBinder::new(slots());
        let bindings = binder.bind(&mut particles, true).to_vec();
        assert_eq!(bindings[0].particle, 0);
        assert_eq!(bindings[1].particle, 1);
    }

    #[test]
    fn disabled_or_empty_binds_nothing() {
        let mut particles = vec![particle_at(1.0, 1.0)];
        let mut binder = AnchorBinder::new(slots());
        assert!(binder.bind(&mut particles, false).is_empty());
        assert!(binder.bind(&mut [], true).is_empty());
        // A single particle fills only the first slot.
        assert_eq!(binder.bind(&mut particles, true).len(), 1);
    }

    #[test]
    fn refresh_updates_target_without_reselecting() {
        let mut particles = vec![particle_at(0.0, 0.0), particle_at(300.0, 300.0)];
        let mut binder = AnchorBinder::new(slots());
        binder.bind(&mut particles, true);

        let t1 = AnchorTarget { x: 500.0, y: 1200.0, radius: 4.0 };
        binder.refresh(&mut particles, &[Some(t1), None]);
        assert_eq!(particles[1].anchor.map(|a| a.target), Some(t1));
        assert_eq!(particles[0].anchor, None);

        let t2 = AnchorTarget { x: 480.0, y: 900.0, radius: 4.0 };
        binder.refresh(&mut particles, &[Some(t2), None]);
        assert_eq!(binder.bindings()[0].particle, 1);
        assert_eq!(particles[1].anchor.map(|a| a.target), Some(t2));
        assert_eq!(particles[1].scatter, Point3::new(300.0, 300.0, 0.0));
    }

    #[test]
    fn dot_target_sits_above_baseline() {
        let cfg = AnchorConfig::default();
        let t = AnchorTarget::from_glyph_rect(Rect::new(100.0, 200.0, 20.0, 50.0), &cfg).unwrap();
        assert_eq!(t.x, 110.0);
        assert!((t.y - 238.0).abs() < 1e-4);
        assert!((t.radius - 5.5).abs() < 1e-4);
        assert!(AnchorTarget::from_glyph_rect(Rect::default(), &cfg).is_none());
    }
}
