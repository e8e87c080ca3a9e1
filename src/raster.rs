//! Glyph rasterisation into an alpha mask.
//!
//! The browser build draws the real headline font into an off-screen canvas
//! (`wasm::canvas::CanvasRasterizer`); [`BoxRasterizer`] is a font-free stand-in
//! for headless runs and tests.

use crate::error::{HeroError, Result};
use crate::geometry::Rect;

/// One measured glyph of the headline, in CSS pixels relative to the canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphBox {
    pub ch: char,
    pub rect: Rect,
}

impl GlyphBox {
    pub fn new(ch: char, rect: Rect) -> Self {
        Self { ch, rect }
    }

    pub fn is_blank(&self) -> bool {
        self.ch.is_whitespace() || self.rect.is_empty()
    }
}

/// Row-major 8-bit coverage at device resolution.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AlphaMask {
    pub width: u32,
    pub height: u32,
    /// Device pixels per CSS pixel
    pub scale: f32,
    data: Vec<u8>,
}

impl AlphaMask {
    pub fn empty(scale: f32) -> Self {
        Self {
            width: 0,
            height: 0,
            scale,
            data: Vec::new(),
        }
    }

    pub fn from_raw(width: u32, height: u32, scale: f32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(HeroError::MaskSize {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            scale,
            data,
        })
    }

    /// Keep only the alpha channel of an RGBA buffer.
    pub fn from_rgba(width: u32, height: u32, scale: f32, rgba: &[u8]) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(HeroError::MaskSize {
                width,
                height,
                expected,
                actual: rgba.len(),
            });
        }
        let data = rgba.chunks_exact(4).map(|px| px[3]).collect();
        Ok(Self {
            width,
            height,
            scale,
            data,
        })
    }

    pub fn alpha(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.data[(y * self.width + x) as usize]
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.iter().all(|&a| a == 0)
    }

    /// Number of pixels whose alpha exceeds `threshold`.
    pub fn coverage(&self, threshold: u8) -> usize {
        self.data.iter().filter(|&&a| a > threshold).count()
    }
}

/// Renders headline glyphs into an [`AlphaMask`].
pub trait GlyphRasterizer {
    /// `width`/`height` are the canvas size in CSS pixels; the mask is
    /// produced at `width * dpr` by `height * dpr`.
    fn rasterize(
        &mut self,
        glyphs: &[GlyphBox],
        width: f32,
        height: f32,
        dpr: f32,
    ) -> Result<AlphaMask>;
}

/// Device-resolution mask dimensions, `None` for a degenerate viewport.
pub fn mask_dimensions(width: f32, height: f32, dpr: f32) -> Option<(u32, u32)> {
    let w = (width * dpr).round();
    let h = (height * dpr).round();
    if !(w >= 1.0 && h >= 1.0) {
        return None;
    }
    Some((w as u32, h as u32))
}

/// Draws every non-blank glyph as an antialiased rectangular outline.
#[derive(Clone, Debug)]
pub struct BoxRasterizer {
    /// Outline thickness as a fraction of the glyph box height
    pub stroke: f32,
}

impl Default for BoxRasterizer {
    fn default() -> Self {
        Self { stroke: 0.18 }
    }
}

/// Signed distance from `(px, py)` to an axis-aligned box; negative inside.
fn box_distance(px: f32, py: f32, rect: &Rect) -> f32 {
    let c = rect.center();
    let dx = (px - c.x).abs() - rect.width * 0.5;
    let dy = (py - c.y).abs() - rect.height * 0.5;
    let outside = dx.max(0.0).hypot(dy.max(0.0));
    let inside = dx.max(dy).min(0.0);
    outside + inside
}

impl GlyphRasterizer for BoxRasterizer {
    fn rasterize(
        &mut self,
        glyphs: &[GlyphBox],
        width: f32,
        height: f32,
        dpr: f32,
    ) -> Result<AlphaMask> {
        let Some((w, h)) = mask_dimensions(width, height, dpr) else {
            return Ok(AlphaMask::empty(dpr));
        };
        let mut data = vec![0u8; w as usize * h as usize];

        for glyph in glyphs.iter().filter(|g| !g.is_blank()) {
            let outer = Rect::new(
                glyph.rect.x * dpr,
                glyph.rect.y * dpr,
                glyph.rect.width * dpr,
                glyph.rect.height * dpr,
            );
            let t = (glyph.rect.height * self.stroke * dpr).max(1.0);
            let inner = Rect::new(
                outer.x + t,
                outer.y + t,
                outer.width - 2.0 * t,
                outer.height - 2.0 * t,
            );

            let x0 = outer.x.floor().max(0.0) as u32;
            let y0 = outer.y.floor().max(0.0) as u32;
            let x1 = (outer.right().ceil() as u32).min(w);
            let y1 = (outer.bottom().ceil() as u32).min(h);
            for y in y0..y1 {
                for x in x0..x1 {
                    let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
                    let mut cov = (0.5 - box_distance(px, py, &outer)).clamp(0.0, 1.0);
                    if !inner.is_empty() {
                        cov *= (0.5 + box_distance(px, py, &inner)).clamp(0.0, 1.0);
                    }
                    let idx = (y * w + x) as usize;
                    data[idx] = data[idx].max((cov * 255.0).round() as u8);
                }
            }
        }

        AlphaMask::from_raw(w, h, dpr, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_viewport_gives_empty_mask() {
        let glyphs = [GlyphBox::new('A', Rect::new(0.0, 0.0, 10.0, 10.0))];
        let mask = BoxRasterizer::default().rasterize(&glyphs, 0.0, 300.0, 2.0).unwrap();
        assert!(mask.is_empty());
        assert_eq!(mask.coverage(0), 0);
    }

    #[test]
    fn outline_has_hollow_centre_and_soft_edges() {
        let glyphs = [GlyphBox::new('O', Rect::new(10.0, 10.0, 40.0, 40.0))];
        let mask = BoxRasterizer::default().rasterize(&glyphs, 64.0, 64.0, 1.0).unwrap();
        assert_eq!(mask.alpha(30, 30), 0);
        assert_eq!(mask.alpha(12, 30), 255);
        assert_eq!(mask.alpha(2, 2), 0);
        assert!(mask.coverage(35) > 0);
    }

    #[test]
    fn whitespace_glyphs_are_skipped() {
        let glyphs = [GlyphBox::new(' ', Rect::new(0.0, 0.0, 20.0, 20.0))];
        let mask = BoxRasterizer::default().rasterize(&glyphs, 32.0, 32.0, 1.0).unwrap();
        assert!(mask.is_empty());
    }

    #[test]
    fn rgba_keeps_alpha_channel() {
        let mask = AlphaMask::from_rgba(2, 1, 1.0, &[0, 0, 0, 10, 255, 255, 255, 200]).unwrap();
        assert_eq!(mask.alpha(0, 0), 10);
        assert_eq!(mask.alpha(1, 0), 200);
        assert!(AlphaMask::from_rgba(2, 1, 1.0, &[0; 7]).is_err());
    }
}
