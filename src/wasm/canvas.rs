//! Canvas 2D bindings: the on-screen particle surface and the off-screen
//! glyph rasterizer.

use std::f64::consts::TAU;

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement};

use crate::error::{HeroError, Result};
use crate::geometry::{Rgb, Viewport};
use crate::raster::{mask_dimensions, AlphaMask, GlyphBox, GlyphRasterizer};
use crate::surface::Surface;

fn context_2d(
    canvas: &HtmlCanvasElement,
    options: Option<&js_sys::Object>,
) -> Result<CanvasRenderingContext2d> {
    let ctx = match options {
        Some(opts) => canvas.get_context_with_context_options("2d", opts)?,
        None => canvas.get_context("2d")?,
    };
    ctx.ok_or_else(|| HeroError::ContextUnavailable("2d".into()))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| HeroError::ContextUnavailable("2d".into()))
}

/// Fixed full-viewport canvas the field draws into, in CSS pixels.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    viewport: Viewport,
    fill: Option<Rgb>,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self> {
        let ctx = context_2d(&canvas, None)?;
        Ok(Self {
            canvas,
            ctx,
            viewport: Viewport::new(0.0, 0.0, 1.0),
            fill: None,
        })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Size the backing store to `viewport × dpr` and scale the context so
    /// drawing stays in CSS pixels.
    pub fn resize(&mut self, viewport: Viewport) -> Result<()> {
        let (w, h) =
            mask_dimensions(viewport.width, viewport.height, viewport.dpr).unwrap_or((0, 0));
        self.canvas.set_width(w);
        self.canvas.set_height(h);
        let style = self.canvas.style();
        style.set_property("width", &format!("{}px", viewport.width))?;
        style.set_property("height", &format!("{}px", viewport.height))?;
        let dpr = f64::from(viewport.dpr);
        self.ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)?;
        self.viewport = viewport;
        self.fill = None;
        log::debug!("canvas resized to {w}x{h} @{dpr}x");
        Ok(())
    }
}

impl Surface for CanvasSurface {
    fn size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    fn clear(&mut self) {
        self.ctx.set_global_alpha(1.0);
        self.ctx.clear_rect(
            0.0,
            0.0,
            f64::from(self.viewport.width),
            f64::from(self.viewport.height),
        );
    }

    fn fill_circle(&mut self, x: f32, y: f32, radius: f32, color: Rgb, alpha: f32) {
        if self.fill != Some(color) {
            self.ctx.set_fill_style_str(&color.css());
            self.fill = Some(color);
        }
        self.ctx.set_global_alpha(f64::from(alpha));
        self.ctx.begin_path();
        if self
            .ctx
            .arc(f64::from(x), f64::from(y), f64::from(radius.max(0.1)), 0.0, TAU)
            .is_ok()
        {
            self.ctx.fill();
        }
    }
}

/// Font of the headline as computed by the page.
#[derive(Clone, Debug)]
pub struct FontSpec {
    pub family: String,
    pub weight: String,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "sans-serif".into(),
            weight: "700".into(),
        }
    }
}

/// Draws each glyph with `fill_text` into a detached canvas and reads the
/// alpha channel back.
pub struct CanvasRasterizer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    font: FontSpec,
    font_scale: f32,
}

impl CanvasRasterizer {
    pub fn new(document: &Document, font: FontSpec, font_scale: f32) -> Result<Self> {
        let canvas = document
            .create_element("canvas")?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| HeroError::ContextUnavailable("offscreen canvas".into()))?;
        let opts = js_sys::Object::new();
        js_sys::Reflect::set(&opts, &"willReadFrequently".into(), &true.into())?;
        let ctx = context_2d(&canvas, Some(&opts))?;
        Ok(Self {
            canvas,
            ctx,
            font,
            font_scale,
        })
    }

    pub fn set_font(&mut self, font: FontSpec) {
        self.font = font;
    }
}

impl GlyphRasterizer for CanvasRasterizer {
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
        // Resizing also resets the context state.
        self.canvas.set_width(w);
        self.canvas.set_height(h);
        let ctx = &self.ctx;
        ctx.set_fill_style_str("#fff");
        ctx.set_text_align("center");
        ctx.set_text_baseline("middle");

        for glyph in glyphs.iter().filter(|g| !g.is_blank()) {
            let px = glyph.rect.height * self.font_scale * dpr;
            ctx.set_font(&format!("{} {px:.1}px {}", self.font.weight, self.font.family));
            let c = glyph.rect.center();
            ctx.fill_text(
                glyph.ch.encode_utf8(&mut [0; 4]),
                f64::from(c.x * dpr),
                f64::from(c.y * dpr),
            )?;
        }

        let image = ctx.get_image_data(0.0, 0.0, f64::from(w), f64::from(h))?;
        AlphaMask::from_rgba(w, h, dpr, &image.data())
    }
}
