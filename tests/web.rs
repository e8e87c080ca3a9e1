#![cfg(target_arch = "wasm32")]

use drifft_hero::geometry::{Rect, Rgb, Viewport};
use drifft_hero::raster::{GlyphBox, GlyphRasterizer};
use drifft_hero::surface::Surface;
use drifft_hero::{CanvasRasterizer, CanvasSurface, FontSpec};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn attached_canvas() -> web_sys::HtmlCanvasElement {
    let document = web_sys::window().unwrap().document().unwrap();
    let canvas = document
        .create_element("canvas")
        .unwrap()
        .dyn_into::<web_sys::HtmlCanvasElement>()
        .unwrap();
    document.body().unwrap().append_child(&canvas).unwrap();
    canvas
}

#[wasm_bindgen_test]
fn surface_backing_store_is_scaled_by_dpr() {
    let canvas = attached_canvas();
    canvas.set_width(0);
    let mut surface = CanvasSurface::new(canvas.clone()).unwrap();
    assert!(!surface.is_drawable());

    surface.resize(Viewport::new(320.0, 200.0, 2.0)).unwrap();
    assert_eq!(surface.size(), (640, 400));
    assert!(surface.is_drawable());

    let rect = canvas.get_bounding_client_rect();
    assert_eq!((rect.width(), rect.height()), (320.0, 200.0));

    surface.clear();
    surface.fill_circle(10.0, 10.0, 3.0, Rgb::new(0, 71, 255), 0.8);
}

#[wasm_bindgen_test]
fn canvas_rasterizer_fills_glyph_box() {
    let document = web_sys::window().unwrap().document().unwrap();
    let mut rasterizer = CanvasRasterizer::new(&document, FontSpec::default(), 0.92).unwrap();
    let glyphs = [GlyphBox::new('H', Rect::new(20.0, 20.0, 80.0, 100.0))];

    let mask = rasterizer.rasterize(&glyphs, 200.0, 150.0, 1.0).unwrap();
    assert_eq!((mask.width, mask.height), (200, 150));
    assert!(mask.coverage(35) > 100);
    assert_eq!(mask.alpha(2, 2), 0);
    assert_eq!(mask.alpha(190, 140), 0);
}

#[wasm_bindgen_test]
fn canvas_rasterizer_degenerate_viewport() {
    let document = web_sys::window().unwrap().document().unwrap();
    let mut rasterizer = CanvasRasterizer::new(&document, FontSpec::default(), 0.92).unwrap();
    let glyphs = [GlyphBox::new('H', Rect::new(0.0, 0.0, 10.0, 10.0))];
    let mask = rasterizer.rasterize(&glyphs, 0.0, 150.0, 1.0).unwrap();
    assert!(mask.is_empty());
}
