#![cfg_attr(target_arch = "wasm32", allow(dead_code))]

//! Particle headline: the hero title is sampled into particles that form,
//! ripple, swirl under the pointer and scatter with scroll, while a small
//! choreographer drives the page's scroll through the intro.
//!
//! Everything but the browser bindings builds and tests on the host; those
//! only compile for `wasm32`.

pub mod anchor;
pub mod config;
pub mod director;
pub mod error;
pub mod field;
pub mod geometry;
pub mod raster;
pub mod sampler;
pub mod scheduler;
pub mod scroll;
pub mod sequence;
pub mod surface;
pub mod timeline;

pub use config::HeroConfig;
pub use director::{Environment, HeroDirector, PageEffects, PageLayout};
pub use error::{HeroError, Result};

// Only compile wasm-specific code when targeting wasm32.

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::cell::RefCell;

    use wasm_bindgen::prelude::*;

    mod app;
    pub(crate) mod canvas;
    mod dom;
    mod render;

    pub use canvas::{CanvasRasterizer, CanvasSurface, FontSpec};

    thread_local! {
        static APP: RefCell<Option<app::HeroApp>> = const { RefCell::new(None) };
    }

    #[wasm_bindgen(start)]
    pub fn main() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).ok();

        // A page without the hero markup simply gets no particles.
        match app::HeroApp::mount() {
            Ok(app) => APP.with(|slot| *slot.borrow_mut() = Some(app)),
            Err(err) => log::warn!("hero not mounted: {err}"),
        }
        Ok(())
    }

    /// Stop the frame loop and detach every listener.
    #[wasm_bindgen(js_name = destroyHero)]
    pub fn destroy_hero() {
        APP.with(|slot| slot.borrow_mut().take());
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm::{CanvasRasterizer, CanvasSurface, FontSpec};

// When compiling for non-wasm targets (e.g., `cargo test` on host),
// provide an empty stub so the crate still builds.
#[cfg(not(target_arch = "wasm32"))]
pub fn main() {}
