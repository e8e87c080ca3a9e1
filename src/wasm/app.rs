//! Browser wiring: owns the director, the page collaborators, the frame loop
//! and every event listener. Dropping [`HeroApp`] detaches all of them.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use wasm_bindgen::{closure::Closure, JsCast};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{
    AddEventListenerOptions, Document, Element, Event, EventTarget, HtmlCanvasElement,
    HtmlElement, KeyboardEvent, PointerEvent, WheelEvent, Window,
};

use super::canvas::{CanvasRasterizer, CanvasSurface};
use super::dom::{self, DomEffects, WindowScroller};
use super::render::AnimationFrameLoop;
use crate::config::HeroConfig;
use crate::director::HeroDirector;
use crate::error::Result;
use crate::geometry::Point;
use crate::scheduler::FrameScheduler;
use crate::scroll::{Scroller, WheelOutcome};

const CANVAS: &str = "#hero-particles";
const HEADLINE: &str = "[data-hero-headline]";
const HERO: &str = "[data-hero]";
const CONTENT: &str = "[data-hero-content]";
const FOOTER: &str = "footer";

/// Keys the browser turns into scrolling.
const SCROLL_KEYS: [&str; 7] = ["ArrowDown", "ArrowUp", "PageDown", "PageUp", "Home", "End", " "];

struct Page {
    window: Window,
    document: Document,
    heading: Element,
    director: HeroDirector,
    scroller: WindowScroller,
    effects: DomEffects,
    surface: Option<CanvasSurface>,
    rasterizer: Option<CanvasRasterizer>,
    content: Option<Element>,
    footer: Option<Element>,
    hero: Element,
}

impl Page {
    fn canvas_origin(&self) -> Point {
        self.surface.as_ref().map_or(Point::ZERO, |s| {
            let r = s.canvas().get_bounding_client_rect();
            Point::new(r.x() as f32, r.y() as f32)
        })
    }

    /// Re-measure everything and resample the headline.
    fn remeasure(&mut self) -> Result<()> {
        let caps = self.director.environment().capabilities;
        let env = dom::environment(&self.window, caps.canvas_2d, caps.timeline);
        if let Some(surface) = self.surface.as_mut() {
            surface.resize(env.viewport)?;
        }
        // Homes are laid out as the headline sits at scroll 0.
        let canvas = self.canvas_origin();
        let origin = Point::new(canvas.x, canvas.y - self.scroller.scroll_y() as f32);
        match self.rasterizer.as_mut() {
            Some(rasterizer) => {
                rasterizer.set_font(dom::font_spec(&self.window, &self.heading));
                let glyphs = dom::glyph_boxes(&self.document, &self.heading, origin)?;
                self.director.rebuild(env, rasterizer, &glyphs)?;
            }
            None => self.director.set_environment(env),
        }
        self.director.set_layout(dom::page_layout(
            &self.window,
            &self.hero,
            self.content.as_ref(),
            self.footer.as_ref(),
        ));
        self.refresh_anchors()
    }

    fn refresh_anchors(&mut self) -> Result<()> {
        if self.director.field().bindings().is_empty() {
            return Ok(());
        }
        let origin = self.canvas_origin();
        let rects = dom::anchor_rects(&self.document, &self.director.config().anchors, origin)?;
        let targets = self.director.anchor_targets(&rects);
        self.director.refresh_anchors(&targets);
        Ok(())
    }
}

struct Shared {
    page: RefCell<Page>,
    scheduler: RefCell<FrameScheduler<Page>>,
    frames: RefCell<Option<AnimationFrameLoop>>,
}

/// An attached DOM listener, removed on drop.
struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn attach(
        target: &EventTarget,
        event: &'static str,
        passive: bool,
        f: impl FnMut(Event) + 'static,
    ) -> Result<Self> {
        let callback = Closure::wrap(Box::new(f) as Box<dyn FnMut(Event)>);
        let opts = AddEventListenerOptions::new();
        opts.set_passive(passive);
        target.add_event_listener_with_callback_and_add_event_listener_options(
            event,
            callback.as_ref().unchecked_ref(),
            &opts,
        )?;
        Ok(Self {
            target: target.clone(),
            event,
            callback,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self.target.remove_event_listener_with_callback(
            self.event,
            self.callback.as_ref().unchecked_ref(),
        );
    }
}

fn load_config(canvas: &HtmlCanvasElement) -> HeroConfig {
    let Some(json) = canvas.get_attribute("data-hero-config") else {
        return HeroConfig::default();
    };
    match HeroConfig::from_json(&json) {
        Ok(cfg) => cfg,
        Err(err) => {
            log::warn!("ignoring data-hero-config: {err}");
            HeroConfig::default()
        }
    }
}

/// Run `f` on the page unless it is already borrowed (re-entrant dispatch).
fn with_page(shared: &Weak<Shared>, f: impl FnOnce(&mut Page)) {
    let Some(shared) = shared.upgrade() else {
        return;
    };
    let Ok(mut page) = shared.page.try_borrow_mut() else {
        return;
    };
    f(&mut page);
}

fn start_loop(shared: &Rc<Shared>) -> Result<()> {
    shared.scheduler.borrow_mut().start();
    let weak = Rc::downgrade(shared);
    let window = shared.page.borrow().window.clone();
    let frames = AnimationFrameLoop::start(window, move |timestamp| {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        let Ok(mut page) = shared.page.try_borrow_mut() else {
            return;
        };
        shared.scheduler.borrow_mut().run_frame(&mut page, timestamp);
    })?;
    *shared.frames.borrow_mut() = Some(frames);
    Ok(())
}

/// Cancel the running loop before resampling so no frame sees a half-built field.
fn rebuild(shared: &Rc<Shared>) {
    if let Some(mut frames) = shared.frames.borrow_mut().take() {
        frames.stop();
    }
    shared.scheduler.borrow_mut().stop();
    match shared.page.try_borrow_mut() {
        Ok(mut page) => {
            if let Err(err) = page.remeasure() {
                log::warn!("hero rebuild failed: {err}");
            }
        }
        Err(_) => log::debug!("page busy; rebuild skipped"),
    }
    if let Err(err) = start_loop(shared) {
        log::warn!("hero frame loop failed to start: {err}");
    }
}

pub struct HeroApp {
    shared: Rc<Shared>,
    listeners: Vec<Listener>,
}

impl HeroApp {
    pub fn mount() -> Result<Self> {
        let window = dom::window()?;
        let document = dom::document(&window)?;
        let canvas: HtmlCanvasElement = dom::query(&document, CANVAS)?;
        let heading: Element = dom::query(&document, HEADLINE)?;
        let hero: HtmlElement = dom::query(&document, HERO)?;
        let content = document.query_selector(CONTENT)?;
        let footer = document.query_selector(FOOTER)?;

        let cfg = load_config(&canvas);
        let timeline = !canvas.has_attribute("data-hero-static");
        let surface = CanvasSurface::new(canvas)
            .map_err(|err| log::warn!("particles disabled: {err}"))
            .ok();
        let font = dom::font_spec(&window, &heading);
        let rasterizer = CanvasRasterizer::new(&document, font, cfg.sampling.font_scale)
            .map_err(|err| log::warn!("glyph rasterizer unavailable: {err}"))
            .ok();
        let canvas_2d = surface.is_some() && rasterizer.is_some();
        let env = dom::environment(&window, canvas_2d, timeline);
        let seed = (js_sys::Math::random() * 9_007_199_254_740_992.0) as u64;

        let page = Page {
            director: HeroDirector::new(cfg, env, seed),
            scroller: WindowScroller::new(window.clone(), &document),
            effects: DomEffects::new(hero.clone(), footer.clone()),
            surface,
            rasterizer,
            content,
            footer,
            hero: hero.into(),
            heading,
            document: document.clone(),
            window: window.clone(),
        };

        let mut scheduler = FrameScheduler::new();
        scheduler.register("choreography", |page: &mut Page, time| {
            let Page {
                director,
                scroller,
                effects,
                ..
            } = page;
            director.frame_choreography(time.now, scroller, effects);
        });
        scheduler.register("field", |page: &mut Page, time| {
            if let Some(surface) = page.surface.as_mut() {
                page.director.frame_field(time.dt, surface);
            }
        });

        let shared = Rc::new(Shared {
            page: RefCell::new(page),
            scheduler: RefCell::new(scheduler),
            frames: RefCell::new(None),
        });

        let mut app = Self {
            shared,
            listeners: Vec::new(),
        };
        app.listen(&window, &document)?;
        rebuild(&app.shared);
        app.rebuild_when_fonts_ready(&document);
        log::info!("hero mounted");
        Ok(app)
    }

    fn listen(&mut self, window: &Window, document: &Document) -> Result<()> {
        let win: &EventTarget = window.as_ref();
        let weak = Rc::downgrade(&self.shared);

        let w = weak.clone();
        self.listeners.push(Listener::attach(win, "scroll", true, move |_| {
            with_page(&w, |page| {
                page.director.on_scroll(&mut page.scroller);
                if let Err(err) = page.refresh_anchors() {
                    log::debug!("anchor refresh failed: {err}");
                }
            })
        })?);

        let w = weak.clone();
        self.listeners.push(Listener::attach(win, "wheel", false, move |event| {
            let Some(wheel) = event.dyn_ref::<WheelEvent>() else {
                return;
            };
            with_page(&w, |page| {
                let line = match wheel.delta_mode() {
                    WheelEvent::DOM_DELTA_LINE => 16.0,
                    WheelEvent::DOM_DELTA_PAGE => {
                        f64::from(page.director.environment().viewport.height)
                    }
                    _ => 1.0,
                };
                let outcome = page.director.on_wheel(wheel.delta_y() * line, &page.scroller);
                if outcome == WheelOutcome::Consumed {
                    event.prevent_default();
                }
            })
        })?);

        let w = weak.clone();
        self.listeners.push(Listener::attach(win, "touchstart", true, move |_| {
            with_page(&w, |page| page.director.on_touch(&page.scroller))
        })?);

        let w = weak.clone();
        self.listeners.push(Listener::attach(win, "touchmove", false, move |event| {
            with_page(&w, |page| {
                if !page.director.scroll().is_idle() {
                    event.prevent_default();
                }
            })
        })?);

        let w = weak.clone();
        self.listeners.push(Listener::attach(win, "keydown", false, move |event| {
            let key = event.dyn_ref::<KeyboardEvent>().map(|k| k.key()).unwrap_or_default();
            with_page(&w, |page| {
                page.director.on_key(&page.scroller);
                if !page.director.scroll().is_idle() && SCROLL_KEYS.contains(&key.as_str()) {
                    event.prevent_default();
                }
            })
        })?);

        let w = weak.clone();
        self.listeners.push(Listener::attach(win, "pointermove", true, move |event| {
            let Some(pointer) = event.dyn_ref::<PointerEvent>() else {
                return;
            };
            with_page(&w, |page| {
                let origin = page.canvas_origin();
                page.director.pointer_move(
                    pointer.client_x() as f32 - origin.x,
                    pointer.client_y() as f32 - origin.y,
                );
            })
        })?);

        if let Some(root) = document.document_element() {
            let w = weak.clone();
            self.listeners.push(Listener::attach(root.as_ref(), "mouseleave", true, move |_| {
                with_page(&w, |page| page.director.pointer_leave())
            })?);
        }

        for event in ["resize", "orientationchange"] {
            let w = weak.clone();
            self.listeners.push(Listener::attach(win, event, true, move |_| {
                if let Some(shared) = w.upgrade() {
                    rebuild(&shared);
                }
            })?);
        }
        Ok(())
    }

    /// Glyph metrics are wrong until webfonts load; resample once they have.
    fn rebuild_when_fonts_ready(&self, document: &Document) {
        let weak = Rc::downgrade(&self.shared);
        let ready = document.fonts().ready();
        spawn_local(async move {
            match ready {
                Ok(promise) => {
                    if let Err(err) = JsFuture::from(promise).await {
                        log::warn!("fonts.ready rejected: {err:?}");
                    }
                }
                Err(err) => log::warn!("fonts.ready unavailable: {err:?}"),
            }
            if let Some(shared) = weak.upgrade() {
                log::debug!("fonts ready; resampling headline");
                rebuild(&shared);
            }
        });
    }
}

impl Drop for HeroApp {
    fn drop(&mut self) {
        self.listeners.clear();
        if let Some(mut frames) = self.shared.frames.borrow_mut().take() {
            frames.stop();
        }
        self.shared.scheduler.borrow_mut().stop();
        log::info!("hero destroyed");
    }
}
