//! DOM measurement and page collaborators.

use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, Node, Window};

use super::canvas::FontSpec;
use crate::config::AnchorConfig;
use crate::director::{Capabilities, Environment, PageEffects, PageLayout};
use crate::error::{HeroError, Result};
use crate::geometry::{Point, Rect, Viewport};
use crate::raster::GlyphBox;
use crate::scroll::Scroller;

pub fn window() -> Result<Window> {
    web_sys::window().ok_or(HeroError::NoWindow)
}

pub fn document(window: &Window) -> Result<Document> {
    window.document().ok_or(HeroError::NoDocument)
}

pub fn query<T: JsCast>(document: &Document, selector: &str) -> Result<T> {
    document
        .query_selector(selector)?
        .and_then(|el| el.dyn_into::<T>().ok())
        .ok_or_else(|| HeroError::MissingElement(selector.to_string()))
}

fn px(value: std::result::Result<wasm_bindgen::JsValue, wasm_bindgen::JsValue>) -> f32 {
    value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as f32
}

pub fn viewport(window: &Window) -> Viewport {
    let dpr = window.device_pixel_ratio();
    Viewport::new(
        px(window.inner_width()),
        px(window.inner_height()),
        if dpr > 0.0 { dpr as f32 } else { 1.0 },
    )
}

pub fn media_matches(window: &Window, query: &str) -> bool {
    matches!(window.match_media(query), Ok(Some(mql)) if mql.matches())
}

pub fn environment(window: &Window, canvas_2d: bool, timeline: bool) -> Environment {
    Environment {
        viewport: viewport(window),
        reduced_motion: media_matches(window, "(prefers-reduced-motion: reduce)"),
        coarse_pointer: media_matches(window, "(pointer: coarse)"),
        capabilities: Capabilities { canvas_2d, timeline },
    }
}

fn to_rect(r: &web_sys::DomRect, origin: Point) -> Rect {
    Rect::new(
        r.x() as f32 - origin.x,
        r.y() as f32 - origin.y,
        r.width() as f32,
        r.height() as f32,
    )
}

fn text_nodes(node: &Node, out: &mut Vec<Node>) {
    let children = node.child_nodes();
    for i in 0..children.length() {
        let Some(child) = children.item(i) else {
            continue;
        };
        if child.node_type() == Node::TEXT_NODE {
            out.push(child);
        } else if child.node_type() == Node::ELEMENT_NODE {
            text_nodes(&child, out);
        }
    }
}

/// One box per character of `element`'s text, relative to `origin`
/// (the canvas's top-left in client coordinates).
pub fn glyph_boxes(document: &Document, element: &Element, origin: Point) -> Result<Vec<GlyphBox>> {
    let range = document.create_range()?;
    let mut nodes = Vec::new();
    text_nodes(element, &mut nodes);

    let mut boxes = Vec::new();
    for node in &nodes {
        let text = node.text_content().unwrap_or_default();
        let mut offset = 0u32;
        for ch in text.chars() {
            let len = ch.len_utf16() as u32;
            range.set_start(node, offset)?;
            range.set_end(node, offset + len)?;
            offset += len;
            if ch.is_whitespace() {
                continue;
            }
            boxes.push(GlyphBox::new(ch, to_rect(&range.get_bounding_client_rect(), origin)));
        }
    }
    Ok(boxes)
}

/// Measure every `[data-particle-anchor]` element's final glyph, in slot
/// order. A slot whose element is missing or hidden yields `None`.
pub fn anchor_rects(
    document: &Document,
    cfg: &AnchorConfig,
    origin: Point,
) -> Result<Vec<Option<Rect>>> {
    let mut rects = vec![None; cfg.slots.len()];
    let found = document.query_selector_all("[data-particle-anchor]")?;
    for i in 0..found.length() {
        let Some(el) = found.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
            continue;
        };
        let name = el.get_attribute("data-particle-anchor").unwrap_or_default();
        let Some(slot) = cfg.slots.iter().position(|s| s.name == name) else {
            log::warn!("unknown anchor slot '{name}'");
            continue;
        };
        let last = glyph_boxes(document, &el, origin)?.pop();
        rects[slot] = last.map(|g| g.rect).filter(|r| !r.is_empty());
    }
    Ok(rects)
}

/// Document offset of an element's top edge.
fn page_top(window: &Window, el: &Element) -> f64 {
    el.get_bounding_client_rect().y() + window.scroll_y().unwrap_or(0.0)
}

pub fn page_layout(
    window: &Window,
    hero: &Element,
    content: Option<&Element>,
    footer: Option<&Element>,
) -> PageLayout {
    let hero_top = page_top(window, hero);
    let hero_height = hero.get_bounding_client_rect().height();
    PageLayout {
        hero_top,
        hero_height,
        content_top: content.map_or(hero_top + hero_height, |el| page_top(window, el)),
        footer_top: footer.map_or(0.0, |el| page_top(window, el)),
    }
}

pub fn font_spec(window: &Window, el: &Element) -> FontSpec {
    let Ok(Some(style)) = window.get_computed_style(el) else {
        return FontSpec::default();
    };
    let mut font = FontSpec::default();
    if let Ok(family) = style.get_property_value("font-family") {
        if !family.is_empty() {
            font.family = family;
        }
    }
    if let Ok(weight) = style.get_property_value("font-weight") {
        if !weight.is_empty() {
            font.weight = weight;
        }
    }
    font
}

/// Native window scrolling.
pub struct WindowScroller {
    window: Window,
    root: Option<Element>,
}

impl WindowScroller {
    pub fn new(window: Window, document: &Document) -> Self {
        Self {
            window,
            root: document.document_element(),
        }
    }
}

impl Scroller for WindowScroller {
    fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn max_scroll_y(&self) -> f64 {
        let height = self.root.as_ref().map_or(0, |r| r.scroll_height());
        let inner = self.window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        (f64::from(height) - inner).max(0.0)
    }

    fn set_scroll_y(&mut self, y: f64) {
        self.window.scroll_to_with_x_and_y(0.0, y);
    }
}

/// Letter reveal as a CSS custom property; footer reveal as a data attribute
/// the page's stylesheet animates.
pub struct DomEffects {
    hero: HtmlElement,
    footer: Option<Element>,
}

impl DomEffects {
    pub fn new(hero: HtmlElement, footer: Option<Element>) -> Self {
        Self { hero, footer }
    }
}

impl PageEffects for DomEffects {
    fn set_letters(&mut self, progress: f32) {
        let _ = self.hero.style().set_property("--hero-letters", &format!("{progress:.4}"));
    }

    fn reveal_footer(&mut self) {
        if let Some(footer) = &self.footer {
            let _ = footer.set_attribute("data-revealed", "true");
        }
    }

    fn hide_footer(&mut self) {
        if let Some(footer) = &self.footer {
            let _ = footer.remove_attribute("data-revealed");
        }
    }
}
