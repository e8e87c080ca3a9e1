//! Small value types and scalar curves shared by the sampler, the field and
//! the scroll choreography.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn lerp(self, to: Point, t: f32) -> Point {
        Point::new(lerp(self.x, to.x, t), lerp(self.y, to.y, t))
    }

    pub fn with_z(self, z: f32) -> Point3 {
        Point3::new(self.x, self.y, z)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn xy(self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn lerp(self, to: Point3, t: f32) -> Point3 {
        Point3::new(lerp(self.x, to.x, t), lerp(self.y, to.y, t), lerp(self.z, to.z, t))
    }
}

/// 8-bit sRGB colour, serialised as `[r, g, b]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    pub fn r(self) -> u8 {
        self.0[0]
    }

    pub fn g(self) -> u8 {
        self.0[1]
    }

    pub fn b(self) -> u8 {
        self.0[2]
    }

    /// CSS `rgb()` string for canvas fill styles.
    pub fn css(self) -> String {
        format!("rgb({},{},{})", self.r(), self.g(), self.b())
    }
}

/// Axis-aligned rectangle in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Smallest rectangle covering every non-empty input.
    pub fn union_all<'a>(rects: impl IntoIterator<Item = &'a Rect>) -> Option<Rect> {
        let mut acc: Option<(f32, f32, f32, f32)> = None;
        for r in rects.into_iter().filter(|r| !r.is_empty()) {
            acc = Some(match acc {
                None => (r.x, r.y, r.right(), r.bottom()),
                Some((x0, y0, x1, y1)) => {
                    (x0.min(r.x), y0.min(r.y), x1.max(r.right()), y1.max(r.bottom()))
                }
            });
        }
        acc.map(|(x0, y0, x1, y1)| Rect::new(x0, y0, x1 - x0, y1 - y0))
    }
}

/// Device tier used to pick stride, particle cap and input handling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tier {
    Desktop,
    Mobile,
}

/// Canvas size in CSS pixels plus the device pixel ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub dpr: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32, dpr: f32) -> Self {
        Self { width, height, dpr }
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.width >= 1.0 && self.height >= 1.0 && self.dpr > 0.0)
    }

    pub fn center(&self) -> Point {
        Point::new(self.width * 0.5, self.height * 0.5)
    }

    pub fn diagonal(&self) -> f32 {
        self.width.hypot(self.height)
    }

    pub fn tier(&self, mobile_breakpoint: f32) -> Tier {
        if self.width < mobile_breakpoint {
            Tier::Mobile
        } else {
            Tier::Desktop
        }
    }
}

/// Exact at both ends: `lerp(a, b, 1.0) == b`.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

pub fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

/// Hermite smoothstep; returns 0 below `edge0`, 1 above `edge1`.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = clamp01((x - edge0) / (edge1 - edge0));
    t * t * (3.0 - 2.0 * t)
}

pub fn ease_out_expo(t: f32) -> f32 {
    if t >= 1.0 {
        1.0
    } else if t <= 0.0 {
        0.0
    } else {
        1.0 - 2f32.powf(-10.0 * t)
    }
}

pub fn ease_out_cubic(t: f32) -> f32 {
    let t = clamp01(t);
    1.0 - (1.0 - t).powi(3)
}

pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = clamp01(t);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) * 0.5
    }
}

pub fn ease_in_out_sine(t: f32) -> f32 {
    let t = clamp01(t);
    -((std::f32::consts::PI * t).cos() - 1.0) * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothstep_edges_and_midpoint() {
        assert_eq!(smoothstep(0.64, 0.94, 0.64), 0.0);
        assert_eq!(smoothstep(0.64, 0.94, 0.94), 1.0);
        assert!((smoothstep(0.64, 0.94, 0.79) - 0.5).abs() < 1e-5);
        assert_eq!(smoothstep(0.5, 0.5, 0.4), 0.0);
        assert_eq!(smoothstep(0.5, 0.5, 0.6), 1.0);
    }

    #[test]
    fn easing_endpoints() {
        let curves: [fn(f32) -> f32; 4] =
            [ease_out_expo, ease_out_cubic, ease_in_out_cubic, ease_in_out_sine];
        for f in curves {
            assert!(f(0.0).abs() < 1e-6);
            assert!((f(1.0) - 1.0).abs() < 1e-6);
        }
        assert!((ease_in_out_cubic(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn union_skips_empty_rects() {
        let rects = [
            Rect::new(10.0, 10.0, 20.0, 30.0),
            Rect::new(0.0, 0.0, 0.0, 0.0),
            Rect::new(40.0, 5.0, 10.0, 10.0),
        ];
        assert_eq!(Rect::union_all(&rects), Some(Rect::new(10.0, 5.0, 40.0, 35.0)));
        assert_eq!(Rect::union_all(&[] as &[Rect]), None);
    }
}
