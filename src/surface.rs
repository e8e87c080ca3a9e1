use crate::geometry::Rgb;

/// 2D raster sink the particle field draws into.
///
/// Coordinates are CSS pixels; implementations map them onto a backing
/// store of `viewport × devicePixelRatio`.
pub trait Surface {
    /// Backing store size in device pixels.
    fn size(&self) -> (u32, u32);

    fn clear(&mut self);

    fn fill_circle(&mut self, x: f32, y: f32, radius: f32, color: Rgb, alpha: f32);

    fn is_drawable(&self) -> bool {
        let (w, h) = self.size();
        w > 0 && h > 0
    }
}
