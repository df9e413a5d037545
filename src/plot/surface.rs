//! Drawing-target abstraction shared by the raster and terminal backends.
//!
//! Coordinates are logical units with the origin in the top-left corner and `y`
//! growing downwards. Backends silently clip anything outside their area.

/// A point in logical surface units.
pub type Point = (f64, f64);

/// Semantic role of a primitive; each backend maps it to a color or glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ink {
    Axis,
    Line,
    Marker,
    Label,
}

/// Drawing target. Its logical extent is the `ChartConfig` it was built for.
pub trait Surface {
    /// Reset every pixel/cell to the background.
    fn clear(&mut self);

    fn line(&mut self, from: Point, to: Point, ink: Ink);

    /// Filled circle.
    fn disc(&mut self, center: Point, radius: f64, ink: Ink);

    /// Draw `text` with its top-left corner at `at`.
    fn text(&mut self, text: &str, at: Point, ink: Ink);

    /// Logical `(width, height)` that `text` occupies.
    fn text_extent(&self, text: &str) -> (f64, f64);
}
