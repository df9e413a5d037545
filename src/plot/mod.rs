//! Chart rendering: one layout routine, two drawing backends.

pub mod ascii;
pub mod chart;
pub mod pixel;
pub mod surface;

pub use ascii::AsciiCanvas;
pub use chart::{ChartLayout, date_label, render_series};
pub use pixel::{PixelCanvas, TextLabel};
pub use surface::{Ink, Point, Surface};
