//! RGB raster surface backed by Plotters' bitmap backend.
//!
//! One logical unit is one pixel. Lines and markers go through
//! `DrawingBackend::draw_line` / `draw_circle` on an in-memory RGB buffer.
//! Labels use a built-in 3x5 font (digits, `-`, `.`) scaled 2x, so no system
//! font stack is needed; other characters advance the pen without ink. Every
//! label is also kept in `labels()` so callers can read back what was drawn.

use std::fmt::Display;

use plotters::backend::DrawingBackend;
use plotters::prelude::{BitMapBackend, Color, RGBColor};
use tracing::debug;

use crate::domain::ChartConfig;
use crate::plot::surface::{Ink, Point, Surface};

pub const BACKGROUND: RGBColor = RGBColor(255, 255, 255);
pub const AXIS: RGBColor = RGBColor(0x33, 0x33, 0x33);
pub const LINE: RGBColor = RGBColor(0x00, 0x7a, 0xcc);
pub const MARKER: RGBColor = RGBColor(0x00, 0x7a, 0xcc);
pub const LABEL: RGBColor = RGBColor(0, 0, 0);

const GLYPH_W: i32 = 3;
const GLYPH_H: i32 = 5;
const FONT_SCALE: i32 = 2;
const GLYPH_ADVANCE: i32 = (GLYPH_W + 1) * FONT_SCALE;

const AXIS_WIDTH: u32 = 1;
const LINE_WIDTH: u32 = 2;

/// A label as placed on the canvas (top-left anchor).
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub text: String,
    pub at: Point,
}

pub struct PixelCanvas {
    width: u32,
    height: u32,
    /// Packed RGB, row-major, `width * height * 3` bytes.
    buffer: Vec<u8>,
    labels: Vec<TextLabel>,
}

impl PixelCanvas {
    pub fn new(config: &ChartConfig) -> Self {
        let mut canvas = Self {
            width: config.width,
            height: config.height,
            buffer: vec![0; config.width as usize * config.height as usize * 3],
            labels: Vec::new(),
        };
        canvas.fill_background();
        canvas
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Raw RGB bytes, row-major.
    pub fn rgb_buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn labels(&self) -> &[TextLabel] {
        &self.labels
    }

    fn fill_background(&mut self) {
        for px in self.buffer.chunks_exact_mut(3) {
            px.copy_from_slice(&[BACKGROUND.0, BACKGROUND.1, BACKGROUND.2]);
        }
    }

    /// Run `op` against a bitmap backend borrowing the pixel buffer.
    ///
    /// Drawing into memory has no failure mode we can act on; errors are logged.
    fn draw<E: Display>(&mut self, op: impl FnOnce(&mut BitMapBackend<'_>) -> Result<(), E>) {
        let mut backend = BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height));
        if let Err(e) = op(&mut backend) {
            debug!("raster drawing failed: {e}");
        }
    }
}

fn color(ink: Ink) -> RGBColor {
    match ink {
        Ink::Axis => AXIS,
        Ink::Line => LINE,
        Ink::Marker => MARKER,
        Ink::Label => LABEL,
    }
}

fn coord(p: Point) -> (i32, i32) {
    (p.0.round() as i32, p.1.round() as i32)
}

impl Surface for PixelCanvas {
    fn clear(&mut self) {
        self.fill_background();
        self.labels.clear();
    }

    fn line(&mut self, from: Point, to: Point, ink: Ink) {
        let width = if ink == Ink::Axis { AXIS_WIDTH } else { LINE_WIDTH };
        let style = color(ink).stroke_width(width);
        self.draw(|b| b.draw_line(coord(from), coord(to), &style));
    }

    fn disc(&mut self, center: Point, radius: f64, ink: Ink) {
        let style = color(ink).filled();
        let radius = radius.round().max(1.0) as u32;
        self.draw(|b| b.draw_circle(coord(center), radius, &style, true));
    }

    fn text(&mut self, text: &str, at: Point, ink: Ink) {
        let ink = color(ink).to_backend_color();
        let (x0, y0) = coord(at);

        let mut dots = Vec::new();
        for (i, ch) in text.chars().enumerate() {
            let Some(rows) = glyph(ch) else { continue };
            let gx = x0 + i as i32 * GLYPH_ADVANCE;
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_W {
                    if bits & (0b100 >> col) == 0 {
                        continue;
                    }
                    let (px, py) = (gx + col * FONT_SCALE, y0 + row as i32 * FONT_SCALE);
                    for dy in 0..FONT_SCALE {
                        for dx in 0..FONT_SCALE {
                            dots.push((px + dx, py + dy));
                        }
                    }
                }
            }
        }
        self.draw(|b| dots.iter().try_for_each(|&p| b.draw_pixel(p, ink)));

        self.labels.push(TextLabel {
            text: text.to_string(),
            at,
        });
    }

    fn text_extent(&self, text: &str) -> (f64, f64) {
        let n = text.chars().count() as i32;
        let width = if n == 0 { 0 } else { n * GLYPH_ADVANCE - FONT_SCALE };
        (width as f64, (GLYPH_H * FONT_SCALE) as f64)
    }
}

/// 3x5 glyph rows, most significant of the low 3 bits is the left column.
fn glyph(ch: char) -> Option<[u8; GLYPH_H as usize]> {
    let rows = match ch {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        _ => return None,
    };
    Some(rows)
}
