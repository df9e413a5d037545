//! ASCII rendering of the page-view chart for terminal output.
//!
//! The canvas keeps the chart's logical coordinate space (the same one the pixel
//! backend uses) and maps it onto a fixed grid of character cells, so both
//! backends show the same layout. Output is deterministic, which keeps golden
//! tests simple.
//!
//! Glyphs:
//! - axes: `|`, `-`, `+` where they cross
//! - series line: `.` (never overwrites another glyph)
//! - data points: `o`

use crate::domain::ChartConfig;
use crate::plot::surface::{Ink, Point, Surface};

pub struct AsciiCanvas {
    cell_w: f64,
    cell_h: f64,
    grid: Vec<Vec<char>>,
}

impl AsciiCanvas {
    /// A `cols` x `rows` grid covering the logical area of `config`.
    pub fn new(config: &ChartConfig, cols: usize, rows: usize) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        Self {
            cell_w: config.width as f64 / cols as f64,
            cell_h: config.height as f64 / rows as f64,
            grid: vec![vec![' '; cols]; rows],
        }
    }

    /// The grid as text, one line per row, trailing blanks trimmed.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for row in &self.grid {
            let line: String = row.iter().collect();
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }

    fn cell(&self, p: Point) -> (isize, isize) {
        ((p.0 / self.cell_w).floor() as isize, (p.1 / self.cell_h).floor() as isize)
    }

    fn get(&self, x: isize, y: isize) -> Option<char> {
        if x < 0 || y < 0 {
            return None;
        }
        self.grid.get(y as usize)?.get(x as usize).copied()
    }

    fn set(&mut self, x: isize, y: isize, ch: char) {
        if x < 0 || y < 0 {
            return;
        }
        if let Some(cell) = self.grid.get_mut(y as usize).and_then(|row| row.get_mut(x as usize)) {
            *cell = ch;
        }
    }

    fn axis_glyph(&self, x: isize, y: isize, ch: char) -> char {
        match (self.get(x, y), ch) {
            (Some('|'), '-') | (Some('-'), '|') | (Some('+'), _) => '+',
            _ => ch,
        }
    }
}

impl Surface for AsciiCanvas {
    fn clear(&mut self) {
        for row in &mut self.grid {
            row.fill(' ');
        }
    }

    fn line(&mut self, from: Point, to: Point, ink: Ink) {
        let (x0, y0) = self.cell(from);
        let (x1, y1) = self.cell(to);

        if ink == Ink::Axis {
            let ch = match (x0 == x1, y0 == y1) {
                (true, false) => '|',
                (false, true) => '-',
                _ => '+',
            };
            walk_line(x0, y0, x1, y1, |x, y| {
                let glyph = self.axis_glyph(x, y, ch);
                self.set(x, y, glyph);
            });
        } else {
            walk_line(x0, y0, x1, y1, |x, y| {
                if self.get(x, y) == Some(' ') {
                    self.set(x, y, '.');
                }
            });
        }
    }

    fn disc(&mut self, center: Point, _radius: f64, _ink: Ink) {
        let (x, y) = self.cell(center);
        self.set(x, y, 'o');
    }

    fn text(&mut self, text: &str, at: Point, _ink: Ink) {
        let (x, y) = self.cell(at);
        for (i, ch) in text.chars().enumerate() {
            self.set(x + i as isize, y, ch);
        }
    }

    fn text_extent(&self, text: &str) -> (f64, f64) {
        (text.chars().count() as f64 * self.cell_w, self.cell_h)
    }
}

/// Integer line drawing (Bresenham-ish) over cell coordinates.
fn walk_line(mut x0: isize, mut y0: isize, x1: isize, y1: isize, mut plot: impl FnMut(isize, isize)) {
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        plot(x0, y0);

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SeriesPoint;
    use crate::plot::chart::render_series;

    fn small() -> (ChartConfig, AsciiCanvas) {
        let config = ChartConfig {
            width: 160,
            height: 80,
            margin: 24,
        };
        let canvas = AsciiCanvas::new(&config, 20, 10);
        (config, canvas)
    }

    #[test]
    fn chart_golden_snapshot_small() {
        let (config, mut canvas) = small();
        let series = vec![
            SeriesPoint::new(0.0, "d1"),
            SeriesPoint::new(5.0, "d2"),
            SeriesPoint::new(10.0, "d3"),
        ];
        render_series(&series, &mut canvas, &config);

        let expected = concat!(
            "\n",
            "\n",
            "\n",
            "10 |            .o\n",
            "   |        ....\n",
            "   |     .o.\n",
            " 0 | ....\n",
            "   o--------------\n",
            "   d1          d3\n",
            "\n",
        );
        assert_eq!(canvas.render(), expected);
    }

    #[test]
    fn empty_series_draws_crossed_axes() {
        let (config, mut canvas) = small();
        render_series(&[], &mut canvas, &config);

        let txt = canvas.render();
        let rows: Vec<&str> = txt.lines().collect();
        assert_eq!(rows[3], "10 |");
        assert_eq!(rows[6], " 0 |");
        assert_eq!(rows[7], "   +--------------");
        assert!(!txt.contains('.'));
        assert!(!txt.contains('o'));
    }

    fn dated(values: &[f64]) -> Vec<SeriesPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| SeriesPoint::new(v, format!("202503{:02}00", i + 1)))
            .collect()
    }

    fn rows(canvas: &AsciiCanvas) -> Vec<String> {
        canvas.render().lines().map(str::to_string).collect()
    }

    #[test]
    fn four_digit_max_is_printed_in_full() {
        let config = ChartConfig::default();
        let mut canvas = AsciiCanvas::new(&config, 80, 20);
        render_series(&dated(&[800.0, 1234.0]), &mut canvas, &config);

        let rows = rows(&canvas);
        assert!(rows[4].starts_with("1234|"), "{:?}", rows[4]);
        assert!(rows[4].ends_with('o'));
    }

    #[test]
    fn five_digit_max_and_date_labels_fit_the_default_grid() {
        let config = ChartConfig::default();
        let mut canvas = AsciiCanvas::new(&config, 80, 20);
        render_series(&dated(&[100.0, 25000.0]), &mut canvas, &config);

        let rows = rows(&canvas);
        assert!(rows[4].starts_with("25000"), "{:?}", rows[4]);
        assert!(rows[15].starts_with("  0 "));
        assert_eq!(rows[17], format!("    2025-03-01{}2025-03-02", " ".repeat(52)));
    }

    #[test]
    fn drawing_outside_the_grid_is_clipped() {
        let (_, mut canvas) = small();
        canvas.line((-50.0, -50.0), (500.0, 500.0), Ink::Line);
        canvas.text("overflowing label", (150.0, 0.0), Ink::Label);
        canvas.disc((1000.0, 1000.0), 3.0, Ink::Marker);

        let txt = canvas.render();
        assert_eq!(txt.lines().count(), 10);
        assert!(txt.lines().all(|l| l.chars().count() <= 20));
        let first = txt.lines().next().unwrap();
        assert!(first.starts_with('.'));
        assert!(first.ends_with("ov"));
    }
}
