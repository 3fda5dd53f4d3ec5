//! EMA readout: a `steps × dims` spike-rate grid collapsing into one output
//! row, with the per-step weight beside each row.

use spikeviz_protocol::{Font, Paint, Point, Rect, TextAlign, ThemeToken};

use super::{MountSpec, Visualization};
use crate::config::{EmaParams, GalleryConfig};
use crate::frame::DrawContext;
use crate::layout::{clamp_extent, label_stride, text_width, Label, LayoutMode};
use crate::model::EmaReadout;

pub const ID: &str = "emaCanvas";
pub const HEIGHT: f64 = 380.0;

const PAD: f64 = 20.0;
const GRID_TOP: f64 = 36.0;
const ROW_PITCH: f64 = 25.0;
const CELL_HEIGHT: f64 = 22.0;

#[derive(Debug, Clone, PartialEq)]
pub struct EmaLayout {
    pub width: f64,
    pub mode: LayoutMode,
    pub cell_width: f64,
    /// Left edge of the grid; the step labels and weight bars sit left of it.
    pub grid_left: f64,
    /// Top of the output row.
    pub out_y: f64,
    /// Every `header_stride`-th dimension gets a header.
    pub header_stride: usize,
    steps: usize,
    dims: usize,
}

impl EmaLayout {
    pub fn for_width(width: f64) -> Self {
        let params = EmaParams::default();
        Self::new(width, params.steps, params.dims)
    }

    pub fn new(width: f64, steps: usize, dims: usize) -> Self {
        let mode = LayoutMode::for_width(width);
        let right = mode.pick(20.0, 150.0);
        let label_width = clamp_extent(45.0, 60.0, 0.04 * width);
        let cell_width = clamp_extent(8.0, 28.0, (width - PAD - right - label_width) / dims.max(1) as f64);
        let widest = format!("D{}", dims.saturating_sub(1));
        Self {
            width,
            mode,
            cell_width,
            grid_left: PAD + label_width,
            out_y: GRID_TOP + steps as f64 * ROW_PITCH + 14.0,
            header_stride: label_stride(cell_width, text_width(&widest, 9.0), 2.0),
            steps,
            dims,
        }
    }

    pub fn cell(&self, t: usize, d: usize) -> Rect {
        Rect::new(
            self.grid_left + d as f64 * self.cell_width,
            GRID_TOP + t as f64 * ROW_PITCH,
            self.cell_width - 1.0,
            CELL_HEIGHT,
        )
    }

    pub fn output_cell(&self, d: usize) -> Rect {
        Rect::new(
            self.grid_left + d as f64 * self.cell_width,
            self.out_y,
            self.cell_width - 1.0,
            CELL_HEIGHT,
        )
    }

    fn grid_right(&self) -> f64 {
        self.grid_left + self.dims as f64 * self.cell_width
    }

    pub fn labels(&self, readout: &EmaReadout, scan: Option<usize>) -> Vec<Label> {
        let mut labels = Vec::new();
        for t in 0..self.steps {
            let baseline = GRID_TOP + t as f64 * ROW_PITCH + CELL_HEIGHT / 2.0 + 4.0;
            let active = scan == Some(t);
            labels.push(Label::new(
                format!("T{t}"),
                Point::new(self.grid_left - 36.0, baseline),
                if active { Font::bold(10.0) } else { Font::regular(10.0) },
                TextAlign::Right,
                if active { ThemeToken::Amber } else { ThemeToken::Muted },
            ));
            labels.push(Label::new(
                format!("{:.2}", readout.weight(t)),
                Point::new(self.grid_left - 2.0, baseline),
                Font::regular(8.0),
                TextAlign::Right,
                ThemeToken::Faint,
            ));
        }
        for d in (0..self.dims).step_by(self.header_stride.max(1)) {
            labels.push(Label::new(
                format!("D{d}"),
                Point::new(self.grid_left + (d as f64 + 0.5) * self.cell_width, GRID_TOP - 6.0),
                Font::regular(9.0),
                TextAlign::Center,
                ThemeToken::Faint,
            ));
        }
        labels.push(Label::new(
            "EMA out",
            Point::new(self.grid_left - 2.0, self.out_y + CELL_HEIGHT / 2.0 + 4.0),
            Font::bold(11.0),
            TextAlign::Right,
            ThemeToken::Purple,
        ));

        let last = self.steps.saturating_sub(1);
        let ratio = format!("T{last} is {:.0}× T0", readout.recency_ratio());
        let alpha = readout.alpha();
        let legend = Font::regular(10.0);
        match self.mode {
            LayoutMode::Compact => {
                labels.push(Label::new(
                    format!("α = {alpha} · w(t) ∝ α^({last}−t)"),
                    Point::new(PAD, self.out_y + 36.0),
                    legend,
                    TextAlign::Left,
                    ThemeToken::Muted,
                ));
                labels.push(Label::new(ratio, Point::new(PAD, self.out_y + 54.0), legend, TextAlign::Left, ThemeToken::Amber));
            }
            LayoutMode::Full => {
                let x = self.grid_right() + 14.0;
                let lines = [
                    ("EMA weight:".to_string(), 14.0, ThemeToken::Text),
                    (format!("α = {alpha}"), 30.0, ThemeToken::Muted),
                    (format!("w(t) ∝ α^({last}−t)"), 46.0, ThemeToken::Muted),
                    (format!("T0 → {:.3}", readout.weight(0)), 68.0, ThemeToken::Faint),
                    (format!("T{last} → {:.3}", readout.weight(last)), 84.0, ThemeToken::Teal),
                    (ratio, 100.0, ThemeToken::Amber),
                ];
                labels.extend(lines.into_iter().map(|(text, dy, token)| {
                    Label::new(text, Point::new(x, GRID_TOP + dy), legend, TextAlign::Left, token)
                }));
            }
        }
        labels
    }
}

#[derive(Debug, Clone)]
pub struct EmaView {
    readout: EmaReadout,
    scan_rate: f64,
}

impl EmaView {
    pub fn new(config: &GalleryConfig) -> Self {
        Self {
            readout: EmaReadout::new(&config.ema),
            scan_rate: config.ema.scan_rate,
        }
    }

    pub fn scan_row(&self, clock: f64) -> usize {
        let steps = self.readout.steps();
        let k = (clock * self.scan_rate).floor();
        if steps == 0 || !k.is_finite() || k < 0.0 {
            0
        } else {
            (k as u64 % steps as u64) as usize
        }
    }
}

/// Map an input rate onto `[0, 1]` for shading.
fn level(x: f64) -> f64 {
    ((x + 0.1) / 0.3).clamp(0.0, 1.0)
}

impl Visualization for EmaView {
    fn mount(&self) -> MountSpec {
        MountSpec {
            id: ID,
            height: HEIGHT,
            pointer: false,
        }
    }

    fn draw(&self, ctx: &mut DrawContext, clock: f64) {
        let ema = &self.readout;
        let layout = EmaLayout::new(ctx.width(), ema.steps(), ema.dims());
        let scan = self.scan_row(clock);

        for t in 0..ema.steps() {
            let weight_bar = ema.weight(t) / ema.weight(ema.steps().saturating_sub(1)).max(f64::EPSILON);
            let row = layout.cell(t, 0);
            ctx.fill_rect(
                Rect::new(layout.grid_left - 32.0, row.y + 4.0, 28.0 * weight_bar.min(1.0), 3.0),
                Paint::new(ThemeToken::Teal, 0.5),
            );
            for d in 0..ema.dims() {
                let alpha = 0.12 + 0.8 * level(ema.input(t, d));
                let alpha = if t == scan { alpha } else { alpha * 0.75 };
                ctx.fill_rect(layout.cell(t, d), Paint::new(ThemeToken::Teal, alpha));
            }
        }

        let scan_row = layout.cell(scan, 0);
        ctx.stroke_rect(
            Rect::new(layout.grid_left - 1.0, scan_row.y - 1.0, layout.cell_width * ema.dims() as f64 + 1.0, CELL_HEIGHT + 2.0),
            ThemeToken::Amber,
            1.5,
        );

        for (d, &y) in ema.output().iter().enumerate() {
            ctx.fill_rect(
                layout.output_cell(d),
                Paint::new(ThemeToken::Purple, 0.2 + 0.75 * level(y)),
            );
        }
        let pulse = 0.3 + 0.6 * ema.weight(scan) / ema.weight(ema.steps().saturating_sub(1)).max(f64::EPSILON);
        ctx.stroke_rect(
            Rect::new(layout.grid_left - 1.0, layout.out_y - 1.0, layout.cell_width * ema.dims() as f64 + 1.0, CELL_HEIGHT + 2.0),
            Paint::new(ThemeToken::Purple, pulse),
            1.5,
        );

        for label in layout.labels(ema, Some(scan)) {
            ctx.label(&label);
        }
    }
}
