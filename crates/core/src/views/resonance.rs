//! Resonance matrix: query and key spike rasters with the causal co-firing
//! heatmap between them.

use spikeviz_protocol::{Font, Paint, Point, Rect, TextAlign, ThemeToken};

use super::{MountSpec, Visualization};
use crate::config::{GalleryConfig, ResonanceParams};
use crate::frame::DrawContext;
use crate::layout::{clamp_extent, Label, LayoutMode};
use crate::model::ResonanceModel;

pub const ID: &str = "resCanvas";
pub const HEIGHT: f64 = 400.0;

const K_TOP: f64 = 26.0;
const TITLE_Y: f64 = 18.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ResonanceLayout {
    pub width: f64,
    pub mode: LayoutMode,
    pub scale: f64,
    /// Width of one time step in the query raster, height of one in the key.
    pub step_extent: f64,
    /// Side of one heatmap cell.
    pub cell: f64,
    pub margin_left: f64,
    pub heat_left: f64,
    pub heat_top: f64,
    positions: usize,
    steps: usize,
}

impl ResonanceLayout {
    pub fn for_width(width: f64) -> Self {
        let params = ResonanceParams::default();
        Self::new(width, params.positions, params.steps)
    }

    pub fn new(width: f64, positions: usize, steps: usize) -> Self {
        let mode = LayoutMode::for_width(width);
        let reserved = mode.pick(53.0, 266.0);
        let scale = clamp_extent(0.3, 0.72, (width - reserved) / 420.0);
        let margin_left = match mode {
            LayoutMode::Compact => clamp_extent(30.0, 40.0, 0.1 * width),
            LayoutMode::Full => clamp_extent(72.0, 96.0, 0.1 * width),
        };
        let gap = mode.pick(10.0, 20.0);
        let raster = 140.0 * scale;
        Self {
            width,
            mode,
            scale,
            step_extent: raster / steps.max(1) as f64,
            cell: 2.0 * raster / positions.max(1) as f64,
            margin_left,
            heat_left: margin_left + raster + gap,
            heat_top: 40.0 + raster,
            positions,
            steps,
        }
    }

    pub fn heat(&self) -> Rect {
        let side = self.cell * self.positions as f64;
        Rect::new(self.heat_left, self.heat_top, side, side)
    }

    pub fn query_cell(&self, i: usize, t: usize) -> Rect {
        Rect::new(
            self.margin_left + t as f64 * self.step_extent,
            self.heat_top + i as f64 * self.cell,
            self.step_extent,
            self.cell,
        )
    }

    pub fn key_cell(&self, j: usize, t: usize) -> Rect {
        Rect::new(
            self.heat_left + j as f64 * self.cell,
            K_TOP + t as f64 * self.step_extent,
            self.cell,
            self.step_extent,
        )
    }

    pub fn heat_cell(&self, i: usize, j: usize) -> Rect {
        Rect::new(
            self.heat_left + j as f64 * self.cell,
            self.heat_top + i as f64 * self.cell,
            self.cell,
            self.cell,
        )
    }

    fn index_font(&self) -> Font {
        Font::regular((0.7 * self.cell).min(10.0))
    }

    pub fn labels(&self, top_k: usize) -> Vec<Label> {
        let title = Font::semibold(11.0);
        let heat = self.heat();
        let raster = self.step_extent * self.steps as f64;
        let mut labels = vec![
            Label::new(
                "Q spikes",
                Point::new(self.margin_left + raster / 2.0, TITLE_Y),
                title,
                TextAlign::Center,
                ThemeToken::Teal,
            ),
            Label::new(
                self.mode.pick("K spikes", "K spikes (past tokens)"),
                Point::new(heat.x + heat.w / 2.0, TITLE_Y),
                title,
                TextAlign::Center,
                ThemeToken::Purple,
            ),
            Label::new(
                format!("T=0 → T={}", self.steps.saturating_sub(1)),
                Point::new(self.margin_left + raster / 2.0, heat.bottom() + 14.0),
                Font::regular(9.0),
                TextAlign::Center,
                ThemeToken::Faint,
            ),
        ];

        let font = self.index_font();
        for i in 0..self.positions {
            let mid = self.heat_top + (i as f64 + 0.5) * self.cell;
            labels.push(Label::new(
                format!("S{i}"),
                Point::new(self.margin_left - 4.0, mid + 0.35 * font.size),
                font,
                TextAlign::Right,
                ThemeToken::Muted,
            ));
            labels.push(Label::new(
                format!("{i}"),
                Point::new(self.heat_left + (i as f64 + 0.5) * self.cell, self.heat_top - 3.0),
                font,
                TextAlign::Center,
                ThemeToken::Muted,
            ));
        }

        let legend = Font::semibold(10.0);
        let entries = [
            ("■ top-K kept", ThemeToken::Teal),
            ("■ scanning", ThemeToken::Amber),
            ("■ masked", ThemeToken::Faint),
            ("■ future", ThemeToken::Muted),
        ];
        match self.mode {
            LayoutMode::Compact => {
                for (n, (text, token)) in entries.into_iter().enumerate() {
                    let x = if n % 2 == 0 { 8.0 } else { self.width / 2.0 };
                    let y = heat.bottom() + if n < 2 { 30.0 } else { 46.0 };
                    labels.push(Label::new(text, Point::new(x, y), legend, TextAlign::Left, token));
                }
            }
            LayoutMode::Full => {
                let x = heat.right() + 16.0;
                for (n, (text, token)) in entries.into_iter().enumerate() {
                    let y = self.heat_top + 16.0 * (n + 1) as f64;
                    labels.push(Label::new(text, Point::new(x, y), legend, TextAlign::Left, token));
                }
                labels.push(Label::new(
                    format!("top-K = {top_k}"),
                    Point::new(x, self.heat_top + 96.0),
                    legend,
                    TextAlign::Left,
                    ThemeToken::Text,
                ));
                labels.push(Label::new(
                    "Resonance matrix  (co-firing dot product)",
                    Point::new(heat.x + heat.w / 2.0, HEIGHT - 12.0),
                    title,
                    TextAlign::Center,
                    ThemeToken::Muted,
                ));
            }
        }
        labels
    }
}

#[derive(Debug, Clone)]
pub struct ResonanceView {
    model: ResonanceModel,
    top_k: usize,
    scan_rate: f64,
}

impl ResonanceView {
    pub fn new(config: &GalleryConfig) -> Self {
        let params = &config.resonance;
        Self {
            model: ResonanceModel::random(params, &mut config.rng_for(ID)),
            top_k: params.top_k,
            scan_rate: params.scan_rate,
        }
    }

    pub fn model(&self) -> &ResonanceModel {
        &self.model
    }

    /// Query row highlighted at `clock`.
    pub fn scan_row(&self, clock: f64) -> usize {
        let n = self.model.positions();
        let step = (clock * self.scan_rate).floor();
        if n == 0 || !step.is_finite() || step < 0.0 {
            0
        } else {
            (step as u64 % n as u64) as usize
        }
    }
}

impl Visualization for ResonanceView {
    fn mount(&self) -> MountSpec {
        MountSpec {
            id: ID,
            height: HEIGHT,
            pointer: false,
        }
    }

    fn draw(&self, ctx: &mut DrawContext, clock: f64) {
        let model = &self.model;
        let layout = ResonanceLayout::new(ctx.width(), model.positions(), model.steps());
        let scan = self.scan_row(clock);
        let inset = |r: Rect| Rect::new(r.x + 0.5, r.y + 0.5, (r.w - 1.0).max(0.0), (r.h - 1.0).max(0.0));

        for (i, row) in model.query().iter().enumerate() {
            for (t, &spike) in row.iter().enumerate() {
                let paint = if spike {
                    Paint::new(ThemeToken::Teal, if i == scan { 1.0 } else { 0.75 })
                } else {
                    Paint::solid(ThemeToken::Code)
                };
                ctx.fill_rect(inset(layout.query_cell(i, t)), paint);
            }
        }
        for (j, row) in model.key().iter().enumerate() {
            for (t, &spike) in row.iter().enumerate() {
                let paint = if spike {
                    Paint::new(ThemeToken::Purple, 0.8)
                } else {
                    Paint::solid(ThemeToken::Code)
                };
                ctx.fill_rect(inset(layout.key_cell(j, t)), paint);
            }
        }

        let peak = model.expected_peak();
        let score_font = Font::regular((0.45 * layout.cell).min(10.0));
        for i in 0..model.positions() {
            for j in 0..model.positions() {
                let cell = inset(layout.heat_cell(i, j));
                let Some(score) = model.score(i, j) else {
                    ctx.fill_rect(cell, Paint::new(ThemeToken::Code2, 0.5));
                    continue;
                };
                let level = (f64::from(score) / peak).min(1.0);
                let paint = if model.is_top(i, j) {
                    Paint::new(ThemeToken::Teal, 0.25 + 0.75 * level)
                } else {
                    Paint::new(ThemeToken::Faint, 0.12 + 0.3 * level)
                };
                ctx.fill_rect(cell, paint);
                if layout.cell >= 16.0 {
                    ctx.text(
                        Point::new(cell.x + cell.w / 2.0, cell.y + cell.h / 2.0 + 0.35 * score_font.size),
                        score.to_string(),
                        ThemeToken::Text,
                        score_font,
                        TextAlign::Center,
                    );
                }
            }
        }

        if model.positions() > 0 {
            let q = layout.query_cell(scan, 0);
            let raster = layout.step_extent * model.steps() as f64;
            ctx.stroke_rect(Rect::new(q.x, q.y, raster, q.h), ThemeToken::Amber, 1.5);
            let h = layout.heat_cell(scan, 0);
            ctx.stroke_rect(
                Rect::new(h.x, h.y, layout.cell * (scan + 1) as f64, h.h),
                ThemeToken::Amber,
                1.5,
            );
        }

        for label in layout.labels(self.top_k) {
            ctx.label(&label);
        }
    }
}
