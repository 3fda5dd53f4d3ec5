//! ReLU beside the leaky clamp, with a dot sweeping the input domain.

use spikeviz_protocol::{Dash, Font, Paint, Point, TextAlign, ThemeToken};

use super::{MountSpec, Visualization};
use crate::config::{GalleryConfig, LeakyClampParams};
use crate::frame::DrawContext;
use crate::layout::{clamp_extent, signed_decimal, text_width, Label, LayoutMode};
use crate::model::activation::SWEEP_EXTENT;
use crate::model::{leaky_clamp, relu, sweep_position};

pub const ID: &str = "lkyCanvas";
pub const HEIGHT: f64 = 340.0;

const PAD: f64 = 48.0;
const BASE_Y: f64 = 190.0;
const TITLE_Y: f64 = 36.0;
const CURVE_SAMPLES: usize = 96;

#[derive(Debug, Clone, PartialEq)]
pub struct LeakyClampLayout {
    pub width: f64,
    pub mode: LayoutMode,
    /// Logical pixels per unit of activation.
    pub scale: f64,
    pub relu_x: f64,
    pub clamp_x: f64,
    pub base_y: f64,
}

impl LeakyClampLayout {
    pub fn for_width(width: f64) -> Self {
        let half = width / 2.0;
        Self {
            width,
            mode: LayoutMode::for_width(width),
            scale: (0.45 * (HEIGHT - 96.0)).min(width / 7.5).max(0.0),
            relu_x: PAD + (half - PAD) / 2.0,
            clamp_x: half + (half - PAD) / 2.0,
            base_y: BASE_Y,
        }
    }

    /// Screen position of `(x, f(x))` in the panel centred on `cx`.
    pub fn point(&self, cx: f64, x: f64, y: f64) -> Point {
        Point::new(cx + x * self.scale, self.base_y - y * self.scale)
    }

    pub fn floor_y(&self, floor: f64) -> f64 {
        self.base_y - floor * self.scale
    }

    pub fn labels(&self, params: &LeakyClampParams) -> Vec<Label> {
        let s = self.scale;
        let title = Font::bold(clamp_extent(10.0, 13.0, self.width / 40.0));
        let axis = Font::regular(10.0);
        let (relu_title, clamp_title) = self.mode.pick(
            ("ReLU", "LeakyClamp"),
            ("ReLU  (standard)", "LeakyClamp  (SNN)"),
        );
        let mut labels = vec![
            Label::new(relu_title, Point::new(self.relu_x, TITLE_Y), title, TextAlign::Center, ThemeToken::Muted),
            Label::new(clamp_title, Point::new(self.clamp_x, TITLE_Y), title, TextAlign::Center, ThemeToken::Teal),
        ];

        for cx in [self.relu_x, self.clamp_x] {
            labels.push(Label::new(
                "f(x)",
                Point::new(cx, self.base_y - 1.15 * s - 4.0),
                axis,
                TextAlign::Center,
                ThemeToken::Faint,
            ));
            labels.push(Label::new(
                "x",
                Point::new(cx + 1.2 * s, self.base_y + 13.0),
                axis,
                TextAlign::Center,
                ThemeToken::Faint,
            ));
            if !self.mode.is_compact() {
                labels.push(Label::new(
                    "0",
                    Point::new(cx + 5.0, self.base_y + 13.0),
                    axis,
                    TextAlign::Left,
                    ThemeToken::Faint,
                ));
            }
        }

        labels.push(Label::new(
            "0 (DEAD)",
            Point::new(self.relu_x - 0.6 * s, self.base_y - 15.0),
            Font::regular(11.0),
            TextAlign::Center,
            Paint::new(ThemeToken::Coral, 0.85),
        ));

        let floor_y = self.floor_y(params.floor);
        let floor = signed_decimal(params.floor);
        labels.push(match self.mode {
            LayoutMode::Compact => Label::new(
                floor,
                Point::new(self.clamp_x + 0.1 * s + 2.0, floor_y + 12.0),
                Font::regular(9.0),
                TextAlign::Left,
                ThemeToken::Amber,
            ),
            LayoutMode::Full => {
                let font = Font::regular(9.0);
                let text = format!("floor = {floor}");
                let min_anchor = self.width / 2.0 + 4.0 + text_width(&text, font.size);
                Label::new(
                    text,
                    Point::new((self.clamp_x - 0.8 * s).max(min_anchor), floor_y - 5.0),
                    font,
                    TextAlign::Right,
                    ThemeToken::Amber,
                )
            }
        });

        let slope = match self.mode {
            LayoutMode::Compact => format!("leak = {}", params.leak),
            LayoutMode::Full => format!("slope = leak ≈ {}", params.leak),
        };
        labels.push(Label::new(
            slope,
            Point::new((self.clamp_x - 1.1 * s).max(self.width / 2.0 + 4.0), self.base_y + 40.0),
            Font::regular(11.0),
            TextAlign::Left,
            ThemeToken::Muted,
        ));
        labels
    }
}

#[derive(Debug, Clone)]
pub struct LeakyClampView {
    params: LeakyClampParams,
}

impl LeakyClampView {
    pub fn new(config: &GalleryConfig) -> Self {
        Self {
            params: config.leaky_clamp.clone(),
        }
    }

    fn draw_panel(
        &self,
        ctx: &mut DrawContext,
        layout: &LeakyClampLayout,
        cx: f64,
        f: impl Fn(f64) -> f64,
        token: ThemeToken,
    ) {
        let s = layout.scale;
        ctx.line(
            Point::new(cx - 1.3 * s, layout.base_y),
            Point::new(cx + 1.3 * s, layout.base_y),
            ThemeToken::Border2,
            1.0,
        );
        ctx.line(
            Point::new(cx, layout.base_y + 0.3 * s),
            Point::new(cx, layout.base_y - 1.25 * s),
            ThemeToken::Border2,
            1.0,
        );
        let curve = (0..=CURVE_SAMPLES)
            .map(|k| {
                let x = -SWEEP_EXTENT + 2.0 * SWEEP_EXTENT * k as f64 / CURVE_SAMPLES as f64;
                layout.point(cx, x, f(x))
            })
            .collect();
        ctx.polyline(curve, token, 2.4);
    }
}

impl Visualization for LeakyClampView {
    fn mount(&self) -> MountSpec {
        MountSpec {
            id: ID,
            height: HEIGHT,
            pointer: false,
        }
    }

    fn draw(&self, ctx: &mut DrawContext, clock: f64) {
        let layout = LeakyClampLayout::for_width(ctx.width());
        let p = &self.params;
        let s = layout.scale;

        ctx.dashed_line(
            Point::new(layout.width / 2.0, 56.0),
            Point::new(layout.width / 2.0, HEIGHT - 40.0),
            Paint::new(ThemeToken::Border, 0.8),
            1.0,
            Dash::new(4.0, 4.0),
        );

        let dead = layout.point(layout.relu_x, -SWEEP_EXTENT, 0.0);
        ctx.line(
            dead,
            Point::new(layout.relu_x, layout.base_y),
            Paint::new(ThemeToken::Coral, 0.35),
            5.0,
        );
        self.draw_panel(ctx, &layout, layout.relu_x, relu, ThemeToken::Muted);

        let floor_y = layout.floor_y(p.floor);
        ctx.dashed_line(
            Point::new(layout.clamp_x - 1.3 * s, floor_y),
            Point::new(layout.clamp_x, floor_y),
            Paint::new(ThemeToken::Amber, 0.6),
            1.0,
            Dash::new(3.0, 3.0),
        );
        self.draw_panel(
            ctx,
            &layout,
            layout.clamp_x,
            |x| leaky_clamp(x, p.leak, p.floor),
            ThemeToken::Teal,
        );

        let x = sweep_position(clock, p.sweep_period);
        let relu_token = if x < 0.0 { ThemeToken::Coral } else { ThemeToken::Teal };
        for (center, token) in [
            (layout.point(layout.relu_x, x, relu(x)), relu_token),
            (layout.point(layout.clamp_x, x, leaky_clamp(x, p.leak, p.floor)), ThemeToken::Teal),
        ] {
            ctx.glow(center, 2.0, 14.0, Paint::new(token, 0.45));
            ctx.circle(center, 4.5, token);
            ctx.circle(center, 1.8, ThemeToken::Glint);
        }

        for label in layout.labels(p) {
            ctx.label(&label);
        }
    }
}
