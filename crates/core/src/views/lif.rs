//! Leaky integrate-and-fire track: membrane, synaptic current and spike
//! raster scrolling past a fixed label column.

use spikeviz_protocol::{Dash, Font, Paint, Point, Rect, TextAlign, ThemeToken};

use super::{MountSpec, Visualization};
use crate::config::{GalleryConfig, LifParams};
use crate::frame::DrawContext;
use crate::layout::{clamp_extent, signed_decimal, text_width, Label, LayoutMode};
use crate::model::{scroll_offset, LifTrace};

pub const ID: &str = "lifCanvas";
pub const HEIGHT: f64 = 380.0;

const PAD: f64 = 14.0;
const V_RANGE: (f64, f64) = (-0.15, 0.35);

#[derive(Debug, Clone, PartialEq)]
pub struct LifLayout {
    pub width: f64,
    pub mode: LayoutMode,
    /// Right edge of the label column; the plot starts here.
    pub label_column: f64,
    pub plot_width: f64,
    pub track_height: f64,
    pub v_top: f64,
    pub i_top: f64,
    pub spike_top: f64,
    pub threshold_y: f64,
    pub reset_y: f64,
    threshold: f64,
    reset: f64,
}

impl LifLayout {
    pub fn for_width(width: f64) -> Self {
        Self::new(width, &LifParams::default())
    }

    pub fn new(width: f64, params: &LifParams) -> Self {
        let label_column = clamp_extent(80.0, 110.0, 0.12 * width);
        let track_height = (HEIGHT - PAD * 2.0 - 20.0) / 3.0;
        let v_top = PAD;
        let mut layout = Self {
            width,
            mode: LayoutMode::for_width(width),
            label_column,
            plot_width: (width - label_column - PAD).max(0.0),
            track_height,
            v_top,
            i_top: PAD + track_height + 16.0,
            spike_top: PAD + track_height * 2.0 + 32.0,
            threshold_y: 0.0,
            reset_y: 0.0,
            threshold: params.threshold,
            reset: params.reset,
        };
        layout.threshold_y = layout.track_y(params.threshold, v_top, V_RANGE);
        layout.reset_y = layout.track_y(params.reset, v_top, V_RANGE);
        layout
    }

    /// Map `value` in `range` onto a track whose top edge is `top`.
    pub fn track_y(&self, value: f64, top: f64, range: (f64, f64)) -> f64 {
        let (lo, hi) = range;
        top + self.track_height - (value - lo) / (hi - lo) * self.track_height
    }

    pub fn plot(&self) -> Rect {
        Rect::new(self.label_column, 0.0, self.plot_width, HEIGHT)
    }

    pub fn labels(&self) -> Vec<Label> {
        let x = self.label_column - 8.0;
        let track = Font::semibold(11.0);
        let guide = Font::semibold(10.0);
        let mid = self.track_height / 2.0 + 4.0;

        let (text, font) = match self.mode {
            LayoutMode::Compact => ("↑ inject", guide),
            LayoutMode::Full => ("↑ cascade inject", guide),
        };
        let w = text_width(text, font.size);
        let anchor = (self.label_column + self.plot_width * 0.55)
            .min(self.width - PAD - w)
            .max(self.label_column + 4.0);

        vec![
            Label::new("v_mem", Point::new(x, self.v_top + mid), track, TextAlign::Right, ThemeToken::Teal),
            Label::new("i_syn", Point::new(x, self.i_top + mid), track, TextAlign::Right, ThemeToken::Green),
            Label::new("spikes", Point::new(x, self.spike_top + 16.0), track, TextAlign::Right, ThemeToken::Coral),
            Label::new(
                format!("thresh {}", signed_decimal(self.threshold)),
                Point::new(x, self.threshold_y + 4.0),
                guide,
                TextAlign::Right,
                Paint::new(ThemeToken::Coral, 0.9),
            ),
            Label::new(
                format!("reset {}", signed_decimal(self.reset)),
                Point::new(x, self.reset_y + 4.0),
                guide,
                TextAlign::Right,
                ThemeToken::Muted,
            ),
            Label::new(
                text,
                Point::new(anchor, self.i_top + self.track_height + 2.0),
                font,
                TextAlign::Left,
                Paint::new(ThemeToken::Amber, 0.65),
            ),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct LifView {
    params: LifParams,
    trace: LifTrace,
    i_range: (f64, f64),
}

impl LifView {
    pub fn new(config: &GalleryConfig) -> Self {
        let params = config.lif.clone();
        let trace = LifTrace::simulate(&params);
        let peak = trace.samples().iter().fold(0.0_f64, |m, s| m.max(s.i_syn));
        Self {
            i_range: (0.0, (peak * 1.08).max(0.05)),
            trace,
            params,
        }
    }

    pub fn trace(&self) -> &LifTrace {
        &self.trace
    }
}

impl Visualization for LifView {
    fn mount(&self) -> MountSpec {
        MountSpec {
            id: ID,
            height: HEIGHT,
            pointer: false,
        }
    }

    fn draw(&self, ctx: &mut DrawContext, clock: f64) {
        let layout = LifLayout::new(ctx.width(), &self.params);
        let left = layout.label_column;
        let th = layout.track_height;
        let columns = layout.plot_width.floor() as usize;
        let offset = scroll_offset(clock, self.params.scroll_rate, self.trace.len());

        ctx.clip(layout.plot());

        let mut refractory_run: Option<usize> = None;
        for px in 0..=columns {
            let sample = if px < columns { self.trace.at(offset, px) } else { None };
            let refractory = sample.is_some_and(|s| s.refractory);
            match (refractory, refractory_run) {
                (true, None) => refractory_run = Some(px),
                (false, Some(start)) => {
                    let x = left + start as f64;
                    let w = (px - start) as f64;
                    let shade = Paint::new(ThemeToken::Coral, 0.06);
                    ctx.fill_rect(Rect::new(x, layout.v_top, w, th + 2.0), shade);
                    ctx.fill_rect(Rect::new(x, layout.i_top, w, th + 2.0), shade);
                    refractory_run = None;
                }
                _ => {}
            }
            if sample.is_some_and(|s| s.cascade) {
                ctx.fill_rect(
                    Rect::new(left + px as f64, layout.i_top, 2.0, th),
                    Paint::new(ThemeToken::Amber, 0.3),
                );
            }
        }

        let right = left + layout.plot_width;
        ctx.dashed_line(
            Point::new(left, layout.threshold_y),
            Point::new(right, layout.threshold_y),
            Paint::new(ThemeToken::Coral, 0.6),
            1.0,
            Dash::new(5.0, 4.0),
        );
        ctx.dashed_line(
            Point::new(left, layout.reset_y),
            Point::new(right, layout.reset_y),
            Paint::new(ThemeToken::Border2, 0.7),
            1.0,
            Dash::new(5.0, 4.0),
        );

        let mut v_points = Vec::with_capacity(columns);
        let mut i_points = Vec::with_capacity(columns);
        for px in 0..columns {
            let Some(s) = self.trace.at(offset, px) else {
                break;
            };
            let x = left + px as f64;
            v_points.push(Point::new(x, layout.track_y(s.v, layout.v_top, V_RANGE)));
            i_points.push(Point::new(x, layout.track_y(s.i_syn, layout.i_top, self.i_range)));
        }
        ctx.polyline(v_points, ThemeToken::Teal, 2.2);
        ctx.polyline(i_points, ThemeToken::Green, 1.8);

        for px in 0..columns {
            if !self.trace.at(offset, px).is_some_and(|s| s.spike) {
                continue;
            }
            let x = left + px as f64;
            ctx.line(
                Point::new(x, layout.spike_top + 4.0),
                Point::new(x, layout.spike_top + 26.0),
                ThemeToken::Coral,
                2.0,
            );
            ctx.text(
                Point::new(x, layout.threshold_y - 10.0),
                "▲",
                Paint::new(ThemeToken::Coral, 0.9),
                Font::bold(9.0),
                TextAlign::Center,
            );
        }
        ctx.unclip();

        for label in layout.labels() {
            ctx.label(&label);
        }
        ctx.line(
            Point::new(left, 0.0),
            Point::new(left, HEIGHT),
            Paint::new(ThemeToken::Border2, 0.35),
            1.0,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_column_scales_between_bounds() {
        assert_eq!(LifLayout::for_width(200.0).label_column, 80.0);
        assert_eq!(LifLayout::for_width(800.0).label_column, 96.0);
        assert_eq!(LifLayout::for_width(2000.0).label_column, 110.0);
    }

    #[test]
    fn guide_labels_use_typographic_minus() {
        let labels = LifLayout::for_width(600.0).labels();
        assert!(labels.iter().any(|l| l.text == "reset −0.1"));
        assert!(labels.iter().any(|l| l.text == "thresh 0.25"));
    }

    #[test]
    fn threshold_sits_above_reset() {
        let layout = LifLayout::for_width(600.0);
        assert!(layout.threshold_y < layout.reset_y);
        assert!(layout.threshold_y > layout.v_top);
        assert!(layout.reset_y < layout.v_top + layout.track_height);
    }

    #[test]
    fn synaptic_range_covers_trace() {
        let view = LifView::new(&GalleryConfig::default());
        let peak = view.trace().samples().iter().fold(0.0_f64, |m, s| m.max(s.i_syn));
        assert!(view.i_range.1 > peak);
    }
}
