//! Reward-modulated STDP: spike pairs, eligibility traces and the gated
//! weight change, scrolling left.

use spikeviz_protocol::{Dash, Font, Paint, Point, Rect, TextAlign, ThemeToken};

use super::{MountSpec, Visualization};
use crate::config::GalleryConfig;
use crate::frame::DrawContext;
use crate::layout::{clamp_extent, Label, LayoutMode};
use crate::model::{scroll_offset, wrap_index, StdpTrace};

pub const ID: &str = "stdpCanvas";
pub const HEIGHT: f64 = 420.0;

const TRACKS: usize = 4;
const TRACK_GAP: f64 = 6.0;

#[derive(Debug, Clone, PartialEq)]
pub struct StdpLayout {
    pub width: f64,
    pub mode: LayoutMode,
    pub label_column: f64,
    /// Legend column right of the plot.
    pub right_column: f64,
    pub plot_width: f64,
    pub track_height: f64,
    pub tops: [f64; TRACKS],
}

impl StdpLayout {
    pub fn for_width(width: f64) -> Self {
        let mode = LayoutMode::for_width(width);
        let label_column = match mode {
            LayoutMode::Compact => clamp_extent(52.0, 60.0, 0.12 * width),
            LayoutMode::Full => clamp_extent(84.0, 110.0, 0.09 * width),
        };
        let right_column = clamp_extent(80.0, 96.0, 0.1 * width);
        let track_height = (HEIGHT - 28.0 - 24.0) / TRACKS as f64;
        let mut tops = [0.0; TRACKS];
        for (k, top) in tops.iter_mut().enumerate() {
            *top = 14.0 + k as f64 * (track_height + TRACK_GAP);
        }
        Self {
            width,
            mode,
            label_column,
            right_column,
            plot_width: (width - label_column - right_column).max(0.0),
            track_height,
            tops,
        }
    }

    pub fn plot(&self) -> Rect {
        Rect::new(self.label_column, 0.0, self.plot_width, HEIGHT)
    }

    fn midline(&self, track: usize) -> f64 {
        self.tops[track] + self.track_height / 2.0
    }

    pub fn labels(&self) -> Vec<Label> {
        let (names, font) = match self.mode {
            LayoutMode::Compact => (["pre spk", "pre tr", "post tr", "r × ΔW"], Font::semibold(9.0)),
            LayoutMode::Full => (
                ["pre  spikes", "pre  trace", "post trace", "reward × ΔW"],
                Font::semibold(10.0),
            ),
        };
        let tokens = [ThemeToken::Teal, ThemeToken::Teal, ThemeToken::Coral, ThemeToken::Green];
        let mut labels: Vec<Label> = names
            .into_iter()
            .zip(tokens)
            .enumerate()
            .map(|(k, (name, token))| {
                Label::new(
                    name,
                    Point::new(self.label_column - 4.0, self.midline(k) + 4.0),
                    font,
                    TextAlign::Right,
                    token,
                )
            })
            .collect();

        labels.push(Label::new(
            "post ▲",
            Point::new(self.label_column + 4.0, self.tops[0] + self.track_height - 3.0),
            Font::regular(9.0),
            TextAlign::Left,
            Paint::new(ThemeToken::Coral, 0.8),
        ));

        let x = self.label_column + self.plot_width + 8.0;
        let mid = self.midline(3);
        let bottom = self.tops[3] + self.track_height;
        let legend = [
            ("LTP +", mid - 4.0, ThemeToken::Green),
            ("LTD −", mid + 14.0, ThemeToken::Coral),
            ("dW_final =", bottom - 16.0, ThemeToken::Text),
            ("dW×(2·rew−1)", bottom - 4.0, ThemeToken::Muted),
        ];
        labels.extend(legend.into_iter().map(|(text, y, token)| {
            Label::new(text, Point::new(x, y), Font::regular(9.0), TextAlign::Left, token)
        }));
        labels
    }
}

#[derive(Debug, Clone)]
pub struct StdpView {
    trace: StdpTrace,
    scroll_rate: f64,
    trace_peak: f64,
}

impl StdpView {
    pub fn new(config: &GalleryConfig) -> Self {
        let trace = StdpTrace::simulate(&config.stdp, &mut config.rng_for(ID));
        let trace_peak = trace
            .pre_trace
            .iter()
            .chain(&trace.post_trace)
            .fold(1.0_f64, |m, &v| m.max(v));
        Self {
            trace,
            scroll_rate: config.stdp.scroll_rate,
            trace_peak,
        }
    }

    pub fn trace(&self) -> &StdpTrace {
        &self.trace
    }

    fn trace_line(&self, layout: &StdpLayout, track: usize, values: &[f64], offset: usize) -> Vec<Point> {
        let columns = layout.plot_width.floor() as usize;
        let top = layout.tops[track] + 4.0;
        let span = layout.track_height - 8.0;
        (0..columns)
            .filter_map(|px| {
                let v = values.get(wrap_index(offset, px, values.len()))?;
                Some(Point::new(
                    layout.label_column + px as f64,
                    top + span - v / self.trace_peak * span,
                ))
            })
            .collect()
    }
}

impl Visualization for StdpView {
    fn mount(&self) -> MountSpec {
        MountSpec {
            id: ID,
            height: HEIGHT,
            pointer: false,
        }
    }

    fn draw(&self, ctx: &mut DrawContext, clock: f64) {
        let layout = StdpLayout::for_width(ctx.width());
        let trace = &self.trace;
        let len = trace.len();
        let offset = scroll_offset(clock, self.scroll_rate, len);
        let columns = layout.plot_width.floor() as usize;
        let left = layout.label_column;
        let th = layout.track_height;

        for top in layout.tops {
            ctx.fill_rect(Rect::new(left, top, layout.plot_width, th), Paint::new(ThemeToken::Code, 0.5));
        }

        ctx.clip(layout.plot());
        let spike_top = layout.tops[0];
        for px in 0..columns {
            let i = wrap_index(offset, px, len);
            let x = left + px as f64;
            if trace.pre.get(i).copied().unwrap_or(false) {
                ctx.line(
                    Point::new(x, spike_top + 8.0),
                    Point::new(x, spike_top + th / 2.0),
                    ThemeToken::Teal,
                    2.0,
                );
            }
            if trace.post.get(i).copied().unwrap_or(false) {
                ctx.text(
                    Point::new(x, spike_top + th - 14.0),
                    "▲",
                    ThemeToken::Coral,
                    Font::bold(10.0),
                    TextAlign::Center,
                );
            }
        }

        ctx.polyline(self.trace_line(&layout, 1, &trace.pre_trace, offset), ThemeToken::Teal, 1.8);
        ctx.polyline(self.trace_line(&layout, 2, &trace.post_trace, offset), ThemeToken::Coral, 1.8);

        let mid = layout.midline(3);
        let reach = th / 2.0 - 4.0;
        ctx.dashed_line(
            Point::new(left, mid),
            Point::new(left + layout.plot_width, mid),
            Paint::new(ThemeToken::Border2, 0.6),
            1.0,
            Dash::new(3.0, 3.0),
        );
        for px in 0..columns {
            let g = trace.gated_change(wrap_index(offset, px, len)).clamp(-1.0, 1.0);
            if g.abs() < 0.01 {
                continue;
            }
            let (token, y) = if g > 0.0 {
                (ThemeToken::Green, mid - g * reach)
            } else {
                (ThemeToken::Coral, mid)
            };
            ctx.fill_rect(
                Rect::new(left + px as f64, y, 1.0, g.abs() * reach),
                Paint::new(token, 0.75),
            );
        }
        ctx.unclip();

        for label in layout.labels() {
            ctx.label(&label);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn four_tracks_of_equal_height() {
        let layout = StdpLayout::for_width(800.0);
        assert_eq!(layout.track_height, 92.0);
        assert_eq!(layout.tops, [14.0, 112.0, 210.0, 308.0]);
        assert!(layout.tops[3] + layout.track_height <= HEIGHT);
    }

    #[test]
    fn label_column_follows_mode() {
        assert_eq!(StdpLayout::for_width(300.0).label_column, 52.0);
        assert_relative_eq!(StdpLayout::for_width(450.0).label_column, 54.0);
        assert_eq!(StdpLayout::for_width(600.0).label_column, 84.0);
        assert_eq!(StdpLayout::for_width(1800.0).label_column, 110.0);
    }

    #[test]
    fn right_legend_fits_inside_surface() {
        for width in [200.0, 499.0, 500.0, 1200.0] {
            let layout = StdpLayout::for_width(width);
            for label in layout.labels() {
                assert!(label.bounds().right() <= width, "{} at {width}", label.text);
            }
        }
    }

    #[test]
    fn right_column_is_clamped() {
        assert_eq!(StdpLayout::for_width(200.0).right_column, 80.0);
        assert_relative_eq!(StdpLayout::for_width(850.0).right_column, 85.0);
        assert_eq!(StdpLayout::for_width(2000.0).right_column, 96.0);
    }

    #[test]
    fn weight_legend_sits_inside_last_track() {
        for width in [200.0, 640.0, 2000.0] {
            let layout = StdpLayout::for_width(width);
            let track = Rect::new(
                layout.label_column + layout.plot_width,
                layout.tops[3],
                layout.right_column,
                layout.track_height,
            );
            let legend: Vec<_> = layout
                .labels()
                .into_iter()
                .filter(|l| ["LTP +", "LTD −", "dW_final =", "dW×(2·rew−1)"].contains(&l.text.as_str()))
                .collect();
            assert_eq!(legend.len(), 4);
            for label in &legend {
                assert!(track.contains_rect(&label.bounds()), "{} at {width}", label.text);
            }
        }
    }

    #[test]
    fn trace_scale_covers_both_traces() {
        let view = StdpView::new(&GalleryConfig::default());
        let max = view
            .trace()
            .pre_trace
            .iter()
            .chain(&view.trace().post_trace)
            .fold(0.0_f64, |m, &v| m.max(v));
        assert!(view.trace_peak >= max);
    }
}
