//! Temporal encoder: fast and slow current columns rising from the
//! embedding bar.

use spikeviz_protocol::{
    Dash, Font, GradientAxis, GradientStop, Paint, Point, Rect, TextAlign, ThemeToken,
};

use super::{MountSpec, Visualization};
use crate::config::GalleryConfig;
use crate::frame::DrawContext;
use crate::layout::{clamp_extent, text_width, Label, LayoutMode};
use crate::model::encoder::{ColumnKind, TemporalEncoder, COLUMNS, FAST_COLUMNS};

pub const ID: &str = "encCanvas";
pub const HEIGHT: f64 = 380.0;

const GAP: f64 = 8.0;
const BRACKET_TOP: f64 = 70.0;
const BRACKET_TEXT: &str = "max~15";

#[derive(Debug, Clone, PartialEq)]
pub struct EncoderLayout {
    pub width: f64,
    pub mode: LayoutMode,
    /// Embedding bar.
    pub embedding: Rect,
    pub column_width: f64,
    pub start_x: f64,
    /// Baseline all columns grow up from.
    pub bar_base: f64,
    pub max_bar_height: f64,
    /// Right edge of the last fast column plus padding.
    pub fast_right: f64,
}

impl EncoderLayout {
    pub fn for_width(width: f64) -> Self {
        let emb_y = HEIGHT - 72.0;
        let emb_pad = (width - 350.0).max(0.0) / 2.0;
        let emb_pad = emb_pad.max(20.0);
        let column_width = clamp_extent(12.0, 26.0, (width - 80.0) / COLUMNS as f64 - GAP);
        let total = COLUMNS as f64 * column_width + (COLUMNS - 1) as f64 * GAP;
        let start_x = (width - total) / 2.0;
        let bar_base = emb_y - 14.0;
        Self {
            width,
            mode: LayoutMode::for_width(width),
            embedding: Rect::new(emb_pad, emb_y, (width - 2.0 * emb_pad).max(0.0), 36.0),
            column_width,
            start_x,
            bar_base,
            max_bar_height: bar_base - 60.0,
            fast_right: start_x
                + (FAST_COLUMNS - 1) as f64 * (column_width + GAP)
                + column_width
                + 6.0,
        }
    }

    pub fn column_x(&self, index: usize) -> f64 {
        self.start_x + index as f64 * (self.column_width + GAP)
    }

    pub fn labels(&self) -> Vec<Label> {
        let mut labels = Vec::with_capacity(COLUMNS + 5);
        let (fast, slow) = match self.mode {
            LayoutMode::Compact => {
                let font = Font::bold(10.0);
                let x = self.width / 2.0;
                (
                    Label::new("▮▮▮▮▮▮▮▮ T_fast × 8   scale=15", Point::new(x, 28.0), font, TextAlign::Center, ThemeToken::Teal),
                    Label::new("▮▮ T_slow × 2   scale=5", Point::new(x, 44.0), font, TextAlign::Center, ThemeToken::Amber),
                )
            }
            LayoutMode::Full => {
                let font = Font::bold(12.0);
                let x = (self.start_x - 20.0).max(20.0);
                (
                    Label::new("▮▮▮▮▮▮▮▮ T_fast × 8   scale = 15.0", Point::new(x, 28.0), font, TextAlign::Left, ThemeToken::Teal),
                    Label::new("▮▮ T_slow × 2   scale = 5.0", Point::new(x, 48.0), font, TextAlign::Left, ThemeToken::Amber),
                )
            }
        };
        labels.push(fast);
        labels.push(slow);

        let caption = match self.mode {
            LayoutMode::Compact => Label::new(
                "x = proj(embed(token))",
                Point::new(self.width / 2.0, self.embedding.y + 22.0),
                Font::semibold(10.0),
                TextAlign::Center,
                ThemeToken::Muted,
            ),
            LayoutMode::Full => Label::new(
                "x = temporal_proj(embed(token))  ∈ ℝ⁵¹²",
                Point::new(self.width / 2.0, self.embedding.y + 22.0),
                Font::semibold(12.0),
                TextAlign::Center,
                ThemeToken::Muted,
            ),
        };
        labels.push(caption);

        for i in 0..COLUMNS {
            labels.push(Label::new(
                format!("T{}", i + 1),
                Point::new(self.column_x(i) + self.column_width / 2.0, self.bar_base + 12.0),
                Font::semibold(10.0),
                TextAlign::Center,
                ThemeToken::Muted,
            ));
        }

        // Flip to the inside of the bracket when the right edge is near.
        let font = Font::regular(10.0);
        let y = (BRACKET_TOP + self.bar_base) / 2.0 + 4.0;
        let outside = self.fast_right + 7.0;
        let bracket = if outside + text_width(BRACKET_TEXT, font.size) <= self.width - 2.0 {
            Label::new(BRACKET_TEXT, Point::new(outside, y), font, TextAlign::Left, Paint::new(ThemeToken::Text, 0.4))
        } else {
            Label::new(BRACKET_TEXT, Point::new(self.fast_right, y), font, TextAlign::Right, Paint::new(ThemeToken::Text, 0.4))
        };
        labels.push(bracket);
        labels
    }
}

#[derive(Debug, Clone)]
pub struct EncoderView {
    encoder: TemporalEncoder,
}

impl EncoderView {
    pub fn new(config: &GalleryConfig) -> Self {
        Self {
            encoder: TemporalEncoder::new(config.encoder.clone()),
        }
    }
}

impl Visualization for EncoderView {
    fn mount(&self) -> MountSpec {
        MountSpec {
            id: ID,
            height: HEIGHT,
            pointer: false,
        }
    }

    fn draw(&self, ctx: &mut DrawContext, clock: f64) {
        let layout = EncoderLayout::for_width(ctx.width());
        let emb = layout.embedding;

        ctx.gradient(
            emb,
            GradientAxis::Horizontal,
            vec![
                GradientStop::new(0.0, Paint::new(ThemeToken::Teal, 0.18)),
                GradientStop::new(0.35, Paint::new(ThemeToken::Blue, 0.2)),
                GradientStop::new(0.65, Paint::new(ThemeToken::Purple, 0.18)),
                GradientStop::new(1.0, Paint::new(ThemeToken::Amber, 0.18)),
            ],
        );
        ctx.stroke_rect(emb, ThemeToken::Border2, 1.0);

        for (i, column) in self.encoder.columns(clock).enumerate() {
            let token = match column.kind {
                ColumnKind::Fast => ThemeToken::Teal,
                ColumnKind::Slow => ThemeToken::Amber,
            };
            let x = layout.column_x(i);
            let cx = x + layout.column_width / 2.0;
            let bar_h = layout.max_bar_height * column.fraction;
            let bar_y = layout.bar_base - bar_h;

            ctx.dashed_line(
                Point::new(cx, emb.y),
                Point::new(cx, layout.bar_base),
                Paint::new(token, 0.22),
                1.0,
                Dash::new(3.0, 4.0),
            );
            ctx.gradient(
                Rect::new(x, bar_y, layout.column_width, bar_h),
                GradientAxis::Vertical,
                vec![
                    GradientStop::new(0.0, Paint::new(token, 0.9)),
                    GradientStop::new(1.0, Paint::new(token, 0.35)),
                ],
            );
            ctx.fill_rect(Rect::new(x, bar_y, layout.column_width, 3.0), Paint::new(token, 0.95));
        }

        let bracket_x = layout.fast_right + 4.0;
        ctx.dashed_line(
            Point::new(bracket_x, BRACKET_TOP),
            Point::new(bracket_x, layout.bar_base),
            Paint::new(ThemeToken::Text, 0.18),
            1.0,
            Dash::new(2.0, 3.0),
        );

        for label in layout.labels() {
            ctx.label(&label);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_clamp_to_floor_and_ceiling() {
        assert_eq!(EncoderLayout::for_width(200.0).column_width, 12.0);
        assert_eq!(EncoderLayout::for_width(1600.0).column_width, 26.0);
        let mid = EncoderLayout::for_width(380.0);
        assert!((mid.column_width - 22.0).abs() < 1e-9);
    }

    #[test]
    fn embedding_pad_never_below_twenty() {
        let narrow = EncoderLayout::for_width(250.0);
        assert_eq!(narrow.embedding.x, 20.0);
        let wide = EncoderLayout::for_width(1000.0);
        assert_eq!(wide.embedding.x, 325.0);
        assert_eq!(wide.embedding.w, 350.0);
    }

    #[test]
    fn bracket_label_flips_near_right_edge() {
        let labels = EncoderLayout::for_width(200.0).labels();
        let bracket = labels.last().unwrap();
        assert_eq!(bracket.text, "max~15");
        assert!(bracket.bounds().right() <= 200.0);
    }

    #[test]
    fn tallest_bar_stays_below_legend() {
        let layout = EncoderLayout::for_width(800.0);
        let legend_bottom = layout
            .labels()
            .iter()
            .take(2)
            .map(|l| l.bounds().bottom())
            .fold(0.0, f64::max);
        assert!(layout.bar_base - layout.max_bar_height > legend_bottom);
    }
}
