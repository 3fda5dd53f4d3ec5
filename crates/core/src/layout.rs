//! Shared responsive-layout conventions.
//!
//! Views derive every horizontal extent from the current width through
//! [`clamp_extent`], switch between two legend arrangements with
//! [`LayoutMode`], and describe their static text as [`Label`]s so the
//! no-overlap guarantee can be checked without rendering.

use spikeviz_protocol::{Font, Paint, Point, Rect, SharedStr, TextAlign};

/// Widths below this use the compact arrangement.
pub const COMPACT_BREAKPOINT: f64 = 500.0;

/// Narrowest width the label guarantees are maintained for.
pub const MIN_LAYOUT_WIDTH: f64 = 200.0;

/// Monospace advance per character, as a fraction of the font size.
pub const MONO_ADVANCE: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    /// Stacked or abbreviated legends, smaller glyphs.
    Compact,
    /// Side-by-side legends, full labels.
    Full,
}

impl LayoutMode {
    pub fn for_width(width: f64) -> Self {
        if width >= COMPACT_BREAKPOINT {
            Self::Full
        } else {
            Self::Compact
        }
    }

    pub fn is_compact(self) -> bool {
        self == Self::Compact
    }

    /// Pick the compact or full variant of a value.
    pub fn pick<T>(self, compact: T, full: T) -> T {
        match self {
            Self::Compact => compact,
            Self::Full => full,
        }
    }
}

/// `value` limited to `[min, max]`. A non-finite value yields `min`.
pub fn clamp_extent(min: f64, max: f64, value: f64) -> f64 {
    if value.is_finite() {
        min.max(max.min(value))
    } else {
        min
    }
}

/// Advance width of `text` in the monospace face at `size`.
pub fn text_width(text: &str, size: f64) -> f64 {
    text.chars().count() as f64 * size * MONO_ADVANCE
}

/// A piece of static text a view draws, positioned by its baseline anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: SharedStr,
    pub position: Point,
    pub font: Font,
    pub align: TextAlign,
    pub paint: Paint,
}

impl Label {
    pub fn new(
        text: impl Into<SharedStr>,
        position: Point,
        font: Font,
        align: TextAlign,
        paint: impl Into<Paint>,
    ) -> Self {
        Self {
            text: text.into(),
            position,
            font,
            align,
            paint: paint.into(),
        }
    }

    pub fn width(&self) -> f64 {
        text_width(&self.text, self.font.size)
    }

    /// Ink box: `0.8·size` above the baseline to `0.2·size` below it.
    pub fn bounds(&self) -> Rect {
        let w = self.width();
        let x = match self.align {
            TextAlign::Left => self.position.x,
            TextAlign::Center => self.position.x - w / 2.0,
            TextAlign::Right => self.position.x - w,
        };
        let size = self.font.size;
        Rect::new(x, self.position.y - 0.8 * size, w, size)
    }
}

/// The first pair of labels whose boxes overlap, if any.
pub fn first_overlap(labels: &[Label]) -> Option<(usize, usize)> {
    let boxes: Vec<Rect> = labels.iter().map(Label::bounds).collect();
    for (i, a) in boxes.iter().enumerate() {
        for (j, b) in boxes.iter().enumerate().skip(i + 1) {
            if a.intersects(b) {
                return Some((i, j));
            }
        }
    }
    None
}

/// Smallest stride `k` such that labels `k` cells apart clear each other.
pub fn label_stride(cell: f64, label_width: f64, gap: f64) -> usize {
    if !(cell.is_finite() && cell > 0.0) {
        return 1;
    }
    let needed = ((label_width + gap) / cell).ceil();
    if needed.is_finite() && needed > 1.0 {
        needed as usize
    } else {
        1
    }
}

/// Decimal text with a typographic minus, e.g. `−0.1`.
pub fn signed_decimal(value: f64) -> String {
    if value < 0.0 {
        format!("−{}", -value)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spikeviz_protocol::ThemeToken;

    #[test]
    fn mode_switches_at_breakpoint() {
        assert_eq!(LayoutMode::for_width(499.9), LayoutMode::Compact);
        assert_eq!(LayoutMode::for_width(500.0), LayoutMode::Full);
        assert_eq!(LayoutMode::for_width(f64::NAN), LayoutMode::Compact);
    }

    #[test]
    fn clamp_extent_limits_and_guards() {
        assert_eq!(clamp_extent(12.0, 26.0, 4.0), 12.0);
        assert_eq!(clamp_extent(12.0, 26.0, 30.0), 26.0);
        assert_eq!(clamp_extent(12.0, 26.0, 17.5), 17.5);
        assert_eq!(clamp_extent(12.0, 26.0, f64::NAN), 12.0);
        assert_eq!(clamp_extent(12.0, 26.0, f64::INFINITY), 12.0);
    }

    #[test]
    fn label_bounds_follow_alignment() {
        let label = |align| {
            Label::new("spikes", Point::new(100.0, 50.0), Font::regular(10.0), align, ThemeToken::Coral)
        };
        assert_eq!(label(TextAlign::Left).bounds(), Rect::new(100.0, 42.0, 36.0, 10.0));
        assert_eq!(label(TextAlign::Center).bounds(), Rect::new(82.0, 42.0, 36.0, 10.0));
        assert_eq!(label(TextAlign::Right).bounds(), Rect::new(64.0, 42.0, 36.0, 10.0));
    }

    #[test]
    fn text_width_counts_chars_not_bytes() {
        assert_eq!(text_width("α·β", 10.0), 18.0);
    }

    #[test]
    fn finds_overlapping_pair() {
        let font = Font::regular(10.0);
        let labels = vec![
            Label::new("T0", Point::new(0.0, 10.0), font, TextAlign::Left, ThemeToken::Muted),
            Label::new("T1", Point::new(0.0, 30.0), font, TextAlign::Left, ThemeToken::Muted),
            Label::new("T2", Point::new(5.0, 32.0), font, TextAlign::Left, ThemeToken::Muted),
        ];
        assert_eq!(first_overlap(&labels), Some((1, 2)));
        assert_eq!(first_overlap(&labels[..2]), None);
    }

    #[test]
    fn stride_skips_crowded_headers() {
        assert_eq!(label_stride(28.0, 16.2, 2.0), 1);
        assert_eq!(label_stride(8.0, 16.2, 2.0), 3);
        assert_eq!(label_stride(0.0, 16.2, 2.0), 1);
    }

    #[test]
    fn negative_decimals_use_typographic_minus() {
        assert_eq!(signed_decimal(-0.1), "−0.1");
        assert_eq!(signed_decimal(0.25), "0.25");
    }
}
