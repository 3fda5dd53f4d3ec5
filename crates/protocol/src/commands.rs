use serde::{Deserialize, Serialize};

use crate::shared_str::SharedStr;
use crate::theme::ThemeToken;
use crate::types::{Point, Rect, Transform};

/// A single, stateless render instruction.
///
/// Views emit a `Vec<RenderCommand>` for each frame, in logical (CSS) pixels.
/// Renderers consume this list sequentially. Each command carries all the
/// data it needs, and every color is a theme token resolved by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderCommand {
    /// Replace (never compose) the current transform.
    SetTransform { transform: Transform },

    FillRect { rect: Rect, paint: Paint },

    StrokeRect { rect: Rect, paint: Paint, width: f64 },

    /// Fill a rectangle with a linear gradient running along `axis`.
    FillGradient {
        rect: Rect,
        axis: GradientAxis,
        stops: Vec<GradientStop>,
    },

    DrawLine {
        from: Point,
        to: Point,
        paint: Paint,
        width: f64,
        dash: Option<Dash>,
    },

    /// Stroke an open path through `points`.
    DrawPolyline {
        points: Vec<Point>,
        paint: Paint,
        width: f64,
    },

    FillCircle {
        center: Point,
        radius: f64,
        paint: Paint,
    },

    /// Radial glow: `paint` at `inner_radius`, fading to transparent at
    /// `outer_radius`.
    FillGlow {
        center: Point,
        inner_radius: f64,
        outer_radius: f64,
        paint: Paint,
    },

    /// Draw a text string. `position.y` is the alphabetic baseline.
    DrawText {
        position: Point,
        text: SharedStr,
        paint: Paint,
        font: Font,
        align: TextAlign,
    },

    /// Restrict subsequent drawing to a rectangular region.
    SetClip { rect: Rect },

    /// Remove the active clip region.
    ClearClip,

    /// Begin a logical group (e.g. a track). Renderers may use this for
    /// batching, layer separation, or accessibility.
    BeginGroup {
        id: SharedStr,
        label: Option<SharedStr>,
    },

    /// End the current group.
    EndGroup,
}

/// A theme color with an extra opacity multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Paint {
    pub token: ThemeToken,
    pub alpha: f32,
}

impl Paint {
    pub const fn solid(token: ThemeToken) -> Self {
        Self { token, alpha: 1.0 }
    }

    pub fn new(token: ThemeToken, alpha: f64) -> Self {
        let alpha = if alpha.is_finite() {
            alpha.clamp(0.0, 1.0) as f32
        } else {
            0.0
        };
        Self { token, alpha }
    }
}

impl From<ThemeToken> for Paint {
    fn from(token: ThemeToken) -> Self {
        Self::solid(token)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontWeight {
    Regular,
    SemiBold,
    Bold,
}

impl FontWeight {
    pub fn css_weight(self) -> u16 {
        match self {
            Self::Regular => 400,
            Self::SemiBold => 600,
            Self::Bold => 700,
        }
    }
}

/// Monospace font.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Font {
    pub size: f64,
    pub weight: FontWeight,
}

impl Font {
    pub const fn regular(size: f64) -> Self {
        Self {
            size,
            weight: FontWeight::Regular,
        }
    }

    pub const fn semibold(size: f64) -> Self {
        Self {
            size,
            weight: FontWeight::SemiBold,
        }
    }

    pub const fn bold(size: f64) -> Self {
        Self {
            size,
            weight: FontWeight::Bold,
        }
    }

    /// CSS shorthand, e.g. `600 11px IBM Plex Mono, monospace`.
    pub fn css(&self) -> String {
        format!(
            "{} {}px IBM Plex Mono, monospace",
            self.weight.css_weight(),
            self.size
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn css(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

/// Line dash pattern in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dash {
    pub on: f64,
    pub off: f64,
}

impl Dash {
    pub const fn new(on: f64, off: f64) -> Self {
        Self { on, off }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradientAxis {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    /// Position along the gradient axis in `[0, 1]`.
    pub offset: f64,
    pub paint: Paint,
}

impl GradientStop {
    pub fn new(offset: f64, paint: Paint) -> Self {
        Self { offset, paint }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paint_alpha_is_clamped() {
        assert_eq!(Paint::new(ThemeToken::Teal, 1.7).alpha, 1.0);
        assert_eq!(Paint::new(ThemeToken::Teal, -0.2).alpha, 0.0);
        assert_eq!(Paint::new(ThemeToken::Teal, f64::NAN).alpha, 0.0);
    }

    #[test]
    fn font_css_shorthand() {
        assert_eq!(Font::semibold(11.0).css(), "600 11px IBM Plex Mono, monospace");
        assert_eq!(Font::bold(9.5).css(), "700 9.5px IBM Plex Mono, monospace");
    }

    #[test]
    fn commands_serialize_to_json() {
        let cmd = RenderCommand::DrawText {
            position: Point::new(4.0, 12.0),
            text: "v_mem".into(),
            paint: ThemeToken::Teal.into(),
            font: Font::semibold(11.0),
            align: TextAlign::Right,
        };
        let json = serde_json::to_string(&cmd).unwrap_or_default();
        assert!(json.contains("\"DrawText\""));
        assert!(json.contains("v_mem"));
        let back: Option<RenderCommand> = serde_json::from_str(&json).ok();
        assert_eq!(back, Some(cmd));
    }
}
