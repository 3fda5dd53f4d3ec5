use serde::{Deserialize, Serialize};

use crate::commands::Paint;
use crate::types::Color;

/// Semantic color tokens resolved by the renderer's active theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeToken {
    // Accents
    Teal,
    Amber,
    Coral,
    Blue,
    Green,
    Purple,

    // Backgrounds
    Panel,
    Card,
    Code,
    Code2,

    // Text tiers
    Text,
    Muted,
    Faint,

    // Border tiers
    Border,
    Border2,

    /// Fixed white used for spike highlights; not sampled from the document.
    Glint,
}

impl ThemeToken {
    pub const COUNT: usize = 16;

    pub const ALL: [ThemeToken; Self::COUNT] = [
        ThemeToken::Teal,
        ThemeToken::Amber,
        ThemeToken::Coral,
        ThemeToken::Blue,
        ThemeToken::Green,
        ThemeToken::Purple,
        ThemeToken::Panel,
        ThemeToken::Card,
        ThemeToken::Code,
        ThemeToken::Code2,
        ThemeToken::Text,
        ThemeToken::Muted,
        ThemeToken::Faint,
        ThemeToken::Border,
        ThemeToken::Border2,
        ThemeToken::Glint,
    ];

    /// The CSS custom property this token is sampled from, if any.
    pub fn css_variable(self) -> Option<&'static str> {
        Some(match self {
            ThemeToken::Teal => "--teal",
            ThemeToken::Amber => "--amber",
            ThemeToken::Coral => "--coral",
            ThemeToken::Blue => "--blue",
            ThemeToken::Green => "--green",
            ThemeToken::Purple => "--purple",
            ThemeToken::Panel => "--bg-panel",
            ThemeToken::Card => "--bg-card",
            ThemeToken::Code => "--bg-code",
            ThemeToken::Code2 => "--bg-code2",
            ThemeToken::Text => "--text-main",
            ThemeToken::Muted => "--text-muted",
            ThemeToken::Faint => "--text-faint",
            ThemeToken::Border => "--border",
            ThemeToken::Border2 => "--border2",
            ThemeToken::Glint => return None,
        })
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ColorScheme {
    #[default]
    Dark,
    Light,
}

/// An immutable palette snapshot. Hosts build a new one on every color-scheme
/// change and hand it out whole; nothing mutates a theme that is in use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub scheme: ColorScheme,
    colors: [Color; ThemeToken::COUNT],
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            scheme: ColorScheme::Dark,
            colors: [
                Color::rgb(0x2d, 0xd4, 0xbf),
                Color::rgb(0xf5, 0x9e, 0x0b),
                Color::rgb(0xf8, 0x71, 0x71),
                Color::rgb(0x60, 0xa5, 0xfa),
                Color::rgb(0x4a, 0xde, 0x80),
                Color::rgb(0xa7, 0x8b, 0xfa),
                Color::rgb(0x0f, 0x14, 0x19),
                Color::rgb(0x16, 0x1c, 0x24),
                Color::rgb(0x1c, 0x23, 0x2d),
                Color::rgb(0x23, 0x2b, 0x36),
                Color::rgb(0xe6, 0xed, 0xf3),
                Color::rgb(0x9a, 0xa5, 0xb1),
                Color::rgb(0x6b, 0x76, 0x82),
                Color::rgb(0x2a, 0x33, 0x40),
                Color::rgb(0x3a, 0x46, 0x56),
                Color::rgb(0xff, 0xff, 0xff),
            ],
        }
    }

    pub fn light() -> Self {
        Self {
            scheme: ColorScheme::Light,
            colors: [
                Color::rgb(0x0d, 0x94, 0x88),
                Color::rgb(0xd9, 0x77, 0x06),
                Color::rgb(0xdc, 0x26, 0x26),
                Color::rgb(0x25, 0x63, 0xeb),
                Color::rgb(0x16, 0xa3, 0x4a),
                Color::rgb(0x7c, 0x3a, 0xed),
                Color::rgb(0xff, 0xff, 0xff),
                Color::rgb(0xf7, 0xf8, 0xfa),
                Color::rgb(0xee, 0xf1, 0xf5),
                Color::rgb(0xe4, 0xe8, 0xee),
                Color::rgb(0x1f, 0x29, 0x33),
                Color::rgb(0x52, 0x60, 0x6d),
                Color::rgb(0x7b, 0x87, 0x94),
                Color::rgb(0xd9, 0xde, 0xe5),
                Color::rgb(0xc3, 0xca, 0xd4),
                Color::rgb(0xff, 0xff, 0xff),
            ],
        }
    }

    pub fn for_scheme(scheme: ColorScheme) -> Self {
        match scheme {
            ColorScheme::Dark => Self::dark(),
            ColorScheme::Light => Self::light(),
        }
    }

    #[inline]
    pub fn resolve(&self, token: ThemeToken) -> Color {
        self.colors[token.index()]
    }

    /// Resolve a paint to a concrete color, applying its alpha.
    pub fn resolve_paint(&self, paint: Paint) -> Color {
        self.resolve(paint.token).with_alpha(paint.alpha)
    }

    /// Builder-style override used while sampling a document's variables.
    pub fn with_color(mut self, token: ThemeToken, color: Color) -> Self {
        self.colors[token.index()] = color;
        self
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_lists_every_token_in_index_order() {
        for (i, token) in ThemeToken::ALL.iter().enumerate() {
            assert_eq!(token.index(), i);
        }
    }

    #[test]
    fn only_glint_has_no_css_variable() {
        let unmapped: Vec<_> = ThemeToken::ALL
            .iter()
            .filter(|t| t.css_variable().is_none())
            .collect();
        assert_eq!(unmapped, vec![&ThemeToken::Glint]);
        assert_eq!(ThemeToken::Panel.css_variable(), Some("--bg-panel"));
    }

    #[test]
    fn glint_is_white_in_both_schemes() {
        assert_eq!(Theme::dark().resolve(ThemeToken::Glint), Color::rgb(255, 255, 255));
        assert_eq!(Theme::light().resolve(ThemeToken::Glint), Color::rgb(255, 255, 255));
    }

    #[test]
    fn with_color_overrides_one_token() {
        let teal = Color::rgb(1, 2, 3);
        let theme = Theme::dark().with_color(ThemeToken::Teal, teal);
        assert_eq!(theme.resolve(ThemeToken::Teal), teal);
        assert_eq!(theme.resolve(ThemeToken::Amber), Theme::dark().resolve(ThemeToken::Amber));
    }

    #[test]
    fn resolve_paint_applies_alpha() {
        let c = Theme::dark().resolve_paint(Paint::new(ThemeToken::Coral, 0.5));
        assert_eq!((c.r, c.g, c.b), (0xf8, 0x71, 0x71));
        assert!((c.a - 0.5).abs() < 1e-6);
    }

    #[test]
    fn theme_round_trips_through_json() {
        let theme = Theme::light();
        let json = serde_json::to_string(&theme).unwrap();
        let back: Theme = serde_json::from_str(&json).unwrap();
        assert_eq!(back, theme);
    }
}
