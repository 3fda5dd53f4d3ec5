//! Theme snapshots and their distribution.
//!
//! Draw steps only ever see an immutable `Arc<Theme>`. A color-scheme change
//! builds a complete new snapshot and [`ThemeProvider::replace`] hands it to
//! every subscriber.

use std::fmt;
use std::sync::Arc;

use spikeviz_protocol::{Color, ColorScheme, Theme, ThemeToken};
use tracing::{info, warn};

use crate::error::ThemeError;

/// Where sampled token values come from (computed document style in a
/// browser, a map in tests).
pub trait ThemeSource {
    /// Raw value of a CSS custom property, e.g. `--teal`.
    fn token_value(&self, variable: &str) -> Option<String>;
}

impl ThemeSource for std::collections::HashMap<String, String> {
    fn token_value(&self, variable: &str) -> Option<String> {
        self.get(variable).cloned()
    }
}

/// Build a theme from `source`, keeping the built-in color of `scheme` for
/// any token that is absent or unparseable.
pub fn sample(scheme: ColorScheme, source: &dyn ThemeSource) -> Theme {
    let mut theme = Theme::for_scheme(scheme);
    for token in ThemeToken::ALL {
        let Some(variable) = token.css_variable() else {
            continue;
        };
        let raw = source.token_value(variable).unwrap_or_default();
        if raw.trim().is_empty() {
            warn!(variable, "theme token absent, using built-in color");
            continue;
        }
        match parse_token(variable, &raw) {
            Ok(color) => theme = theme.with_color(token, color),
            Err(err) => warn!(%err, "using built-in color"),
        }
    }
    theme
}

pub fn parse_token(variable: &'static str, value: &str) -> Result<Color, ThemeError> {
    parse_css_color(value).ok_or_else(|| ThemeError::UnparseableColor {
        variable,
        value: value.trim().to_string(),
    })
}

/// Parse `#rgb`, `#rrggbb`, `rgb(r, g, b)` and `rgba(r, g, b, a)`.
pub fn parse_css_color(value: &str) -> Option<Color> {
    let value = value.trim();
    if value.starts_with('#') {
        return Color::from_hex(value);
    }
    let body = value
        .strip_prefix("rgba(")
        .or_else(|| value.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let parts: Vec<&str> = body
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect();

    let channel = |s: &str| -> Option<u8> {
        let v: f64 = s.parse().ok()?;
        v.is_finite().then(|| v.round().clamp(0.0, 255.0) as u8)
    };
    match parts.as_slice() {
        [r, g, b] => Some(Color::rgb(channel(*r)?, channel(*g)?, channel(*b)?)),
        [r, g, b, a] => {
            let alpha: f32 = a.parse().ok()?;
            if !alpha.is_finite() {
                return None;
            }
            Some(Color::rgba(
                channel(*r)?,
                channel(*g)?,
                channel(*b)?,
                alpha.clamp(0.0, 1.0),
            ))
        }
        _ => None,
    }
}

pub type ThemeSubscriber = Box<dyn FnMut(&Arc<Theme>)>;

pub struct ThemeProvider {
    current: Arc<Theme>,
    subscribers: Vec<ThemeSubscriber>,
}

impl ThemeProvider {
    pub fn new(theme: Theme) -> Self {
        Self {
            current: Arc::new(theme),
            subscribers: Vec::new(),
        }
    }

    pub fn current(&self) -> Arc<Theme> {
        Arc::clone(&self.current)
    }

    pub fn subscribe(&mut self, subscriber: ThemeSubscriber) {
        self.subscribers.push(subscriber);
    }

    /// Swap in a whole new snapshot and dispatch it to every subscriber.
    /// Frames already holding the previous snapshot keep it.
    pub fn replace(&mut self, theme: Theme) -> Arc<Theme> {
        info!(scheme = ?theme.scheme, subscribers = self.subscribers.len(), "theme replaced");
        self.current = Arc::new(theme);
        for subscriber in &mut self.subscribers {
            subscriber(&self.current);
        }
        self.current()
    }
}

impl Default for ThemeProvider {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}

impl fmt::Debug for ThemeProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemeProvider")
            .field("current", &self.current)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
