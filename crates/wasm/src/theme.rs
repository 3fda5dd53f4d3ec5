//! Samples theme tokens from the document's computed style and follows the
//! user's color-scheme preference.

use spikeviz_core::theme_provider::{sample, ThemeSource};
use spikeviz_protocol::{ColorScheme, Theme};
use wasm_bindgen::JsValue;
use web_sys::{CssStyleDeclaration, MediaQueryList, Window};

use crate::listener::Listener;

const LIGHT_QUERY: &str = "(prefers-color-scheme: light)";

struct ComputedStyle(CssStyleDeclaration);

impl ThemeSource for ComputedStyle {
    fn token_value(&self, variable: &str) -> Option<String> {
        self.0.get_property_value(variable).ok()
    }
}

fn light_query(window: &Window) -> Option<MediaQueryList> {
    window.match_media(LIGHT_QUERY).ok().flatten()
}

pub fn preferred_scheme(window: &Window) -> ColorScheme {
    if light_query(window).is_some_and(|q| q.matches()) {
        ColorScheme::Light
    } else {
        ColorScheme::Dark
    }
}

/// Build a fresh snapshot from the root element's custom properties.
pub fn read_theme(window: &Window) -> Theme {
    let scheme = preferred_scheme(window);
    let style = window
        .document()
        .and_then(|d| d.document_element())
        .and_then(|root| window.get_computed_style(&root).ok().flatten());
    match style {
        Some(style) => sample(scheme, &ComputedStyle(style)),
        None => Theme::for_scheme(scheme),
    }
}

/// Call `on_change` whenever the color-scheme preference flips.
pub fn watch_scheme(
    window: &Window,
    mut on_change: impl FnMut() + 'static,
) -> Result<Option<Listener>, JsValue> {
    let Some(query) = light_query(window) else {
        return Ok(None);
    };
    Listener::install(&query, "change", move |_| on_change()).map(Some)
}
