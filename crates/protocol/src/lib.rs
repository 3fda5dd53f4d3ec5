pub mod commands;
pub mod shared_str;
pub mod theme;
pub mod types;

pub use commands::{Dash, Font, FontWeight, GradientAxis, GradientStop, Paint, RenderCommand, TextAlign};
pub use shared_str::SharedStr;
pub use theme::{ColorScheme, Theme, ThemeToken};
pub use types::{Color, Point, Rect, Transform};
