//! Device-pixel-ratio-correct, resize-aware drawing surfaces.
//!
//! A [`Surface`] never talks to a canvas directly. It tracks the logical size
//! of one mount element, computes the backing buffer size the host must apply,
//! and hands out [`DrawContext`]s that always begin by replacing the transform
//! with `(dpr, 0, 0, dpr, 0, 0)`.

use std::collections::HashSet;

use spikeviz_protocol::{Paint, Point, Rect, ThemeToken, Transform};
use tracing::debug;

use crate::error::ConfigurationError;
use crate::frame::DrawContext;

/// Pointer position reported while the pointer is outside the surface.
/// Far enough away that every hit-test against it fails.
pub const POINTER_SENTINEL: Point = Point {
    x: -9999.0,
    y: -9999.0,
};

/// Width changes smaller than this (in logical pixels) are layout jitter.
pub const RESIZE_EPSILON: f64 = 0.5;

/// Environment a surface is mounted into.
pub trait SurfaceHost {
    /// Logical width of the container holding element `id`, or `None` when
    /// the document has no such element.
    fn container_width(&self, id: &str) -> Option<f64>;

    fn device_pixel_ratio(&self) -> f64;
}

/// Headless host for tests and snapshots: every element shares one width.
#[derive(Debug, Clone)]
pub struct StaticHost {
    pub width: f64,
    pub dpr: f64,
    elements: Option<HashSet<String>>,
}

impl StaticHost {
    /// A host where every id resolves.
    pub fn new(width: f64, dpr: f64) -> Self {
        Self {
            width,
            dpr,
            elements: None,
        }
    }

    /// A host that only knows the listed ids.
    pub fn with_elements<I, S>(width: f64, dpr: f64, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            width,
            dpr,
            elements: Some(ids.into_iter().map(Into::into).collect()),
        }
    }
}

impl SurfaceHost for StaticHost {
    fn container_width(&self, id: &str) -> Option<f64> {
        match &self.elements {
            Some(ids) if !ids.contains(id) => None,
            _ => Some(self.width),
        }
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.dpr
    }
}

/// Size of the backing pixel buffer, in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BackingSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct Surface {
    id: String,
    height: f64,
    width: f64,
    dpr: f64,
    backing: BackingSize,
    pointer: Point,
    tracking: bool,
}

impl Surface {
    /// Bind to element `id` with a fixed logical height and synchronize the
    /// width once.
    pub fn mount(
        host: &dyn SurfaceHost,
        id: &str,
        height: f64,
    ) -> Result<Self, ConfigurationError> {
        if !(height.is_finite() && height > 0.0) {
            return Err(ConfigurationError::InvalidHeight {
                id: id.to_string(),
                height,
            });
        }
        let container = host
            .container_width(id)
            .ok_or_else(|| ConfigurationError::MissingElement(id.to_string()))?;

        let dpr = host.device_pixel_ratio();
        let mut surface = Self {
            id: id.to_string(),
            height,
            width: 0.0,
            dpr: if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 },
            backing: BackingSize::default(),
            pointer: POINTER_SENTINEL,
            tracking: false,
        };
        surface.resize(container);
        Ok(surface)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Last synchronized logical width; 0 before the first synchronization.
    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// The CSS height the host applies to the element.
    pub fn css_height(&self) -> f64 {
        self.height
    }

    pub fn dpr(&self) -> f64 {
        self.dpr
    }

    pub fn backing(&self) -> BackingSize {
        self.backing
    }

    /// Synchronize to a new container width.
    ///
    /// Returns the backing size the host must apply, or `None` when the change
    /// is below [`RESIZE_EPSILON`] or the width is not a number.
    pub fn resize(&mut self, width: f64) -> Option<BackingSize> {
        if !width.is_finite() {
            return None;
        }
        let width = width.max(0.0);
        if (width - self.width).abs() < RESIZE_EPSILON {
            return None;
        }
        self.width = width;
        self.backing = BackingSize {
            width: device_pixels(width, self.dpr),
            height: device_pixels(self.height, self.dpr),
        };
        debug!(
            id = %self.id,
            width,
            backing_width = self.backing.width,
            backing_height = self.backing.height,
            "surface resized"
        );
        Some(self.backing)
    }

    /// A fresh context scaled to logical pixels. Never composes onto an
    /// earlier transform.
    pub fn context(&self) -> DrawContext {
        DrawContext::new(Transform::scale(self.dpr), self.width, self.height)
    }

    /// Clear the whole logical area (panel background by default).
    pub fn fill(&self, paint: Option<Paint>) -> DrawContext {
        let mut ctx = self.context();
        ctx.fill_rect(
            Rect::new(0.0, 0.0, self.width, self.height),
            paint.unwrap_or(Paint::solid(ThemeToken::Panel)),
        );
        ctx
    }

    pub fn enable_pointer_tracking(&mut self) {
        self.tracking = true;
    }

    pub fn tracks_pointer(&self) -> bool {
        self.tracking
    }

    /// Record a pointer position relative to the surface's top-left corner.
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        if self.tracking && x.is_finite() && y.is_finite() {
            self.pointer = Point::new(x, y);
        }
    }

    pub fn pointer_leave(&mut self) {
        self.pointer = POINTER_SENTINEL;
    }

    /// Raw pointer position; [`POINTER_SENTINEL`] while not hovering.
    pub fn pointer(&self) -> Point {
        self.pointer
    }

    pub fn hovered_pointer(&self) -> Option<Point> {
        (self.pointer != POINTER_SENTINEL).then_some(self.pointer)
    }
}

fn device_pixels(logical: f64, dpr: f64) -> u32 {
    let px = (logical * dpr).round();
    if px.is_finite() && px > 0.0 {
        px.min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spikeviz_protocol::RenderCommand;

    fn mounted(width: f64, dpr: f64, height: f64) -> Surface {
        Surface::mount(&StaticHost::new(width, dpr), "encCanvas", height).unwrap()
    }

    #[test]
    fn width_is_synchronized_on_mount() {
        let surface = mounted(640.0, 1.0, 380.0);
        assert_eq!(surface.width(), 640.0);
        assert_eq!(surface.backing(), BackingSize { width: 640, height: 380 });
    }

    #[test]
    fn backing_rounds_fractional_device_pixels() {
        let mut surface = mounted(100.0, 1.5, 341.0);
        assert_eq!(surface.backing().height, 512);
        let size = surface.resize(333.3).unwrap();
        assert_eq!(size.width, 500);
    }

    #[test]
    fn sub_epsilon_changes_are_ignored() {
        let mut surface = mounted(800.0, 2.0, 380.0);
        assert_eq!(surface.resize(800.4), None);
        assert_eq!(surface.resize(799.6), None);
        assert_eq!(surface.width(), 800.0);
        assert!(surface.resize(800.5).is_some());
    }

    #[test]
    fn negative_width_clamps_and_nan_is_ignored() {
        let mut surface = mounted(300.0, 1.0, 380.0);
        assert_eq!(surface.resize(f64::NAN), None);
        assert_eq!(surface.resize(-40.0), Some(BackingSize { width: 0, height: 380 }));
        assert_eq!(surface.width(), 0.0);
    }

    #[test]
    fn missing_element_fails_fast() {
        let host = StaticHost::with_elements(800.0, 1.0, ["lifCanvas"]);
        let err = Surface::mount(&host, "encCanvas", 380.0).unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingElement(id) if id == "encCanvas"));
    }

    #[test]
    fn rejects_non_positive_height() {
        let host = StaticHost::new(800.0, 1.0);
        assert!(matches!(
            Surface::mount(&host, "encCanvas", 0.0),
            Err(ConfigurationError::InvalidHeight { .. })
        ));
    }

    #[test]
    fn bogus_dpr_falls_back_to_one() {
        let surface = mounted(200.0, f64::NAN, 100.0);
        assert_eq!(surface.dpr(), 1.0);
    }

    #[test]
    fn repeated_contexts_replace_the_transform() {
        let surface = mounted(800.0, 2.0, 380.0);
        for _ in 0..3 {
            let commands = surface.context().finish();
            assert_eq!(
                commands.first(),
                Some(&RenderCommand::SetTransform {
                    transform: Transform::scale(2.0)
                })
            );
            assert_eq!(commands.len(), 1);
        }
    }

    #[test]
    fn fill_defaults_to_panel() {
        let surface = mounted(300.0, 1.0, 200.0);
        let commands = surface.fill(None).finish();
        assert!(matches!(
            commands.get(1),
            Some(RenderCommand::FillRect { rect, paint })
                if *rect == Rect::new(0.0, 0.0, 300.0, 200.0) && paint.token == ThemeToken::Panel
        ));
    }

    #[test]
    fn pointer_requires_tracking() {
        let mut surface = mounted(300.0, 1.0, 200.0);
        surface.pointer_move(10.0, 10.0);
        assert_eq!(surface.hovered_pointer(), None);
        surface.enable_pointer_tracking();
        surface.pointer_move(10.0, 10.0);
        assert_eq!(surface.hovered_pointer(), Some(Point::new(10.0, 10.0)));
        surface.pointer_leave();
        assert_eq!(surface.pointer(), POINTER_SENTINEL);
        assert_eq!(surface.hovered_pointer(), None);
    }
}
