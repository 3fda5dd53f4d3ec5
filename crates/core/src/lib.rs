//! Spiking-network visualizations rendered through a host-neutral command
//! protocol.
//!
//! Each view owns a small numeric model, declares the surface it mounts on
//! and records a frame of [`RenderCommand`](spikeviz_protocol::RenderCommand)s
//! from the model state, the clock and the surface width. Hosts (the browser
//! bridge, the SVG snapshot renderer) replay those commands.

pub mod config;
pub mod error;
pub mod frame;
pub mod layout;
pub mod model;
pub mod registry;
pub mod surface;
pub mod svg;
pub mod theme_provider;
pub mod views;

pub use config::GalleryConfig;
pub use error::{ConfigurationError, ThemeError};
pub use frame::DrawContext;
pub use layout::{Label, LayoutMode};
pub use registry::{AnimationRegistry, RenderedFrame, Scheduler};
pub use surface::{BackingSize, StaticHost, Surface, SurfaceHost};
pub use theme_provider::{ThemeProvider, ThemeSource};
pub use views::{default_gallery, FrameInput, MountSpec, Visualization};

/// Register every stock view on `host`, in document order.
///
/// Views whose element is missing are skipped and reported alongside the
/// registry; the rest keep running.
pub fn mount_gallery(
    host: &dyn SurfaceHost,
    config: &GalleryConfig,
) -> (AnimationRegistry, Vec<ConfigurationError>) {
    let mut registry = AnimationRegistry::new();
    let mut failures = Vec::new();
    for view in default_gallery(config) {
        if let Err(err) = registry.register(host, view) {
            tracing::warn!(%err, "visualization left inert");
            failures.push(err);
        }
    }
    (registry, failures)
}
