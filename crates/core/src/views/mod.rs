//! The eight visualizations.
//!
//! Each view owns its model, declares the surface it mounts on, and draws a
//! frame from (model state, clock, surface width) alone. Layout metrics live
//! in a per-view `*Layout::for_width` so they can be checked headlessly.

pub mod cascade;
pub mod ema;
pub mod encoder;
pub mod leaky_clamp;
pub mod lif;
pub mod resonance;
pub mod stack;
pub mod stdp;

use spikeviz_protocol::Point;

use crate::config::GalleryConfig;
use crate::frame::DrawContext;

pub use cascade::CascadeView;
pub use ema::EmaView;
pub use encoder::EncoderView;
pub use leaky_clamp::LeakyClampView;
pub use lif::LifView;
pub use resonance::ResonanceView;
pub use stack::StackView;
pub use stdp::StdpView;

/// Where and how a view wants to be mounted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MountSpec {
    pub id: &'static str,
    /// Logical (CSS pixel) height.
    pub height: f64,
    pub pointer: bool,
}

/// Everything a view may read while updating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    /// Seconds since the scheduler started.
    pub clock: f64,
    pub width: f64,
    pub height: f64,
    /// Pointer position when hovering a tracking surface.
    pub pointer: Option<Point>,
}

pub trait Visualization {
    fn mount(&self) -> MountSpec;

    /// Advance incremental state. Views whose model is precomputed or
    /// closed-form in the clock keep the default.
    fn update(&mut self, _input: &FrameInput) {}

    /// Record one frame. The context has already been cleared.
    fn draw(&self, ctx: &mut DrawContext, clock: f64);
}

/// The stock gallery, in registration order.
pub fn default_gallery(config: &GalleryConfig) -> Vec<Box<dyn Visualization>> {
    vec![
        Box::new(EncoderView::new(config)),
        Box::new(LifView::new(config)),
        Box::new(CascadeView::new(config)),
        Box::new(ResonanceView::new(config)),
        Box::new(StdpView::new(config)),
        Box::new(LeakyClampView::new(config)),
        Box::new(EmaView::new(config)),
        Box::new(StackView::new(config)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gallery_mounts_in_document_order() {
        let gallery = default_gallery(&GalleryConfig::default());
        let mounts: Vec<(&str, f64, bool)> = gallery
            .iter()
            .map(|v| {
                let m = v.mount();
                (m.id, m.height, m.pointer)
            })
            .collect();
        assert_eq!(
            mounts,
            vec![
                ("encCanvas", 380.0, false),
                ("lifCanvas", 380.0, false),
                ("casCanvas", 440.0, true),
                ("resCanvas", 400.0, false),
                ("stdpCanvas", 420.0, false),
                ("lkyCanvas", 340.0, false),
                ("emaCanvas", 380.0, false),
                ("stackCanvas", 820.0, false),
            ]
        );
    }
}
