use spikeviz_core::SurfaceHost;
use web_sys::{Document, Window};

/// Resolves mount elements against the live document. Widths come from each
/// canvas's parent, which is what the resize observer watches.
pub struct DocumentHost {
    window: Window,
    document: Document,
}

impl DocumentHost {
    pub fn new(window: Window, document: Document) -> Self {
        Self { window, document }
    }
}

impl SurfaceHost for DocumentHost {
    fn container_width(&self, id: &str) -> Option<f64> {
        let element = self.document.get_element_by_id(id)?;
        let width = element
            .parent_element()
            .map_or_else(|| element.get_bounding_client_rect().width(), |p| {
                p.get_bounding_client_rect().width()
            });
        Some(width)
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.window.device_pixel_ratio()
    }
}
