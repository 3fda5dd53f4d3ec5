//! Keyed animation registry and the frame scheduler that drives it.
//!
//! Modules register against their element id. The scheduler steps every
//! visible module once per frame in registration order and hands back the
//! recorded commands with the theme snapshot they must be painted with.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use spikeviz_protocol::{RenderCommand, Theme};
use tracing::debug;

use crate::error::ConfigurationError;
use crate::surface::{BackingSize, Surface, SurfaceHost};
use crate::theme_provider::ThemeProvider;
use crate::views::{FrameInput, Visualization};

struct Entry {
    surface: Surface,
    view: Box<dyn Visualization>,
    visible: bool,
}

#[derive(Default)]
pub struct AnimationRegistry {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl AnimationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount `view` on the element it names. Fails when the element is
    /// missing or another module already owns it.
    pub fn register(
        &mut self,
        host: &dyn SurfaceHost,
        view: Box<dyn Visualization>,
    ) -> Result<&Surface, ConfigurationError> {
        let spec = view.mount();
        if self.index.contains_key(spec.id) {
            return Err(ConfigurationError::DuplicateSurface(spec.id.to_string()));
        }
        let mut surface = Surface::mount(host, spec.id, spec.height)?;
        if spec.pointer {
            surface.enable_pointer_tracking();
        }
        debug!(
            id = spec.id,
            width = surface.width(),
            height = spec.height,
            pointer = spec.pointer,
            "registered visualization"
        );
        let slot = self.entries.len();
        self.index.insert(spec.id.to_string(), slot);
        self.entries.push(Entry {
            surface,
            view,
            visible: true,
        });
        Ok(&self.entries[slot].surface)
    }

    pub fn surface(&self, id: &str) -> Option<&Surface> {
        self.index.get(id).map(|&i| &self.entries[i].surface)
    }

    pub fn surface_mut(&mut self, id: &str) -> Option<&mut Surface> {
        self.index.get(id).map(|&i| &mut self.entries[i].surface)
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|e| e.surface.id())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry_mut(&mut self, id: &str) -> Option<&mut Entry> {
        self.index.get(id).map(|&i| &mut self.entries[i])
    }
}

impl fmt::Debug for AnimationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| (&e.surface, e.visible)))
            .finish()
    }
}

/// One module's output for one frame.
#[derive(Debug, Clone)]
pub struct RenderedFrame {
    pub id: String,
    pub theme: Arc<Theme>,
    pub commands: Vec<RenderCommand>,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    registry: AnimationRegistry,
    theme: ThemeProvider,
    origin_ms: Option<f64>,
    clock: f64,
    stopped: bool,
}

impl Scheduler {
    pub fn new(registry: AnimationRegistry, theme: ThemeProvider) -> Self {
        Self {
            registry,
            theme,
            origin_ms: None,
            clock: 0.0,
            stopped: false,
        }
    }

    pub fn registry(&self) -> &AnimationRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut AnimationRegistry {
        &mut self.registry
    }

    pub fn theme(&self) -> Arc<Theme> {
        self.theme.current()
    }

    pub fn theme_mut(&mut self) -> &mut ThemeProvider {
        &mut self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) -> Arc<Theme> {
        self.theme.replace(theme)
    }

    /// Seconds since the first frame.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Stop producing frames. Irreversible.
    pub fn stop(&mut self) {
        if !self.stopped {
            debug!(modules = self.registry.len(), "scheduler stopped");
        }
        self.stopped = true;
    }

    /// Skip (or resume) stepping module `id`. Returns `false` for an
    /// unknown id.
    pub fn set_visible(&mut self, id: &str, visible: bool) -> bool {
        match self.registry.entry_mut(id) {
            Some(entry) => {
                entry.visible = visible;
                true
            }
            None => false,
        }
    }

    pub fn is_visible(&self, id: &str) -> Option<bool> {
        self.registry.index.get(id).map(|&i| self.registry.entries[i].visible)
    }

    /// Re-read every container width from `host`, returning the surfaces
    /// whose backing buffer changed.
    pub fn sync_widths(&mut self, host: &dyn SurfaceHost) -> Vec<(String, BackingSize)> {
        self.registry
            .entries
            .iter_mut()
            .filter_map(|e| {
                let width = host.container_width(e.surface.id())?;
                let backing = e.surface.resize(width)?;
                Some((e.surface.id().to_string(), backing))
            })
            .collect()
    }

    /// Step every visible module for the frame at `timestamp_ms`.
    pub fn frame(&mut self, timestamp_ms: f64) -> Vec<RenderedFrame> {
        if self.stopped {
            return Vec::new();
        }
        self.advance_clock(timestamp_ms);
        let clock = self.clock;
        let theme = self.theme.current();

        let mut frames = Vec::with_capacity(self.registry.len());
        for entry in &mut self.registry.entries {
            let surface = &entry.surface;
            if !entry.visible || surface.width() <= 0.0 {
                continue;
            }
            let input = FrameInput {
                clock,
                width: surface.width(),
                height: surface.height(),
                pointer: surface.hovered_pointer(),
            };
            entry.view.update(&input);
            let mut ctx = surface.fill(None);
            ctx.begin_group(surface.id().to_string(), None);
            entry.view.draw(&mut ctx, clock);
            ctx.end_group();
            frames.push(RenderedFrame {
                id: surface.id().to_string(),
                theme: Arc::clone(&theme),
                commands: ctx.finish(),
            });
        }
        frames
    }

    fn advance_clock(&mut self, timestamp_ms: f64) {
        if !timestamp_ms.is_finite() {
            return;
        }
        let origin = *self.origin_ms.get_or_insert(timestamp_ms);
        self.clock = self.clock.max((timestamp_ms - origin) / 1000.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GalleryConfig;
    use crate::surface::StaticHost;
    use crate::views::{default_gallery, CascadeView, EncoderView};

    fn scheduler(width: f64) -> Scheduler {
        let host = StaticHost::new(width, 1.0);
        let mut registry = AnimationRegistry::new();
        for view in default_gallery(&GalleryConfig::default()) {
            registry.register(&host, view).unwrap();
        }
        Scheduler::new(registry, ThemeProvider::default())
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let host = StaticHost::new(600.0, 1.0);
        let config = GalleryConfig::default();
        let mut registry = AnimationRegistry::new();
        registry.register(&host, Box::new(EncoderView::new(&config))).unwrap();
        let err = registry
            .register(&host, Box::new(EncoderView::new(&config)))
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateSurface(id) if id == "encCanvas"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn missing_element_leaves_registry_unchanged() {
        let host = StaticHost::with_elements(600.0, 1.0, ["encCanvas"]);
        let mut registry = AnimationRegistry::new();
        let err = registry
            .register(&host, Box::new(CascadeView::new(&GalleryConfig::default())))
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingElement(id) if id == "casCanvas"));
        assert!(registry.is_empty());
    }

    #[test]
    fn pointer_tracking_follows_mount_spec() {
        let s = scheduler(600.0);
        assert_eq!(s.registry().surface("casCanvas").map(Surface::tracks_pointer), Some(true));
        assert_eq!(s.registry().surface("lifCanvas").map(Surface::tracks_pointer), Some(false));
    }

    #[test]
    fn frames_come_out_in_registration_order() {
        let mut s = scheduler(600.0);
        let ids: Vec<String> = s.frame(16.0).into_iter().map(|f| f.id).collect();
        let registered: Vec<&str> = s.registry().ids().collect();
        assert_eq!(ids, registered);
        assert_eq!(ids.len(), 8);
    }

    #[test]
    fn each_frame_is_grouped_under_its_mount_id() {
        let mut s = scheduler(600.0);
        for frame in s.frame(0.0) {
            let begin = frame
                .commands
                .iter()
                .position(|c| matches!(c, RenderCommand::BeginGroup { .. }));
            // Transform and background fill come first.
            assert_eq!(begin, Some(2), "{}", frame.id);
            assert!(matches!(
                &frame.commands[2],
                RenderCommand::BeginGroup { id, label: None } if *id == frame.id.as_str()
            ));
            assert_eq!(frame.commands.last(), Some(&RenderCommand::EndGroup));
        }
    }

    #[test]
    fn clock_is_relative_and_monotonic() {
        let mut s = scheduler(600.0);
        s.frame(5000.0);
        assert_eq!(s.clock(), 0.0);
        s.frame(6500.0);
        assert_eq!(s.clock(), 1.5);
        s.frame(6000.0);
        assert_eq!(s.clock(), 1.5);
        s.frame(f64::NAN);
        assert_eq!(s.clock(), 1.5);
    }

    #[test]
    fn hidden_modules_are_skipped_and_keep_state() {
        let mut s = scheduler(600.0);
        assert!(s.set_visible("stackCanvas", false));
        assert!(!s.set_visible("nope", false));
        let frames = s.frame(0.0);
        assert!(frames.iter().all(|f| f.id != "stackCanvas"));
        assert_eq!(s.is_visible("stackCanvas"), Some(false));
        s.set_visible("stackCanvas", true);
        assert!(s.frame(16.0).iter().any(|f| f.id == "stackCanvas"));
    }

    #[test]
    fn zero_width_surfaces_are_skipped() {
        let mut s = scheduler(0.0);
        assert!(s.frame(0.0).is_empty());
        let resized = s.sync_widths(&StaticHost::new(320.0, 2.0));
        assert_eq!(resized.len(), 8);
        assert_eq!(s.frame(16.0).len(), 8);
    }

    #[test]
    fn stop_ends_the_loop() {
        let mut s = scheduler(600.0);
        s.stop();
        assert!(s.is_stopped());
        assert!(s.frame(16.0).is_empty());
    }

    #[test]
    fn frames_share_one_theme_snapshot() {
        let mut s = scheduler(600.0);
        let frames = s.frame(0.0);
        assert!(frames.windows(2).all(|w| Arc::ptr_eq(&w[0].theme, &w[1].theme)));
        let light = s.set_theme(Theme::light());
        let next = s.frame(16.0);
        assert!(Arc::ptr_eq(&next[0].theme, &light));
        assert!(!Arc::ptr_eq(&frames[0].theme, &light));
    }
}
