//! Browser host: mounts the gallery onto the page's canvases and drives it
//! from `requestAnimationFrame`.

mod canvas;
mod host;
mod listener;
mod theme;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use js_sys::Array;
use spikeviz_core::{GalleryConfig, RenderedFrame, Scheduler, ThemeProvider};
use spikeviz_protocol::{Theme, ThemeToken};
use tracing::{info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
    console, Event, HtmlCanvasElement, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit, MouseEvent, ResizeObserver, Window,
};

use crate::canvas::CanvasTarget;
use crate::host::DocumentHost;
use crate::listener::Listener;

/// Surfaces further than this outside the viewport stop animating.
const VISIBILITY_MARGIN: &str = "200px";

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

struct Gallery {
    scheduler: Scheduler,
    host: DocumentHost,
    canvases: HashMap<String, CanvasTarget>,
    last: Vec<RenderedFrame>,
}

impl Gallery {
    fn tick(&mut self, timestamp_ms: f64) {
        let frames = self.scheduler.frame(timestamp_ms);
        for frame in &frames {
            let Some(target) = self.canvases.get(&frame.id) else {
                continue;
            };
            if let Err(err) = target.execute(&frame.commands, &frame.theme) {
                warn!(id = %frame.id, ?err, "draw failed");
            }
        }
        self.last = frames;
    }

    fn sync_widths(&mut self) {
        for (id, backing) in self.scheduler.sync_widths(&self.host) {
            let (Some(target), Some(surface)) =
                (self.canvases.get(&id), self.scheduler.registry().surface(&id))
            else {
                continue;
            };
            if let Err(err) = target.apply_backing(backing, surface.css_height()) {
                warn!(%id, ?err, "could not resize canvas");
            }
        }
    }
}

type FrameCallback = Closure<dyn FnMut(f64)>;

/// A running gallery. Dropping the handle without calling [`stop`] leaves
/// the animation loop running.
///
/// [`stop`]: GalleryHandle::stop
#[wasm_bindgen]
pub struct GalleryHandle {
    window: Window,
    gallery: Rc<RefCell<Gallery>>,
    frame_callback: Rc<RefCell<Option<FrameCallback>>>,
    request: Rc<Cell<Option<i32>>>,
    resize: Option<(ResizeObserver, Closure<dyn FnMut(Array)>)>,
    visibility: Option<(IntersectionObserver, Closure<dyn FnMut(Array)>)>,
    listeners: Vec<Listener>,
}

#[wasm_bindgen]
impl GalleryHandle {
    /// Halt the loop, disconnect observers and detach every listener.
    pub fn stop(&mut self) {
        self.gallery.borrow_mut().scheduler.stop();
        if let Some(id) = self.request.take() {
            let _ = self.window.cancel_animation_frame(id);
        }
        self.frame_callback.borrow_mut().take();
        if let Some((observer, _)) = self.resize.take() {
            observer.disconnect();
        }
        if let Some((observer, _)) = self.visibility.take() {
            observer.disconnect();
        }
        self.listeners.clear();
        info!("gallery stopped");
    }

    /// Render commands most recently drawn on `id`, as JSON.
    pub fn frame_json(&self, id: &str) -> Result<String, JsError> {
        let gallery = self.gallery.borrow();
        let frame = gallery
            .last
            .iter()
            .find(|f| f.id == id)
            .ok_or_else(|| JsError::new(&format!("no frame drawn for `{id}`")))?;
        serde_json::to_string(&frame.commands).map_err(|e| JsError::new(&e.to_string()))
    }

    /// Ids of the surfaces that mounted successfully.
    pub fn mounted(&self) -> Vec<String> {
        self.gallery
            .borrow()
            .scheduler
            .registry()
            .ids()
            .map(str::to_string)
            .collect()
    }
}

/// Mount every visualization whose canvas is present and start animating.
///
/// `config_json` overrides the default parameters. Without a seed, one is
/// drawn from `Math.random` so each page load differs.
#[wasm_bindgen]
pub fn mount_gallery(config_json: Option<String>) -> Result<GalleryHandle, JsError> {
    let mut config = match config_json {
        Some(json) => GalleryConfig::from_json(&json).map_err(|e| JsError::new(&e.to_string()))?,
        None => GalleryConfig::default(),
    };
    if config.seed.is_none() {
        config.seed = Some((js_sys::Math::random() * 9_007_199_254_740_992.0) as u64);
    }
    mount(&config).map_err(|err| {
        let message = err.as_string().unwrap_or_else(|| format!("{err:?}"));
        JsError::new(&message)
    })
}

fn mount(config: &GalleryConfig) -> Result<GalleryHandle, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let host = DocumentHost::new(window.clone(), document.clone());
    let (registry, failures) = spikeviz_core::mount_gallery(&host, config);
    for err in &failures {
        console::warn_1(&JsValue::from_str(&format!("spikeviz: {err}")));
    }

    let mut canvases = HashMap::new();
    for id in registry.ids() {
        let target = CanvasTarget::acquire(&document, id)?;
        if let Some(surface) = registry.surface(id) {
            target.apply_backing(surface.backing(), surface.css_height())?;
            if surface.tracks_pointer() {
                target.enable_crosshair()?;
            }
        }
        canvases.insert(id.to_string(), target);
    }

    let mut provider = ThemeProvider::new(theme::read_theme(&window));
    let backdrops: Vec<HtmlCanvasElement> = canvases.values().map(|t| t.canvas.clone()).collect();
    paint_backdrops(&backdrops, &provider.current());
    provider.subscribe(Box::new(move |theme: &Arc<Theme>| paint_backdrops(&backdrops, theme)));
    let scheduler = Scheduler::new(registry, provider);
    let gallery = Rc::new(RefCell::new(Gallery {
        scheduler,
        host,
        canvases,
        last: Vec::new(),
    }));

    let mut listeners = pointer_listeners(&gallery)?;
    {
        let gallery = Rc::clone(&gallery);
        let win = window.clone();
        let watch = theme::watch_scheme(&window, move || {
            gallery.borrow_mut().scheduler.set_theme(theme::read_theme(&win));
        })?;
        listeners.extend(watch);
    }

    let resize = observe_resize(&gallery)?;
    let visibility = observe_visibility(&gallery)?;
    let (frame_callback, request) = start_loop(&window, &gallery)?;

    info!(mounted = gallery.borrow().canvases.len(), failed = failures.len(), "gallery mounted");
    Ok(GalleryHandle {
        window,
        gallery,
        frame_callback,
        request,
        resize: Some(resize),
        visibility: Some(visibility),
        listeners,
    })
}

/// Match each canvas's CSS background to the panel color, so a resize
/// (which clears the bitmap) never flashes the page behind it.
fn paint_backdrops(canvases: &[HtmlCanvasElement], theme: &Theme) {
    let panel = theme.resolve(ThemeToken::Panel).to_css();
    for canvas in canvases {
        if let Err(err) = canvas.style().set_property("background-color", &panel) {
            warn!(id = %canvas.id(), ?err, "could not set canvas backdrop");
        }
    }
}

fn pointer_listeners(gallery: &Rc<RefCell<Gallery>>) -> Result<Vec<Listener>, JsValue> {
    let mut listeners = Vec::new();
    let g = gallery.borrow();
    for (id, target) in &g.canvases {
        let tracks = g
            .scheduler
            .registry()
            .surface(id)
            .is_some_and(|s| s.tracks_pointer());
        if !tracks {
            continue;
        }

        let canvas = target.canvas.clone();
        let shared = Rc::clone(gallery);
        let key = id.clone();
        listeners.push(Listener::install(&target.canvas, "mousemove", move |event: Event| {
            let Some(event) = event.dyn_ref::<MouseEvent>() else {
                return;
            };
            let rect = canvas.get_bounding_client_rect();
            let x = f64::from(event.client_x()) - rect.left();
            let y = f64::from(event.client_y()) - rect.top();
            if let Some(surface) = shared.borrow_mut().scheduler.registry_mut().surface_mut(&key) {
                surface.pointer_move(x, y);
            }
        })?);

        let shared = Rc::clone(gallery);
        let key = id.clone();
        listeners.push(Listener::install(&target.canvas, "mouseleave", move |_| {
            if let Some(surface) = shared.borrow_mut().scheduler.registry_mut().surface_mut(&key) {
                surface.pointer_leave();
            }
        })?);
    }
    Ok(listeners)
}

fn observe_resize(
    gallery: &Rc<RefCell<Gallery>>,
) -> Result<(ResizeObserver, Closure<dyn FnMut(Array)>), JsValue> {
    let shared = Rc::clone(gallery);
    let callback = Closure::wrap(Box::new(move |_entries: Array| {
        shared.borrow_mut().sync_widths();
    }) as Box<dyn FnMut(Array)>);
    let observer = ResizeObserver::new(callback.as_ref().unchecked_ref())?;
    for target in gallery.borrow().canvases.values() {
        if let Some(parent) = target.canvas.parent_element() {
            observer.observe(&parent);
        }
    }
    Ok((observer, callback))
}

fn observe_visibility(
    gallery: &Rc<RefCell<Gallery>>,
) -> Result<(IntersectionObserver, Closure<dyn FnMut(Array)>), JsValue> {
    let shared = Rc::clone(gallery);
    let callback = Closure::wrap(Box::new(move |entries: Array| {
        let mut g = shared.borrow_mut();
        for entry in entries.iter() {
            let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                continue;
            };
            g.scheduler
                .set_visible(&entry.target().id(), entry.is_intersecting());
        }
    }) as Box<dyn FnMut(Array)>);

    let init = IntersectionObserverInit::new();
    init.set_root_margin(VISIBILITY_MARGIN);
    let observer =
        IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)?;
    for target in gallery.borrow().canvases.values() {
        observer.observe(&target.canvas);
    }
    Ok((observer, callback))
}

type LoopState = (Rc<RefCell<Option<FrameCallback>>>, Rc<Cell<Option<i32>>>);

fn start_loop(window: &Window, gallery: &Rc<RefCell<Gallery>>) -> Result<LoopState, JsValue> {
    // The callback re-requests itself, so it lives in a slot it can reach.
    let slot: Rc<RefCell<Option<FrameCallback>>> = Rc::new(RefCell::new(None));
    let request = Rc::new(Cell::new(None));

    let next = Rc::clone(&slot);
    let pending = Rc::clone(&request);
    let shared = Rc::clone(gallery);
    let win = window.clone();
    *slot.borrow_mut() = Some(Closure::wrap(Box::new(move |timestamp: f64| {
        let stopped = {
            let mut g = shared.borrow_mut();
            g.tick(timestamp);
            g.scheduler.is_stopped()
        };
        pending.set(None);
        if stopped {
            return;
        }
        if let Some(callback) = next.borrow().as_ref() {
            match win.request_animation_frame(callback.as_ref().unchecked_ref()) {
                Ok(id) => pending.set(Some(id)),
                Err(err) => warn!(?err, "requestAnimationFrame failed"),
            }
        }
    }) as Box<dyn FnMut(f64)>));

    if let Some(callback) = slot.borrow().as_ref() {
        request.set(Some(
            window.request_animation_frame(callback.as_ref().unchecked_ref())?,
        ));
    }
    Ok((slot, request))
}
