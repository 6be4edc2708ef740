// Mounted page state: wires DOM events to the effect engine and drives the frame loop.
// One shared scroll listener and one shared resize listener iterate the owned plane list.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use js_sys::Array;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{
    Document, Element, HtmlElement, HtmlImageElement, HtmlInputElement, IntersectionObserver,
    IntersectionObserverEntry, IntersectionObserverInit,
};

use super::dom::{self, Listener};
use super::surface::{GpuPlane, RenderSurface};
use crate::dev_controls;
use crate::engine::{BoundsChange, EffectEngine};
use crate::error::EffectError;
use crate::types::{EffectConfig, PlaneId, Timestamp};

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

struct TrackedImage {
    id: PlaneId,
    image: HtmlImageElement,
    gpu: Option<GpuPlane>,
    // load/error listeners; kept until release so a callback never drops itself
    listeners: Vec<Listener>,
}

pub struct App {
    engine: EffectEngine,
    surface: RenderSurface,
    document: Document,
    images: Vec<TrackedImage>,
    observer: Option<IntersectionObserver>,
    observer_callback: Option<Closure<dyn FnMut(Array, IntersectionObserver)>>,
    listeners: Vec<Listener>,
    retired: Vec<Listener>,
    frame: FrameCallback,
    frame_handle: Option<i32>,
    destroyed: bool,
}

/// Mount the effect. Returns `None` when the renderer could not start and the
/// plain-image fallback was applied instead.
pub fn mount(config: EffectConfig) -> Result<Option<Rc<RefCell<App>>>, JsValue> {
    let window = dom::window()?;
    let document = dom::document()?;
    let search = window.location().search().unwrap_or_default();
    let dev_mode = dev_controls::has_query_flag(&search, &config.dev_query_flag);

    let surface = match RenderSurface::new(
        &document,
        config.variant,
        config.texture.clone(),
        config.max_pixel_ratio,
    ) {
        Ok(surface) => surface,
        Err(err) => {
            log::error!("Error initializing WebGL: {err}");
            dom::reveal_all(&document, &config.selector);
            return Ok(None);
        }
    };

    let app = Rc::new(RefCell::new(App {
        engine: EffectEngine::new(config, dev_mode),
        surface,
        document: document.clone(),
        images: Vec::new(),
        observer: None,
        observer_callback: None,
        listeners: Vec::new(),
        retired: Vec::new(),
        frame: Rc::new(RefCell::new(None)),
        frame_handle: None,
        destroyed: false,
    }));

    App::install(&app, dev_mode)?;

    if document.ready_state() == "complete" {
        App::scan(&app);
    } else {
        let weak = Rc::downgrade(&app);
        let listener = Listener::add(&window, "load", move |_| {
            if let Some(app) = weak.upgrade() {
                App::scan(&app);
            }
        })?;
        app.borrow_mut().listeners.push(listener);
    }

    App::start_frames(&app)?;
    Ok(Some(app))
}

impl App {
    pub fn engine(&self) -> &EffectEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut EffectEngine {
        &mut self.engine
    }

    fn install(app: &Rc<RefCell<App>>, dev_mode: bool) -> Result<(), JsValue> {
        let window = dom::window()?;
        let weak = Rc::downgrade(app);

        let scroll = {
            let weak = weak.clone();
            Listener::add(&window, "scroll", move |_| {
                with_app(&weak, |app| app.on_scroll());
            })?
        };
        let resize = {
            let weak = weak.clone();
            Listener::add(&window, "resize", move |_| {
                with_app(&weak, |app| app.refresh_bounds());
            })?
        };

        let mut this = app.borrow_mut();
        this.listeners.push(scroll);
        this.listeners.push(resize);

        if dev_mode {
            this.bind_dev_panel(&weak)?;
        } else {
            this.create_observer(&weak)?;
        }
        Ok(())
    }

    fn create_observer(&mut self, weak: &Weak<RefCell<App>>) -> Result<(), JsValue> {
        let weak = weak.clone();
        let callback = Closure::<dyn FnMut(Array, IntersectionObserver)>::new(
            move |entries: Array, _observer: IntersectionObserver| {
                with_app(&weak, |app| app.on_intersections(&entries));
            },
        );

        let thresholds: Array = self
            .engine
            .config()
            .observer_thresholds()
            .iter()
            .map(|t| JsValue::from_f64(*t))
            .collect();
        let init = IntersectionObserverInit::new();
        init.set_threshold(&thresholds);

        let observer =
            IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)?;
        self.observer = Some(observer);
        self.observer_callback = Some(callback);
        Ok(())
    }

    fn bind_dev_panel(&mut self, weak: &Weak<RefCell<App>>) -> Result<(), JsValue> {
        if let Some(panel) = self.document.get_element_by_id(dev_controls::PANEL_ID) {
            if let Ok(panel) = panel.dyn_into::<HtmlElement>() {
                panel.style().set_property("display", "flex")?;
            }
        }

        let Some(slider) = self.document.get_element_by_id(dev_controls::SLIDER_ID) else {
            log::warn!("developer mode without #{}", dev_controls::SLIDER_ID);
            return Ok(());
        };
        let Ok(slider) = slider.dyn_into::<HtmlInputElement>() else {
            log::warn!("#{} is not an input", dev_controls::SLIDER_ID);
            return Ok(());
        };
        let label = self.document.get_element_by_id(dev_controls::LABEL_ID);

        let weak = weak.clone();
        let input = slider.clone();
        let listener = Listener::add(&slider, "input", move |_| {
            let Some(progress) = dev_controls::slider_to_progress(&input.value()) else {
                return;
            };
            if let Some(label) = &label {
                let text = dev_controls::progress_label(progress);
                label.set_text_content(Some(text.as_str()));
            }
            with_app(&weak, |app| app.engine.set_all_progress(progress));
        })?;
        self.listeners.push(listener);
        log::info!("developer mode: timeline slider bound");
        Ok(())
    }

    /// Create planes for every matching image not yet tracked.
    fn scan(app: &Rc<RefCell<App>>) {
        let images = {
            let this = app.borrow();
            match dom::effect_images(&this.document, &this.engine.config().selector) {
                Ok(images) => images,
                Err(err) => {
                    log::error!("could not query images: {:?}", err);
                    return;
                }
            }
        };
        for image in images {
            let tracked = app
                .borrow()
                .images
                .iter()
                .any(|t| dom::same_node(&t.image, &image));
            if !tracked {
                App::track(app, image);
            }
        }
    }

    fn track(app: &Rc<RefCell<App>>, image: HtmlImageElement) {
        let weak = Rc::downgrade(app);
        let mut this = app.borrow_mut();

        let bounds = dom::element_bounds(&image);
        let id = this.engine.create_plane(bounds);
        let segments = this
            .engine
            .plane(id)
            .map(|p| p.cells().segments())
            .unwrap_or((1, 1));

        let gpu = match this.surface.create_plane(segments) {
            Ok(gpu) => gpu,
            Err(err) => {
                log::error!("Could not create plane: {err}");
                dom::set_opacity(&image, "1");
                this.engine.release(id);
                return;
            }
        };
        dom::set_opacity(&image, "1");
        this.images.push(TrackedImage {
            id,
            image: image.clone(),
            gpu: Some(gpu),
            listeners: Vec::new(),
        });

        if image.complete() {
            if image.natural_width() > 0 {
                this.on_image_loaded(id);
            } else {
                let message = format!("could not load {}", image.src());
                this.fail_plane(id, EffectError::TextureLoad { plane: id, message });
            }
            return;
        }

        let on_load = {
            let weak = weak.clone();
            Listener::add(&image, "load", move |_| {
                with_app(&weak, |app| app.on_image_loaded(id));
            })
        };
        let on_error = {
            let weak = weak.clone();
            let src = image.src();
            Listener::add(&image, "error", move |_| {
                with_app(&weak, |app| {
                    app.fail_plane(
                        id,
                        EffectError::TextureLoad {
                            plane: id,
                            message: format!("could not load {src}"),
                        },
                    )
                });
            })
        };
        match (on_load, on_error) {
            (Ok(on_load), Ok(on_error)) => {
                if let Some(tracked) = this.tracked_mut(id) {
                    tracked.listeners.push(on_load);
                    tracked.listeners.push(on_error);
                }
            }
            (Err(err), _) | (_, Err(err)) => {
                this.fail_plane(id, EffectError::PlaneCreation(format!("{err:?}")));
            }
        }
    }

    fn tracked_mut(&mut self, id: PlaneId) -> Option<&mut TrackedImage> {
        self.images.iter_mut().find(|t| t.id == id)
    }

    fn on_image_loaded(&mut self, id: PlaneId) {
        let Some(tracked) = self.images.iter().find(|t| t.id == id) else {
            return;
        };
        let Some(gpu) = tracked.gpu.as_ref() else {
            return;
        };
        if let Err(err) = self.surface.upload_texture(gpu, &tracked.image) {
            let message = format!("{err:?}");
            self.fail_plane(id, EffectError::TextureLoad { plane: id, message });
            return;
        }
        let image = tracked.image.clone();

        if let Err(err) = self.engine.mark_ready(id) {
            log::error!("{err}");
            return;
        }
        if let Some(observer) = &self.observer {
            observer.observe(&image);
        }
        log::debug!("plane {:?} ready", id);
    }

    /// Local failure: show the plain image again and drop the plane. Siblings are unaffected.
    fn fail_plane(&mut self, id: PlaneId, err: EffectError) {
        log::error!("Error loading plane: {err}");
        let Some(index) = self.images.iter().position(|t| t.id == id) else {
            return;
        };
        let mut tracked = self.images.remove(index);
        dom::set_opacity(&tracked.image, "1");
        if let Some(observer) = &self.observer {
            observer.unobserve(&tracked.image);
        }
        if let Some(gpu) = tracked.gpu.take() {
            self.surface.delete_plane(gpu);
        }
        // may run inside one of these listeners; detach them later
        self.retired.append(&mut tracked.listeners);
        self.engine.release(id);
    }

    /// Stop tracking an element; its plane and listeners are freed.
    pub fn release(&mut self, element: &Element) -> bool {
        let Some(index) = self
            .images
            .iter()
            .position(|t| dom::same_node(&t.image, element))
        else {
            return false;
        };
        let mut tracked = self.images.remove(index);
        if let Some(observer) = &self.observer {
            observer.unobserve(&tracked.image);
        }
        if let Some(gpu) = tracked.gpu.take() {
            self.surface.delete_plane(gpu);
        }
        self.engine.release(tracked.id);
        true
    }

    fn on_intersections(&mut self, entries: &Array) {
        let now = dom::now();
        for entry in entries.iter() {
            let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                continue;
            };
            let target = entry.target();
            let Some(tracked) = self
                .images
                .iter()
                .find(|t| dom::same_node(&t.image, &target))
            else {
                continue;
            };
            self.engine.on_intersection(
                tracked.id,
                entry.intersection_ratio(),
                entry.is_intersecting(),
                now,
            );
        }
    }

    fn on_scroll(&mut self) {
        if let Ok(window) = dom::window() {
            let offset = window.scroll_y().unwrap_or(0.0);
            self.engine.on_scroll(offset);
        }
        self.refresh_bounds();
    }

    /// Re-measure every image and rebuild meshes whose grid changed.
    fn refresh_bounds(&mut self) {
        for tracked in self.images.iter_mut() {
            let bounds = dom::element_bounds(&tracked.image);
            match self.engine.on_bounds(tracked.id, bounds) {
                Ok(BoundsChange::Regrid) => {
                    let segments = self
                        .engine
                        .plane(tracked.id)
                        .map(|p| p.cells().segments())
                        .unwrap_or((1, 1));
                    if let Some(gpu) = tracked.gpu.as_mut() {
                        // zero-cell grids share the same one-segment mesh
                        if gpu.segments() != segments {
                            self.surface.upload_mesh(gpu, segments);
                        }
                    }
                }
                Ok(BoundsChange::Moved) => {}
                Err(err) => log::warn!("{err}"),
            }
        }
    }

    fn render(&mut self, timestamp_ms: f64) {
        // no listener callback is on the stack here
        self.retired.clear();

        let Ok(window) = dom::window() else {
            return;
        };
        let (width, height) = dom::viewport_size(&window);
        self.surface
            .resize(width, height, window.device_pixel_ratio());

        self.engine.tick(Timestamp::from_millis_f64(timestamp_ms));

        self.surface.begin_frame();
        let viewport = (width as f32, height as f32);
        for tracked in &self.images {
            let (Some(gpu), Some(record)) = (tracked.gpu.as_ref(), self.engine.plane(tracked.id))
            else {
                continue;
            };
            if record.ready {
                self.surface.draw(record, gpu, viewport);
            }
        }
    }

    fn start_frames(app: &Rc<RefCell<App>>) -> Result<(), JsValue> {
        let weak = Rc::downgrade(app);
        let frame = app.borrow().frame.clone();
        let next = frame.clone();

        *frame.borrow_mut() = Some(Closure::<dyn FnMut(f64)>::new(move |timestamp_ms: f64| {
            let Some(app) = weak.upgrade() else {
                return;
            };
            if let Ok(mut this) = app.try_borrow_mut() {
                this.render(timestamp_ms);
            }

            let handle = dom::window().and_then(|window| {
                let next = next.borrow();
                match next.as_ref() {
                    Some(callback) => {
                        window.request_animation_frame(callback.as_ref().unchecked_ref())
                    }
                    None => Err(JsValue::from_str("frame loop stopped")),
                }
            });
            match (handle, app.try_borrow_mut()) {
                (Ok(handle), Ok(mut this)) => this.frame_handle = Some(handle),
                (Ok(_), Err(_)) => {}
                (Err(err), _) => log::debug!("frame loop ended: {:?}", err),
            }
        }));

        let handle = {
            let callback = frame.borrow();
            let callback = callback
                .as_ref()
                .ok_or_else(|| JsValue::from_str("missing frame callback"))?;
            dom::window()?.request_animation_frame(callback.as_ref().unchecked_ref())?
        };
        app.borrow_mut().frame_handle = Some(handle);
        Ok(())
    }

    /// Tear everything down: frame loop, observer, listeners, planes, canvas.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        if let (Some(handle), Ok(window)) = (self.frame_handle.take(), dom::window()) {
            let _ = window.cancel_animation_frame(handle);
        }
        self.frame.borrow_mut().take();

        if let Some(observer) = self.observer.take() {
            observer.disconnect();
        }
        self.observer_callback = None;
        self.listeners.clear();
        self.retired.clear();

        for mut tracked in self.images.drain(..) {
            if let Some(gpu) = tracked.gpu.take() {
                self.surface.delete_plane(gpu);
            }
        }
        self.engine.clear();
        self.surface.dispose();
        log::info!("entry effects destroyed");
    }

    pub fn plane_count(&self) -> usize {
        self.engine.plane_count()
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn with_app(weak: &Weak<RefCell<App>>, f: impl FnOnce(&mut App)) {
    let Some(app) = weak.upgrade() else {
        return;
    };
    let Ok(mut app) = app.try_borrow_mut() else {
        log::warn!("effect state busy, event dropped");
        return;
    };
    f(&mut app);
}
