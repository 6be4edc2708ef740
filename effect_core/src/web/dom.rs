// Thin DOM helpers: element lookup, bounds, fallbacks, and self-removing event listeners.

use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{
    Document, Element, Event, EventTarget, HtmlElement, HtmlImageElement, Node, Window,
};

use crate::types::{PixelRect, Timestamp};

/// Body class marking that WebGL effects are unavailable.
pub const NO_WEBGL_CLASS: &str = "no-webgl";

pub fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no window"))
}

pub fn document() -> Result<Document, JsValue> {
    window()?
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))
}

pub fn now() -> Timestamp {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| Timestamp::from_millis_f64(p.now()))
        .unwrap_or_default()
}

pub fn element_bounds(element: &Element) -> PixelRect {
    let rect = element.get_bounding_client_rect();
    PixelRect::new(
        rect.x() as f32,
        rect.y() as f32,
        rect.width() as f32,
        rect.height() as f32,
    )
}

pub fn viewport_size(window: &Window) -> (f64, f64) {
    let width = window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    let height = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    (width, height)
}

/// Every image matching `selector`. Non-image matches are skipped with a warning.
pub fn effect_images(
    document: &Document,
    selector: &str,
) -> Result<Vec<HtmlImageElement>, JsValue> {
    let nodes = document.query_selector_all(selector)?;
    let mut images = Vec::with_capacity(nodes.length() as usize);
    for i in 0..nodes.length() {
        let Some(node) = nodes.get(i) else {
            continue;
        };
        match node.dyn_into::<HtmlImageElement>() {
            Ok(image) => images.push(image),
            Err(_) => log::warn!("{selector} matched a non-image element, skipping"),
        }
    }
    Ok(images)
}

pub fn same_node(a: &Node, b: &Node) -> bool {
    a.is_same_node(Some(b))
}

pub fn set_opacity(element: &HtmlElement, value: &str) {
    if let Err(err) = element.style().set_property("opacity", value) {
        log::warn!("could not set opacity: {:?}", err);
    }
}

/// Show every tracked image as a plain `<img>` and mark the body.
pub fn reveal_all(document: &Document, selector: &str) {
    if let Some(body) = document.body() {
        if let Err(err) = body.class_list().add_1(NO_WEBGL_CLASS) {
            log::warn!("could not mark body: {:?}", err);
        }
    }
    match effect_images(document, selector) {
        Ok(images) => images.iter().for_each(|image| set_opacity(image, "1")),
        Err(err) => log::error!("could not query {selector}: {:?}", err),
    }
}

/// An event listener that detaches itself when dropped.
pub struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    pub fn add(
        target: &EventTarget,
        event: &'static str,
        callback: impl FnMut(Event) + 'static,
    ) -> Result<Self, JsValue> {
        let callback = Closure::<dyn FnMut(Event)>::new(callback);
        target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
        Ok(Listener {
            target: target.clone(),
            event,
            callback,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self.target.remove_event_listener_with_callback(
            self.event,
            self.callback.as_ref().unchecked_ref(),
        );
    }
}
