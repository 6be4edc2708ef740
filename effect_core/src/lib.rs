// effect_core: scroll-triggered WebGL reveal effects for page images.
// The engine below is pure and host-testable; `web` binds it to the DOM and WebGL2.

mod dev_controls;
mod easing;
mod engine;
mod error;
mod geometry;
mod kernel;
mod plane;
mod scroll;
mod shaders;
mod trigger;
mod tween;
mod types;
mod uniforms;
#[cfg(target_arch = "wasm32")]
pub mod web;

use wasm_bindgen::prelude::*;

pub use dev_controls::{has_query_flag, progress_label, slider_to_progress};
pub use easing::Ease;
pub use engine::{BoundsChange, EffectEngine};
pub use error::EffectError;
pub use geometry::{clip_transform, CellCounts, PlaneMesh};
pub use kernel::{evaluate, DistanceMetric, FragmentInput, FragmentSample};
pub use plane::{PlaneRecord, PlaneRegistry};
pub use scroll::{ScrollDirection, ScrollTracker};
pub use shaders::ShaderPair;
pub use trigger::{TriggerAction, VisibilityTrigger};
pub use tween::{ProgressDriver, Tween};
pub use types::*;
pub use uniforms::{UniformSet, UniformValue};

/// Install the panic hook and the console logger.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    #[cfg(target_arch = "wasm32")]
    wasm_logger::init(wasm_logger::Config::default());
}

/// Validate a config and return it with every default filled in.
#[wasm_bindgen]
pub fn parse_config(config_json: &str) -> Result<String, JsValue> {
    normalize_config(config_json).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn normalize_config(config_json: &str) -> Result<String, EffectError> {
    let config = EffectConfig::from_json(config_json)?;
    Ok(serde_json::to_string(&config)?)
}

/// Mounted effect exposed to JavaScript.
/// Holds nothing when the renderer failed and the plain-image fallback is showing.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub struct EntryEffects {
    app: Option<std::rc::Rc<std::cell::RefCell<web::App>>>,
    dev_mode: bool,
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
impl EntryEffects {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<EntryEffects, JsValue> {
        let config = EffectConfig::from_json(config_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?;
        let app = web::mount(config)?;
        let dev_mode = app
            .as_ref()
            .map(|app| app.borrow().engine().is_dev_mode())
            .unwrap_or(false);
        log::info!(
            "entry effects mounted (webgl: {}, dev: {})",
            app.is_some(),
            dev_mode
        );
        Ok(EntryEffects { app, dev_mode })
    }

    /// Drive every plane's progress directly, cancelling running tweens.
    pub fn set_progress(&self, value: f32) {
        if let Some(app) = &self.app {
            app.borrow_mut().engine_mut().set_all_progress(value);
        }
    }

    pub fn plane_count(&self) -> usize {
        self.app
            .as_ref()
            .map(|app| app.borrow().plane_count())
            .unwrap_or(0)
    }

    pub fn is_dev_mode(&self) -> bool {
        self.dev_mode
    }

    /// Stop the effect on one image. Returns false when it was not tracked.
    pub fn release(&self, element: &web_sys::Element) -> bool {
        match &self.app {
            Some(app) => app.borrow_mut().release(element),
            None => false,
        }
    }

    pub fn destroy(&mut self) {
        if let Some(app) = self.app.take() {
            app.borrow_mut().destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_fills_defaults() {
        let json = normalize_config("{}").unwrap();
        let config: EffectConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, EffectConfig::default());
    }

    #[test]
    fn normalize_keeps_overrides() {
        let json = normalize_config(r#"{"variant":"wave","grid_size":32}"#).unwrap();
        let config: EffectConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.variant, ShaderVariant::Wave);
        assert_eq!(config.grid_size, 32.0);
    }

    #[test]
    fn normalize_rejects_bad_config() {
        assert!(normalize_config(r#"{"grid_size":0}"#).is_err());
        assert!(normalize_config("not json").is_err());
    }
}
