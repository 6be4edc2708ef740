// Strong typing over strings. Newtypes for plane ids, timestamps, and pixel rectangles.
// Configuration passed from JS lives here too; every field carries a serde default.

use serde::{Deserialize, Serialize};

use crate::easing::Ease;
use crate::error::EffectError;

/// Identifier of a tracked plane inside the registry. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlaneId(u32);

impl PlaneId {
    pub fn new(id: u32) -> Self {
        PlaneId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

/// Timestamp in microseconds. Newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    pub fn from_micros(us: u64) -> Self {
        Timestamp(us)
    }

    /// From a `performance.now()` style reading. Negative readings clamp to zero.
    pub fn from_millis_f64(ms: f64) -> Self {
        Timestamp((ms.max(0.0) * 1000.0).round() as u64)
    }

    pub fn from_secs_f64(secs: f64) -> Self {
        Timestamp((secs.max(0.0) * 1_000_000.0).round() as u64)
    }

    pub fn as_micros(&self) -> u64 {
        self.0
    }

    pub fn as_secs(&self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    /// Seconds elapsed since `earlier`, zero if `earlier` is in the future.
    pub fn secs_since(&self, earlier: Timestamp) -> f64 {
        self.0.saturating_sub(earlier.0) as f64 / 1_000_000.0
    }
}

/// Rectangle in CSS pixels, viewport relative (as returned by `getBoundingClientRect`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PixelRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PixelRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        PixelRect {
            x,
            y,
            width,
            height,
        }
    }

    pub fn sized(width: f32, height: f32) -> Self {
        PixelRect::new(0.0, 0.0, width, height)
    }

    /// True when any part of the rectangle overlaps a viewport of the given size.
    pub fn intersects_viewport(&self, viewport_width: f32, viewport_height: f32) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && self.x < viewport_width
            && self.y < viewport_height
            && self.x + self.width > 0.0
            && self.y + self.height > 0.0
    }
}

/// Which shader pair a page uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShaderVariant {
    /// Per-cell 3D flip revealing the image, delay by Manhattan distance.
    #[default]
    Flip,
    /// Same flip, delay by Euclidean distance for a radial mosaic sweep.
    Mosaic,
    /// Vertex wave distortion blending a green pixel grid into the image.
    Wave,
}

/// When the trigger drives progress back to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExitAt {
    /// Only once the element has fully left the viewport (ratio == 0).
    #[default]
    FullyHidden,
    /// As soon as the element drops below the enter threshold.
    BelowThreshold,
}

/// Visibility trigger behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerSettings {
    /// Intersection ratio at which the reveal starts.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_enter_duration")]
    pub enter_duration_secs: f64,
    #[serde(default = "default_enter_ease")]
    pub enter_ease: Ease,
    #[serde(default)]
    pub exit_at: ExitAt,
    /// Zero resets instantly.
    #[serde(default)]
    pub exit_duration_secs: f64,
    #[serde(default = "default_exit_ease")]
    pub exit_ease: Ease,
}

impl Default for TriggerSettings {
    fn default() -> Self {
        TriggerSettings {
            threshold: default_threshold(),
            enter_duration_secs: default_enter_duration(),
            enter_ease: default_enter_ease(),
            exit_at: ExitAt::FullyHidden,
            exit_duration_secs: 0.0,
            exit_ease: default_exit_ease(),
        }
    }
}

fn default_threshold() -> f64 {
    0.75
}

fn default_enter_duration() -> f64 {
    4.5
}

fn default_enter_ease() -> Ease {
    Ease::Power1InOut
}

fn default_exit_ease() -> Ease {
    Ease::None
}

/// Texture minification filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MinFilter {
    Linear,
    Nearest,
    #[default]
    LinearMipmapNearest,
    LinearMipmapLinear,
}

impl MinFilter {
    pub fn uses_mipmaps(&self) -> bool {
        matches!(
            self,
            MinFilter::LinearMipmapNearest | MinFilter::LinearMipmapLinear
        )
    }
}

/// Texture upload options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureOptions {
    #[serde(default = "default_true")]
    pub premultiply_alpha: bool,
    #[serde(default = "default_anisotropy")]
    pub anisotropy: f32,
    #[serde(default = "default_true")]
    pub flip_y: bool,
    #[serde(default)]
    pub min_filter: MinFilter,
}

impl Default for TextureOptions {
    fn default() -> Self {
        TextureOptions {
            premultiply_alpha: true,
            anisotropy: default_anisotropy(),
            flip_y: true,
            min_filter: MinFilter::LinearMipmapNearest,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_anisotropy() -> f32 {
    1.0
}

/// Effect configuration passed from JS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectConfig {
    #[serde(default)]
    pub variant: ShaderVariant,
    /// Grid pitch in CSS pixels.
    #[serde(default = "default_grid_size")]
    pub grid_size: f32,
    #[serde(default = "default_selector")]
    pub selector: String,
    /// Query parameter whose presence enables developer mode.
    #[serde(default = "default_dev_flag")]
    pub dev_query_flag: String,
    #[serde(default = "default_max_pixel_ratio")]
    pub max_pixel_ratio: f64,
    #[serde(default)]
    pub trigger: TriggerSettings,
    #[serde(default)]
    pub texture: TextureOptions,
}

impl Default for EffectConfig {
    fn default() -> Self {
        EffectConfig::flip()
    }
}

impl EffectConfig {
    /// Grid flip reveal: slow eased reveal, instant reset once hidden.
    pub fn flip() -> Self {
        EffectConfig {
            variant: ShaderVariant::Flip,
            grid_size: default_grid_size(),
            selector: default_selector(),
            dev_query_flag: default_dev_flag(),
            max_pixel_ratio: default_max_pixel_ratio(),
            trigger: TriggerSettings::default(),
            texture: TextureOptions::default(),
        }
    }

    /// Radial mosaic sweep, otherwise identical to [`EffectConfig::flip`].
    pub fn mosaic() -> Self {
        EffectConfig {
            variant: ShaderVariant::Mosaic,
            ..EffectConfig::flip()
        }
    }

    /// Wave distortion: quick reveal and symmetric tweened exit below threshold.
    pub fn wave() -> Self {
        EffectConfig {
            variant: ShaderVariant::Wave,
            trigger: TriggerSettings {
                threshold: default_threshold(),
                enter_duration_secs: 1.5,
                enter_ease: Ease::Power2Out,
                exit_at: ExitAt::BelowThreshold,
                exit_duration_secs: 1.5,
                exit_ease: Ease::Power2In,
            },
            ..EffectConfig::flip()
        }
    }

    /// Parse and validate a JSON config. An empty string yields the defaults.
    pub fn from_json(json: &str) -> Result<Self, EffectError> {
        let config: EffectConfig = if json.trim().is_empty() {
            EffectConfig::default()
        } else {
            serde_json::from_str(json)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EffectError> {
        if !(self.grid_size.is_finite() && self.grid_size >= 1.0) {
            return Err(EffectError::InvalidConfig(format!(
                "grid_size must be at least 1px, got {}",
                self.grid_size
            )));
        }
        if !(0.0..=1.0).contains(&self.trigger.threshold) || self.trigger.threshold == 0.0 {
            return Err(EffectError::InvalidConfig(format!(
                "threshold must be in (0, 1], got {}",
                self.trigger.threshold
            )));
        }
        if self.trigger.enter_duration_secs < 0.0 || self.trigger.exit_duration_secs < 0.0 {
            return Err(EffectError::InvalidConfig(
                "durations must not be negative".to_string(),
            ));
        }
        if self.selector.trim().is_empty() {
            return Err(EffectError::InvalidConfig("selector is empty".to_string()));
        }
        if self.max_pixel_ratio <= 0.0 {
            return Err(EffectError::InvalidConfig(format!(
                "max_pixel_ratio must be positive, got {}",
                self.max_pixel_ratio
            )));
        }
        Ok(())
    }

    /// Observer thresholds: fully hidden, the enter threshold, fully visible.
    pub fn observer_thresholds(&self) -> [f64; 3] {
        [0.0, self.trigger.threshold, 1.0]
    }
}

fn default_grid_size() -> f32 {
    20.0
}

fn default_selector() -> String {
    ".entry-effect".to_string()
}

fn default_dev_flag() -> String {
    "dev".to_string()
}

fn default_max_pixel_ratio() -> f64 {
    1.5
}
