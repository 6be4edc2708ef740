// Effect engine: the DOM-free state machine behind every mounted page.
// The web layer forwards load/scroll/resize/intersection/slider events here and
// reads back uniform values each frame; everything observable is testable on host.

use crate::error::EffectError;
use crate::plane::{PlaneRecord, PlaneRegistry};
use crate::scroll::{ScrollDirection, ScrollTracker};
use crate::trigger::{TriggerAction, VisibilityTrigger};
use crate::tween::ProgressDriver;
use crate::types::{EffectConfig, PixelRect, PlaneId, ShaderVariant, Timestamp};
use crate::uniforms;

/// Outcome of a bounds update for one plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsChange {
    /// Position or size changed but the grid did not; uniforms are updated.
    Moved,
    /// Cell counts changed; the mesh must be rebuilt before the next draw.
    Regrid,
}

pub struct EffectEngine {
    config: EffectConfig,
    registry: PlaneRegistry,
    driver: ProgressDriver,
    trigger: VisibilityTrigger,
    scroll: ScrollTracker,
    dev_mode: bool,
    started_at: Option<Timestamp>,
}

impl EffectEngine {
    pub fn new(config: EffectConfig, dev_mode: bool) -> Self {
        let trigger = VisibilityTrigger::new(config.trigger.clone());
        EffectEngine {
            config,
            registry: PlaneRegistry::new(),
            driver: ProgressDriver::new(),
            trigger,
            scroll: ScrollTracker::default(),
            dev_mode,
            started_at: None,
        }
    }

    pub fn config(&self) -> &EffectConfig {
        &self.config
    }

    pub fn variant(&self) -> ShaderVariant {
        self.config.variant
    }

    /// In developer mode the visibility trigger is disabled and progress follows the slider.
    pub fn is_dev_mode(&self) -> bool {
        self.dev_mode
    }

    /// Register a plane for an image with the given bounding box.
    pub fn create_plane(&mut self, bounds: PixelRect) -> PlaneId {
        let id = self
            .registry
            .create(self.config.variant, self.config.grid_size, bounds);
        if let Some(plane) = self.registry.get_mut(id) {
            plane
                .uniforms
                .set_float(uniforms::DIRECTION, self.scroll.direction().sign());
        }
        log::debug!("created plane {:?} with bounds {:?}", id, bounds);
        id
    }

    /// Mark a plane's texture and mesh as ready for drawing.
    pub fn mark_ready(&mut self, id: PlaneId) -> Result<(), EffectError> {
        let plane = self
            .registry
            .get_mut(id)
            .ok_or(EffectError::UnknownPlane(id))?;
        plane.ready = true;
        Ok(())
    }

    /// Drop a plane and any tween driving it.
    pub fn release(&mut self, id: PlaneId) -> Option<PlaneRecord> {
        self.driver.cancel(id);
        self.registry.remove(id)
    }

    pub fn plane(&self, id: PlaneId) -> Option<&PlaneRecord> {
        self.registry.get(id)
    }

    pub fn planes(&self) -> impl Iterator<Item = &PlaneRecord> {
        self.registry.iter()
    }

    pub fn plane_count(&self) -> usize {
        self.registry.len()
    }

    pub fn is_tweening(&self, id: PlaneId) -> bool {
        self.driver.is_active(id)
    }

    /// Handle one intersection entry. Unknown planes and developer mode are no-ops.
    pub fn on_intersection(
        &mut self,
        id: PlaneId,
        ratio: f64,
        is_intersecting: bool,
        now: Timestamp,
    ) -> TriggerAction {
        if self.dev_mode {
            return TriggerAction::Ignore;
        }
        let Some(plane) = self.registry.get_mut(id) else {
            return TriggerAction::Ignore;
        };

        let action = self.trigger.evaluate(plane.animated, ratio, is_intersecting);
        let (target, duration_secs, ease) = match action {
            TriggerAction::Ignore => return action,
            TriggerAction::Reveal {
                duration_secs,
                ease,
            } => {
                plane.animated = true;
                (1.0, duration_secs, ease)
            }
            TriggerAction::Reset {
                duration_secs,
                ease,
            } => {
                plane.animated = false;
                (0.0, duration_secs, ease)
            }
        };

        let current = plane.progress();
        if let Some(value) = self
            .driver
            .to(id, current, target, duration_secs, ease, now)
        {
            plane.set_progress(value);
        }
        log::debug!("plane {:?} ratio {:.2}: {:?}", id, ratio, action);
        action
    }

    /// Apply a freshly measured bounding box.
    pub fn on_bounds(
        &mut self,
        id: PlaneId,
        bounds: PixelRect,
    ) -> Result<BoundsChange, EffectError> {
        let plane = self
            .registry
            .get_mut(id)
            .ok_or(EffectError::UnknownPlane(id))?;
        if plane.apply_bounds(bounds) {
            Ok(BoundsChange::Regrid)
        } else {
            Ok(BoundsChange::Moved)
        }
    }

    /// Record the page scroll offset; direction feeds the wave variant's uniform.
    pub fn on_scroll(&mut self, offset: f64) -> ScrollDirection {
        let direction = self.scroll.update(offset);
        for plane in self.registry.iter_mut() {
            plane.uniforms.set_float(uniforms::DIRECTION, direction.sign());
        }
        direction
    }

    /// Set one plane's progress directly, cancelling any tween.
    pub fn set_progress(&mut self, id: PlaneId, value: f32) -> Result<(), EffectError> {
        let plane = self
            .registry
            .get_mut(id)
            .ok_or(EffectError::UnknownPlane(id))?;
        self.driver.cancel(id);
        plane.set_progress(value);
        Ok(())
    }

    /// Set every plane's progress directly (developer slider).
    pub fn set_all_progress(&mut self, value: f32) {
        self.driver.clear();
        for plane in self.registry.iter_mut() {
            plane.set_progress(value);
        }
    }

    /// Advance tweens and the time uniform to `now`. Returns how many planes a tween wrote to.
    pub fn tick(&mut self, now: Timestamp) -> usize {
        let started_at = *self.started_at.get_or_insert(now);
        let elapsed = now.secs_since(started_at) as f32;
        for plane in self.registry.iter_mut() {
            plane.uniforms.set_float(uniforms::TIME, elapsed);
        }

        let samples = self.driver.advance(now);
        let mut written = 0;
        for (id, value) in samples {
            if let Some(plane) = self.registry.get_mut(id) {
                plane.set_progress(value);
                written += 1;
            }
        }
        written
    }

    /// Forget every plane and tween.
    pub fn clear(&mut self) {
        self.driver.clear();
        self.registry.clear();
    }
}
