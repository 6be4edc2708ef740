// Progress tweens. At most one tween per plane: starting a new one overwrites
// whatever was in flight, so rapid visibility toggles never fight each other.

use std::collections::BTreeMap;

use crate::easing::Ease;
use crate::types::{PlaneId, Timestamp};

/// Interpolation of one scalar from `from` to `to`, starting at `start`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub from: f32,
    pub to: f32,
    pub start: Timestamp,
    pub duration_secs: f64,
    pub ease: Ease,
}

impl Tween {
    pub fn new(from: f32, to: f32, start: Timestamp, duration_secs: f64, ease: Ease) -> Self {
        Tween {
            from,
            to,
            start,
            duration_secs: duration_secs.max(0.0),
            ease,
        }
    }

    /// Linear time fraction in [0, 1].
    pub fn fraction_at(&self, now: Timestamp) -> f64 {
        if self.duration_secs <= 0.0 {
            return 1.0;
        }
        (now.secs_since(self.start) / self.duration_secs).clamp(0.0, 1.0)
    }

    pub fn value_at(&self, now: Timestamp) -> f32 {
        let t = self.fraction_at(now);
        if t >= 1.0 {
            return self.to;
        }
        let eased = self.ease.apply(t) as f32;
        self.from + (self.to - self.from) * eased
    }

    pub fn is_finished(&self, now: Timestamp) -> bool {
        self.fraction_at(now) >= 1.0
    }
}

/// Drives each plane's progress toward its latest target.
#[derive(Debug, Default)]
pub struct ProgressDriver {
    tweens: BTreeMap<PlaneId, Tween>,
}

impl ProgressDriver {
    pub fn new() -> Self {
        ProgressDriver::default()
    }

    /// Start tweening `plane` from `current` to `target`, overwriting any in-flight tween.
    ///
    /// Returns `Some(target)` when the value should be applied immediately
    /// (zero duration, or already at the target); nothing is scheduled in that case.
    pub fn to(
        &mut self,
        plane: PlaneId,
        current: f32,
        target: f32,
        duration_secs: f64,
        ease: Ease,
        now: Timestamp,
    ) -> Option<f32> {
        self.tweens.remove(&plane);
        if duration_secs <= 0.0 || current == target {
            return Some(target);
        }
        self.tweens.insert(
            plane,
            Tween::new(current, target, now, duration_secs, ease),
        );
        None
    }

    /// Drop the in-flight tween for `plane`, if any.
    pub fn cancel(&mut self, plane: PlaneId) -> bool {
        self.tweens.remove(&plane).is_some()
    }

    pub fn clear(&mut self) {
        self.tweens.clear();
    }

    pub fn is_active(&self, plane: PlaneId) -> bool {
        self.tweens.contains_key(&plane)
    }

    pub fn target(&self, plane: PlaneId) -> Option<f32> {
        self.tweens.get(&plane).map(|t| t.to)
    }

    pub fn active_count(&self) -> usize {
        self.tweens.len()
    }

    /// Sample every active tween at `now`.
    /// Finished tweens emit their final value once and are removed.
    pub fn advance(&mut self, now: Timestamp) -> Vec<(PlaneId, f32)> {
        let samples: Vec<(PlaneId, f32)> = self
            .tweens
            .iter()
            .map(|(id, tween)| (*id, tween.value_at(now)))
            .collect();
        self.tweens.retain(|_, tween| !tween.is_finished(now));
        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f64) -> Timestamp {
        Timestamp::from_secs_f64(s)
    }

    #[test]
    fn linear_tween_midpoint() {
        let tween = Tween::new(0.0, 1.0, secs(1.0), 2.0, Ease::None);
        assert_eq!(tween.value_at(secs(0.5)), 0.0);
        assert!((tween.value_at(secs(2.0)) - 0.5).abs() < 1e-6);
        assert_eq!(tween.value_at(secs(3.0)), 1.0);
        assert!(tween.is_finished(secs(3.0)));
    }

    #[test]
    fn zero_duration_applies_immediately() {
        let mut driver = ProgressDriver::new();
        let id = PlaneId::new(1);
        assert_eq!(driver.to(id, 0.7, 0.0, 0.0, Ease::None, secs(0.0)), Some(0.0));
        assert!(!driver.is_active(id));
    }

    #[test]
    fn new_tween_overwrites_in_flight() {
        let mut driver = ProgressDriver::new();
        let id = PlaneId::new(1);
        assert_eq!(driver.to(id, 0.0, 1.0, 4.5, Ease::Power1InOut, secs(0.0)), None);
        let mid = driver.advance(secs(1.0))[0].1;
        assert_eq!(driver.to(id, mid, 0.0, 1.0, Ease::None, secs(1.0)), None);
        assert_eq!(driver.active_count(), 1);
        assert_eq!(driver.target(id), Some(0.0));
    }

    #[test]
    fn finished_tween_emits_final_value_once() {
        let mut driver = ProgressDriver::new();
        let id = PlaneId::new(3);
        driver.to(id, 0.0, 1.0, 1.0, Ease::Power2Out, secs(0.0));
        assert_eq!(driver.advance(secs(5.0)), vec![(id, 1.0)]);
        assert!(driver.advance(secs(6.0)).is_empty());
    }

    #[test]
    fn setting_current_value_cancels_pending() {
        let mut driver = ProgressDriver::new();
        let id = PlaneId::new(2);
        driver.to(id, 0.0, 1.0, 1.0, Ease::None, secs(0.0));
        assert_eq!(driver.to(id, 0.5, 0.5, 1.0, Ease::None, secs(0.5)), Some(0.5));
        assert!(!driver.is_active(id));
        assert!(!driver.cancel(id));
    }

    #[cfg(not(target_arch = "wasm32"))]
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Tweened values never leave the [from, to] interval and progress monotonically.
            #[test]
            fn tween_stays_between_endpoints(
                from in -1.0f32..2.0,
                to in -1.0f32..2.0,
                duration in 0.01f64..10.0,
                t1 in 0.0f64..12.0,
                t2 in 0.0f64..12.0,
                ease_idx in 0usize..Ease::ALL.len(),
            ) {
                let start = Timestamp::from_micros(0);
                let tween = Tween::new(from, to, start, duration, Ease::ALL[ease_idx]);
                let (lo, hi) = if from <= to { (from, to) } else { (to, from) };
                let (a, b) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
                let va = tween.value_at(Timestamp::from_secs_f64(a));
                let vb = tween.value_at(Timestamp::from_secs_f64(b));
                prop_assert!(va >= lo - 1e-5 && va <= hi + 1e-5);
                if to >= from {
                    prop_assert!(vb >= va - 1e-5);
                } else {
                    prop_assert!(vb <= va + 1e-5);
                }
            }
        }
    }
}
