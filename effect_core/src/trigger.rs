// Visibility trigger: turns intersection updates into reveal/reset decisions.

use crate::easing::Ease;
use crate::types::{ExitAt, TriggerSettings};

/// What the engine should do with a plane's progress after an intersection update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerAction {
    /// Leave the plane alone.
    Ignore,
    /// Mark animated and drive progress to 1.
    Reveal { duration_secs: f64, ease: Ease },
    /// Clear the animated flag and drive progress to 0.
    Reset { duration_secs: f64, ease: Ease },
}

/// Threshold policy shared by every observed plane.
#[derive(Debug, Clone)]
pub struct VisibilityTrigger {
    settings: TriggerSettings,
}

impl VisibilityTrigger {
    pub fn new(settings: TriggerSettings) -> Self {
        VisibilityTrigger { settings }
    }

    pub fn settings(&self) -> &TriggerSettings {
        &self.settings
    }

    /// Decide the action for one intersection entry.
    pub fn evaluate(&self, animated: bool, ratio: f64, is_intersecting: bool) -> TriggerAction {
        let visible_enough = is_intersecting && ratio >= self.settings.threshold;

        if visible_enough {
            if animated {
                return TriggerAction::Ignore;
            }
            return TriggerAction::Reveal {
                duration_secs: self.settings.enter_duration_secs,
                ease: self.settings.enter_ease,
            };
        }

        let exited = match self.settings.exit_at {
            ExitAt::FullyHidden => ratio <= 0.0,
            ExitAt::BelowThreshold => true,
        };
        if exited {
            TriggerAction::Reset {
                duration_secs: self.settings.exit_duration_secs,
                ease: self.settings.exit_ease,
            }
        } else {
            TriggerAction::Ignore
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EffectConfig;

    #[test]
    fn reveals_once_past_threshold() {
        let trigger = VisibilityTrigger::new(TriggerSettings::default());
        assert_eq!(
            trigger.evaluate(false, 0.8, true),
            TriggerAction::Reveal {
                duration_secs: 4.5,
                ease: Ease::Power1InOut
            }
        );
        assert_eq!(trigger.evaluate(true, 0.9, true), TriggerAction::Ignore);
    }

    #[test]
    fn partial_visibility_is_ignored() {
        let trigger = VisibilityTrigger::new(TriggerSettings::default());
        assert_eq!(trigger.evaluate(false, 0.5, true), TriggerAction::Ignore);
        assert_eq!(trigger.evaluate(true, 0.3, true), TriggerAction::Ignore);
    }

    #[test]
    fn full_exit_resets_instantly() {
        let trigger = VisibilityTrigger::new(TriggerSettings::default());
        assert_eq!(
            trigger.evaluate(true, 0.0, false),
            TriggerAction::Reset {
                duration_secs: 0.0,
                ease: Ease::None
            }
        );
    }

    #[test]
    fn ratio_above_threshold_without_intersection_does_not_reveal() {
        let trigger = VisibilityTrigger::new(TriggerSettings::default());
        assert_eq!(trigger.evaluate(false, 0.8, false), TriggerAction::Ignore);
    }

    #[test]
    fn wave_resets_below_threshold_with_tween() {
        let trigger = VisibilityTrigger::new(EffectConfig::wave().trigger);
        assert_eq!(
            trigger.evaluate(true, 0.5, true),
            TriggerAction::Reset {
                duration_secs: 1.5,
                ease: Ease::Power2In
            }
        );
    }
}
