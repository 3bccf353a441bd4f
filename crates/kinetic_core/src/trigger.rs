//! Trigger sources
//!
//! A trigger turns raw element input into at most one edge per arming cycle:
//! [`TriggerEdge::Fire`] starts (or restarts) an effect's timeline and
//! [`TriggerEdge::Release`] reverses or resets it. Whether and when a trigger
//! re-arms depends on its kind:
//!
//! | Kind           | Fires on                      | Re-arms                          |
//! |----------------|-------------------------------|----------------------------------|
//! | `MountDelay`   | `delay_ms` of mounted time    | never                            |
//! | `Intersection` | ratio crossing `threshold`    | on exit, if `rearm_on_exit`      |
//! | `Hover`        | pointer enter                 | on pointer leave (emits Release) |
//! | `Manual`       | activation                    | on next activation, if `toggle`  |

use serde::{Deserialize, Serialize};

use crate::error::{non_negative_delay, ConfigError, Result};

/// What starts an effect
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerKind {
    /// Fire once, `delay_ms` after the effect is mounted
    MountDelay {
        #[serde(default)]
        delay_ms: f32,
    },
    /// Fire when the visible fraction reaches `threshold`
    Intersection {
        #[serde(default = "default_threshold")]
        threshold: f32,
        #[serde(default)]
        rearm_on_exit: bool,
    },
    /// Fire on pointer enter, release on pointer leave
    Hover,
    /// Fire on explicit activation; with `toggle`, a second activation releases
    Manual {
        #[serde(default)]
        toggle: bool,
    },
}

fn default_threshold() -> f32 {
    0.1
}

impl TriggerKind {
    /// Intersection trigger with the default 10% threshold
    pub fn on_view() -> Self {
        TriggerKind::Intersection {
            threshold: default_threshold(),
            rearm_on_exit: false,
        }
    }

    /// Mount-delay trigger that fires on the first frame
    pub fn immediate() -> Self {
        TriggerKind::MountDelay { delay_ms: 0.0 }
    }
}

/// Raw input a trigger reacts to
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TriggerInput {
    /// Mounted time passed
    Elapsed(f32),
    /// Visible fraction changed
    Intersection(f32),
    PointerEnter,
    PointerLeave,
    Activate,
}

/// Edge produced by a trigger
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerEdge {
    /// Start or restart the effect
    Fire,
    /// Reverse or reset the effect
    Release,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ArmState {
    /// Waiting for its condition
    Armed,
    /// Fired, waiting for its re-arm condition
    Fired,
    /// Fired and will never fire again
    Spent,
}

/// A trigger instance owned by one effect
#[derive(Clone, Debug)]
pub struct Trigger {
    kind: TriggerKind,
    state: ArmState,
    /// Mounted time accumulated by a mount-delay trigger
    waited_ms: f32,
    /// How far the last elapsed input ran past the firing point
    overshoot_ms: f32,
}

impl Trigger {
    /// Create a trigger, validating its parameters
    pub fn new(kind: TriggerKind) -> Result<Self> {
        match kind {
            TriggerKind::MountDelay { delay_ms } => {
                non_negative_delay("mount delay", delay_ms)?;
            }
            TriggerKind::Intersection { threshold, .. } => {
                if !(0.0..=1.0).contains(&threshold) {
                    return Err(ConfigError::InvalidThreshold(threshold));
                }
            }
            TriggerKind::Hover | TriggerKind::Manual { .. } => {}
        }

        Ok(Self {
            kind,
            state: ArmState::Armed,
            waited_ms: 0.0,
            overshoot_ms: 0.0,
        })
    }

    pub fn kind(&self) -> TriggerKind {
        self.kind
    }

    /// Whether the next matching input will fire
    pub fn is_armed(&self) -> bool {
        self.state == ArmState::Armed
    }

    /// Whether the trigger has fired and not been released
    pub fn is_fired(&self) -> bool {
        self.state == ArmState::Fired
    }

    /// Time the last [`TriggerInput::Elapsed`] ran past the firing point
    ///
    /// Effects advance by this amount (instead of the whole frame) on the
    /// frame a mount delay fires, so start times don't depend on frame size.
    pub fn overshoot_ms(&self) -> f32 {
        self.overshoot_ms
    }

    /// Put the trigger back into its armed state
    pub fn rearm(&mut self) {
        self.state = ArmState::Armed;
        self.waited_ms = 0.0;
        self.overshoot_ms = 0.0;
    }

    /// Feed one input, returning the edge it produced (if any)
    pub fn handle(&mut self, input: &TriggerInput) -> Option<TriggerEdge> {
        self.overshoot_ms = 0.0;

        let edge = match (self.kind, self.state, *input) {
            (TriggerKind::MountDelay { delay_ms }, ArmState::Armed, TriggerInput::Elapsed(dt)) => {
                if !dt.is_finite() || dt < 0.0 {
                    return None;
                }
                self.waited_ms += dt;
                if self.waited_ms >= delay_ms {
                    self.overshoot_ms = self.waited_ms - delay_ms;
                    self.state = ArmState::Spent;
                    Some(TriggerEdge::Fire)
                } else {
                    None
                }
            }

            (
                TriggerKind::Intersection {
                    threshold,
                    rearm_on_exit,
                },
                state,
                TriggerInput::Intersection(ratio),
            ) => {
                let inside = ratio.is_finite() && ratio > 0.0 && ratio >= threshold;
                match (state, inside) {
                    (ArmState::Armed, true) => {
                        self.state = if rearm_on_exit {
                            ArmState::Fired
                        } else {
                            ArmState::Spent
                        };
                        Some(TriggerEdge::Fire)
                    }
                    (ArmState::Fired, false) => {
                        self.state = ArmState::Armed;
                        Some(TriggerEdge::Release)
                    }
                    _ => None,
                }
            }

            (TriggerKind::Hover, ArmState::Armed, TriggerInput::PointerEnter) => {
                self.state = ArmState::Fired;
                Some(TriggerEdge::Fire)
            }
            (TriggerKind::Hover, ArmState::Fired, TriggerInput::PointerLeave) => {
                self.state = ArmState::Armed;
                Some(TriggerEdge::Release)
            }

            (TriggerKind::Manual { toggle }, ArmState::Armed, TriggerInput::Activate) => {
                self.state = if toggle {
                    ArmState::Fired
                } else {
                    ArmState::Spent
                };
                Some(TriggerEdge::Fire)
            }
            (TriggerKind::Manual { toggle: true }, ArmState::Fired, TriggerInput::Activate) => {
                self.state = ArmState::Armed;
                Some(TriggerEdge::Release)
            }

            _ => None,
        };

        if let Some(edge) = edge {
            tracing::debug!(kind = ?self.kind, ?edge, "trigger edge");
        }
        edge
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mount_delay_fires_once() {
        let mut trigger = Trigger::new(TriggerKind::MountDelay { delay_ms: 100.0 }).unwrap();

        assert_eq!(trigger.handle(&TriggerInput::Elapsed(60.0)), None);
        assert_eq!(
            trigger.handle(&TriggerInput::Elapsed(60.0)),
            Some(TriggerEdge::Fire)
        );
        assert!((trigger.overshoot_ms() - 20.0).abs() < 1e-4);

        // Spent: further time never fires again
        assert_eq!(trigger.handle(&TriggerInput::Elapsed(1000.0)), None);
        assert!(!trigger.is_armed());
    }

    #[test]
    fn test_zero_mount_delay_fires_on_first_frame() {
        let mut trigger = Trigger::new(TriggerKind::immediate()).unwrap();
        assert_eq!(
            trigger.handle(&TriggerInput::Elapsed(16.0)),
            Some(TriggerEdge::Fire)
        );
        assert!((trigger.overshoot_ms() - 16.0).abs() < 1e-4);
    }

    #[test]
    fn test_intersection_first_crossing_only() {
        let mut trigger = Trigger::new(TriggerKind::on_view()).unwrap();

        assert_eq!(trigger.handle(&TriggerInput::Intersection(0.05)), None);
        assert_eq!(
            trigger.handle(&TriggerInput::Intersection(0.2)),
            Some(TriggerEdge::Fire)
        );
        assert_eq!(trigger.handle(&TriggerInput::Intersection(0.0)), None);
        assert_eq!(trigger.handle(&TriggerInput::Intersection(0.9)), None);
    }

    #[test]
    fn test_intersection_rearm_on_exit() {
        let mut trigger = Trigger::new(TriggerKind::Intersection {
            threshold: 0.5,
            rearm_on_exit: true,
        })
        .unwrap();

        assert_eq!(
            trigger.handle(&TriggerInput::Intersection(0.6)),
            Some(TriggerEdge::Fire)
        );
        // Staying inside never re-fires
        assert_eq!(trigger.handle(&TriggerInput::Intersection(0.8)), None);
        assert_eq!(
            trigger.handle(&TriggerInput::Intersection(0.2)),
            Some(TriggerEdge::Release)
        );
        assert!(trigger.is_armed());
        assert_eq!(
            trigger.handle(&TriggerInput::Intersection(0.5)),
            Some(TriggerEdge::Fire)
        );
    }

    #[test]
    fn test_zero_threshold_needs_some_visibility() {
        let mut trigger = Trigger::new(TriggerKind::Intersection {
            threshold: 0.0,
            rearm_on_exit: false,
        })
        .unwrap();
        assert_eq!(trigger.handle(&TriggerInput::Intersection(0.0)), None);
        assert_eq!(
            trigger.handle(&TriggerInput::Intersection(0.01)),
            Some(TriggerEdge::Fire)
        );
    }

    #[test]
    fn test_hover_rearms_on_leave() {
        let mut trigger = Trigger::new(TriggerKind::Hover).unwrap();

        assert_eq!(trigger.handle(&TriggerInput::PointerLeave), None);
        assert_eq!(
            trigger.handle(&TriggerInput::PointerEnter),
            Some(TriggerEdge::Fire)
        );
        // Duplicate enter within one cycle is ignored
        assert_eq!(trigger.handle(&TriggerInput::PointerEnter), None);
        assert_eq!(
            trigger.handle(&TriggerInput::PointerLeave),
            Some(TriggerEdge::Release)
        );
        assert_eq!(
            trigger.handle(&TriggerInput::PointerEnter),
            Some(TriggerEdge::Fire)
        );
    }

    #[test]
    fn test_manual_one_shot_and_toggle() {
        let mut once = Trigger::new(TriggerKind::Manual { toggle: false }).unwrap();
        assert_eq!(once.handle(&TriggerInput::PointerEnter), None);
        assert_eq!(once.handle(&TriggerInput::Activate), Some(TriggerEdge::Fire));
        assert_eq!(once.handle(&TriggerInput::Activate), None);

        once.rearm();
        assert_eq!(once.handle(&TriggerInput::Activate), Some(TriggerEdge::Fire));

        let mut toggle = Trigger::new(TriggerKind::Manual { toggle: true }).unwrap();
        assert_eq!(toggle.handle(&TriggerInput::Activate), Some(TriggerEdge::Fire));
        assert_eq!(
            toggle.handle(&TriggerInput::Activate),
            Some(TriggerEdge::Release)
        );
    }

    #[test]
    fn test_invalid_configuration() {
        assert_eq!(
            Trigger::new(TriggerKind::Intersection {
                threshold: 1.5,
                rearm_on_exit: false
            })
            .unwrap_err(),
            ConfigError::InvalidThreshold(1.5)
        );
        assert!(Trigger::new(TriggerKind::MountDelay { delay_ms: -1.0 }).is_err());
    }

    #[test]
    fn test_kind_deserializes_from_toml_shape() {
        #[derive(Deserialize)]
        struct Holder {
            trigger: TriggerKind,
        }

        let holder: Holder = toml::from_str("trigger = { kind = \"intersection\" }").unwrap();
        assert_eq!(holder.trigger, TriggerKind::on_view());

        let holder: Holder =
            toml::from_str("trigger = { kind = \"mount_delay\", delay_ms = 250.0 }").unwrap();
        assert_eq!(holder.trigger, TriggerKind::MountDelay { delay_ms: 250.0 });
    }
}
