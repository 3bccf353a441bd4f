//! Timeline primitive
//!
//! A [`Timeline`] is a bounded or cyclic progress clock owned by exactly one
//! effect. Progress is a pure function of the elapsed time fed through
//! [`Timeline::tick`]; frame count never matters, so ticking 1000ms at once
//! or as sixty 16.6ms frames lands in the same place.
//!
//! ```rust
//! use kinetic_animation::Timeline;
//!
//! // Five characters typed over 300ms
//! let mut typing = Timeline::new(300.0, 5).unwrap();
//! typing.start();
//!
//! typing.tick(130.0);
//! assert_eq!(typing.current_step(), 2);
//!
//! // Ticks past the end hand back the unconsumed time
//! let leftover = typing.tick(200.0);
//! assert!(typing.is_complete());
//! assert!((leftover - 30.0).abs() < 1e-3);
//! ```
//!
//! Cyclic timelines hold for `pause_ms` on completion and then restart
//! themselves instead of staying terminal:
//!
//! ```rust
//! use kinetic_animation::{Repeat, Timeline};
//!
//! let mut pulse = Timeline::new(100.0, 0)
//!     .unwrap()
//!     .with_repeat(Repeat::Cycle { pause_ms: 50.0 });
//! pulse.start();
//! pulse.tick(175.0);
//! assert_eq!(pulse.cycles(), 1);
//! assert!((pulse.progress() - 0.25).abs() < 1e-4);
//! ```

use kinetic_core::error::{non_negative_delay, positive_duration, Result};

use crate::easing::Easing;

/// Direction progress moves in
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// What happens when a run completes
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Repeat {
    /// Stay complete until restarted
    #[default]
    Once,
    /// Hold for `pause_ms`, then reset and run again
    Cycle { pause_ms: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum PlayState {
    /// Not started (or reset)
    Idle,
    Running,
    /// Completed a cyclic run, waiting to restart
    Holding { remaining_ms: f32 },
    /// Completed a one-shot run
    Complete,
}

/// Deterministic progress clock
#[derive(Clone, Debug)]
pub struct Timeline {
    duration_ms: f32,
    /// Discrete step count (0 = continuous)
    steps: u32,
    easing: Easing,
    repeat: Repeat,
    direction: Direction,
    /// Time consumed in the current run, in the current direction
    elapsed_ms: f32,
    state: PlayState,
    /// Suspended timelines ignore ticks
    suspended: bool,
    cycles: u32,
}

/// Slack for float error when converting progress to a discrete step
const STEP_EPSILON: f32 = 1e-4;

impl Timeline {
    /// Create a timeline lasting `duration_ms` split into `steps` steps
    ///
    /// `steps == 0` makes a continuous timeline.
    pub fn new(duration_ms: f32, steps: u32) -> Result<Self> {
        positive_duration("timeline duration", duration_ms)?;
        Ok(Self {
            duration_ms,
            steps,
            easing: Easing::Linear,
            repeat: Repeat::Once,
            direction: Direction::Forward,
            elapsed_ms: 0.0,
            state: PlayState::Idle,
            suspended: false,
            cycles: 0,
        })
    }

    /// Set the easing applied by [`Timeline::eased_progress`]
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Set the completion behavior
    ///
    /// A negative or non-finite pause is treated as zero.
    pub fn with_repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = match repeat {
            Repeat::Cycle { pause_ms } => Repeat::Cycle {
                pause_ms: non_negative_delay("cycle pause", pause_ms).unwrap_or(0.0),
            },
            Repeat::Once => Repeat::Once,
        };
        self
    }

    /// Start a fresh forward run
    pub fn start(&mut self) {
        self.elapsed_ms = 0.0;
        self.direction = Direction::Forward;
        self.state = PlayState::Running;
    }

    /// Reconfigure duration and step count, then start
    pub fn start_with(&mut self, duration_ms: f32, steps: u32) -> Result<()> {
        self.duration_ms = positive_duration("timeline duration", duration_ms)?;
        self.steps = steps;
        self.start();
        Ok(())
    }

    /// Return to the idle, not-started state
    pub fn reset(&mut self) {
        self.elapsed_ms = 0.0;
        self.direction = Direction::Forward;
        self.state = PlayState::Idle;
    }

    /// Stop consuming time until [`Timeline::resume`]
    pub fn pause(&mut self) {
        self.suspended = true;
    }

    pub fn resume(&mut self) {
        self.suspended = false;
    }

    /// Flip direction, keeping the current progress
    ///
    /// A completed timeline starts running back towards the other end.
    pub fn reverse(&mut self) {
        self.elapsed_ms = self.duration_ms - self.elapsed_ms;
        self.direction = match self.direction {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        };
        if matches!(self.state, PlayState::Complete | PlayState::Holding { .. }) {
            self.state = PlayState::Running;
        }
    }

    /// Advance by `dt_ms`
    ///
    /// Returns the part of `dt_ms` the timeline did not consume (because it
    /// was idle or a one-shot run completed), so callers can chain phases
    /// without losing time.
    pub fn tick(&mut self, dt_ms: f32) -> f32 {
        if self.suspended || !dt_ms.is_finite() || dt_ms <= 0.0 {
            return 0.0;
        }

        let mut remaining = dt_ms;
        loop {
            match self.state {
                PlayState::Idle | PlayState::Complete => return remaining,
                PlayState::Running => {
                    let left = self.duration_ms - self.elapsed_ms;
                    if remaining < left {
                        self.elapsed_ms += remaining;
                        return 0.0;
                    }
                    self.elapsed_ms = self.duration_ms;
                    remaining -= left;
                    self.cycles = self.cycles.saturating_add(1);
                    match self.repeat {
                        Repeat::Once => {
                            self.state = PlayState::Complete;
                            return remaining;
                        }
                        Repeat::Cycle { pause_ms } => {
                            // Fold whole periods at once; stepping through them
                            // stalls once `remaining` dwarfs the period
                            let period = self.duration_ms + pause_ms;
                            if remaining >= period {
                                let whole = (remaining / period) as u32;
                                self.cycles = self.cycles.saturating_add(whole);
                                remaining %= period;
                            }
                            self.state = PlayState::Holding {
                                remaining_ms: pause_ms,
                            };
                        }
                    }
                }
                PlayState::Holding { remaining_ms } => {
                    if remaining < remaining_ms {
                        self.state = PlayState::Holding {
                            remaining_ms: remaining_ms - remaining,
                        };
                        return 0.0;
                    }
                    remaining -= remaining_ms;
                    self.elapsed_ms = 0.0;
                    self.state = PlayState::Running;
                    tracing::trace!(cycles = self.cycles, "timeline cycle restarted");
                }
            }
        }
    }

    /// Linear progress in [0, 1]
    pub fn progress(&self) -> f32 {
        let raw = (self.elapsed_ms / self.duration_ms).clamp(0.0, 1.0);
        match self.direction {
            Direction::Forward => raw,
            Direction::Backward => 1.0 - raw,
        }
    }

    /// Progress with the timeline's easing applied
    pub fn eased_progress(&self) -> f32 {
        self.easing.apply(self.progress())
    }

    /// Completed steps (0..=steps); continuous timelines report 0 or 1
    pub fn current_step(&self) -> u32 {
        let steps = self.steps.max(1);
        let step = (self.progress() * steps as f32 + STEP_EPSILON).floor() as u32;
        step.min(steps)
    }

    /// Milliseconds consumed in the current run
    pub fn elapsed_ms(&self) -> f32 {
        self.elapsed_ms
    }

    pub fn duration_ms(&self) -> f32 {
        self.duration_ms
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Completed runs since creation
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Whether a one-shot run reached its end
    pub fn is_complete(&self) -> bool {
        self.state == PlayState::Complete
    }

    /// Whether ticks currently move the clock
    pub fn is_running(&self) -> bool {
        !self.suspended && matches!(self.state, PlayState::Running | PlayState::Holding { .. })
    }

    /// Whether the timeline is holding between cycles
    pub fn is_holding(&self) -> bool {
        matches!(self.state, PlayState::Holding { .. })
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }
}
