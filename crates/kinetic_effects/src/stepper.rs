//! Multi-step wizard state
//!
//! A [`Stepper`] walks through `N` steps and ends in a terminal `Completed`
//! state. Moving forward from the last step completes the sequence and runs
//! the completion callback exactly once; after that every transition is
//! rejected.
//!
//! Step contents are opaque to the state machine. The container that owns
//! the stepper renders `current_content()` and forwards button presses.

use kinetic_core::{ConfigError, Result, TransitionError};
use serde::{Deserialize, Serialize};

/// Result of a requested transition
pub type TransitionResult<T> = std::result::Result<T, TransitionError>;

/// Position in the sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepState {
    /// 1-based step index
    Step(usize),
    Completed,
}

/// One accepted transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepTransition {
    pub from: StepState,
    pub to: StepState,
    /// +1 forward, -1 backward; drives the slide direction
    pub direction: i8,
}

/// Stepper options
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepperConfig {
    pub initial_step: usize,
    /// Allow jumping by clicking step indicators
    pub indicators_enabled: bool,
    pub back_label: String,
    pub next_label: String,
    /// Label of the forward button on the last step
    pub complete_label: String,
}

impl Default for StepperConfig {
    fn default() -> Self {
        Self {
            initial_step: 1,
            indicators_enabled: true,
            back_label: "Back".to_string(),
            next_label: "Continue".to_string(),
            complete_label: "Complete".to_string(),
        }
    }
}

/// Step sequence over contents of type `C`
pub struct Stepper<C> {
    config: StepperConfig,
    steps: Vec<C>,
    state: StepState,
    direction: i8,
    on_step_change: Option<Box<dyn FnMut(usize)>>,
    on_final_step_completed: Option<Box<dyn FnOnce()>>,
}

impl<C> Stepper<C> {
    pub fn new(steps: Vec<C>, config: StepperConfig) -> Result<Self> {
        if steps.is_empty() {
            return Err(ConfigError::EmptySteps);
        }
        let count = steps.len();
        if !(1..=count).contains(&config.initial_step) {
            return Err(ConfigError::InitialStepOutOfRange {
                step: config.initial_step,
                count,
            });
        }

        Ok(Self {
            state: StepState::Step(config.initial_step),
            config,
            steps,
            direction: 0,
            on_step_change: None,
            on_final_step_completed: None,
        })
    }

    /// Set the callback run with the new step number on every step change
    pub fn on_step_change(mut self, callback: impl FnMut(usize) + 'static) -> Self {
        self.on_step_change = Some(Box::new(callback));
        self
    }

    /// Set the callback run when the last step is completed
    pub fn on_final_step_completed(mut self, callback: impl FnOnce() + 'static) -> Self {
        self.on_final_step_completed = Some(Box::new(callback));
        self
    }

    pub fn state(&self) -> StepState {
        self.state
    }

    /// Current 1-based step, `None` once completed
    pub fn current_step(&self) -> Option<usize> {
        match self.state {
            StepState::Step(step) => Some(step),
            StepState::Completed => None,
        }
    }

    pub fn current_content(&self) -> Option<&C> {
        self.current_step().and_then(|step| self.steps.get(step - 1))
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn is_completed(&self) -> bool {
        self.state == StepState::Completed
    }

    pub fn is_final_step(&self) -> bool {
        self.current_step() == Some(self.steps.len())
    }

    /// Direction of the last accepted transition (0 before any)
    pub fn direction(&self) -> i8 {
        self.direction
    }

    /// Label for the forward button at the current step
    pub fn next_label(&self) -> &str {
        if self.is_final_step() {
            &self.config.complete_label
        } else {
            &self.config.next_label
        }
    }

    /// Label for the back button, `None` where going back is impossible
    pub fn back_label(&self) -> Option<&str> {
        match self.state {
            StepState::Step(step) if step > 1 => Some(&self.config.back_label),
            _ => None,
        }
    }

    /// Move forward, completing the sequence from the last step
    pub fn next(&mut self) -> TransitionResult<StepTransition> {
        let StepState::Step(step) = self.state else {
            return Err(TransitionError::Completed);
        };
        let to = if step == self.steps.len() {
            StepState::Completed
        } else {
            StepState::Step(step + 1)
        };
        Ok(self.transition(to, 1))
    }

    /// Move back; a no-op on the first step
    pub fn back(&mut self) -> TransitionResult<Option<StepTransition>> {
        match self.state {
            StepState::Completed => Err(TransitionError::Completed),
            StepState::Step(1) => Ok(None),
            StepState::Step(step) => Ok(Some(self.transition(StepState::Step(step - 1), -1))),
        }
    }

    /// Jump to `step` from a step indicator
    pub fn go_to(&mut self, step: usize) -> TransitionResult<Option<StepTransition>> {
        let StepState::Step(current) = self.state else {
            return Err(TransitionError::Completed);
        };
        if !self.config.indicators_enabled {
            return Err(TransitionError::IndicatorsDisabled);
        }
        let count = self.steps.len();
        if !(1..=count).contains(&step) {
            return Err(TransitionError::OutOfRange { step, count });
        }
        if step == current {
            return Ok(None);
        }
        let direction = if step > current { 1 } else { -1 };
        Ok(Some(self.transition(StepState::Step(step), direction)))
    }

    fn transition(&mut self, to: StepState, direction: i8) -> StepTransition {
        let from = std::mem::replace(&mut self.state, to);
        self.direction = direction;
        tracing::debug!(?from, ?to, direction, "step transition");

        match to {
            StepState::Step(step) => {
                if let Some(callback) = self.on_step_change.as_mut() {
                    callback(step);
                }
            }
            StepState::Completed => {
                if let Some(callback) = self.on_final_step_completed.take() {
                    callback();
                }
            }
        }

        StepTransition {
            from,
            to,
            direction,
        }
    }
}
