//! Staggered split-text reveal
//!
//! Units fade and slide up into place one after another. The reveal is
//! one-shot: once every unit is revealed the completion callback runs and the
//! effect stays settled for as long as it is mounted.

use kinetic_animation::{Easing, Timeline};
use kinetic_core::error::{non_negative_delay, positive_duration};
use kinetic_core::{Result, TriggerEdge, TriggerKind};
use serde::{Deserialize, Serialize};

use super::{RevealState, SplitBy, Stagger, UnitText};
use crate::effect::Effect;

/// Split-reveal options
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitRevealConfig {
    pub text: String,
    pub split_by: SplitBy,
    /// Time each unit takes to appear
    pub unit_duration_ms: f32,
    /// Spacing between consecutive unit starts
    pub stagger_ms: f32,
    /// Curve distributing unit starts across the stagger span
    pub stagger_easing: Easing,
    /// Curve applied within each unit's own animation
    pub unit_easing: Easing,
    /// Upper bound on the time between first and last unit start
    pub max_total_ms: Option<f32>,
    /// Starting vertical offset in pixels
    pub offset_y: f32,
    pub trigger: TriggerKind,
}

impl Default for SplitRevealConfig {
    fn default() -> Self {
        Self {
            text: String::new(),
            split_by: SplitBy::Chars,
            unit_duration_ms: 600.0,
            stagger_ms: 100.0,
            stagger_easing: Easing::Linear,
            unit_easing: Easing::EaseOutCubic,
            max_total_ms: None,
            offset_y: 40.0,
            trigger: TriggerKind::on_view(),
        }
    }
}

impl SplitRevealConfig {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_split_by(mut self, split_by: SplitBy) -> Self {
        self.split_by = split_by;
        self
    }

    pub fn with_unit_duration(mut self, ms: f32) -> Self {
        self.unit_duration_ms = ms;
        self
    }

    pub fn with_stagger(mut self, ms: f32) -> Self {
        self.stagger_ms = ms;
        self
    }

    pub fn with_stagger_easing(mut self, easing: Easing) -> Self {
        self.stagger_easing = easing;
        self
    }

    pub fn with_unit_easing(mut self, easing: Easing) -> Self {
        self.unit_easing = easing;
        self
    }

    pub fn with_max_total(mut self, ms: f32) -> Self {
        self.max_total_ms = Some(ms);
        self
    }

    pub fn with_trigger(mut self, trigger: TriggerKind) -> Self {
        self.trigger = trigger;
        self
    }
}

/// Visual state of one unit
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitFrame {
    pub opacity: f32,
    pub offset_y: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Running,
    Complete,
}

/// One-shot staggered reveal
pub struct SplitReveal {
    config: SplitRevealConfig,
    text: UnitText,
    stagger: Stagger,
    /// `None` when there are no units to animate
    timeline: Option<Timeline>,
    phase: Phase,
    on_complete: Option<Box<dyn FnMut()>>,
}

impl SplitReveal {
    pub fn new(config: SplitRevealConfig) -> Result<Self> {
        positive_duration("unit duration", config.unit_duration_ms)?;
        non_negative_delay("stagger", config.stagger_ms)?;
        if let Some(max) = config.max_total_ms {
            non_negative_delay("max total stagger", max)?;
        }

        let text = UnitText::split(&config.text, config.split_by);
        let stagger = Stagger::new(
            text.len(),
            config.stagger_ms,
            config.unit_duration_ms,
            config.stagger_easing,
            config.max_total_ms,
        );
        let timeline = if text.is_empty() {
            None
        } else {
            Some(Timeline::new(stagger.total_ms(), text.len() as u32)?)
        };

        Ok(Self {
            config,
            text,
            stagger,
            timeline,
            phase: Phase::Idle,
            on_complete: None,
        })
    }

    /// Set the callback run once when every unit is revealed
    pub fn on_complete(mut self, callback: impl FnMut() + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub fn config(&self) -> &SplitRevealConfig {
        &self.config
    }

    pub fn units(&self) -> &UnitText {
        &self.text
    }

    pub fn is_started(&self) -> bool {
        self.phase != Phase::Idle
    }

    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }

    /// Units revealed so far; always the first `n` in order
    pub fn revealed_count(&self) -> usize {
        self.text
            .units
            .iter()
            .take_while(|unit| unit.state == RevealState::Revealed)
            .count()
    }

    /// Opacity and offset of the unit at `order_index`
    pub fn unit_frame(&self, order_index: usize) -> UnitFrame {
        let elapsed = self.timeline.as_ref().map_or(0.0, Timeline::elapsed_ms);
        let t = self
            .config
            .unit_easing
            .apply(self.stagger.progress(order_index, elapsed));
        UnitFrame {
            opacity: t,
            offset_y: self.config.offset_y * (1.0 - t),
        }
    }

    /// Text with units that have not started replaced by spaces
    pub fn render(&self) -> String {
        self.text.compose(|unit, out| match unit.state {
            RevealState::Pending => out.extend(unit.content.chars().map(|_| ' ')),
            _ => out.push_str(&unit.content),
        })
    }

    fn finish(&mut self) {
        self.phase = Phase::Complete;
        tracing::debug!(text = %self.config.text, "split reveal complete");
        if let Some(callback) = self.on_complete.as_mut() {
            callback();
        }
    }
}

impl Effect for SplitReveal {
    fn name(&self) -> &'static str {
        "split_reveal"
    }

    fn trigger_kind(&self) -> Option<TriggerKind> {
        Some(self.config.trigger)
    }

    fn on_trigger(&mut self, edge: TriggerEdge) {
        if edge != TriggerEdge::Fire || self.phase != Phase::Idle {
            return;
        }
        match self.timeline.as_mut() {
            Some(timeline) => {
                timeline.start();
                self.phase = Phase::Running;
                tracing::debug!(units = self.text.len(), "split reveal started");
            }
            None => self.finish(),
        }
    }

    fn advance(&mut self, dt_ms: f32) {
        if self.phase != Phase::Running {
            return;
        }
        let Some(timeline) = self.timeline.as_mut() else {
            return;
        };
        timeline.tick(dt_ms);
        let elapsed = timeline.elapsed_ms();
        let complete = timeline.is_complete();

        self.stagger.update(&mut self.text.units, elapsed);
        if complete {
            self.finish();
        }
    }

    fn cancel(&mut self) {
        if let Some(timeline) = self.timeline.as_mut() {
            timeline.pause();
        }
        self.on_complete = None;
    }

    fn is_settled(&self) -> bool {
        self.phase != Phase::Running
    }
}
