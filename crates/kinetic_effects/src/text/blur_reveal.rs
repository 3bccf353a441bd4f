//! Blur-in text reveal
//!
//! Each unit travels a three-keyframe track, from blurred, transparent and
//! displaced to sharp and in place, one unit after another.

use kinetic_animation::{Easing, Interpolate, Keyframes, Timeline};
use kinetic_core::error::{non_negative_delay, positive_duration};
use kinetic_core::{Result, TriggerEdge, TriggerKind};
use serde::{Deserialize, Serialize};

use super::{RevealState, SplitBy, Stagger, UnitText};
use crate::effect::Effect;

/// Which side units enter from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlurDirection {
    #[default]
    Top,
    Bottom,
}

/// Visual state of one unit
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlurFrame {
    pub blur_px: f32,
    pub opacity: f32,
    pub offset_y: f32,
}

impl Interpolate for BlurFrame {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        BlurFrame {
            blur_px: self.blur_px.lerp(&other.blur_px, t),
            opacity: self.opacity.lerp(&other.opacity, t),
            offset_y: self.offset_y.lerp(&other.offset_y, t),
        }
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.blur_px.approx_eq(&other.blur_px, epsilon)
            && self.opacity.approx_eq(&other.opacity, epsilon)
            && self.offset_y.approx_eq(&other.offset_y, epsilon)
    }
}

impl BlurFrame {
    /// Fully revealed
    pub const SETTLED: BlurFrame = BlurFrame {
        blur_px: 0.0,
        opacity: 1.0,
        offset_y: 0.0,
    };
}

/// Blur-reveal options
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlurRevealConfig {
    pub text: String,
    pub animate_by: SplitBy,
    pub direction: BlurDirection,
    /// Delay between consecutive unit starts
    pub stagger_ms: f32,
    /// Duration of each keyframe segment
    pub step_ms: f32,
    /// Easing applied on every segment
    pub easing: Easing,
    pub trigger: TriggerKind,
}

impl Default for BlurRevealConfig {
    fn default() -> Self {
        Self {
            text: String::new(),
            animate_by: SplitBy::Words,
            direction: BlurDirection::Top,
            stagger_ms: 200.0,
            step_ms: 350.0,
            easing: Easing::Linear,
            trigger: TriggerKind::on_view(),
        }
    }
}

impl BlurRevealConfig {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_stagger(mut self, ms: f32) -> Self {
        self.stagger_ms = ms;
        self
    }

    pub fn with_step(mut self, ms: f32) -> Self {
        self.step_ms = ms;
        self
    }

    pub fn with_direction(mut self, direction: BlurDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_animate_by(mut self, animate_by: SplitBy) -> Self {
        self.animate_by = animate_by;
        self
    }
}

/// The default three-keyframe track for a direction
fn track(direction: BlurDirection, easing: Easing) -> Keyframes<BlurFrame> {
    let flip = match direction {
        BlurDirection::Top => 1.0,
        BlurDirection::Bottom => -1.0,
    };
    Keyframes::new()
        .keyframe(
            0.0,
            BlurFrame {
                blur_px: 10.0,
                opacity: 0.0,
                offset_y: -50.0 * flip,
            },
            easing,
        )
        .keyframe(
            0.5,
            BlurFrame {
                blur_px: 5.0,
                opacity: 0.5,
                offset_y: 5.0 * flip,
            },
            easing,
        )
        .keyframe(1.0, BlurFrame::SETTLED, easing)
}

/// Staggered blur-in reveal
pub struct BlurReveal {
    config: BlurRevealConfig,
    text: UnitText,
    stagger: Stagger,
    track: Keyframes<BlurFrame>,
    timeline: Option<Timeline>,
    started: bool,
    complete: bool,
    on_complete: Option<Box<dyn FnMut()>>,
}

impl BlurReveal {
    pub fn new(config: BlurRevealConfig) -> Result<Self> {
        let step_ms = positive_duration("blur step", config.step_ms)?;
        non_negative_delay("blur stagger", config.stagger_ms)?;

        let text = UnitText::split(&config.text, config.animate_by);
        // Two segments: from -> middle -> settled
        let stagger = Stagger::new(
            text.len(),
            config.stagger_ms,
            step_ms * 2.0,
            Easing::Linear,
            None,
        );
        let timeline = if text.is_empty() {
            None
        } else {
            Some(Timeline::new(stagger.total_ms(), 0)?)
        };
        let track = track(config.direction, config.easing);

        Ok(Self {
            config,
            text,
            stagger,
            track,
            timeline,
            started: false,
            complete: false,
            on_complete: None,
        })
    }

    /// Set the callback run once the last unit settles
    pub fn on_complete(mut self, callback: impl FnMut() + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub fn units(&self) -> &UnitText {
        &self.text
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Blur, opacity and offset of the unit at `order_index`
    pub fn frame(&self, order_index: usize) -> BlurFrame {
        let elapsed = self.timeline.as_ref().map_or(0.0, Timeline::elapsed_ms);
        let progress = self.stagger.progress(order_index, elapsed);
        self.track.sample_at(progress).unwrap_or(BlurFrame::SETTLED)
    }

    /// Frames for every unit, in order
    pub fn frames(&self) -> Vec<BlurFrame> {
        (0..self.text.len()).map(|i| self.frame(i)).collect()
    }

    /// Text with each unit shown only once it is at least half opaque
    pub fn render(&self) -> String {
        self.text.compose(|unit, out| {
            if self.frame(unit.order_index).opacity >= 0.5 {
                out.push_str(&unit.content);
            } else {
                out.extend(unit.content.chars().map(|_| ' '));
            }
        })
    }

    fn finish(&mut self) {
        self.complete = true;
        tracing::debug!(text = %self.config.text, "blur reveal complete");
        if let Some(callback) = self.on_complete.as_mut() {
            callback();
        }
    }
}

impl Effect for BlurReveal {
    fn name(&self) -> &'static str {
        "blur_reveal"
    }

    fn trigger_kind(&self) -> Option<TriggerKind> {
        Some(self.config.trigger)
    }

    fn on_trigger(&mut self, edge: TriggerEdge) {
        if edge != TriggerEdge::Fire || self.started {
            return;
        }
        self.started = true;
        match self.timeline.as_mut() {
            Some(timeline) => timeline.start(),
            None => self.finish(),
        }
    }

    fn advance(&mut self, dt_ms: f32) {
        if !self.started || self.complete {
            return;
        }
        let Some(timeline) = self.timeline.as_mut() else {
            return;
        };
        timeline.tick(dt_ms);
        let elapsed = timeline.elapsed_ms();
        let done = timeline.is_complete();

        self.stagger.update(&mut self.text.units, elapsed);
        if done {
            debug_assert!(self
                .text
                .units
                .iter()
                .all(|unit| unit.state == RevealState::Revealed));
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
        !self.started || self.complete
    }
}
