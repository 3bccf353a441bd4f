//! Scroll-linked reveal
//!
//! Unlike the timeline effects, a scroll reveal has no clock: its visual state
//! is a pure function of how far the element has scrolled into view. Mounted,
//! it recomputes on every intersection event.

use kinetic_animation::{Easing, LinearRange};
use kinetic_core::error::finite;
use kinetic_core::{Result, TriggerEdge, TriggerKind};
use serde::{Deserialize, Serialize};

use crate::effect::Effect;
use crate::text::{SplitBy, UnitText};

/// Scroll reveal options
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollRevealConfig {
    pub text: String,
    /// Opacity before the element scrolls in
    pub base_opacity: f32,
    pub enable_blur: bool,
    /// Blur in pixels before the element scrolls in
    pub blur_strength: f32,
    /// Rotation in degrees before the element scrolls in
    pub base_rotation: f32,
    pub easing: Easing,
    /// Fraction of the scroll range spent cascading across words
    ///
    /// `None` fades every word together.
    pub word_stagger: Option<f32>,
}

impl Default for ScrollRevealConfig {
    fn default() -> Self {
        Self {
            text: String::new(),
            base_opacity: 0.1,
            enable_blur: true,
            blur_strength: 4.0,
            base_rotation: 3.0,
            easing: Easing::Linear,
            word_stagger: None,
        }
    }
}

impl ScrollRevealConfig {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_base_opacity(mut self, opacity: f32) -> Self {
        self.base_opacity = opacity;
        self
    }

    pub fn with_blur(mut self, strength: f32) -> Self {
        self.enable_blur = true;
        self.blur_strength = strength;
        self
    }

    pub fn without_blur(mut self) -> Self {
        self.enable_blur = false;
        self
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.base_rotation = degrees;
        self
    }

    pub fn with_word_stagger(mut self, fraction: f32) -> Self {
        self.word_stagger = Some(fraction);
        self
    }
}

/// Visual state at one scroll position
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RevealFrame {
    /// Eased scroll progress in [0, 1]
    pub progress: f32,
    pub opacity: f32,
    pub blur_px: f32,
    pub rotation_deg: f32,
}

/// Scroll-linked reveal
#[derive(Clone, Debug)]
pub struct ScrollReveal {
    config: ScrollRevealConfig,
    words: UnitText,
    opacity: LinearRange,
    blur: LinearRange,
    rotation: LinearRange,
    /// Frame for the last observed ratio
    current: RevealFrame,
}

impl ScrollReveal {
    pub fn new(config: ScrollRevealConfig) -> Result<Self> {
        let base_opacity = finite("base opacity", config.base_opacity)?.clamp(0.0, 1.0);
        let blur_strength = finite("blur strength", config.blur_strength)?;
        let base_rotation = finite("base rotation", config.base_rotation)?;
        if let Some(stagger) = config.word_stagger {
            finite("word stagger", stagger)?;
        }

        let blur = if config.enable_blur {
            LinearRange::new(blur_strength.max(0.0), 0.0)
        } else {
            LinearRange::constant(0.0)
        };

        let mut reveal = Self {
            words: UnitText::split(&config.text, SplitBy::Words),
            opacity: LinearRange::new(base_opacity, 1.0),
            blur,
            rotation: LinearRange::new(base_rotation, 0.0),
            current: RevealFrame::default(),
            config,
        };
        reveal.current = reveal.sample(0.0);
        Ok(reveal)
    }

    pub fn config(&self) -> &ScrollRevealConfig {
        &self.config
    }

    /// Frame at scroll `ratio`; non-finite ratios count as 0
    pub fn sample(&self, ratio: f32) -> RevealFrame {
        let progress = self.config.easing.apply(clamp_ratio(ratio));
        RevealFrame {
            progress,
            opacity: self.opacity.at(progress),
            blur_px: self.blur.at(progress),
            rotation_deg: self.rotation.at(progress),
        }
    }

    /// Per-word opacity at scroll `ratio`
    pub fn word_opacities(&self, ratio: f32) -> Vec<f32> {
        let progress = self.config.easing.apply(clamp_ratio(ratio));
        let count = self.words.len();

        let Some(stagger) = self.config.word_stagger else {
            return vec![self.opacity.at(progress); count];
        };
        let stagger = stagger.clamp(0.0, 1.0);
        let window = (1.0 - stagger).max(1e-3);

        (0..count)
            .map(|i| {
                let offset = if count > 1 {
                    stagger * i as f32 / (count - 1) as f32
                } else {
                    0.0
                };
                self.opacity.at((progress - offset) / window)
            })
            .collect()
    }

    /// Frame for the last intersection ratio seen
    pub fn current(&self) -> RevealFrame {
        self.current
    }

    pub fn words(&self) -> &UnitText {
        &self.words
    }
}

fn clamp_ratio(ratio: f32) -> f32 {
    if ratio.is_finite() {
        ratio.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

impl Effect for ScrollReveal {
    fn name(&self) -> &'static str {
        "scroll_reveal"
    }

    fn trigger_kind(&self) -> Option<TriggerKind> {
        None
    }

    fn on_trigger(&mut self, _edge: TriggerEdge) {}

    fn advance(&mut self, _dt_ms: f32) {}

    fn on_intersection(&mut self, ratio: f32) {
        self.current = self.sample(ratio);
        tracing::trace!(ratio, opacity = self.current.opacity, "scroll reveal sampled");
    }

    fn cancel(&mut self) {}

    fn is_settled(&self) -> bool {
        true
    }
}
