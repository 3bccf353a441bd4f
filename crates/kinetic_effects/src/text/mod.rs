//! Text effects
//!
//! All text effects share one decomposition: the input is split into
//! [`TextUnit`]s (characters, words or lines) on grapheme boundaries, with the
//! whitespace between units kept as non-animated separators. Composing the
//! units back together always reproduces the input exactly.
//!
//! Staged reveals additionally share a [`Stagger`] schedule mapping each
//! unit's order index to a start time.

mod blur_reveal;
mod decrypt;
mod split_reveal;
mod typewriter;

pub use blur_reveal::{BlurDirection, BlurFrame, BlurReveal, BlurRevealConfig};
pub use decrypt::{Decrypt, DecryptConfig, DecryptMode, RevealFrom};
pub use split_reveal::{SplitReveal, SplitRevealConfig, UnitFrame};
pub use typewriter::{AfterPause, CursorConfig, Typewriter, TypewriterConfig, TypewriterPhase};

use kinetic_animation::Easing;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// How text is cut into units
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitBy {
    /// One unit per grapheme
    #[default]
    Chars,
    /// One unit per whitespace-delimited word
    Words,
    /// One unit per line
    Lines,
}

/// Where a unit is in its reveal
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RevealState {
    #[default]
    Pending,
    Animating,
    Revealed,
}

/// One animatable slice of text
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextUnit {
    pub content: String,
    /// Whitespace following the unit, rendered but never animated
    pub trailing: String,
    /// Position in reveal order
    pub order_index: usize,
    pub state: RevealState,
}

/// Text decomposed into units
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnitText {
    /// Whitespace before the first unit
    pub leading: String,
    pub units: Vec<TextUnit>,
}

impl UnitText {
    /// Split `text` into units
    pub fn split(text: &str, split_by: SplitBy) -> Self {
        let mut out = UnitText::default();

        match split_by {
            SplitBy::Chars => {
                for grapheme in text.graphemes(true) {
                    if is_blank(grapheme) {
                        out.push_separator(grapheme);
                    } else {
                        out.push_unit(grapheme);
                    }
                }
            }
            SplitBy::Words => {
                let mut word = String::new();
                for grapheme in text.graphemes(true) {
                    if is_blank(grapheme) {
                        if !word.is_empty() {
                            out.push_unit(&std::mem::take(&mut word));
                        }
                        out.push_separator(grapheme);
                    } else {
                        word.push_str(grapheme);
                    }
                }
                if !word.is_empty() {
                    out.push_unit(&word);
                }
            }
            SplitBy::Lines => {
                for line in text.split_inclusive('\n') {
                    let body = line.trim_end_matches(['\n', '\r']);
                    if body.trim().is_empty() {
                        out.push_separator(line);
                    } else {
                        out.push_unit(body);
                        out.push_separator(&line[body.len()..]);
                    }
                }
            }
        }
        out
    }

    fn push_unit(&mut self, content: &str) {
        let order_index = self.units.len();
        self.units.push(TextUnit {
            content: content.to_string(),
            trailing: String::new(),
            order_index,
            state: RevealState::Pending,
        });
    }

    fn push_separator(&mut self, whitespace: &str) {
        match self.units.last_mut() {
            Some(unit) => unit.trailing.push_str(whitespace),
            None => self.leading.push_str(whitespace),
        }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// The original text
    pub fn text(&self) -> String {
        self.compose(|unit, out| out.push_str(&unit.content))
    }

    /// Render with `render_unit` writing each unit's content
    ///
    /// Separators are written as-is.
    pub fn compose(&self, mut render_unit: impl FnMut(&TextUnit, &mut String)) -> String {
        let mut out = self.leading.clone();
        for unit in &self.units {
            render_unit(unit, &mut out);
            out.push_str(&unit.trailing);
        }
        out
    }
}

fn is_blank(grapheme: &str) -> bool {
    grapheme.chars().all(char::is_whitespace)
}

/// Per-unit start times for a staged reveal
///
/// Unit `i` of `n` starts at `easing(i / (n - 1)) * span`, where `span` is
/// `stagger_ms * (n - 1)` optionally clamped to `max_total_ms`. Starts never
/// decrease with order index, so the revealed units always form a prefix of
/// the reveal order.
#[derive(Clone, Debug, PartialEq)]
pub struct Stagger {
    starts: Vec<f32>,
    unit_duration_ms: f32,
}

impl Stagger {
    pub fn new(
        count: usize,
        stagger_ms: f32,
        unit_duration_ms: f32,
        easing: Easing,
        max_total_ms: Option<f32>,
    ) -> Self {
        let mut span = stagger_ms * count.saturating_sub(1) as f32;
        if let Some(max) = max_total_ms {
            span = span.min(max.max(0.0));
        }

        let mut starts = Vec::with_capacity(count);
        let mut floor = 0.0_f32;
        for i in 0..count {
            let t = if count > 1 {
                i as f32 / (count - 1) as f32
            } else {
                0.0
            };
            let start = (easing.apply(t) * span).max(floor);
            floor = start;
            starts.push(start);
        }

        Self {
            starts,
            unit_duration_ms,
        }
    }

    pub fn start_ms(&self, index: usize) -> Option<f32> {
        self.starts.get(index).copied()
    }

    /// Time until the last unit finishes
    pub fn total_ms(&self) -> f32 {
        self.starts
            .last()
            .map_or(0.0, |last| last + self.unit_duration_ms)
    }

    /// Linear progress of unit `index` at `elapsed_ms`
    pub fn progress(&self, index: usize, elapsed_ms: f32) -> f32 {
        let Some(start) = self.start_ms(index) else {
            return 0.0;
        };
        ((elapsed_ms - start) / self.unit_duration_ms).clamp(0.0, 1.0)
    }

    pub fn state(&self, index: usize, elapsed_ms: f32) -> RevealState {
        let Some(start) = self.start_ms(index) else {
            return RevealState::Pending;
        };
        if elapsed_ms < start {
            RevealState::Pending
        } else if elapsed_ms >= start + self.unit_duration_ms {
            RevealState::Revealed
        } else {
            RevealState::Animating
        }
    }

    /// Apply the schedule to every unit
    pub(crate) fn update(&self, units: &mut [TextUnit], elapsed_ms: f32) {
        for unit in units {
            unit.state = self.state(unit.order_index, elapsed_ms);
        }
    }
}
