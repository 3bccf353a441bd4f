//! Typewriter text cycling
//!
//! Types each text grapheme by grapheme, holds it, then erases it (or swaps
//! straight to the next one) and moves on, cycling for as long as it is
//! mounted. The cursor blinks on its own clock, unaffected by the typing
//! phases.
//!
//! Phases chain without losing time: when one phase finishes mid-frame the
//! rest of the frame is spent on the next phase.

use kinetic_animation::Timeline;
use kinetic_core::error::{non_negative_delay, positive_duration};
use kinetic_core::{ConfigError, Result, TriggerEdge, TriggerKind};
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::effect::Effect;

/// What happens after a text has been shown for `pause_ms`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AfterPause {
    /// Delete the text grapheme by grapheme
    #[default]
    Erase,
    /// Clear the text at once and type the next one
    Swap,
}

/// Cursor options
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorConfig {
    pub show: bool,
    pub character: String,
    /// Duration of each on/off half of the blink
    pub blink_ms: f32,
    /// Hide the cursor while typing or erasing
    pub hide_while_typing: bool,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            show: true,
            character: "|".to_string(),
            blink_ms: 500.0,
            hide_while_typing: false,
        }
    }
}

/// Typewriter options
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypewriterConfig {
    pub texts: Vec<String>,
    /// Time per typed grapheme
    pub typing_speed_ms: f32,
    /// Time per erased grapheme
    pub deleting_speed_ms: f32,
    /// Hold time once a text is fully typed
    pub pause_ms: f32,
    /// Delay before typing the first text
    pub initial_delay_ms: f32,
    pub after_pause: AfterPause,
    /// Keep cycling after the last text
    pub looping: bool,
    /// Wait until the element scrolls into view before starting
    pub start_on_visible: bool,
    pub cursor: CursorConfig,
}

impl Default for TypewriterConfig {
    fn default() -> Self {
        Self {
            texts: Vec::new(),
            typing_speed_ms: 60.0,
            deleting_speed_ms: 30.0,
            pause_ms: 1800.0,
            initial_delay_ms: 0.0,
            after_pause: AfterPause::Erase,
            looping: true,
            start_on_visible: false,
            cursor: CursorConfig::default(),
        }
    }
}

impl TypewriterConfig {
    pub fn new<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            texts: texts.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_typing_speed(mut self, ms: f32) -> Self {
        self.typing_speed_ms = ms;
        self
    }

    pub fn with_deleting_speed(mut self, ms: f32) -> Self {
        self.deleting_speed_ms = ms;
        self
    }

    pub fn with_pause(mut self, ms: f32) -> Self {
        self.pause_ms = ms;
        self
    }

    pub fn with_initial_delay(mut self, ms: f32) -> Self {
        self.initial_delay_ms = ms;
        self
    }

    pub fn with_after_pause(mut self, after_pause: AfterPause) -> Self {
        self.after_pause = after_pause;
        self
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_cursor(mut self, cursor: CursorConfig) -> Self {
        self.cursor = cursor;
        self
    }
}

/// Where the typewriter is in its cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypewriterPhase {
    /// Waiting for its trigger
    Idle,
    /// Triggered by visibility, waiting out the initial delay
    Delayed,
    Typing { index: usize },
    Pausing { index: usize },
    Erasing { index: usize },
    /// Stopped on the last text (non-looping)
    Finished { index: usize },
}

/// A text and its grapheme boundaries
struct Sentence {
    text: String,
    /// Byte offset after each grapheme
    ends: Vec<usize>,
}

impl Sentence {
    fn new(text: String) -> Self {
        let ends = text
            .grapheme_indices(true)
            .map(|(start, grapheme)| start + grapheme.len())
            .collect();
        Self { text, ends }
    }

    fn len(&self) -> usize {
        self.ends.len()
    }

    /// The first `count` graphemes
    fn prefix(&self, count: usize) -> &str {
        let end = match count.min(self.ends.len()) {
            0 => 0,
            n => self.ends[n - 1],
        };
        &self.text[..end]
    }
}

type SentenceCallback = Box<dyn FnMut(usize, &str)>;

/// Cycling typewriter
pub struct Typewriter {
    config: TypewriterConfig,
    sentences: Vec<Sentence>,
    phase: TypewriterPhase,
    /// Clock of the current phase; `None` while idle or finished
    timeline: Option<Timeline>,
    /// Cursor blink clock, runs whenever the effect is mounted and visible
    cursor_ms: f32,
    on_sentence_complete: Option<SentenceCallback>,
}

impl Typewriter {
    pub fn new(config: TypewriterConfig) -> Result<Self> {
        if config.texts.is_empty() {
            return Err(ConfigError::EmptySequence("typewriter texts"));
        }
        positive_duration("typing speed", config.typing_speed_ms)?;
        positive_duration("deleting speed", config.deleting_speed_ms)?;
        positive_duration("cursor blink", config.cursor.blink_ms)?;
        non_negative_delay("pause", config.pause_ms)?;
        non_negative_delay("initial delay", config.initial_delay_ms)?;

        let sentences = config.texts.iter().cloned().map(Sentence::new).collect();
        Ok(Self {
            config,
            sentences,
            phase: TypewriterPhase::Idle,
            timeline: None,
            cursor_ms: 0.0,
            on_sentence_complete: None,
        })
    }

    /// Set the callback run each time a text is fully typed
    pub fn on_sentence_complete(mut self, callback: impl FnMut(usize, &str) + 'static) -> Self {
        self.on_sentence_complete = Some(Box::new(callback));
        self
    }

    pub fn config(&self) -> &TypewriterConfig {
        &self.config
    }

    pub fn phase(&self) -> TypewriterPhase {
        self.phase
    }

    /// The currently visible part of the current text
    pub fn visible_text(&self) -> &str {
        match self.phase {
            TypewriterPhase::Idle | TypewriterPhase::Delayed => "",
            TypewriterPhase::Typing { index } => {
                self.sentences[index].prefix(self.current_step() as usize)
            }
            TypewriterPhase::Pausing { index } | TypewriterPhase::Finished { index } => {
                &self.sentences[index].text
            }
            TypewriterPhase::Erasing { index } => {
                let sentence = &self.sentences[index];
                let erased = self.current_step() as usize;
                sentence.prefix(sentence.len().saturating_sub(erased))
            }
        }
    }

    /// Whether the cursor is drawn this frame
    pub fn cursor_visible(&self) -> bool {
        let cursor = &self.config.cursor;
        if !cursor.show {
            return false;
        }
        let busy = matches!(
            self.phase,
            TypewriterPhase::Typing { .. } | TypewriterPhase::Erasing { .. }
        );
        if cursor.hide_while_typing && busy {
            return false;
        }
        (self.cursor_ms / cursor.blink_ms) as u64 % 2 == 0
    }

    /// Visible text followed by the cursor when it is shown
    pub fn render(&self) -> String {
        let mut out = self.visible_text().to_string();
        if self.cursor_visible() {
            out.push_str(&self.config.cursor.character);
        }
        out
    }

    fn current_step(&self) -> u32 {
        self.timeline.as_ref().map_or(0, Timeline::current_step)
    }

    fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.sentences.len()
    }

    /// Start a phase clock, or `None` if the phase takes no time
    fn phase_clock(duration_ms: f32, steps: u32) -> Option<Timeline> {
        let mut timeline = Timeline::new(duration_ms, steps).ok()?;
        timeline.start();
        Some(timeline)
    }

    fn enter(&mut self, phase: TypewriterPhase) {
        tracing::trace!(from = ?self.phase, to = ?phase, "typewriter phase");
        self.phase = phase;
        self.timeline = match phase {
            TypewriterPhase::Typing { index } => {
                let len = self.sentences[index].len();
                Self::phase_clock(len as f32 * self.config.typing_speed_ms, len as u32)
            }
            TypewriterPhase::Delayed => Self::phase_clock(self.config.initial_delay_ms, 0),
            TypewriterPhase::Pausing { .. } => Self::phase_clock(self.config.pause_ms, 0),
            TypewriterPhase::Erasing { index } => {
                let len = self.sentences[index].len();
                Self::phase_clock(len as f32 * self.config.deleting_speed_ms, len as u32)
            }
            TypewriterPhase::Idle | TypewriterPhase::Finished { .. } => None,
        };
    }

    /// Move past a completed phase
    fn complete_phase(&mut self) {
        match self.phase {
            TypewriterPhase::Delayed => self.begin(),
            TypewriterPhase::Typing { index } => {
                if let Some(callback) = self.on_sentence_complete.as_mut() {
                    callback(index, &self.sentences[index].text);
                }
                let last = index + 1 == self.sentences.len();
                if last && !self.config.looping {
                    tracing::debug!(index, "typewriter finished");
                    self.enter(TypewriterPhase::Finished { index });
                } else {
                    self.enter(TypewriterPhase::Pausing { index });
                }
            }
            TypewriterPhase::Pausing { index } => match self.config.after_pause {
                AfterPause::Erase => self.enter(TypewriterPhase::Erasing { index }),
                AfterPause::Swap => {
                    let next = self.next_index(index);
                    self.enter(TypewriterPhase::Typing { index: next });
                }
            },
            TypewriterPhase::Erasing { index } => {
                let next = self.next_index(index);
                self.enter(TypewriterPhase::Typing { index: next });
            }
            TypewriterPhase::Idle | TypewriterPhase::Finished { .. } => {}
        }
    }

    fn all_empty(&self) -> bool {
        self.sentences.iter().all(|s| s.len() == 0)
    }

    /// Start typing the first text
    fn begin(&mut self) {
        if self.all_empty() {
            // Nothing would ever become visible; don't spin through empty phases
            let index = self.sentences.len() - 1;
            self.enter(TypewriterPhase::Finished { index });
            return;
        }
        tracing::debug!(texts = self.sentences.len(), "typewriter started");
        self.enter(TypewriterPhase::Typing { index: 0 });
    }
}

impl Effect for Typewriter {
    fn name(&self) -> &'static str {
        "typewriter"
    }

    fn trigger_kind(&self) -> Option<TriggerKind> {
        Some(if self.config.start_on_visible {
            TriggerKind::on_view()
        } else {
            TriggerKind::MountDelay {
                delay_ms: self.config.initial_delay_ms,
            }
        })
    }

    fn on_trigger(&mut self, edge: TriggerEdge) {
        if edge != TriggerEdge::Fire || self.phase != TypewriterPhase::Idle {
            return;
        }
        // A mount-delay trigger has already waited out the initial delay
        if self.config.start_on_visible && self.config.initial_delay_ms > 0.0 {
            self.enter(TypewriterPhase::Delayed);
        } else {
            self.begin();
        }
    }

    fn advance(&mut self, dt_ms: f32) {
        if !dt_ms.is_finite() || dt_ms <= 0.0 {
            return;
        }
        self.cursor_ms += dt_ms;

        let mut remaining = dt_ms;
        loop {
            if matches!(
                self.phase,
                TypewriterPhase::Idle | TypewriterPhase::Finished { .. }
            ) {
                return;
            }
            match self.timeline.as_mut() {
                Some(timeline) => {
                    remaining = timeline.tick(remaining);
                    if !timeline.is_complete() {
                        return;
                    }
                }
                // Zero-length phase
                None => {}
            }
            self.complete_phase();
            if remaining <= 0.0 && self.timeline.is_some() {
                return;
            }
        }
    }

    fn cancel(&mut self) {
        self.timeline = None;
        self.on_sentence_complete = None;
    }

    /// Settled once stopped with no cursor left to blink
    fn is_settled(&self) -> bool {
        !self.config.cursor.show
            && matches!(
                self.phase,
                TypewriterPhase::Idle | TypewriterPhase::Finished { .. }
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn running(config: TypewriterConfig) -> Typewriter {
        let mut typewriter = Typewriter::new(config).unwrap();
        typewriter.on_trigger(TriggerEdge::Fire);
        typewriter
    }

    #[test]
    fn test_types_grapheme_by_grapheme() {
        let mut tw = running(TypewriterConfig::new(["Python"]));
        assert_eq!(tw.visible_text(), "");
        tw.advance(60.0);
        assert_eq!(tw.visible_text(), "P");
        tw.advance(150.0);
        assert_eq!(tw.visible_text(), "Pyt");
        tw.advance(150.0);
        assert_eq!(tw.visible_text(), "Python");
        assert_eq!(tw.phase(), TypewriterPhase::Pausing { index: 0 });
    }

    #[test]
    fn test_alternates_and_loops() {
        let mut tw = running(TypewriterConfig::new(["A", "BB"]).with_pause(0.0));
        let mut seen = Vec::new();
        for _ in 0..200 {
            tw.advance(5.0);
            let text = tw.visible_text().to_string();
            if seen.last() != Some(&text) {
                seen.push(text);
            }
        }
        assert_eq!(
            &seen[..8],
            &["", "A", "", "B", "BB", "B", "", "A"].map(String::from)
        );
    }

    #[test]
    fn test_one_big_tick_matches_small_ticks() {
        let config = TypewriterConfig::new(["DNABert", "MAFFT"]).with_pause(100.0);
        let mut coarse = running(config.clone());
        let mut fine = running(config);

        coarse.advance(1234.0);
        for _ in 0..1234 {
            fine.advance(1.0);
        }
        assert_eq!(coarse.phase(), fine.phase());
        assert_eq!(coarse.visible_text(), fine.visible_text());
    }

    #[test]
    fn test_sentence_callback() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut tw = Typewriter::new(TypewriterConfig::new(["ab", "c"]).with_pause(10.0))
            .unwrap()
            .on_sentence_complete(move |index, text| {
                sink.borrow_mut().push((index, text.to_string()))
            });
        tw.on_trigger(TriggerEdge::Fire);
        tw.advance(2000.0);

        let seen = seen.borrow();
        assert_eq!(seen[0], (0, "ab".to_string()));
        assert_eq!(seen[1], (1, "c".to_string()));
        assert_eq!(seen[2], (0, "ab".to_string()));
    }

    #[test]
    fn test_non_looping_stops_on_last_text() {
        let mut tw = running(
            TypewriterConfig::new(["one", "two"])
                .with_pause(50.0)
                .with_looping(false),
        );
        tw.advance(10_000.0);
        assert_eq!(tw.phase(), TypewriterPhase::Finished { index: 1 });
        assert_eq!(tw.visible_text(), "two");
        // The cursor keeps blinking on the finished text
        assert!(!tw.is_settled());
    }

    #[test]
    fn test_settled_without_cursor() {
        let cursor = CursorConfig {
            show: false,
            ..Default::default()
        };
        let mut tw = running(
            TypewriterConfig::new(["one"])
                .with_looping(false)
                .with_cursor(cursor),
        );
        assert!(!tw.is_settled());
        tw.advance(1000.0);
        assert_eq!(tw.phase(), TypewriterPhase::Finished { index: 0 });
        assert!(tw.is_settled());
    }

    #[test]
    fn test_swap_skips_erasing() {
        let mut tw = running(
            TypewriterConfig::new(["ab", "cd"])
                .with_pause(100.0)
                .with_after_pause(AfterPause::Swap),
        );
        tw.advance(120.0 + 100.0);
        assert_eq!(tw.phase(), TypewriterPhase::Typing { index: 1 });
        assert_eq!(tw.visible_text(), "");
        tw.advance(60.0);
        assert_eq!(tw.visible_text(), "c");
    }

    #[test]
    fn test_empty_texts_are_skipped() {
        let mut tw = running(TypewriterConfig::new(["", "hi"]).with_pause(0.0));
        tw.advance(60.0);
        assert_eq!(tw.visible_text(), "h");

        let mut blank = running(TypewriterConfig::new(["", ""]));
        blank.advance(1000.0);
        assert_eq!(blank.phase(), TypewriterPhase::Finished { index: 1 });
        assert_eq!(blank.visible_text(), "");
    }

    #[test]
    fn test_cursor_blinks_independently() {
        let mut tw = Typewriter::new(TypewriterConfig::new(["x"])).unwrap();
        // Not started, cursor still blinks
        assert!(tw.cursor_visible());
        tw.advance(500.0);
        assert!(!tw.cursor_visible());
        tw.advance(500.0);
        assert!(tw.cursor_visible());
        assert_eq!(tw.render(), "|");
    }

    #[test]
    fn test_cursor_hidden_while_typing() {
        let cursor = CursorConfig {
            hide_while_typing: true,
            ..Default::default()
        };
        let mut tw = running(TypewriterConfig::new(["abc"]).with_cursor(cursor));
        tw.advance(30.0);
        assert!(!tw.cursor_visible());
        tw.advance(200.0);
        assert!(tw.cursor_visible());
        assert_eq!(tw.render(), "abc|");
    }

    #[test]
    fn test_grapheme_prefix() {
        let mut tw = running(TypewriterConfig::new(["e\u{301}x"]));
        tw.advance(60.0);
        assert_eq!(tw.visible_text(), "e\u{301}");
    }

    #[test]
    fn test_configuration_errors() {
        let empty: Vec<String> = Vec::new();
        assert_eq!(
            Typewriter::new(TypewriterConfig::new(empty)).err(),
            Some(ConfigError::EmptySequence("typewriter texts"))
        );
        assert!(Typewriter::new(TypewriterConfig::new(["a"]).with_typing_speed(0.0)).is_err());
        assert!(Typewriter::new(TypewriterConfig::new(["a"]).with_pause(-5.0)).is_err());
    }

    #[test]
    fn test_initial_delay_is_mount_trigger() {
        let tw = Typewriter::new(TypewriterConfig::new(["a"]).with_initial_delay(250.0)).unwrap();
        assert_eq!(
            tw.trigger_kind(),
            Some(TriggerKind::MountDelay { delay_ms: 250.0 })
        );
    }

    #[test]
    fn test_initial_delay_follows_visibility() {
        let config = TypewriterConfig {
            start_on_visible: true,
            ..TypewriterConfig::new(["ab"]).with_initial_delay(200.0)
        };
        let mut tw = Typewriter::new(config).unwrap();
        assert_eq!(tw.trigger_kind(), Some(TriggerKind::on_view()));

        tw.on_trigger(TriggerEdge::Fire);
        assert_eq!(tw.phase(), TypewriterPhase::Delayed);
        tw.advance(150.0);
        assert_eq!(tw.visible_text(), "");

        // 50ms finish the delay, 60ms type the first grapheme
        tw.advance(110.0);
        assert_eq!(tw.phase(), TypewriterPhase::Typing { index: 0 });
        assert_eq!(tw.visible_text(), "a");
    }
}
