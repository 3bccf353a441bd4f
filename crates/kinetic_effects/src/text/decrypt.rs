//! Scramble-on-hover decrypt
//!
//! While its trigger is fired, unsettled characters cycle through random
//! glyphs every `speed_ms` and settle into the real text one by one (or all at
//! once after a fixed number of scrambles). Releasing the trigger rolls the
//! text back to the original immediately.

use kinetic_animation::Timeline;
use kinetic_core::error::positive_duration;
use kinetic_core::{Result, TriggerEdge, TriggerKind};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::effect::Effect;

const DEFAULT_CHARSET: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz!@#$%^&*()_+";

/// How characters settle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecryptMode {
    /// One character settles every `speed_ms`, in reveal order
    Sequential,
    /// Everything scrambles `max_iterations` times, then settles together
    Simultaneous { max_iterations: u32 },
}

impl Default for DecryptMode {
    fn default() -> Self {
        DecryptMode::Simultaneous { max_iterations: 10 }
    }
}

/// Where sequential settling begins
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealFrom {
    #[default]
    Start,
    End,
    Center,
}

/// Decrypt options
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecryptConfig {
    pub text: String,
    /// Time between scrambles
    pub speed_ms: f32,
    pub mode: DecryptMode,
    pub reveal_from: RevealFrom,
    /// Glyphs used while scrambling
    pub charset: String,
    /// Scramble with the text's own characters instead of `charset`
    pub use_original_chars_only: bool,
    pub seed: u64,
    pub trigger: TriggerKind,
}

impl Default for DecryptConfig {
    fn default() -> Self {
        Self {
            text: String::new(),
            speed_ms: 50.0,
            mode: DecryptMode::default(),
            reveal_from: RevealFrom::Start,
            charset: DEFAULT_CHARSET.to_string(),
            use_original_chars_only: false,
            seed: 0x5eed,
            trigger: TriggerKind::Hover,
        }
    }
}

impl DecryptConfig {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: DecryptMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_reveal_from(mut self, reveal_from: RevealFrom) -> Self {
        self.reveal_from = reveal_from;
        self
    }

    pub fn with_speed(mut self, ms: f32) -> Self {
        self.speed_ms = ms;
        self
    }

    pub fn with_original_chars_only(mut self) -> Self {
        self.use_original_chars_only = true;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_trigger(mut self, trigger: TriggerKind) -> Self {
        self.trigger = trigger;
        self
    }
}

/// Hover-driven scramble effect
pub struct Decrypt {
    config: DecryptConfig,
    /// Original graphemes
    graphemes: Vec<String>,
    /// Indices of non-whitespace graphemes, in settle order
    order: Vec<usize>,
    /// What is currently displayed, per grapheme
    display: Vec<String>,
    /// Grapheme indices that have settled
    revealed: FxHashSet<usize>,
    glyphs: Vec<char>,
    rng: SmallRng,
    timeline: Option<Timeline>,
    /// Last step the scramble was refreshed for
    step: u32,
    scrambling: bool,
    on_complete: Option<Box<dyn FnMut()>>,
}

impl Decrypt {
    pub fn new(config: DecryptConfig) -> Result<Self> {
        let speed = positive_duration("decrypt speed", config.speed_ms)?;

        let graphemes: Vec<String> = config.text.graphemes(true).map(str::to_string).collect();
        let order = settle_order(&graphemes, config.reveal_from);

        let steps = match config.mode {
            DecryptMode::Sequential => order.len() as u32,
            DecryptMode::Simultaneous { max_iterations } => max_iterations,
        };
        let timeline = if order.is_empty() || steps == 0 {
            None
        } else {
            Some(Timeline::new(speed * steps as f32, steps)?)
        };

        let glyphs = if config.use_original_chars_only {
            let unique: FxHashSet<char> = config.text.chars().filter(|c| !c.is_whitespace()).collect();
            let mut glyphs: Vec<char> = unique.into_iter().collect();
            glyphs.sort_unstable();
            glyphs
        } else {
            config.charset.chars().filter(|c| !c.is_whitespace()).collect()
        };

        Ok(Self {
            display: graphemes.clone(),
            rng: SmallRng::seed_from_u64(config.seed),
            graphemes,
            order,
            revealed: FxHashSet::default(),
            glyphs,
            timeline,
            step: 0,
            scrambling: false,
            on_complete: None,
            config,
        })
    }

    /// Set the callback run each time the text fully decrypts
    pub fn on_complete(mut self, callback: impl FnMut() + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub fn config(&self) -> &DecryptConfig {
        &self.config
    }

    /// The text as currently displayed
    pub fn display(&self) -> String {
        self.display.concat()
    }

    pub fn is_scrambling(&self) -> bool {
        self.scrambling
    }

    /// Number of characters that have settled
    pub fn revealed_count(&self) -> usize {
        self.revealed.len()
    }

    /// Whether grapheme `index` shows its real character
    pub fn is_revealed(&self, index: usize) -> bool {
        self.revealed.contains(&index) || self.graphemes.get(index).map_or(false, |g| is_blank(g))
    }

    fn scramble(&mut self) {
        for &index in &self.order {
            if self.revealed.contains(&index) {
                continue;
            }
            self.display[index] = match self.glyphs.len() {
                0 => self.graphemes[index].clone(),
                n => self.glyphs[self.rng.gen_range(0..n)].to_string(),
            };
        }
    }

    fn settle(&mut self, count: usize) {
        for &index in self.order.iter().take(count) {
            if self.revealed.insert(index) {
                self.display[index] = self.graphemes[index].clone();
            }
        }
    }

    fn restore(&mut self) {
        self.display.clone_from(&self.graphemes);
        self.revealed.clear();
        self.step = 0;
        self.scrambling = false;
        self.rng = SmallRng::seed_from_u64(self.config.seed);
        if let Some(timeline) = self.timeline.as_mut() {
            timeline.reset();
        }
    }

    fn finish(&mut self) {
        self.settle(self.order.len());
        self.scrambling = false;
        tracing::debug!(text = %self.config.text, "decrypt complete");
        if let Some(callback) = self.on_complete.as_mut() {
            callback();
        }
    }
}

/// Non-whitespace grapheme indices in the order they settle
fn settle_order(graphemes: &[String], from: RevealFrom) -> Vec<usize> {
    let mut order: Vec<usize> = graphemes
        .iter()
        .enumerate()
        .filter(|(_, g)| !is_blank(g))
        .map(|(i, _)| i)
        .collect();

    match from {
        RevealFrom::Start => {}
        RevealFrom::End => order.reverse(),
        RevealFrom::Center => {
            // Twice the distance avoids halves for even lengths
            let center = graphemes.len().saturating_sub(1);
            order.sort_by_key(|&i| ((2 * i).abs_diff(center), i));
        }
    }
    order
}

fn is_blank(grapheme: &str) -> bool {
    grapheme.chars().all(char::is_whitespace)
}

impl Effect for Decrypt {
    fn name(&self) -> &'static str {
        "decrypt"
    }

    fn trigger_kind(&self) -> Option<TriggerKind> {
        Some(self.config.trigger)
    }

    fn on_trigger(&mut self, edge: TriggerEdge) {
        match edge {
            TriggerEdge::Fire => {
                self.restore();
                match self.timeline.as_mut() {
                    Some(timeline) => {
                        timeline.start();
                        self.scrambling = true;
                        self.scramble();
                        tracing::debug!(mode = ?self.config.mode, "decrypt scrambling");
                    }
                    None => self.finish(),
                }
            }
            TriggerEdge::Release => {
                tracing::debug!("decrypt rolled back");
                self.restore();
            }
        }
    }

    fn advance(&mut self, dt_ms: f32) {
        if !self.scrambling {
            return;
        }
        let Some(timeline) = self.timeline.as_mut() else {
            return;
        };
        timeline.tick(dt_ms);
        let step = timeline.current_step();
        let done = timeline.is_complete();

        if done {
            self.finish();
            return;
        }
        if step == self.step {
            return;
        }
        self.step = step;
        if self.config.mode == DecryptMode::Sequential {
            self.settle(step as usize);
        }
        self.scramble();
    }

    fn cancel(&mut self) {
        self.restore();
        self.on_complete = None;
    }

    fn is_settled(&self) -> bool {
        !self.scrambling
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "Hover to decrypt - micro interactions rule the web.";

    fn hovered(config: DecryptConfig) -> Decrypt {
        let mut decrypt = Decrypt::new(config).unwrap();
        decrypt.on_trigger(TriggerEdge::Fire);
        decrypt
    }

    #[test]
    fn test_idle_shows_original() {
        let decrypt = Decrypt::new(DecryptConfig::new(TEXT)).unwrap();
        assert_eq!(decrypt.display(), TEXT);
        assert!(!decrypt.is_scrambling());
    }

    #[test]
    fn test_scramble_keeps_whitespace_and_length() {
        let decrypt = hovered(DecryptConfig::new(TEXT));
        let shown = decrypt.display();
        assert!(decrypt.is_scrambling());
        assert_eq!(shown.chars().count(), TEXT.chars().count());
        for (a, b) in shown.chars().zip(TEXT.chars()) {
            assert_eq!(a == ' ', b == ' ');
        }
    }

    #[test]
    fn test_release_at_any_time_restores_text() {
        for stop in [0.0, 1.0, 49.0, 50.0, 120.0, 333.0, 499.0, 2000.0] {
            let mut decrypt = hovered(DecryptConfig::new(TEXT).with_mode(DecryptMode::Sequential));
            decrypt.advance(stop);
            decrypt.on_trigger(TriggerEdge::Release);
            assert_eq!(decrypt.display(), TEXT, "released after {}ms", stop);
            assert_eq!(decrypt.revealed_count(), 0);
        }
    }

    #[test]
    fn test_sequential_settles_in_order() {
        let mut decrypt = hovered(DecryptConfig::new("abcd").with_mode(DecryptMode::Sequential));
        decrypt.advance(50.0);
        assert!(decrypt.is_revealed(0));
        assert!(!decrypt.is_revealed(1));
        decrypt.advance(100.0);
        assert_eq!(decrypt.revealed_count(), 3);
        decrypt.advance(50.0);
        assert_eq!(decrypt.display(), "abcd");
        assert!(!decrypt.is_scrambling());
    }

    #[test]
    fn test_reveal_from_end_and_center() {
        let graphemes: Vec<String> = "abcde".chars().map(String::from).collect();
        assert_eq!(settle_order(&graphemes, RevealFrom::End), vec![4, 3, 2, 1, 0]);
        assert_eq!(settle_order(&graphemes, RevealFrom::Center), vec![2, 1, 3, 0, 4]);

        let spaced: Vec<String> = "a b".chars().map(String::from).collect();
        assert_eq!(settle_order(&spaced, RevealFrom::Start), vec![0, 2]);
    }

    #[test]
    fn test_simultaneous_settles_after_iterations() {
        let mut decrypt = hovered(
            DecryptConfig::new("decrypt").with_mode(DecryptMode::Simultaneous { max_iterations: 4 }),
        );
        decrypt.advance(150.0);
        assert_eq!(decrypt.revealed_count(), 0);
        assert!(decrypt.is_scrambling());
        decrypt.advance(50.0);
        assert_eq!(decrypt.display(), "decrypt");
    }

    #[test]
    fn test_same_seed_same_scramble() {
        let a = hovered(DecryptConfig::new(TEXT).with_seed(7));
        let b = hovered(DecryptConfig::new(TEXT).with_seed(7));
        assert_eq!(a.display(), b.display());
    }

    #[test]
    fn test_every_hover_scrambles_alike() {
        let mut decrypt = hovered(DecryptConfig::new(TEXT));
        let mut first = vec![decrypt.display()];
        for _ in 0..4 {
            decrypt.advance(50.0);
            first.push(decrypt.display());
        }

        decrypt.on_trigger(TriggerEdge::Release);
        decrypt.on_trigger(TriggerEdge::Fire);
        let mut second = vec![decrypt.display()];
        for _ in 0..4 {
            decrypt.advance(50.0);
            second.push(decrypt.display());
        }
        assert_eq!(first, second);
    }

    #[test]
    fn test_original_chars_only() {
        let decrypt = hovered(DecryptConfig::new("aab").with_original_chars_only());
        for c in decrypt.display().chars() {
            assert!(c == 'a' || c == 'b');
        }
    }

    #[test]
    fn test_whitespace_only_settles_at_once() {
        let decrypt = hovered(DecryptConfig::new("   "));
        assert!(!decrypt.is_scrambling());
        assert_eq!(decrypt.display(), "   ");
    }

    #[test]
    fn test_rehover_restarts() {
        let mut decrypt = hovered(DecryptConfig::new("abc").with_mode(DecryptMode::Sequential));
        decrypt.advance(1000.0);
        assert_eq!(decrypt.display(), "abc");
        decrypt.on_trigger(TriggerEdge::Release);
        decrypt.on_trigger(TriggerEdge::Fire);
        assert!(decrypt.is_scrambling());
        assert_eq!(decrypt.revealed_count(), 0);
    }
}
