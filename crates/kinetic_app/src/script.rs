//! Scripted visits
//!
//! A script is a list of timed visitor actions. [`drive`] plays one against
//! a [`LandingPage`] at a fixed frame rate.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::page::{Hotspot, LandingPage};

/// Something a visitor does
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "do", rename_all = "snake_case")]
pub enum Action {
    /// Smooth-scroll so the viewport top sits at `y`
    ScrollTo { y: f32 },
    Hover { target: Hotspot },
    Leave { target: Hotspot },
    Tap { target: Hotspot },
    OpenOnboarding,
    Next,
    Back,
    Close,
    /// Switch to another tab
    HideDocument,
    ShowDocument,
}

/// An action at a point in time
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    pub at_ms: f32,
    #[serde(flatten)]
    pub action: Action,
}

impl ScriptStep {
    pub fn new(at_ms: f32, action: Action) -> Self {
        Self { at_ms, action }
    }
}

/// Ordered, consumable list of steps
#[derive(Clone, Debug)]
pub struct Script {
    steps: Vec<ScriptStep>,
    next: usize,
}

impl Script {
    /// Steps are played in time order; ties keep their listed order
    pub fn new(mut steps: Vec<ScriptStep>) -> Self {
        steps.retain(|step| step.at_ms.is_finite());
        steps.sort_by(|a, b| a.at_ms.total_cmp(&b.at_ms));
        Self { steps, next: 0 }
    }

    /// A visitor reading down the stock page
    ///
    /// On a touch screen the hero grid is tapped on and off instead of hovered.
    pub fn stock(touch: bool) -> Self {
        use Action::*;
        let (grid_on, grid_off) = if touch {
            (Tap { target: Hotspot::HeroGrid }, Tap { target: Hotspot::HeroGrid })
        } else {
            (Hover { target: Hotspot::HeroGrid }, Leave { target: Hotspot::HeroGrid })
        };
        Self::new(vec![
            ScriptStep::new(1500.0, ScrollTo { y: 600.0 }),
            ScriptStep::new(3000.0, grid_on),
            ScriptStep::new(4200.0, grid_off),
            ScriptStep::new(5000.0, ScrollTo { y: 1200.0 }),
            ScriptStep::new(5800.0, Hover { target: Hotspot::Decrypt }),
            ScriptStep::new(7000.0, Leave { target: Hotspot::Decrypt }),
            ScriptStep::new(7500.0, HideDocument),
            ScriptStep::new(8500.0, ShowDocument),
            ScriptStep::new(9000.0, OpenOnboarding),
            ScriptStep::new(9500.0, Next),
            ScriptStep::new(9800.0, Back),
            ScriptStep::new(10100.0, Next),
            ScriptStep::new(10400.0, Next),
            ScriptStep::new(10700.0, Next),
            ScriptStep::new(11000.0, ScrollTo { y: 1900.0 }),
        ])
    }

    /// The configured steps, or the stock visit when none are given
    pub fn from_config(steps: &[ScriptStep], touch: bool) -> Self {
        if steps.is_empty() {
            Self::stock(touch)
        } else {
            Self::new(steps.to_vec())
        }
    }

    /// Take every step due at or before `now_ms`
    pub fn due(&mut self, now_ms: f32) -> &[ScriptStep] {
        let start = self.next;
        while self.next < self.steps.len() && self.steps[self.next].at_ms <= now_ms {
            self.next += 1;
        }
        &self.steps[start..self.next]
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Whether every step has been played
    pub fn is_finished(&self) -> bool {
        self.next >= self.steps.len()
    }
}

/// Frame rate and length of a run
#[derive(Clone, Copy, Debug)]
pub struct RunOptions {
    pub fps: u32,
    pub seconds: f32,
}

/// Play `script` against `page`
///
/// `on_frame` sees the page after every frame along with the frame number.
/// Returns the number of frames played.
pub fn drive(
    page: &mut LandingPage,
    mut script: Script,
    options: RunOptions,
    mut on_frame: impl FnMut(u64, &LandingPage),
) -> Result<u64> {
    if options.fps == 0 {
        bail!("Frame rate must be at least 1 fps");
    }
    if !options.seconds.is_finite() || options.seconds <= 0.0 {
        bail!("Run length must be positive, got {}s", options.seconds);
    }

    let dt_ms = 1000.0 / options.fps as f32;
    let total = (options.seconds * options.fps as f32).ceil() as u64;

    for frame in 0..total {
        let now_ms = frame as f32 * dt_ms;
        for step in script.due(now_ms) {
            page.apply(&step.action);
        }
        page.tick(dt_ms);
        on_frame(frame, page);
    }

    if !script.is_finished() {
        tracing::info!(
            remaining = script.len() - script.next,
            "run ended before the script finished"
        );
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PageConfig;

    #[test]
    fn test_steps_sorted_and_consumed() {
        let mut script = Script::new(vec![
            ScriptStep::new(200.0, Action::Next),
            ScriptStep::new(100.0, Action::OpenOnboarding),
            ScriptStep::new(f32::NAN, Action::Close),
            ScriptStep::new(200.0, Action::Back),
        ]);
        assert_eq!(script.len(), 3);

        assert!(script.due(50.0).is_empty());
        assert_eq!(script.due(100.0)[0].action, Action::OpenOnboarding);
        let later: Vec<_> = script.due(1000.0).iter().map(|s| s.action).collect();
        assert_eq!(later, vec![Action::Next, Action::Back]);
        assert!(script.is_finished());
        assert!(script.due(2000.0).is_empty());
    }

    #[test]
    fn test_script_from_toml() {
        let config = PageConfig::parse(
            r#"
            [[script]]
            at_ms = 0
            do = "scroll_to"
            y = 400.0

            [[script]]
            at_ms = 250.0
            do = "hover"
            target = "decrypt"

            [[script]]
            at_ms = 900.0
            do = "open_onboarding"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.script,
            vec![
                ScriptStep::new(0.0, Action::ScrollTo { y: 400.0 }),
                ScriptStep::new(250.0, Action::Hover { target: Hotspot::Decrypt }),
                ScriptStep::new(900.0, Action::OpenOnboarding),
            ]
        );
        assert_eq!(Script::from_config(&config.script, false).len(), 3);
        assert_eq!(Script::from_config(&[], false).len(), Script::stock(false).len());
    }

    #[test]
    fn test_stock_visit_runs() {
        let mut page = LandingPage::new(&PageConfig::default());
        let mut last_frame = None;
        let frames = drive(
            &mut page,
            Script::stock(false),
            RunOptions {
                fps: 30,
                seconds: 12.0,
            },
            |frame, _| last_frame = Some(frame),
        )
        .unwrap();

        assert_eq!(frames, 360);
        assert_eq!(last_frame, Some(359));
        // The stock visit walks the onboarding to completion
        assert_eq!(page.onboarding_completions(), 1);
        assert!(!page.is_onboarding_open());
        assert!((page.scroll_y() - 1900.0).abs() < 1e-3);
        assert!(page.render().contains("PROJECT JEEV"));
    }

    #[test]
    fn test_invalid_run_options() {
        let mut page = LandingPage::new(&PageConfig::default());
        let bad_fps = RunOptions {
            fps: 0,
            seconds: 1.0,
        };
        assert!(drive(&mut page, Script::stock(false), bad_fps, |_, _| {}).is_err());

        let bad_length = RunOptions {
            fps: 60,
            seconds: -1.0,
        };
        assert!(drive(&mut page, Script::stock(false), bad_length, |_, _| {}).is_err());
    }

    #[test]
    fn test_touch_visit_taps_the_grid() {
        let mut config = PageConfig::default();
        config.hero_grid.touch = true;
        let script = Script::from_config(&config.script, config.hero_grid.touch);
        let taps = script
            .steps
            .iter()
            .filter(|s| s.action == Action::Tap { target: Hotspot::HeroGrid })
            .count();
        assert_eq!(taps, 2);

        // Midway through the visit the tapped grid shows its second layer
        let mut page = LandingPage::new(&config);
        drive(
            &mut page,
            script,
            RunOptions {
                fps: 30,
                seconds: 4.0,
            },
            |_, _| {},
        )
        .unwrap();
        assert!(page.render().contains("Interactive Demo"));
    }
}
