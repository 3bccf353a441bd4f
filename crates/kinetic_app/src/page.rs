//! The landing page host
//!
//! [`LandingPage`] mounts one effect per page element, stands in for the
//! browser by turning scroll position into intersection events and pointer
//! actions into element events, and drives everything from a single frame
//! service. Effects never talk to each other; the page only places them.

use kinetic_animation::{Easing, LinearRange, Timeline};
use kinetic_core::{ElementEvent, EventTarget, FrameTick, Result as EffectResult};
use kinetic_effects::{
    BlurReveal, Decrypt, Effect, EffectInstance, Layer, PixelGrid, ScrollReveal, SplitReveal,
    StepTransition, Stepper, TransitionResult, Typewriter,
};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;
use tracing::{debug, info, warn};

use crate::config::{LayoutConfig, OnboardingConfig, PageConfig, StepContent};
use crate::opaque::{GalleryConfig, PrismConfig};
use crate::script::Action;

/// Elements a visitor can point at
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hotspot {
    HeroGrid,
    Decrypt,
}

/// A positioned page element with its event target
struct Element {
    name: String,
    target: EventTarget<ElementEvent>,
    top: f32,
    height: f32,
    /// Last ratio delivered
    ratio: Cell<Option<f32>>,
}

impl Element {
    fn new(name: impl Into<String>, top: f32, height: f32) -> Self {
        Self {
            name: name.into(),
            target: EventTarget::new(),
            top,
            height,
            ratio: Cell::new(None),
        }
    }

    /// Deliver the visible fraction if it changed
    fn observe(&self, scroll_y: f32, viewport_height: f32) {
        let ratio = visible_fraction(self.top, self.height, scroll_y, viewport_height);
        let changed = self
            .ratio
            .get()
            .map_or(true, |last| (last - ratio).abs() > 1e-4);
        if changed {
            self.ratio.set(Some(ratio));
            tracing::trace!(element = %self.name, ratio, "intersection");
            self.target.emit(&ElementEvent::Intersection { ratio });
        }
    }
}

/// Fraction of `[top, top + height]` inside the viewport
fn visible_fraction(top: f32, height: f32, scroll_y: f32, viewport_height: f32) -> f32 {
    if height <= 0.0 {
        return 0.0;
    }
    let overlap = (top + height).min(scroll_y + viewport_height) - top.max(scroll_y);
    (overlap.max(0.0) / height).clamp(0.0, 1.0)
}

/// A mounted effect, or static text when the effect could not be built
enum Slot<E: Effect> {
    Live(EffectInstance<E>),
    Static(String),
}

struct Section<E: Effect> {
    element: Element,
    slot: Slot<E>,
}

impl<E: Effect> Section<E> {
    fn mount(
        element: Element,
        effect: EffectResult<E>,
        fallback: &str,
        frames: &EventTarget<FrameTick>,
    ) -> Self {
        let mounted =
            effect.and_then(|effect| EffectInstance::mount(effect, &element.target, frames));
        let slot = match mounted {
            Ok(instance) => Slot::Live(instance),
            Err(err) => {
                warn!(element = %element.name, %err, "effect disabled, showing static text");
                Slot::Static(fallback.to_string())
            }
        };
        Self { element, slot }
    }

    fn render(&self, view: impl FnOnce(&E) -> String) -> String {
        match &self.slot {
            Slot::Live(instance) => instance.with(view),
            Slot::Static(text) => text.clone(),
        }
    }

    fn is_live(&self) -> bool {
        matches!(self.slot, Slot::Live(_))
    }
}

struct ScrollMotion {
    timeline: Timeline,
    range: LinearRange,
    target: f32,
}

/// The composed landing page
pub struct LandingPage {
    layout: LayoutConfig,
    frames: EventTarget<FrameTick>,
    title: Section<SplitReveal>,
    tagline: Section<Typewriter>,
    headlines: Vec<Section<BlurReveal>>,
    pitch: Section<ScrollReveal>,
    hero_grid: Section<PixelGrid>,
    hero_layers: (String, String),
    decrypt: Section<Decrypt>,
    headings: Vec<Section<SplitReveal>>,
    onboarding_config: OnboardingConfig,
    /// Present only while the modal is open
    onboarding: Option<Stepper<StepContent>>,
    onboarding_completions: Rc<Cell<u32>>,
    prism: PrismConfig,
    gallery: GalleryConfig,
    scroll_y: f32,
    scroll: Option<ScrollMotion>,
    now_ms: f32,
    document_visible: bool,
}

impl LandingPage {
    /// Build and mount every element of the page
    ///
    /// Elements whose effect configuration is invalid are logged and shown
    /// as static text.
    pub fn new(config: &PageConfig) -> Self {
        let layout = config.layout.clone();
        let frames = EventTarget::new();
        let line = layout.line_height;

        let title = Section::mount(
            Element::new("title", layout.title_top, line),
            SplitReveal::new(config.title.clone()),
            &config.title.text,
            &frames,
        );

        let tagline = Section::mount(
            Element::new("tagline", layout.tagline_top, line),
            Typewriter::new(config.tagline.clone()),
            config.tagline.texts.first().map_or("", String::as_str),
            &frames,
        );

        let headlines = config
            .headlines
            .iter()
            .enumerate()
            .map(|(i, headline)| {
                let top = layout.headlines_top + i as f32 * layout.headline_spacing;
                Section::mount(
                    Element::new(format!("headline[{i}]"), top, line),
                    BlurReveal::new(headline.clone()),
                    &headline.text,
                    &frames,
                )
            })
            .collect();

        let hero_grid = Section::mount(
            Element::new("hero_grid", layout.hero_grid_top, config.hero_grid.height),
            PixelGrid::new(config.hero_grid.grid_config())
                .map(|grid| grid.on_reveal_complete(|| debug!("hero grid revealed"))),
            &config.hero_grid.first_layer,
            &frames,
        );

        let pitch = Section::mount(
            Element::new("pitch", layout.pitch_top, layout.pitch_height),
            ScrollReveal::new(config.pitch.clone()),
            &config.pitch.text,
            &frames,
        );

        let decrypt = Section::mount(
            Element::new("decrypt", layout.decrypt_top, line),
            Decrypt::new(config.decrypt.clone()),
            &config.decrypt.text,
            &frames,
        );

        let mut last_top = layout.decrypt_top;
        let headings = config
            .headings
            .iter()
            .enumerate()
            .map(|(i, heading)| {
                let top = layout
                    .headings_top
                    .get(i)
                    .copied()
                    .unwrap_or(last_top + layout.viewport_height);
                last_top = top;
                Section::mount(
                    Element::new(format!("heading[{i}]"), top, line),
                    SplitReveal::new(heading.clone()),
                    &heading.text,
                    &frames,
                )
            })
            .collect();

        let page = Self {
            layout,
            frames,
            title,
            tagline,
            headlines,
            pitch,
            hero_grid,
            hero_layers: (
                config.hero_grid.first_layer.clone(),
                format!(
                    "{} / {}",
                    config.hero_grid.second_title, config.hero_grid.second_body
                ),
            ),
            decrypt,
            headings,
            onboarding_config: config.onboarding.clone(),
            onboarding: None,
            onboarding_completions: Rc::new(Cell::new(0)),
            prism: config.prism.clone(),
            gallery: config.gallery.clone(),
            scroll_y: 0.0,
            scroll: None,
            now_ms: 0.0,
            document_visible: true,
        };

        info!(
            live = page.live_effect_count(),
            elements = page.elements().count(),
            "landing page mounted"
        );
        page.observe_all();
        page
    }

    fn elements(&self) -> impl Iterator<Item = &Element> {
        std::iter::once(&self.title.element)
            .chain(std::iter::once(&self.tagline.element))
            .chain(self.headlines.iter().map(|s| &s.element))
            .chain(std::iter::once(&self.hero_grid.element))
            .chain(std::iter::once(&self.pitch.element))
            .chain(std::iter::once(&self.decrypt.element))
            .chain(self.headings.iter().map(|s| &s.element))
    }

    fn observe_all(&self) {
        for element in self.elements() {
            element.observe(self.scroll_y, self.layout.viewport_height);
        }
    }

    /// Advance the page by one frame
    pub fn tick(&mut self, dt_ms: f32) {
        if !dt_ms.is_finite() || dt_ms <= 0.0 {
            return;
        }
        self.now_ms += dt_ms;

        if let Some(motion) = self.scroll.as_mut() {
            motion.timeline.tick(dt_ms);
            if motion.timeline.is_complete() {
                self.scroll_y = motion.target;
                self.scroll = None;
            } else {
                self.scroll_y = motion.range.at(motion.timeline.eased_progress());
            }
        }
        self.observe_all();

        self.frames.emit(&FrameTick { dt_ms });
    }

    /// Smooth-scroll the viewport top to `y`
    pub fn scroll_to(&mut self, y: f32) {
        if !y.is_finite() {
            warn!(y, "ignoring scroll to a non-finite position");
            return;
        }
        let target = y.max(0.0);
        debug!(from = self.scroll_y, to = target, "scroll");

        match Timeline::new(self.layout.scroll_ms, 0) {
            Ok(timeline) if target != self.scroll_y => {
                let mut timeline = timeline.with_easing(Easing::EaseInOut);
                timeline.start();
                self.scroll = Some(ScrollMotion {
                    timeline,
                    range: LinearRange::new(self.scroll_y, target),
                    target,
                });
            }
            _ => {
                self.scroll = None;
                self.scroll_y = target;
                self.observe_all();
            }
        }
    }

    fn hotspot(&self, hotspot: Hotspot) -> &Element {
        match hotspot {
            Hotspot::HeroGrid => &self.hero_grid.element,
            Hotspot::Decrypt => &self.decrypt.element,
        }
    }

    pub fn hover(&self, hotspot: Hotspot) {
        self.hotspot(hotspot).target.emit(&ElementEvent::PointerEnter);
    }

    pub fn leave(&self, hotspot: Hotspot) {
        self.hotspot(hotspot).target.emit(&ElementEvent::PointerLeave);
    }

    pub fn tap(&self, hotspot: Hotspot) {
        self.hotspot(hotspot).target.emit(&ElementEvent::Activate);
    }

    /// Show or hide the whole document; hidden effects hold still
    pub fn set_document_visible(&mut self, visible: bool) {
        if self.document_visible == visible {
            return;
        }
        self.document_visible = visible;
        info!(visible, "document visibility changed");
        for element in self.elements() {
            element.target.emit(&ElementEvent::Visibility(visible));
        }
    }

    /// Open the onboarding modal; returns whether it opened
    pub fn open_onboarding(&mut self) -> bool {
        if self.onboarding.is_some() {
            return false;
        }

        let completions = Rc::clone(&self.onboarding_completions);
        let stepper = Stepper::new(
            self.onboarding_config.steps.clone(),
            self.onboarding_config.stepper.clone(),
        )
        .map(|stepper| {
            stepper
                .on_step_change(|step| debug!(step, "onboarding step"))
                .on_final_step_completed(move || completions.set(completions.get() + 1))
        });

        match stepper {
            Ok(stepper) => {
                info!(steps = stepper.step_count(), "onboarding opened");
                self.onboarding = Some(stepper);
                true
            }
            Err(err) => {
                warn!(%err, "onboarding unavailable");
                false
            }
        }
    }

    /// Forward button; completing the last step closes the modal
    pub fn onboarding_next(&mut self) -> TransitionResult<Option<StepTransition>> {
        let Some(stepper) = self.onboarding.as_mut() else {
            return Ok(None);
        };
        let transition = stepper.next()?;
        if stepper.is_completed() {
            info!("onboarding completed");
            self.onboarding = None;
        }
        Ok(Some(transition))
    }

    pub fn onboarding_back(&mut self) -> TransitionResult<Option<StepTransition>> {
        match self.onboarding.as_mut() {
            Some(stepper) => stepper.back(),
            None => Ok(None),
        }
    }

    /// Close the modal, discarding its progress
    pub fn close_onboarding(&mut self) -> bool {
        let closed = self.onboarding.take().is_some();
        if closed {
            info!("onboarding closed");
        }
        closed
    }

    pub fn is_onboarding_open(&self) -> bool {
        self.onboarding.is_some()
    }

    /// Times the onboarding has been completed
    pub fn onboarding_completions(&self) -> u32 {
        self.onboarding_completions.get()
    }

    /// Apply one visitor action
    pub fn apply(&mut self, action: &Action) {
        debug!(?action, at_ms = self.now_ms, "visitor action");
        match *action {
            Action::ScrollTo { y } => self.scroll_to(y),
            Action::Hover { target } => self.hover(target),
            Action::Leave { target } => self.leave(target),
            Action::Tap { target } => self.tap(target),
            Action::OpenOnboarding => {
                self.open_onboarding();
            }
            Action::Next => {
                if let Err(err) = self.onboarding_next() {
                    warn!(%err, "onboarding next rejected");
                }
            }
            Action::Back => {
                if let Err(err) = self.onboarding_back() {
                    warn!(%err, "onboarding back rejected");
                }
            }
            Action::Close => {
                self.close_onboarding();
            }
            Action::HideDocument => self.set_document_visible(false),
            Action::ShowDocument => self.set_document_visible(true),
        }
    }

    pub fn now_ms(&self) -> f32 {
        self.now_ms
    }

    pub fn scroll_y(&self) -> f32 {
        self.scroll_y
    }

    /// The frame service every effect is attached to
    pub fn frames(&self) -> &EventTarget<FrameTick> {
        &self.frames
    }

    /// Number of elements running a live effect
    pub fn live_effect_count(&self) -> usize {
        [
            self.title.is_live(),
            self.tagline.is_live(),
            self.pitch.is_live(),
            self.hero_grid.is_live(),
            self.decrypt.is_live(),
        ]
        .into_iter()
        .filter(|&live| live)
        .count()
            + self.headlines.iter().filter(|s| s.is_live()).count()
            + self.headings.iter().filter(|s| s.is_live()).count()
    }

    /// Textual frame of the whole page
    pub fn render(&self) -> String {
        let mut out = format!(
            "t={:.2}s scroll={:.0}{}\n",
            self.now_ms / 1000.0,
            self.scroll_y,
            if self.document_visible { "" } else { " (hidden)" }
        );
        let mut row = |label: &str, text: String| {
            out.push_str(&format!("{label:>10} | {text}\n"));
        };

        row("prism", self.prism.describe());
        row("title", self.title.render(SplitReveal::render));
        row("tagline", self.tagline.render(Typewriter::render));
        for headline in &self.headlines {
            row("headline", headline.render(BlurReveal::render));
        }

        let (first, second) = &self.hero_layers;
        row(
            "hero",
            self.hero_grid.render(|grid| {
                let layer = match grid.active_layer() {
                    Layer::First => first,
                    Layer::Second => second,
                };
                let cells = grid.render().trim_end().replace('\n', " ");
                format!("{layer} [{cells}]")
            }),
        );

        row(
            "pitch",
            self.pitch.render(|reveal| {
                let frame = reveal.current();
                format!(
                    "{} (opacity {:.2}, blur {:.1}px, rotate {:.1}deg)",
                    reveal.config().text,
                    frame.opacity,
                    frame.blur_px,
                    frame.rotation_deg
                )
            }),
        );
        row("decrypt", self.decrypt.render(Decrypt::display));
        for heading in &self.headings {
            row("heading", heading.render(SplitReveal::render));
        }
        row("gallery", self.gallery.describe());

        if let Some(stepper) = &self.onboarding {
            let step = stepper.current_step().unwrap_or(0);
            let content = stepper
                .current_content()
                .map(|c| format!("{}: {}", c.title, c.body))
                .unwrap_or_default();
            let back = stepper
                .back_label()
                .map(|label| format!("[{label}] "))
                .unwrap_or_default();
            row(
                "onboarding",
                format!(
                    "{step}/{} {content} {back}[{}]",
                    stepper.step_count(),
                    stepper.next_label()
                ),
            );
        }
        out
    }
}

impl Drop for LandingPage {
    fn drop(&mut self) {
        debug!(at_ms = self.now_ms, "landing page unmounting");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(page: &mut LandingPage, ms: f32) {
        let frames = (ms / 16.0).ceil() as usize;
        for _ in 0..frames {
            page.tick(16.0);
        }
    }

    #[test]
    fn test_visible_fraction() {
        assert_eq!(visible_fraction(100.0, 50.0, 0.0, 900.0), 1.0);
        assert_eq!(visible_fraction(1000.0, 50.0, 0.0, 900.0), 0.0);
        assert!((visible_fraction(880.0, 40.0, 0.0, 900.0) - 0.5).abs() < 1e-6);
        assert_eq!(visible_fraction(0.0, 0.0, 0.0, 900.0), 0.0);
    }

    #[test]
    fn test_stock_page_mounts_everything() {
        let page = LandingPage::new(&PageConfig::default());
        // title, tagline, 3 headlines, hero grid, pitch, decrypt, 2 headings
        assert_eq!(page.live_effect_count(), 10);
        assert!(page.frames().listener_count() >= 10);
    }

    #[test]
    fn test_title_reveals() {
        let mut page = LandingPage::new(&PageConfig::default());
        run(&mut page, 2500.0);
        assert!(page.render().contains("PROJECT JEEV"));
    }

    #[test]
    fn test_invalid_effect_degrades_to_static_text() {
        let mut config = PageConfig::default();
        config.hero_grid.grid.grid_size = 0;
        config.tagline.texts.clear();

        let mut page = LandingPage::new(&config);
        assert_eq!(page.live_effect_count(), 8);

        // Pointer input on a static slot goes nowhere
        page.hover(Hotspot::HeroGrid);
        run(&mut page, 100.0);
        let frame = page.render();
        let hero = frame.lines().find(|l| l.contains("hero |")).unwrap();
        assert!(hero.ends_with("| [hero image]"));
    }

    #[test]
    fn test_scroll_reaches_target() {
        let mut page = LandingPage::new(&PageConfig::default());
        page.scroll_to(1200.0);
        run(&mut page, 300.0);
        assert!(page.scroll_y() > 0.0 && page.scroll_y() < 1200.0);
        run(&mut page, 400.0);
        assert_eq!(page.scroll_y(), 1200.0);

        page.scroll_to(-50.0);
        run(&mut page, 700.0);
        assert_eq!(page.scroll_y(), 0.0);
    }

    #[test]
    fn test_touch_grid_follows_taps() {
        let mut config = PageConfig::default();
        config.hero_grid.touch = true;
        let mut page = LandingPage::new(&config);
        let hero = |page: &LandingPage| {
            let frame = page.render();
            frame.lines().find(|l| l.contains("hero |")).unwrap().to_string()
        };

        page.hover(Hotspot::HeroGrid);
        run(&mut page, 1000.0);
        assert!(hero(&page).contains("[hero image]"));

        page.tap(Hotspot::HeroGrid);
        run(&mut page, 1000.0);
        assert!(hero(&page).contains("Interactive Demo"));

        page.tap(Hotspot::HeroGrid);
        run(&mut page, 1000.0);
        assert!(hero(&page).contains("[hero image]"));
    }

    #[test]
    fn test_hover_decrypt_then_leave_restores() {
        let mut page = LandingPage::new(&PageConfig::default());
        let original = PageConfig::default().decrypt.text;

        page.hover(Hotspot::Decrypt);
        run(&mut page, 120.0);
        page.leave(Hotspot::Decrypt);
        run(&mut page, 16.0);

        assert!(page.render().contains(&original));
    }

    #[test]
    fn test_onboarding_completes_once() {
        let mut page = LandingPage::new(&PageConfig::default());
        assert!(page.open_onboarding());
        assert!(!page.open_onboarding());

        assert_eq!(page.onboarding_back(), Ok(None));
        assert!(page.render().contains("1/3 Welcome"));

        page.onboarding_next().unwrap();
        assert!(page.render().contains("[Previous] [Next]"));
        page.onboarding_next().unwrap();
        let done = page.onboarding_next().unwrap().unwrap();
        assert_eq!(done.direction, 1);

        assert_eq!(page.onboarding_completions(), 1);
        assert!(!page.is_onboarding_open());
        // With the modal gone there is nothing left to advance
        assert_eq!(page.onboarding_next(), Ok(None));
        assert_eq!(page.onboarding_completions(), 1);
    }

    #[test]
    fn test_closing_onboarding_discards_progress() {
        let mut page = LandingPage::new(&PageConfig::default());
        page.open_onboarding();
        page.onboarding_next().unwrap();
        assert!(page.close_onboarding());
        assert!(!page.close_onboarding());

        page.open_onboarding();
        assert!(page.render().contains("1/3 Welcome"));
        assert_eq!(page.onboarding_completions(), 0);
    }

    #[test]
    fn test_empty_onboarding_does_not_open() {
        let mut config = PageConfig::default();
        config.onboarding.steps.clear();
        let mut page = LandingPage::new(&config);
        assert!(!page.open_onboarding());
        assert_eq!(page.onboarding_next(), Ok(None));
    }

    #[test]
    fn test_hidden_document_freezes_effects() {
        let mut page = LandingPage::new(&PageConfig::default());
        page.set_document_visible(false);
        run(&mut page, 3000.0);
        assert!(!page.render().contains("PROJECT JEEV"));

        page.set_document_visible(true);
        run(&mut page, 2500.0);
        assert!(page.render().contains("PROJECT JEEV"));
    }

    #[test]
    fn test_drop_detaches_every_listener() {
        let page = LandingPage::new(&PageConfig::default());
        let frames = page.frames().clone();
        assert!(frames.listener_count() > 0);

        drop(page);
        assert_eq!(frames.listener_count(), 0);
        frames.emit(&FrameTick { dt_ms: 16.0 });
    }
}
