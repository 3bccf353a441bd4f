//! Page configuration
//!
//! The landing page is described by a single TOML file. Every section is
//! optional; anything left out falls back to the stock page.

use anyhow::{Context, Result};
use kinetic_core::TriggerKind;
use kinetic_effects::{
    BlurRevealConfig, DecryptConfig, PixelGridConfig, ScrollRevealConfig, SplitBy,
    SplitRevealConfig, StepperConfig, TypewriterConfig,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::opaque::{GalleryConfig, PrismConfig};
use crate::script::ScriptStep;

/// The whole page
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub layout: LayoutConfig,
    pub title: SplitRevealConfig,
    pub tagline: TypewriterConfig,
    pub headlines: Vec<BlurRevealConfig>,
    pub pitch: ScrollRevealConfig,
    pub hero_grid: HeroGridConfig,
    pub decrypt: DecryptConfig,
    /// Section headings ("Features", "Gallery")
    pub headings: Vec<SplitRevealConfig>,
    pub onboarding: OnboardingConfig,
    pub prism: PrismConfig,
    pub gallery: GalleryConfig,
    /// Scripted visit; empty uses the stock script
    pub script: Vec<ScriptStep>,
}

/// Vertical placement of page elements, in CSS pixels
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub viewport_height: f32,
    /// Duration of a smooth scroll
    pub scroll_ms: f32,
    pub title_top: f32,
    pub tagline_top: f32,
    pub headlines_top: f32,
    pub headline_spacing: f32,
    pub hero_grid_top: f32,
    pub pitch_top: f32,
    pub pitch_height: f32,
    pub decrypt_top: f32,
    pub headings_top: Vec<f32>,
    /// Height used for single-line text elements
    pub line_height: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            viewport_height: 900.0,
            scroll_ms: 600.0,
            title_top: 120.0,
            tagline_top: 220.0,
            headlines_top: 320.0,
            headline_spacing: 56.0,
            hero_grid_top: 520.0,
            pitch_top: 1100.0,
            pitch_height: 144.0,
            decrypt_top: 1400.0,
            headings_top: vec![1600.0, 2400.0],
            line_height: 48.0,
        }
    }
}

/// Pixel transition and its two layers
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroGridConfig {
    pub grid: PixelGridConfig,
    /// Toggle by tapping instead of following the pointer
    pub touch: bool,
    pub height: f32,
    /// Label of the first layer (the hero image)
    pub first_layer: String,
    pub second_title: String,
    pub second_body: String,
}

impl Default for HeroGridConfig {
    fn default() -> Self {
        Self {
            grid: PixelGridConfig::new(10).with_step(450.0),
            touch: false,
            height: 480.0,
            first_layer: "[hero image]".to_string(),
            second_title: "Interactive Demo".to_string(),
            second_body: "Hover to reveal pixel transition".to_string(),
        }
    }
}

/// One onboarding step
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepContent {
    pub title: String,
    pub body: String,
}

impl StepContent {
    fn new(title: &str, body: &str) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
        }
    }
}

/// Onboarding modal
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OnboardingConfig {
    pub stepper: StepperConfig,
    pub steps: Vec<StepContent>,
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            stepper: StepperConfig {
                back_label: "Previous".to_string(),
                next_label: "Next".to_string(),
                ..Default::default()
            },
            steps: vec![
                StepContent::new("Welcome", "Tell us a little about your project."),
                StepContent::new(
                    "Select features",
                    "Choose the components you want to include.",
                ),
                StepContent::new(
                    "You're done",
                    "We'll send a follow-up email with next steps.",
                ),
            ],
        }
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        let title = SplitRevealConfig::new("PROJECT JEEV")
            .with_split_by(SplitBy::Chars)
            .with_unit_duration(900.0)
            .with_trigger(TriggerKind::immediate());

        let tagline = TypewriterConfig::new([
            "DNABert + U-Map + HDBScan",
            "Python + Blast + MAFFT",
            "Tailwind + TypeScript, production-ready UI.",
        ])
        .with_typing_speed(60.0)
        .with_pause(1800.0);

        let headlines = vec![
            BlurRevealConfig::new("Turning Raw e-DNA -> INSIGHTS").with_stagger(120.0),
            BlurRevealConfig::new("AI Driven Pipeline That Processes e-DNA ").with_stagger(200.0),
            BlurRevealConfig::new("Into Actionable Insights.").with_stagger(200.0),
        ];

        let pitch = ScrollRevealConfig::new(
            "We combine 2D & 3D visual layers with micro-interactions to create landing pages that feel alive.",
        )
        .with_base_opacity(0.05)
        .with_blur(8.0)
        .with_rotation(4.0);

        Self {
            layout: LayoutConfig::default(),
            title,
            tagline,
            headlines,
            pitch,
            hero_grid: HeroGridConfig::default(),
            decrypt: DecryptConfig::new("Hover to decrypt - micro interactions rule the web."),
            headings: vec![
                SplitRevealConfig::new("Features"),
                SplitRevealConfig::new("Gallery"),
            ],
            onboarding: OnboardingConfig::default(),
            prism: PrismConfig::default(),
            gallery: GalleryConfig::default(),
            script: Vec::new(),
        }
    }
}

impl HeroGridConfig {
    /// Grid settings with the touch override applied
    pub fn grid_config(&self) -> PixelGridConfig {
        if self.touch {
            self.grid.clone().for_touch()
        } else {
            self.grid.clone()
        }
    }
}

impl PageConfig {
    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Parse TOML content
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid page configuration")
    }

    /// Load `path` if given, otherwise the stock page
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize page config")
    }
}
