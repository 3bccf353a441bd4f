//! Opaque page widgets
//!
//! The background prism and the circular gallery are rendered by external
//! widgets. The page only carries their configuration through.

use serde::{Deserialize, Serialize};

/// Background prism shader
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrismConfig {
    pub animation_type: String,
    pub time_scale: f32,
    pub height: f32,
    pub base_width: f32,
    pub scale: f32,
    pub noise: f32,
    pub glow: f32,
}

impl Default for PrismConfig {
    fn default() -> Self {
        Self {
            animation_type: "3drotate".to_string(),
            time_scale: 0.6,
            height: 3.5,
            base_width: 5.5,
            scale: 3.6,
            noise: 0.25,
            glow: 0.9,
        }
    }
}

impl PrismConfig {
    pub fn describe(&self) -> String {
        format!(
            "[prism {} t={} h={} w={} s={} noise={} glow={}]",
            self.animation_type,
            self.time_scale,
            self.height,
            self.base_width,
            self.scale,
            self.noise,
            self.glow
        )
    }
}

/// Circular image gallery
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    pub bend: f32,
    pub text_color: String,
    pub border_radius: f32,
    pub scroll_ease: f32,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            bend: 3.0,
            text_color: "#ffffff".to_string(),
            border_radius: 0.05,
            scroll_ease: 0.02,
        }
    }
}

impl GalleryConfig {
    pub fn describe(&self) -> String {
        format!(
            "[gallery bend={} color={} radius={} ease={}]",
            self.bend, self.text_color, self.border_radius, self.scroll_ease
        )
    }
}
