//! Kinetic Effects
//!
//! Reusable, independently mounted visual effects:
//!
//! - [`SplitReveal`]: staggered per-unit fade and slide
//! - [`Typewriter`]: typing, pausing and erasing a cycle of texts
//! - [`BlurReveal`]: staggered blur-in over a keyframe track
//! - [`Decrypt`]: scramble-on-hover with exact rollback
//! - [`ScrollReveal`]: scroll-linked opacity, blur and rotation
//! - [`PixelGrid`]: staggered cell flips between two content layers
//! - [`Stepper`]: multi-step wizard state
//!
//! Every effect owns its own clocks and timers. Mount one with
//! [`EffectInstance::mount`] to wire it to an element and the frame service;
//! dropping the instance tears it down.

pub mod effect;
pub mod pixel_grid;
pub mod scroll_reveal;
pub mod stepper;
pub mod text;

pub use effect::{Effect, EffectInstance};
pub use pixel_grid::{
    CustomDelay, DelayFn, GridCell, GridPhase, Layer, PixelGrid, PixelGridConfig,
};
pub use scroll_reveal::{RevealFrame, ScrollReveal, ScrollRevealConfig};
pub use stepper::{StepState, StepTransition, Stepper, StepperConfig, TransitionResult};
pub use text::{
    AfterPause, BlurDirection, BlurFrame, BlurReveal, BlurRevealConfig, CursorConfig, Decrypt,
    DecryptConfig, DecryptMode, RevealFrom, RevealState, SplitBy, SplitReveal,
    SplitRevealConfig, Stagger, TextUnit, Typewriter, TypewriterConfig, TypewriterPhase,
    UnitFrame, UnitText,
};
